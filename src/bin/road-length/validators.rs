pub fn is_numeric_min(min: usize) -> impl Fn(String) -> Result<(), String> {
    move |v: String| {
        let val = v
            .parse::<usize>()
            .map_err(|_| "must be numeric".to_owned())?;

        if val < min {
            return Err(format!("must be >= {}", min));
        }

        Ok(())
    }
}

pub fn is_u8_min(min: u8) -> impl Fn(String) -> Result<(), String> {
    move |v: String| {
        let val = v
            .parse::<u8>()
            .map_err(|_| "must be a number between 0 and 255".to_owned())?;

        if val < min {
            return Err(format!("must be >= {}", min));
        }

        Ok(())
    }
}

pub fn is_tile_width(v: String) -> Result<(), String> {
    let val = v.parse::<f64>().map_err(|_| "must be numeric".to_owned())?;

    if !(val > 0f64) {
        return Err("must be > 0°".to_owned());
    } else if val > 10f64 {
        return Err("must be <= 10°".to_owned());
    }

    Ok(())
}

pub fn is_country_code(v: String) -> Result<(), String> {
    for code in v.split(',') {
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(format!("{:?} is not a two-letter ISO country code", code));
        }
    }

    Ok(())
}
