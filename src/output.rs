use anyhow::{Context, Result};
use serde::{Serialize, Serializer};
use std::{
    io::Write,
    path::{Path, PathBuf},
};

const HEADER: [&str; 4] = ["lat", "lon", "road_length_km", "country_code"];

/// Why a tile has no length.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailureKind {
    /// The road data could not be fetched.
    Api,

    /// The fetched roads could not be measured.
    Geometry,
}

impl FailureKind {
    /// The literal written in place of the length.
    pub fn sentinel(&self) -> &'static str {
        match self {
            FailureKind::Api => "API_request_fail",
            FailureKind::Geometry => "geometry_fail",
        }
    }
}

/// The measured road length of one tile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RoadLength {
    Km(f64),
    Failed(FailureKind),
}

impl RoadLength {
    pub fn is_failure(&self) -> bool {
        matches!(self, RoadLength::Failed(_))
    }
}

impl Serialize for RoadLength {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RoadLength::Km(km) => serializer.serialize_f64(*km),
            RoadLength::Failed(kind) => serializer.serialize_str(kind.sentinel()),
        }
    }
}

/// One line of the output table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResultRow {
    pub lat: f64,
    pub lon: f64,
    pub road_length_km: RoadLength,
    pub country_code: String,
}

/// Where the table of `country_code` is written inside `output_folder`.
pub fn output_path(output_folder: &Path, country_code: &str) -> PathBuf {
    output_folder.join(format!("country_{}_road_length.csv", country_code))
}

/// Writes `rows` as CSV to `path`, replacing any existing file. The header
/// is written even if there are no rows.
pub fn write_rows(path: &Path, rows: &[ResultRow]) -> Result<()> {
    let writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("failed creating output file {}", path.display()))?;

    write_rows_to(writer, rows)
        .with_context(|| format!("failed writing output file {}", path.display()))
}

pub(crate) fn write_rows_to<W: Write>(mut writer: csv::Writer<W>, rows: &[ResultRow]) -> Result<()> {
    writer.write_record(&HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(rows: &[ResultRow]) -> String {
        let mut buf = Vec::new();
        write_rows_to(csv::WriterBuilder::new().has_headers(false).from_writer(&mut buf), rows)
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn lengths_and_sentinels() {
        let rows = vec![
            ResultRow {
                lat: 25.5,
                lon: 51.25,
                road_length_km: RoadLength::Km(1.5),
                country_code: "QA".to_owned(),
            },
            ResultRow {
                lat: 25.5,
                lon: 51.5,
                road_length_km: RoadLength::Failed(FailureKind::Api),
                country_code: "QA".to_owned(),
            },
            ResultRow {
                lat: 25.75,
                lon: 51.5,
                road_length_km: RoadLength::Failed(FailureKind::Geometry),
                country_code: "QA".to_owned(),
            },
        ];

        assert_eq!(
            render(&rows),
            "lat,lon,road_length_km,country_code\n\
             25.5,51.25,1.5,QA\n\
             25.5,51.5,API_request_fail,QA\n\
             25.75,51.5,geometry_fail,QA\n"
        );
    }

    #[test]
    fn empty_table_has_header() {
        assert_eq!(render(&[]), "lat,lon,road_length_km,country_code\n");
    }

    #[test]
    fn file_name_is_keyed_by_country() {
        assert_eq!(
            output_path(Path::new("out"), "AR"),
            Path::new("out").join("country_AR_road_length.csv")
        );
    }
}
