use anyhow::{anyhow, bail, Context, Result};
use geo::{Geometry, MultiPolygon, Polygon};
use geojson::{Feature, GeoJson};
use std::path::Path;

/// ISO code the boundary dataset uses for features without an assigned code.
pub const UNASSIGNED_CODE: &str = "-99";

const CODE_PROPERTY: &str = "ISO_A2";
const NAME_PROPERTY: &str = "NAME_EN";

/// The outline of one country.
#[derive(Clone, Debug, PartialEq)]
pub struct CountryBoundary {
    /// Two-letter ISO 3166-1 code.
    pub code: String,

    /// English display name.
    pub name: String,

    pub shape: MultiPolygon<f64>,
}

/// The full country boundary dataset.
#[derive(Clone, Debug, Default)]
pub struct CountryBoundaries {
    countries: Vec<CountryBoundary>,
}

impl CountryBoundaries {
    /// Loads a GeoJSON feature collection with `ISO_A2` and `NAME_EN`
    /// properties and polygonal geometries.
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed reading boundary file {}", path.display()))?;

        Self::from_geojson_str(&raw)
            .with_context(|| format!("failed parsing boundary file {}", path.display()))
    }

    pub fn from_geojson_str(raw: &str) -> Result<Self> {
        let collection = match raw.parse::<GeoJson>().context("invalid GeoJSON")? {
            GeoJson::FeatureCollection(fc) => fc,
            _ => bail!("boundary dataset must be a feature collection"),
        };

        let countries = collection
            .features
            .into_iter()
            .enumerate()
            .map(|(idx, feature)| {
                country_from_feature(feature)
                    .with_context(|| format!("invalid boundary feature #{}", idx))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CountryBoundaries { countries })
    }

    /// The boundary for `code`. Features sharing the code are merged into a
    /// single multi-polygon; the first feature's name wins.
    pub fn find(&self, code: &str) -> Option<CountryBoundary> {
        let mut matching = self
            .countries
            .iter()
            .filter(|c| c.code.eq_ignore_ascii_case(code));

        let mut merged = matching.next()?.clone();
        for other in matching {
            merged.shape.0.extend(other.shape.iter().cloned());
        }

        Some(merged)
    }

    /// Every assigned country code, in dataset order and without duplicates.
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = Vec::new();

        for country in &self.countries {
            if country.code != UNASSIGNED_CODE && !codes.contains(&country.code) {
                codes.push(country.code.clone());
            }
        }

        codes
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}

fn country_from_feature(feature: Feature) -> Result<CountryBoundary> {
    let code = feature
        .property(CODE_PROPERTY)
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow!("missing {} property", CODE_PROPERTY))?
        .to_owned();

    let name = feature
        .property(NAME_PROPERTY)
        .and_then(|v| v.as_str())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| code.clone());

    let geometry: Geometry<f64> = feature
        .geometry
        .ok_or_else(|| anyhow!("feature {} has no geometry", code))?
        .try_into()
        .with_context(|| format!("unsupported geometry for {}", code))?;

    let polygons: Vec<Polygon<f64>> = match geometry {
        Geometry::Polygon(p) => vec![p],
        Geometry::MultiPolygon(mp) => mp.0,
        _ => bail!("boundary of {} must be a polygon or multi-polygon", code),
    };

    Ok(CountryBoundary {
        code,
        name,
        shape: MultiPolygon::new(polygons),
    })
}
