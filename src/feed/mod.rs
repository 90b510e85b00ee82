//! Typed feed records and the validation step between raw GeoJSON and the
//! renderer.

pub mod fetch;

use geojson::{Feature, GeoJson, Value};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

use crate::data::collect_lines;
use crate::map::LineString;
use crate::style::ColorBy;

/// Failure to obtain or decode a whole feed
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} fetching {url}")]
    Status { url: String, status: u16 },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid GeoJSON: {0}")]
    Parse(#[from] simd_json::Error),

    #[error("expected a FeatureCollection, got a {0}")]
    NotACollection(&'static str),
}

/// Reason a single feature was rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    #[error("feature has no geometry")]
    MissingGeometry,

    #[error("expected {expected} geometry, got {found}")]
    WrongGeometry {
        expected: &'static str,
        found: &'static str,
    },

    #[error("missing or invalid property `{0}`")]
    BadProperty(&'static str),

    #[error("invalid coordinates")]
    BadCoordinates,

    #[error("point has no depth coordinate")]
    MissingDepth,
}

/// One earthquake event, validated
#[derive(Clone, Debug, PartialEq)]
pub struct EarthquakeFeature {
    pub magnitude: f64,
    /// Value fed to `choose_color`: magnitude or depth depending on `ColorBy`
    pub color_value: f64,
    pub place: String,
    pub time_millis: i64,
    pub lon: f64,
    pub lat: f64,
    pub depth: Option<f64>,
}

impl EarthquakeFeature {
    pub fn from_feature(feature: &Feature, color_by: ColorBy) -> Result<Self, FeatureError> {
        let geometry = feature.geometry.as_ref().ok_or(FeatureError::MissingGeometry)?;
        let coords = match &geometry.value {
            Value::Point(coords) => coords,
            other => {
                return Err(FeatureError::WrongGeometry {
                    expected: "Point",
                    found: geometry_kind(other),
                })
            }
        };
        let (lon, lat) = match coords.as_slice() {
            [lon, lat, ..] if (-180.0..=180.0).contains(lon) && (-90.0..=90.0).contains(lat) => {
                (*lon, *lat)
            }
            _ => return Err(FeatureError::BadCoordinates),
        };
        let depth = coords.get(2).copied().filter(|d| d.is_finite());

        let magnitude = feature
            .property("mag")
            .and_then(|v| v.as_f64())
            .ok_or(FeatureError::BadProperty("mag"))?;
        let place = feature
            .property("place")
            .and_then(|v| v.as_str())
            .ok_or(FeatureError::BadProperty("place"))?
            .to_string();
        let time_millis = feature
            .property("time")
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|t| t as i64)))
            .ok_or(FeatureError::BadProperty("time"))?;

        let color_value = match color_by {
            ColorBy::Magnitude => magnitude,
            ColorBy::Depth => depth.ok_or(FeatureError::MissingDepth)?,
        };

        Ok(Self {
            magnitude,
            color_value,
            place,
            time_millis,
            lon,
            lat,
            depth,
        })
    }
}

/// One plate-boundary segment (or polygon), validated
#[derive(Clone, Debug, PartialEq)]
pub struct PlateBoundaryFeature {
    pub lines: Vec<LineString>,
}

impl PlateBoundaryFeature {
    pub fn from_feature(feature: &Feature) -> Result<Self, FeatureError> {
        let geometry = feature.geometry.as_ref().ok_or(FeatureError::MissingGeometry)?;
        let mut lines = Vec::new();
        collect_lines(geometry, &mut |line| {
            if line.len() >= 2 {
                lines.push(line)
            }
        });
        if lines.is_empty() {
            return Err(FeatureError::WrongGeometry {
                expected: "line or polygon",
                found: geometry_kind(&geometry.value),
            });
        }
        Ok(Self { lines })
    }
}

/// Records that passed validation plus how many features were dropped
#[derive(Clone, Debug, PartialEq)]
pub struct Validated<T> {
    pub records: Vec<T>,
    pub skipped: usize,
}

/// Validate features in parallel, keeping feed order. Rejected features are
/// logged and counted, never fatal.
pub fn validate<T, F>(feed: &str, features: &[Feature], convert: F) -> Validated<T>
where
    T: Send,
    F: Fn(&Feature) -> Result<T, FeatureError> + Sync,
{
    let results: Vec<Result<T, FeatureError>> = features.par_iter().map(&convert).collect();

    let mut records = Vec::with_capacity(results.len());
    let mut skipped = 0;
    for (idx, result) in results.into_iter().enumerate() {
        match result {
            Ok(record) => records.push(record),
            Err(e) => {
                skipped += 1;
                warn!(feed, feature = idx, "skipping feature: {e}");
            }
        }
    }
    debug!(feed, kept = records.len(), skipped, "validated features");

    Validated { records, skipped }
}

/// Decode any GeoJSON document
pub fn parse_geojson(mut bytes: Vec<u8>) -> Result<GeoJson, FeedError> {
    Ok(simd_json::serde::from_slice::<GeoJson>(&mut bytes)?)
}

/// Decode a feed body, which must be a FeatureCollection
pub fn parse_collection(bytes: Vec<u8>) -> Result<Vec<Feature>, FeedError> {
    match parse_geojson(bytes)? {
        GeoJson::FeatureCollection(fc) => Ok(fc.features),
        GeoJson::Feature(_) => Err(FeedError::NotACollection("Feature")),
        GeoJson::Geometry(_) => Err(FeedError::NotACollection("Geometry")),
    }
}

fn geometry_kind(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
        #[allow(unreachable_patterns)]
        _ => "unknown",
    }
}
