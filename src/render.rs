//! Feature renderer: validated records into styled map objects.

use chrono::{DateTime, Local};

use crate::feed::{EarthquakeFeature, PlateBoundaryFeature};
use crate::map::LineString;
use crate::style::{MarkerStyle, PathStyle};

/// Local time rendering used in popups, in the shape of a browser's default
/// date string (e.g. `Sun Sep 09 2001 01:46:40 GMT+0000`).
pub const POPUP_TIME_FORMAT: &str = "%a %b %d %Y %H:%M:%S GMT%z";

/// Popup attached to an earthquake marker
#[derive(Clone, Debug, PartialEq)]
pub struct Popup {
    pub location: String,
    pub date: String,
    pub magnitude: String,
}

impl Popup {
    pub fn for_quake(quake: &EarthquakeFeature) -> Self {
        Self {
            location: quake.place.clone(),
            date: format_timestamp(quake.time_millis),
            magnitude: quake.magnitude.to_string(),
        }
    }

    pub fn lines(&self) -> [String; 3] {
        [
            format!("Location: {}", self.location),
            format!("Date: {}", self.date),
            format!("Magnitude: {}", self.magnitude),
        ]
    }

    pub fn text(&self) -> String {
        self.lines().join("\n")
    }
}

/// Epoch milliseconds as local time; out-of-range values read `Invalid Date`
pub fn format_timestamp(millis: i64) -> String {
    match DateTime::from_timestamp_millis(millis) {
        Some(utc) => utc.with_timezone(&Local).format(POPUP_TIME_FORMAT).to_string(),
        None => "Invalid Date".to_string(),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CircleMarker {
    pub lon: f64,
    pub lat: f64,
    pub style: MarkerStyle,
    pub popup: Popup,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PathObject {
    pub lines: Vec<LineString>,
    pub style: PathStyle,
}

/// Anything a layer group can hold
#[derive(Clone, Debug, PartialEq)]
pub enum MapObject {
    Marker(CircleMarker),
    Path(PathObject),
}

pub fn render_earthquake(quake: &EarthquakeFeature) -> MapObject {
    MapObject::Marker(CircleMarker {
        lon: quake.lon,
        lat: quake.lat,
        style: MarkerStyle::for_quake(quake.magnitude, quake.color_value),
        popup: Popup::for_quake(quake),
    })
}

pub fn render_plate_boundary(plate: &PlateBoundaryFeature) -> MapObject {
    MapObject::Path(PathObject {
        lines: plate.lines.clone(),
        style: PathStyle::plate_boundary(),
    })
}
