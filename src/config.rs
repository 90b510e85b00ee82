use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::feed::fetch::{EARTHQUAKES_URL, PLATES_URL};
use crate::layers::BaseStyle;
use crate::style::ColorBy;

/// Live earthquakes and tectonic plate boundaries on a terminal world map
#[derive(Parser, Debug, Clone)]
#[command(name = "quakemap", version, about, long_about = None)]
pub struct Config {
    /// Map-tile service access token (opaque, not validated)
    #[arg(long, env = "MAPBOX_ACCESS_TOKEN", default_value = "", hide_env_values = true)]
    pub access_token: String,

    /// Earthquake GeoJSON feed (URL or local path)
    #[arg(long, default_value = EARTHQUAKES_URL)]
    pub earthquakes_url: String,

    /// Plate-boundary GeoJSON feed (URL or local path)
    #[arg(long, default_value = PLATES_URL)]
    pub plates_url: String,

    /// Directory holding Natural Earth coastline files
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Base layer shown at startup
    #[arg(long, value_enum, default_value_t = BaseStyle::Dark)]
    pub base_layer: BaseStyle,

    /// Feature value that picks marker colors
    #[arg(long, value_enum, default_value_t = ColorBy::Magnitude)]
    pub color_by: ColorBy,

    /// Initial map center latitude
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub center_lat: f64,

    /// Initial map center longitude
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub center_lon: f64,

    /// Initial zoom (1 = whole world)
    #[arg(long, default_value_t = 1.0)]
    pub zoom: f64,

    /// Per-feed request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Log file (the terminal is owned by the map)
    #[arg(long, env = "QUAKEMAP_LOG", default_value = "quakemap.log")]
    pub log_file: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Startup view and styling choices for the app
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewSettings {
    pub center_lon: f64,
    pub center_lat: f64,
    pub zoom: f64,
    pub base_layer: BaseStyle,
    pub color_by: ColorBy,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            center_lon: 0.0,
            center_lat: 0.0,
            zoom: 1.0,
            base_layer: BaseStyle::Dark,
            color_by: ColorBy::Magnitude,
        }
    }
}

impl Config {
    pub fn view(&self) -> ViewSettings {
        ViewSettings {
            center_lon: self.center_lon,
            center_lat: self.center_lat,
            zoom: self.zoom,
            base_layer: self.base_layer,
            color_by: self.color_by,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_upstream_feeds() {
        let config = Config::try_parse_from(["quakemap"]).expect("defaults parse");
        assert_eq!(config.earthquakes_url, EARTHQUAKES_URL);
        assert_eq!(config.plates_url, PLATES_URL);
        assert_eq!(config.view().base_layer, BaseStyle::Dark);
        assert_eq!(config.view().color_by, ColorBy::Magnitude);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let config = Config::try_parse_from([
            "quakemap",
            "--base-layer",
            "outdoors",
            "--color-by",
            "depth",
            "--center-lon",
            "-120.5",
            "--earthquakes-url",
            "fixtures/quakes.geojson",
        ])
        .expect("parse");
        let view = config.view();
        assert_eq!(view.base_layer, BaseStyle::Outdoors);
        assert_eq!(view.color_by, ColorBy::Depth);
        assert_eq!(view.center_lon, -120.5);
        assert_eq!(config.earthquakes_url, "fixtures/quakes.geojson");
    }
}
