//! Terminal world map of live earthquakes and tectonic plate boundaries.
//!
//! Feeds are fetched concurrently, validated into typed records, rendered
//! into styled markers and paths, and mounted as toggleable overlays on a
//! Braille-rendered Web Mercator map.

pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod feed;
pub mod layers;
pub mod legend;
pub mod map;
pub mod render;
pub mod style;
pub mod ui;
