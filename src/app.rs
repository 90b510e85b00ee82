use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use tracing::{error, info};

use crate::config::ViewSettings;
use crate::feed::fetch::{spawn_feed, FeedEvent, FeedKind, FeedPayload, FeedSource};
use crate::layers::{MapSession, Overlay};
use crate::map::{Lod, MapRenderer, PointIndex, Viewport};
use crate::render::{render_earthquake, render_plate_boundary, CircleMarker, MapObject, Popup};
use crate::style::ColorBy;

/// Marker hit-test cell size in degrees
const HIT_CELL_DEGREES: f64 = 2.0;
/// Extra Braille pixels of slack around a marker when clicking
const HIT_SLACK_PX: f64 = 2.0;

/// Load state of one feed
#[derive(Clone, Debug, PartialEq)]
pub enum FeedStatus {
    Loading,
    Loaded { features: usize, skipped: usize },
    Failed(String),
}

/// Application state
pub struct App {
    pub viewport: Viewport,
    home: Viewport,
    pub map_renderer: MapRenderer,
    pub session: MapSession,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position for cursor marker
    pub mouse_pos: Option<(u16, u16)>,
    /// Index into the earthquake group of the marker whose popup is open
    pub popup: Option<usize>,
    quake_index: PointIndex<usize>,
    color_by: ColorBy,
    pub quake_status: FeedStatus,
    pub plate_status: FeedStatus,
    feed_tx: Sender<FeedEvent>,
    feed_rx: Receiver<FeedEvent>,
}

/// Braille pixel size of the map area inside the border and status bar
fn map_pixels(width: usize, height: usize) -> (usize, usize) {
    // 2 for border horizontally; 2 for border + 1 for status bar vertically
    let inner_width = width.saturating_sub(2);
    let inner_height = height.saturating_sub(3);
    (inner_width * 2, inner_height * 4)
}

/// Terminal cell to Braille pixel, accounting for the 1-cell border
#[inline(always)]
fn cell_to_pixel(col: u16, row: u16) -> (i32, i32) {
    ((col.saturating_sub(1) as i32) * 2, (row.saturating_sub(1) as i32) * 4)
}

impl App {
    pub fn new(width: usize, height: usize, view: &ViewSettings) -> Self {
        let (pixel_width, pixel_height) = map_pixels(width, height);
        let viewport = Viewport::new(
            view.center_lon,
            view.center_lat,
            view.zoom,
            pixel_width,
            pixel_height,
        );
        let (feed_tx, feed_rx) = mpsc::channel();

        Self {
            home: viewport.clone(),
            viewport,
            map_renderer: MapRenderer::new(),
            session: MapSession::new(view.base_layer, view.color_by),
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
            popup: None,
            quake_index: PointIndex::new(HIT_CELL_DEGREES),
            color_by: view.color_by,
            quake_status: FeedStatus::Loading,
            plate_status: FeedStatus::Loading,
            feed_tx,
            feed_rx,
        }
    }

    /// Start both feed loads; each result arrives independently
    pub fn fetch_feeds(&self, earthquakes: Arc<dyn FeedSource>, plates: Arc<dyn FeedSource>) {
        spawn_feed(FeedKind::Earthquakes, earthquakes, self.color_by, self.feed_tx.clone());
        spawn_feed(FeedKind::TectonicPlates, plates, self.color_by, self.feed_tx.clone());
    }

    /// Sender for feed events, for callers that load feeds themselves
    pub fn feed_sender(&self) -> Sender<FeedEvent> {
        self.feed_tx.clone()
    }

    /// Apply every finished feed load. Returns true if anything changed.
    pub fn poll_feeds(&mut self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.feed_rx.try_recv() {
            self.apply_feed(event);
            changed = true;
        }
        changed
    }

    /// Populate and attach the group for a loaded feed, or record its failure
    pub fn apply_feed(&mut self, event: FeedEvent) {
        let payload = match event.result {
            Ok(payload) => payload,
            Err(e) => {
                error!(feed = event.kind.name(), "feed unavailable: {e}");
                let status = FeedStatus::Failed(e.to_string());
                match event.kind {
                    FeedKind::Earthquakes => self.quake_status = status,
                    FeedKind::TectonicPlates => self.plate_status = status,
                }
                return;
            }
        };

        match payload {
            FeedPayload::Earthquakes(validated) => {
                let objects = validated.records.iter().map(render_earthquake);
                self.session.populate(Overlay::Earthquakes, objects);
                self.session.attach_overlay(Overlay::Earthquakes);
                self.rebuild_quake_index();
                self.quake_status = FeedStatus::Loaded {
                    features: validated.records.len(),
                    skipped: validated.skipped,
                };
                info!(
                    count = validated.records.len(),
                    skipped = validated.skipped,
                    "earthquake layer attached"
                );
            }
            FeedPayload::TectonicPlates(validated) => {
                let objects = validated.records.iter().map(render_plate_boundary);
                self.session.populate(Overlay::TectonicPlates, objects);
                self.session.attach_overlay(Overlay::TectonicPlates);
                self.plate_status = FeedStatus::Loaded {
                    features: validated.records.len(),
                    skipped: validated.skipped,
                };
                info!(
                    count = validated.records.len(),
                    skipped = validated.skipped,
                    "plate layer attached"
                );
            }
        }
    }

    fn rebuild_quake_index(&mut self) {
        self.quake_index.clear();
        for (idx, marker) in self.session.group(Overlay::Earthquakes).markers() {
            self.quake_index.insert(marker.lon, marker.lat, idx);
        }
        self.popup = None;
    }

    /// Messages for feeds that failed, for the error banner
    pub fn feed_errors(&self) -> Vec<String> {
        [
            (Overlay::Earthquakes, &self.quake_status),
            (Overlay::TectonicPlates, &self.plate_status),
        ]
        .into_iter()
        .filter_map(|(overlay, status)| match status {
            FeedStatus::Failed(msg) => Some(format!("{} unavailable: {msg}", overlay.name())),
            _ => None,
        })
        .collect()
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        let (pixel_width, pixel_height) = map_pixels(width, height);
        self.viewport.width = pixel_width;
        self.viewport.height = pixel_height;
        self.home.width = pixel_width;
        self.home.height = pixel_height;
    }

    /// Back to the startup center and zoom
    pub fn reset_view(&mut self) {
        self.viewport = self.home.clone();
        self.popup = None;
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_pixel(col, row);
        self.viewport.zoom_in_at(px, py);
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_pixel(col, row);
        self.viewport.zoom_out_at(px, py);
    }

    pub fn select_base_layer(&mut self, idx: usize) {
        if self.session.select_base_layer(idx) {
            info!(layer = self.session.active_base_layer().name, "base layer selected");
        }
    }

    pub fn toggle_overlay(&mut self, overlay: Overlay) {
        let attached = self.session.toggle_overlay(overlay);
        if overlay == Overlay::Earthquakes && !attached {
            self.popup = None;
        }
        info!(overlay = overlay.name(), attached, "overlay toggled");
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Esc closes an open popup first, then quits
    pub fn escape(&mut self) {
        if self.popup.take().is_none() {
            self.quit();
        }
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        format!(
            "{:.1}°{}, {:.1}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }

    /// Get current basemap LOD as a string
    pub fn lod_level(&self) -> &'static str {
        Lod::from_zoom(self.viewport.zoom).label()
    }

    /// Pan by the drag delta since the last mouse position
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            // Less sensitive when zoomed out
            let scale = if self.viewport.zoom < 2.0 {
                2
            } else if self.viewport.zoom < 4.0 {
                3
            } else {
                4
            };
            self.pan(dx * scale, dy * scale);
        }
        self.last_mouse = Some((x, y));
    }

    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }

    /// Get mouse position in braille pixel coordinates (for rendering marker)
    pub fn mouse_pixel_pos(&self) -> Option<(i32, i32)> {
        self.mouse_pos.map(|(col, row)| cell_to_pixel(col, row))
    }

    /// Open the popup of the topmost earthquake marker under a screen
    /// position, or close the popup when nothing is there.
    pub fn click_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_pixel(col, row);
        self.popup = self.marker_at_pixel(px, py);
    }

    fn marker_at_pixel(&self, px: i32, py: i32) -> Option<usize> {
        if !self.session.is_attached(Overlay::Earthquakes) || self.quake_index.is_empty() {
            return None;
        }
        let group = self.session.group(Overlay::Earthquakes);
        let max_radius = group
            .markers()
            .map(|(_, m)| m.style.radius)
            .fold(0.0_f64, f64::max);

        let (lon, lat) = self.viewport.unproject(px, py);
        let reach = (max_radius + HIT_SLACK_PX) * self.viewport.degrees_per_pixel();

        // Later markers draw on top, so the highest hit index wins
        self.quake_index
            .query_radius(lon, lat, reach)
            .into_iter()
            .rev()
            .filter_map(|i| self.quake_index.get(i))
            .map(|(_, _, &group_idx)| group_idx)
            .find(|&group_idx| match group.get(group_idx) {
                Some(MapObject::Marker(marker)) => self.hits(marker, px, py),
                _ => false,
            })
    }

    fn hits(&self, marker: &CircleMarker, px: i32, py: i32) -> bool {
        let (mx, my) = self.viewport.project(marker.lon, marker.lat);
        let dx = mx as f64 - px as f64;
        let dy = my as f64 - py as f64;
        (dx * dx + dy * dy).sqrt() <= marker.style.radius.max(0.0) + HIT_SLACK_PX
    }

    /// Marker and popup currently open, if any
    pub fn open_popup(&self) -> Option<(&CircleMarker, &Popup)> {
        match self.session.group(Overlay::Earthquakes).get(self.popup?) {
            Some(MapObject::Marker(marker)) => Some((marker, &marker.popup)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{EarthquakeFeature, FeedError, PlateBoundaryFeature, Validated};

    fn quake(lon: f64, lat: f64, magnitude: f64, place: &str) -> EarthquakeFeature {
        EarthquakeFeature {
            magnitude,
            color_value: magnitude,
            place: place.to_string(),
            time_millis: 1_000_000_000_000,
            lon,
            lat,
            depth: None,
        }
    }

    fn quakes_event(records: Vec<EarthquakeFeature>) -> FeedEvent {
        FeedEvent {
            kind: FeedKind::Earthquakes,
            result: Ok(FeedPayload::Earthquakes(Validated { records, skipped: 0 })),
        }
    }

    fn plates_failure() -> FeedEvent {
        FeedEvent {
            kind: FeedKind::TectonicPlates,
            result: Err(FeedError::Status {
                url: "https://example.com/plates.json".into(),
                status: 503,
            }),
        }
    }

    fn app() -> App {
        App::new(82, 43, &ViewSettings::default())
    }

    #[test]
    fn test_map_pixels_account_for_chrome() {
        let app = app();
        assert_eq!((app.viewport.width, app.viewport.height), (160, 160));
    }

    #[test]
    fn test_plate_failure_leaves_earthquakes_working() {
        let mut app = app();
        let tx = app.feed_sender();
        tx.send(plates_failure()).expect("send");
        tx.send(quakes_event(vec![quake(10.0, 10.0, 4.2, "a")])).expect("send");

        assert!(app.poll_feeds());
        assert!(app.session.is_attached(Overlay::Earthquakes));
        assert_eq!(app.session.group(Overlay::Earthquakes).len(), 1);
        assert!(!app.session.is_attached(Overlay::TectonicPlates));
        assert_eq!(app.quake_status, FeedStatus::Loaded { features: 1, skipped: 0 });
        assert!(matches!(app.plate_status, FeedStatus::Failed(_)));

        let errors = app.feed_errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Tectonic Plates unavailable"));
    }

    #[test]
    fn test_plates_attach_on_arrival() {
        let mut app = app();
        assert!(!app.poll_feeds());
        app.apply_feed(FeedEvent {
            kind: FeedKind::TectonicPlates,
            result: Ok(FeedPayload::TectonicPlates(Validated {
                records: vec![PlateBoundaryFeature {
                    lines: vec![vec![(0.0, 0.0), (5.0, 5.0)]],
                }],
                skipped: 2,
            })),
        });
        assert_eq!(
            app.session.attached_overlays(),
            &[Overlay::Earthquakes, Overlay::TectonicPlates]
        );
        assert_eq!(app.plate_status, FeedStatus::Loaded { features: 1, skipped: 2 });
    }

    #[test]
    fn test_base_switch_keeps_overlays() {
        let mut app = app();
        app.apply_feed(quakes_event(vec![quake(0.0, 0.0, 3.0, "a")]));
        app.select_base_layer(2);
        assert_eq!(app.session.active_base_layer().name, "Grayscale Map");
        assert!(app.session.is_attached(Overlay::Earthquakes));
        app.select_base_layer(9);
        assert_eq!(app.session.active_base_index(), 2);
    }

    #[test]
    fn test_click_opens_topmost_popup() {
        let mut app = app();
        app.apply_feed(quakes_event(vec![
            quake(0.0, 0.0, 3.0, "below"),
            quake(0.0, 0.0, 3.0, "above"),
            quake(100.0, 40.0, 3.0, "elsewhere"),
        ]));

        // Map center is (0, 0): pixel (80, 80) -> cell (41, 21) with the border
        app.click_at(41, 21);
        let (_, popup) = app.open_popup().expect("popup");
        assert_eq!(popup.location, "above");

        app.escape();
        assert!(app.open_popup().is_none());
        assert!(!app.should_quit);
        app.escape();
        assert!(app.should_quit);
    }

    #[test]
    fn test_click_on_empty_map_closes_popup() {
        let mut app = app();
        app.apply_feed(quakes_event(vec![quake(0.0, 0.0, 3.0, "only")]));
        app.click_at(41, 21);
        assert!(app.popup.is_some());
        app.click_at(2, 2);
        assert!(app.popup.is_none());
    }

    #[test]
    fn test_hidden_earthquakes_are_not_clickable() {
        let mut app = app();
        app.apply_feed(quakes_event(vec![quake(0.0, 0.0, 3.0, "only")]));
        app.toggle_overlay(Overlay::Earthquakes);
        app.click_at(41, 21);
        assert!(app.popup.is_none());
    }

    #[test]
    fn test_click_with_huge_marker() {
        let mut app = app();
        app.apply_feed(quakes_event(vec![quake(120.0, -30.0, 1e10, "huge")]));
        app.click_at(2, 2);
        let (_, popup) = app.open_popup().expect("popup");
        assert_eq!(popup.location, "huge");
    }

    #[test]
    fn test_reset_view() {
        let mut app = app();
        app.pan(30, 10);
        app.zoom_in();
        app.reset_view();
        assert_eq!(app.viewport.center_lon, 0.0);
        assert_eq!(app.viewport.zoom, 1.0);
    }
}
