use crate::braille::BrailleCanvas;
use crate::layers::{MapSession, Overlay};
use crate::map::geometry::{draw_disc, draw_line, draw_ring, draw_weighted_line};
use crate::map::projection::Viewport;
use crate::render::{CircleMarker, MapObject, PathObject};
use crate::style::{blend, parse_hex, Rgb};

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Level of detail for basemap coastlines
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lod {
    Low,    // 110m - world view
    Medium, // 50m - continental
    High,   // 10m - regional
}

impl Lod {
    /// Select LOD based on zoom level
    pub fn from_zoom(zoom: f64) -> Self {
        if zoom < 2.0 {
            Lod::Low
        } else if zoom < 8.0 {
            Lod::Medium
        } else {
            Lod::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Lod::Low => "110m",
            Lod::Medium => "50m",
            Lod::High => "10m",
        }
    }
}

/// Rasterized layers for one frame, back to front
pub struct MapLayers {
    pub coastlines: BrailleCanvas,
    /// One canvas per attached overlay, in attach order
    pub overlays: Vec<(Overlay, BrailleCanvas)>,
}

/// Sub-pixel strokes vanish at Braille resolution
const MIN_VISIBLE_STROKE: f64 = 1.0;

/// Rasterizes the basemap and session overlays
pub struct MapRenderer {
    coastlines_low: Vec<LineString>,
    coastlines_medium: Vec<LineString>,
    coastlines_high: Vec<LineString>,
}

impl MapRenderer {
    pub fn new() -> Self {
        Self {
            coastlines_low: Vec::new(),
            coastlines_medium: Vec::new(),
            coastlines_high: Vec::new(),
        }
    }

    /// Coastlines for the given LOD, falling back to coarser data
    fn coastlines(&self, lod: Lod) -> &[LineString] {
        let candidates = match lod {
            Lod::High => [&self.coastlines_high, &self.coastlines_medium, &self.coastlines_low],
            Lod::Medium => [&self.coastlines_medium, &self.coastlines_low, &self.coastlines_high],
            Lod::Low => [&self.coastlines_low, &self.coastlines_medium, &self.coastlines_high],
        };
        candidates
            .into_iter()
            .find(|lines| !lines.is_empty())
            .map(|lines| lines.as_slice())
            .unwrap_or(&[])
    }

    /// Render the basemap and every attached overlay into Braille canvases
    /// of `width` x `height` characters.
    pub fn render(
        &self,
        session: &MapSession,
        viewport: &Viewport,
        width: usize,
        height: usize,
    ) -> MapLayers {
        let mut coastlines = BrailleCanvas::new(width, height);
        for line in self.coastlines(Lod::from_zoom(viewport.zoom)) {
            draw_linestring(&mut coastlines, line, viewport, 1.0);
        }

        let background = session.active_base_layer().palette.background;
        let overlays = session
            .attached_overlays()
            .iter()
            .map(|&overlay| {
                let mut canvas = BrailleCanvas::new(width, height);
                for object in session.group(overlay).objects() {
                    match object {
                        MapObject::Marker(marker) => {
                            draw_marker(&mut canvas, marker, viewport, background)
                        }
                        MapObject::Path(path) => draw_path(&mut canvas, path, viewport),
                    }
                }
                (overlay, canvas)
            })
            .collect();

        MapLayers { coastlines, overlays }
    }

    /// Add coastline data at a specific LOD
    pub fn add_coastline(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::Low => self.coastlines_low.push(line),
            Lod::Medium => self.coastlines_medium.push(line),
            Lod::High => self.coastlines_high.push(line),
        }
    }

    /// Check if any basemap data is loaded
    pub fn has_data(&self) -> bool {
        !self.coastlines_low.is_empty()
            || !self.coastlines_medium.is_empty()
            || !self.coastlines_high.is_empty()
    }
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Filled disc in the fill color (composited over the base background),
/// outlined in the stroke color when the stroke is wide enough to show.
fn draw_marker(
    canvas: &mut BrailleCanvas,
    marker: &CircleMarker,
    viewport: &Viewport,
    background: Rgb,
) {
    let style = &marker.style;
    let (px, py) = viewport.project(marker.lon, marker.lat);
    let margin = (style.radius.max(0.0).ceil() as i32).saturating_add(1);
    if !viewport.is_visible_within(px, py, margin) {
        return;
    }

    let fill = parse_hex(style.fill_color)
        .map(|rgb| blend(rgb, background, style.fill_opacity));
    canvas.set_pen(fill);
    draw_disc(canvas, px, py, style.radius);

    if style.stroke && style.stroke_weight >= MIN_VISIBLE_STROKE {
        canvas.set_pen(parse_hex(style.stroke_color));
        draw_ring(canvas, px, py, style.radius);
    }
}

fn draw_path(canvas: &mut BrailleCanvas, path: &PathObject, viewport: &Viewport) {
    canvas.set_pen(parse_hex(path.style.color));
    for line in &path.lines {
        draw_linestring(canvas, line, viewport, path.style.weight);
    }
}

/// Draw a linestring with viewport culling. Segments spanning most of the
/// canvas are dateline wraps and are skipped.
fn draw_linestring(
    canvas: &mut BrailleCanvas,
    line: &LineString,
    viewport: &Viewport,
    weight: f64,
) {
    if line.len() < 2 {
        return;
    }

    let mut prev: Option<(i32, i32)> = None;

    for &(lon, lat) in line {
        let (px, py) = viewport.project(lon, lat);

        if let Some((prev_x, prev_y)) = prev {
            let dist = ((px - prev_x).abs() + (py - prev_y).abs()) as usize;
            if dist < viewport.width && viewport.line_might_be_visible((prev_x, prev_y), (px, py)) {
                if weight >= 2.0 {
                    draw_weighted_line(canvas, prev_x, prev_y, px, py, weight);
                } else {
                    draw_line(canvas, prev_x, prev_y, px, py);
                }
            }
        }

        prev = Some((px, py));
    }
}
