use crate::app::{App, FeedStatus};
use crate::braille::BrailleCanvas;
use crate::layers::{MapSession, Overlay};
use crate::legend::Legend;
use crate::map::MapLayers;
use crate::render::{CircleMarker, Popup};
use crate::style::{parse_hex, Rgb};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};

impl From<Rgb> for Color {
    fn from(rgb: Rgb) -> Self {
        Color::Rgb(rgb.0, rgb.1, rgb.2)
    }
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let map_inner = render_map(frame, app, chunks[0]);
    render_layer_control(frame, &app.session, map_inner);
    render_legend(frame, app.session.legend(), map_inner);
    if let Some((marker, popup)) = app.open_popup() {
        render_popup(frame, app, marker, popup, map_inner);
    }
    render_banner(frame, app, map_inner);
    render_status_bar(frame, app, chunks[1]);
}

/// Draw the bordered map and return its inner area
fn render_map(frame: &mut Frame, app: &App, area: Rect) -> Rect {
    let palette = app.session.active_base_layer().palette;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .style(Style::default().bg(palette.background.into()))
        .title(Span::styled(
            " Earthquakes & Plate Boundaries ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Braille gives 2x4 resolution per character
    let mut viewport = app.viewport.clone();
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let layers = app
        .map_renderer
        .render(&app.session, &viewport, inner.width as usize, inner.height as usize);

    let cursor_pos = app.mouse_pixel_pos().and_then(|(px, py)| {
        let cx = (px / 2) as u16;
        let cy = (py / 4) as u16;
        (cx < inner.width && cy < inner.height).then_some((cx, cy))
    });

    frame.render_widget(
        MapWidget {
            layers,
            coastline: palette.coastline.into(),
            cursor_pos,
        },
        inner,
    );
    inner
}

/// Braille map layers drawn back to front
struct MapWidget {
    layers: MapLayers,
    coastline: Color,
    cursor_pos: Option<(u16, u16)>,
}

impl MapWidget {
    /// Copy a canvas into the buffer; cells without ink use `default`
    fn render_layer(canvas: &BrailleCanvas, default: Color, area: Rect, buf: &mut Buffer) {
        for cell in canvas.cells() {
            if cell.col >= area.width as usize || cell.row >= area.height as usize {
                continue;
            }
            let x = area.x + cell.col as u16;
            let y = area.y + cell.row as u16;
            let fg = cell.ink.map_or(default, Color::from);
            buf[(x, y)].set_char(cell.glyph).set_fg(fg);
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Self::render_layer(&self.layers.coastlines, self.coastline, area, buf);
        for (_, canvas) in &self.layers.overlays {
            Self::render_layer(canvas, Color::White, area, buf);
        }

        if let Some((cx, cy)) = self.cursor_pos {
            let x = area.x + cx;
            let y = area.y + cy;
            if x < area.x + area.width && y < area.y + area.height {
                buf[(x, y)].set_char('╋').set_fg(Color::Red);
            }
        }
    }
}

fn panel_block(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray))
        .style(Style::default().bg(Color::Black).fg(Color::White))
        .title(Span::styled(
            format!(" {title} "),
            Style::default().add_modifier(Modifier::BOLD),
        ))
}

/// Rect of `width` x `height` in a corner of `area`, shrunk to fit
fn corner(area: Rect, width: u16, height: u16, right: bool, bottom: bool) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = if right { area.x + area.width - width } else { area.x };
    let y = if bottom { area.y + area.height - height } else { area.y };
    Rect::new(x, y, width, height)
}

/// Layer selector, top right, always expanded
fn render_layer_control(frame: &mut Frame, session: &MapSession, map: Rect) {
    let control = session.control();
    let mut lines: Vec<Line> = Vec::new();

    for (idx, layer) in control.base_layers.iter().enumerate() {
        let active = idx == session.active_base_index();
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", idx + 1), Style::default().fg(Color::DarkGray)),
            Span::raw(if active { "(•) " } else { "( ) " }),
            Span::styled(
                layer.name,
                if active {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                },
            ),
        ]));
    }
    lines.push(Line::from(Span::styled(
        "───────────────",
        Style::default().fg(Color::DarkGray),
    )));
    for &overlay in &control.overlays {
        let attached = session.is_attached(overlay);
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", overlay.key()), Style::default().fg(Color::DarkGray)),
            Span::raw(if attached { "[x] " } else { "[ ] " }),
            Span::raw(overlay.name()),
        ]));
    }

    let width = lines.iter().map(|l| l.width()).max().unwrap_or(0) as u16 + 2;
    let height = lines.len() as u16 + 2;
    let rect = corner(map, width, height, true, false);

    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(lines).block(panel_block("Layers")), rect);
}

/// Color key, bottom right
fn render_legend(frame: &mut Frame, legend: &Legend, map: Rect) {
    let lines: Vec<Line> = legend
        .entries
        .iter()
        .map(|entry| {
            let swatch = parse_hex(entry.hex).map_or(Color::White, Color::from);
            Line::from(vec![
                Span::styled("█ ", Style::default().fg(swatch)),
                Span::raw(entry.label),
            ])
        })
        .collect();

    let width = legend.content_width() as u16 + 6;
    let height = lines.len() as u16 + 2;
    let rect = corner(map, width, height, true, true);

    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(lines).block(panel_block(legend.title)), rect);
}

/// Popup box anchored just right of the selected marker
fn render_popup(frame: &mut Frame, app: &App, marker: &CircleMarker, popup: &Popup, map: Rect) {
    let lines: Vec<Line> = popup.lines().into_iter().map(Line::from).collect();
    let width = (lines.iter().map(|l| l.width()).max().unwrap_or(0) as u16 + 2).min(map.width);
    let height = (lines.len() as u16 + 2).min(map.height);

    let mut viewport = app.viewport.clone();
    viewport.width = map.width as usize * 2;
    viewport.height = map.height as usize * 4;
    let (px, py) = viewport.project(marker.lon, marker.lat);
    let rect = popup_rect(px, py, map, width, height);

    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(lines).block(panel_block("Earthquake")), rect);
}

/// Popup placement two cells right of the marker's pixel position, kept
/// inside `map` however far off-screen the marker projects.
fn popup_rect(px: i32, py: i32, map: Rect, width: u16, height: u16) -> Rect {
    let col = px.clamp(0, 2 * map.width as i32) / 2 + 2;
    let row = py.clamp(0, 4 * map.height as i32) / 4;
    let max_x = map.x + map.width - width;
    let max_y = map.y + map.height - height;

    let x = (map.x as i32 + col).min(max_x as i32) as u16;
    let y = (map.y as i32 + row).min(max_y as i32) as u16;
    Rect::new(x, y, width, height)
}

/// Red banner across the top of the map for feeds that failed
fn render_banner(frame: &mut Frame, app: &App, map: Rect) {
    let errors = app.feed_errors();
    if errors.is_empty() {
        return;
    }
    let height = (errors.len() as u16).min(map.height);
    let rect = Rect::new(map.x, map.y, map.width, height);
    let lines: Vec<Line> = errors.into_iter().map(|e| Line::from(format!(" ⚠ {e}"))).collect();
    let style = Style::default().bg(Color::Red).fg(Color::White).add_modifier(Modifier::BOLD);

    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(lines).style(style), rect);
}

fn feed_span(overlay: Overlay, status: &FeedStatus) -> Span<'static> {
    let (text, color) = match status {
        FeedStatus::Loading => (format!("{}: loading ", overlay.name()), Color::Yellow),
        FeedStatus::Loaded { features, skipped: 0 } => {
            (format!("{}: {features} ", overlay.name()), Color::Green)
        }
        FeedStatus::Loaded { features, skipped } => (
            format!("{}: {features} ({skipped} skipped) ", overlay.name()),
            Color::Yellow,
        ),
        FeedStatus::Failed(_) => (format!("{}: failed ", overlay.name()), Color::Red),
    };
    Span::styled(text, Style::default().fg(color))
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = Line::from(vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" (", Style::default().fg(Color::DarkGray)),
        Span::styled(app.lod_level(), Style::default().fg(Color::Magenta)),
        Span::styled(") ", Style::default().fg(Color::DarkGray)),
        feed_span(Overlay::Earthquakes, &app.quake_status),
        feed_span(Overlay::TectonicPlates, &app.plate_status),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(
            " | hjkl:pan +/-:zoom 1-4:base e/t:overlays click:popup r:reset q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(status), area);
}
