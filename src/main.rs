use std::fs::File;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use quakemap::app::App;
use quakemap::config::Config;
use quakemap::feed::fetch::{http_client, source_for};
use quakemap::layers::{BaseLayer, Overlay};
use quakemap::{data, ui};
use ratatui::DefaultTerminal;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let config = Config::parse();
    setup_logging(&config)?;
    log_base_layers(&config.access_token);

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, &config);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    if let Err(e) = &result {
        tracing::error!("exiting: {e:#}");
    }
    result
}

/// The terminal belongs to the map, so logs go to a file
fn setup_logging(config: &Config) -> Result<()> {
    let file = File::create(&config.log_file)
        .with_context(|| format!("creating log file {}", config.log_file.display()))?;
    let level = if config.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")
}

fn log_base_layers(access_token: &str) {
    if access_token.is_empty() {
        warn!("no tile access token set (MAPBOX_ACCESS_TOKEN); tile URLs carry an empty token");
    }
    let shown = if access_token.is_empty() { "" } else { "***" };
    for layer in BaseLayer::defaults() {
        info!(
            layer = layer.name,
            url = %layer.tile_url(shown),
            tile_size = layer.tile_size,
            zoom_offset = layer.zoom_offset,
            max_zoom = layer.max_zoom,
            attribution = layer.attribution,
            "base layer"
        );
    }
}

/// Handle mouse events for panning, zooming and popups
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    // Always track mouse position for cursor marker
    app.set_mouse_pos(mouse.column, mouse.row);

    match mouse.kind {
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        // Click opens a popup; click and drag pans
        MouseEventKind::Down(MouseButton::Left) => {
            app.last_mouse = Some((mouse.column, mouse.row));
            app.click_at(mouse.column, mouse.row);
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.end_drag();
        }
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, config: &Config) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(size.width as usize, size.height as usize, &config.view());

    data::load_basemap(&mut app.map_renderer, &config.data_dir);
    if !app.map_renderer.has_data() {
        info!("no coastline data in {}, using built-in outlines", config.data_dir.display());
        data::generate_simple_world(&mut app.map_renderer);
    }

    let client = http_client(config.fetch_timeout()).context("building HTTP client")?;
    app.fetch_feeds(
        source_for(&config.earthquakes_url, &client),
        source_for(&config.plates_url, &client),
    );

    // Main loop
    loop {
        app.poll_feeds();

        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) => {
                    // Only handle key press events (not release)
                    if key.kind == KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char('q') => app.quit(),
                            KeyCode::Esc => app.escape(),

                            // Pan with hjkl or arrow keys
                            KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
                            KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
                            KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
                            KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

                            // Zoom
                            KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                            KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                            // Base layer
                            KeyCode::Char(c @ '1'..='4') => {
                                app.select_base_layer(c as usize - '1' as usize);
                            }

                            // Overlays
                            KeyCode::Char('e') | KeyCode::Char('E') => {
                                app.toggle_overlay(Overlay::Earthquakes);
                            }
                            KeyCode::Char('t') | KeyCode::Char('T') => {
                                app.toggle_overlay(Overlay::TectonicPlates);
                            }

                            // Reset view
                            KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

                            _ => {}
                        }
                    }
                }
                Event::Mouse(mouse) => {
                    handle_mouse(&mut app, mouse);
                }
                Event::Resize(width, height) => {
                    app.resize(width as usize, height as usize);
                }
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
