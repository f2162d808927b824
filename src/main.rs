mod app;
mod ui;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use app::App;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use map_labels::PlacementConfig;
use ratatui::DefaultTerminal;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    init_logging()?;
    let config = load_config()?;

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    // Run the app
    let result = run(&mut terminal, config);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// The terminal belongs to the UI, so logs only go to the file named by
/// `MAP_LABELS_LOG`
fn init_logging() -> Result<()> {
    let Ok(path) = std::env::var("MAP_LABELS_LOG") else {
        return Ok(());
    };
    let file = File::create(&path)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    tracing::info!(path = %path, "logging to file");
    Ok(())
}

/// `map-labels.toml` in the working directory if present, then environment
/// overrides
fn load_config() -> Result<PlacementConfig> {
    let path = PathBuf::from("map-labels.toml");
    let config = if path.exists() {
        PlacementConfig::load(&path)?
    } else {
        PlacementConfig::default()
    };
    Ok(config.with_env_overrides()?)
}

/// Handle mouse events for panning and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.zoom_in(),
        MouseEventKind::ScrollDown => app.zoom_out(),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        // Click and drag to pan
        MouseEventKind::Down(MouseButton::Left) => {
            app.last_mouse = Some((mouse.column, mouse.row));
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

fn new_app(terminal: &DefaultTerminal, config: &PlacementConfig) -> Result<App> {
    let size = terminal.size()?;
    Ok(App::new(
        size.width as usize,
        size.height as usize,
        config.clone(),
        PathBuf::from("data"),
    ))
}

fn run(terminal: &mut DefaultTerminal, config: PlacementConfig) -> Result<()> {
    let mut app = new_app(terminal, &config)?;

    // Main loop
    loop {
        app.tick();
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) => {
                    // Only handle key press events (not release)
                    if key.kind == KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                            // Pan with hjkl or arrow keys
                            KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
                            KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
                            KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
                            KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

                            // Zoom
                            KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                            KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                            // Placement toggles
                            KeyCode::Char('f') | KeyCode::Char('F') => app.toggle_fading(),
                            KeyCode::Char('o') | KeyCode::Char('O') => app.toggle_collisions(),
                            KeyCode::Char('d') | KeyCode::Char('D') => app.toggle_dedup(),
                            KeyCode::Char('g') | KeyCode::Char('G') => app.toggle_globe(),

                            // Reset view
                            KeyCode::Char('r') | KeyCode::Char('0') => {
                                app = new_app(terminal, &config)?;
                            }

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
