use glam::DVec2;
use map_labels::labels::{GlyphRun, IconRenderer, IconRequest, ScreenBox, TextCanvas};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};

use crate::app::App;

/// Layout pixels covered by one terminal cell
pub const CELL_WIDTH: f64 = 2.0;
pub const CELL_HEIGHT: f64 = 4.0;

/// Draw calls a layer accepts per frame before reporting overflow
const LAYER_CAPACITY: usize = 4096;

/// A glyph string queued at a terminal cell
#[derive(Clone, Debug)]
pub struct CellDraw {
    pub col: i32,
    pub row: i32,
    pub text: String,
    pub opacity: f64,
}

/// Text collaborator: one terminal cell per character, laid out
/// horizontally whatever the requested rotation
#[derive(Default)]
pub struct TextLayer {
    draws: Vec<CellDraw>,
}

impl TextLayer {
    pub fn clear(&mut self) {
        self.draws.clear();
    }

    pub fn draws(&self) -> &[CellDraw] {
        &self.draws
    }
}

impl TextCanvas for TextLayer {
    fn measure(&self, text: &str, scale: f64) -> Option<ScreenBox> {
        let size = DVec2::new(text.chars().count() as f64 * CELL_WIDTH, CELL_HEIGHT) * scale;
        Some(ScreenBox::centered(DVec2::ZERO, size))
    }

    fn add_text(&mut self, run: &GlyphRun<'_>) -> bool {
        if self.draws.len() >= LAYER_CAPACITY {
            return false;
        }
        let half_width = run.text.chars().count() as f64 * CELL_WIDTH / 2.0;
        self.draws.push(CellDraw {
            col: ((run.position.x - half_width) / CELL_WIDTH).round() as i32,
            row: (run.position.y / CELL_HEIGHT).floor() as i32,
            text: run.text.to_string(),
            opacity: run.opacity,
        });
        true
    }
}

/// Icon collaborator: the icon name is the glyph drawn in its cell
#[derive(Default)]
pub struct IconLayer {
    draws: Vec<CellDraw>,
}

impl IconLayer {
    pub fn clear(&mut self) {
        self.draws.clear();
    }

    pub fn draws(&self) -> &[CellDraw] {
        &self.draws
    }
}

impl IconRenderer for IconLayer {
    fn add_icon(&mut self, request: &IconRequest<'_>) -> bool {
        if self.draws.len() >= LAYER_CAPACITY {
            return false;
        }
        self.draws.push(CellDraw {
            col: (request.position.x / CELL_WIDTH).floor() as i32,
            row: (request.position.y / CELL_HEIGHT).floor() as i32,
            text: request.icon.name.clone(),
            opacity: request.opacity,
        });
        true
    }
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Split into map area and status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_map(frame, app, chunks[0]);
    render_status_bar(frame, app, chunks[1]);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let title = if app.loading() { " Labels (loading) " } else { " Labels " };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let widget = LabelWidget {
        text: app.text_layer.draws(),
        icons: app.icon_layer.draws(),
    };
    frame.render_widget(widget, inner);
}

/// Grey level for an opacity; fully transparent stays readable as a dim grey
fn fade_color(opacity: f64) -> Color {
    let v = (48.0 + 207.0 * opacity.clamp(0.0, 1.0)) as u8;
    Color::Rgb(v, v, v)
}

/// Overlays label and icon draws onto the map area
struct LabelWidget<'a> {
    text: &'a [CellDraw],
    icons: &'a [CellDraw],
}

impl LabelWidget<'_> {
    fn put(draw: &CellDraw, max_chars: usize, area: Rect, buf: &mut Buffer) {
        if draw.row < 0 || draw.row >= area.height as i32 {
            return;
        }
        let y = area.y + draw.row as u16;
        let style = Style::default().fg(fade_color(draw.opacity));
        for (i, ch) in draw.text.chars().take(max_chars).enumerate() {
            let col = draw.col + i as i32;
            if col < 0 || col >= area.width as i32 {
                continue;
            }
            buf[(area.x + col as u16, y)].set_char(ch).set_style(style);
        }
    }
}

impl Widget for LabelWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Icons first so label text wins shared cells
        for draw in self.icons {
            Self::put(draw, 1, area, buf);
        }
        for draw in self.text {
            Self::put(draw, 32, area, buf);
        }
    }
}

fn toggle_span(on: bool, on_label: &'static str, off_label: &'static str) -> Span<'static> {
    Span::styled(
        if on { on_label } else { off_label },
        Style::default().fg(if on { Color::Green } else { Color::DarkGray }),
    )
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let config = app.placer.config();
    let stats = app.stats;

    let status = Line::from(vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" (", Style::default().fg(Color::DarkGray)),
        Span::styled(app.lod_level(), Style::default().fg(Color::Magenta)),
        Span::styled(") ", Style::default().fg(Color::DarkGray)),
        toggle_span(!config.disable_fading, "[F]ade ", "[f]ade "),
        toggle_span(config.collision_enabled, "[O]cclude ", "[o]cclude "),
        toggle_span(config.dedup_enabled, "[D]edup ", "[d]edup "),
        toggle_span(app.globe.is_some(), "[G]lobe ", "[g]lobe "),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!(
                "{}/{} placed, {} hidden ",
                stats.placed + stats.icon_only,
                stats.candidates,
                stats.collided + stats.duplicates,
            ),
            Style::default().fg(Color::White),
        ),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(
            " | hjkl:pan +/-:zoom r:reset q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let paragraph = Paragraph::new(status);
    frame.render_widget(paragraph, area);
}
