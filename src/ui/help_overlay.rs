//! Key help popup
//!
//! Drawn over whichever screen is active; sized to its contents and clipped
//! to small terminals.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const POPUP_WIDTH: u16 = 50;

/// Key bindings grouped by the screen they apply to
const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "City table",
        &[
            ("↑/k, ↓/j", "Move selection up/down"),
            ("PgUp, PgDn", "Move by ten rows"),
            ("g, G", "Jump to first/last row"),
            ("/", "Search by city or country"),
            ("Enter", "Open city details"),
            ("r", "Retry after a failed page"),
        ],
    ),
    (
        "City details",
        &[("Esc", "Back to the table"), ("r", "Reload conditions")],
    ),
    ("Anywhere", &[("?", "Toggle this help"), ("q", "Quit")]),
];

/// Draws the help popup centered on the frame
pub fn render(frame: &mut Frame) {
    let lines = help_lines();
    // Borders add one row above and below
    let height = lines.len() as u16 + 2;
    let popup = centered(POPUP_WIDTH, height, frame.area());

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

fn help_lines() -> Vec<Line<'static>> {
    let heading = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = Vec::new();

    for (title, bindings) in SECTIONS {
        lines.push(Line::from(Span::styled(*title, heading)));
        for (keys, action) in *bindings {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<12}", keys), Style::default().fg(Color::Yellow)),
                Span::raw(*action),
            ]));
        }
        lines.push(Line::from(""));
    }

    lines.push(Line::from(Span::styled(
        "Esc or ? closes this window",
        Style::default().fg(Color::DarkGray),
    )));
    lines
}

/// A `width` x `height` rect centered in `area`, shrunk to fit
fn centered(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
