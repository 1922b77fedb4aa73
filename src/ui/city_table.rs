//! City table screen rendering
//!
//! Renders the searchable table of cities with country, timezone and the
//! forecast high/low for each row, plus the search box and a status footer.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::app::{App, InputMode};
use crate::browser::RowWeather;

/// Placeholder while a row's forecast lookup is outstanding
const LOADING_TEXT: &str = "...";

/// Shown when a row's forecast is unavailable
const NOT_AVAILABLE_TEXT: &str = "N/A";

/// Color for temperature (warmer = more red, cooler = more blue)
fn temperature_color(temp: i32) -> Color {
    if temp >= 30 {
        Color::Red
    } else if temp >= 25 {
        Color::LightRed
    } else if temp >= 20 {
        Color::Yellow
    } else if temp >= 10 {
        Color::Green
    } else if temp >= 0 {
        Color::Cyan
    } else {
        Color::Blue
    }
}

/// Text and color for the High (`high = true`) or Low column of a row
pub fn temperature_cell(weather: RowWeather, high: bool) -> (String, Color) {
    match weather {
        RowWeather::Loading => (LOADING_TEXT.to_string(), Color::DarkGray),
        RowWeather::NotAvailable => (NOT_AVAILABLE_TEXT.to_string(), Color::Gray),
        RowWeather::Available { min, max } => {
            let value = if high { max } else { min };
            (format!("{} \u{00B0}C", value), temperature_color(value))
        }
    }
}

/// First row index to draw so that `selected` stays within `visible` rows
fn scroll_offset(selected: usize, visible: usize) -> usize {
    if visible == 0 {
        return selected;
    }
    (selected + 1).saturating_sub(visible)
}

/// Renders the city table screen
///
/// # Arguments
/// * `frame` - The ratatui Frame to render to
/// * `app` - The application state containing the browser and selection
pub fn render_city_table(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Length(3), // Search box
            Constraint::Min(3),    // Table
            Constraint::Length(1), // Status
            Constraint::Length(1), // Help text
        ])
        .split(area);

    let title = Line::from(vec![
        Span::styled(
            "CITY WEATHER",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("  Explore world cities", Style::default().fg(Color::Gray)),
    ]);
    frame.render_widget(Paragraph::new(title), chunks[0]);

    render_search_box(frame, app, chunks[1]);
    render_table(frame, app, chunks[2]);
    render_status(frame, app, chunks[3]);
    render_help(frame, app, chunks[4]);
}

/// Renders the search box, highlighted while it has focus
fn render_search_box(frame: &mut Frame, app: &App, area: Rect) {
    let editing = app.input_mode == InputMode::Search;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let content = if editing {
        Line::from(vec![
            Span::styled(app.search_input.clone(), Style::default().fg(Color::White)),
            Span::styled("_", Style::default().fg(Color::Yellow)),
        ])
    } else if app.search_input.is_empty() {
        Line::from(Span::styled(
            "Search by city or country (press /)",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(Span::styled(
            app.search_input.clone(),
            Style::default().fg(Color::White),
        ))
    };

    let block = Block::default()
        .title(" Search ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    frame.render_widget(Paragraph::new(content).block(block), area);
}

/// Renders the visible window of city rows
fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let cities = app.browser.cities();

    // Borders take two rows, the header one
    let visible = area.height.saturating_sub(3) as usize;
    let offset = scroll_offset(app.selected_index, visible);

    let rows: Vec<Row> = cities
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(index, city)| {
            let is_selected = index == app.selected_index;
            let weather = app.browser.row_weather(&city.id);
            let (high, high_color) = temperature_cell(weather, true);
            let (low, low_color) = temperature_cell(weather, false);

            let cursor = if is_selected { "\u{25B8} " } else { "  " }; // ▸ or space
            let name_style = if is_selected {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            Row::new(vec![
                Cell::from(format!("{}{}", cursor, city.name)).style(name_style),
                Cell::from(city.country.clone()),
                Cell::from(city.timezone.clone()),
                Cell::from(high).style(Style::default().fg(high_color)),
                Cell::from(low).style(Style::default().fg(low_color)),
            ])
        })
        .collect();

    let header = Row::new(vec!["City", "Country", "Timezone", "High", "Low"]).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );

    let widths = [
        Constraint::Percentage(30),
        Constraint::Percentage(25),
        Constraint::Percentage(25),
        Constraint::Percentage(10),
        Constraint::Percentage(10),
    ];

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );

    frame.render_widget(table, area);
}

/// Renders loading progress, end of results or the last page error
fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let browser = &app.browser;
    let count = browser.cities().len();

    let line = if let Some(error) = browser.last_error() {
        Line::from(Span::styled(
            format!("Error loading cities: {} (press r to retry)", error),
            Style::default().fg(Color::Red),
        ))
    } else if browser.is_loading() {
        Line::from(Span::styled("Loading...", Style::default().fg(Color::Cyan)))
    } else if browser.is_exhausted() && count == 0 {
        Line::from(Span::styled(
            "No cities found",
            Style::default().fg(Color::Yellow),
        ))
    } else {
        let mut text = format!("{} cities", count);
        if browser.is_exhausted() {
            text.push_str(", end of results");
        }
        let pending = browser.pending_summaries();
        if pending > 0 {
            text.push_str(&format!(" ({} forecasts pending)", pending));
        }
        Line::from(Span::styled(text, Style::default().fg(Color::Gray)))
    };

    frame.render_widget(Paragraph::new(line), area);
}

/// Renders the key hints for the current input mode
fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let text = match app.input_mode {
        InputMode::Search => "Type to search  Enter: Apply  Esc: Cancel",
        InputMode::Normal => "\u{2191}\u{2193}: Navigate  Enter: Details  /: Search  r: Retry  ?: Help  q: Quit",
    };

    let help = Paragraph::new(Line::from(Span::styled(
        text,
        Style::default().fg(Color::DarkGray),
    )));
    frame.render_widget(help, area);
}
