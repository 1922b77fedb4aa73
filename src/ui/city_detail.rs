//! City detail screen UI
//!
//! Renders current conditions for one city, or the loading, not-found and
//! error states of its lookup.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::detail::{CityDetail, DetailState};

/// Renders the city detail screen
///
/// # Arguments
/// * `frame` - The ratatui frame to render into
/// * `app` - The application state
/// * `city_id` - The identifier being shown
pub fn render(frame: &mut Frame, app: &App, city_id: &str) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    match &app.detail {
        DetailState::Loading => render_message(
            frame,
            chunks[0],
            city_id,
            "Loading...",
            Color::Cyan,
        ),
        DetailState::NotFound => render_message(
            frame,
            chunks[0],
            city_id,
            &format!("City not found: no record with id {}", city_id),
            Color::Yellow,
        ),
        DetailState::Error(error) => render_message(
            frame,
            chunks[0],
            city_id,
            &format!("Error fetching weather data: {}", error),
            Color::Red,
        ),
        DetailState::Found(detail) => render_found(frame, chunks[0], detail),
    }

    let help = Paragraph::new(Line::from(Span::styled(
        "Esc: Back  r: Reload  ?: Help  q: Quit",
        Style::default().fg(Color::DarkGray),
    )));
    frame.render_widget(help, chunks[1]);
}

/// Renders a single status message inside the detail frame
fn render_message(frame: &mut Frame, area: Rect, city_id: &str, message: &str, color: Color) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" City {} ", city_id));

    let paragraph = Paragraph::new(Line::from(Span::styled(
        message.to_string(),
        Style::default().fg(color),
    )))
    .block(block);

    frame.render_widget(paragraph, area);
}

/// One label/value line of the conditions list
fn field_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<14}", label), Style::default().fg(Color::Gray)),
        Span::styled(value, Style::default().fg(Color::White)),
    ])
}

/// Renders the resolved city with its current conditions
fn render_found(frame: &mut Frame, area: Rect, detail: &CityDetail) {
    let city = &detail.city;
    let conditions = &detail.conditions;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            format!(" Weather in {} ", city.name),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ));

    let location = match city.coordinates {
        Some(coords) => format!("{:.4}, {:.4}", coords.lat, coords.lon),
        None => "unknown".to_string(),
    };

    let lines = vec![
        field_line("Country", city.country.clone()),
        field_line("Timezone", city.timezone.clone()),
        field_line("Coordinates", location),
        Line::from(""),
        field_line("Temperature", format!("{} \u{00B0}C", conditions.temperature)),
        field_line("Feels Like", format!("{} \u{00B0}C", conditions.feels_like)),
        field_line("Humidity", format!("{}%", conditions.humidity)),
        field_line("Pressure", format!("{} hPa", conditions.pressure)),
        field_line("Wind Speed", format!("{} m/s", conditions.wind_speed)),
        field_line(
            "Condition",
            conditions
                .description
                .clone()
                .unwrap_or_else(|| "N/A".to_string()),
        ),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                "  Updated {}",
                conditions
                    .fetched_at
                    .with_timezone(&chrono::Local)
                    .format("%H:%M")
            ),
            Style::default().fg(Color::DarkGray),
        )),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppState;
    use crate::data::{ApiKey, City, Coordinates, CurrentConditions, GeonamesClient, WeatherClient};
    use crate::loader::Loader;
    use chrono::Utc;
    use ratatui::{backend::TestBackend, Terminal};
    use reqwest::Client;

    fn create_test_app(detail: DetailState) -> App {
        let http = Client::new();
        let geonames = GeonamesClient::new(http.clone()).with_base_url("http://127.0.0.1:9/search");
        let weather =
            WeatherClient::new(http, ApiKey::new("test")).with_base_url("http://127.0.0.1:9");
        let (loader, handle) = Loader::new(geonames, weather);
        let mut app = App::new(loader, handle, 3);
        app.state = AppState::Detail("2988507".to_string());
        app.detail = detail;
        app
    }

    fn render_to_string(app: &App) -> String {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| {
                render(frame, app, "2988507");
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    fn paris_detail() -> CityDetail {
        CityDetail {
            city: City {
                id: "2988507".to_string(),
                name: "Paris".to_string(),
                country: "France".to_string(),
                timezone: "Europe/Paris".to_string(),
                coordinates: Some(Coordinates {
                    lat: 48.85341,
                    lon: 2.3488,
                }),
            },
            conditions: CurrentConditions {
                temperature: 12.4,
                feels_like: 11.7,
                humidity: 81.0,
                pressure: 1012.0,
                wind_speed: 4.63,
                description: Some("light rain".to_string()),
                fetched_at: Utc::now(),
            },
        }
    }

    #[test]
    fn test_found_renders_values_as_supplied() {
        let app = create_test_app(DetailState::Found(Box::new(paris_detail())));
        let content = render_to_string(&app);

        assert!(content.contains("Weather in Paris"));
        assert!(content.contains("12.4 \u{00B0}C"));
        assert!(content.contains("11.7 \u{00B0}C"));
        assert!(content.contains("81%"));
        assert!(content.contains("1012 hPa"));
        assert!(content.contains("4.63 m/s"));
        assert!(content.contains("light rain"));
        assert!(content.contains("Europe/Paris"));
    }

    #[test]
    fn test_missing_description_renders_not_available() {
        let mut detail = paris_detail();
        detail.conditions.description = None;
        let app = create_test_app(DetailState::Found(Box::new(detail)));
        assert!(render_to_string(&app).contains("N/A"));
    }

    #[test]
    fn test_not_found_and_error_are_distinct() {
        let not_found = render_to_string(&create_test_app(DetailState::NotFound));
        let error = render_to_string(&create_test_app(DetailState::Error(
            "Weather service returned HTTP 401".to_string(),
        )));

        assert!(not_found.contains("City not found"));
        assert!(!not_found.contains("Error fetching"));
        assert!(error.contains("Error fetching weather data"));
        assert!(error.contains("HTTP 401"));
    }

    #[test]
    fn test_loading_state() {
        let app = create_test_app(DetailState::Loading);
        assert!(render_to_string(&app).contains("Loading..."));
    }
}
