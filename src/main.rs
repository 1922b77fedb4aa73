//! City Weather CLI - Browse world cities with their temperature forecasts
//!
//! A terminal UI application that lists cities from the geonames dataset,
//! loads more as you scroll, and joins each with a short-range forecast.

use std::io;
use std::panic;
use std::process;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};

use cityweather::app::{App, AppState};
use cityweather::cli::{Cli, StartupConfig};
use cityweather::data::{build_http_client, GeonamesClient, WeatherClient};
use cityweather::loader::Loader;
use cityweather::{logging, ui};

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

/// Renders the UI based on the current application state
fn render_ui(frame: &mut ratatui::Frame, app: &App) {
    match &app.state {
        AppState::Browser => {
            ui::render_city_table(frame, app);
        }
        AppState::Detail(city_id) => {
            ui::render_city_detail(frame, app, city_id);
        }
    }

    if app.show_help {
        ui::render_help_overlay(frame);
    }
}

/// Builds the API clients and the background loader from the startup config
fn build_loader(config: &StartupConfig) -> reqwest::Result<(Loader, cityweather::loader::LoadHandle)> {
    let http_client = build_http_client(config.timeout)?;

    let mut geonames = GeonamesClient::new(http_client.clone());
    if let Some(url) = &config.geonames_url {
        geonames = geonames.with_base_url(url.clone());
    }

    let mut weather = WeatherClient::new(http_client, config.api_key.clone());
    if let Some(url) = &config.weather_url {
        weather = weather.with_base_url(url.clone());
    }

    Ok(Loader::new(geonames, weather))
}

/// Main event loop: apply background results, pull pages, draw, handle keys
fn run<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        app.process_messages();
        app.pump();

        terminal.draw(|f| render_ui(f, app))?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(2);
        }
    };

    match logging::init(config.log_file.clone()) {
        Ok(Some(path)) => info!(path = %path.display(), "Logging initialised"),
        Ok(None) => {}
        Err(e) => eprintln!("warning: logging disabled: {}", e),
    }

    let (loader, handle) = build_loader(&config)?;
    let mut app = App::with_startup_config(loader, handle, &config);
    info!(search = %config.initial_search, batch_size = config.batch_size, "Starting city browser");

    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    if let Err(e) = &result {
        warn!(error = %e, "Event loop stopped with an error");
    }
    result?;

    Ok(())
}
