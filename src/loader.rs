//! Background data loading
//!
//! Runs page fetches, forecast enrichment and detail lookups as tokio tasks
//! and reports results to the main loop over a channel. Tasks never touch
//! application state; the main loop applies each message as it arrives.

use futures::stream::{self, Stream, StreamExt};
use std::future::Future;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::browser::PageRequest;
use crate::data::{City, GeonamesClient, WeatherClient, WeatherSummary};
use crate::detail::{load_detail, DetailState};

/// Capacity of the loader message channel
const CHANNEL_CAPACITY: usize = 64;

/// Messages sent from background tasks to the main app
#[derive(Debug, Clone)]
pub enum LoadMessage {
    /// A page of search results arrived
    PageLoaded {
        generation: u64,
        page: usize,
        cities: Vec<City>,
    },
    /// A page fetch failed
    PageFailed {
        generation: u64,
        page: usize,
        error: String,
    },
    /// A city's forecast lookup resolved
    SummaryReady {
        generation: u64,
        city_id: String,
        summary: WeatherSummary,
    },
    /// A detail lookup reached a terminal state
    DetailReady { city_id: String, state: DetailState },
}

/// Spawns loading tasks and owns the sending half of their channel
#[derive(Debug, Clone)]
pub struct Loader {
    geonames: GeonamesClient,
    weather: WeatherClient,
    sender: mpsc::Sender<LoadMessage>,
}

/// Receiving half handed to the main loop
#[derive(Debug)]
pub struct LoadHandle {
    receiver: mpsc::Receiver<LoadMessage>,
}

impl LoadHandle {
    /// Returns the next pending message without blocking
    pub fn try_recv(&mut self) -> Option<LoadMessage> {
        self.receiver.try_recv().ok()
    }

    /// Waits for the next message
    pub async fn recv(&mut self) -> Option<LoadMessage> {
        self.receiver.recv().await
    }
}

impl Loader {
    /// Creates a loader and the handle that receives its messages
    pub fn new(geonames: GeonamesClient, weather: WeatherClient) -> (Self, LoadHandle) {
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        (
            Self {
                geonames,
                weather,
                sender,
            },
            LoadHandle { receiver },
        )
    }

    /// Fetches one page of cities in the background
    pub fn fetch_page(&self, request: PageRequest) {
        let geonames = self.geonames.clone();
        let tx = self.sender.clone();

        tokio::spawn(async move {
            debug!(query = %request.query, page = request.page, "Fetching city page");
            let message = match geonames
                .search(&request.query, request.start(), request.batch_size)
                .await
            {
                Ok(cities) => LoadMessage::PageLoaded {
                    generation: request.generation,
                    page: request.page,
                    cities,
                },
                Err(e) => {
                    warn!(query = %request.query, page = request.page, error = %e, "City page failed");
                    LoadMessage::PageFailed {
                        generation: request.generation,
                        page: request.page,
                        error: e.to_string(),
                    }
                }
            };
            let _ = tx.send(message).await;
        });
    }

    /// Looks up forecasts for newly merged cities, one at a time in list order.
    ///
    /// Each summary is sent as soon as it resolves. A failed lookup yields an
    /// unavailable summary and the remaining cities are still processed.
    pub fn enrich(&self, generation: u64, cities: Vec<City>) {
        if cities.is_empty() {
            return;
        }

        let weather = self.weather.clone();
        let tx = self.sender.clone();

        tokio::spawn(async move {
            let total = cities.len();
            let summaries = enrichment_stream(cities, move |city| {
                let weather = weather.clone();
                async move { forecast_summary(&weather, &city).await }
            });
            futures::pin_mut!(summaries);

            while let Some((city_id, summary)) = summaries.next().await {
                let message = LoadMessage::SummaryReady {
                    generation,
                    city_id,
                    summary,
                };
                if tx.send(message).await.is_err() {
                    // Receiver dropped, the app is shutting down
                    return;
                }
            }
            info!(generation, cities = total, "Forecast enrichment finished");
        });
    }

    /// Resolves a city and its current conditions in the background
    pub fn load_detail(&self, city_id: String) {
        let geonames = self.geonames.clone();
        let weather = self.weather.clone();
        let tx = self.sender.clone();

        tokio::spawn(async move {
            let state = load_detail(&geonames, &weather, &city_id).await;
            let _ = tx.send(LoadMessage::DetailReady { city_id, state }).await;
        });
    }
}

/// Applies `lookup` to each city in order, yielding `(city_id, summary)` pairs
/// as each lookup completes.
pub fn enrichment_stream<F, Fut>(
    cities: Vec<City>,
    lookup: F,
) -> impl Stream<Item = (String, WeatherSummary)>
where
    F: FnMut(City) -> Fut,
    Fut: Future<Output = (String, WeatherSummary)>,
{
    stream::iter(cities).then(lookup)
}

/// Forecast summary for one city, unavailable on any failure
async fn forecast_summary(weather: &WeatherClient, city: &City) -> (String, WeatherSummary) {
    let Some(coords) = city.coordinates else {
        warn!(city_id = %city.id, "City has no coordinates, skipping forecast");
        return (city.id.clone(), WeatherSummary::unavailable());
    };

    let summary = match weather.fetch_summary(coords).await {
        Ok(summary) => summary,
        Err(e) => {
            warn!(city_id = %city.id, error = %e, "Forecast lookup failed");
            WeatherSummary::unavailable()
        }
    };

    (city.id.clone(), summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn city(id: &str) -> City {
        City {
            id: id.to_string(),
            name: id.to_string(),
            country: String::new(),
            timezone: String::new(),
            coordinates: None,
        }
    }

    #[tokio::test]
    async fn test_enrichment_preserves_city_order() {
        let cities = vec![city("a"), city("b"), city("c")];
        let results: Vec<(String, WeatherSummary)> = enrichment_stream(cities, |c| async move {
            (c.id, WeatherSummary::unavailable())
        })
        .collect()
        .await;

        let ids: Vec<&str> = results.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_enrichment_runs_lookups_one_at_a_time() {
        let active = Arc::new(Mutex::new(0usize));
        let peak = Arc::new(Mutex::new(0usize));
        let cities = vec![city("a"), city("b"), city("c")];

        let stream = enrichment_stream(cities, |c| {
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            async move {
                {
                    let mut n = active.lock().unwrap();
                    *n += 1;
                    let mut p = peak.lock().unwrap();
                    *p = (*p).max(*n);
                }
                tokio::task::yield_now().await;
                *active.lock().unwrap() -= 1;
                (c.id, WeatherSummary::unavailable())
            }
        });
        let results: Vec<_> = stream.collect().await;

        assert_eq!(results.len(), 3);
        assert_eq!(*peak.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_enrichment_continues_after_failure() {
        let cities = vec![city("ok1"), city("bad"), city("ok2")];
        let results: Vec<(String, WeatherSummary)> = enrichment_stream(cities, |c| async move {
            let summary = if c.id == "bad" {
                WeatherSummary::unavailable()
            } else {
                WeatherSummary {
                    min: Some(1),
                    max: Some(2),
                }
            };
            (c.id, summary)
        })
        .collect()
        .await;

        assert_eq!(results.len(), 3);
        assert!(!results[1].1.is_available());
        assert!(results[2].1.is_available());
    }
}
