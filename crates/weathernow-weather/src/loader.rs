//! Per-view weather loading where the latest request wins.
//!
//! A weather view owns one `WeatherLoader`. Starting a load cancels whatever
//! load is still in flight; a response that arrives after a newer load began
//! is discarded. Closing the view cancels everything bound to it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use weathernow_core::{FetchError, Location};

use crate::provider::WeatherProvider;
use crate::types::WeatherSnapshot;

/// What a single `load` call produced.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(WeatherSnapshot),
    Failed(FetchError),
    /// A newer load started before this one finished.
    Superseded,
    /// The owning view was closed.
    Cancelled,
}

impl LoadOutcome {
    /// `Some` only for outcomes the view should render.
    pub fn into_result(self) -> Option<Result<WeatherSnapshot, FetchError>> {
        match self {
            LoadOutcome::Loaded(snapshot) => Some(Ok(snapshot)),
            LoadOutcome::Failed(err) => Some(Err(err)),
            LoadOutcome::Superseded | LoadOutcome::Cancelled => None,
        }
    }
}

pub struct WeatherLoader {
    provider: Arc<WeatherProvider>,
    view_token: CancellationToken,
    in_flight: Mutex<Option<CancellationToken>>,
    generation: AtomicU64,
    loading: AtomicBool,
}

impl WeatherLoader {
    pub fn new(provider: Arc<WeatherProvider>) -> Self {
        Self::with_view_token(provider, CancellationToken::new())
    }

    /// Bind the loader to an existing view lifetime token.
    pub fn with_view_token(provider: Arc<WeatherProvider>, view_token: CancellationToken) -> Self {
        Self {
            provider,
            view_token,
            in_flight: Mutex::new(None),
            generation: AtomicU64::new(0),
            loading: AtomicBool::new(false),
        }
    }

    /// True while the most recent load is still waiting on the network.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.view_token.is_cancelled()
    }

    /// Load weather for `location`, superseding any load already in flight.
    pub async fn load(&self, location: &Location) -> LoadOutcome {
        if self.view_token.is_cancelled() {
            return LoadOutcome::Cancelled;
        }

        // Ticket and token are swapped under one lock so the newest ticket
        // always owns the live token.
        let (ticket, token) = {
            let mut in_flight = self.in_flight.lock();
            let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            let token = self.view_token.child_token();
            if let Some(previous) = in_flight.replace(token.clone()) {
                previous.cancel();
            }
            self.loading.store(true, Ordering::SeqCst);
            (ticket, token)
        };
        let _guard = InFlight { loader: self, ticket };

        tracing::debug!("Weather load #{} for {}", ticket, location.city);

        let result = tokio::select! {
            _ = token.cancelled() => None,
            result = self.provider.fetch(location.lat_coords, location.long_coords) => Some(result),
        };

        if self.generation.load(Ordering::SeqCst) != ticket {
            tracing::debug!("Discarding stale weather response #{}", ticket);
            return LoadOutcome::Superseded;
        }

        match result {
            None => LoadOutcome::Cancelled,
            Some(Ok(snapshot)) => LoadOutcome::Loaded(snapshot),
            Some(Err(err)) => {
                tracing::warn!("Error retrieving weather data for {}: {}", location.city, err);
                LoadOutcome::Failed(err)
            }
        }
    }

    /// Cancel any in-flight load and refuse new ones. Call when the view goes away.
    pub fn close(&self) {
        self.view_token.cancel();
        self.loading.store(false, Ordering::SeqCst);
    }
}

/// Clears the loading state when the newest load finishes or is dropped mid-flight.
struct InFlight<'a> {
    loader: &'a WeatherLoader,
    ticket: u64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.loader.in_flight.lock();
        if self.loader.generation.load(Ordering::SeqCst) == self.ticket {
            self.loader.loading.store(false, Ordering::SeqCst);
            in_flight.take();
        }
    }
}

impl Drop for WeatherLoader {
    fn drop(&mut self) {
        if let Some(token) = self.in_flight.get_mut().take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use std::time::Duration;
    use weathernow_core::{BackendConfig, WeatherConfig};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn body(temp: f64) -> serde_json::Value {
        serde_json::json!({
            "current": {"dt": 1_700_000_000, "temp": temp, "feels_like": temp, "weather": []},
            "hourly": [],
            "daily": []
        })
    }

    fn loader_for(server: &MockServer) -> Arc<WeatherLoader> {
        let backend = BackendConfig {
            base_url: server.uri(),
            request_timeout_secs: 10,
        };
        let provider = WeatherProvider::new(&backend, &WeatherConfig::default()).unwrap();
        Arc::new(WeatherLoader::new(Arc::new(provider)))
    }

    #[tokio::test]
    async fn test_load_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/getWeather/39.5/-119.8"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body(51.0)))
            .mount(&mock_server)
            .await;

        let loader = loader_for(&mock_server);
        let outcome = loader.load(&Location::new("Reno", 39.5, -119.8)).await;

        let snapshot = outcome.into_result().unwrap().unwrap();
        assert_eq!(snapshot.current.temp, 51.0);
        assert!(!loader.is_loading());
    }

    #[tokio::test]
    async fn test_newer_load_supersedes_older() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/getWeather/1/1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(body(10.0))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search/getWeather/2/2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body(20.0)))
            .mount(&mock_server)
            .await;

        let loader = loader_for(&mock_server);
        let slow = {
            let loader = loader.clone();
            tokio::spawn(async move { loader.load(&Location::new("Slow", 1.0, 1.0)).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        let fast = loader.load(&Location::new("Fast", 2.0, 2.0)).await;
        let slow = slow.await.unwrap();

        assert!(matches!(slow, LoadOutcome::Superseded));
        let snapshot = fast.into_result().unwrap().unwrap();
        assert_eq!(snapshot.current.temp, 20.0);
    }

    #[tokio::test]
    async fn test_close_cancels_in_flight_load() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(body(10.0))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&mock_server)
            .await;

        let loader = loader_for(&mock_server);
        let pending = {
            let loader = loader.clone();
            tokio::spawn(async move { loader.load(&Location::new("Reno", 39.5, -119.8)).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(loader.is_loading());

        loader.close();
        let outcome = pending.await.unwrap();

        assert!(matches!(outcome, LoadOutcome::Cancelled));
        assert!(matches!(
            loader.load(&Location::new("Reno", 39.5, -119.8)).await,
            LoadOutcome::Cancelled
        ));
    }

    #[tokio::test]
    async fn test_failure_is_reported() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(serde_json::json!({"error": "boom"})),
            )
            .mount(&mock_server)
            .await;

        let loader = loader_for(&mock_server);
        let outcome = loader.load(&Location::new("Reno", 39.5, -119.8)).await;
        assert!(matches!(outcome, LoadOutcome::Failed(FetchError::Backend { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_dropped_load_clears_loading() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(body(10.0))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&mock_server)
            .await;

        let loader = loader_for(&mock_server);
        let reno = Location::new("Reno", 39.5, -119.8);
        let timed_out =
            tokio::time::timeout(Duration::from_millis(100), loader.load(&reno)).await;

        assert!(timed_out.is_err());
        assert!(!loader.is_loading());
        assert!(loader.in_flight.lock().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_loads_leave_one_winner() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(body(10.0))
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&mock_server)
            .await;

        let loader = loader_for(&mock_server);
        let barrier = Arc::new(tokio::sync::Barrier::new(16));
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let loader = loader.clone();
                let barrier = barrier.clone();
                tokio::spawn(async move {
                    barrier.wait().await;
                    loader
                        .load(&Location::new(format!("City {}", i), 1.0, 1.0))
                        .await
                })
            })
            .collect();

        let mut loaded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                LoadOutcome::Loaded(_) => loaded += 1,
                LoadOutcome::Superseded => {}
                other => panic!("unexpected outcome: {:?}", other),
            }
        }

        assert_eq!(loaded, 1);
        assert!(!loader.is_loading());
    }
}
