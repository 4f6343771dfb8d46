use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::runtime::Handle;

use weathernow_auth::{AuthClient, KeyringSecretStore, RegisteredUser, SecretStore};
use weathernow_core::{Config, FetchError};
use weathernow_session::{HttpLocationSync, KeyValueStore, SessionStore, SqliteKvStore};
use weathernow_weather::{LocationSearch, WeatherLoader, WeatherProvider};

/// Composition root: owns configuration and wires every adapter to the
/// single session store.
pub struct App {
    config: Arc<Config>,
    session: Arc<SessionStore>,
    auth: AuthClient,
    search: LocationSearch,
    weather: Arc<WeatherProvider>,
}

impl App {
    /// Build against the on-disk store and the OS keyring.
    pub fn new(config: Config, runtime: Handle) -> Result<Self> {
        let db_path = config.storage.database_path();
        let kv = SqliteKvStore::new(&db_path)
            .with_context(|| format!("Failed to open local store at {}", db_path.display()))?;
        let secrets = KeyringSecretStore::new(config.storage.keyring_service.clone());

        Self::with_stores(config, Arc::new(kv), Arc::new(secrets), runtime)
    }

    /// Build with caller-supplied persistence (tests, headless hosts).
    pub fn with_stores(
        config: Config,
        kv: Arc<dyn KeyValueStore>,
        secrets: Arc<dyn SecretStore>,
        runtime: Handle,
    ) -> Result<Self> {
        let backend = &config.backend;

        let sync = HttpLocationSync::new(backend).context("Failed to create location sync client")?;
        let auth = AuthClient::new(backend).context("Failed to create auth client")?;
        let search = LocationSearch::new(backend).context("Failed to create search client")?;
        let weather = WeatherProvider::new(backend, &config.weather)
            .context("Failed to create weather client")?;

        let session = SessionStore::new(kv, secrets, Arc::new(sync), runtime);

        Ok(Self {
            config: Arc::new(config),
            session: Arc::new(session),
            auth,
            search,
            weather: Arc::new(weather),
        })
    }

    /// Hydrate the session from local storage and resume a previous login
    pub fn initialize(&self) {
        tracing::info!("Initializing WeatherNow against {}", self.config.backend.base_url);
        self.session.restore();
        if self.session.resume() {
            tracing::info!("Continuing as a logged-in user");
        }
    }

    /// Log in and hand the result to the session store.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), FetchError> {
        let payload = self.auth.login(email, password).await?;
        self.session.login(payload);
        Ok(())
    }

    /// Create an account. The caller logs in separately.
    pub async fn register(&self, email: &str, password: &str) -> Result<RegisteredUser, FetchError> {
        self.auth.register(email, password).await
    }

    pub fn logout(&self) {
        self.session.logout();
    }

    /// A loader for one weather view; drop or `close()` it when the view goes away.
    pub fn weather_loader(&self) -> WeatherLoader {
        WeatherLoader::new(Arc::clone(&self.weather))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn search(&self) -> &LocationSearch {
        &self.search
    }

    /// Let in-flight location syncs finish. Each is bounded by the request timeout.
    pub async fn shutdown(&self) {
        let pending = self.session.pending_sync();
        if pending > 0 {
            tracing::debug!("Waiting for {} location syncs", pending);
        }
        self.session.wait_for_sync().await;

        tracing::info!(
            "Shutting down with {} saved locations",
            self.session.locations().len()
        );
    }
}
