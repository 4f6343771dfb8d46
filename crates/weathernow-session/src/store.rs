//! The session store: current user, token, and saved locations.
//!
//! Local storage is written through on every mutation. When a user is logged
//! in, location changes are also mirrored to the backend by detached tasks
//! whose outcome is only logged. A failed remote call never rolls back local
//! state. Pending sync tasks are tracked so a short-lived process can wait
//! for them before exiting.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;

use weathernow_auth::{LoginPayload, SecretStore};
use weathernow_core::Location;

use crate::kv::{KeyValueStore, LOCATIONS_KEY, USER_KEY};
use crate::remote::LocationSync;

/// Most locations a session may hold
pub const MAX_LOCATIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Location limit reached (max {max})")]
    LocationLimitReached { max: usize },
}

impl SessionError {
    pub fn user_message(&self) -> String {
        match self {
            SessionError::LocationLimitReached { max } => {
                format!("You can save up to {} locations. Delete one to add another.", max)
            }
        }
    }
}

/// Point-in-time copy of the session state.
#[derive(Clone, Default, PartialEq)]
pub struct Session {
    pub user: Option<String>,
    pub token: Option<String>,
    pub locations: Vec<Location>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("locations", &self.locations)
            .finish()
    }
}

/// Shape persisted under the `user` key
#[derive(Debug, Serialize)]
struct StoredUser<'a> {
    email: &'a str,
    locations: &'a [Location],
}

/// The part of the `user` record needed to resume a session
#[derive(Debug, Deserialize)]
struct SavedUser {
    email: String,
}

#[derive(Clone, Copy, Debug)]
enum SyncOp {
    Add,
    Delete,
}

/// Keep the first entry of each identity, preserving order.
fn dedupe(locations: Vec<Location>) -> Vec<Location> {
    let mut unique: Vec<Location> = Vec::with_capacity(locations.len());
    for location in locations {
        if !unique.iter().any(|l| l.same_place(&location)) {
            unique.push(location);
        }
    }
    unique
}

pub struct SessionStore {
    state: RwLock<Session>,
    kv: Arc<dyn KeyValueStore>,
    secrets: Arc<dyn SecretStore>,
    sync: Arc<dyn LocationSync>,
    runtime: Handle,
    tasks: TaskTracker,
}

impl SessionStore {
    /// Build an empty store. Call [`SessionStore::restore`] to hydrate from disk.
    ///
    /// Remote sync tasks are spawned on `runtime`.
    pub fn new(
        kv: Arc<dyn KeyValueStore>,
        secrets: Arc<dyn SecretStore>,
        sync: Arc<dyn LocationSync>,
        runtime: Handle,
    ) -> Self {
        Self {
            state: RwLock::new(Session::default()),
            kv,
            secrets,
            sync,
            runtime,
            tasks: TaskTracker::new(),
        }
    }

    /// Load saved locations from local storage. Missing or corrupt data
    /// leaves the list empty. No remote call is made.
    pub fn restore(&self) {
        let locations = match self.kv.get(LOCATIONS_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Location>>(&raw) {
                Ok(locations) => locations,
                Err(e) => {
                    tracing::warn!("Ignoring unreadable saved locations: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::error!("Failed to read saved locations: {}", e);
                Vec::new()
            }
        };

        let mut locations = dedupe(locations);
        if locations.len() > MAX_LOCATIONS {
            tracing::warn!(
                "Saved list has {} locations, keeping the first {}",
                locations.len(),
                MAX_LOCATIONS
            );
            locations.truncate(MAX_LOCATIONS);
        }

        tracing::info!("Restored {} saved locations", locations.len());
        self.state.write().locations = locations;
    }

    /// Pick up the session left by a previous `login`: the email saved under
    /// the `user` key plus the token in secure storage.
    ///
    /// Both must be present; otherwise the store stays logged out. Returns
    /// whether a session was resumed. No remote call is made.
    pub fn resume(&self) -> bool {
        let email = match self.kv.get(USER_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<SavedUser>(&raw) {
                Ok(saved) => saved.email,
                Err(e) => {
                    tracing::warn!("Ignoring unreadable saved user: {}", e);
                    return false;
                }
            },
            Ok(None) => return false,
            Err(e) => {
                tracing::error!("Failed to read saved user: {}", e);
                return false;
            }
        };

        let token = match self.secrets.retrieve_token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                tracing::warn!("Saved user {} has no session token, staying logged out", email);
                return false;
            }
            Err(e) => {
                tracing::error!("Failed to read session token: {}", e);
                return false;
            }
        };

        let mut state = self.state.write();
        tracing::info!("Resumed session for {}", email);
        state.user = Some(email);
        state.token = Some(token);
        true
    }

    /// Replace the whole list. Duplicates are dropped; more than
    /// [`MAX_LOCATIONS`] unique entries is rejected.
    pub fn set_locations(&self, locations: Vec<Location>) -> Result<(), SessionError> {
        let locations = dedupe(locations);
        if locations.len() > MAX_LOCATIONS {
            return Err(SessionError::LocationLimitReached { max: MAX_LOCATIONS });
        }

        let mut state = self.state.write();
        state.locations = locations;
        self.persist_locations(&state.locations);
        Ok(())
    }

    /// Append `location` unless one with the same coordinates is saved.
    ///
    /// Returns `Ok(false)` for a duplicate.
    pub fn add_location(&self, location: Location) -> Result<bool, SessionError> {
        let mut state = self.state.write();
        if state.locations.iter().any(|l| l.same_place(&location)) {
            tracing::debug!("{} is already saved", location.city);
            return Ok(false);
        }
        if state.locations.len() >= MAX_LOCATIONS {
            return Err(SessionError::LocationLimitReached { max: MAX_LOCATIONS });
        }

        tracing::info!("Adding location {}", location.city);
        state.locations.push(location.clone());
        self.persist_locations(&state.locations);
        self.spawn_sync(&state, SyncOp::Add, location);
        Ok(true)
    }

    /// Remove the saved location with the same coordinates as `location`.
    ///
    /// Returns `false` when nothing matched.
    pub fn delete_location(&self, location: &Location) -> bool {
        let mut state = self.state.write();
        let Some(index) = state.locations.iter().position(|l| l.same_place(location)) else {
            return false;
        };

        let removed = state.locations.remove(index);
        tracing::info!("Deleting location {}", removed.city);
        self.persist_locations(&state.locations);
        self.spawn_sync(&state, SyncOp::Delete, removed);
        true
    }

    /// Adopt a successful login: user, token, and the server's location list.
    pub fn login(&self, payload: LoginPayload) {
        let LoginPayload {
            email,
            token,
            locations,
        } = payload;

        let mut locations = dedupe(locations.unwrap_or_default());
        if locations.len() > MAX_LOCATIONS {
            tracing::warn!(
                "Server returned {} locations for {}, keeping the first {}",
                locations.len(),
                email,
                MAX_LOCATIONS
            );
            locations.truncate(MAX_LOCATIONS);
        }

        if let Err(e) = self.secrets.store_token(&token) {
            tracing::error!("Failed to persist session token: {}", e);
        }

        let mut state = self.state.write();
        self.persist_user(&email, &locations);
        self.persist_locations(&locations);
        state.user = Some(email);
        state.token = Some(token);
        state.locations = locations;

        tracing::info!(
            "Session started with {} saved locations",
            state.locations.len()
        );
    }

    /// Clear user, token, and locations, locally and in secure storage.
    pub fn logout(&self) {
        let mut state = self.state.write();
        *state = Session::default();

        if let Err(e) = self.kv.remove(USER_KEY) {
            tracing::error!("Failed to remove saved user: {}", e);
        }
        self.persist_locations(&state.locations);
        if let Err(e) = self.secrets.delete_token() {
            tracing::error!("Failed to delete session token: {}", e);
        }

        tracing::info!("Session ended");
    }

    pub fn user(&self) -> Option<String> {
        self.state.read().user.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state.read().token.clone()
    }

    pub fn locations(&self) -> Vec<Location> {
        self.state.read().locations.clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.read().user.is_some()
    }

    /// True once [`MAX_LOCATIONS`] are saved; the view disables "add".
    pub fn is_full(&self) -> bool {
        self.state.read().locations.len() >= MAX_LOCATIONS
    }

    pub fn snapshot(&self) -> Session {
        self.state.read().clone()
    }

    /// Number of remote sync tasks still running
    pub fn pending_sync(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for every remote sync spawned so far. New syncs may still be
    /// spawned afterwards.
    pub async fn wait_for_sync(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    fn persist_locations(&self, locations: &[Location]) {
        let result = serde_json::to_string(locations)
            .map_err(|e| e.to_string())
            .and_then(|json| {
                self.kv
                    .set(LOCATIONS_KEY, &json)
                    .map_err(|e| e.to_string())
            });
        if let Err(e) = result {
            tracing::error!("Failed to save locations: {}", e);
        }
    }

    fn persist_user(&self, email: &str, locations: &[Location]) {
        let result = serde_json::to_string(&StoredUser { email, locations })
            .map_err(|e| e.to_string())
            .and_then(|json| self.kv.set(USER_KEY, &json).map_err(|e| e.to_string()));
        if let Err(e) = result {
            tracing::error!("Failed to save user: {}", e);
        }
    }

    /// Fire-and-forget mirror of a location change for the logged-in user.
    fn spawn_sync(&self, state: &Session, op: SyncOp, location: Location) {
        let (Some(email), Some(token)) = (state.user.clone(), state.token.clone()) else {
            return;
        };

        let sync = Arc::clone(&self.sync);
        self.tasks.spawn_on(
            async move {
                let result = match op {
                    SyncOp::Add => sync.add(&email, &token, &location).await,
                    SyncOp::Delete => sync.delete(&email, &token, &location).await,
                };
                match result {
                    Ok(()) => tracing::debug!("Remote {:?} of {} succeeded", op, location.city),
                    Err(e) => tracing::warn!("Remote {:?} of {} failed: {}", op, location.city, e),
                }
            },
            &self.runtime,
        );
    }
}
