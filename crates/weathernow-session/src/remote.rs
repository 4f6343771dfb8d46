//! Server-side copy of the user's saved locations.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use url::Url;

use weathernow_core::http::{build_client, expect_success, join_path, parse_base_url};
use weathernow_core::{BackendConfig, FetchError, Location, ReqwestErrorExt};

/// Mirrors location adds and deletes to the backend for a logged-in user.
///
/// Called from detached tasks; callers log failures and never retry.
#[async_trait]
pub trait LocationSync: Send + Sync {
    async fn add(&self, email: &str, token: &str, location: &Location) -> Result<(), FetchError>;
    async fn delete(&self, email: &str, token: &str, location: &Location)
        -> Result<(), FetchError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddLocationBody<'a> {
    json_user_email: &'a str,
    json_lat_coords: f64,
    json_long_coords: f64,
    json_city: &'a str,
    json_country: Option<&'a str>,
    json_state: Option<&'a str>,
    json_zipcode: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteLocationBody<'a> {
    json_user_email: &'a str,
    json_lat_coords: f64,
    json_long_coords: f64,
}

/// HTTP implementation over `/mobileLocations/*`
#[derive(Debug, Clone)]
pub struct HttpLocationSync {
    client: Arc<Client>,
    base_url: Url,
}

impl HttpLocationSync {
    pub fn new(backend: &BackendConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: Arc::new(build_client(backend.request_timeout())?),
            base_url: parse_base_url(&backend.base_url)?,
        })
    }
}

#[async_trait]
impl LocationSync for HttpLocationSync {
    async fn add(&self, email: &str, token: &str, location: &Location) -> Result<(), FetchError> {
        let url = join_path(&self.base_url, &["mobileLocations", "add"]);
        let body = AddLocationBody {
            json_user_email: email,
            json_lat_coords: location.lat_coords,
            json_long_coords: location.long_coords,
            json_city: &location.city,
            json_country: location.country.as_deref(),
            json_state: location.state.as_deref(),
            json_zipcode: location.zipcode.as_deref(),
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.into_fetch_error())?;
        expect_success(response).await?;

        tracing::debug!("Saved {} to server for {}", location.city, email);
        Ok(())
    }

    async fn delete(
        &self,
        email: &str,
        token: &str,
        location: &Location,
    ) -> Result<(), FetchError> {
        let url = join_path(&self.base_url, &["mobileLocations", "delete"]);
        let body = DeleteLocationBody {
            json_user_email: email,
            json_lat_coords: location.lat_coords,
            json_long_coords: location.long_coords,
        };

        let response = self
            .client
            .delete(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.into_fetch_error())?;
        expect_success(response).await?;

        tracing::debug!("Removed {} from server for {}", location.city, email);
        Ok(())
    }
}
