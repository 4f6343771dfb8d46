//! Account login and registration against the WeatherNow backend.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

use weathernow_core::http::{build_client, decode_json, join_path, parse_base_url};
use weathernow_core::{BackendConfig, FetchError, Location, ReqwestErrorExt};

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// Successful `/user/login` body: the account, its token, and any saved locations
#[derive(Clone, PartialEq, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub token: String,
    #[serde(default)]
    pub locations: Option<Vec<Location>>,
}

impl std::fmt::Debug for LoginPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginPayload")
            .field("email", &self.email)
            .field("token", &"<redacted>")
            .field("locations", &self.locations)
            .finish()
    }
}

/// Successful `/user/register` body
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegisteredUser {
    pub email: String,
}

/// Backend account client
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: Arc<Client>,
    base_url: Url,
}

impl AuthClient {
    pub fn new(backend: &BackendConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: Arc::new(build_client(backend.request_timeout())?),
            base_url: parse_base_url(&backend.base_url)?,
        })
    }

    /// Log in with email and password.
    ///
    /// The payload is handed to `SessionStore::login`; this client keeps no state.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginPayload, FetchError> {
        let payload: LoginPayload = self.post_credentials("login", email, password).await?;
        tracing::info!("Logged in as {}", payload.email);
        Ok(payload)
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, email: &str, password: &str) -> Result<RegisteredUser, FetchError> {
        let user: RegisteredUser = self.post_credentials("register", email, password).await?;
        tracing::info!("Registered account {}", user.email);
        Ok(user)
    }

    async fn post_credentials<T: serde::de::DeserializeOwned>(
        &self,
        action: &str,
        email: &str,
        password: &str,
    ) -> Result<T, FetchError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(FetchError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let url = join_path(&self.base_url, &["user", action]);
        let response = self
            .client
            .post(url)
            .json(&Credentials { email, password })
            .send()
            .await
            .map_err(|e| e.into_fetch_error())?;

        decode_json(response).await.map_err(|e| {
            tracing::warn!("Account {} failed for {}: {}", action, email, e);
            e
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> AuthClient {
        AuthClient::new(&BackendConfig {
            base_url: server.uri(),
            request_timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_login_with_locations() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/user/login"))
            .and(body_json(serde_json::json!({"email": "a@b.com", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "email": "a@b.com",
                "token": "t1",
                "locations": [{"city": "Reno", "latCoords": 39.5, "longCoords": -119.8}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let payload = client_for(&mock_server).login("a@b.com", "pw").await.unwrap();

        assert_eq!(payload.email, "a@b.com");
        assert_eq!(payload.token, "t1");
        assert_eq!(payload.locations.map(|l| l.len()), Some(1));
    }

    #[tokio::test]
    async fn test_login_without_locations() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/user/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "email": "a@b.com",
                "token": "t1"
            })))
            .mount(&mock_server)
            .await;

        let payload = client_for(&mock_server).login("a@b.com", "pw").await.unwrap();
        assert!(payload.locations.is_none());
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/user/login"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"error": "Incorrect password"})),
            )
            .mount(&mock_server)
            .await;

        let err = client_for(&mock_server).login("a@b.com", "bad").await.unwrap_err();
        assert_eq!(err.user_message(), "Incorrect password");
    }

    #[tokio::test]
    async fn test_register() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/user/register"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"email": "new@b.com"})),
            )
            .mount(&mock_server)
            .await;

        let user = client_for(&mock_server).register("new@b.com", "pw").await.unwrap();
        assert_eq!(user.email, "new@b.com");
    }

    #[tokio::test]
    async fn test_blank_credentials_rejected_locally() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let err = client_for(&mock_server).login("  ", "pw").await.unwrap_err();
        assert!(matches!(err, FetchError::Validation(_)));
    }

    #[test]
    fn test_payload_debug_hides_token() {
        let payload = LoginPayload {
            email: "a@b.com".into(),
            token: "secret-token".into(),
            locations: None,
        };
        let debug = format!("{:?}", payload);
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("a@b.com"));
    }
}
