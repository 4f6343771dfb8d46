//! Centralized error types for the WeatherNow client.
//!
//! This module provides a typed error hierarchy that:
//! - Gives every fetch boundary an explicit `Result<T, FetchError>`
//! - Provides user-friendly messages suitable for UI display
//! - Preserves full error context for debugging/logging

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a UI-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display in the UI.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Fetch(e) => e.user_message(),
            AppError::Persistence(e) => e.user_message().to_string(),
            AppError::Config(e) => e.user_message().to_string(),
            AppError::Io(_) => "A file operation failed. Please try again.".to_string(),
            AppError::Other(_) => "An unexpected error occurred. Please try again.".to_string(),
        }
    }
}

/// Errors at a network fetch boundary (weather, search, login, location sync).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// The request never completed.
    #[error("Connection failed: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    /// Non-2xx response carrying the server-supplied message.
    #[error("Backend error: {status} - {message}")]
    Backend { status: u16, message: String },

    /// Input rejected before any request was issued.
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl FetchError {
    /// Backend messages are shown verbatim; everything else maps to a canned message.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Network(_) => "Unable to connect. Check your internet connection.".to_string(),
            FetchError::Timeout => "The request timed out. Please try again.".to_string(),
            FetchError::Backend { status, .. } if *status >= 500 => {
                "The server is experiencing issues. Please try again later.".to_string()
            }
            FetchError::Backend { message, .. } if !message.is_empty() => message.clone(),
            FetchError::Backend { .. } => "The request failed. Please try again.".to_string(),
            FetchError::Validation(msg) => msg.clone(),
            FetchError::InvalidResponse(_) => {
                "Received an unexpected response. Please try again.".to_string()
            }
        }
    }

    /// The message the backend put in its `{error}` body, if any.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            FetchError::Backend { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Local persistence failures (general key-value store, secret store).
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Local storage error: {0}")]
    Local(String),

    #[error("Secure storage error: {0}")]
    Secret(String),
}

impl PersistenceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            PersistenceError::Local(_) => "Unable to save data on this device.",
            PersistenceError::Secret(_) => "Failed to save credentials. Please try again.",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_fetch_error(self) -> FetchError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_fetch_error(self) -> FetchError {
        if self.is_timeout() {
            FetchError::Timeout
        } else if self.is_decode() {
            FetchError::InvalidResponse(self.to_string())
        } else if let Some(status) = self.status() {
            FetchError::Backend {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else {
            FetchError::Network(self.to_string())
        }
    }
}
