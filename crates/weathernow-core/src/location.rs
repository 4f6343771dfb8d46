//! Saved location model shared by search, weather, and session crates.

use serde::{Deserialize, Serialize};

/// A named geographic point the user tracks for weather.
///
/// Serialized in camelCase; this is the shape the backend returns on login
/// and the shape kept under the `locations` key in local storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zipcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub lat_coords: f64,
    pub long_coords: f64,
}

impl Location {
    pub fn new(city: impl Into<String>, lat_coords: f64, long_coords: f64) -> Self {
        Self {
            city: city.into(),
            state: None,
            zipcode: None,
            country: None,
            lat_coords,
            long_coords,
        }
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_zipcode(mut self, zipcode: impl Into<String>) -> Self {
        self.zipcode = Some(zipcode.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Identity is the exact coordinate pair, not a distance test.
    pub fn same_place(&self, other: &Location) -> bool {
        self.lat_coords == other.lat_coords && self.long_coords == other.long_coords
    }

    /// Header subtitle, e.g. "NV, US".
    pub fn region_label(&self) -> String {
        [self.state.as_deref(), self.country.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
