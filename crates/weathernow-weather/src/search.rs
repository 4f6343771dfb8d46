//! Location search: city/state/country or zipcode lookups against the backend
//! geocoding endpoints.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use url::Url;

use weathernow_core::http::{build_client, decode_json, join_path, parse_base_url};
use weathernow_core::{BackendConfig, FetchError, Location, ReqwestErrorExt};

/// Country assumed when a state is given without one.
pub const DEFAULT_COUNTRY_FOR_STATE: &str = "US";

/// A search hit that has not been saved yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateLocation {
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zipcode: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

impl CandidateLocation {
    /// Result list label, e.g. "Reno, NV 89501"
    pub fn label(&self) -> String {
        let mut label = format!("{}, ", self.name);
        if let Some(state) = &self.state {
            label.push_str(state);
        }
        if let Some(zipcode) = &self.zipcode {
            label.push(' ');
            label.push_str(zipcode);
        }
        label.trim_end_matches([',', ' ']).to_string()
    }

    pub fn to_location(&self) -> Location {
        self.clone().into()
    }
}

impl From<CandidateLocation> for Location {
    fn from(candidate: CandidateLocation) -> Self {
        Location {
            city: candidate.name,
            state: candidate.state,
            zipcode: candidate.zipcode,
            country: candidate.country,
            lat_coords: candidate.lat,
            long_coords: candidate.lon,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Build the comma-delimited search segment `primary[,state][,country]`.
///
/// Blank optional fields count as absent. A state without a country gets
/// [`DEFAULT_COUNTRY_FOR_STATE`]. A blank primary field is rejected.
pub fn search_segment(
    primary: &str,
    state: Option<&str>,
    country: Option<&str>,
) -> Result<String, FetchError> {
    let primary = primary.trim();
    if primary.is_empty() {
        return Err(FetchError::Validation(
            "Enter a city or zipcode to search".to_string(),
        ));
    }

    let state = non_blank(state);
    let country = non_blank(country).or(state.map(|_| DEFAULT_COUNTRY_FOR_STATE));

    let mut parts = vec![primary];
    parts.extend(state);
    parts.extend(country);
    Ok(parts.join(","))
}

/// Location search adapter.
#[derive(Debug, Clone)]
pub struct LocationSearch {
    client: Arc<Client>,
    base_url: Url,
}

impl LocationSearch {
    pub fn new(backend: &BackendConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: Arc::new(build_client(backend.request_timeout())?),
            base_url: parse_base_url(&backend.base_url)?,
        })
    }

    /// Search by city, optionally narrowed by state and country.
    ///
    /// An empty vector means "no matches", not an error.
    #[instrument(skip(self), level = "debug")]
    pub async fn search_by_city(
        &self,
        city: &str,
        state: Option<&str>,
        country: Option<&str>,
    ) -> Result<Vec<CandidateLocation>, FetchError> {
        let segment = search_segment(city, state, country)?;
        self.search("citySearch", &segment).await
    }

    /// Search by zipcode (or city), optionally narrowed by country.
    #[instrument(skip(self), level = "debug")]
    pub async fn search_by_zipcode(
        &self,
        zipcode: &str,
        country: Option<&str>,
    ) -> Result<Vec<CandidateLocation>, FetchError> {
        let segment = search_segment(zipcode, None, country)?;
        self.search("zipcodeSearch", &segment).await
    }

    async fn search(&self, endpoint: &str, segment: &str) -> Result<Vec<CandidateLocation>, FetchError> {
        let url = join_path(&self.base_url, &["search", endpoint, segment]);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.into_fetch_error())?;

        let results: Vec<CandidateLocation> = decode_json(response).await.map_err(|e| {
            tracing::warn!("Error searching for {}: {}", segment, e);
            e
        })?;

        if results.is_empty() {
            tracing::info!("No matches found for {}", segment.replace(',', ", "));
        }
        Ok(results)
    }
}
