//! Weather data for WeatherNow
//!
//! Fetches forecasts and geocoding results from the WeatherNow backend and
//! turns raw forecast fields into display-ready values.

pub mod loader;
pub mod provider;
pub mod search;
pub mod types;
pub mod units;

pub use loader::{LoadOutcome, WeatherLoader};
pub use provider::WeatherProvider;
pub use search::{search_segment, CandidateLocation, LocationSearch};
pub use types::*;
pub use units::{BackgroundCategory, WindDirection};
