use serde::{Deserialize, Serialize};

use crate::units::{self, BackgroundCategory};

/// One entry of the `weather` array attached to every record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionInfo {
    /// 3-digit condition code (2xx thunderstorm ... 8xx clouds)
    pub id: u16,
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

impl ConditionInfo {
    pub fn icon_url(&self) -> String {
        units::icon_url(&self.icon)
    }

    /// Description with its first letter capitalized, e.g. "Light rain"
    pub fn display_description(&self) -> String {
        units::capitalize_first(&self.description)
    }
}

/// Current conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub dt: i64,
    #[serde(default)]
    pub sunrise: Option<i64>,
    #[serde(default)]
    pub sunset: Option<i64>,
    pub temp: f64,
    pub feels_like: f64,
    #[serde(default)]
    pub pressure: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub uvi: Option<f64>,
    #[serde(default)]
    pub clouds: Option<f64>,
    #[serde(default)]
    pub visibility: Option<u32>,
    #[serde(default)]
    pub wind_speed: f64,
    #[serde(default)]
    pub wind_deg: Option<f64>,
    #[serde(default)]
    pub wind_gust: Option<f64>,
    #[serde(default)]
    pub weather: Vec<ConditionInfo>,
}

impl CurrentWeather {
    pub fn condition(&self) -> Option<&ConditionInfo> {
        self.weather.first()
    }

    /// Background for the weather screen, driven by the current condition code
    pub fn background(&self) -> BackgroundCategory {
        self.condition()
            .map(|c| units::background_category(c.id))
            .unwrap_or_default()
    }
}

/// Hourly forecast entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyWeather {
    pub dt: i64,
    pub temp: f64,
    #[serde(default)]
    pub feels_like: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub visibility: Option<u32>,
    #[serde(default)]
    pub wind_speed: f64,
    #[serde(default)]
    pub wind_deg: Option<f64>,
    #[serde(default)]
    pub wind_gust: Option<f64>,
    /// Probability of precipitation, 0.0..=1.0
    #[serde(default)]
    pub pop: f64,
    #[serde(default)]
    pub weather: Vec<ConditionInfo>,
}

impl HourlyWeather {
    pub fn condition(&self) -> Option<&ConditionInfo> {
        self.weather.first()
    }
}

/// Daily temperature spread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTemperature {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub day: Option<f64>,
    #[serde(default)]
    pub night: Option<f64>,
    #[serde(default)]
    pub eve: Option<f64>,
    #[serde(default)]
    pub morn: Option<f64>,
}

/// Daily forecast entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyWeather {
    pub dt: i64,
    #[serde(default)]
    pub sunrise: Option<i64>,
    #[serde(default)]
    pub sunset: Option<i64>,
    #[serde(default)]
    pub moonrise: Option<i64>,
    #[serde(default)]
    pub moonset: Option<i64>,
    #[serde(default)]
    pub moon_phase: Option<f64>,
    #[serde(default)]
    pub summary: Option<String>,
    pub temp: DailyTemperature,
    #[serde(default)]
    pub pressure: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub uvi: Option<f64>,
    #[serde(default)]
    pub clouds: Option<f64>,
    #[serde(default)]
    pub wind_speed: f64,
    #[serde(default)]
    pub wind_deg: Option<f64>,
    #[serde(default)]
    pub wind_gust: Option<f64>,
    #[serde(default)]
    pub pop: f64,
    /// Rain volume in mm
    #[serde(default)]
    pub rain: Option<f64>,
    /// Snow volume in mm
    #[serde(default)]
    pub snow: Option<f64>,
    #[serde(default)]
    pub weather: Vec<ConditionInfo>,
}

impl DailyWeather {
    pub fn condition(&self) -> Option<&ConditionInfo> {
        self.weather.first()
    }

    pub fn rain_inches(&self) -> Option<f64> {
        self.rain.map(units::precipitation_inches)
    }

    pub fn snow_inches(&self) -> Option<f64> {
        self.snow.map(units::precipitation_inches)
    }
}

/// Government weather alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(default)]
    pub sender_name: String,
    pub event: String,
    pub start: i64,
    pub end: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Raw `getWeather` success body, before slicing
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherPayload {
    pub current: CurrentWeather,
    #[serde(default)]
    pub hourly: Vec<HourlyWeather>,
    #[serde(default)]
    pub daily: Vec<DailyWeather>,
    #[serde(default)]
    pub alerts: Option<Vec<Alert>>,
}

/// Display-ready weather for one location.
///
/// Transient: owned by the view that requested it and never cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    pub current: CurrentWeather,
    /// Source daily index 0; supplies today's high/low for the current header.
    pub today: Option<DailyWeather>,
    pub hourly: Vec<HourlyWeather>,
    /// Upcoming days only, today excluded.
    pub daily: Vec<DailyWeather>,
    pub alerts: Vec<Alert>,
}

impl WeatherSnapshot {
    /// Slice a raw payload: keep the first `hourly_limit` hours, split off today.
    pub fn from_payload(payload: WeatherPayload, hourly_limit: usize) -> Self {
        let WeatherPayload {
            current,
            mut hourly,
            daily,
            alerts,
        } = payload;

        hourly.truncate(hourly_limit);

        let mut days = daily.into_iter();
        let today = days.next();

        Self {
            current,
            today,
            hourly,
            daily: days.collect(),
            alerts: alerts.unwrap_or_default(),
        }
    }

    pub fn has_alerts(&self) -> bool {
        !self.alerts.is_empty()
    }

    pub fn background(&self) -> BackgroundCategory {
        self.current.background()
    }
}
