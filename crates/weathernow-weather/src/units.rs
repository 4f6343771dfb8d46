//! Display conversions for raw forecast fields.
//!
//! Everything here is pure. Timestamps are Unix seconds as the backend sends them.

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

const MM_PER_INCH: f64 = 25.4;
const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

fn utc_from_unix(unix_seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(unix_seconds, 0).unwrap_or_default()
}

/// "h:mm AM" in the system's local time zone.
pub fn to_meridiem_time(unix_seconds: i64) -> String {
    to_meridiem_time_in(unix_seconds, &Local)
}

/// "h:mm AM" in an explicit time zone.
pub fn to_meridiem_time_in<Tz: TimeZone>(unix_seconds: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    utc_from_unix(unix_seconds)
        .with_timezone(tz)
        .format("%-I:%M %p")
        .to_string()
}

/// "h AM" label for the hourly strip, local time zone.
pub fn to_hour_label(unix_seconds: i64) -> String {
    to_hour_label_in(unix_seconds, &Local)
}

pub fn to_hour_label_in<Tz: TimeZone>(unix_seconds: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    utc_from_unix(unix_seconds)
        .with_timezone(tz)
        .format("%-I %p")
        .to_string()
}

/// Long weekday name of the UTC calendar date.
///
/// Daily timestamps are aligned to UTC day boundaries, so the viewer's zone is
/// deliberately ignored here.
pub fn to_weekday(unix_seconds: i64) -> String {
    utc_from_unix(unix_seconds).format("%A").to_string()
}

/// Compass bucket for a wind bearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindDirection {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    /// Present for completeness; `wind_direction` folds west into `NW`.
    W,
    NW,
}

impl WindDirection {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Self::N => "N",
            Self::NE => "NE",
            Self::E => "E",
            Self::SE => "SE",
            Self::S => "S",
            Self::SW => "SW",
            Self::W => "W",
            Self::NW => "NW",
        }
    }

    /// Long label, e.g. "NorthEast wind"
    pub fn label(&self) -> &'static str {
        match self {
            Self::N => "North wind",
            Self::NE => "NorthEast wind",
            Self::E => "East wind",
            Self::SE => "SouthEast wind",
            Self::S => "South wind",
            Self::SW => "SouthWest wind",
            Self::W => "West wind",
            Self::NW => "NorthWest wind",
        }
    }
}

impl std::fmt::Display for WindDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// Map a bearing in degrees to a compass bucket.
///
/// Seven buckets: there is no distinct west, (255, 345] is NW. Everything
/// above 345 up to 360 is N. Returns `None` outside [0, 360].
pub fn wind_direction(degrees: f64) -> Option<WindDirection> {
    if !(0.0..=360.0).contains(&degrees) {
        return None;
    }

    let direction = if degrees <= 15.0 {
        WindDirection::N
    } else if degrees <= 75.0 {
        WindDirection::NE
    } else if degrees <= 105.0 {
        WindDirection::E
    } else if degrees <= 165.0 {
        WindDirection::SE
    } else if degrees <= 195.0 {
        WindDirection::S
    } else if degrees <= 255.0 {
        WindDirection::SW
    } else if degrees <= 345.0 {
        WindDirection::NW
    } else {
        WindDirection::N
    };
    Some(direction)
}

/// Millimeters to inches, rounded to 3 decimal places.
pub fn precipitation_inches(mm: f64) -> f64 {
    (mm / MM_PER_INCH * 1000.0).round() / 1000.0
}

/// "1.5 km" at or above 1000 m, "800 m" below.
pub fn visibility_label(meters: u32) -> String {
    if meters >= 1000 {
        format!("{} km", f64::from(meters) / 1000.0)
    } else {
        format!("{} m", meters)
    }
}

/// Probability of precipitation (0.0..=1.0) as a whole percent.
pub fn precipitation_percent(pop: f64) -> u8 {
    (pop.clamp(0.0, 1.0) * 100.0).round() as u8
}

pub fn icon_url(icon: &str) -> String {
    format!("{}/{}@2x.png", ICON_BASE_URL, icon)
}

pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Screen background chosen from a condition code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundCategory {
    Thunderstorm,
    Rain,
    Snow,
    Mist,
    Smoke,
    Fog,
    Dust,
    Sand,
    Ash,
    Squall,
    Tornado,
    Clear,
    Clouds,
    #[default]
    Default,
}

impl BackgroundCategory {
    /// Bundled image for this background. Sand reuses dust, squall reuses thunderstorm.
    pub fn image_asset(&self) -> &'static str {
        match self {
            Self::Thunderstorm | Self::Squall => "thunderstorm.jpg",
            Self::Rain => "rain.jpeg",
            Self::Snow => "snowfall.png",
            Self::Mist => "mist.jpg",
            Self::Smoke => "smoke.jpg",
            Self::Fog => "fog.jpg",
            Self::Dust | Self::Sand => "dust.jpg",
            Self::Ash => "ash.jpg",
            Self::Tornado => "tornado.jpg",
            Self::Clear => "clearSky.jpg",
            Self::Clouds => "clouds.jpg",
            Self::Default => "default.jpg",
        }
    }
}

/// Group dispatch first, then the exact 7xx atmosphere codes.
pub fn background_category(code: u16) -> BackgroundCategory {
    match code {
        200..=299 => BackgroundCategory::Thunderstorm,
        300..=399 | 500..=599 => BackgroundCategory::Rain,
        600..=699 => BackgroundCategory::Snow,
        701 => BackgroundCategory::Mist,
        711 => BackgroundCategory::Smoke,
        721 | 741 => BackgroundCategory::Fog,
        731 | 761 => BackgroundCategory::Dust,
        751 => BackgroundCategory::Sand,
        762 => BackgroundCategory::Ash,
        771 => BackgroundCategory::Squall,
        781 => BackgroundCategory::Tornado,
        800 => BackgroundCategory::Clear,
        801..=899 => BackgroundCategory::Clouds,
        _ => BackgroundCategory::Default,
    }
}
