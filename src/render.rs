//! Plain-text rendering of weather snapshots for the terminal.

use weathernow_core::Location;
use weathernow_weather::units::{
    precipitation_percent, to_hour_label, to_meridiem_time, to_weekday, visibility_label,
    wind_direction,
};
use weathernow_weather::{CandidateLocation, WeatherSnapshot};

/// Hourly entries shown in the terminal strip
const HOURLY_PREVIEW: usize = 8;

fn temp(value: f64) -> String {
    format!("{}°", value.round())
}

fn wind_line(speed: f64, degrees: Option<f64>) -> String {
    match degrees.and_then(wind_direction) {
        Some(direction) => format!("{} mph {}", speed.round(), direction.label()),
        None => format!("{} mph", speed.round()),
    }
}

pub fn location_header(location: &Location) -> String {
    let region = location.region_label();
    if region.is_empty() {
        location.city.clone()
    } else {
        format!("{}, {}", location.city, region)
    }
}

/// Current-conditions block
pub fn current(location: &Location, snapshot: &WeatherSnapshot) -> Vec<String> {
    let now = &snapshot.current;
    let mut lines = vec![location_header(location)];

    let description = now
        .condition()
        .map(|c| c.display_description())
        .unwrap_or_default();
    lines.push(format!(
        "{} {} (feels like {})",
        temp(now.temp),
        description,
        temp(now.feels_like)
    ));

    if let Some(today) = &snapshot.today {
        lines.push(format!(
            "H: {}  L: {}",
            temp(today.temp.max),
            temp(today.temp.min)
        ));
    }

    lines.push(format!("Wind: {}", wind_line(now.wind_speed, now.wind_deg)));
    if let Some(visibility) = now.visibility {
        lines.push(format!("Visibility: {}", visibility_label(visibility)));
    }
    if let (Some(sunrise), Some(sunset)) = (now.sunrise, now.sunset) {
        lines.push(format!(
            "Sunrise {}  Sunset {}",
            to_meridiem_time(sunrise),
            to_meridiem_time(sunset)
        ));
    }
    lines.push(format!("Background: {}", snapshot.background().image_asset()));
    lines
}

pub fn hourly(snapshot: &WeatherSnapshot) -> Vec<String> {
    snapshot
        .hourly
        .iter()
        .take(HOURLY_PREVIEW)
        .map(|hour| {
            format!(
                "{:>6}  {:>5}  {:>3}% precip",
                to_hour_label(hour.dt),
                temp(hour.temp),
                precipitation_percent(hour.pop)
            )
        })
        .collect()
}

pub fn daily(snapshot: &WeatherSnapshot) -> Vec<String> {
    snapshot
        .daily
        .iter()
        .map(|day| {
            let mut line = format!(
                "{:<10} {:>5} / {:<5}",
                to_weekday(day.dt),
                temp(day.temp.max),
                temp(day.temp.min)
            );
            if let Some(rain) = day.rain_inches() {
                line.push_str(&format!(" rain {:.3} in", rain));
            }
            if let Some(snow) = day.snow_inches() {
                line.push_str(&format!(" snow {:.3} in", snow));
            }
            line
        })
        .collect()
}

pub fn alerts(snapshot: &WeatherSnapshot) -> Vec<String> {
    snapshot
        .alerts
        .iter()
        .map(|alert| format!("! {} ({})", alert.event, alert.sender_name))
        .collect()
}

pub fn candidates(results: &[CandidateLocation]) -> Vec<String> {
    results
        .iter()
        .enumerate()
        .map(|(i, candidate)| format!("{:>2}. {}", i + 1, candidate.label()))
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use weathernow_weather::WeatherPayload;

    fn snapshot() -> WeatherSnapshot {
        let payload: WeatherPayload = serde_json::from_value(serde_json::json!({
            "current": {
                "dt": 1_700_000_000,
                "temp": 51.4,
                "feels_like": 49.6,
                "wind_speed": 7.2,
                "wind_deg": 16,
                "visibility": 10000,
                "weather": [{"id": 801, "main": "Clouds", "description": "few clouds", "icon": "02d"}]
            },
            "hourly": [{"dt": 1_700_000_000, "temp": 50.0, "pop": 0.35}],
            "daily": [
                {"dt": 1_699_963_200, "temp": {"min": 35.0, "max": 58.0}},
                {"dt": 1_700_049_600, "temp": {"min": 33.0, "max": 55.0}, "rain": 25.4}
            ],
            "alerts": [{"sender_name": "NWS Reno", "event": "Wind Advisory", "start": 0, "end": 1, "description": ""}]
        }))
        .unwrap();
        WeatherSnapshot::from_payload(payload, 25)
    }

    #[test]
    fn test_header_with_and_without_region() {
        let bare = Location::new("Reno", 39.5, -119.8);
        assert_eq!(location_header(&bare), "Reno");
        assert_eq!(
            location_header(&bare.with_state("NV").with_country("US")),
            "Reno, NV, US"
        );
    }

    #[test]
    fn test_current_block() {
        let lines = current(&Location::new("Reno", 39.5, -119.8), &snapshot());

        assert_eq!(lines[1], "51° Few clouds (feels like 50°)");
        assert_eq!(lines[2], "H: 58°  L: 35°");
        assert_eq!(lines[3], "Wind: 7 mph NorthEast wind");
        assert_eq!(lines[4], "Visibility: 10 km");
        assert!(lines.last().unwrap().starts_with("Background: "));
    }

    #[test]
    fn test_hourly_shows_precipitation_percent() {
        let lines = hourly(&snapshot());
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("35% precip"), "{}", lines[0]);
    }

    #[test]
    fn test_daily_skips_today_and_shows_rain() {
        let lines = daily(&snapshot());
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Wednesday"), "{}", lines[0]);
        assert!(lines[0].ends_with("rain 1.000 in"), "{}", lines[0]);
    }

    #[test]
    fn test_alert_lines() {
        assert_eq!(alerts(&snapshot()), vec!["! Wind Advisory (NWS Reno)"]);
    }
}
