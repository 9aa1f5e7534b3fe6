//! Current-conditions lookup against the Open-Meteo forecast API.
//!
//! Every failure collapses to an empty summary; the form then asks the
//! hunter to type the weather in by hand.

use crate::models::Coordinates;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_WEATHER_URL: &str = "https://api.open-meteo.com";

const CURRENT_FIELDS: &str =
    "temperature_2m,wind_speed_10m,wind_direction_10m,relative_humidity_2m,weather_code";

const COMPASS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("a weather lookup is already in flight")]
    Busy,
    #[error("weather request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("weather service answered {0}")]
    Status(StatusCode),
    #[error("weather response is missing current conditions")]
    MissingConditions,
}

#[derive(Debug, Default, Deserialize)]
struct ForecastResponse {
    current: Option<CurrentConditions>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CurrentConditions {
    pub temperature_2m: Option<f64>,
    pub wind_speed_10m: Option<f64>,
    pub wind_direction_10m: Option<f64>,
    pub relative_humidity_2m: Option<f64>,
    pub weather_code: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: Client,
    base_url: String,
    busy: Arc<AtomicBool>,
}

/// Clears the busy flag when the lookup finishes, however it finishes.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl WeatherClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            busy: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// One-line summary such as `41°F, Overcast, 12 mph NNW, RH 80%`, or an
    /// empty string when the lookup fails or another one is in flight.
    pub async fn current_summary(&self, at: Coordinates) -> String {
        match self.lookup(at).await {
            Ok(summary) => summary,
            Err(err) => {
                warn!("weather lookup failed: {err}");
                String::new()
            }
        }
    }

    async fn lookup(&self, at: Coordinates) -> Result<String, WeatherError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(WeatherError::Busy);
        }
        let _guard = BusyGuard(&self.busy);

        let url = format!("{}/v1/forecast", self.base_url.trim_end_matches('/'));
        debug!(%url, "fetching current conditions");
        let response = self
            .http
            .get(url)
            .query(&[
                ("latitude", format!("{:.4}", at.latitude)),
                ("longitude", format!("{:.4}", at.longitude)),
                ("current", CURRENT_FIELDS.to_string()),
                ("temperature_unit", "fahrenheit".to_string()),
                ("wind_speed_unit", "mph".to_string()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(WeatherError::Status(response.status()));
        }

        let body: ForecastResponse = response.json().await?;
        body.current
            .as_ref()
            .and_then(format_summary)
            .ok_or(WeatherError::MissingConditions)
    }
}

pub fn format_summary(current: &CurrentConditions) -> Option<String> {
    let temp = current.temperature_2m?.round() as i64;
    let wind = current.wind_speed_10m?.round() as i64;
    let direction = compass_label(current.wind_direction_10m?);
    let humidity = current.relative_humidity_2m?.round() as i64;
    let sky = current
        .weather_code
        .map_or("N/A", |code| weather_label(code as i64));
    Some(format!(
        "{temp}°F, {sky}, {wind} mph {direction}, RH {humidity}%"
    ))
}

/// WMO weather interpretation code to a short label.
pub fn weather_label(code: i64) -> &'static str {
    match code {
        0 => "Clear",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Rime fog",
        51 => "Light drizzle",
        53 => "Drizzle",
        55 => "Heavy drizzle",
        61 => "Light rain",
        63 => "Rain",
        65 => "Heavy rain",
        71 => "Light snow",
        73 => "Snow",
        75 => "Heavy snow",
        80 => "Rain showers",
        81 => "Heavy showers",
        82 => "Violent showers",
        95 => "Thunderstorm",
        96 => "T-storm hail",
        99 => "Severe hail",
        _ => "N/A",
    }
}

pub fn compass_label(degrees: f64) -> &'static str {
    let sector = (degrees / 22.5).round() as i64;
    COMPASS[sector.rem_euclid(16) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode as HttpStatus, routing::get, Json, Router};
    use serde_json::json;

    const HERE: Coordinates = Coordinates {
        latitude: 34.7465,
        longitude: -92.2896,
    };

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base_url: &str) -> WeatherClient {
        WeatherClient::new(base_url, Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn compass_wraps_around_north() {
        assert_eq!(compass_label(0.0), "N");
        assert_eq!(compass_label(350.0), "N");
        assert_eq!(compass_label(22.5), "NNE");
        assert_eq!(compass_label(180.0), "S");
        assert_eq!(compass_label(-90.0), "W");
    }

    #[test]
    fn unknown_codes_render_as_na() {
        assert_eq!(weather_label(3), "Overcast");
        assert_eq!(weather_label(96), "T-storm hail");
        assert_eq!(weather_label(42), "N/A");
    }

    #[test]
    fn summary_rounds_readings() {
        let current = CurrentConditions {
            temperature_2m: Some(41.6),
            wind_speed_10m: Some(11.8),
            wind_direction_10m: Some(338.0),
            relative_humidity_2m: Some(79.6),
            weather_code: Some(3.0),
        };
        assert_eq!(
            format_summary(&current).as_deref(),
            Some("42°F, Overcast, 12 mph NNW, RH 80%")
        );
    }

    #[test]
    fn summary_needs_every_reading_but_the_code() {
        let current = CurrentConditions {
            temperature_2m: Some(30.0),
            wind_speed_10m: Some(5.0),
            wind_direction_10m: Some(90.0),
            relative_humidity_2m: Some(60.0),
            weather_code: None,
        };
        assert_eq!(
            format_summary(&current).as_deref(),
            Some("30°F, N/A, 5 mph E, RH 60%")
        );
        assert!(format_summary(&CurrentConditions::default()).is_none());
    }

    #[tokio::test]
    async fn fetches_and_formats_current_conditions() {
        let router = Router::new().route(
            "/v1/forecast",
            get(|| async {
                Json(json!({
                    "current": {
                        "temperature_2m": 38.2,
                        "wind_speed_10m": 14.4,
                        "wind_direction_10m": 200,
                        "relative_humidity_2m": 91,
                        "weather_code": 61
                    }
                }))
            }),
        );
        let base_url = serve(router).await;
        let weather = client(&base_url);

        assert_eq!(
            weather.current_summary(HERE).await,
            "38°F, Light rain, 14 mph SSW, RH 91%"
        );
        assert!(!weather.is_busy());
    }

    #[tokio::test]
    async fn error_status_yields_empty_summary() {
        let router = Router::new().route(
            "/v1/forecast",
            get(|| async { HttpStatus::SERVICE_UNAVAILABLE }),
        );
        let base_url = serve(router).await;
        assert_eq!(client(&base_url).current_summary(HERE).await, "");
    }

    #[tokio::test]
    async fn unreachable_service_yields_empty_summary() {
        let weather = client("http://127.0.0.1:1");
        assert_eq!(weather.current_summary(HERE).await, "");
        assert!(!weather.is_busy());
    }

    #[tokio::test]
    async fn busy_client_refuses_a_second_lookup() {
        let weather = client("http://127.0.0.1:1");
        weather.busy.store(true, Ordering::Release);
        assert!(matches!(
            weather.lookup(HERE).await,
            Err(WeatherError::Busy)
        ));
        assert!(weather.is_busy());
    }
}
