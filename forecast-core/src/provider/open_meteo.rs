use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::{
    error::FetchError,
    model::{Coordinate, CurrentWeather, DailyForecast, HourlyForecast, WeatherSnapshot},
};

use super::ForecastProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com";

const FORECAST_PATH: &str = "/v1/forecast";
const HOURLY_FIELDS: &str = "temperature_2m,weathercode,windspeed_10m";
const DAILY_FIELDS: &str = "weathercode,temperature_2m_max,temperature_2m_min";

/// Open-Meteo forecast client. One GET per `fetch`, no retries.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    base_url: String,
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { base_url, http })
    }

    pub fn forecast_url(&self) -> String {
        format!("{}{}", self.base_url, FORECAST_PATH)
    }
}

/// Query string for one forecast request.
pub fn forecast_query(coordinate: Coordinate) -> Vec<(&'static str, String)> {
    vec![
        ("latitude", format_degrees(coordinate.latitude)),
        ("longitude", format_degrees(coordinate.longitude)),
        ("current_weather", "true".to_string()),
        ("hourly", HOURLY_FIELDS.to_string()),
        ("daily", DAILY_FIELDS.to_string()),
        ("timezone", "auto".to_string()),
    ]
}

/// Always keeps a decimal point so `40` goes out as `40.0`.
fn format_degrees(value: f64) -> String {
    if value.fract() == 0.0 { format!("{value:.1}") } else { value.to_string() }
}

#[async_trait]
impl ForecastProvider for OpenMeteoProvider {
    async fn fetch(&self, coordinate: Coordinate) -> Result<WeatherSnapshot, FetchError> {
        let url = self.forecast_url();
        debug!(%url, %coordinate, "requesting forecast");

        let res = self.http.get(&url).query(&forecast_query(coordinate)).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status { status: status.as_u16(), body: truncate_body(&body) });
        }

        parse_forecast(&body)
    }
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    temperature: f64,
    weathercode: i32,
    windspeed: f64,
}

#[derive(Debug, Deserialize)]
struct OmHourly {
    time: Vec<String>,
    temperature_2m: Vec<f64>,
    weathercode: Vec<i32>,
    windspeed_10m: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct OmDaily {
    time: Vec<String>,
    weathercode: Vec<i32>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    timezone: Option<String>,
    current_weather: OmCurrent,
    hourly: OmHourly,
    daily: OmDaily,
}

/// Decode a forecast body, rejecting misaligned hourly/daily columns.
pub fn parse_forecast(body: &str) -> Result<WeatherSnapshot, FetchError> {
    let parsed: OmResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;

    let hourly = HourlyForecast::new(
        parsed.hourly.time,
        parsed.hourly.temperature_2m,
        parsed.hourly.weathercode,
        parsed.hourly.windspeed_10m,
    )?;

    let daily = DailyForecast::new(
        parsed.daily.time,
        parsed.daily.weathercode,
        parsed.daily.temperature_2m_max,
        parsed.daily.temperature_2m_min,
    )?;

    Ok(WeatherSnapshot {
        current: CurrentWeather {
            temperature: parsed.current_weather.temperature,
            weathercode: parsed.current_weather.weathercode,
            windspeed: parsed.current_weather.windspeed,
        },
        hourly,
        daily,
        timezone: parsed.timezone,
        fetched_at: Utc::now(),
    })
}

/// Keep at most 200 bytes of an error body, cut on a char boundary.
fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    let mut cut = MAX;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &body[..cut])
}
