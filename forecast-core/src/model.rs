use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Used when location permission is denied (São Paulo).
pub const FALLBACK_COORDINATE: Coordinate = Coordinate::new(-23.5505, -46.6333);

/// Point-in-time conditions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentWeather {
    pub temperature: f64,
    pub weathercode: i32,
    pub windspeed: f64,
}

/// One row of the hourly series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlyEntry<'a> {
    pub time: &'a str,
    pub temperature: f64,
    pub weathercode: i32,
    pub windspeed: f64,
}

/// Hourly series; all columns have the same length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyForecast {
    time: Vec<String>,
    temperature_2m: Vec<f64>,
    weathercode: Vec<i32>,
    windspeed_10m: Vec<f64>,
}

impl HourlyForecast {
    pub fn new(
        time: Vec<String>,
        temperature_2m: Vec<f64>,
        weathercode: Vec<i32>,
        windspeed_10m: Vec<f64>,
    ) -> Result<Self, FetchError> {
        check_aligned(
            "hourly",
            time.len(),
            &[
                ("temperature_2m", temperature_2m.len()),
                ("weathercode", weathercode.len()),
                ("windspeed_10m", windspeed_10m.len()),
            ],
        )?;

        Ok(Self { time, temperature_2m, weathercode, windspeed_10m })
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = HourlyEntry<'_>> {
        (0..self.len()).map(move |i| HourlyEntry {
            time: &self.time[i],
            temperature: self.temperature_2m[i],
            weathercode: self.weathercode[i],
            windspeed: self.windspeed_10m[i],
        })
    }
}

/// One row of the daily series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyEntry<'a> {
    pub date: &'a str,
    pub weathercode: i32,
    pub temperature_max: f64,
    pub temperature_min: f64,
}

/// Daily series; all columns have the same length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyForecast {
    time: Vec<String>,
    weathercode: Vec<i32>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
}

impl DailyForecast {
    pub fn new(
        time: Vec<String>,
        weathercode: Vec<i32>,
        temperature_2m_max: Vec<f64>,
        temperature_2m_min: Vec<f64>,
    ) -> Result<Self, FetchError> {
        check_aligned(
            "daily",
            time.len(),
            &[
                ("weathercode", weathercode.len()),
                ("temperature_2m_max", temperature_2m_max.len()),
                ("temperature_2m_min", temperature_2m_min.len()),
            ],
        )?;

        Ok(Self { time, weathercode, temperature_2m_max, temperature_2m_min })
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = DailyEntry<'_>> {
        (0..self.len()).map(move |i| DailyEntry {
            date: &self.time[i],
            weathercode: self.weathercode[i],
            temperature_max: self.temperature_2m_max[i],
            temperature_min: self.temperature_2m_min[i],
        })
    }
}

/// A complete forecast held by one screen instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    pub current: CurrentWeather,
    pub hourly: HourlyForecast,
    pub daily: DailyForecast,
    pub timezone: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

fn check_aligned(
    series: &str,
    expected: usize,
    columns: &[(&str, usize)],
) -> Result<(), FetchError> {
    for (name, len) in columns {
        if *len != expected {
            return Err(FetchError::Parse(format!(
                "{series}.{name} has {len} entries but {series}.time has {expected}"
            )));
        }
    }
    Ok(())
}
