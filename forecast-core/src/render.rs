//! Pure mapping from screen status to what the user sees.

use chrono::{DateTime, Utc};

use crate::{
    codes::condition_label,
    location::{LocationSource, ResolvedLocation},
    model::{Coordinate, WeatherSnapshot},
    screen::{FailureReason, ScreenStatus},
};

pub const TITLE: &str = "Previsão do Tempo";
pub const LOADING_MESSAGE: &str = "Carregando previsão do tempo...";
pub const FAILED_MESSAGE: &str = "Não foi possível carregar a previsão do tempo.";
pub const HOURLY_HEADING: &str = "Próximas horas:";
pub const DAILY_HEADING: &str = "Próximos dias:";

/// Maximum number of hourly cards shown.
pub const HOURLY_LIMIT: usize = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct HourCard {
    pub hour: String,
    pub temperature: String,
    pub wind: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayCard {
    pub date: String,
    pub max: String,
    pub min: String,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastView {
    pub title: &'static str,
    pub temperature: String,
    pub condition: String,
    pub wind: String,
    pub hourly_heading: &'static str,
    pub hourly: Vec<HourCard>,
    pub daily_heading: &'static str,
    pub daily: Vec<DayCard>,
    pub source: LocationSource,
    pub coordinate: Coordinate,
    pub timezone: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScreenView {
    Loading { message: &'static str },
    Forecast(Box<ForecastView>),
    Failed { message: &'static str, detail: String },
}

pub fn render(status: &ScreenStatus) -> ScreenView {
    match status {
        ScreenStatus::Loading => ScreenView::Loading { message: LOADING_MESSAGE },
        ScreenStatus::Loaded { location, snapshot } => {
            ScreenView::Forecast(Box::new(forecast_view(location, snapshot)))
        }
        ScreenStatus::Failed(reason) => failed_view(reason),
    }
}

fn failed_view(reason: &FailureReason) -> ScreenView {
    ScreenView::Failed { message: FAILED_MESSAGE, detail: reason.message.clone() }
}

fn forecast_view(location: &ResolvedLocation, snapshot: &WeatherSnapshot) -> ForecastView {
    let current = &snapshot.current;

    let hourly = snapshot
        .hourly
        .entries()
        .take(HOURLY_LIMIT)
        .map(|entry| HourCard {
            hour: hour_label(entry.time),
            temperature: format!("{}°C", entry.temperature),
            wind: format!("{}km/h", entry.windspeed),
        })
        .collect();

    let daily = snapshot
        .daily
        .entries()
        .map(|entry| DayCard {
            date: date_label(entry.date).to_string(),
            max: format!("Max: {}°C", entry.temperature_max),
            min: format!("Min: {}°C", entry.temperature_min),
            condition: condition_label(entry.weathercode).to_string(),
        })
        .collect();

    ForecastView {
        title: TITLE,
        temperature: format!("Temperatura atual: {}°C", current.temperature),
        condition: format!("Condição: {}", condition_label(current.weathercode)),
        wind: format!("Vento: {} km/h", current.windspeed),
        hourly_heading: HOURLY_HEADING,
        hourly,
        daily_heading: DAILY_HEADING,
        daily,
        source: location.source,
        coordinate: location.coordinate,
        timezone: snapshot.timezone.clone(),
        fetched_at: snapshot.fetched_at,
    }
}

/// `2026-10-18T14:00` -> `14:00h`. Labels in another shape are shown whole.
fn hour_label(time: &str) -> String {
    format!("{}h", time.get(11..16).unwrap_or(time))
}

/// `2026-10-18` (or a longer timestamp) -> `2026-10-18`.
fn date_label(date: &str) -> &str {
    date.get(0..10).unwrap_or(date)
}

impl ScreenView {
    /// Plain-text rendering, one line per visual row.
    pub fn lines(&self) -> Vec<String> {
        match self {
            ScreenView::Loading { message } => vec![message.to_string()],
            ScreenView::Failed { message, detail } => vec![message.to_string(), detail.clone()],
            ScreenView::Forecast(view) => {
                let mut lines = vec![
                    view.title.to_string(),
                    view.temperature.clone(),
                    view.condition.clone(),
                    view.wind.clone(),
                    view.hourly_heading.to_string(),
                ];
                lines.extend(
                    view.hourly
                        .iter()
                        .map(|card| format!("{} {} {}", card.hour, card.temperature, card.wind)),
                );
                lines.push(view.daily_heading.to_string());
                lines.extend(view.daily.iter().map(|card| {
                    format!("{} {} {} {}", card.date, card.max, card.min, card.condition)
                }));
                lines
            }
        }
    }
}
