//! Core library for the `forecast` screen.
//!
//! This crate defines:
//! - The location resolver with its permission/fallback policy
//! - The Open-Meteo forecast fetcher and its validated response model
//! - The screen state machine (mount, reducer, stale-result guard)
//! - The renderer that turns screen state into a displayable view
//! - Configuration handling
//!
//! It is used by `forecast-cli`, but carries no terminal code of its own.

pub mod codes;
pub mod config;
pub mod error;
pub mod location;
pub mod model;
pub mod provider;
pub mod render;
pub mod screen;

pub use config::{Config, ForecastConfig, LocationConfig, PermissionPolicy};
pub use error::{FetchError, FlowError, LocationError};
pub use location::{LocationProvider, LocationSource, Notifier, Permission, ResolvedLocation};
pub use model::{Coordinate, FALLBACK_COORDINATE, WeatherSnapshot};
pub use provider::{ForecastProvider, open_meteo::OpenMeteoProvider};
pub use render::{ScreenView, render};
pub use screen::{Screen, ScreenState, ScreenStatus};
