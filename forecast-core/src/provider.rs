use crate::{Config, Coordinate, WeatherSnapshot, error::FetchError, provider::open_meteo::OpenMeteoProvider};
use anyhow::Context;
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod open_meteo;

#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn fetch(&self, coordinate: Coordinate) -> Result<WeatherSnapshot, FetchError>;
}

/// Construct the forecast provider described by the config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn ForecastProvider>> {
    let provider = OpenMeteoProvider::new(config.forecast.base_url.as_str(), config.forecast.timeout())
        .with_context(|| {
            format!("Failed to build forecast client for '{}'", config.forecast.base_url)
        })?;

    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_from_default_config_targets_open_meteo() {
        let cfg = Config::default();
        let provider = provider_from_config(&cfg).expect("default config builds");

        let debug = format!("{provider:?}");
        assert!(debug.contains("api.open-meteo.com"), "{debug}");
    }

    #[test]
    fn provider_from_config_honours_base_url() {
        let mut cfg = Config::default();
        cfg.forecast.base_url = "http://127.0.0.1:8080/".into();

        let provider = provider_from_config(&cfg).expect("custom base url builds");
        assert!(format!("{provider:?}").contains("127.0.0.1:8080"));
    }
}
