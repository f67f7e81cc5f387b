use anyhow::Context;
use colored::*;
use forecast_core::{Config, Coordinate, PermissionPolicy};
use inquire::{Confirm, CustomType, Select, Text};

use crate::cli::validate_position;

/// Walk through the settings interactively and save them.
pub fn run(config: &mut Config) -> anyhow::Result<()> {
    let policies = PermissionPolicy::all().to_vec();
    let current = policies.iter().position(|p| *p == config.location.permission).unwrap_or(0);

    config.location.permission = Select::new("Permissão de localização:", policies)
        .with_starting_cursor(current)
        .with_help_message("ask: perguntar sempre · always: permitir · never: usar localização padrão")
        .prompt()
        .context("Failed to read permission policy")?;

    let fixed = Confirm::new("Usar uma posição fixa em vez de detectar pelo IP?")
        .with_default(config.location.position.is_some())
        .prompt()
        .context("Failed to read position choice")?;

    let position = if fixed { Some(prompt_position(config.location.position)?) } else { None };
    config.set_position(position);

    let base_url = Text::new("URL base da API de previsão:")
        .with_default(&config.forecast.base_url)
        .prompt()
        .context("Failed to read base URL")?;
    config.forecast.base_url = base_url;

    let path = config.save()?;
    println!("{} {}", "Configuração salva em".green(), path.display());

    Ok(())
}

fn prompt_position(current: Option<Coordinate>) -> anyhow::Result<Coordinate> {
    let mut latitude = CustomType::<f64>::new("Latitude:")
        .with_error_message("Digite um número, por exemplo -23.5505");
    let mut longitude = CustomType::<f64>::new("Longitude:")
        .with_error_message("Digite um número, por exemplo -46.6333");

    if let Some(current) = current {
        latitude = latitude.with_default(current.latitude);
        longitude = longitude.with_default(current.longitude);
    }

    let latitude = latitude.prompt().context("Failed to read latitude")?;
    let longitude = longitude.prompt().context("Failed to read longitude")?;

    validate_position(Coordinate::new(latitude, longitude))
}
