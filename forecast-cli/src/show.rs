use anyhow::Context;
use forecast_core::{
    Config, PermissionPolicy, ResolvedLocation, Screen, ScreenStatus, WeatherSnapshot,
    provider::provider_from_config,
    render::{self, LOADING_MESSAGE},
    screen::wait_until_settled,
};
use serde::Serialize;
use std::{process::ExitCode, sync::Arc};
use tracing::info;

use crate::{
    cli::ShowArgs,
    locator::{PositionSource, TerminalLocator},
    terminal::{self, TerminalNotifier},
};

#[derive(Serialize)]
struct JsonForecast<'a> {
    location: &'a ResolvedLocation,
    snapshot: &'a WeatherSnapshot,
}

/// Mount the screen once, wait for it to settle and print the result.
pub async fn run(args: ShowArgs, config: &Config) -> anyhow::Result<ExitCode> {
    let spinner = terminal::loading_spinner(LOADING_MESSAGE)?;

    let locator = TerminalLocator::new(
        permission_policy(&args, config),
        position_source(&args, config)?,
        spinner.clone(),
    );
    let forecast = provider_from_config(config)?;
    let notifier = TerminalNotifier::new(spinner.clone());

    let mut screen = Screen::new(Arc::new(locator), forecast, Arc::new(notifier));
    let mut rx = screen.subscribe();
    screen.mount();

    let settled = tokio::select! {
        state = wait_until_settled(&mut rx) => state,
        _ = tokio::signal::ctrl_c() => {
            screen.unmount();
            None
        }
    };
    spinner.finish_and_clear();

    let Some(state) = settled else {
        info!("forecast screen closed before loading finished");
        return Ok(ExitCode::from(130));
    };

    if args.json {
        if let ScreenStatus::Loaded { location, snapshot } = &state.status {
            let out = JsonForecast { location, snapshot: snapshot.as_ref() };
            println!(
                "{}",
                serde_json::to_string_pretty(&out).context("Failed to serialize forecast")?
            );
            return Ok(ExitCode::SUCCESS);
        }
    }

    terminal::paint(&mut std::io::stdout().lock(), &render::render(&state.status))
        .context("Failed to write forecast")?;
    Ok(exit_code(&state.status))
}

fn permission_policy(args: &ShowArgs, config: &Config) -> PermissionPolicy {
    if args.allow_location {
        PermissionPolicy::Always
    } else if args.deny_location {
        PermissionPolicy::Never
    } else {
        config.location.permission
    }
}

fn position_source(args: &ShowArgs, config: &Config) -> anyhow::Result<PositionSource> {
    match args.position()?.or(config.location.position) {
        Some(coordinate) => Ok(PositionSource::Fixed(coordinate)),
        None => PositionSource::ip_lookup().context("Failed to set up IP geolocation"),
    }
}

fn exit_code(status: &ScreenStatus) -> ExitCode {
    match status {
        ScreenStatus::Failed(_) => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forecast_core::Coordinate;

    #[test]
    fn flags_override_configured_policy() {
        let mut config = Config::default();
        config.location.permission = PermissionPolicy::Never;

        let args = ShowArgs { allow_location: true, ..Default::default() };
        assert_eq!(permission_policy(&args, &config), PermissionPolicy::Always);

        let args = ShowArgs::default();
        assert_eq!(permission_policy(&args, &config), PermissionPolicy::Never);

        config.location.permission = PermissionPolicy::Ask;
        let args = ShowArgs { deny_location: true, ..Default::default() };
        assert_eq!(permission_policy(&args, &config), PermissionPolicy::Never);
    }

    #[test]
    fn flag_position_wins_over_config() {
        let mut config = Config::default();
        config.set_position(Some(Coordinate::new(1.0, 2.0)));

        let args = ShowArgs { lat: Some(40.0), lon: Some(-3.0), ..Default::default() };
        match position_source(&args, &config).unwrap() {
            PositionSource::Fixed(c) => assert_eq!(c, Coordinate::new(40.0, -3.0)),
            other => panic!("expected fixed position, got {other:?}"),
        }

        match position_source(&ShowArgs::default(), &config).unwrap() {
            PositionSource::Fixed(c) => assert_eq!(c, Coordinate::new(1.0, 2.0)),
            other => panic!("expected fixed position, got {other:?}"),
        }
    }

    #[test]
    fn invalid_flag_position_is_an_error() {
        let args = ShowArgs { lat: Some(0.0), lon: Some(200.0), ..Default::default() };
        assert!(position_source(&args, &Config::default()).is_err());
    }

    #[test]
    fn no_position_falls_back_to_ip_lookup() {
        let source = position_source(&ShowArgs::default(), &Config::default()).unwrap();
        assert!(matches!(source, PositionSource::IpLookup { .. }));
    }
}
