//! Terminal implementation of the location capability.
//!
//! The permission question is answered by policy or by an interactive
//! prompt. The "device" position is either fixed (flags or config) or
//! looked up from the public IP address.

use async_trait::async_trait;
use forecast_core::{Coordinate, LocationError, LocationProvider, Permission, PermissionPolicy};
use indicatif::ProgressBar;
use inquire::{Confirm, InquireError};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const PERMISSION_PROMPT: &str = "Permitir acesso à sua localização?";
const IP_LOOKUP_URL: &str = "http://ip-api.com/json/";
const IP_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub enum PositionSource {
    Fixed(Coordinate),
    IpLookup { http: Client, url: String },
}

impl PositionSource {
    pub fn ip_lookup() -> Result<Self, LocationError> {
        let http = Client::builder()
            .timeout(IP_LOOKUP_TIMEOUT)
            .build()
            .map_err(|e| LocationError::Other(e.to_string()))?;

        Ok(PositionSource::IpLookup { http, url: IP_LOOKUP_URL.to_string() })
    }
}

pub struct TerminalLocator {
    policy: PermissionPolicy,
    position: PositionSource,
    spinner: ProgressBar,
}

impl TerminalLocator {
    /// `spinner` is suspended while the permission prompt is on screen.
    pub fn new(policy: PermissionPolicy, position: PositionSource, spinner: ProgressBar) -> Self {
        Self { policy, position, spinner }
    }
}

impl std::fmt::Debug for TerminalLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalLocator")
            .field("policy", &self.policy)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LocationProvider for TerminalLocator {
    async fn request_permission(&self) -> Result<Permission, LocationError> {
        match self.policy {
            PermissionPolicy::Always => Ok(Permission::Granted),
            PermissionPolicy::Never => Ok(Permission::Denied),
            PermissionPolicy::Ask => {
                let spinner = self.spinner.clone();
                let answer = tokio::task::spawn_blocking(move || {
                    spinner.suspend(|| {
                        Confirm::new(PERMISSION_PROMPT)
                            .with_default(true)
                            .with_help_message("Sem permissão, a previsão de São Paulo é exibida")
                            .prompt()
                    })
                })
                .await
                .map_err(|e| LocationError::Other(e.to_string()))?;

                permission_from_answer(answer)
            }
        }
    }

    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        match &self.position {
            PositionSource::Fixed(coordinate) => Ok(*coordinate),
            PositionSource::IpLookup { http, url } => lookup_ip_position(http, url).await,
        }
    }
}

/// Escape counts as a refusal; anything else that stops the prompt is a failure.
fn permission_from_answer(answer: Result<bool, InquireError>) -> Result<Permission, LocationError> {
    match answer {
        Ok(true) => Ok(Permission::Granted),
        Ok(false) | Err(InquireError::OperationCanceled) => Ok(Permission::Denied),
        Err(err) => Err(LocationError::PermissionRequest(err.to_string())),
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

async fn lookup_ip_position(http: &Client, url: &str) -> Result<Coordinate, LocationError> {
    debug!(%url, "looking up position from IP address");

    let res = http
        .get(url)
        .query(&[("fields", "status,message,lat,lon")])
        .send()
        .await
        .map_err(|e| LocationError::Unavailable(format!("IP geolocation request failed: {e}")))?;

    let body: IpApiResponse = res
        .json()
        .await
        .map_err(|e| LocationError::Unavailable(format!("Invalid IP geolocation response: {e}")))?;

    coordinate_from_response(body)
}

fn coordinate_from_response(body: IpApiResponse) -> Result<Coordinate, LocationError> {
    match (body.status.as_str(), body.lat, body.lon) {
        ("success", Some(lat), Some(lon)) => Ok(Coordinate::new(lat, lon)),
        _ => Err(LocationError::Unavailable(
            body.message.unwrap_or_else(|| format!("IP geolocation returned status '{}'", body.status)),
        )),
    }
}
