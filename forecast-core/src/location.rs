//! Permission and location resolution.
//!
//! One permission request per load. A refusal is not an error: the user is
//! told about it and the fixed fallback coordinate is used instead, so some
//! forecast is always shown.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{info, warn};

use crate::{
    error::LocationError,
    model::{Coordinate, FALLBACK_COORDINATE},
};

/// Shown once when the user refuses location access.
pub const PERMISSION_DENIED_NOTICE: &str =
    "Permissão de localização negada. Usando localização padrão.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

/// Host location capability.
#[async_trait]
pub trait LocationProvider: Send + Sync + Debug {
    /// Ask for foreground location access.
    async fn request_permission(&self) -> Result<Permission, LocationError>;

    /// Read the current position with default accuracy.
    async fn current_position(&self) -> Result<Coordinate, LocationError>;
}

/// Channel for user-facing notices.
pub trait Notifier: Send + Sync + Debug {
    fn notify(&self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    Device,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedLocation {
    pub coordinate: Coordinate,
    pub source: LocationSource,
}

/// Resolve the coordinate to fetch a forecast for.
///
/// Calls `request_permission` exactly once and `current_position` at most
/// once. Platform failures from either call are returned as-is.
pub async fn resolve_location(
    provider: &dyn LocationProvider,
    notifier: &dyn Notifier,
) -> Result<ResolvedLocation, LocationError> {
    match provider.request_permission().await? {
        Permission::Denied => {
            warn!(fallback = %FALLBACK_COORDINATE, "location permission denied");
            notifier.notify(PERMISSION_DENIED_NOTICE);
            Ok(ResolvedLocation { coordinate: FALLBACK_COORDINATE, source: LocationSource::Fallback })
        }
        Permission::Granted => {
            let coordinate = provider.current_position().await?;
            info!(%coordinate, "resolved device position");
            Ok(ResolvedLocation { coordinate, source: LocationSource::Device })
        }
    }
}
