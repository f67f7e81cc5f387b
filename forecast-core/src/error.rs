use thiserror::Error;

/// Failures of the host location capability.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Location permission request failed: {0}")]
    PermissionRequest(String),
    #[error("Location services unavailable: {0}")]
    Unavailable(String),
    #[error("Location error: {0}")]
    Other(String),
}

/// Failures while fetching or decoding a forecast.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Forecast request failed with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Failed to parse forecast response: {0}")]
    Parse(String),
}

/// Anything that can end a screen load without a snapshot.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Location(#[from] LocationError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_error_is_transparent() {
        let err = FlowError::from(FetchError::Parse("bad json".into()));
        assert_eq!(err.to_string(), "Failed to parse forecast response: bad json");

        let err = FlowError::from(LocationError::Unavailable("gps off".into()));
        assert!(err.to_string().contains("gps off"));
    }

    #[test]
    fn status_error_mentions_code() {
        let err = FetchError::Status { status: 503, body: "down".into() };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("down"));
    }
}
