//! Shared HTTP plumbing for the cloud backends.

use std::time::Duration;

use reqwest::{Client, StatusCode};

use voice_runtime_core::VoiceError;

/// Build a client whose requests give up after `timeout`.
pub fn client(timeout: Duration) -> Result<Client, VoiceError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| VoiceError::ConfigurationFailed(format!("failed to create HTTP client: {}", e)))
}

/// Map a non-success response onto the runtime taxonomy.
///
/// Requests the service refused to process (bad or unsupported payload) are
/// `AmbiguousAudio`; everything else is a service outage.
pub fn classify_status(service: &str, status: StatusCode, body: &str) -> VoiceError {
    let detail = body.trim().chars().take(200).collect::<String>();
    log::warn!("{} returned {}: {}", service, status, detail);
    match status {
        StatusCode::BAD_REQUEST
        | StatusCode::PAYLOAD_TOO_LARGE
        | StatusCode::UNSUPPORTED_MEDIA_TYPE
        | StatusCode::UNPROCESSABLE_ENTITY => VoiceError::AmbiguousAudio,
        _ => VoiceError::ServiceUnavailable(format!("{} returned {}", service, status)),
    }
}

/// Transport failures (DNS, connect, TLS, timeout) are outages.
pub fn classify_transport(service: &str, error: reqwest::Error) -> VoiceError {
    let kind = if error.is_timeout() {
        "timed out"
    } else if error.is_connect() {
        "unreachable"
    } else {
        "request failed"
    };
    log::warn!("{} {}: {}", service, kind, error);
    VoiceError::ServiceUnavailable(format!("{} {}", service, kind))
}
