// Error taxonomy for device interactions and subsystem startup.

use thiserror::Error;

/// Failures talking to a device subsystem (audio, vibration, wake).
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Transient acquisition or playback failure. Recovered by falling to
    /// the next sound tier or retrying once; never shown to the user.
    #[error("transient device failure: {0}")]
    Transient(String),

    /// Failure while stopping or releasing a resource. The owner logs it,
    /// force-marks the resource released and continues.
    #[error("resource release failed: {0}")]
    Release(String),
}

/// Fatal initialization failures. The alert subsystem shuts down cleanly
/// rather than running half-initialized.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("audio backend unavailable: {0}")]
    AudioBackend(String),

    #[error("call listener registration failed: {0}")]
    Listener(String),
}
