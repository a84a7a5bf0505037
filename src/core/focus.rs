// Audio focus brokerage: exclusive ownership of the alarm output stream.

use std::sync::Arc;

use log::warn;

use super::engine::EventSender;
use super::error::{DeviceError, StartupError};

/// Asynchronous focus notifications from the platform audio subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusChange {
    /// Another owner took the stream for good; stop playing.
    PermanentLoss,
    /// The stream is briefly elsewhere; pause and wait.
    TransientLoss,
    /// Ownership came back; resume an open handle.
    Regain,
}

/// Platform seam for alarm-stream audio focus.
pub trait AudioFocus: Send + Sync {
    /// Request exclusive focus. Returns whether it was granted.
    fn request(&self) -> bool;

    /// Relinquish focus. Called unconditionally; must tolerate being
    /// called when focus is not held.
    fn release(&self) -> Result<(), DeviceError>;

    /// Raise the alarm stream to full volume so the alert is heard.
    fn boost_volume(&self) -> Result<(), DeviceError>;

    /// Register the engine queue for focus-change notifications. Platform
    /// implementations push [`FocusChange`] values through `events`
    /// instead of touching session state from their callback thread.
    fn subscribe(&self, _events: &EventSender) -> Result<(), StartupError> {
        Ok(())
    }
}

/// Tracks granted state and the single-retry budget for one session.
pub struct FocusBroker {
    device: Arc<dyn AudioFocus>,
    granted: bool,
    retried: bool,
}

impl FocusBroker {
    pub fn new(device: Arc<dyn AudioFocus>) -> Self {
        Self {
            device,
            granted: false,
            retried: false,
        }
    }

    pub fn granted(&self) -> bool {
        self.granted
    }

    /// Applied when a marshalled focus-change notification arrives.
    pub fn set_granted(&mut self, granted: bool) {
        self.granted = granted;
    }

    /// One focus request against the device; updates the granted flag.
    pub fn request(&mut self) -> bool {
        self.granted = self.device.request();
        self.granted
    }

    /// Consume the single retry allowed after a denied request. Returns
    /// false once the budget is spent.
    pub fn take_retry(&mut self) -> bool {
        if self.retried {
            return false;
        }
        self.retried = true;
        true
    }

    pub fn boost_volume(&self) {
        if let Err(e) = self.device.boost_volume() {
            warn!("alarm volume boost failed: {e}");
        }
    }

    /// Idempotent release. The granted flag is force-cleared even when
    /// the device reports a release failure.
    pub fn release(&mut self) {
        if let Err(e) = self.device.release() {
            warn!("audio focus release failed: {e}");
        }
        self.granted = false;
    }
}
