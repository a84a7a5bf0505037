// Vibration control: a repeating waveform independent of the sound chain.

use std::sync::Arc;

use log::warn;

use super::error::DeviceError;
use super::model::VIBRATION_PATTERN;

/// Platform seam for the vibration motor.
pub trait Vibrator: Send + Sync {
    /// Start a repeating waveform. `pattern` holds millisecond timings
    /// (wait/on/off/...); the repeat index points back at offset 0.
    fn vibrate(&self, pattern: &[u64]) -> Result<(), DeviceError>;

    /// Cancel any active pattern. Must tolerate being called when idle.
    fn cancel(&self) -> Result<(), DeviceError>;
}

/// Vibration state for one alert session.
pub struct VibrationController {
    device: Arc<dyn Vibrator>,
    active: bool,
}

impl VibrationController {
    pub fn new(device: Arc<dyn Vibrator>) -> Self {
        Self {
            device,
            active: false,
        }
    }

    pub fn active(&self) -> bool {
        self.active
    }

    /// Start the alert pattern. No-op when the user disabled vibration;
    /// a motor failure is logged and the alert carries on without it.
    pub fn start(&mut self, enabled: bool) {
        if !enabled {
            return;
        }
        match self.device.vibrate(VIBRATION_PATTERN) {
            Ok(()) => self.active = true,
            Err(e) => warn!("vibration failed: {e}"),
        }
    }

    /// Idempotent cancel; the active flag is force-cleared even when the
    /// device reports an error.
    pub fn stop(&mut self) {
        if let Err(e) = self.device.cancel() {
            warn!("stopping vibration failed: {e}");
        }
        self.active = false;
    }
}
