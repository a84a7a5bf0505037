// Wake hold: keeps the processor awake for the bounded alert window.

use std::sync::Arc;
use std::time::Duration;

use log::warn;

use super::error::DeviceError;

/// Platform seam for a bounded wake hold.
pub trait WakeLock: Send + Sync {
    /// Acquire a hold that auto-expires after `max` if never released.
    fn acquire(&self, max: Duration) -> Result<(), DeviceError>;

    fn release(&self) -> Result<(), DeviceError>;
}

/// Wake-hold state for one alert session.
pub struct WakeGuard {
    device: Arc<dyn WakeLock>,
    held: bool,
}

impl WakeGuard {
    pub fn new(device: Arc<dyn WakeLock>) -> Self {
        Self {
            device,
            held: false,
        }
    }

    pub fn held(&self) -> bool {
        self.held
    }

    /// Acquire a hold bounded by `max`. Failure is logged; the alert
    /// continues without the hold.
    pub fn acquire(&mut self, max: Duration) {
        match self.device.acquire(max) {
            Ok(()) => self.held = true,
            Err(e) => warn!("wake hold acquisition failed: {e}"),
        }
    }

    /// Idempotent early release; the held flag is force-cleared even on
    /// a device error.
    pub fn release(&mut self) {
        if !self.held {
            return;
        }
        if let Err(e) = self.device.release() {
            warn!("wake hold release failed: {e}");
        }
        self.held = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::harness::FakeWake;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_acquire_records_bound() {
        let device = FakeWake::new();
        let mut guard = WakeGuard::new(device.clone());
        guard.acquire(Duration::from_secs(31));
        assert!(guard.held());
        assert_eq!(
            *device.max.lock().unwrap(),
            Some(Duration::from_secs(31))
        );
    }

    #[test]
    fn test_release_idempotent() {
        let device = FakeWake::new();
        let mut guard = WakeGuard::new(device.clone());
        guard.acquire(Duration::from_secs(31));
        guard.release();
        guard.release();
        assert!(!guard.held());
        assert_eq!(device.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_release_failure_force_clears() {
        let device = FakeWake::new();
        device.fail_release.store(true, Ordering::SeqCst);
        let mut guard = WakeGuard::new(device);
        guard.acquire(Duration::from_secs(31));
        guard.release();
        assert!(!guard.held());
    }
}
