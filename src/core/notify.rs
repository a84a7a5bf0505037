// Visual alert presentation seam.

use log::info;

/// Raises the high-priority incoming-call alert. Implementations key the
/// alert by number identity, so a repeat call from the same number
/// replaces the previous alert instead of stacking.
pub trait AlertPresenter: Send + Sync {
    fn show(&self, number: Option<&str>);
}

/// Presenter that only logs; stands in for the platform notification
/// surface in the demo binary.
pub struct LogPresenter;

impl AlertPresenter for LogPresenter {
    fn show(&self, number: Option<&str>) {
        info!("incoming call from {}", number.unwrap_or("unknown number"));
    }
}
