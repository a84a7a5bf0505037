// AlertSession: the single owned record of one live alert attempt. All
// acquired device state lives here, so destroying the session releases
// everything in one place instead of field-by-field.

use std::time::Instant;

use log::debug;

use super::engine::DeviceSet;
use super::focus::FocusBroker;
use super::model::AlertConfig;
use super::player::AlertPlayer;
use super::vibration::VibrationController;
use super::wake::WakeGuard;

pub struct AlertSession {
    /// Session identity; timer events carrying an older value are stale.
    pub generation: u64,
    pub started_at: Instant,
    pub config: AlertConfig,
    /// Whether the hard-stop timer has been armed for this session.
    pub timer_armed: bool,
    pub player: AlertPlayer,
    pub focus: FocusBroker,
    pub vibration: VibrationController,
    pub wake: WakeGuard,
}

impl AlertSession {
    pub fn new(generation: u64, config: AlertConfig, devices: &DeviceSet) -> Self {
        Self {
            generation,
            started_at: Instant::now(),
            config,
            timer_armed: false,
            player: AlertPlayer::new(devices.sound.clone()),
            focus: FocusBroker::new(devices.focus.clone()),
            vibration: VibrationController::new(devices.vibrator.clone()),
            wake: WakeGuard::new(devices.wake.clone()),
        }
    }

    /// Stop sound and release audio focus together. This is the one
    /// funnel every sound teardown path goes through; it never panics
    /// and may be called from any tier or state.
    pub fn stop_sound(&mut self) {
        self.player.stop();
        self.focus.release();
    }

    /// Release every held resource. Each release logs failures and
    /// force-clears its local state, so a partial device failure cannot
    /// leave a lock or handle behind. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        self.stop_sound();
        self.vibration.stop();
        self.wake.release();
        debug!(
            "alert session {} torn down after {:?}",
            self.generation,
            self.started_at.elapsed()
        );
    }
}
