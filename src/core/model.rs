// Call-state model types and the fixed alert timings.

use std::time::Duration;

/// Call states delivered by the telephony signal source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Ringing,
    Idle,
    OffHook,
}

/// One call-state transition. Immutable; consumed once per transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallEvent {
    pub state: CallState,
    /// Originating number. The telephony source may omit it; an absent
    /// number still alerts because it can never match a block prefix.
    pub number: Option<String>,
}

impl CallEvent {
    pub fn ringing(number: Option<&str>) -> Self {
        Self {
            state: CallState::Ringing,
            number: number.map(str::to_string),
        }
    }

    pub fn idle() -> Self {
        Self {
            state: CallState::Idle,
            number: None,
        }
    }

    pub fn off_hook() -> Self {
        Self {
            state: CallState::OffHook,
            number: None,
        }
    }
}

/// Stage of the sound fallback chain currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SoundTier {
    Primary,
    Fallback,
    SystemDefault,
    #[default]
    None,
}

/// Which sound resource the player should load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundSelection {
    /// The user-selected sound identifier from preferences.
    User(String),
    /// The built-in default alert sound.
    Builtin,
}

/// Read-only snapshot of the preferences one alert decision runs with.
#[derive(Debug, Clone)]
pub struct AlertConfig {
    pub sound_id: String,
    pub vibration_enabled: bool,
    pub duration: Duration,
}

/// How long an alert's sound and vibration may run before forced stop.
pub const ALERT_DURATION: Duration = Duration::from_secs(30);

/// Window in which re-entrant ringing signals are absorbed.
pub const RING_DEBOUNCE: Duration = Duration::from_millis(300);

/// Backoff before the single audio-focus retry.
pub const FOCUS_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Slack the wake hold gets beyond the alert duration.
pub const WAKE_HOLD_MARGIN: Duration = Duration::from_secs(1);

/// Repeating vibration waveform in milliseconds: wait, on, off, on.
/// The repeat index points back at offset 0.
pub const VIBRATION_PATTERN: &[u64] = &[0, 500, 200, 500];
