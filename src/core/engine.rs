// Call state machine: the single mutator of the alert session. Every
// asynchronous input (call transitions, focus notifications, prepare
// completions, timers) arrives as a typed event on one ordered queue,
// so "stop because idle" can never race "stop because elapsed".

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use tokio::sync::mpsc;

use super::config::{is_blocked, PreferenceStore};
use super::error::DeviceError;
use super::focus::{AudioFocus, FocusChange};
use super::model::{
    AlertConfig, CallEvent, CallState, SoundSelection, SoundTier, ALERT_DURATION,
    FOCUS_RETRY_DELAY, RING_DEBOUNCE, WAKE_HOLD_MARGIN,
};
use super::notify::AlertPresenter;
use super::player::{PlaybackHandle, SoundDevice};
use super::session::AlertSession;
use super::vibration::Vibrator;
use super::wake::WakeLock;

/// Everything that can appear on the engine queue.
pub enum EngineEvent {
    /// A call-state transition from the telephony source.
    Call(CallEvent),
    /// The debounce window for ring `seq` elapsed.
    RingDebounced { seq: u64, number: Option<String> },
    /// Asynchronous primary-tier preparation finished.
    SoundPrepared {
        generation: u64,
        result: Result<Box<dyn PlaybackHandle>, DeviceError>,
    },
    /// The single post-denial focus retry is due.
    FocusRetry { generation: u64 },
    /// Marshalled focus-change notification.
    Focus(FocusChange),
    /// The hard-stop timer for session `generation` fired.
    AlertElapsed { generation: u64 },
    /// Close the queue and stop the engine.
    Shutdown,
}

/// Sender half of the engine queue, shared with device backends.
#[derive(Clone)]
pub struct EventSender(mpsc::UnboundedSender<EngineEvent>);

impl EventSender {
    pub fn new(tx: mpsc::UnboundedSender<EngineEvent>) -> Self {
        Self(tx)
    }

    pub fn send(&self, event: EngineEvent) {
        if self.0.send(event).is_err() {
            debug!("engine queue closed; event dropped");
        }
    }
}

/// The device backends the engine drives.
#[derive(Clone)]
pub struct DeviceSet {
    pub sound: Arc<dyn SoundDevice>,
    pub focus: Arc<dyn AudioFocus>,
    pub vibrator: Arc<dyn Vibrator>,
    pub wake: Arc<dyn WakeLock>,
}

pub struct CallAlertEngine {
    devices: DeviceSet,
    prefs: Arc<dyn PreferenceStore>,
    presenter: Arc<dyn AlertPresenter>,
    events: EventSender,
    session: Option<AlertSession>,
    /// Monotonic session identity; bumped on every new alert attempt.
    generation: u64,
    /// Identity of the most recent ring debounce window. Bumping it
    /// invalidates any debounce still in flight.
    ring_seq: u64,
    last_ring: Option<Instant>,
}

impl CallAlertEngine {
    pub fn new(
        devices: DeviceSet,
        prefs: Arc<dyn PreferenceStore>,
        presenter: Arc<dyn AlertPresenter>,
        events: EventSender,
    ) -> Self {
        Self {
            devices,
            prefs,
            presenter,
            events,
            session: None,
            generation: 0,
            ring_seq: 0,
            last_ring: None,
        }
    }

    /// Drain the queue until shutdown, then tear down whatever is live.
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<EngineEvent>) {
        while let Some(event) = rx.recv().await {
            if matches!(event, EngineEvent::Shutdown) {
                break;
            }
            self.handle(event);
        }
        self.teardown();
        debug!("call alert engine stopped");
    }

    pub fn handle(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Call(call) => self.on_call(call),
            EngineEvent::RingDebounced { seq, number } => self.on_ring_debounced(seq, number),
            EngineEvent::SoundPrepared { generation, result } => {
                self.on_prepared(generation, result);
            }
            EngineEvent::FocusRetry { generation } => self.on_focus_retry(generation),
            EngineEvent::Focus(change) => self.on_focus_change(change),
            EngineEvent::AlertElapsed { generation } => self.on_elapsed(generation),
            EngineEvent::Shutdown => {}
        }
    }

    fn on_call(&mut self, call: CallEvent) {
        match call.state {
            CallState::Ringing => {
                // Teardown of any previous session completes before the
                // new ring is considered.
                self.teardown();

                let now = Instant::now();
                if let Some(prev) = self.last_ring {
                    if now.duration_since(prev) < RING_DEBOUNCE {
                        debug!("re-entrant ringing inside debounce window ignored");
                        return;
                    }
                }
                self.last_ring = Some(now);
                self.ring_seq += 1;
                let seq = self.ring_seq;
                info!(
                    "ringing ({}), committing in {:?}",
                    call.number.as_deref().unwrap_or("no number"),
                    RING_DEBOUNCE
                );
                self.schedule(
                    RING_DEBOUNCE,
                    EngineEvent::RingDebounced {
                        seq,
                        number: call.number,
                    },
                );
            }
            CallState::Idle | CallState::OffHook => {
                self.teardown();
                // A ring still inside its debounce window belongs to a
                // call that already ended; invalidate it.
                self.ring_seq += 1;
                self.last_ring = None;
            }
        }
    }

    fn on_ring_debounced(&mut self, seq: u64, number: Option<String>) {
        if seq != self.ring_seq {
            debug!("stale ring debounce {seq} ignored");
            return;
        }
        if self.session.is_some() {
            return;
        }

        // Preferences are read fresh so edits apply to this very call.
        let rules = self.prefs.block_rules();
        if is_blocked(number.as_deref(), &rules) {
            info!("call blocked by prefix rule");
            return;
        }
        let config = AlertConfig {
            sound_id: self.prefs.selected_sound(),
            vibration_enabled: self.prefs.vibration_enabled(),
            duration: ALERT_DURATION,
        };
        self.start_alert(number, config);
    }

    fn start_alert(&mut self, number: Option<String>, config: AlertConfig) {
        self.generation += 1;
        let generation = self.generation;
        info!("alerting (session {generation})");

        self.presenter.show(number.as_deref());

        let mut session = AlertSession::new(generation, config.clone(), &self.devices);
        session.wake.acquire(config.duration + WAKE_HOLD_MARGIN);
        session.vibration.start(config.vibration_enabled);
        session.focus.boost_volume();

        if session.focus.request() {
            self.begin_primary(&mut session);
        } else {
            warn!("audio focus denied, retrying once in {FOCUS_RETRY_DELAY:?}");
            self.schedule(FOCUS_RETRY_DELAY, EngineEvent::FocusRetry { generation });
        }
        self.session = Some(session);
    }

    /// Kick off asynchronous preparation of the user-selected sound. The
    /// completion comes back through the queue, so a slow or wedged
    /// prepare never stalls call-state processing.
    fn begin_primary(&self, session: &mut AlertSession) {
        session.player.begin_primary();
        let device = self.devices.sound.clone();
        let selection = SoundSelection::User(session.config.sound_id.clone());
        let generation = session.generation;
        let tx = self.events.clone();
        tokio::task::spawn_blocking(move || {
            let result = device.prepare(&selection);
            tx.send(EngineEvent::SoundPrepared { generation, result });
        });
    }

    fn on_prepared(
        &mut self,
        generation: u64,
        result: Result<Box<dyn PlaybackHandle>, DeviceError>,
    ) {
        let Some(mut session) = self.session.take() else {
            // The session is gone but a successful prepare still owns a
            // device resource; release it.
            if let Ok(mut handle) = result {
                handle.stop();
            }
            debug!("prepared sound for closed session {generation} discarded");
            return;
        };
        if session.generation != generation {
            if let Ok(mut handle) = result {
                handle.stop();
            }
            debug!("prepared sound for superseded session {generation} discarded");
            self.session = Some(session);
            return;
        }

        match result {
            Ok(handle) => {
                let granted = session.focus.granted();
                if session.player.attach_prepared(handle, granted) {
                    if granted {
                        self.arm_stop_timer(&mut session);
                    }
                } else {
                    self.fall_sync_tiers(&mut session);
                }
            }
            Err(e) => {
                warn!("primary sound unavailable: {e}");
                self.fall_sync_tiers(&mut session);
            }
        }
        self.session = Some(session);
    }

    /// Fallback then system default, both synchronous and bounded.
    fn fall_sync_tiers(&self, session: &mut AlertSession) {
        let granted = session.focus.granted();
        match session.player.start_fallback_chain(granted) {
            SoundTier::None => {
                // Nothing will play, so focus must not stay held.
                session.focus.release();
                info!("sound chain exhausted; alert continues with vibration only");
            }
            _ if granted => self.arm_stop_timer(session),
            _ => {}
        }
    }

    fn on_focus_retry(&mut self, generation: u64) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        if session.generation != generation || session.focus.granted() {
            self.session = Some(session);
            return;
        }
        if session.focus.take_retry() && session.focus.request() {
            self.begin_primary(&mut session);
        } else {
            info!("audio focus denied twice; alert continues without sound");
        }
        self.session = Some(session);
    }

    fn on_focus_change(&mut self, change: FocusChange) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        match change {
            FocusChange::PermanentLoss => {
                info!("audio focus lost; stopping sound");
                session.stop_sound();
            }
            FocusChange::TransientLoss => {
                session.focus.set_granted(false);
                session.player.pause();
            }
            FocusChange::Regain => {
                session.focus.set_granted(true);
                if session.player.handle_open() {
                    session.player.resume();
                    self.arm_stop_timer(&mut session);
                }
            }
        }
        self.session = Some(session);
    }

    fn on_elapsed(&mut self, generation: u64) {
        if self
            .session
            .as_ref()
            .map_or(false, |s| s.generation == generation)
        {
            info!("alert duration elapsed");
            self.teardown();
        } else {
            debug!("stale alert timer for session {generation} ignored");
        }
    }

    /// Arm the hard stop at the fixed duration after first playback
    /// start. Armed at most once per session; the expiry event carries
    /// the generation so a superseded timer cannot touch a later session.
    fn arm_stop_timer(&self, session: &mut AlertSession) {
        if session.timer_armed {
            return;
        }
        session.timer_armed = true;
        self.schedule(
            session.config.duration,
            EngineEvent::AlertElapsed {
                generation: session.generation,
            },
        );
    }

    fn schedule(&self, delay: Duration, event: EngineEvent) {
        let tx = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tx.send(event);
        });
    }

    fn teardown(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.teardown();
        }
    }
}
