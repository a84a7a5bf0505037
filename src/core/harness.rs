// Fake device backends shared by the core module tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::config::PreferenceStore;
use super::engine::DeviceSet;
use super::error::DeviceError;
use super::focus::AudioFocus;
use super::model::{AlertConfig, SoundSelection, ALERT_DURATION};
use super::notify::AlertPresenter;
use super::player::{PlaybackHandle, SoundDevice};
use super::vibration::Vibrator;
use super::wake::WakeLock;

#[derive(Default)]
pub struct FakeFocus {
    pub grant: AtomicBool,
    pub fail_release: AtomicBool,
    pub requests: AtomicUsize,
    pub releases: AtomicUsize,
    pub boosts: AtomicUsize,
}

impl FakeFocus {
    pub fn granting(grant: bool) -> Arc<Self> {
        let focus = Self::default();
        focus.grant.store(grant, Ordering::SeqCst);
        Arc::new(focus)
    }
}

impl AudioFocus for FakeFocus {
    fn request(&self) -> bool {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.grant.load(Ordering::SeqCst)
    }

    fn release(&self) -> Result<(), DeviceError> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        if self.fail_release.load(Ordering::SeqCst) {
            return Err(DeviceError::Release("focus stuck".into()));
        }
        Ok(())
    }

    fn boost_volume(&self) -> Result<(), DeviceError> {
        self.boosts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Observable state of one fake playback handle.
#[derive(Debug, Default)]
pub struct HandleState {
    pub started: bool,
    pub paused: bool,
    pub stopped: bool,
    pub fail_start: bool,
}

pub struct FakeHandle {
    pub state: Arc<Mutex<HandleState>>,
}

impl PlaybackHandle for FakeHandle {
    fn start(&mut self) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_start {
            return Err(DeviceError::Transient("start refused".into()));
        }
        state.started = true;
        state.paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.state.lock().unwrap().paused = true;
    }

    fn resume(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.started = true;
        state.paused = false;
    }

    fn stop(&mut self) {
        self.state.lock().unwrap().stopped = true;
    }
}

#[derive(Default)]
pub struct FakeSoundDevice {
    pub fail_primary: AtomicBool,
    pub fail_fallback: AtomicBool,
    pub fail_system: AtomicBool,
    /// The next handed-out handle refuses to start.
    pub fail_next_start: AtomicBool,
    /// Order in which tiers were requested: "primary:<id>", "fallback",
    /// "system".
    pub prepared: Mutex<Vec<String>>,
    /// Every handle handed out, in order.
    pub handles: Mutex<Vec<Arc<Mutex<HandleState>>>>,
}

impl FakeSoundDevice {
    pub fn working() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn new_handle(&self) -> Box<dyn PlaybackHandle> {
        let mut state = HandleState::default();
        if self.fail_next_start.swap(false, Ordering::SeqCst) {
            state.fail_start = true;
        }
        let state = Arc::new(Mutex::new(state));
        self.handles.lock().unwrap().push(state.clone());
        Box::new(FakeHandle { state })
    }
}

impl SoundDevice for FakeSoundDevice {
    fn prepare(
        &self,
        selection: &SoundSelection,
    ) -> Result<Box<dyn PlaybackHandle>, DeviceError> {
        match selection {
            SoundSelection::User(id) => {
                self.prepared.lock().unwrap().push(format!("primary:{id}"));
                if self.fail_primary.load(Ordering::SeqCst) {
                    return Err(DeviceError::Transient("primary prepare failed".into()));
                }
                Ok(self.new_handle())
            }
            SoundSelection::Builtin => {
                self.prepared.lock().unwrap().push("fallback".to_string());
                if self.fail_fallback.load(Ordering::SeqCst) {
                    return Err(DeviceError::Transient("fallback prepare failed".into()));
                }
                Ok(self.new_handle())
            }
        }
    }

    fn system_default(&self) -> Result<Box<dyn PlaybackHandle>, DeviceError> {
        self.prepared.lock().unwrap().push("system".to_string());
        if self.fail_system.load(Ordering::SeqCst) {
            return Err(DeviceError::Transient("system default failed".into()));
        }
        Ok(self.new_handle())
    }
}

#[derive(Default)]
pub struct FakeVibrator {
    pub vibrating: AtomicBool,
    pub fail_vibrate: AtomicBool,
    pub fail_cancel: AtomicBool,
    pub starts: AtomicUsize,
    pub last_pattern: Mutex<Option<Vec<u64>>>,
}

impl FakeVibrator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl Vibrator for FakeVibrator {
    fn vibrate(&self, pattern: &[u64]) -> Result<(), DeviceError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.fail_vibrate.load(Ordering::SeqCst) {
            return Err(DeviceError::Transient("motor busy".into()));
        }
        *self.last_pattern.lock().unwrap() = Some(pattern.to_vec());
        self.vibrating.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn cancel(&self) -> Result<(), DeviceError> {
        self.vibrating.store(false, Ordering::SeqCst);
        if self.fail_cancel.load(Ordering::SeqCst) {
            return Err(DeviceError::Release("motor stuck".into()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeWake {
    pub held: AtomicBool,
    pub fail_release: AtomicBool,
    pub acquires: AtomicUsize,
    pub releases: AtomicUsize,
    pub max: Mutex<Option<Duration>>,
}

impl FakeWake {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl WakeLock for FakeWake {
    fn acquire(&self, max: Duration) -> Result<(), DeviceError> {
        self.acquires.fetch_add(1, Ordering::SeqCst);
        *self.max.lock().unwrap() = Some(max);
        self.held.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn release(&self) -> Result<(), DeviceError> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        self.held.store(false, Ordering::SeqCst);
        if self.fail_release.load(Ordering::SeqCst) {
            return Err(DeviceError::Release("hold stuck".into()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakePresenter {
    pub shown: Mutex<Vec<Option<String>>>,
}

impl FakePresenter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl AlertPresenter for FakePresenter {
    fn show(&self, number: Option<&str>) {
        self.shown.lock().unwrap().push(number.map(str::to_string));
    }
}

pub struct FakePrefs {
    pub blocked: Mutex<HashSet<String>>,
    pub sound: Mutex<String>,
    pub vibration: AtomicBool,
}

impl FakePrefs {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            blocked: Mutex::new(HashSet::new()),
            sound: Mutex::new("alert".to_string()),
            vibration: AtomicBool::new(true),
        })
    }

    pub fn block(&self, prefix: &str) {
        self.blocked.lock().unwrap().insert(prefix.to_string());
    }
}

impl PreferenceStore for FakePrefs {
    fn block_rules(&self) -> HashSet<String> {
        self.blocked.lock().unwrap().clone()
    }

    fn selected_sound(&self) -> String {
        self.sound.lock().unwrap().clone()
    }

    fn vibration_enabled(&self) -> bool {
        self.vibration.load(Ordering::SeqCst)
    }
}

/// One full set of fakes plus the views the assertions need.
pub struct TestRig {
    pub focus: Arc<FakeFocus>,
    pub sound: Arc<FakeSoundDevice>,
    pub vibrator: Arc<FakeVibrator>,
    pub wake: Arc<FakeWake>,
    pub presenter: Arc<FakePresenter>,
    pub prefs: Arc<FakePrefs>,
}

impl TestRig {
    pub fn new() -> Self {
        Self {
            focus: FakeFocus::granting(true),
            sound: FakeSoundDevice::working(),
            vibrator: FakeVibrator::new(),
            wake: FakeWake::new(),
            presenter: FakePresenter::new(),
            prefs: FakePrefs::new(),
        }
    }

    pub fn devices(&self) -> DeviceSet {
        DeviceSet {
            sound: self.sound.clone(),
            focus: self.focus.clone(),
            vibrator: self.vibrator.clone(),
            wake: self.wake.clone(),
        }
    }

    pub fn config(&self) -> AlertConfig {
        AlertConfig {
            sound_id: "alert".to_string(),
            vibration_enabled: true,
            duration: ALERT_DURATION,
        }
    }
}
