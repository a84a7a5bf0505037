// Alert sound playback: the tiered fallback chain over a platform sound
// device. Primary preparation runs off the event loop; the fallback and
// system-default tiers are synchronous and bounded.

use std::sync::Arc;

use log::{debug, warn};

use super::error::DeviceError;
use super::model::{SoundSelection, SoundTier};

/// An open, owned playback resource. At most one exists per session.
pub trait PlaybackHandle: Send {
    /// Begin playback. A start failure sends the caller to the next tier.
    fn start(&mut self) -> Result<(), DeviceError>;

    fn pause(&mut self);

    /// Resume playback, starting it if the handle was prepared while
    /// focus was lost and never started.
    fn resume(&mut self);

    /// Stop playback and release the underlying device resource. Must
    /// not panic; device errors are logged internally.
    fn stop(&mut self);
}

/// Platform seam for loading sound resources.
pub trait SoundDevice: Send + Sync {
    /// Load and prepare a sound. May be slow for user-selected sounds;
    /// the engine calls this off the event loop for the primary tier.
    fn prepare(&self, selection: &SoundSelection)
        -> Result<Box<dyn PlaybackHandle>, DeviceError>;

    /// Open the platform's own default sound path.
    fn system_default(&self) -> Result<Box<dyn PlaybackHandle>, DeviceError>;
}

/// Playback state for one alert session: which tier is active and the
/// single open handle, if any.
pub struct AlertPlayer {
    device: Arc<dyn SoundDevice>,
    tier: SoundTier,
    handle: Option<Box<dyn PlaybackHandle>>,
}

impl AlertPlayer {
    pub fn new(device: Arc<dyn SoundDevice>) -> Self {
        Self {
            device,
            tier: SoundTier::None,
            handle: None,
        }
    }

    pub fn tier(&self) -> SoundTier {
        self.tier
    }

    pub fn handle_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Mark the primary tier as in flight. The prepared handle arrives
    /// later through the engine queue.
    pub fn begin_primary(&mut self) {
        self.tier = SoundTier::Primary;
    }

    /// Attach a prepared handle, starting it when focus is granted. A
    /// handle prepared during transient focus loss stays open unstarted
    /// and is started on regain. Returns false when starting failed and
    /// the handle was discarded; the caller falls to the next tier.
    pub fn attach_prepared(
        &mut self,
        mut handle: Box<dyn PlaybackHandle>,
        focus_granted: bool,
    ) -> bool {
        // Invariant: at most one open handle.
        if let Some(mut old) = self.handle.take() {
            old.stop();
        }
        if focus_granted {
            if let Err(e) = handle.start() {
                warn!("playback start failed on tier {:?}: {e}", self.tier);
                handle.stop();
                return false;
            }
        }
        self.handle = Some(handle);
        true
    }

    /// Run the synchronous tiers in order: fallback sound, then the
    /// system default. Returns the tier left active, `SoundTier::None`
    /// when the whole chain is exhausted.
    pub fn start_fallback_chain(&mut self, focus_granted: bool) -> SoundTier {
        if let Some(mut old) = self.handle.take() {
            old.stop();
        }

        self.tier = SoundTier::Fallback;
        match self.device.prepare(&SoundSelection::Builtin) {
            Ok(handle) => {
                if self.attach_prepared(handle, focus_granted) {
                    debug!("fallback sound active");
                    return SoundTier::Fallback;
                }
            }
            Err(e) => warn!("fallback sound unavailable: {e}"),
        }

        self.tier = SoundTier::SystemDefault;
        match self.device.system_default() {
            Ok(handle) => {
                if self.attach_prepared(handle, focus_granted) {
                    debug!("system default sound active");
                    return SoundTier::SystemDefault;
                }
            }
            Err(e) => warn!("system default sound unavailable: {e}"),
        }

        // Sound is a lost cause; the alert carries on without it.
        self.tier = SoundTier::None;
        SoundTier::None
    }

    pub fn pause(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            handle.pause();
        }
    }

    pub fn resume(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            handle.resume();
        }
    }

    /// Stop and release any open handle and reset the tier. Safe to call
    /// from any state, any number of times.
    pub fn stop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.stop();
        }
        self.tier = SoundTier::None;
    }
}
