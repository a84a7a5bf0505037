// Desktop device backends: rodio-backed sound output plus stand-ins for
// the platform services a desktop machine does not have (focus
// arbitration, vibration motor, suspend control).

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender};
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use rodio::source::{SineWave, Source};
use rodio::{Decoder, OutputStream, Sink};

use crate::core::error::{DeviceError, StartupError};
use crate::core::focus::AudioFocus;
use crate::core::model::SoundSelection;
use crate::core::player::{PlaybackHandle, SoundDevice};
use crate::core::vibration::Vibrator;
use crate::core::wake::WakeLock;

const FALLBACK_TONE_HZ: f32 = 880.0;
const SYSTEM_TONE_HZ: f32 = 440.0;

/// Sound device backed by rodio. Each playback runs on its own thread
/// because rodio's OutputStream is not Send; the handle talks to that
/// thread over a command channel.
pub struct RodioSoundDevice {
    sounds_dir: PathBuf,
}

impl RodioSoundDevice {
    /// Probe the output device once so a missing audio backend fails at
    /// startup instead of during the first alert.
    pub fn new(sounds_dir: PathBuf) -> Result<Self, StartupError> {
        let probe = OutputStream::try_default()
            .map_err(|e| StartupError::AudioBackend(e.to_string()))?;
        drop(probe);
        Ok(Self { sounds_dir })
    }

    fn resolve(&self, id: &str) -> PathBuf {
        let mut path = self.sounds_dir.join(id);
        if path.extension().is_none() {
            path.set_extension("ogg");
        }
        path
    }
}

impl SoundDevice for RodioSoundDevice {
    fn prepare(
        &self,
        selection: &SoundSelection,
    ) -> Result<Box<dyn PlaybackHandle>, DeviceError> {
        match selection {
            SoundSelection::User(id) => {
                let path = self.resolve(id);
                // Decode the header now so a bad file fails the tier
                // here rather than on the playback thread.
                let file = File::open(&path)
                    .map_err(|e| DeviceError::Transient(format!("{}: {e}", path.display())))?;
                Decoder::new(BufReader::new(file))
                    .map_err(|e| DeviceError::Transient(e.to_string()))?;
                Ok(Box::new(RodioHandle::new(PlaybackSource::File(path))))
            }
            SoundSelection::Builtin => Ok(Box::new(RodioHandle::new(PlaybackSource::Tone(
                FALLBACK_TONE_HZ,
            )))),
        }
    }

    fn system_default(&self) -> Result<Box<dyn PlaybackHandle>, DeviceError> {
        Ok(Box::new(RodioHandle::new(PlaybackSource::Tone(
            SYSTEM_TONE_HZ,
        ))))
    }
}

enum PlaybackSource {
    File(PathBuf),
    Tone(f32),
}

enum PlayerCmd {
    Pause,
    Resume,
    Stop,
}

struct RodioHandle {
    /// Consumed on first start; Some means prepared but not yet started.
    source: Option<PlaybackSource>,
    cmd: Option<Sender<PlayerCmd>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl RodioHandle {
    fn new(source: PlaybackSource) -> Self {
        Self {
            source: Some(source),
            cmd: None,
            thread: None,
        }
    }

    fn send(&self, cmd: PlayerCmd) {
        if let Some(tx) = self.cmd.as_ref() {
            let _ = tx.send(cmd);
        }
    }
}

impl PlaybackHandle for RodioHandle {
    fn start(&mut self) -> Result<(), DeviceError> {
        let Some(source) = self.source.take() else {
            return Ok(());
        };
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let thread = thread::Builder::new()
            .name("callwatch-audio".to_string())
            .spawn(move || playback_thread(source, &cmd_rx, &ready_tx))
            .map_err(|e| DeviceError::Transient(e.to_string()))?;
        self.thread = Some(thread);
        self.cmd = Some(cmd_tx);

        match ready_rx.recv_timeout(Duration::from_secs(5)) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                self.stop();
                Err(e)
            }
            Err(_) => {
                self.stop();
                Err(DeviceError::Transient(
                    "audio thread did not come up".to_string(),
                ))
            }
        }
    }

    fn pause(&mut self) {
        self.send(PlayerCmd::Pause);
    }

    fn resume(&mut self) {
        if self.source.is_some() {
            // Prepared during focus loss and never started.
            if let Err(e) = self.start() {
                warn!("deferred playback start failed: {e}");
            }
        } else {
            self.send(PlayerCmd::Resume);
        }
    }

    fn stop(&mut self) {
        self.source = None;
        if let Some(cmd) = self.cmd.take() {
            let _ = cmd.send(PlayerCmd::Stop);
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("audio thread panicked during stop");
            }
        }
    }
}

impl Drop for RodioHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn playback_thread(
    source: PlaybackSource,
    cmd: &Receiver<PlayerCmd>,
    ready: &SyncSender<Result<(), DeviceError>>,
) {
    let (stream, handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            let _ = ready.send(Err(DeviceError::Transient(e.to_string())));
            return;
        }
    };
    let sink = match Sink::try_new(&handle) {
        Ok(sink) => sink,
        Err(e) => {
            let _ = ready.send(Err(DeviceError::Transient(e.to_string())));
            return;
        }
    };

    let tone = match &source {
        PlaybackSource::File(path) => {
            let decoded = File::open(path)
                .map_err(|e| DeviceError::Transient(e.to_string()))
                .and_then(|file| {
                    Decoder::new(BufReader::new(file))
                        .map_err(|e| DeviceError::Transient(e.to_string()))
                });
            match decoded {
                Ok(decoder) => {
                    sink.append(decoder);
                    None
                }
                Err(e) => {
                    let _ = ready.send(Err(e));
                    return;
                }
            }
        }
        PlaybackSource::Tone(freq) => {
            append_beep(&sink, *freq);
            Some(*freq)
        }
    };
    let _ = ready.send(Ok(()));

    // Control loop; exits on stop or when a file source runs dry. Tone
    // sources are refilled so they beep until stopped.
    loop {
        match cmd.recv_timeout(Duration::from_millis(200)) {
            Ok(PlayerCmd::Pause) => sink.pause(),
            Ok(PlayerCmd::Resume) => sink.play(),
            Ok(PlayerCmd::Stop) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => match tone {
                Some(freq) => {
                    if sink.len() < 2 {
                        append_beep(&sink, freq);
                    }
                }
                None => {
                    if sink.empty() {
                        debug!("sound source finished");
                        break;
                    }
                }
            },
        }
    }
    sink.stop();
    drop(stream);
}

fn append_beep(sink: &Sink, freq: f32) {
    let beep = SineWave::new(freq)
        .take_duration(Duration::from_millis(600))
        .amplify(0.6);
    let gap = SineWave::new(freq)
        .take_duration(Duration::from_millis(300))
        .amplify(0.0);
    sink.append(beep);
    sink.append(gap);
}

/// Audio focus is uncontended on a desktop; requests always succeed and
/// there is no alarm-stream mixer to boost.
pub struct DesktopAudioFocus;

impl AudioFocus for DesktopAudioFocus {
    fn request(&self) -> bool {
        true
    }

    fn release(&self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn boost_volume(&self) -> Result<(), DeviceError> {
        Ok(())
    }
}

/// Desktop machines have no vibration motor; the pattern is logged so
/// the demo still shows when vibration would run.
pub struct LogVibrator;

impl Vibrator for LogVibrator {
    fn vibrate(&self, pattern: &[u64]) -> Result<(), DeviceError> {
        debug!("vibrate {pattern:?} (no motor present)");
        Ok(())
    }

    fn cancel(&self) -> Result<(), DeviceError> {
        debug!("vibration cancelled");
        Ok(())
    }
}

/// Suspend is not a concern for the demo binary.
pub struct NoopWakeLock;

impl WakeLock for NoopWakeLock {
    fn acquire(&self, max: Duration) -> Result<(), DeviceError> {
        debug!("wake hold acquired for {max:?}");
        Ok(())
    }

    fn release(&self) -> Result<(), DeviceError> {
        debug!("wake hold released");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_prepare_missing_file_is_transient() {
        let dir = tempdir().unwrap();
        // Skip on machines without an audio device (CI).
        let Ok(device) = RodioSoundDevice::new(dir.path().to_path_buf()) else {
            return;
        };
        let result = device.prepare(&SoundSelection::User("missing".to_string()));
        assert!(matches!(result, Err(DeviceError::Transient(_))));
    }

    #[test]
    fn test_resolve_appends_extension_once() {
        let device = RodioSoundDevice {
            sounds_dir: PathBuf::from("/sounds"),
        };
        assert_eq!(device.resolve("alert"), PathBuf::from("/sounds/alert.ogg"));
        assert_eq!(
            device.resolve("alert.wav"),
            PathBuf::from("/sounds/alert.wav")
        );
    }

    #[test]
    fn test_stub_focus_always_grants() {
        let focus = DesktopAudioFocus;
        assert!(focus.request());
        assert!(focus.release().is_ok());
    }
}
