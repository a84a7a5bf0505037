#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]

// Demo shell: wires desktop device backends to the alert engine and
// drives it from a stdin call simulator.

use std::path::PathBuf;
use std::sync::Arc;

use log::error;
use tokio::io::{AsyncBufReadExt, BufReader};

use callwatch::core::config::ConfigManager;
use callwatch::core::engine::DeviceSet;
use callwatch::core::model::CallEvent;
use callwatch::core::notify::LogPresenter;
use callwatch::device::{DesktopAudioFocus, LogVibrator, NoopWakeLock, RodioSoundDevice};
use callwatch::CallAlertService;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let sounds_dir = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("sounds"), PathBuf::from);
    let config_dir = std::env::var("CALLWATCH_CONFIG_DIR")
        .map_or_else(|_| PathBuf::from("."), PathBuf::from);

    let sound = match RodioSoundDevice::new(sounds_dir) {
        Ok(device) => Arc::new(device),
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };
    let devices = DeviceSet {
        sound,
        focus: Arc::new(DesktopAudioFocus),
        vibrator: Arc::new(LogVibrator),
        wake: Arc::new(NoopWakeLock),
    };
    let prefs = Arc::new(ConfigManager::new(config_dir));

    let service = match CallAlertService::start(devices, prefs, Arc::new(LogPresenter)) {
        Ok(service) => service,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    println!("commands: ring [number] | idle | offhook | quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let mut parts = line.trim().splitn(2, ' ');
        let cmd = parts.next().unwrap_or("");
        let arg = parts.next().map(str::trim).filter(|s| !s.is_empty());
        match cmd {
            "ring" => service.submit(CallEvent::ringing(arg)),
            "idle" => service.submit(CallEvent::idle()),
            "offhook" => service.submit(CallEvent::off_hook()),
            "quit" | "exit" => break,
            "" => {}
            other => println!("unknown command: {other}"),
        }
    }

    service.shutdown().await;
}
