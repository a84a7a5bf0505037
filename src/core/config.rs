// Preference storage: persisted settings file and the block-rule check.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Identifier of the built-in alert sound, used when the user never
/// picked a ringtone.
pub const BUILTIN_ALERT_ID: &str = "alert";

/// Persisted user settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    /// Number prefixes that suppress the alert entirely.
    #[serde(default)]
    pub blocked_country_codes: HashSet<String>,
    /// Sound identifier for the primary tier.
    #[serde(default = "default_ringtone")]
    pub selected_ringtone: String,
    #[serde(default = "default_vibration")]
    pub enable_vibration: bool,
}

fn default_ringtone() -> String {
    BUILTIN_ALERT_ID.to_string()
}

fn default_vibration() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            blocked_country_codes: HashSet::new(),
            selected_ringtone: default_ringtone(),
            enable_vibration: default_vibration(),
        }
    }
}

/// Read side of the preference store as the engine sees it. Values are
/// read fresh on every alert decision so edits apply to the next call.
pub trait PreferenceStore: Send + Sync {
    fn block_rules(&self) -> HashSet<String>;
    fn selected_sound(&self) -> String;
    fn vibration_enabled(&self) -> bool;
}

pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(config_dir: PathBuf) -> Self {
        Self {
            config_path: config_dir.join("settings.json"),
        }
    }

    /// Load current settings, falling back to defaults on any read or
    /// parse problem. Reads the file every call by design.
    pub fn load(&self) -> Settings {
        if self.config_path.exists() {
            if let Ok(content) = fs::read_to_string(&self.config_path) {
                if let Ok(settings) = serde_json::from_str(&content) {
                    return settings;
                }
            }
        }
        Settings::default()
    }

    pub fn save(&self, settings: &Settings) -> io::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.config_path, content)
    }
}

impl PreferenceStore for ConfigManager {
    fn block_rules(&self) -> HashSet<String> {
        self.load().blocked_country_codes
    }

    fn selected_sound(&self) -> String {
        self.load().selected_ringtone
    }

    fn vibration_enabled(&self) -> bool {
        self.load().enable_vibration
    }
}

/// Literal, case-sensitive prefix test. An absent number never matches
/// any rule, so calls without a number are never blocked.
pub fn is_blocked(number: Option<&str>, rules: &HashSet<String>) -> bool {
    match number {
        Some(n) => rules.iter().any(|prefix| n.starts_with(prefix)),
        None => false,
    }
}
