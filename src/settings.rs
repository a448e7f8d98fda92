use std::fs;
use std::path::{Path, PathBuf};

use crate::display::{DisplaySettings, GAIN_RANGE, is_allowed_window};
use crate::monitor::SessionConfig;

const MAX_SAMPLE_RATE_HZ: u32 = 16_000;
const MAX_CHANNELS: usize = 64;
const MAX_BUFFER_SECONDS: f64 = 600.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThemeKind {
    Dark,
    Light,
}

impl ThemeKind {
    pub fn label(self) -> &'static str {
        match self {
            ThemeKind::Dark => "Dark",
            ThemeKind::Light => "Light",
        }
    }

    pub fn from_key(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "light" => ThemeKind::Light,
            _ => ThemeKind::Dark,
        }
    }

    pub fn as_key(self) -> &'static str {
        match self {
            ThemeKind::Dark => "dark",
            ThemeKind::Light => "light",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppSettings {
    pub theme: ThemeKind,
    pub session: SessionConfig,
    pub display: DisplaySettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: ThemeKind::Dark,
            session: SessionConfig {
                sample_rate_hz: 250,
                buffer_seconds: 60.0,
                channel_count: 8,
                seed: 0x5EED,
            },
            display: DisplaySettings::default(),
        }
    }
}

impl AppSettings {
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(raw) => {
                log::info!("loaded settings from {}", path.display());
                Self::parse(&raw)
            }
            Err(err) => {
                log::info!("no settings at {} ({err}); using defaults", path.display());
                AppSettings::default()
            }
        }
    }

    pub fn parse(raw: &str) -> Self {
        let mut settings = AppSettings::default();
        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                apply_kv(key.trim(), value.trim(), &mut settings);
            }
        }
        settings
    }

    pub fn to_config_string(&self) -> String {
        let mut buf = String::new();
        buf.push_str(&format!("theme={}\n", self.theme.as_key()));
        buf.push_str(&format!("sample_rate_hz={}\n", self.session.sample_rate_hz));
        buf.push_str(&format!("buffer_seconds={}\n", self.session.buffer_seconds));
        buf.push_str(&format!("channel_count={}\n", self.session.channel_count));
        buf.push_str(&format!("seed={}\n", self.session.seed));
        buf.push_str(&format!("window_seconds={}\n", self.display.window_seconds));
        buf.push_str(&format!("gain={}\n", self.display.gain));
        buf
    }

    pub fn save(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                log::warn!("could not create {}: {err}", parent.display());
            }
        }
        match fs::write(path, self.to_config_string()) {
            Ok(()) => log::debug!("saved settings to {}", path.display()),
            Err(err) => log::warn!("could not save settings to {}: {err}", path.display()),
        }
    }
}

pub fn default_settings_path() -> PathBuf {
    config_dir().join("eeg_monitor.cfg")
}

fn apply_kv(key: &str, value: &str, settings: &mut AppSettings) {
    match key {
        "theme" => settings.theme = ThemeKind::from_key(value),
        "sample_rate_hz" => {
            if let Some(rate) = parse::<u32>(key, value) {
                if rate == 0 || rate > MAX_SAMPLE_RATE_HZ {
                    log::warn!("rejecting sample_rate_hz={rate}: must be 1..={MAX_SAMPLE_RATE_HZ}");
                } else {
                    settings.session.sample_rate_hz = rate;
                }
            }
        }
        "buffer_seconds" => {
            if let Some(seconds) = parse::<f64>(key, value) {
                if (1.0..=MAX_BUFFER_SECONDS).contains(&seconds) {
                    settings.session.buffer_seconds = seconds;
                } else {
                    log::warn!("rejecting buffer_seconds={seconds}: must be 1..={MAX_BUFFER_SECONDS}");
                }
            }
        }
        "channel_count" => {
            if let Some(count) = parse::<usize>(key, value) {
                if (1..=MAX_CHANNELS).contains(&count) {
                    settings.session.channel_count = count;
                } else {
                    log::warn!("rejecting channel_count={count}: must be 1..={MAX_CHANNELS}");
                }
            }
        }
        "window_seconds" => {
            if let Some(seconds) = parse::<f64>(key, value) {
                if is_allowed_window(seconds) {
                    settings.display.window_seconds = seconds;
                } else {
                    log::warn!("rejecting window_seconds={seconds}: not an offered sweep width");
                }
            }
        }
        "seed" => {
            if let Some(seed) = parse::<u32>(key, value) {
                settings.session.seed = seed;
            }
        }
        "gain" => {
            if let Some(gain) = parse::<f32>(key, value) {
                if gain.is_finite() {
                    settings.display.gain = gain.clamp(*GAIN_RANGE.start(), *GAIN_RANGE.end());
                } else {
                    log::warn!("rejecting gain={gain}: must be a finite number");
                }
            }
        }
        _ => log::debug!("ignoring unknown settings key '{key}'"),
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
    let parsed = value.parse::<T>().ok();
    if parsed.is_none() {
        log::warn!("could not parse {key}='{value}'; keeping default");
    }
    parsed
}

fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("eeg-monitor")
}
