//! Static device configuration, loaded once at startup from a JSON file.
//!
//! ```json
//! {
//!     "wifi_ssid": "home",
//!     "wifi_password": "secret",
//!     "wifi_hostname": "mailbox",
//!     "status_notify_url": "https://example.com/mailbox",
//!     "door_pin": 20,
//!     "red_led_pin": 17,
//!     "green_led_pin": 27,
//!     "blue_led_pin": 22,
//!     "door_open_resend_interval_seconds": 300,
//!     "keepalive_interval_seconds": 3600
//! }
//! ```

use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fmt, fs, io};

use json::JsonValue;
use log::LevelFilter;

use crate::reset::ResetMode;

/// Environment variable overriding [`DEFAULT_PATH`].
pub const PATH_ENV: &str = "MAILBOX_MONITOR_CONFIG";
pub const DEFAULT_PATH: &str = "/etc/mailbox-monitor.json";

const DEFAULT_INTERFACE: &str = "wlan0";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RESET_DELAY_SECS: u64 = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WifiConfig {
    pub ssid: String,
    pub password: String,
    pub hostname: String,
    pub interface: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedPins {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub wifi: WifiConfig,
    pub notify_url: String,
    pub door_pin: u8,
    pub led_pins: LedPins,
    pub led_active_low: bool,
    pub resend_interval: Duration,
    pub keepalive_interval: Duration,
    pub http_timeout: Duration,
    pub require_success_status: bool,
    pub reset_mode: ResetMode,
    pub reset_delay: Duration,
    pub log_level: LevelFilter,
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: io::Error },
    Parse(json::Error),
    Missing(&'static str),
    Invalid { key: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "unable to read {}: {}", path.display(), source)
            }
            ConfigError::Parse(err) => write!(f, "invalid JSON: {}", err),
            ConfigError::Missing(key) => write!(f, "missing required key '{}'", key),
            ConfigError::Invalid { key, reason } => write!(f, "invalid '{}': {}", key, reason),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl Config {
    /// Path named by `MAILBOX_MONITOR_CONFIG`, or the default.
    pub fn path_from_env() -> PathBuf {
        std::env::var_os(PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PATH))
    }

    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Config::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Config, ConfigError> {
        let value = json::parse(text).map_err(ConfigError::Parse)?;
        if !value.is_object() {
            return Err(ConfigError::Invalid {
                key: "<root>",
                reason: String::from("expected an object"),
            });
        }

        let notify_url = required_str(&value, "status_notify_url")?;
        if notify_url.trim().is_empty() {
            return Err(invalid("status_notify_url", "must not be empty"));
        }

        let http_timeout = optional_u64(&value, "http_timeout_seconds")?
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        if http_timeout == 0 {
            return Err(invalid("http_timeout_seconds", "must be positive"));
        }

        let reset_mode = match optional_str(&value, "reset_mode")? {
            Some(mode) => mode
                .parse()
                .map_err(|reason| ConfigError::Invalid {
                    key: "reset_mode",
                    reason,
                })?,
            None => ResetMode::default(),
        };

        let log_level = match optional_str(&value, "log_level")? {
            Some(level) => level
                .parse()
                .map_err(|_| invalid("log_level", "unknown level"))?,
            None => LevelFilter::Info,
        };

        Ok(Config {
            wifi: WifiConfig {
                ssid: required_str(&value, "wifi_ssid")?,
                password: required_str(&value, "wifi_password")?,
                hostname: required_str(&value, "wifi_hostname")?,
                interface: optional_str(&value, "wifi_interface")?
                    .unwrap_or_else(|| String::from(DEFAULT_INTERFACE)),
            },
            notify_url,
            door_pin: required_pin(&value, "door_pin")?,
            led_pins: LedPins {
                red: required_pin(&value, "red_led_pin")?,
                green: required_pin(&value, "green_led_pin")?,
                blue: required_pin(&value, "blue_led_pin")?,
            },
            led_active_low: optional_bool(&value, "led_active_low")?.unwrap_or(false),
            resend_interval: required_interval(&value, "door_open_resend_interval_seconds")?,
            keepalive_interval: required_interval(&value, "keepalive_interval_seconds")?,
            http_timeout: Duration::from_secs(http_timeout),
            require_success_status: optional_bool(&value, "require_success_status")?
                .unwrap_or(false),
            reset_mode,
            reset_delay: Duration::from_secs(
                optional_u64(&value, "reset_delay_seconds")?.unwrap_or(DEFAULT_RESET_DELAY_SECS),
            ),
            log_level,
        })
    }
}

fn invalid(key: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: String::from(reason),
    }
}

fn optional_str(value: &JsonValue, key: &'static str) -> Result<Option<String>, ConfigError> {
    let field = &value[key];
    if field.is_null() {
        return Ok(None);
    }
    field
        .as_str()
        .map(|s| Some(String::from(s)))
        .ok_or_else(|| invalid(key, "expected a string"))
}

fn optional_u64(value: &JsonValue, key: &'static str) -> Result<Option<u64>, ConfigError> {
    let field = &value[key];
    if field.is_null() {
        return Ok(None);
    }
    field
        .as_u64()
        .map(Some)
        .ok_or_else(|| invalid(key, "expected a non-negative integer"))
}

fn optional_bool(value: &JsonValue, key: &'static str) -> Result<Option<bool>, ConfigError> {
    let field = &value[key];
    if field.is_null() {
        return Ok(None);
    }
    field
        .as_bool()
        .map(Some)
        .ok_or_else(|| invalid(key, "expected a boolean"))
}

fn required_str(value: &JsonValue, key: &'static str) -> Result<String, ConfigError> {
    optional_str(value, key)?.ok_or(ConfigError::Missing(key))
}

fn required_pin(value: &JsonValue, key: &'static str) -> Result<u8, ConfigError> {
    let field = &value[key];
    if field.is_null() {
        return Err(ConfigError::Missing(key));
    }
    field
        .as_u8()
        .ok_or_else(|| invalid(key, "expected a GPIO number between 0 and 255"))
}

fn required_interval(value: &JsonValue, key: &'static str) -> Result<Duration, ConfigError> {
    match optional_u64(value, key)? {
        Some(0) => Err(invalid(key, "must be positive")),
        Some(secs) => Ok(Duration::from_secs(secs)),
        None => Err(ConfigError::Missing(key)),
    }
}
