//! Session-wide settings handed to constructors instead of process globals.

use serde::{Deserialize, Serialize};

/// Verbosity of an object's diagnostic output, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    None,
}

impl LogLevel {
    /// True when a message at `level` should be emitted by an object configured with `self`.
    pub fn allows(self, level: LogLevel) -> bool {
        self != LogLevel::None && level != LogLevel::None && level >= self
    }

    pub fn parse(text: &str) -> Option<LogLevel> {
        Some(match text.trim().to_ascii_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            "none" | "off" => LogLevel::None,
            _ => return None,
        })
    }
}

/// Created once when a session starts and dropped when it ends.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    pub default_log_level: LogLevel,
    pub screen_width: u32,
    pub screen_height: u32,
}

impl SessionContext {
    pub fn new(screen_width: u32, screen_height: u32) -> Self {
        Self {
            default_log_level: LogLevel::default(),
            screen_width,
            screen_height,
        }
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.default_log_level = level;
        self
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(1024, 768)
    }
}
