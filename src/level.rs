use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::str::FromStr;
use thiserror::Error;

/// Severity class of a log entry. Variant order is the display order used
/// by the level histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Warning,
    Info,
    Debug,
    Trace,
    Normal,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warning => "warning",
            Level::Info => "info",
            Level::Debug => "debug",
            Level::Trace => "trace",
            Level::Normal => "normal",
        }
    }

    pub fn is_error(self) -> bool {
        self == Level::Error
    }

    /// Maps an explicit level field (`@level`, `level`) onto a class. Values
    /// outside the known vocabulary go through [`classify`].
    pub fn from_field(value: &str) -> Level {
        let lower = value.trim().to_ascii_lowercase();
        match lower.as_str() {
            "error" | "err" | "panic" | "fatal" | "crit" | "critical" => Level::Error,
            "warn" | "warning" => Level::Warning,
            "info" => Level::Info,
            "debug" => Level::Debug,
            "trace" => Level::Trace,
            other => classify(other),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown level `{0}` (expected error, warning, info, debug, trace or normal)")]
pub struct UnknownLevel(pub String);

impl FromStr for Level {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Level::Error),
            "warning" | "warn" => Ok(Level::Warning),
            "info" => Ok(Level::Info),
            "debug" => Ok(Level::Debug),
            "trace" => Ok(Level::Trace),
            "normal" => Ok(Level::Normal),
            _ => Err(UnknownLevel(s.to_string())),
        }
    }
}

// First match wins: "info: deployment failed" is an error.
static LEVEL_RULES: Lazy<Vec<(Level, Regex)>> = Lazy::new(|| {
    vec![
        (Level::Error, Regex::new(r"(?i)\bpanic\b|\bfatal\b|\berror\b|exception|failed").unwrap()),
        (Level::Warning, Regex::new(r"(?i)\bwarn(?:ing)?\b").unwrap()),
        (Level::Debug, Regex::new(r"(?i)\bdebug\b").unwrap()),
        (Level::Trace, Regex::new(r"(?i)\btrace\b").unwrap()),
        (Level::Info, Regex::new(r"(?i)\binfo\b").unwrap()),
    ]
});

/// Keyword precedence used by [`classify`], highest first.
pub fn precedence() -> Vec<Level> {
    LEVEL_RULES.iter().map(|(level, _)| *level).collect()
}

pub fn classify(text: &str) -> Level {
    LEVEL_RULES
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(level, _)| *level)
        .unwrap_or(Level::Normal)
}
