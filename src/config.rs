//! Environment-driven defaults. Command-line flags override these.

use std::env;
use std::path::PathBuf;

use crate::ir::{ConfidenceThreshold, DEFAULT_MAX_PIXELS};

/// Default weights location, relative to the working directory.
pub const DEFAULT_MODEL_PATH: &str = "weights/best.onnx";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "development".to_string())
            .to_lowercase()
            .as_str()
        {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub environment: Environment,
    pub model_path: PathBuf,
    pub confidence_threshold: f64,
    pub max_pixels: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            confidence_threshold: ConfidenceThreshold::DEFAULT,
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

impl Config {
    /// Load configuration from `STONESCAN_*` environment variables.
    /// Unset or unparseable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let model_path = lookup("STONESCAN_MODEL")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.model_path);

        let confidence_threshold = lookup("STONESCAN_CONFIDENCE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.confidence_threshold);

        let max_pixels = lookup("STONESCAN_MAX_PIXELS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_pixels);

        Self {
            environment: Environment::parse(lookup("STONESCAN_ENV")),
            model_path,
            confidence_threshold,
            max_pixels,
        }
    }
}
