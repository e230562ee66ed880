use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::resolution::{CachePolicy, MatchPolicy};
use crate::scoring::{DealScoreConfig, HmoPolicy, TaPolicy};

/// Distinguishes runtime behavior for different stages of the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let engine = match env::var("DEAL_FINDER_CONFIG") {
            Ok(path) if !path.trim().is_empty() => EngineConfig::from_path(path.trim())?,
            _ => EngineConfig::default(),
        };
        engine.validate()?;

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level },
            engine,
        })
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Matching and scoring policy. Every field falls back to its default when omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub matching: MatchPolicy,
    pub deal: DealScoreConfig,
    pub hmo: HmoPolicy,
    pub ta: TaPolicy,
    pub cache: CachePolicy,
}

impl EngineConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::EngineFile {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::EngineJson {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let total = self.deal.weights.total();
        if total != 100 {
            return Err(ConfigError::InvalidWeights { total });
        }

        let positive = [
            ("ta.lha_tolerance", self.ta.lha_tolerance),
            ("matching.candidate_radius_km", self.matching.candidate_radius_km),
            ("deal.yield_target_pct", self.deal.yield_target_pct),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { name, value });
            }
        }

        let ttls = [
            ("cache.positive_ttl_secs", self.cache.positive_ttl_secs),
            ("cache.negative_ttl_secs", self.cache.negative_ttl_secs),
        ];
        for (name, value) in ttls {
            if !(0..=CachePolicy::MAX_TTL_SECS).contains(&value) {
                return Err(ConfigError::TtlOutOfRange { name, value });
            }
        }

        if self.hmo.value_add_threshold > self.hmo.ready_threshold {
            return Err(ConfigError::InvertedThresholds {
                ready: self.hmo.ready_threshold,
                value_add: self.hmo.value_add_threshold,
            });
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidWeights { total: u16 },
    NonPositive { name: &'static str, value: f64 },
    InvertedThresholds { ready: u8, value_add: u8 },
    TtlOutOfRange { name: &'static str, value: i64 },
    EngineFile { path: PathBuf, source: std::io::Error },
    EngineJson { path: PathBuf, source: serde_json::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidWeights { total } => {
                write!(f, "deal score weights must sum to 100 (got {total})")
            }
            ConfigError::NonPositive { name, value } => {
                write!(f, "{name} must be a positive number (got {value})")
            }
            ConfigError::InvertedThresholds { ready, value_add } => write!(
                f,
                "hmo.value_add_threshold ({value_add}) must not exceed hmo.ready_threshold ({ready})"
            ),
            ConfigError::TtlOutOfRange { name, value } => write!(
                f,
                "{name} must be between 0 and {} seconds (got {value})",
                CachePolicy::MAX_TTL_SECS
            ),
            ConfigError::EngineFile { path, .. } => {
                write!(f, "DEAL_FINDER_CONFIG file {} could not be read", path.display())
            }
            ConfigError::EngineJson { path, .. } => {
                write!(f, "DEAL_FINDER_CONFIG file {} is not valid engine JSON", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidWeights { .. }
            | ConfigError::NonPositive { .. }
            | ConfigError::InvertedThresholds { .. }
            | ConfigError::TtlOutOfRange { .. } => None,
            ConfigError::EngineFile { source, .. } => Some(source),
            ConfigError::EngineJson { source, .. } => Some(source),
        }
    }
}
