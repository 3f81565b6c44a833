//! Engine Configuration
//!
//! All environment-driven settings parsed once at startup into an explicit
//! config struct that is passed to the engine at construction.

use std::path::PathBuf;

use crate::error::{FillError, FillResult};

/// Default oracle model fallback chain, tried in order
const DEFAULT_MODELS: &[&str] = &[
    "gemini-2.0-flash",
    "gemini-1.5-flash",
    "gemini-1.5-pro",
    "gemini-pro",
];

/// Default oracle endpoint base
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Engine configuration, normally built from `DOCFILL_*` environment variables
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// API key for the NLU oracle. `None` forces the deterministic local path.
    pub oracle_api_key: Option<String>,
    /// Base URL of the oracle API
    pub oracle_base_url: String,
    /// Model identifiers tried in order when a call fails
    pub oracle_models: Vec<String>,
    /// Total attempts across the model list before giving up
    pub oracle_retry_budget: usize,
    /// Most-recent messages included in the turn prompt
    pub history_window: usize,
    /// Maximum document characters sent to field detection
    pub analysis_truncation: usize,
    /// Root directory for filled artifacts and previews
    pub data_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            oracle_api_key: None,
            oracle_base_url: DEFAULT_BASE_URL.to_string(),
            oracle_models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            oracle_retry_budget: 3,
            history_window: 8,
            analysis_truncation: 15_000,
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl EngineConfig {
    /// Build from environment variables, falling back to defaults.
    ///
    /// Recognized variables:
    /// - `DOCFILL_ORACLE_API_KEY` (or `GEMINI_API_KEY`)
    /// - `DOCFILL_ORACLE_BASE_URL`
    /// - `DOCFILL_ORACLE_MODELS` (comma-separated, tried in order)
    /// - `DOCFILL_ORACLE_RETRIES`
    /// - `DOCFILL_HISTORY_WINDOW`
    /// - `DOCFILL_ANALYSIS_TRUNCATION`
    /// - `DOCFILL_DATA_DIR`
    pub fn from_env() -> FillResult<Self> {
        let defaults = Self::default();

        let oracle_api_key = std::env::var("DOCFILL_ORACLE_API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty());

        let oracle_base_url =
            std::env::var("DOCFILL_ORACLE_BASE_URL").unwrap_or(defaults.oracle_base_url);

        let oracle_models = match std::env::var("DOCFILL_ORACLE_MODELS") {
            Ok(raw) => {
                let models: Vec<String> = raw
                    .split(',')
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
                    .collect();
                if models.is_empty() {
                    return Err(FillError::Configuration {
                        message: "DOCFILL_ORACLE_MODELS is set but contains no model names"
                            .to_string(),
                    });
                }
                models
            }
            Err(_) => defaults.oracle_models,
        };

        Ok(Self {
            oracle_api_key,
            oracle_base_url,
            oracle_models,
            oracle_retry_budget: parse_env("DOCFILL_ORACLE_RETRIES", defaults.oracle_retry_budget)?,
            history_window: parse_env("DOCFILL_HISTORY_WINDOW", defaults.history_window)?,
            analysis_truncation: parse_env(
                "DOCFILL_ANALYSIS_TRUNCATION",
                defaults.analysis_truncation,
            )?,
            data_dir: std::env::var("DOCFILL_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
        })
    }
}

fn parse_env(var: &str, default: usize) -> FillResult<usize> {
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|_| FillError::Configuration {
            message: format!("{} must be a non-negative integer, got '{}'", var, raw),
        }),
        Err(_) => Ok(default),
    }
}
