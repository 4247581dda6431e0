// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration for the instrumentation layer.
//!
//! Loaded from a JSON file in the host's working directory, then overridden
//! by `PULSE_*` environment variables. A missing file is not an error; the
//! defaults instrument everything.

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::telemetry::TelemetryConfig;

/// Config file names to search for (in order).
pub const CONFIG_FILES: &[&str] = &[".pulse.json", "pulse.config.json"];

/// Instrumentation layer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstrumentConfig {
    /// Install the measuring task constructor at attach time.
    pub instrument_tasks: bool,

    /// Install job tracing at attach time.
    pub trace_jobs: bool,

    /// Additional noise patterns for the error filter chain, matched
    /// case-insensitively against the full message.
    pub extra_noise_patterns: Vec<String>,

    /// Diagnostic log filter directive, e.g. `"pulse=debug"`.
    pub log_filter: Option<String>,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            instrument_tasks: true,
            trace_jobs: true,
            extra_noise_patterns: Vec::new(),
            log_filter: None,
        }
    }
}

impl InstrumentConfig {
    /// Derive the diagnostic-output config from this config.
    pub fn telemetry_config(&self) -> TelemetryConfig {
        let base = TelemetryConfig::production();
        match &self.log_filter {
            Some(filter) => base.with_filter(filter.clone()),
            None => base,
        }
    }
}

/// Load configuration from `dir`, then apply environment overrides.
///
/// Searches [`CONFIG_FILES`] in order; if none exists the defaults are
/// used. A file that exists but does not parse is an error, as is a config
/// carrying an invalid noise pattern.
pub fn load_config(dir: &Path) -> Result<InstrumentConfig, ConfigError> {
    let mut config = InstrumentConfig::default();

    for filename in CONFIG_FILES {
        let path = dir.join(filename);
        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            config = serde_json::from_str(&content)?;
            break;
        }
    }

    apply_env_overrides(&mut config);
    validate(&config)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut InstrumentConfig) {
    if let Ok(value) = std::env::var("PULSE_INSTRUMENT_TASKS") {
        config.instrument_tasks = env_flag(&value);
    }
    if let Ok(value) = std::env::var("PULSE_TRACE_JOBS") {
        config.trace_jobs = env_flag(&value);
    }
    if let Ok(value) = std::env::var("PULSE_LOG_FILTER") {
        if !value.is_empty() {
            config.log_filter = Some(value);
        }
    }
}

fn env_flag(value: &str) -> bool {
    !matches!(value.trim().to_lowercase().as_str(), "0" | "false" | "off" | "no")
}

fn validate(config: &InstrumentConfig) -> Result<(), ConfigError> {
    for pattern in &config.extra_noise_patterns {
        if let Err(err) = Regex::new(pattern) {
            return Err(ConfigError::InvalidValue {
                field: "extraNoisePatterns".to_string(),
                message: err.to_string(),
            });
        }
    }
    Ok(())
}
