use crate::dispatcher::DispatchOptions;
use crate::error::{BatchError, Result};
use crate::models::Program;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_PROGRAM: &str = "TIMESIFT_BATCH_PROGRAM";
pub const ENV_CONCURRENCY: &str = "TIMESIFT_BATCH_CONCURRENCY";
pub const ENV_FAIL_FAST: &str = "TIMESIFT_BATCH_FAIL_FAST";
pub const ENV_TIMEOUT_SECS: &str = "TIMESIFT_BATCH_TIMEOUT_SECS";

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from the `[dispatch]` table of the job file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// `[dispatch]` table of a job file
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchSection {
    pub program: Option<String>,
    pub program_args: Option<Vec<String>>,
    pub concurrency: Option<usize>,
    pub fail_fast: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub log_dir: Option<PathBuf>,
}

/// Layered dispatch configuration
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub program: ConfigValue<String>,
    pub program_args: ConfigValue<Vec<String>>,
    pub concurrency: ConfigValue<usize>,
    pub fail_fast: ConfigValue<bool>,
    pub timeout_secs: ConfigValue<Option<u64>>,
    pub log_dir: ConfigValue<Option<PathBuf>>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            program: ConfigValue::new("timesift".to_string(), ConfigSource::Default),
            program_args: ConfigValue::new(Vec::new(), ConfigSource::Default),
            concurrency: ConfigValue::new(1, ConfigSource::Default),
            fail_fast: ConfigValue::new(false, ConfigSource::Default),
            timeout_secs: ConfigValue::new(None, ConfigSource::Default),
            log_dir: ConfigValue::new(None, ConfigSource::Default),
        }
    }

    /// Apply the `[dispatch]` table of a job file
    pub fn apply_file(mut self, section: &DispatchSection) -> Result<Self> {
        if let Some(program) = &section.program {
            if program.trim().is_empty() {
                return Err(BatchError::ConfigInvalid {
                    key: "program".to_string(),
                    reason: "program must not be empty".to_string(),
                });
            }
            self.program.update(program.clone(), ConfigSource::File);
        }

        if let Some(args) = &section.program_args {
            self.program_args.update(args.clone(), ConfigSource::File);
        }

        if let Some(concurrency) = section.concurrency {
            if concurrency == 0 {
                return Err(BatchError::ConfigInvalid {
                    key: "concurrency".to_string(),
                    reason: "concurrency must be at least 1".to_string(),
                });
            }
            self.concurrency.update(concurrency, ConfigSource::File);
        }

        if let Some(fail_fast) = section.fail_fast {
            self.fail_fast.update(fail_fast, ConfigSource::File);
        }

        if let Some(timeout) = section.timeout_secs {
            if timeout == 0 {
                return Err(BatchError::ConfigInvalid {
                    key: "timeout_secs".to_string(),
                    reason: "timeout must be at least 1 second; omit it to disable".to_string(),
                });
            }
            self.timeout_secs.update(Some(timeout), ConfigSource::File);
        }

        if let Some(log_dir) = &section.log_dir {
            self.log_dir.update(Some(log_dir.clone()), ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        if let Ok(program) = env::var(ENV_PROGRAM) {
            if program.trim().is_empty() {
                tracing::warn!("Ignoring empty {}", ENV_PROGRAM);
            } else {
                self.program.update(program, ConfigSource::Environment);
            }
        }

        if let Ok(value) = env::var(ENV_CONCURRENCY) {
            match value.parse::<usize>() {
                Ok(n) if n > 0 => self.concurrency.update(n, ConfigSource::Environment),
                _ => tracing::warn!(
                    "Invalid {} value '{}': expected a positive integer",
                    ENV_CONCURRENCY,
                    value
                ),
            }
        }

        if let Ok(value) = env::var(ENV_FAIL_FAST) {
            match parse_bool(&value) {
                Ok(flag) => self.fail_fast.update(flag, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid {} value '{}': expected true or false",
                    ENV_FAIL_FAST,
                    value
                ),
            }
        }

        if let Ok(value) = env::var(ENV_TIMEOUT_SECS) {
            match value.parse::<u64>() {
                Ok(secs) if secs > 0 => {
                    self.timeout_secs.update(Some(secs), ConfigSource::Environment)
                }
                _ => tracing::warn!(
                    "Invalid {} value '{}': expected a positive number of seconds",
                    ENV_TIMEOUT_SECS,
                    value
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(program) = overrides.program {
            self.program.update(program, ConfigSource::Cli);
        }

        if let Some(args) = overrides.program_args {
            self.program_args.update(args, ConfigSource::Cli);
        }

        if let Some(concurrency) = overrides.concurrency {
            self.concurrency.update(concurrency, ConfigSource::Cli);
        }

        if let Some(fail_fast) = overrides.fail_fast {
            self.fail_fast.update(fail_fast, ConfigSource::Cli);
        }

        if let Some(timeout) = overrides.timeout_secs {
            self.timeout_secs.update(Some(timeout), ConfigSource::Cli);
        }

        if let Some(log_dir) = overrides.log_dir {
            self.log_dir.update(Some(log_dir), ConfigSource::Cli);
        }
    }

    pub fn program(&self) -> Program {
        Program::new(self.program.value.clone()).with_args(self.program_args.value.clone())
    }

    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            concurrency: self.concurrency.value.max(1),
            fail_fast: self.fail_fast.value,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.value.map(Duration::from_secs)
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> BTreeMap<String, (String, ConfigSource)> {
        let mut map = BTreeMap::new();

        map.insert("program".to_string(), (self.program.value.clone(), self.program.source));

        map.insert(
            "program_args".to_string(),
            (self.program_args.value.join(" "), self.program_args.source),
        );

        map.insert(
            "concurrency".to_string(),
            (self.concurrency.value.to_string(), self.concurrency.source),
        );

        map.insert(
            "fail_fast".to_string(),
            (self.fail_fast.value.to_string(), self.fail_fast.source),
        );

        map.insert(
            "timeout_secs".to_string(),
            (
                self.timeout_secs
                    .value
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "none".to_string()),
                self.timeout_secs.source,
            ),
        );

        map.insert(
            "log_dir".to_string(),
            (
                self.log_dir
                    .value
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "inherit".to_string()),
                self.log_dir.source,
            ),
        );

        map
    }
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub program: Option<String>,
    pub program_args: Option<Vec<String>>,
    pub concurrency: Option<usize>,
    pub fail_fast: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub log_dir: Option<PathBuf>,
}

/// Parse a boolean from an environment-style string
pub fn parse_bool(s: &str) -> Result<bool> {
    match s.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(BatchError::ConfigInvalid {
            key: "fail_fast".to_string(),
            reason: format!("Invalid boolean: {}. Use true or false", s),
        }),
    }
}
