//! Service configuration.
//!
//! Everything the service needs is collected into [`ServiceConfig`] once at
//! startup and passed down explicitly; the synthesis and encoding code never
//! reads the environment.
//!
//! The binary loads a `.env` file from the working directory (or a parent)
//! with `dotenvy` before reading the environment. Variables already set in
//! the process take precedence over the file.
//!
//! ## Environment
//! - `RUNSYNC_BIND_ADDR`: listen address (default `0.0.0.0:3000`)
//! - `RUNSYNC_OUTPUT_DIR`: where exported documents are written (default `./activities`)
//! - `RUNSYNC_ACTIVITY_TYPES`: comma separated activity types to export, empty for all
//!   (default `run`)
//! - `RUNSYNC_CLAIM_ALL_HEART_RATE`: `true`/`false`, see [`SynthesisOptions`]

use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::encode::ApplicationInfo;
use crate::track::SynthesisOptions;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_OUTPUT_DIR: &str = "./activities";

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub output_dir: PathBuf,
    /// Activity types accepted by batch export. Empty accepts everything.
    pub activity_types: Vec<String>,
    pub synthesis: SynthesisOptions,
    pub application: ApplicationInfo,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            activity_types: vec!["run".to_string()],
            synthesis: SynthesisOptions::default(),
            application: ApplicationInfo::default(),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup; unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("RUNSYNC_BIND_ADDR") {
            config.bind_addr = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidAddress(raw.clone()))?;
        }
        if let Some(raw) = lookup("RUNSYNC_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("RUNSYNC_ACTIVITY_TYPES") {
            config.activity_types = raw
                .split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(raw) = lookup("RUNSYNC_CLAIM_ALL_HEART_RATE") {
            config.synthesis.claim_every_heart_rate_sample =
                parse_flag("RUNSYNC_CLAIM_ALL_HEART_RATE", &raw)?;
        }

        Ok(config)
    }

    pub fn accepts_activity_type(&self, activity_type: &str) -> bool {
        self.activity_types.is_empty()
            || self
                .activity_types
                .iter()
                .any(|accepted| accepted.eq_ignore_ascii_case(activity_type))
    }
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            key,
            value: raw.to_string(),
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidAddress(String),
    InvalidFlag { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidAddress(raw) => write!(f, "Invalid bind address: {raw}"),
            ConfigError::InvalidFlag { key, value } => {
                write!(f, "Invalid value for {key}: {value} (expected true or false)")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
