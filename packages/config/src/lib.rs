// ABOUTME: Runtime configuration for the autograder CLI loaded from environment variables
// ABOUTME: Supplies defaults for local grading runs that command-line flags may override

pub mod constants;

use std::env;
use thiserror::Error;

use constants::{
    AUTOGRADER_DOCKER_API_GRACE_SECS, AUTOGRADER_GRADE_MEM_LIMIT_MB,
    AUTOGRADER_GRADE_TIMEOUT_SECS, AUTOGRADER_LOG,
};

/// Default wall-clock timeout for a local grading run, in seconds
pub const DEFAULT_GRADE_TIMEOUT_SECS: u64 = 300;

/// Default memory quota for a local grading run, in megabytes
pub const DEFAULT_GRADE_MEM_LIMIT_MB: u64 = 1024;

/// Extra seconds the Docker API client waits on top of the grading timeout
pub const DEFAULT_DOCKER_API_GRACE_SECS: u64 = 30;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?} is not a non-negative integer")]
    InvalidNumber { var: &'static str, value: String },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Tracing filter directive overriding the verbosity flags
    pub log_filter: Option<String>,
    pub grade_timeout_secs: u64,
    pub grade_mem_limit_mb: u64,
    pub docker_api_grace_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: None,
            grade_timeout_secs: DEFAULT_GRADE_TIMEOUT_SECS,
            grade_mem_limit_mb: DEFAULT_GRADE_MEM_LIMIT_MB,
            docker_api_grace_secs: DEFAULT_DOCKER_API_GRACE_SECS,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let log_filter = lookup(AUTOGRADER_LOG)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let grade_timeout_secs = parse_number(
            &lookup,
            AUTOGRADER_GRADE_TIMEOUT_SECS,
            defaults.grade_timeout_secs,
        )?;
        if grade_timeout_secs == 0 {
            return Err(ConfigError::Zero(AUTOGRADER_GRADE_TIMEOUT_SECS));
        }

        let grade_mem_limit_mb = parse_number(
            &lookup,
            AUTOGRADER_GRADE_MEM_LIMIT_MB,
            defaults.grade_mem_limit_mb,
        )?;

        let docker_api_grace_secs = parse_number(
            &lookup,
            AUTOGRADER_DOCKER_API_GRACE_SECS,
            defaults.docker_api_grace_secs,
        )?;

        Ok(Config {
            log_filter,
            grade_timeout_secs,
            grade_mem_limit_mb,
            docker_api_grace_secs,
        })
    }
}

fn parse_number<F>(lookup: &F, var: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { var, value: raw }),
    }
}
