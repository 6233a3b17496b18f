use crate::constants::DEFAULT_CACHE_TTL;
use crate::utils::{cache_file_in, default_cache_dir};
use chrono::Duration;
use std::env;
use std::path::PathBuf;

pub const CACHE_DIR_ENV: &str = "CCSTAT_CACHE_DIR";
pub const CACHE_TTL_ENV: &str = "CCSTAT_CACHE_TTL_SECS";
pub const LOG_ENV: &str = "CCSTAT_LOG";

/// Runtime settings, read from the environment once per render cycle
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub cache_dir: PathBuf,
    pub cache_ttl: Duration,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let cache_dir = lookup(CACHE_DIR_ENV)
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                default_cache_dir().unwrap_or_else(|e| {
                    tracing::debug!("{}, caching under the temp directory", e);
                    env::temp_dir().join("ccstat")
                })
            });

        let cache_ttl = lookup(CACHE_TTL_ENV)
            .and_then(|secs| secs.trim().parse::<i64>().ok())
            .filter(|secs| *secs >= 0)
            .and_then(Duration::try_seconds)
            .unwrap_or(DEFAULT_CACHE_TTL);

        Self {
            cache_dir,
            cache_ttl,
        }
    }

    pub fn cache_file(&self) -> PathBuf {
        cache_file_in(&self.cache_dir)
    }
}
