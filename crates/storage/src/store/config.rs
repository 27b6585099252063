#![forbid(unsafe_code)]

use super::StoreError;
use std::path::PathBuf;
use std::time::Duration;

pub const DB_FILE_NAME: &str = "blockforest.db";

pub const ENV_STORAGE_DIR: &str = "BLOCKFOREST_STORAGE_DIR";
pub const ENV_POOL_SIZE: &str = "BLOCKFOREST_POOL_SIZE";
pub const ENV_ACQUIRE_TIMEOUT_MS: &str = "BLOCKFOREST_ACQUIRE_TIMEOUT_MS";
pub const ENV_BUSY_TIMEOUT_MS: &str = "BLOCKFOREST_BUSY_TIMEOUT_MS";
pub const ENV_POSITION_POLICY: &str = "BLOCKFOREST_POSITION_POLICY";

const DEFAULT_POOL_SIZE: usize = 4;
const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// How a requested sibling position beyond the current child count is handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PositionPolicy {
    /// Treat it as "append": the stored position is the current child count.
    #[default]
    Clamp,
    /// Fail with a validation error.
    Reject,
}

impl PositionPolicy {
    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim() {
            "clamp" | "append" => Some(Self::Clamp),
            "reject" | "strict" => Some(Self::Reject),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clamp => "clamp",
            Self::Reject => "reject",
        }
    }

    /// Resolves `requested` against a sibling set of `count` live children.
    pub fn resolve(self, requested: usize, count: usize) -> Result<usize, StoreError> {
        if requested <= count {
            return Ok(requested);
        }
        match self {
            Self::Clamp => Ok(count),
            Self::Reject => Err(StoreError::invalid(format!(
                "position {requested} is out of range (sibling count {count})"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    pub storage_dir: PathBuf,
    pub pool_size: usize,
    pub acquire_timeout: Duration,
    pub busy_timeout: Duration,
    pub position_policy: PositionPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(".blockforest"),
            pool_size: DEFAULT_POOL_SIZE,
            acquire_timeout: Duration::from_millis(DEFAULT_ACQUIRE_TIMEOUT_MS),
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
            position_policy: PositionPolicy::Clamp,
        }
    }
}

impl StoreConfig {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            ..Self::default()
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.storage_dir.join(DB_FILE_NAME)
    }

    /// Defaults overridden by `BLOCKFOREST_*` environment variables.
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StoreError> {
        let mut config = Self::default();
        if let Some(dir) = lookup(ENV_STORAGE_DIR).filter(|v| !v.trim().is_empty()) {
            config.storage_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup(ENV_POOL_SIZE) {
            config.pool_size = parse_pool_size(&raw)?;
        }
        if let Some(raw) = lookup(ENV_ACQUIRE_TIMEOUT_MS) {
            config.acquire_timeout = parse_millis(ENV_ACQUIRE_TIMEOUT_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_BUSY_TIMEOUT_MS) {
            config.busy_timeout = parse_millis(ENV_BUSY_TIMEOUT_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_POSITION_POLICY) {
            config.position_policy = parse_position_policy(&raw)?;
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.pool_size == 0 {
            return Err(StoreError::invalid("pool_size must be at least 1"));
        }
        Ok(())
    }
}

pub fn parse_pool_size(raw: &str) -> Result<usize, StoreError> {
    match raw.trim().parse::<usize>() {
        Ok(0) | Err(_) => Err(StoreError::invalid(format!(
            "pool size must be a positive integer, got {raw:?}"
        ))),
        Ok(value) => Ok(value),
    }
}

pub fn parse_position_policy(raw: &str) -> Result<PositionPolicy, StoreError> {
    PositionPolicy::from_name(raw).ok_or_else(|| {
        StoreError::invalid(format!(
            "position policy must be clamp or reject, got {raw:?}"
        ))
    })
}

fn parse_millis(key: &str, raw: &str) -> Result<Duration, StoreError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| StoreError::invalid(format!("{key} must be milliseconds, got {raw:?}")))
}
