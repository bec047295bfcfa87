//! The configuration surface consumed by the data access layer.
//!
//! A [DalConfig] is usually read from a JSON document:
//! ```
//! use rdf_dal_common::config::DalConfig;
//! use rdf_dal_common::TerminationPolicy;
//!
//! let config = DalConfig::from_json_str(r#"{
//!     "partition_size": 1000,
//!     "pagination": { "batch_size": 500, "termination": "short_page" },
//!     "pool": { "base_path": "/var/lib/rdf-dal", "required": true }
//! }"#)?;
//! assert_eq!(config.pagination.termination, TerminationPolicy::ShortPage);
//! assert_eq!(config.workers.size, 4);
//! # Result::<_, Box<dyn std::error::Error>>::Ok(())
//! ```

use crate::error::ConfigError;
use crate::{BatchSize, PartitionSize, WorkerCount};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Decides when a paginated query is exhausted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationPolicy {
    /// Keep requesting pages until a page is empty. A result set of `M` items with a batch size
    /// of `b` always takes `ceil(M / b) + 1` requests.
    #[default]
    EmptyPage,
    /// Stop as soon as a page holds fewer than `b` items. A full page always triggers one more
    /// request, so a result set that is an exact multiple of `b` ends with an empty page.
    ///
    /// For `CONSTRUCT` queries the page size counts triples, not solutions. Templates that produce
    /// fewer (or duplicate) triples per solution can therefore end the pagination early.
    ShortPage,
}

impl TerminationPolicy {
    /// Returns whether a page holding `page_len` items is the last one.
    pub fn is_last_page(self, page_len: usize, batch_size: BatchSize) -> bool {
        match self {
            Self::EmptyPage => page_len == 0,
            Self::ShortPage => page_len < batch_size.get(),
        }
    }
}

/// The root configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DalConfig {
    /// The maximum number of statements per rendered update command.
    pub partition_size: usize,
    /// Controls the pagination of queries.
    pub pagination: PaginationConfig,
    /// Controls the worker pool used for batches of independent operations.
    pub workers: WorkerConfig,
    /// Controls the pool of store handles.
    pub pool: ResourcePoolConfig,
}

impl Default for DalConfig {
    fn default() -> Self {
        Self {
            partition_size: 10_000,
            pagination: PaginationConfig::default(),
            workers: WorkerConfig::default(),
            pool: ResourcePoolConfig::default(),
        }
    }
}

impl DalConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let reader = BufReader::new(File::open(path)?);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that all sizes are positive.
    ///
    /// Storage locations are checked by the components that own them, as they can only be
    /// verified when the pool is created.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.partition_size()?;
        self.pagination.batch_size()?;
        self.workers.size()?;
        if self.pool.max_borrowers_per_key == 0 {
            return Err(ConfigError::NonPositive {
                name: "maximum number of borrowers per key",
            });
        }
        Ok(())
    }

    /// Returns the validated partition size.
    pub fn partition_size(&self) -> Result<PartitionSize, ConfigError> {
        PartitionSize::new(self.partition_size)
    }
}

/// Configuration of the paginated query executor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginationConfig {
    /// Rows (or triples) per page.
    pub batch_size: usize,
    /// When to stop requesting pages.
    pub termination: TerminationPolicy,
    /// Upper bound on the number of pages of a single pagination. `None` means unbounded.
    pub max_pages: Option<usize>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            batch_size: 10_000,
            termination: TerminationPolicy::default(),
            max_pages: None,
        }
    }
}

impl PaginationConfig {
    /// Returns the validated batch size.
    pub fn batch_size(&self) -> Result<BatchSize, ConfigError> {
        BatchSize::new(self.batch_size)
    }
}

/// Configuration of the monitored worker pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerConfig {
    /// Number of tasks executed concurrently.
    pub size: usize,
    /// How often the monitor reports progress, in milliseconds.
    pub monitor_interval_ms: u64,
    /// Upper bound for a whole batch, in milliseconds. `None` waits indefinitely.
    pub timeout_ms: Option<u64>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            size: 4,
            monitor_interval_ms: 5_000,
            timeout_ms: None,
        }
    }
}

impl WorkerConfig {
    /// Returns the validated pool size.
    pub fn size(&self) -> Result<WorkerCount, ConfigError> {
        WorkerCount::new(self.size)
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Configuration of the keyed pool of store handles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResourcePoolConfig {
    /// The root below which every pooled store keeps its data.
    pub base_path: PathBuf,
    /// If `true`, missing storage locations are an error. Otherwise, they are created.
    pub required: bool,
    /// Upper bound for waiting on a handle, in milliseconds. `None` waits indefinitely.
    pub borrow_timeout_ms: Option<u64>,
    /// How many borrowers may hold the handle of a single key at the same time.
    pub max_borrowers_per_key: usize,
    /// Whether idle handles are validated before they are handed out again.
    pub validate_on_borrow: bool,
}

impl Default for ResourcePoolConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("./data"),
            required: false,
            borrow_timeout_ms: Some(30_000),
            max_borrowers_per_key: 1,
            validate_on_borrow: true,
        }
    }
}

impl ResourcePoolConfig {
    pub fn borrow_timeout(&self) -> Option<Duration> {
        self.borrow_timeout_ms.map(Duration::from_millis)
    }
}
