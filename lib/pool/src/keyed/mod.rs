//! A pool that lends out one long-lived handle per key.
//!
//! Handles are expensive to create (e.g., a store that loads its data from disk), so the
//! [KeyedPool] creates the handle of a key on the first [KeyedPool::borrow] and reuses it for all
//! later borrows. Borrowing is cheap and never blocks borrowers of other keys.
//!
//! ```
//! use rdf_dal_pool::keyed::{HandleFactory, KeyedPool, PoolKey, PoolOptions};
//! use std::convert::Infallible;
//!
//! struct Names;
//!
//! #[async_trait::async_trait]
//! impl HandleFactory for Names {
//!     type Handle = String;
//!     type Error = Infallible;
//!
//!     async fn create(&self, key: &PoolKey) -> Result<String, Infallible> {
//!         Ok(key.name().to_owned())
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let pool = KeyedPool::new(Names, PoolOptions::default());
//! let lease = pool.borrow_uri("http://example.com/A").await?;
//! assert_eq!(lease.as_str(), "http___example.com_a");
//! # Result::<_, Box<dyn std::error::Error>>::Ok(())
//! # }).unwrap();
//! ```

mod factory;
mod key;
mod lease;
mod pool;

pub use factory::HandleFactory;
pub use key::PoolKey;
pub use lease::Lease;
pub use pool::KeyedPool;

use rdf_dal_common::config::ResourcePoolConfig;
use rdf_dal_common::error::ConfigError;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

/// Options of a [KeyedPool].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolOptions {
    /// The base path that keys are derived from (see [PoolKey::derive]).
    pub base_path: PathBuf,
    /// How long a borrower waits for the handle of a key. [None] waits forever.
    pub borrow_timeout: Option<Duration>,
    /// How many leases of the same key may exist at the same time. The default of one makes each
    /// lease exclusive.
    pub max_borrowers_per_key: NonZeroUsize,
    /// Whether idle handles are validated before they are lent out again.
    pub validate_on_borrow: bool,
}

impl PoolOptions {
    pub fn from_config(config: &ResourcePoolConfig) -> Result<Self, ConfigError> {
        let Some(max_borrowers_per_key) = NonZeroUsize::new(config.max_borrowers_per_key) else {
            return Err(ConfigError::NonPositive {
                name: "max borrowers per key",
            });
        };
        Ok(Self {
            base_path: config.base_path.clone(),
            borrow_timeout: config.borrow_timeout(),
            max_borrowers_per_key,
            validate_on_borrow: config.validate_on_borrow,
        })
    }
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            borrow_timeout: None,
            max_borrowers_per_key: NonZeroUsize::MIN,
            validate_on_borrow: true,
        }
    }
}

/// A snapshot of the counters of a [KeyedPool].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// The number of handles created so far.
    pub created: usize,
    /// The number of handles destroyed so far.
    pub destroyed: usize,
    /// The number of idle handles that failed validation.
    pub validation_failures: usize,
    /// The number of keys that currently hold a handle.
    pub live: usize,
}
