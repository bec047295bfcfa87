use crate::error::ConfigError;
use std::fmt::{Display, Formatter};
use std::num::NonZeroUsize;

macro_rules! positive_size {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(NonZeroUsize);

        impl $name {
            /// Validates `value`. Zero is rejected with [ConfigError::NonPositive].
            pub fn new(value: usize) -> Result<Self, ConfigError> {
                NonZeroUsize::new(value)
                    .map(Self)
                    .ok_or(ConfigError::NonPositive { name: $label })
            }

            /// Returns the size as a plain integer.
            pub fn get(self) -> usize {
                self.0.get()
            }
        }

        impl TryFrom<usize> for $name {
            type Error = ConfigError;

            fn try_from(value: usize) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

positive_size!(
    /// The maximum number of statements covered by a single rendered update command.
    PartitionSize,
    "partition size"
);

positive_size!(
    /// The number of rows (or triples) requested per page during pagination.
    BatchSize,
    "batch size"
);

positive_size!(
    /// The number of tasks a worker pool executes concurrently.
    WorkerCount,
    "worker pool size"
);
