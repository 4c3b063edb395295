//! Limits applied to tree walks and size aggregation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Tree engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TreeConfig {
    /// Maximum number of parent links any walk may follow before the
    /// hierarchy is considered corrupt.
    #[serde(default = "default_max_depth")]
    #[validate(range(min = 1, max = 1_000_000))]
    pub max_depth: usize,
    /// Maximum number of concurrent child listings issued per level while
    /// aggregating folder sizes.
    #[serde(default = "default_size_concurrency")]
    #[validate(range(min = 1, max = 1024))]
    pub size_concurrency: usize,
    /// Optional upper bound, in seconds, on a single size computation.
    #[serde(default)]
    #[validate(range(min = 1))]
    pub size_timeout_seconds: Option<u64>,
    /// Maximum item name length in characters.
    #[serde(default = "default_max_name_length")]
    #[validate(range(min = 1, max = 4096))]
    pub max_name_length: usize,
}

impl TreeConfig {
    /// The size computation bound as a [`Duration`], if configured.
    pub fn size_timeout(&self) -> Option<Duration> {
        self.size_timeout_seconds.map(Duration::from_secs)
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            size_concurrency: default_size_concurrency(),
            size_timeout_seconds: None,
            max_name_length: default_max_name_length(),
        }
    }
}

fn default_max_depth() -> usize {
    4096
}

fn default_size_concurrency() -> usize {
    16
}

fn default_max_name_length() -> usize {
    255
}
