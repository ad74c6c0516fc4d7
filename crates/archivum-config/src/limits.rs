//! Request limits
//!
//! Bounds applied to every incoming request before and during parsing.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult};

/// Size and shape limits for incoming requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryLimits {
    /// Maximum size of a raw request, in bytes
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,

    /// Maximum JSON nesting depth of a raw request
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,

    /// Result limit used when `$limit` is absent; larger `$limit` values are clamped to it
    #[serde(default = "default_limit")]
    pub default_limit: u64,
}

fn default_max_request_size() -> usize {
    1_000_000
}

fn default_max_nesting_depth() -> usize {
    100
}

fn default_limit() -> u64 {
    10_000
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            max_request_size: default_max_request_size(),
            max_nesting_depth: default_max_nesting_depth(),
            default_limit: default_limit(),
        }
    }
}

impl QueryLimits {
    /// Override the maximum request size
    pub fn with_max_request_size(mut self, size: usize) -> Self {
        self.max_request_size = size;
        self
    }

    /// Override the maximum nesting depth
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Override the default result limit
    pub fn with_default_limit(mut self, limit: u64) -> Self {
        self.default_limit = limit;
        self
    }

    /// Reject zero limits
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_request_size == 0 {
            return Err(ConfigError::ZeroLimit("max_request_size"));
        }
        if self.max_nesting_depth == 0 {
            return Err(ConfigError::ZeroLimit("max_nesting_depth"));
        }
        if self.default_limit == 0 {
            return Err(ConfigError::ZeroLimit("default_limit"));
        }
        Ok(())
    }
}
