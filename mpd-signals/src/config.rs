//! Configuration types for the mpd-signals crate
//!
//! This module defines the configuration that controls how the router turns
//! idle events into signals: debounce window, channel capacities and the
//! handling of fetches that complete out of order.

use std::time::Duration;

use crate::error::ConfigError;

/// How a signal treats fetches that complete out of issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchOrdering {
    /// Discard a result whose trigger is older than the newest result
    /// already emitted
    #[default]
    LatestWins,
    /// Emit every result in completion order
    Completion,
}

/// Configuration for the signal router
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Quiet period after the last trigger of a debounced signal
    /// Default: 32 milliseconds
    pub debounce: Duration,

    /// Broadcast capacity of the normalized event bus
    /// Default: 1000
    pub event_buffer_size: usize,

    /// Broadcast capacity of each signal
    /// Default: 64
    pub signal_buffer_size: usize,

    /// Handling of out-of-order fetch completions
    /// Default: LatestWins
    pub fetch_ordering: FetchOrdering,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(32),
            event_buffer_size: 1000,
            signal_buffer_size: 64,
            fetch_ordering: FetchOrdering::LatestWins,
        }
    }
}

impl RouterConfig {
    /// Create a new RouterConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit fetch results in completion order, without discarding stale ones
    pub fn original() -> Self {
        Self {
            fetch_ordering: FetchOrdering::Completion,
            ..Default::default()
        }
    }

    /// Set the debounce window
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Set the fetch ordering
    pub fn with_fetch_ordering(mut self, fetch_ordering: FetchOrdering) -> Self {
        self.fetch_ordering = fetch_ordering;
        self
    }

    /// Validate the configuration and return the first issue found
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.debounce.is_zero() {
            return Err(ConfigError::ZeroDebounce);
        }

        if self.event_buffer_size == 0 {
            return Err(ConfigError::ZeroEventBuffer);
        }

        if self.signal_buffer_size == 0 {
            return Err(ConfigError::ZeroSignalBuffer);
        }

        Ok(())
    }
}
