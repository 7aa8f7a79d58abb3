//! Seat-lock protocol configuration.

use serde::{Deserialize, Serialize};

/// Seat-lock TTLs, cleanup throttling, and per-caller rate limiting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// TTL for a browsing hold (`seleccionado`), in seconds.
    #[serde(default = "default_selection_ttl")]
    pub selection_ttl_seconds: u64,
    /// TTL for a checkout hold (`reservado`), in seconds. Longer than the
    /// browsing TTL so a payment in flight is not reclaimed under the buyer.
    #[serde(default = "default_checkout_ttl")]
    pub checkout_ttl_seconds: u64,
    /// Minimum interval between expired-lock sweeps, in seconds. Sweeps
    /// requested more often than this are shed (the sweep is best-effort
    /// maintenance, not a correctness mechanism).
    #[serde(default = "default_cleanup_min_interval")]
    pub cleanup_min_interval_seconds: u64,
    /// Per-caller rate limiting for lock/unlock operations.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            selection_ttl_seconds: default_selection_ttl(),
            checkout_ttl_seconds: default_checkout_ttl(),
            cleanup_min_interval_seconds: default_cleanup_min_interval(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Token-bucket settings applied per caller+seat pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum burst of operations per bucket.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Token refill rate per second.
    #[serde(default = "default_refill_per_second")]
    pub refill_per_second: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            refill_per_second: default_refill_per_second(),
        }
    }
}

fn default_selection_ttl() -> u64 {
    300
}

fn default_checkout_ttl() -> u64 {
    900
}

fn default_cleanup_min_interval() -> u64 {
    30
}

fn default_max_tokens() -> u32 {
    10
}

fn default_refill_per_second() -> f64 {
    0.5
}
