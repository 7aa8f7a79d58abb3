//! Background reaper configuration.

use serde::{Deserialize, Serialize};

/// Expiration reaper settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the in-process reaper runs at all. Disable when a dedicated
    /// maintenance instance owns the sweep.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Seconds between expired-lock sweeps.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_sweep_interval() -> u64 {
    60
}
