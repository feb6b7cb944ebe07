//! Centralized configuration for Ebbtide.
//!
//! All tunable parameters live here to avoid hard-coded values scattered
//! throughout the codebase.

use std::time::Duration;

/// Central configuration for all Ebbtide components.
#[derive(Debug, Clone, Default)]
pub struct EbbtideConfig {
    pub session: SessionConfig,
    pub simulation: SimulationConfig,
}

/// Session-layer configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Interval between alert pump polls of the engine.
    pub alert_poll_interval: Duration,
    /// Download directory used when a caller does not supply one.
    pub default_download_dir: &'static str,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            alert_poll_interval: Duration::from_millis(500),
            default_download_dir: "downloads",
        }
    }
}

/// Simulation engine configuration for testing and development.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Bytes added to each active torrent per progress tick.
    pub simulated_download_speed: u64,
    /// Peer count reported by actively downloading simulated torrents.
    pub simulated_peer_count: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            simulated_download_speed: 1_048_576, // 1 MiB per tick
            simulated_peer_count: 20,
        }
    }
}
