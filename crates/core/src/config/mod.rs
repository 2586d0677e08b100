use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub telemetry: TelemetryConfig,
    pub arbiter: ArbiterConfig,
    pub router: RouterConfig,
    /// Hue bridge to drive. When absent, light commands are only logged.
    pub bridge: Option<BridgeConfig>,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing fields fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Polling cadence, timeouts and the game mode being watched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub endpoint: String,
    pub monitored_mode: String,
    /// Cadence while a game is running, or after a transient failure.
    pub fast_poll_ms: u64,
    /// Cadence while nothing answers on the endpoint.
    pub idle_poll_ms: u64,
    pub fetch_timeout_ms: u64,
    pub max_health: f64,
    /// Capacity of the domain event channel between poller and director.
    pub event_buffer: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://127.0.0.1:2999/liveclientdata/allgamedata".to_string(),
            monitored_mode: "TFT".to_string(),
            fast_poll_ms: 50,
            idle_poll_ms: 2_000,
            fetch_timeout_ms: 1_000,
            max_health: 100.0,
            event_buffer: 64,
        }
    }
}

impl TelemetryConfig {
    pub fn fast_poll(&self) -> Duration {
        Duration::from_millis(self.fast_poll_ms)
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbiterConfig {
    /// No animation may start this soon after the arbiter is created.
    pub grace_window_ms: u64,
    /// Settle time used when a request does not specify its own.
    pub default_settle_ms: u64,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            grace_window_ms: 1_000,
            default_settle_ms: 600,
        }
    }
}

impl ArbiterConfig {
    pub fn grace_window(&self) -> Duration {
        Duration::from_millis(self.grace_window_ms)
    }

    pub fn default_settle(&self) -> Duration {
        Duration::from_millis(self.default_settle_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Delay before celebrating a top placement, in case the player's own
    /// death arrives right behind the opponent's.
    pub top_placement_delay_ms: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            top_placement_delay_ms: 200,
        }
    }
}

impl RouterConfig {
    pub fn top_placement_delay(&self) -> Duration {
        Duration::from_millis(self.top_placement_delay_ms)
    }
}

/// Connection details for an already paired Hue bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Host or `host:port` of the bridge on the local network.
    pub address: String,
    pub username: String,
    /// Light group (room) that receives every command.
    #[serde(default = "default_group")]
    pub group: String,
}

fn default_group() -> String {
    "1".to_string()
}
