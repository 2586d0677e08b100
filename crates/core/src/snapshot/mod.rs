//! Typed view over one `liveclientdata/allgamedata` document.
//!
//! Only the fields the poller diffs are modelled. Raw events keep every field
//! they were sent with, since their deduplication identity is built from all
//! of them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One polled state of the monitored match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameSnapshot {
    pub active_player: ActivePlayer,
    pub all_players: Vec<PlayerInfo>,
    pub events: EventLog,
    pub game_data: Option<GameData>,
}

impl GameSnapshot {
    /// Game mode tag, if the client reported one.
    pub fn mode(&self) -> Option<&str> {
        self.game_data.as_ref().map(|data| data.game_mode.as_str())
    }

    pub fn game_time(&self) -> f64 {
        self.game_data.as_ref().map_or(0.0, |data| data.game_time)
    }

    pub fn raw_events(&self) -> &[RawEvent] {
        &self.events.events
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivePlayer {
    pub summoner_name: String,
    pub level: u32,
    pub champion_stats: ChampionStats,
}

impl ActivePlayer {
    pub fn health(&self) -> f64 {
        self.champion_stats.current_health
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChampionStats {
    pub current_health: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerInfo {
    pub summoner_name: String,
    pub is_dead: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventLog {
    #[serde(rename = "Events")]
    pub events: Vec<RawEvent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameData {
    pub game_mode: String,
    pub game_time: f64,
    pub map_name: String,
    pub map_number: u32,
}

/// A discrete event exactly as the client reported it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawEvent(Map<String, Value>);

impl RawEvent {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn name(&self) -> &str {
        self.0.get("EventName").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn time(&self) -> f64 {
        self.0.get("EventTime").and_then(Value::as_f64).unwrap_or_default()
    }

    pub fn victim(&self) -> Option<&str> {
        self.0.get("VictimName").and_then(Value::as_str)
    }

    /// Concatenation of every field value. Two events with the same identity
    /// are the same occurrence.
    pub fn identity(&self) -> String {
        self.0.values().fold(String::new(), |mut acc, value| {
            match value {
                Value::String(text) => acc.push_str(text),
                other => acc.push_str(&other.to_string()),
            }
            acc
        })
    }
}
