use serde::{Deserialize, Serialize};

/// Deduplicated occurrence derived by diffing consecutive snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DomainEvent {
    /// First successful snapshot of a session.
    SessionStart,
    SummonerIdentified(String),
    /// Elapsed game seconds, sent on every successful poll.
    GameTimeTick(f64),
    /// A newly seen raw event: its name and game time.
    RiotEvent { name: String, time: f64 },
    /// The active player died. Sent instead of the matching `RiotEvent`.
    OwnDeath(f64),
    PlayerLevelUp { old: u32, new: u32 },
    PlayerHealthChange { old: f64, new: f64 },
    OpponentDefeated(String),
    /// Connectivity was lost after a session was active.
    SessionExpired,
}

impl DomainEvent {
    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SessionStart => "session_start",
            Self::SummonerIdentified(_) => "summoner_identified",
            Self::GameTimeTick(_) => "game_time",
            Self::RiotEvent { .. } => "riot_event",
            Self::OwnDeath(_) => "own_death",
            Self::PlayerLevelUp { .. } => "level_up",
            Self::PlayerHealthChange { .. } => "health_change",
            Self::OpponentDefeated(_) => "opponent_defeated",
            Self::SessionExpired => "session_expired",
        }
    }
}
