//! Snapshot diffing state machine.
//!
//! [`GameStatePoller`] performs no IO. It is fed the result of each fetch and
//! answers with the domain events that result plus the delay before the next
//! fetch. [`crate::telemetry::PollLoop`] drives it against a real endpoint.

use std::{collections::HashSet, time::Duration};

use crate::{DomainEvent, GameSnapshot, LightsError, TelemetryConfig};

const OWN_DEATH_EVENT: &str = "ChampionKill";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No snapshot of the monitored mode seen yet.
    Idle,
    Active,
    /// Connectivity was lost after a session. Terminal until [`GameStatePoller::reset`].
    Expired,
}

/// Result of feeding one fetch outcome into the poller.
#[derive(Debug, Clone, PartialEq)]
pub struct PollOutcome {
    pub events: Vec<DomainEvent>,
    /// Delay before the next fetch. `None` once the session has expired.
    pub next_poll: Option<Duration>,
}

impl PollOutcome {
    fn quiet(next_poll: Duration) -> Self {
        Self {
            events: Vec::new(),
            next_poll: Some(next_poll),
        }
    }

    fn halted(events: Vec<DomainEvent>) -> Self {
        Self {
            events,
            next_poll: None,
        }
    }
}

#[derive(Debug)]
pub struct GameStatePoller {
    monitored_mode: String,
    max_health: f64,
    fast_poll: Duration,
    idle_poll: Duration,
    state: SessionState,
    seen_events: HashSet<String>,
    dead_opponents: HashSet<String>,
    last_level: u32,
    last_health: f64,
}

impl GameStatePoller {
    pub fn new(config: &TelemetryConfig) -> Self {
        Self {
            monitored_mode: config.monitored_mode.clone(),
            max_health: config.max_health,
            fast_poll: config.fast_poll(),
            idle_poll: config.idle_poll(),
            state: SessionState::Idle,
            seen_events: HashSet::new(),
            dead_opponents: HashSet::new(),
            last_level: 0,
            last_health: 0.0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Forgets everything learned during the session and returns to `Idle`.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.seen_events.clear();
        self.dead_opponents.clear();
        self.last_level = 0;
        self.last_health = 0.0;
    }

    pub fn on_snapshot(&mut self, snapshot: &GameSnapshot) -> PollOutcome {
        if self.state == SessionState::Expired {
            return PollOutcome::halted(Vec::new());
        }

        if snapshot.mode() != Some(self.monitored_mode.as_str()) {
            tracing::trace!(mode = ?snapshot.mode(), "ignoring snapshot of unmonitored mode");
            return PollOutcome::quiet(self.fast_poll);
        }

        let player = &snapshot.active_player;
        let mut events = Vec::new();

        if self.state == SessionState::Idle {
            self.state = SessionState::Active;
            tracing::info!(summoner = %player.summoner_name, "session started");
            events.push(DomainEvent::SessionStart);
            events.push(DomainEvent::SummonerIdentified(player.summoner_name.clone()));
        }

        events.push(DomainEvent::GameTimeTick(snapshot.game_time()));

        for raw in snapshot.raw_events() {
            if !self.seen_events.insert(raw.identity()) {
                continue;
            }

            if raw.name() == OWN_DEATH_EVENT && raw.victim() == Some(player.summoner_name.as_str()) {
                events.push(DomainEvent::OwnDeath(raw.time()));
            } else {
                events.push(DomainEvent::RiotEvent {
                    name: raw.name().to_string(),
                    time: raw.time(),
                });
            }
        }

        if player.level != self.last_level {
            if self.last_level != 0 {
                events.push(DomainEvent::PlayerLevelUp {
                    old: self.last_level,
                    new: player.level,
                });
            }
            self.last_level = player.level;
        }

        let health = player.health();
        if health != self.last_health {
            if self.last_health != 0.0 && health < self.max_health {
                events.push(DomainEvent::PlayerHealthChange {
                    old: self.last_health,
                    new: health,
                });
            }
            self.last_health = health;
        }

        for other in &snapshot.all_players {
            if other.is_dead
                && other.summoner_name != player.summoner_name
                && self.dead_opponents.insert(other.summoner_name.clone())
            {
                events.push(DomainEvent::OpponentDefeated(other.summoner_name.clone()));
            }
        }

        PollOutcome {
            events,
            next_poll: Some(self.fast_poll),
        }
    }

    pub fn on_failure(&mut self, error: &LightsError) -> PollOutcome {
        match self.state {
            SessionState::Expired => PollOutcome::halted(Vec::new()),
            SessionState::Active if error.is_unreachable() => {
                tracing::info!(%error, "telemetry endpoint went away, session expired");
                self.state = SessionState::Expired;
                PollOutcome::halted(vec![DomainEvent::SessionExpired])
            }
            SessionState::Idle if error.is_unreachable() => {
                tracing::trace!(%error, "no game running");
                PollOutcome::quiet(self.idle_poll)
            }
            _ => {
                tracing::warn!(%error, "snapshot fetch failed, retrying");
                PollOutcome::quiet(self.fast_poll)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn poller() -> GameStatePoller {
        GameStatePoller::new(&TelemetryConfig::default())
    }

    fn snapshot(level: u32, health: f64, events: Value, players: Value) -> GameSnapshot {
        serde_json::from_value(json!({
            "activePlayer": {
                "summonerName": "Me",
                "level": level,
                "championStats": { "currentHealth": health }
            },
            "allPlayers": players,
            "events": { "Events": events },
            "gameData": { "gameMode": "TFT", "gameTime": 42.0 }
        }))
        .unwrap()
    }

    fn plain(level: u32, health: f64) -> GameSnapshot {
        snapshot(level, health, json!([]), json!([]))
    }

    fn unreachable() -> LightsError {
        LightsError::Unreachable("connection refused".into())
    }

    #[test]
    fn unmonitored_mode_emits_nothing() {
        let mut poller = poller();
        let mut other = plain(1, 80.0);
        other.game_data.as_mut().unwrap().game_mode = "CLASSIC".into();

        let outcome = poller.on_snapshot(&other);
        assert!(outcome.events.is_empty());
        assert_eq!(outcome.next_poll, Some(Duration::from_millis(50)));
        assert_eq!(poller.state(), SessionState::Idle);
    }

    #[test]
    fn first_snapshot_starts_session_without_sentinel_changes() {
        let mut poller = poller();
        let outcome = poller.on_snapshot(&plain(1, 80.0));

        assert_eq!(
            outcome.events,
            vec![
                DomainEvent::SessionStart,
                DomainEvent::SummonerIdentified("Me".into()),
                DomainEvent::GameTimeTick(42.0),
            ]
        );
        assert_eq!(poller.state(), SessionState::Active);
    }

    #[test]
    fn later_snapshots_report_changes() {
        let mut poller = poller();
        poller.on_snapshot(&plain(1, 80.0));

        let outcome = poller.on_snapshot(&plain(1, 60.0));
        assert_eq!(
            outcome.events,
            vec![
                DomainEvent::GameTimeTick(42.0),
                DomainEvent::PlayerHealthChange { old: 80.0, new: 60.0 },
            ]
        );

        let outcome = poller.on_snapshot(&plain(2, 60.0));
        assert_eq!(outcome.events[1], DomainEvent::PlayerLevelUp { old: 1, new: 2 });
    }

    #[test]
    fn repeated_raw_events_are_reported_once() {
        let mut poller = poller();
        let events = json!([
            { "EventID": 0, "EventName": "GameStart", "EventTime": 0.1 },
            { "EventID": 0, "EventName": "GameStart", "EventTime": 0.1 },
            { "EventID": 1, "EventName": "MinionsSpawning", "EventTime": 65.0 }
        ]);

        let first = poller.on_snapshot(&snapshot(1, 100.0, events.clone(), json!([])));
        let second = poller.on_snapshot(&snapshot(1, 100.0, events, json!([])));

        let riot = |outcome: &PollOutcome| {
            outcome
                .events
                .iter()
                .filter(|event| matches!(event, DomainEvent::RiotEvent { .. }))
                .count()
        };
        assert_eq!(riot(&first), 2);
        assert_eq!(riot(&second), 0);
    }

    #[test]
    fn own_death_replaces_the_generic_event() {
        let mut poller = poller();
        poller.on_snapshot(&plain(5, 20.0));

        let kill = json!([{ "EventID": 9, "EventName": "ChampionKill", "EventTime": 900.0, "VictimName": "Me" }]);
        let outcome = poller.on_snapshot(&snapshot(5, 20.0, kill.clone(), json!([])));
        assert_eq!(outcome.events, vec![DomainEvent::GameTimeTick(42.0), DomainEvent::OwnDeath(900.0)]);

        let outcome = poller.on_snapshot(&snapshot(5, 20.0, kill, json!([])));
        assert_eq!(outcome.events, vec![DomainEvent::GameTimeTick(42.0)]);
    }

    #[test]
    fn opponents_are_defeated_once_and_never_the_player() {
        let mut poller = poller();
        let players = json!([
            { "summonerName": "Me", "isDead": true },
            { "summonerName": "Rival", "isDead": true },
            { "summonerName": "Other", "isDead": false }
        ]);

        let first = poller.on_snapshot(&snapshot(1, 100.0, json!([]), players.clone()));
        assert_eq!(first.events.last(), Some(&DomainEvent::OpponentDefeated("Rival".into())));

        let second = poller.on_snapshot(&snapshot(1, 100.0, json!([]), players));
        assert!(!second
            .events
            .iter()
            .any(|event| matches!(event, DomainEvent::OpponentDefeated(_))));
    }

    #[test]
    fn unreachable_before_session_keeps_idling() {
        let mut poller = poller();
        for _ in 0..5 {
            let outcome = poller.on_failure(&unreachable());
            assert!(outcome.events.is_empty());
            assert_eq!(outcome.next_poll, Some(Duration::from_secs(2)));
        }
        assert_eq!(poller.state(), SessionState::Idle);
    }

    #[test]
    fn unreachable_after_session_expires_once() {
        let mut poller = poller();
        poller.on_snapshot(&plain(1, 100.0));

        let outcome = poller.on_failure(&unreachable());
        assert_eq!(outcome, PollOutcome::halted(vec![DomainEvent::SessionExpired]));
        assert_eq!(poller.state(), SessionState::Expired);

        assert!(poller.on_failure(&unreachable()).events.is_empty());
        assert!(poller.on_snapshot(&plain(1, 100.0)).events.is_empty());
    }

    #[test]
    fn transient_failures_retry_fast_without_expiring() {
        let mut poller = poller();
        poller.on_snapshot(&plain(1, 100.0));

        let outcome = poller.on_failure(&LightsError::msg("malformed body"));
        assert!(outcome.events.is_empty());
        assert_eq!(outcome.next_poll, Some(Duration::from_millis(50)));
        assert_eq!(poller.state(), SessionState::Active);
    }

    #[test]
    fn reset_clears_session_memory() {
        let mut poller = poller();
        let events = json!([{ "EventID": 0, "EventName": "GameStart", "EventTime": 0.1 }]);
        let players = json!([{ "summonerName": "Rival", "isDead": true }]);
        poller.on_snapshot(&snapshot(3, 70.0, events.clone(), players.clone()));
        poller.on_failure(&unreachable());

        poller.reset();
        assert_eq!(poller.state(), SessionState::Idle);

        let outcome = poller.on_snapshot(&snapshot(1, 100.0, events, players));
        assert_eq!(outcome.events[0], DomainEvent::SessionStart);
        assert!(outcome.events.contains(&DomainEvent::RiotEvent {
            name: "GameStart".into(),
            time: 0.1
        }));
        assert!(outcome.events.contains(&DomainEvent::OpponentDefeated("Rival".into())));
        assert!(!outcome
            .events
            .iter()
            .any(|event| matches!(event, DomainEvent::PlayerLevelUp { .. })));
    }
}
