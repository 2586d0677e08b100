use std::time::Duration;

use crate::{animation::Cue, timeline::TimerQueue, DomainEvent, RouterConfig};

/// Opponent defeat counts at which the player has reached a top placement.
const TOP_PLACEMENT_DEFEATS: [u32; 2] = [4, 6];

/// Translates domain events into animation cues.
///
/// Time is passed in by the caller; deferred cues are held until
/// [`EventRouter::release_due`] is called past their deadline.
#[derive(Debug)]
pub struct EventRouter {
    top_placement_delay: Duration,
    summoner: Option<String>,
    opponents_defeated: u32,
    player_alive: bool,
    deferred: TimerQueue<Cue>,
}

impl EventRouter {
    pub fn new(config: &RouterConfig) -> Self {
        Self {
            top_placement_delay: config.top_placement_delay(),
            summoner: None,
            opponents_defeated: 0,
            player_alive: true,
            deferred: TimerQueue::new(),
        }
    }

    pub fn route(&mut self, event: &DomainEvent, now: Duration) -> Vec<Cue> {
        match event {
            DomainEvent::SessionStart => {
                self.reset();
                Vec::new()
            }
            DomainEvent::SummonerIdentified(name) => {
                tracing::info!(summoner = %name, "playing as");
                self.summoner = Some(name.clone());
                Vec::new()
            }
            DomainEvent::GameTimeTick(seconds) => {
                tracing::trace!(seconds, "game time");
                Vec::new()
            }
            DomainEvent::RiotEvent { name, time } => match name.as_str() {
                "GameStart" => {
                    tracing::info!(time, "game started");
                    vec![Cue::SoftHello]
                }
                "MinionsSpawning" => {
                    tracing::info!(time, "stage 1-4 reached");
                    Vec::new()
                }
                _ => {
                    tracing::debug!(event = %name, time, "unrouted game event");
                    Vec::new()
                }
            },
            DomainEvent::OwnDeath(time) => {
                tracing::info!(time, summoner = ?self.summoner, "summoner eliminated");
                self.player_alive = false;
                self.deferred.clear();
                vec![Cue::OwnDeath]
            }
            DomainEvent::OpponentDefeated(name) => {
                self.opponents_defeated += 1;
                tracing::info!(opponent = %name, defeated = self.opponents_defeated, "opponent eliminated");

                if self.player_alive && TOP_PLACEMENT_DEFEATS.contains(&self.opponents_defeated) {
                    self.deferred
                        .schedule_after(now, self.top_placement_delay, Cue::TopFour);
                    Vec::new()
                } else {
                    vec![Cue::OpponentDefeated]
                }
            }
            DomainEvent::PlayerLevelUp { old, new } => {
                tracing::info!(old, new, "level up");
                vec![Cue::LevelUp]
            }
            DomainEvent::PlayerHealthChange { old, new } => {
                tracing::info!(old, new, "health changed");
                if new < old {
                    vec![Cue::Ouch]
                } else {
                    Vec::new()
                }
            }
            DomainEvent::SessionExpired => {
                tracing::info!("game has ended, resetting");
                self.reset();
                Vec::new()
            }
        }
    }

    /// Deferred cues whose delay has elapsed and that still apply.
    pub fn release_due(&mut self, now: Duration) -> Vec<Cue> {
        let mut released = Vec::new();
        while let Some((_, cue)) = self.deferred.pop_due(now) {
            if cue == Cue::TopFour && !self.player_alive {
                continue;
            }
            released.push(cue);
        }
        released
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.deferred.next_deadline()
    }

    fn reset(&mut self) {
        self.summoner = None;
        self.opponents_defeated = 0;
        self.player_alive = true;
        self.deferred.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    fn router() -> EventRouter {
        EventRouter::new(&RouterConfig::default())
    }

    fn defeat(router: &mut EventRouter, times: usize, now: Duration) -> Vec<Cue> {
        (0..times)
            .flat_map(|n| router.route(&DomainEvent::OpponentDefeated(format!("p{n}")), now))
            .collect()
    }

    #[test]
    fn maps_game_events_to_cues() {
        let mut router = router();
        let now = Duration::ZERO;

        assert_eq!(
            router.route(&DomainEvent::RiotEvent { name: "GameStart".into(), time: 0.1 }, now),
            vec![Cue::SoftHello]
        );
        assert!(router
            .route(&DomainEvent::RiotEvent { name: "MinionsSpawning".into(), time: 65.0 }, now)
            .is_empty());
        assert_eq!(router.route(&DomainEvent::PlayerLevelUp { old: 2, new: 3 }, now), vec![Cue::LevelUp]);
        assert_eq!(
            router.route(&DomainEvent::PlayerHealthChange { old: 80.0, new: 71.0 }, now),
            vec![Cue::Ouch]
        );
        assert_eq!(router.route(&DomainEvent::OwnDeath(900.0), now), vec![Cue::OwnDeath]);
    }

    #[test]
    fn fourth_defeat_defers_top_four() {
        let mut router = router();
        assert_eq!(defeat(&mut router, 3, Duration::ZERO), vec![Cue::OpponentDefeated; 3]);

        assert!(defeat(&mut router, 1, 10 * MS).is_empty());
        assert_eq!(router.next_deadline(), Some(210 * MS));
        assert!(router.release_due(209 * MS).is_empty());
        assert_eq!(router.release_due(210 * MS), vec![Cue::TopFour]);
    }

    #[test]
    fn own_death_cancels_pending_top_four() {
        let mut router = router();
        defeat(&mut router, 4, Duration::ZERO);

        router.route(&DomainEvent::OwnDeath(1_200.0), 50 * MS);
        assert!(router.release_due(Duration::from_secs(1)).is_empty());

        assert_eq!(defeat(&mut router, 2, 60 * MS), vec![Cue::OpponentDefeated; 2]);
    }

    #[test]
    fn new_session_starts_counting_again() {
        let mut router = router();
        router.route(&DomainEvent::SummonerIdentified("Me".into()), Duration::ZERO);
        defeat(&mut router, 3, Duration::ZERO);
        router.route(&DomainEvent::OwnDeath(10.0), Duration::ZERO);

        router.route(&DomainEvent::SessionExpired, Duration::ZERO);
        assert!(router.summoner.is_none());

        router.route(&DomainEvent::SessionStart, Duration::ZERO);
        assert_eq!(defeat(&mut router, 4, Duration::ZERO), vec![Cue::OpponentDefeated; 3]);
        assert_eq!(router.release_due(Duration::from_secs(1)), vec![Cue::TopFour]);
    }
}
