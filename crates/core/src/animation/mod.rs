use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    arbiter::{AnimationRequest, Priority, PRIORITY_HIGH, PRIORITY_LOW, PRIORITY_MEDIUM},
    lighting::{ColorXy, LightCommand, Transition, BASELINE},
    Effect,
};

const SOFT_BLUE: ColorXy = ColorXy::new(0.2976, 0.2348);
const DEATH_RED: ColorXy = ColorXy::new(0.5081, 0.2384);
const HIT_RED: ColorXy = ColorXy::new(0.479, 0.2748);
const LEVEL_BLUE: ColorXy = ColorXy::new(0.292, 0.2251);
const DEFEAT_GREEN: ColorXy = ColorXy::new(0.311, 0.4989);
const PLACEMENT_GOLD: ColorXy = ColorXy::new(0.5119, 0.4147);

const READY_PULSE_HUE: u16 = 43_690;
const PLACEMENT_PULSE_HUE: u16 = 8_000;

/// Named light shows the router can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cue {
    /// Game start. Holds through carousel lock-out and champion pick.
    SoftHello,
    /// Lights are live. Played once when the arbiter opens.
    ReadyPulse,
    OwnDeath,
    /// Health lost.
    Ouch,
    LevelUp,
    OpponentDefeated,
    /// Survived into the top four (or top two).
    TopFour,
}

impl Cue {
    pub fn name(self) -> &'static str {
        match self {
            Self::SoftHello => "soft_hello",
            Self::ReadyPulse => "ready_pulse",
            Self::OwnDeath => "own_death",
            Self::Ouch => "ouch",
            Self::LevelUp => "level_up",
            Self::OpponentDefeated => "opponent_defeated",
            Self::TopFour => "top_four",
        }
    }

    pub fn priority(self) -> Priority {
        match self {
            Self::OwnDeath | Self::TopFour => PRIORITY_HIGH,
            Self::SoftHello | Self::OpponentDefeated => PRIORITY_MEDIUM,
            Self::ReadyPulse | Self::LevelUp | Self::Ouch => PRIORITY_LOW,
        }
    }

    pub fn request(self) -> AnimationRequest {
        let (apply, revert, revert_ms, settle_ms) = match self {
            // 12s locked out of the centre, 10s choosing, 3s fade
            Self::SoftHello => (
                Effect::color(SOFT_BLUE, Transition::Slow),
                Effect::color(BASELINE, Transition::Slow),
                25_000,
                Some(1_000),
            ),
            Self::ReadyPulse => (
                Effect::pulse(READY_PULSE_HUE),
                Effect::color(BASELINE, Transition::Middle),
                2_800,
                Some(500),
            ),
            Self::OwnDeath => (
                Effect::color(DEATH_RED, Transition::Instant),
                Effect::color(BASELINE, Transition::Middle),
                5_000,
                Some(1_000),
            ),
            Self::Ouch => (
                Effect::color(HIT_RED, Transition::Instant),
                Effect::color(BASELINE, Transition::Instant),
                20,
                None,
            ),
            Self::LevelUp => (
                Effect::color(LEVEL_BLUE, Transition::Fast),
                Effect::color(BASELINE, Transition::Fast),
                1_500,
                None,
            ),
            Self::OpponentDefeated => (
                Effect::color(DEFEAT_GREEN, Transition::Middle),
                Effect::color(BASELINE, Transition::Middle),
                4_000,
                Some(1_000),
            ),
            Self::TopFour => (
                Effect::new(vec![
                    LightCommand::SetColor {
                        color: PLACEMENT_GOLD,
                        transition: Transition::Fast,
                    },
                    LightCommand::AlertPulse {
                        hue: PLACEMENT_PULSE_HUE,
                    },
                ]),
                Effect::color(BASELINE, Transition::Slow),
                6_000,
                Some(1_000),
            ),
        };

        let request = AnimationRequest::new(
            self.name(),
            self.priority(),
            apply,
            revert,
            Duration::from_millis(revert_ms),
        );
        match settle_ms {
            Some(ms) => request.with_settle(Duration::from_millis(ms)),
            None => request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_cue_returns_to_baseline() {
        let cues = [
            Cue::SoftHello,
            Cue::ReadyPulse,
            Cue::OwnDeath,
            Cue::Ouch,
            Cue::LevelUp,
            Cue::OpponentDefeated,
            Cue::TopFour,
        ];

        for cue in cues {
            let request = cue.request();
            assert_eq!(request.name, cue.name());
            assert!(!request.apply.commands().is_empty());
            assert!(matches!(
                request.revert.commands().last(),
                Some(LightCommand::SetColor { color, .. }) if *color == BASELINE
            ));
        }
    }

    #[test]
    fn death_outranks_routine_feedback() {
        assert!(Cue::OwnDeath.priority() < Cue::OpponentDefeated.priority());
        assert!(Cue::OpponentDefeated.priority() < Cue::Ouch.priority());
        assert_eq!(Cue::Ouch.request().settle, None);
    }
}
