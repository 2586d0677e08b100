//! Single-writer access to the lighting fixture.
//!
//! The arbiter owns the [`LightingService`], so nothing else can send the
//! fixture commands. At most one animation is current; a request only wins
//! the slot when it is empty or when the request strictly outranks the
//! incumbent. Timers run against an injected [`Clock`] and are fired by
//! calling [`AnimationArbiter::fire_due`].

use std::time::Duration;

use crate::{
    timeline::{Clock, TimerHandle, TimerQueue},
    ArbiterConfig, Effect, LightingService,
};

/// Animation precedence. Smaller values win.
pub type Priority = u8;

pub const PRIORITY_HIGH: Priority = 1;
pub const PRIORITY_MEDIUM: Priority = 2;
pub const PRIORITY_LOW: Priority = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationRequest {
    /// Label used in logs.
    pub name: String,
    pub priority: Priority,
    pub apply: Effect,
    pub revert: Effect,
    pub revert_delay: Duration,
    /// Time the fixture needs after the revert before the slot reopens.
    /// `None` uses the arbiter's default.
    pub settle: Option<Duration>,
}

impl AnimationRequest {
    pub fn new(
        name: impl Into<String>,
        priority: Priority,
        apply: Effect,
        revert: Effect,
        revert_delay: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            apply,
            revert,
            revert_delay,
            settle: None,
        }
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = Some(settle);
        self
    }
}

/// Timer callbacks reported by [`AnimationArbiter::fire_due`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArbiterNotice {
    Reverted(String),
    Completed(String),
}

#[derive(Debug)]
enum ArbiterTimer {
    Revert { name: String, effect: Effect },
    Complete { name: String },
}

#[derive(Debug)]
struct CurrentAnimation {
    name: String,
    priority: Priority,
    revert: TimerHandle,
    completion: TimerHandle,
}

#[derive(Debug)]
pub struct AnimationArbiter<L, C> {
    lights: L,
    clock: C,
    created_at: Duration,
    grace_window: Duration,
    default_settle: Duration,
    current: Option<CurrentAnimation>,
    timers: TimerQueue<ArbiterTimer>,
}

impl<L: LightingService, C: Clock> AnimationArbiter<L, C> {
    pub fn new(lights: L, clock: C, config: &ArbiterConfig) -> Self {
        let created_at = clock.now();
        Self {
            lights,
            clock,
            created_at,
            grace_window: config.grace_window(),
            default_settle: config.default_settle(),
            current: None,
            timers: TimerQueue::new(),
        }
    }

    /// Tries to play an animation. Returns whether it was accepted.
    ///
    /// An accepted request cancels the incumbent's pending revert and
    /// completion, applies its own effect immediately, and schedules its
    /// revert after `revert_delay` and the slot release after
    /// `revert_delay + settle`.
    pub fn request(&mut self, request: AnimationRequest) -> bool {
        let now = self.clock.now();

        if now.saturating_sub(self.created_at) < self.grace_window {
            tracing::debug!(animation = %request.name, "rejected, arbiter is still starting up");
            return false;
        }

        if let Some(current) = &self.current {
            if current.priority <= request.priority {
                tracing::debug!(
                    animation = %request.name,
                    priority = request.priority,
                    running = %current.name,
                    running_priority = current.priority,
                    "rejected, animation still running"
                );
                return false;
            }
        }

        if let Some(preempted) = self.current.take() {
            tracing::info!(
                animation = %request.name,
                preempted = %preempted.name,
                "preempting lower priority animation"
            );
            self.timers.cancel(preempted.revert);
            self.timers.cancel(preempted.completion);
        }

        let settle = request.settle.unwrap_or(self.default_settle);
        let revert = self.timers.schedule_after(
            now,
            request.revert_delay,
            ArbiterTimer::Revert {
                name: request.name.clone(),
                effect: request.revert,
            },
        );
        let completion = self.timers.schedule_after(
            now,
            request.revert_delay.saturating_add(settle),
            ArbiterTimer::Complete {
                name: request.name.clone(),
            },
        );

        tracing::info!(animation = %request.name, priority = request.priority, "playing animation");
        if let Err(error) = request.apply.apply(&mut self.lights) {
            tracing::warn!(animation = %request.name, %error, "failed to apply animation");
        }

        self.current = Some(CurrentAnimation {
            name: request.name,
            priority: request.priority,
            revert,
            completion,
        });
        true
    }

    /// Runs every revert and completion whose deadline has passed.
    pub fn fire_due(&mut self) -> Vec<ArbiterNotice> {
        let now = self.clock.now();
        let mut fired = Vec::new();

        while let Some((handle, timer)) = self.timers.pop_due(now) {
            match timer {
                ArbiterTimer::Revert { name, effect } => {
                    if let Err(error) = effect.apply(&mut self.lights) {
                        tracing::warn!(animation = %name, %error, "failed to revert animation");
                    }
                    fired.push(ArbiterNotice::Reverted(name));
                }
                ArbiterTimer::Complete { name } => {
                    if self
                        .current
                        .as_ref()
                        .is_some_and(|current| current.completion == handle)
                    {
                        self.current = None;
                    }
                    tracing::debug!(animation = %name, "animation complete");
                    fired.push(ArbiterNotice::Completed(name));
                }
            }
        }

        fired
    }

    /// Name and priority of the animation holding the slot.
    pub fn current(&self) -> Option<(&str, Priority)> {
        self.current
            .as_ref()
            .map(|current| (current.name.as_str(), current.priority))
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    pub fn lights(&self) -> &L {
        &self.lights
    }
}
