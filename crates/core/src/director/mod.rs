use std::time::Duration;

use tokio::sync::mpsc;

use crate::{
    animation::Cue,
    arbiter::{AnimationArbiter, ArbiterNotice},
    router::EventRouter,
    telemetry::{PollLoop, SnapshotSource},
    timeline::{Clock, SystemClock},
    AppConfig, DomainEvent, LightingService, LightsError, Result,
};

/// Turns domain events into light shows.
///
/// Owns the arbiter, and with it the only handle to the fixture.
#[derive(Debug)]
pub struct Director<L, C> {
    arbiter: AnimationArbiter<L, C>,
    router: EventRouter,
    clock: C,
    /// When [`Cue::ReadyPulse`] is due. Cleared once played.
    ready_pulse_at: Option<Duration>,
}

impl<L: LightingService, C: Clock + Clone> Director<L, C> {
    pub fn new(lights: L, clock: C, config: &AppConfig) -> Self {
        let ready_pulse_at = clock.now().saturating_add(config.arbiter.grace_window());
        Self {
            arbiter: AnimationArbiter::new(lights, clock.clone(), &config.arbiter),
            router: EventRouter::new(&config.router),
            clock,
            ready_pulse_at: Some(ready_pulse_at),
        }
    }

    /// Routes one event. Returns the cues that won the fixture.
    pub fn handle(&mut self, event: &DomainEvent) -> Vec<Cue> {
        self.tick();

        let now = self.clock.now();
        let cues = self.router.route(event, now);
        self.play_all(cues)
    }

    /// Fires due arbiter timers and plays deferred cues that came due.
    pub fn tick(&mut self) -> Vec<ArbiterNotice> {
        let notices = self.arbiter.fire_due();
        let now = self.clock.now();

        let mut due = Vec::new();
        if self.ready_pulse_at.is_some_and(|at| now >= at) {
            self.ready_pulse_at = None;
            tracing::info!("lights are live");
            due.push(Cue::ReadyPulse);
        }
        due.extend(self.router.release_due(now));
        self.play_all(due);
        notices
    }

    /// Earliest moment at which [`Director::tick`] has work to do.
    pub fn next_deadline(&self) -> Option<Duration> {
        [
            self.arbiter.next_deadline(),
            self.router.next_deadline(),
            self.ready_pulse_at,
        ]
        .into_iter()
        .flatten()
        .min()
    }

    pub fn arbiter(&self) -> &AnimationArbiter<L, C> {
        &self.arbiter
    }

    fn play_all(&mut self, cues: Vec<Cue>) -> Vec<Cue> {
        cues.into_iter()
            .filter(|cue| self.arbiter.request(cue.request()))
            .collect()
    }
}

/// Polls the telemetry source and drives `lights` until the poll loop stops.
pub async fn run<S, L>(config: &AppConfig, source: S, lights: L) -> Result<()>
where
    S: SnapshotSource + 'static,
    L: LightingService,
{
    let (tx, mut rx) = mpsc::channel(config.telemetry.event_buffer.max(1));
    let poll = tokio::spawn(PollLoop::new(source, &config.telemetry, tx).run());

    let clock = SystemClock::start();
    let mut director = Director::new(lights, clock, config);

    loop {
        let wait = director
            .next_deadline()
            .map(|deadline| deadline.saturating_sub(clock.now()));

        tokio::select! {
            event = rx.recv() => match event {
                Some(event) => {
                    tracing::trace!(kind = event.kind(), "domain event");
                    director.handle(&event);
                }
                None => break,
            },
            _ = sleep_for(wait) => {
                director.tick();
            }
        }
    }

    poll.await
        .map_err(|err| LightsError::msg(format!("poll loop failed: {err}")))?;
    Err(LightsError::msg("poll loop stopped unexpectedly"))
}

async fn sleep_for(wait: Option<Duration>) {
    match wait {
        Some(wait) => tokio::time::sleep(wait).await,
        None => std::future::pending().await,
    }
}
