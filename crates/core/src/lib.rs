//! Core library for the TFT ambient lighting monitor.
//!
//! The live game client exposes its state on a local HTTPS endpoint. The
//! [`telemetry::PollLoop`] polls it, the [`GameStatePoller`] diffs consecutive
//! snapshots into [`DomainEvent`]s, and the [`director::Director`] routes
//! those events into animations. Every animation goes through the
//! [`AnimationArbiter`], the single writer allowed to touch the lights.

pub mod animation;
pub mod arbiter;
pub mod config;
pub mod director;
pub mod error;
pub mod events;
pub mod hue;
pub mod lighting;
pub mod poller;
pub mod router;
pub mod snapshot;
pub mod telemetry;
pub mod timeline;

pub use animation::Cue;
pub use arbiter::{AnimationArbiter, AnimationRequest, ArbiterNotice, Priority};
pub use config::{AppConfig, ArbiterConfig, BridgeConfig, RouterConfig, TelemetryConfig};
pub use director::{run, Director};
pub use error::{LightsError, Result};
pub use events::DomainEvent;
pub use hue::{HueBridge, HueHandle};
pub use lighting::{ColorXy, Effect, LightCommand, LightingService, LoggingLights, Transition};
pub use poller::{GameStatePoller, PollOutcome, SessionState};
pub use router::EventRouter;
pub use snapshot::{GameSnapshot, RawEvent};
pub use telemetry::{PollLoop, SnapshotSource, TelemetryClient};
pub use timeline::{Clock, ManualClock, SystemClock, TimerHandle, TimerQueue};
