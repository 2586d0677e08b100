use serde::{Deserialize, Serialize};

use crate::Result;

/// Point in CIE 1931 colour space, as understood by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorXy {
    pub x: f32,
    pub y: f32,
}

impl ColorXy {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Warm white the room returns to after every animation.
pub const BASELINE: ColorXy = ColorXy::new(0.4578, 0.41);

/// How quickly the fixture fades to a new colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    Instant,
    VeryFast,
    Fast,
    Middle,
    Slow,
}

impl Transition {
    /// Fade length in bridge units of 100 ms.
    pub fn deciseconds(self) -> u16 {
        match self {
            Self::Instant => 0,
            Self::VeryFast => 1,
            Self::Fast => 2,
            Self::Middle => 4,
            Self::Slow => 8,
        }
    }
}

/// Command surface of the lighting fixture.
pub trait LightingService {
    fn set_color(&mut self, color: ColorXy, transition: Transition) -> Result<()>;

    /// Soft, bridge-driven breathing alert at the given hue.
    fn alert_pulse(&mut self, hue: u16) -> Result<()>;
}

impl<L: LightingService + ?Sized> LightingService for Box<L> {
    fn set_color(&mut self, color: ColorXy, transition: Transition) -> Result<()> {
        (**self).set_color(color, transition)
    }

    fn alert_pulse(&mut self, hue: u16) -> Result<()> {
        (**self).alert_pulse(hue)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LightCommand {
    SetColor { color: ColorXy, transition: Transition },
    AlertPulse { hue: u16 },
}

impl LightCommand {
    pub fn apply<L: LightingService + ?Sized>(&self, lights: &mut L) -> Result<()> {
        match *self {
            Self::SetColor { color, transition } => lights.set_color(color, transition),
            Self::AlertPulse { hue } => lights.alert_pulse(hue),
        }
    }
}

/// Ordered list of commands sent to the fixture in one go.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Effect(Vec<LightCommand>);

impl Effect {
    pub fn new(commands: Vec<LightCommand>) -> Self {
        Self(commands)
    }

    pub fn color(color: ColorXy, transition: Transition) -> Self {
        Self(vec![LightCommand::SetColor { color, transition }])
    }

    pub fn pulse(hue: u16) -> Self {
        Self(vec![LightCommand::AlertPulse { hue }])
    }

    pub fn commands(&self) -> &[LightCommand] {
        &self.0
    }

    /// Sends every command, stopping at the first failure.
    pub fn apply<L: LightingService + ?Sized>(&self, lights: &mut L) -> Result<()> {
        self.0.iter().try_for_each(|command| command.apply(&mut *lights))
    }
}

/// Dry-run fixture that only logs what it would have done.
#[derive(Debug, Default)]
pub struct LoggingLights;

impl LightingService for LoggingLights {
    fn set_color(&mut self, color: ColorXy, transition: Transition) -> Result<()> {
        tracing::info!(x = color.x, y = color.y, ?transition, "set color");
        Ok(())
    }

    fn alert_pulse(&mut self, hue: u16) -> Result<()> {
        tracing::info!(hue, "alert pulse");
        Ok(())
    }
}

/// Fixture that remembers every command it received. Clones share the log.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingLights {
    log: std::sync::Arc<std::sync::Mutex<Vec<LightCommand>>>,
}

#[cfg(test)]
impl RecordingLights {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn commands(&self) -> Vec<LightCommand> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    fn record(&self, command: LightCommand) -> Result<()> {
        self.log
            .lock()
            .map_err(|_| crate::LightsError::msg("recording log has been poisoned"))?
            .push(command);
        Ok(())
    }
}

#[cfg(test)]
impl LightingService for RecordingLights {
    fn set_color(&mut self, color: ColorXy, transition: Transition) -> Result<()> {
        self.record(LightCommand::SetColor { color, transition })
    }

    fn alert_pulse(&mut self, hue: u16) -> Result<()> {
        self.record(LightCommand::AlertPulse { hue })
    }
}
