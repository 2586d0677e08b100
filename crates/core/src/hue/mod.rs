//! Hue bridge client for an already paired bridge.
//!
//! Commands are delivered by a background task in the order they were sent,
//! so the synchronous [`LightingService`] calls made by the arbiter never wait
//! on the network.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{BridgeConfig, ColorXy, LightCommand, LightingService, LightsError, Result, Transition};

const BRIDGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Body of a `groups/{id}/action` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct GroupAction {
    #[serde(skip_serializing_if = "Option::is_none")]
    xy: Option<[f32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hue: Option<u16>,
    alert: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    transitiontime: Option<u16>,
}

impl From<&LightCommand> for GroupAction {
    fn from(command: &LightCommand) -> Self {
        match *command {
            LightCommand::SetColor { color, transition } => Self {
                xy: Some([color.x, color.y]),
                hue: None,
                alert: "none",
                transitiontime: Some(transition.deciseconds()),
            },
            LightCommand::AlertPulse { hue } => Self {
                xy: None,
                hue: Some(hue),
                alert: "lselect",
                transitiontime: None,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct HueBridge {
    client: reqwest::Client,
    action_url: String,
}

impl HueBridge {
    pub fn new(config: &BridgeConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(BRIDGE_TIMEOUT).build()?;
        Ok(Self {
            client,
            action_url: format!(
                "http://{}/api/{}/groups/{}/action",
                config.address, config.username, config.group
            ),
        })
    }

    pub async fn send(&self, command: &LightCommand) -> Result<()> {
        let replies: Vec<Value> = self
            .client
            .put(&self.action_url)
            .json(&GroupAction::from(command))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match replies.iter().find_map(|reply| reply.get("error")) {
            Some(error) => Err(LightsError::msg(format!("bridge rejected command: {error}"))),
            None => Ok(()),
        }
    }

    /// Starts the delivery task. It ends once every [`HueHandle`] is dropped.
    pub fn spawn(self) -> (HueHandle, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<LightCommand>();
        let task = tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                if let Err(error) = self.send(&command).await {
                    tracing::warn!(%error, ?command, "failed to deliver light command");
                }
            }
        });
        (HueHandle { tx }, task)
    }
}

/// Sending side of a spawned [`HueBridge`].
#[derive(Debug, Clone)]
pub struct HueHandle {
    tx: mpsc::UnboundedSender<LightCommand>,
}

impl HueHandle {
    fn enqueue(&self, command: LightCommand) -> Result<()> {
        self.tx
            .send(command)
            .map_err(|_| LightsError::msg("hue bridge task has stopped"))
    }
}

impl LightingService for HueHandle {
    fn set_color(&mut self, color: ColorXy, transition: Transition) -> Result<()> {
        self.enqueue(LightCommand::SetColor { color, transition })
    }

    fn alert_pulse(&mut self, hue: u16) -> Result<()> {
        self.enqueue(LightCommand::AlertPulse { hue })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn color_commands_clear_alerts() {
        let body = serde_json::to_value(GroupAction::from(&LightCommand::SetColor {
            color: ColorXy::new(0.5, 0.25),
            transition: Transition::Middle,
        }))
        .unwrap();

        assert_eq!(body, json!({ "xy": [0.5, 0.25], "alert": "none", "transitiontime": 4 }));
    }

    #[test]
    fn pulses_use_long_select() {
        let body = serde_json::to_value(GroupAction::from(&LightCommand::AlertPulse { hue: 43_690 })).unwrap();
        assert_eq!(body, json!({ "hue": 43690, "alert": "lselect" }));
    }

    #[test]
    fn builds_group_action_url() {
        let bridge = HueBridge::new(&BridgeConfig {
            address: "10.0.0.2".into(),
            username: "user".into(),
            group: "3".into(),
        })
        .unwrap();
        assert_eq!(bridge.action_url, "http://10.0.0.2/api/user/groups/3/action");
    }

    #[tokio::test]
    async fn handle_reports_stopped_task() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let mut handle = HueHandle { tx };
        assert!(handle.alert_pulse(1).is_err());
    }
}
