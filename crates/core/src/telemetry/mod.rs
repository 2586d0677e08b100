use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{DomainEvent, GameSnapshot, GameStatePoller, LightsError, Result, TelemetryConfig};

/// Anything that can produce the current match snapshot.
#[async_trait]
pub trait SnapshotSource: Send {
    async fn fetch(&mut self) -> Result<GameSnapshot>;
}

/// HTTP client for the game client's local live data endpoint.
#[derive(Debug, Clone)]
pub struct TelemetryClient {
    client: reqwest::Client,
    endpoint: String,
}

impl TelemetryClient {
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        // The game client serves its local API with a self-signed certificate.
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(config.fetch_timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SnapshotSource for TelemetryClient {
    async fn fetch(&mut self) -> Result<GameSnapshot> {
        let snapshot = self
            .client
            .get(&self.endpoint)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(snapshot)
    }
}

/// Drives a [`GameStatePoller`] against a [`SnapshotSource`].
///
/// Exactly one fetch is in flight at a time: the next one is scheduled only
/// after the previous one resolved. Events go out through a bounded channel;
/// the loop ends when the receiving side is dropped.
pub struct PollLoop<S> {
    source: S,
    poller: GameStatePoller,
    events: mpsc::Sender<DomainEvent>,
    fetch_timeout: Duration,
    idle_poll: Duration,
}

impl<S: SnapshotSource> PollLoop<S> {
    pub fn new(source: S, config: &TelemetryConfig, events: mpsc::Sender<DomainEvent>) -> Self {
        Self {
            source,
            poller: GameStatePoller::new(config),
            events,
            fetch_timeout: config.fetch_timeout(),
            idle_poll: config.idle_poll(),
        }
    }

    pub async fn run(mut self) {
        tracing::info!("waiting for a game");

        loop {
            let fetched = match tokio::time::timeout(self.fetch_timeout, self.source.fetch()).await {
                Ok(result) => result,
                Err(_) => Err(LightsError::Unreachable("snapshot fetch timed out".into())),
            };

            let outcome = match &fetched {
                Ok(snapshot) => self.poller.on_snapshot(snapshot),
                Err(error) => self.poller.on_failure(error),
            };

            for event in outcome.events {
                if self.events.send(event).await.is_err() {
                    tracing::debug!("event receiver dropped, stopping poll loop");
                    return;
                }
            }

            let delay = match outcome.next_poll {
                Some(delay) => delay,
                None => {
                    self.poller.reset();
                    tracing::info!("waiting for the next game");
                    self.idle_poll
                }
            };
            tokio::time::sleep(delay).await;
        }
    }
}
