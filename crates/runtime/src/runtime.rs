//! High-level runtime orchestrator.
//!
//! The runtime owns the server worker, wires up command/event channels, and
//! exposes a builder-based API for hosting a match.

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::info;

use tactics_core::{MatchSetup, Navigator, TurnCoordinator};

use crate::api::{Result, RuntimeError, RuntimeHandle};
use crate::config::RuntimeConfig;
use crate::events::{Event, EventBus, Topic};
use crate::navigation::StraightLineNavigator;
use crate::replication::ReplicationChannel;
use crate::workers::{Command, ServerWorker};

/// Main runtime that hosts one authoritative match.
///
/// Design: Runtime owns the worker and coordinates shutdown.
/// [`RuntimeHandle`] provides a cloneable façade for observers.
pub struct Runtime {
    handle: RuntimeHandle,
    worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.handle.subscribe(topic)
    }

    /// Stop the match and wait for the worker to exit.
    ///
    /// Queued requests are dropped without an ack and any pending turn
    /// continuation is cancelled.
    pub async fn shutdown(self) -> Result<()> {
        // The worker may already be gone if every handle was dropped.
        let _ = self.handle.shutdown().await;
        drop(self.handle);

        self.worker_handle.await.map_err(RuntimeError::WorkerJoin)
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    setup: Option<MatchSetup>,
    navigator: Option<Box<dyn Navigator + Send>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            setup: None,
            navigator: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Provide the roster and obstacles (required)
    pub fn setup(mut self, setup: MatchSetup) -> Self {
        self.setup = Some(setup);
        self
    }

    /// Replace the default [`StraightLineNavigator`].
    pub fn navigator(mut self, navigator: impl Navigator + Send + 'static) -> Self {
        self.navigator = Some(Box::new(navigator));
        self
    }

    /// Start the match and spawn the server worker.
    pub async fn build(self) -> Result<Runtime> {
        let setup = self.setup.ok_or(RuntimeError::MissingSetup)?;
        let config = self.config;

        let navigator = match self.navigator {
            Some(navigator) => navigator,
            None => Box::new(StraightLineNavigator::with_speed(
                setup.obstacles.clone(),
                config.walk_speed,
            )),
        };

        let coordinator = TurnCoordinator::start_match(setup, config.match_rules.clone())?;

        let (command_tx, command_rx) = mpsc::channel::<Command>(config.command_buffer_size);
        let event_bus = EventBus::with_capacity(config.event_buffer_size);
        let replication = ReplicationChannel::new(event_bus.clone());

        let worker = ServerWorker::new(
            coordinator,
            navigator,
            replication,
            command_rx,
            config.tick_mode,
            config.tick_interval,
        );
        let worker_handle = tokio::spawn(worker.run());

        info!(
            target: "runtime",
            mode = ?config.tick_mode,
            tick_ms = config.tick_interval.as_millis() as u64,
            "runtime started"
        );

        Ok(Runtime {
            handle: RuntimeHandle::new(command_tx, event_bus),
            worker_handle,
        })
    }
}
