//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! connecting observers, submitting requests or streaming events from
//! specific topics.
use tokio::sync::{broadcast, mpsc, oneshot};

use tactics_core::{Ack, ActionRequest, MatchState, TeamId};

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::replication::ReplicationSnapshot;
use crate::session::{Connection, ConnectionId};
use crate::workers::Command;

/// Pending acknowledgment for a submitted request.
///
/// Requests are applied at the next server tick, so the ack arrives then.
#[derive(Debug)]
pub struct AckTicket {
    reply_rx: oneshot::Receiver<Ack>,
}

impl AckTicket {
    pub async fn wait(self) -> Result<Ack> {
        self.reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }
}

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl RuntimeHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }

    /// Register an observer connection, optionally owning `team`.
    pub async fn connect(&self, team: Option<TeamId>) -> Result<Connection> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Connect {
            team,
            reply: reply_tx,
        })
        .await?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)?
    }

    pub async fn disconnect(&self, connection: ConnectionId) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Disconnect {
            connection,
            reply: reply_tx,
        })
        .await?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)?
    }

    /// Queue a request from `connection`; resolve the ticket for the ack.
    pub async fn submit(
        &self,
        connection: ConnectionId,
        request: ActionRequest,
    ) -> Result<AckTicket> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Submit {
            connection,
            request,
            reply: reply_tx,
        })
        .await?;

        Ok(AckTicket { reply_rx })
    }

    /// Server-local end turn for the active unit.
    pub async fn end_turn(&self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::EndTurn { reply: reply_tx }).await?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Run one server tick of `delta` seconds.
    ///
    /// Meant for [`TickMode::Manual`]; in realtime mode it adds an extra tick.
    ///
    /// [`TickMode::Manual`]: crate::TickMode::Manual
    pub async fn advance(&self, delta: f32) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Advance {
            delta,
            reply: reply_tx,
        })
        .await?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Query the current match state (read-only snapshot)
    pub async fn query_state(&self) -> Result<MatchState> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::QueryState { reply: reply_tx }).await?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Capture the replicated surface for seeding an observer replica.
    pub async fn snapshot(&self) -> Result<ReplicationSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Snapshot { reply: reply_tx }).await?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::State` - Versioned writes to replicated fields
    /// - `Topic::Notification` - Attack, hit, death and turn cues
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub(crate) async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }
}
