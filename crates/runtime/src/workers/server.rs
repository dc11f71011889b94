//! Server worker that owns the authoritative [`TurnCoordinator`].
//!
//! Receives commands from [`RuntimeHandle`], queues remote requests, and
//! applies them once per tick on this single task before advancing the
//! coordinator. Every event the coordinator emits is routed through the
//! [`ReplicationChannel`].
//!
//! [`RuntimeHandle`]: crate::RuntimeHandle

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::{debug, info};

use tactics_core::{Ack, ActionRequest, MatchState, Navigator, TeamId, TurnCoordinator};

use crate::api::Result;
use crate::config::TickMode;
use crate::replication::{ReplicationChannel, ReplicationSnapshot};
use crate::session::{Connection, ConnectionId, SessionRegistry};

/// Commands that can be sent to the server worker
pub enum Command {
    /// Register an observer, optionally claiming a team.
    Connect {
        team: Option<TeamId>,
        reply: oneshot::Sender<Result<Connection>>,
    },
    Disconnect {
        connection: ConnectionId,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Queue a remote request; the ack is sent once the next tick applies it.
    Submit {
        connection: ConnectionId,
        request: ActionRequest,
        reply: oneshot::Sender<Ack>,
    },
    /// Server-local end turn, bypassing team ownership.
    EndTurn { reply: oneshot::Sender<()> },
    /// Run one tick of `delta` seconds (manual tick mode).
    Advance {
        delta: f32,
        reply: oneshot::Sender<()>,
    },
    /// Query the authoritative state (read-only clone).
    QueryState { reply: oneshot::Sender<MatchState> },
    /// Capture a snapshot for seeding or resyncing a replica.
    Snapshot {
        reply: oneshot::Sender<ReplicationSnapshot>,
    },
    Shutdown,
}

struct QueuedRequest {
    connection: ConnectionId,
    request: ActionRequest,
    reply: oneshot::Sender<Ack>,
}

/// Background task that serializes all access to the match.
pub struct ServerWorker {
    coordinator: TurnCoordinator,
    navigator: Box<dyn Navigator + Send>,
    replication: ReplicationChannel,
    sessions: SessionRegistry,
    inbox: VecDeque<QueuedRequest>,
    command_rx: mpsc::Receiver<Command>,
    tick_mode: TickMode,
    tick_interval: Duration,
}

impl ServerWorker {
    pub fn new(
        mut coordinator: TurnCoordinator,
        navigator: Box<dyn Navigator + Send>,
        mut replication: ReplicationChannel,
        command_rx: mpsc::Receiver<Command>,
        tick_mode: TickMode,
        tick_interval: Duration,
    ) -> Self {
        // Nobody is subscribed yet; observers seed from snapshots instead.
        coordinator.drain_events();
        replication.seed(coordinator.replicated_fields());

        info!(
            target: "runtime::worker",
            actors = coordinator.state().actors.len(),
            active = ?coordinator.active_actor(),
            mode = ?tick_mode,
            "ServerWorker initialized"
        );

        Self {
            coordinator,
            navigator,
            replication,
            sessions: SessionRegistry::new(),
            inbox: VecDeque::new(),
            command_rx,
            tick_mode,
            tick_interval,
        }
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        let mut ticker = match self.tick_mode {
            TickMode::Realtime => {
                let mut ticker = time::interval(self.tick_interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                Some(ticker)
            }
            TickMode::Manual => None,
        };
        let delta = self.tick_interval.as_secs_f32();

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(Command::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd),
                },
                _ = next_tick(&mut ticker) => self.tick(delta),
            }
        }

        self.shutdown();
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Connect { team, reply } => {
                let result = self.sessions.connect(team);
                if reply.send(result).is_err() {
                    debug!(target: "runtime::worker", "Connect reply channel closed (caller dropped)");
                }
            }
            Command::Disconnect { connection, reply } => {
                let result = self.sessions.disconnect(connection);
                if reply.send(result).is_err() {
                    debug!(target: "runtime::worker", "Disconnect reply channel closed (caller dropped)");
                }
            }
            Command::Submit {
                connection,
                request,
                reply,
            } => {
                self.inbox.push_back(QueuedRequest {
                    connection,
                    request,
                    reply,
                });
            }
            Command::EndTurn { reply } => {
                self.coordinator.end_turn();
                self.flush_events();
                if reply.send(()).is_err() {
                    debug!(target: "runtime::worker", "EndTurn reply channel closed (caller dropped)");
                }
            }
            Command::Advance { delta, reply } => {
                self.tick(delta);
                if reply.send(()).is_err() {
                    debug!(target: "runtime::worker", "Advance reply channel closed (caller dropped)");
                }
            }
            Command::QueryState { reply } => {
                if reply.send(self.coordinator.state().clone()).is_err() {
                    debug!(target: "runtime::worker", "QueryState reply channel closed (caller dropped)");
                }
            }
            Command::Snapshot { reply } => {
                let snapshot =
                    ReplicationSnapshot::capture(self.coordinator.state(), &self.replication);
                if reply.send(snapshot).is_err() {
                    debug!(target: "runtime::worker", "Snapshot reply channel closed (caller dropped)");
                }
            }
            Command::Shutdown => {}
        }
    }

    /// One server tick: queued requests, movement, then the coordinator clock.
    fn tick(&mut self, delta: f32) {
        let inbox = std::mem::take(&mut self.inbox);
        for queued in inbox {
            let ack = self.apply_request(queued.connection, queued.request);
            self.flush_events();
            if queued.reply.send(ack).is_err() {
                debug!(target: "runtime::worker", "Submit reply channel closed (caller dropped)");
            }
        }

        self.navigator.advance(delta);
        self.coordinator.tick(delta, self.navigator.as_mut());
        self.flush_events();
    }

    fn apply_request(&mut self, connection: ConnectionId, request: ActionRequest) -> Ack {
        if let Err(reason) = self
            .sessions
            .authorize(connection, self.coordinator.active_team())
        {
            debug!(
                target: "runtime::worker",
                connection = %connection,
                kind = %request.kind(),
                %reason,
                "request refused"
            );
            return Ack::Rejected { reason };
        }

        self.coordinator.submit(request, self.navigator.as_mut())
    }

    fn flush_events(&mut self) {
        for event in self.coordinator.drain_events() {
            self.replication.dispatch(event);
        }
    }

    fn shutdown(&mut self) {
        self.coordinator.shutdown();
        for queued in self.inbox.drain(..) {
            // Dropping the sender tells the waiting caller the server is gone.
            drop(queued.reply);
        }
        info!(target: "runtime::worker", "ServerWorker stopped");
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
