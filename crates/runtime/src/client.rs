//! Observer side of a match.
//!
//! An [`ObserverClient`] keeps a replica in sync with the server feed and
//! turns local intent into requests. It never mutates authoritative state;
//! every action goes through the server queue and comes back as an ack.

use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tracing::{debug, warn};

use tactics_core::{
    Ack, ActionError, ActionKind, ActionRequest, ActorId, MatchResult, Notification, Phase, Point,
    StateChange, TeamId,
};

use crate::api::{ActionProvider, AckTicket, Result, RuntimeError, RuntimeHandle, TurnContext};
use crate::events::{Event, Topic};
use crate::replication::{ActorView, ObserverReplica};
use crate::session::Connection;

pub struct ObserverClient {
    handle: RuntimeHandle,
    connection: Connection,
    replica: ObserverReplica,
    state_rx: broadcast::Receiver<Event>,
    notification_rx: broadcast::Receiver<Event>,
}

impl ObserverClient {
    /// Connects to the runtime and seeds the replica from a snapshot.
    ///
    /// Subscriptions are opened before the snapshot is taken, so no write can
    /// fall between the two.
    pub async fn connect(handle: RuntimeHandle, team: Option<TeamId>) -> Result<Self> {
        let connection = handle.connect(team).await?;
        let state_rx = handle.subscribe(Topic::State);
        let notification_rx = handle.subscribe(Topic::Notification);
        let snapshot = handle.snapshot().await?;

        Ok(Self {
            handle,
            connection,
            replica: ObserverReplica::from_snapshot(&snapshot),
            state_rx,
            notification_rx,
        })
    }

    pub fn connection(&self) -> Connection {
        self.connection
    }

    pub fn team(&self) -> Option<TeamId> {
        self.connection.team
    }

    pub fn replica(&self) -> &ObserverReplica {
        &self.replica
    }

    /// The active actor, if it belongs to this observer's team.
    pub fn controlled_actor(&self) -> Option<ActorView> {
        let team = self.team()?;
        if self.replica.phase() != Phase::UnitActive {
            return None;
        }
        self.replica
            .active_actor_view()
            .filter(|actor| actor.team == team)
    }

    pub async fn request_move(&self, target: Point) -> Result<AckTicket> {
        let requester = self.active_requester()?;
        self.submit(ActionRequest::Move { requester, target }).await
    }

    pub async fn request_attack(&self, target: ActorId) -> Result<AckTicket> {
        let requester = self.active_requester()?;
        self.submit(ActionRequest::Attack { requester, target })
            .await
    }

    pub async fn request_end_turn(&self) -> Result<AckTicket> {
        let requester = self.active_requester()?;
        self.submit(ActionRequest::EndTurn { requester }).await
    }

    pub async fn submit(&self, request: ActionRequest) -> Result<AckTicket> {
        self.handle.submit(self.connection.id, request).await
    }

    fn active_requester(&self) -> Result<ActorId> {
        self.replica
            .active_actor_view()
            .map(|actor| actor.id)
            .ok_or(RuntimeError::NoActiveActor)
    }

    /// Rebuilds the replica from a fresh snapshot.
    pub async fn resync(&mut self) -> Result<()> {
        let snapshot = self.handle.snapshot().await?;
        self.replica.apply_snapshot(&snapshot);
        debug!(
            target: "runtime::client",
            connection = %self.connection.id,
            "replica resynced"
        );
        Ok(())
    }

    /// Waits for the next event, applying state updates to the replica.
    ///
    /// State updates are preferred when both feeds are ready, so a cue is
    /// usually handled against a replica that already reflects it.
    pub async fn next_event(&mut self) -> Result<Event> {
        loop {
            let received = tokio::select! {
                biased;
                received = self.state_rx.recv() => received,
                received = self.notification_rx.recv() => received,
            };

            match received {
                Ok(event) => {
                    if let Event::State(update) = &event {
                        self.replica.apply(update);
                    }
                    return Ok(event);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        target: "runtime::client",
                        connection = %self.connection.id,
                        skipped,
                        "observer lagged behind the feed"
                    );
                    self.resync().await?;
                }
                Err(RecvError::Closed) => return Err(RuntimeError::EventStreamClosed),
            }
        }
    }

    /// Applies everything already delivered and returns the pending cues.
    pub async fn sync(&mut self) -> Result<Vec<Notification>> {
        loop {
            match self.state_rx.try_recv() {
                Ok(Event::State(update)) => {
                    self.replica.apply(&update);
                }
                Ok(Event::Notification(_)) => {}
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Lagged(_)) => self.resync().await?,
                Err(TryRecvError::Closed) => return Err(RuntimeError::EventStreamClosed),
            }
        }

        let mut cues = Vec::new();
        loop {
            match self.notification_rx.try_recv() {
                Ok(Event::Notification(notification)) => cues.push(notification),
                Ok(Event::State(_)) => {}
                Err(TryRecvError::Empty) => break,
                // Cues are cosmetic; missing some is tolerated.
                Err(TryRecvError::Lagged(skipped)) => {
                    debug!(target: "runtime::client", skipped, "notifications dropped");
                }
                Err(TryRecvError::Closed) => return Err(RuntimeError::EventStreamClosed),
            }
        }
        Ok(cues)
    }

    /// Drives this observer's team with `provider` until the match ends.
    pub async fn play(&mut self, provider: &dyn ActionProvider) -> Result<MatchResult> {
        let mut turn = self.controlled_actor().map(|actor| TurnContext::new(actor.id));
        let mut walking = false;
        if let Some(context) = turn.as_mut() {
            walking = self.act(provider, context).await?;
        }

        loop {
            match self.next_event().await? {
                Event::Notification(Notification::MatchEnded { result }) => return Ok(result),
                Event::Notification(Notification::ActiveUnitChanged { actor, team }) => {
                    walking = false;
                    turn = (Some(team) == self.team()).then(|| TurnContext::new(actor));
                    if let Some(context) = turn.as_mut() {
                        walking = self.act(provider, context).await?;
                    }
                }
                Event::State(update) => {
                    let arrived = matches!(
                        update.change,
                        StateChange::Moving { actor, moving: false }
                            if turn.is_some_and(|context| context.actor == actor)
                    );
                    if walking
                        && arrived
                        && let Some(context) = turn.as_mut()
                    {
                        walking = self.act(provider, context).await?;
                    }
                }
                Event::Notification(_) => {}
            }
        }
    }

    /// Issues one request for the current turn. Returns true if a walk began.
    async fn act(&mut self, provider: &dyn ActionProvider, turn: &mut TurnContext) -> Result<bool> {
        if turn.attacked {
            // The post-attack delay closes the turn.
            return Ok(false);
        }

        let request = provider.provide_action(turn, &self.replica).await?;
        let ack = self.submit(request).await?.wait().await?;

        match ack {
            Ack::Accepted => match request.kind() {
                ActionKind::Move => {
                    turn.moved = true;
                    Ok(true)
                }
                ActionKind::Attack => {
                    turn.attacked = true;
                    Ok(false)
                }
                ActionKind::EndTurn => Ok(false),
            },
            Ack::Rejected { reason } => {
                debug!(
                    target: "runtime::client",
                    actor = %turn.actor,
                    kind = %request.kind(),
                    %reason,
                    "request rejected"
                );
                if matches!(
                    reason,
                    ActionError::NotActiveActor { .. } | ActionError::NotAcceptingRequests { .. }
                ) || request.kind() == ActionKind::EndTurn
                {
                    return Ok(false);
                }
                // Give the turn up rather than stall until the timer runs out.
                self.submit(ActionRequest::EndTurn {
                    requester: turn.actor,
                })
                .await?
                .wait()
                .await?;
                Ok(false)
            }
        }
    }

    pub async fn disconnect(self) -> Result<()> {
        self.handle.disconnect(self.connection.id).await
    }
}
