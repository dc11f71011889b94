//! Events emitted by the coordinator for the replication layer.
//!
//! [`StateChange`] values are writes to replicated fields; [`Notification`]
//! values are fire-and-forget cosmetic cues for observers.

use crate::state::{ActorId, MatchResult, Phase, Point, TeamId};

/// A write to one replicated field of authoritative state.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StateChange {
    ActiveTeam(TeamId),
    ActiveActor(Option<ActorId>),
    RemainingTime(f32),
    Phase(Phase),
    Health { actor: ActorId, health: u32 },
    Moving { actor: ActorId, moving: bool },
    Position { actor: ActorId, position: Point },
}

impl StateChange {
    /// The field this change writes.
    pub const fn field(&self) -> FieldKey {
        match self {
            StateChange::ActiveTeam(_) => FieldKey::ActiveTeam,
            StateChange::ActiveActor(_) => FieldKey::ActiveActor,
            StateChange::RemainingTime(_) => FieldKey::RemainingTime,
            StateChange::Phase(_) => FieldKey::Phase,
            StateChange::Health { actor, .. } => FieldKey::Health(*actor),
            StateChange::Moving { actor, .. } => FieldKey::Moving(*actor),
            StateChange::Position { actor, .. } => FieldKey::Position(*actor),
        }
    }
}

/// Identity of a replicated field. Ordering guarantees hold per key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldKey {
    ActiveTeam,
    ActiveActor,
    RemainingTime,
    Phase,
    Health(ActorId),
    Moving(ActorId),
    Position(ActorId),
}

/// Observer-facing cues; presentation layers react to them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Notification {
    AttackPerformed { attacker: ActorId, target: ActorId },
    HitTaken { actor: ActorId },
    ActorDied { actor: ActorId },
    ActiveUnitChanged { actor: ActorId, team: TeamId },
    TurnEnded { actor: Option<ActorId> },
    MatchEnded { result: MatchResult },
}

/// Anything the coordinator emits while processing a tick or request.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MatchEvent {
    State(StateChange),
    Notify(Notification),
}

impl From<StateChange> for MatchEvent {
    fn from(change: StateChange) -> Self {
        MatchEvent::State(change)
    }
}

impl From<Notification> for MatchEvent {
    fn from(notification: Notification) -> Self {
        MatchEvent::Notify(notification)
    }
}
