//! Typed action requests.
//!
//! Requests are transient: the coordinator validates and applies (or rejects)
//! them immediately and keeps nothing afterwards.

use crate::error::ActionError;
use crate::state::{ActorId, Point};

/// Kinds of actions an actor can request during its turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ActionKind {
    Move,
    Attack,
    EndTurn,
}

/// Request to act, addressed to the authority.
///
/// `requester` is the unit the sender believes is active; requests naming
/// any other unit are rejected, which also drops stale requests that arrive
/// after the turn moved on.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionRequest {
    Move { requester: ActorId, target: Point },
    Attack { requester: ActorId, target: ActorId },
    EndTurn { requester: ActorId },
}

impl ActionRequest {
    pub const fn kind(&self) -> ActionKind {
        match self {
            ActionRequest::Move { .. } => ActionKind::Move,
            ActionRequest::Attack { .. } => ActionKind::Attack,
            ActionRequest::EndTurn { .. } => ActionKind::EndTurn,
        }
    }

    pub const fn requester(&self) -> ActorId {
        match self {
            ActionRequest::Move { requester, .. }
            | ActionRequest::Attack { requester, .. }
            | ActionRequest::EndTurn { requester } => *requester,
        }
    }
}

/// Acknowledgment returned for every submitted request.
///
/// A rejection is a no-op: state is unchanged and nothing is retried.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Ack {
    Accepted,
    Rejected { reason: ActionError },
}

impl Ack {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Ack::Accepted)
    }

    pub fn rejection(&self) -> Option<&ActionError> {
        match self {
            Ack::Accepted => None,
            Ack::Rejected { reason } => Some(reason),
        }
    }
}

impl From<Result<(), ActionError>> for Ack {
    fn from(result: Result<(), ActionError>) -> Self {
        match result {
            Ok(()) => Ack::Accepted,
            Err(reason) => Ack::Rejected { reason },
        }
    }
}
