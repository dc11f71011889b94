//! Error taxonomy for match setup and per-request validation.
//!
//! Per-request failures ([`ActionError`]) never escalate: the coordinator
//! rejects the request, leaves state untouched and acknowledges the caller
//! with the reason. Only setup-time misconfiguration ([`SetupError`]) is
//! returned to the caller of `start_match`.

use crate::state::{ActorId, Phase, TeamId};

/// Coarse classification of a rejected request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RejectionCategory {
    /// Wrong turn owner, action already used, out of range, blocked line of sight.
    #[strum(to_string = "invalid action request")]
    InvalidActionRequest,

    /// The referenced actor no longer resolves (e.g. already eliminated).
    #[strum(to_string = "unknown target")]
    UnknownTarget,
}

/// Reasons a request can be rejected by the authority.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionError {
    #[error("match is not accepting requests in phase {phase}")]
    NotAcceptingRequests { phase: Phase },

    #[error("requester {requester} is not the active actor")]
    NotActiveActor { requester: ActorId },

    #[error("connection does not own the active team")]
    NotTeamOwner,

    #[error("move already used this turn")]
    MoveAlreadyUsed,

    #[error("attack already used this turn")]
    AttackAlreadyUsed,

    #[error("destination exceeds the movement budget")]
    MoveOutOfRange,

    #[error("destination is not reachable")]
    Unreachable,

    #[error("target is out of attack range")]
    OutOfRange,

    #[error("line of sight to the target is blocked")]
    LineOfSightBlocked,

    #[error("target {target} is on the same team")]
    TargetIsAlly { target: ActorId },

    #[error("actor cannot target itself")]
    SelfTarget,

    #[error("actor {actor} does not resolve")]
    UnknownActor { actor: ActorId },

    #[error("target {target} does not resolve to a living actor")]
    UnknownTarget { target: ActorId },
}

impl ActionError {
    pub const fn category(&self) -> RejectionCategory {
        match self {
            Self::UnknownActor { .. } | Self::UnknownTarget { .. } => {
                RejectionCategory::UnknownTarget
            }
            _ => RejectionCategory::InvalidActionRequest,
        }
    }
}

/// Errors raised while starting a match. Fatal to starting it.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SetupError {
    #[error("{team} has no living actors")]
    EmptyRoster { team: TeamId },

    #[error("actor {actor} appears more than once in the rosters")]
    DuplicateActor { actor: ActorId },

    #[error("actor {actor} is listed under {listed} but belongs to {actual}")]
    TeamMismatch {
        actor: ActorId,
        listed: TeamId,
        actual: TeamId,
    },

    #[error("invalid match rules: {reason}")]
    InvalidRules { reason: &'static str },

    #[error("no actor ids left to allocate")]
    IdsExhausted,
}
