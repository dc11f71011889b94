use std::fmt;

use super::{ActorId, TeamId};

/// Coordinator state machine phases.
///
/// `Idle → UnitActive → Transitioning → (UnitActive | GameOver)`.
/// `GameOver` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    #[default]
    Idle,
    UnitActive,
    Transitioning,
    GameOver,
}

/// Final outcome of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MatchResult {
    Win(TeamId),
    Draw,
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchResult::Win(team) => write!(f, "{team} wins"),
            MatchResult::Draw => write!(f, "draw"),
        }
    }
}

/// Authoritative turn state, singleton per match. Only the coordinator
/// writes it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnState {
    pub active_team: TeamId,

    /// The one active actor. Always a living actor while `phase != GameOver`.
    pub active_actor: Option<ActorId>,

    /// Seconds left on the turn timer.
    pub remaining_time: f32,

    pub phase: Phase,

    /// Living units of the active team, captured when the team became active.
    pub rotation: Vec<ActorId>,

    /// Index of the active unit within `rotation`.
    pub cursor: usize,

    /// Monotonic activation counter. Scheduled continuations bind to it so a
    /// continuation never outlives the activation that scheduled it.
    pub activation: u64,

    pub result: Option<MatchResult>,
}

impl TurnState {
    pub fn new() -> Self {
        Self {
            active_team: TeamId::Zero,
            active_actor: None,
            remaining_time: 0.0,
            phase: Phase::Idle,
            rotation: Vec::new(),
            cursor: 0,
            activation: 0,
            result: None,
        }
    }
}

impl Default for TurnState {
    fn default() -> Self {
        Self::new()
    }
}
