//! Turn coordination and authoritative action dispatch.
//!
//! The [`TurnCoordinator`] is the sole writer of [`MatchState`]. It sequences
//! unit turns across both rosters, validates requests, drives each actor's
//! health/death lifecycle and records every replicated write and observer
//! cue in an outbox that the hosting runtime drains once per tick.
//!
//! The coordinator is single-threaded by construction: it is a plain value
//! mutated through `&mut self`, so the host must funnel all requests onto
//! one execution context.

mod actions;
mod timers;
mod turns;

pub use timers::PendingEndTurn;

use std::collections::{BTreeMap, HashSet};

use tracing::info;

use crate::config::MatchRules;
use crate::error::SetupError;
use crate::event::{MatchEvent, StateChange};
use crate::state::{
    ActorId, ActorState, MatchResult, MatchSetup, MatchState, Phase, TeamId, TurnState,
};

/// Authoritative match coordinator.
#[derive(Debug)]
pub struct TurnCoordinator {
    state: MatchState,
    pending: Option<PendingEndTurn>,
    outbox: Vec<MatchEvent>,
}

impl TurnCoordinator {
    /// Starts a match: team 0 is active, its first living unit is selected
    /// and the timer is set to `rules.turn_time`.
    ///
    /// Fails with [`SetupError::EmptyRoster`] if either team has no living
    /// actors.
    pub fn start_match(setup: MatchSetup, rules: MatchRules) -> Result<Self, SetupError> {
        rules.validate()?;

        let MatchSetup {
            teams: rosters,
            obstacles,
            ..
        } = setup;

        let mut actors = BTreeMap::new();
        let mut teams: [Vec<ActorId>; 2] = [Vec::new(), Vec::new()];
        let mut seen = HashSet::new();

        for team in TeamId::ALL {
            for actor in &rosters[team.index()] {
                if !seen.insert(actor.id) {
                    return Err(SetupError::DuplicateActor { actor: actor.id });
                }
                if actor.team != team {
                    return Err(SetupError::TeamMismatch {
                        actor: actor.id,
                        listed: team,
                        actual: actor.team,
                    });
                }
                teams[team.index()].push(actor.id);
                actors.insert(actor.id, actor.clone());
            }
        }

        let state = MatchState {
            rules,
            actors,
            teams,
            obstacles,
            turn: TurnState::new(),
        };

        for team in TeamId::ALL {
            if state.alive_count(team) == 0 {
                return Err(SetupError::EmptyRoster { team });
            }
        }

        let mut coordinator = Self {
            state,
            pending: None,
            outbox: Vec::new(),
        };
        coordinator.begin(TeamId::Zero);

        info!(
            target: "tactics::turn",
            team0 = coordinator.state.alive_count(TeamId::Zero),
            team1 = coordinator.state.alive_count(TeamId::One),
            turn_time = coordinator.state.rules.turn_time,
            "match started"
        );

        Ok(coordinator)
    }

    /// Read-only view of the authoritative state.
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn rules(&self) -> &MatchRules {
        &self.state.rules
    }

    pub fn phase(&self) -> Phase {
        self.state.turn.phase
    }

    pub fn active_team(&self) -> TeamId {
        self.state.turn.active_team
    }

    pub fn active_actor(&self) -> Option<ActorId> {
        self.state.turn.active_actor
    }

    pub fn actor(&self, id: ActorId) -> Option<&ActorState> {
        self.state.actor(id)
    }

    pub fn result(&self) -> Option<MatchResult> {
        self.state.turn.result
    }

    pub fn is_over(&self) -> bool {
        self.state.turn.phase == Phase::GameOver
    }

    /// The scheduled post-attack end turn, if one is pending.
    pub fn pending_end_turn(&self) -> Option<&PendingEndTurn> {
        self.pending.as_ref()
    }

    /// Takes every event emitted since the last drain, in emission order.
    pub fn drain_events(&mut self) -> Vec<MatchEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Full set of replicated field values, for seeding new observers.
    pub fn replicated_fields(&self) -> Vec<StateChange> {
        let turn = &self.state.turn;
        let mut fields = vec![
            StateChange::ActiveTeam(turn.active_team),
            StateChange::ActiveActor(turn.active_actor),
            StateChange::RemainingTime(turn.remaining_time),
            StateChange::Phase(turn.phase),
        ];
        for actor in self.state.actors.values() {
            fields.push(StateChange::Health {
                actor: actor.id,
                health: actor.health,
            });
            fields.push(StateChange::Moving {
                actor: actor.id,
                moving: actor.is_moving(),
            });
            fields.push(StateChange::Position {
                actor: actor.id,
                position: actor.position,
            });
        }
        fields
    }

    fn emit(&mut self, event: impl Into<MatchEvent>) {
        self.outbox.push(event.into());
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.state.turn.phase != phase {
            self.state.turn.phase = phase;
            self.emit(StateChange::Phase(phase));
        }
    }

    /// Fail-fast checks of the data-model invariants in debug builds.
    fn check_invariants(&self) {
        if cfg!(debug_assertions) {
            let turn = &self.state.turn;
            match turn.phase {
                Phase::UnitActive => {
                    let active = turn.active_actor.and_then(|id| self.state.actor(id));
                    debug_assert!(
                        active.is_some_and(|actor| actor.is_alive()
                            && actor.team == turn.active_team),
                        "active actor {:?} must be a living member of {}",
                        turn.active_actor,
                        turn.active_team
                    );
                }
                Phase::GameOver => {
                    debug_assert!(turn.result.is_some(), "game over without a result");
                    debug_assert!(self.pending.is_none(), "continuation outlived game over");
                }
                Phase::Idle | Phase::Transitioning => {}
            }
            debug_assert!(
                turn.remaining_time >= 0.0,
                "negative turn timer {}",
                turn.remaining_time
            );
        }
    }
}
