use tracing::{debug, info};

use super::TurnCoordinator;
use crate::config::TimerScope;
use crate::event::StateChange;
use crate::navigation::Navigator;
use crate::state::{ActorId, Phase};
use crate::validator;

/// A delayed end turn scheduled by an attack.
///
/// The continuation is bound to the activation that scheduled it and fires
/// only if that activation is still current, so an end turn that already
/// happened by another route is never repeated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PendingEndTurn {
    /// Seconds left before the end turn fires.
    pub remaining: f32,
    pub activation: u64,
}

/// Per-tick processing for TurnCoordinator.
impl TurnCoordinator {
    /// Advances the match by `dt` seconds.
    ///
    /// In order: movement progress, the pending post-attack end turn, then
    /// the turn timer. Only runs while a unit is active.
    pub fn tick(&mut self, dt: f32, nav: &mut dyn Navigator) {
        if self.state.turn.phase != Phase::UnitActive {
            return;
        }
        let dt = dt.max(0.0);
        let activation = self.state.turn.activation;

        self.poll_movement(nav);
        // The next unit starts with a full timer.
        if self.state.turn.phase != Phase::UnitActive || self.state.turn.activation != activation
        {
            return;
        }

        if self.poll_pending(dt) {
            return;
        }

        self.run_timer(dt);
        self.check_invariants();
    }

    /// Drops any pending continuation; used when the host shuts down.
    pub fn shutdown(&mut self) {
        if self.pending.take().is_some() {
            debug!(target: "tactics::turn", "pending end turn cancelled");
        }
    }

    fn poll_movement(&mut self, nav: &mut dyn Navigator) {
        let walking: Vec<ActorId> = self
            .state
            .actors
            .values()
            .filter(|actor| actor.is_alive() && actor.is_moving())
            .map(|actor| actor.id)
            .collect();

        for id in walking {
            if let Some(position) = nav.position(id) {
                let changed = self.state.actor_mut(id).is_some_and(|actor| {
                    let changed = actor.position != position;
                    actor.position = position;
                    changed
                });
                if changed {
                    self.emit(StateChange::Position {
                        actor: id,
                        position,
                    });
                }
            }

            if nav.is_moving(id) {
                continue;
            }

            let Some(actor) = self.state.actor_mut(id) else {
                continue;
            };
            let before = actor.position;
            actor.finish_move();
            let position = actor.position;

            if position != before {
                self.emit(StateChange::Position {
                    actor: id,
                    position,
                });
            }
            self.emit(StateChange::Moving {
                actor: id,
                moving: false,
            });
            debug!(target: "tactics::action", actor = %id, %position, "move finished");

            self.on_move_finished(id);
        }
    }

    /// Ends the turn of an active unit that moved this turn and has nothing
    /// left to shoot at.
    fn on_move_finished(&mut self, id: ActorId) {
        if !self.state.rules.end_turn_when_no_targets
            || self.state.turn.phase != Phase::UnitActive
            || self.state.turn.active_actor != Some(id)
        {
            return;
        }
        let Some(actor) = self.state.living_actor(id) else {
            return;
        };
        // A walk left over from an earlier turn does not spend this one.
        if !actor.has_moved() || actor.has_attacked() {
            return;
        }

        if validator::attack_candidates(actor, &self.state).is_empty() {
            info!(
                target: "tactics::turn",
                actor = %id,
                "no targets after move, ending turn"
            );
            self.end_turn();
        }
    }

    /// Counts down the pending continuation; true if it fired.
    fn poll_pending(&mut self, dt: f32) -> bool {
        let Some(mut pending) = self.pending.take() else {
            return false;
        };

        if pending.activation != self.state.turn.activation {
            debug!(
                target: "tactics::turn",
                scheduled = pending.activation,
                current = self.state.turn.activation,
                "stale end turn dropped"
            );
            return false;
        }

        pending.remaining -= dt;
        if pending.remaining > 0.0 {
            self.pending = Some(pending);
            return false;
        }

        debug!(target: "tactics::turn", activation = pending.activation, "delayed end turn fired");
        self.end_turn();
        true
    }

    fn run_timer(&mut self, dt: f32) {
        let remaining = (self.state.turn.remaining_time - dt).max(0.0);
        self.state.turn.remaining_time = remaining;
        self.emit(StateChange::RemainingTime(remaining));

        if remaining > 0.0 {
            return;
        }

        match self.state.rules.timer_scope {
            TimerScope::PerUnit => {
                info!(
                    target: "tactics::turn",
                    actor = ?self.state.turn.active_actor,
                    "turn timer expired"
                );
                self.end_turn();
            }
            TimerScope::PerTeam => self.forfeit_team_phase(),
        }
    }
}
