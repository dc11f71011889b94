use tracing::{debug, info};

use super::TurnCoordinator;
use crate::config::TimerScope;
use crate::event::{Notification, StateChange};
use crate::state::{ActorId, MatchResult, Phase, TeamId};

/// Turn rotation methods for TurnCoordinator.
impl TurnCoordinator {
    /// Ends the active unit's turn and activates the next one.
    ///
    /// Advances the cursor within the active team's rotation. Past the end of
    /// the rotation the other team becomes active with a freshly filtered
    /// rotation. Win/draw is re-checked before the next activation.
    pub fn end_turn(&mut self) {
        if self.state.turn.phase != Phase::UnitActive {
            debug!(
                target: "tactics::turn",
                phase = %self.state.turn.phase,
                "end turn ignored"
            );
            return;
        }

        // A turn ending by any route drops the continuation bound to it.
        self.pending = None;

        let ending = self.state.turn.active_actor;
        self.set_phase(Phase::Transitioning);
        self.emit(Notification::TurnEnded { actor: ending });
        debug!(target: "tactics::turn", actor = ?ending, "turn ended");

        self.state.turn.cursor += 1;
        self.advance();
    }

    /// Ends the whole team phase at once (per-team timer expiry).
    pub(super) fn forfeit_team_phase(&mut self) {
        if self.state.turn.phase != Phase::UnitActive {
            return;
        }
        self.pending = None;

        let ending = self.state.turn.active_actor;
        self.set_phase(Phase::Transitioning);
        self.emit(Notification::TurnEnded { actor: ending });
        info!(
            target: "tactics::turn",
            team = %self.state.turn.active_team,
            "team phase forfeited on timer expiry"
        );

        self.state.turn.cursor = self.state.turn.rotation.len();
        self.advance();
    }

    /// Initial activation at match start.
    pub(super) fn begin(&mut self, team: TeamId) {
        self.set_phase(Phase::Transitioning);
        self.state.turn.active_team = team;
        self.emit(StateChange::ActiveTeam(team));
        self.state.turn.rotation = self.living_ids(team);
        self.state.turn.cursor = 0;
        self.reset_timer();
        self.advance();
    }

    /// Selects and activates the next unit, or ends the match.
    fn advance(&mut self) {
        if let Some(result) = self.outcome() {
            self.finish(result);
            return;
        }

        // Both teams have living units here, so at most one switch is needed.
        for _ in 0..2 {
            if self.state.turn.cursor >= self.state.turn.rotation.len() {
                self.switch_team();
            }

            while let Some(&id) = self.state.turn.rotation.get(self.state.turn.cursor) {
                if self.state.living_actor(id).is_some() {
                    self.activate(id);
                    return;
                }
                // Rotations are filtered at team switch; only an actor lost
                // mid-phase (friendly fire) can show up here.
                debug!(target: "tactics::turn", actor = %id, "skipping eliminated unit");
                self.state.turn.cursor += 1;
            }
        }

        debug_assert!(false, "no living unit found despite both teams alive");
        self.finish(MatchResult::Draw);
    }

    fn switch_team(&mut self) {
        let next = self.state.turn.active_team.other();
        self.state.turn.active_team = next;
        self.state.turn.rotation = self.living_ids(next);
        self.state.turn.cursor = 0;
        self.reset_timer();
        self.emit(StateChange::ActiveTeam(next));
        debug!(
            target: "tactics::turn",
            team = %next,
            units = self.state.turn.rotation.len(),
            "team switched"
        );
    }

    fn activate(&mut self, id: ActorId) {
        let team = self.state.turn.active_team;
        if let Some(actor) = self.state.actor_mut(id) {
            actor.begin_activation();
        }

        self.state.turn.active_actor = Some(id);
        self.state.turn.activation += 1;
        if self.state.rules.timer_scope == TimerScope::PerUnit {
            self.reset_timer();
        }
        self.set_phase(Phase::UnitActive);

        self.emit(StateChange::ActiveActor(Some(id)));
        self.emit(StateChange::RemainingTime(self.state.turn.remaining_time));
        self.emit(Notification::ActiveUnitChanged { actor: id, team });

        info!(
            target: "tactics::turn",
            actor = %id,
            team = %team,
            activation = self.state.turn.activation,
            "unit turn started"
        );
        self.check_invariants();
    }

    fn finish(&mut self, result: MatchResult) {
        self.pending = None;
        self.state.turn.active_actor = None;
        self.state.turn.result = Some(result);
        self.set_phase(Phase::GameOver);

        self.emit(StateChange::ActiveActor(None));
        self.emit(Notification::MatchEnded { result });

        info!(target: "tactics::turn", %result, "match over");
        self.check_invariants();
    }

    /// `Some` once either team has no living units.
    fn outcome(&self) -> Option<MatchResult> {
        let alive0 = self.state.alive_count(TeamId::Zero);
        let alive1 = self.state.alive_count(TeamId::One);
        match (alive0, alive1) {
            (0, 0) => Some(MatchResult::Draw),
            (_, 0) => Some(MatchResult::Win(TeamId::Zero)),
            (0, _) => Some(MatchResult::Win(TeamId::One)),
            _ => None,
        }
    }

    fn living_ids(&self, team: TeamId) -> Vec<ActorId> {
        self.state.living(team).map(|actor| actor.id).collect()
    }

    fn reset_timer(&mut self) {
        self.state.turn.remaining_time = self.state.rules.turn_time;
    }
}

#[cfg(test)]
mod tests {
    use crate::config::MatchRules;
    use crate::engine::TurnCoordinator;
    use crate::event::{MatchEvent, Notification};
    use crate::state::{ActorId, Archetype, MatchResult, MatchSetup, Phase, Point, TeamId};

    fn setup(team0: usize, team1: usize) -> MatchSetup {
        let mut setup = MatchSetup::new();
        for i in 0..team0 {
            setup.spawn(TeamId::Zero, Archetype::Standard, Point::ground(i as f32, 0.0)).unwrap();
        }
        for i in 0..team1 {
            setup.spawn(TeamId::One, Archetype::Standard, Point::ground(i as f32, 20.0)).unwrap();
        }
        setup
    }

    #[test]
    fn rotation_alternates_teams_round_robin() {
        let mut coordinator =
            TurnCoordinator::start_match(setup(2, 1), MatchRules::default()).unwrap();

        let mut order = vec![coordinator.active_actor().unwrap()];
        for _ in 0..5 {
            coordinator.end_turn();
            order.push(coordinator.active_actor().unwrap());
        }

        let expected: Vec<ActorId> = [1, 2, 3, 1, 2, 3].into_iter().map(ActorId).collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn start_emits_active_unit_changed() {
        let mut coordinator =
            TurnCoordinator::start_match(setup(1, 1), MatchRules::default()).unwrap();

        let events = coordinator.drain_events();
        assert!(events.contains(&MatchEvent::Notify(Notification::ActiveUnitChanged {
            actor: ActorId(1),
            team: TeamId::Zero,
        })));
        assert_eq!(coordinator.phase(), Phase::UnitActive);
    }

    #[test]
    fn end_turn_after_game_over_is_ignored() {
        let mut setup = setup(1, 0);
        setup.insert(
            crate::state::ActorState::new(
                ActorId(50),
                TeamId::One,
                Archetype::Standard,
                Point::ground(0.0, 1.0),
            )
            .with_health(1),
        );
        let mut coordinator = TurnCoordinator::start_match(setup, MatchRules::default()).unwrap();

        if let Some(actor) = coordinator.state.actor_mut(ActorId(50)) {
            actor.health = 0;
        }
        coordinator.end_turn();
        assert_eq!(coordinator.result(), Some(MatchResult::Win(TeamId::Zero)));

        coordinator.drain_events();
        coordinator.end_turn();
        assert!(coordinator.drain_events().is_empty());
        assert_eq!(coordinator.phase(), Phase::GameOver);
    }
}
