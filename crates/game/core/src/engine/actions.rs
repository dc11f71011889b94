use tracing::{debug, info};

use super::TurnCoordinator;
use super::timers::PendingEndTurn;
use crate::action::{Ack, ActionKind, ActionRequest};
use crate::error::ActionError;
use crate::event::{Notification, StateChange};
use crate::navigation::Navigator;
use crate::state::{ActorId, Phase, Point};

/// Request dispatch for TurnCoordinator.
impl TurnCoordinator {
    /// Validates and applies a request, returning the acknowledgment.
    ///
    /// A rejected request leaves state untouched and emits nothing.
    pub fn submit(&mut self, request: ActionRequest, nav: &mut dyn Navigator) -> Ack {
        let result = self.try_submit(request, nav);
        match &result {
            Ok(()) => debug!(
                target: "tactics::action",
                kind = %request.kind(),
                requester = %request.requester(),
                "request accepted"
            ),
            Err(reason) => debug!(
                target: "tactics::action",
                kind = %request.kind(),
                requester = %request.requester(),
                category = %reason.category(),
                %reason,
                "request rejected"
            ),
        }
        self.check_invariants();
        result.into()
    }

    fn try_submit(
        &mut self,
        request: ActionRequest,
        nav: &mut dyn Navigator,
    ) -> Result<(), ActionError> {
        let phase = self.state.turn.phase;
        if phase != Phase::UnitActive {
            return Err(ActionError::NotAcceptingRequests { phase });
        }

        let requester = request.requester();
        if self.state.turn.active_actor != Some(requester) {
            return Err(ActionError::NotActiveActor { requester });
        }

        match request {
            ActionRequest::Move { target, .. } => self.request_move(requester, target, nav),
            ActionRequest::Attack { target, .. } => self.request_attack(requester, target, nav),
            ActionRequest::EndTurn { .. } => {
                self.end_turn();
                Ok(())
            }
        }
    }

    fn request_move(
        &mut self,
        actor: ActorId,
        target: Point,
        nav: &mut dyn Navigator,
    ) -> Result<(), ActionError> {
        let mover = self
            .state
            .living_actor(actor)
            .ok_or(ActionError::UnknownActor { actor })?;
        mover.check_move(target, &self.state.rules)?;

        let origin = mover.position;
        if !nav.compute_path(actor, origin, target) {
            return Err(ActionError::Unreachable);
        }

        if let Some(mover) = self.state.actor_mut(actor) {
            mover.begin_move(target);
        }
        self.emit(StateChange::Moving {
            actor,
            moving: true,
        });
        info!(
            target: "tactics::action",
            actor = %actor,
            from = %origin,
            to = %target,
            "move started"
        );

        self.register_action_outcome(actor, ActionKind::Move);
        Ok(())
    }

    fn request_attack(
        &mut self,
        attacker_id: ActorId,
        target_id: ActorId,
        nav: &mut dyn Navigator,
    ) -> Result<(), ActionError> {
        let attacker = self
            .state
            .living_actor(attacker_id)
            .ok_or(ActionError::UnknownActor { actor: attacker_id })?;
        let target = self
            .state
            .living_actor(target_id)
            .ok_or(ActionError::UnknownTarget { target: target_id })?;
        attacker.check_attack(target, &self.state.obstacles, &self.state.rules)?;

        self.emit(Notification::AttackPerformed {
            attacker: attacker_id,
            target: target_id,
        });
        self.apply_damage(target_id, self.state.rules.attack_damage, nav);

        info!(
            target: "tactics::action",
            attacker = %attacker_id,
            target = %target_id,
            "attack resolved"
        );

        self.register_action_outcome(attacker_id, ActionKind::Attack);
        Ok(())
    }

    /// Applies damage to a living actor, resolving its death.
    fn apply_damage(&mut self, target: ActorId, amount: u32, nav: &mut dyn Navigator) {
        let Some(actor) = self.state.actor_mut(target) else {
            return;
        };
        let was_moving = actor.is_moving();
        let outcome = actor.take_damage(amount);
        if outcome.died {
            actor.die();
        }

        self.emit(StateChange::Health {
            actor: target,
            health: outcome.remaining,
        });

        if outcome.died {
            if was_moving {
                nav.cancel(target);
                self.emit(StateChange::Moving {
                    actor: target,
                    moving: false,
                });
            }
            self.emit(Notification::ActorDied { actor: target });
            info!(target: "tactics::action", actor = %target, "actor eliminated");
        }

        self.emit(Notification::HitTaken { actor: target });
    }

    /// Records that `actor` spent an action of `kind` this turn.
    ///
    /// Ignored unless `actor` is the active actor. An attack schedules the
    /// delayed end turn, bound to the current activation.
    pub fn register_action_outcome(&mut self, actor: ActorId, kind: ActionKind) {
        if self.state.turn.phase != Phase::UnitActive
            || self.state.turn.active_actor != Some(actor)
        {
            debug!(
                target: "tactics::action",
                actor = %actor,
                %kind,
                "outcome ignored for inactive actor"
            );
            return;
        }

        if let Some(active) = self.state.actor_mut(actor) {
            active.mark_used(kind);
        }

        if kind == ActionKind::Attack {
            let pending = PendingEndTurn {
                remaining: self.state.rules.post_attack_delay,
                activation: self.state.turn.activation,
            };
            debug!(
                target: "tactics::turn",
                actor = %actor,
                delay = pending.remaining,
                "end turn scheduled"
            );
            self.pending = Some(pending);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::action::{Ack, ActionKind, ActionRequest};
    use crate::config::MatchRules;
    use crate::engine::TurnCoordinator;
    use crate::error::ActionError;
    use crate::event::{MatchEvent, Notification, StateChange};
    use crate::navigation::InstantNavigator;
    use crate::state::{ActorId, Archetype, MatchSetup, Phase, Point, TeamId};

    fn duel() -> TurnCoordinator {
        let mut setup = MatchSetup::new();
        setup.spawn(TeamId::Zero, Archetype::Standard, Point::ground(0.0, 0.0)).unwrap();
        setup.spawn(TeamId::One, Archetype::Standard, Point::ground(1.0, 0.0)).unwrap();
        TurnCoordinator::start_match(setup, MatchRules::default()).unwrap()
    }

    #[test]
    fn attack_emits_notifications_in_order() {
        let mut coordinator = duel();
        let mut nav = InstantNavigator;
        coordinator.drain_events();

        let ack = coordinator.submit(
            ActionRequest::Attack {
                requester: ActorId(1),
                target: ActorId(2),
            },
            &mut nav,
        );
        assert_eq!(ack, Ack::Accepted);

        let events = coordinator.drain_events();
        assert_eq!(
            events,
            vec![
                MatchEvent::Notify(Notification::AttackPerformed {
                    attacker: ActorId(1),
                    target: ActorId(2),
                }),
                MatchEvent::State(StateChange::Health {
                    actor: ActorId(2),
                    health: 9,
                }),
                MatchEvent::Notify(Notification::HitTaken { actor: ActorId(2) }),
            ]
        );
        assert!(coordinator.pending_end_turn().is_some());
    }

    #[test]
    fn second_attack_in_a_turn_is_rejected() {
        let mut coordinator = duel();
        let mut nav = InstantNavigator;
        let attack = ActionRequest::Attack {
            requester: ActorId(1),
            target: ActorId(2),
        };

        assert!(coordinator.submit(attack, &mut nav).is_accepted());
        assert_eq!(
            coordinator.submit(attack, &mut nav),
            Ack::Rejected {
                reason: ActionError::AttackAlreadyUsed
            }
        );
        assert_eq!(coordinator.actor(ActorId(2)).unwrap().health, 9);
    }

    #[test]
    fn requests_from_inactive_units_are_rejected() {
        let mut coordinator = duel();
        let mut nav = InstantNavigator;

        let ack = coordinator.submit(ActionRequest::EndTurn { requester: ActorId(2) }, &mut nav);
        assert_eq!(
            ack.rejection(),
            Some(&ActionError::NotActiveActor {
                requester: ActorId(2)
            })
        );
        assert_eq!(coordinator.active_actor(), Some(ActorId(1)));
    }

    #[test]
    fn outcome_for_non_active_actor_is_ignored() {
        let mut coordinator = duel();

        coordinator.register_action_outcome(ActorId(2), ActionKind::Attack);
        assert!(coordinator.pending_end_turn().is_none());
        assert!(!coordinator.actor(ActorId(2)).unwrap().has_attacked());
        assert_eq!(coordinator.phase(), Phase::UnitActive);
    }
}
