//! Asynchronous abstraction for sourcing team intent.
//!
//! Observers plug in [`ActionProvider`] implementations so a team can be
//! driven by human input, scripted fixtures, or AI policies. Providers only
//! ever see the observer's replica; the server decides what actually happens.
use async_trait::async_trait;
use tactics_core::{ActionRequest, ActorId};

use super::errors::Result;
use crate::replication::ObserverReplica;

/// What the owning observer knows about the current activation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnContext {
    pub actor: ActorId,
    pub moved: bool,
    pub attacked: bool,
}

impl TurnContext {
    pub fn new(actor: ActorId) -> Self {
        Self {
            actor,
            moved: false,
            attacked: false,
        }
    }

    pub fn is_spent(&self) -> bool {
        self.moved && self.attacked
    }
}

/// Trait for providing the next request of an active unit.
#[async_trait]
pub trait ActionProvider: Send + Sync {
    async fn provide_action(
        &self,
        turn: &TurnContext,
        view: &ObserverReplica,
    ) -> Result<ActionRequest>;
}

/// A provider that always ends the turn immediately.
pub struct PassProvider;

#[async_trait]
impl ActionProvider for PassProvider {
    async fn provide_action(
        &self,
        turn: &TurnContext,
        _view: &ObserverReplica,
    ) -> Result<ActionRequest> {
        Ok(ActionRequest::EndTurn {
            requester: turn.actor,
        })
    }
}

/// Scripted skirmisher: shoot the nearest visible enemy, otherwise close in.
pub struct SkirmishProvider;

impl SkirmishProvider {
    /// Minimum step worth walking, in world units.
    const MIN_STEP: f32 = 0.05;

    fn decide(turn: &TurnContext, view: &ObserverReplica) -> ActionRequest {
        let pass = ActionRequest::EndTurn {
            requester: turn.actor,
        };
        let Some(me) = view.actor(turn.actor) else {
            return pass;
        };

        if !turn.attacked
            && let Some(&target) = view.visible_enemies(me.id).first()
        {
            return ActionRequest::Attack {
                requester: me.id,
                target,
            };
        }

        if turn.moved {
            return pass;
        }

        let nearest = view
            .living(me.team.other())
            .into_iter()
            .min_by(|a, b| {
                me.position
                    .distance(a.position)
                    .total_cmp(&me.position.distance(b.position))
            });
        let Some(enemy) = nearest else {
            return pass;
        };

        // Stop comfortably inside attack range, never past the budget.
        let budget = view.rules().move_budget(me.stats.move_range) * 0.95;
        let gap = me.position.distance(enemy.position) - me.stats.attack_range as f32 * 0.5;
        let step = gap.min(budget);
        if step < Self::MIN_STEP {
            return pass;
        }

        ActionRequest::Move {
            requester: me.id,
            target: me.position.move_towards(enemy.position, step),
        }
    }
}

#[async_trait]
impl ActionProvider for SkirmishProvider {
    async fn provide_action(
        &self,
        turn: &TurnContext,
        view: &ObserverReplica,
    ) -> Result<ActionRequest> {
        Ok(Self::decide(turn, view))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replication::{ActorProfile, FieldUpdate, ReplicationSnapshot};
    use tactics_core::{Archetype, MatchRules, Point, StateChange, TeamId};

    fn view(enemy_at: Point) -> ObserverReplica {
        let profile = |id, team| ActorProfile {
            id: ActorId(id),
            team,
            archetype: Archetype::Standard,
            stats: Archetype::Standard.stats(),
        };
        ObserverReplica::from_snapshot(&ReplicationSnapshot {
            rules: MatchRules::default(),
            roster: vec![profile(1, TeamId::Zero), profile(2, TeamId::One)],
            obstacles: Vec::new(),
            fields: vec![
                FieldUpdate {
                    version: 1,
                    change: StateChange::Position {
                        actor: ActorId(1),
                        position: Point::ORIGIN,
                    },
                },
                FieldUpdate {
                    version: 1,
                    change: StateChange::Position {
                        actor: ActorId(2),
                        position: enemy_at,
                    },
                },
            ],
        })
    }

    #[tokio::test]
    async fn attacks_adjacent_enemy() {
        let request = SkirmishProvider
            .provide_action(&TurnContext::new(ActorId(1)), &view(Point::ground(1.0, 0.0)))
            .await
            .unwrap();

        assert_eq!(
            request,
            ActionRequest::Attack {
                requester: ActorId(1),
                target: ActorId(2),
            }
        );
    }

    #[tokio::test]
    async fn approaches_within_budget() {
        let request = SkirmishProvider
            .provide_action(&TurnContext::new(ActorId(1)), &view(Point::ground(10.0, 0.0)))
            .await
            .unwrap();

        let ActionRequest::Move { target, .. } = request else {
            panic!("expected a move, got {request:?}");
        };
        assert!(target.distance(Point::ORIGIN) <= 3.0);
        assert!(target.x > 2.5);
    }

    #[tokio::test]
    async fn passes_once_both_actions_are_spent() {
        let turn = TurnContext {
            actor: ActorId(1),
            moved: true,
            attacked: true,
        };
        let request = SkirmishProvider
            .provide_action(&turn, &view(Point::ground(1.0, 0.0)))
            .await
            .unwrap();

        assert_eq!(request, ActionRequest::EndTurn { requester: ActorId(1) });
        assert!(turn.is_spent());
    }
}
