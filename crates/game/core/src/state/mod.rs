//! Match data model: actors, rosters, obstacle geometry and turn state.

mod actor;
mod common;
mod turn;

use std::collections::BTreeMap;

pub use actor::{ActionFlags, ActorState, Archetype, DamageOutcome, UnitStats};
pub use common::{ActorId, Point, TeamId};
pub use turn::{MatchResult, Phase, TurnState};

use crate::config::MatchRules;
use crate::error::SetupError;
use crate::validator::Obstacle;

/// Output of the roster/setup step: the two rosters and the arena geometry.
///
/// Built once before `start_match`; membership is fixed for the match.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchSetup {
    pub teams: [Vec<ActorState>; 2],
    pub obstacles: Vec<Obstacle>,
    next_id: u32,
}

impl MatchSetup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a unit of `archetype` to `team` and returns its handle.
    ///
    /// Fails with [`SetupError::IdsExhausted`] once every handle has been
    /// handed out.
    pub fn spawn(
        &mut self,
        team: TeamId,
        archetype: Archetype,
        position: Point,
    ) -> Result<ActorId, SetupError> {
        let id = self.allocate_id()?;
        self.teams[team.index()].push(ActorState::new(id, team, archetype, position));
        Ok(id)
    }

    /// Adds a pre-built actor. Its id must not collide with spawned ones.
    pub fn insert(&mut self, actor: ActorState) -> ActorId {
        let id = actor.id;
        self.next_id = self.next_id.max(id.0.saturating_add(1));
        self.teams[actor.team.index()].push(actor);
        id
    }

    pub fn obstacle(&mut self, obstacle: Obstacle) -> &mut Self {
        self.obstacles.push(obstacle);
        self
    }

    fn allocate_id(&mut self) -> Result<ActorId, SetupError> {
        // Ids start at 1 so a zeroed handle never names a unit.
        let id = self.next_id.max(1);
        self.next_id = id.checked_add(1).ok_or(SetupError::IdsExhausted)?;
        Ok(ActorId(id))
    }
}

/// Complete authoritative state of a running match.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchState {
    pub rules: MatchRules,
    /// Actor registry. Eliminated actors stay as tombstones with zero health.
    pub actors: BTreeMap<ActorId, ActorState>,
    /// Roster order per team; fixed for the match.
    pub teams: [Vec<ActorId>; 2],
    pub obstacles: Vec<Obstacle>,
    pub turn: TurnState,
}

impl MatchState {
    pub fn actor(&self, id: ActorId) -> Option<&ActorState> {
        self.actors.get(&id)
    }

    pub(crate) fn actor_mut(&mut self, id: ActorId) -> Option<&mut ActorState> {
        self.actors.get_mut(&id)
    }

    /// Resolves `id` only if it names a living actor.
    pub fn living_actor(&self, id: ActorId) -> Option<&ActorState> {
        self.actor(id).filter(|actor| actor.is_alive())
    }

    pub fn roster(&self, team: TeamId) -> &[ActorId] {
        &self.teams[team.index()]
    }

    /// Living members of `team`, in roster order.
    pub fn living(&self, team: TeamId) -> impl Iterator<Item = &ActorState> + '_ {
        self.roster(team)
            .iter()
            .filter_map(|id| self.living_actor(*id))
    }

    pub fn alive_count(&self, team: TeamId) -> usize {
        self.living(team).count()
    }

    pub fn active_actor(&self) -> Option<&ActorState> {
        self.turn.active_actor.and_then(|id| self.actor(id))
    }
}
