use crate::error::SetupError;

/// How the per-turn timer is scoped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(ascii_case_insensitive)]
pub enum TimerScope {
    /// The timer resets on every unit activation; expiry ends that unit's turn.
    #[default]
    #[strum(to_string = "per-unit", serialize = "unit")]
    PerUnit,
    /// The timer resets only when the active team switches; expiry forfeits
    /// the remainder of the team's phase.
    #[strum(to_string = "per-team", serialize = "team")]
    PerTeam,
}

/// Match configuration supplied at `start_match` time.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchRules {
    /// Turn duration in seconds.
    pub turn_time: f32,
    /// Grid tile size used to convert `move_range` into distance.
    pub tile_size: f32,
    /// Lifts the movement budget entirely. Nothing enables it automatically.
    pub unlimited_movement: bool,
    /// Damage applied by a successful attack.
    pub attack_damage: u32,
    /// Seconds between a successful attack and the automatic end of the turn.
    pub post_attack_delay: f32,
    /// Vertical offset of the line-of-sight segment ("eye/weapon height").
    pub eye_height: f32,
    pub timer_scope: TimerScope,
    /// End the turn once a unit finishes moving with no attackable enemy.
    pub end_turn_when_no_targets: bool,
}

impl MatchRules {
    pub const DEFAULT_TURN_TIME: f32 = 60.0;
    pub const DEFAULT_TILE_SIZE: f32 = 1.0;
    pub const DEFAULT_ATTACK_DAMAGE: u32 = 1;
    pub const DEFAULT_POST_ATTACK_DELAY: f32 = 1.0;
    pub const DEFAULT_EYE_HEIGHT: f32 = 1.0;

    pub fn new() -> Self {
        Self {
            turn_time: Self::DEFAULT_TURN_TIME,
            tile_size: Self::DEFAULT_TILE_SIZE,
            unlimited_movement: false,
            attack_damage: Self::DEFAULT_ATTACK_DAMAGE,
            post_attack_delay: Self::DEFAULT_POST_ATTACK_DELAY,
            eye_height: Self::DEFAULT_EYE_HEIGHT,
            timer_scope: TimerScope::PerUnit,
            end_turn_when_no_targets: true,
        }
    }

    pub fn with_turn_time(turn_time: f32) -> Self {
        Self {
            turn_time,
            ..Self::new()
        }
    }

    /// Maximum distance a unit with `move_range` tiles may travel.
    pub fn move_budget(&self, move_range: u32) -> f32 {
        if self.unlimited_movement {
            f32::INFINITY
        } else {
            move_range as f32 * self.tile_size
        }
    }

    pub(crate) fn validate(&self) -> Result<(), SetupError> {
        if !(self.turn_time.is_finite() && self.turn_time > 0.0) {
            return Err(SetupError::InvalidRules {
                reason: "turn time must be a positive number of seconds",
            });
        }
        if !(self.tile_size.is_finite() && self.tile_size > 0.0) {
            return Err(SetupError::InvalidRules {
                reason: "tile size must be positive",
            });
        }
        if !(self.post_attack_delay.is_finite() && self.post_attack_delay >= 0.0) {
            return Err(SetupError::InvalidRules {
                reason: "post-attack delay must not be negative",
            });
        }
        Ok(())
    }
}

impl Default for MatchRules {
    fn default() -> Self {
        Self::new()
    }
}
