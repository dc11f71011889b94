//! Runtime configuration structures and loaders.

use std::env;
use std::time::Duration;

use tactics_core::{MatchRules, TimerScope};

/// How the server worker advances simulated time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TickMode {
    /// Tick on a wall-clock interval.
    #[default]
    Realtime,
    /// Tick only when a client calls [`RuntimeHandle::advance`]. Used by
    /// tests and tools that need deterministic time.
    ///
    /// [`RuntimeHandle::advance`]: crate::RuntimeHandle::advance
    Manual,
}

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub match_rules: MatchRules,
    pub tick_mode: TickMode,
    pub tick_interval: Duration,
    pub command_buffer_size: usize,
    pub event_buffer_size: usize,
    /// Walking speed of the default navigator, in world units per second.
    pub walk_speed: f32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            match_rules: MatchRules::default(),
            tick_mode: TickMode::Realtime,
            tick_interval: Duration::from_millis(100),
            command_buffer_size: 32,
            event_buffer_size: 256,
            walk_speed: 4.0,
        }
    }
}

impl RuntimeConfig {
    /// Configuration for deterministic, manually stepped runs.
    pub fn manual() -> Self {
        Self {
            tick_mode: TickMode::Manual,
            ..Self::default()
        }
    }

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `TACTICS_TURN_TIME` - Seconds per turn (default: 60)
    /// - `TACTICS_TILE_SIZE` - World units per movement tile (default: 1)
    /// - `TACTICS_ATTACK_DAMAGE` - Damage per successful attack (default: 1)
    /// - `TACTICS_POST_ATTACK_DELAY` - Seconds before an attack ends the turn (default: 1)
    /// - `TACTICS_UNLIMITED_MOVEMENT` - Lift the movement budget (default: false)
    /// - `TACTICS_TIMER_SCOPE` - `unit` or `team` (default: unit)
    /// - `TACTICS_END_TURN_WHEN_NO_TARGETS` - Auto end turn after an idle move (default: true)
    /// - `TACTICS_TICK_MS` - Tick interval in milliseconds (default: 100)
    /// - `TACTICS_MANUAL_TICK` - Only tick on demand (default: false)
    /// - `TACTICS_COMMAND_BUFFER` - Command queue size (default: 32)
    /// - `TACTICS_EVENT_BUFFER` - Per-topic broadcast capacity (default: 256)
    /// - `TACTICS_WALK_SPEED` - Navigator speed in units per second (default: 4)
    pub fn from_env() -> Self {
        let mut config = Self::default();
        let rules = &mut config.match_rules;

        if let Some(seconds) = read_env::<f32>("TACTICS_TURN_TIME")
            && seconds > 0.0
        {
            rules.turn_time = seconds;
        }
        if let Some(size) = read_env::<f32>("TACTICS_TILE_SIZE")
            && size > 0.0
        {
            rules.tile_size = size;
        }
        if let Some(damage) = read_env::<u32>("TACTICS_ATTACK_DAMAGE") {
            rules.attack_damage = damage;
        }
        if let Some(delay) = read_env::<f32>("TACTICS_POST_ATTACK_DELAY") {
            rules.post_attack_delay = delay.max(0.0);
        }
        if let Some(unlimited) = read_env_bool("TACTICS_UNLIMITED_MOVEMENT") {
            rules.unlimited_movement = unlimited;
        }
        if let Some(scope) = read_env::<TimerScope>("TACTICS_TIMER_SCOPE") {
            rules.timer_scope = scope;
        }
        if let Some(enabled) = read_env_bool("TACTICS_END_TURN_WHEN_NO_TARGETS") {
            rules.end_turn_when_no_targets = enabled;
        }

        if let Some(millis) = read_env::<u64>("TACTICS_TICK_MS") {
            config.tick_interval = Duration::from_millis(millis.max(1));
        }
        if let Some(true) = read_env_bool("TACTICS_MANUAL_TICK") {
            config.tick_mode = TickMode::Manual;
        }
        if let Some(capacity) = read_env::<usize>("TACTICS_COMMAND_BUFFER") {
            config.command_buffer_size = capacity.max(1);
        }
        if let Some(capacity) = read_env::<usize>("TACTICS_EVENT_BUFFER") {
            config.event_buffer_size = capacity.max(1);
        }
        if let Some(speed) = read_env::<f32>("TACTICS_WALK_SPEED")
            && speed > 0.0
        {
            config.walk_speed = speed;
        }

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

fn read_env_bool(key: &str) -> Option<bool> {
    match env::var(key).ok()?.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
