//! Match Configuration
//!
//! Every tuning constant of a match in one serde struct. Partial JSON files
//! override individual values; the rest keep their defaults. Speeds are in
//! game units, already divided by the game-time ratio.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::state::{BallTuning, DelayOfGameRules, PlayerRole, PlayerTuning, ScoringRules};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// Config is not valid JSON for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// Environment override is malformed.
    #[error("invalid environment variable {name}: {value}")]
    Env {
        /// Variable name
        name: &'static str,
        /// Rejected value
        value: String,
    },
    /// A parameter is out of range.
    #[error("invalid parameter: {0}")]
    Invalid(String),
}

/// Pitch and hoop geometry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchConfig {
    /// Extent along x
    pub length: f64,
    /// Extent along y
    pub width: f64,
    /// Keeper-zone line distance from each end
    pub keeper_zone: f64,
    /// Hoop line distance from each end
    pub hoop_x: f64,
    /// Distance between neighbouring hoops
    pub hoop_spacing: f64,
    /// Inner hoop radius
    pub hoop_radius: f64,
    /// Hoop ring thickness
    pub hoop_thickness: f64,
}

impl Default for PitchConfig {
    fn default() -> Self {
        Self {
            length: 60.0,
            width: 33.0,
            keeper_zone: 19.0,
            hoop_x: 13.5,
            hoop_spacing: 2.75,
            hoop_radius: 0.86 / 2.0,
            hoop_thickness: 0.1,
        }
    }
}

/// Per-role player tuning.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleTuning {
    /// Keepers
    pub keeper: PlayerTuning,
    /// Chasers
    pub chaser: PlayerTuning,
    /// Beaters
    pub beater: PlayerTuning,
    /// Seekers
    pub seeker: PlayerTuning,
}

impl RoleTuning {
    /// Tuning for `role`.
    pub fn for_role(&self, role: PlayerRole) -> PlayerTuning {
        match role {
            PlayerRole::Keeper => self.keeper,
            PlayerRole::Chaser => self.chaser,
            PlayerRole::Beater => self.beater,
            PlayerRole::Seeker => self.seeker,
        }
    }
}

/// Players per team by role.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// Chasers per team
    pub chasers: u16,
    /// Keepers per team
    pub keepers: u16,
    /// Beaters per team
    pub beaters: u16,
    /// Spawn distance from each end line
    pub spawn_x: f64,
    /// Spawn spacing along y
    pub spawn_spacing: f64,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            chasers: 3,
            keepers: 1,
            beaters: 2,
            spawn_x: 5.0,
            spawn_spacing: 1.5,
        }
    }
}

/// Complete match configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// RNG seed
    pub seed: u64,
    /// Host ticks per real second
    pub tick_rate: u32,
    /// Game seconds per real second
    pub game_time_ratio: f64,
    /// Pitch geometry
    pub pitch: PitchConfig,
    /// Roster layout
    pub roster: RosterConfig,
    /// Player tuning by role
    pub players: RoleTuning,
    /// Volleyball constants
    pub volleyball: BallTuning,
    /// Dodgeball constants
    pub dodgeball: BallTuning,
    /// Free speed below which a dodgeball turns neutral
    pub dodgeball_dead_speed: f64,
    /// Dodgeball spawn y of the midline ball
    pub dodgeball_start_y: f64,
    /// Delay-of-game thresholds
    pub delay_of_game: DelayOfGameRules,
    /// Seconds an advantaged team's throw has to beat someone
    pub beat_attempt_time_limit: f64,
    /// Goal value and credit
    pub scoring: ScoringRules,
    /// Game seconds before seekers may enter
    pub seeker_floor: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            tick_rate: crate::DEFAULT_TICK_RATE,
            game_time_ratio: 3.0,
            pitch: PitchConfig::default(),
            roster: RosterConfig::default(),
            players: RoleTuning::default(),
            volleyball: BallTuning::volleyball(),
            dodgeball: BallTuning::dodgeball(),
            dodgeball_dead_speed: 4.0 / 3.0,
            dodgeball_start_y: 8.25,
            delay_of_game: DelayOfGameRules::default(),
            beat_attempt_time_limit: 5.0,
            scoring: ScoringRules::default(),
            seeker_floor: 20.0 * 60.0 / 3.0,
        }
    }
}

impl MatchConfig {
    /// Parse from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Apply `QUADBALL_SEED` and `QUADBALL_TICK_RATE` overrides.
    pub fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(value) = std::env::var("QUADBALL_SEED") {
            self.seed = value
                .parse()
                .map_err(|_| ConfigError::Env { name: "QUADBALL_SEED", value })?;
        }
        if let Ok(value) = std::env::var("QUADBALL_TICK_RATE") {
            self.tick_rate = value
                .parse()
                .map_err(|_| ConfigError::Env { name: "QUADBALL_TICK_RATE", value })?;
        }
        Ok(self)
    }

    /// Game seconds per host tick.
    pub fn dt(&self) -> f64 {
        self.game_time_ratio / self.tick_rate as f64
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.tick_rate == 0 {
            return invalid("tick_rate must be positive".into());
        }
        if !(self.game_time_ratio > 0.0) {
            return invalid(format!("game_time_ratio must be positive, got {}", self.game_time_ratio));
        }
        let p = &self.pitch;
        if !(p.length > 0.0 && p.width > 0.0) {
            return invalid(format!("pitch must have positive size, got {}x{}", p.length, p.width));
        }
        if !(p.keeper_zone > 0.0 && p.keeper_zone < p.length / 2.0) {
            return invalid(format!("keeper_zone {} outside pitch half", p.keeper_zone));
        }
        if !(p.hoop_x > 0.0 && p.hoop_x < p.length / 2.0) || !(p.hoop_radius > 0.0) {
            return invalid("hoop geometry outside pitch".into());
        }

        for role in [PlayerRole::Keeper, PlayerRole::Chaser, PlayerRole::Beater, PlayerRole::Seeker] {
            let t = self.players.for_role(role);
            if !(t.radius > 0.0) {
                return invalid(format!("{role:?} radius must be positive"));
            }
            if !(t.max_speed > 0.0 && t.throw_speed > 0.0 && t.acceleration > 0.0) {
                return invalid(format!("{role:?} speeds must be positive"));
            }
        }
        for (name, ball) in [("volleyball", &self.volleyball), ("dodgeball", &self.dodgeball)] {
            if !(ball.radius > 0.0) {
                return invalid(format!("{name} radius must be positive"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        let config = MatchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_rate, 20);
        assert!((config.dt() - 0.15).abs() < 1e-12);
        assert_eq!(config.seeker_floor, 400.0);
    }

    #[test]
    fn test_partial_json_overrides() {
        let config = MatchConfig::from_json_str(
            r#"{ "seed": 42, "pitch": { "length": 80.0 }, "players": { "beater": { "max_speed": 1.5 } } }"#,
        )
        .unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.pitch.length, 80.0);
        assert_eq!(config.pitch.width, 33.0);
        assert_eq!(config.players.beater.max_speed, 1.5);
        assert_eq!(config.players.beater.radius, 0.3);
        assert_eq!(config.players.chaser.max_speed, 1.0);
    }

    #[test]
    fn test_validation_rejects() {
        let mut config = MatchConfig::default();
        config.tick_rate = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = MatchConfig::default();
        config.players.keeper.radius = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = MatchConfig::default();
        config.pitch.keeper_zone = 40.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(MatchConfig::from_json_str("{ seed: }"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_role_lookup() {
        let mut roles = RoleTuning::default();
        roles.keeper.max_speed = 2.0;
        assert_eq!(roles.for_role(PlayerRole::Keeper).max_speed, 2.0);
        assert_eq!(roles.for_role(PlayerRole::Chaser).max_speed, 1.0);
    }
}
