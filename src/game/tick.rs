//! Authoritative Simulation Tick
//!
//! One `tick` call advances the match by `dt` game seconds through a fixed
//! sequence of steps. Each step consumes the previous step's output, so the
//! order below is part of the rules.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, MatchConfig};
use crate::core::hash::StateHash;
use crate::core::vec2::Vec2;
use crate::game::events::{GameEvent, GameEventData};
use crate::game::spatial::ProximityIndex;
use crate::game::state::{GameState, MatchPhase, PlayerId};
use crate::game::{action, boundary, contact, dodgeball, kinematics, penalty, setup, volleyball};

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick
    pub events: Vec<GameEvent>,
    /// Whether the match is over
    pub match_ended: bool,
}

/// Run one simulation tick.
///
/// # Arguments
///
/// * `state` - The match state (will be mutated)
/// * `dt` - Elapsed game seconds
///
/// Nothing happens unless the match is playing. A zero, negative or
/// non-finite `dt` leaves the state untouched.
pub fn tick(state: &mut GameState, dt: f64) -> TickResult {
    let mut result = TickResult::default();

    match state.phase {
        MatchPhase::Waiting => return result,
        MatchPhase::Ended => {
            result.match_ended = true;
            return result;
        }
        MatchPhase::Playing => {}
    }

    if !dt.is_finite() || dt < 0.0 {
        warn!(dt, "rejected tick step");
        return result;
    }
    if dt == 0.0 {
        return result;
    }

    // 1. Advance clock
    advance_clock(state, dt);

    // 2. Index the positions the previous tick left behind. The index is
    // not serialized and the pitch clamp moves entities after step 7, so a
    // restored snapshot and a live match must both start from a fresh build.
    state.proximity = ProximityIndex::build(&state.players, &state.balls);

    // 3. Player velocities, then player-player contact
    kinematics::update_player_velocities(state, dt);
    contact::resolve_player_contacts(state);

    // 4. Ball velocities
    kinematics::update_ball_velocities(state, dt);

    // 5. Integrate positions
    kinematics::integrate_positions(state, dt);

    // 6. Free ways, hoop no-go, revival
    boundary::inbounding_free_way(state, dt);
    boundary::keeper_free_way(state, dt);
    boundary::enforce_hoop_no_go(state);
    volleyball::check_revival(state);

    // 7. Recompute spatial index from corrected positions
    state.proximity = ProximityIndex::build(&state.players, &state.balls);

    // 8. Discrete rules
    kinematics::resolve_ball_collisions(state);
    volleyball::check_possession(state);
    dodgeball::check_interactions(state);
    volleyball::check_goals(state);
    dodgeball::check_third_dodgeball(state, dt);
    penalty::check_delay_of_game(state, dt);

    // 9. Pitch boundary last
    boundary::enforce_pitch_bounds(state);

    #[cfg(feature = "debug-tracing")]
    tracing::trace!(tick = state.tick, hash = %hex::encode(state.compute_hash()), "tick complete");

    result.events = state.take_events();
    result
}

fn advance_clock(state: &mut GameState, dt: f64) {
    state.tick += 1;
    state.game_time += dt;
    if !state.seekers_released && state.game_time >= state.seeker_floor {
        state.seekers_released = true;
        info!(game_time = state.game_time, "seeker floor reached");
        state.push_event(GameEventData::SeekerFloorReached);
    }
}

// =============================================================================
// MATCH
// =============================================================================

/// Rejected player input.
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    /// No player with this id.
    #[error("unknown player: {0:?}")]
    UnknownPlayer(PlayerId),
    /// Direction has a NaN or infinite component.
    #[error("non-finite direction for player {0:?}")]
    NonFiniteDirection(PlayerId),
}

/// A match: the state plus the entry points a host or AI drives it with.
///
/// Cloning yields an independent match suitable for speculative simulation.
#[derive(Clone, Debug)]
pub struct Match {
    state: GameState,
}

impl Match {
    /// Wrap an already populated state.
    pub fn new(state: GameState) -> Self {
        Self { state }
    }

    /// Validate `config`, build the standard roster and start play.
    pub fn from_config(config: &MatchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut state = setup::standard_match(config);
        state.start();
        info!(seed = config.seed, players = state.players.len(), "match started");
        Ok(Self { state })
    }

    /// Advance by `dt` game seconds.
    pub fn update(&mut self, dt: f64) -> TickResult {
        tick(&mut self.state, dt)
    }

    /// Set a player's desired direction. Magnitudes above 1 are allowed and
    /// normalized during the velocity step.
    pub fn set_direction(&mut self, player: PlayerId, direction: Vec2) -> Result<(), InputError> {
        if !direction.is_finite() {
            warn!(player = player.0, "non-finite direction");
            return Err(InputError::NonFiniteDirection(player));
        }
        let Some(p) = self.state.player_mut(player) else {
            warn!(player = player.0, "direction for unknown player");
            return Err(InputError::UnknownPlayer(player));
        };
        p.direction = direction;
        Ok(())
    }

    /// Throw the player's held ball.
    pub fn throw(&mut self, player: PlayerId) -> bool {
        let thrown = action::throw(&mut self.state, player);
        if !thrown {
            debug!(player = player.0, "throw ignored");
        }
        thrown
    }

    /// Tackle an opposing ball carrier in contact.
    pub fn tackle(&mut self, player: PlayerId) -> bool {
        action::tackle(&mut self.state, player)
    }

    /// Events recorded by actions since the last update.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        self.state.take_events()
    }

    /// Current state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Mutable state, for custom setups and AI writes.
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    /// Consume the match, returning its state.
    pub fn into_state(self) -> GameState {
        self.state
    }

    /// Score per team.
    pub fn score(&self) -> [u32; 2] {
        self.state.score
    }

    /// Hash of the current state.
    pub fn compute_hash(&self) -> StateHash {
        self.state.compute_hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{BallTuning, Pitch, PlayerRole, PlayerTuning, Team};

    fn started() -> Match {
        Match::from_config(&MatchConfig::default()).unwrap()
    }

    #[test]
    fn test_tick_determinism() {
        let mut a = started();
        let mut b = started();
        for t in 0..200u32 {
            for id in 0..a.state().players.len() as u16 {
                let dir = Vec2::new(((t + id as u32) % 7) as f64 - 3.0, (id % 3) as f64 - 1.0);
                a.set_direction(PlayerId(id), dir).unwrap();
                b.set_direction(PlayerId(id), dir).unwrap();
            }
            a.update(0.15);
            b.update(0.15);
        }
        assert_eq!(a.state().tick, 200);
        assert_eq!(a.compute_hash(), b.compute_hash());
    }

    #[test]
    fn test_clone_evolves_independently() {
        let mut live = started();
        live.update(0.15);
        let mut fork = live.clone();
        fork.set_direction(PlayerId(0), Vec2::new(1.0, 0.0)).unwrap();
        for _ in 0..10 {
            fork.update(0.15);
        }
        let before = live.compute_hash();
        assert_ne!(fork.compute_hash(), before);
        assert_eq!(live.state().tick, 1);
        assert_eq!(live.compute_hash(), before);
    }

    #[test]
    fn test_zero_and_invalid_dt_noop() {
        let mut m = started();
        m.set_direction(PlayerId(0), Vec2::new(1.0, 0.0)).unwrap();
        m.update(0.15);
        let before = m.compute_hash();
        m.update(0.0);
        m.update(-1.0);
        m.update(f64::NAN);
        assert_eq!(m.compute_hash(), before);
    }

    #[test]
    fn test_waiting_match_does_not_tick() {
        let mut state = GameState::new(Pitch::standard(), 1);
        state.add_player(Team::Left, PlayerRole::Chaser, Vec2::new(10.0, 10.0), PlayerTuning::default());
        let mut m = Match::new(state);
        let result = m.update(0.15);
        assert!(!result.match_ended);
        assert_eq!(m.state().tick, 0);

        m.state_mut().phase = MatchPhase::Ended;
        assert!(m.update(0.15).match_ended);
    }

    #[test]
    fn test_set_direction_validation() {
        let mut m = started();
        assert_eq!(
            m.set_direction(PlayerId(500), Vec2::RIGHT),
            Err(InputError::UnknownPlayer(PlayerId(500)))
        );
        assert_eq!(
            m.set_direction(PlayerId(0), Vec2::new(f64::INFINITY, 0.0)),
            Err(InputError::NonFiniteDirection(PlayerId(0)))
        );
        assert!(m.set_direction(PlayerId(0), Vec2::new(2.0, 2.0)).is_ok());
        assert_eq!(m.state().player(PlayerId(0)).unwrap().direction, Vec2::new(2.0, 2.0));
    }

    #[test]
    fn test_seeker_floor_fires_once() {
        let mut state = GameState::new(Pitch::standard(), 1);
        state.seeker_floor = 0.3;
        state.start();
        let mut m = Match::new(state);
        let mut fired = 0;
        for _ in 0..5 {
            fired += m
                .update(0.15)
                .events
                .iter()
                .filter(|e| e.data == GameEventData::SeekerFloorReached)
                .count();
        }
        assert_eq!(fired, 1);
        assert!(m.state().seekers_released);
    }

    #[test]
    fn test_knocked_out_player_walks_home_and_recovers() {
        let mut state = GameState::new(Pitch::standard(), 1);
        state.add_hoop(Team::Left, Vec2::new(13.5, 16.5), 0.43, 0.1);
        let p = state.add_player(Team::Left, PlayerRole::Beater, Vec2::new(16.0, 16.5), PlayerTuning::default());
        state.add_volleyball(Vec2::new(30.0, 16.5), BallTuning::volleyball());
        state.players.get_mut(&p).unwrap().knocked_out = true;
        state.start();
        let mut m = Match::new(state);
        m.set_direction(p, Vec2::RIGHT).unwrap();

        let mut recovered = false;
        for _ in 0..60 {
            let result = m.update(0.15);
            if result.events.iter().any(|e| matches!(e.data, GameEventData::Recovered { .. })) {
                recovered = true;
                break;
            }
        }
        assert!(recovered);
        assert!(m.state().player(p).unwrap().position.x < 16.0);
    }
}
