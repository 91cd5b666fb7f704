//! Game Logic Module
//!
//! All match simulation code. Deterministic given the seed and inputs.
//!
//! ## Module Structure
//!
//! - `state`: Match state, players, balls, hoops, rule parameters
//! - `spatial`: Per-tick pairwise distance index
//! - `kinematics`: Steering, ball drag, integration, ball-ball bounces
//! - `contact`: Player-player contact and tackles
//! - `volleyball`: Possession, goals, revival
//! - `dodgeball`: Pickups, beats, third-dodgeball reservation
//! - `boundary`: Pitch bounds, hoop no-go, inbounding, free ways
//! - `penalty`: Delay of game, turnovers, interference
//! - `action`: Throw and tackle requests
//! - `setup`: Standard match layout
//! - `snapshot`: Save and restore
//! - `tick`: Authoritative simulation loop and the `Match` facade
//! - `events`: Game events for hosts and replays

pub mod state;
pub mod events;
pub mod spatial;
pub mod kinematics;
pub mod contact;
pub mod volleyball;
pub mod dodgeball;
pub mod boundary;
pub mod penalty;
pub mod action;
pub mod setup;
pub mod snapshot;
pub mod tick;

// Re-export key types
pub use events::{GameEvent, GameEventData};
pub use snapshot::SnapshotError;
pub use state::{
    Ball, BallId, BallKind, GameState, Hoop, HoopId, MatchPhase, Pitch, Player, PlayerId, PlayerRole, Team,
};
pub use tick::{InputError, Match, TickResult};
