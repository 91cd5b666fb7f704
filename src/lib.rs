//! # Quadball Core
//!
//! Server-authoritative simulation of a quadball match: movement, contact,
//! possession, scoring, knockouts, restarts and penalties.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       QUADBALL CORE                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Primitives                                │
//! │  ├── vec2.rs     - 2D f64 vector                             │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  game/           - Match rules (deterministic)               │
//! │  ├── state.rs    - Players, balls, hoops, pitch, rules       │
//! │  ├── spatial.rs  - Pairwise distance index                   │
//! │  ├── kinematics.rs - Steering, drag, integration             │
//! │  ├── contact.rs  - Player contact and tackles                │
//! │  ├── volleyball.rs - Possession, goals, revival              │
//! │  ├── dodgeball.rs  - Beats, third-dodgeball rule             │
//! │  ├── boundary.rs - Bounds, hoop no-go, inbounding            │
//! │  ├── penalty.rs  - Delay of game, turnovers, interference    │
//! │  ├── action.rs   - Throw and tackle                          │
//! │  ├── setup.rs    - Standard match layout                     │
//! │  ├── snapshot.rs - Save and restore                          │
//! │  └── tick.rs     - Authoritative simulation loop             │
//! │                                                              │
//! │  config.rs       - Match configuration                       │
//! │                                                              │
//! │  host/           - Real-time hosting (non-deterministic)     │
//! │  └── room.rs     - One match per tokio task                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are deterministic:
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies
//! - All randomness from the seeded Xorshift128+ carried in the state
//! - Every step runs in a fixed order on one thread
//!
//! Given identical configuration and inputs, two matches produce identical
//! state hashes. A cloned match shares nothing with its source.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod game;
pub mod host;

// Re-export commonly used types
pub use config::{ConfigError, MatchConfig};
pub use core::rng::DeterministicRng;
pub use core::vec2::Vec2;
pub use game::events::{GameEvent, GameEventData};
pub use game::state::{BallId, GameState, PlayerId, PlayerRole, Team};
pub use game::tick::{Match, TickResult};
pub use host::{Room, RoomHandle};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default host tick rate (Hz)
pub const DEFAULT_TICK_RATE: u32 = 20;
