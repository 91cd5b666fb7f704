//! Core primitives.
//!
//! Value types shared by every game module: the 2D vector, the seeded
//! generator used for tie-breaking, and the state hasher.

pub mod vec2;
pub mod rng;
pub mod hash;

// Re-export core types
pub use vec2::Vec2;
pub use rng::DeterministicRng;
pub use hash::{compute_state_hash, StateHash, StateHasher};
