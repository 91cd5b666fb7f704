//! Match Hosting
//!
//! Async wrapper that drives matches in real time. This layer is
//! **non-deterministic**; all rules run through `game/`.

pub mod room;

pub use room::{HostError, Room, RoomCommand, RoomHandle, RoomUpdate};
