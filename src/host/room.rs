//! Match Room
//!
//! Runs one match inside a tokio task. Commands arrive over an mpsc channel
//! and are applied between ticks; every tick broadcasts a `RoomUpdate`.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::{ConfigError, MatchConfig};
use crate::core::vec2::Vec2;
use crate::game::events::GameEvent;
use crate::game::state::{GameState, PlayerId};
use crate::game::tick::Match;

/// Command channel depth.
const COMMAND_BUFFER: usize = 256;

/// Update broadcast depth. Slow subscribers lag rather than stall the room.
const UPDATE_BUFFER: usize = 64;

/// Host errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HostError {
    /// The room task has stopped.
    #[error("room closed")]
    Closed,
}

/// Input for a running room.
#[derive(Clone, Debug, PartialEq)]
pub enum RoomCommand {
    /// Set a player's desired direction.
    SetDirection {
        /// Target player
        player: PlayerId,
        /// Desired direction
        direction: Vec2,
    },
    /// Throw the player's held ball.
    Throw(PlayerId),
    /// Tackle an opposing carrier in contact.
    Tackle(PlayerId),
    /// Stop the room after pending commands.
    Shutdown,
}

/// Broadcast after every tick.
#[derive(Clone, Debug)]
pub struct RoomUpdate {
    /// Tick just completed
    pub tick: u64,
    /// Score per team
    pub score: [u32; 2],
    /// Events from this tick, including actions applied before it
    pub events: Vec<GameEvent>,
    /// Full state after the tick
    pub snapshot: GameState,
}

/// Cloneable handle to a running room.
#[derive(Clone, Debug)]
pub struct RoomHandle {
    commands: mpsc::Sender<RoomCommand>,
    updates: broadcast::Sender<RoomUpdate>,
}

impl RoomHandle {
    /// Queue a command for the room.
    pub async fn send(&self, command: RoomCommand) -> Result<(), HostError> {
        self.commands.send(command).await.map_err(|_| HostError::Closed)
    }

    /// Set a player's desired direction.
    pub async fn set_direction(&self, player: PlayerId, direction: Vec2) -> Result<(), HostError> {
        self.send(RoomCommand::SetDirection { player, direction }).await
    }

    /// Ask the room to stop.
    pub async fn shutdown(&self) -> Result<(), HostError> {
        self.send(RoomCommand::Shutdown).await
    }

    /// Receive updates from the next tick on.
    pub fn subscribe(&self) -> broadcast::Receiver<RoomUpdate> {
        self.updates.subscribe()
    }
}

/// A match driven at a fixed real-time rate.
pub struct Room {
    game: Match,
    period: Duration,
    dt: f64,
    commands: mpsc::Receiver<RoomCommand>,
    updates: broadcast::Sender<RoomUpdate>,
}

impl Room {
    /// Wrap a started match. `tick_rate` is host ticks per real second and
    /// `dt` the game seconds simulated per tick.
    pub fn new(game: Match, tick_rate: u32, dt: f64) -> (Self, RoomHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (update_tx, _) = broadcast::channel(UPDATE_BUFFER);
        let room = Self {
            game,
            period: Duration::from_micros(1_000_000 / tick_rate.max(1) as u64),
            dt,
            commands: command_rx,
            updates: update_tx.clone(),
        };
        let handle = RoomHandle {
            commands: command_tx,
            updates: update_tx,
        };
        (room, handle)
    }

    /// Build the standard match from `config` and spawn its room task.
    ///
    /// The task resolves to the final match once the room stops.
    pub fn spawn(config: &MatchConfig) -> Result<(RoomHandle, JoinHandle<Match>), ConfigError> {
        let game = Match::from_config(config)?;
        let (room, handle) = Room::new(game, config.tick_rate, config.dt());
        Ok((handle, tokio::spawn(room.run())))
    }

    /// Tick until shut down, every handle is dropped, or the match ends.
    pub async fn run(mut self) -> Match {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(period_us = self.period.as_micros() as u64, dt = self.dt, "room started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.step() {
                        break;
                    }
                }
                command = self.commands.recv() => match command {
                    Some(RoomCommand::Shutdown) | None => break,
                    Some(command) => self.apply(command),
                },
            }
        }

        info!(tick = self.game.state().tick, score = ?self.game.score(), "room stopped");
        self.game
    }

    fn apply(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::SetDirection { player, direction } => {
                // Rejections are logged by the match.
                let _ = self.game.set_direction(player, direction);
            }
            RoomCommand::Throw(player) => {
                self.game.throw(player);
            }
            RoomCommand::Tackle(player) => {
                self.game.tackle(player);
            }
            RoomCommand::Shutdown => {}
        }
    }

    /// Run one tick and broadcast it. Returns true once the match is over.
    fn step(&mut self) -> bool {
        let result = self.game.update(self.dt);
        let state = self.game.state();
        let update = RoomUpdate {
            tick: state.tick,
            score: state.score,
            events: result.events,
            snapshot: state.clone(),
        };
        if self.updates.send(update).is_err() {
            debug!(tick = state.tick, "no subscribers");
        }
        result.match_ended
    }
}
