//! Game Events
//!
//! Rule transitions recorded during a tick, in the order the pipeline
//! produced them. Hosts forward them to clients; tests assert on them.

use serde::{Serialize, Deserialize};
use crate::core::vec2::Vec2;
use crate::game::state::{BallId, HoopId, PlayerId, Team};

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Chaser or keeper caught the volleyball
    VolleyballPickedUp {
        player_id: PlayerId,
        ball_id: BallId,
    },

    /// Beater caught a dodgeball
    DodgeballPickedUp {
        player_id: PlayerId,
        ball_id: BallId,
    },

    /// Ball released by a throw
    Thrown {
        player_id: PlayerId,
        ball_id: BallId,
        velocity: Vec2,
    },

    /// Tackle registered against a ball carrier
    Tackled {
        player_id: PlayerId,
        target_id: PlayerId,
    },

    /// Volleyball cleared a hoop
    GoalScored {
        hoop_id: HoopId,
        credited: Team,
        points: u32,
        score: [u32; 2],
    },

    /// Dead volleyball brought back into play
    VolleyballRevived {
        keeper_id: PlayerId,
        ball_id: BallId,
    },

    /// Player beaten by a dodgeball
    KnockedOut {
        player_id: PlayerId,
        ball_id: BallId,
    },

    /// Knocked-out player touched their hoop
    Recovered {
        player_id: PlayerId,
    },

    /// Held ball lost on a knockout
    Dropped {
        player_id: PlayerId,
        ball_id: BallId,
    },

    /// Volleyball left the pitch; an inbounder was assigned
    InboundingStarted {
        player_id: PlayerId,
        ball_id: BallId,
    },

    /// Inbounder reached the ball
    InboundingEnded {
        player_id: PlayerId,
        ball_id: BallId,
    },

    /// Loose dodgeball reserved for the team holding none
    ThirdDodgeballAssigned {
        ball_id: BallId,
        team: Team,
    },

    /// Reservation lifted
    ThirdDodgeballLifted {
        ball_id: BallId,
    },

    /// Illegal pickup deferred until the beat attempt resolves
    InterferencePending {
        player_id: PlayerId,
        ball_id: BallId,
    },

    /// Third-dodgeball interference penalty applied
    InterferencePenalty {
        player_id: PlayerId,
        ball_id: BallId,
        second_ball_id: BallId,
    },

    /// Delay-of-game warning issued
    DelayOfGameWarning {
        team: Team,
        warnings: u32,
    },

    /// Delay-of-game penalty issued
    DelayOfGamePenalty {
        team: Team,
    },

    /// Ball assigned to a designated receiver
    TurnoverDesignated {
        ball_id: BallId,
        player_id: PlayerId,
    },

    /// Seeker floor passed
    SeekerFloorReached,
}

/// A game event with timing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when event occurred
    pub tick: u64,

    /// Game clock when event occurred
    pub game_time: f64,

    /// Player primarily involved
    pub player_id: Option<PlayerId>,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u64, game_time: f64, data: GameEventData) -> Self {
        let player_id = match &data {
            GameEventData::VolleyballPickedUp { player_id, .. }
            | GameEventData::DodgeballPickedUp { player_id, .. }
            | GameEventData::Thrown { player_id, .. }
            | GameEventData::Tackled { player_id, .. }
            | GameEventData::KnockedOut { player_id, .. }
            | GameEventData::Recovered { player_id }
            | GameEventData::Dropped { player_id, .. }
            | GameEventData::InboundingStarted { player_id, .. }
            | GameEventData::InboundingEnded { player_id, .. }
            | GameEventData::InterferencePending { player_id, .. }
            | GameEventData::InterferencePenalty { player_id, .. }
            | GameEventData::TurnoverDesignated { player_id, .. } => Some(*player_id),
            GameEventData::VolleyballRevived { keeper_id, .. } => Some(*keeper_id),
            _ => None,
        };

        Self {
            tick,
            game_time,
            player_id,
            data,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self.data {
            GameEventData::VolleyballPickedUp { .. } => "volleyball_picked_up",
            GameEventData::DodgeballPickedUp { .. } => "dodgeball_picked_up",
            GameEventData::Thrown { .. } => "thrown",
            GameEventData::Tackled { .. } => "tackled",
            GameEventData::GoalScored { .. } => "goal_scored",
            GameEventData::VolleyballRevived { .. } => "volleyball_revived",
            GameEventData::KnockedOut { .. } => "knocked_out",
            GameEventData::Recovered { .. } => "recovered",
            GameEventData::Dropped { .. } => "dropped",
            GameEventData::InboundingStarted { .. } => "inbounding_started",
            GameEventData::InboundingEnded { .. } => "inbounding_ended",
            GameEventData::ThirdDodgeballAssigned { .. } => "third_dodgeball_assigned",
            GameEventData::ThirdDodgeballLifted { .. } => "third_dodgeball_lifted",
            GameEventData::InterferencePending { .. } => "interference_pending",
            GameEventData::InterferencePenalty { .. } => "interference_penalty",
            GameEventData::DelayOfGameWarning { .. } => "delay_of_game_warning",
            GameEventData::DelayOfGamePenalty { .. } => "delay_of_game_penalty",
            GameEventData::TurnoverDesignated { .. } => "turnover_designated",
            GameEventData::SeekerFloorReached => "seeker_floor_reached",
        }
    }
}
