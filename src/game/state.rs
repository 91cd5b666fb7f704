//! Game State Definitions
//!
//! All state types for match simulation.
//! Uses BTreeMap for deterministic iteration order.
//!
//! Entities reference each other only by id (holder, held ball, turnover
//! target, contact partners), so a `GameState` is plain value data and
//! `clone()` yields a fully independent copy.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::core::rng::DeterministicRng;
use crate::core::hash::{StateHash, StateHasher, compute_state_hash};
use crate::game::events::{GameEvent, GameEventData};
use crate::game::spatial::ProximityIndex;

// =============================================================================
// IDS
// =============================================================================

/// Player identifier, unique within a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u16);

/// Ball identifier, unique within a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BallId(pub u16);

/// Hoop identifier, unique within a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HoopId(pub u16);

// =============================================================================
// TEAM & ROLE
// =============================================================================

/// One of the two sides. `Left` defends the low-x end of the pitch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Team {
    /// Defends hoops at low x
    Left = 0,
    /// Defends hoops at high x
    Right = 1,
}

impl Team {
    /// Both teams in index order.
    pub const ALL: [Team; 2] = [Team::Left, Team::Right];

    /// Index into per-team arrays.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The other team.
    #[inline]
    pub fn opponent(self) -> Team {
        match self {
            Team::Left => Team::Right,
            Team::Right => Team::Left,
        }
    }

    /// Unit x direction pointing toward this team's own end line.
    #[inline]
    pub fn home_direction(self) -> Vec2 {
        match self {
            Team::Left => Vec2::LEFT,
            Team::Right => Vec2::RIGHT,
        }
    }
}

/// Player position on the team.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerRole {
    /// Defensive volleyball player, immune in own keeper zone
    Keeper,
    /// Volleyball player
    Chaser,
    /// Dodgeball player
    Beater,
    /// Enters after the seeker floor; no ball rules apply
    Seeker,
}

impl PlayerRole {
    /// Chasers and keepers handle the volleyball.
    #[inline]
    pub fn handles_volleyball(self) -> bool {
        matches!(self, PlayerRole::Chaser | PlayerRole::Keeper)
    }
}

// =============================================================================
// PLAYER
// =============================================================================

/// Movement and throwing constants of a player, in game units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Collision radius (m)
    pub radius: f64,
    /// Speed cap (m/s)
    pub max_speed: f64,
    /// Speed below which an idle player stops
    pub min_speed: f64,
    /// Acceleration along the direction vector (m/s²)
    pub acceleration: f64,
    /// Fraction of velocity shed per second
    pub deceleration: f64,
    /// Direction magnitude below which an idle player stops
    pub min_direction: f64,
    /// Release speed of a throw (m/s)
    pub throw_speed: f64,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            radius: 0.3,
            max_speed: 1.0,
            min_speed: 1.0 / 3.0,
            acceleration: 1.0,
            deceleration: 0.5,
            min_direction: 0.6,
            throw_speed: 4.0,
        }
    }
}

/// State of a single player in the match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Unique player ID
    pub id: PlayerId,
    /// Team
    pub team: Team,
    /// Role
    pub role: PlayerRole,
    /// Current position
    pub position: Vec2,
    /// Position before the last integration step
    pub previous_position: Vec2,
    /// Current velocity
    pub velocity: Vec2,
    /// Desired direction, written by input or AI. Not pre-normalized.
    pub direction: Vec2,
    /// Movement constants
    pub tuning: PlayerTuning,
    /// Knocked out by a dodgeball, walking back to own hoop
    pub knocked_out: bool,
    /// Ball currently held
    pub held_ball: Option<BallId>,
    /// Seconds until the player may catch again
    pub catch_cooldown: f64,
    /// Cannot be beaten while set
    pub dodgeball_immunity: bool,
    /// Ball this player is inbounding
    pub inbounding: Option<BallId>,
    /// Designated receiver of a dodgeball turnover
    pub receiving_turnover: bool,
    /// Players in contact this tick
    pub contacts: Vec<PlayerId>,
    /// Active tackle partners
    pub tackling: Vec<PlayerId>,
}

impl Player {
    /// Create a player at rest.
    pub fn new(id: PlayerId, team: Team, role: PlayerRole, position: Vec2, tuning: PlayerTuning) -> Self {
        Self {
            id,
            team,
            role,
            position,
            previous_position: position,
            velocity: Vec2::ZERO,
            direction: Vec2::ZERO,
            tuning,
            knocked_out: false,
            held_ball: None,
            catch_cooldown: 0.0,
            dodgeball_immunity: false,
            inbounding: None,
            receiving_turnover: false,
            contacts: Vec::new(),
            tackling: Vec::new(),
        }
    }

    /// Collision radius.
    #[inline]
    pub fn radius(&self) -> f64 {
        self.tuning.radius
    }

    /// Hash this player's state for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u16(self.id.0);
        hasher.update_u8(self.team as u8);
        hasher.update_u8(self.role as u8);
        hasher.update_vec2(self.position);
        hasher.update_vec2(self.previous_position);
        hasher.update_vec2(self.velocity);
        hasher.update_vec2(self.direction);
        hasher.update_bool(self.knocked_out);
        hasher.update_opt_u16(self.held_ball.map(|b| b.0));
        hasher.update_f64(self.catch_cooldown);
        hasher.update_bool(self.dodgeball_immunity);
        hasher.update_opt_u16(self.inbounding.map(|b| b.0));
        hasher.update_bool(self.receiving_turnover);
        hasher.update_u32(self.contacts.len() as u32);
        for id in &self.contacts {
            hasher.update_u16(id.0);
        }
        hasher.update_u32(self.tackling.len() as u32);
        for id in &self.tackling {
            hasher.update_u16(id.0);
        }
    }
}

// =============================================================================
// BALL
// =============================================================================

/// Physical constants of a ball.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BallTuning {
    /// Collision radius (m)
    pub radius: f64,
    /// Fraction of velocity shed per second while free
    pub drag: f64,
    /// Fraction of speed lost when bouncing off a player
    pub reflect_loss: f64,
}

impl BallTuning {
    /// Volleyball: 67 cm circumference.
    pub fn volleyball() -> Self {
        Self {
            radius: 0.67 / 2.0 / 3.14,
            drag: 0.15,
            reflect_loss: 0.4,
        }
    }

    /// Dodgeball: 70 cm circumference.
    pub fn dodgeball() -> Self {
        Self {
            radius: 0.70 / 2.0 / 3.14,
            drag: 0.15,
            reflect_loss: 0.4,
        }
    }
}

/// Where the volleyball entered a hoop's plane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HoopCrossing {
    /// Hoop crossed
    pub hoop: HoopId,
    /// Ball y when the plane was crossed
    pub y: f64,
}

/// Volleyball-only state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VolleyballState {
    /// Set while the ball is between entering and clearing a hoop
    pub crossed_hoop: Option<HoopCrossing>,
    /// Player restarting play after the ball left the pitch
    pub inbounder: Option<PlayerId>,
    /// Dead after a goal until the conceding keeper revives it
    pub is_dead: bool,
    /// Accumulated delay-of-game time
    pub delay_of_game_timer: f64,
}

/// Dodgeball-only state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DodgeballState {
    /// Seconds since an advantaged team's throw started a beat attempt; 0 when idle
    pub beat_attempt_time: f64,
    /// Free speed below which the ball loses possession
    pub dead_speed_threshold: f64,
}

/// Kind-specific ball state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BallKind {
    /// Scoring ball
    Volleyball(VolleyballState),
    /// Knockout ball
    Dodgeball(DodgeballState),
}

/// State of a ball.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    /// Unique ball ID
    pub id: BallId,
    /// Current position
    pub position: Vec2,
    /// Position before the last integration step
    pub previous_position: Vec2,
    /// Current velocity
    pub velocity: Vec2,
    /// Physical constants
    pub tuning: BallTuning,
    /// Player holding the ball
    pub holder: Option<PlayerId>,
    /// Team in possession, `None` when neutral
    pub possession: Option<Team>,
    /// Last player to throw the ball
    pub previous_thrower: Option<PlayerId>,
    /// Only this player may capture the ball
    pub turnover_to: Option<PlayerId>,
    /// Kind-specific state
    pub kind: BallKind,
}

impl Ball {
    /// Create a ball at rest.
    pub fn new(id: BallId, position: Vec2, tuning: BallTuning, kind: BallKind) -> Self {
        Self {
            id,
            position,
            previous_position: position,
            velocity: Vec2::ZERO,
            tuning,
            holder: None,
            possession: None,
            previous_thrower: None,
            turnover_to: None,
            kind,
        }
    }

    /// Collision radius.
    #[inline]
    pub fn radius(&self) -> f64 {
        self.tuning.radius
    }

    /// Is this the volleyball?
    #[inline]
    pub fn is_volleyball(&self) -> bool {
        matches!(self.kind, BallKind::Volleyball(_))
    }

    /// Is this a dodgeball?
    #[inline]
    pub fn is_dodgeball(&self) -> bool {
        matches!(self.kind, BallKind::Dodgeball(_))
    }

    /// Volleyball state, if this is the volleyball.
    pub fn volleyball(&self) -> Option<&VolleyballState> {
        match &self.kind {
            BallKind::Volleyball(v) => Some(v),
            BallKind::Dodgeball(_) => None,
        }
    }

    /// Mutable volleyball state.
    pub fn volleyball_mut(&mut self) -> Option<&mut VolleyballState> {
        match &mut self.kind {
            BallKind::Volleyball(v) => Some(v),
            BallKind::Dodgeball(_) => None,
        }
    }

    /// Dodgeball state, if this is a dodgeball.
    pub fn dodgeball(&self) -> Option<&DodgeballState> {
        match &self.kind {
            BallKind::Dodgeball(d) => Some(d),
            BallKind::Volleyball(_) => None,
        }
    }

    /// Mutable dodgeball state.
    pub fn dodgeball_mut(&mut self) -> Option<&mut DodgeballState> {
        match &mut self.kind {
            BallKind::Dodgeball(d) => Some(d),
            BallKind::Volleyball(_) => None,
        }
    }

    /// Dead volleyball. Dodgeballs are never dead in this sense.
    #[inline]
    pub fn is_dead(&self) -> bool {
        self.volleyball().is_some_and(|v| v.is_dead)
    }

    /// Neither held nor turnover-pending.
    #[inline]
    pub fn is_free(&self) -> bool {
        self.holder.is_none() && self.turnover_to.is_none()
    }

    /// Hash this ball's state for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u16(self.id.0);
        hasher.update_vec2(self.position);
        hasher.update_vec2(self.previous_position);
        hasher.update_vec2(self.velocity);
        hasher.update_opt_u16(self.holder.map(|p| p.0));
        hasher.update_opt_u16(self.possession.map(|t| t as u16));
        hasher.update_opt_u16(self.previous_thrower.map(|p| p.0));
        hasher.update_opt_u16(self.turnover_to.map(|p| p.0));
        match &self.kind {
            BallKind::Volleyball(v) => {
                hasher.update_u8(0);
                hasher.update_opt_u16(v.crossed_hoop.map(|c| c.hoop.0));
                hasher.update_f64(v.crossed_hoop.map_or(0.0, |c| c.y));
                hasher.update_opt_u16(v.inbounder.map(|p| p.0));
                hasher.update_bool(v.is_dead);
                hasher.update_f64(v.delay_of_game_timer);
            }
            BallKind::Dodgeball(d) => {
                hasher.update_u8(1);
                hasher.update_f64(d.beat_attempt_time);
                hasher.update_f64(d.dead_speed_threshold);
            }
        }
    }
}

// =============================================================================
// HOOP & PITCH
// =============================================================================

/// A goal hoop. Static for the match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hoop {
    /// Unique hoop ID
    pub id: HoopId,
    /// Defending team
    pub team: Team,
    /// Center of the ring
    pub position: Vec2,
    /// Inner radius of the ring
    pub radius: f64,
    /// Ring thickness
    pub thickness: f64,
}

/// Pitch geometry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pitch {
    /// Extent along x, from 0
    pub length: f64,
    /// Extent along y, from 0
    pub width: f64,
    /// Keeper-zone lines: left team immune below `[0]`, right team above `[1]`
    pub keeper_zone_x: [f64; 2],
    /// Halfway line
    pub midline_x: f64,
}

impl Pitch {
    /// Standard 60 x 33 pitch with keeper zones 19 m from each end.
    pub fn standard() -> Self {
        Self::new(60.0, 33.0, 19.0)
    }

    /// Pitch with symmetric keeper zones `keeper_zone` metres from each end.
    pub fn new(length: f64, width: f64, keeper_zone: f64) -> Self {
        Self {
            length,
            width,
            keeper_zone_x: [keeper_zone, length - keeper_zone],
            midline_x: length / 2.0,
        }
    }

    /// Pitch center.
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.length / 2.0, self.width / 2.0)
    }

    /// Is `x` inside `team`'s own half? The midline counts for both.
    #[inline]
    pub fn in_own_half(&self, team: Team, x: f64) -> bool {
        match team {
            Team::Left => x <= self.midline_x,
            Team::Right => x >= self.midline_x,
        }
    }
}

// =============================================================================
// RULE PARAMETERS
// =============================================================================

/// Delay-of-game thresholds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayOfGameRules {
    /// Accrued time at which a warning or penalty is issued
    pub time_limit: f64,
    /// Forward x speed the ball must exceed in its own half
    pub velocity_x_threshold: f64,
    /// Warnings per team before penalties start
    pub max_warnings: u32,
    /// Squared distance at which an opposing chaser or keeper pressures the ball
    pub defender_pressure_sq: f64,
    /// Squared distance at which an opposing armed beater pressures the ball
    pub beater_pressure_sq: f64,
}

impl Default for DelayOfGameRules {
    fn default() -> Self {
        Self {
            time_limit: 7.0,
            velocity_x_threshold: 1.4 / 3.0,
            max_warnings: 1,
            defender_pressure_sq: 2.0,
            beater_pressure_sq: 4.0,
        }
    }
}

/// Who is credited with a goal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalCredit {
    /// The team the hoop belongs to
    #[default]
    HoopOwner,
    /// The team attacking the hoop
    Attacker,
}

/// Goal value and credit policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    /// Points per goal
    pub goal_points: u32,
    /// Credited team
    pub credit: GoalCredit,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            goal_points: 10,
            credit: GoalCredit::HoopOwner,
        }
    }
}

/// Loose dodgeball reserved for the team holding none.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThirdDodgeball {
    /// The reserved ball
    pub ball: BallId,
    /// Team it is reserved for
    pub team: Team,
}

/// Illegal pickup waiting on a beat attempt to resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingInterference {
    /// Ball touched
    pub ball: BallId,
    /// Offending player
    pub player: PlayerId,
}

// =============================================================================
// MATCH PHASE
// =============================================================================

/// Current phase of the match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Set up, not started
    #[default]
    Waiting,
    /// Active gameplay
    Playing,
    /// Match over
    Ended,
}

// =============================================================================
// GAME STATE
// =============================================================================

/// Complete state of a match.
///
/// Uses BTreeMap for deterministic iteration order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameState {
    /// Ticks simulated
    pub tick: u64,

    /// Elapsed game seconds
    pub game_time: f64,

    /// Current match phase
    pub phase: MatchPhase,

    /// RNG seed (for verification)
    pub rng_seed: u64,

    /// Deterministic RNG state
    pub rng: DeterministicRng,

    /// Pitch geometry
    pub pitch: Pitch,

    /// All players
    pub players: BTreeMap<PlayerId, Player>,

    /// All balls
    pub balls: BTreeMap<BallId, Ball>,

    /// All hoops
    pub hoops: BTreeMap<HoopId, Hoop>,

    /// Score per team
    pub score: [u32; 2],

    /// Delay-of-game thresholds
    pub delay_of_game: DelayOfGameRules,

    /// Delay-of-game warnings issued per team
    pub delay_of_game_warnings: [u32; 2],

    /// Goal value and credit
    pub scoring: ScoringRules,

    /// Seconds an advantaged team's thrown dodgeball has to beat someone
    pub beat_attempt_time_limit: f64,

    /// Active third-dodgeball reservation
    pub third_dodgeball: Option<ThirdDodgeball>,

    /// Illegal pickup awaiting the beat attempt outcome
    pub pending_interference: Option<PendingInterference>,

    /// Game seconds before seekers may enter
    pub seeker_floor: f64,

    /// Seeker floor has passed
    pub seekers_released: bool,

    /// Pairwise distances, rebuilt each tick
    #[serde(skip)]
    pub proximity: ProximityIndex,

    /// Events generated this tick (cleared each tick)
    #[serde(skip)]
    pub pending_events: Vec<GameEvent>,
}

impl GameState {
    /// Create an empty match on `pitch`.
    pub fn new(pitch: Pitch, rng_seed: u64) -> Self {
        Self {
            tick: 0,
            game_time: 0.0,
            phase: MatchPhase::Waiting,
            rng_seed,
            rng: DeterministicRng::new(rng_seed),
            pitch,
            players: BTreeMap::new(),
            balls: BTreeMap::new(),
            hoops: BTreeMap::new(),
            score: [0, 0],
            delay_of_game: DelayOfGameRules::default(),
            delay_of_game_warnings: [0, 0],
            scoring: ScoringRules::default(),
            beat_attempt_time_limit: 5.0,
            third_dodgeball: None,
            pending_interference: None,
            seeker_floor: 400.0,
            seekers_released: false,
            proximity: ProximityIndex::default(),
            pending_events: Vec::new(),
        }
    }

    /// Add a player and return its id.
    pub fn add_player(&mut self, team: Team, role: PlayerRole, position: Vec2, tuning: PlayerTuning) -> PlayerId {
        let id = PlayerId(self.players.len() as u16);
        self.players.insert(id, Player::new(id, team, role, position, tuning));
        id
    }

    /// Add the volleyball and return its id.
    pub fn add_volleyball(&mut self, position: Vec2, tuning: BallTuning) -> BallId {
        let id = BallId(self.balls.len() as u16);
        let kind = BallKind::Volleyball(VolleyballState::default());
        self.balls.insert(id, Ball::new(id, position, tuning, kind));
        id
    }

    /// Add a dodgeball and return its id.
    pub fn add_dodgeball(&mut self, position: Vec2, tuning: BallTuning, dead_speed_threshold: f64) -> BallId {
        let id = BallId(self.balls.len() as u16);
        let kind = BallKind::Dodgeball(DodgeballState {
            beat_attempt_time: 0.0,
            dead_speed_threshold,
        });
        self.balls.insert(id, Ball::new(id, position, tuning, kind));
        id
    }

    /// Add a hoop and return its id.
    pub fn add_hoop(&mut self, team: Team, position: Vec2, radius: f64, thickness: f64) -> HoopId {
        let id = HoopId(self.hoops.len() as u16);
        self.hoops.insert(id, Hoop { id, team, position, radius, thickness });
        id
    }

    /// Start play.
    pub fn start(&mut self) {
        self.phase = MatchPhase::Playing;
    }

    /// Get a player by ID.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Get a player mutably by ID.
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    /// Get a ball by ID.
    pub fn ball(&self, id: BallId) -> Option<&Ball> {
        self.balls.get(&id)
    }

    /// Get a ball mutably by ID.
    pub fn ball_mut(&mut self, id: BallId) -> Option<&mut Ball> {
        self.balls.get_mut(&id)
    }

    /// The volleyball (lowest id if several).
    pub fn volleyball_id(&self) -> Option<BallId> {
        self.balls.values().find(|b| b.is_volleyball()).map(|b| b.id)
    }

    /// The volleyball.
    pub fn volleyball(&self) -> Option<&Ball> {
        self.balls.values().find(|b| b.is_volleyball())
    }

    /// All dodgeball ids in order.
    pub fn dodgeball_ids(&self) -> Vec<BallId> {
        self.balls.values().filter(|b| b.is_dodgeball()).map(|b| b.id).collect()
    }

    /// The team's hoop nearest the pitch's center line in y, used as the
    /// knockout return point.
    pub fn center_hoop(&self, team: Team) -> Option<&Hoop> {
        let mid_y = self.pitch.width / 2.0;
        self.hoops
            .values()
            .filter(|h| h.team == team)
            .min_by(|a, b| {
                (a.position.y - mid_y)
                    .abs()
                    .total_cmp(&(b.position.y - mid_y).abs())
                    .then(a.id.cmp(&b.id))
            })
    }

    /// First keeper of `team` by id.
    pub fn keeper_of(&self, team: Team) -> Option<PlayerId> {
        self.players
            .values()
            .find(|p| p.team == team && p.role == PlayerRole::Keeper)
            .map(|p| p.id)
    }

    /// Clear the ball's holder on both the ball and the player.
    pub fn release_hold(&mut self, ball_id: BallId) {
        let holder = self.balls.get_mut(&ball_id).and_then(|b| b.holder.take());
        if let Some(pid) = holder {
            if let Some(p) = self.players.get_mut(&pid) {
                if p.held_ball == Some(ball_id) {
                    p.held_ball = None;
                }
            }
        }
    }

    /// Reset every dodgeball's beat-attempt timer.
    pub fn reset_beat_attempts(&mut self) {
        for ball in self.balls.values_mut() {
            if let Some(d) = ball.dodgeball_mut() {
                d.beat_attempt_time = 0.0;
            }
        }
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, self.rng_seed, |hasher| {
            hasher.update_f64(self.game_time);
            hasher.update_u8(self.phase as u8);
            hasher.update_u32(self.score[0]);
            hasher.update_u32(self.score[1]);
            hasher.update_u32(self.delay_of_game_warnings[0]);
            hasher.update_u32(self.delay_of_game_warnings[1]);

            for player in self.players.values() {
                player.hash_into(hasher);
            }
            for ball in self.balls.values() {
                ball.hash_into(hasher);
            }

            hasher.update_opt_u16(self.third_dodgeball.map(|t| t.ball.0));
            hasher.update_opt_u16(self.third_dodgeball.map(|t| t.team as u16));
            hasher.update_opt_u16(self.pending_interference.map(|p| p.ball.0));
            hasher.update_opt_u16(self.pending_interference.map(|p| p.player.0));
            hasher.update_bool(self.seekers_released);

            let [s0, s1] = self.rng.state();
            hasher.update_u64(s0);
            hasher.update_u64(s1);
        })
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Record an event stamped with the current tick and clock.
    pub fn push_event(&mut self, data: GameEventData) {
        self.pending_events.push(GameEvent::new(self.tick, self.game_time, data));
    }
}

// =============================================================================
// TESTS
// =============================================================================
