//! Penalties
//!
//! Turnover designation, delay of game and the third-dodgeball
//! interference penalty.

use tracing::{debug, info, warn};

use crate::game::events::GameEventData;
use crate::game::spatial::EntityId;
use crate::game::state::{BallId, GameState, PendingInterference, PlayerId, PlayerRole, Team};

// =============================================================================
// TURNOVERS
// =============================================================================

/// Hand `ball_id` to the nearest eligible opponent of its possessing team.
///
/// Volleyball receivers are chasers or keepers, dodgeball receivers are
/// beaters not already receiving another ball. Neither may hold a ball or
/// be knocked out. Any current holder is stripped. Returns `false` and
/// leaves the state untouched when no one qualifies.
pub fn designate_turnover(state: &mut GameState, ball_id: BallId) -> bool {
    let Some(ball) = state.balls.get(&ball_id) else { return false };
    let possession = ball.possession;
    let is_volleyball = ball.is_volleyball();

    let receiver = state
        .proximity
        .nearest_players(EntityId::Ball(ball_id))
        .into_iter()
        .filter_map(|(id, _)| state.players.get(&id))
        .find(|p| {
            if Some(p.team) == possession || p.knocked_out || p.held_ball.is_some() {
                return false;
            }
            if is_volleyball {
                p.role.handles_volleyball()
            } else {
                p.role == PlayerRole::Beater && !p.receiving_turnover
            }
        })
        .map(|p| p.id);

    let Some(receiver) = receiver else {
        debug!(ball = ball_id.0, "no eligible turnover receiver");
        return false;
    };

    state.release_hold(ball_id);
    if let Some(ball) = state.balls.get_mut(&ball_id) {
        ball.turnover_to = Some(receiver);
        if let Some(v) = ball.volleyball_mut() {
            v.inbounder = None;
        }
    }
    if let Some(p) = state.players.get_mut(&receiver) {
        if is_volleyball {
            p.inbounding = None;
        } else {
            p.receiving_turnover = true;
        }
    }
    info!(ball = ball_id.0, player = receiver.0, "turnover designated");
    state.push_event(GameEventData::TurnoverDesignated { ball_id, player_id: receiver });
    true
}

/// Re-resolve a turnover whose target can no longer receive it.
///
/// The stale target stays in place when no replacement qualifies, so the
/// ball keeps waiting and is retried next tick.
pub fn redesignate_turnover(state: &mut GameState, ball_id: BallId) {
    let Some(previous) = state.balls.get(&ball_id).and_then(|b| b.turnover_to) else { return };
    if !designate_turnover(state, ball_id) {
        return;
    }
    let replaced = state.balls.get(&ball_id).and_then(|b| b.turnover_to) != Some(previous);
    if replaced {
        if let Some(p) = state.players.get_mut(&previous) {
            p.receiving_turnover = false;
        }
    }
}

// =============================================================================
// DELAY OF GAME
// =============================================================================

/// How far below the forward-speed threshold the volleyball is, or zero
/// when no delay can accrue.
fn delay_velocity(state: &GameState) -> f64 {
    let Some(ball) = state.volleyball() else { return 0.0 };
    let Some(vb) = ball.volleyball() else { return 0.0 };
    if vb.is_dead || vb.inbounder.is_some() || ball.turnover_to.is_some() {
        return 0.0;
    }
    let Some(team) = ball.possession else { return 0.0 };

    let rules = &state.delay_of_game;
    let threshold = rules.velocity_x_threshold;
    let (x, vx) = (ball.position.x, ball.velocity.x);
    let in_own_half = match team {
        Team::Left => x < state.pitch.midline_x,
        Team::Right => x > state.pitch.midline_x,
    };
    if !in_own_half {
        return 0.0;
    }
    let advancing = match team {
        Team::Left => vx > threshold,
        Team::Right => vx < -threshold,
    };
    if advancing {
        return 0.0;
    }

    let pressured = state.players.values().any(|p| {
        if p.team == team || p.knocked_out {
            return false;
        }
        let d2 = p.position.distance_squared(ball.position);
        match p.role {
            PlayerRole::Chaser | PlayerRole::Keeper => d2 < rules.defender_pressure_sq,
            PlayerRole::Beater => p.held_ball.is_some() && d2 < rules.beater_pressure_sq,
            PlayerRole::Seeker => false,
        }
    });
    if pressured {
        return 0.0;
    }

    match team {
        Team::Left => threshold - vx,
        Team::Right => threshold + vx,
    }
}

/// Accrue delay-of-game time and issue warnings, then penalties.
///
/// The timer holds its value while an immune keeper carries the ball.
pub fn check_delay_of_game(state: &mut GameState, dt: f64) {
    let Some(ball_id) = state.volleyball_id() else { return };
    let dv = delay_velocity(state);

    if dv <= 0.0 {
        let protected_keeper = state
            .balls
            .get(&ball_id)
            .and_then(|b| b.holder)
            .and_then(|h| state.players.get(&h))
            .is_some_and(|p| p.role == PlayerRole::Keeper && p.dodgeball_immunity);
        if !protected_keeper {
            set_delay_timer(state, ball_id, 0.0);
        }
        return;
    }

    let Some(ball) = state.balls.get_mut(&ball_id) else { return };
    let Some(team) = ball.possession else { return };
    let Some(vb) = ball.volleyball_mut() else { return };
    vb.delay_of_game_timer += dt * dv;
    if vb.delay_of_game_timer < state.delay_of_game.time_limit {
        return;
    }
    vb.delay_of_game_timer = 0.0;

    let warnings = &mut state.delay_of_game_warnings[team.index()];
    *warnings += 1;
    let warnings = *warnings;
    if warnings <= state.delay_of_game.max_warnings {
        warn!(?team, warnings, "delay of game warning");
        state.push_event(GameEventData::DelayOfGameWarning { team, warnings });
    } else {
        warn!(?team, "delay of game penalty");
        state.push_event(GameEventData::DelayOfGamePenalty { team });
        designate_turnover(state, ball_id);
    }
}

fn set_delay_timer(state: &mut GameState, ball_id: BallId, value: f64) {
    if let Some(vb) = state.balls.get_mut(&ball_id).and_then(|b| b.volleyball_mut()) {
        vb.delay_of_game_timer = value;
    }
}

// =============================================================================
// THIRD-DODGEBALL INTERFERENCE
// =============================================================================

/// Illegal pickup of the reserved dodgeball.
///
/// While any beat attempt is running the penalty is deferred until the
/// attempt resolves; otherwise it applies at once.
pub fn third_dodgeball_interference(state: &mut GameState, player_id: PlayerId, ball_id: BallId) {
    let attempt_running = state
        .balls
        .values()
        .filter_map(|b| b.dodgeball())
        .any(|d| d.beat_attempt_time > 0.0);

    if attempt_running {
        if state.pending_interference.is_none() {
            info!(player = player_id.0, ball = ball_id.0, "interference pending on beat attempt");
            state.push_event(GameEventData::InterferencePending { player_id, ball_id });
        }
        state.pending_interference = Some(PendingInterference { ball: ball_id, player: player_id });
    } else {
        apply_interference_penalty(state, player_id, ball_id);
    }
}

/// Knock out the offender and turn the volleyball plus two dodgeballs over
/// to the other team.
///
/// # Panics
///
/// Panics when no second dodgeball exists; the reservation only arises with
/// three dodgeballs in play.
pub fn apply_interference_penalty(state: &mut GameState, player_id: PlayerId, ball_id: BallId) {
    let Some(offender_team) = state.players.get(&player_id).map(|p| p.team) else { return };
    if let Some(p) = state.players.get_mut(&player_id) {
        p.knocked_out = true;
    }

    let Some(second) = choose_second_dodgeball(state, ball_id, offender_team) else {
        panic!("missing second dodgeball in third dodgeball interference");
    };

    if let Some(vb_id) = state.volleyball_id() {
        if let Some(ball) = state.balls.get_mut(&vb_id) {
            ball.possession = Some(offender_team);
        }
        designate_turnover(state, vb_id);
    }
    for id in [ball_id, second] {
        if let Some(ball) = state.balls.get_mut(&id) {
            ball.possession = Some(offender_team);
        }
    }
    designate_turnover(state, ball_id);
    designate_turnover(state, second);

    state.third_dodgeball = None;
    state.pending_interference = None;
    state.reset_beat_attempts();

    info!(player = player_id.0, ball = ball_id.0, second = second.0, "third dodgeball interference penalty");
    state.push_event(GameEventData::InterferencePenalty {
        player_id,
        ball_id,
        second_ball_id: second,
    });
}

/// Loose balls first, then balls an opponent holds, then thrown balls.
/// Ties between the top candidates are broken by the match RNG.
fn choose_second_dodgeball(state: &mut GameState, touched: BallId, offender_team: Team) -> Option<BallId> {
    let scored: Vec<(BallId, u8)> = state
        .balls
        .values()
        .filter(|b| b.is_dodgeball() && b.id != touched)
        .map(|b| {
            let priority = match (b.possession, b.holder) {
                (None, _) => 3,
                (Some(team), Some(_)) if team != offender_team => 2,
                (Some(_), None) => 1,
                (Some(_), Some(_)) => 0,
            };
            (b.id, priority)
        })
        .collect();

    let best = scored.iter().map(|s| s.1).max()?;
    let top: Vec<BallId> = scored.iter().filter(|s| s.1 == best).map(|s| s.0).collect();
    match top.len() {
        0 => None,
        1 => Some(top[0]),
        _ => state.rng.choose(&top).copied(),
    }
}
