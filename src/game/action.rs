//! Player Actions
//!
//! Discrete throw and tackle requests. Both are no-ops returning `false`
//! when the player cannot act.

use tracing::debug;

use crate::game::events::GameEventData;
use crate::game::state::{GameState, PlayerId};

/// Minimum release speed that imposes a catch cooldown.
const COOLDOWN_MIN_SPEED: f64 = 1e-2;

/// Release the held ball along the player's direction at throw speed.
///
/// The thrower cannot catch again for roughly the time the ball needs to
/// clear their body, scaled by their own speed.
pub fn throw(state: &mut GameState, pid: PlayerId) -> bool {
    let Some(player) = state.players.get_mut(&pid) else { return false };
    let Some(ball_id) = player.held_ball else { return false };

    let mag = player.direction.length();
    if mag > 1.0 {
        player.direction = player.direction.scale(1.0 / mag);
    }
    let velocity = player.direction * player.tuning.throw_speed;
    let speed = velocity.length();
    player.catch_cooldown = if speed > COOLDOWN_MIN_SPEED {
        2.0 * player.radius() / speed * player.tuning.max_speed * 2.5
    } else {
        0.0
    };
    player.held_ball = None;

    let Some(ball) = state.balls.get_mut(&ball_id) else { return false };
    ball.previous_thrower = Some(pid);
    ball.holder = None;
    ball.velocity = velocity;

    debug!(player = pid.0, ball = ball_id.0, speed, "throw");
    state.push_event(GameEventData::Thrown { player_id: pid, ball_id, velocity });
    true
}

/// Start tackling an opposing ball carrier the player is touching.
///
/// The tackler must have free hands. The relation is recorded on both
/// players and ends when contact breaks.
pub fn tackle(state: &mut GameState, pid: PlayerId) -> bool {
    let Some(player) = state.players.get(&pid) else { return false };
    if player.held_ball.is_some() {
        return false;
    }
    let team = player.team;
    let target = player
        .contacts
        .iter()
        .filter_map(|id| state.players.get(id))
        .find(|other| other.held_ball.is_some() && other.team != team)
        .map(|other| other.id);
    let Some(target) = target else { return false };

    for (me, other) in [(pid, target), (target, pid)] {
        if let Some(p) = state.players.get_mut(&me) {
            if !p.tackling.contains(&other) {
                p.tackling.push(other);
            }
        }
    }
    debug!(player = pid.0, target = target.0, "tackle");
    state.push_event(GameEventData::Tackled { player_id: pid, target_id: target });
    true
}
