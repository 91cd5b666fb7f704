//! Kinematics
//!
//! Direction-driven player velocities, the three ball velocity regimes,
//! Euler integration and elastic free-ball collisions.

use tracing::{debug, info};

use crate::core::vec2::Vec2;
use crate::game::events::GameEventData;
use crate::game::penalty::redesignate_turnover;
use crate::game::spatial::EntityId;
use crate::game::state::{BallId, GameState, Player, PlayerId, PlayerRole, Team};

// =============================================================================
// PLAYER VELOCITY
// =============================================================================

/// Update every player's velocity from its direction vector.
///
/// Knocked-out players are steered to their own center hoop, the keeper
/// restarting a dead volleyball is steered to the ball and then home, and
/// inbounders are steered to their ball and then back onto the pitch.
pub fn update_player_velocities(state: &mut GameState, dt: f64) {
    let ids: Vec<PlayerId> = state.players.keys().copied().collect();
    for id in ids {
        steer_knocked_out(state, id);
        steer_dead_ball_keeper(state, id);
        steer_inbounder(state, id);
        if let Some(player) = state.players.get_mut(&id) {
            apply_direction(player, dt);
        }
    }
}

fn steer_knocked_out(state: &mut GameState, id: PlayerId) {
    let Some(player) = state.players.get(&id) else { return };
    if !player.knocked_out {
        return;
    }
    let Some(hoop) = state.center_hoop(player.team) else { return };
    let hoop_pos = hoop.position;
    let reach = player.radius() + hoop.thickness;

    let Some(player) = state.players.get_mut(&id) else { return };
    player.direction = hoop_pos - player.position;
    if player.direction.length() < reach {
        player.knocked_out = false;
        info!(player = id.0, "recovered from knockout");
        state.push_event(GameEventData::Recovered { player_id: id });
    }
}

fn steer_dead_ball_keeper(state: &mut GameState, id: PlayerId) {
    let Some(vb) = state.volleyball() else { return };
    if !vb.is_dead() {
        return;
    }
    let (possession, holder, ball_pos) = (vb.possession, vb.holder, vb.position);
    let Some(player) = state.players.get_mut(&id) else { return };
    if player.knocked_out || player.role != PlayerRole::Keeper || possession != Some(player.team) {
        return;
    }
    player.direction = match holder {
        None => ball_pos - player.position,
        Some(_) => player.team.home_direction(),
    };
}

fn steer_inbounder(state: &mut GameState, id: PlayerId) {
    let Some(player) = state.players.get(&id) else { return };
    let Some(ball_id) = player.inbounding else { return };
    let Some(ball) = state.balls.get(&ball_id) else { return };

    let reach = player.radius() + ball.radius();
    if player.position.distance_squared(ball.position) > reach * reach {
        let to_ball = ball.position - player.position;
        if let Some(p) = state.players.get_mut(&id) {
            p.direction = to_ball;
        }
        return;
    }

    // In reach: point back onto the pitch, diagonally from a corner
    let r = player.radius();
    let (bx, by) = (ball.position.x, ball.position.y);
    let pitch = &state.pitch;
    let mut dir = Vec2::ZERO;
    if bx <= r {
        dir.x += 1.0;
    } else if bx >= pitch.length - r {
        dir.x -= 1.0;
    }
    if by <= r {
        dir.y += 1.0;
    } else if by >= pitch.width - r {
        dir.y -= 1.0;
    }

    if let Some(p) = state.players.get_mut(&id) {
        p.direction = dir;
        p.velocity = Vec2::ZERO;
        p.inbounding = None;
        p.dodgeball_immunity = false;
    }
    if let Some(v) = state.balls.get_mut(&ball_id).and_then(|b| b.volleyball_mut()) {
        v.inbounder = None;
    }
    info!(player = id.0, ?dir, "inbounding ended");
    state.push_event(GameEventData::InboundingEnded { player_id: id, ball_id });
}

/// Accelerate along the direction vector, then clamp to the speed limits.
///
/// The direction is normalized in place only when longer than 1.
pub fn apply_direction(player: &mut Player, dt: f64) {
    let t = player.tuning;
    let mag_dir = player.direction.length();
    if mag_dir > 1.0 {
        player.direction = player.direction.scale(1.0 / mag_dir);
    }

    player.velocity += (player.velocity * -t.deceleration + player.direction * t.acceleration) * dt;

    let speed = player.velocity.length();
    if speed > t.max_speed {
        player.velocity = player.velocity.scale(t.max_speed / speed);
    } else if speed < t.min_speed && mag_dir < t.min_direction {
        player.velocity = Vec2::ZERO;
    }
}

// =============================================================================
// BALL VELOCITY
// =============================================================================

/// Update ball velocities: turnover steering, free drag, or holder slaving.
pub fn update_ball_velocities(state: &mut GameState, dt: f64) {
    let ids: Vec<BallId> = state.balls.keys().copied().collect();
    for id in ids {
        let Some(ball) = state.balls.get(&id) else { continue };

        if let Some(target) = ball.turnover_to {
            let available = state.players.get(&target).is_some_and(|p| !p.knocked_out);
            if !available {
                redesignate_turnover(state, id);
            }
            steer_turnover(state, id);
        } else if ball.holder.is_none() {
            let Some(ball) = state.balls.get_mut(&id) else { continue };
            ball.velocity -= ball.velocity * (ball.tuning.drag * dt);
            let speed_sq = ball.velocity.length_squared();
            if let Some(d) = ball.dodgeball() {
                if speed_sq < d.dead_speed_threshold * d.dead_speed_threshold {
                    ball.possession = None;
                }
            }
        } else if let Some(holder_velocity) = ball.holder.and_then(|h| state.players.get(&h)).map(|p| p.velocity) {
            if let Some(ball) = state.balls.get_mut(&id) {
                ball.velocity = holder_velocity;
            }
        }
    }
}

fn steer_turnover(state: &mut GameState, id: BallId) {
    let Some(target) = state.balls.get(&id).and_then(|b| b.turnover_to) else { return };
    let Some(player) = state.players.get(&target) else { return };
    if player.knocked_out {
        return;
    }
    let (target_pos, throw_speed) = (player.position, player.tuning.throw_speed);
    if let Some(ball) = state.balls.get_mut(&id) {
        ball.velocity = (target_pos - ball.position).clamp_length(throw_speed);
    }
}

// =============================================================================
// INTEGRATION
// =============================================================================

/// Euler-step all positions, refresh keeper immunity and decay cooldowns.
pub fn integrate_positions(state: &mut GameState, dt: f64) {
    let keeper_zone = state.pitch.keeper_zone_x;
    for player in state.players.values_mut() {
        player.previous_position = player.position;
        player.position += player.velocity * dt;

        if player.role == PlayerRole::Keeper {
            let r = player.radius();
            let in_zone = match player.team {
                Team::Left => player.position.x - r <= keeper_zone[0],
                Team::Right => player.position.x + r >= keeper_zone[1],
            };
            player.dodgeball_immunity = in_zone || player.inbounding.is_some();
        }

        player.catch_cooldown = if player.catch_cooldown > dt {
            player.catch_cooldown - dt
        } else {
            0.0
        };
    }

    for ball in state.balls.values_mut() {
        ball.previous_position = ball.position;
        ball.position += ball.velocity * dt;
    }
}

// =============================================================================
// BALL-BALL COLLISIONS
// =============================================================================

/// Resolve overlaps between free, live balls.
///
/// Velocities are mirrored about the contact normal and the two speeds are
/// exchanged. A stationary ball takes over the moving ball's velocity.
pub fn resolve_ball_collisions(state: &mut GameState) {
    let ids: Vec<BallId> = state
        .balls
        .values()
        .filter(|b| !b.is_dead() && b.is_free())
        .map(|b| b.id)
        .collect();

    for (i, &a) in ids.iter().enumerate() {
        for &b in &ids[i + 1..] {
            collide_pair(state, a, b);
        }
    }
}

fn collide_pair(state: &mut GameState, a: BallId, b: BallId) {
    let Some(d2) = state.proximity.distance_sq(EntityId::Ball(a), EntityId::Ball(b)) else { return };
    let (Some(ba), Some(bb)) = (state.balls.get(&a), state.balls.get(&b)) else { return };
    // Earlier pairs this tick may have changed either ball's regime
    if !ba.is_free() || !bb.is_free() {
        return;
    }
    let reach = ba.radius() + bb.radius();
    if d2 >= reach * reach {
        return;
    }

    let (v1, v2) = (ba.velocity, bb.velocity);
    let (s1, s2) = (v1.length(), v2.length());
    if s1 == 0.0 && s2 == 0.0 {
        return;
    }
    let normal = (bb.position - ba.position).try_normalize();
    if let Some(n) = normal {
        if (v2 - v1).dot(n) > 0.0 {
            return; // already separating
        }
    }

    let (new_a, new_b) = if s1 == 0.0 {
        (v2, Vec2::ZERO)
    } else if s2 == 0.0 {
        (Vec2::ZERO, v1)
    } else {
        let Some(n) = normal else { return };
        (v1.reflect(n, 0.0) * (s2 / s1), v2.reflect(-n, 0.0) * (s1 / s2))
    };

    if let Some(ball) = state.balls.get_mut(&a) {
        ball.velocity = new_a;
    }
    if let Some(ball) = state.balls.get_mut(&b) {
        ball.velocity = new_b;
    }
    debug!(a = a.0, b = b.0, "ball collision");
}
