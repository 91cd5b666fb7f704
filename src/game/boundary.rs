//! Boundaries & Restarts
//!
//! Hoop no-go zones, pitch clamping, inbounder assignment and the
//! free-way carve-outs around an inbounder or a reviving keeper.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::core::vec2::Vec2;
use crate::game::contact::shift_contacts;
use crate::game::events::GameEventData;
use crate::game::spatial::EntityId;
use crate::game::state::{BallId, GameState, PlayerId, PlayerRole};

/// Free-way radius as a multiple of the pushed player's radius.
const FREE_WAY_RADII: f64 = 4.0;

/// Squared cross product below which two push normals count as collinear.
const COLLINEAR_CROSS_SQ: f64 = 0.15;

// =============================================================================
// FREE WAYS
// =============================================================================

/// Push `entity` directly away from `anchor` at `speed`.
///
/// The entity's velocity component toward or away from the anchor is
/// removed first. Each axis is jittered by ±5%. Returns the position
/// offset and the unit push normal, or `None` when the two coincide.
fn move_away(state: &mut GameState, anchor: Vec2, pid: PlayerId, dt: f64) -> Option<(Vec2, Vec2)> {
    let player = state.players.get(&pid)?;
    let Some(normal) = (player.position - anchor).try_normalize() else {
        warn!(player = pid.0, "free way anchor coincides with player");
        return None;
    };
    let speed = player.tuning.max_speed;
    let along = player.velocity.project_onto(normal);

    let jitter_x = state.rng.uniform(0.95, 1.05);
    let jitter_y = state.rng.uniform(0.95, 1.05);
    if let Some(p) = state.players.get_mut(&pid) {
        p.velocity -= along;
    }

    let push = normal * speed - along;
    Some((Vec2::new(push.x * jitter_x, push.y * jitter_y) * dt, normal))
}

/// Players within the free-way radius of `around`, nearest first.
fn crowding(state: &GameState, around: EntityId) -> Vec<PlayerId> {
    let mut out = Vec::new();
    for (pid, d2) in state.proximity.nearest_players(around) {
        let Some(p) = state.players.get(&pid) else { continue };
        let limit = FREE_WAY_RADII * p.radius();
        if d2 >= limit * limit {
            break;
        }
        out.push(pid);
    }
    out
}

/// Clear space around the inbounder and the ball being inbounded.
///
/// Players are pushed away from the inbounder first. A player also near
/// the ball keeps that push, unless the two pushes nearly oppose, in which
/// case a random sideways nudge is added to break the deadlock. All moves
/// apply together.
pub fn inbounding_free_way(state: &mut GameState, dt: f64) {
    let Some(ball) = state.volleyball() else { return };
    let (ball_id, ball_pos): (BallId, Vec2) = (ball.id, ball.position);
    let Some(inbounder) = ball.volleyball().and_then(|v| v.inbounder) else { return };
    let Some(inbounder_pos) = state.players.get(&inbounder).map(|p| p.position) else { return };

    let mut moves: BTreeMap<PlayerId, (Vec2, Vec2)> = BTreeMap::new();

    for pid in crowding(state, EntityId::Player(inbounder)) {
        if let Some(m) = move_away(state, inbounder_pos, pid, dt) {
            moves.insert(pid, m);
        }
    }

    for pid in crowding(state, EntityId::Ball(ball_id)) {
        if pid == inbounder {
            continue;
        }
        let Some((offset, normal)) = move_away(state, ball_pos, pid, dt) else { continue };
        let Some(&(existing, existing_normal)) = moves.get(&pid) else {
            moves.insert(pid, (offset, normal));
            continue;
        };

        let collinear = normal.cross(existing_normal).powi(2) < COLLINEAR_CROSS_SQ;
        let opposed = normal.dot(existing_normal) < 0.0;
        if collinear && opposed {
            let speed = state.players.get(&pid).map_or(0.0, |p| p.tuning.max_speed);
            let sign = state.rng.next_sign();
            let nudge = existing_normal.perpendicular() * (sign * speed * dt * 0.5);
            moves.insert(pid, (existing + nudge, existing_normal));
            debug!(player = pid.0, "free way deadlock nudge");
        }
    }

    for (pid, (offset, _)) in moves {
        if let Some(p) = state.players.get_mut(&pid) {
            p.position += offset;
        }
    }
}

/// Clear space around the keeper restarting a dead volleyball.
pub fn keeper_free_way(state: &mut GameState, dt: f64) {
    let Some(ball) = state.volleyball() else { return };
    if !ball.is_dead() {
        return;
    }
    let Some(team) = ball.possession else { return };
    let Some(keeper) = state.keeper_of(team) else { return };
    let Some(keeper_pos) = state.players.get(&keeper).map(|p| p.position) else { return };

    for pid in crowding(state, EntityId::Player(keeper)) {
        if let Some((offset, _)) = move_away(state, keeper_pos, pid, dt) {
            if let Some(p) = state.players.get_mut(&pid) {
                p.position += offset;
            }
        }
    }
}

// =============================================================================
// HOOP NO-GO
// =============================================================================

/// Keep chasers out of the band around their own hoops.
///
/// An offending chaser is set back to the nearest legal x and stopped. A
/// held ball and current contact partners move with it.
pub fn enforce_hoop_no_go(state: &mut GameState) {
    let Some(ball_radius) = state.volleyball().map(|b| b.radius()) else { return };

    let ids: Vec<PlayerId> = state.players.keys().copied().collect();
    for pid in ids {
        let Some(player) = state.players.get(&pid) else { continue };
        if player.role != PlayerRole::Chaser || player.inbounding.is_some() || player.knocked_out {
            continue;
        }
        let clearance = player.radius() + ball_radius;
        let pos = player.position;

        let blocking = state.hoops.values().find(|h| {
            h.team == player.team
                && (pos.x - h.position.x).abs() < clearance
                && (pos.y - h.position.y).abs() < h.radius
        });
        let Some(hoop) = blocking else { continue };

        let legal_x = if pos.x < hoop.position.x {
            hoop.position.x - clearance
        } else {
            hoop.position.x + clearance
        };
        let offset = Vec2::new(legal_x - pos.x, 0.0);
        let held = player.held_ball;

        if let Some(p) = state.players.get_mut(&pid) {
            p.position.x = legal_x;
            p.velocity = Vec2::ZERO;
        }
        if let Some(ball) = held.and_then(|b| state.balls.get_mut(&b)) {
            ball.position += offset;
            ball.velocity = Vec2::ZERO;
        }
        shift_contacts(state, pid, offset);
        debug!(player = pid.0, "held out of own hoop");
    }
}

// =============================================================================
// PITCH CLAMP
// =============================================================================

fn clamp_to_pitch(state: &GameState, position: Vec2, radius: f64) -> Vec2 {
    Vec2::new(
        position.x.clamp(radius, state.pitch.length - radius),
        position.y.clamp(radius, state.pitch.width - radius),
    )
}

/// Clamp every entity inside the pitch.
///
/// A clamped player stops and drags contact partners along. A live
/// volleyball leaving the pitch, loose or carried, starts inbounding.
pub fn enforce_pitch_bounds(state: &mut GameState) {
    let ids: Vec<PlayerId> = state.players.keys().copied().collect();
    for pid in ids {
        let Some(player) = state.players.get(&pid) else { continue };
        let clamped = clamp_to_pitch(state, player.position, player.radius());
        if clamped == player.position {
            continue;
        }
        let (unclamped, held) = (player.position, player.held_ball);

        if let Some(ball_id) = held {
            let live_volleyball = state.balls.get(&ball_id).is_some_and(|b| b.is_volleyball() && !b.is_dead());
            if live_volleyball {
                if let Some(ball) = state.balls.get_mut(&ball_id) {
                    ball.position = unclamped;
                }
                state.release_hold(ball_id);
                info!(player = pid.0, "volleyball carried out of bounds");
                start_inbounding(state);
            }
        }

        shift_contacts(state, pid, clamped - unclamped);
        if let Some(p) = state.players.get_mut(&pid) {
            p.position = clamped;
            p.velocity = Vec2::ZERO;
        }
    }

    let ids: Vec<BallId> = state.balls.keys().copied().collect();
    for id in ids {
        let Some(ball) = state.balls.get(&id) else { continue };
        let clamped = clamp_to_pitch(state, ball.position, ball.radius());
        if clamped == ball.position {
            continue;
        }
        let restart = ball.is_volleyball() && ball.holder.is_none() && !ball.is_dead();
        if let Some(ball) = state.balls.get_mut(&id) {
            ball.position = clamped;
            ball.velocity = Vec2::ZERO;
        }
        debug!(ball = id.0, "ball hit pitch boundary");
        if restart {
            start_inbounding(state);
        }
    }
}

/// Assign the nearest eligible opponent of the possessing team as
/// inbounder. No-op while an inbounder is already assigned.
pub fn start_inbounding(state: &mut GameState) {
    let Some(ball) = state.volleyball() else { return };
    let Some(vb) = ball.volleyball() else { return };
    if vb.inbounder.is_some() {
        return;
    }
    let (ball_id, possession) = (ball.id, ball.possession);

    let chosen = state
        .proximity
        .nearest_players(EntityId::Ball(ball_id))
        .into_iter()
        .filter_map(|(pid, _)| state.players.get(&pid))
        .find(|p| {
            Some(p.team) != possession
                && p.role.handles_volleyball()
                && p.inbounding.is_none()
                && p.held_ball.is_none()
                && !p.knocked_out
        })
        .map(|p| p.id);
    let Some(pid) = chosen else {
        debug!("no eligible inbounder");
        return;
    };

    if let Some(p) = state.players.get_mut(&pid) {
        p.inbounding = Some(ball_id);
        p.dodgeball_immunity = true;
    }
    state.release_hold(ball_id);
    if let Some(v) = state.balls.get_mut(&ball_id).and_then(|b| b.volleyball_mut()) {
        v.inbounder = Some(pid);
    }
    info!(player = pid.0, "inbounding started");
    state.push_event(GameEventData::InboundingStarted { player_id: pid, ball_id });
}
