//! Volleyball Rules
//!
//! Pickup, goal detection and dead-ball revival.

use tracing::{debug, info};

use crate::game::events::GameEventData;
use crate::game::spatial::EntityId;
use crate::game::state::{GameState, GoalCredit, HoopCrossing, HoopId, PlayerRole, Team};

// =============================================================================
// POSSESSION
// =============================================================================

/// Give a free volleyball to the nearest eligible chaser or keeper in reach.
///
/// A dead ball may only be taken by the possessing team's keeper, a
/// turnover ball only by its designated receiver, and an inbounding ball
/// only by its inbounder.
pub fn check_possession(state: &mut GameState) {
    let Some(ball) = state.volleyball() else { return };
    if ball.holder.is_some() {
        return;
    }
    let (ball_id, ball_radius, possession, turnover_to) = (ball.id, ball.radius(), ball.possession, ball.turnover_to);
    let (is_dead, inbounder) = ball.volleyball().map_or((false, None), |v| (v.is_dead, v.inbounder));

    let mut taker = None;
    for (pid, d2) in state.proximity.nearest_players(EntityId::Ball(ball_id)) {
        let Some(player) = state.players.get(&pid) else { continue };
        if turnover_to.is_some_and(|t| t != pid) {
            continue;
        }
        if player.knocked_out || player.catch_cooldown > 0.0 {
            continue;
        }
        if is_dead && !(player.role == PlayerRole::Keeper && possession == Some(player.team)) {
            continue;
        }
        if !player.role.handles_volleyball() {
            continue;
        }
        let reach = player.radius() + ball_radius;
        if d2 >= reach * reach {
            break;
        }
        if inbounder.is_none() || inbounder == Some(pid) {
            taker = Some((pid, player.team));
            break;
        }
    }

    let Some((pid, team)) = taker else { return };
    if let Some(ball) = state.balls.get_mut(&ball_id) {
        ball.holder = Some(pid);
        ball.possession = Some(team);
        ball.turnover_to = None;
    }
    if let Some(p) = state.players.get_mut(&pid) {
        p.held_ball = Some(ball_id);
        p.receiving_turnover = false;
    }
    debug!(player = pid.0, "volleyball picked up");
    state.push_event(GameEventData::VolleyballPickedUp { player_id: pid, ball_id });
}

// =============================================================================
// GOALS
// =============================================================================

/// Track hoop-plane crossings and confirm goals.
///
/// A crossing is recorded when the ball's path this tick passes a team's
/// hoop line inside a ring. A second crossing before confirmation clears
/// it. The goal counts once the ball is more than its radius past the
/// crossing point.
pub fn check_goals(state: &mut GameState) {
    let Some(ball) = state.volleyball() else { return };
    if ball.is_dead() || ball.turnover_to.is_some() {
        return;
    }
    let ball_id = ball.id;
    let (prev, curr) = (ball.previous_position, ball.position);

    for team in Team::ALL {
        let Some(hoop_x) = state.center_hoop(team).map(|h| h.position.x) else { continue };
        let t = if prev.x != curr.x {
            (hoop_x - prev.x) / (curr.x - prev.x)
        } else {
            f64::INFINITY
        };
        if !(t > 0.0 && t < 1.0) {
            continue;
        }
        let cross_y = prev.y + (curr.y - prev.y) * t;
        let ring = state
            .hoops
            .values()
            .find(|h| h.team == team && cross_y >= h.position.y - h.radius && cross_y <= h.position.y + h.radius)
            .map(|h| h.id);
        let Some(hoop) = ring else { continue };

        if let Some(vb) = state.balls.get_mut(&ball_id).and_then(|b| b.volleyball_mut()) {
            vb.crossed_hoop = match vb.crossed_hoop {
                None => Some(HoopCrossing { hoop, y: cross_y }),
                Some(_) => {
                    debug!(hoop = hoop.0, "volleyball crossed back through hoop");
                    None
                }
            };
        }
    }

    confirm_goal(state);
}

fn confirm_goal(state: &mut GameState) {
    let Some(ball) = state.volleyball() else { return };
    let Some(crossing) = ball.volleyball().and_then(|v| v.crossed_hoop) else { return };
    let Some(hoop) = state.hoops.get(&crossing.hoop) else { return };

    let dx = ball.position.x - hoop.position.x;
    let dy = ball.position.y - crossing.y;
    if dx.hypot(dy) <= ball.radius() {
        return;
    }

    let ball_id = ball.id;
    let (hoop_id, hoop_team): (HoopId, Team) = (hoop.id, hoop.team);
    let credited = match state.scoring.credit {
        GoalCredit::HoopOwner => hoop_team,
        GoalCredit::Attacker => hoop_team.opponent(),
    };
    let points = state.scoring.goal_points;
    state.score[credited.index()] += points;

    state.release_hold(ball_id);
    let keeper = state.keeper_of(hoop_team);
    if let Some(ball) = state.balls.get_mut(&ball_id) {
        ball.possession = keeper.map(|_| hoop_team);
        if let Some(vb) = ball.volleyball_mut() {
            vb.crossed_hoop = None;
            vb.is_dead = true;
        }
    }

    let score = state.score;
    info!(hoop = hoop_id.0, ?credited, ?score, "goal");
    state.push_event(GameEventData::GoalScored { hoop_id, credited, points, score });
}

// =============================================================================
// REVIVAL
// =============================================================================

/// Bring a dead volleyball back into play once the rightful keeper holds
/// it inside their own half.
pub fn check_revival(state: &mut GameState) {
    let Some(ball) = state.volleyball() else { return };
    if !ball.is_dead() {
        return;
    }
    let Some(holder) = ball.holder.and_then(|h| state.players.get(&h)) else { return };
    if holder.role != PlayerRole::Keeper || ball.possession != Some(holder.team) {
        return;
    }
    if !state.pitch.in_own_half(holder.team, holder.position.x) {
        return;
    }

    let (ball_id, keeper_id) = (ball.id, holder.id);
    if let Some(vb) = state.balls.get_mut(&ball_id).and_then(|b| b.volleyball_mut()) {
        vb.is_dead = false;
    }
    info!(keeper = keeper_id.0, "volleyball revived");
    state.push_event(GameEventData::VolleyballRevived { keeper_id, ball_id });
}
