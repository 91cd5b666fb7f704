//! Dodgeball Rules
//!
//! Beater pickups, beats and the third-dodgeball reservation.

use tracing::{debug, info};

use crate::core::vec2::Vec2;
use crate::game::events::GameEventData;
use crate::game::penalty::{apply_interference_penalty, third_dodgeball_interference};
use crate::game::spatial::EntityId;
use crate::game::state::{BallId, GameState, PlayerId, PlayerRole, Team, ThirdDodgeball};

// =============================================================================
// PICKUPS & BEATS
// =============================================================================

/// Resolve every dodgeball against the players it touches, nearest first.
///
/// Neutral balls, own-team balls for beaters and turnover balls for their
/// receiver are pickups. Everything else is a beat check. A ball stops
/// scanning after a pickup.
pub fn check_interactions(state: &mut GameState) {
    for ball_id in state.dodgeball_ids() {
        let candidates = state.proximity.nearest_players(EntityId::Ball(ball_id));
        for (pid, d2) in candidates {
            let Some(ball) = state.balls.get(&ball_id) else { break };
            let Some(player) = state.players.get(&pid) else { continue };
            if player.knocked_out {
                continue;
            }
            let reach = player.radius() + ball.radius();
            if d2 >= reach * reach {
                continue;
            }
            if ball.turnover_to.is_some_and(|t| t != pid) {
                continue;
            }

            let pickup = match ball.possession {
                None => true,
                Some(team) if team == player.team => player.role == PlayerRole::Beater,
                Some(_) => ball.turnover_to.is_some() && player.receiving_turnover,
            };
            if pickup {
                if try_pickup(state, pid, ball_id) {
                    break;
                }
            } else {
                check_beat(state, pid, ball_id);
            }
        }
    }
}

/// Beater catch. Returns `true` when the touch was consumed, either as a
/// catch or as third-dodgeball interference.
fn try_pickup(state: &mut GameState, pid: PlayerId, ball_id: BallId) -> bool {
    let Some(player) = state.players.get(&pid) else { return false };
    if player.catch_cooldown > 0.0 || player.role != PlayerRole::Beater || player.held_ball.is_some() {
        return false;
    }
    let Some(ball) = state.balls.get(&ball_id) else { return false };
    if ball.holder.is_some() {
        return false;
    }
    let team = player.team;

    if state.third_dodgeball.is_some_and(|t| t.ball == ball_id && t.team != team) {
        third_dodgeball_interference(state, pid, ball_id);
        return true;
    }

    if let Some(ball) = state.balls.get_mut(&ball_id) {
        ball.holder = Some(pid);
        ball.possession = Some(team);
        ball.turnover_to = None;
    }
    if let Some(p) = state.players.get_mut(&pid) {
        p.held_ball = Some(ball_id);
        p.receiving_turnover = false;
    }
    debug!(player = pid.0, ball = ball_id.0, "dodgeball picked up");
    state.push_event(GameEventData::DodgeballPickedUp { player_id: pid, ball_id });
    true
}

/// Thrown-ball contact. Returns `true` on a knockout.
fn check_beat(state: &mut GameState, pid: PlayerId, ball_id: BallId) -> bool {
    let (Some(ball), Some(player)) = (state.balls.get(&ball_id), state.players.get(&pid)) else {
        return false;
    };
    if ball.holder.is_some() {
        return false;
    }
    let normal = (ball.position - player.position).try_normalize();
    let loss = ball.tuning.reflect_loss;

    if ball.possession == Some(player.team) || player.dodgeball_immunity {
        if ball.previous_thrower == Some(pid) && player.catch_cooldown > 0.0 {
            return false;
        }
        if let Some(ball) = state.balls.get_mut(&ball_id) {
            ball.possession = None;
            if let Some(n) = normal {
                ball.velocity = ball.velocity.reflect(n, loss);
            }
        }
        debug!(player = pid.0, ball = ball_id.0, "dodgeball deflected");
        return false;
    }

    if let Some(p) = state.players.get_mut(&pid) {
        p.knocked_out = true;
    }
    drop_held_ball(state, pid);
    if let Some(ball) = state.balls.get_mut(&ball_id) {
        if let Some(n) = normal {
            ball.velocity = ball.velocity.reflect(n, loss);
        }
    }
    state.reset_beat_attempts();
    state.pending_interference = None;
    state.third_dodgeball = None;

    info!(player = pid.0, ball = ball_id.0, "knocked out");
    state.push_event(GameEventData::KnockedOut { player_id: pid, ball_id });
    true
}

fn drop_held_ball(state: &mut GameState, pid: PlayerId) {
    let Some(held) = state.players.get_mut(&pid).and_then(|p| p.held_ball.take()) else { return };
    if let Some(ball) = state.balls.get_mut(&held) {
        ball.holder = None;
        ball.velocity = Vec2::ZERO;
        ball.possession = None;
    }
    debug!(player = pid.0, ball = held.0, "dropped ball on knockout");
    state.push_event(GameEventData::Dropped { player_id: pid, ball_id: held });
}

// =============================================================================
// THIRD DODGEBALL
// =============================================================================

#[derive(Default)]
struct Control {
    loose: Vec<BallId>,
    held: [Vec<BallId>; 2],
    thrown: [Vec<BallId>; 2],
}

fn classify(state: &GameState) -> Control {
    let mut control = Control::default();
    for ball in state.balls.values().filter(|b| b.is_dodgeball()) {
        match (ball.possession, ball.holder.and_then(|h| state.players.get(&h))) {
            (None, _) => control.loose.push(ball.id),
            (Some(_), Some(holder)) => control.held[holder.team.index()].push(ball.id),
            (Some(team), None) => control.thrown[team.index()].push(ball.id),
        }
    }
    control
}

/// Run beat-attempt timers and maintain the third-dodgeball reservation.
///
/// Only active with exactly three dodgeballs in play.
pub fn check_third_dodgeball(state: &mut GameState, dt: f64) {
    let ids = state.dodgeball_ids();
    if ids.len() != 3 {
        return;
    }

    let limit = state.beat_attempt_time_limit;
    let mut expired = false;
    for id in &ids {
        if let Some(d) = state.balls.get_mut(id).and_then(|b| b.dodgeball_mut()) {
            if d.beat_attempt_time > 0.0 {
                d.beat_attempt_time += dt;
                expired |= d.beat_attempt_time > limit;
            }
        }
    }
    if expired {
        if let Some(pending) = state.pending_interference {
            if let Some(d) = state.balls.get_mut(&pending.ball).and_then(|b| b.dodgeball_mut()) {
                d.beat_attempt_time = 0.0;
            }
            info!(player = pending.player.0, "beat attempt expired");
            apply_interference_penalty(state, pending.player, pending.ball);
        }
    }

    let control = classify(state);
    match state.third_dodgeball {
        None => assign_reservation(state, &control),
        Some(flag) => {
            let t = flag.team.index();
            if !control.held[t].is_empty() || !control.thrown[t].is_empty() {
                state.third_dodgeball = None;
                state.pending_interference = None;
                state.reset_beat_attempts();
                info!(ball = flag.ball.0, "third dodgeball lifted");
                state.push_event(GameEventData::ThirdDodgeballLifted { ball_id: flag.ball });
            } else {
                start_beat_attempts(state, &control.thrown[flag.team.opponent().index()], dt);
            }
        }
    }
}

fn assign_reservation(state: &mut GameState, control: &Control) {
    let [loose] = control.loose.as_slice() else { return };
    let team = match (control.held[0].len(), control.held[1].len()) {
        (2, 0) => Team::Right,
        (0, 2) => Team::Left,
        _ => return,
    };
    state.third_dodgeball = Some(ThirdDodgeball { ball: *loose, team });
    info!(ball = loose.0, ?team, "third dodgeball assigned");
    state.push_event(GameEventData::ThirdDodgeballAssigned { ball_id: *loose, team });
}

fn start_beat_attempts(state: &mut GameState, thrown: &[BallId], dt: f64) {
    for id in thrown {
        let Some(ball) = state.balls.get_mut(id) else { continue };
        if ball.holder.is_some() {
            continue;
        }
        if let Some(d) = ball.dodgeball_mut() {
            if d.beat_attempt_time == 0.0 {
                d.beat_attempt_time = dt;
                debug!(ball = id.0, "beat attempt started");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::spatial::ProximityIndex;
    use crate::game::state::{BallTuning, Pitch, PlayerTuning};

    fn refresh(s: &mut GameState) {
        s.proximity = ProximityIndex::build(&s.players, &s.balls);
    }

    fn hold(s: &mut GameState, pid: PlayerId, ball: BallId) {
        let team = s.players[&pid].team;
        let b = s.balls.get_mut(&ball).unwrap();
        b.holder = Some(pid);
        b.possession = Some(team);
        s.players.get_mut(&pid).unwrap().held_ball = Some(ball);
    }

    #[test]
    fn test_beat_knocks_out_and_drops() {
        let mut s = GameState::new(Pitch::standard(), 2);
        let t = PlayerTuning::default();
        let thrower = s.add_player(Team::Left, PlayerRole::Beater, Vec2::new(20.0, 10.0), t);
        let target = s.add_player(Team::Right, PlayerRole::Chaser, Vec2::new(30.0, 10.0), t);
        let vb = s.add_volleyball(Vec2::new(30.0, 10.0), BallTuning::volleyball());
        let db = s.add_dodgeball(Vec2::new(29.7, 10.0), BallTuning::dodgeball(), 1.0);
        let other = s.add_dodgeball(Vec2::new(5.0, 5.0), BallTuning::dodgeball(), 1.0);
        hold(&mut s, target, vb);
        {
            let b = s.balls.get_mut(&db).unwrap();
            b.possession = Some(Team::Left);
            b.previous_thrower = Some(thrower);
            b.velocity = Vec2::new(3.0, 0.0);
        }
        s.balls.get_mut(&other).unwrap().dodgeball_mut().unwrap().beat_attempt_time = 1.0;
        refresh(&mut s);

        check_interactions(&mut s);

        assert!(s.players[&target].knocked_out);
        assert!(s.players[&target].held_ball.is_none());
        assert!(s.balls[&vb].holder.is_none());
        assert_eq!(s.balls[&vb].possession, None);
        assert!(s.balls[&db].velocity.x < 0.0);
        assert_eq!(s.balls[&other].dodgeball().unwrap().beat_attempt_time, 0.0);
    }

    #[test]
    fn test_immune_keeper_deflects() {
        let mut s = GameState::new(Pitch::standard(), 2);
        let keeper = s.add_player(Team::Right, PlayerRole::Keeper, Vec2::new(50.0, 10.0), PlayerTuning::default());
        s.players.get_mut(&keeper).unwrap().dodgeball_immunity = true;
        let db = s.add_dodgeball(Vec2::new(49.7, 10.0), BallTuning::dodgeball(), 1.0);
        {
            let b = s.balls.get_mut(&db).unwrap();
            b.possession = Some(Team::Left);
            b.velocity = Vec2::new(3.0, 0.0);
        }
        refresh(&mut s);

        check_interactions(&mut s);

        assert!(!s.players[&keeper].knocked_out);
        assert_eq!(s.balls[&db].possession, None);
        assert!((s.balls[&db].velocity.x + 1.8).abs() < 1e-9);
    }

    #[test]
    fn test_neutral_ball_picked_up_by_beater() {
        let mut s = GameState::new(Pitch::standard(), 2);
        let beater = s.add_player(Team::Left, PlayerRole::Beater, Vec2::new(20.0, 10.0), PlayerTuning::default());
        let db = s.add_dodgeball(Vec2::new(20.1, 10.0), BallTuning::dodgeball(), 1.0);
        refresh(&mut s);

        check_interactions(&mut s);

        assert_eq!(s.balls[&db].holder, Some(beater));
        assert_eq!(s.players[&beater].held_ball, Some(db));
    }

    #[test]
    fn test_thrower_ignored_during_cooldown() {
        let mut s = GameState::new(Pitch::standard(), 2);
        let beater = s.add_player(Team::Left, PlayerRole::Beater, Vec2::new(20.0, 10.0), PlayerTuning::default());
        s.players.get_mut(&beater).unwrap().catch_cooldown = 0.3;
        let db = s.add_dodgeball(Vec2::new(20.1, 10.0), BallTuning::dodgeball(), 1.0);
        {
            let b = s.balls.get_mut(&db).unwrap();
            b.possession = Some(Team::Left);
            b.previous_thrower = Some(beater);
            b.velocity = Vec2::new(4.0, 0.0);
        }
        refresh(&mut s);

        check_interactions(&mut s);

        assert_eq!(s.balls[&db].velocity, Vec2::new(4.0, 0.0));
        assert_eq!(s.balls[&db].possession, Some(Team::Left));
    }

    fn three_ball_state() -> (GameState, [BallId; 3]) {
        let mut s = GameState::new(Pitch::standard(), 2);
        let t = PlayerTuning::default();
        let a = s.add_player(Team::Left, PlayerRole::Beater, Vec2::new(10.0, 10.0), t);
        let b = s.add_player(Team::Left, PlayerRole::Beater, Vec2::new(10.0, 20.0), t);
        let d0 = s.add_dodgeball(Vec2::new(10.0, 10.0), BallTuning::dodgeball(), 1.0);
        let d1 = s.add_dodgeball(Vec2::new(10.0, 20.0), BallTuning::dodgeball(), 1.0);
        let d2 = s.add_dodgeball(Vec2::new(30.0, 16.5), BallTuning::dodgeball(), 1.0);
        hold(&mut s, a, d0);
        hold(&mut s, b, d1);
        (s, [d0, d1, d2])
    }

    #[test]
    fn test_reservation_assigned_and_lifted() {
        let (mut s, [_, _, loose]) = three_ball_state();
        check_third_dodgeball(&mut s, 0.15);
        assert_eq!(s.third_dodgeball, Some(ThirdDodgeball { ball: loose, team: Team::Right }));

        let right = s.add_player(Team::Right, PlayerRole::Beater, Vec2::new(30.0, 16.5), PlayerTuning::default());
        hold(&mut s, right, loose);
        check_third_dodgeball(&mut s, 0.15);
        assert!(s.third_dodgeball.is_none());
    }

    #[test]
    fn test_thrown_ball_starts_attempt_timer() {
        let (mut s, [d0, _, _]) = three_ball_state();
        check_third_dodgeball(&mut s, 0.15);
        s.release_hold(d0);
        check_third_dodgeball(&mut s, 0.15);
        assert_eq!(s.balls[&d0].dodgeball().unwrap().beat_attempt_time, 0.15);
        check_third_dodgeball(&mut s, 0.15);
        assert!((s.balls[&d0].dodgeball().unwrap().beat_attempt_time - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_expired_attempt_applies_pending_interference() {
        let (mut s, [d0, d1, reserved]) = three_ball_state();
        let t = PlayerTuning::default();
        let offender = s.balls[&d0].holder.unwrap();
        let near_reserved = s.add_player(Team::Right, PlayerRole::Beater, Vec2::new(28.0, 16.5), t);
        let near_thrown = s.add_player(Team::Right, PlayerRole::Beater, Vec2::new(12.0, 10.0), t);
        let chaser = s.add_player(Team::Right, PlayerRole::Chaser, Vec2::new(21.0, 16.5), t);
        let vb = s.add_volleyball(Vec2::new(20.0, 16.5), BallTuning::volleyball());

        check_third_dodgeball(&mut s, 0.15);
        assert_eq!(s.third_dodgeball, Some(ThirdDodgeball { ball: reserved, team: Team::Right }));
        s.release_hold(d0);
        check_third_dodgeball(&mut s, 0.15);
        assert!(s.balls[&d0].dodgeball().unwrap().beat_attempt_time > 0.0);

        third_dodgeball_interference(&mut s, offender, reserved);
        assert!(s.pending_interference.is_some());
        assert!(!s.players[&offender].knocked_out);

        refresh(&mut s);
        let limit = s.beat_attempt_time_limit;
        check_third_dodgeball(&mut s, limit);

        assert!(s.players[&offender].knocked_out);
        assert_eq!(s.balls[&reserved].turnover_to, Some(near_reserved));
        assert_eq!(s.balls[&d0].turnover_to, Some(near_thrown));
        assert_eq!(s.balls[&d1].turnover_to, None);
        assert_eq!(s.balls[&vb].turnover_to, Some(chaser));
        assert!(s.third_dodgeball.is_none());
        assert!(s.pending_interference.is_none());
        assert!(s
            .take_events()
            .iter()
            .any(|e| e.data == GameEventData::InterferencePenalty {
                player_id: offender,
                ball_id: reserved,
                second_ball_id: d0,
            }));
    }

    #[test]
    fn test_inactive_without_three_balls() {
        let mut s = GameState::new(Pitch::standard(), 2);
        s.add_dodgeball(Vec2::new(10.0, 10.0), BallTuning::dodgeball(), 1.0);
        check_third_dodgeball(&mut s, 0.15);
        assert!(s.third_dodgeball.is_none());
    }
}
