//! End-to-end match scenarios driven through `Match::update`.

use quadball::game::events::GameEventData;
use quadball::game::snapshot;
use quadball::game::state::{BallTuning, GameState, Pitch, PlayerRole, PlayerTuning, Team};
use quadball::{BallId, GameEvent, Match, MatchConfig, PlayerId, Vec2};

const DT: f64 = 0.15;
const DODGEBALL_DEAD_SPEED: f64 = 4.0 / 3.0;

fn empty_state() -> GameState {
    GameState::new(Pitch::standard(), 11)
}

fn add_left_hoops(state: &mut GameState) {
    for y in [16.5 + 2.75, 16.5, 16.5 - 2.75] {
        state.add_hoop(Team::Left, Vec2::new(13.5, y), 0.43, 0.1);
    }
}

fn hold(state: &mut GameState, player: PlayerId, ball: BallId) {
    let team = state.players[&player].team;
    let position = state.players[&player].position;
    let b = state.balls.get_mut(&ball).unwrap();
    b.holder = Some(player);
    b.possession = Some(team);
    b.position = position;
    state.players.get_mut(&player).unwrap().held_ball = Some(ball);
}

/// Run until `pred` matches an event, returning every event seen.
fn run_until(m: &mut Match, max_ticks: u32, pred: impl Fn(&GameEvent) -> bool) -> (Vec<GameEvent>, bool) {
    let mut seen = Vec::new();
    for _ in 0..max_ticks {
        let events = m.update(DT).events;
        let hit = events.iter().any(&pred);
        seen.extend(events);
        if hit {
            return (seen, true);
        }
    }
    (seen, false)
}

#[test]
fn head_on_chasers_stop_each_other() {
    let mut state = empty_state();
    let t = PlayerTuning::default();
    let a = state.add_player(Team::Left, PlayerRole::Chaser, Vec2::new(20.0, 10.0), t);
    let b = state.add_player(Team::Right, PlayerRole::Chaser, Vec2::new(20.5, 10.0), t);
    for (id, dir) in [(a, Vec2::RIGHT), (b, Vec2::LEFT)] {
        let p = state.players.get_mut(&id).unwrap();
        p.direction = dir;
        p.velocity = dir;
    }
    state.start();
    let mut m = Match::new(state);

    m.update(DT);

    let s = m.state();
    assert!(s.players[&a].velocity.length() < 1e-12);
    assert!(s.players[&b].velocity.length() < 1e-12);
    assert_eq!(s.players[&a].position, Vec2::new(20.0, 10.0));
    assert_eq!(s.players[&a].contacts, vec![b]);
    assert_eq!(s.players[&b].contacts, vec![a]);
}

#[test]
fn goal_scores_kills_ball_and_keeper_revives_it() {
    let mut state = empty_state();
    add_left_hoops(&mut state);
    let keeper = state.add_player(Team::Left, PlayerRole::Keeper, Vec2::new(5.0, 5.0), PlayerTuning::default());
    let vb = state.add_volleyball(Vec2::new(13.7, 16.5), BallTuning::volleyball());
    state.balls.get_mut(&vb).unwrap().velocity = Vec2::new(-1.5, 0.0);
    state.start();
    let mut m = Match::new(state);

    let first = m.update(DT);
    assert!(first.events.iter().all(|e| !matches!(e.data, GameEventData::GoalScored { .. })));
    assert!(m.state().volleyball().unwrap().volleyball().unwrap().crossed_hoop.is_some());

    let second = m.update(DT);
    let goal = second
        .events
        .iter()
        .find(|e| matches!(e.data, GameEventData::GoalScored { .. }))
        .expect("goal on second tick");
    assert!(matches!(goal.data, GameEventData::GoalScored { credited: Team::Left, points: 10, .. }));
    assert_eq!(m.score(), [10, 0]);
    let ball = m.state().volleyball().unwrap();
    assert!(ball.is_dead());
    assert_eq!(ball.possession, Some(Team::Left));

    let (_, revived) = run_until(&mut m, 400, |e| matches!(e.data, GameEventData::VolleyballRevived { .. }));
    assert!(revived);
    let ball = m.state().volleyball().unwrap();
    assert!(!ball.is_dead());
    assert_eq!(ball.holder, Some(keeper));
    assert_eq!(m.score(), [10, 0]);
}

#[test]
fn ball_out_of_bounds_is_inbounded_by_nearest_player() {
    let mut state = empty_state();
    let t = PlayerTuning::default();
    let near = state.add_player(Team::Left, PlayerRole::Chaser, Vec2::new(30.0, 25.0), t);
    state.add_player(Team::Right, PlayerRole::Chaser, Vec2::new(20.0, 20.0), t);
    let vb = state.add_volleyball(Vec2::new(30.0, 32.5), BallTuning::volleyball());
    state.balls.get_mut(&vb).unwrap().velocity = Vec2::new(0.0, 4.0);
    state.start();
    let mut m = Match::new(state);

    let events = m.update(DT).events;
    assert!(events
        .iter()
        .any(|e| e.data == GameEventData::InboundingStarted { player_id: near, ball_id: vb }));
    let ball = m.state().volleyball().unwrap();
    assert!(ball.position.y <= 33.0 - ball.radius() + 1e-12);
    assert_eq!(ball.velocity, Vec2::ZERO);
    let player = m.state().player(near).unwrap();
    assert_eq!(player.inbounding, Some(vb));
    assert!(player.dodgeball_immunity);

    let (_, ended) = run_until(&mut m, 200, |e| {
        e.data == GameEventData::InboundingEnded { player_id: near, ball_id: vb }
    });
    assert!(ended);
    let player = m.state().player(near).unwrap();
    assert_eq!(player.inbounding, None);
    assert!(!player.dodgeball_immunity);
    let ball = m.state().volleyball().unwrap();
    assert_eq!(ball.volleyball().unwrap().inbounder, None);
    assert_eq!(ball.holder, Some(near));
}

#[test]
fn knockout_resets_beat_attempts() {
    let mut state = empty_state();
    let t = PlayerTuning::default();
    let target = state.add_player(Team::Left, PlayerRole::Chaser, Vec2::new(20.0, 10.0), t);
    let thrower = state.add_player(Team::Right, PlayerRole::Beater, Vec2::new(40.0, 10.0), t);
    let thrown = state.add_dodgeball(Vec2::new(19.2, 10.0), BallTuning::dodgeball(), DODGEBALL_DEAD_SPEED);
    let idle = state.add_dodgeball(Vec2::new(5.0, 5.0), BallTuning::dodgeball(), DODGEBALL_DEAD_SPEED);
    {
        let b = state.balls.get_mut(&thrown).unwrap();
        b.possession = Some(Team::Right);
        b.previous_thrower = Some(thrower);
        b.velocity = Vec2::new(4.0, 0.0);
    }
    state.balls.get_mut(&idle).unwrap().dodgeball_mut().unwrap().beat_attempt_time = 1.0;
    state.start();
    let mut m = Match::new(state);

    let events = m.update(DT).events;

    assert!(events
        .iter()
        .any(|e| e.data == GameEventData::KnockedOut { player_id: target, ball_id: thrown }));
    assert!(m.state().player(target).unwrap().knocked_out);
    assert!(m.state().ball(thrown).unwrap().velocity.x < 0.0);
    assert_eq!(m.state().ball(idle).unwrap().dodgeball().unwrap().beat_attempt_time, 0.0);
}

#[test]
fn third_dodgeball_interference_turns_balls_over() {
    let mut state = empty_state();
    let t = PlayerTuning::default();
    let b1 = state.add_player(Team::Left, PlayerRole::Beater, Vec2::new(10.0, 5.0), t);
    let b2 = state.add_player(Team::Left, PlayerRole::Beater, Vec2::new(10.0, 8.0), t);
    let offender = state.add_player(Team::Left, PlayerRole::Beater, Vec2::new(22.0, 20.0), t);
    let chaser = state.add_player(Team::Right, PlayerRole::Chaser, Vec2::new(40.0, 20.0), t);
    let r1 = state.add_player(Team::Right, PlayerRole::Beater, Vec2::new(40.0, 10.0), t);
    let r2 = state.add_player(Team::Right, PlayerRole::Beater, Vec2::new(40.0, 12.0), t);
    let vb = state.add_volleyball(Vec2::new(30.0, 16.5), BallTuning::volleyball());
    let d1 = state.add_dodgeball(Vec2::ZERO, BallTuning::dodgeball(), DODGEBALL_DEAD_SPEED);
    let d2 = state.add_dodgeball(Vec2::ZERO, BallTuning::dodgeball(), DODGEBALL_DEAD_SPEED);
    let d3 = state.add_dodgeball(Vec2::new(25.0, 20.0), BallTuning::dodgeball(), DODGEBALL_DEAD_SPEED);
    hold(&mut state, b1, d1);
    hold(&mut state, b2, d2);
    state.start();
    let mut m = Match::new(state);

    let events = m.update(DT).events;
    assert!(events
        .iter()
        .any(|e| e.data == GameEventData::ThirdDodgeballAssigned { ball_id: d3, team: Team::Right }));

    // The third Left beater reaches for the reserved ball
    m.state_mut().players.get_mut(&offender).unwrap().position = Vec2::new(25.2, 20.0);
    let events = m.update(DT).events;

    let penalty = events
        .iter()
        .find_map(|e| match e.data {
            GameEventData::InterferencePenalty { player_id, ball_id, second_ball_id } => {
                Some((player_id, ball_id, second_ball_id))
            }
            _ => None,
        })
        .expect("interference penalty");
    assert_eq!((penalty.0, penalty.1), (offender, d3));
    let second = penalty.2;
    assert!(second == d1 || second == d2);

    let s = m.state();
    assert!(s.players[&offender].knocked_out);
    assert_eq!(s.third_dodgeball, None);
    assert_eq!(s.balls[&vb].turnover_to, Some(chaser));
    assert_eq!(s.balls[&d3].turnover_to, Some(r2));
    assert_eq!(s.balls[&second].turnover_to, Some(r1));
    assert_eq!(s.balls[&second].holder, None);
    assert!(s.players[&r1].receiving_turnover && s.players[&r2].receiving_turnover);
}

#[test]
fn stalling_in_own_half_warns_then_turns_over() {
    let mut state = empty_state();
    let t = PlayerTuning::default();
    let carrier = state.add_player(Team::Left, PlayerRole::Chaser, Vec2::new(20.0, 16.5), t);
    let opponent = state.add_player(Team::Right, PlayerRole::Chaser, Vec2::new(50.0, 16.5), t);
    let vb = state.add_volleyball(Vec2::ZERO, BallTuning::volleyball());
    hold(&mut state, carrier, vb);
    state.start();
    let mut m = Match::new(state);

    let (events, penalised) = run_until(&mut m, 300, |e| {
        e.data == GameEventData::DelayOfGamePenalty { team: Team::Left }
    });
    assert!(penalised);
    let warning = events
        .iter()
        .position(|e| e.data == GameEventData::DelayOfGameWarning { team: Team::Left, warnings: 1 })
        .expect("warning before penalty");
    let penalty = events
        .iter()
        .position(|e| e.data == GameEventData::DelayOfGamePenalty { team: Team::Left })
        .unwrap();
    assert!(warning < penalty);
    assert!(events
        .iter()
        .any(|e| e.data == GameEventData::TurnoverDesignated { ball_id: vb, player_id: opponent }));

    let s = m.state();
    assert_eq!(s.delay_of_game_warnings, [2, 0]);
    assert_eq!(s.balls[&vb].holder, None);
    assert_eq!(s.balls[&vb].turnover_to, Some(opponent));
    assert!(s.players[&carrier].held_ball.is_none());
}

#[test]
fn snapshot_resumes_standard_match() {
    let mut m = Match::from_config(&MatchConfig { seed: 2024, ..Default::default() }).unwrap();
    for t in 0..60u16 {
        for id in 0..12u16 {
            let dir = Vec2::new(((t + id) % 5) as f64 - 2.0, ((t * 3 + id) % 3) as f64 - 1.0);
            m.set_direction(PlayerId(id), dir).unwrap();
        }
        m.update(DT);
    }

    let json = snapshot::to_json(m.state()).unwrap();
    let bytes = snapshot::to_bytes(m.state()).unwrap();
    let mut from_json = Match::new(snapshot::from_json(&json).unwrap());
    let mut from_bytes = Match::new(snapshot::from_bytes(&bytes).unwrap());
    assert_eq!(from_json.compute_hash(), m.compute_hash());

    for _ in 0..60 {
        m.update(DT);
        from_json.update(DT);
        from_bytes.update(DT);
    }
    assert_eq!(from_json.compute_hash(), m.compute_hash());
    assert_eq!(from_bytes.compute_hash(), m.compute_hash());
}
