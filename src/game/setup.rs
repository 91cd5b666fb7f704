//! Standard Match Layout
//!
//! Builds a populated state from a `MatchConfig`: three hoops per end, the
//! volleyball at center, one dodgeball on the midline and one at each
//! keeper-zone line, and each roster lined up near its own end.

use crate::config::MatchConfig;
use crate::core::vec2::Vec2;
use crate::game::state::{GameState, Pitch, PlayerRole, Team};

/// Build the standard match described by `config`. The state is left in
/// `Waiting`; call `start` to begin play.
pub fn standard_match(config: &MatchConfig) -> GameState {
    let geo = &config.pitch;
    let pitch = Pitch::new(geo.length, geo.width, geo.keeper_zone);
    let mut state = GameState::new(pitch, config.seed);

    state.delay_of_game = config.delay_of_game.clone();
    state.scoring = config.scoring.clone();
    state.beat_attempt_time_limit = config.beat_attempt_time_limit;
    state.seeker_floor = config.seeker_floor;

    let mid_y = geo.width / 2.0;
    for team in Team::ALL {
        let x = match team {
            Team::Left => geo.hoop_x,
            Team::Right => geo.length - geo.hoop_x,
        };
        for offset in [geo.hoop_spacing, 0.0, -geo.hoop_spacing] {
            state.add_hoop(team, Vec2::new(x, mid_y + offset), geo.hoop_radius, geo.hoop_thickness);
        }
    }

    state.add_volleyball(state.pitch.center(), config.volleyball);
    for position in [
        Vec2::new(geo.length / 2.0, config.dodgeball_start_y),
        Vec2::new(geo.keeper_zone, mid_y),
        Vec2::new(geo.length - geo.keeper_zone, mid_y),
    ] {
        state.add_dodgeball(position, config.dodgeball, config.dodgeball_dead_speed);
    }

    let roster = &config.roster;
    let lineup = [
        (PlayerRole::Chaser, roster.chasers),
        (PlayerRole::Keeper, roster.keepers),
        (PlayerRole::Beater, roster.beaters),
    ];
    for team in Team::ALL {
        let x = match team {
            Team::Left => roster.spawn_x,
            Team::Right => geo.length - roster.spawn_x,
        };
        let mut placed = 0u16;
        for (role, count) in lineup {
            for _ in 0..count {
                let y = mid_y + placed as f64 * roster.spawn_spacing;
                state.add_player(team, role, Vec2::new(x, y), config.players.for_role(role));
                placed += 1;
            }
        }
    }

    state
}
