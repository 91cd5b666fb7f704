//! Player Contact
//!
//! Discrete player-player collision: overlapping pairs share their
//! along-normal velocity, and every overlap is recorded on both players
//! for position correction and tackle detection later in the tick.

use tracing::debug;

use crate::core::vec2::Vec2;
use crate::game::spatial::EntityId;
use crate::game::state::{GameState, PlayerId};

/// Rebuild every player's contact list and resolve approaching pairs.
///
/// Reads candidates from `state.proximity`, which must reflect current
/// positions.
pub fn resolve_player_contacts(state: &mut GameState) {
    for player in state.players.values_mut() {
        player.contacts.clear();
    }

    let ids: Vec<PlayerId> = state.players.values().filter(|p| !p.knocked_out).map(|p| p.id).collect();
    for id in ids {
        let partners: Vec<(PlayerId, f64)> = state
            .proximity
            .nearest_players(EntityId::Player(id))
            .into_iter()
            .filter(|(other, _)| *other > id)
            .collect();

        for (other, d2) in partners {
            resolve_pair(state, id, other, d2);
        }
    }

    // Tackles only persist while the pair stays in contact
    for player in state.players.values_mut() {
        let contacts = &player.contacts;
        player.tackling.retain(|t| contacts.contains(t));
    }
}

fn resolve_pair(state: &mut GameState, a: PlayerId, b: PlayerId, d2: f64) {
    let (Some(pa), Some(pb)) = (state.players.get(&a), state.players.get(&b)) else { return };
    if pa.knocked_out || pb.knocked_out {
        return;
    }
    let reach = pa.radius() + pb.radius();
    if d2 >= reach * reach {
        return;
    }

    let Some(n) = (pb.position - pa.position).try_normalize() else {
        record_contact(state, a, b);
        return;
    };
    let (v1, v2) = (pa.velocity, pb.velocity);
    let (max1, max2) = (pa.tuning.max_speed, pb.tuning.max_speed);
    record_contact(state, a, b);

    let (dot1, dot2) = (v1.dot(n), v2.dot(n));
    if dot1 < 0.0 && dot2 > 0.0 {
        return; // separating
    }
    // The chaser is slower than what it pushes against
    if dot1 > 0.0 && dot2 > 0.0 && dot1.abs() < dot2.abs() {
        return;
    }
    if dot1 < 0.0 && dot2 < 0.0 && dot1.abs() > dot2.abs() {
        return;
    }

    let shared = (dot1 + dot2) / 2.0;
    let new1 = (v1 - n * dot1 + n * shared).clamp_length(max1);
    let new2 = (v2 - n * dot2 + n * shared).clamp_length(max2);

    if let Some(p) = state.players.get_mut(&a) {
        p.velocity = new1;
    }
    if let Some(p) = state.players.get_mut(&b) {
        p.velocity = new2;
    }
    debug!(a = a.0, b = b.0, shared, "player contact");
}

fn record_contact(state: &mut GameState, a: PlayerId, b: PlayerId) {
    for (me, other) in [(a, b), (b, a)] {
        if let Some(p) = state.players.get_mut(&me) {
            if !p.contacts.contains(&other) {
                p.contacts.push(other);
            }
        }
    }
}

/// Move every contact partner of `id` by `offset`.
pub fn shift_contacts(state: &mut GameState, id: PlayerId, offset: Vec2) {
    let partners = state.players.get(&id).map(|p| p.contacts.clone()).unwrap_or_default();
    for other in partners {
        if let Some(p) = state.players.get_mut(&other) {
            p.position += offset;
        }
    }
}
