//! Spatial Proximity Index
//!
//! Squared distances between every interacting entity pair, recomputed once
//! per tick after position correction. Rule code scans `nearest()` lists in
//! ascending order and stops at the first candidate beyond its threshold, so
//! each list must be complete and sorted.
//!
//! Skipped pairs:
//! - anything involving a knocked-out player
//! - beater with chaser or keeper
//! - beater with the volleyball

use std::collections::BTreeMap;

use crate::game::state::{Ball, BallId, Player, PlayerId, PlayerRole};

/// A player or a ball.
///
/// Players order before balls, so nearest-first ties resolve the same way
/// on every run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityId {
    /// A player
    Player(PlayerId),
    /// A ball
    Ball(BallId),
}

impl EntityId {
    /// Player id, if this is a player.
    #[inline]
    pub fn player(self) -> Option<PlayerId> {
        match self {
            EntityId::Player(id) => Some(id),
            EntityId::Ball(_) => None,
        }
    }

    /// Ball id, if this is a ball.
    #[inline]
    pub fn ball(self) -> Option<BallId> {
        match self {
            EntityId::Ball(id) => Some(id),
            EntityId::Player(_) => None,
        }
    }
}

/// Pair lookup plus per-entity nearest-first lists.
#[derive(Clone, Debug, Default)]
pub struct ProximityIndex {
    pairs: BTreeMap<(EntityId, EntityId), f64>,
    nearest: BTreeMap<EntityId, Vec<(EntityId, f64)>>,
}

#[inline]
fn ordered(a: EntityId, b: EntityId) -> (EntityId, EntityId) {
    if a <= b { (a, b) } else { (b, a) }
}

fn players_interact(a: &Player, b: &Player) -> bool {
    let beater_vs_runner = |x: &Player, y: &Player| {
        x.role == PlayerRole::Beater && y.role.handles_volleyball()
    };
    !(beater_vs_runner(a, b) || beater_vs_runner(b, a))
}

fn player_ball_interact(player: &Player, ball: &Ball) -> bool {
    !(player.role == PlayerRole::Beater && ball.is_volleyball())
}

impl ProximityIndex {
    /// Build the index from current positions.
    pub fn build(players: &BTreeMap<PlayerId, Player>, balls: &BTreeMap<BallId, Ball>) -> Self {
        let mut index = Self::default();

        let active: Vec<&Player> = players.values().filter(|p| !p.knocked_out).collect();
        for p in players.values() {
            index.nearest.insert(EntityId::Player(p.id), Vec::new());
        }
        for b in balls.values() {
            index.nearest.insert(EntityId::Ball(b.id), Vec::new());
        }

        for (i, a) in active.iter().enumerate() {
            for b in &active[i + 1..] {
                if players_interact(a, b) {
                    let d = a.position.distance_squared(b.position);
                    index.insert(EntityId::Player(a.id), EntityId::Player(b.id), d);
                }
            }
            for ball in balls.values() {
                if player_ball_interact(a, ball) {
                    let d = a.position.distance_squared(ball.position);
                    index.insert(EntityId::Player(a.id), EntityId::Ball(ball.id), d);
                }
            }
        }

        let all_balls: Vec<&Ball> = balls.values().collect();
        for (i, a) in all_balls.iter().enumerate() {
            for b in &all_balls[i + 1..] {
                let d = a.position.distance_squared(b.position);
                index.insert(EntityId::Ball(a.id), EntityId::Ball(b.id), d);
            }
        }

        // Stable sort keeps id order among equal distances
        for list in index.nearest.values_mut() {
            list.sort_by(|x, y| x.1.total_cmp(&y.1));
        }

        index
    }

    fn insert(&mut self, a: EntityId, b: EntityId, d: f64) {
        self.pairs.insert(ordered(a, b), d);
        self.nearest.entry(a).or_default().push((b, d));
        self.nearest.entry(b).or_default().push((a, d));
    }

    /// Squared distance between two entities, if the pair is tracked.
    pub fn distance_sq(&self, a: EntityId, b: EntityId) -> Option<f64> {
        self.pairs.get(&ordered(a, b)).copied()
    }

    /// Tracked neighbours of `id`, nearest first.
    pub fn nearest(&self, id: EntityId) -> &[(EntityId, f64)] {
        self.nearest.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Nearest players of `id`, nearest first.
    pub fn nearest_players(&self, id: EntityId) -> Vec<(PlayerId, f64)> {
        self.nearest(id)
            .iter()
            .filter_map(|(other, d)| other.player().map(|p| (p, *d)))
            .collect()
    }

    /// Number of tracked pairs.
    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    /// No pairs tracked.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
