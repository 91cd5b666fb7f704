//! State Snapshots
//!
//! Save and restore a match mid-play. JSON is for inspection and fixtures,
//! bincode for compact storage. The proximity index and undelivered events
//! are not persisted; the next tick rebuilds the index before reading it.

use thiserror::Error;

use crate::game::state::GameState;

/// Snapshot encode or decode failure.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// JSON encoding failed.
    #[error("json snapshot: {0}")]
    Json(#[from] serde_json::Error),
    /// Binary encoding failed.
    #[error("binary snapshot: {0}")]
    Bincode(#[from] bincode::Error),
}

/// Encode the state as pretty-printed JSON.
pub fn to_json(state: &GameState) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string_pretty(state)?)
}

/// Decode a JSON snapshot.
pub fn from_json(json: &str) -> Result<GameState, SnapshotError> {
    Ok(serde_json::from_str(json)?)
}

/// Encode the state with bincode.
pub fn to_bytes(state: &GameState) -> Result<Vec<u8>, SnapshotError> {
    Ok(bincode::serialize(state)?)
}

/// Decode a bincode snapshot.
pub fn from_bytes(data: &[u8]) -> Result<GameState, SnapshotError> {
    Ok(bincode::deserialize(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::core::vec2::Vec2;
    use crate::game::state::PlayerId;
    use crate::game::tick::Match;

    fn played(ticks: u32) -> Match {
        let mut m = Match::from_config(&MatchConfig { seed: 9, ..Default::default() }).unwrap();
        m.set_direction(PlayerId(0), Vec2::new(1.0, 0.2)).unwrap();
        m.set_direction(PlayerId(7), Vec2::new(-1.0, -0.5)).unwrap();
        for _ in 0..ticks {
            m.update(0.15);
        }
        m
    }

    #[test]
    fn test_json_restore_preserves_hash() {
        let m = played(30);
        let json = to_json(m.state()).unwrap();
        let restored = from_json(&json).unwrap();
        assert_eq!(restored.compute_hash(), m.compute_hash());
        assert_eq!(restored.rng, m.state().rng);
    }

    #[test]
    fn test_restored_match_continues_identically() {
        let mut original = played(30);
        let bytes = to_bytes(original.state()).unwrap();
        let mut restored = Match::new(from_bytes(&bytes).unwrap());

        for _ in 0..40 {
            original.update(0.15);
            restored.update(0.15);
        }
        assert_eq!(restored.compute_hash(), original.compute_hash());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(from_json("{\"tick\": }"), Err(SnapshotError::Json(_))));
        assert!(matches!(from_bytes(&[1, 2, 3]), Err(SnapshotError::Bincode(_))));
    }
}
