//! Weighted reward selection.
//!
//! Every randomized pick in the storefront funnels through this module: the
//! authoritative winner draw and each decoy slot of the reel use the same
//! cumulative scan over the same eligibility rules.

use casedrop_types::RewardTableEntry;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// The table has no entry that can drop (empty, all zero-weight, or all
    /// marked never-drop).
    #[error("no eligible rewards in table")]
    NoEligibleRewards,
}

/// Filter a reward table down to entries that can actually drop.
pub fn eligible(entries: &[RewardTableEntry]) -> Vec<&RewardTableEntry> {
    entries.iter().filter(|entry| entry.is_eligible()).collect()
}

/// Pick an entry from an eligible pool using a unit-interval draw.
///
/// The draw is mapped onto the cumulative weight total and the first entry
/// whose cumulative weight exceeds it wins; a draw that rounds to the exact
/// total falls back to the last entry, so the pick never misses.
pub fn pick_weighted<'a>(
    pool: &[&'a RewardTableEntry],
    r_unit: f64,
) -> Result<&'a RewardTableEntry, SelectorError> {
    let total: u64 = pool.iter().map(|entry| entry.weight).sum();
    if pool.is_empty() || total == 0 {
        return Err(SelectorError::NoEligibleRewards);
    }

    let threshold = r_unit.clamp(0.0, 1.0) * total as f64;
    let mut cumulative: u64 = 0;
    for entry in pool {
        cumulative += entry.weight;
        if (cumulative as f64) > threshold {
            return Ok(entry);
        }
    }

    // Rounding pushed the threshold to the exact total.
    Ok(pool[pool.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{DrawRng, RngSecret, DOMAIN_WINNER};
    use casedrop_types::RewardKind;

    fn entry(id: u64, weight: u64, never_drop: bool) -> RewardTableEntry {
        RewardTableEntry {
            id,
            kind: RewardKind::Skin,
            weight,
            never_drop,
            display_name: format!("Skin {id}"),
            image_ref: format!("skins/{id}.png"),
            value: 100,
        }
    }

    #[test]
    fn test_two_entry_split() {
        // A at weight 0.8, B at 0.2 in weight units.
        let a = entry(1, 800, false);
        let b = entry(2, 200, false);
        let table = [a, b];
        let pool = eligible(&table);

        // A draw of 0.05 falls inside A's band, 0.85 inside B's.
        assert_eq!(pick_weighted(&pool, 0.05).unwrap().id, 1);
        assert_eq!(pick_weighted(&pool, 0.85).unwrap().id, 2);

        // Band edges: anything below 0.8 is A, from 0.8 up is B.
        assert_eq!(pick_weighted(&pool, 0.799).unwrap().id, 1);
        assert_eq!(pick_weighted(&pool, 0.8).unwrap().id, 2);
    }

    #[test]
    fn test_exact_total_falls_back_to_last() {
        let table = [entry(1, 1, false), entry(2, 1, false)];
        let pool = eligible(&table);
        assert_eq!(pick_weighted(&pool, 1.0).unwrap().id, 2);
    }

    #[test]
    fn test_never_drop_excluded() {
        let table = [entry(1, 1, false), entry(2, 1_000_000, true)];
        let pool = eligible(&table);
        assert_eq!(pool.len(), 1);
        for r in [0.0, 0.25, 0.5, 0.999] {
            assert_eq!(pick_weighted(&pool, r).unwrap().id, 1);
        }
    }

    #[test]
    fn test_zero_weight_excluded() {
        let table = [entry(1, 0, false), entry(2, 10, false)];
        let pool = eligible(&table);
        assert_eq!(pool.len(), 1);
        assert_eq!(pick_weighted(&pool, 0.0).unwrap().id, 2);
    }

    #[test]
    fn test_no_eligible_rewards() {
        let empty: Vec<&RewardTableEntry> = Vec::new();
        assert_eq!(
            pick_weighted(&empty, 0.5),
            Err(SelectorError::NoEligibleRewards)
        );

        let table = [entry(1, 0, false), entry(2, 5, true)];
        let pool = eligible(&table);
        assert_eq!(
            pick_weighted(&pool, 0.5),
            Err(SelectorError::NoEligibleRewards)
        );
    }

    #[test]
    fn test_distribution_tracks_weights() {
        let table = [entry(1, 900, false), entry(2, 100, false)];
        let pool = eligible(&table);
        let mut rng = DrawRng::new(&RngSecret::new([9u8; 32]), 1, DOMAIN_WINNER);

        let mut common = 0;
        let draws = 10_000;
        for _ in 0..draws {
            if pick_weighted(&pool, rng.next_unit()).unwrap().id == 1 {
                common += 1;
            }
        }
        // 90% expected; a wide band keeps this robust to the fixed stream.
        assert!((8_500..=9_500).contains(&common), "common = {common}");
    }
}
