//! Roulette reel construction.
//!
//! The reel is a fixed-length strip of reward entries scrolled past the
//! player during the reveal. The authoritative winner is embedded at a slot
//! drawn in the final stretch; every other slot is an independent weighted
//! draw from the same eligible pool, repeats allowed.

use casedrop_types::{
    RewardTableEntry, ROULETTE_SEQUENCE_LEN, WINNER_SLOT_MAX, WINNER_SLOT_MIN,
};

use crate::rng::DrawRng;
use crate::selector::{pick_weighted, SelectorError};

/// A built reel with the winner slot fixed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouletteReel {
    pub items: Vec<RewardTableEntry>,
    pub winner_index: u32,
}

impl RouletteReel {
    /// Check that the reel lands on the given reward.
    pub fn verify(&self, winner_id: u64) -> bool {
        self.items
            .get(self.winner_index as usize)
            .is_some_and(|entry| entry.id == winner_id)
    }
}

/// Build a reel around an already-selected winner.
///
/// The winner slot is drawn once, uniformly in
/// [WINNER_SLOT_MIN, WINNER_SLOT_MAX], and holds the winner exactly; the
/// decoys are weighted draws and may duplicate the winner elsewhere.
pub fn build(
    winner: &RewardTableEntry,
    pool: &[&RewardTableEntry],
    rng: &mut DrawRng,
) -> Result<RouletteReel, SelectorError> {
    let span = (WINNER_SLOT_MAX - WINNER_SLOT_MIN + 1) as u64;
    let winner_index = WINNER_SLOT_MIN + rng.next_bounded(span) as usize;

    let mut items = Vec::with_capacity(ROULETTE_SEQUENCE_LEN);
    for slot in 0..ROULETTE_SEQUENCE_LEN {
        if slot == winner_index {
            items.push(winner.clone());
        } else {
            items.push(pick_weighted(pool, rng.next_unit())?.clone());
        }
    }

    Ok(RouletteReel {
        items,
        winner_index: winner_index as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{RngSecret, DOMAIN_REEL};
    use crate::selector::eligible;
    use casedrop_types::RewardKind;

    fn entry(id: u64, weight: u64) -> RewardTableEntry {
        RewardTableEntry {
            id,
            kind: RewardKind::Skin,
            weight,
            never_drop: false,
            display_name: format!("Skin {id}"),
            image_ref: format!("skins/{id}.png"),
            value: 100,
        }
    }

    fn secret() -> RngSecret {
        RngSecret::new([3u8; 32])
    }

    #[test]
    fn test_reel_embeds_winner() {
        let table = [entry(1, 800), entry(2, 200), entry(3, 50)];
        let pool = eligible(&table);
        let winner = &table[2];

        for session_id in 0..50u64 {
            let mut rng = DrawRng::new(&secret(), session_id, DOMAIN_REEL);
            let reel = build(winner, &pool, &mut rng).unwrap();

            assert_eq!(reel.items.len(), ROULETTE_SEQUENCE_LEN);
            let index = reel.winner_index as usize;
            assert!((WINNER_SLOT_MIN..=WINNER_SLOT_MAX).contains(&index));
            assert_eq!(reel.items[index].id, winner.id);
            assert!(reel.verify(winner.id));
            assert!(!reel.verify(999));
        }
    }

    #[test]
    fn test_reel_is_deterministic() {
        let table = [entry(1, 800), entry(2, 200)];
        let pool = eligible(&table);

        let mut a = DrawRng::new(&secret(), 7, DOMAIN_REEL);
        let mut b = DrawRng::new(&secret(), 7, DOMAIN_REEL);
        let reel_a = build(&table[0], &pool, &mut a).unwrap();
        let reel_b = build(&table[0], &pool, &mut b).unwrap();
        assert_eq!(reel_a, reel_b);
    }

    #[test]
    fn test_decoys_come_from_pool() {
        let table = [entry(1, 800), entry(2, 200)];
        let pool = eligible(&table);
        let mut rng = DrawRng::new(&secret(), 12, DOMAIN_REEL);
        let reel = build(&table[1], &pool, &mut rng).unwrap();
        for item in &reel.items {
            assert!(item.id == 1 || item.id == 2);
        }
    }

    #[test]
    fn test_empty_pool_rejected() {
        let winner = entry(1, 10);
        let pool: Vec<&RewardTableEntry> = Vec::new();
        let mut rng = DrawRng::new(&secret(), 1, DOMAIN_REEL);
        assert!(build(&winner, &pool, &mut rng).is_err());
    }
}
