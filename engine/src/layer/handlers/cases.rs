use super::super::*;

use casedrop_types::{
    Disposition, InventoryItem, OpeningSession, RewardKind, RewardTableEntry,
    ERROR_CASE_NOT_FOUND, ERROR_INSUFFICIENT_FUNDS, ERROR_INVALID_CASE, ERROR_INVENTORY_FULL,
    ERROR_NO_ELIGIBLE_REWARDS, ERROR_PLAYER_NOT_FOUND, ERROR_RATE_LIMITED,
    ERROR_SESSION_EXISTS, ERROR_SESSION_NOT_FOUND, ERROR_SESSION_NOT_OWNED,
    ERROR_SETTLEMENT_CONFLICT, MAX_INVENTORY_ITEMS,
};
use tracing::debug;

use crate::rng::{DrawRng, DOMAIN_REEL, DOMAIN_WINNER};
use crate::selector;
use crate::sequence;

/// Coins a settlement credits for a given reward and disposition.
///
/// Keep on a coin bundle credits the bundle; Keep on a skin credits nothing
/// (the skin goes to inventory). Sell always credits the entry value.
fn settlement_payout(reward: &RewardTableEntry, disposition: Disposition) -> u64 {
    match disposition {
        Disposition::Keep => match reward.kind {
            RewardKind::Skin => 0,
            RewardKind::CoinBundle => reward.value,
        },
        Disposition::Sell => reward.value,
    }
}

impl<'a, S: State> Layer<'a, S> {
    pub(in crate::layer) async fn handle_open_case(
        &mut self,
        public: &PublicKey,
        case_id: u64,
        session_id: u64,
        free: bool,
    ) -> Vec<Event> {
        let mut player = match self.get(&Key::Player(public.clone())).await {
            Some(Value::Player(p)) => p,
            _ => {
                return vec![Event::StoreError {
                    player: public.clone(),
                    session_id: Some(session_id),
                    error_code: ERROR_PLAYER_NOT_FOUND,
                    message: "Player not found".to_string(),
                }]
            }
        };

        // Session ids are single-use; a replayed open must not roll again.
        if self.get(&Key::Session(session_id)).await.is_some() {
            return vec![Event::StoreError {
                player: public.clone(),
                session_id: Some(session_id),
                error_code: ERROR_SESSION_EXISTS,
                message: "Session already exists".to_string(),
            }];
        }

        let case = match self.get(&Key::Case(case_id)).await {
            Some(Value::Case(c)) => c,
            _ => {
                return vec![Event::StoreError {
                    player: public.clone(),
                    session_id: Some(session_id),
                    error_code: ERROR_CASE_NOT_FOUND,
                    message: "Case not found".to_string(),
                }]
            }
        };

        let current_day = self.current_day();
        if free {
            if !case.is_free {
                return vec![Event::StoreError {
                    player: public.clone(),
                    session_id: Some(session_id),
                    error_code: ERROR_INVALID_CASE,
                    message: "Case is not free".to_string(),
                }];
            }
            if player.last_free_open_day != 0 && player.last_free_open_day == current_day {
                return vec![Event::StoreError {
                    player: public.clone(),
                    session_id: Some(session_id),
                    error_code: ERROR_RATE_LIMITED,
                    message: "Free case already opened today, try again tomorrow".to_string(),
                }];
            }
        }

        let cost = if free { 0 } else { case.price };
        if player.balance < cost {
            return vec![Event::StoreError {
                player: public.clone(),
                session_id: Some(session_id),
                error_code: ERROR_INSUFFICIENT_FUNDS,
                message: format!("Insufficient coins: have {}, need {}", player.balance, cost),
            }];
        }

        let pool = selector::eligible(&case.entries);
        let mut winner_rng = DrawRng::new(&self.secret, session_id, DOMAIN_WINNER);
        let reward = match selector::pick_weighted(&pool, winner_rng.next_unit()) {
            Ok(entry) => entry.clone(),
            Err(_) => {
                return vec![Event::StoreError {
                    player: public.clone(),
                    session_id: Some(session_id),
                    error_code: ERROR_NO_ELIGIBLE_REWARDS,
                    message: "Case has no eligible rewards".to_string(),
                }]
            }
        };

        // The reel embeds the already-drawn winner, so the reveal cannot
        // disagree with the settlement.
        let mut reel_rng = DrawRng::new(&self.secret, session_id, DOMAIN_REEL);
        let reel = match sequence::build(&reward, &pool, &mut reel_rng) {
            Ok(reel) => reel,
            Err(_) => {
                return vec![Event::StoreError {
                    player: public.clone(),
                    session_id: Some(session_id),
                    error_code: ERROR_NO_ELIGIBLE_REWARDS,
                    message: "Case has no eligible rewards".to_string(),
                }]
            }
        };

        player.balance = player.balance.saturating_sub(cost);
        player.opened_cases = player.opened_cases.saturating_add(1);
        if free {
            player.last_free_open_day = current_day;
        }
        let new_balance = player.balance;
        self.insert(Key::Player(public.clone()), Value::Player(player));

        let session = OpeningSession {
            id: session_id,
            player: public.clone(),
            case_id,
            cost,
            reward: reward.clone(),
            roulette: reel.items.clone(),
            winner_index: reel.winner_index,
            created_at: self.now,
            settled: false,
            disposition: None,
        };
        self.insert(Key::Session(session_id), Value::Session(session));

        debug!(session_id, case_id, reward = reward.id, "case opened");

        vec![Event::CaseOpened {
            session_id,
            player: public.clone(),
            case_id,
            reward,
            roulette: reel.items,
            winner_index: reel.winner_index,
            new_balance,
        }]
    }

    pub(in crate::layer) async fn handle_settle_reward(
        &mut self,
        public: &PublicKey,
        session_id: u64,
        disposition: Disposition,
    ) -> Vec<Event> {
        let mut session = match self.get(&Key::Session(session_id)).await {
            Some(Value::Session(s)) => s,
            _ => {
                return vec![Event::StoreError {
                    player: public.clone(),
                    session_id: Some(session_id),
                    error_code: ERROR_SESSION_NOT_FOUND,
                    message: "Session not found".to_string(),
                }]
            }
        };

        if &session.player != public {
            return vec![Event::StoreError {
                player: public.clone(),
                session_id: Some(session_id),
                error_code: ERROR_SESSION_NOT_OWNED,
                message: "Session belongs to another player".to_string(),
            }];
        }

        let mut player = match self.get(&Key::Player(public.clone())).await {
            Some(Value::Player(p)) => p,
            _ => {
                return vec![Event::StoreError {
                    player: public.clone(),
                    session_id: Some(session_id),
                    error_code: ERROR_PLAYER_NOT_FOUND,
                    message: "Player not found".to_string(),
                }]
            }
        };

        // Settlement is exactly-once: a retry with the same disposition is
        // acknowledged without crediting again, a different disposition is a
        // conflict.
        if session.settled {
            if session.disposition == Some(disposition) {
                debug!(session_id, "settlement retry acknowledged");
                return vec![Event::RewardSettled {
                    session_id,
                    player: public.clone(),
                    disposition,
                    payout: settlement_payout(&session.reward, disposition),
                    new_balance: player.balance,
                }];
            }
            return vec![Event::StoreError {
                player: public.clone(),
                session_id: Some(session_id),
                error_code: ERROR_SETTLEMENT_CONFLICT,
                message: "Session already settled with a different disposition".to_string(),
            }];
        }

        let payout = settlement_payout(&session.reward, disposition);
        if disposition == Disposition::Keep && session.reward.kind == RewardKind::Skin {
            if player.inventory.len() >= MAX_INVENTORY_ITEMS {
                return vec![Event::StoreError {
                    player: public.clone(),
                    session_id: Some(session_id),
                    error_code: ERROR_INVENTORY_FULL,
                    message: "Inventory is full".to_string(),
                }];
            }
            player.inventory.push(InventoryItem {
                reward_id: session.reward.id,
                display_name: session.reward.display_name.clone(),
                image_ref: session.reward.image_ref.clone(),
                value: session.reward.value,
                acquired_at: self.now,
            });
        }
        player.balance = player.balance.saturating_add(payout);
        let new_balance = player.balance;

        session.settled = true;
        session.disposition = Some(disposition);
        self.insert(Key::Player(public.clone()), Value::Player(player));
        self.insert(Key::Session(session_id), Value::Session(session));

        vec![Event::RewardSettled {
            session_id,
            player: public.clone(),
            disposition,
            payout,
            new_balance,
        }]
    }
}
