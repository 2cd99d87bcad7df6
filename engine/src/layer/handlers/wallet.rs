use super::super::*;

use casedrop_types::{
    Player, DAILY_REWARD_COINS, ERROR_PLAYER_ALREADY_REGISTERED, ERROR_PLAYER_NOT_FOUND,
    ERROR_PROMO_ALREADY_REDEEMED, ERROR_PROMO_EXHAUSTED, ERROR_PROMO_NOT_FOUND,
    ERROR_RATE_LIMITED, MAX_REDEEMED_CODES,
};

impl<'a, S: State> Layer<'a, S> {
    pub(in crate::layer) async fn handle_register(
        &mut self,
        public: &PublicKey,
        name: &str,
    ) -> Vec<Event> {
        if self.get(&Key::Player(public.clone())).await.is_some() {
            return vec![Event::StoreError {
                player: public.clone(),
                session_id: None,
                error_code: ERROR_PLAYER_ALREADY_REGISTERED,
                message: "Player already registered".to_string(),
            }];
        }

        let player = Player::new(name.to_string());
        self.insert(Key::Player(public.clone()), Value::Player(player));

        vec![Event::PlayerRegistered {
            player: public.clone(),
            name: name.to_string(),
        }]
    }

    pub(in crate::layer) async fn handle_claim_daily_reward(
        &mut self,
        public: &PublicKey,
    ) -> Vec<Event> {
        let mut player = match self.get(&Key::Player(public.clone())).await {
            Some(Value::Player(p)) => p,
            _ => {
                return vec![Event::StoreError {
                    player: public.clone(),
                    session_id: None,
                    error_code: ERROR_PLAYER_NOT_FOUND,
                    message: "Player not found".to_string(),
                }]
            }
        };

        let current_day = self.current_day();
        if player.last_daily_claim_day != 0 && player.last_daily_claim_day == current_day {
            return vec![Event::StoreError {
                player: public.clone(),
                session_id: None,
                error_code: ERROR_RATE_LIMITED,
                message: "Daily reward already claimed, try again tomorrow".to_string(),
            }];
        }

        player.balance = player.balance.saturating_add(DAILY_REWARD_COINS);
        player.last_daily_claim_day = current_day;
        let new_balance = player.balance;

        self.insert(Key::Player(public.clone()), Value::Player(player));

        vec![Event::DailyRewardClaimed {
            player: public.clone(),
            amount: DAILY_REWARD_COINS,
            new_balance,
        }]
    }

    pub(in crate::layer) async fn handle_redeem_promo(
        &mut self,
        public: &PublicKey,
        code: &str,
    ) -> Vec<Event> {
        let mut player = match self.get(&Key::Player(public.clone())).await {
            Some(Value::Player(p)) => p,
            _ => {
                return vec![Event::StoreError {
                    player: public.clone(),
                    session_id: None,
                    error_code: ERROR_PLAYER_NOT_FOUND,
                    message: "Player not found".to_string(),
                }]
            }
        };

        let mut promo = match self.get(&Key::Promo(code.to_string())).await {
            Some(Value::Promo(p)) => p,
            _ => {
                return vec![Event::StoreError {
                    player: public.clone(),
                    session_id: None,
                    error_code: ERROR_PROMO_NOT_FOUND,
                    message: "Unknown promo code".to_string(),
                }]
            }
        };

        if player.has_redeemed(code) {
            return vec![Event::StoreError {
                player: public.clone(),
                session_id: None,
                error_code: ERROR_PROMO_ALREADY_REDEEMED,
                message: "Promo code already redeemed".to_string(),
            }];
        }
        if promo.is_exhausted() {
            return vec![Event::StoreError {
                player: public.clone(),
                session_id: None,
                error_code: ERROR_PROMO_EXHAUSTED,
                message: "Promo code has no redemptions left".to_string(),
            }];
        }
        if player.redeemed_codes.len() >= MAX_REDEEMED_CODES {
            return vec![Event::StoreError {
                player: public.clone(),
                session_id: None,
                error_code: ERROR_RATE_LIMITED,
                message: "Promo redemption limit reached".to_string(),
            }];
        }

        player.balance = player.balance.saturating_add(promo.reward_coins);
        player.redeemed_codes.push(code.to_string());
        promo.redeemed = promo.redeemed.saturating_add(1);
        let new_balance = player.balance;
        let amount = promo.reward_coins;

        self.insert(Key::Player(public.clone()), Value::Player(player));
        self.insert(Key::Promo(code.to_string()), Value::Promo(promo));

        vec![Event::PromoRedeemed {
            player: public.clone(),
            code: code.to_string(),
            amount,
            new_balance,
        }]
    }
}
