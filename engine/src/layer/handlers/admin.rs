use super::super::*;

use casedrop_types::{
    Case, PromoCode, ERROR_CASE_NOT_FOUND, ERROR_INVALID_CASE, ERROR_NOT_ADMIN,
    ERROR_PLAYER_NOT_FOUND, MAX_CATALOG_CASES, MAX_ENTRY_WEIGHT,
};
use tracing::info;

impl<'a, S: State> Layer<'a, S> {
    async fn caller_is_admin(&self, public: &PublicKey) -> bool {
        matches!(
            self.get(&Key::Player(public.clone())).await,
            Some(Value::Player(p)) if p.is_admin
        )
    }

    fn not_admin(public: &PublicKey) -> Vec<Event> {
        vec![Event::StoreError {
            player: public.clone(),
            session_id: None,
            error_code: ERROR_NOT_ADMIN,
            message: "Not an admin".to_string(),
        }]
    }

    async fn catalog(&self) -> Vec<u64> {
        match self.get(&Key::Catalog).await {
            Some(Value::Catalog(ids)) => ids,
            _ => Vec::new(),
        }
    }

    pub(in crate::layer) async fn handle_toggle_admin_role(
        &mut self,
        public: &PublicKey,
        target: &PublicKey,
        grant: bool,
    ) -> Vec<Event> {
        if !self.caller_is_admin(public).await {
            return Self::not_admin(public);
        }

        let mut player = match self.get(&Key::Player(target.clone())).await {
            Some(Value::Player(p)) => p,
            _ => {
                return vec![Event::StoreError {
                    player: public.clone(),
                    session_id: None,
                    error_code: ERROR_PLAYER_NOT_FOUND,
                    message: "Target player not found".to_string(),
                }]
            }
        };

        player.is_admin = grant;
        self.insert(Key::Player(target.clone()), Value::Player(player));
        info!(?target, grant, "admin role changed");

        vec![Event::AdminRoleChanged {
            target: target.clone(),
            is_admin: grant,
        }]
    }

    pub(in crate::layer) async fn handle_upsert_case(
        &mut self,
        public: &PublicKey,
        case: &Case,
    ) -> Vec<Event> {
        if !self.caller_is_admin(public).await {
            return Self::not_admin(public);
        }

        if case.entries.is_empty() {
            return vec![Event::StoreError {
                player: public.clone(),
                session_id: None,
                error_code: ERROR_INVALID_CASE,
                message: "Case has no entries".to_string(),
            }];
        }
        if case.entries.iter().any(|e| e.weight > MAX_ENTRY_WEIGHT) {
            return vec![Event::StoreError {
                player: public.clone(),
                session_id: None,
                error_code: ERROR_INVALID_CASE,
                message: "Entry weight exceeds maximum".to_string(),
            }];
        }
        // A case must be openable unless it is a display-only case where
        // every entry is marked never-drop.
        let display_only = case.entries.iter().all(|e| e.never_drop);
        if !display_only && case.eligible_entries().next().is_none() {
            return vec![Event::StoreError {
                player: public.clone(),
                session_id: None,
                error_code: ERROR_INVALID_CASE,
                message: "Case has no entry that can drop".to_string(),
            }];
        }

        let mut catalog = self.catalog().await;
        if !catalog.contains(&case.id) {
            if catalog.len() >= MAX_CATALOG_CASES {
                return vec![Event::StoreError {
                    player: public.clone(),
                    session_id: None,
                    error_code: ERROR_INVALID_CASE,
                    message: "Catalog is full".to_string(),
                }];
            }
            catalog.push(case.id);
            self.insert(Key::Catalog, Value::Catalog(catalog));
        }

        self.insert(Key::Case(case.id), Value::Case(case.clone()));
        info!(case_id = case.id, "case upserted");

        vec![Event::CaseUpserted { case_id: case.id }]
    }

    pub(in crate::layer) async fn handle_remove_case(
        &mut self,
        public: &PublicKey,
        case_id: u64,
    ) -> Vec<Event> {
        if !self.caller_is_admin(public).await {
            return Self::not_admin(public);
        }

        let mut catalog = self.catalog().await;
        let Some(position) = catalog.iter().position(|id| *id == case_id) else {
            return vec![Event::StoreError {
                player: public.clone(),
                session_id: None,
                error_code: ERROR_CASE_NOT_FOUND,
                message: "Case not found".to_string(),
            }];
        };
        catalog.remove(position);

        self.insert(Key::Catalog, Value::Catalog(catalog));
        self.delete(&Key::Case(case_id)).await;
        info!(case_id, "case removed");

        vec![Event::CaseRemoved { case_id }]
    }

    pub(in crate::layer) async fn handle_upsert_promo(
        &mut self,
        public: &PublicKey,
        code: &str,
        reward_coins: u64,
        max_redemptions: u32,
    ) -> Vec<Event> {
        if !self.caller_is_admin(public).await {
            return Self::not_admin(public);
        }

        // Replacing a promo keeps its redemption count so past redemptions
        // still count against the new budget.
        let redeemed = match self.get(&Key::Promo(code.to_string())).await {
            Some(Value::Promo(p)) => p.redeemed,
            _ => 0,
        };
        let promo = PromoCode {
            code: code.to_string(),
            reward_coins,
            max_redemptions,
            redeemed,
        };
        self.insert(Key::Promo(code.to_string()), Value::Promo(promo));
        info!(code, "promo upserted");

        vec![Event::PromoUpserted {
            code: code.to_string(),
        }]
    }
}
