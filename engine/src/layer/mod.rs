use casedrop_types::{Event, Instruction, Key, Output, Transaction, Value};
use commonware_cryptography::ed25519::PublicKey;
use std::collections::BTreeMap;

use crate::rng::RngSecret;
use crate::state::{load_account, validate_and_increment_nonce, PrepareError, State, Status};

mod handlers;

/// Execution overlay for one batch of transactions.
///
/// Writes accumulate in `pending` until `commit`; reads see pending writes
/// first, then the underlying state. Each transaction is nonce-checked in
/// `prepare` before its instruction is applied.
pub struct Layer<'a, S: State> {
    state: &'a S,
    pending: BTreeMap<Key, Status>,

    secret: RngSecret,
    /// Unix seconds at execution time; drives `created_at` stamps and the
    /// per-day limits.
    now: u64,
}

impl<'a, S: State> Layer<'a, S> {
    pub fn new(state: &'a S, secret: RngSecret, now: u64) -> Self {
        Self {
            state,
            pending: BTreeMap::new(),

            secret,
            now,
        }
    }

    fn insert(&mut self, key: Key, value: Value) {
        self.pending.insert(key, Status::Update(value));
    }

    fn current_day(&self) -> u64 {
        self.now / 86_400
    }

    async fn prepare(&mut self, transaction: &Transaction) -> Result<(), PrepareError> {
        let mut account = load_account(self, &transaction.public).await;
        validate_and_increment_nonce(&mut account, transaction.nonce)?;
        self.insert(
            Key::Account(transaction.public.clone()),
            Value::Account(account),
        );

        Ok(())
    }

    async fn apply(&mut self, transaction: &Transaction) -> Vec<Event> {
        match &transaction.instruction {
            Instruction::Register { name } => {
                self.handle_register(&transaction.public, name).await
            }
            Instruction::OpenCase {
                case_id,
                session_id,
                free,
            } => {
                self.handle_open_case(&transaction.public, *case_id, *session_id, *free)
                    .await
            }
            Instruction::SettleReward {
                session_id,
                disposition,
            } => {
                self.handle_settle_reward(&transaction.public, *session_id, *disposition)
                    .await
            }
            Instruction::ClaimDailyReward => {
                self.handle_claim_daily_reward(&transaction.public).await
            }
            Instruction::RedeemPromo { code } => {
                self.handle_redeem_promo(&transaction.public, code).await
            }
            Instruction::ToggleAdminRole { target, grant } => {
                self.handle_toggle_admin_role(&transaction.public, target, *grant)
                    .await
            }
            Instruction::UpsertCase { case } => {
                self.handle_upsert_case(&transaction.public, case).await
            }
            Instruction::RemoveCase { case_id } => {
                self.handle_remove_case(&transaction.public, *case_id).await
            }
            Instruction::UpsertPromo {
                code,
                reward_coins,
                max_redemptions,
            } => {
                self.handle_upsert_promo(&transaction.public, code, *reward_coins, *max_redemptions)
                    .await
            }
        }
    }

    pub async fn execute(
        &mut self,
        transactions: Vec<Transaction>,
    ) -> (Vec<Output>, BTreeMap<PublicKey, u64>) {
        let mut processed_nonces = BTreeMap::new();
        let mut outputs = Vec::new();

        for tx in transactions {
            if self.prepare(&tx).await.is_err() {
                continue;
            }
            processed_nonces.insert(tx.public.clone(), tx.nonce.saturating_add(1));
            outputs.extend(self.apply(&tx).await.into_iter().map(Output::Event));
            outputs.push(Output::Transaction(tx));
        }

        (outputs, processed_nonces)
    }

    pub fn commit(self) -> Vec<(Key, Status)> {
        self.pending.into_iter().collect()
    }
}

impl<'a, S: State> State for Layer<'a, S> {
    async fn get(&self, key: &Key) -> Option<Value> {
        match self.pending.get(key) {
            Some(Status::Update(value)) => Some(value.clone()),
            Some(Status::Delete) => None,
            None => self.state.get(key).await,
        }
    }

    async fn insert(&mut self, key: Key, value: Value) {
        self.pending.insert(key, Status::Update(value));
    }

    async fn delete(&mut self, key: &Key) {
        self.pending.insert(key.clone(), Status::Delete);
    }
}
