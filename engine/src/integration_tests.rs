use crate::mocks::{create_account_keypair, create_secret, sample_case, sample_free_case};
use crate::{Layer, Memory, State};
use casedrop_types::*;
use commonware_cryptography::ed25519::{PrivateKey, PublicKey};

const DAY: u64 = 86_400;

struct Env {
    state: Memory,
    now: u64,
}

impl Env {
    fn new() -> Self {
        Self {
            state: Memory::default(),
            now: 1_700_000_000,
        }
    }

    async fn execute(&mut self, txs: Vec<Transaction>) -> Vec<Event> {
        let mut layer = Layer::new(&self.state, create_secret(), self.now);
        let (outputs, _) = layer.execute(txs).await;
        let changes = layer.commit();
        self.state.apply(changes).await;
        outputs
            .into_iter()
            .filter_map(|output| match output {
                Output::Event(event) => Some(event),
                Output::Transaction(_) => None,
            })
            .collect()
    }

    async fn seed_case(&mut self, case: Case) {
        let mut catalog = match self.state.get(&Key::Catalog).await {
            Some(Value::Catalog(ids)) => ids,
            _ => Vec::new(),
        };
        if !catalog.contains(&case.id) {
            catalog.push(case.id);
        }
        self.state.insert(Key::Catalog, Value::Catalog(catalog)).await;
        self.state
            .insert(Key::Case(case.id), Value::Case(case))
            .await;
    }

    async fn seed_promo(&mut self, code: &str, reward_coins: u64, max_redemptions: u32) {
        self.state
            .insert(
                Key::Promo(code.to_string()),
                Value::Promo(PromoCode {
                    code: code.to_string(),
                    reward_coins,
                    max_redemptions,
                    redeemed: 0,
                }),
            )
            .await;
    }

    async fn grant_admin(&mut self, public: &PublicKey) {
        let mut player = self.player(public).await;
        player.is_admin = true;
        self.state
            .insert(Key::Player(public.clone()), Value::Player(player))
            .await;
    }

    async fn player(&self, public: &PublicKey) -> Player {
        match self.state.get(&Key::Player(public.clone())).await {
            Some(Value::Player(player)) => player,
            _ => panic!("player not found"),
        }
    }

    async fn session(&self, id: u64) -> OpeningSession {
        match self.state.get(&Key::Session(id)).await {
            Some(Value::Session(session)) => session,
            _ => panic!("session not found"),
        }
    }
}

fn tx(signer: &PrivateKey, nonce: u64, instruction: Instruction) -> Transaction {
    Transaction::sign(signer, nonce, instruction)
}

fn open(case_id: u64, session_id: u64) -> Instruction {
    Instruction::OpenCase {
        case_id,
        session_id,
        free: false,
    }
}

fn settle(session_id: u64, disposition: Disposition) -> Instruction {
    Instruction::SettleReward {
        session_id,
        disposition,
    }
}

fn register(name: &str) -> Instruction {
    Instruction::Register {
        name: name.to_string(),
    }
}

async fn registered_env(signer: &PrivateKey) -> Env {
    let mut env = Env::new();
    env.seed_case(sample_case(1, 100)).await;
    env.execute(vec![tx(signer, 0, register("Alice"))]).await;
    env
}

#[tokio::test]
async fn test_open_case_debits_and_embeds_winner() {
    let (signer, public) = create_account_keypair(1);
    let mut env = registered_env(&signer).await;

    let events = env.execute(vec![tx(&signer, 1, open(1, 77))]).await;
    assert_eq!(events.len(), 1);
    let Event::CaseOpened {
        session_id,
        reward,
        roulette,
        winner_index,
        new_balance,
        ..
    } = &events[0]
    else {
        panic!("expected CaseOpened, got {:?}", events[0]);
    };

    assert_eq!(*session_id, 77);
    assert_eq!(*new_balance, INITIAL_COINS - 100);
    assert_eq!(roulette.len(), ROULETTE_SEQUENCE_LEN);
    let index = *winner_index as usize;
    assert!((WINNER_SLOT_MIN..=WINNER_SLOT_MAX).contains(&index));
    assert_eq!(roulette[index].id, reward.id);

    let session = env.session(77).await;
    assert_eq!(session.player, public);
    assert_eq!(session.cost, 100);
    assert!(!session.settled);
    assert_eq!(session.reward, *reward);
}

#[tokio::test]
async fn test_open_case_is_deterministic_per_session() {
    let (signer, _) = create_account_keypair(1);

    let mut first = registered_env(&signer).await;
    let mut second = registered_env(&signer).await;

    let a = first.execute(vec![tx(&signer, 1, open(1, 500))]).await;
    let b = second.execute(vec![tx(&signer, 1, open(1, 500))]).await;
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_open_insufficient_funds() {
    let (signer, _) = create_account_keypair(1);
    let mut env = registered_env(&signer).await;
    env.seed_case(sample_case(2, 5_000)).await;

    let events = env.execute(vec![tx(&signer, 1, open(2, 10))]).await;
    let Event::StoreError {
        error_code,
        message,
        ..
    } = &events[0]
    else {
        panic!("expected StoreError");
    };
    assert_eq!(*error_code, ERROR_INSUFFICIENT_FUNDS);
    assert_eq!(message, "Insufficient coins: have 1000, need 5000");

    // Nothing was debited and no session exists.
    let (_, public) = create_account_keypair(1);
    assert_eq!(env.player(&public).await.balance, INITIAL_COINS);
    assert!(env.state.get(&Key::Session(10)).await.is_none());
}

#[tokio::test]
async fn test_open_duplicate_session_id_rejected() {
    let (signer, public) = create_account_keypair(1);
    let mut env = registered_env(&signer).await;

    env.execute(vec![tx(&signer, 1, open(1, 5))]).await;
    let balance_after_first = env.player(&public).await.balance;

    let events = env.execute(vec![tx(&signer, 2, open(1, 5))]).await;
    let Event::StoreError { error_code, .. } = &events[0] else {
        panic!("expected StoreError");
    };
    assert_eq!(*error_code, ERROR_SESSION_EXISTS);
    // The replay did not roll a new reward or debit again.
    assert_eq!(env.player(&public).await.balance, balance_after_first);
}

#[tokio::test]
async fn test_open_case_with_no_eligible_rewards() {
    let (signer, public) = create_account_keypair(1);
    let mut env = registered_env(&signer).await;

    let mut showcase = sample_case(3, 100);
    for entry in &mut showcase.entries {
        entry.never_drop = true;
    }
    env.seed_case(showcase).await;

    let events = env.execute(vec![tx(&signer, 1, open(3, 9))]).await;
    let Event::StoreError { error_code, .. } = &events[0] else {
        panic!("expected StoreError");
    };
    assert_eq!(*error_code, ERROR_NO_ELIGIBLE_REWARDS);
    // The failed open never charged the player.
    assert_eq!(env.player(&public).await.balance, INITIAL_COINS);
}

#[tokio::test]
async fn test_settle_sell_credits_value() {
    let (signer, public) = create_account_keypair(1);
    let mut env = registered_env(&signer).await;

    env.execute(vec![tx(&signer, 1, open(1, 7))]).await;
    let session = env.session(7).await;
    let balance_before = env.player(&public).await.balance;

    let events = env
        .execute(vec![tx(&signer, 2, settle(7, Disposition::Sell))])
        .await;
    let Event::RewardSettled {
        payout,
        new_balance,
        ..
    } = &events[0]
    else {
        panic!("expected RewardSettled, got {:?}", events[0]);
    };
    assert_eq!(*payout, session.reward.value);
    assert_eq!(*new_balance, balance_before + session.reward.value);
    assert!(env.player(&public).await.inventory.is_empty());
    assert!(env.session(7).await.settled);
}

#[tokio::test]
async fn test_settle_keep_adds_to_inventory() {
    let (signer, public) = create_account_keypair(1);
    let mut env = registered_env(&signer).await;

    env.execute(vec![tx(&signer, 1, open(1, 8))]).await;
    let session = env.session(8).await;
    let balance_before = env.player(&public).await.balance;

    env.execute(vec![tx(&signer, 2, settle(8, Disposition::Keep))])
        .await;

    let player = env.player(&public).await;
    assert_eq!(player.balance, balance_before);
    assert_eq!(player.inventory.len(), 1);
    assert_eq!(player.inventory[0].reward_id, session.reward.id);
    assert_eq!(player.inventory[0].value, session.reward.value);
}

#[tokio::test]
async fn test_settle_retry_is_idempotent() {
    let (signer, public) = create_account_keypair(1);
    let mut env = registered_env(&signer).await;

    env.execute(vec![tx(&signer, 1, open(1, 11))]).await;
    env.execute(vec![tx(&signer, 2, settle(11, Disposition::Sell))])
        .await;
    let balance_after_settle = env.player(&public).await.balance;
    let inventory_after_settle = env.player(&public).await.inventory.len();

    // Retrying with the same disposition is acknowledged, never re-credited.
    let events = env
        .execute(vec![tx(&signer, 3, settle(11, Disposition::Sell))])
        .await;
    assert!(
        matches!(&events[0], Event::RewardSettled { new_balance, .. } if *new_balance == balance_after_settle)
    );
    let player = env.player(&public).await;
    assert_eq!(player.balance, balance_after_settle);
    assert_eq!(player.inventory.len(), inventory_after_settle);
}

#[tokio::test]
async fn test_settle_conflicting_disposition_rejected() {
    let (signer, public) = create_account_keypair(1);
    let mut env = registered_env(&signer).await;

    env.execute(vec![tx(&signer, 1, open(1, 12))]).await;
    env.execute(vec![tx(&signer, 2, settle(12, Disposition::Keep))])
        .await;
    let balance_after_settle = env.player(&public).await.balance;

    let events = env
        .execute(vec![tx(&signer, 3, settle(12, Disposition::Sell))])
        .await;
    let Event::StoreError { error_code, .. } = &events[0] else {
        panic!("expected StoreError");
    };
    assert_eq!(*error_code, ERROR_SETTLEMENT_CONFLICT);
    assert_eq!(env.player(&public).await.balance, balance_after_settle);
}

#[tokio::test]
async fn test_settle_requires_ownership() {
    let (alice, _) = create_account_keypair(1);
    let (mallory, _) = create_account_keypair(9);
    let mut env = registered_env(&alice).await;
    env.execute(vec![tx(&mallory, 0, register("Mallory"))])
        .await;

    env.execute(vec![tx(&alice, 1, open(1, 13))]).await;
    let events = env
        .execute(vec![tx(&mallory, 1, settle(13, Disposition::Sell))])
        .await;
    let Event::StoreError { error_code, .. } = &events[0] else {
        panic!("expected StoreError");
    };
    assert_eq!(*error_code, ERROR_SESSION_NOT_OWNED);
    assert!(!env.session(13).await.settled);
}

#[tokio::test]
async fn test_free_case_once_per_day() {
    let (signer, public) = create_account_keypair(1);
    let mut env = registered_env(&signer).await;
    env.seed_case(sample_free_case(4)).await;

    let free_open = |session_id| Instruction::OpenCase {
        case_id: 4,
        session_id,
        free: true,
    };

    let events = env.execute(vec![tx(&signer, 1, free_open(20))]).await;
    assert!(matches!(&events[0], Event::CaseOpened { new_balance, .. } if *new_balance == INITIAL_COINS));

    let events = env.execute(vec![tx(&signer, 2, free_open(21))]).await;
    let Event::StoreError { error_code, .. } = &events[0] else {
        panic!("expected StoreError");
    };
    assert_eq!(*error_code, ERROR_RATE_LIMITED);

    // A day later the free open is available again.
    env.now += DAY;
    let events = env.execute(vec![tx(&signer, 3, free_open(22))]).await;
    assert!(matches!(&events[0], Event::CaseOpened { .. }));
    assert_eq!(env.player(&public).await.balance, INITIAL_COINS);
}

#[tokio::test]
async fn test_free_flag_rejected_on_paid_case() {
    let (signer, _) = create_account_keypair(1);
    let mut env = registered_env(&signer).await;

    let events = env
        .execute(vec![tx(
            &signer,
            1,
            Instruction::OpenCase {
                case_id: 1,
                session_id: 30,
                free: true,
            },
        )])
        .await;
    let Event::StoreError { error_code, .. } = &events[0] else {
        panic!("expected StoreError");
    };
    assert_eq!(*error_code, ERROR_INVALID_CASE);
}

#[tokio::test]
async fn test_daily_reward_claim_and_limit() {
    let (signer, public) = create_account_keypair(1);
    let mut env = registered_env(&signer).await;

    let events = env
        .execute(vec![tx(&signer, 1, Instruction::ClaimDailyReward)])
        .await;
    assert!(matches!(
        &events[0],
        Event::DailyRewardClaimed { amount, .. } if *amount == DAILY_REWARD_COINS
    ));
    assert_eq!(
        env.player(&public).await.balance,
        INITIAL_COINS + DAILY_REWARD_COINS
    );

    let events = env
        .execute(vec![tx(&signer, 2, Instruction::ClaimDailyReward)])
        .await;
    assert!(matches!(
        &events[0],
        Event::StoreError { error_code, .. } if *error_code == ERROR_RATE_LIMITED
    ));

    env.now += DAY;
    let events = env
        .execute(vec![tx(&signer, 3, Instruction::ClaimDailyReward)])
        .await;
    assert!(matches!(&events[0], Event::DailyRewardClaimed { .. }));
}

#[tokio::test]
async fn test_promo_redemption_flow() {
    let (signer, public) = create_account_keypair(1);
    let mut env = registered_env(&signer).await;
    env.seed_promo("LAUNCH", 500, 1).await;

    let redeem = |code: &str| Instruction::RedeemPromo {
        code: code.to_string(),
    };

    let events = env.execute(vec![tx(&signer, 1, redeem("NOPE"))]).await;
    assert!(matches!(
        &events[0],
        Event::StoreError { error_code, .. } if *error_code == ERROR_PROMO_NOT_FOUND
    ));

    let events = env.execute(vec![tx(&signer, 2, redeem("LAUNCH"))]).await;
    assert!(matches!(
        &events[0],
        Event::PromoRedeemed { amount, .. } if *amount == 500
    ));
    assert_eq!(env.player(&public).await.balance, INITIAL_COINS + 500);

    let events = env.execute(vec![tx(&signer, 3, redeem("LAUNCH"))]).await;
    assert!(matches!(
        &events[0],
        Event::StoreError { error_code, .. } if *error_code == ERROR_PROMO_ALREADY_REDEEMED
    ));

    // The single redemption budget is spent for everyone else too.
    let (bob, _) = create_account_keypair(2);
    env.execute(vec![tx(&bob, 0, register("Bob"))]).await;
    let events = env.execute(vec![tx(&bob, 1, redeem("LAUNCH"))]).await;
    assert!(matches!(
        &events[0],
        Event::StoreError { error_code, .. } if *error_code == ERROR_PROMO_EXHAUSTED
    ));
}

#[tokio::test]
async fn test_admin_catalog_management() {
    let (admin, admin_pk) = create_account_keypair(1);
    let (user, _) = create_account_keypair(2);
    let mut env = Env::new();
    env.execute(vec![
        tx(&admin, 0, register("Admin")),
        tx(&user, 0, register("User")),
    ])
    .await;
    env.grant_admin(&admin_pk).await;

    // Non-admins cannot touch the catalog.
    let events = env
        .execute(vec![tx(
            &user,
            1,
            Instruction::UpsertCase {
                case: sample_case(5, 100),
            },
        )])
        .await;
    assert!(matches!(
        &events[0],
        Event::StoreError { error_code, .. } if *error_code == ERROR_NOT_ADMIN
    ));

    let events = env
        .execute(vec![tx(
            &admin,
            1,
            Instruction::UpsertCase {
                case: sample_case(5, 100),
            },
        )])
        .await;
    assert!(matches!(
        &events[0],
        Event::CaseUpserted { case_id } if *case_id == 5
    ));
    assert!(matches!(
        env.state.get(&Key::Catalog).await,
        Some(Value::Catalog(ids)) if ids == vec![5]
    ));

    let events = env
        .execute(vec![tx(&admin, 2, Instruction::RemoveCase { case_id: 5 })])
        .await;
    assert!(matches!(&events[0], Event::CaseRemoved { case_id } if *case_id == 5));
    assert!(env.state.get(&Key::Case(5)).await.is_none());
    assert!(matches!(
        env.state.get(&Key::Catalog).await,
        Some(Value::Catalog(ids)) if ids.is_empty()
    ));
}

#[tokio::test]
async fn test_upsert_case_rejects_unopenable_table() {
    let (admin, admin_pk) = create_account_keypair(1);
    let mut env = Env::new();
    env.execute(vec![tx(&admin, 0, register("Admin"))]).await;
    env.grant_admin(&admin_pk).await;

    // All entries at zero weight without never_drop: nothing can ever land.
    let mut unopenable = sample_case(9, 100);
    for entry in &mut unopenable.entries {
        entry.weight = 0;
    }
    let events = env
        .execute(vec![tx(
            &admin,
            1,
            Instruction::UpsertCase { case: unopenable },
        )])
        .await;
    assert!(matches!(
        &events[0],
        Event::StoreError { error_code, .. } if *error_code == ERROR_INVALID_CASE
    ));
    assert!(env.state.get(&Key::Case(9)).await.is_none());
    assert!(env.state.get(&Key::Catalog).await.is_none());

    // A display-only case where every entry is never_drop is still allowed.
    let mut display = sample_case(9, 100);
    for entry in &mut display.entries {
        entry.never_drop = true;
    }
    let events = env
        .execute(vec![tx(&admin, 2, Instruction::UpsertCase { case: display })])
        .await;
    assert!(matches!(
        &events[0],
        Event::CaseUpserted { case_id } if *case_id == 9
    ));
}

#[tokio::test]
async fn test_admin_role_toggle() {
    let (admin, admin_pk) = create_account_keypair(1);
    let (user, user_pk) = create_account_keypair(2);
    let mut env = Env::new();
    env.execute(vec![
        tx(&admin, 0, register("Admin")),
        tx(&user, 0, register("User")),
    ])
    .await;
    env.grant_admin(&admin_pk).await;

    let events = env
        .execute(vec![tx(
            &admin,
            1,
            Instruction::ToggleAdminRole {
                target: user_pk.clone(),
                grant: true,
            },
        )])
        .await;
    assert!(matches!(
        &events[0],
        Event::AdminRoleChanged { is_admin: true, .. }
    ));
    assert!(env.player(&user_pk).await.is_admin);

    // The freshly promoted admin can revoke too.
    let events = env
        .execute(vec![tx(
            &user,
            1,
            Instruction::ToggleAdminRole {
                target: admin_pk.clone(),
                grant: false,
            },
        )])
        .await;
    assert!(matches!(
        &events[0],
        Event::AdminRoleChanged { is_admin: false, .. }
    ));
    assert!(!env.player(&admin_pk).await.is_admin);
}

#[tokio::test]
async fn test_admin_upsert_promo_preserves_redemptions() {
    let (admin, admin_pk) = create_account_keypair(1);
    let (user, _) = create_account_keypair(2);
    let mut env = Env::new();
    env.execute(vec![
        tx(&admin, 0, register("Admin")),
        tx(&user, 0, register("User")),
    ])
    .await;
    env.grant_admin(&admin_pk).await;
    env.seed_promo("WELCOME", 100, 5).await;

    env.execute(vec![tx(
        &user,
        1,
        Instruction::RedeemPromo {
            code: "WELCOME".to_string(),
        },
    )])
    .await;

    env.execute(vec![tx(
        &admin,
        1,
        Instruction::UpsertPromo {
            code: "WELCOME".to_string(),
            reward_coins: 200,
            max_redemptions: 2,
        },
    )])
    .await;

    match env.state.get(&Key::Promo("WELCOME".to_string())).await {
        Some(Value::Promo(promo)) => {
            assert_eq!(promo.reward_coins, 200);
            assert_eq!(promo.redeemed, 1);
        }
        _ => panic!("promo not found"),
    }
}
