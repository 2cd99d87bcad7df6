use casedrop_types::{Case, RewardKind, RewardTableEntry};
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    PrivateKeyExt, Signer,
};
use rand::{rngs::StdRng, SeedableRng};

use crate::rng::RngSecret;

/// Creates an account keypair for Ed25519 signatures used by users
pub fn create_account_keypair(seed: u64) -> (PrivateKey, PublicKey) {
    let mut rng = StdRng::seed_from_u64(seed);
    let private = PrivateKey::from_rng(&mut rng);
    let public = private.public_key();
    (private, public)
}

/// Creates a fixed draw secret for tests
pub fn create_secret() -> RngSecret {
    RngSecret::new([42u8; 32])
}

/// A reward table entry with sensible defaults
pub fn sample_entry(id: u64, weight: u64) -> RewardTableEntry {
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

/// A three-entry paid case: common (80%), uncommon (15%), rare (5%)
pub fn sample_case(id: u64, price: u64) -> Case {
    let mut rare = sample_entry(3, 50);
    rare.value = 2_000;
    Case {
        id,
        name: format!("Case {id}"),
        price,
        image_ref: format!("cases/{id}.png"),
        is_free: false,
        entries: vec![sample_entry(1, 800), sample_entry(2, 150), rare],
    }
}

/// A free case variant of [sample_case]
pub fn sample_free_case(id: u64) -> Case {
    let mut case = sample_case(id, 0);
    case.is_free = true;
    case
}
