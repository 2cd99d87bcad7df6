/// Maximum name length for player registration
pub const MAX_NAME_LENGTH: usize = 32;

/// Maximum promo code length
pub const MAX_CODE_LENGTH: usize = 24;

/// Maximum display name length for a reward entry or case
pub const MAX_DISPLAY_NAME_LENGTH: usize = 64;

/// Maximum length of an image reference (path or CDN key, not a full URL)
pub const MAX_IMAGE_REF_LENGTH: usize = 128;

/// Maximum entries in a single case reward table
pub const MAX_CASE_ENTRIES: usize = 64;

/// Maximum cases in the catalog
pub const MAX_CATALOG_CASES: usize = 256;

/// Maximum items a player inventory can hold
pub const MAX_INVENTORY_ITEMS: usize = 256;

/// Maximum redeemed promo codes tracked per player
pub const MAX_REDEEMED_CODES: usize = 64;

/// Maximum weight units on a single reward entry. Keeps the cumulative sum
/// of a full table far below u64 overflow.
pub const MAX_ENTRY_WEIGHT: u64 = 1_000_000_000;

/// Coins granted on registration
pub const INITIAL_COINS: u64 = 1_000;

/// Coins granted by a daily reward claim
pub const DAILY_REWARD_COINS: u64 = 250;

/// Roulette reel length
pub const ROULETTE_SEQUENCE_LEN: usize = 100;

/// Lowest slot (inclusive) at which the winning item may land.
/// 80/100 keeps the reveal in the final stretch of the reel.
pub const WINNER_SLOT_MIN: usize = 80;

/// Highest slot (inclusive) at which the winning item may land
pub const WINNER_SLOT_MAX: usize = 85;

/// Error codes for StoreError events
pub const ERROR_PLAYER_ALREADY_REGISTERED: u8 = 1;
pub const ERROR_PLAYER_NOT_FOUND: u8 = 2;
pub const ERROR_INSUFFICIENT_FUNDS: u8 = 3;
pub const ERROR_CASE_NOT_FOUND: u8 = 4;
pub const ERROR_NO_ELIGIBLE_REWARDS: u8 = 5;
pub const ERROR_SESSION_EXISTS: u8 = 6;
pub const ERROR_SESSION_NOT_FOUND: u8 = 7;
pub const ERROR_SESSION_NOT_OWNED: u8 = 8;
pub const ERROR_SETTLEMENT_CONFLICT: u8 = 9;
pub const ERROR_RATE_LIMITED: u8 = 10;
pub const ERROR_NOT_ADMIN: u8 = 11;
pub const ERROR_PROMO_NOT_FOUND: u8 = 12;
pub const ERROR_PROMO_EXHAUSTED: u8 = 13;
pub const ERROR_PROMO_ALREADY_REDEEMED: u8 = 14;
pub const ERROR_INVENTORY_FULL: u8 = 15;
pub const ERROR_INVALID_CASE: u8 = 16;
