use bytes::{Buf, BufMut};
use commonware_codec::{
    Encode, EncodeSize, Error, FixedSize, Read, ReadExt, ReadRangeExt, Write,
};
use commonware_cryptography::{
    ed25519::{self, Batch, PublicKey},
    sha256::{Digest, Sha256},
    BatchVerifier, Digestible, Hasher, Signer, Verifier,
};
use commonware_utils::union;

use crate::{
    read_string, string_encode_size, write_string, Case, Disposition, OpeningSession, Player,
    PromoCode, RewardTableEntry, MAX_CATALOG_CASES, MAX_CODE_LENGTH, MAX_NAME_LENGTH,
    ROULETTE_SEQUENCE_LEN,
};

pub const NAMESPACE: &[u8] = b"_CASEDROP";
pub const TRANSACTION_SUFFIX: &[u8] = b"_TX";

/// Maximum length of a StoreError message
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 256;

#[inline]
pub fn transaction_namespace(namespace: &[u8]) -> Vec<u8> {
    union(namespace, TRANSACTION_SUFFIX)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub nonce: u64,
    pub instruction: Instruction,

    pub public: ed25519::PublicKey,
    pub signature: ed25519::Signature,
}

impl Transaction {
    fn payload(nonce: &u64, instruction: &Instruction) -> Vec<u8> {
        let mut payload = Vec::new();
        nonce.write(&mut payload);
        instruction.write(&mut payload);

        payload
    }

    pub fn sign(private: &ed25519::PrivateKey, nonce: u64, instruction: Instruction) -> Self {
        let signature = private.sign(
            Some(&transaction_namespace(NAMESPACE)),
            &Self::payload(&nonce, &instruction),
        );

        Self {
            nonce,
            instruction,
            public: private.public_key(),
            signature,
        }
    }

    pub fn verify(&self) -> bool {
        self.public.verify(
            Some(&transaction_namespace(NAMESPACE)),
            &Self::payload(&self.nonce, &self.instruction),
            &self.signature,
        )
    }

    pub fn verify_batch(&self, batch: &mut Batch) {
        batch.add(
            Some(&transaction_namespace(NAMESPACE)),
            &Self::payload(&self.nonce, &self.instruction),
            &self.public,
            &self.signature,
        );
    }
}

impl Write for Transaction {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
        self.instruction.write(writer);
        self.public.write(writer);
        self.signature.write(writer);
    }
}

impl Read for Transaction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let nonce = u64::read(reader)?;
        let instruction = Instruction::read(reader)?;
        let public = ed25519::PublicKey::read(reader)?;
        let signature = ed25519::Signature::read(reader)?;

        Ok(Self {
            nonce,
            instruction,
            public,
            signature,
        })
    }
}

impl EncodeSize for Transaction {
    fn encode_size(&self) -> usize {
        self.nonce.encode_size()
            + self.instruction.encode_size()
            + self.public.encode_size()
            + self.signature.encode_size()
    }
}

impl Digestible for Transaction {
    type Digest = Digest;

    fn digest(&self) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(self.nonce.to_be_bytes().as_ref());
        hasher.update(self.instruction.encode().as_ref());
        hasher.update(self.public.as_ref());
        // We don't include the signature as part of the digest (any valid
        // signature will be valid for the transaction)
        hasher.finalize()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::large_enum_variant)]
pub enum Instruction {
    /// Register a new player with a name.
    /// Binary: [10] [nameLen:u32 BE] [nameBytes...]
    Register { name: String },

    /// Open a case, starting a new opening session.
    /// Binary: [11] [caseId:u64 BE] [sessionId:u64 BE] [free:u8]
    OpenCase {
        case_id: u64,
        session_id: u64,
        free: bool,
    },

    /// Settle the reward of an opening session.
    /// Binary: [12] [sessionId:u64 BE] [disposition:u8]
    SettleReward {
        session_id: u64,
        disposition: Disposition,
    },

    /// Claim the daily coin reward.
    /// Binary: [13]
    ClaimDailyReward,

    /// Redeem a promo code.
    /// Binary: [14] [codeLen:u32 BE] [codeBytes...]
    RedeemPromo { code: String },

    /// Grant or revoke the admin role (admin only).
    /// Binary: [15] [target:32B] [grant:u8]
    ToggleAdminRole { target: PublicKey, grant: bool },

    /// Create or replace a case in the catalog (admin only).
    /// Binary: [16] [case...]
    UpsertCase { case: Case },

    /// Remove a case from the catalog (admin only).
    /// Binary: [17] [caseId:u64 BE]
    RemoveCase { case_id: u64 },

    /// Create or replace a promo code (admin only).
    /// Binary: [18] [codeLen:u32 BE] [codeBytes...] [rewardCoins:u64 BE] [maxRedemptions:u32 BE]
    UpsertPromo {
        code: String,
        reward_coins: u64,
        max_redemptions: u32,
    },
}

impl Write for Instruction {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Register { name } => {
                10u8.write(writer);
                write_string(name, writer);
            }
            Self::OpenCase {
                case_id,
                session_id,
                free,
            } => {
                11u8.write(writer);
                case_id.write(writer);
                session_id.write(writer);
                free.write(writer);
            }
            Self::SettleReward {
                session_id,
                disposition,
            } => {
                12u8.write(writer);
                session_id.write(writer);
                disposition.write(writer);
            }
            Self::ClaimDailyReward => 13u8.write(writer),
            Self::RedeemPromo { code } => {
                14u8.write(writer);
                write_string(code, writer);
            }
            Self::ToggleAdminRole { target, grant } => {
                15u8.write(writer);
                target.write(writer);
                grant.write(writer);
            }
            Self::UpsertCase { case } => {
                16u8.write(writer);
                case.write(writer);
            }
            Self::RemoveCase { case_id } => {
                17u8.write(writer);
                case_id.write(writer);
            }
            Self::UpsertPromo {
                code,
                reward_coins,
                max_redemptions,
            } => {
                18u8.write(writer);
                write_string(code, writer);
                reward_coins.write(writer);
                max_redemptions.write(writer);
            }
        }
    }
}

impl Read for Instruction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let instruction = match reader.get_u8() {
            10 => Self::Register {
                name: read_string(reader, MAX_NAME_LENGTH)?,
            },
            11 => Self::OpenCase {
                case_id: u64::read(reader)?,
                session_id: u64::read(reader)?,
                free: bool::read(reader)?,
            },
            12 => Self::SettleReward {
                session_id: u64::read(reader)?,
                disposition: Disposition::read(reader)?,
            },
            13 => Self::ClaimDailyReward,
            14 => Self::RedeemPromo {
                code: read_string(reader, MAX_CODE_LENGTH)?,
            },
            15 => Self::ToggleAdminRole {
                target: PublicKey::read(reader)?,
                grant: bool::read(reader)?,
            },
            16 => Self::UpsertCase {
                case: Case::read(reader)?,
            },
            17 => Self::RemoveCase {
                case_id: u64::read(reader)?,
            },
            18 => Self::UpsertPromo {
                code: read_string(reader, MAX_CODE_LENGTH)?,
                reward_coins: u64::read(reader)?,
                max_redemptions: u32::read(reader)?,
            },

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(instruction)
    }
}

impl EncodeSize for Instruction {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Register { name } => string_encode_size(name),
                Self::OpenCase { .. } => 8 + 8 + 1,
                Self::SettleReward { .. } => 8 + 1,
                Self::ClaimDailyReward => 0,
                Self::RedeemPromo { code } => string_encode_size(code),
                Self::ToggleAdminRole { .. } => PublicKey::SIZE + 1,
                Self::UpsertCase { case } => case.encode_size(),
                Self::RemoveCase { .. } => 8,
                Self::UpsertPromo { code, .. } => string_encode_size(code) + 8 + 4,
            }
    }
}

/// Minimal account structure for transaction nonce tracking.
/// Used for replay protection across all transaction types.
#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub struct Account {
    pub nonce: u64,
}

impl Write for Account {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
    }
}

impl Read for Account {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            nonce: u64::read(reader)?,
        })
    }
}

impl EncodeSize for Account {
    fn encode_size(&self) -> usize {
        self.nonce.encode_size()
    }
}

#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Clone, Debug)]
pub enum Key {
    /// Account for nonce tracking (tag 0)
    Account(PublicKey),

    // Storefront keys (tags 10-14)
    Player(PublicKey),
    Case(u64),
    Catalog,
    Session(u64),
    Promo(String),
}

impl Write for Key {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(pk) => {
                0u8.write(writer);
                pk.write(writer);
            }

            Self::Player(pk) => {
                10u8.write(writer);
                pk.write(writer);
            }
            Self::Case(id) => {
                11u8.write(writer);
                id.write(writer);
            }
            Self::Catalog => 12u8.write(writer),
            Self::Session(id) => {
                13u8.write(writer);
                id.write(writer);
            }
            Self::Promo(code) => {
                14u8.write(writer);
                write_string(code, writer);
            }
        }
    }
}

impl Read for Key {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let key = match reader.get_u8() {
            0 => Self::Account(PublicKey::read(reader)?),

            10 => Self::Player(PublicKey::read(reader)?),
            11 => Self::Case(u64::read(reader)?),
            12 => Self::Catalog,
            13 => Self::Session(u64::read(reader)?),
            14 => Self::Promo(read_string(reader, MAX_CODE_LENGTH)?),

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(key)
    }
}

impl EncodeSize for Key {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Account(_) => PublicKey::SIZE,

                Self::Player(_) => PublicKey::SIZE,
                Self::Case(_) => u64::SIZE,
                Self::Catalog => 0,
                Self::Session(_) => u64::SIZE,
                Self::Promo(code) => string_encode_size(code),
            }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
#[allow(clippy::large_enum_variant)]
pub enum Value {
    /// Account for nonce tracking (tag 0)
    Account(Account),

    // Storefront values (tags 10-14)
    Player(Player),
    Case(Case),
    /// Ordered case ids backing catalog listing.
    Catalog(Vec<u64>),
    Session(OpeningSession),
    Promo(PromoCode),
}

impl Write for Value {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(account) => {
                0u8.write(writer);
                account.write(writer);
            }

            Self::Player(player) => {
                10u8.write(writer);
                player.write(writer);
            }
            Self::Case(case) => {
                11u8.write(writer);
                case.write(writer);
            }
            Self::Catalog(ids) => {
                12u8.write(writer);
                ids.write(writer);
            }
            Self::Session(session) => {
                13u8.write(writer);
                session.write(writer);
            }
            Self::Promo(promo) => {
                14u8.write(writer);
                promo.write(writer);
            }
        }
    }
}

impl Read for Value {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = match reader.get_u8() {
            0 => Self::Account(Account::read(reader)?),

            10 => Self::Player(Player::read(reader)?),
            11 => Self::Case(Case::read(reader)?),
            12 => Self::Catalog(Vec::<u64>::read_range(reader, 0..=MAX_CATALOG_CASES)?),
            13 => Self::Session(OpeningSession::read(reader)?),
            14 => Self::Promo(PromoCode::read(reader)?),

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(value)
    }
}

impl EncodeSize for Value {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Account(account) => account.encode_size(),

                Self::Player(player) => player.encode_size(),
                Self::Case(case) => case.encode_size(),
                Self::Catalog(ids) => ids.encode_size(),
                Self::Session(session) => session.encode_size(),
                Self::Promo(promo) => promo.encode_size(),
            }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::large_enum_variant)]
pub enum Event {
    // Storefront events (tags 20-28)
    PlayerRegistered {
        player: PublicKey,
        name: String,
    },
    CaseOpened {
        session_id: u64,
        player: PublicKey,
        case_id: u64,
        reward: RewardTableEntry,
        roulette: Vec<RewardTableEntry>,
        winner_index: u32,
        new_balance: u64,
    },
    RewardSettled {
        session_id: u64,
        player: PublicKey,
        disposition: Disposition,
        /// Coins credited by this settlement (zero for Keep of a skin).
        payout: u64,
        new_balance: u64,
    },
    DailyRewardClaimed {
        player: PublicKey,
        amount: u64,
        new_balance: u64,
    },
    PromoRedeemed {
        player: PublicKey,
        code: String,
        amount: u64,
        new_balance: u64,
    },
    AdminRoleChanged {
        target: PublicKey,
        is_admin: bool,
    },
    CaseUpserted {
        case_id: u64,
    },
    CaseRemoved {
        case_id: u64,
    },
    PromoUpserted {
        code: String,
    },

    // Error event (tag 29)
    StoreError {
        player: PublicKey,
        session_id: Option<u64>,
        error_code: u8,
        message: String,
    },
}

impl Event {
    /// The account this event concerns, if any. Used by the account-filtered
    /// updates stream.
    pub fn account(&self) -> Option<&PublicKey> {
        match self {
            Self::PlayerRegistered { player, .. }
            | Self::CaseOpened { player, .. }
            | Self::RewardSettled { player, .. }
            | Self::DailyRewardClaimed { player, .. }
            | Self::PromoRedeemed { player, .. }
            | Self::StoreError { player, .. } => Some(player),
            Self::AdminRoleChanged { target, .. } => Some(target),
            Self::CaseUpserted { .. } | Self::CaseRemoved { .. } | Self::PromoUpserted { .. } => {
                None
            }
        }
    }
}

impl Write for Event {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::PlayerRegistered { player, name } => {
                20u8.write(writer);
                player.write(writer);
                write_string(name, writer);
            }
            Self::CaseOpened {
                session_id,
                player,
                case_id,
                reward,
                roulette,
                winner_index,
                new_balance,
            } => {
                21u8.write(writer);
                session_id.write(writer);
                player.write(writer);
                case_id.write(writer);
                reward.write(writer);
                roulette.write(writer);
                winner_index.write(writer);
                new_balance.write(writer);
            }
            Self::RewardSettled {
                session_id,
                player,
                disposition,
                payout,
                new_balance,
            } => {
                22u8.write(writer);
                session_id.write(writer);
                player.write(writer);
                disposition.write(writer);
                payout.write(writer);
                new_balance.write(writer);
            }
            Self::DailyRewardClaimed {
                player,
                amount,
                new_balance,
            } => {
                23u8.write(writer);
                player.write(writer);
                amount.write(writer);
                new_balance.write(writer);
            }
            Self::PromoRedeemed {
                player,
                code,
                amount,
                new_balance,
            } => {
                24u8.write(writer);
                player.write(writer);
                write_string(code, writer);
                amount.write(writer);
                new_balance.write(writer);
            }
            Self::AdminRoleChanged { target, is_admin } => {
                25u8.write(writer);
                target.write(writer);
                is_admin.write(writer);
            }
            Self::CaseUpserted { case_id } => {
                26u8.write(writer);
                case_id.write(writer);
            }
            Self::CaseRemoved { case_id } => {
                27u8.write(writer);
                case_id.write(writer);
            }
            Self::PromoUpserted { code } => {
                28u8.write(writer);
                write_string(code, writer);
            }
            Self::StoreError {
                player,
                session_id,
                error_code,
                message,
            } => {
                29u8.write(writer);
                player.write(writer);
                session_id.write(writer);
                error_code.write(writer);
                write_string(message, writer);
            }
        }
    }
}

impl Read for Event {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let event = match reader.get_u8() {
            20 => Self::PlayerRegistered {
                player: PublicKey::read(reader)?,
                name: read_string(reader, MAX_NAME_LENGTH)?,
            },
            21 => Self::CaseOpened {
                session_id: u64::read(reader)?,
                player: PublicKey::read(reader)?,
                case_id: u64::read(reader)?,
                reward: RewardTableEntry::read(reader)?,
                roulette: Vec::<RewardTableEntry>::read_range(reader, 0..=ROULETTE_SEQUENCE_LEN)?,
                winner_index: u32::read(reader)?,
                new_balance: u64::read(reader)?,
            },
            22 => Self::RewardSettled {
                session_id: u64::read(reader)?,
                player: PublicKey::read(reader)?,
                disposition: Disposition::read(reader)?,
                payout: u64::read(reader)?,
                new_balance: u64::read(reader)?,
            },
            23 => Self::DailyRewardClaimed {
                player: PublicKey::read(reader)?,
                amount: u64::read(reader)?,
                new_balance: u64::read(reader)?,
            },
            24 => Self::PromoRedeemed {
                player: PublicKey::read(reader)?,
                code: read_string(reader, MAX_CODE_LENGTH)?,
                amount: u64::read(reader)?,
                new_balance: u64::read(reader)?,
            },
            25 => Self::AdminRoleChanged {
                target: PublicKey::read(reader)?,
                is_admin: bool::read(reader)?,
            },
            26 => Self::CaseUpserted {
                case_id: u64::read(reader)?,
            },
            27 => Self::CaseRemoved {
                case_id: u64::read(reader)?,
            },
            28 => Self::PromoUpserted {
                code: read_string(reader, MAX_CODE_LENGTH)?,
            },
            29 => Self::StoreError {
                player: PublicKey::read(reader)?,
                session_id: Option::<u64>::read(reader)?,
                error_code: u8::read(reader)?,
                message: read_string(reader, MAX_ERROR_MESSAGE_LENGTH)?,
            },

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(event)
    }
}

impl EncodeSize for Event {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::PlayerRegistered { player, name } => {
                    player.encode_size() + string_encode_size(name)
                }
                Self::CaseOpened {
                    session_id,
                    player,
                    case_id,
                    reward,
                    roulette,
                    winner_index,
                    new_balance,
                } => {
                    session_id.encode_size()
                        + player.encode_size()
                        + case_id.encode_size()
                        + reward.encode_size()
                        + roulette.encode_size()
                        + winner_index.encode_size()
                        + new_balance.encode_size()
                }
                Self::RewardSettled {
                    session_id,
                    player,
                    disposition,
                    payout,
                    new_balance,
                } => {
                    session_id.encode_size()
                        + player.encode_size()
                        + disposition.encode_size()
                        + payout.encode_size()
                        + new_balance.encode_size()
                }
                Self::DailyRewardClaimed {
                    player,
                    amount,
                    new_balance,
                } => player.encode_size() + amount.encode_size() + new_balance.encode_size(),
                Self::PromoRedeemed {
                    player,
                    code,
                    amount,
                    new_balance,
                } => {
                    player.encode_size()
                        + string_encode_size(code)
                        + amount.encode_size()
                        + new_balance.encode_size()
                }
                Self::AdminRoleChanged { target, is_admin } => {
                    target.encode_size() + is_admin.encode_size()
                }
                Self::CaseUpserted { case_id } => case_id.encode_size(),
                Self::CaseRemoved { case_id } => case_id.encode_size(),
                Self::PromoUpserted { code } => string_encode_size(code),
                Self::StoreError {
                    player,
                    session_id,
                    error_code,
                    message,
                } => {
                    player.encode_size()
                        + session_id.encode_size()
                        + error_code.encode_size()
                        + string_encode_size(message)
                }
            }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Event(Event),
    Transaction(Transaction),
}

impl Write for Output {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Event(event) => {
                0u8.write(writer);
                event.write(writer);
            }
            Self::Transaction(transaction) => {
                1u8.write(writer);
                transaction.write(writer);
            }
        }
    }
}

impl Read for Output {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(Self::Event(Event::read(reader)?)),
            1 => Ok(Self::Transaction(Transaction::read(reader)?)),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for Output {
    fn encode_size(&self) -> usize {
        1 + match self {
            Self::Event(event) => event.encode_size(),
            Self::Transaction(transaction) => transaction.encode_size(),
        }
    }
}
