use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, ReadRangeExt, Write};
use commonware_cryptography::ed25519::PublicKey;

use crate::{
    read_string, string_encode_size, write_string, RewardTableEntry, MAX_DISPLAY_NAME_LENGTH,
    MAX_IMAGE_REF_LENGTH, ROULETTE_SEQUENCE_LEN,
};

/// How a player settles a revealed reward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Disposition {
    /// Add the skin to the inventory (or credit the bundle, for coin rewards).
    Keep = 0,
    /// Credit the reward's coin value to the balance instead.
    Sell = 1,
}

impl Write for Disposition {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for Disposition {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = u8::read(reader)?;
        match value {
            0 => Ok(Self::Keep),
            1 => Ok(Self::Sell),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl FixedSize for Disposition {
    const SIZE: usize = 1;
}

/// Server record of one case opening.
///
/// `reward` is the authoritative outcome, fixed at open time. `roulette` is
/// the reel shown to the player, with `reward` embedded at `winner_index`,
/// so what the reel lands on and what gets settled are the same entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpeningSession {
    pub id: u64,
    pub player: PublicKey,
    pub case_id: u64,
    /// Coins debited at open time (zero for a free open).
    pub cost: u64,
    pub reward: RewardTableEntry,
    pub roulette: Vec<RewardTableEntry>,
    pub winner_index: u32,
    pub created_at: u64,
    /// Set by the first successful settlement. Never unset.
    pub settled: bool,
    pub disposition: Option<Disposition>,
}

impl Write for OpeningSession {
    fn write(&self, writer: &mut impl BufMut) {
        self.id.write(writer);
        self.player.write(writer);
        self.case_id.write(writer);
        self.cost.write(writer);
        self.reward.write(writer);
        self.roulette.write(writer);
        self.winner_index.write(writer);
        self.created_at.write(writer);
        self.settled.write(writer);
        self.disposition.write(writer);
    }
}

impl Read for OpeningSession {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            id: u64::read(reader)?,
            player: PublicKey::read(reader)?,
            case_id: u64::read(reader)?,
            cost: u64::read(reader)?,
            reward: RewardTableEntry::read(reader)?,
            roulette: Vec::<RewardTableEntry>::read_range(reader, 0..=ROULETTE_SEQUENCE_LEN)?,
            winner_index: u32::read(reader)?,
            created_at: u64::read(reader)?,
            settled: bool::read(reader)?,
            disposition: Option::<Disposition>::read(reader)?,
        })
    }
}

impl EncodeSize for OpeningSession {
    fn encode_size(&self) -> usize {
        self.id.encode_size()
            + self.player.encode_size()
            + self.case_id.encode_size()
            + self.cost.encode_size()
            + self.reward.encode_size()
            + self.roulette.encode_size()
            + self.winner_index.encode_size()
            + self.created_at.encode_size()
            + self.settled.encode_size()
            + self.disposition.encode_size()
    }
}

/// A skin held in a player's inventory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InventoryItem {
    pub reward_id: u64,
    pub display_name: String,
    pub image_ref: String,
    pub value: u64,
    pub acquired_at: u64,
}

impl Write for InventoryItem {
    fn write(&self, writer: &mut impl BufMut) {
        self.reward_id.write(writer);
        write_string(&self.display_name, writer);
        write_string(&self.image_ref, writer);
        self.value.write(writer);
        self.acquired_at.write(writer);
    }
}

impl Read for InventoryItem {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            reward_id: u64::read(reader)?,
            display_name: read_string(reader, MAX_DISPLAY_NAME_LENGTH)?,
            image_ref: read_string(reader, MAX_IMAGE_REF_LENGTH)?,
            value: u64::read(reader)?,
            acquired_at: u64::read(reader)?,
        })
    }
}

impl EncodeSize for InventoryItem {
    fn encode_size(&self) -> usize {
        self.reward_id.encode_size()
            + string_encode_size(&self.display_name)
            + string_encode_size(&self.image_ref)
            + self.value.encode_size()
            + self.acquired_at.encode_size()
    }
}
