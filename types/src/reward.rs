use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, ReadRangeExt, Write};

use crate::{
    read_string, string_encode_size, write_string, MAX_CASE_ENTRIES, MAX_DISPLAY_NAME_LENGTH,
    MAX_IMAGE_REF_LENGTH,
};

/// What a reward table entry pays out when it drops.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RewardKind {
    /// A cosmetic skin that lands in the player's inventory.
    Skin = 0,
    /// A bundle of coins credited directly to the balance.
    CoinBundle = 1,
}

impl Write for RewardKind {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for RewardKind {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = u8::read(reader)?;
        match value {
            0 => Ok(Self::Skin),
            1 => Ok(Self::CoinBundle),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl FixedSize for RewardKind {
    const SIZE: usize = 1;
}

/// One row of a case's reward table.
///
/// `weight` is in relative weight units; an entry's drop chance is its weight
/// over the eligible table total. `never_drop` entries are shown in the
/// catalog but excluded from selection (display-only showpieces).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewardTableEntry {
    pub id: u64,
    pub kind: RewardKind,
    pub weight: u64,
    pub never_drop: bool,
    pub display_name: String,
    pub image_ref: String,
    /// Coin value credited on a Sell settlement.
    pub value: u64,
}

impl RewardTableEntry {
    /// Whether this entry can be selected as a winner.
    pub fn is_eligible(&self) -> bool {
        self.weight > 0 && !self.never_drop
    }
}

impl Write for RewardTableEntry {
    fn write(&self, writer: &mut impl BufMut) {
        self.id.write(writer);
        self.kind.write(writer);
        self.weight.write(writer);
        self.never_drop.write(writer);
        write_string(&self.display_name, writer);
        write_string(&self.image_ref, writer);
        self.value.write(writer);
    }
}

impl Read for RewardTableEntry {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            id: u64::read(reader)?,
            kind: RewardKind::read(reader)?,
            weight: u64::read(reader)?,
            never_drop: bool::read(reader)?,
            display_name: read_string(reader, MAX_DISPLAY_NAME_LENGTH)?,
            image_ref: read_string(reader, MAX_IMAGE_REF_LENGTH)?,
            value: u64::read(reader)?,
        })
    }
}

impl EncodeSize for RewardTableEntry {
    fn encode_size(&self) -> usize {
        self.id.encode_size()
            + self.kind.encode_size()
            + self.weight.encode_size()
            + self.never_drop.encode_size()
            + string_encode_size(&self.display_name)
            + string_encode_size(&self.image_ref)
            + self.value.encode_size()
    }
}

/// A purchasable case and its reward table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Case {
    pub id: u64,
    pub name: String,
    pub price: u64,
    pub image_ref: String,
    /// Free cases skip the balance debit and are limited to one open per day.
    pub is_free: bool,
    pub entries: Vec<RewardTableEntry>,
}

impl Case {
    /// Entries that can actually drop.
    pub fn eligible_entries(&self) -> impl Iterator<Item = &RewardTableEntry> {
        self.entries.iter().filter(|entry| entry.is_eligible())
    }

    /// Sum of eligible weights. Zero means the case cannot be opened.
    pub fn total_weight(&self) -> u64 {
        self.eligible_entries().map(|entry| entry.weight).sum()
    }
}

impl Write for Case {
    fn write(&self, writer: &mut impl BufMut) {
        self.id.write(writer);
        write_string(&self.name, writer);
        self.price.write(writer);
        write_string(&self.image_ref, writer);
        self.is_free.write(writer);
        self.entries.write(writer);
    }
}

impl Read for Case {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            id: u64::read(reader)?,
            name: read_string(reader, MAX_DISPLAY_NAME_LENGTH)?,
            price: u64::read(reader)?,
            image_ref: read_string(reader, MAX_IMAGE_REF_LENGTH)?,
            is_free: bool::read(reader)?,
            entries: Vec::<RewardTableEntry>::read_range(reader, 0..=MAX_CASE_ENTRIES)?,
        })
    }
}

impl EncodeSize for Case {
    fn encode_size(&self) -> usize {
        self.id.encode_size()
            + string_encode_size(&self.name)
            + self.price.encode_size()
            + string_encode_size(&self.image_ref)
            + self.is_free.encode_size()
            + self.entries.encode_size()
    }
}
