use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, ReadRangeExt, Write};

use crate::{
    read_string, read_string_list, string_encode_size, string_list_encode_size, write_string,
    write_string_list, InventoryItem, INITIAL_COINS, MAX_CODE_LENGTH, MAX_INVENTORY_ITEMS,
    MAX_NAME_LENGTH, MAX_REDEEMED_CODES,
};

/// Player state for the storefront.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Player {
    pub name: String,
    pub balance: u64,
    pub inventory: Vec<InventoryItem>,
    pub is_admin: bool,
    /// UTC day (days since epoch) of the last daily reward claim.
    pub last_daily_claim_day: u64,
    /// UTC day of the last free case open.
    pub last_free_open_day: u64,
    pub opened_cases: u64,
    pub redeemed_codes: Vec<String>,
}

impl Player {
    pub fn new(name: String) -> Self {
        Self {
            name,
            balance: INITIAL_COINS,
            inventory: Vec::new(),
            is_admin: false,
            // Zero allows an immediate first claim and free open.
            last_daily_claim_day: 0,
            last_free_open_day: 0,
            opened_cases: 0,
            redeemed_codes: Vec::new(),
        }
    }

    pub fn has_redeemed(&self, code: &str) -> bool {
        self.redeemed_codes.iter().any(|c| c == code)
    }
}

impl Write for Player {
    fn write(&self, writer: &mut impl BufMut) {
        write_string(&self.name, writer);
        self.balance.write(writer);
        self.inventory.write(writer);
        self.is_admin.write(writer);
        self.last_daily_claim_day.write(writer);
        self.last_free_open_day.write(writer);
        self.opened_cases.write(writer);
        write_string_list(&self.redeemed_codes, writer);
    }
}

impl Read for Player {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            name: read_string(reader, MAX_NAME_LENGTH)?,
            balance: u64::read(reader)?,
            inventory: Vec::<InventoryItem>::read_range(reader, 0..=MAX_INVENTORY_ITEMS)?,
            is_admin: bool::read(reader)?,
            last_daily_claim_day: u64::read(reader)?,
            last_free_open_day: u64::read(reader)?,
            opened_cases: u64::read(reader)?,
            redeemed_codes: read_string_list(reader, MAX_REDEEMED_CODES, MAX_CODE_LENGTH)?,
        })
    }
}

impl EncodeSize for Player {
    fn encode_size(&self) -> usize {
        string_encode_size(&self.name)
            + self.balance.encode_size()
            + self.inventory.encode_size()
            + self.is_admin.encode_size()
            + self.last_daily_claim_day.encode_size()
            + self.last_free_open_day.encode_size()
            + self.opened_cases.encode_size()
            + string_list_encode_size(&self.redeemed_codes)
    }
}

/// A promo code and its redemption budget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromoCode {
    pub code: String,
    pub reward_coins: u64,
    /// Zero means unlimited redemptions.
    pub max_redemptions: u32,
    pub redeemed: u32,
}

impl PromoCode {
    pub fn is_exhausted(&self) -> bool {
        self.max_redemptions > 0 && self.redeemed >= self.max_redemptions
    }
}

impl Write for PromoCode {
    fn write(&self, writer: &mut impl BufMut) {
        write_string(&self.code, writer);
        self.reward_coins.write(writer);
        self.max_redemptions.write(writer);
        self.redeemed.write(writer);
    }
}

impl Read for PromoCode {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            code: read_string(reader, MAX_CODE_LENGTH)?,
            reward_coins: u64::read(reader)?,
            max_redemptions: u32::read(reader)?,
            redeemed: u32::read(reader)?,
        })
    }
}

impl EncodeSize for PromoCode {
    fn encode_size(&self) -> usize {
        string_encode_size(&self.code)
            + self.reward_coins.encode_size()
            + self.max_redemptions.encode_size()
            + self.redeemed.encode_size()
    }
}
