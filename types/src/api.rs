use crate::{Case, Event, Transaction, MAX_CATALOG_CASES};
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, ReadRangeExt, Write};
use commonware_cryptography::ed25519::PublicKey;

/// Maximum number of transactions that can be submitted in a single submission
pub const MAX_SUBMISSION_TRANSACTIONS: usize = 128;

/// Maximum number of events in a single update
pub const MAX_UPDATE_EVENTS: usize = 512;

/// Body of a POST /submit request.
#[derive(Clone, Debug)]
pub enum Submission {
    Transactions(Vec<Transaction>),
}

impl Write for Submission {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Submission::Transactions(txs) => {
                0u8.write(writer);
                txs.write(writer);
            }
        }
    }
}

impl Read for Submission {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(Submission::Transactions(Vec::read_range(
                reader,
                1..=MAX_SUBMISSION_TRANSACTIONS,
            )?)),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for Submission {
    fn encode_size(&self) -> usize {
        1 + match self {
            Submission::Transactions(txs) => txs.encode_size(),
        }
    }
}

/// Message pushed over the updates WebSocket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Update {
    Events(Vec<Event>),
}

impl Write for Update {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Update::Events(events) => {
                0u8.write(writer);
                events.write(writer);
            }
        }
    }
}

impl Read for Update {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(Update::Events(Vec::read_range(
                reader,
                0..=MAX_UPDATE_EVENTS,
            )?)),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for Update {
    fn encode_size(&self) -> usize {
        1 + match self {
            Update::Events(events) => events.encode_size(),
        }
    }
}

/// Subscription filter for updates stream
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum UpdatesFilter {
    /// Subscribe to all events
    All,
    /// Subscribe to events for a specific account
    Account(PublicKey),
}

impl UpdatesFilter {
    /// Whether the filter admits an event.
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            UpdatesFilter::All => true,
            UpdatesFilter::Account(key) => event.account() == Some(key),
        }
    }
}

impl Write for UpdatesFilter {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            UpdatesFilter::All => 0u8.write(writer),
            UpdatesFilter::Account(key) => {
                1u8.write(writer);
                key.write(writer);
            }
        }
    }
}

impl Read for UpdatesFilter {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(UpdatesFilter::All),
            1 => Ok(UpdatesFilter::Account(PublicKey::read(reader)?)),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for UpdatesFilter {
    fn encode_size(&self) -> usize {
        1 + match self {
            UpdatesFilter::All => 0,
            UpdatesFilter::Account(key) => key.encode_size(),
        }
    }
}

/// Transactions accepted but not yet executed.
#[derive(Clone, Debug)]
pub struct Pending {
    pub transactions: Vec<Transaction>,
}

impl Write for Pending {
    fn write(&self, writer: &mut impl BufMut) {
        self.transactions.write(writer);
    }
}

impl Read for Pending {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let transactions = Vec::<Transaction>::read_range(reader, 0..=MAX_SUBMISSION_TRANSACTIONS)?;
        Ok(Self { transactions })
    }
}

impl EncodeSize for Pending {
    fn encode_size(&self) -> usize {
        self.transactions.encode_size()
    }
}

/// Body of a GET /catalog response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogSnapshot {
    pub cases: Vec<Case>,
}

impl Write for CatalogSnapshot {
    fn write(&self, writer: &mut impl BufMut) {
        self.cases.write(writer);
    }
}

impl Read for CatalogSnapshot {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let cases = Vec::<Case>::read_range(reader, 0..=MAX_CATALOG_CASES)?;
        Ok(Self { cases })
    }
}

impl EncodeSize for CatalogSnapshot {
    fn encode_size(&self) -> usize {
        self.cases.encode_size()
    }
}
