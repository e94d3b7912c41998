use std::collections::BTreeMap;

use crate::abiencode::{
    keccak256,
    types::{Address, Hash},
};

/// Deterministic channel address of two participants.
///
/// `keccak256(lo ++ hi)[12..32]` with the two raw 20-byte addresses packed in
/// ascending order, so the result does not depend on argument order.
pub fn channel_of(a: Address, b: Address) -> Address {
    let pair = Pair::new(a, b);
    let mut packed = [0u8; 40];
    packed[..20].copy_from_slice(&pair.lo.0);
    packed[20..].copy_from_slice(&pair.hi.0);

    let Hash(hash) = keccak256(&packed);
    let mut addr = Address::ZERO;
    addr.0.copy_from_slice(&hash[12..]);
    addr
}

/// Two participants in canonical order. `amount1` of a channel always
/// belongs to `lo`, `amount2` to `hi`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Pair {
    pub lo: Address,
    pub hi: Address,
}

impl Pair {
    pub fn new(a: Address, b: Address) -> Self {
        if a <= b {
            Pair { lo: a, hi: b }
        } else {
            Pair { lo: b, hi: a }
        }
    }
}

/// What one participant sees of a pair: the other side and the channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct AddressList {
    pub counterparty: Address,
    pub channel: Address,
}

/// Cache of [AddressList] entries, filled the first time a pair transacts.
/// Entries are never changed afterwards.
#[derive(Debug, Clone, Default)]
pub struct ChannelDirectory {
    entries: BTreeMap<(Address, Address), AddressList>,
}

impl ChannelDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record both directions of the pair, returns the channel address.
    pub fn register(&mut self, a: Address, b: Address) -> Address {
        let channel = channel_of(a, b);
        self.entries.entry((a, b)).or_insert(AddressList {
            counterparty: b,
            channel,
        });
        self.entries.entry((b, a)).or_insert(AddressList {
            counterparty: a,
            channel,
        });
        channel
    }

    /// Cached entry for `caller`'s view of the pair, if the pair transacted.
    pub fn lookup(&self, caller: Address, counterparty: Address) -> Option<AddressList> {
        self.entries.get(&(caller, counterparty)).copied()
    }

    /// Like [Self::lookup], but computes the entry for pairs that have not
    /// transacted yet.
    pub fn address_list(&self, caller: Address, counterparty: Address) -> AddressList {
        self.lookup(caller, counterparty).unwrap_or(AddressList {
            counterparty,
            channel: channel_of(caller, counterparty),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
