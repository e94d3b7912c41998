use std::collections::BTreeMap;

use crate::abiencode::types::{Address, U256};

/// State of one channel. `amount1` is the balance of the numerically smaller
/// participant, `amount2` that of the larger one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ChannelInfo {
    /// Epoch, incremented by every close.
    pub index: U256,
    pub amount1: U256,
    pub amount2: U256,
    /// Number of holds in the current epoch.
    pub count: U256,
    /// Unix time until which the last hold is locked.
    pub locktime: U256,
}

impl ChannelInfo {
    /// Channel value. The two sides are each backed by ledger balance, so the
    /// sum never overflows for records the engine wrote.
    pub fn total(&self) -> U256 {
        self.amount1.saturating_add(self.amount2)
    }

    pub fn is_open(&self) -> bool {
        !self.total().is_zero()
    }
}

/// Channel records keyed by channel address. Records are created on first
/// touch and never removed.
#[derive(Debug, Clone, Default)]
pub struct ChannelStore {
    channels: BTreeMap<Address, ChannelInfo>,
}

impl ChannelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The record of `channel`, all zero if it was never touched.
    pub fn get(&self, channel: Address) -> ChannelInfo {
        self.channels.get(&channel).copied().unwrap_or_default()
    }

    pub fn get_or_insert_default(&mut self, channel: Address) -> &mut ChannelInfo {
        self.channels.entry(channel).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_channel_reads_zero() {
        let store = ChannelStore::new();
        let info = store.get(Address::ZERO);
        assert_eq!(info, ChannelInfo::default());
        assert!(!info.is_open());
    }

    #[test]
    fn lazily_created() {
        let mut store = ChannelStore::new();
        let channel = Address([7; 20]);
        assert_eq!(*store.get_or_insert_default(channel), ChannelInfo::default());
        store.get_or_insert_default(channel).amount2 = U256::from(5u64);

        assert!(store.get(channel).is_open());
        assert_eq!(store.get(channel).total(), U256::from(5u64));
    }
}
