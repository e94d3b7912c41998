use crate::abiencode::types::{Address, Bytes32, U256};

/// Channel balances after a transition.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Balances {
    pub channel: Address,
    /// Epoch the transition happened in. For [Event::Close] this is the
    /// epoch that was closed, not the new one.
    pub index: U256,
    pub amount1: U256,
    pub amount2: U256,
}

/// Emitted by every successful transition.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Event {
    Open(Balances),
    Increase(Balances),
    Decrease(Balances),
    Hold {
        balances: Balances,
        count: U256,
        locktime: U256,
        pre_image: Bytes32,
    },
    Close(Balances),
}

impl Event {
    pub fn balances(&self) -> &Balances {
        match self {
            Event::Open(b)
            | Event::Increase(b)
            | Event::Decrease(b)
            | Event::Close(b)
            | Event::Hold { balances: b, .. } => b,
        }
    }

    pub fn channel(&self) -> Address {
        self.balances().channel
    }
}
