//! The fungible asset ledger channel funds live in.
//!
//! Channels do not hold value themselves: a channel's collateral is the
//! balance of its channel address on the [AssetLedger], and every transition
//! is a set of credits and debits on that ledger.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::abiencode::types::{Address, U256};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("{account} holds {balance}, needs {required}")]
    InsufficientBalance {
        account: Address,
        balance: U256,
        required: U256,
    },
    #[error("balance of {account} would overflow")]
    Overflow { account: Address },
}

/// Balance accessor the channel engine moves value through.
pub trait AssetLedger {
    fn balance_of(&self, account: Address) -> U256;
    fn credit(&mut self, account: Address, amount: U256) -> Result<(), LedgerError>;
    fn debit(&mut self, account: Address, amount: U256) -> Result<(), LedgerError>;
}

/// In-memory [AssetLedger] with deposit and withdraw entry points for
/// external accounts.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    balances: BTreeMap<Address, U256>,
    total_supply: U256,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    /// Create `amount` new units in `account`.
    pub fn mint(&mut self, account: Address, amount: U256) -> Result<(), LedgerError> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { account })?;
        self.credit(account, amount)?;
        self.total_supply = supply;
        Ok(())
    }

    /// Bring outside value into the ledger.
    pub fn deposit(&mut self, account: Address, amount: U256) -> Result<(), LedgerError> {
        self.mint(account, amount)?;
        tracing::debug!(%account, %amount, "deposit");
        Ok(())
    }

    /// Take value out of the ledger. Fails without changes if `account` does
    /// not hold `amount`.
    pub fn withdraw(&mut self, account: Address, amount: U256) -> Result<(), LedgerError> {
        self.debit(account, amount)?;
        // debit succeeded, so the supply is at least `amount`
        self.total_supply -= amount;
        tracing::debug!(%account, %amount, "withdraw");
        Ok(())
    }
}

impl AssetLedger for MemoryLedger {
    fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    fn credit(&mut self, account: Address, amount: U256) -> Result<(), LedgerError> {
        let balance = self.balance_of(account);
        let new = balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { account })?;
        self.balances.insert(account, new);
        Ok(())
    }

    fn debit(&mut self, account: Address, amount: U256) -> Result<(), LedgerError> {
        let balance = self.balance_of(account);
        let new = balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                account,
                balance,
                required: amount,
            })?;
        self.balances.insert(account, new);
        Ok(())
    }
}
