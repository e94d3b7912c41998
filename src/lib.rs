//! Two-party payment channels on a shared asset ledger.
//!
//! Both participants lock collateral into a channel address and move it
//! between each other with requests signed off-ledger (EIP-712 typed data).
//! Only the ledger records transactions: one participant submits a request
//! the other one signed, and [channel::ChannelLedger] checks and applies it.

pub mod abiencode {
    mod error;
    mod hashing;
    mod ser;

    pub mod types;

    pub use error::{Error, Result};
    pub use hashing::{keccak256, to_hash, Keccak256Writer};
    pub use ser::{to_vec, to_writer, Serializer, Writer, SLOT_SIZE};

    #[cfg(test)]
    pub mod tests;
}
pub mod eip712;
pub mod sig;

pub mod channel;
pub mod config;
pub mod ledger;
pub mod wire;

pub use abiencode::types::{Address, Bytes32, Hash, Signature, U256};
pub use channel::{ChannelInfo, ChannelLedger, Error, Event, Request};
pub use config::LedgerConfig;
pub use ledger::{AssetLedger, MemoryLedger};
pub use sig::Signer;
