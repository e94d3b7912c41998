//! Deployment configuration.
//!
//! ```json
//! {
//!   "domain": {
//!     "name": "FastChannel",
//!     "version": "1",
//!     "chain_id": 1,
//!     "verifying_contract": "0x5FbDB2315678afecb367f032d93F642f64180aa3"
//!   }
//! }
//! ```

use serde::Deserialize;

use crate::abiencode::types::Address;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LedgerConfig {
    pub domain: DomainConfig,
}

/// EIP-712 domain parameters. Signatures are only valid for the exact
/// combination configured here.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DomainConfig {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}
