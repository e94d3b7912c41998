use std::collections::BTreeMap;

use crate::abiencode::types::{Address, U256};

/// Per-address counter of consumed signed requests.
///
/// A request signed by `signer` is only accepted if it carries
/// `nonce_of(signer)`; applying it bumps the counter, so every signature is
/// single use.
#[derive(Debug, Clone, Default)]
pub struct ReplayGuard {
    nonces: BTreeMap<Address, U256>,
}

impl ReplayGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nonce_of(&self, signer: Address) -> U256 {
        self.nonces.get(&signer).copied().unwrap_or_default()
    }

    /// Returns the expected nonce if `nonce` is not the next one.
    pub fn check(&self, signer: Address, nonce: U256) -> Result<(), U256> {
        let expected = self.nonce_of(signer);
        if nonce == expected {
            Ok(())
        } else {
            Err(expected)
        }
    }

    pub fn consume(&mut self, signer: Address) {
        let nonce = self.nonces.entry(signer).or_default();
        // 2^256 signed requests are not reachable
        *nonce = nonce.saturating_add(U256::one());
    }
}
