//! Signer using the k256 Rust crate (implementation of ecdsa in Rust).

use crate::{
    abiencode::types::{Address, Hash, Signature},
    eip712::{self, TypedData},
};
use k256::{
    ecdsa::{
        recoverable,
        signature::{hazmat::PrehashSigner, Signature as k256Signature},
        SigningKey, VerifyingKey,
    },
    elliptic_curve::sec1::ToEncodedPoint,
};
use sha3::{Digest, Keccak256};

use super::SignatureError;

/// Holds a private key and signs typed data on behalf of its address.
///
/// Signing happens on the client side; the ledger itself only ever recovers
/// signers.
pub struct Signer {
    key: SigningKey,
    addr: Address,
}

impl core::fmt::Debug for Signer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Signer")
            .field("addr", &self.addr)
            .finish_non_exhaustive()
    }
}

impl From<VerifyingKey> for Address {
    fn from(key: VerifyingKey) -> Self {
        // Uncompressed SEC1 encoding: 0x04 ++ x ++ y. The address is the last
        // 20 bytes of the keccak hash of x ++ y.
        let point = key.to_encoded_point(false);
        let hash: [u8; 32] = Keccak256::digest(&point.as_bytes()[1..]).into();

        let mut addr = Address([0; 20]);
        addr.0.copy_from_slice(&hash[32 - 20..]);
        addr
    }
}

impl Signer {
    pub fn new<R: rand::Rng + rand::CryptoRng>(rng: &mut R) -> Self {
        let key = SigningKey::random(rng);
        let addr = key.verifying_key().into();
        Self { key, addr }
    }

    /// Build a signer from a raw 32-byte secret scalar.
    pub fn from_bytes(secret: &[u8; 32]) -> Result<Self, SignatureError> {
        let key = SigningKey::from_bytes(secret).map_err(|_| SignatureError::Malformed)?;
        let addr = key.verifying_key().into();
        Ok(Self { key, addr })
    }

    pub fn address(&self) -> Address {
        self.addr
    }

    /// Sign a final digest (no prefix is added).
    pub fn sign_digest(&self, digest: Hash) -> Result<Signature, SignatureError> {
        let sig: recoverable::Signature = self
            .key
            .sign_prehash(&digest.0)
            .map_err(|_| SignatureError::SigningFailed)?;

        // The recoverable signature already is r ++ s ++ v, v being 0 or 1.
        // Ethereum expects v to be offset by 27.
        let mut sig_bytes = [0u8; 65];
        sig_bytes.copy_from_slice(sig.as_bytes());
        debug_assert!(sig_bytes[32] & 0x80 == 0, "k256 produces low-s signatures");
        sig_bytes[64] += 27;

        Ok(Signature(sig_bytes))
    }

    /// Sign `value` as EIP-712 typed data in the given domain.
    pub fn sign_typed<T: TypedData>(
        &self,
        domain_separator: Hash,
        value: &T,
    ) -> Result<Signature, SignatureError> {
        self.sign_digest(eip712::signing_hash(domain_separator, value)?)
    }
}

pub(super) fn recover_signer(digest: Hash, eth_sig: Signature) -> Result<Address, SignatureError> {
    // Undo adding the 27, to go back to the format expected below. The caller
    // has already made sure v is 27 or 28.
    let mut sig_bytes: [u8; 65] = eth_sig.0;
    sig_bytes[64] -= 27;

    let sig = recoverable::Signature::from_bytes(&sig_bytes)
        .map_err(|_| SignatureError::Malformed)?;

    let verifying_key = sig
        .recover_verifying_key_from_digest_bytes(&digest.0.into())
        .map_err(|_| SignatureError::RecoveryFailed)?;
    Ok(verifying_key.into())
}
