//! Handles the creation and verification of (Ethereum) Signatures over
//! EIP-712 typed data.

use thiserror::Error;

use crate::{
    abiencode::{
        self,
        types::{Address, Hash, Signature, U256},
    },
    eip712::{self, TypedData},
};

mod k256;
pub use self::k256::Signer;


/// `secp256k1n / 2`. Signatures with a larger `s` are rejected, their twin
/// `(n - s, flipped v)` recovers the same signer.
const HALF_CURVE_ORDER: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("recovery id must be 27 or 28, got {0}")]
    InvalidRecoveryId(u8),
    #[error("signature s value is in the upper half of the curve order")]
    Malleable,
    #[error("signature bytes do not form a valid signature")]
    Malformed,
    #[error("no public key can be recovered from the signature")]
    RecoveryFailed,
    #[error("signature recovered the zero address")]
    ZeroSigner,
    #[error("signature is from {recovered}, expected {expected}")]
    WrongSigner { expected: Address, recovered: Address },
    #[error("signing the digest failed")]
    SigningFailed,
    #[error("typed data could not be encoded: {0}")]
    Encoding(#[from] abiencode::Error),
}

/// Recover the address that produced `sig` over `digest`.
///
/// `digest` is the final EIP-712 hash (see [eip712::digest]); no
/// `Ethereum Signed Message` prefix is added.
pub fn recover(digest: Hash, sig: Signature) -> Result<Address, SignatureError> {
    match sig.v() {
        27 | 28 => {}
        v => return Err(SignatureError::InvalidRecoveryId(v)),
    }
    if U256::from_big_endian(sig.s()) > U256::from_big_endian(&HALF_CURVE_ORDER) {
        return Err(SignatureError::Malleable);
    }

    let signer = k256::recover_signer(digest, sig)?;
    if signer.is_zero() {
        return Err(SignatureError::ZeroSigner);
    }
    Ok(signer)
}

/// Recover the signer of `value` in the domain identified by
/// `domain_separator`.
pub fn recover_typed<T: TypedData>(
    domain_separator: Hash,
    value: &T,
    sig: Signature,
) -> Result<Address, SignatureError> {
    let digest = eip712::signing_hash(domain_separator, value)?;
    recover(digest, sig)
}
