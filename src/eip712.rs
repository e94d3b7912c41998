//! EIP-712 typed structured data hashing.
//!
//! The digest that is actually signed is
//! `keccak256("\x19\x01" ++ domainSeparator ++ hashStruct(message))`, where
//! `hashStruct(s) = keccak256(typeHash ++ encodeData(s))`. `encodeData` is the
//! abi encoding of the struct's fields with `string`/`bytes` members replaced
//! by their hash, so any type implementing [TypedData] must only contain
//! static fields (hash dynamic data before putting it into the struct).

use serde::Serialize;
use sha3::{Digest, Keccak256};

use crate::{
    abiencode::{
        self, keccak256,
        types::{Address, Hash, U256},
    },
    config::DomainConfig,
};

const DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// A struct that can be hashed and signed as EIP-712 typed data.
pub trait TypedData: Serialize {
    /// The `encodeType` string, including referenced struct types in
    /// alphabetical order, e.g. `Mail(Person from,Person to)Person(...)`.
    ///
    /// The field order of the Rust struct must match this string.
    const TYPE: &'static str;

    fn type_hash() -> Hash {
        keccak256(Self::TYPE.as_bytes())
    }

    fn struct_hash(&self) -> Result<Hash, abiencode::Error> {
        abiencode::to_hash(&(Self::type_hash(), self))
    }
}

/// The signing domain. Binds signatures to one deployment of the ledger so
/// they cannot be replayed against another chain or another ledger instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    pub name: String,
    pub version: String,
    pub chain_id: U256,
    pub verifying_contract: Address,
}

#[derive(Serialize)]
struct EncodedDomain {
    type_hash: Hash,
    name: Hash,
    version: Hash,
    chain_id: U256,
    verifying_contract: Address,
}

impl Domain {
    pub fn separator(&self) -> Result<Hash, abiencode::Error> {
        abiencode::to_hash(&EncodedDomain {
            type_hash: keccak256(DOMAIN_TYPE.as_bytes()),
            name: keccak256(self.name.as_bytes()),
            version: keccak256(self.version.as_bytes()),
            chain_id: self.chain_id,
            verifying_contract: self.verifying_contract,
        })
    }
}

impl From<&DomainConfig> for Domain {
    fn from(cfg: &DomainConfig) -> Self {
        Domain {
            name: cfg.name.clone(),
            version: cfg.version.clone(),
            chain_id: U256::from(cfg.chain_id),
            verifying_contract: cfg.verifying_contract,
        }
    }
}

/// Combine a domain separator and a struct hash into the signed digest.
pub fn digest(domain_separator: Hash, struct_hash: Hash) -> Hash {
    // Packed encoding => We can't use the serializer
    let mut hasher = Keccak256::new();
    hasher.update(b"\x19\x01");
    hasher.update(domain_separator.0);
    hasher.update(struct_hash.0);
    Hash(hasher.finalize().into())
}

/// The digest a signer has to sign for `value` in the given domain.
pub fn signing_hash<T: TypedData>(domain_separator: Hash, value: &T) -> Result<Hash, abiencode::Error> {
    Ok(digest(domain_separator, value.struct_hash()?))
}
