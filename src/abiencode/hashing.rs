use super::{to_writer, types::Hash, Error, Writer};

use serde::Serialize;
use sha3::{Digest, Keccak256};

#[derive(Default)]
pub struct Keccak256Writer {
    hasher: Keccak256,
}

impl Writer for Keccak256Writer {
    fn write(&mut self, slot: &[u8]) {
        self.hasher.update(slot);
    }
}

impl Keccak256Writer {
    pub fn finalize(self) -> Hash {
        Hash(self.hasher.finalize().into())
    }
}

/// Hash the abi encoding of `value` without materializing it.
pub fn to_hash<T>(value: &T) -> Result<Hash, Error>
where
    T: Serialize,
{
    let mut writer = Keccak256Writer::default();
    to_writer(value, &mut writer)?;
    Ok(writer.finalize())
}

/// Plain keccak256 over raw bytes (Solidity `keccak256(bytes)`).
pub fn keccak256(data: &[u8]) -> Hash {
    Hash(Keccak256::digest(data).into())
}
