//! Error type and Return values used by the Serialization.

use core::fmt::Display;

use serde::ser;
use thiserror::Error;

/// Represents all possible errors that can happen during Serialization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The struct contains a type that is not directly representable in
    /// Solidity types.
    ///
    /// For example floating point numbers, enums, options and maps. Enums
    /// should be represented with the
    /// [serde_repr](https://github.com/dtolnay/serde-repr) crate or a custom
    /// serialize method.
    #[error("type is not representable in abi encoding: {0}")]
    TypeNotRepresentable(&'static str),
    /// The type is representable in Solidity, but dynamic (`string`, `bytes`,
    /// arrays). Typed-data encoding replaces dynamic values by their keccak
    /// hash, so the caller has to hash them before handing them to the
    /// encoder.
    #[error("dynamic type must be hashed before encoding: {0}")]
    DynamicType(&'static str),
    #[error("{0}")]
    Custom(String),
}

impl ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: Display,
    {
        Error::Custom(msg.to_string())
    }
}

/// Alias for `Result` using the [Error] returned by the Serialization.
pub type Result<T> = core::result::Result<T, Error>;
