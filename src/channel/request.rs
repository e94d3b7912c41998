//! The five signed request types.
//!
//! Each struct is EIP-712 typed data; the field order of the Rust struct is
//! the field order of its `TYPE` string and must not change.

use serde::Serialize;

use crate::{
    abiencode::types::{Address, Bytes32, Hash, Signature, U256},
    eip712::TypedData,
    sig::{SignatureError, Signer},
};

/// Nonce and deadline of a request that consumes a nonce of its signer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Freshness {
    pub nonce: U256,
    pub deadline: U256,
}

/// Common accessors the engine needs from every request.
pub trait ChannelMessage: TypedData {
    fn channel(&self) -> Address;
    fn index(&self) -> U256;
    /// `None` for requests that are not replay protected by a nonce.
    fn freshness(&self) -> Option<Freshness>;
}

#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    pub channel: Address,
    pub index: U256,
    pub total: U256,
    pub amount1: U256,
    pub amount2: U256,
    pub nonce: U256,
    pub deadline: U256,
}

/// Per-side top up. `amount1`/`amount2` are added to the current balances.
#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct IncreaseRequest {
    pub channel: Address,
    pub index: U256,
    pub amount1: U256,
    pub amount2: U256,
    pub nonce: U256,
    pub deadline: U256,
}

/// Per-side release. `amount1`/`amount2` are paid out of the channel.
#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct DecreaseRequest {
    pub channel: Address,
    pub index: U256,
    pub amount1: U256,
    pub amount2: U256,
    pub nonce: U256,
    pub deadline: U256,
}

/// Rebalance conditioned on revealing the pre-image of `pay_hash`.
#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct HoldRequest {
    pub channel: Address,
    pub index: U256,
    pub amount1: U256,
    pub amount2: U256,
    pub count: U256,
    pub lockterm: U256,
    pub pay_hash: Hash,
}

/// Final split of the channel.
#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct CloseRequest {
    pub channel: Address,
    pub index: U256,
    pub amount1: U256,
    pub amount2: U256,
    pub nonce: U256,
    pub deadline: U256,
}

impl TypedData for OpenRequest {
    const TYPE: &'static str = "OpenRequest(address channel,uint256 index,uint256 total,uint256 amount1,uint256 amount2,uint256 nonce,uint256 deadline)";
}

impl TypedData for IncreaseRequest {
    const TYPE: &'static str = "IncreaseRequest(address channel,uint256 index,uint256 amount1,uint256 amount2,uint256 nonce,uint256 deadline)";
}

impl TypedData for DecreaseRequest {
    const TYPE: &'static str = "DecreaseRequest(address channel,uint256 index,uint256 amount1,uint256 amount2,uint256 nonce,uint256 deadline)";
}

impl TypedData for HoldRequest {
    const TYPE: &'static str = "HoldRequest(address channel,uint256 index,uint256 amount1,uint256 amount2,uint256 count,uint256 lockterm,bytes32 payHash)";
}

impl TypedData for CloseRequest {
    const TYPE: &'static str = "CloseRequest(address channel,uint256 index,uint256 amount1,uint256 amount2,uint256 nonce,uint256 deadline)";
}

macro_rules! impl_fresh_message {
    ($T:ty) => {
        impl ChannelMessage for $T {
            fn channel(&self) -> Address {
                self.channel
            }

            fn index(&self) -> U256 {
                self.index
            }

            fn freshness(&self) -> Option<Freshness> {
                Some(Freshness {
                    nonce: self.nonce,
                    deadline: self.deadline,
                })
            }
        }
    };
}

impl_fresh_message!(OpenRequest);
impl_fresh_message!(IncreaseRequest);
impl_fresh_message!(DecreaseRequest);
impl_fresh_message!(CloseRequest);

impl ChannelMessage for HoldRequest {
    fn channel(&self) -> Address {
        self.channel
    }

    fn index(&self) -> U256 {
        self.index
    }

    fn freshness(&self) -> Option<Freshness> {
        None
    }
}

/// A request together with the partner that signed it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Signed<T> {
    pub partner: Address,
    pub message: T,
    pub signature: Signature,
}

impl<T: TypedData> Signed<T> {
    /// Sign `message` with `signer`, who becomes the partner.
    pub fn sign(
        signer: &Signer,
        domain_separator: Hash,
        message: T,
    ) -> Result<Self, SignatureError> {
        Ok(Signed {
            partner: signer.address(),
            signature: signer.sign_typed(domain_separator, &message)?,
            message,
        })
    }
}

/// A signed hold and the secret it is conditioned on.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HoldClaim {
    pub request: Signed<HoldRequest>,
    pub pre_image: Bytes32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Request {
    Open(Signed<OpenRequest>),
    Increase(Signed<IncreaseRequest>),
    Decrease(Signed<DecreaseRequest>),
    Hold(HoldClaim),
    Close(Signed<CloseRequest>),
}

impl Request {
    pub fn partner(&self) -> Address {
        match self {
            Request::Open(r) => r.partner,
            Request::Increase(r) => r.partner,
            Request::Decrease(r) => r.partner,
            Request::Hold(r) => r.request.partner,
            Request::Close(r) => r.partner,
        }
    }

    pub fn channel(&self) -> Address {
        match self {
            Request::Open(r) => r.message.channel,
            Request::Increase(r) => r.message.channel,
            Request::Decrease(r) => r.message.channel,
            Request::Hold(r) => r.request.message.channel,
            Request::Close(r) => r.message.channel,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Request::Open(_) => "open",
            Request::Increase(_) => "increase",
            Request::Decrease(_) => "decrease",
            Request::Hold(_) => "hold",
            Request::Close(_) => "close",
        }
    }
}

impl From<Signed<OpenRequest>> for Request {
    fn from(r: Signed<OpenRequest>) -> Self {
        Request::Open(r)
    }
}

impl From<Signed<IncreaseRequest>> for Request {
    fn from(r: Signed<IncreaseRequest>) -> Self {
        Request::Increase(r)
    }
}

impl From<Signed<DecreaseRequest>> for Request {
    fn from(r: Signed<DecreaseRequest>) -> Self {
        Request::Decrease(r)
    }
}

impl From<HoldClaim> for Request {
    fn from(r: HoldClaim) -> Self {
        Request::Hold(r)
    }
}

impl From<Signed<CloseRequest>> for Request {
    fn from(r: Signed<CloseRequest>) -> Self {
        Request::Close(r)
    }
}
