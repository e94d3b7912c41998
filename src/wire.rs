//! Protobuf representation of signed requests, for relaying them from the
//! initiator's client to the ledger.
//!
//! All integers are 32-byte big endian, addresses 20 bytes and signatures 65
//! bytes (`r ++ s ++ v`). Increase, decrease and close share a layout and are
//! told apart by the envelope variant.

mod encoding;

pub use encoding::{decode_request, encode_request, WireError};

use thiserror::Error;

use crate::{
    abiencode::types::{Address, Bytes32, Hash, Signature, U256},
    channel::{
        CloseRequest, DecreaseRequest, HoldClaim, HoldRequest, IncreaseRequest, OpenRequest,
        Request, Signed,
    },
};

#[derive(Clone, PartialEq, prost::Message)]
pub struct OpenRequestMsg {
    #[prost(bytes = "vec", tag = "1")]
    pub partner: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub channel: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub index: Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    pub total: Vec<u8>,
    #[prost(bytes = "vec", tag = "5")]
    pub amount1: Vec<u8>,
    #[prost(bytes = "vec", tag = "6")]
    pub amount2: Vec<u8>,
    #[prost(bytes = "vec", tag = "7")]
    pub nonce: Vec<u8>,
    #[prost(bytes = "vec", tag = "8")]
    pub deadline: Vec<u8>,
    #[prost(bytes = "vec", tag = "9")]
    pub sig: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BalanceRequestMsg {
    #[prost(bytes = "vec", tag = "1")]
    pub partner: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub channel: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub index: Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    pub amount1: Vec<u8>,
    #[prost(bytes = "vec", tag = "5")]
    pub amount2: Vec<u8>,
    #[prost(bytes = "vec", tag = "6")]
    pub nonce: Vec<u8>,
    #[prost(bytes = "vec", tag = "7")]
    pub deadline: Vec<u8>,
    #[prost(bytes = "vec", tag = "8")]
    pub sig: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct HoldRequestMsg {
    #[prost(bytes = "vec", tag = "1")]
    pub partner: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub channel: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub index: Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    pub amount1: Vec<u8>,
    #[prost(bytes = "vec", tag = "5")]
    pub amount2: Vec<u8>,
    #[prost(bytes = "vec", tag = "6")]
    pub count: Vec<u8>,
    #[prost(bytes = "vec", tag = "7")]
    pub lockterm: Vec<u8>,
    #[prost(bytes = "vec", tag = "8")]
    pub pay_hash: Vec<u8>,
    #[prost(bytes = "vec", tag = "9")]
    pub sig: Vec<u8>,
    #[prost(bytes = "vec", tag = "10")]
    pub pre_image: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RequestEnvelope {
    #[prost(oneof = "request_envelope::Msg", tags = "1, 2, 3, 4, 5")]
    pub msg: Option<request_envelope::Msg>,
}

pub mod request_envelope {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Msg {
        #[prost(message, tag = "1")]
        Open(super::OpenRequestMsg),
        #[prost(message, tag = "2")]
        Increase(super::BalanceRequestMsg),
        #[prost(message, tag = "3")]
        Decrease(super::BalanceRequestMsg),
        #[prost(message, tag = "4")]
        Hold(super::HoldRequestMsg),
        #[prost(message, tag = "5")]
        Close(super::BalanceRequestMsg),
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("field {0} has the wrong length")]
    ByteLengthMismatch(&'static str),
    #[error("envelope carries no request")]
    ExpectedSome,
}

fn address(field: &'static str, b: Vec<u8>) -> Result<Address, ConversionError> {
    Ok(Address(
        b.try_into()
            .or(Err(ConversionError::ByteLengthMismatch(field)))?,
    ))
}

fn word(field: &'static str, b: Vec<u8>) -> Result<[u8; 32], ConversionError> {
    b.try_into()
        .or(Err(ConversionError::ByteLengthMismatch(field)))
}

// Shorter encodings are accepted as long as they fit, the value is right
// aligned.
fn uint(field: &'static str, b: Vec<u8>) -> Result<U256, ConversionError> {
    if b.len() > 32 {
        return Err(ConversionError::ByteLengthMismatch(field));
    }
    Ok(U256::from_big_endian(&b))
}

fn signature(b: Vec<u8>) -> Result<Signature, ConversionError> {
    Ok(Signature(
        b.try_into()
            .or(Err(ConversionError::ByteLengthMismatch("sig")))?,
    ))
}

impl TryFrom<OpenRequestMsg> for Signed<OpenRequest> {
    type Error = ConversionError;

    fn try_from(value: OpenRequestMsg) -> Result<Self, Self::Error> {
        Ok(Signed {
            partner: address("partner", value.partner)?,
            message: OpenRequest {
                channel: address("channel", value.channel)?,
                index: uint("index", value.index)?,
                total: uint("total", value.total)?,
                amount1: uint("amount1", value.amount1)?,
                amount2: uint("amount2", value.amount2)?,
                nonce: uint("nonce", value.nonce)?,
                deadline: uint("deadline", value.deadline)?,
            },
            signature: signature(value.sig)?,
        })
    }
}

impl From<Signed<OpenRequest>> for OpenRequestMsg {
    fn from(value: Signed<OpenRequest>) -> Self {
        let m = value.message;
        Self {
            partner: value.partner.0.to_vec(),
            channel: m.channel.0.to_vec(),
            index: m.index.to_word().to_vec(),
            total: m.total.to_word().to_vec(),
            amount1: m.amount1.to_word().to_vec(),
            amount2: m.amount2.to_word().to_vec(),
            nonce: m.nonce.to_word().to_vec(),
            deadline: m.deadline.to_word().to_vec(),
            sig: value.signature.0.to_vec(),
        }
    }
}

// Increase, decrease and close have identical fields.
macro_rules! impl_balance_msg {
    ($T:ident) => {
        impl TryFrom<BalanceRequestMsg> for Signed<$T> {
            type Error = ConversionError;

            fn try_from(value: BalanceRequestMsg) -> Result<Self, Self::Error> {
                Ok(Signed {
                    partner: address("partner", value.partner)?,
                    message: $T {
                        channel: address("channel", value.channel)?,
                        index: uint("index", value.index)?,
                        amount1: uint("amount1", value.amount1)?,
                        amount2: uint("amount2", value.amount2)?,
                        nonce: uint("nonce", value.nonce)?,
                        deadline: uint("deadline", value.deadline)?,
                    },
                    signature: signature(value.sig)?,
                })
            }
        }

        impl From<Signed<$T>> for BalanceRequestMsg {
            fn from(value: Signed<$T>) -> Self {
                let m = value.message;
                Self {
                    partner: value.partner.0.to_vec(),
                    channel: m.channel.0.to_vec(),
                    index: m.index.to_word().to_vec(),
                    amount1: m.amount1.to_word().to_vec(),
                    amount2: m.amount2.to_word().to_vec(),
                    nonce: m.nonce.to_word().to_vec(),
                    deadline: m.deadline.to_word().to_vec(),
                    sig: value.signature.0.to_vec(),
                }
            }
        }
    };
}

impl_balance_msg!(IncreaseRequest);
impl_balance_msg!(DecreaseRequest);
impl_balance_msg!(CloseRequest);

impl TryFrom<HoldRequestMsg> for HoldClaim {
    type Error = ConversionError;

    fn try_from(value: HoldRequestMsg) -> Result<Self, Self::Error> {
        Ok(HoldClaim {
            request: Signed {
                partner: address("partner", value.partner)?,
                message: HoldRequest {
                    channel: address("channel", value.channel)?,
                    index: uint("index", value.index)?,
                    amount1: uint("amount1", value.amount1)?,
                    amount2: uint("amount2", value.amount2)?,
                    count: uint("count", value.count)?,
                    lockterm: uint("lockterm", value.lockterm)?,
                    pay_hash: Hash(word("pay_hash", value.pay_hash)?),
                },
                signature: signature(value.sig)?,
            },
            pre_image: Bytes32(word("pre_image", value.pre_image)?),
        })
    }
}

impl From<HoldClaim> for HoldRequestMsg {
    fn from(value: HoldClaim) -> Self {
        let r = value.request;
        let m = r.message;
        Self {
            partner: r.partner.0.to_vec(),
            channel: m.channel.0.to_vec(),
            index: m.index.to_word().to_vec(),
            amount1: m.amount1.to_word().to_vec(),
            amount2: m.amount2.to_word().to_vec(),
            count: m.count.to_word().to_vec(),
            lockterm: m.lockterm.to_word().to_vec(),
            pay_hash: m.pay_hash.0.to_vec(),
            sig: r.signature.0.to_vec(),
            pre_image: value.pre_image.0.to_vec(),
        }
    }
}

impl TryFrom<RequestEnvelope> for Request {
    type Error = ConversionError;

    fn try_from(value: RequestEnvelope) -> Result<Self, Self::Error> {
        use request_envelope::Msg;

        Ok(match value.msg.ok_or(ConversionError::ExpectedSome)? {
            Msg::Open(m) => Request::Open(m.try_into()?),
            Msg::Increase(m) => Request::Increase(m.try_into()?),
            Msg::Decrease(m) => Request::Decrease(m.try_into()?),
            Msg::Hold(m) => Request::Hold(m.try_into()?),
            Msg::Close(m) => Request::Close(m.try_into()?),
        })
    }
}

impl From<Request> for RequestEnvelope {
    fn from(value: Request) -> Self {
        use request_envelope::Msg;

        let msg = match value {
            Request::Open(r) => Msg::Open(r.into()),
            Request::Increase(r) => Msg::Increase(r.into()),
            Request::Decrease(r) => Msg::Decrease(r.into()),
            Request::Hold(r) => Msg::Hold(r.into()),
            Request::Close(r) => Msg::Close(r.into()),
        };
        RequestEnvelope { msg: Some(msg) }
    }
}
