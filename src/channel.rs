//! Two-party channels: addressing, state records, replay protection and the
//! five signed transitions.

mod directory;
mod engine;
mod error;
mod event;
mod nonce;
mod request;
mod store;

pub use directory::{channel_of, AddressList, ChannelDirectory, Pair};
pub use engine::ChannelLedger;
pub use error::{Error, InvalidState};
pub use event::{Balances, Event};
pub use nonce::ReplayGuard;
pub use request::{
    ChannelMessage, CloseRequest, DecreaseRequest, Freshness, HoldClaim, HoldRequest,
    IncreaseRequest, OpenRequest, Request, Signed,
};
pub use store::{ChannelInfo, ChannelStore};
