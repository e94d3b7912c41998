use tracing::{debug, info, warn};

use super::{
    directory::{channel_of, AddressList, ChannelDirectory, Pair},
    error::{Error, InvalidState},
    event::{Balances, Event},
    nonce::ReplayGuard,
    request::{
        ChannelMessage, CloseRequest, DecreaseRequest, Freshness, HoldClaim, IncreaseRequest,
        OpenRequest, Request, Signed,
    },
    store::{ChannelInfo, ChannelStore},
};
use crate::{
    abiencode::{
        keccak256,
        types::{Address, Hash, U256},
    },
    config::LedgerConfig,
    eip712::Domain,
    ledger::{AssetLedger, LedgerError, MemoryLedger},
    sig::{self, SignatureError},
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Move {
    Debit(Address, U256),
    Credit(Address, U256),
}

impl Move {
    fn inverse(self) -> Self {
        match self {
            Move::Debit(a, x) => Move::Credit(a, x),
            Move::Credit(a, x) => Move::Debit(a, x),
        }
    }
}

/// A fully checked transition, ready to be applied.
#[derive(Debug)]
struct Transition {
    partner: Address,
    pair: Pair,
    channel: Address,
    next: ChannelInfo,
    moves: Vec<Move>,
    consumes_nonce: bool,
    event: Event,
}

/// Two-party channel ledger.
///
/// Owns the channel records, the nonces and the asset ledger the channel
/// collateral is held in. Each transition is authorized by the partner's
/// EIP-712 signature and submitted by the initiator (the other participant).
///
/// The `verify_*` functions run every check of the corresponding transition
/// except the ledger moves themselves and return the signer. The mutating
/// functions run the same checks, then apply the moves all-or-nothing.
#[derive(Debug)]
pub struct ChannelLedger<L: AssetLedger = MemoryLedger> {
    domain: Domain,
    domain_separator: Hash,
    directory: ChannelDirectory,
    store: ChannelStore,
    nonces: ReplayGuard,
    ledger: L,
    events: Vec<Event>,
}

impl<L: AssetLedger> ChannelLedger<L> {
    pub fn new(domain: Domain, ledger: L) -> Result<Self, Error> {
        let domain_separator = domain.separator()?;
        Ok(ChannelLedger {
            domain,
            domain_separator,
            directory: ChannelDirectory::new(),
            store: ChannelStore::new(),
            nonces: ReplayGuard::new(),
            ledger,
            events: Vec::new(),
        })
    }

    pub fn from_config(config: &LedgerConfig, ledger: L) -> Result<Self, Error> {
        Self::new(Domain::from(&config.domain), ledger)
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn domain_separator(&self) -> Hash {
        self.domain_separator
    }

    pub fn address_list(&self, caller: Address, counterparty: Address) -> AddressList {
        self.directory.address_list(caller, counterparty)
    }

    pub fn directory(&self) -> &ChannelDirectory {
        &self.directory
    }

    pub fn channel_info_of(&self, channel: Address) -> ChannelInfo {
        self.store.get(channel)
    }

    pub fn channel_index_of(&self, channel: Address) -> U256 {
        self.store.get(channel).index
    }

    pub fn nonce_of(&self, signer: Address) -> U256 {
        self.nonces.nonce_of(signer)
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Direct access to the asset ledger, e.g. for deposits and withdrawals.
    /// Channel addresses have no key, so their balances can only move through
    /// transitions.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn verify_open(
        &self,
        initiator: Address,
        request: &Signed<OpenRequest>,
        now: u64,
    ) -> Result<Address, Error> {
        Ok(self.check_open(initiator, request, now)?.partner)
    }

    pub fn verify_increase(
        &self,
        initiator: Address,
        request: &Signed<IncreaseRequest>,
        now: u64,
    ) -> Result<Address, Error> {
        Ok(self.check_increase(initiator, request, now)?.partner)
    }

    pub fn verify_decrease(
        &self,
        initiator: Address,
        request: &Signed<DecreaseRequest>,
        now: u64,
    ) -> Result<Address, Error> {
        Ok(self.check_decrease(initiator, request, now)?.partner)
    }

    pub fn verify_hold(
        &self,
        initiator: Address,
        claim: &HoldClaim,
        now: u64,
    ) -> Result<Address, Error> {
        Ok(self.check_hold(initiator, claim, now)?.partner)
    }

    pub fn verify_close(
        &self,
        initiator: Address,
        request: &Signed<CloseRequest>,
        now: u64,
    ) -> Result<Address, Error> {
        Ok(self.check_close(initiator, request, now)?.partner)
    }

    pub fn verify(&self, initiator: Address, request: &Request, now: u64) -> Result<Address, Error> {
        match request {
            Request::Open(r) => self.verify_open(initiator, r, now),
            Request::Increase(r) => self.verify_increase(initiator, r, now),
            Request::Decrease(r) => self.verify_decrease(initiator, r, now),
            Request::Hold(r) => self.verify_hold(initiator, r, now),
            Request::Close(r) => self.verify_close(initiator, r, now),
        }
    }

    /// Fund the channel. The smaller participant pays `amount1`, the larger
    /// `amount2`, regardless of who initiates.
    pub fn open(
        &mut self,
        initiator: Address,
        request: &Signed<OpenRequest>,
        now: u64,
    ) -> Result<Event, Error> {
        let checked = self.check_open(initiator, request, now);
        self.execute("open", initiator, checked)
    }

    pub fn increase(
        &mut self,
        initiator: Address,
        request: &Signed<IncreaseRequest>,
        now: u64,
    ) -> Result<Event, Error> {
        let checked = self.check_increase(initiator, request, now);
        self.execute("increase", initiator, checked)
    }

    pub fn decrease(
        &mut self,
        initiator: Address,
        request: &Signed<DecreaseRequest>,
        now: u64,
    ) -> Result<Event, Error> {
        let checked = self.check_decrease(initiator, request, now);
        self.execute("decrease", initiator, checked)
    }

    /// Reveal the pre-image of a signed hold and move the channel to the
    /// signed split. `locktime` becomes `now + lockterm`.
    pub fn hold(&mut self, initiator: Address, claim: &HoldClaim, now: u64) -> Result<Event, Error> {
        let checked = self.check_hold(initiator, claim, now);
        self.execute("hold", initiator, checked)
    }

    /// Pay out the channel and start the next epoch.
    pub fn close(
        &mut self,
        initiator: Address,
        request: &Signed<CloseRequest>,
        now: u64,
    ) -> Result<Event, Error> {
        let checked = self.check_close(initiator, request, now);
        self.execute("close", initiator, checked)
    }

    pub fn submit(&mut self, initiator: Address, request: &Request, now: u64) -> Result<Event, Error> {
        debug!(
            kind = request.kind(),
            %initiator,
            partner = %request.partner(),
            channel = %request.channel(),
            "request submitted"
        );
        match request {
            Request::Open(r) => self.open(initiator, r, now),
            Request::Increase(r) => self.increase(initiator, r, now),
            Request::Decrease(r) => self.decrease(initiator, r, now),
            Request::Hold(r) => self.hold(initiator, r, now),
            Request::Close(r) => self.close(initiator, r, now),
        }
    }

    /// Pair, freshness and epoch checks shared by all transitions.
    ///
    /// Deadline and nonce come before the epoch, so a replayed request is
    /// reported as such even after a close moved the channel to the next
    /// epoch.
    fn check_channel<T: ChannelMessage>(
        &self,
        initiator: Address,
        request: &Signed<T>,
        now: u64,
    ) -> Result<(Pair, ChannelInfo), Error> {
        let partner = request.partner;
        if partner == initiator {
            return Err(Error::SelfChannel);
        }

        let expected = channel_of(initiator, partner);
        let actual = request.message.channel();
        if actual != expected {
            return Err(Error::AddressCollision { expected, actual });
        }

        if let Some(Freshness { nonce, deadline }) = request.message.freshness() {
            let now = U256::from(now);
            if deadline < now {
                return Err(Error::Expired { deadline, now });
            }
            self.nonces
                .check(partner, nonce)
                .map_err(|expected| Error::NonceMismatch {
                    expected,
                    actual: nonce,
                })?;
        }

        let info = self.store.get(expected);
        if request.message.index() != info.index {
            return Err(InvalidState::IndexMismatch {
                expected: info.index,
                actual: request.message.index(),
            }
            .into());
        }

        Ok((Pair::new(initiator, partner), info))
    }

    /// Returns the signer if it is the partner named in the request.
    fn check_signer<T: ChannelMessage>(&self, request: &Signed<T>) -> Result<Address, Error> {
        let signer = sig::recover_typed(self.domain_separator, &request.message, request.signature)?;
        if signer != request.partner {
            return Err(SignatureError::WrongSigner {
                expected: request.partner,
                recovered: signer,
            }
            .into());
        }
        Ok(signer)
    }

    fn check_open(
        &self,
        initiator: Address,
        request: &Signed<OpenRequest>,
        now: u64,
    ) -> Result<Transition, Error> {
        let (pair, info) = self.check_channel(initiator, request, now)?;
        let partner = self.check_signer(request)?;
        let msg = &request.message;

        if info.is_open() {
            return Err(InvalidState::AlreadyOpen.into());
        }
        if !info.count.is_zero() {
            return Err(InvalidState::CountMismatch {
                expected: U256::zero(),
                actual: info.count,
            }
            .into());
        }
        let sum = checked_sum(msg.amount1, msg.amount2)?;
        if msg.total != sum {
            return Err(InvalidState::TotalMismatch {
                total: msg.total,
                sum,
            }
            .into());
        }
        if sum.is_zero() {
            return Err(InvalidState::EmptyAllocation.into());
        }

        let channel = msg.channel;
        debug!(%channel, %partner, total = %sum, "open verified");
        Ok(Transition {
            partner,
            pair,
            channel,
            next: ChannelInfo {
                amount1: msg.amount1,
                amount2: msg.amount2,
                ..info
            },
            moves: vec![
                Move::Debit(pair.lo, msg.amount1),
                Move::Debit(pair.hi, msg.amount2),
                Move::Credit(channel, sum),
            ],
            consumes_nonce: true,
            event: Event::Open(Balances {
                channel,
                index: info.index,
                amount1: msg.amount1,
                amount2: msg.amount2,
            }),
        })
    }

    fn check_increase(
        &self,
        initiator: Address,
        request: &Signed<IncreaseRequest>,
        now: u64,
    ) -> Result<Transition, Error> {
        let (pair, info) = self.check_channel(initiator, request, now)?;
        let partner = self.check_signer(request)?;
        let msg = &request.message;

        if !info.is_open() {
            return Err(InvalidState::NotOpen.into());
        }
        let sum = checked_sum(msg.amount1, msg.amount2)?;
        if sum.is_zero() {
            return Err(InvalidState::EmptyAllocation.into());
        }
        let next = ChannelInfo {
            amount1: checked_sum(info.amount1, msg.amount1)?,
            amount2: checked_sum(info.amount2, msg.amount2)?,
            ..info
        };
        checked_sum(next.amount1, next.amount2)?;

        let channel = msg.channel;
        debug!(%channel, %partner, added = %sum, "increase verified");
        Ok(Transition {
            partner,
            pair,
            channel,
            next,
            moves: vec![
                Move::Debit(pair.lo, msg.amount1),
                Move::Debit(pair.hi, msg.amount2),
                Move::Credit(channel, sum),
            ],
            consumes_nonce: true,
            event: Event::Increase(balances(channel, &next)),
        })
    }

    fn check_decrease(
        &self,
        initiator: Address,
        request: &Signed<DecreaseRequest>,
        now: u64,
    ) -> Result<Transition, Error> {
        let (pair, info) = self.check_channel(initiator, request, now)?;
        let partner = self.check_signer(request)?;
        let msg = &request.message;

        if !info.is_open() {
            return Err(InvalidState::NotOpen.into());
        }
        let sum = checked_sum(msg.amount1, msg.amount2)?;
        if sum.is_zero() {
            return Err(InvalidState::EmptyAllocation.into());
        }
        let next = ChannelInfo {
            amount1: release(info.amount1, msg.amount1)?,
            amount2: release(info.amount2, msg.amount2)?,
            ..info
        };
        if !next.is_open() {
            return Err(InvalidState::DrainsChannel.into());
        }

        let channel = msg.channel;
        debug!(%channel, %partner, released = %sum, "decrease verified");
        Ok(Transition {
            partner,
            pair,
            channel,
            next,
            moves: vec![
                Move::Debit(channel, sum),
                Move::Credit(pair.lo, msg.amount1),
                Move::Credit(pair.hi, msg.amount2),
            ],
            consumes_nonce: true,
            event: Event::Decrease(balances(channel, &next)),
        })
    }

    fn check_hold(
        &self,
        initiator: Address,
        claim: &HoldClaim,
        now: u64,
    ) -> Result<Transition, Error> {
        let request = &claim.request;
        let (pair, info) = self.check_channel(initiator, request, now)?;
        let msg = &request.message;

        let expected = checked_sum(info.count, U256::one())?;
        if msg.count != expected {
            return Err(InvalidState::CountMismatch {
                expected,
                actual: msg.count,
            }
            .into());
        }
        let partner = self.check_signer(request)?;

        if keccak256(&claim.pre_image.0) != msg.pay_hash {
            return Err(Error::HashMismatch);
        }
        if !info.is_open() {
            return Err(InvalidState::NotOpen.into());
        }
        let sum = checked_sum(msg.amount1, msg.amount2)?;
        if sum != info.total() {
            return Err(InvalidState::AllocationMismatch {
                expected: info.total(),
                actual: sum,
            }
            .into());
        }
        let locktime = checked_sum(U256::from(now), msg.lockterm)?;

        let next = ChannelInfo {
            amount1: msg.amount1,
            amount2: msg.amount2,
            count: msg.count,
            locktime,
            ..info
        };
        let channel = msg.channel;
        debug!(%channel, %partner, count = %msg.count, "hold verified");
        Ok(Transition {
            partner,
            pair,
            channel,
            next,
            moves: Vec::new(),
            consumes_nonce: false,
            event: Event::Hold {
                balances: balances(channel, &next),
                count: msg.count,
                locktime,
                pre_image: claim.pre_image,
            },
        })
    }

    fn check_close(
        &self,
        initiator: Address,
        request: &Signed<CloseRequest>,
        now: u64,
    ) -> Result<Transition, Error> {
        let (pair, info) = self.check_channel(initiator, request, now)?;
        let partner = self.check_signer(request)?;
        let msg = &request.message;

        if !info.is_open() {
            return Err(InvalidState::NotOpen.into());
        }
        let sum = checked_sum(msg.amount1, msg.amount2)?;
        if sum != info.total() {
            return Err(InvalidState::AllocationMismatch {
                expected: info.total(),
                actual: sum,
            }
            .into());
        }

        let next = ChannelInfo {
            index: checked_sum(info.index, U256::one())?,
            ..ChannelInfo::default()
        };
        let channel = msg.channel;
        debug!(%channel, %partner, index = %info.index, "close verified");
        Ok(Transition {
            partner,
            pair,
            channel,
            next,
            moves: vec![
                Move::Debit(channel, sum),
                Move::Credit(pair.lo, msg.amount1),
                Move::Credit(pair.hi, msg.amount2),
            ],
            consumes_nonce: true,
            event: Event::Close(Balances {
                channel,
                index: info.index,
                amount1: msg.amount1,
                amount2: msg.amount2,
            }),
        })
    }

    fn execute(
        &mut self,
        kind: &'static str,
        initiator: Address,
        checked: Result<Transition, Error>,
    ) -> Result<Event, Error> {
        let result = checked.and_then(|t| self.apply(t));
        if let Err(e) = &result {
            warn!(kind, %initiator, error = %e, "request rejected");
        }
        result
    }

    fn apply(&mut self, t: Transition) -> Result<Event, Error> {
        self.settle(&t.moves)?;

        *self.store.get_or_insert_default(t.channel) = t.next;
        if t.consumes_nonce {
            self.nonces.consume(t.partner);
        }
        self.directory.register(t.pair.lo, t.pair.hi);
        self.events.push(t.event);

        info!(
            channel = %t.channel,
            index = %t.next.index,
            amount1 = %t.next.amount1,
            amount2 = %t.next.amount2,
            "channel updated"
        );
        Ok(t.event)
    }

    /// Apply all moves or none of them.
    fn settle(&mut self, moves: &[Move]) -> Result<(), LedgerError> {
        for (done, mv) in moves.iter().enumerate() {
            if let Err(e) = self.apply_move(*mv) {
                // Roll back in reverse order. Each inverse undoes a move that
                // just succeeded, so it cannot fail.
                for mv in moves[..done].iter().rev() {
                    let undone = self.apply_move(mv.inverse());
                    debug_assert!(undone.is_ok(), "rollback of {:?} failed", mv);
                }
                return Err(e);
            }
        }
        Ok(())
    }

    fn apply_move(&mut self, mv: Move) -> Result<(), LedgerError> {
        match mv {
            Move::Debit(account, amount) => self.ledger.debit(account, amount),
            Move::Credit(account, amount) => self.ledger.credit(account, amount),
        }
    }
}

fn checked_sum(a: U256, b: U256) -> Result<U256, Error> {
    a.checked_add(b).ok_or(Error::Overflow)
}

fn release(balance: U256, amount: U256) -> Result<U256, Error> {
    balance.checked_sub(amount).ok_or_else(|| {
        InvalidState::ReleaseExceedsBalance {
            balance,
            release: amount,
        }
        .into()
    })
}

fn balances(channel: Address, info: &ChannelInfo) -> Balances {
    Balances {
        channel,
        index: info.index,
        amount1: info.amount1,
        amount2: info.amount2,
    }
}
