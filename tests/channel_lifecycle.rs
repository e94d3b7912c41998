use fastchannel::{
    abiencode::keccak256,
    channel::{
        channel_of, AddressList, ChannelInfo, CloseRequest, DecreaseRequest, HoldClaim,
        HoldRequest, IncreaseRequest, OpenRequest, Pair, Signed,
    },
    eip712::{Domain, TypedData},
    wire, Address, AssetLedger, Bytes32, ChannelLedger, Event, LedgerConfig, MemoryLedger, Signer,
    U256,
};
use rand::{rngs::StdRng, SeedableRng};

const NOW: u64 = 1_700_000_000;
const THREE_DAYS: u64 = 3 * 24 * 60 * 60;

fn ether_tenth() -> U256 {
    U256::from(10u64).pow(U256::from(17u64))
}

fn config() -> LedgerConfig {
    serde_json::from_str(
        r#"{
            "domain": {
                "name": "FastChannel",
                "version": "1",
                "chain_id": 31337,
                "verifying_contract": "0x5FbDB2315678afecb367f032d93F642f64180aa3"
            }
        }"#,
    )
    .unwrap()
}

struct Participants {
    alice: Signer,
    bob: Signer,
    channel: Address,
    pair: Pair,
}

fn sign<T: TypedData>(cl: &ChannelLedger, signer: &Signer, message: T) -> Signed<T> {
    Signed::sign(signer, cl.domain_separator(), message).unwrap()
}

fn setup() -> (ChannelLedger, Participants) {
    // Do not use that on any real device, this is just for testing.
    let mut rng = StdRng::seed_from_u64(0);
    let alice = Signer::new(&mut rng);
    let bob = Signer::new(&mut rng);

    let mut cl = ChannelLedger::from_config(&config(), MemoryLedger::new()).unwrap();
    assert_eq!(cl.domain(), &Domain::from(&config().domain));
    cl.ledger_mut().deposit(alice.address(), ether_tenth()).unwrap();
    cl.ledger_mut().deposit(bob.address(), ether_tenth()).unwrap();

    let p = Participants {
        channel: channel_of(alice.address(), bob.address()),
        pair: Pair::new(alice.address(), bob.address()),
        alice,
        bob,
    };
    (cl, p)
}

fn info(index: u64, amount1: u64, amount2: u64, count: u64, locktime: u64) -> ChannelInfo {
    ChannelInfo {
        index: U256::from(index),
        amount1: U256::from(amount1),
        amount2: U256::from(amount2),
        count: U256::from(count),
        locktime: U256::from(locktime),
    }
}

fn assert_backed(cl: &ChannelLedger, channel: Address) {
    assert_eq!(
        cl.channel_info_of(channel).total(),
        cl.ledger().balance_of(channel)
    );
}

#[test]
fn full_lifecycle() {
    let (mut cl, p) = setup();
    let (alice, bob) = (p.alice.address(), p.bob.address());
    let deadline = U256::from(NOW + 600);

    assert_eq!(cl.channel_info_of(Address::ZERO), ChannelInfo::default());
    assert_eq!(
        cl.address_list(alice, bob),
        AddressList {
            counterparty: bob,
            channel: p.channel
        }
    );

    // Bob opens with Alice's signature.
    let open = sign(
        &cl,
        &p.alice,
        OpenRequest {
            channel: p.channel,
            index: U256::zero(),
            total: U256::from(15000u64),
            amount1: U256::from(14500u64),
            amount2: U256::from(500u64),
            nonce: cl.nonce_of(alice),
            deadline,
        },
    );
    cl.open(bob, &open, NOW).unwrap();
    assert_eq!(cl.channel_info_of(p.channel), info(0, 14500, 500, 0, 0));
    assert_backed(&cl, p.channel);

    // Alice tops up with Bob's signature.
    let increase = sign(
        &cl,
        &p.bob,
        IncreaseRequest {
            channel: p.channel,
            index: U256::zero(),
            amount1: U256::from(300u64),
            amount2: U256::from(700u64),
            nonce: cl.nonce_of(bob),
            deadline,
        },
    );
    cl.increase(alice, &increase, NOW).unwrap();
    assert_eq!(cl.channel_info_of(p.channel), info(0, 14800, 1200, 0, 0));
    assert_backed(&cl, p.channel);

    let decrease = sign(
        &cl,
        &p.alice,
        DecreaseRequest {
            channel: p.channel,
            index: U256::zero(),
            amount1: U256::from(300u64),
            amount2: U256::from(700u64),
            nonce: cl.nonce_of(alice),
            deadline,
        },
    );
    cl.decrease(bob, &decrease, NOW).unwrap();
    assert_eq!(cl.channel_info_of(p.channel), info(0, 14500, 500, 0, 0));
    assert_backed(&cl, p.channel);

    let pre_image = Bytes32(
        hex::decode("6c6f636b65642062792061206861736820707265696d6167652c206e6f6e6365")
            .unwrap()
            .try_into()
            .unwrap(),
    );
    let hold = HoldClaim {
        request: sign(
            &cl,
            &p.bob,
            HoldRequest {
                channel: p.channel,
                index: U256::zero(),
                amount1: U256::from(10000u64),
                amount2: U256::from(5000u64),
                count: U256::one(),
                lockterm: U256::from(THREE_DAYS),
                pay_hash: keccak256(&pre_image.0),
            },
        ),
        pre_image,
    };
    cl.hold(alice, &hold, NOW).unwrap();
    assert_eq!(
        cl.channel_info_of(p.channel),
        info(0, 10000, 5000, 1, NOW + THREE_DAYS)
    );
    assert_backed(&cl, p.channel);

    let close = sign(
        &cl,
        &p.alice,
        CloseRequest {
            channel: p.channel,
            index: U256::zero(),
            amount1: U256::from(14500u64),
            amount2: U256::from(500u64),
            nonce: cl.nonce_of(alice),
            deadline,
        },
    );
    cl.close(bob, &close, NOW).unwrap();
    assert_eq!(cl.channel_info_of(p.channel), info(1, 0, 0, 0, 0));
    assert_eq!(cl.channel_index_of(p.channel), U256::one());
    assert_eq!(cl.ledger().balance_of(p.channel), U256::zero());

    // Every nonce-bearing request consumed exactly one nonce of its signer.
    assert_eq!(cl.nonce_of(alice), U256::from(3u64));
    assert_eq!(cl.nonce_of(bob), U256::one());

    let kinds: Vec<_> = cl
        .events()
        .iter()
        .map(|e| match e {
            Event::Open(_) => "open",
            Event::Increase(_) => "increase",
            Event::Decrease(_) => "decrease",
            Event::Hold { .. } => "hold",
            Event::Close(_) => "close",
        })
        .collect();
    assert_eq!(kinds, ["open", "increase", "decrease", "hold", "close"]);
    assert!(cl.events().iter().all(|e| e.channel() == p.channel));

    // Both get their full deposit back.
    for addr in [p.pair.lo, p.pair.hi] {
        cl.ledger_mut().withdraw(addr, ether_tenth()).unwrap();
        assert_eq!(cl.ledger().balance_of(addr), U256::zero());
    }
    assert_eq!(cl.ledger().total_supply(), U256::zero());
}

#[test]
fn requests_survive_the_wire() {
    let (mut cl, p) = setup();
    let (alice, bob) = (p.alice.address(), p.bob.address());

    let open = sign(
        &cl,
        &p.alice,
        OpenRequest {
            channel: p.channel,
            index: U256::zero(),
            total: U256::from(200u64),
            amount1: U256::from(100u64),
            amount2: U256::from(100u64),
            nonce: U256::zero(),
            deadline: U256::from(NOW),
        },
    );
    let frame = wire::encode_request(open.into()).unwrap();
    let (request, used) = wire::decode_request(&frame).unwrap();
    assert_eq!(used, frame.len());

    assert_eq!(cl.verify(bob, &request, NOW), Ok(alice));
    cl.submit(bob, &request, NOW).unwrap();

    // Replaying the same frame is rejected.
    let err = cl.submit(bob, &request, NOW).unwrap_err();
    assert_eq!(
        err,
        fastchannel::Error::NonceMismatch {
            expected: U256::one(),
            actual: U256::zero()
        }
    );
    assert!(err.is_retryable());
    assert_eq!(cl.channel_info_of(p.channel).total(), U256::from(200u64));
}

#[test]
fn other_domain_signature_is_rejected() {
    let (mut cl, p) = setup();
    let other = Domain {
        chain_id: U256::from(1u64),
        ..cl.domain().clone()
    };

    let open = Signed::sign(
        &p.alice,
        other.separator().unwrap(),
        OpenRequest {
            channel: p.channel,
            index: U256::zero(),
            total: U256::from(2u64),
            amount1: U256::one(),
            amount2: U256::one(),
            nonce: U256::zero(),
            deadline: U256::from(NOW),
        },
    )
    .unwrap();

    assert!(matches!(
        cl.open(p.bob.address(), &open, NOW),
        Err(fastchannel::Error::InvalidSignature(_))
    ));
}
