use prost::{bytes::BufMut, DecodeError, EncodeError, Message};
use thiserror::Error;

use super::{ConversionError, RequestEnvelope};
use crate::channel::Request;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("message of {0} bytes does not fit the u16 length prefix")]
    TooLong(usize),
    #[error("frame is shorter than its length prefix")]
    Truncated,
    #[error("protobuf encoding failed: {0}")]
    Encode(#[from] EncodeError),
    #[error("protobuf decoding failed: {0}")]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// Frame a request: u16 big endian length followed by the protobuf
/// encoded [RequestEnvelope].
pub fn encode_request(request: Request) -> Result<Vec<u8>, WireError> {
    let msg = RequestEnvelope::from(request);
    // The length is written as a fixed u16 (2 bytes), not the LEB128 varint
    // `encode_length_delimited` would use.
    let len = msg.encoded_len();
    let prefix = u16::try_from(len).map_err(|_| WireError::TooLong(len))?;

    let mut buf = Vec::with_capacity(2 + len);
    buf.put_slice(&prefix.to_be_bytes());
    msg.encode(&mut buf)?;
    Ok(buf)
}

/// Parse one frame produced by [encode_request]. Returns the request and
/// the number of bytes consumed, so frames can be read back to back.
pub fn decode_request(buf: &[u8]) -> Result<(Request, usize), WireError> {
    if buf.len() < 2 {
        return Err(WireError::Truncated);
    }
    let len = u16::from_be_bytes([buf[0], buf[1]]) as usize;
    let frame = buf.get(2..2 + len).ok_or(WireError::Truncated)?;

    let envelope = RequestEnvelope::decode(frame)?;
    Ok((envelope.try_into()?, 2 + len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        abiencode::types::{Address, Bytes32, Hash, Signature, U256},
        channel::{CloseRequest, HoldClaim, HoldRequest, OpenRequest, Signed},
        wire::{request_envelope, BalanceRequestMsg},
    };
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn open(rng: &mut StdRng) -> Request {
        Request::Open(Signed {
            partner: rng.gen(),
            message: OpenRequest {
                channel: rng.gen(),
                index: U256::from(3u64),
                total: U256::from(15000u64),
                amount1: U256::from(14500u64),
                amount2: U256::from(500u64),
                nonce: U256::from(7u64),
                deadline: U256::max_value(),
            },
            signature: Signature::new(&[0x42; 64], 27),
        })
    }

    fn hold(rng: &mut StdRng) -> Request {
        let pre_image: Bytes32 = rng.gen();
        Request::Hold(HoldClaim {
            request: Signed {
                partner: rng.gen(),
                message: HoldRequest {
                    channel: rng.gen(),
                    index: U256::zero(),
                    amount1: U256::from(10000u64),
                    amount2: U256::from(5000u64),
                    count: U256::one(),
                    lockterm: U256::from(259200u64),
                    pay_hash: rng.gen::<Hash>(),
                },
                signature: Signature::new(&[0x11; 64], 28),
            },
            pre_image,
        })
    }

    #[test]
    fn frames_read_back_to_back() {
        let mut rng = StdRng::seed_from_u64(0);
        let a = open(&mut rng);
        let b = hold(&mut rng);

        let mut buf = encode_request(a).unwrap();
        let first_len = buf.len();
        buf.extend(encode_request(b).unwrap());

        let (decoded, used) = decode_request(&buf).unwrap();
        assert_eq!(decoded, a);
        assert_eq!(used, first_len);
        let (decoded, used) = decode_request(&buf[used..]).unwrap();
        assert_eq!(decoded, b);
        assert_eq!(used, buf.len() - first_len);
    }

    #[test]
    fn length_prefix_is_big_endian_u16() {
        let mut rng = StdRng::seed_from_u64(1);
        let buf = encode_request(open(&mut rng)).unwrap();
        let len = u16::from_be_bytes([buf[0], buf[1]]) as usize;
        assert_eq!(len, buf.len() - 2);
    }

    #[test]
    fn truncated_frame() {
        let mut rng = StdRng::seed_from_u64(2);
        let buf = encode_request(open(&mut rng)).unwrap();

        assert!(matches!(decode_request(&buf[..1]), Err(WireError::Truncated)));
        assert!(matches!(
            decode_request(&buf[..buf.len() - 1]),
            Err(WireError::Truncated)
        ));
    }

    #[test]
    fn variant_decides_request_kind() {
        // Close and increase share a layout, the envelope tag tells them
        // apart.
        let msg = BalanceRequestMsg {
            partner: vec![1; 20],
            channel: vec![2; 20],
            index: vec![],
            amount1: vec![0x38, 0xa4],
            amount2: vec![0x01, 0xf4],
            nonce: vec![1],
            deadline: vec![0xff; 32],
            sig: vec![0; 65],
        };
        let envelope = RequestEnvelope {
            msg: Some(request_envelope::Msg::Close(msg)),
        };
        let mut buf = vec![0, 0];
        envelope.encode(&mut buf).unwrap();
        let len = (buf.len() - 2) as u16;
        buf[..2].copy_from_slice(&len.to_be_bytes());

        let (req, _) = decode_request(&buf).unwrap();
        match req {
            Request::Close(Signed {
                partner,
                message,
                ..
            }) => {
                assert_eq!(partner, Address([1; 20]));
                assert_eq!(
                    message,
                    CloseRequest {
                        channel: Address([2; 20]),
                        index: U256::zero(),
                        amount1: U256::from(14500u64),
                        amount2: U256::from(500u64),
                        nonce: U256::one(),
                        deadline: U256::max_value(),
                    }
                );
            }
            other => panic!("expected close, got {:?}", other),
        }
    }

    #[test]
    fn wrong_lengths_are_rejected() {
        let envelope = RequestEnvelope {
            msg: Some(request_envelope::Msg::Increase(BalanceRequestMsg {
                partner: vec![1; 19],
                ..Default::default()
            })),
        };
        assert_eq!(
            Request::try_from(envelope),
            Err(ConversionError::ByteLengthMismatch("partner"))
        );

        assert_eq!(
            Request::try_from(RequestEnvelope { msg: None }),
            Err(ConversionError::ExpectedSome)
        );
    }
}
