use super::*;
use serde::Serialize;
use super::types::{Address, Bytes32, U256};
use uint::hex::FromHex;

use core::fmt::Debug;

struct AssertWriter<'a, I>
where
    I: Iterator<Item = (&'a str, &'a str)>,
{
    expected_iter: I,
}

struct Slot<'a>(&'a [u8]);

impl<'a> Debug for Slot<'a> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for b in self.0 {
            f.write_fmt(format_args!("{:02x}", b))?;
        }
        Ok(())
    }
}

impl<'a> PartialEq for Slot<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<'a, I> Writer for AssertWriter<'a, I>
where
    I: Iterator<Item = (&'a str, &'a str)>,
{
    fn write(&mut self, slot: &[u8]) {
        match self.expected_iter.next() {
            Some((expected, line)) => {
                assert_eq!(
                    expected.len(),
                    64,
                    "The expected input must be grouped into slots of 32 bytes as hex, without 0x."
                );
                assert_eq!(slot.len(), 32, "Each slot should have 32 bytes.");

                let expected = <[u8; 32]>::from_hex(expected).unwrap();

                // Wrapping both in Slot makes assert_eq! print them as hex.
                assert_eq!(
                    Slot(slot),
                    Slot(expected.as_slice()),
                    "slot did not match the expected value ({})",
                    line.trim()
                );
            }
            None => {
                panic!("Expected end of data, got {:?}", Slot(slot));
            }
        }
    }
}

// Iterate over the expected content: one 32 byte hex slot per line, empty
// lines are skipped. Anything after the slot is a comment.
fn expected_iter(expected: &str) -> impl Iterator<Item = (&str, &str)> {
    expected
        .split('\n')
        .filter(|&line| !line.trim().is_empty())
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.len() < 64 {
                panic!("expected line is too short, it must start with a 32 byte hex string!");
            };
            (&trimmed[..64], line)
        })
}

pub fn serialize_and_compare<T>(value: &T, expected: &str)
where
    T: Serialize,
{
    let mut writer = AssertWriter {
        expected_iter: expected_iter(expected),
    };
    to_writer(&value, &mut writer).unwrap();

    // Make sure we're not missing a slot.
    let next = writer.expected_iter.next();
    assert_eq!(next, None, "there are less slots than expected.");
}

fn addr(s: &str) -> Address {
    s.parse().unwrap()
}

#[test]
fn address_is_right_aligned() {
    // Random address from etherscan, do not use!
    let d = addr("95222290DD7278Aa3Ddd389Cc1E1d165CC4BAfe5");

    let expected = "
00000000000000000000000095222290dd7278aa3ddd389cc1e1d165cc4bafe5
    ";

    serialize_and_compare(&d, expected)
}

#[test]
fn bytes32_is_left_aligned_and_uint_right_aligned() {
    #[derive(Serialize, Debug)]
    struct Mixed {
        word: Bytes32,
        small: u64,
        big: U256,
        flag: bool,
    }

    let mut word = Bytes32::default();
    word.0[0] = 0xab;
    word.0[31] = 0xcd;

    let d = Mixed {
        word,
        small: 0x1234,
        big: U256::max_value(),
        flag: true,
    };

    let expected = "
ab000000000000000000000000000000000000000000000000000000000000cd word
0000000000000000000000000000000000000000000000000000000000001234 small
ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff big
0000000000000000000000000000000000000000000000000000000000000001 flag
    ";

    serialize_and_compare(&d, expected)
}

#[test]
fn signed_values_are_sign_extended() {
    let d: (i8, i64, i32) = (-1, -2, 5);

    let expected = "
ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff
fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffe
0000000000000000000000000000000000000000000000000000000000000005
    ";

    serialize_and_compare(&d, expected)
}

#[test]
fn nested_static_structs_are_flattened() {
    #[derive(Serialize, Debug)]
    struct Inner(u8, u8);

    #[derive(Serialize, Debug)]
    struct Outer {
        a: u8,
        inner: Inner,
        b: u8,
    }

    let d = Outer {
        a: 1,
        inner: Inner(2, 3),
        b: 4,
    };

    let expected = "
0000000000000000000000000000000000000000000000000000000000000001
0000000000000000000000000000000000000000000000000000000000000002
0000000000000000000000000000000000000000000000000000000000000003
0000000000000000000000000000000000000000000000000000000000000004
    ";

    serialize_and_compare(&d, expected)
}

#[test]
fn dynamic_types_are_rejected() {
    #[derive(Serialize, Debug)]
    struct WithString {
        s: &'static str,
    }
    #[derive(Serialize, Debug)]
    struct WithVec {
        v: Vec<u8>,
    }

    assert_eq!(
        ser::to_vec(&WithString { s: "hi" }),
        Err(Error::DynamicType("string"))
    );
    assert_eq!(
        ser::to_vec(&WithVec { v: vec![1, 2] }),
        Err(Error::DynamicType("array"))
    );
    assert_eq!(
        ser::to_vec(&Some(1u8)),
        Err(Error::TypeNotRepresentable("some"))
    );
}

#[test]
fn hash_matches_hash_of_encoding() {
    let d = (addr("5B38Da6a701c568545dCfcB03FcB875f56beddC4"), U256::from(7u64));
    let encoded = ser::to_vec(&d).unwrap();
    assert_eq!(encoded.len(), 64);
    assert_eq!(to_hash(&d).unwrap(), keccak256(&encoded));
}

#[test]
fn keccak_of_empty_input() {
    let expected = <[u8; 32]>::from_hex(
        "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470",
    )
    .unwrap();
    assert_eq!(keccak256(&[]).0, expected);
}
