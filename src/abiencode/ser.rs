//! Serde serializer writing the Solidity abi encoding of static values.
//!
//! Typed-data hashing (`encodeData` in EIP-712) only ever sees 32-byte
//! words: atomic values (`uintN`, `intN`, `bool`, `address`, `bytesN`) are
//! written in place, while `string`, `bytes` and arrays are replaced by their
//! keccak hash before they reach the encoder. This serializer therefore has a
//! single pass and no head/tail offsets. Dynamic types are rejected with
//! [Error::DynamicType] instead of being silently encoded in a way the
//! verifying side would not reproduce.
//!
//! Structs, tuples and newtype structs are transparent: their fields are
//! written one after another, which is exactly `abi.encode(a, b, ...)` for
//! static fields.

use super::error::{Error, Result};
use serde::{
    ser::{self, Impossible, SerializeStruct, SerializeTuple, SerializeTupleStruct},
    Serialize,
};

pub const SLOT_SIZE: usize = 32; // bytes

pub trait Writer {
    fn write(&mut self, slot: &[u8]);
}

impl Writer for Vec<u8> {
    fn write(&mut self, slot: &[u8]) {
        self.extend_from_slice(slot);
    }
}

pub struct Serializer<'a, W>
where
    W: Writer,
{
    writer: &'a mut W,
}

pub fn to_writer<T, W>(value: &T, writer: &mut W) -> Result<()>
where
    T: Serialize + ?Sized,
    W: Writer,
{
    let mut serializer = Serializer { writer };
    value.serialize(&mut serializer)
}

/// Encode `value` into a freshly allocated buffer.
pub fn to_vec<T>(value: &T) -> Result<Vec<u8>>
where
    T: Serialize + ?Sized,
{
    let mut buf = Vec::new();
    to_writer(value, &mut buf)?;
    Ok(buf)
}

impl<'a, W> Serializer<'a, W>
where
    W: Writer,
{
    fn write_left_aligned(&mut self, v: &[u8]) {
        debug_assert!(v.len() <= SLOT_SIZE);
        let mut bytes = [0u8; SLOT_SIZE];
        bytes[..v.len()].copy_from_slice(v);
        self.writer.write(bytes.as_slice());
    }

    fn write_right_aligned<const N: usize>(&mut self, v: [u8; N]) {
        self.write_signed(false, v)
    }

    // Two's complement sign extension to the full slot.
    fn write_signed<const N: usize>(&mut self, negative: bool, v: [u8; N]) {
        debug_assert!(N <= SLOT_SIZE);
        let filler = if negative { 0xff } else { 0x00 };
        let mut bytes = [filler; SLOT_SIZE];
        bytes[SLOT_SIZE - N..].copy_from_slice(v.as_slice());
        self.writer.write(bytes.as_slice())
    }
}

impl<'a, 'b, W> ser::Serializer for &'a mut Serializer<'b, W>
where
    W: Writer,
{
    type Ok = ();
    type Error = Error;

    type SerializeSeq = Impossible<(), Error>;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Impossible<(), Error>;
    type SerializeMap = Impossible<(), Error>;
    type SerializeStruct = Self;
    type SerializeStructVariant = Impossible<(), Error>;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.serialize_u8(u8::from(v))
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.write_signed(v < 0, v.to_be_bytes());
        Ok(())
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.write_signed(v < 0, v.to_be_bytes());
        Ok(())
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.write_signed(v < 0, v.to_be_bytes());
        Ok(())
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.write_signed(v < 0, v.to_be_bytes());
        Ok(())
    }

    fn serialize_i128(self, v: i128) -> Result<()> {
        self.write_signed(v < 0, v.to_be_bytes());
        Ok(())
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.write_right_aligned(v.to_be_bytes());
        Ok(())
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.write_right_aligned(v.to_be_bytes());
        Ok(())
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.write_right_aligned(v.to_be_bytes());
        Ok(())
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.write_right_aligned(v.to_be_bytes());
        Ok(())
    }

    fn serialize_u128(self, v: u128) -> Result<()> {
        self.write_right_aligned(v.to_be_bytes());
        Ok(())
    }

    fn serialize_f32(self, _: f32) -> Result<()> {
        Err(Error::TypeNotRepresentable("f32"))
    }

    fn serialize_f64(self, _: f64) -> Result<()> {
        Err(Error::TypeNotRepresentable("f64"))
    }

    fn serialize_char(self, _: char) -> Result<()> {
        Err(Error::TypeNotRepresentable("char"))
    }

    fn serialize_str(self, _: &str) -> Result<()> {
        Err(Error::DynamicType("string"))
    }

    // All fixed-size types (U256, Address, bytesN) end up here with at most
    // one slot worth of data, already aligned the way they want to be.
    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        if v.len() > SLOT_SIZE {
            return Err(Error::DynamicType("bytes"));
        }
        self.write_left_aligned(v);
        Ok(())
    }

    fn serialize_none(self) -> Result<()> {
        Err(Error::TypeNotRepresentable("none"))
    }

    fn serialize_some<T: ?Sized>(self, _: &T) -> Result<()>
    where
        T: Serialize,
    {
        Err(Error::TypeNotRepresentable("some"))
    }

    fn serialize_unit(self) -> Result<()> {
        Err(Error::TypeNotRepresentable("unit"))
    }

    fn serialize_unit_struct(self, _: &'static str) -> Result<()> {
        Err(Error::TypeNotRepresentable("unit struct"))
    }

    fn serialize_unit_variant(self, _: &'static str, _: u32, _: &'static str) -> Result<()> {
        Err(Error::TypeNotRepresentable("unit variant (enum)"))
    }

    fn serialize_newtype_struct<T: ?Sized>(self, _: &'static str, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: &T,
    ) -> Result<()>
    where
        T: Serialize,
    {
        Err(Error::TypeNotRepresentable("newtype variant (enum)"))
    }

    fn serialize_seq(self, _: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(Error::DynamicType("array"))
    }

    fn serialize_tuple(self, _: usize) -> Result<Self::SerializeTuple> {
        Ok(self)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(Error::TypeNotRepresentable("tuple variant (enum)"))
    }

    fn serialize_map(self, _: Option<usize>) -> Result<Self::SerializeMap> {
        Err(Error::TypeNotRepresentable("map"))
    }

    fn serialize_struct(self, _: &'static str, _: usize) -> Result<Self::SerializeStruct> {
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(Error::TypeNotRepresentable("struct variant"))
    }

    fn collect_str<T: ?Sized>(self, _value: &T) -> Result<()>
    where
        T: core::fmt::Display,
    {
        Err(Error::DynamicType("string"))
    }
}

impl<'a, 'b, W> SerializeTuple for &'a mut Serializer<'b, W>
where
    W: Writer,
{
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, 'b, W> SerializeTupleStruct for &'a mut Serializer<'b, W>
where
    W: Writer,
{
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, 'b, W> SerializeStruct for &'a mut Serializer<'b, W>
where
    W: Writer,
{
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized>(&mut self, _name: &'static str, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}
