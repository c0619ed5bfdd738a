//! Aligned PER primitives used by MCS domain PDUs and the T.124 wrapper

use bytes::{BufMut, Bytes};

use super::codec::{read_bytes, read_u8, read_u16_be, read_u32_be};
use super::{Error, Result};

/// Largest length a two-byte determinant can carry
pub const MAX_LENGTH: usize = 0x7FFF;

/// Write a length determinant
pub fn write_length(len: usize, buf: &mut impl BufMut) -> Result<()> {
    match u8::try_from(len) {
        Ok(short) if short <= 0x7F => buf.put_u8(short),
        _ => {
            let long = u16::try_from(len)
                .ok()
                .filter(|&long| usize::from(long) <= MAX_LENGTH)
                .ok_or(Error::InvalidLength {
                    context: "per length determinant",
                    len,
                })?;
            buf.put_u16(long | 0x8000);
        }
    }
    Ok(())
}

/// Read a length determinant
pub fn read_length(buf: &mut Bytes) -> Result<usize> {
    let byte = read_u8(buf)?;
    if byte & 0x80 == 0 {
        return Ok(usize::from(byte));
    }
    let low = read_u8(buf)?;
    Ok((usize::from(byte & 0x7F) << 8) | usize::from(low))
}

/// Write a CHOICE index
pub fn write_choice(choice: u8, buf: &mut impl BufMut) {
    buf.put_u8(choice);
}

/// Read a CHOICE index
pub fn read_choice(buf: &mut Bytes) -> Result<u8> {
    read_u8(buf)
}

/// Write an optional-field selection bitmap
pub fn write_selection(selection: u8, buf: &mut impl BufMut) {
    buf.put_u8(selection);
}

/// Write a SET OF element count
pub fn write_number_of_set(count: u8, buf: &mut impl BufMut) {
    buf.put_u8(count);
}

/// Read a SET OF element count
pub fn read_number_of_set(buf: &mut Bytes) -> Result<u8> {
    read_u8(buf)
}

/// Write a one-byte ENUMERATED
pub fn write_enumerated(value: u8, buf: &mut impl BufMut) {
    buf.put_u8(value);
}

/// Read a one-byte ENUMERATED
pub fn read_enumerated(buf: &mut Bytes) -> Result<u8> {
    read_u8(buf)
}

/// Write an unconstrained INTEGER in 1, 2 or 4 bytes
pub fn write_integer(value: u32, buf: &mut impl BufMut) {
    // width prefixes always fit the one-byte determinant
    if let Ok(value) = u8::try_from(value) {
        buf.put_u8(1);
        buf.put_u8(value);
    } else if let Ok(value) = u16::try_from(value) {
        buf.put_u8(2);
        buf.put_u16(value);
    } else {
        buf.put_u8(4);
        buf.put_u32(value);
    }
}

/// Read an unconstrained INTEGER
pub fn read_integer(buf: &mut Bytes) -> Result<u32> {
    let width = read_length(buf)?;
    match width {
        1 => Ok(u32::from(read_u8(buf)?)),
        2 => Ok(u32::from(read_u16_be(buf)?)),
        4 => read_u32_be(buf),
        _ => Err(Error::UnsupportedIntegerWidth { width }),
    }
}

/// Write a 16-bit INTEGER constrained to `minimum..=0xFFFF`
pub fn write_integer16(value: u16, minimum: u16, buf: &mut impl BufMut) -> Result<()> {
    let offset = value
        .checked_sub(minimum)
        .ok_or(Error::IntegerOutOfRange {
            value: u32::from(value),
            min: u32::from(minimum),
            max: u32::from(u16::MAX),
        })?;
    buf.put_u16(offset);
    Ok(())
}

/// Read a 16-bit INTEGER constrained to `minimum..=0xFFFF`
pub fn read_integer16(buf: &mut Bytes, minimum: u16) -> Result<u16> {
    let offset = read_u16_be(buf)?;
    offset
        .checked_add(minimum)
        .ok_or(Error::IntegerOutOfRange {
            value: u32::from(offset) + u32::from(minimum),
            min: u32::from(minimum),
            max: u32::from(u16::MAX),
        })
}

/// Write a six-arc OBJECT IDENTIFIER
pub fn write_object_identifier(oid: &[u8; 6], buf: &mut impl BufMut) {
    buf.put_u8(5);
    buf.put_u8(((oid[0] << 4) & 0xF0) | (oid[1] & 0x0F));
    buf.put_slice(&oid[2..]);
}

/// Read a six-arc OBJECT IDENTIFIER and compare it against `expected`
pub fn read_object_identifier(buf: &mut Bytes, expected: &[u8; 6]) -> Result<()> {
    let len = read_length(buf)?;
    if len != 5 {
        return Err(Error::InvalidLength {
            context: "per object identifier",
            len,
        });
    }
    let first = read_u8(buf)?;
    let rest = read_bytes(buf, 4)?;
    let found = [first >> 4, first & 0x0F, rest[0], rest[1], rest[2], rest[3]];
    if &found != expected {
        return Err(Error::ObjectIdentifierMismatch { found });
    }
    Ok(())
}

/// Write a NumericString of at least `minimum` digits, two digits per byte
pub fn write_numeric_string(value: &str, minimum: usize, buf: &mut impl BufMut) -> Result<()> {
    let digits = value.as_bytes();
    write_length(digits.len().saturating_sub(minimum), buf)?;
    for pair in digits.chunks(2) {
        let high = pair[0].wrapping_sub(b'0') % 10;
        let low = pair.get(1).map_or(0, |c| c.wrapping_sub(b'0') % 10);
        buf.put_u8((high << 4) | low);
    }
    Ok(())
}

/// Write `count` zero padding bytes
pub fn write_padding(count: usize, buf: &mut impl BufMut) {
    buf.put_bytes(0, count);
}

/// Write an OCTET STRING of at least `minimum` bytes
pub fn write_octet_stream(value: &[u8], minimum: usize, buf: &mut impl BufMut) -> Result<()> {
    write_length(value.len().saturating_sub(minimum), buf)?;
    buf.put_slice(value);
    Ok(())
}

/// Read an OCTET STRING of at least `expected.len()` bytes and compare it
pub fn read_octet_stream(buf: &mut Bytes, expected: &'static [u8], minimum: usize) -> Result<()> {
    let len = read_length(buf)? + minimum;
    let found = read_bytes(buf, len)?;
    if found.as_ref() != expected {
        return Err(Error::UnexpectedKey {
            expected,
            found: found.to_vec(),
        });
    }
    Ok(())
}
