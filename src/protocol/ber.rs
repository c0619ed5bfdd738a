//! BER primitives used by the MCS connect PDUs
//!
//! Integers are written the way RDP peers expect them: unsigned, in the
//! smallest of 1, 2 or 4 bytes, without a sign-preserving leading zero.

use bytes::{BufMut, Bytes};

use super::codec::{read_bytes, read_u8, read_u16_be, read_u32_be};
use super::{Error, Result};

/// Universal class
pub const CLASS_UNIVERSAL: u8 = 0x00;
/// Application class
pub const CLASS_APPLICATION: u8 = 0x40;
/// Constructed encoding bit
pub const PC_CONSTRUCTED: u8 = 0x20;
/// Tag number escape for tags above 30
pub const TAG_MASK: u8 = 0x1F;

/// BOOLEAN tag
pub const TAG_BOOLEAN: u8 = 0x01;
/// INTEGER tag
pub const TAG_INTEGER: u8 = 0x02;
/// OCTET STRING tag
pub const TAG_OCTET_STRING: u8 = 0x04;
/// ENUMERATED tag
pub const TAG_ENUMERATED: u8 = 0x0A;
/// SEQUENCE tag
pub const TAG_SEQUENCE: u8 = 0x10;

/// Write a definite-form length
pub fn write_length(len: usize, buf: &mut impl BufMut) {
    if len < 0x80 {
        buf.put_u8(len as u8);
    } else if let Ok(len) = u16::try_from(len) {
        buf.put_u8(0x82);
        buf.put_u16(len);
    } else {
        buf.put_u8(0x84);
        buf.put_u32(len as u32);
    }
}

/// Read a definite-form length
pub fn read_length(buf: &mut Bytes) -> Result<usize> {
    let byte = read_u8(buf)?;
    if byte & 0x80 == 0 {
        return Ok(usize::from(byte));
    }
    match byte & 0x7F {
        1 => Ok(usize::from(read_u8(buf)?)),
        2 => Ok(usize::from(read_u16_be(buf)?)),
        4 => Ok(read_u32_be(buf)? as usize),
        width => Err(Error::InvalidLength {
            context: "ber length",
            len: usize::from(width),
        }),
    }
}

/// Write an application tag and the length of the body that follows
pub fn write_application_tag(tag: u8, len: usize, buf: &mut impl BufMut) {
    if tag > 30 {
        buf.put_u8(CLASS_APPLICATION | PC_CONSTRUCTED | TAG_MASK);
        buf.put_u8(tag);
    } else {
        buf.put_u8(CLASS_APPLICATION | PC_CONSTRUCTED | tag);
    }
    write_length(len, buf);
}

/// Verify an application tag and return the body length
pub fn read_application_tag(buf: &mut Bytes, tag: u8) -> Result<usize> {
    let byte = read_u8(buf)?;
    if tag > 30 {
        expect_tag(byte, CLASS_APPLICATION | PC_CONSTRUCTED | TAG_MASK)?;
        expect_tag(read_u8(buf)?, tag)?;
    } else {
        expect_tag(byte, CLASS_APPLICATION | PC_CONSTRUCTED | tag)?;
    }
    read_length(buf)
}

/// Write a universal tag byte
pub fn write_universal_tag(tag: u8, constructed: bool, buf: &mut impl BufMut) {
    buf.put_u8(universal(tag, constructed));
}

/// Verify a universal tag byte
pub fn read_universal_tag(buf: &mut Bytes, tag: u8, constructed: bool) -> Result<()> {
    expect_tag(read_u8(buf)?, universal(tag, constructed))
}

/// Write an unsigned INTEGER
pub fn write_integer(value: u32, buf: &mut impl BufMut) {
    write_universal_tag(TAG_INTEGER, false, buf);
    if value <= 0xFF {
        write_length(1, buf);
        buf.put_u8(value as u8);
    } else if value <= 0xFFFF {
        write_length(2, buf);
        buf.put_u16(value as u16);
    } else {
        write_length(4, buf);
        buf.put_u32(value);
    }
}

/// Read an unsigned INTEGER of 1 to 4 bytes
pub fn read_integer(buf: &mut Bytes) -> Result<u32> {
    read_universal_tag(buf, TAG_INTEGER, false)?;
    let width = read_length(buf)?;
    match width {
        1 => Ok(u32::from(read_u8(buf)?)),
        2 => Ok(u32::from(read_u16_be(buf)?)),
        3 => {
            let high = u32::from(read_u8(buf)?);
            let low = u32::from(read_u16_be(buf)?);
            Ok((high << 16) | low)
        }
        4 => read_u32_be(buf),
        _ => Err(Error::UnsupportedIntegerWidth { width }),
    }
}

/// Write a one-byte ENUMERATED
pub fn write_enumerated(value: u8, buf: &mut impl BufMut) {
    write_universal_tag(TAG_ENUMERATED, false, buf);
    write_length(1, buf);
    buf.put_u8(value);
}

/// Read a one-byte ENUMERATED
pub fn read_enumerated(buf: &mut Bytes) -> Result<u8> {
    read_universal_tag(buf, TAG_ENUMERATED, false)?;
    let len = read_length(buf)?;
    if len != 1 {
        return Err(Error::InvalidLength {
            context: "ber enumerated",
            len,
        });
    }
    read_u8(buf)
}

/// Write a BOOLEAN
pub fn write_boolean(value: bool, buf: &mut impl BufMut) {
    write_universal_tag(TAG_BOOLEAN, false, buf);
    write_length(1, buf);
    buf.put_u8(if value { 0xFF } else { 0x00 });
}

/// Read a BOOLEAN
pub fn read_boolean(buf: &mut Bytes) -> Result<bool> {
    read_universal_tag(buf, TAG_BOOLEAN, false)?;
    let len = read_length(buf)?;
    if len != 1 {
        return Err(Error::InvalidLength {
            context: "ber boolean",
            len,
        });
    }
    Ok(read_u8(buf)? != 0)
}

/// Write an OCTET STRING
pub fn write_octet_string(value: &[u8], buf: &mut impl BufMut) {
    write_universal_tag(TAG_OCTET_STRING, false, buf);
    write_length(value.len(), buf);
    buf.put_slice(value);
}

/// Read an OCTET STRING (zero-copy)
pub fn read_octet_string(buf: &mut Bytes) -> Result<Bytes> {
    read_universal_tag(buf, TAG_OCTET_STRING, false)?;
    let len = read_length(buf)?;
    read_bytes(buf, len)
}

/// Write a SEQUENCE around an already-encoded body
pub fn write_sequence(body: &[u8], buf: &mut impl BufMut) {
    write_universal_tag(TAG_SEQUENCE, true, buf);
    write_length(body.len(), buf);
    buf.put_slice(body);
}

/// Read a SEQUENCE header and split off its body
pub fn read_sequence(buf: &mut Bytes) -> Result<Bytes> {
    read_universal_tag(buf, TAG_SEQUENCE, true)?;
    let len = read_length(buf)?;
    read_bytes(buf, len)
}

const fn universal(tag: u8, constructed: bool) -> u8 {
    let pc = if constructed { PC_CONSTRUCTED } else { 0 };
    CLASS_UNIVERSAL | pc | (tag & TAG_MASK)
}

fn expect_tag(found: u8, expected: u8) -> Result<()> {
    if found == expected {
        Ok(())
    } else {
        Err(Error::UnexpectedTag { expected, found })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(f: impl FnOnce(&mut Vec<u8>)) -> Bytes {
        let mut out = Vec::new();
        f(&mut out);
        Bytes::from(out)
    }

    #[test]
    fn test_length_forms() {
        assert_eq!(encoded(|b| write_length(0x7F, b)).as_ref(), &[0x7F]);
        assert_eq!(
            encoded(|b| write_length(0x80, b)).as_ref(),
            &[0x82, 0x00, 0x80]
        );
        assert_eq!(
            encoded(|b| write_length(0x0194, b)).as_ref(),
            &[0x82, 0x01, 0x94]
        );

        let mut short = Bytes::from_static(&[0x81, 0xF0]);
        assert_eq!(read_length(&mut short).unwrap(), 0xF0);

        let mut bad = Bytes::from_static(&[0x83, 0x00, 0x00, 0x01]);
        assert!(matches!(
            read_length(&mut bad),
            Err(Error::InvalidLength { .. })
        ));
    }

    #[test]
    fn test_application_tag_above_thirty() {
        let bytes = encoded(|b| write_application_tag(101, 3, b));
        assert_eq!(bytes.as_ref(), &[0x7F, 0x65, 0x03]);

        let mut cursor = bytes.clone();
        assert_eq!(read_application_tag(&mut cursor, 101).unwrap(), 3);

        let mut cursor = bytes;
        assert_eq!(
            read_application_tag(&mut cursor, 102),
            Err(Error::UnexpectedTag {
                expected: 0x66,
                found: 0x65
            })
        );
    }

    #[test]
    fn test_integer_widths() {
        assert_eq!(
            encoded(|b| write_integer(34, b)).as_ref(),
            &[0x02, 0x01, 0x22]
        );
        assert_eq!(
            encoded(|b| write_integer(0xFFFF, b)).as_ref(),
            &[0x02, 0x02, 0xFF, 0xFF]
        );
        assert_eq!(
            encoded(|b| write_integer(0x0001_0000, b)).as_ref(),
            &[0x02, 0x04, 0x00, 0x01, 0x00, 0x00]
        );

        let mut three = Bytes::from_static(&[0x02, 0x03, 0x01, 0x02, 0x03]);
        assert_eq!(read_integer(&mut three).unwrap(), 0x0001_0203);

        let mut wide = Bytes::from_static(&[0x02, 0x05, 0, 0, 0, 0, 0]);
        assert_eq!(
            read_integer(&mut wide),
            Err(Error::UnsupportedIntegerWidth { width: 5 })
        );
    }

    #[test]
    fn test_scalar_values() {
        let mut buf = encoded(|b| {
            write_boolean(true, b);
            write_enumerated(3, b);
            write_octet_string(&[0x01], b);
        });
        assert_eq!(
            buf.as_ref(),
            &[0x01, 0x01, 0xFF, 0x0A, 0x01, 0x03, 0x04, 0x01, 0x01]
        );

        assert!(read_boolean(&mut buf).unwrap());
        assert_eq!(read_enumerated(&mut buf).unwrap(), 3);
        assert_eq!(read_octet_string(&mut buf).unwrap().as_ref(), &[0x01]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_truncated_octet_string() {
        let mut buf = Bytes::from_static(&[0x04, 0x05, 0xAA]);
        assert_eq!(
            read_octet_string(&mut buf),
            Err(Error::BufferTooSmall { needed: 5, got: 1 })
        );
    }
}
