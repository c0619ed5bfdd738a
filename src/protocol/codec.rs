//! Bounds-checked primitive reads shared by the BER, PER and GCC codecs
//!
//! Every decoder in this crate reads from a [`Bytes`] cursor so that
//! variable-length fields (user data, certificates) are split off without
//! copying.

use bytes::{Buf, Bytes};

use super::{Error, Result};

/// Fail with [`Error::BufferTooSmall`] unless `needed` bytes remain
pub(crate) fn ensure(buf: &Bytes, needed: usize) -> Result<()> {
    if buf.remaining() < needed {
        return Err(Error::BufferTooSmall {
            needed,
            got: buf.remaining(),
        });
    }
    Ok(())
}

pub(crate) fn read_u8(buf: &mut Bytes) -> Result<u8> {
    ensure(buf, 1)?;
    Ok(buf.get_u8())
}

pub(crate) fn read_u16_be(buf: &mut Bytes) -> Result<u16> {
    ensure(buf, 2)?;
    Ok(buf.get_u16())
}

pub(crate) fn read_u16_le(buf: &mut Bytes) -> Result<u16> {
    ensure(buf, 2)?;
    Ok(buf.get_u16_le())
}

pub(crate) fn read_u32_be(buf: &mut Bytes) -> Result<u32> {
    ensure(buf, 4)?;
    Ok(buf.get_u32())
}

pub(crate) fn read_u32_le(buf: &mut Bytes) -> Result<u32> {
    ensure(buf, 4)?;
    Ok(buf.get_u32_le())
}

/// Split `len` bytes off the front of the cursor (zero-copy)
pub(crate) fn read_bytes(buf: &mut Bytes, len: usize) -> Result<Bytes> {
    ensure(buf, len)?;
    Ok(buf.split_to(len))
}
