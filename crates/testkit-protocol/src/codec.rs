//! Primitive read/write helpers shared by the token encoders.
//!
//! Every reader checks the remaining length before touching the buffer, so
//! truncated input surfaces as [`ProtocolError::IncompleteToken`] instead of
//! a panic inside `bytes`.

use bytes::{Buf, BufMut, Bytes};

use crate::error::ProtocolError;

/// Fail unless `src` holds at least `needed` more bytes.
pub fn ensure_remaining(src: &impl Buf, needed: usize) -> Result<(), ProtocolError> {
    if src.remaining() < needed {
        return Err(ProtocolError::IncompleteToken {
            expected: needed,
            actual: src.remaining(),
        });
    }
    Ok(())
}

/// Write a string as UTF-16LE without any length prefix.
pub fn write_utf16_string(dst: &mut impl BufMut, s: &str) {
    for unit in s.encode_utf16() {
        dst.put_u16_le(unit);
    }
}

/// Read `units` UTF-16LE code units into a string.
pub fn read_utf16_string(src: &mut impl Buf, units: usize) -> Result<String, ProtocolError> {
    let byte_len = units
        .checked_mul(2)
        .ok_or(ProtocolError::InvalidField {
            field: "string length",
            value: units as u64,
        })?;
    ensure_remaining(src, byte_len)?;

    let mut buf = Vec::with_capacity(units);
    for _ in 0..units {
        buf.push(src.get_u16_le());
    }
    String::from_utf16(&buf).map_err(|e| ProtocolError::StringEncoding(e.to_string()))
}

/// Write a B_VARCHAR: one byte of UTF-16 code-unit count, then UTF-16LE.
pub fn write_b_varchar(dst: &mut impl BufMut, s: &str) -> Result<(), ProtocolError> {
    let units = s.encode_utf16().count();
    let len = u8::try_from(units).map_err(|_| ProtocolError::ValueTooLarge {
        length: units,
        max: u8::MAX as usize,
    })?;
    dst.put_u8(len);
    write_utf16_string(dst, s);
    Ok(())
}

/// Read a B_VARCHAR.
pub fn read_b_varchar(src: &mut impl Buf) -> Result<String, ProtocolError> {
    ensure_remaining(src, 1)?;
    let units = src.get_u8() as usize;
    read_utf16_string(src, units)
}

/// Write a `u32` byte-length prefixed UTF-16LE string.
pub fn write_l_utf16(dst: &mut impl BufMut, s: &str) -> Result<(), ProtocolError> {
    let byte_len = s.encode_utf16().count() * 2;
    put_length(dst, byte_len)?;
    write_utf16_string(dst, s);
    Ok(())
}

/// Read a `u32` byte-length prefixed UTF-16LE string.
pub fn read_l_utf16(src: &mut impl Buf) -> Result<String, ProtocolError> {
    let byte_len = get_length(src)?;
    if byte_len % 2 != 0 {
        return Err(ProtocolError::InvalidField {
            field: "UTF-16 byte length",
            value: byte_len as u64,
        });
    }
    read_utf16_string(src, byte_len / 2)
}

/// Write a `u32` length prefixed byte string.
pub fn write_l_bytes(dst: &mut impl BufMut, bytes: &[u8]) -> Result<(), ProtocolError> {
    put_length(dst, bytes.len())?;
    dst.put_slice(bytes);
    Ok(())
}

/// Read a `u32` length prefixed byte string.
pub fn read_l_bytes(src: &mut impl Buf) -> Result<Bytes, ProtocolError> {
    let len = get_length(src)?;
    ensure_remaining(src, len)?;
    Ok(src.copy_to_bytes(len))
}

fn put_length(dst: &mut impl BufMut, len: usize) -> Result<(), ProtocolError> {
    let len = u32::try_from(len).map_err(|_| ProtocolError::ValueTooLarge {
        length: len,
        max: u32::MAX as usize,
    })?;
    dst.put_u32_le(len);
    Ok(())
}

fn get_length(src: &mut impl Buf) -> Result<usize, ProtocolError> {
    ensure_remaining(src, 4)?;
    Ok(src.get_u32_le() as usize)
}
