//! Little-endian integer helpers and Solana's compact-u16 ("shortvec")
//! length prefix.
//!
//! Every instruction payload and the transaction wire format are built from
//! these primitives. Writers append to a `Vec<u8>`; readers take an offset
//! and fail on truncated input instead of panicking.

use crate::error::TxError;

// ---------------------------------------------------------------------------
// Fixed-width integers
// ---------------------------------------------------------------------------

pub fn put_u8(buf: &mut Vec<u8>, value: u8) {
    buf.push(value);
}

pub fn put_u32_le(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub fn put_u64_le(buf: &mut Vec<u8>, value: u64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Borrow `N` bytes starting at `offset`.
fn take<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N], TxError> {
    let end = offset
        .checked_add(N)
        .ok_or_else(|| TxError::Serialization("offset overflow".into()))?;
    let slice = data.get(offset..end).ok_or_else(|| {
        TxError::Serialization(format!(
            "need {N} bytes at offset {offset}, have {}",
            data.len()
        ))
    })?;
    // Length is guaranteed by the range above.
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    Ok(out)
}

pub fn read_u8(data: &[u8], offset: usize) -> Result<u8, TxError> {
    take::<1>(data, offset).map(|b| b[0])
}

pub fn read_u32_le(data: &[u8], offset: usize) -> Result<u32, TxError> {
    take::<4>(data, offset).map(u32::from_le_bytes)
}

pub fn read_u64_le(data: &[u8], offset: usize) -> Result<u64, TxError> {
    take::<8>(data, offset).map(u64::from_le_bytes)
}

/// Read a 32-byte array (public key, blockhash) at `offset`.
pub fn read_array32(data: &[u8], offset: usize) -> Result<[u8; 32], TxError> {
    take::<32>(data, offset)
}

// ---------------------------------------------------------------------------
// Compact-u16 encoding
// ---------------------------------------------------------------------------

/// Encode a `u16` value in Solana's compact-u16 format.
///
/// - Values 0..0x7f       -> 1 byte
/// - Values 0x80..0x3fff  -> 2 bytes
/// - Values 0x4000..      -> 3 bytes
pub fn encode_compact_u16(value: u16) -> Vec<u8> {
    let mut val = value as u32;
    let mut out = Vec::with_capacity(3);

    loop {
        let mut byte = (val & 0x7f) as u8;
        val >>= 7;
        if val > 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if val == 0 {
            break;
        }
    }

    out
}

/// Append a collection length as compact-u16.
///
/// Lengths above `u16::MAX` cannot be expressed on the wire.
pub fn put_compact_len(buf: &mut Vec<u8>, len: usize) -> Result<(), TxError> {
    let len = u16::try_from(len).map_err(|_| {
        TxError::Serialization(format!("length {len} does not fit in compact-u16"))
    })?;
    buf.extend_from_slice(&encode_compact_u16(len));
    Ok(())
}

/// Decode a compact-u16 value from the start of `data`.
///
/// Returns `(value, bytes_consumed)`.
pub fn decode_compact_u16(data: &[u8]) -> Result<(u16, usize), TxError> {
    let mut value: u32 = 0;

    for (consumed, &byte) in data.iter().take(3).enumerate() {
        value |= ((byte & 0x7f) as u32) << (7 * consumed);

        if byte & 0x80 == 0 {
            if value > u16::MAX as u32 {
                return Err(TxError::Serialization("compact-u16 value overflow".into()));
            }
            return Ok((value as u16, consumed + 1));
        }
    }

    if data.len() >= 3 {
        Err(TxError::Serialization(
            "compact-u16 continuation bit set on third byte".into(),
        ))
    } else {
        Err(TxError::Serialization(
            "unexpected end of data while decoding compact-u16".into(),
        ))
    }
}
