//! BPS variable length integers.
//!
//! Base-128, least significant group first, with the high bit marking the
//! *last* byte. After every continued byte the decoder adds the running shift,
//! so each length has exactly one encoding and no value can be padded.

use super::PatchError;

pub fn decode_number(data: &[u8], pos: &mut usize) -> Result<u64, PatchError> {
    let mut value: u64 = 0;
    let mut shift: u64 = 1;
    loop {
        let byte = *data.get(*pos).ok_or(PatchError::Truncated("a number"))?;
        *pos += 1;

        let group = ((byte & 0x7F) as u64)
            .checked_mul(shift)
            .ok_or(PatchError::NumberOverflow)?;
        value = value.checked_add(group).ok_or(PatchError::NumberOverflow)?;
        if byte & 0x80 != 0 {
            return Ok(value);
        }
        shift = shift.checked_shl(7).filter(|s| *s != 0).ok_or(PatchError::NumberOverflow)?;
        value = value.checked_add(shift).ok_or(PatchError::NumberOverflow)?;
    }
}

/// Decodes a number that must fit in memory, such as a size or length.
pub fn decode_size(data: &[u8], pos: &mut usize) -> Result<usize, PatchError> {
    usize::try_from(decode_number(data, pos)?).map_err(|_| PatchError::NumberOverflow)
}

/// Decodes a relative offset: magnitude in the upper bits, sign in bit 0.
pub fn decode_offset(data: &[u8], pos: &mut usize) -> Result<i64, PatchError> {
    let raw = decode_number(data, pos)?;
    let magnitude = i64::try_from(raw >> 1).map_err(|_| PatchError::NumberOverflow)?;
    Ok(if raw & 1 != 0 { -magnitude } else { magnitude })
}

pub fn encode_number(mut value: u64, out: &mut Vec<u8>) {
    loop {
        let group = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out.push(0x80 | group);
            return;
        }
        out.push(group);
        value -= 1;
    }
}

pub fn encode_offset(offset: i64, out: &mut Vec<u8>) {
    let sign = (offset < 0) as u64;
    encode_number(offset.unsigned_abs() << 1 | sign, out);
}
