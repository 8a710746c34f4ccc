//! Low-level binary parsing helpers for BIFF8 records.
//!
//! All multi-byte integers in BIFF8 are little-endian.

use crate::error::{XlsError, XlsResult};

/// Bounds-check that `n` bytes are available at `offset`.
#[inline]
fn need(data: &[u8], offset: usize, n: usize) -> XlsResult<()> {
    if offset + n > data.len() {
        return Err(XlsError::Parse(format!(
            "unexpected end of data at offset {offset}, need {n} bytes"
        )));
    }
    Ok(())
}

/// Read a `u8` at `offset`, advancing `offset`.
#[inline]
pub fn read_u8(data: &[u8], offset: &mut usize) -> XlsResult<u8> {
    need(data, *offset, 1)?;
    let v = data[*offset];
    *offset += 1;
    Ok(v)
}

/// Read a little-endian `u16` at `offset`, advancing `offset`.
#[inline]
pub fn read_u16(data: &[u8], offset: &mut usize) -> XlsResult<u16> {
    need(data, *offset, 2)?;
    let v = u16::from_le_bytes([data[*offset], data[*offset + 1]]);
    *offset += 2;
    Ok(v)
}

/// Read a little-endian `u32` at `offset`, advancing `offset`.
#[inline]
pub fn read_u32(data: &[u8], offset: &mut usize) -> XlsResult<u32> {
    need(data, *offset, 4)?;
    let v = u32::from_le_bytes([
        data[*offset],
        data[*offset + 1],
        data[*offset + 2],
        data[*offset + 3],
    ]);
    *offset += 4;
    Ok(v)
}

/// Read an IEEE 754 double (little-endian) at `offset`.
#[inline]
pub fn read_f64(data: &[u8], offset: &mut usize) -> XlsResult<f64> {
    need(data, *offset, 8)?;
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[*offset..*offset + 8]);
    *offset += 8;
    Ok(f64::from_le_bytes(bytes))
}

/// Decode an RK-encoded number.
///
/// RK encoding (4 bytes):
/// - Bit 0: if 1, the decoded number is divided by 100
/// - Bit 1: if 1, bits 2..31 hold a signed 30-bit integer;
///   if 0, bits 2..31 are the upper 30 bits of an IEEE 754 double
///   (the lower 34 bits are zero)
#[inline]
pub fn decode_rk(rk: u32) -> f64 {
    let div100 = (rk & 0x01) != 0;
    let is_integer = (rk & 0x02) != 0;

    let value = if is_integer {
        ((rk as i32) >> 2) as f64
    } else {
        let bits = ((rk & 0xFFFF_FFFC) as u64) << 32;
        f64::from_bits(bits)
    };

    if div100 {
        value / 100.0
    } else {
        value
    }
}

/// Read an RK value from 4 bytes at `offset`.
#[inline]
pub fn read_rk(data: &[u8], offset: &mut usize) -> XlsResult<f64> {
    let raw = read_u32(data, offset)?;
    Ok(decode_rk(raw))
}
