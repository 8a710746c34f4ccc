//! BIFF8 Unicode string decoding.
//!
//! BIFF8 strings carry a small header before the character data:
//! - char count (1 or 2 bytes depending on the record) + 1 flags byte
//! - Flags bit 0 (`fHighByte`): 0 = compressed Latin-1, 1 = UTF-16LE
//! - Flags bit 2 (`fExtSt`): extended (Asian phonetic) block follows
//! - Flags bit 3 (`fRichSt`): rich text run array follows
//! - If fRichSt: a 2-byte run count sits between the header and the text
//! - If fExtSt: a 4-byte extended size sits between the header and the text
//! - Character data, then the runs (4 bytes each), then the extended block

use super::parser::{read_u16, read_u32, read_u8};
use crate::error::{XlsError, XlsResult};

/// Read a BIFF8 "short" string (1-byte length prefix, used in BOUNDSHEET
/// and FONT records).
pub fn read_short_string(data: &[u8], offset: &mut usize) -> XlsResult<String> {
    let char_count = read_u8(data, offset)? as u16;
    let flags = read_u8(data, offset)?;
    read_character_data(data, offset, char_count, flags)
}

/// Read a BIFF8 Unicode string with a 2-byte length prefix (used in SST,
/// LABEL, FORMAT, and STRING records).
pub fn read_unicode_string(data: &[u8], offset: &mut usize) -> XlsResult<String> {
    let char_count = read_u16(data, offset)?;
    let flags = read_u8(data, offset)?;

    let is_rich = (flags & 0x08) != 0;
    let has_ext = (flags & 0x04) != 0;

    let run_count = if is_rich { read_u16(data, offset)? } else { 0 };
    let ext_size = if has_ext { read_u32(data, offset)? } else { 0 };

    let text = read_character_data(data, offset, char_count, flags)?;

    // Formatting runs (char_pos u16 + font_idx u16 each) and the extended
    // block carry no cell text, skip both.
    if is_rich {
        *offset += run_count as usize * 4;
    }
    if has_ext {
        *offset += ext_size as usize;
    }

    Ok(text)
}

/// Decode character data (no header) given the char count and flags byte.
fn read_character_data(
    data: &[u8],
    offset: &mut usize,
    char_count: u16,
    flags: u8,
) -> XlsResult<String> {
    let count = char_count as usize;
    let is_wide = (flags & 0x01) != 0;

    if is_wide {
        let byte_len = count * 2;
        if *offset + byte_len > data.len() {
            return Err(XlsError::Parse(format!(
                "string data too short: need {} bytes at offset {}, have {}",
                byte_len,
                *offset,
                data.len() - *offset
            )));
        }
        let units: Vec<u16> = data[*offset..*offset + byte_len]
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        *offset += byte_len;
        String::from_utf16(&units)
            .map_err(|e| XlsError::Parse(format!("invalid UTF-16 string: {e}")))
    } else {
        if *offset + count > data.len() {
            return Err(XlsError::Parse(format!(
                "string data too short: need {} bytes at offset {}, have {}",
                count,
                *offset,
                data.len() - *offset
            )));
        }
        // Compressed form is Latin-1, one byte per character
        let s: String = data[*offset..*offset + count]
            .iter()
            .map(|&b| b as char)
            .collect();
        *offset += count;
        Ok(s)
    }
}

/// Parse the whole SST (Shared String Table) from a concatenated buffer
/// (SST body plus all CONTINUE bodies already joined).
///
/// The body starts with two u32 counters (total refs, unique strings)
/// followed by that many Unicode string entries.
pub fn parse_sst(data: &[u8]) -> XlsResult<Vec<String>> {
    let mut offset = 0;

    let _total_refs = read_u32(data, &mut offset)?;
    let unique_count = read_u32(data, &mut offset)? as usize;

    let mut strings = Vec::with_capacity(unique_count);

    for i in 0..unique_count {
        match read_unicode_string(data, &mut offset) {
            Ok(s) => strings.push(s),
            Err(e) => {
                // Some writers pad or truncate the tail of the SST.
                log::warn!("SST parse error at string {i}/{unique_count}: {e}");
                break;
            }
        }
    }

    Ok(strings)
}
