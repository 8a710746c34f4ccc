//! BIFF8 (Binary Interchange File Format) record handling.
//!
//! A BIFF8 stream is a sequence of records, each a 4-byte header (2 bytes
//! record type + 2 bytes body length) followed by the body. CONTINUE
//! records (type 0x003C) extend the preceding record's body past the
//! 8224-byte per-record limit.

pub mod parser;
pub mod records;
pub mod strings;

use std::io::Read;

use crate::error::{XlsError, XlsResult};

/// A single BIFF8 record with CONTINUE bodies already merged.
#[derive(Debug)]
pub struct BiffRecord {
    /// Record type ID (e.g. `records::SST`, `records::NUMBER`).
    pub record_type: u16,
    /// Record body, including any CONTINUE extensions.
    pub data: Vec<u8>,
}

/// Read every record from a BIFF8 stream, folding CONTINUE records into
/// their parent.
pub fn read_all_records<R: Read>(stream: &mut R) -> XlsResult<Vec<BiffRecord>> {
    let mut records: Vec<BiffRecord> = Vec::new();
    let mut header = [0u8; 4];

    loop {
        match stream.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(XlsError::Io(e)),
        }

        let record_type = u16::from_le_bytes([header[0], header[1]]);
        let body_len = u16::from_le_bytes([header[2], header[3]]) as usize;

        let mut body = vec![0u8; body_len];
        if body_len > 0 {
            stream.read_exact(&mut body)?;
        }

        if record_type == records::CONTINUE {
            // An orphaned CONTINUE with no parent is dropped
            if let Some(prev) = records.last_mut() {
                prev.data.extend_from_slice(&body);
            }
        } else {
            records.push(BiffRecord { record_type, data: body });
        }
    }

    Ok(records)
}

/// Extract `(version, substream_type)` from a BOF record body.
///
/// `version` is `0x0600` for BIFF8; `substream_type` is 0x0005 for the
/// workbook globals and 0x0010 for a worksheet.
pub fn parse_bof(data: &[u8]) -> XlsResult<(u16, u16)> {
    if data.len() < 4 {
        return Err(XlsError::InvalidFormat("BOF record too short".into()));
    }
    let version = u16::from_le_bytes([data[0], data[1]]);
    let dt = u16::from_le_bytes([data[2], data[3]]);
    Ok((version, dt))
}
