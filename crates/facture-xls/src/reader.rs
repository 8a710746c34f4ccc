//! XLS (BIFF8) reader.
//!
//! Opens a Compound File Binary (CFB/OLE2) container, reads the `Workbook`
//! stream, parses BIFF8 records, and populates a `facture_core::Workbook`.

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use log::debug;

use facture_core::{
    CellAddress, CellError, CellRange, CellValue, Formula, SharedString, Style, Workbook,
    Worksheet,
};

use crate::biff::parser::{read_f64, read_rk, read_u16, read_u32};
use crate::biff::records;
use crate::biff::strings::{parse_sst, read_short_string, read_unicode_string};
use crate::biff::{self, BiffRecord};
use crate::error::{XlsError, XlsResult};
use crate::styles::{self, StyleContext};

/// XLS file reader.
pub struct XlsReader;

/// Metadata from a BOUNDSHEET record.
#[derive(Debug)]
struct SheetInfo {
    /// 0 = visible, 1 = hidden, 2 = very hidden.
    visibility: u8,
    /// 0 = worksheet, 2 = chart, 6 = macro/VBA.
    sheet_type: u8,
    name: String,
}

impl XlsReader {
    /// Read an XLS file from a filesystem path.
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsResult<Workbook> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::read(file)
    }

    /// Read an XLS file from any `Read + Seek` source.
    pub fn read<R: Read + Seek>(reader: R) -> XlsResult<Workbook> {
        let mut cfb = cfb::CompoundFile::open(reader)?;

        // BIFF8 files store the stream as "Workbook"; some older writers
        // kept the BIFF5 name "Book"
        let stream_path = if cfb.exists("/Workbook") {
            "/Workbook"
        } else if cfb.exists("/Book") {
            "/Book"
        } else {
            return Err(XlsError::InvalidFormat(
                "no Workbook or Book stream found in CFB".into(),
            ));
        };

        let mut stream_data = Vec::new();
        cfb.open_stream(stream_path)?
            .read_to_end(&mut stream_data)?;

        let all_records = biff::read_all_records(&mut Cursor::new(&stream_data))?;

        // Phase 1: workbook globals (SST, sheet table, date mode, styles)
        let mut shared_strings: Vec<SharedString> = Vec::new();
        let mut sheets: Vec<SheetInfo> = Vec::new();
        let mut date_mode_1904 = false;
        let mut in_globals = false;
        let mut style_ctx = StyleContext::new();
        let mut globals_end_idx = 0;

        for (idx, rec) in all_records.iter().enumerate() {
            match rec.record_type {
                records::BOF => {
                    let (version, dt) = biff::parse_bof(&rec.data)?;
                    if dt == records::BOF_WORKBOOK_GLOBALS {
                        if version != records::BIFF8_VERSION {
                            return Err(XlsError::UnsupportedVersion(format!(
                                "expected BIFF8 (0x0600), got 0x{version:04X}"
                            )));
                        }
                        in_globals = true;
                    }
                }
                records::EOF if in_globals => {
                    globals_end_idx = idx;
                    break;
                }
                records::SST if in_globals => {
                    shared_strings = parse_sst(&rec.data)?
                        .iter()
                        .map(|s| SharedString::from(s.as_str()))
                        .collect();
                }
                records::BOUNDSHEET if in_globals => {
                    sheets.push(Self::parse_boundsheet(&rec.data)?);
                }
                records::DATEMODE if in_globals => {
                    if rec.data.len() >= 2 {
                        date_mode_1904 = u16::from_le_bytes([rec.data[0], rec.data[1]]) == 1;
                    }
                }
                records::FONT if in_globals => {
                    if let Ok(font) = styles::parse_font(&rec.data) {
                        style_ctx.fonts.push(font);
                    }
                }
                records::FORMAT if in_globals => {
                    if let Ok((id, code)) = styles::parse_format(&rec.data) {
                        style_ctx.formats.insert(id, code);
                    }
                }
                records::XF if in_globals => {
                    if let Ok(xf) = styles::parse_xf(&rec.data) {
                        style_ctx.xfs.push(xf);
                    }
                }
                records::PALETTE if in_globals => {
                    let _ = styles::apply_palette(&rec.data, &mut style_ctx.palette);
                }
                _ => {}
            }
        }

        if !in_globals {
            return Err(XlsError::InvalidFormat(
                "no workbook globals BOF found".into(),
            ));
        }

        let style_table = style_ctx.build_style_table();

        let mut workbook = Workbook::empty();
        workbook.settings_mut().date_1904 = date_mode_1904;

        // Phase 2: per-sheet substreams (BOF..EOF pairs after the globals),
        // matched to BOUNDSHEET entries in order
        let remaining = &all_records[globals_end_idx + 1..];
        let sheet_record_groups = Self::split_sheet_records(remaining);

        for (biff_idx, info) in sheets.iter().enumerate() {
            // Chart and macro sheets have substreams too but no cell grid
            if info.sheet_type != 0 {
                continue;
            }

            let sheet_idx = workbook.add_worksheet_with_name(info.name.as_str())?;
            if let Some(ws) = workbook.worksheet_mut(sheet_idx) {
                if info.visibility != 0 {
                    ws.set_visible(false);
                }
                if let Some(group) = sheet_record_groups.get(biff_idx) {
                    Self::parse_sheet_records(group, ws, &shared_strings, &style_table)?;
                    debug!(
                        "read sheet '{}': {} cells, {} merged regions",
                        info.name,
                        ws.cell_count(),
                        ws.merged_regions().len()
                    );
                }
            }
        }

        if workbook.is_empty() {
            return Err(XlsError::InvalidFormat("workbook has no sheets".into()));
        }

        Ok(workbook)
    }

    /// Parse a BOUNDSHEET record body.
    fn parse_boundsheet(data: &[u8]) -> XlsResult<SheetInfo> {
        let mut offset = 0;
        let _abs_offset = read_u32(data, &mut offset)?;
        let visibility = data.get(offset).copied().unwrap_or(0);
        let sheet_type = data.get(offset + 1).copied().unwrap_or(0);
        offset += 2;
        let name = read_short_string(data, &mut offset)?;

        Ok(SheetInfo {
            visibility,
            sheet_type,
            name,
        })
    }

    /// Group the records after the globals into per-sheet runs. Each
    /// BOF..EOF pair is one substream; nested BOFs stay in their group.
    fn split_sheet_records(all: &[BiffRecord]) -> Vec<Vec<&BiffRecord>> {
        let mut groups: Vec<Vec<&BiffRecord>> = Vec::new();
        let mut current: Option<Vec<&BiffRecord>> = None;
        let mut depth = 0i32;

        for rec in all {
            match rec.record_type {
                records::BOF => {
                    if depth == 0 {
                        current = Some(Vec::new());
                    }
                    depth += 1;
                }
                records::EOF => {
                    depth -= 1;
                    if depth == 0 {
                        if let Some(group) = current.take() {
                            groups.push(group);
                        }
                    }
                }
                _ => {
                    if let Some(group) = current.as_mut() {
                        group.push(rec);
                    }
                }
            }
        }

        groups
    }

    /// Walk a sheet's records and populate the worksheet.
    fn parse_sheet_records(
        group: &[&BiffRecord],
        ws: &mut Worksheet,
        sst: &[SharedString],
        styles: &[Style],
    ) -> XlsResult<()> {
        // A STRING record holds the cached text of the FORMULA before it
        let mut pending_formula_cell: Option<(u32, u16)> = None;

        for rec in group {
            // Any other cell record ends the FORMULA..STRING pairing.
            // Records between the two (SHRFMLA, structural data) leave it
            // in place.
            if matches!(
                rec.record_type,
                records::LABELSST
                    | records::LABEL
                    | records::NUMBER
                    | records::RK
                    | records::MULRK
                    | records::BLANK
                    | records::MULBLANK
                    | records::BOOLERR
            ) {
                pending_formula_cell = None;
            }

            match rec.record_type {
                records::LABELSST => Self::parse_labelsst(&rec.data, ws, sst, styles)?,
                records::LABEL => Self::parse_label(&rec.data, ws, styles)?,
                records::NUMBER => Self::parse_number(&rec.data, ws, styles)?,
                records::RK => Self::parse_rk(&rec.data, ws, styles)?,
                records::MULRK => Self::parse_mulrk(&rec.data, ws, styles)?,
                records::BLANK => Self::parse_blank(&rec.data, ws, styles)?,
                records::MULBLANK => Self::parse_mulblank(&rec.data, ws, styles)?,
                records::BOOLERR => Self::parse_boolerr(&rec.data, ws, styles)?,
                records::FORMULA => {
                    pending_formula_cell = Self::parse_formula(&rec.data, ws, styles)?;
                }
                records::STRING => {
                    if let Some((row, col)) = pending_formula_cell.take() {
                        Self::parse_formula_string(&rec.data, ws, row, col)?;
                    }
                }
                records::MERGECELLS => Self::parse_mergecells(&rec.data, ws)?,
                records::ROW => Self::parse_row(&rec.data, ws),
                records::COLINFO => Self::parse_colinfo(&rec.data, ws),
                _ => {}
            }
        }

        Ok(())
    }

    /// Apply a style from the XF table to a cell.
    #[inline]
    fn apply_style(
        ws: &mut Worksheet,
        row: u32,
        col: u16,
        xf_idx: u16,
        styles: &[Style],
    ) -> XlsResult<()> {
        let idx = xf_idx as usize;
        if idx != 0 && idx < styles.len() {
            let style = &styles[idx];
            if *style != Style::default() {
                ws.set_style_at(row, col, style)?;
            }
        }
        Ok(())
    }

    /// LABELSST: row(2) + col(2) + xf(2) + sst_index(4)
    fn parse_labelsst(
        data: &[u8],
        ws: &mut Worksheet,
        sst: &[SharedString],
        styles: &[Style],
    ) -> XlsResult<()> {
        let mut off = 0;
        let row = read_u16(data, &mut off)? as u32;
        let col = read_u16(data, &mut off)?;
        let xf_idx = read_u16(data, &mut off)?;
        let sst_idx = read_u32(data, &mut off)? as usize;

        if let Some(s) = sst.get(sst_idx) {
            ws.set_value_at(row, col, CellValue::SharedString(s.clone()))?;
        }
        Self::apply_style(ws, row, col, xf_idx, styles)
    }

    /// LABEL: row(2) + col(2) + xf(2) + unicode string
    fn parse_label(data: &[u8], ws: &mut Worksheet, styles: &[Style]) -> XlsResult<()> {
        let mut off = 0;
        let row = read_u16(data, &mut off)? as u32;
        let col = read_u16(data, &mut off)?;
        let xf_idx = read_u16(data, &mut off)?;
        let text = read_unicode_string(data, &mut off)?;

        ws.set_value_at(row, col, text)?;
        Self::apply_style(ws, row, col, xf_idx, styles)
    }

    /// NUMBER: row(2) + col(2) + xf(2) + f64(8)
    fn parse_number(data: &[u8], ws: &mut Worksheet, styles: &[Style]) -> XlsResult<()> {
        let mut off = 0;
        let row = read_u16(data, &mut off)? as u32;
        let col = read_u16(data, &mut off)?;
        let xf_idx = read_u16(data, &mut off)?;
        let value = read_f64(data, &mut off)?;

        ws.set_value_at(row, col, value)?;
        Self::apply_style(ws, row, col, xf_idx, styles)
    }

    /// RK: row(2) + col(2) + xf(2) + rk(4)
    fn parse_rk(data: &[u8], ws: &mut Worksheet, styles: &[Style]) -> XlsResult<()> {
        let mut off = 0;
        let row = read_u16(data, &mut off)? as u32;
        let col = read_u16(data, &mut off)?;
        let xf_idx = read_u16(data, &mut off)?;
        let value = read_rk(data, &mut off)?;

        ws.set_value_at(row, col, value)?;
        Self::apply_style(ws, row, col, xf_idx, styles)
    }

    /// MULRK: row(2) + first_col(2) + [xf(2) + rk(4)]* + last_col(2)
    fn parse_mulrk(data: &[u8], ws: &mut Worksheet, styles: &[Style]) -> XlsResult<()> {
        if data.len() < 6 {
            return Err(XlsError::Parse("MULRK record too short".into()));
        }
        let mut off = 0;
        let row = read_u16(data, &mut off)? as u32;
        let first_col = read_u16(data, &mut off)?;
        let last_col = u16::from_le_bytes([data[data.len() - 2], data[data.len() - 1]])
            .min(facture_core::MAX_COLS - 1);
        let rk_data_end = data.len() - 2;

        let mut col = first_col;
        while off + 6 <= rk_data_end && col <= last_col {
            let xf_idx = read_u16(data, &mut off)?;
            let value = read_rk(data, &mut off)?;
            ws.set_value_at(row, col, value)?;
            Self::apply_style(ws, row, col, xf_idx, styles)?;
            col += 1;
        }

        Ok(())
    }

    /// BLANK: row(2) + col(2) + xf(2). An empty cell that carries formatting.
    fn parse_blank(data: &[u8], ws: &mut Worksheet, styles: &[Style]) -> XlsResult<()> {
        if data.len() < 6 {
            return Ok(());
        }
        let mut off = 0;
        let row = read_u16(data, &mut off)? as u32;
        let col = read_u16(data, &mut off)?;
        let xf_idx = read_u16(data, &mut off)?;
        Self::apply_style(ws, row, col, xf_idx, styles)
    }

    /// MULBLANK: row(2) + first_col(2) + [xf(2)]* + last_col(2)
    fn parse_mulblank(data: &[u8], ws: &mut Worksheet, styles: &[Style]) -> XlsResult<()> {
        if data.len() < 6 {
            return Ok(());
        }
        let mut off = 0;
        let row = read_u16(data, &mut off)? as u32;
        let first_col = read_u16(data, &mut off)?;
        let last_col = u16::from_le_bytes([data[data.len() - 2], data[data.len() - 1]])
            .min(facture_core::MAX_COLS - 1);
        let xf_data_end = data.len() - 2;

        let mut col = first_col;
        while off + 2 <= xf_data_end && col <= last_col {
            let xf_idx = read_u16(data, &mut off)?;
            Self::apply_style(ws, row, col, xf_idx, styles)?;
            col += 1;
        }
        Ok(())
    }

    /// BOOLERR: row(2) + col(2) + xf(2) + value(1) + is_error(1)
    fn parse_boolerr(data: &[u8], ws: &mut Worksheet, styles: &[Style]) -> XlsResult<()> {
        let mut off = 0;
        let row = read_u16(data, &mut off)? as u32;
        let col = read_u16(data, &mut off)?;
        let xf_idx = read_u16(data, &mut off)?;
        let val = data.get(off).copied().unwrap_or(0);
        let is_error = data.get(off + 1).copied().unwrap_or(0);

        let cell_value = if is_error != 0 {
            CellValue::Error(CellError::from_biff_code(val).unwrap_or(CellError::Value))
        } else {
            CellValue::Bool(val != 0)
        };

        ws.set_value_at(row, col, cell_value)?;
        Self::apply_style(ws, row, col, xf_idx, styles)
    }

    /// FORMULA: row(2) + col(2) + xf(2) + result(8) + options(2) +
    /// reserved(4) + rpn tokens.
    ///
    /// The token stream is not decoded, so the formula text stays empty and
    /// only the cached result is kept. Returns `(row, col)` when the cached
    /// result is a string, meaning a STRING record follows.
    fn parse_formula(
        data: &[u8],
        ws: &mut Worksheet,
        styles: &[Style],
    ) -> XlsResult<Option<(u32, u16)>> {
        if data.len() < 20 {
            return Err(XlsError::Parse("FORMULA record too short".into()));
        }

        let mut off = 0;
        let row = read_u16(data, &mut off)? as u32;
        let col = read_u16(data, &mut off)?;
        let xf_idx = read_u16(data, &mut off)?;

        let result = &data[off..off + 8];

        // Bytes 6-7 == 0xFFFF flags a non-numeric cached result; the type
        // tag sits in byte 0
        let mut pending = None;
        let value = if result[6] == 0xFF && result[7] == 0xFF {
            match result[0] {
                0x00 => {
                    // Cached string arrives in the STRING record after this one
                    pending = Some((row, col));
                    Formula::new("")
                }
                0x01 => Formula::with_cached_value("", CellValue::Bool(result[2] != 0)),
                0x02 => {
                    let err = CellError::from_biff_code(result[2]).unwrap_or(CellError::Value);
                    Formula::with_cached_value("", CellValue::Error(err))
                }
                _ => Formula::new(""),
            }
        } else {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(result);
            Formula::with_cached_value("", CellValue::Number(f64::from_le_bytes(bytes)))
        };

        ws.set_value_at(row, col, value)?;
        Self::apply_style(ws, row, col, xf_idx, styles)?;

        Ok(pending)
    }

    /// STRING: cached string result for the preceding FORMULA.
    fn parse_formula_string(
        data: &[u8],
        ws: &mut Worksheet,
        row: u32,
        col: u16,
    ) -> XlsResult<()> {
        let mut off = 0;
        let text = read_unicode_string(data, &mut off)?;
        ws.set_value_at(
            row,
            col,
            Formula::with_cached_value("", CellValue::String(text)),
        )?;
        Ok(())
    }

    /// MERGECELLS: count(2) + [first_row, last_row, first_col, last_col]*
    fn parse_mergecells(data: &[u8], ws: &mut Worksheet) -> XlsResult<()> {
        let mut off = 0;
        let count = read_u16(data, &mut off)? as usize;

        for _ in 0..count {
            if off + 8 > data.len() {
                break;
            }
            let first_row = read_u16(data, &mut off)? as u32;
            let last_row = read_u16(data, &mut off)? as u32;
            let first_col = read_u16(data, &mut off)?;
            let last_col = read_u16(data, &mut off)?;

            let range = CellRange::new(
                CellAddress::new(first_row, first_col),
                CellAddress::new(last_row, last_col),
            );
            ws.merge_cells(&range)?;
        }

        Ok(())
    }

    /// ROW: row(2) + first_col(2) + last_col+1(2) + height(2) + ... +
    /// options(4) at offset 12.
    fn parse_row(data: &[u8], ws: &mut Worksheet) {
        if data.len() < 16 {
            return;
        }
        let row_index = u16::from_le_bytes([data[0], data[1]]) as u32;
        let height_twips = u16::from_le_bytes([data[6], data[7]]) & 0x7FFF;
        let options = u32::from_le_bytes([data[12], data[13], data[14], data[15]]);

        if (options & 0x20) != 0 {
            ws.set_row_hidden(row_index, true);
        }
        let height_pt = height_twips as f64 / 20.0;
        if (options & 0x40) != 0 && height_pt > 0.0 {
            ws.set_row_height(row_index, height_pt);
        }
    }

    /// COLINFO: first_col(2) + last_col(2) + width(2) + xf(2) + options(2)
    fn parse_colinfo(data: &[u8], ws: &mut Worksheet) {
        if data.len() < 10 {
            return;
        }
        let first_col = u16::from_le_bytes([data[0], data[1]]);
        let last_col = u16::from_le_bytes([data[2], data[3]]);
        let raw_width = u16::from_le_bytes([data[4], data[5]]);
        let options = u16::from_le_bytes([data[8], data[9]]);

        let hidden = (options & 0x0001) != 0;
        // Width is stored in 1/256ths of a character
        let width_chars = raw_width as f64 / 256.0;
        let last = last_col.min(facture_core::MAX_COLS - 1);

        for col in first_col..=last {
            if hidden {
                ws.set_column_hidden(col, true);
            }
            if width_chars > 0.0 {
                ws.set_column_width(col, width_chars);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cell_header(row: u16, col: u16, xf: u16) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&row.to_le_bytes());
        data.extend_from_slice(&col.to_le_bytes());
        data.extend_from_slice(&xf.to_le_bytes());
        data
    }

    fn sheet() -> Worksheet {
        Worksheet::new("Invoice")
    }

    #[test]
    fn boundsheet_fields() {
        let mut data = Vec::new();
        data.extend_from_slice(&0x0600u32.to_le_bytes()); // stream offset
        data.push(0x01); // hidden
        data.push(0x00); // worksheet
        data.push(5);
        data.push(0x00);
        data.extend_from_slice(b"Sheet");

        let info = XlsReader::parse_boundsheet(&data).unwrap();
        assert_eq!(info.visibility, 1);
        assert_eq!(info.sheet_type, 0);
        assert_eq!(info.name, "Sheet");
    }

    #[test]
    fn labelsst_places_interned_string() {
        let mut ws = sheet();
        let sst = vec![SharedString::from("შპს ჭიქები")];

        let mut data = cell_header(11, 0, 0); // A12
        data.extend_from_slice(&0u32.to_le_bytes());
        XlsReader::parse_labelsst(&data, &mut ws, &sst, &[]).unwrap();

        assert_eq!(ws.value_at(11, 0).as_str(), Some("შპს ჭიქები"));

        // Out-of-range index leaves the cell untouched
        let mut data = cell_header(0, 0, 0);
        data.extend_from_slice(&9u32.to_le_bytes());
        XlsReader::parse_labelsst(&data, &mut ws, &sst, &[]).unwrap();
        assert!(ws.value_at(0, 0).is_empty());
    }

    #[test]
    fn number_and_rk_cells() {
        let mut ws = sheet();

        let mut data = cell_header(4, 3, 0); // D5
        data.extend_from_slice(&1042.0f64.to_le_bytes());
        XlsReader::parse_number(&data, &mut ws, &[]).unwrap();

        let mut data = cell_header(16, 2, 0); // C17, RK 12.50
        data.extend_from_slice(&(((1250u32) << 2) | 0x03).to_le_bytes());
        XlsReader::parse_rk(&data, &mut ws, &[]).unwrap();

        assert_eq!(ws.value_at(4, 3).as_number(), Some(1042.0));
        assert_eq!(ws.value_at(16, 2).as_number(), Some(12.5));
    }

    #[test]
    fn mulrk_expands_to_cells() {
        let mut ws = sheet();

        let mut data = Vec::new();
        data.extend_from_slice(&16u16.to_le_bytes()); // row 17
        data.extend_from_slice(&1u16.to_le_bytes()); // cols B..D
        for n in [2u32, 5, 7] {
            data.extend_from_slice(&0u16.to_le_bytes()); // xf
            data.extend_from_slice(&((n << 2) | 0x02).to_le_bytes());
        }
        data.extend_from_slice(&3u16.to_le_bytes()); // last col

        XlsReader::parse_mulrk(&data, &mut ws, &[]).unwrap();
        assert_eq!(ws.value_at(16, 1).as_number(), Some(2.0));
        assert_eq!(ws.value_at(16, 2).as_number(), Some(5.0));
        assert_eq!(ws.value_at(16, 3).as_number(), Some(7.0));
    }

    #[test]
    fn boolerr_cells() {
        let mut ws = sheet();

        let mut data = cell_header(0, 0, 0);
        data.extend_from_slice(&[0x01, 0x00]); // TRUE
        XlsReader::parse_boolerr(&data, &mut ws, &[]).unwrap();

        let mut data = cell_header(0, 1, 0);
        data.extend_from_slice(&[0x07, 0x01]); // #DIV/0!
        XlsReader::parse_boolerr(&data, &mut ws, &[]).unwrap();

        assert_eq!(ws.value_at(0, 0), CellValue::Bool(true));
        assert_eq!(ws.value_at(0, 1), CellValue::Error(CellError::DivideByZero));
    }

    #[test]
    fn formula_with_numeric_cache() {
        let mut ws = sheet();

        let mut data = cell_header(35, 3, 0); // D36
        data.extend_from_slice(&88.5f64.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes()); // options
        data.extend_from_slice(&0u32.to_le_bytes()); // reserved

        let pending = XlsReader::parse_formula(&data, &mut ws, &[]).unwrap();
        assert!(pending.is_none());
        assert_eq!(ws.value_at(35, 3).as_number(), Some(88.5));
    }

    #[test]
    fn formula_with_string_cache_waits_for_string_record() {
        let mut ws = sheet();

        let mut data = cell_header(2, 0, 0);
        data.extend_from_slice(&[0x00, 0, 0, 0, 0, 0, 0xFF, 0xFF]);
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());

        let pending = XlsReader::parse_formula(&data, &mut ws, &[]).unwrap();
        assert_eq!(pending, Some((2, 0)));

        let mut string_rec = vec![0x02, 0x00, 0x00];
        string_rec.extend_from_slice(b"OK");
        XlsReader::parse_formula_string(&string_rec, &mut ws, 2, 0).unwrap();
        assert_eq!(ws.value_at(2, 0).as_str(), Some("OK"));
    }

    #[test]
    fn formula_with_error_cache() {
        let mut ws = sheet();

        let mut data = cell_header(1, 1, 0);
        data.extend_from_slice(&[0x02, 0, 0x2A, 0, 0, 0, 0xFF, 0xFF]); // #N/A
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());

        XlsReader::parse_formula(&data, &mut ws, &[]).unwrap();
        match ws.value_at(1, 1) {
            CellValue::Formula(f) => {
                assert_eq!(
                    f.cached_value.as_deref(),
                    Some(&CellValue::Error(CellError::NotAvailable))
                );
            }
            other => panic!("expected formula cell, got {other:?}"),
        }
    }

    #[test]
    fn merged_regions() {
        let mut ws = sheet();

        let mut data = Vec::new();
        data.extend_from_slice(&1u16.to_le_bytes());
        for v in [0u16, 0, 0, 3] {
            data.extend_from_slice(&v.to_le_bytes());
        }

        XlsReader::parse_mergecells(&data, &mut ws).unwrap();
        assert_eq!(ws.merged_regions().len(), 1);
        assert!(ws.is_merged_at(0, 2));
    }

    #[test]
    fn row_and_column_dimensions() {
        let mut ws = sheet();

        // ROW record: row 0, height 570 twips = 28.5pt, custom height flag
        let mut data = Vec::new();
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&4u16.to_le_bytes());
        data.extend_from_slice(&570u16.to_le_bytes());
        data.extend_from_slice(&[0u8; 4]); // irot etc.
        data.extend_from_slice(&0x40u32.to_le_bytes());
        XlsReader::parse_row(&data, &mut ws);

        // COLINFO: cols A..A, width 36 chars, hidden
        let mut data = Vec::new();
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&(36 * 256u16).to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        XlsReader::parse_colinfo(&data, &mut ws);

        assert_eq!(ws.custom_row_heights().get(&0), Some(&28.5));
        assert_eq!(ws.custom_column_widths().get(&0), Some(&36.0));
        assert!(ws.hidden_columns().get(&0).copied().unwrap_or(false));
    }
}
