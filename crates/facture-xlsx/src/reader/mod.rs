//! Reading .xlsx files into a [`Workbook`]

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use zip::ZipArchive;

use crate::error::{XlsxError, XlsxResult};
use crate::styles::read_styles_xml;
use facture_core::style::Style;
use facture_core::{
    CellAddress, CellError, CellRange, CellValue, DefinedName, Formula, Workbook, Worksheet,
};

/// Reads workbooks from the 2007+ zip container format.
pub struct XlsxReader;

impl XlsxReader {
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        let file = File::open(path.as_ref())?;
        Self::read(BufReader::new(file))
    }

    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        let mut archive = ZipArchive::new(reader)?;

        let shared_strings = match archive.by_name("xl/sharedStrings.xml") {
            Ok(part) => read_shared_strings(part)?,
            Err(zip::result::ZipError::FileNotFound) => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let styles = match archive.by_name("xl/styles.xml") {
            Ok(part) => read_styles_xml(part)?,
            Err(zip::result::ZipError::FileNotFound) => vec![Style::default()],
            Err(e) => return Err(e.into()),
        };

        let meta = {
            let part = archive
                .by_name("xl/workbook.xml")
                .map_err(|_| XlsxError::MissingPart("xl/workbook.xml".into()))?;
            read_workbook_xml(part)?
        };

        let rels = {
            let part = archive
                .by_name("xl/_rels/workbook.xml.rels")
                .map_err(|_| XlsxError::MissingPart("xl/_rels/workbook.xml.rels".into()))?;
            read_workbook_rels(part)?
        };

        let mut workbook = Workbook::empty();
        workbook.settings_mut().date_1904 = meta.date_1904;

        for sheet_meta in &meta.sheets {
            let target = rels.get(&sheet_meta.rel_id).ok_or_else(|| {
                XlsxError::InvalidFormat(format!(
                    "no worksheet relationship for sheet '{}'",
                    sheet_meta.name
                ))
            })?;
            let part_path = resolve_part_path(target);

            let idx = workbook.add_worksheet_with_name(sheet_meta.name.as_str())?;

            let part = archive
                .by_name(&part_path)
                .map_err(|_| XlsxError::MissingPart(part_path.clone()))?;
            let sheet = workbook
                .worksheet_mut(idx)
                .ok_or_else(|| XlsxError::InvalidFormat("sheet index out of range".into()))?;
            if sheet_meta.hidden {
                sheet.set_visible(false);
            }

            read_sheet_xml(part, sheet, &shared_strings, &styles)?;
            debug!(
                "loaded sheet '{}' with {} cells",
                sheet_meta.name,
                workbook.worksheet(idx).map(|s| s.cell_count()).unwrap_or(0)
            );
        }

        for dn in meta.defined_names {
            workbook.add_defined_name(dn);
        }

        if workbook.is_empty() {
            return Err(XlsxError::InvalidFormat("workbook has no sheets".into()));
        }

        Ok(workbook)
    }
}

fn is_truthy(v: &str) -> bool {
    v == "1" || v.eq_ignore_ascii_case("true")
}

/// Resolve a relationship target to a path inside the archive.
///
/// Targets are relative to `xl/` unless they start with '/'.
fn resolve_part_path(target: &str) -> String {
    if let Some(stripped) = target.strip_prefix('/') {
        stripped.to_string()
    } else if target.starts_with("xl/") {
        target.to_string()
    } else {
        format!("xl/{}", target)
    }
}

/// Decode `_xHHHH_` escapes that encode characters illegal in XML text.
fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '_'
            && i + 6 < chars.len()
            && chars[i + 1] == 'x'
            && chars[i + 6] == '_'
            && chars[i + 2..i + 6].iter().all(|c| c.is_ascii_hexdigit())
        {
            let hex: String = chars[i + 2..i + 6].iter().collect();
            if let Some(c) = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                out.push(c);
                i += 7;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

// === sharedStrings.xml ===

fn read_shared_strings<R: Read>(reader: R) -> XlsxResult<Vec<String>> {
    let mut xml_reader = Reader::from_reader(BufReader::new(reader));
    let mut buf = Vec::new();

    let mut strings = Vec::new();
    let mut in_si = false;
    let mut in_t = false;
    let mut in_phonetic = false;
    let mut current = String::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"si" => {
                    in_si = true;
                    current.clear();
                }
                b"rPh" => in_phonetic = true,
                b"t" if in_si && !in_phonetic => in_t = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if e.name().as_ref() == b"si" {
                    strings.push(String::new());
                }
            }
            Ok(Event::Text(t)) if in_t => {
                current.push_str(&t.unescape().map_err(XlsxError::Xml)?);
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"t" => in_t = false,
                b"rPh" => in_phonetic = false,
                b"si" => {
                    in_si = false;
                    strings.push(decode_excel_escapes(&current));
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    debug!("read {} shared strings", strings.len());
    Ok(strings)
}

// === workbook.xml ===

struct SheetMeta {
    name: String,
    rel_id: String,
    hidden: bool,
}

struct WorkbookMeta {
    sheets: Vec<SheetMeta>,
    date_1904: bool,
    defined_names: Vec<DefinedName>,
}

fn read_workbook_xml<R: Read>(reader: R) -> XlsxResult<WorkbookMeta> {
    let mut xml_reader = Reader::from_reader(BufReader::new(reader));
    xml_reader.trim_text(true);
    let mut buf = Vec::new();

    let mut meta = WorkbookMeta {
        sheets: Vec::new(),
        date_1904: false,
        defined_names: Vec::new(),
    };

    let mut pending_name: Option<(String, Option<usize>, bool)> = None;
    let mut name_text = String::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.name().as_ref() == b"workbookPr" =>
            {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"date1904" {
                        if let Ok(v) = attr.unescape_value() {
                            meta.date_1904 = is_truthy(&v);
                        }
                    }
                }
            }

            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut rel_id = None;
                let mut hidden = false;
                for attr in e.attributes().flatten() {
                    let val = match attr.unescape_value() {
                        Ok(v) => v,
                        Err(_) => continue,
                    };
                    match attr.key.as_ref() {
                        b"name" => name = Some(val.to_string()),
                        b"r:id" => rel_id = Some(val.to_string()),
                        b"state" => hidden = val != "visible",
                        _ => {}
                    }
                }
                match (name, rel_id) {
                    (Some(name), Some(rel_id)) => meta.sheets.push(SheetMeta {
                        name,
                        rel_id,
                        hidden,
                    }),
                    _ => {
                        return Err(XlsxError::InvalidFormat(
                            "sheet entry missing name or relationship id".into(),
                        ))
                    }
                }
            }

            Ok(Event::Start(e)) if e.name().as_ref() == b"definedName" => {
                let mut name = String::new();
                let mut sheet_id = None;
                let mut hidden = false;
                for attr in e.attributes().flatten() {
                    let val = match attr.unescape_value() {
                        Ok(v) => v,
                        Err(_) => continue,
                    };
                    match attr.key.as_ref() {
                        b"name" => name = val.to_string(),
                        b"localSheetId" => sheet_id = val.trim().parse::<usize>().ok(),
                        b"hidden" => hidden = is_truthy(&val),
                        _ => {}
                    }
                }
                pending_name = Some((name, sheet_id, hidden));
                name_text.clear();
            }

            Ok(Event::Text(t)) if pending_name.is_some() => {
                name_text.push_str(&t.unescape().map_err(XlsxError::Xml)?);
            }

            Ok(Event::End(e)) if e.name().as_ref() == b"definedName" => {
                if let Some((name, sheet_id, hidden)) = pending_name.take() {
                    meta.defined_names.push(DefinedName {
                        name,
                        refers_to: name_text.clone(),
                        sheet_id,
                        hidden,
                    });
                }
            }

            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    if meta.sheets.is_empty() {
        return Err(XlsxError::InvalidFormat(
            "workbook.xml lists no sheets".into(),
        ));
    }

    Ok(meta)
}

// === workbook.xml.rels ===

fn read_workbook_rels<R: Read>(reader: R) -> XlsxResult<HashMap<String, String>> {
    let mut xml_reader = Reader::from_reader(BufReader::new(reader));
    xml_reader.trim_text(true);
    let mut buf = Vec::new();

    let mut rels = HashMap::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.name().as_ref() == b"Relationship" =>
            {
                let mut id = None;
                let mut target = None;
                let mut rel_type = String::new();
                for attr in e.attributes().flatten() {
                    let val = match attr.unescape_value() {
                        Ok(v) => v,
                        Err(_) => continue,
                    };
                    match attr.key.as_ref() {
                        b"Id" => id = Some(val.to_string()),
                        b"Target" => target = Some(val.to_string()),
                        b"Type" => rel_type = val.to_string(),
                        _ => {}
                    }
                }
                if rel_type.ends_with("/worksheet") {
                    if let (Some(id), Some(target)) = (id, target) {
                        rels.insert(id, target);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

// === worksheet XML ===

#[derive(Debug, Default)]
struct PendingCell {
    row: u32,
    col: u16,
    cell_type: Option<String>,
    style_idx: u32,
    value_text: String,
    has_value: bool,
    formula_text: Option<String>,
    inline_text: String,
    has_inline: bool,
}

fn read_sheet_xml<R: Read>(
    reader: R,
    sheet: &mut Worksheet,
    shared_strings: &[String],
    styles: &[Style],
) -> XlsxResult<()> {
    let mut xml_reader = Reader::from_reader(BufReader::new(reader));
    let mut buf = Vec::new();

    let mut last_row: Option<u32> = None;
    let mut current_row: u32 = 0;
    let mut next_col: u16 = 0;
    let mut pending: Option<PendingCell> = None;
    let mut in_v = false;
    let mut in_f = false;
    let mut in_is = false;
    let mut in_is_t = false;

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"row" => {
                    current_row = apply_row_attrs(&e, sheet, &mut last_row)?;
                    next_col = 0;
                }
                b"col" => apply_col_attrs(&e, sheet)?,
                b"c" => {
                    let cell = parse_cell_attrs(&e, current_row, next_col)?;
                    next_col = cell.col.saturating_add(1);
                    pending = Some(cell);
                }
                b"v" if pending.is_some() => in_v = true,
                b"f" if pending.is_some() => in_f = true,
                b"is" if pending.is_some() => in_is = true,
                b"t" if in_is => in_is_t = true,
                _ => {}
            },

            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"row" => {
                    current_row = apply_row_attrs(&e, sheet, &mut last_row)?;
                    next_col = 0;
                }
                b"col" => apply_col_attrs(&e, sheet)?,
                b"c" => {
                    let cell = parse_cell_attrs(&e, current_row, next_col)?;
                    next_col = cell.col.saturating_add(1);
                    finish_cell(cell, sheet, shared_strings, styles)?;
                }
                b"mergeCell" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"ref" {
                            if let Ok(v) = attr.unescape_value() {
                                let range = CellRange::parse(&v)?;
                                sheet.merge_cells(&range)?;
                            }
                        }
                    }
                }
                _ => {}
            },

            Ok(Event::Text(t)) => {
                if in_v || in_f || in_is_t {
                    let text = t.unescape().map_err(XlsxError::Xml)?;
                    if let Some(cell) = pending.as_mut() {
                        if in_f {
                            cell.formula_text
                                .get_or_insert_with(String::new)
                                .push_str(&text);
                        } else if in_v {
                            cell.value_text.push_str(&text);
                            cell.has_value = true;
                        } else {
                            cell.inline_text.push_str(&text);
                            cell.has_inline = true;
                        }
                    }
                }
            }

            Ok(Event::End(e)) => match e.name().as_ref() {
                b"v" => in_v = false,
                b"f" => in_f = false,
                b"t" => in_is_t = false,
                b"is" => in_is = false,
                b"c" => {
                    if let Some(cell) = pending.take() {
                        finish_cell(cell, sheet, shared_strings, styles)?;
                    }
                }
                _ => {}
            },

            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn apply_row_attrs(
    e: &BytesStart<'_>,
    sheet: &mut Worksheet,
    last_row: &mut Option<u32>,
) -> XlsxResult<u32> {
    let mut row_index = last_row.map(|r| r + 1).unwrap_or(0);
    let mut height: Option<f64> = None;
    let mut custom_height = false;
    let mut hidden = false;

    for attr in e.attributes().flatten() {
        let val = match attr.unescape_value() {
            Ok(v) => v,
            Err(_) => continue,
        };
        match attr.key.as_ref() {
            b"r" => {
                let r: u32 = val
                    .trim()
                    .parse()
                    .map_err(|_| XlsxError::Parse(format!("bad row index '{}'", val)))?;
                if r == 0 {
                    return Err(XlsxError::InvalidFormat("row index 0".into()));
                }
                row_index = r - 1;
            }
            b"ht" => height = val.trim().parse().ok(),
            b"customHeight" => custom_height = is_truthy(&val),
            b"hidden" => hidden = is_truthy(&val),
            _ => {}
        }
    }

    if custom_height {
        if let Some(h) = height {
            sheet.set_row_height(row_index, h);
        }
    }
    if hidden {
        sheet.set_row_hidden(row_index, true);
    }

    *last_row = Some(row_index);
    Ok(row_index)
}

fn apply_col_attrs(e: &BytesStart<'_>, sheet: &mut Worksheet) -> XlsxResult<()> {
    let mut min: Option<u32> = None;
    let mut max: Option<u32> = None;
    let mut width: Option<f64> = None;
    let mut hidden = false;

    for attr in e.attributes().flatten() {
        let val = match attr.unescape_value() {
            Ok(v) => v,
            Err(_) => continue,
        };
        match attr.key.as_ref() {
            b"min" => min = val.trim().parse().ok(),
            b"max" => max = val.trim().parse().ok(),
            b"width" => width = val.trim().parse().ok(),
            b"hidden" => hidden = is_truthy(&val),
            _ => {}
        }
    }

    let (Some(min), Some(max)) = (min, max) else {
        return Ok(());
    };
    if min == 0 || min > max {
        return Err(XlsxError::InvalidFormat(format!(
            "bad column range {}..{}",
            min, max
        )));
    }

    let last = max.min(facture_core::MAX_COLS as u32);
    for c in min..=last {
        let col = (c - 1) as u16;
        if let Some(w) = width {
            sheet.set_column_width(col, w);
        }
        if hidden {
            sheet.set_column_hidden(col, true);
        }
    }
    Ok(())
}

fn parse_cell_attrs(
    e: &BytesStart<'_>,
    current_row: u32,
    next_col: u16,
) -> XlsxResult<PendingCell> {
    let mut cell = PendingCell {
        row: current_row,
        col: next_col,
        ..Default::default()
    };

    for attr in e.attributes().flatten() {
        let val = match attr.unescape_value() {
            Ok(v) => v,
            Err(_) => continue,
        };
        match attr.key.as_ref() {
            b"r" => {
                let addr = CellAddress::parse(&val)?;
                cell.row = addr.row;
                cell.col = addr.col;
            }
            b"t" => cell.cell_type = Some(val.to_string()),
            b"s" => cell.style_idx = val.trim().parse().unwrap_or(0),
            _ => {}
        }
    }

    Ok(cell)
}

fn finish_cell(
    cell: PendingCell,
    sheet: &mut Worksheet,
    shared_strings: &[String],
    styles: &[Style],
) -> XlsxResult<()> {
    if let Some(value) = build_cell_value(&cell, shared_strings)? {
        sheet.set_value_at(cell.row, cell.col, value)?;
    }

    if cell.style_idx != 0 {
        let style = styles.get(cell.style_idx as usize).ok_or_else(|| {
            XlsxError::InvalidFormat(format!("style index {} out of range", cell.style_idx))
        })?;
        sheet.set_style_at(cell.row, cell.col, style)?;
    }

    Ok(())
}

fn build_cell_value(
    cell: &PendingCell,
    shared_strings: &[String],
) -> XlsxResult<Option<CellValue>> {
    if let Some(formula) = &cell.formula_text {
        if !formula.is_empty() {
            let text = formula.strip_prefix('=').unwrap_or(formula);
            let f = if cell.has_value {
                let cached = parse_cached_value(cell.cell_type.as_deref(), &cell.value_text);
                Formula::with_cached_value(text, cached)
            } else {
                Formula::new(text)
            };
            return Ok(Some(CellValue::Formula(f)));
        }
    }

    if cell.has_inline {
        return Ok(Some(CellValue::String(decode_excel_escapes(
            &cell.inline_text,
        ))));
    }

    if !cell.has_value {
        return Ok(None);
    }

    let v = &cell.value_text;
    let value = match cell.cell_type.as_deref() {
        Some("s") => {
            let idx: usize = v
                .trim()
                .parse()
                .map_err(|_| XlsxError::Parse(format!("bad shared string index '{}'", v)))?;
            let text = shared_strings.get(idx).ok_or_else(|| {
                XlsxError::InvalidFormat(format!("shared string index {} out of range", idx))
            })?;
            CellValue::String(text.clone())
        }
        Some("b") => CellValue::Bool(v.trim() != "0"),
        Some("e") => match CellError::parse(v.trim()) {
            Some(err) => CellValue::Error(err),
            None => CellValue::String(v.clone()),
        },
        Some("str") | Some("inlineStr") => CellValue::String(decode_excel_escapes(v)),
        _ => match v.trim().parse::<f64>() {
            Ok(n) => CellValue::Number(n),
            Err(_) => CellValue::String(v.clone()),
        },
    };
    Ok(Some(value))
}

/// Cached formula result, typed by the cell's `t` attribute.
fn parse_cached_value(cell_type: Option<&str>, text: &str) -> CellValue {
    match cell_type {
        Some("str") => CellValue::String(decode_excel_escapes(text)),
        Some("b") => CellValue::Bool(text.trim() != "0"),
        Some("e") => match CellError::parse(text.trim()) {
            Some(err) => CellValue::Error(err),
            None => CellValue::String(text.to_string()),
        },
        _ => match text.trim().parse::<f64>() {
            Ok(n) => CellValue::Number(n),
            Err(_) => CellValue::String(text.to_string()),
        },
    }
}
