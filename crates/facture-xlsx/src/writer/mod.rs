//! Writing a [`Workbook`] to the .xlsx container format
//!
//! Strings are written inline rather than through a shared string table;
//! every reader in circulation accepts both forms and inline strings keep
//! the writer single-pass.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use log::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{XlsxError, XlsxResult};
use crate::styles::XlsxStyleTable;
use facture_core::{CellAddress, CellValue, Workbook, Worksheet};

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

/// Writes workbooks to the 2007+ zip container format.
pub struct XlsxWriter;

impl XlsxWriter {
    pub fn write_file<P: AsRef<Path>>(workbook: &Workbook, path: P) -> XlsxResult<()> {
        let file = File::create(path.as_ref())?;
        Self::write(workbook, BufWriter::new(file))
    }

    pub fn write<W: Write + Seek>(workbook: &Workbook, writer: W) -> XlsxResult<()> {
        if workbook.is_empty() {
            return Err(XlsxError::InvalidFormat("workbook has no sheets".into()));
        }

        let style_table = XlsxStyleTable::build(workbook);

        let mut zip = ZipWriter::new(writer);
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(content_types_xml(workbook.sheet_count()).as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(ROOT_RELS.as_bytes())?;

        zip.start_file("xl/workbook.xml", options)?;
        zip.write_all(workbook_xml(workbook).as_bytes())?;

        zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        zip.write_all(workbook_rels_xml(workbook.sheet_count()).as_bytes())?;

        zip.start_file("xl/styles.xml", options)?;
        zip.write_all(style_table.to_styles_xml().as_bytes())?;

        for (idx, sheet) in workbook.worksheets().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", idx + 1), options)?;
            zip.write_all(sheet_xml(sheet, idx, &style_table).as_bytes())?;
        }

        zip.finish()?;
        debug!("wrote workbook with {} sheets", workbook.sheet_count());
        Ok(())
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_xml_attr(s: &str) -> String {
    escape_xml(s).replace('"', "&quot;").replace('\'', "&apos;")
}

fn content_types_xml(sheet_count: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    );
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            "\n  <Override PartName=\"/xl/worksheets/sheet{}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>",
            i
        ));
    }
    xml.push_str(
        r#"
  <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
</Types>"#,
    );
    xml
}

fn workbook_xml(workbook: &Workbook) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );

    if workbook.settings().date_1904 {
        xml.push_str("\n  <workbookPr date1904=\"1\"/>");
    }

    xml.push_str("\n  <sheets>");
    for (idx, sheet) in workbook.worksheets().enumerate() {
        let state = if sheet.is_visible() {
            String::new()
        } else {
            " state=\"hidden\"".to_string()
        };
        xml.push_str(&format!(
            "\n    <sheet name=\"{}\" sheetId=\"{}\" r:id=\"rId{}\"{}/>",
            escape_xml_attr(sheet.name()),
            idx + 1,
            idx + 1,
            state
        ));
    }
    xml.push_str("\n  </sheets>");

    if !workbook.defined_names().is_empty() {
        xml.push_str("\n  <definedNames>");
        for dn in workbook.defined_names() {
            let mut attrs = format!(" name=\"{}\"", escape_xml_attr(&dn.name));
            if let Some(sheet_id) = dn.sheet_id {
                attrs.push_str(&format!(" localSheetId=\"{}\"", sheet_id));
            }
            if dn.hidden {
                attrs.push_str(" hidden=\"1\"");
            }
            xml.push_str(&format!(
                "\n    <definedName{}>{}</definedName>",
                attrs,
                escape_xml(&dn.refers_to)
            ));
        }
        xml.push_str("\n  </definedNames>");
    }

    xml.push_str("\n</workbook>");
    xml
}

fn workbook_rels_xml(sheet_count: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            "\n  <Relationship Id=\"rId{}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet{}.xml\"/>",
            i, i
        ));
    }
    xml.push_str(&format!(
        "\n  <Relationship Id=\"rId{}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"/>",
        sheet_count + 1
    ));
    xml.push_str("\n</Relationships>");
    xml
}

fn sheet_xml(sheet: &Worksheet, sheet_index: usize, style_table: &XlsxStyleTable) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    );

    xml.push_str(&cols_xml(sheet));

    xml.push_str("\n  <sheetData>");

    let mut rows: BTreeSet<u32> = sheet.row_indices().collect();
    rows.extend(sheet.custom_row_heights().keys().copied());
    rows.extend(sheet.hidden_rows().keys().copied());

    for row in rows {
        let mut attrs = format!(" r=\"{}\"", row + 1);
        if let Some(height) = sheet.custom_row_heights().get(&row) {
            attrs.push_str(&format!(" ht=\"{}\" customHeight=\"1\"", height));
        }
        if sheet.is_row_hidden(row) {
            attrs.push_str(" hidden=\"1\"");
        }

        let cells: Vec<String> = sheet
            .iter_row(row)
            .map(|(col, cell)| {
                cell_xml(
                    row,
                    col,
                    &cell.value,
                    style_table.xf_id_for(sheet_index, cell.style_index),
                )
            })
            .collect();

        if cells.is_empty() {
            xml.push_str(&format!("\n    <row{}/>", attrs));
        } else {
            xml.push_str(&format!("\n    <row{}>", attrs));
            for cell in cells {
                xml.push_str("\n      ");
                xml.push_str(&cell);
            }
            xml.push_str("\n    </row>");
        }
    }

    xml.push_str("\n  </sheetData>");

    let merged = sheet.merged_regions();
    if !merged.is_empty() {
        xml.push_str(&format!("\n  <mergeCells count=\"{}\">", merged.len()));
        for region in merged {
            xml.push_str(&format!(
                "\n    <mergeCell ref=\"{}\"/>",
                region.to_a1_string()
            ));
        }
        xml.push_str("\n  </mergeCells>");
    }

    xml.push_str("\n</worksheet>");
    xml
}

fn cols_xml(sheet: &Worksheet) -> String {
    let mut cols: BTreeSet<u16> = sheet.custom_column_widths().keys().copied().collect();
    cols.extend(sheet.hidden_columns().keys().copied());
    if cols.is_empty() {
        return String::new();
    }

    let mut xml = String::from("\n  <cols>");
    for col in cols {
        let mut attrs = format!(" min=\"{}\" max=\"{}\"", col + 1, col + 1);
        if let Some(width) = sheet.custom_column_widths().get(&col) {
            attrs.push_str(&format!(" width=\"{}\" customWidth=\"1\"", width));
        }
        if sheet.is_column_hidden(col) {
            attrs.push_str(" hidden=\"1\"");
        }
        xml.push_str(&format!("\n    <col{}/>", attrs));
    }
    xml.push_str("\n  </cols>");
    xml
}

fn t_element(text: &str) -> String {
    let escaped = escape_xml(text);
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        format!("<t xml:space=\"preserve\">{}</t>", escaped)
    } else {
        format!("<t>{}</t>", escaped)
    }
}

fn cell_xml(row: u32, col: u16, value: &CellValue, xf_id: u32) -> String {
    let r = CellAddress { row, col }.to_a1_string();
    let style_attr = if xf_id != 0 {
        format!(" s=\"{}\"", xf_id)
    } else {
        String::new()
    };

    match value {
        CellValue::Empty => format!("<c r=\"{}\"{}/>", r, style_attr),
        CellValue::Number(n) => {
            format!("<c r=\"{}\"{}><v>{}</v></c>", r, style_attr, n)
        }
        CellValue::Bool(b) => format!(
            "<c r=\"{}\"{} t=\"b\"><v>{}</v></c>",
            r,
            style_attr,
            if *b { 1 } else { 0 }
        ),
        CellValue::String(s) => format!(
            "<c r=\"{}\"{} t=\"inlineStr\"><is>{}</is></c>",
            r,
            style_attr,
            t_element(s)
        ),
        CellValue::SharedString(s) => format!(
            "<c r=\"{}\"{} t=\"inlineStr\"><is>{}</is></c>",
            r,
            style_attr,
            t_element(s.as_str())
        ),
        CellValue::Error(e) => format!(
            "<c r=\"{}\"{} t=\"e\"><v>{}</v></c>",
            r,
            style_attr,
            e.as_str()
        ),
        CellValue::Formula(f) => {
            let formula = escape_xml(&f.text);
            match f.cached_value.as_deref() {
                Some(CellValue::Number(n)) => format!(
                    "<c r=\"{}\"{}><f>{}</f><v>{}</v></c>",
                    r, style_attr, formula, n
                ),
                Some(CellValue::Bool(b)) => format!(
                    "<c r=\"{}\"{} t=\"b\"><f>{}</f><v>{}</v></c>",
                    r,
                    style_attr,
                    formula,
                    if *b { 1 } else { 0 }
                ),
                Some(CellValue::Error(e)) => format!(
                    "<c r=\"{}\"{} t=\"e\"><f>{}</f><v>{}</v></c>",
                    r,
                    style_attr,
                    formula,
                    e.as_str()
                ),
                Some(CellValue::String(s)) => format!(
                    "<c r=\"{}\"{} t=\"str\"><f>{}</f><v>{}</v></c>",
                    r,
                    style_attr,
                    formula,
                    escape_xml(s)
                ),
                Some(CellValue::SharedString(s)) => format!(
                    "<c r=\"{}\"{} t=\"str\"><f>{}</f><v>{}</v></c>",
                    r,
                    style_attr,
                    formula,
                    escape_xml(s.as_str())
                ),
                _ => format!("<c r=\"{}\"{}><f>{}</f></c>", r, style_attr, formula),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::XlsxReader;
    use facture_core::style::Style;
    use facture_core::{CellError, CellRange, Formula};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn round_trip(workbook: &Workbook) -> Workbook {
        let mut buf = Cursor::new(Vec::new());
        XlsxWriter::write(workbook, &mut buf).unwrap();
        buf.set_position(0);
        XlsxReader::read(buf).unwrap()
    }

    #[test]
    fn xml_escaping() {
        assert_eq!(escape_xml("a<b&c>d"), "a&lt;b&amp;c&gt;d");
        assert_eq!(escape_xml_attr(r#"say "hi""#), "say &quot;hi&quot;");
        assert_eq!(escape_xml("შპს მაგალითი"), "შპს მაგალითი");
    }

    #[test]
    fn padded_strings_get_preserve_attribute() {
        assert_eq!(t_element("plain"), "<t>plain</t>");
        assert_eq!(
            t_element(" padded "),
            "<t xml:space=\"preserve\"> padded </t>"
        );
    }

    #[test]
    fn empty_workbook_is_rejected() {
        let wb = Workbook::empty();
        let err = XlsxWriter::write(&wb, Cursor::new(Vec::new())).unwrap_err();
        assert!(matches!(err, XlsxError::InvalidFormat(_)));
    }

    #[test]
    fn values_survive_round_trip() {
        let mut wb = Workbook::new();
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_value("A1", "Company & Sons <Ltd>").unwrap();
        sheet.set_value("A2", "შპს ჭიქები").unwrap();
        sheet.set_value("B1", 1042.0).unwrap();
        sheet.set_value("B2", 2.5).unwrap();
        sheet.set_value("C1", true).unwrap();
        sheet.set_value("C2", CellError::Ref).unwrap();

        let read = round_trip(&wb);
        let sheet = read.worksheet(0).unwrap();
        assert_eq!(
            sheet.value("A1").unwrap().as_str(),
            Some("Company & Sons <Ltd>")
        );
        assert_eq!(sheet.value("A2").unwrap().as_str(), Some("შპს ჭიქები"));
        assert_eq!(sheet.value("B1").unwrap().as_number(), Some(1042.0));
        assert_eq!(sheet.value("B2").unwrap().as_number(), Some(2.5));
        assert_eq!(sheet.value("C1").unwrap(), CellValue::Bool(true));
        assert_eq!(sheet.value("C2").unwrap(), CellValue::Error(CellError::Ref));
    }

    #[test]
    fn formulas_keep_text_and_cached_result() {
        let mut wb = Workbook::new();
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_value("B17", 5.0).unwrap();
        sheet.set_value("C17", 5.0).unwrap();
        sheet
            .set_value_at(
                16,
                3,
                CellValue::Formula(Formula::with_cached_value(
                    "B17*C17",
                    CellValue::Number(25.0),
                )),
            )
            .unwrap();
        sheet.set_formula("D36", "=SUM(D17:D24)").unwrap();

        let read = round_trip(&wb);
        let sheet = read.worksheet(0).unwrap();

        match sheet.value("D17").unwrap() {
            CellValue::Formula(f) => {
                assert_eq!(f.text, "B17*C17");
                assert_eq!(f.cached_value.as_deref(), Some(&CellValue::Number(25.0)));
            }
            other => panic!("expected formula, got {:?}", other),
        }
        match sheet.value("D36").unwrap() {
            CellValue::Formula(f) => {
                assert_eq!(f.text, "SUM(D17:D24)");
                assert_eq!(f.cached_value, None);
            }
            other => panic!("expected formula, got {:?}", other),
        }
    }

    #[test]
    fn styles_dimensions_and_merges_survive() {
        let mut wb = Workbook::new();
        let sheet = wb.worksheet_mut(0).unwrap();
        let header = Style::new().bold(true).font_size(14.0);
        sheet.set_value("A1", "Header").unwrap();
        sheet.set_style("A1", &header).unwrap();
        sheet.set_row_height(0, 24.75);
        sheet.set_column_width(0, 32.5);
        sheet.set_column_hidden(2, true);
        sheet
            .merge_cells(&CellRange::parse("A1:C1").unwrap())
            .unwrap();

        let read = round_trip(&wb);
        let sheet = read.worksheet(0).unwrap();

        let style = sheet.style("A1").unwrap().cloned().unwrap_or_default();
        assert!(style.font.bold);
        assert_eq!(style.font.size, 14.0);

        assert_eq!(sheet.row_height(0), 24.75);
        assert_eq!(sheet.column_width(0), 32.5);
        assert!(sheet.is_column_hidden(2));
        assert_eq!(sheet.merged_regions().len(), 1);
        assert_eq!(sheet.merged_regions()[0].to_a1_string(), "A1:C1");
    }

    #[test]
    fn workbook_level_settings_survive() {
        let mut wb = Workbook::new();
        wb.settings_mut().date_1904 = true;
        wb.add_worksheet_with_name("Hidden").unwrap();
        wb.worksheet_mut(1).unwrap().set_visible(false);
        wb.worksheet_mut(1).unwrap().set_value("A1", 1.0).unwrap();
        wb.add_defined_name(facture_core::DefinedName {
            name: "Total".into(),
            refers_to: "Sheet1!$D$36".into(),
            sheet_id: None,
            hidden: false,
        });

        let read = round_trip(&wb);
        assert!(read.settings().date_1904);
        assert_eq!(read.sheet_count(), 2);
        assert!(!read.worksheet(1).unwrap().is_visible());
        assert_eq!(
            read.defined_name("Total").unwrap().refers_to,
            "Sheet1!$D$36"
        );
    }
}
