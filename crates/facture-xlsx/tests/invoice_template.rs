//! File-level round trips through a template shaped like a real invoice.

use facture_core::style::{Border, BorderEdge, Color, NumberFormat, Style};
use facture_core::{CellRange, CellValue, Formula, Workbook};
use facture_xlsx::{XlsxReader, XlsxWriter};

/// A stripped-down version of the invoice template this tooling exists for:
/// merged title, labelled fields, an item table with row formulas, and a
/// grand total under the table.
fn build_template() -> Workbook {
    let mut wb = Workbook::new();
    wb.rename_worksheet(0, "Invoice").unwrap();
    let sheet = wb.worksheet_mut(0).unwrap();

    let title = Style::new()
        .bold(true)
        .font_size(16.0)
        .font_name("Sylfaen");
    sheet.set_value("A1", "ანგარიშ-ფაქტურა").unwrap();
    sheet.set_style("A1", &title).unwrap();
    sheet.merge_cells(&CellRange::parse("A1:D1").unwrap()).unwrap();
    sheet.set_row_height(0, 28.5);

    sheet.set_value("C5", "ინვოისი №").unwrap();
    sheet.set_value("C4", "თარიღი").unwrap();

    let label = Style::new().bold(true);
    for addr in ["A11", "A16", "B16", "C16", "D16"] {
        sheet.set_style(addr, &label).unwrap();
    }
    sheet.set_value("A16", "დასახელება").unwrap();
    sheet.set_value("B16", "რაოდენობა").unwrap();
    sheet.set_value("C16", "ფასი").unwrap();
    sheet.set_value("D16", "თანხა").unwrap();

    let money = Style::new().number_format("#,##0.00");
    let boxed = Style::new().border(Border::all(BorderEdge::thin()));
    for row in 17..=24 {
        sheet.set_style(&format!("C{}", row), &money).unwrap();
        sheet.set_style(&format!("D{}", row), &boxed).unwrap();
    }

    sheet.set_value("C36", "სულ:").unwrap();
    sheet.set_formula("D36", "=SUM(D17:D24)").unwrap();
    sheet
        .set_style("D36", &Style::new().bold(true).number_format("#,##0.00"))
        .unwrap();

    sheet.set_column_width(0, 36.0);
    sheet.set_column_width(3, 14.0);

    wb
}

#[test]
fn template_survives_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("template.xlsx");

    let original = build_template();
    XlsxWriter::write_file(&original, &path).unwrap();

    let read = XlsxReader::read_file(&path).unwrap();
    assert_eq!(read.sheet_count(), 1);
    let sheet = read.worksheet(0).unwrap();
    assert_eq!(sheet.name(), "Invoice");

    assert_eq!(
        sheet.value("A1").unwrap().as_str(),
        Some("ანგარიშ-ფაქტურა")
    );
    let title = sheet.style("A1").unwrap().unwrap();
    assert!(title.font.bold);
    assert_eq!(title.font.size, 16.0);
    assert_eq!(title.font.name, "Sylfaen");

    assert_eq!(sheet.merged_regions().len(), 1);
    assert_eq!(sheet.merged_regions()[0].to_a1_string(), "A1:D1");
    assert_eq!(sheet.row_height(0), 28.5);
    assert_eq!(sheet.column_width(0), 36.0);

    // Style-only cells in the item table must still be there
    let money = sheet.style("C20").unwrap().unwrap();
    assert_eq!(money.number_format, NumberFormat::Custom("#,##0.00".into()));
    assert!(sheet.value("C20").unwrap().is_empty());

    let boxed = sheet.style("D20").unwrap().unwrap();
    assert_eq!(
        boxed.border.left,
        Some(BorderEdge {
            style: facture_core::style::LineStyle::Thin,
            color: Color::Auto
        })
    );

    match sheet.value("D36").unwrap() {
        CellValue::Formula(f) => assert_eq!(f.text, "SUM(D17:D24)"),
        other => panic!("expected formula in D36, got {:?}", other),
    }
}

#[test]
fn filled_invoice_round_trips_with_cached_totals() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("invoice.xlsx");

    let mut wb = build_template();
    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_value("A12", "შპს მაგალითი").unwrap();
    sheet.set_value("A13", "405123456").unwrap();
    sheet.set_value("D5", 1042.0).unwrap();

    sheet.set_value("A17", "მომსახურება").unwrap();
    sheet.set_value("B17", 2.0).unwrap();
    sheet.set_value("C17", 7.5).unwrap();
    sheet
        .set_value_at(
            16,
            3,
            CellValue::Formula(Formula::with_cached_value(
                "B17*C17",
                CellValue::Number(15.0),
            )),
        )
        .unwrap();
    sheet
        .set_value_at(
            35,
            3,
            CellValue::Formula(Formula::with_cached_value(
                "SUM(D17:D24)",
                CellValue::Number(15.0),
            )),
        )
        .unwrap();

    XlsxWriter::write_file(&wb, &path).unwrap();
    let read = XlsxReader::read_file(&path).unwrap();
    let sheet = read.worksheet(0).unwrap();

    assert_eq!(sheet.value("A12").unwrap().as_str(), Some("შპს მაგალითი"));
    assert_eq!(sheet.value("B17").unwrap().as_number(), Some(2.0));
    // The total reads back as a number without evaluating anything
    assert_eq!(sheet.value("D36").unwrap().as_number(), Some(15.0));
    match sheet.value("D36").unwrap() {
        CellValue::Formula(f) => assert_eq!(f.text, "SUM(D17:D24)"),
        other => panic!("expected formula in D36, got {:?}", other),
    }

    // Labels untouched by the fill are still in place
    assert_eq!(sheet.value("C36").unwrap().as_str(), Some("სულ:"));
}

#[test]
fn overwriting_and_rereading_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stable.xlsx");

    let wb = build_template();
    XlsxWriter::write_file(&wb, &path).unwrap();
    let first = XlsxReader::read_file(&path).unwrap();

    XlsxWriter::write_file(&first, &path).unwrap();
    let second = XlsxReader::read_file(&path).unwrap();

    let a = first.worksheet(0).unwrap();
    let b = second.worksheet(0).unwrap();
    assert_eq!(a.cell_count(), b.cell_count());
    for (row, col, cell) in a.iter_cells() {
        assert_eq!(
            b.value_at(row, col).to_display_string(),
            cell.value.to_display_string(),
            "cell ({}, {}) drifted between writes",
            row,
            col
        );
    }
    assert_eq!(a.merged_regions(), b.merged_regions());
}
