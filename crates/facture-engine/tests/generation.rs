//! The full generation flow against template files on disk.

use std::collections::BTreeMap;
use std::fs;

use facture_core::style::{NumberFormat, Style};
use facture_core::{CellRange, CellValue, Workbook};
use facture_engine::{
    generate_batch, generate_invoice, BatchJob, ChangeSet, EngineError, FieldValue, InvoiceItem,
    InvoicePayload, NumberInput, OutputWriter, Template,
};
use facture_xlsx::{XlsxReader, XlsxWriter};

/// A stripped-down version of the invoice template: merged Georgian
/// title, labelled item table, money formats on the amount columns.
fn build_template() -> Workbook {
    let mut wb = Workbook::new();
    wb.rename_worksheet(0, "Invoice").unwrap();
    let sheet = wb.worksheet_mut(0).unwrap();

    sheet.set_value("A1", "ანგარიშ-ფაქტურა").unwrap();
    sheet
        .set_style("A1", &Style::new().bold(true).font_size(16.0))
        .unwrap();
    sheet
        .merge_cells(&CellRange::parse("A1:D1").unwrap())
        .unwrap();

    sheet.set_value("C4", "თარიღი").unwrap();
    sheet.set_value("C5", "ინვოისი №").unwrap();
    sheet
        .set_style("D4", &Style::new().number_format("dd/mm/yyyy"))
        .unwrap();

    sheet.set_value("A16", "დასახელება").unwrap();
    sheet.set_value("D16", "თანხა").unwrap();

    let money = Style::new().number_format("#,##0.00");
    for row in 17..=24 {
        sheet.set_style(&format!("C{}", row), &money).unwrap();
        sheet.set_style(&format!("D{}", row), &money).unwrap();
    }

    sheet.set_value("C36", "სულ:").unwrap();
    sheet.set_formula("D36", "=SUM(D17:D24)").unwrap();
    wb
}

fn payload() -> InvoicePayload {
    InvoicePayload {
        company_name: "შპს მაგალითი".into(),
        sakadastro: "405123456".into(),
        address: "თბილისი, ჭავჭავაძის 12".into(),
        invoice_number: "1042".into(),
        items: vec![
            InvoiceItem {
                item_type: "მომსახურება".into(),
                quantity: Some(NumberInput::Number(2.0)),
                price: Some(NumberInput::Number(10.0)),
            },
            InvoiceItem {
                item_type: "Support".into(),
                quantity: Some(NumberInput::Text("1".into())),
                price: Some(NumberInput::Text("5".into())),
            },
        ],
    }
}

#[test]
fn invoice_flows_from_template_file_to_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let template_path = dir.path().join("template.xlsx");
    XlsxWriter::write_file(&build_template(), &template_path).unwrap();
    let template_bytes = fs::read(&template_path).unwrap();

    let template = Template::open(&template_path).unwrap();
    let writer = OutputWriter::new(dir.path().join("uploads")).guard_template(&template_path);

    let mut extra = ChangeSet::new();
    extra.set("f2", FieldValue::parse("noted")).unwrap();

    let generated = generate_invoice(&template, &payload(), &extra).unwrap();
    let written = writer.write(&generated, "ინვოისი 1042").unwrap();
    assert_eq!(
        written,
        dir.path().join("uploads").join("ინვოისი_1042.xlsx")
    );

    let read = XlsxReader::read_file(&written).unwrap();
    let sheet = read.worksheet(0).unwrap();

    // Header block
    assert_eq!(sheet.value("A12").unwrap().as_str(), Some("შპს მაგალითი"));
    assert_eq!(sheet.value("A13").unwrap().as_str(), Some("405123456"));
    assert_eq!(sheet.value("D5").unwrap().as_str(), Some("1042"));
    assert!(sheet.value("D4").unwrap().as_number().is_some());

    // Item block with cached products and the computed total
    assert_eq!(sheet.value("A17").unwrap().as_str(), Some("მომსახურება"));
    assert_eq!(sheet.value("B17").unwrap().as_number(), Some(2.0));
    match sheet.value("D17").unwrap() {
        CellValue::Formula(f) => {
            assert_eq!(f.text, "B17*C17");
            assert_eq!(f.cached_value.as_deref(), Some(&CellValue::Number(20.0)));
        }
        other => panic!("expected formula in D17, got {:?}", other),
    }
    assert_eq!(sheet.value("D36").unwrap().as_number(), Some(25.0));

    // The free-form change and the template's own content
    assert_eq!(sheet.value("F2").unwrap().as_str(), Some("noted"));
    assert_eq!(sheet.value("A1").unwrap().as_str(), Some("ანგარიშ-ფაქტურა"));
    assert_eq!(sheet.value("C36").unwrap().as_str(), Some("სულ:"));
    assert_eq!(sheet.merged_regions()[0].to_a1_string(), "A1:D1");

    // Template styles survive both the fill and the rewrite
    let money = sheet.style("C17").unwrap().unwrap();
    assert_eq!(money.number_format, NumberFormat::Custom("#,##0.00".into()));
    let date = sheet.style("D4").unwrap().unwrap();
    assert_eq!(date.number_format, NumberFormat::Custom("dd/mm/yyyy".into()));

    // The template file itself is byte-identical
    assert_eq!(fs::read(&template_path).unwrap(), template_bytes);
}

#[test]
fn untouched_cells_match_the_template_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let template_path = dir.path().join("template.xlsx");
    XlsxWriter::write_file(&build_template(), &template_path).unwrap();

    let template = Template::open(&template_path).unwrap();
    let mut changes = ChangeSet::new();
    changes.set("A2", FieldValue::parse("John Doe")).unwrap();
    changes.set("B2", FieldValue::parse("5000")).unwrap();

    let generated = template.apply(&changes).unwrap();
    let out_path = OutputWriter::new(dir.path().join("out"))
        .write(&generated, "copy")
        .unwrap();
    let read = XlsxReader::read_file(&out_path).unwrap();

    let before = template.workbook().worksheet(0).unwrap();
    let after = read.worksheet(0).unwrap();
    assert_eq!(after.value("A2").unwrap().as_str(), Some("John Doe"));
    assert_eq!(after.value("B2").unwrap(), CellValue::Number(5000.0));

    for (row, col, cell) in before.iter_cells() {
        if (row, col) == (1, 0) || (row, col) == (1, 1) {
            continue;
        }
        assert_eq!(
            after.value_at(row, col).to_display_string(),
            cell.value.to_display_string(),
            "cell ({}, {}) drifted through generation",
            row,
            col
        );
        assert_eq!(
            after.style_at(row, col),
            before.style_at(row, col),
            "style of ({}, {}) drifted through generation",
            row,
            col
        );
    }
}

#[test]
fn batch_jobs_are_isolated_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let template_path = dir.path().join("template.xlsx");
    XlsxWriter::write_file(&build_template(), &template_path).unwrap();

    let template = Template::open(&template_path).unwrap();
    let writer = OutputWriter::new(dir.path().join("uploads")).guard_template(&template_path);

    let invoice_job = BatchJob {
        output_name: "acme".into(),
        invoice: Some(payload()),
        changes: BTreeMap::new(),
    };
    let broken_job = BatchJob {
        output_name: "broken".into(),
        invoice: Some(InvoicePayload::default()),
        changes: BTreeMap::new(),
    };
    let raw_job = BatchJob {
        output_name: "raw".into(),
        invoice: None,
        changes: [("A2".to_string(), FieldValue::Integer(7))].into(),
    };

    let report = generate_batch(&template, &writer, &[invoice_job, broken_job, raw_job]);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    assert!(matches!(
        report.outcomes()[1].result,
        Err(EngineError::Validation(_))
    ));

    let acme = XlsxReader::read_file(dir.path().join("uploads/acme.xlsx")).unwrap();
    assert_eq!(
        acme.worksheet(0).unwrap().value("D36").unwrap().as_number(),
        Some(25.0)
    );
    assert!(!dir.path().join("uploads/broken.xlsx").exists());

    let raw = XlsxReader::read_file(dir.path().join("uploads/raw.xlsx")).unwrap();
    let raw_sheet = raw.worksheet(0).unwrap();
    assert_eq!(raw_sheet.value("A2").unwrap(), CellValue::Number(7.0));
    // A raw-changes job leaves the invoice block alone
    match raw_sheet.value("D36").unwrap() {
        CellValue::Formula(f) => assert_eq!(f.text, "SUM(D17:D24)"),
        other => panic!("expected the template formula in D36, got {:?}", other),
    }
}

#[test]
fn unsupported_template_formats_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("template.csv");
    fs::write(&path, "a,b,c\n").unwrap();

    let err = Template::open(&path).unwrap_err();
    match err {
        EngineError::Template { message, .. } => {
            assert!(message.contains("unsupported"), "message was: {message}")
        }
        other => panic!("expected a template error, got {:?}", other),
    }
}
