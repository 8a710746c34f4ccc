//! Invoice payloads and the fixed template layout
//!
//! The template dedicates known cells to the invoice header and an
//! eight-row block to line items. Generation stamps the payload into
//! those cells on a fresh copy of the template; everything else on the
//! sheet is the template's own content.

use chrono::Local;
use facture_core::dates::datetime_to_serial;
use facture_core::{CellValue, Formula, Worksheet};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::changes::ChangeSet;
use crate::error::{EngineError, EngineResult};
use crate::template::{GeneratedWorkbook, Template};

// Fixed header cells of the invoice sheet
const CELL_DATE: &str = "D4";
const CELL_INVOICE_NUMBER: &str = "D5";
const CELL_COMPANY_NAME: &str = "A12";
const CELL_SAKADASTRO: &str = "A13";
const CELL_ADDRESS: &str = "A14";
/// Summary cell receiving the computed total
const CELL_TOTAL: &str = "D36";
/// Line items fill rows 17 to 24, one item per row (1-based)
const ITEM_FIRST_ROW: u32 = 17;
const ITEM_ROWS: usize = 8;

/// A numeric form field that may arrive as a JSON number or a string;
/// browser forms send both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum NumberInput {
    Number(f64),
    Text(String),
}

/// One line item of an invoice. An empty `type` marks the item as
/// unused; empty quantity or price leaves the cell blank.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InvoiceItem {
    #[serde(rename = "type", default)]
    pub item_type: String,
    #[serde(default)]
    pub quantity: Option<NumberInput>,
    #[serde(default)]
    pub price: Option<NumberInput>,
}

/// A full invoice submission: four required header fields plus line
/// items.
///
/// Every field defaults so a partial JSON body deserializes and fails
/// validation with a readable message instead of a serde error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InvoicePayload {
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub sakadastro: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub invoice_number: String,
    #[serde(default)]
    pub items: Vec<InvoiceItem>,
}

#[derive(Debug, Clone, PartialEq)]
struct ResolvedItem {
    item_type: String,
    quantity: Option<f64>,
    price: Option<f64>,
}

impl InvoicePayload {
    /// Check the required header fields and coerce item amounts. Runs
    /// before any workbook work; items with an empty `type` are
    /// dropped.
    fn resolve_items(&self) -> EngineResult<Vec<ResolvedItem>> {
        let required = [
            &self.company_name,
            &self.sakadastro,
            &self.address,
            &self.invoice_number,
        ];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err(EngineError::Validation(
                "All required fields must be filled".into(),
            ));
        }

        let mut resolved = Vec::new();
        for item in &self.items {
            if item.item_type.is_empty() {
                continue;
            }
            resolved.push(ResolvedItem {
                item_type: item.item_type.clone(),
                quantity: resolve_amount(&item.quantity, &item.item_type)?,
                price: resolve_amount(&item.price, &item.item_type)?,
            });
        }
        Ok(resolved)
    }
}

/// Empty input is "leave the cell blank"; anything else must be a
/// finite number.
fn resolve_amount(input: &Option<NumberInput>, item_type: &str) -> EngineResult<Option<f64>> {
    let invalid =
        || EngineError::Validation(format!("Invalid quantity or price for item: {}", item_type));
    match input {
        None => Ok(None),
        Some(NumberInput::Number(n)) if n.is_finite() => Ok(Some(*n)),
        Some(NumberInput::Number(_)) => Err(invalid()),
        Some(NumberInput::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            match s.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(Some(n)),
                _ => Err(invalid()),
            }
        }
    }
}

/// Fill a copy of the template with an invoice.
///
/// Header fields land in A12/A13/A14/D5 and the generation date in D4
/// as a date serial, so the template's date style formats it. Items
/// fill rows 17-24 with a `B{row}*C{row}` product formula per row, and
/// D36 receives the computed total. `extra` cell writes are applied
/// last and may override any of these.
pub fn generate_invoice(
    template: &Template,
    payload: &InvoicePayload,
    extra: &ChangeSet,
) -> EngineResult<GeneratedWorkbook> {
    let items = payload.resolve_items()?;
    if items.len() > ITEM_ROWS {
        warn!(
            "{} items submitted, only the first {} fit the template",
            items.len(),
            ITEM_ROWS
        );
    }

    let mut workbook = template.instantiate();
    let date_1904 = workbook.settings().date_1904;
    let active = workbook.active_sheet();
    let count = workbook.sheet_count();
    let sheet = workbook
        .worksheet_mut(active)
        .ok_or(EngineError::Core(facture_core::Error::SheetOutOfBounds(
            active, count,
        )))?;

    let now = Local::now().naive_local();
    sheet.set_value(CELL_DATE, datetime_to_serial(now, date_1904))?;
    sheet.set_value(CELL_COMPANY_NAME, payload.company_name.trim())?;
    sheet.set_value(CELL_SAKADASTRO, payload.sakadastro.trim())?;
    sheet.set_value(CELL_ADDRESS, payload.address.trim())?;
    sheet.set_value(CELL_INVOICE_NUMBER, payload.invoice_number.trim())?;

    let mut total = 0.0;
    for (offset, item) in items.iter().take(ITEM_ROWS).enumerate() {
        let row = ITEM_FIRST_ROW + offset as u32;
        sheet.set_value(&format!("A{row}"), item.item_type.as_str())?;
        set_amount(sheet, &format!("B{row}"), item.quantity)?;
        set_amount(sheet, &format!("C{row}"), item.price)?;

        let formula = format!("B{row}*C{row}");
        match (item.quantity, item.price) {
            (Some(quantity), Some(price)) => {
                let product = quantity * price;
                total += product;
                sheet.set_value(
                    &format!("D{row}"),
                    Formula::with_cached_value(formula, CellValue::Number(product)),
                )?;
            }
            // The product is unknown until the spreadsheet recalculates
            _ => sheet.set_formula(&format!("D{row}"), &formula)?,
        }
    }
    sheet.set_value(CELL_TOTAL, total)?;

    for (addr, value) in extra.iter() {
        sheet.set_value_at(addr.row, addr.col, value.to_cell_value())?;
    }

    Ok(GeneratedWorkbook::new(workbook))
}

fn set_amount(sheet: &mut Worksheet, address: &str, amount: Option<f64>) -> EngineResult<()> {
    match amount {
        Some(n) => sheet.set_value(address, n)?,
        None => sheet.set_value(address, "")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldValue;
    use facture_core::Workbook;
    use pretty_assertions::assert_eq;

    fn blank_template() -> Template {
        Template::from_workbook(Workbook::new())
    }

    fn payload() -> InvoicePayload {
        InvoicePayload {
            company_name: "Acme Ltd".into(),
            sakadastro: "81.02.15.339".into(),
            address: "Tbilisi, Chavchavadze 12".into(),
            invoice_number: "1042".into(),
            items: vec![
                InvoiceItem {
                    item_type: "Consulting".into(),
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
    fn header_fields_land_on_their_cells() {
        let generated = generate_invoice(&blank_template(), &payload(), &ChangeSet::new()).unwrap();
        let sheet = generated.workbook().worksheet(0).unwrap();

        assert_eq!(sheet.value("A12").unwrap().as_str(), Some("Acme Ltd"));
        assert_eq!(sheet.value("A13").unwrap().as_str(), Some("81.02.15.339"));
        assert_eq!(
            sheet.value("A14").unwrap().as_str(),
            Some("Tbilisi, Chavchavadze 12")
        );
        assert_eq!(sheet.value("D5").unwrap().as_str(), Some("1042"));
        // D4 carries today's date as a serial with a time fraction
        let serial = sheet.value("D4").unwrap().as_number().unwrap();
        let today = Local::now().date_naive();
        assert_eq!(
            facture_core::dates::serial_to_date(serial, false),
            Some(today)
        );
    }

    #[test]
    fn items_fill_the_block_with_product_formulas() {
        let generated = generate_invoice(&blank_template(), &payload(), &ChangeSet::new()).unwrap();
        let sheet = generated.workbook().worksheet(0).unwrap();

        assert_eq!(sheet.value("A17").unwrap().as_str(), Some("Consulting"));
        assert_eq!(sheet.value("B17").unwrap().as_number(), Some(2.0));
        assert_eq!(sheet.value("C17").unwrap().as_number(), Some(10.0));
        match sheet.value("D17").unwrap() {
            CellValue::Formula(f) => {
                assert_eq!(f.text, "B17*C17");
                assert_eq!(f.cached_value.as_deref(), Some(&CellValue::Number(20.0)));
            }
            other => panic!("expected formula in D17, got {other:?}"),
        }
        assert_eq!(sheet.value("A18").unwrap().as_str(), Some("Support"));
    }

    #[test]
    fn the_total_is_computed_from_the_items() {
        let generated = generate_invoice(&blank_template(), &payload(), &ChangeSet::new()).unwrap();
        let sheet = generated.workbook().worksheet(0).unwrap();
        assert_eq!(sheet.value("D36").unwrap(), CellValue::Number(25.0));
    }

    #[test]
    fn missing_header_fields_fail_validation() {
        let mut bad = payload();
        bad.address = "   ".into();
        let err = generate_invoice(&blank_template(), &bad, &ChangeSet::new()).unwrap_err();
        match err {
            EngineError::Validation(msg) => {
                assert_eq!(msg, "All required fields must be filled")
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn bad_amounts_name_the_item() {
        let mut bad = payload();
        bad.items[1].price = Some(NumberInput::Text("abc".into()));
        let err = generate_invoice(&blank_template(), &bad, &ChangeSet::new()).unwrap_err();
        match err {
            EngineError::Validation(msg) => {
                assert_eq!(msg, "Invalid quantity or price for item: Support")
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn empty_typed_items_are_skipped() {
        let mut submitted = payload();
        submitted.items.insert(
            0,
            InvoiceItem {
                item_type: String::new(),
                quantity: Some(NumberInput::Number(99.0)),
                price: Some(NumberInput::Number(99.0)),
            },
        );
        let generated =
            generate_invoice(&blank_template(), &submitted, &ChangeSet::new()).unwrap();
        let sheet = generated.workbook().worksheet(0).unwrap();

        // Row 17 holds the first named item, not the unnamed one
        assert_eq!(sheet.value("A17").unwrap().as_str(), Some("Consulting"));
        assert_eq!(sheet.value("D36").unwrap(), CellValue::Number(25.0));
    }

    #[test]
    fn items_beyond_the_block_are_ignored() {
        let mut submitted = payload();
        submitted.items = (0..10)
            .map(|i| InvoiceItem {
                item_type: format!("Item {i}"),
                quantity: Some(NumberInput::Number(1.0)),
                price: Some(NumberInput::Number(1.0)),
            })
            .collect();
        let generated =
            generate_invoice(&blank_template(), &submitted, &ChangeSet::new()).unwrap();
        let sheet = generated.workbook().worksheet(0).unwrap();

        assert_eq!(sheet.value("A24").unwrap().as_str(), Some("Item 7"));
        assert!(sheet.value("A25").unwrap().is_empty());
        // Only the eight written rows count toward the total
        assert_eq!(sheet.value("D36").unwrap(), CellValue::Number(8.0));
    }

    #[test]
    fn blank_amounts_leave_formula_without_cache() {
        let mut submitted = payload();
        submitted.items = vec![InvoiceItem {
            item_type: "Misc".into(),
            quantity: Some(NumberInput::Text("".into())),
            price: None,
        }];
        let generated =
            generate_invoice(&blank_template(), &submitted, &ChangeSet::new()).unwrap();
        let sheet = generated.workbook().worksheet(0).unwrap();

        assert_eq!(sheet.value("B17").unwrap().as_str(), Some(""));
        match sheet.value("D17").unwrap() {
            CellValue::Formula(f) => {
                assert_eq!(f.text, "B17*C17");
                assert_eq!(f.cached_value, None);
            }
            other => panic!("expected formula in D17, got {other:?}"),
        }
        assert_eq!(sheet.value("D36").unwrap(), CellValue::Number(0.0));
    }

    #[test]
    fn extra_changes_apply_after_the_layout() {
        let mut extra = ChangeSet::new();
        extra.set("A12", FieldValue::parse("Override Co")).unwrap();
        extra.set("F1", FieldValue::parse("42")).unwrap();

        let generated = generate_invoice(&blank_template(), &payload(), &extra).unwrap();
        let sheet = generated.workbook().worksheet(0).unwrap();

        assert_eq!(sheet.value("A12").unwrap().as_str(), Some("Override Co"));
        assert_eq!(sheet.value("F1").unwrap(), CellValue::Number(42.0));
    }

    #[test]
    fn payload_deserializes_from_form_shaped_json() {
        let body = r#"{
            "company_name": "Acme Ltd",
            "sakadastro": "81.02",
            "address": "Tbilisi",
            "invoice_number": "7",
            "items": [
                {"type": "Consulting", "quantity": "2", "price": 10},
                {"type": "", "quantity": "", "price": ""}
            ]
        }"#;
        let payload: InvoicePayload = serde_json::from_str(body).unwrap();
        assert_eq!(payload.items.len(), 2);
        assert_eq!(
            payload.items[0].quantity,
            Some(NumberInput::Text("2".into()))
        );
        assert_eq!(payload.items[0].price, Some(NumberInput::Number(10.0)));

        let resolved = payload.resolve_items().unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].quantity, Some(2.0));
    }

    #[test]
    fn absent_fields_fail_validation_not_deserialization() {
        let payload: InvoicePayload = serde_json::from_str("{}").unwrap();
        let err = payload.resolve_items().unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
