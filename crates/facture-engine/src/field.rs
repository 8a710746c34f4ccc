//! Typed input values
//!
//! Raw user input (form fields, CLI answers, batch files) passes through
//! one pure classifier before it touches a workbook, so a "5" from any
//! source lands in a cell as the number 5 and not the text "5".

use std::fmt;

use facture_core::CellValue;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single input value, tagged with its most specific numeric parse.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl FieldValue {
    /// Classify a raw string: integer if it parses cleanly as a whole
    /// number, else float, else text. Numeric parses ignore surrounding
    /// whitespace; text keeps the input verbatim.
    ///
    /// Non-finite parses ("inf", "NaN") stay text so a workbook never
    /// carries them.
    pub fn parse(raw: &str) -> FieldValue {
        let trimmed = raw.trim();
        if let Ok(int) = trimmed.parse::<i64>() {
            return FieldValue::Integer(int);
        }
        match trimmed.parse::<f64>() {
            Ok(float) if float.is_finite() => FieldValue::Float(float),
            _ => FieldValue::Text(raw.to_string()),
        }
    }

    /// Classify a number the same way: whole values in `i64` range
    /// become integers.
    pub fn from_number(n: f64) -> FieldValue {
        if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
            FieldValue::Integer(n as i64)
        } else {
            FieldValue::Float(n)
        }
    }

    /// Short type tag, used in log lines and reports.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Integer(_) => "integer",
            FieldValue::Float(_) => "float",
        }
    }

    pub fn to_cell_value(&self) -> CellValue {
        match self {
            FieldValue::Text(s) => CellValue::String(s.clone()),
            FieldValue::Integer(i) => CellValue::Number(*i as f64),
            FieldValue::Float(f) => CellValue::Number(*f),
        }
    }
}

impl From<FieldValue> for CellValue {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Text(s) => CellValue::String(s),
            FieldValue::Integer(i) => CellValue::Number(i as f64),
            FieldValue::Float(f) => CellValue::Number(f),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(x) => write!(f, "{}", x),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Integer(i) => serializer.serialize_i64(*i),
            FieldValue::Float(f) => serializer.serialize_f64(*f),
        }
    }
}

struct FieldValueVisitor;

impl<'de> Visitor<'de> for FieldValueVisitor {
    type Value = FieldValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, number, or boolean")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<FieldValue, E> {
        Ok(FieldValue::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<FieldValue, E> {
        Ok(match i64::try_from(v) {
            Ok(int) => FieldValue::Integer(int),
            Err(_) => FieldValue::Float(v as f64),
        })
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<FieldValue, E> {
        Ok(FieldValue::from_number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<FieldValue, E> {
        Ok(FieldValue::parse(v))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<FieldValue, E> {
        Ok(FieldValue::Text(v.to_string()))
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FieldValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn integers_win_over_floats() {
        assert_eq!(FieldValue::parse("5000"), FieldValue::Integer(5000));
        assert_eq!(FieldValue::parse("-250"), FieldValue::Integer(-250));
        assert_eq!(FieldValue::parse("+7"), FieldValue::Integer(7));
        assert_eq!(FieldValue::parse("0"), FieldValue::Integer(0));
    }

    #[test]
    fn decimals_become_floats() {
        assert_eq!(FieldValue::parse("45.67"), FieldValue::Float(45.67));
        assert_eq!(FieldValue::parse("5.0"), FieldValue::Float(5.0));
        assert_eq!(FieldValue::parse("5."), FieldValue::Float(5.0));
        assert_eq!(FieldValue::parse("1e3"), FieldValue::Float(1000.0));
    }

    #[test]
    fn everything_else_stays_text() {
        assert_eq!(
            FieldValue::parse("John Doe"),
            FieldValue::Text("John Doe".into())
        );
        assert_eq!(FieldValue::parse(""), FieldValue::Text(String::new()));
        assert_eq!(FieldValue::parse("12a"), FieldValue::Text("12a".into()));
        // Keeps the raw string, whitespace included
        assert_eq!(
            FieldValue::parse("  invoice  "),
            FieldValue::Text("  invoice  ".into())
        );
    }

    #[test]
    fn numeric_parse_ignores_surrounding_whitespace() {
        assert_eq!(FieldValue::parse(" 12 "), FieldValue::Integer(12));
        assert_eq!(FieldValue::parse("\t2.5\n"), FieldValue::Float(2.5));
    }

    #[test]
    fn non_finite_parses_stay_text() {
        assert_eq!(FieldValue::parse("inf"), FieldValue::Text("inf".into()));
        assert_eq!(FieldValue::parse("NaN"), FieldValue::Text("NaN".into()));
    }

    #[test]
    fn whole_numbers_collapse_to_integers() {
        assert_eq!(FieldValue::from_number(5.0), FieldValue::Integer(5));
        assert_eq!(FieldValue::from_number(-3.0), FieldValue::Integer(-3));
        assert_eq!(FieldValue::from_number(2.5), FieldValue::Float(2.5));
        assert_eq!(
            FieldValue::from_number(f64::INFINITY),
            FieldValue::Float(f64::INFINITY)
        );
    }

    #[test]
    fn cell_values_keep_the_numeric_form() {
        assert_eq!(
            FieldValue::Integer(42).to_cell_value(),
            CellValue::Number(42.0)
        );
        assert_eq!(
            FieldValue::Text("x".into()).to_cell_value(),
            CellValue::String("x".into())
        );
    }

    #[test]
    fn json_numbers_and_strings_classify_alike() {
        let from_number: FieldValue = serde_json::from_str("5000").unwrap();
        let from_string: FieldValue = serde_json::from_str("\"5000\"").unwrap();
        assert_eq!(from_number, FieldValue::Integer(5000));
        assert_eq!(from_string, FieldValue::Integer(5000));

        let whole_float: FieldValue = serde_json::from_str("25.0").unwrap();
        assert_eq!(whole_float, FieldValue::Integer(25));

        let fractional: FieldValue = serde_json::from_str("45.67").unwrap();
        assert_eq!(fractional, FieldValue::Float(45.67));

        let text: FieldValue = serde_json::from_str("\"John Doe\"").unwrap();
        assert_eq!(text, FieldValue::Text("John Doe".into()));
    }

    #[test]
    fn serializes_back_to_plain_json() {
        assert_eq!(
            serde_json::to_string(&FieldValue::Integer(5)).unwrap(),
            "5"
        );
        assert_eq!(
            serde_json::to_string(&FieldValue::Text("a b".into())).unwrap(),
            "\"a b\""
        );
    }

    proptest! {
        #[test]
        fn any_i64_string_classifies_as_integer(n in any::<i64>()) {
            prop_assert_eq!(FieldValue::parse(&n.to_string()), FieldValue::Integer(n));
        }

        #[test]
        fn fractional_floats_classify_as_float(n in any::<f64>()) {
            prop_assume!(n.is_finite() && n.fract() != 0.0);
            // {:?} prints a round-trippable representation
            prop_assert_eq!(FieldValue::parse(&format!("{:?}", n)), FieldValue::Float(n));
        }

        #[test]
        fn classification_never_panics(s in "\\PC*") {
            let _ = FieldValue::parse(&s);
        }

        #[test]
        fn whole_f64s_in_range_become_integers(n in -1_000_000_000i64..1_000_000_000) {
            prop_assert_eq!(FieldValue::from_number(n as f64), FieldValue::Integer(n));
        }
    }
}
