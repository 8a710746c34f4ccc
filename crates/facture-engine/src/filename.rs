//! Output filename sanitation
//!
//! Names arrive from web forms and CLI prompts in whatever shape the
//! user typed, Unicode included. Sanitation keeps the characters that
//! are safe in a filename on every platform and nothing else.

use lazy_regex::regex;

/// Make a filename safe while preserving Unicode: trim, replace spaces
/// with underscores, strip `/ \ : * ? " < > |`, strip leading dots.
/// Falls back to `output` when nothing survives.
pub fn safe_filename(name: &str) -> String {
    let name = name.trim().replace(' ', "_");
    let name = regex!(r#"[/\\:*?"<>|]"#).replace_all(&name, "");
    let name = name.trim_start_matches('.');
    if name.is_empty() {
        "output".to_string()
    } else {
        name.to_string()
    }
}

/// Sanitized basename for a generated workbook. A trailing `.xlsx` or
/// `.xls` is dropped so the writer can append the real extension once.
pub fn output_basename(name: &str) -> String {
    let safe = safe_filename(name);
    let base = safe
        .strip_suffix(".xlsx")
        .or_else(|| safe.strip_suffix(".xls"))
        .unwrap_or(&safe);
    if base.is_empty() {
        "output".to_string()
    } else {
        base.to_string()
    }
}
