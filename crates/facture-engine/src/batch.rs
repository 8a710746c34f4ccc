//! Best-effort batch generation
//!
//! A batch is an ordered list of jobs run sequentially against one
//! template. Jobs are isolated: a failing job is recorded in the report
//! and the remaining jobs still run against the unmodified template.

use std::collections::BTreeMap;
use std::path::PathBuf;

use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::changes::ChangeSet;
use crate::error::EngineResult;
use crate::field::FieldValue;
use crate::invoice::{generate_invoice, InvoicePayload};
use crate::output::OutputWriter;
use crate::template::Template;

/// One batch entry: an output name plus an invoice payload, raw cell
/// writes, or both.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BatchJob {
    pub output_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice: Option<InvoicePayload>,
    /// Raw `address -> value` writes. Addresses are validated when the
    /// job runs, so a bad key fails only its own job.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub changes: BTreeMap<String, FieldValue>,
}

/// Outcome of a single job.
#[derive(Debug)]
pub struct JobOutcome {
    pub output_name: String,
    pub result: EngineResult<PathBuf>,
}

/// Per-job results, in submission order.
#[derive(Debug, Default)]
pub struct BatchReport {
    outcomes: Vec<JobOutcome>,
}

impl BatchReport {
    pub fn outcomes(&self) -> &[JobOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }
}

/// Run jobs sequentially against one template.
pub fn generate_batch(
    template: &Template,
    writer: &OutputWriter,
    jobs: &[BatchJob],
) -> BatchReport {
    let mut outcomes = Vec::with_capacity(jobs.len());
    for job in jobs {
        let result = run_job(template, writer, job);
        match &result {
            Ok(path) => info!("Batch job '{}' wrote {}", job.output_name, path.display()),
            Err(e) => error!("Batch job '{}' failed: {}", job.output_name, e),
        }
        outcomes.push(JobOutcome {
            output_name: job.output_name.clone(),
            result,
        });
    }
    BatchReport { outcomes }
}

fn run_job(template: &Template, writer: &OutputWriter, job: &BatchJob) -> EngineResult<PathBuf> {
    let mut changes = ChangeSet::new();
    for (address, value) in &job.changes {
        changes.set(address, value.clone())?;
    }

    let generated = match &job.invoice {
        Some(payload) => generate_invoice(template, payload, &changes)?,
        None => template.apply(&changes)?,
    };
    writer.write(&generated, &job.output_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use facture_core::Workbook;
    use pretty_assertions::assert_eq;

    fn job(name: &str, changes: &[(&str, &str)]) -> BatchJob {
        BatchJob {
            output_name: name.into(),
            invoice: None,
            changes: changes
                .iter()
                .map(|(k, v)| (k.to_string(), FieldValue::parse(v)))
                .collect(),
        }
    }

    #[test]
    fn one_failing_job_does_not_block_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let template = Template::from_workbook(Workbook::new());
        let writer = OutputWriter::new(dir.path());

        let jobs = vec![
            job("first", &[("A1", "ok")]),
            job("broken", &[("not-a-cell", "x")]),
            job("third", &[("B2", "25")]),
        ];
        let report = generate_batch(&template, &writer, &jobs);

        assert_eq!(report.len(), 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);

        assert!(dir.path().join("first.xlsx").is_file());
        assert!(!dir.path().join("broken.xlsx").exists());
        assert!(dir.path().join("third.xlsx").is_file());

        let outcomes = report.outcomes();
        assert_eq!(outcomes[1].output_name, "broken");
        assert!(matches!(
            outcomes[1].result,
            Err(EngineError::InvalidAddress(_))
        ));
    }

    #[test]
    fn jobs_parse_from_a_json_array() {
        let body = r#"[
            {
                "output_name": "acme",
                "invoice": {
                    "company_name": "Acme",
                    "sakadastro": "81",
                    "address": "Tbilisi",
                    "invoice_number": "1",
                    "items": [{"type": "Work", "quantity": 2, "price": 10}]
                },
                "changes": {"F1": "note"}
            },
            {"output_name": "raw", "changes": {"A1": 5}}
        ]"#;
        let jobs: Vec<BatchJob> = serde_json::from_str(body).unwrap();

        assert_eq!(jobs.len(), 2);
        assert!(jobs[0].invoice.is_some());
        assert_eq!(jobs[0].changes["F1"], FieldValue::Text("note".into()));
        assert!(jobs[1].invoice.is_none());
        assert_eq!(jobs[1].changes["A1"], FieldValue::Integer(5));
    }
}
