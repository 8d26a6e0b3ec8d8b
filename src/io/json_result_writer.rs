use super::ResultWriter;
use crate::{domain::ConfigurationErrors, SolveResult};
use anyhow::{Context, Result};
use serde_json::json;
use std::io::Write;

/// A writer for the results as JSON documents.
///
/// Results are tagged by their kind (`solved`, `infeasible` or `timed_out`);
/// configuration errors are written as `{"configuration_errors": [...]}`.
#[derive(Default)]
pub struct JsonResultWriter;

const CONTEXT: &str = "while writing the result";

impl ResultWriter for JsonResultWriter {
    fn write_result(&self, writer: &mut dyn Write, result: &SolveResult) -> Result<()> {
        serde_json::to_writer_pretty(&mut *writer, result).context(CONTEXT)?;
        writeln!(writer).context(CONTEXT)?;
        writer.flush().context(CONTEXT)
    }

    fn write_configuration_errors(
        &self,
        writer: &mut dyn Write,
        errors: &ConfigurationErrors,
    ) -> Result<()> {
        let issues: Vec<String> = errors.issues().iter().map(|i| i.to_string()).collect();
        serde_json::to_writer_pretty(&mut *writer, &json!({ "configuration_errors": issues }))
            .context(CONTEXT)?;
        writeln!(writer).context(CONTEXT)?;
        writer.flush().context(CONTEXT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufWriter;

    #[test]
    fn test_write_timed_out() {
        let mut buffer = BufWriter::new(Vec::new());
        JsonResultWriter::default()
            .write_result(&mut buffer, &SolveResult::TimedOut { partial: None })
            .unwrap();
        let value: serde_json::Value =
            serde_json::from_slice(&buffer.into_inner().unwrap()).unwrap();
        assert_eq!(json!({"timed_out": {"partial": null}}), value);
    }
}
