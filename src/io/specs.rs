use crate::{domain::ConfigurationErrors, ConfigurationSnapshot, SolveResult};
use anyhow::Result;
use std::io::{Read, Write};

/// A trait implemented by objects able to read configuration snapshots.
pub trait SnapshotReader {
    /// Reads a [`ConfigurationSnapshot`].
    ///
    /// # Example
    ///
    /// ```
    /// # use tabula::{io::{JsonSnapshotReader, SnapshotReader}, ConfigurationSnapshot};
    /// fn read_snapshot_from_str(s: &str) -> ConfigurationSnapshot {
    ///     let reader = JsonSnapshotReader::default();
    ///     reader.read(&mut s.as_bytes()).expect("invalid snapshot")
    /// }
    /// # read_snapshot_from_str(r#"{"policies": {"slots_per_day": 4}}"#);
    /// ```
    fn read(&self, reader: &mut dyn Read) -> Result<ConfigurationSnapshot>;
}

/// A trait implemented by objects that write the results of solve requests.
pub trait ResultWriter {
    /// Writes the result of a solve request.
    fn write_result(&self, writer: &mut dyn Write, result: &SolveResult) -> Result<()>;

    /// Writes the issues of an invalid configuration.
    fn write_configuration_errors(
        &self,
        writer: &mut dyn Write,
        errors: &ConfigurationErrors,
    ) -> Result<()>;
}
