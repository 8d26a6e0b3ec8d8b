use super::SnapshotReader;
use crate::ConfigurationSnapshot;
use anyhow::{Context, Result};
use log::debug;
use std::io::Read;

/// A reader for configuration snapshots written in JSON.
///
/// Every field of the snapshot is optional; missing ones take their default values.
///
/// ```json
/// {
///     "policies": {"slots_per_day": 4, "min_lessons": 1, "max_lessons": 1},
///     "subjects": [{"id": 1, "name": "Maths"}],
///     "teachers": [{"id": 1, "name": "Ada", "subjects": [1]}],
///     "students": [{"id": 1, "name": "Bob", "subjects": [1]}]
/// }
/// ```
#[derive(Default)]
pub struct JsonSnapshotReader;

impl SnapshotReader for JsonSnapshotReader {
    fn read(&self, reader: &mut dyn Read) -> Result<ConfigurationSnapshot> {
        let snapshot: ConfigurationSnapshot =
            serde_json::from_reader(reader).context("while parsing the configuration snapshot")?;
        debug!(
            "read {} teacher(s), {} student(s), {} group(s), {} subject(s) and {} location(s)",
            snapshot.teachers.len(),
            snapshot.students.len(),
            snapshot.groups.len(),
            snapshot.subjects.len(),
            snapshot.locations.len()
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TeacherId;

    #[test]
    fn test_read() {
        let snapshot = JsonSnapshotReader::default()
            .read(&mut r#"{"teachers": [{"id": 3, "name": "T"}]}"#.as_bytes())
            .unwrap();
        assert_eq!(TeacherId(3), snapshot.teachers[0].id);
        assert_eq!(8, snapshot.policies.slots_per_day);
    }

    #[test]
    fn test_read_invalid_json() {
        let err = JsonSnapshotReader::default()
            .read(&mut r#"{"teachers": [{"id": "x"}]}"#.as_bytes())
            .unwrap_err();
        assert_eq!(
            "while parsing the configuration snapshot",
            err.to_string()
        );
    }

    #[test]
    fn test_read_unknown_policy_value() {
        assert!(JsonSnapshotReader::default()
            .read(&mut r#"{"policies": {"balance_target": "median"}}"#.as_bytes())
            .is_err());
    }
}
