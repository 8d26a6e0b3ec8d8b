use super::{
    ids::{StudentId, SubjectId},
    snapshot::AttendanceRecord,
};
use std::collections::BTreeMap;

/// Attendance percentages computed from the attendance history.
#[derive(Debug, Clone, Default)]
pub struct AttendanceTable(BTreeMap<(StudentId, SubjectId), f64>);

impl AttendanceTable {
    /// Builds the table; records for the same student and subject are summed.
    pub fn new(records: &[AttendanceRecord]) -> Self {
        let mut counts: BTreeMap<(StudentId, SubjectId), (u64, u64)> = BTreeMap::new();
        for r in records {
            let e = counts.entry((r.student, r.subject)).or_default();
            e.0 += r.attended as u64;
            e.1 += r.scheduled as u64;
        }
        Self(
            counts
                .into_iter()
                .map(|(k, (attended, scheduled))| (k, percentage(attended, scheduled)))
                .collect(),
        )
    }

    /// Returns the attendance percentage of a student in a subject.
    ///
    /// A student never scheduled in a subject has a null attendance.
    pub fn of(&self, student: StudentId, subject: SubjectId) -> f64 {
        self.0.get(&(student, subject)).copied().unwrap_or(0.0)
    }

    /// Returns the median attendance percentage of a set of students in a subject.
    pub fn median_of(&self, students: &[StudentId], subject: SubjectId) -> f64 {
        let mut values: Vec<f64> = students.iter().map(|s| self.of(*s, subject)).collect();
        median(&mut values)
    }
}

fn percentage(attended: u64, scheduled: u64) -> f64 {
    if scheduled == 0 {
        0.0
    } else {
        attended as f64 * 100.0 / scheduled as f64
    }
}

fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(student: u32, subject: u32, attended: u32, scheduled: u32) -> AttendanceRecord {
        AttendanceRecord {
            student: StudentId(student),
            subject: SubjectId(subject),
            attended,
            scheduled,
        }
    }

    #[test]
    fn test_percentages() {
        let table = AttendanceTable::new(&[record(1, 1, 1, 2), record(1, 1, 2, 2), record(1, 2, 0, 0)]);
        assert_eq!(75.0, table.of(StudentId(1), SubjectId(1)));
        assert_eq!(0.0, table.of(StudentId(1), SubjectId(2)));
        assert_eq!(0.0, table.of(StudentId(2), SubjectId(1)));
    }

    #[test]
    fn test_median() {
        let table = AttendanceTable::new(&[
            record(1, 1, 1, 10),
            record(2, 1, 5, 10),
            record(3, 1, 9, 10),
            record(4, 1, 10, 10),
        ]);
        let students = [StudentId(1), StudentId(2), StudentId(3)];
        assert_eq!(50.0, table.median_of(&students, SubjectId(1)));
        let students = [StudentId(1), StudentId(2), StudentId(3), StudentId(4)];
        assert_eq!(70.0, table.median_of(&students, SubjectId(1)));
        assert_eq!(0.0, table.median_of(&[], SubjectId(1)));
    }
}
