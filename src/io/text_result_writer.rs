use super::ResultWriter;
use crate::{domain::ConfigurationErrors, extraction::Lesson, InfeasibilityReport, SolveResult};
use anyhow::{Context, Result};
use std::io::Write;

/// A writer for a human readable summary of the results.
///
/// The first line of the output is one of `SOLVED`, `INFEASIBLE`, `TIMED OUT` or `INVALID CONFIGURATION`,
/// followed by details on the next lines:
///   * solved timetables: one line per lesson, then the unmet subjects and the load of each teacher
///   * infeasibility: the conflicting constraints, grouped by category
///   * timeout: the lessons every timetable would contain, if any
#[derive(Default)]
pub struct TextResultWriter;

const CONTEXT: &str = "while writing the result";

fn write_lesson(writer: &mut dyn Write, lesson: &Lesson) -> Result<()> {
    write!(
        writer,
        "{} slot {}: {} with {} in {}",
        lesson.start_time.format("%H:%M"),
        lesson.slot,
        lesson.teacher,
        lesson.learner,
        lesson.subject
    )
    .context(CONTEXT)?;
    if let Some(l) = lesson.location {
        write!(writer, " at {}", l).context(CONTEXT)?;
    }
    if lesson.fixed {
        write!(writer, " (fixed)").context(CONTEXT)?;
    }
    writeln!(writer).context(CONTEXT)
}

fn write_infeasibility(writer: &mut dyn Write, report: &InfeasibilityReport) -> Result<()> {
    writeln!(
        writer,
        "INFEASIBLE{}",
        if report.minimal {
            ""
        } else {
            " (conflict may not be minimal)"
        }
    )
    .context(CONTEXT)?;
    for summary in report.summaries.iter() {
        writeln!(
            writer,
            "{} ({}): {}",
            summary.category, summary.n_constraints, summary.explanation
        )
        .context(CONTEXT)?;
        report
            .conflicts
            .iter()
            .filter(|c| c.category == summary.category)
            .try_for_each(|c| writeln!(writer, "  - {}", c.description).context(CONTEXT))?;
    }
    Ok(())
}

impl ResultWriter for TextResultWriter {
    fn write_result(&self, writer: &mut dyn Write, result: &SolveResult) -> Result<()> {
        match result {
            SolveResult::Solved(batch) => {
                writeln!(
                    writer,
                    "SOLVED {} with {} lesson(s), objective {}{}",
                    batch.date,
                    batch.lessons.len(),
                    batch.objective,
                    if batch.optimal { " (optimal)" } else { "" }
                )
                .context(CONTEXT)?;
                batch
                    .lessons
                    .iter()
                    .try_for_each(|l| write_lesson(writer, l))?;
                batch.unmet_subjects.iter().try_for_each(|u| {
                    writeln!(writer, "unmet: {} gets no lesson in {}", u.learner_name, u.subject_name)
                        .context(CONTEXT)
                })?;
                batch.teacher_counts.iter().try_for_each(|c| {
                    writeln!(writer, "load: {} gives {} lesson(s)", c.name, c.lessons).context(CONTEXT)
                })?;
            }
            SolveResult::Infeasible(report) => write_infeasibility(writer, report)?,
            SolveResult::TimedOut { partial } => {
                writeln!(writer, "TIMED OUT").context(CONTEXT)?;
                partial
                    .iter()
                    .flatten()
                    .try_for_each(|l| write_lesson(writer, l))?;
            }
        }
        writer.flush().context(CONTEXT)
    }

    fn write_configuration_errors(
        &self,
        writer: &mut dyn Write,
        errors: &ConfigurationErrors,
    ) -> Result<()> {
        writeln!(writer, "INVALID CONFIGURATION").context(CONTEXT)?;
        errors
            .issues()
            .iter()
            .try_for_each(|i| writeln!(writer, "  - {}", i).context(CONTEXT))?;
        writer.flush().context(CONTEXT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ConfigurationIssue, LearnerRef, StudentId, SubjectId, TeacherId},
        model::{ConstraintKind, DiagnosticCategory},
        CategorySummary, ConflictDescription,
    };
    use chrono::{NaiveDate, NaiveTime};
    use std::io::BufWriter;

    fn write(result: &SolveResult) -> String {
        let mut buffer = BufWriter::new(Vec::new());
        TextResultWriter::default()
            .write_result(&mut buffer, result)
            .unwrap();
        String::from_utf8(buffer.into_inner().unwrap()).unwrap()
    }

    fn lesson() -> Lesson {
        Lesson {
            teacher: TeacherId(1),
            learner: LearnerRef::Student(StudentId(2)),
            subject: SubjectId(3),
            slot: 1,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            location: None,
            date: NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
            fixed: true,
        }
    }

    #[test]
    fn test_write_timed_out() {
        assert_eq!(
            "TIMED OUT\n09:00 slot 1: teacher#1 with student#2 in subject#3 (fixed)\n",
            write(&SolveResult::TimedOut {
                partial: Some(vec![lesson()])
            })
        );
        assert_eq!("TIMED OUT\n", write(&SolveResult::TimedOut { partial: None }));
    }

    #[test]
    fn test_write_infeasible() {
        let report = InfeasibilityReport {
            conflicts: vec![ConflictDescription {
                kind: ConstraintKind::TeacherExclusivity,
                category: DiagnosticCategory::TeacherAvailability,
                description: "T gives at most one lesson at slot 0".to_string(),
            }],
            summaries: vec![CategorySummary {
                category: DiagnosticCategory::TeacherAvailability,
                explanation: "explanation".to_string(),
                n_constraints: 1,
            }],
            minimal: true,
        };
        assert_eq!(
            "INFEASIBLE\nteacher availability (1): explanation\n  - T gives at most one lesson at slot 0\n",
            write(&SolveResult::Infeasible(report))
        );
    }

    #[test]
    fn test_write_configuration_errors() {
        let mut buffer = BufWriter::new(Vec::new());
        TextResultWriter::default()
            .write_configuration_errors(
                &mut buffer,
                &ConfigurationErrors(vec![ConfigurationIssue::InvalidPolicy(
                    "slots_per_day must be positive".to_string(),
                )]),
            )
            .unwrap();
        assert_eq!(
            "INVALID CONFIGURATION\n  - invalid policy: slots_per_day must be positive\n",
            String::from_utf8(buffer.into_inner().unwrap()).unwrap()
        );
    }
}
