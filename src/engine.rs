//! The entry point of the library: solving the timetable of a day.

use crate::{
    domain::{ConfigurationErrors, ConfigurationSnapshot, DomainBuilder, SchedulingDomain},
    extraction::{Lesson, LessonBatch, LessonStore, SolutionExtractor},
    model::{Constraint, ConstraintKind, DiagnosticCategory},
    sat::{DefaultSatSolverFactory, SatSolverFactory},
    solvers::{DriverOutcome, SolverDriver},
};
use chrono::NaiveDate;
use log::info;
use serde::Serialize;
use std::{collections::BTreeMap, time::Duration};
use thiserror::Error;

/// A constraint taking part in an infeasibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictDescription {
    /// The rule the constraint comes from.
    #[serde(serialize_with = "serialize_display")]
    pub kind: ConstraintKind,
    /// The family of the rule.
    #[serde(serialize_with = "serialize_display")]
    pub category: DiagnosticCategory,
    /// A human readable description of the constraint.
    pub description: String,
}

impl From<&Constraint> for ConflictDescription {
    fn from(c: &Constraint) -> Self {
        Self {
            kind: c.kind,
            category: c.kind.category(),
            description: c.description.clone(),
        }
    }
}

/// The number of conflicting constraints of a category, with an explanation of the category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    /// The category.
    #[serde(serialize_with = "serialize_display")]
    pub category: DiagnosticCategory,
    /// A one-line explanation of the way this category prevents a timetable.
    pub explanation: String,
    /// The number of conflicting constraints of this category.
    pub n_constraints: usize,
}

/// The explanation of an infeasible timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfeasibilityReport {
    /// The conflicting constraints.
    pub conflicts: Vec<ConflictDescription>,
    /// The conflicting constraints grouped by category.
    pub summaries: Vec<CategorySummary>,
    /// Whether removing any of the conflicting constraints makes the others consistent.
    pub minimal: bool,
}

impl InfeasibilityReport {
    fn new(conflicts: &[Constraint], minimal: bool) -> Self {
        let mut by_category: BTreeMap<DiagnosticCategory, usize> = BTreeMap::new();
        conflicts
            .iter()
            .for_each(|c| *by_category.entry(c.kind.category()).or_default() += 1);
        Self {
            conflicts: conflicts.iter().map(ConflictDescription::from).collect(),
            summaries: by_category
                .into_iter()
                .map(|(category, n_constraints)| CategorySummary {
                    category,
                    explanation: category.explanation().to_string(),
                    n_constraints,
                })
                .collect(),
            minimal,
        }
    }
}

/// The result of a solve request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveResult {
    /// A timetable was found.
    Solved(LessonBatch),
    /// The hard constraints cannot hold together.
    Infeasible(InfeasibilityReport),
    /// The time budget ran out before any timetable was found.
    ///
    /// The partial timetable holds the lessons every timetable would contain, if any.
    TimedOut { partial: Option<Vec<Lesson>> },
}

impl SolveResult {
    /// Returns the batch of a solved timetable.
    pub fn batch(&self) -> Option<&LessonBatch> {
        match self {
            SolveResult::Solved(batch) => Some(batch),
            _ => None,
        }
    }
}

/// The errors that may occur while solving a timetable.
///
/// Infeasibility and timeouts are not errors; see [SolveResult].
#[derive(Debug, Error)]
pub enum SolveError {
    /// The configuration is invalid; nothing was solved.
    #[error(transparent)]
    Configuration(#[from] ConfigurationErrors),
    /// A timetable was found but could not be committed.
    #[error("failed to commit the lesson batch")]
    Persistence(#[source] anyhow::Error),
}

fn serialize_display<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: std::fmt::Display,
    S: serde::Serializer,
{
    serializer.collect_str(value)
}

/// Solves daily timetables.
///
/// Each request rebuilds the scheduling domain from the given snapshot; no state is kept between requests.
///
/// # Example
///
/// ```
/// # use tabula::{ConfigurationSnapshot, SolveResult, TimetableEngine};
/// let snapshot = ConfigurationSnapshot::from_json_str(r#"{
///     "policies": {"slots_per_day": 4, "min_lessons": 1, "max_lessons": 1},
///     "subjects": [{"id": 1, "name": "Maths"}],
///     "teachers": [{"id": 1, "name": "Ada", "subjects": [1]}],
///     "students": [{"id": 1, "name": "Bob", "subjects": [1]}]
/// }"#).unwrap();
/// let date = chrono::NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
/// match TimetableEngine::new().solve(date, &snapshot).unwrap() {
///     SolveResult::Solved(batch) => assert_eq!(1, batch.lessons.len()),
///     _ => panic!(),
/// }
/// ```
pub struct TimetableEngine {
    solver_factory: Box<dyn SatSolverFactory>,
    time_limit: Option<Duration>,
}

impl Default for TimetableEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TimetableEngine {
    /// Builds an engine relying on the default SAT solver.
    pub fn new() -> Self {
        Self::new_with_sat_solver_factory(Box::<DefaultSatSolverFactory>::default())
    }

    /// Builds an engine relying on the given SAT solvers.
    pub fn new_with_sat_solver_factory(solver_factory: Box<dyn SatSolverFactory>) -> Self {
        Self {
            solver_factory,
            time_limit: None,
        }
    }

    /// Overrides the time limit given by the policies of the snapshots.
    ///
    /// Giving [Option::None] restores the time limit of the policies.
    pub fn set_time_limit(&mut self, time_limit: Option<Duration>) {
        self.time_limit = time_limit;
    }

    /// Checks the configuration without solving anything.
    pub fn check(
        &self,
        snapshot: &ConfigurationSnapshot,
    ) -> Result<SchedulingDomain, ConfigurationErrors> {
        DomainBuilder::new(snapshot).build()
    }

    /// Solves the timetable of a day.
    pub fn solve(
        &self,
        date: NaiveDate,
        snapshot: &ConfigurationSnapshot,
    ) -> Result<SolveResult, SolveError> {
        info!("solving the timetable of {}", date);
        let domain = self.check(snapshot)?;
        let time_limit = self.time_limit.unwrap_or_else(|| {
            Duration::try_from_secs_f64(domain.policies().solver_time_limit)
                .unwrap_or(Duration::MAX)
        });
        let outcome =
            SolverDriver::new(&domain, self.solver_factory.as_ref(), Some(time_limit)).run();
        let extractor = SolutionExtractor::new(&domain, date);
        Ok(match outcome {
            DriverOutcome::Solved {
                placements,
                objective,
                optimal,
            } => SolveResult::Solved(extractor.extract(&placements, objective, optimal)),
            DriverOutcome::Infeasible { conflicts, minimal } => {
                SolveResult::Infeasible(InfeasibilityReport::new(&conflicts, minimal))
            }
            DriverOutcome::TimedOut => SolveResult::TimedOut {
                partial: extractor.certain_lessons(),
            },
        })
    }

    /// Solves the timetable of a day and commits it to a store if a timetable is found.
    pub fn solve_and_commit(
        &self,
        date: NaiveDate,
        snapshot: &ConfigurationSnapshot,
        store: &mut dyn LessonStore,
    ) -> Result<SolveResult, SolveError> {
        let result = self.solve(date, snapshot)?;
        if let Some(batch) = result.batch() {
            store.commit(batch).map_err(SolveError::Persistence)?;
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ConfigurationIssue, LearnerRef, Occupant, StudentId, SubjectId, TeacherId},
        extraction::MemoryLessonStore,
    };
    use std::collections::HashSet;

    fn snapshot(json: &str) -> ConfigurationSnapshot {
        ConfigurationSnapshot::from_json_str(json).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
    }

    fn solved(result: SolveResult) -> LessonBatch {
        match result {
            SolveResult::Solved(batch) => batch,
            other => panic!("unexpected result {:?}", other),
        }
    }

    const SINGLE_LESSON: &str = r#"{
        "policies": {"slots_per_day": 4, "min_lessons": 1, "max_lessons": 1},
        "subjects": [{"id": 1, "name": "A"}],
        "teachers": [{"id": 1, "name": "T", "subjects": [1]}],
        "students": [{"id": 1, "name": "S", "subjects": [1]}]
    }"#;

    #[test]
    fn test_single_lesson() {
        let batch = solved(
            TimetableEngine::new()
                .solve(date(), &snapshot(SINGLE_LESSON))
                .unwrap(),
        );
        assert_eq!(1, batch.lessons.len());
        let lesson = &batch.lessons[0];
        assert_eq!(TeacherId(1), lesson.teacher);
        assert_eq!(LearnerRef::Student(StudentId(1)), lesson.learner);
        assert_eq!(SubjectId(1), lesson.subject);
        assert!(lesson.slot < 4);
        assert_eq!(date(), lesson.date);
        assert!(batch.unmet_subjects.is_empty());
    }

    #[test]
    fn test_unavailable_teacher_is_a_configuration_error() {
        let json = r#"{
            "policies": {"slots_per_day": 4, "min_lessons": 1, "max_lessons": 1},
            "subjects": [{"id": 1, "name": "A"}],
            "teachers": [{"id": 1, "name": "T", "subjects": [1], "unavailable": [0, 1, 2, 3]}],
            "students": [{"id": 1, "name": "S", "subjects": [1]}]
        }"#;
        match TimetableEngine::new().solve(date(), &snapshot(json)) {
            Err(SolveError::Configuration(errors)) => {
                assert!(errors
                    .issues()
                    .iter()
                    .any(|i| matches!(i, ConfigurationIssue::NoAvailablePlacement { .. })));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_infeasible_teacher_conflict() {
        let json = r#"{
            "policies": {"slots_per_day": 1, "min_lessons": 1, "max_lessons": 1},
            "subjects": [{"id": 1, "name": "A"}],
            "teachers": [{"id": 1, "name": "T", "subjects": [1]}],
            "students": [{"id": 1, "name": "S1", "subjects": [1]}, {"id": 2, "name": "S2", "subjects": [1]}]
        }"#;
        match TimetableEngine::new().solve(date(), &snapshot(json)).unwrap() {
            SolveResult::Infeasible(report) => {
                assert!(report.minimal);
                assert!(report
                    .conflicts
                    .iter()
                    .any(|c| c.kind == ConstraintKind::TeacherExclusivity));
                assert_eq!(
                    report.conflicts.len(),
                    report.summaries.iter().map(|s| s.n_constraints).sum::<usize>()
                );
                assert!(report
                    .summaries
                    .iter()
                    .any(|s| s.category == DiagnosticCategory::TeacherAvailability));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_pin_is_a_configuration_error() {
        let json = r#"{
            "policies": {"slots_per_day": 4},
            "subjects": [{"id": 1, "name": "A"}],
            "teachers": [{"id": 1, "name": "T", "subjects": [1]}],
            "students": [{"id": 1, "name": "S", "subjects": [1]}],
            "fixed_assignments": [
                {"teacher": 1, "learner": {"student": 1}, "subject": 1, "slot": 0},
                {"teacher": 1, "learner": {"student": 1}, "subject": 1, "slot": 2}
            ]
        }"#;
        assert!(matches!(
            TimetableEngine::new().solve(date(), &snapshot(json)),
            Err(SolveError::Configuration(_))
        ));
    }

    #[test]
    fn test_attendance_priority() {
        let json = r#"{
            "policies": {"slots_per_day": 2, "max_lessons": 1, "use_attendance_priority": true, "require_all_subjects": false},
            "subjects": [{"id": 1, "name": "A"}, {"id": 2, "name": "B"}],
            "teachers": [{"id": 1, "name": "T", "subjects": [1, 2]}],
            "students": [{"id": 1, "name": "S", "subjects": [1, 2]}],
            "attendance": [
                {"student": 1, "subject": 1, "attended": 5, "scheduled": 10},
                {"student": 1, "subject": 2, "attended": 9, "scheduled": 10}
            ]
        }"#;
        let batch = solved(TimetableEngine::new().solve(date(), &snapshot(json)).unwrap());
        assert_eq!(
            vec![SubjectId(1)],
            batch.lessons.iter().map(|l| l.subject).collect::<Vec<_>>()
        );
        assert_eq!(1, batch.unmet_subjects.len());
        assert_eq!(SubjectId(2), batch.unmet_subjects[0].subject);
        assert!(batch.optimal);
    }

    #[test]
    fn test_idempotence() {
        let json = r#"{
            "policies": {"slots_per_day": 3, "min_lessons": 1, "max_lessons": 2, "use_attendance_priority": true},
            "subjects": [{"id": 1, "name": "A"}, {"id": 2, "name": "B"}],
            "teachers": [{"id": 1, "name": "T", "subjects": [1], "unavailable": [1, 2]}, {"id": 2, "name": "U", "subjects": [2], "unavailable": [0, 2]}],
            "students": [{"id": 1, "name": "S", "subjects": [1, 2]}]
        }"#;
        let engine = TimetableEngine::new();
        let first = solved(engine.solve(date(), &snapshot(json)).unwrap());
        let second = solved(engine.solve(date(), &snapshot(json)).unwrap());
        assert_eq!(first.lessons, second.lessons);
        assert_eq!(2, first.lessons.len());
    }

    #[test]
    fn test_learner_without_subjects() {
        let json = r#"{
            "policies": {"slots_per_day": 2, "min_lessons": 1, "max_lessons": 1},
            "subjects": [{"id": 1, "name": "A"}],
            "teachers": [{"id": 1, "name": "T", "subjects": [1]}],
            "students": [{"id": 1, "name": "S", "subjects": [1]}, {"id": 2, "name": "Idle"}]
        }"#;
        let batch = solved(TimetableEngine::new().solve(date(), &snapshot(json)).unwrap());
        assert!(batch
            .lessons
            .iter()
            .all(|l| l.learner != LearnerRef::Student(StudentId(2))));
        assert_eq!(1, batch.lessons.len());
    }

    #[test]
    fn test_medium_instance_invariants() {
        let json = r#"{
            "policies": {"slots_per_day": 6, "min_lessons": 1, "max_lessons": 3, "teacher_max_lessons": 5,
                "repeats": {"allow_repeats": true, "max_repeats": 2, "adjacency": "preferred"},
                "balance_teacher_load": true},
            "subjects": [{"id": 1, "name": "A"}, {"id": 2, "name": "B"}, {"id": 3, "name": "C"}],
            "locations": [{"id": 1, "name": "R1"}, {"id": 2, "name": "R2"}],
            "teachers": [
                {"id": 1, "name": "T1", "subjects": [1, 2], "unavailable": [0]},
                {"id": 2, "name": "T2", "subjects": [2, 3]},
                {"id": 3, "name": "T3", "subjects": [1, 3], "unavailable": [5]}
            ],
            "students": [
                {"id": 1, "name": "S1", "subjects": [1, 2]},
                {"id": 2, "name": "S2", "subjects": [2, 3], "unavailable": [1]},
                {"id": 3, "name": "S3", "subjects": [1, 3]},
                {"id": 4, "name": "S4", "subjects": [3]}
            ],
            "groups": [{"id": 1, "name": "G", "members": [3, 4], "subjects": [1]}],
            "fixed_assignments": [{"teacher": 2, "learner": {"student": 2}, "subject": 2, "slot": 0, "location": 1}]
        }"#;
        let snapshot = snapshot(json);
        let engine = TimetableEngine::new();
        let domain = engine.check(&snapshot).unwrap();
        let batch = solved(engine.solve(date(), &snapshot).unwrap());
        let mut teacher_slots = HashSet::new();
        let mut location_slots = HashSet::new();
        let mut student_slots = HashSet::new();
        for lesson in batch.lessons.iter() {
            assert!(teacher_slots.insert((lesson.teacher, lesson.slot)));
            if let Some(l) = lesson.location {
                assert!(location_slots.insert((l, lesson.slot)));
            }
            let learner = &domain.learners()[domain.learner_index(lesson.learner).unwrap()];
            for student in learner.occupied_students() {
                assert!(student_slots.insert((*student, lesson.slot)));
            }
        }
        assert!(batch.lessons.iter().any(|l| l.teacher == TeacherId(2)
            && l.learner == LearnerRef::Student(StudentId(2))
            && l.subject == SubjectId(2)
            && l.slot == 0
            && l.fixed));
        for count in batch.teacher_counts.iter() {
            assert!(count.lessons <= 5);
        }
        for learner in domain.learners().iter().filter(|l| !l.kind.is_group()) {
            let n = batch
                .lessons
                .iter()
                .filter(|l| {
                    let other = &domain.learners()[domain.learner_index(l.learner).unwrap()];
                    other
                        .occupied_students()
                        .iter()
                        .any(|s| learner.occupied_students().contains(s))
                })
                .count();
            assert!(n <= 3);
        }
        assert!(batch.unmet_subjects.is_empty());
    }

    #[test]
    fn test_zero_time_limit() {
        let mut engine = TimetableEngine::new();
        engine.set_time_limit(Some(Duration::ZERO));
        assert_eq!(
            SolveResult::TimedOut { partial: None },
            engine.solve(date(), &snapshot(SINGLE_LESSON)).unwrap()
        );
    }

    #[test]
    fn test_huge_policy_time_limit() {
        let json = r#"{
            "policies": {"slots_per_day": 4, "min_lessons": 1, "max_lessons": 1, "solver_time_limit": 1e30},
            "subjects": [{"id": 1, "name": "A"}],
            "teachers": [{"id": 1, "name": "T", "subjects": [1]}],
            "students": [{"id": 1, "name": "S", "subjects": [1]}]
        }"#;
        let batch = solved(TimetableEngine::new().solve(date(), &snapshot(json)).unwrap());
        assert_eq!(1, batch.lessons.len());
        assert!(batch.optimal);
    }

    fn lessons_per_teacher(batch: &LessonBatch, teacher: TeacherId) -> usize {
        batch.lessons.iter().filter(|l| l.teacher == teacher).count()
    }

    fn slots_of(batch: &LessonBatch) -> Vec<usize> {
        batch.lessons.iter().map(|l| l.slot).collect()
    }

    #[test]
    fn test_teacher_minimum_is_met() {
        let json = r#"{
            "policies": {"slots_per_day": 2, "min_lessons": 1, "max_lessons": 1, "teacher_min_lessons": 1},
            "subjects": [{"id": 1, "name": "A"}],
            "teachers": [{"id": 1, "name": "T", "subjects": [1]}, {"id": 2, "name": "U", "subjects": [1]}],
            "students": [{"id": 1, "name": "S1", "subjects": [1]}, {"id": 2, "name": "S2", "subjects": [1]}]
        }"#;
        let batch = solved(TimetableEngine::new().solve(date(), &snapshot(json)).unwrap());
        assert_eq!(1, lessons_per_teacher(&batch, TeacherId(1)));
        assert_eq!(1, lessons_per_teacher(&batch, TeacherId(2)));
    }

    #[test]
    fn test_teacher_minimum_without_candidates_is_infeasible() {
        let json = r#"{
            "policies": {"slots_per_day": 2, "min_lessons": 1, "max_lessons": 1, "teacher_min_lessons": 1},
            "subjects": [{"id": 1, "name": "A"}, {"id": 2, "name": "B"}],
            "teachers": [{"id": 1, "name": "T", "subjects": [1]}, {"id": 2, "name": "U", "subjects": [2]}],
            "students": [{"id": 1, "name": "S", "subjects": [1]}]
        }"#;
        match TimetableEngine::new().solve(date(), &snapshot(json)).unwrap() {
            SolveResult::Infeasible(report) => {
                assert!(report.minimal);
                assert_eq!(1, report.conflicts.len());
                assert_eq!(ConstraintKind::TeacherLoad, report.conflicts[0].kind);
                assert_eq!(DiagnosticCategory::TeacherLimits, report.conflicts[0].category);
                assert_eq!("U gives at least 1 lesson(s)", report.conflicts[0].description);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_forbidden_adjacency() {
        let json = r#"{
            "policies": {"slots_per_day": 3, "min_lessons": 2, "max_lessons": 2,
                "repeats": {"allow_repeats": true, "max_repeats": 2, "adjacency": "forbidden"}},
            "subjects": [{"id": 1, "name": "A"}],
            "teachers": [{"id": 1, "name": "T", "subjects": [1]}],
            "students": [{"id": 1, "name": "S", "subjects": [1]}]
        }"#;
        let batch = solved(TimetableEngine::new().solve(date(), &snapshot(json)).unwrap());
        assert_eq!(vec![0, 2], slots_of(&batch));
    }

    #[test]
    fn test_preferred_adjacency() {
        let json = r#"{
            "policies": {"slots_per_day": 4, "min_lessons": 2, "max_lessons": 2,
                "repeats": {"allow_repeats": true, "max_repeats": 2, "adjacency": "preferred"}},
            "subjects": [{"id": 1, "name": "A"}],
            "teachers": [{"id": 1, "name": "T", "subjects": [1]}],
            "students": [{"id": 1, "name": "S", "subjects": [1]}]
        }"#;
        let batch = solved(TimetableEngine::new().solve(date(), &snapshot(json)).unwrap());
        let slots = slots_of(&batch);
        assert_eq!(2, slots.len());
        assert_eq!(slots[0] + 1, slots[1]);
        assert!(batch.optimal);
    }

    #[test]
    fn test_balanced_teacher_load() {
        let json = r#"{
            "policies": {"slots_per_day": 4, "min_lessons": 1, "max_lessons": 1, "balance_teacher_load": true},
            "subjects": [{"id": 1, "name": "A"}],
            "teachers": [{"id": 1, "name": "T", "subjects": [1]}, {"id": 2, "name": "U", "subjects": [1]}],
            "students": [
                {"id": 1, "name": "S1", "subjects": [1]},
                {"id": 2, "name": "S2", "subjects": [1]},
                {"id": 3, "name": "S3", "subjects": [1]},
                {"id": 4, "name": "S4", "subjects": [1]}
            ]
        }"#;
        let batch = solved(TimetableEngine::new().solve(date(), &snapshot(json)).unwrap());
        assert_eq!(4, batch.lessons.len());
        assert_eq!(2, lessons_per_teacher(&batch, TeacherId(1)));
        assert_eq!(2, lessons_per_teacher(&batch, TeacherId(2)));
    }

    #[test]
    fn test_commit() {
        let mut store = MemoryLessonStore::default();
        let result = TimetableEngine::new()
            .solve_and_commit(date(), &snapshot(SINGLE_LESSON), &mut store)
            .unwrap();
        assert_eq!(result.batch(), store.batch(date()));
    }

    struct FailingStore;

    impl LessonStore for FailingStore {
        fn commit(&mut self, _batch: &LessonBatch) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("disk full"))
        }
    }

    #[test]
    fn test_persistence_failure() {
        let err = TimetableEngine::new()
            .solve_and_commit(date(), &snapshot(SINGLE_LESSON), &mut FailingStore)
            .unwrap_err();
        assert!(matches!(err, SolveError::Persistence(_)));
        assert_eq!("failed to commit the lesson batch", err.to_string());
    }
}
