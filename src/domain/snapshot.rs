//! The raw configuration a timetable is built from.
//!
//! A [ConfigurationSnapshot] is read as is from the configuration store (usually a JSON document);
//! nothing is checked at this level. The [DomainBuilder](super::DomainBuilder) is in charge of the validation.

use super::ids::{GroupId, LearnerRef, LocationId, Slot, StudentId, SubjectId, TeacherId};
use serde::{Deserialize, Serialize};

/// The whole configuration used to build the timetable of a day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigurationSnapshot {
    /// The global policies.
    pub policies: Policies,
    /// The teachers.
    pub teachers: Vec<TeacherRecord>,
    /// The students.
    pub students: Vec<StudentRecord>,
    /// The groups of students.
    pub groups: Vec<GroupRecord>,
    /// The subjects.
    pub subjects: Vec<SubjectRecord>,
    /// The locations; no location is assigned if empty.
    pub locations: Vec<LocationRecord>,
    /// The lessons that must take place.
    pub fixed_assignments: Vec<FixedAssignmentRecord>,
    /// The attendance history.
    pub attendance: Vec<AttendanceRecord>,
}

impl ConfigurationSnapshot {
    /// Parses a snapshot from its JSON representation.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

/// The global rules of a timetable.
///
/// Every field has a default value, so that a configuration may only give the ones it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policies {
    /// The number of time slots in the day.
    pub slots_per_day: usize,
    /// The start time of the first slot (`HH:MM`), used when no explicit start times are given.
    pub day_start: String,
    /// The duration of a slot, in minutes.
    pub slot_duration: u32,
    /// Explicit start times (`HH:MM`) of each slot.
    pub slot_start_times: Vec<String>,
    /// The default minimal number of lessons of a learner.
    pub min_lessons: usize,
    /// The default maximal number of lessons of a learner.
    pub max_lessons: usize,
    /// The default minimal number of lessons of a teacher.
    pub teacher_min_lessons: usize,
    /// The default maximal number of lessons of a teacher; no bound if missing.
    pub teacher_max_lessons: Option<usize>,
    /// The default repeat policy of learners.
    pub repeats: RepeatPolicy,
    /// Whether each learner must get at least one lesson in each subject it requires.
    pub require_all_subjects: bool,
    /// Whether the lessons of a learner in a subject may involve different teachers.
    pub allow_multi_teacher: bool,
    /// Whether the attendance history is taken into account by the objective.
    pub use_attendance_priority: bool,
    /// The default weight of lessons in subjects a learner attends below the threshold.
    pub attendance_below_weight: f64,
    /// The default weight of lessons in subjects a learner attends at or above the threshold.
    pub attendance_at_or_above_weight: f64,
    /// The factor applied to the weight of group lessons.
    pub group_weight: f64,
    /// Whether the load of the teachers must be balanced.
    pub balance_teacher_load: bool,
    /// The penalty of each lesson a teacher gets above the balance target.
    pub balance_weight: f64,
    /// The target load used to balance teachers.
    pub balance_target: BalanceTarget,
    /// The bonus of two lessons in the same subject in adjacent slots for the same learner.
    pub consecutive_weight: f64,
    /// The base weight of any lesson.
    pub lesson_weight: f64,
    /// The time limit of the solver, in seconds.
    pub solver_time_limit: f64,
}

impl Default for Policies {
    fn default() -> Self {
        Self {
            slots_per_day: 8,
            day_start: "08:30".to_string(),
            slot_duration: 30,
            slot_start_times: vec![],
            min_lessons: 1,
            max_lessons: 4,
            teacher_min_lessons: 0,
            teacher_max_lessons: None,
            repeats: RepeatPolicy::default(),
            require_all_subjects: true,
            allow_multi_teacher: true,
            use_attendance_priority: false,
            attendance_below_weight: 10.0,
            attendance_at_or_above_weight: 0.0,
            group_weight: 2.0,
            balance_teacher_load: false,
            balance_weight: 1.0,
            balance_target: BalanceTarget::Mean,
            consecutive_weight: 3.0,
            lesson_weight: 1.0,
            solver_time_limit: 120.0,
        }
    }
}

/// The target load teachers are balanced against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceTarget {
    /// The mean number of lessons per teacher, rounded up.
    Mean,
    /// A fixed number of lessons.
    Fixed(usize),
}

/// What happens when two lessons of a learner in the same subject take adjacent slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Adjacency {
    /// Such lessons may not be adjacent.
    Forbidden,
    /// No rule applies.
    Allowed,
    /// Adjacent lessons get a bonus.
    Preferred,
    /// All the lessons of a learner in a subject must be contiguous.
    Required,
}

/// Whether a learner may get several lessons in the same subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepeatPolicy {
    /// Whether repeats are allowed at all.
    pub allow_repeats: bool,
    /// The maximal number of lessons in a single subject.
    pub max_repeats: usize,
    /// If set, only these subjects may repeat.
    pub repeat_subjects: Option<Vec<SubjectId>>,
    /// The adjacency rule of repeated lessons.
    pub adjacency: Adjacency,
}

impl Default for RepeatPolicy {
    fn default() -> Self {
        Self {
            allow_repeats: false,
            max_repeats: 2,
            repeat_subjects: None,
            adjacency: Adjacency::Allowed,
        }
    }
}

impl RepeatPolicy {
    /// Returns the maximal number of lessons a learner may get in a subject.
    pub fn cap_for(&self, subject: SubjectId) -> usize {
        if !self.allow_repeats {
            return 1;
        }
        match &self.repeat_subjects {
            Some(list) if !list.contains(&subject) => 1,
            _ => usize::max(1, self.max_repeats),
        }
    }
}

/// A teacher, as given by the configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherRecord {
    /// The identifier of the teacher.
    pub id: TeacherId,
    /// The name of the teacher.
    pub name: String,
    /// The subjects the teacher teaches.
    #[serde(default)]
    pub subjects: Vec<SubjectId>,
    /// Overrides the global minimal number of lessons of teachers.
    #[serde(default)]
    pub min_lessons: Option<usize>,
    /// Overrides the global maximal number of lessons of teachers.
    #[serde(default)]
    pub max_lessons: Option<usize>,
    /// The slots in which the teacher is unavailable.
    #[serde(default)]
    pub unavailable: Vec<Slot>,
}

/// The settings shared by students and groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerSettings {
    /// The required subjects.
    pub subjects: Vec<SubjectId>,
    /// Overrides the global minimal number of lessons of learners.
    pub min_lessons: Option<usize>,
    /// Overrides the global maximal number of lessons of learners.
    pub max_lessons: Option<usize>,
    /// The slots in which the learner is unavailable.
    pub unavailable: Vec<Slot>,
    /// The teachers the learner does not accept.
    pub blocked_teachers: Vec<TeacherId>,
    /// The allowed locations; any location if missing.
    pub locations: Option<Vec<LocationId>>,
    /// Overrides the global repeat policy.
    pub repeats: Option<RepeatPolicy>,
    /// Overrides the global multi-teacher policy.
    pub allow_multi_teacher: Option<bool>,
}

fn default_active() -> bool {
    true
}

/// A student, as given by the configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    /// The identifier of the student.
    pub id: StudentId,
    /// The name of the student.
    pub name: String,
    /// Inactive students get no lesson.
    #[serde(default = "default_active")]
    pub active: bool,
    /// The scheduling settings of the student.
    #[serde(flatten)]
    pub settings: LearnerSettings,
}

/// A group of students, as given by the configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    /// The identifier of the group.
    pub id: GroupId,
    /// The name of the group.
    pub name: String,
    /// The students of the group.
    #[serde(default)]
    pub members: Vec<StudentId>,
    /// The scheduling settings of the group.
    #[serde(flatten)]
    pub settings: LearnerSettings,
}

fn default_min_percentage() -> f64 {
    80.0
}

/// A subject, as given by the configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectRecord {
    /// The identifier of the subject.
    pub id: SubjectId,
    /// The name of the subject.
    pub name: String,
    /// The attendance threshold, in percent.
    #[serde(default = "default_min_percentage")]
    pub min_percentage: f64,
    /// Overrides the global weight for attendance below the threshold.
    #[serde(default)]
    pub below_weight: Option<f64>,
    /// Overrides the global weight for attendance at or above the threshold.
    #[serde(default)]
    pub at_or_above_weight: Option<f64>,
}

/// A location, as given by the configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// The identifier of the location.
    pub id: LocationId,
    /// The name of the location.
    pub name: String,
}

/// A lesson that must appear in the timetable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedAssignmentRecord {
    /// The teacher of the lesson.
    pub teacher: TeacherId,
    /// The learner of the lesson.
    pub learner: LearnerRef,
    /// The subject of the lesson.
    pub subject: SubjectId,
    /// The slot of the lesson.
    pub slot: Slot,
    /// The location of the lesson; any allowed location if missing.
    #[serde(default)]
    pub location: Option<LocationId>,
}

/// The attendance history of a student in a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// The student.
    pub student: StudentId,
    /// The subject.
    pub subject: SubjectId,
    /// The number of lessons attended.
    pub attended: u32,
    /// The number of lessons scheduled.
    pub scheduled: u32,
}
