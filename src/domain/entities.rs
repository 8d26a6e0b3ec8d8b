use super::{
    ids::{GroupId, LearnerRef, LocationId, Slot, StudentId, SubjectId, TeacherId},
    snapshot::{Policies, RepeatPolicy},
};
use chrono::NaiveTime;
use std::collections::{BTreeMap, BTreeSet};

/// A time slot of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    /// The index of the slot in the day.
    pub index: Slot,
    /// The wall-clock start time, only used for display.
    pub start: NaiveTime,
}

/// A teacher of the scheduling domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Teacher {
    /// The identifier of the teacher.
    pub id: TeacherId,
    /// The name of the teacher.
    pub name: String,
    /// The subjects the teacher teaches.
    pub subjects: BTreeSet<SubjectId>,
    /// The minimal number of lessons of the teacher.
    pub min_lessons: usize,
    /// The maximal number of lessons of the teacher, if any.
    pub max_lessons: Option<usize>,
    /// The slots in which the teacher is unavailable.
    pub unavailable: BTreeSet<Slot>,
}

impl Teacher {
    /// Returns `true` iff the teacher can give a lesson in this slot.
    pub fn is_available(&self, slot: Slot) -> bool {
        !self.unavailable.contains(&slot)
    }
}

/// The capability of occupying some students during a time slot.
pub trait Occupant {
    /// Returns the students a lesson of this occupant involves.
    fn occupied_students(&self) -> &[StudentId];

    /// Returns `true` iff two lessons of these occupants cannot take place in the same slot.
    fn overlaps(&self, other: &dyn Occupant) -> bool {
        self.occupied_students()
            .iter()
            .any(|s| other.occupied_students().contains(s))
    }
}

/// A schedulable unit: either an individual student or a group of students.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LearnerKind {
    /// A single student.
    Individual(StudentId),
    /// A group of students attending lessons together.
    Group {
        /// The identifier of the group.
        id: GroupId,
        /// The members of the group.
        members: Vec<StudentId>,
    },
}

impl LearnerKind {
    /// Returns the reference of this learner.
    pub fn reference(&self) -> LearnerRef {
        match self {
            LearnerKind::Individual(id) => LearnerRef::Student(*id),
            LearnerKind::Group { id, .. } => LearnerRef::Group(*id),
        }
    }

    /// Returns `true` iff this learner is a group.
    pub fn is_group(&self) -> bool {
        matches!(self, LearnerKind::Group { .. })
    }
}

impl Occupant for LearnerKind {
    fn occupied_students(&self) -> &[StudentId] {
        match self {
            LearnerKind::Individual(id) => std::slice::from_ref(id),
            LearnerKind::Group { members, .. } => members,
        }
    }
}

/// A learner of the scheduling domain.
#[derive(Debug, Clone, PartialEq)]
pub struct Learner {
    /// Whether this learner is a student or a group.
    pub kind: LearnerKind,
    /// The name of the learner.
    pub name: String,
    /// The subjects this learner must be scheduled in on its own behalf.
    pub subjects: BTreeSet<SubjectId>,
    /// The minimal number of lessons of the learner.
    pub min_lessons: usize,
    /// The maximal number of lessons of the learner.
    pub max_lessons: usize,
    /// The slots in which the learner is unavailable.
    pub unavailable: BTreeSet<Slot>,
    /// The teachers the learner does not accept.
    pub blocked_teachers: BTreeSet<TeacherId>,
    /// The allowed locations; any if missing.
    pub locations: Option<BTreeSet<LocationId>>,
    /// The repeat policy of the learner.
    pub repeats: RepeatPolicy,
    /// Whether several teachers may teach the learner the same subject.
    pub allow_multi_teacher: bool,
    /// The attendance percentage in each subject (the median of the members for groups).
    pub attendance: BTreeMap<SubjectId, f64>,
}

impl Learner {
    /// Returns the reference of this learner.
    pub fn reference(&self) -> LearnerRef {
        self.kind.reference()
    }

    /// Returns `true` iff this learner can get a lesson in this slot.
    pub fn is_available(&self, slot: Slot) -> bool {
        !self.unavailable.contains(&slot)
    }

    /// Returns `true` iff this learner accepts lessons from this teacher.
    pub fn accepts_teacher(&self, teacher: TeacherId) -> bool {
        !self.blocked_teachers.contains(&teacher)
    }

    /// Returns `true` iff this learner may get a lesson in this location.
    pub fn accepts_location(&self, location: LocationId) -> bool {
        match &self.locations {
            Some(allowed) => allowed.contains(&location),
            None => true,
        }
    }

    /// Returns the attendance percentage of this learner in a subject.
    pub fn attendance_in(&self, subject: SubjectId) -> f64 {
        self.attendance.get(&subject).copied().unwrap_or(0.0)
    }
}

impl Occupant for Learner {
    fn occupied_students(&self) -> &[StudentId] {
        self.kind.occupied_students()
    }
}

/// A subject of the scheduling domain.
#[derive(Debug, Clone, PartialEq)]
pub struct Subject {
    /// The identifier of the subject.
    pub id: SubjectId,
    /// The name of the subject.
    pub name: String,
    /// The attendance percentage under which the learners are prioritized.
    pub min_percentage: f64,
    /// The weight of placements for learners under the threshold.
    pub below_weight: f64,
    /// The weight of placements for learners at or above the threshold.
    pub at_or_above_weight: f64,
}

/// A location of the scheduling domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// The identifier of the location.
    pub id: LocationId,
    /// The name of the location.
    pub name: String,
}

/// A candidate placement: a lesson that may appear in the timetable.
///
/// Teachers and learners are given by their index in the domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Candidate {
    /// The index of the teacher.
    pub teacher: usize,
    /// The index of the learner.
    pub learner: usize,
    /// The subject of the lesson.
    pub subject: SubjectId,
    /// The slot of the lesson.
    pub slot: Slot,
    /// The location of the lesson, if locations are in use.
    pub location: Option<LocationId>,
    /// The index of the fixed assignment this candidate realizes, if any.
    pub pin: Option<usize>,
}

/// A validated fixed assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin {
    /// The index of the teacher.
    pub teacher: usize,
    /// The index of the learner.
    pub learner: usize,
    /// The subject of the lesson.
    pub subject: SubjectId,
    /// The slot of the lesson.
    pub slot: Slot,
    /// The location of the lesson, if one is fixed.
    pub location: Option<LocationId>,
    /// The indices of the candidates that realize this pin (one per possible location).
    pub options: Vec<usize>,
}

/// The canonical scheduling domain of a day.
///
/// It is built by the [DomainBuilder](super::DomainBuilder) from a configuration snapshot.
#[derive(Debug, Clone)]
pub struct SchedulingDomain {
    pub(crate) policies: Policies,
    pub(crate) slots: Vec<TimeSlot>,
    pub(crate) teachers: Vec<Teacher>,
    pub(crate) learners: Vec<Learner>,
    pub(crate) subjects: BTreeMap<SubjectId, Subject>,
    pub(crate) locations: Vec<Location>,
    pub(crate) candidates: Vec<Candidate>,
    pub(crate) pins: Vec<Pin>,
    pub(crate) warnings: Vec<String>,
}

impl SchedulingDomain {
    /// Returns the policies in use.
    pub fn policies(&self) -> &Policies {
        &self.policies
    }

    /// Returns the time slots of the day.
    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    /// Returns the teachers.
    pub fn teachers(&self) -> &[Teacher] {
        &self.teachers
    }

    /// Returns the learners; individual students come first, then groups.
    pub fn learners(&self) -> &[Learner] {
        &self.learners
    }

    /// Returns a subject given its id.
    pub fn subject(&self, id: SubjectId) -> Option<&Subject> {
        self.subjects.get(&id)
    }

    /// Returns the name of a subject, or its id if it is unknown.
    pub fn subject_name(&self, id: SubjectId) -> String {
        self.subjects
            .get(&id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Returns the locations.
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Returns the name of a location, or its id if it is unknown.
    pub fn location_name(&self, id: LocationId) -> String {
        self.locations
            .iter()
            .find(|l| l.id == id)
            .map(|l| l.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Returns the candidate placements, pinned ones included.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Returns the validated fixed assignments.
    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }

    /// Returns the non-fatal anomalies found while building the domain.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Returns the indices of the learners occupying a student (the student itself and its groups).
    pub fn learners_occupying(&self, student: StudentId) -> Vec<usize> {
        self.learners
            .iter()
            .enumerate()
            .filter(|(_, l)| l.occupied_students().contains(&student))
            .map(|(i, _)| i)
            .collect()
    }

    /// Returns the index of a learner given its reference.
    pub fn learner_index(&self, r: LearnerRef) -> Option<usize> {
        self.learners.iter().position(|l| l.reference() == r)
    }

    /// Returns the teachers a learner may get a lesson in a subject from, regardless of their availability.
    pub fn eligible_teachers(&self, learner: &Learner, subject: SubjectId) -> Vec<TeacherId> {
        self.teachers
            .iter()
            .filter(|t| t.subjects.contains(&subject) && learner.accepts_teacher(t.id))
            .map(|t| t.id)
            .collect()
    }

    /// Returns a human readable description of a candidate placement.
    pub fn describe_candidate(&self, c: &Candidate) -> String {
        let location = c
            .location
            .map(|l| format!(" in {}", self.location_name(l)))
            .unwrap_or_default();
        format!(
            "{} with {} in {} at slot {}{}",
            self.learners[c.learner].name,
            self.teachers[c.teacher].name,
            self.subject_name(c.subject),
            c.slot,
            location
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occupant_overlap() {
        let s1 = LearnerKind::Individual(StudentId(1));
        let s2 = LearnerKind::Individual(StudentId(2));
        let g = LearnerKind::Group {
            id: GroupId(1),
            members: vec![StudentId(2), StudentId(3)],
        };
        assert!(!s1.overlaps(&s2));
        assert!(s2.overlaps(&g));
        assert!(g.overlaps(&s2));
        assert!(!g.overlaps(&s1));
        assert_eq!(LearnerRef::Group(GroupId(1)), g.reference());
    }
}
