use crate::domain::{
    GroupId, LearnerKind, LearnerRef, LocationId, Occupant, SchedulingDomain, Slot, StudentId,
    SubjectId, TeacherId,
};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// A lesson of the timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    /// The teacher giving the lesson.
    pub teacher: TeacherId,
    /// The student or group attending the lesson.
    pub learner: LearnerRef,
    /// The subject of the lesson.
    pub subject: SubjectId,
    /// The slot of the lesson.
    pub slot: Slot,
    /// The wall-clock start time of the slot.
    pub start_time: NaiveTime,
    /// The location of the lesson, if any.
    pub location: Option<LocationId>,
    /// The day of the lesson.
    pub date: NaiveDate,
    /// Whether the lesson comes from a fixed assignment.
    pub fixed: bool,
}

/// A required subject a learner got no lesson in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmetSubject {
    /// The learner missing the subject.
    pub learner: LearnerRef,
    /// The name of the learner.
    pub learner_name: String,
    /// The missing subject.
    pub subject: SubjectId,
    /// The name of the subject.
    pub subject_name: String,
}

/// The number of lessons given by a teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherCount {
    /// The teacher.
    pub teacher: TeacherId,
    /// The name of the teacher.
    pub name: String,
    /// The number of lessons given by the teacher.
    pub lessons: usize,
}

/// The number of lessons hosted by a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationCount {
    /// The location.
    pub location: LocationId,
    /// The name of the location.
    pub name: String,
    /// The number of lessons hosted by the location.
    pub lessons: usize,
}

/// The members of a group at solve time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    /// The group.
    pub group: GroupId,
    /// The name of the group.
    pub name: String,
    /// The members of the group on the day of the timetable.
    pub members: Vec<StudentId>,
}

/// A scheduled attendance of a student, group lessons being expanded to their members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    /// The attending student.
    pub student: StudentId,
    /// The subject of the lesson.
    pub subject: SubjectId,
    /// The slot of the lesson.
    pub slot: Slot,
    /// The day of the lesson.
    pub date: NaiveDate,
}

/// The timetable of a day together with its reporting data.
///
/// This is the unit handed to a [LessonStore](super::LessonStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonBatch {
    /// The day of the timetable.
    pub date: NaiveDate,
    /// The lessons, sorted by slot, teacher and learner.
    pub lessons: Vec<Lesson>,
    /// The required subjects left without lesson.
    pub unmet_subjects: Vec<UnmetSubject>,
    /// The number of lessons of each teacher.
    pub teacher_counts: Vec<TeacherCount>,
    /// The number of lessons in each location.
    pub location_counts: Vec<LocationCount>,
    /// The members of the groups having a lesson.
    pub group_snapshots: Vec<GroupSnapshot>,
    /// One entry per attending student and lesson.
    pub attendance: Vec<AttendanceEntry>,
    /// The value of the objective function.
    pub objective: f64,
    /// Whether the objective value is proven optimal.
    pub optimal: bool,
}

/// Translates scheduled candidate placements into lessons and reporting data.
pub struct SolutionExtractor<'a> {
    domain: &'a SchedulingDomain,
    date: NaiveDate,
}

impl<'a> SolutionExtractor<'a> {
    /// Builds an extractor for the timetable of the given day.
    pub fn new(domain: &'a SchedulingDomain, date: NaiveDate) -> Self {
        Self { domain, date }
    }

    /// Builds the lessons matching the scheduled candidate placements, ordered by slot and teacher.
    pub fn lessons(&self, placements: &[usize]) -> Vec<Lesson> {
        let mut lessons: Vec<Lesson> = placements
            .iter()
            .map(|i| {
                let c = &self.domain.candidates()[*i];
                Lesson {
                    teacher: self.domain.teachers()[c.teacher].id,
                    learner: self.domain.learners()[c.learner].reference(),
                    subject: c.subject,
                    slot: c.slot,
                    start_time: self.domain.slots()[c.slot].start,
                    location: c.location,
                    date: self.date,
                    fixed: c.pin.is_some(),
                }
            })
            .collect();
        lessons.sort_by_key(|l| (l.slot, l.teacher, l.learner));
        lessons
    }

    /// Returns the lessons every timetable contains: the fixed assignments with a single possible location.
    ///
    /// Returns [Option::None] if there is no such lesson.
    pub fn certain_lessons(&self) -> Option<Vec<Lesson>> {
        let placements: Vec<usize> = self
            .domain
            .pins()
            .iter()
            .filter(|p| p.options.len() == 1)
            .map(|p| p.options[0])
            .collect();
        if placements.is_empty() {
            None
        } else {
            Some(self.lessons(&placements))
        }
    }

    /// Builds the whole batch of a solved timetable.
    pub fn extract(&self, placements: &[usize], objective: f64, optimal: bool) -> LessonBatch {
        let lessons = self.lessons(placements);
        LessonBatch {
            date: self.date,
            unmet_subjects: self.unmet_subjects(&lessons),
            teacher_counts: self
                .domain
                .teachers()
                .iter()
                .map(|t| TeacherCount {
                    teacher: t.id,
                    name: t.name.clone(),
                    lessons: lessons.iter().filter(|l| l.teacher == t.id).count(),
                })
                .collect(),
            location_counts: self
                .domain
                .locations()
                .iter()
                .map(|loc| LocationCount {
                    location: loc.id,
                    name: loc.name.clone(),
                    lessons: lessons
                        .iter()
                        .filter(|l| l.location == Some(loc.id))
                        .count(),
                })
                .collect(),
            group_snapshots: self.group_snapshots(&lessons),
            attendance: self.attendance(&lessons),
            lessons,
            objective,
            optimal,
        }
    }

    fn unmet_subjects(&self, lessons: &[Lesson]) -> Vec<UnmetSubject> {
        let mut unmet = vec![];
        for learner in self.domain.learners() {
            let reference = learner.reference();
            for subject in learner.subjects.iter() {
                if !lessons
                    .iter()
                    .any(|l| l.learner == reference && l.subject == *subject)
                {
                    unmet.push(UnmetSubject {
                        learner: reference,
                        learner_name: learner.name.clone(),
                        subject: *subject,
                        subject_name: self.domain.subject_name(*subject),
                    });
                }
            }
        }
        unmet
    }

    fn group_snapshots(&self, lessons: &[Lesson]) -> Vec<GroupSnapshot> {
        self.domain
            .learners()
            .iter()
            .filter_map(|l| match &l.kind {
                LearnerKind::Group { id, members }
                    if lessons.iter().any(|lesson| lesson.learner == LearnerRef::Group(*id)) =>
                {
                    Some(GroupSnapshot {
                        group: *id,
                        name: l.name.clone(),
                        members: members.clone(),
                    })
                }
                _ => None,
            })
            .collect()
    }

    fn attendance(&self, lessons: &[Lesson]) -> Vec<AttendanceEntry> {
        let mut entries = vec![];
        for lesson in lessons {
            if let Some(i) = self.domain.learner_index(lesson.learner) {
                for student in self.domain.learners()[i].occupied_students() {
                    entries.push(AttendanceEntry {
                        student: *student,
                        subject: lesson.subject,
                        slot: lesson.slot,
                        date: self.date,
                    });
                }
            }
        }
        entries.sort_by_key(|e| (e.student, e.slot));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConfigurationSnapshot, DomainBuilder};

    fn domain() -> SchedulingDomain {
        let snapshot = ConfigurationSnapshot::from_json_str(
            r#"{
                "policies": {"slots_per_day": 2, "require_all_subjects": false},
                "subjects": [{"id": 1, "name": "A"}, {"id": 2, "name": "B"}],
                "locations": [{"id": 1, "name": "Room"}],
                "teachers": [{"id": 1, "name": "T", "subjects": [1, 2]}, {"id": 2, "name": "U", "subjects": [1]}],
                "students": [{"id": 1, "name": "S1", "subjects": [2]}, {"id": 2, "name": "S2"}],
                "groups": [{"id": 1, "name": "G", "members": [1, 2], "subjects": [1]}],
                "fixed_assignments": [{"teacher": 2, "learner": {"group": 1}, "subject": 1, "slot": 1, "location": 1}]
            }"#,
        )
        .unwrap();
        DomainBuilder::new(&snapshot).build().unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
    }

    #[test]
    fn test_extract_batch() {
        let domain = domain();
        let extractor = SolutionExtractor::new(&domain, date());
        let batch = extractor.extract(&[0], 2.0, true);
        assert_eq!(
            vec![Lesson {
                teacher: TeacherId(2),
                learner: LearnerRef::Group(GroupId(1)),
                subject: SubjectId(1),
                slot: 1,
                start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                location: Some(LocationId(1)),
                date: date(),
                fixed: true,
            }],
            batch.lessons
        );
        assert_eq!(1, batch.unmet_subjects.len());
        assert_eq!("B", batch.unmet_subjects[0].subject_name);
        assert_eq!(
            vec![0, 1],
            batch.teacher_counts.iter().map(|c| c.lessons).collect::<Vec<_>>()
        );
        assert_eq!(1, batch.location_counts[0].lessons);
        assert_eq!(
            vec![StudentId(1), StudentId(2)],
            batch.group_snapshots[0].members
        );
        assert_eq!(
            vec![StudentId(1), StudentId(2)],
            batch.attendance.iter().map(|e| e.student).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_certain_lessons() {
        let domain = domain();
        let extractor = SolutionExtractor::new(&domain, date());
        let lessons = extractor.certain_lessons().unwrap();
        assert_eq!(1, lessons.len());
        assert!(lessons[0].fixed);
    }

    #[test]
    fn test_batch_serialization() {
        let domain = domain();
        let batch = SolutionExtractor::new(&domain, date()).extract(&[0], 2.0, true);
        let json = serde_json::to_string(&batch).unwrap();
        assert!(json.contains(r#""learner":{"group":1}"#));
        assert!(json.contains(r#""date":"2024-09-02""#));
        assert_eq!(batch, serde_json::from_str::<LessonBatch>(&json).unwrap());
    }
}
