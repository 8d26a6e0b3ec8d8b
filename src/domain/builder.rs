use super::{
    attendance::AttendanceTable,
    entities::{
        Candidate, Learner, LearnerKind, Location, Occupant, Pin, SchedulingDomain, Subject,
        Teacher, TimeSlot,
    },
    ids::{LearnerRef, LocationId, Slot, StudentId, SubjectId},
    issues::{ConfigurationErrors, ConfigurationIssue, PinConflict, PinIssue},
    snapshot::{ConfigurationSnapshot, FixedAssignmentRecord, LearnerSettings, Policies},
};
use chrono::{NaiveTime, Timelike};
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Builds the scheduling domain of a day from a configuration snapshot.
///
/// The builder checks the whole snapshot and reports every configuration issue it finds at once.
/// Once the snapshot is valid, it enumerates the candidate placements and turns the fixed assignments into pins.
///
/// # Example
///
/// ```
/// # use tabula::domain::{ConfigurationSnapshot, DomainBuilder};
/// let snapshot = ConfigurationSnapshot::from_json_str(r#"{
///     "policies": {"slots_per_day": 4},
///     "subjects": [{"id": 1, "name": "Maths"}],
///     "teachers": [{"id": 1, "name": "Alan", "subjects": [1]}],
///     "students": [{"id": 1, "name": "Ada", "subjects": [1]}]
/// }"#).unwrap();
/// let domain = DomainBuilder::new(&snapshot).build().unwrap();
/// assert_eq!(4, domain.candidates().len());
/// ```
pub struct DomainBuilder<'a> {
    snapshot: &'a ConfigurationSnapshot,
    issues: Vec<ConfigurationIssue>,
    warnings: Vec<String>,
}

impl<'a> DomainBuilder<'a> {
    /// Builds a new domain builder for the given snapshot.
    pub fn new(snapshot: &'a ConfigurationSnapshot) -> Self {
        Self {
            snapshot,
            issues: vec![],
            warnings: vec![],
        }
    }

    /// Checks the snapshot and builds the scheduling domain.
    ///
    /// If the snapshot contains configuration issues, all of them are returned.
    pub fn build(mut self) -> Result<SchedulingDomain, ConfigurationErrors> {
        let policies = self.snapshot.policies.clone();
        self.check_policies(&policies);
        let slots = self.build_slots(&policies);
        let subjects = self.build_subjects(&policies);
        let locations = self.build_locations();
        let teachers = self.build_teachers(&policies, &subjects);
        let attendance = AttendanceTable::new(&self.snapshot.attendance);
        let (learners, declared) =
            self.build_learners(&policies, &subjects, &teachers, &locations, &attendance);
        let pin_records = self.check_pins(&policies, &teachers, &learners, &declared, &locations);
        if !self.issues.is_empty() {
            return Err(ConfigurationErrors(self.issues));
        }
        let mut domain = SchedulingDomain {
            policies,
            slots,
            teachers,
            learners,
            subjects,
            locations,
            candidates: vec![],
            pins: vec![],
            warnings: vec![],
        };
        self.add_pins(&mut domain, &pin_records);
        self.add_candidates(&mut domain);
        self.check_coverage(&domain);
        if !self.issues.is_empty() {
            return Err(ConfigurationErrors(self.issues));
        }
        domain.warnings = self.warnings;
        info!(
            "the scheduling domain has {} teacher(s), {} learner(s), {} candidate placement(s) and {} pin(s)",
            domain.teachers.len(),
            domain.learners.len(),
            domain.candidates.len(),
            domain.pins.len()
        );
        Ok(domain)
    }

    fn issue(&mut self, issue: ConfigurationIssue) {
        debug!("configuration issue: {}", issue);
        self.issues.push(issue);
    }

    fn warning(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }

    fn check_policies(&mut self, policies: &Policies) {
        let mut invalid = |msg: String| self.issues.push(ConfigurationIssue::InvalidPolicy(msg));
        if policies.slots_per_day == 0 {
            invalid("slots_per_day must be positive".to_string());
        }
        if policies.min_lessons > policies.max_lessons {
            invalid(format!(
                "min_lessons ({}) is greater than max_lessons ({})",
                policies.min_lessons, policies.max_lessons
            ));
        }
        if matches!(policies.teacher_max_lessons, Some(m) if m < policies.teacher_min_lessons) {
            invalid(format!(
                "teacher_min_lessons ({}) is greater than teacher_max_lessons",
                policies.teacher_min_lessons
            ));
        }
        if policies.repeats.allow_repeats && policies.repeats.max_repeats == 0 {
            invalid("max_repeats must be positive when repeats are allowed".to_string());
        }
        let weights = [
            ("attendance_below_weight", policies.attendance_below_weight),
            (
                "attendance_at_or_above_weight",
                policies.attendance_at_or_above_weight,
            ),
            ("group_weight", policies.group_weight),
            ("balance_weight", policies.balance_weight),
            ("consecutive_weight", policies.consecutive_weight),
            ("lesson_weight", policies.lesson_weight),
        ];
        for (name, w) in weights {
            if !w.is_finite() {
                invalid(format!("{} must be a finite number", name));
            }
        }
        if policies.balance_weight < 0.0 {
            invalid("balance_weight must not be negative".to_string());
        }
        if !policies.solver_time_limit.is_finite() || policies.solver_time_limit <= 0.0 {
            invalid("solver_time_limit must be a positive number of seconds".to_string());
        }
    }

    fn build_slots(&mut self, policies: &Policies) -> Vec<TimeSlot> {
        let n = policies.slots_per_day;
        let starts: Vec<u32> = if policies.slot_start_times.is_empty() {
            let first = match parse_minutes(&policies.day_start) {
                Some(m) => m,
                None => {
                    self.issue(ConfigurationIssue::InvalidSlotTimes(format!(
                        r#""{}" is not a valid HH:MM time"#,
                        policies.day_start
                    )));
                    return vec![];
                }
            };
            if policies.slot_duration == 0 {
                self.issue(ConfigurationIssue::InvalidSlotTimes(
                    "slot_duration must be positive".to_string(),
                ));
                return vec![];
            }
            (0..n as u32)
                .map(|i| first + i * policies.slot_duration)
                .collect()
        } else {
            if policies.slot_start_times.len() != n {
                self.issue(ConfigurationIssue::InvalidSlotTimes(format!(
                    "{} start time(s) given for {} slot(s)",
                    policies.slot_start_times.len(),
                    n
                )));
                return vec![];
            }
            let mut starts = Vec::with_capacity(n);
            for s in policies.slot_start_times.iter() {
                match parse_minutes(s) {
                    Some(m) => starts.push(m),
                    None => {
                        self.issue(ConfigurationIssue::InvalidSlotTimes(format!(
                            r#""{}" is not a valid HH:MM time"#,
                            s
                        )));
                        return vec![];
                    }
                }
            }
            if let Some(i) = (1..n).find(|i| starts[*i] < starts[i - 1] + policies.slot_duration) {
                self.issue(ConfigurationIssue::InvalidSlotTimes(format!(
                    "slot {} starts before the end of slot {}",
                    i,
                    i - 1
                )));
                return vec![];
            }
            starts
        };
        if let Some(i) = starts.iter().position(|m| *m >= MINUTES_PER_DAY) {
            self.issue(ConfigurationIssue::InvalidSlotTimes(format!(
                "slot {} starts after the end of the day",
                i
            )));
            return vec![];
        }
        starts
            .into_iter()
            .enumerate()
            .filter_map(|(index, m)| {
                NaiveTime::from_hms_opt(m / 60, m % 60, 0).map(|start| TimeSlot { index, start })
            })
            .collect()
    }

    fn build_subjects(&mut self, policies: &Policies) -> BTreeMap<SubjectId, Subject> {
        let mut subjects = BTreeMap::new();
        for s in self.snapshot.subjects.iter() {
            if subjects.contains_key(&s.id) {
                self.issue(ConfigurationIssue::DuplicateId {
                    kind: "subject",
                    id: s.id.0,
                    context: "the configuration".to_string(),
                });
                continue;
            }
            let below_weight = s.below_weight.unwrap_or(policies.attendance_below_weight);
            let at_or_above_weight = s
                .at_or_above_weight
                .unwrap_or(policies.attendance_at_or_above_weight);
            if !s.min_percentage.is_finite() || !below_weight.is_finite() || !at_or_above_weight.is_finite() {
                self.issue(ConfigurationIssue::InvalidPolicy(format!(
                    "subject {} has a non finite threshold or weight",
                    s.name
                )));
            }
            subjects.insert(
                s.id,
                Subject {
                    id: s.id,
                    name: s.name.clone(),
                    min_percentage: s.min_percentage,
                    below_weight,
                    at_or_above_weight,
                },
            );
        }
        subjects
    }

    fn build_locations(&mut self) -> Vec<Location> {
        let mut locations: Vec<Location> = vec![];
        for l in self.snapshot.locations.iter() {
            if locations.iter().any(|other| other.id == l.id) {
                self.issue(ConfigurationIssue::DuplicateId {
                    kind: "location",
                    id: l.id.0,
                    context: "the configuration".to_string(),
                });
                continue;
            }
            locations.push(Location {
                id: l.id,
                name: l.name.clone(),
            });
        }
        locations
    }

    fn build_teachers(
        &mut self,
        policies: &Policies,
        subjects: &BTreeMap<SubjectId, Subject>,
    ) -> Vec<Teacher> {
        let mut teachers: Vec<Teacher> = vec![];
        for t in self.snapshot.teachers.iter() {
            if teachers.iter().any(|other| other.id == t.id) {
                self.issue(ConfigurationIssue::DuplicateId {
                    kind: "teacher",
                    id: t.id.0,
                    context: "the configuration".to_string(),
                });
                continue;
            }
            let context = format!("teacher {}", t.name);
            let taught = self.known_subjects(&context, &t.subjects, subjects);
            let unavailable = self.valid_slots(&context, &t.unavailable, policies.slots_per_day);
            let min_lessons = t.min_lessons.unwrap_or(policies.teacher_min_lessons);
            let max_lessons = t.max_lessons.or(policies.teacher_max_lessons);
            if matches!(max_lessons, Some(m) if m < min_lessons) {
                self.issue(ConfigurationIssue::InvalidPolicy(format!(
                    "{} has a minimal number of lessons ({}) greater than its maximal one",
                    context, min_lessons
                )));
            }
            teachers.push(Teacher {
                id: t.id,
                name: t.name.clone(),
                subjects: taught,
                min_lessons,
                max_lessons,
                unavailable,
            });
        }
        teachers
    }

    fn known_subjects(
        &mut self,
        context: &str,
        ids: &[SubjectId],
        subjects: &BTreeMap<SubjectId, Subject>,
    ) -> BTreeSet<SubjectId> {
        let mut result = BTreeSet::new();
        for id in ids {
            if subjects.contains_key(id) {
                result.insert(*id);
            } else {
                self.issue(ConfigurationIssue::UnknownReference {
                    kind: "subject",
                    id: id.0,
                    context: context.to_string(),
                });
            }
        }
        result
    }

    fn valid_slots(&mut self, context: &str, slots: &[Slot], slots_per_day: usize) -> BTreeSet<Slot> {
        let mut result = BTreeSet::new();
        for s in slots {
            if *s < slots_per_day {
                result.insert(*s);
            } else {
                self.issue(ConfigurationIssue::SlotOutOfRange {
                    context: context.to_string(),
                    slot: *s,
                    slots_per_day,
                });
            }
        }
        result
    }

    fn learner_from_settings(
        &mut self,
        kind: LearnerKind,
        name: &str,
        settings: &LearnerSettings,
        policies: &Policies,
        subjects: &BTreeMap<SubjectId, Subject>,
        teachers: &[Teacher],
        locations: &[Location],
    ) -> Learner {
        let context = match kind {
            LearnerKind::Individual(_) => format!("student {}", name),
            LearnerKind::Group { .. } => format!("group {}", name),
        };
        let required = self.known_subjects(&context, &settings.subjects, subjects);
        let unavailable = self.valid_slots(&context, &settings.unavailable, policies.slots_per_day);
        let mut blocked_teachers = BTreeSet::new();
        for t in settings.blocked_teachers.iter() {
            if teachers.iter().any(|teacher| teacher.id == *t) {
                blocked_teachers.insert(*t);
            } else {
                self.issue(ConfigurationIssue::UnknownReference {
                    kind: "teacher",
                    id: t.0,
                    context: context.clone(),
                });
            }
        }
        let allowed_locations = settings.locations.as_ref().map(|ids| {
            let mut allowed = BTreeSet::new();
            for l in ids {
                if locations.iter().any(|location| location.id == *l) {
                    allowed.insert(*l);
                } else {
                    self.issue(ConfigurationIssue::UnknownReference {
                        kind: "location",
                        id: l.0,
                        context: context.clone(),
                    });
                }
            }
            allowed
        });
        let repeats = settings
            .repeats
            .clone()
            .unwrap_or_else(|| policies.repeats.clone());
        if repeats.allow_repeats && repeats.max_repeats == 0 {
            self.issue(ConfigurationIssue::InvalidPolicy(format!(
                "{} allows repeats with a null maximal number of repeats",
                context
            )));
        }
        if let Some(list) = &repeats.repeat_subjects {
            self.known_subjects(&context, list, subjects);
        }
        let min_lessons = settings.min_lessons.unwrap_or(policies.min_lessons);
        let max_lessons = settings.max_lessons.unwrap_or(policies.max_lessons);
        if min_lessons > max_lessons {
            self.issue(ConfigurationIssue::InvalidPolicy(format!(
                "{} has a minimal number of lessons ({}) greater than its maximal one ({})",
                context, min_lessons, max_lessons
            )));
        }
        Learner {
            kind,
            name: name.to_string(),
            subjects: required,
            min_lessons,
            max_lessons,
            unavailable,
            blocked_teachers,
            locations: allowed_locations,
            repeats,
            allow_multi_teacher: settings
                .allow_multi_teacher
                .unwrap_or(policies.allow_multi_teacher),
            attendance: BTreeMap::new(),
        }
    }

    // Returns the learners and the subjects each one declares (before removing group-covered ones).
    fn build_learners(
        &mut self,
        policies: &Policies,
        subjects: &BTreeMap<SubjectId, Subject>,
        teachers: &[Teacher],
        locations: &[Location],
        attendance: &AttendanceTable,
    ) -> (Vec<Learner>, Vec<BTreeSet<SubjectId>>) {
        let mut learners: Vec<Learner> = vec![];
        let mut seen_students = BTreeSet::new();
        let mut inactive_students = BTreeSet::new();
        for s in self.snapshot.students.iter() {
            if !seen_students.insert(s.id) {
                self.issue(ConfigurationIssue::DuplicateId {
                    kind: "student",
                    id: s.id.0,
                    context: "the configuration".to_string(),
                });
                continue;
            }
            if !s.active {
                inactive_students.insert(s.id);
                continue;
            }
            let mut learner = self.learner_from_settings(
                LearnerKind::Individual(s.id),
                &s.name,
                &s.settings,
                policies,
                subjects,
                teachers,
                locations,
            );
            learner.attendance = learner
                .subjects
                .iter()
                .map(|subject| (*subject, attendance.of(s.id, *subject)))
                .collect();
            learners.push(learner);
        }
        let n_students = learners.len();
        let mut seen_groups = BTreeSet::new();
        for g in self.snapshot.groups.iter() {
            if !seen_groups.insert(g.id) {
                self.issue(ConfigurationIssue::DuplicateId {
                    kind: "group",
                    id: g.id.0,
                    context: "the configuration".to_string(),
                });
                continue;
            }
            let mut members: Vec<StudentId> = vec![];
            for m in g.members.iter() {
                if inactive_students.contains(m) {
                    self.warning(format!(
                        "inactive {} is ignored as a member of group {}",
                        m, g.name
                    ));
                } else if !seen_students.contains(m) {
                    self.issue(ConfigurationIssue::UnknownReference {
                        kind: "student",
                        id: m.0,
                        context: format!("group {}", g.name),
                    });
                } else if !members.contains(m) {
                    members.push(*m);
                }
            }
            if members.is_empty() {
                self.warning(format!("group {} has no active member and is ignored", g.name));
                continue;
            }
            let mut learner = self.learner_from_settings(
                LearnerKind::Group {
                    id: g.id,
                    members: members.clone(),
                },
                &g.name,
                &g.settings,
                policies,
                subjects,
                teachers,
                locations,
            );
            let (unavailable, blocked): (Vec<_>, Vec<_>) = learners[..n_students]
                .iter()
                .filter(|l| learner.kind.overlaps(&l.kind))
                .map(|l| (l.unavailable.clone(), l.blocked_teachers.clone()))
                .unzip();
            learner.unavailable.extend(unavailable.into_iter().flatten());
            learner.blocked_teachers.extend(blocked.into_iter().flatten());
            learner.attendance = learner
                .subjects
                .iter()
                .map(|subject| (*subject, attendance.median_of(&members, *subject)))
                .collect();
            learners.push(learner);
        }
        let declared: Vec<BTreeSet<SubjectId>> =
            learners.iter().map(|l| l.subjects.clone()).collect();
        if policies.group_weight == 0.0 {
            if learners.len() > n_students {
                self.warning(
                    "group lessons are disabled since the group weight is null".to_string(),
                );
            }
            learners[n_students..]
                .iter_mut()
                .for_each(|g| g.subjects.clear());
        } else {
            let (students, groups) = learners.split_at_mut(n_students);
            for student in students.iter_mut() {
                let covered: BTreeSet<SubjectId> = groups
                    .iter()
                    .filter(|g| g.kind.overlaps(&student.kind))
                    .flat_map(|g| g.subjects.iter().copied())
                    .collect();
                student.subjects.retain(|s| !covered.contains(s));
            }
        }
        (learners, declared)
    }

    fn describe_pin(
        &self,
        record: &FixedAssignmentRecord,
        teachers: &[Teacher],
        learners: &[Learner],
    ) -> String {
        let teacher = teachers
            .iter()
            .find(|t| t.id == record.teacher)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| record.teacher.to_string());
        let learner = learners
            .iter()
            .find(|l| l.reference() == record.learner)
            .map(|l| l.name.clone())
            .unwrap_or_else(|| record.learner.to_string());
        let subject = self
            .snapshot
            .subjects
            .iter()
            .find(|s| s.id == record.subject)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| record.subject.to_string());
        format!(
            "{} with {} in {} at slot {}",
            learner, teacher, subject, record.slot
        )
    }

    fn check_pins(
        &mut self,
        policies: &Policies,
        teachers: &[Teacher],
        learners: &[Learner],
        declared: &[BTreeSet<SubjectId>],
        locations: &[Location],
    ) -> Vec<(FixedAssignmentRecord, usize, usize, String)> {
        let mut valid = vec![];
        for record in self.snapshot.fixed_assignments.iter() {
            let description = self.describe_pin(record, teachers, learners);
            let context = format!("fixed assignment \"{}\"", description);
            let teacher = teachers.iter().position(|t| t.id == record.teacher);
            if teacher.is_none() {
                self.issue(ConfigurationIssue::UnknownReference {
                    kind: "teacher",
                    id: record.teacher.0,
                    context: context.clone(),
                });
            }
            let learner = learners.iter().position(|l| l.reference() == record.learner);
            if learner.is_none() {
                if self.is_ignored_learner(record.learner) {
                    self.warning(format!("{} involves an ignored learner and is dropped", context));
                    continue;
                }
                let (kind, id) = match record.learner {
                    LearnerRef::Student(s) => ("student", s.0),
                    LearnerRef::Group(g) => ("group", g.0),
                };
                self.issue(ConfigurationIssue::UnknownReference {
                    kind,
                    id,
                    context: context.clone(),
                });
            }
            if record.slot >= policies.slots_per_day {
                self.issue(ConfigurationIssue::SlotOutOfRange {
                    context: context.clone(),
                    slot: record.slot,
                    slots_per_day: policies.slots_per_day,
                });
                continue;
            }
            if let Some(l) = record.location {
                if !locations.iter().any(|location| location.id == l) {
                    self.issue(ConfigurationIssue::UnknownReference {
                        kind: "location",
                        id: l.0,
                        context: context.clone(),
                    });
                    continue;
                }
            }
            let (ti, li) = match (teacher, learner) {
                (Some(t), Some(l)) => (t, l),
                _ => continue,
            };
            let (t, l) = (&teachers[ti], &learners[li]);
            let mut reasons = vec![];
            if !t.subjects.contains(&record.subject) {
                reasons.push(PinIssue::SubjectNotTaught);
            }
            if !declared[li].contains(&record.subject) {
                reasons.push(PinIssue::SubjectNotRequired);
            }
            if !t.is_available(record.slot) {
                reasons.push(PinIssue::TeacherUnavailable);
            }
            if !l.is_available(record.slot) {
                reasons.push(PinIssue::LearnerUnavailable);
            }
            if !l.accepts_teacher(t.id) {
                reasons.push(PinIssue::TeacherBlocked);
            }
            let location_ok = match record.location {
                Some(location) => l.accepts_location(location),
                None => locations.is_empty() || locations.iter().any(|loc| l.accepts_location(loc.id)),
            };
            if !location_ok {
                reasons.push(PinIssue::LocationNotAllowed);
            }
            if reasons.is_empty() {
                valid.push((record.clone(), ti, li, description));
            } else {
                for reason in reasons {
                    self.issue(ConfigurationIssue::InvalidPin {
                        pin: description.clone(),
                        reason,
                    });
                }
            }
        }
        self.check_duplicate_pins(&valid, learners);
        valid
    }

    fn is_ignored_learner(&self, learner: LearnerRef) -> bool {
        match learner {
            LearnerRef::Student(s) => self
                .snapshot
                .students
                .iter()
                .any(|record| record.id == s && !record.active),
            LearnerRef::Group(g) => self.snapshot.groups.iter().any(|record| record.id == g),
        }
    }

    fn check_duplicate_pins(
        &mut self,
        pins: &[(FixedAssignmentRecord, usize, usize, String)],
        learners: &[Learner],
    ) {
        for (i, (p1, t1, l1, d1)) in pins.iter().enumerate() {
            for (p2, t2, l2, d2) in pins.iter().skip(i + 1) {
                if p1.slot != p2.slot {
                    continue;
                }
                let conflict = if t1 == t2 {
                    Some(PinConflict::TeacherSlot)
                } else if learners[*l1].overlaps(&learners[*l2]) {
                    Some(PinConflict::LearnerSlot)
                } else if p1.location.is_some() && p1.location == p2.location {
                    Some(PinConflict::LocationSlot)
                } else {
                    None
                };
                if let Some(conflict) = conflict {
                    self.issue(ConfigurationIssue::DuplicatePin {
                        pin: d1.clone(),
                        other: d2.clone(),
                        conflict,
                    });
                }
            }
        }
        let mut by_learner_subject: BTreeMap<(usize, SubjectId), Vec<&String>> = BTreeMap::new();
        for (p, _, l, d) in pins.iter() {
            by_learner_subject.entry((*l, p.subject)).or_default().push(d);
        }
        for ((l, subject), descriptions) in by_learner_subject {
            let cap = learners[l].repeats.cap_for(subject);
            for extra in descriptions.iter().skip(cap) {
                self.issue(ConfigurationIssue::DuplicatePin {
                    pin: (*extra).clone(),
                    other: descriptions[0].clone(),
                    conflict: PinConflict::RepeatedSubject,
                });
            }
        }
    }

    fn location_options(domain: &SchedulingDomain, learner: &Learner) -> Vec<Option<LocationId>> {
        if domain.locations.is_empty() {
            vec![None]
        } else {
            domain
                .locations
                .iter()
                .filter(|l| learner.accepts_location(l.id))
                .map(|l| Some(l.id))
                .collect()
        }
    }

    fn add_pins(
        &mut self,
        domain: &mut SchedulingDomain,
        records: &[(FixedAssignmentRecord, usize, usize, String)],
    ) {
        for (record, ti, li, _) in records.iter() {
            let locations = match record.location {
                Some(l) => vec![Some(l)],
                None => Self::location_options(domain, &domain.learners[*li]),
            };
            let pin_index = domain.pins.len();
            let options = locations
                .into_iter()
                .map(|location| {
                    domain.candidates.push(Candidate {
                        teacher: *ti,
                        learner: *li,
                        subject: record.subject,
                        slot: record.slot,
                        location,
                        pin: Some(pin_index),
                    });
                    domain.candidates.len() - 1
                })
                .collect();
            domain.pins.push(Pin {
                teacher: *ti,
                learner: *li,
                subject: record.subject,
                slot: record.slot,
                location: record.location,
                options,
            });
        }
    }

    fn add_candidates(&mut self, domain: &mut SchedulingDomain) {
        type Key = (usize, usize, SubjectId, Slot, Option<LocationId>);
        let pinned: BTreeSet<Key> = domain
            .candidates
            .iter()
            .map(|c| (c.teacher, c.learner, c.subject, c.slot, c.location))
            .collect();
        let mut candidates = vec![];
        for (li, learner) in domain.learners.iter().enumerate() {
            let locations = Self::location_options(domain, learner);
            for subject in learner.subjects.iter() {
                for (ti, teacher) in domain.teachers.iter().enumerate() {
                    if !teacher.subjects.contains(subject) || !learner.accepts_teacher(teacher.id) {
                        continue;
                    }
                    for slot in 0..domain.slots.len() {
                        if !teacher.is_available(slot) || !learner.is_available(slot) {
                            continue;
                        }
                        for location in locations.iter() {
                            if pinned.contains(&(ti, li, *subject, slot, *location)) {
                                continue;
                            }
                            candidates.push(Candidate {
                                teacher: ti,
                                learner: li,
                                subject: *subject,
                                slot,
                                location: *location,
                                pin: None,
                            });
                        }
                    }
                }
            }
        }
        domain.candidates.append(&mut candidates);
    }

    fn check_coverage(&mut self, domain: &SchedulingDomain) {
        for (li, learner) in domain.learners.iter().enumerate() {
            for subject in learner.subjects.iter() {
                let subject_name = domain.subject_name(*subject);
                if domain.eligible_teachers(learner, *subject).is_empty() {
                    self.issue(ConfigurationIssue::UnteachableSubject {
                        learner: learner.name.clone(),
                        subject: subject_name,
                    });
                } else if domain.policies.require_all_subjects
                    && !domain
                        .candidates
                        .iter()
                        .any(|c| c.learner == li && c.subject == *subject)
                {
                    self.issue(ConfigurationIssue::NoAvailablePlacement {
                        learner: learner.name.clone(),
                        subject: subject_name,
                    });
                }
            }
        }
    }
}

fn parse_minutes(s: &str) -> Option<u32> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .ok()
        .map(|t| t.hour() * 60 + t.minute())
}
