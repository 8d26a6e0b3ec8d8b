use super::constraint_graph::{
    Constraint, ConstraintBody, ConstraintGraph, ConstraintKind, SlotOccupancy, SoftCoverage,
};
use crate::domain::{Adjacency, Candidate, Occupant, SchedulingDomain, SubjectId};
use log::debug;
use std::collections::BTreeMap;

/// Compiles the hard rules of a scheduling domain into a [ConstraintGraph].
///
/// Each candidate placement of the domain is a decision variable of the graph,
/// identified by its index in [SchedulingDomain::candidates].
pub struct ConstraintCompiler<'a> {
    domain: &'a SchedulingDomain,
    by_learner: Vec<Vec<usize>>,
    by_learner_subject: BTreeMap<(usize, SubjectId), Vec<usize>>,
}

impl<'a> ConstraintCompiler<'a> {
    /// Builds a compiler for the given domain.
    pub fn new(domain: &'a SchedulingDomain) -> Self {
        let mut by_learner = vec![vec![]; domain.learners().len()];
        let mut by_learner_subject: BTreeMap<(usize, SubjectId), Vec<usize>> = BTreeMap::new();
        for (i, c) in domain.candidates().iter().enumerate() {
            by_learner[c.learner].push(i);
            by_learner_subject
                .entry((c.learner, c.subject))
                .or_default()
                .push(i);
        }
        Self {
            domain,
            by_learner,
            by_learner_subject,
        }
    }

    /// Compiles the constraint graph.
    pub fn compile(&self) -> ConstraintGraph {
        let mut graph = ConstraintGraph {
            n_candidates: self.domain.candidates().len(),
            ..Default::default()
        };
        self.compile_teacher_exclusivity(&mut graph);
        self.compile_learner_exclusivity(&mut graph);
        self.compile_location_exclusivity(&mut graph);
        self.compile_pins(&mut graph);
        self.compile_teacher_loads(&mut graph);
        self.compile_learner_loads(&mut graph);
        self.compile_coverage(&mut graph);
        self.compile_repeats(&mut graph);
        debug!(
            "compiled {} hard constraint(s) over {} candidate(s) ({} edges)",
            graph.constraints.len(),
            graph.n_candidates,
            graph.n_edges()
        );
        for (kind, n) in graph.count_by_kind() {
            debug!("  {}: {}", kind, n);
        }
        graph
    }

    fn candidates(&self) -> impl Iterator<Item = (usize, &Candidate)> + '_ {
        self.domain.candidates().iter().enumerate()
    }

    fn per_slot<F>(&self, filter: F) -> Vec<Vec<usize>>
    where
        F: Fn(&Candidate) -> bool,
    {
        let mut sets = vec![vec![]; self.domain.slots().len()];
        for (i, c) in self.candidates().filter(|(_, c)| filter(c)) {
            sets[c.slot].push(i);
        }
        sets
    }

    fn compile_teacher_exclusivity(&self, graph: &mut ConstraintGraph) {
        for (ti, teacher) in self.domain.teachers().iter().enumerate() {
            for (slot, set) in self.per_slot(|c| c.teacher == ti).into_iter().enumerate() {
                if set.len() >= 2 {
                    graph.constraints.push(Constraint {
                        kind: ConstraintKind::TeacherExclusivity,
                        description: format!(
                            "{} gives at most one lesson at slot {}",
                            teacher.name, slot
                        ),
                        body: ConstraintBody::AtMostOne(set),
                    });
                }
            }
        }
    }

    // Groups are covered through their members.
    fn compile_learner_exclusivity(&self, graph: &mut ConstraintGraph) {
        for learner in self.domain.learners().iter().filter(|l| !l.kind.is_group()) {
            let student = learner.occupied_students()[0];
            let occupying = self.domain.learners_occupying(student);
            for (slot, set) in self
                .per_slot(|c| occupying.contains(&c.learner))
                .into_iter()
                .enumerate()
            {
                if set.len() >= 2 {
                    graph.constraints.push(Constraint {
                        kind: ConstraintKind::LearnerExclusivity,
                        description: format!(
                            "{} attends at most one lesson at slot {}",
                            learner.name, slot
                        ),
                        body: ConstraintBody::AtMostOne(set),
                    });
                }
            }
        }
    }

    fn compile_location_exclusivity(&self, graph: &mut ConstraintGraph) {
        for location in self.domain.locations().iter() {
            for (slot, set) in self
                .per_slot(|c| c.location == Some(location.id))
                .into_iter()
                .enumerate()
            {
                if set.len() >= 2 {
                    graph.constraints.push(Constraint {
                        kind: ConstraintKind::LocationExclusivity,
                        description: format!(
                            "{} hosts at most one lesson at slot {}",
                            location.name, slot
                        ),
                        body: ConstraintBody::AtMostOne(set),
                    });
                }
            }
        }
    }

    fn compile_pins(&self, graph: &mut ConstraintGraph) {
        let learners = self.domain.learners();
        for (p, pin) in self.domain.pins().iter().enumerate() {
            let fixed_location = match pin.options.as_slice() {
                [single] => self.domain.candidates()[*single].location,
                _ => None,
            };
            let excluded = self
                .candidates()
                .filter(|(_, c)| c.pin != Some(p) && c.slot == pin.slot)
                .filter(|(_, c)| {
                    c.teacher == pin.teacher
                        || learners[c.learner].overlaps(&learners[pin.learner])
                        || (fixed_location.is_some() && c.location == fixed_location)
                })
                .map(|(i, _)| i)
                .collect();
            let mut pinned = self.domain.candidates()[pin.options[0]];
            if pin.options.len() > 1 {
                pinned.location = None;
            }
            graph.constraints.push(Constraint {
                kind: ConstraintKind::FixedAssignment,
                description: format!("{} is fixed", self.domain.describe_candidate(&pinned)),
                body: ConstraintBody::Pinned {
                    options: pin.options.clone(),
                    excluded,
                },
            });
        }
    }

    fn compile_teacher_loads(&self, graph: &mut ConstraintGraph) {
        for (ti, teacher) in self.domain.teachers().iter().enumerate() {
            let candidates: Vec<usize> = self
                .candidates()
                .filter(|(_, c)| c.teacher == ti)
                .map(|(i, _)| i)
                .collect();
            if teacher.min_lessons == 0 && (candidates.is_empty() || teacher.max_lessons.is_none()) {
                continue;
            }
            graph.constraints.push(Constraint {
                kind: ConstraintKind::TeacherLoad,
                description: format!(
                    "{} gives {}",
                    teacher.name,
                    describe_bounds(teacher.min_lessons, teacher.max_lessons)
                ),
                body: ConstraintBody::Bounds {
                    candidates,
                    min: teacher.min_lessons,
                    max: teacher.max_lessons,
                },
            });
        }
    }

    fn compile_learner_loads(&self, graph: &mut ConstraintGraph) {
        let require_all = self.domain.policies().require_all_subjects;
        for (li, learner) in self.domain.learners().iter().enumerate() {
            let candidates: Vec<usize> = if learner.kind.is_group() {
                self.by_learner[li].clone()
            } else {
                let occupying = self
                    .domain
                    .learners_occupying(learner.occupied_students()[0]);
                let mut all: Vec<usize> = occupying
                    .iter()
                    .flat_map(|l| self.by_learner[*l].iter().copied())
                    .collect();
                all.sort_unstable();
                all
            };
            if candidates.is_empty() {
                continue;
            }
            let min = if require_all { learner.min_lessons } else { 0 };
            let max = Some(learner.max_lessons);
            graph.constraints.push(Constraint {
                kind: ConstraintKind::LearnerLoad,
                description: format!("{} gets {}", learner.name, describe_bounds(min, max)),
                body: ConstraintBody::Bounds {
                    candidates,
                    min,
                    max,
                },
            });
        }
    }

    fn compile_coverage(&self, graph: &mut ConstraintGraph) {
        let require_all = self.domain.policies().require_all_subjects;
        for (li, learner) in self.domain.learners().iter().enumerate() {
            for subject in learner.subjects.iter() {
                let candidates = self
                    .by_learner_subject
                    .get(&(li, *subject))
                    .cloned()
                    .unwrap_or_default();
                if require_all {
                    graph.constraints.push(Constraint {
                        kind: ConstraintKind::SubjectCoverage,
                        description: format!(
                            "{} gets at least one lesson in {}",
                            learner.name,
                            self.domain.subject_name(*subject)
                        ),
                        body: ConstraintBody::AtLeastOne(candidates),
                    });
                } else if !candidates.is_empty() {
                    graph.soft_coverage.push(SoftCoverage {
                        learner: li,
                        subject: *subject,
                        candidates,
                    });
                }
            }
        }
    }

    fn compile_repeats(&self, graph: &mut ConstraintGraph) {
        for ((li, subject), candidates) in self.by_learner_subject.iter() {
            let learner = &self.domain.learners()[*li];
            let subject_name = self.domain.subject_name(*subject);
            let cap = learner.repeats.cap_for(*subject);
            let per_slot = self.per_slot(|c| c.learner == *li && c.subject == *subject);
            let n_slots = per_slot.iter().filter(|s| !s.is_empty()).count();
            if cap == 1 && candidates.len() >= 2 {
                graph.constraints.push(Constraint {
                    kind: ConstraintKind::RepeatLimit,
                    description: format!(
                        "{} gets at most one lesson in {}",
                        learner.name, subject_name
                    ),
                    body: ConstraintBody::AtMostOne(candidates.clone()),
                });
            } else if cap > 1 && cap < n_slots {
                graph.constraints.push(Constraint {
                    kind: ConstraintKind::RepeatLimit,
                    description: format!(
                        "{} gets at most {} lessons in {}",
                        learner.name, cap, subject_name
                    ),
                    body: ConstraintBody::Bounds {
                        candidates: candidates.clone(),
                        min: 0,
                        max: Some(cap),
                    },
                });
            }
            if cap == 1 {
                continue;
            }
            let occupancy = SlotOccupancy {
                learner: *li,
                subject: *subject,
                per_slot,
            };
            match learner.repeats.adjacency {
                Adjacency::Required if n_slots >= 2 => graph.constraints.push(Constraint {
                    kind: ConstraintKind::Contiguity,
                    description: format!(
                        "the lessons of {} in {} take contiguous slots",
                        learner.name, subject_name
                    ),
                    body: ConstraintBody::Contiguous(occupancy.per_slot.clone()),
                }),
                Adjacency::Forbidden if !occupancy.adjacent_pairs().is_empty() => {
                    graph.constraints.push(Constraint {
                        kind: ConstraintKind::NoAdjacentRepeat,
                        description: format!(
                            "the lessons of {} in {} are not adjacent",
                            learner.name, subject_name
                        ),
                        body: ConstraintBody::NotAdjacent(occupancy.per_slot.clone()),
                    })
                }
                Adjacency::Preferred if !occupancy.adjacent_pairs().is_empty() => {
                    graph.preferred_adjacency.push(occupancy)
                }
                _ => {}
            }
            if !learner.allow_multi_teacher {
                let mut per_teacher: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
                for i in candidates.iter() {
                    per_teacher
                        .entry(self.domain.candidates()[*i].teacher)
                        .or_default()
                        .push(*i);
                }
                if per_teacher.len() >= 2 {
                    graph.constraints.push(Constraint {
                        kind: ConstraintKind::SingleTeacher,
                        description: format!(
                            "the lessons of {} in {} are given by a single teacher",
                            learner.name, subject_name
                        ),
                        body: ConstraintBody::OneOf(per_teacher.into_values().collect()),
                    });
                }
            }
        }
    }
}

fn describe_bounds(min: usize, max: Option<usize>) -> String {
    match max {
        Some(max) if max == min => format!("exactly {} lesson(s)", min),
        Some(max) if min == 0 => format!("at most {} lesson(s)", max),
        Some(max) => format!("between {} and {} lessons", min, max),
        None => format!("at least {} lesson(s)", min),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConfigurationSnapshot, DomainBuilder, Slot};

    fn compile(json: &str) -> (SchedulingDomain, ConstraintGraph) {
        let snapshot = ConfigurationSnapshot::from_json_str(json).unwrap();
        let domain = DomainBuilder::new(&snapshot).build().unwrap();
        let graph = ConstraintCompiler::new(&domain).compile();
        (domain, graph)
    }

    fn of_kind(graph: &ConstraintGraph, kind: ConstraintKind) -> Vec<&Constraint> {
        graph.constraints().iter().filter(|c| c.kind == kind).collect()
    }

    #[test]
    fn test_two_students_one_slot() {
        let (_, graph) = compile(
            r#"{
                "policies": {"slots_per_day": 1, "min_lessons": 1, "max_lessons": 1},
                "subjects": [{"id": 1, "name": "A"}],
                "teachers": [{"id": 1, "name": "T", "subjects": [1]}],
                "students": [{"id": 1, "name": "S1", "subjects": [1]}, {"id": 2, "name": "S2", "subjects": [1]}]
            }"#,
        );
        assert_eq!(2, graph.n_candidates());
        let exclusivity = of_kind(&graph, ConstraintKind::TeacherExclusivity);
        assert_eq!(1, exclusivity.len());
        assert_eq!(ConstraintBody::AtMostOne(vec![0, 1]), exclusivity[0].body);
        assert_eq!("T gives at most one lesson at slot 0", exclusivity[0].description);
        assert_eq!(2, of_kind(&graph, ConstraintKind::SubjectCoverage).len());
        assert_eq!(2, of_kind(&graph, ConstraintKind::LearnerLoad).len());
        assert!(of_kind(&graph, ConstraintKind::LearnerExclusivity).is_empty());
        assert!(of_kind(&graph, ConstraintKind::TeacherLoad).is_empty());
    }

    #[test]
    fn test_teacher_minimum_without_candidates() {
        let (_, graph) = compile(
            r#"{
                "policies": {"slots_per_day": 2, "teacher_min_lessons": 1},
                "subjects": [{"id": 1, "name": "A"}, {"id": 2, "name": "B"}],
                "teachers": [
                    {"id": 1, "name": "T", "subjects": [1]},
                    {"id": 2, "name": "U", "subjects": [2]},
                    {"id": 3, "name": "V", "subjects": [2], "min_lessons": 0}
                ],
                "students": [{"id": 1, "name": "S", "subjects": [1]}]
            }"#,
        );
        let loads = of_kind(&graph, ConstraintKind::TeacherLoad);
        assert_eq!(2, loads.len());
        assert_eq!(
            ConstraintBody::Bounds {
                candidates: vec![0, 1],
                min: 1,
                max: None
            },
            loads[0].body
        );
        assert_eq!(
            ConstraintBody::Bounds {
                candidates: vec![],
                min: 1,
                max: None
            },
            loads[1].body
        );
        assert_eq!("U gives at least 1 lesson(s)", loads[1].description);
    }

    #[test]
    fn test_group_member_exclusivity_and_load() {
        let (domain, graph) = compile(
            r#"{
                "policies": {"slots_per_day": 2},
                "subjects": [{"id": 1, "name": "A"}, {"id": 2, "name": "B"}],
                "teachers": [{"id": 1, "name": "T", "subjects": [1]}, {"id": 2, "name": "U", "subjects": [2]}],
                "students": [{"id": 1, "name": "S", "subjects": [2]}],
                "groups": [{"id": 1, "name": "G", "members": [1], "subjects": [1]}]
            }"#,
        );
        assert_eq!(4, domain.candidates().len());
        let exclusivity = of_kind(&graph, ConstraintKind::LearnerExclusivity);
        assert_eq!(2, exclusivity.len());
        assert!(exclusivity.iter().all(|c| c.body.candidates().len() == 2));
        let loads = of_kind(&graph, ConstraintKind::LearnerLoad);
        assert_eq!(
            vec![4, 2],
            loads.iter().map(|c| c.body.candidates().len()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_pin_excludes_conflicting_candidates() {
        let (domain, graph) = compile(
            r#"{
                "policies": {"slots_per_day": 2},
                "subjects": [{"id": 1, "name": "A"}],
                "teachers": [{"id": 1, "name": "T", "subjects": [1]}],
                "students": [{"id": 1, "name": "S1", "subjects": [1]}, {"id": 2, "name": "S2", "subjects": [1]}],
                "fixed_assignments": [{"teacher": 1, "learner": {"student": 1}, "subject": 1, "slot": 1}]
            }"#,
        );
        let pins = of_kind(&graph, ConstraintKind::FixedAssignment);
        assert_eq!(1, pins.len());
        let excluded_slots: Vec<(usize, Slot)> = match &pins[0].body {
            ConstraintBody::Pinned { options, excluded } => {
                assert_eq!(&vec![0], options);
                excluded
                    .iter()
                    .map(|i| (domain.candidates()[*i].learner, domain.candidates()[*i].slot))
                    .collect()
            }
            _ => panic!(),
        };
        assert_eq!(vec![(1, 1)], excluded_slots);
        assert_eq!("S1 with T in A at slot 1 is fixed", pins[0].description);
    }

    #[test]
    fn test_soft_coverage_when_not_required() {
        let (_, graph) = compile(
            r#"{
                "policies": {"slots_per_day": 2, "require_all_subjects": false, "min_lessons": 2},
                "subjects": [{"id": 1, "name": "A"}],
                "teachers": [{"id": 1, "name": "T", "subjects": [1]}],
                "students": [{"id": 1, "name": "S", "subjects": [1]}]
            }"#,
        );
        assert!(of_kind(&graph, ConstraintKind::SubjectCoverage).is_empty());
        assert_eq!(1, graph.soft_coverage().len());
        match &of_kind(&graph, ConstraintKind::LearnerLoad)[0].body {
            ConstraintBody::Bounds { min, .. } => assert_eq!(0, *min),
            _ => panic!(),
        }
    }

    #[test]
    fn test_repeat_policies() {
        let (_, graph) = compile(
            r#"{
                "policies": {"slots_per_day": 4, "max_lessons": 4, "allow_multi_teacher": false,
                    "repeats": {"allow_repeats": true, "max_repeats": 2, "adjacency": "required"}},
                "subjects": [{"id": 1, "name": "A"}],
                "teachers": [{"id": 1, "name": "T", "subjects": [1]}, {"id": 2, "name": "U", "subjects": [1]}],
                "students": [{"id": 1, "name": "S", "subjects": [1]}]
            }"#,
        );
        let limits = of_kind(&graph, ConstraintKind::RepeatLimit);
        assert_eq!(1, limits.len());
        assert!(matches!(
            limits[0].body,
            ConstraintBody::Bounds { max: Some(2), .. }
        ));
        assert_eq!(1, of_kind(&graph, ConstraintKind::Contiguity).len());
        let single = of_kind(&graph, ConstraintKind::SingleTeacher);
        assert_eq!(1, single.len());
        assert!(matches!(&single[0].body, ConstraintBody::OneOf(sets) if sets.len() == 2));
    }

    #[test]
    fn test_preferred_adjacency() {
        let (_, graph) = compile(
            r#"{
                "policies": {"slots_per_day": 3, "repeats": {"allow_repeats": true, "adjacency": "preferred"}},
                "subjects": [{"id": 1, "name": "A"}],
                "teachers": [{"id": 1, "name": "T", "subjects": [1], "unavailable": [1]}],
                "students": [{"id": 1, "name": "S", "subjects": [1]}]
            }"#,
        );
        assert!(graph.preferred_adjacency().is_empty());
        let (_, graph) = compile(
            r#"{
                "policies": {"slots_per_day": 3, "repeats": {"allow_repeats": true, "adjacency": "preferred"}},
                "subjects": [{"id": 1, "name": "A"}],
                "teachers": [{"id": 1, "name": "T", "subjects": [1]}],
                "students": [{"id": 1, "name": "S", "subjects": [1]}]
            }"#,
        );
        assert_eq!(1, graph.preferred_adjacency().len());
        assert_eq!(
            vec![(0, 1), (1, 2)],
            graph.preferred_adjacency()[0].adjacent_pairs()
        );
    }
}
