use crate::domain::{SubjectId, Slot};

/// The rule a hard constraint comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum_macros::Display)]
pub enum ConstraintKind {
    /// A teacher gives at most one lesson per slot.
    #[strum(serialize = "teacher exclusivity")]
    TeacherExclusivity,
    /// A learner, or any group containing a student, gets at most one lesson per slot.
    #[strum(serialize = "learner exclusivity")]
    LearnerExclusivity,
    /// A location hosts at most one lesson per slot.
    #[strum(serialize = "location exclusivity")]
    LocationExclusivity,
    /// A fixed lesson takes place.
    #[strum(serialize = "fixed assignment")]
    FixedAssignment,
    /// The number of lessons of a teacher lies in its bounds.
    #[strum(serialize = "teacher load")]
    TeacherLoad,
    /// The number of lessons of a learner lies in its bounds.
    #[strum(serialize = "learner load")]
    LearnerLoad,
    /// A learner gets a lesson in each required subject.
    #[strum(serialize = "subject coverage")]
    SubjectCoverage,
    /// A learner gets a limited number of lessons in a subject.
    #[strum(serialize = "repeat limit")]
    RepeatLimit,
    /// The lessons of a learner in a subject are contiguous.
    #[strum(serialize = "contiguity")]
    Contiguity,
    /// The lessons of a learner in a subject are not adjacent.
    #[strum(serialize = "no adjacent repeat")]
    NoAdjacentRepeat,
    /// The lessons of a learner in a subject share one teacher.
    #[strum(serialize = "single teacher")]
    SingleTeacher,
}

impl ConstraintKind {
    /// Returns the diagnostic category of this kind of constraint.
    pub fn category(&self) -> DiagnosticCategory {
        match self {
            ConstraintKind::TeacherExclusivity => DiagnosticCategory::TeacherAvailability,
            ConstraintKind::TeacherLoad => DiagnosticCategory::TeacherLimits,
            ConstraintKind::LearnerExclusivity | ConstraintKind::SubjectCoverage => {
                DiagnosticCategory::LearnerAvailability
            }
            ConstraintKind::LearnerLoad => DiagnosticCategory::LearnerLimits,
            ConstraintKind::RepeatLimit
            | ConstraintKind::Contiguity
            | ConstraintKind::NoAdjacentRepeat
            | ConstraintKind::SingleTeacher => DiagnosticCategory::RepeatRestrictions,
            ConstraintKind::LocationExclusivity => DiagnosticCategory::LocationRestriction,
            ConstraintKind::FixedAssignment => DiagnosticCategory::FixedAssignment,
        }
    }
}

/// A family of constraints, used to summarize infeasibility diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum_macros::Display)]
pub enum DiagnosticCategory {
    /// Teachers cannot be in two places at once.
    #[strum(serialize = "teacher availability")]
    TeacherAvailability,
    /// Bounds on the number of lessons of teachers.
    #[strum(serialize = "teacher limits")]
    TeacherLimits,
    /// Learners cannot be in two places at once, nor miss a subject.
    #[strum(serialize = "learner availability")]
    LearnerAvailability,
    /// Bounds on the number of lessons of learners.
    #[strum(serialize = "learner limits")]
    LearnerLimits,
    /// Rules on repeated lessons in a subject.
    #[strum(serialize = "repeat restrictions")]
    RepeatRestrictions,
    /// Locations host one lesson at a time.
    #[strum(serialize = "location restriction")]
    LocationRestriction,
    /// Lessons fixed by the configuration.
    #[strum(serialize = "fixed assignment")]
    FixedAssignment,
}

impl DiagnosticCategory {
    /// Returns a one-line explanation of the way this category of constraints may prevent a timetable.
    pub fn explanation(&self) -> &'static str {
        match self {
            DiagnosticCategory::TeacherAvailability => {
                "teachers cannot give the required lessons in the slots they share with their learners"
            }
            DiagnosticCategory::TeacherLimits => {
                "the minimal or maximal number of lessons of some teachers cannot be met"
            }
            DiagnosticCategory::LearnerAvailability => {
                "some learners cannot get all their required subjects in their available slots"
            }
            DiagnosticCategory::LearnerLimits => {
                "the minimal or maximal number of lessons of some learners cannot be met"
            }
            DiagnosticCategory::RepeatRestrictions => {
                "the repeat policy prevents some learners from getting enough lessons"
            }
            DiagnosticCategory::LocationRestriction => {
                "there are not enough allowed locations in some slots"
            }
            DiagnosticCategory::FixedAssignment => {
                "some fixed assignments leave no room for the other lessons"
            }
        }
    }
}

/// The logical content of a constraint, expressed over candidate placement indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintBody {
    /// At most one of the candidates is scheduled.
    AtMostOne(Vec<usize>),
    /// At least one of the candidates is scheduled.
    AtLeastOne(Vec<usize>),
    /// The number of scheduled candidates lies in `[min, max]`.
    Bounds {
        candidates: Vec<usize>,
        min: usize,
        max: Option<usize>,
    },
    /// One of the options is scheduled, and none of the excluded candidates is.
    Pinned {
        options: Vec<usize>,
        excluded: Vec<usize>,
    },
    /// The slots occupied by the candidates are contiguous.
    ///
    /// Each entry lists the candidates falling in one slot, in slot order.
    Contiguous(Vec<Vec<usize>>),
    /// No two consecutive slots are occupied.
    ///
    /// Each entry lists the candidates falling in one slot, in slot order.
    NotAdjacent(Vec<Vec<usize>>),
    /// At most one of the candidate sets has a scheduled candidate.
    OneOf(Vec<Vec<usize>>),
}

impl ConstraintBody {
    /// Returns the candidates involved in this constraint.
    pub fn candidates(&self) -> Vec<usize> {
        let mut result = match self {
            ConstraintBody::AtMostOne(v) | ConstraintBody::AtLeastOne(v) => v.clone(),
            ConstraintBody::Bounds { candidates, .. } => candidates.clone(),
            ConstraintBody::Pinned { options, excluded } => {
                options.iter().chain(excluded.iter()).copied().collect()
            }
            ConstraintBody::Contiguous(sets)
            | ConstraintBody::NotAdjacent(sets)
            | ConstraintBody::OneOf(sets) => sets.iter().flatten().copied().collect(),
        };
        result.sort_unstable();
        result.dedup();
        result
    }
}

/// A hard constraint of the timetable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    /// The rule the constraint comes from.
    pub kind: ConstraintKind,
    /// A human readable description of the constraint.
    pub description: String,
    /// The logical content of the constraint.
    pub body: ConstraintBody,
}

/// A learner subject left to the objective function, when subject coverage is not required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftCoverage {
    /// The index of the learner.
    pub learner: usize,
    /// The required subject.
    pub subject: SubjectId,
    /// The candidates covering the subject for the learner.
    pub candidates: Vec<usize>,
}

/// The sets of candidates a learner may get in a subject, one per slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotOccupancy {
    /// The index of the learner.
    pub learner: usize,
    /// The subject.
    pub subject: SubjectId,
    /// The candidates of the learner in the subject, indexed by slot.
    pub per_slot: Vec<Vec<usize>>,
}

impl SlotOccupancy {
    /// Returns the pairs of consecutive slots both of which may be occupied.
    pub fn adjacent_pairs(&self) -> Vec<(Slot, Slot)> {
        (1..self.per_slot.len())
            .filter(|s| !self.per_slot[s - 1].is_empty() && !self.per_slot[*s].is_empty())
            .map(|s| (s - 1, s))
            .collect()
    }
}

/// The constraint graph of a timetable: hard constraints linked to the candidate placements they involve.
///
/// The index of a constraint in the graph is also the index of its constraint group in the encodings,
/// so that infeasibility cores can be mapped back to constraints.
#[derive(Debug, Clone, Default)]
pub struct ConstraintGraph {
    pub(crate) n_candidates: usize,
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) soft_coverage: Vec<SoftCoverage>,
    pub(crate) preferred_adjacency: Vec<SlotOccupancy>,
}

impl ConstraintGraph {
    /// Returns the number of candidate placements (the decision variables of the model).
    pub fn n_candidates(&self) -> usize {
        self.n_candidates
    }

    /// Returns the hard constraints.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Returns the learner subjects whose coverage is left to the objective function.
    pub fn soft_coverage(&self) -> &[SoftCoverage] {
        &self.soft_coverage
    }

    /// Returns the learner subjects for which adjacent lessons earn a bonus.
    pub fn preferred_adjacency(&self) -> &[SlotOccupancy] {
        &self.preferred_adjacency
    }

    /// Returns the indices of the constraints involving a candidate.
    pub fn constraints_of(&self, candidate: usize) -> Vec<usize> {
        self.constraints
            .iter()
            .enumerate()
            .filter(|(_, c)| c.body.candidates().binary_search(&candidate).is_ok())
            .map(|(i, _)| i)
            .collect()
    }

    /// Returns the number of edges between constraints and candidates.
    pub fn n_edges(&self) -> usize {
        self.constraints
            .iter()
            .map(|c| c.body.candidates().len())
            .sum()
    }

    /// Counts the constraints of each kind.
    pub fn count_by_kind(&self) -> Vec<(ConstraintKind, usize)> {
        let mut counts = std::collections::BTreeMap::new();
        for c in self.constraints.iter() {
            *counts.entry(c.kind).or_insert(0) += 1;
        }
        counts.into_iter().collect()
    }
}
