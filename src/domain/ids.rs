use serde::{Deserialize, Serialize};
use std::fmt::Display;

macro_rules! define_id {
    ($(#[$meta:meta])* $name: ident, $prefix: literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", $prefix, self.0)
            }
        }
    };
}

define_id!(
    /// The identifier of a teacher.
    TeacherId,
    "teacher"
);
define_id!(
    /// The identifier of a student.
    StudentId,
    "student"
);
define_id!(
    /// The identifier of a group of students.
    GroupId,
    "group"
);
define_id!(
    /// The identifier of a subject.
    SubjectId,
    "subject"
);
define_id!(
    /// The identifier of a location.
    LocationId,
    "location"
);

/// The index of a time slot in a day, starting at 0.
pub type Slot = usize;

/// A reference to a learner, which is either a student or a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearnerRef {
    /// A single student.
    Student(StudentId),
    /// A group of students.
    Group(GroupId),
}

impl Display for LearnerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LearnerRef::Student(s) => write!(f, "{}", s),
            LearnerRef::Group(g) => write!(f, "{}", g),
        }
    }
}
