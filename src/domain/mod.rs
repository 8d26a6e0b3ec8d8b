//! The objects describing what can be scheduled on a day.
//!
//! A [ConfigurationSnapshot] is the raw input. The [DomainBuilder] validates it and turns it into a [SchedulingDomain],
//! in which every candidate placement of a lesson is enumerated.

mod attendance;
pub use attendance::AttendanceTable;

mod builder;
pub use builder::DomainBuilder;

mod entities;
pub use entities::Candidate;
pub use entities::Learner;
pub use entities::LearnerKind;
pub use entities::Location;
pub use entities::Occupant;
pub use entities::Pin;
pub use entities::SchedulingDomain;
pub use entities::Subject;
pub use entities::Teacher;
pub use entities::TimeSlot;

mod ids;
pub use ids::GroupId;
pub use ids::LearnerRef;
pub use ids::LocationId;
pub use ids::Slot;
pub use ids::StudentId;
pub use ids::SubjectId;
pub use ids::TeacherId;

mod issues;
pub use issues::ConfigurationErrors;
pub use issues::ConfigurationIssue;
pub use issues::PinConflict;
pub use issues::PinIssue;

mod snapshot;
pub use snapshot::Adjacency;
pub use snapshot::AttendanceRecord;
pub use snapshot::BalanceTarget;
pub use snapshot::ConfigurationSnapshot;
pub use snapshot::FixedAssignmentRecord;
pub use snapshot::GroupRecord;
pub use snapshot::LearnerSettings;
pub use snapshot::LocationRecord;
pub use snapshot::Policies;
pub use snapshot::RepeatPolicy;
pub use snapshot::StudentRecord;
pub use snapshot::SubjectRecord;
pub use snapshot::TeacherRecord;
