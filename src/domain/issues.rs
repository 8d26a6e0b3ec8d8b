use std::fmt::Display;
use thiserror::Error;

/// The reason a fixed assignment cannot be honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum PinIssue {
    /// The teacher does not teach the subject.
    #[strum(serialize = "the teacher does not teach the subject")]
    SubjectNotTaught,
    /// The learner does not require the subject.
    #[strum(serialize = "the learner does not require the subject")]
    SubjectNotRequired,
    /// The teacher is unavailable in the slot.
    #[strum(serialize = "the teacher is unavailable in this slot")]
    TeacherUnavailable,
    /// The learner is unavailable in the slot.
    #[strum(serialize = "the learner is unavailable in this slot")]
    LearnerUnavailable,
    /// The learner does not accept the teacher.
    #[strum(serialize = "the learner has blocked the teacher")]
    TeacherBlocked,
    /// The learner may not use the location.
    #[strum(serialize = "the learner may not use this location")]
    LocationNotAllowed,
}

/// The resource two fixed assignments compete for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum PinConflict {
    /// Both need the same teacher in the same slot.
    #[strum(serialize = "the same teacher in the same slot")]
    TeacherSlot,
    /// Both need the same learner in the same slot.
    #[strum(serialize = "the same learner in the same slot")]
    LearnerSlot,
    /// Both need the same location in the same slot.
    #[strum(serialize = "the same location in the same slot")]
    LocationSlot,
    /// Together they exceed the repeat cap of the learner.
    #[strum(serialize = "more lessons in the subject than the learner may repeat")]
    RepeatedSubject,
}

/// A configuration error detected before any solver call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationIssue {
    /// An identifier does not match any entity of its kind.
    #[error("{context} refers to an unknown {kind} (id {id})")]
    UnknownReference {
        /// The kind of the referred entity.
        kind: &'static str,
        /// The unknown identifier.
        id: u32,
        /// The entity holding the reference.
        context: String,
    },
    /// Two entities of the same kind share an identifier.
    #[error("{context} defines {kind} {id} more than once")]
    DuplicateId {
        /// The kind of the entities.
        kind: &'static str,
        /// The shared identifier.
        id: u32,
        /// The part of the configuration defining them.
        context: String,
    },
    /// A policy value is out of its domain.
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),
    /// A slot index is not part of the day.
    #[error("{context} refers to slot {slot}, but the day has {slots_per_day} slot(s)")]
    SlotOutOfRange {
        /// The entity holding the slot.
        context: String,
        /// The invalid slot.
        slot: usize,
        /// The number of slots of the day.
        slots_per_day: usize,
    },
    /// The start times of the slots are malformed or not increasing.
    #[error("invalid slot start times: {0}")]
    InvalidSlotTimes(String),
    /// No accepted teacher teaches a required subject.
    #[error("{learner} requires {subject}, but no teacher they accept teaches it")]
    UnteachableSubject {
        /// The name of the learner.
        learner: String,
        /// The name of the subject.
        subject: String,
    },
    /// Teachers of a required subject exist, but none shares a free slot with the learner.
    #[error("{learner} requires {subject}, but no slot fits both them and a teacher of the subject")]
    NoAvailablePlacement {
        /// The name of the learner.
        learner: String,
        /// The name of the subject.
        subject: String,
    },
    /// A fixed assignment breaks a rule on its own.
    #[error("fixed assignment \"{pin}\" is invalid: {reason}")]
    InvalidPin {
        /// The description of the fixed assignment.
        pin: String,
        /// The broken rule.
        reason: PinIssue,
    },
    /// Two fixed assignments cannot hold together.
    #[error("fixed assignments \"{pin}\" and \"{other}\" involve {conflict}")]
    DuplicatePin {
        /// The description of the first fixed assignment.
        pin: String,
        /// The description of the second fixed assignment.
        other: String,
        /// The shared resource.
        conflict: PinConflict,
    },
}

/// The whole set of configuration errors found in a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationErrors(pub Vec<ConfigurationIssue>);

impl ConfigurationErrors {
    /// Returns the issues.
    pub fn issues(&self) -> &[ConfigurationIssue] {
        &self.0
    }
}

impl Display for ConfigurationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} configuration issue(s)", self.0.len())?;
        for (i, issue) in self.0.iter().enumerate() {
            write!(f, "{} {}", if i == 0 { ":" } else { ";" }, issue)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigurationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let errors = ConfigurationErrors(vec![
            ConfigurationIssue::InvalidPolicy("slots_per_day must be positive".to_string()),
            ConfigurationIssue::DuplicatePin {
                pin: "a".to_string(),
                other: "b".to_string(),
                conflict: PinConflict::RepeatedSubject,
            },
        ]);
        assert_eq!(
            "2 configuration issue(s): invalid policy: slots_per_day must be positive; fixed assignments \"a\" and \"b\" involve more lessons in the subject than the learner may repeat",
            errors.to_string()
        );
    }
}
