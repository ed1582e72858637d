use super::event::EventId;
use super::participant::{IndividualId, OrganizationId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantKind {
    Individual,
    Organization,
}

impl std::fmt::Display for ParticipantKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParticipantKind::Individual => f.write_str("individual"),
            ParticipantKind::Organization => f.write_str("organization"),
        }
    }
}

/// Reference to exactly one participant record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Participant {
    Individual(IndividualId),
    Organization(OrganizationId),
}

impl Participant {
    pub fn kind(&self) -> ParticipantKind {
        match self {
            Participant::Individual(_) => ParticipantKind::Individual,
            Participant::Organization(_) => ParticipantKind::Organization,
        }
    }

    pub fn raw_id(&self) -> u64 {
        match self {
            Participant::Individual(id) => id.get(),
            Participant::Organization(id) => id.get(),
        }
    }
}

impl std::fmt::Display for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind(), self.raw_id())
    }
}

/// Registration of one participant to one event.
///
/// The pair is the whole identity: two memberships with the same event and
/// participant are the same registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Membership {
    pub event_id: EventId,
    pub participant: Participant,
}

impl Membership {
    pub fn new(event_id: EventId, participant: Participant) -> Self {
        Self {
            event_id,
            participant,
        }
    }
}
