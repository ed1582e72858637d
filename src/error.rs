use crate::domain::event::EventId;
use crate::domain::membership::{Participant, ParticipantKind};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum RegistryError {
    #[error("duplicate {kind}: a record with key {key:?} already exists")]
    #[diagnostic(code(regdesk::duplicate_participant))]
    DuplicateParticipant { kind: ParticipantKind, key: String },

    #[error("event with ID {0} not found")]
    #[diagnostic(code(regdesk::event_not_found))]
    EventNotFound(EventId),

    #[error("{kind} with ID {id} not found")]
    #[diagnostic(code(regdesk::participant_not_found))]
    ParticipantNotFound { kind: ParticipantKind, id: u64 },

    #[error("payment method not found: {0}")]
    #[diagnostic(
        code(regdesk::payment_method_not_found),
        help("use one of the names returned by list_payment_methods")
    )]
    PaymentMethodNotFound(String),

    #[error("{participant} is already registered to event {event_id}")]
    #[diagnostic(code(regdesk::already_registered))]
    AlreadyRegistered {
        participant: Participant,
        event_id: EventId,
    },

    #[error("serialization error: {0}")]
    #[diagnostic(code(regdesk::serialization))]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    #[diagnostic(code(regdesk::io))]
    Io(#[from] std::io::Error),

    #[cfg(feature = "storage-rocksdb")]
    #[error("storage error: {0}")]
    #[diagnostic(code(regdesk::storage))]
    Storage(#[from] rocksdb::Error),

    #[error("internal error: {0}")]
    #[diagnostic(code(regdesk::internal))]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
