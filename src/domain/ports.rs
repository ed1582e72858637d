use super::event::{Event, EventDetails, EventId};
use super::membership::{Membership, Participant};
use super::participant::{Individual, Organization, ParticipantRecord};
use super::payment::PaymentMethod;
use crate::error::Result;
use async_trait::async_trait;

/// Persistence of one kind of participant record.
///
/// Implementations enforce natural-key uniqueness: `insert` and `save` fail
/// with `DuplicateParticipant` when another record already holds the key.
#[async_trait]
pub trait ParticipantStore<P: ParticipantRecord>: Send + Sync {
    /// Persists a new record and returns it with its assigned id.
    async fn insert(&self, details: P::Details, payment_method: Option<PaymentMethod>)
    -> Result<P>;
    async fn save(&self, record: P) -> Result<P>;
    async fn find_by_id(&self, id: P::Id) -> Result<Option<P>>;
    async fn find_all(&self) -> Result<Vec<P>>;
    async fn delete(&self, record: &P) -> Result<()>;
    async fn exists_by_natural_key(&self, key: &str) -> Result<bool>;
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert(&self, details: EventDetails) -> Result<Event>;
    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>>;
    async fn find_all(&self) -> Result<Vec<Event>>;
    async fn delete(&self, event: &Event) -> Result<()>;
}

#[async_trait]
pub trait PaymentMethodStore: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Result<Option<PaymentMethod>>;
    async fn find_all(&self) -> Result<Vec<PaymentMethod>>;
}

/// Persistence of participant-to-event links.
///
/// `save` fails with `AlreadyRegistered` when the same pair is already stored.
/// Deletes return the number of links removed.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    async fn save(&self, membership: Membership) -> Result<()>;
    async fn find_by_event(&self, event_id: EventId) -> Result<Vec<Membership>>;
    async fn find_by_participant(&self, participant: Participant) -> Result<Vec<Membership>>;
    async fn delete_by_event(&self, event_id: EventId) -> Result<usize>;
    async fn delete_by_participant(&self, participant: Participant) -> Result<usize>;
}

/// An atomic scope over every store.
///
/// Reads observe the unit's own pending writes. Nothing is visible to other
/// units until `commit`; dropping the unit without committing discards it.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn individuals(&self) -> &dyn ParticipantStore<Individual>;
    fn organizations(&self) -> &dyn ParticipantStore<Organization>;
    fn events(&self) -> &dyn EventStore;
    fn payment_methods(&self) -> &dyn PaymentMethodStore;
    fn memberships(&self) -> &dyn MembershipStore;

    async fn commit(self: Box<Self>) -> Result<()>;
}

/// Entry point of a storage backend.
///
/// Units of work begun on the same registry run one at a time.
#[async_trait]
pub trait Registry: Send + Sync {
    async fn begin(&self) -> Result<UnitOfWorkBox>;
}

pub type UnitOfWorkBox = Box<dyn UnitOfWork>;
pub type RegistryBox = Box<dyn Registry>;
