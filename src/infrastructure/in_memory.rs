use crate::domain::event::{Event, EventDetails, EventId};
use crate::domain::membership::{Membership, Participant};
use crate::domain::participant::{Individual, IndividualId, Organization, ParticipantRecord};
use crate::domain::payment::{self, DEFAULT_PAYMENT_METHODS, PaymentMethod};
use crate::domain::ports::{
    EventStore, MembershipStore, ParticipantStore, PaymentMethodStore, Registry, UnitOfWork,
    UnitOfWorkBox,
};
use crate::error::{RegistryError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedRwLockWriteGuard, RwLock};

/// Rows of one participant kind plus its natural-key index.
#[derive(Debug, Clone)]
struct Table<P> {
    last_id: u64,
    rows: BTreeMap<u64, P>,
    keys: BTreeMap<String, u64>,
}

impl<P> Default for Table<P> {
    fn default() -> Self {
        Self {
            last_id: 0,
            rows: BTreeMap::new(),
            keys: BTreeMap::new(),
        }
    }
}

impl<P: ParticipantRecord> Table<P> {
    fn duplicate(key: &str) -> RegistryError {
        RegistryError::DuplicateParticipant {
            kind: P::KIND,
            key: key.to_string(),
        }
    }

    fn insert(&mut self, details: P::Details, payment_method: Option<PaymentMethod>) -> Result<P> {
        let key = P::natural_key(&details);
        if self.keys.contains_key(key) {
            return Err(Self::duplicate(key));
        }

        self.last_id += 1;
        let record = P::assemble(P::Id::from(self.last_id), details, payment_method);
        self.keys.insert(record.key().to_string(), self.last_id);
        self.rows.insert(self.last_id, record.clone());
        Ok(record)
    }

    fn save(&mut self, record: P) -> Result<P> {
        let id: u64 = record.id().into();
        if let Some(&holder) = self.keys.get(record.key())
            && holder != id
        {
            return Err(Self::duplicate(record.key()));
        }

        let previous_key = match self.rows.get(&id) {
            Some(previous) => previous.key().to_string(),
            None => return Err(RegistryError::ParticipantNotFound { kind: P::KIND, id }),
        };
        self.keys.remove(&previous_key);
        self.keys.insert(record.key().to_string(), id);
        self.rows.insert(id, record.clone());
        Ok(record)
    }

    fn delete(&mut self, id: u64) {
        if let Some(record) = self.rows.remove(&id) {
            self.keys.remove(record.key());
        }
    }
}

/// Complete registry state; a unit of work mutates a private copy of it.
#[derive(Debug, Clone, Default)]
struct RegistryData {
    individuals: Table<Individual>,
    organizations: Table<Organization>,
    last_event_id: u64,
    events: BTreeMap<EventId, Event>,
    payment_methods: Vec<PaymentMethod>,
    memberships: BTreeSet<Membership>,
}

trait Tabled: ParticipantRecord {
    fn table(data: &RegistryData) -> &Table<Self>;
    fn table_mut(data: &mut RegistryData) -> &mut Table<Self>;
}

impl Tabled for Individual {
    fn table(data: &RegistryData) -> &Table<Self> {
        &data.individuals
    }

    fn table_mut(data: &mut RegistryData) -> &mut Table<Self> {
        &mut data.individuals
    }
}

impl Tabled for Organization {
    fn table(data: &RegistryData) -> &Table<Self> {
        &data.organizations
    }

    fn table_mut(data: &mut RegistryData) -> &mut Table<Self> {
        &mut data.organizations
    }
}

/// A thread-safe in-memory registry.
///
/// Uses `Arc<RwLock<RegistryData>>` so clones share the same state. A unit of
/// work holds the write lock for its whole lifetime, which serializes units.
/// Ideal for testing or single-run batches where persistence is not required.
#[derive(Clone)]
pub struct InMemoryRegistry {
    data: Arc<RwLock<RegistryData>>,
}

impl InMemoryRegistry {
    /// Creates an empty registry with the default payment catalog.
    pub fn new() -> Self {
        Self::with_payment_methods(payment::catalog(DEFAULT_PAYMENT_METHODS))
    }

    pub fn with_payment_methods(payment_methods: Vec<PaymentMethod>) -> Self {
        let data = RegistryData {
            payment_methods,
            ..RegistryData::default()
        };
        Self {
            data: Arc::new(RwLock::new(data)),
        }
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Registry for InMemoryRegistry {
    async fn begin(&self) -> Result<UnitOfWorkBox> {
        let committed = Arc::clone(&self.data).write_owned().await;
        Ok(Box::new(InMemoryUnitOfWork {
            committed,
            staged: Mutex::new(None),
        }))
    }
}

/// Unit of work over the in-memory registry.
///
/// Reads go to the committed state until the first write, which stages a
/// private copy; read-only units never copy anything.
pub struct InMemoryUnitOfWork {
    committed: OwnedRwLockWriteGuard<RegistryData>,
    staged: Mutex<Option<RegistryData>>,
}

impl InMemoryUnitOfWork {
    async fn read<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&RegistryData) -> T + Send,
    {
        let staged = self.staged.lock().await;
        f(staged.as_ref().unwrap_or(&*self.committed))
    }

    async fn write<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&mut RegistryData) -> T + Send,
    {
        let mut staged = self.staged.lock().await;
        f(staged.get_or_insert_with(|| (*self.committed).clone()))
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    fn individuals(&self) -> &dyn ParticipantStore<Individual> {
        self
    }

    fn organizations(&self) -> &dyn ParticipantStore<Organization> {
        self
    }

    fn events(&self) -> &dyn EventStore {
        self
    }

    fn payment_methods(&self) -> &dyn PaymentMethodStore {
        self
    }

    fn memberships(&self) -> &dyn MembershipStore {
        self
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let Self {
            mut committed,
            staged,
        } = *self;
        if let Some(data) = staged.into_inner() {
            *committed = data;
            tracing::debug!("in-memory unit of work committed");
        }
        Ok(())
    }
}

#[async_trait]
impl<P: Tabled> ParticipantStore<P> for InMemoryUnitOfWork {
    async fn insert(
        &self,
        details: P::Details,
        payment_method: Option<PaymentMethod>,
    ) -> Result<P> {
        self.write(|data| P::table_mut(data).insert(details, payment_method))
            .await
    }

    async fn save(&self, record: P) -> Result<P> {
        self.write(|data| P::table_mut(data).save(record)).await
    }

    async fn find_by_id(&self, id: P::Id) -> Result<Option<P>> {
        let id: u64 = id.into();
        Ok(self.read(|data| P::table(data).rows.get(&id).cloned()).await)
    }

    async fn find_all(&self) -> Result<Vec<P>> {
        Ok(self
            .read(|data| P::table(data).rows.values().cloned().collect())
            .await)
    }

    async fn delete(&self, record: &P) -> Result<()> {
        let id: u64 = record.id().into();
        self.write(|data| P::table_mut(data).delete(id)).await;
        Ok(())
    }

    async fn exists_by_natural_key(&self, key: &str) -> Result<bool> {
        Ok(self.read(|data| P::table(data).keys.contains_key(key)).await)
    }
}

#[async_trait]
impl EventStore for InMemoryUnitOfWork {
    async fn insert(&self, details: EventDetails) -> Result<Event> {
        let event = self
            .write(|data| {
                data.last_event_id += 1;
                let event = Event::new(EventId(data.last_event_id), details);
                data.events.insert(event.id, event.clone());
                event
            })
            .await;
        Ok(event)
    }

    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>> {
        Ok(self.read(|data| data.events.get(&id).cloned()).await)
    }

    async fn find_all(&self) -> Result<Vec<Event>> {
        Ok(self
            .read(|data| data.events.values().cloned().collect())
            .await)
    }

    async fn delete(&self, event: &Event) -> Result<()> {
        let id = event.id;
        self.write(|data| data.events.remove(&id)).await;
        Ok(())
    }
}

#[async_trait]
impl PaymentMethodStore for InMemoryUnitOfWork {
    async fn find_by_name(&self, name: &str) -> Result<Option<PaymentMethod>> {
        Ok(self
            .read(|data| {
                data.payment_methods
                    .iter()
                    .find(|method| method.name() == name)
                    .cloned()
            })
            .await)
    }

    async fn find_all(&self) -> Result<Vec<PaymentMethod>> {
        Ok(self.read(|data| data.payment_methods.clone()).await)
    }
}

#[async_trait]
impl MembershipStore for InMemoryUnitOfWork {
    async fn save(&self, membership: Membership) -> Result<()> {
        let inserted = self.write(|data| data.memberships.insert(membership)).await;
        if inserted {
            Ok(())
        } else {
            Err(RegistryError::AlreadyRegistered {
                participant: membership.participant,
                event_id: membership.event_id,
            })
        }
    }

    async fn find_by_event(&self, event_id: EventId) -> Result<Vec<Membership>> {
        // Memberships order by event first, so one event's rows are contiguous.
        let first = Membership::new(event_id, Participant::Individual(IndividualId(0)));
        Ok(self
            .read(|data| {
                data.memberships
                    .range(first..)
                    .take_while(|m| m.event_id == event_id)
                    .copied()
                    .collect()
            })
            .await)
    }

    async fn find_by_participant(&self, participant: Participant) -> Result<Vec<Membership>> {
        Ok(self
            .read(|data| {
                data.memberships
                    .iter()
                    .filter(|m| m.participant == participant)
                    .copied()
                    .collect()
            })
            .await)
    }

    async fn delete_by_event(&self, event_id: EventId) -> Result<usize> {
        Ok(self
            .write(|data| {
                let before = data.memberships.len();
                data.memberships.retain(|m| m.event_id != event_id);
                before - data.memberships.len()
            })
            .await)
    }

    async fn delete_by_participant(&self, participant: Participant) -> Result<usize> {
        Ok(self
            .write(|data| {
                let before = data.memberships.len();
                data.memberships.retain(|m| m.participant != participant);
                before - data.memberships.len()
            })
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::participant::{
        IndividualDetails, IndividualId, OrganizationDetails, OrganizationId,
    };

    fn person(code: &str) -> IndividualDetails {
        IndividualDetails {
            first_name: "Mari".to_string(),
            last_name: "Maasikas".to_string(),
            personal_code: code.to_string(),
            notes: String::new(),
        }
    }

    fn launch() -> EventDetails {
        EventDetails {
            name: "Launch".to_string(),
            starts_at: "2026-11-01T10:00:00Z".parse().unwrap(),
            location: "Tallinn".to_string(),
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let registry = InMemoryRegistry::new();
        let unit = registry.begin().await.unwrap();

        let first = unit.individuals().insert(person("1"), None).await.unwrap();
        let second = unit.individuals().insert(person("2"), None).await.unwrap();
        let org = unit
            .organizations()
            .insert(
                OrganizationDetails {
                    name: "Acme".to_string(),
                    registry_code: "10000001".to_string(),
                    participant_count: 3,
                    notes: String::new(),
                },
                None,
            )
            .await
            .unwrap();

        assert_eq!(first.id, IndividualId(1));
        assert_eq!(second.id, IndividualId(2));
        assert_eq!(org.id.get(), 1);
    }

    #[tokio::test]
    async fn test_commit_publishes_writes() {
        let registry = InMemoryRegistry::new();

        let unit = registry.begin().await.unwrap();
        unit.events().insert(launch()).await.unwrap();
        unit.commit().await.unwrap();

        let unit = registry.begin().await.unwrap();
        assert_eq!(unit.events().find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_drop_discards_writes() {
        let registry = InMemoryRegistry::new();

        {
            let unit = registry.begin().await.unwrap();
            unit.individuals().insert(person("1"), None).await.unwrap();
            // dropped without commit
        }

        let unit = registry.begin().await.unwrap();
        assert!(unit.individuals().find_all().await.unwrap().is_empty());
        assert!(!unit.individuals().exists_by_natural_key("1").await.unwrap());
    }

    #[tokio::test]
    async fn test_natural_key_is_unique() {
        let registry = InMemoryRegistry::new();
        let unit = registry.begin().await.unwrap();

        unit.individuals().insert(person("1"), None).await.unwrap();
        let result = unit.individuals().insert(person("1"), None).await;

        assert!(matches!(
            result,
            Err(RegistryError::DuplicateParticipant { .. })
        ));
    }

    #[tokio::test]
    async fn test_save_moves_natural_key() {
        let registry = InMemoryRegistry::new();
        let unit = registry.begin().await.unwrap();

        let mut individual = unit.individuals().insert(person("1"), None).await.unwrap();
        individual.details.personal_code = "2".to_string();
        unit.individuals().save(individual).await.unwrap();

        assert!(!unit.individuals().exists_by_natural_key("1").await.unwrap());
        assert!(unit.individuals().exists_by_natural_key("2").await.unwrap());
    }

    #[tokio::test]
    async fn test_membership_pair_is_unique() {
        let registry = InMemoryRegistry::new();
        let unit = registry.begin().await.unwrap();
        let link = Membership::new(EventId(1), Participant::Individual(IndividualId(1)));

        unit.memberships().save(link).await.unwrap();
        let result = unit.memberships().save(link).await;

        assert!(matches!(
            result,
            Err(RegistryError::AlreadyRegistered { .. })
        ));
        assert_eq!(unit.memberships().find_by_event(EventId(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_membership_bulk_deletes() {
        let registry = InMemoryRegistry::new();
        let unit = registry.begin().await.unwrap();
        let jane = Participant::Individual(IndividualId(1));
        let acme = Participant::Organization(OrganizationId(1));

        unit.memberships().save(Membership::new(EventId(1), jane)).await.unwrap();
        unit.memberships().save(Membership::new(EventId(2), jane)).await.unwrap();
        unit.memberships().save(Membership::new(EventId(1), acme)).await.unwrap();

        assert_eq!(unit.memberships().delete_by_participant(jane).await.unwrap(), 2);
        assert_eq!(unit.memberships().delete_by_event(EventId(1)).await.unwrap(), 1);
        assert!(unit.memberships().find_by_participant(acme).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reads_do_not_stage_a_copy() {
        let registry = InMemoryRegistry::new();
        let unit = InMemoryUnitOfWork {
            committed: Arc::clone(&registry.data).write_owned().await,
            staged: Mutex::new(None),
        };

        unit.individuals().find_all().await.unwrap();
        unit.events().find_by_id(EventId(1)).await.unwrap();
        unit.memberships().find_by_event(EventId(1)).await.unwrap();
        assert!(unit.staged.lock().await.is_none());

        let event = unit.events().insert(launch()).await.unwrap();
        assert!(unit.staged.lock().await.is_some());
        assert_eq!(unit.events().find_by_id(event.id).await.unwrap(), Some(event));
    }

    #[tokio::test]
    async fn test_find_by_event_returns_only_that_event() {
        let registry = InMemoryRegistry::new();
        let unit = registry.begin().await.unwrap();
        let jane = Participant::Individual(IndividualId(1));
        let mari = Participant::Individual(IndividualId(2));
        let acme = Participant::Organization(OrganizationId(1));

        for event_id in [EventId(1), EventId(2), EventId(3)] {
            unit.memberships().save(Membership::new(event_id, acme)).await.unwrap();
        }
        unit.memberships().save(Membership::new(EventId(2), mari)).await.unwrap();
        unit.memberships().save(Membership::new(EventId(2), jane)).await.unwrap();
        unit.memberships().save(Membership::new(EventId(3), jane)).await.unwrap();

        let second = unit.memberships().find_by_event(EventId(2)).await.unwrap();
        assert_eq!(
            second,
            vec![
                Membership::new(EventId(2), jane),
                Membership::new(EventId(2), mari),
                Membership::new(EventId(2), acme),
            ]
        );
        assert!(unit.memberships().find_by_event(EventId(4)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_payment_catalog_lookup() {
        let registry = InMemoryRegistry::new();
        let unit = registry.begin().await.unwrap();

        let cash = unit.payment_methods().find_by_name("cash").await.unwrap();
        assert_eq!(cash, Some(PaymentMethod::new("cash")));
        assert!(unit.payment_methods().find_by_name("cheque").await.unwrap().is_none());
    }
}
