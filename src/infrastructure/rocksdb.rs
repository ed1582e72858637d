use crate::domain::event::{Event, EventDetails, EventId};
use crate::domain::membership::{Membership, Participant, ParticipantKind};
use crate::domain::participant::{Individual, Organization, ParticipantRecord};
use crate::domain::payment::{self, DEFAULT_PAYMENT_METHODS, PaymentMethod};
use crate::domain::ports::{
    EventStore, MembershipStore, ParticipantStore, PaymentMethodStore, Registry, UnitOfWork,
    UnitOfWorkBox,
};
use crate::error::{RegistryError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Column Family for individual records, keyed by id.
pub const CF_INDIVIDUALS: &str = "individuals";
/// Column Family for organization records, keyed by id.
pub const CF_ORGANIZATIONS: &str = "organizations";
/// Column Family for event records, keyed by id.
pub const CF_EVENTS: &str = "events";
/// Column Family for the payment catalog, keyed by name.
pub const CF_PAYMENT_METHODS: &str = "payment_methods";
/// Column Family for memberships, keyed by event then participant.
pub const CF_MEMBERSHIPS_BY_EVENT: &str = "memberships_by_event";
/// Column Family for memberships, keyed by participant then event.
pub const CF_MEMBERSHIPS_BY_PARTICIPANT: &str = "memberships_by_participant";
/// Column Family mapping a participant kind and natural key to its id.
pub const CF_NATURAL_KEYS: &str = "natural_keys";
/// Column Family for id sequences.
pub const CF_META: &str = "meta";

const COLUMN_FAMILIES: [&str; 8] = [
    CF_INDIVIDUALS,
    CF_ORGANIZATIONS,
    CF_EVENTS,
    CF_PAYMENT_METHODS,
    CF_MEMBERSHIPS_BY_EVENT,
    CF_MEMBERSHIPS_BY_PARTICIPANT,
    CF_NATURAL_KEYS,
    CF_META,
];

const EVENT_SEQUENCE: &[u8] = b"seq/event";

fn records_cf(kind: ParticipantKind) -> &'static str {
    match kind {
        ParticipantKind::Individual => CF_INDIVIDUALS,
        ParticipantKind::Organization => CF_ORGANIZATIONS,
    }
}

fn sequence_key(kind: ParticipantKind) -> &'static [u8] {
    match kind {
        ParticipantKind::Individual => b"seq/individual",
        ParticipantKind::Organization => b"seq/organization",
    }
}

fn kind_tag(kind: ParticipantKind) -> u8 {
    match kind {
        ParticipantKind::Individual => b'i',
        ParticipantKind::Organization => b'o',
    }
}

fn natural_key_entry(kind: ParticipantKind, key: &str) -> Vec<u8> {
    let mut entry = vec![kind_tag(kind)];
    entry.extend_from_slice(key.as_bytes());
    entry
}

fn participant_key(participant: Participant) -> Vec<u8> {
    let mut key = vec![kind_tag(participant.kind())];
    key.extend_from_slice(&participant.raw_id().to_be_bytes());
    key
}

fn by_event_key(membership: &Membership) -> Vec<u8> {
    let mut key = membership.event_id.get().to_be_bytes().to_vec();
    key.extend(participant_key(membership.participant));
    key
}

fn by_participant_key(membership: &Membership) -> Vec<u8> {
    let mut key = participant_key(membership.participant);
    key.extend_from_slice(&membership.event_id.get().to_be_bytes());
    key
}

fn decode_id(bytes: &[u8]) -> Result<u64> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| RegistryError::Internal(format!("malformed id of {} bytes", bytes.len())))?;
    Ok(u64::from_be_bytes(raw))
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

fn column_family<'a>(db: &'a DB, name: &str) -> Result<&'a ColumnFamily> {
    db.cf_handle(name)
        .ok_or_else(|| RegistryError::Internal(format!("{name} column family not found")))
}

/// A persistent registry backed by RocksDB.
///
/// Each record kind lives in its own Column Family; memberships are indexed
/// twice so both event and participant lookups are prefix scans. Units of
/// work are serialized by a writer lock and committed as a single
/// `WriteBatch`, so a crash never leaves half an operation on disk.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBRegistry {
    db: Arc<DB>,
    writer: Arc<Mutex<()>>,
}

impl RocksDBRegistry {
    /// Opens or creates a RocksDB instance with the default payment catalog.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_payment_methods(path, payment::catalog(DEFAULT_PAYMENT_METHODS))
    }

    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures every Column Family exists. The payment catalog is written only
    /// when the database has none yet; an existing catalog is kept as is.
    pub fn open_with_payment_methods<P: AsRef<Path>>(
        path: P,
        payment_methods: Vec<PaymentMethod>,
    ) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()));
        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        let catalog = column_family(&db, CF_PAYMENT_METHODS)?;
        if db.iterator_cf(catalog, IteratorMode::Start).next().is_none() {
            let mut batch = WriteBatch::default();
            for method in &payment_methods {
                batch.put_cf(catalog, method.name().as_bytes(), encode(method)?);
            }
            db.write(batch)?;
            tracing::info!(count = payment_methods.len(), "seeded payment catalog");
        }

        Ok(Self {
            db: Arc::new(db),
            writer: Arc::new(Mutex::new(())),
        })
    }
}

#[async_trait]
impl Registry for RocksDBRegistry {
    async fn begin(&self) -> Result<UnitOfWorkBox> {
        let writer = Arc::clone(&self.writer).lock_owned().await;
        Ok(Box::new(RocksDBUnitOfWork {
            db: Arc::clone(&self.db),
            _writer: writer,
            overlay: Mutex::new(BTreeMap::new()),
        }))
    }
}

/// Pending writes: `None` marks a deletion.
type Overlay = BTreeMap<(&'static str, Vec<u8>), Option<Vec<u8>>>;

pub struct RocksDBUnitOfWork {
    db: Arc<DB>,
    _writer: OwnedMutexGuard<()>,
    overlay: Mutex<Overlay>,
}

impl RocksDBUnitOfWork {
    fn read_db(&self, cf: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get_cf(column_family(&self.db, cf)?, key)?)
    }

    fn scan_db(&self, cf: &str, prefix: &[u8]) -> Result<BTreeMap<Vec<u8>, Vec<u8>>> {
        let handle = column_family(&self.db, cf)?;
        let mut entries = BTreeMap::new();
        for item in self
            .db
            .iterator_cf(handle, IteratorMode::From(prefix, Direction::Forward))
        {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            entries.insert(key.to_vec(), value.to_vec());
        }
        Ok(entries)
    }

    async fn get(&self, cf: &'static str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let staged = self.overlay.lock().await.get(&(cf, key.to_vec())).cloned();
        match staged {
            Some(value) => Ok(value),
            None => self.read_db(cf, key),
        }
    }

    /// Prefix scan over committed data merged with this unit's pending writes.
    async fn scan(&self, cf: &'static str, prefix: &[u8]) -> Result<Vec<Vec<u8>>> {
        let mut entries = self.scan_db(cf, prefix)?;
        let overlay = self.overlay.lock().await;
        for ((staged_cf, key), value) in overlay.range((cf, prefix.to_vec())..) {
            if *staged_cf != cf || !key.starts_with(prefix) {
                break;
            }
            match value {
                Some(value) => entries.insert(key.clone(), value.clone()),
                None => entries.remove(key),
            };
        }
        Ok(entries.into_values().collect())
    }

    async fn put(&self, cf: &'static str, key: Vec<u8>, value: Vec<u8>) {
        self.overlay.lock().await.insert((cf, key), Some(value));
    }

    async fn remove(&self, cf: &'static str, key: Vec<u8>) {
        self.overlay.lock().await.insert((cf, key), None);
    }

    async fn next_id(&self, sequence: &'static [u8]) -> Result<u64> {
        let last = match self.get(CF_META, sequence).await? {
            Some(bytes) => decode_id(&bytes)?,
            None => 0,
        };
        let next = last + 1;
        self.put(CF_META, sequence.to_vec(), next.to_be_bytes().to_vec())
            .await;
        Ok(next)
    }

    async fn unlink(&self, memberships: &[Membership]) {
        for membership in memberships {
            self.remove(CF_MEMBERSHIPS_BY_EVENT, by_event_key(membership))
                .await;
            self.remove(CF_MEMBERSHIPS_BY_PARTICIPANT, by_participant_key(membership))
                .await;
        }
    }

    fn write(&self, overlay: Overlay) -> Result<usize> {
        let mut batch = WriteBatch::default();
        for ((cf, key), value) in overlay {
            let handle = column_family(&self.db, cf)?;
            match value {
                Some(value) => batch.put_cf(handle, key, value),
                None => batch.delete_cf(handle, key),
            }
        }
        let writes = batch.len();
        self.db.write(batch)?;
        Ok(writes)
    }
}

#[async_trait]
impl UnitOfWork for RocksDBUnitOfWork {
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
        let overlay = std::mem::take(&mut *self.overlay.lock().await);
        let writes = self.write(overlay)?;
        tracing::debug!(writes, "rocksdb unit of work committed");
        Ok(())
    }
}

#[async_trait]
impl<P: ParticipantRecord> ParticipantStore<P> for RocksDBUnitOfWork {
    async fn insert(
        &self,
        details: P::Details,
        payment_method: Option<PaymentMethod>,
    ) -> Result<P> {
        let index_key = natural_key_entry(P::KIND, P::natural_key(&details));
        if self.get(CF_NATURAL_KEYS, &index_key).await?.is_some() {
            return Err(RegistryError::DuplicateParticipant {
                kind: P::KIND,
                key: P::natural_key(&details).to_string(),
            });
        }

        let id = self.next_id(sequence_key(P::KIND)).await?;
        let record = P::assemble(P::Id::from(id), details, payment_method);
        self.put(records_cf(P::KIND), id.to_be_bytes().to_vec(), encode(&record)?)
            .await;
        self.put(CF_NATURAL_KEYS, index_key, id.to_be_bytes().to_vec())
            .await;
        Ok(record)
    }

    async fn save(&self, record: P) -> Result<P> {
        let id: u64 = record.id().into();
        let previous: P = match self.get(records_cf(P::KIND), &id.to_be_bytes()).await? {
            Some(bytes) => decode(&bytes)?,
            None => return Err(RegistryError::ParticipantNotFound { kind: P::KIND, id }),
        };

        if previous.key() != record.key() {
            let index_key = natural_key_entry(P::KIND, record.key());
            if let Some(holder) = self.get(CF_NATURAL_KEYS, &index_key).await?
                && decode_id(&holder)? != id
            {
                return Err(RegistryError::DuplicateParticipant {
                    kind: P::KIND,
                    key: record.key().to_string(),
                });
            }
            self.remove(CF_NATURAL_KEYS, natural_key_entry(P::KIND, previous.key()))
                .await;
            self.put(CF_NATURAL_KEYS, index_key, id.to_be_bytes().to_vec())
                .await;
        }

        self.put(records_cf(P::KIND), id.to_be_bytes().to_vec(), encode(&record)?)
            .await;
        Ok(record)
    }

    async fn find_by_id(&self, id: P::Id) -> Result<Option<P>> {
        let id: u64 = id.into();
        match self.get(records_cf(P::KIND), &id.to_be_bytes()).await? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn find_all(&self) -> Result<Vec<P>> {
        self.scan(records_cf(P::KIND), &[])
            .await?
            .iter()
            .map(|bytes| decode(bytes))
            .collect()
    }

    async fn delete(&self, record: &P) -> Result<()> {
        let id: u64 = record.id().into();
        self.remove(records_cf(P::KIND), id.to_be_bytes().to_vec())
            .await;
        self.remove(CF_NATURAL_KEYS, natural_key_entry(P::KIND, record.key()))
            .await;
        Ok(())
    }

    async fn exists_by_natural_key(&self, key: &str) -> Result<bool> {
        Ok(self
            .get(CF_NATURAL_KEYS, &natural_key_entry(P::KIND, key))
            .await?
            .is_some())
    }
}

#[async_trait]
impl EventStore for RocksDBUnitOfWork {
    async fn insert(&self, details: EventDetails) -> Result<Event> {
        let id = self.next_id(EVENT_SEQUENCE).await?;
        let event = Event::new(EventId(id), details);
        self.put(CF_EVENTS, id.to_be_bytes().to_vec(), encode(&event)?)
            .await;
        Ok(event)
    }

    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>> {
        match self.get(CF_EVENTS, &id.get().to_be_bytes()).await? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn find_all(&self) -> Result<Vec<Event>> {
        self.scan(CF_EVENTS, &[])
            .await?
            .iter()
            .map(|bytes| decode(bytes))
            .collect()
    }

    async fn delete(&self, event: &Event) -> Result<()> {
        self.remove(CF_EVENTS, event.id.get().to_be_bytes().to_vec())
            .await;
        Ok(())
    }
}

#[async_trait]
impl PaymentMethodStore for RocksDBUnitOfWork {
    async fn find_by_name(&self, name: &str) -> Result<Option<PaymentMethod>> {
        match self.get(CF_PAYMENT_METHODS, name.as_bytes()).await? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn find_all(&self) -> Result<Vec<PaymentMethod>> {
        self.scan(CF_PAYMENT_METHODS, &[])
            .await?
            .iter()
            .map(|bytes| decode(bytes))
            .collect()
    }
}

#[async_trait]
impl MembershipStore for RocksDBUnitOfWork {
    async fn save(&self, membership: Membership) -> Result<()> {
        let key = by_event_key(&membership);
        if self.get(CF_MEMBERSHIPS_BY_EVENT, &key).await?.is_some() {
            return Err(RegistryError::AlreadyRegistered {
                participant: membership.participant,
                event_id: membership.event_id,
            });
        }

        let value = encode(&membership)?;
        self.put(CF_MEMBERSHIPS_BY_EVENT, key, value.clone()).await;
        self.put(
            CF_MEMBERSHIPS_BY_PARTICIPANT,
            by_participant_key(&membership),
            value,
        )
        .await;
        Ok(())
    }

    async fn find_by_event(&self, event_id: EventId) -> Result<Vec<Membership>> {
        self.scan(CF_MEMBERSHIPS_BY_EVENT, &event_id.get().to_be_bytes())
            .await?
            .iter()
            .map(|bytes| decode(bytes))
            .collect()
    }

    async fn find_by_participant(&self, participant: Participant) -> Result<Vec<Membership>> {
        self.scan(CF_MEMBERSHIPS_BY_PARTICIPANT, &participant_key(participant))
            .await?
            .iter()
            .map(|bytes| decode(bytes))
            .collect()
    }

    async fn delete_by_event(&self, event_id: EventId) -> Result<usize> {
        let memberships = self.find_by_event(event_id).await?;
        self.unlink(&memberships).await;
        Ok(memberships.len())
    }

    async fn delete_by_participant(&self, participant: Participant) -> Result<usize> {
        let memberships = self.find_by_participant(participant).await?;
        self.unlink(&memberships).await;
        Ok(memberships.len())
    }
}
