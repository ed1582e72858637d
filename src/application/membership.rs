use crate::domain::event::{Event, EventDetails, EventId};
use crate::domain::membership::Membership;
use crate::domain::participant::{
    Individual, IndividualDetails, IndividualId, Organization, OrganizationDetails,
    OrganizationId, ParticipantRecord,
};
use crate::domain::payment::PaymentMethod;
use crate::domain::ports::{RegistryBox, UnitOfWork};
use crate::error::{RegistryError, Result};
use serde::Serialize;
use std::collections::HashSet;

/// Participants of one event, split by kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Roster {
    pub individuals: Vec<Individual>,
    pub organizations: Vec<Organization>,
}

/// Registers participants to events and keeps the links consistent.
///
/// `MembershipService` owns the storage backend. Each public operation begins
/// one unit of work, performs all of its reads and writes inside it, and
/// commits only on success; an early `?` return drops the unit and with it
/// every pending write.
pub struct MembershipService {
    registry: RegistryBox,
}

impl MembershipService {
    /// Creates a new `MembershipService` over the given registry.
    pub fn new(registry: RegistryBox) -> Self {
        Self { registry }
    }

    /// Creates an individual and registers it to `event_id` in one step.
    ///
    /// Fails with `DuplicateParticipant` when the personal code is taken,
    /// `EventNotFound` or `PaymentMethodNotFound` when a reference does not
    /// resolve. On failure neither the record nor the membership is kept.
    pub async fn register_new_individual(
        &self,
        details: IndividualDetails,
        event_id: EventId,
        payment_method: &str,
    ) -> Result<Individual> {
        self.register_new::<Individual>(details, event_id, payment_method)
            .await
    }

    /// Organization counterpart of [`Self::register_new_individual`], keyed by
    /// registry code.
    pub async fn register_new_organization(
        &self,
        details: OrganizationDetails,
        event_id: EventId,
        payment_method: &str,
    ) -> Result<Organization> {
        self.register_new::<Organization>(details, event_id, payment_method)
            .await
    }

    /// Links a stored individual to an event it is not yet registered to.
    pub async fn register_existing_individual(
        &self,
        id: IndividualId,
        event_id: EventId,
    ) -> Result<Individual> {
        self.register_existing::<Individual>(id, event_id).await
    }

    /// Organization counterpart of [`Self::register_existing_individual`].
    pub async fn register_existing_organization(
        &self,
        id: OrganizationId,
        event_id: EventId,
    ) -> Result<Organization> {
        self.register_existing::<Organization>(id, event_id).await
    }

    /// Creates an individual without registering it anywhere.
    ///
    /// An empty or absent payment method leaves the record without one.
    pub async fn create_individual(
        &self,
        details: IndividualDetails,
        payment_method: Option<&str>,
    ) -> Result<Individual> {
        self.create::<Individual>(details, payment_method).await
    }

    /// Organization counterpart of [`Self::create_individual`].
    pub async fn create_organization(
        &self,
        details: OrganizationDetails,
        payment_method: Option<&str>,
    ) -> Result<Organization> {
        self.create::<Organization>(details, payment_method).await
    }

    /// Removes the individual and all of its memberships.
    ///
    /// Returns `false` when no such individual exists.
    pub async fn delete_individual(&self, id: IndividualId) -> Result<bool> {
        self.delete::<Individual>(id).await
    }

    /// Removes the organization and all of its memberships.
    pub async fn delete_organization(&self, id: OrganizationId) -> Result<bool> {
        self.delete::<Organization>(id).await
    }

    /// Replaces every attribute of the individual with `details`.
    ///
    /// The payment method changes only when a non-empty name is given.
    /// Memberships are not touched.
    pub async fn update_individual(
        &self,
        id: IndividualId,
        details: IndividualDetails,
        payment_method: Option<&str>,
    ) -> Result<Individual> {
        self.update::<Individual>(id, details, payment_method).await
    }

    /// Organization counterpart of [`Self::update_individual`].
    pub async fn update_organization(
        &self,
        id: OrganizationId,
        details: OrganizationDetails,
        payment_method: Option<&str>,
    ) -> Result<Organization> {
        self.update::<Organization>(id, details, payment_method).await
    }

    /// Fails with `ParticipantNotFound` for an unknown id.
    pub async fn get_individual(&self, id: IndividualId) -> Result<Individual> {
        self.get::<Individual>(id).await
    }

    /// Organization counterpart of [`Self::get_individual`].
    pub async fn get_organization(&self, id: OrganizationId) -> Result<Organization> {
        self.get::<Organization>(id).await
    }

    /// Everyone registered to the event.
    pub async fn list_members_of_event(&self, event_id: EventId) -> Result<Roster> {
        let unit = self.registry.begin().await?;
        let event = find_event(&*unit, event_id).await?;
        let memberships = unit.memberships().find_by_event(event.id).await?;

        let roster = Roster {
            individuals: linked_records::<Individual>(&*unit, &memberships).await?,
            organizations: linked_records::<Organization>(&*unit, &memberships).await?,
        };
        tracing::debug!(
            event_id = %event.id,
            individuals = roster.individuals.len(),
            organizations = roster.organizations.len(),
            "listed members"
        );
        Ok(roster)
    }

    /// Every stored participant not yet registered to the event.
    pub async fn list_available_for_event(&self, event_id: EventId) -> Result<Roster> {
        let unit = self.registry.begin().await?;
        let event = find_event(&*unit, event_id).await?;
        let memberships = unit.memberships().find_by_event(event.id).await?;

        Ok(Roster {
            individuals: unlinked_records::<Individual>(&*unit, &memberships).await?,
            organizations: unlinked_records::<Organization>(&*unit, &memberships).await?,
        })
    }

    pub async fn create_event(&self, details: EventDetails) -> Result<Event> {
        let unit = self.registry.begin().await?;
        let event = unit.events().insert(details).await?;
        unit.commit().await?;
        tracing::info!(event_id = %event.id, name = %event.details.name, "created event");
        Ok(event)
    }

    pub async fn list_events(&self) -> Result<Vec<Event>> {
        let unit = self.registry.begin().await?;
        unit.events().find_all().await
    }

    /// Removes the event after removing every membership that points at it.
    ///
    /// Returns `false` when no such event exists.
    pub async fn delete_event(&self, event_id: EventId) -> Result<bool> {
        let unit = self.registry.begin().await?;
        let Some(event) = unit.events().find_by_id(event_id).await? else {
            return Ok(false);
        };

        let removed = unit.memberships().delete_by_event(event.id).await?;
        unit.events().delete(&event).await?;
        unit.commit().await?;
        tracing::info!(%event_id, memberships = removed, "deleted event");
        Ok(true)
    }

    pub async fn list_payment_methods(&self) -> Result<Vec<PaymentMethod>> {
        let unit = self.registry.begin().await?;
        unit.payment_methods().find_all().await
    }

    async fn register_new<P: ParticipantRecord>(
        &self,
        details: P::Details,
        event_id: EventId,
        payment_method: &str,
    ) -> Result<P> {
        let unit = self.registry.begin().await?;
        ensure_unique::<P>(&*unit, &details).await?;
        let event = find_event(&*unit, event_id).await?;
        let method = resolve_payment_method(&*unit, payment_method).await?;

        let saved = P::store(&*unit).insert(details, Some(method)).await?;
        unit.memberships()
            .save(Membership::new(event.id, saved.participant()))
            .await?;
        unit.commit().await?;

        tracing::info!(
            kind = %P::KIND,
            id = %saved.id(),
            event_id = %event.id,
            "registered new participant"
        );
        Ok(saved)
    }

    async fn register_existing<P: ParticipantRecord>(
        &self,
        id: P::Id,
        event_id: EventId,
    ) -> Result<P> {
        let unit = self.registry.begin().await?;
        let record = find_participant::<P>(&*unit, id).await?;
        let event = find_event(&*unit, event_id).await?;
        let participant = record.participant();

        // Stores reject a repeated pair as well; this turns it into a clean
        // error before anything is written.
        let already_registered = unit
            .memberships()
            .find_by_event(event.id)
            .await?
            .iter()
            .any(|m| m.participant == participant);
        if already_registered {
            return Err(RegistryError::AlreadyRegistered {
                participant,
                event_id: event.id,
            });
        }

        unit.memberships()
            .save(Membership::new(event.id, participant))
            .await?;
        unit.commit().await?;

        tracing::info!(%participant, event_id = %event.id, "registered existing participant");
        Ok(record)
    }

    async fn create<P: ParticipantRecord>(
        &self,
        details: P::Details,
        payment_method: Option<&str>,
    ) -> Result<P> {
        let unit = self.registry.begin().await?;
        ensure_unique::<P>(&*unit, &details).await?;
        let method = match payment_method.filter(|name| !name.is_empty()) {
            Some(name) => Some(resolve_payment_method(&*unit, name).await?),
            None => None,
        };

        let saved = P::store(&*unit).insert(details, method).await?;
        unit.commit().await?;

        tracing::info!(kind = %P::KIND, id = %saved.id(), "created participant");
        Ok(saved)
    }

    async fn delete<P: ParticipantRecord>(&self, id: P::Id) -> Result<bool> {
        let unit = self.registry.begin().await?;
        let Some(record) = P::store(&*unit).find_by_id(id).await? else {
            tracing::debug!(kind = %P::KIND, %id, "nothing to delete");
            return Ok(false);
        };

        let removed = unit
            .memberships()
            .delete_by_participant(record.participant())
            .await?;
        P::store(&*unit).delete(&record).await?;
        unit.commit().await?;

        tracing::info!(kind = %P::KIND, %id, memberships = removed, "deleted participant");
        Ok(true)
    }

    async fn update<P: ParticipantRecord>(
        &self,
        id: P::Id,
        details: P::Details,
        payment_method: Option<&str>,
    ) -> Result<P> {
        let unit = self.registry.begin().await?;
        let mut record = find_participant::<P>(&*unit, id).await?;

        let new_key = P::natural_key(&details);
        if new_key != record.key() && P::store(&*unit).exists_by_natural_key(new_key).await? {
            return Err(RegistryError::DuplicateParticipant {
                kind: P::KIND,
                key: new_key.to_string(),
            });
        }

        if let Some(name) = payment_method.filter(|name| !name.is_empty()) {
            record.set_payment_method(resolve_payment_method(&*unit, name).await?);
        }
        record.replace_details(details);

        let saved = P::store(&*unit).save(record).await?;
        unit.commit().await?;

        tracing::info!(kind = %P::KIND, %id, "updated participant");
        Ok(saved)
    }

    async fn get<P: ParticipantRecord>(&self, id: P::Id) -> Result<P> {
        let unit = self.registry.begin().await?;
        find_participant::<P>(&*unit, id).await
    }
}

async fn find_event(unit: &dyn UnitOfWork, event_id: EventId) -> Result<Event> {
    unit.events()
        .find_by_id(event_id)
        .await?
        .ok_or(RegistryError::EventNotFound(event_id))
}

async fn find_participant<P: ParticipantRecord>(unit: &dyn UnitOfWork, id: P::Id) -> Result<P> {
    P::store(unit)
        .find_by_id(id)
        .await?
        .ok_or(RegistryError::ParticipantNotFound {
            kind: P::KIND,
            id: id.into(),
        })
}

async fn resolve_payment_method(unit: &dyn UnitOfWork, name: &str) -> Result<PaymentMethod> {
    unit.payment_methods()
        .find_by_name(name)
        .await?
        .ok_or_else(|| RegistryError::PaymentMethodNotFound(name.to_string()))
}

async fn ensure_unique<P: ParticipantRecord>(
    unit: &dyn UnitOfWork,
    details: &P::Details,
) -> Result<()> {
    let key = P::natural_key(details);
    if P::store(unit).exists_by_natural_key(key).await? {
        return Err(RegistryError::DuplicateParticipant {
            kind: P::KIND,
            key: key.to_string(),
        });
    }
    Ok(())
}

/// Records of kind `P` referenced by `memberships`, in membership order.
async fn linked_records<P: ParticipantRecord>(
    unit: &dyn UnitOfWork,
    memberships: &[Membership],
) -> Result<Vec<P>> {
    let store = P::store(unit);
    let mut records = Vec::new();
    for id in memberships.iter().filter_map(|m| P::linked(&m.participant)) {
        match store.find_by_id(id).await? {
            Some(record) => records.push(record),
            None => tracing::warn!(kind = %P::KIND, %id, "membership references a missing record"),
        }
    }
    Ok(records)
}

/// All records of kind `P` that `memberships` does not reference.
async fn unlinked_records<P: ParticipantRecord>(
    unit: &dyn UnitOfWork,
    memberships: &[Membership],
) -> Result<Vec<P>> {
    let registered: HashSet<P::Id> = memberships
        .iter()
        .filter_map(|m| P::linked(&m.participant))
        .collect();

    Ok(P::store(unit)
        .find_all()
        .await?
        .into_iter()
        .filter(|record| !registered.contains(&record.id()))
        .collect())
}
