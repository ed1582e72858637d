use super::membership::{Participant, ParticipantKind};
use super::payment::PaymentMethod;
use super::ports::{ParticipantStore, UnitOfWork};
use super::record_id;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};
use std::hash::Hash;

record_id!(
    /// Store-assigned identifier of an [`Individual`].
    IndividualId
);

record_id!(
    /// Store-assigned identifier of an [`Organization`].
    OrganizationId
);

/// Caller-supplied attributes of a natural person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndividualDetails {
    pub first_name: String,
    pub last_name: String,
    /// Natural key.
    pub personal_code: String,
    #[serde(default)]
    pub notes: String,
}

/// Caller-supplied attributes of a legal entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationDetails {
    pub name: String,
    /// Natural key.
    pub registry_code: String,
    pub participant_count: u32,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Individual {
    pub id: IndividualId,
    #[serde(flatten)]
    pub details: IndividualDetails,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    #[serde(flatten)]
    pub details: OrganizationDetails,
    pub payment_method: Option<PaymentMethod>,
}

/// Behavior shared by both kinds of participant record.
///
/// The membership service is written once against this trait; each record
/// kind supplies its natural key, its link shape, and the store that holds it.
pub trait ParticipantRecord:
    Clone + Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
    type Id: Copy + Eq + Ord + Hash + Debug + Display + Send + Sync + From<u64> + Into<u64>;
    type Details: Clone + Debug + Send + Sync + Serialize + DeserializeOwned;

    const KIND: ParticipantKind;

    fn assemble(
        id: Self::Id,
        details: Self::Details,
        payment_method: Option<PaymentMethod>,
    ) -> Self;

    fn id(&self) -> Self::Id;

    fn details(&self) -> &Self::Details;

    fn replace_details(&mut self, details: Self::Details);

    fn set_payment_method(&mut self, payment_method: PaymentMethod);

    fn natural_key(details: &Self::Details) -> &str;

    fn link(id: Self::Id) -> Participant;

    /// Inverse of [`ParticipantRecord::link`]; `None` for the other kind.
    fn linked(participant: &Participant) -> Option<Self::Id>;

    fn store(unit: &dyn UnitOfWork) -> &dyn ParticipantStore<Self>;

    fn key(&self) -> &str {
        Self::natural_key(self.details())
    }

    fn participant(&self) -> Participant {
        Self::link(self.id())
    }
}

impl ParticipantRecord for Individual {
    type Id = IndividualId;
    type Details = IndividualDetails;

    const KIND: ParticipantKind = ParticipantKind::Individual;

    fn assemble(
        id: IndividualId,
        details: IndividualDetails,
        payment_method: Option<PaymentMethod>,
    ) -> Self {
        Self {
            id,
            details,
            payment_method,
        }
    }

    fn id(&self) -> IndividualId {
        self.id
    }

    fn details(&self) -> &IndividualDetails {
        &self.details
    }

    fn replace_details(&mut self, details: IndividualDetails) {
        self.details = details;
    }

    fn set_payment_method(&mut self, payment_method: PaymentMethod) {
        self.payment_method = Some(payment_method);
    }

    fn natural_key(details: &IndividualDetails) -> &str {
        &details.personal_code
    }

    fn link(id: IndividualId) -> Participant {
        Participant::Individual(id)
    }

    fn linked(participant: &Participant) -> Option<IndividualId> {
        match participant {
            Participant::Individual(id) => Some(*id),
            Participant::Organization(_) => None,
        }
    }

    fn store(unit: &dyn UnitOfWork) -> &dyn ParticipantStore<Self> {
        unit.individuals()
    }
}

impl ParticipantRecord for Organization {
    type Id = OrganizationId;
    type Details = OrganizationDetails;

    const KIND: ParticipantKind = ParticipantKind::Organization;

    fn assemble(
        id: OrganizationId,
        details: OrganizationDetails,
        payment_method: Option<PaymentMethod>,
    ) -> Self {
        Self {
            id,
            details,
            payment_method,
        }
    }

    fn id(&self) -> OrganizationId {
        self.id
    }

    fn details(&self) -> &OrganizationDetails {
        &self.details
    }

    fn replace_details(&mut self, details: OrganizationDetails) {
        self.details = details;
    }

    fn set_payment_method(&mut self, payment_method: PaymentMethod) {
        self.payment_method = Some(payment_method);
    }

    fn natural_key(details: &OrganizationDetails) -> &str {
        &details.registry_code
    }

    fn link(id: OrganizationId) -> Participant {
        Participant::Organization(id)
    }

    fn linked(participant: &Participant) -> Option<OrganizationId> {
        match participant {
            Participant::Organization(id) => Some(*id),
            Participant::Individual(_) => None,
        }
    }

    fn store(unit: &dyn UnitOfWork) -> &dyn ParticipantStore<Self> {
        unit.organizations()
    }
}
