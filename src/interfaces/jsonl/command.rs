use crate::application::membership::{MembershipService, Roster};
use crate::domain::event::{Event, EventDetails, EventId};
use crate::domain::participant::{
    Individual, IndividualDetails, IndividualId, Organization, OrganizationDetails,
    OrganizationId,
};
use crate::domain::payment::PaymentMethod;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// One line of batch input, tagged by `"op"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    CreateEvent {
        event: EventDetails,
    },
    DeleteEvent {
        event_id: EventId,
    },
    ListEvents,
    ListPaymentMethods,
    CreateIndividual {
        individual: IndividualDetails,
        #[serde(default)]
        payment_method: Option<String>,
    },
    RegisterIndividual {
        event_id: EventId,
        individual: IndividualDetails,
        payment_method: String,
    },
    RegisterExistingIndividual {
        individual_id: IndividualId,
        event_id: EventId,
    },
    UpdateIndividual {
        individual_id: IndividualId,
        individual: IndividualDetails,
        #[serde(default)]
        payment_method: Option<String>,
    },
    DeleteIndividual {
        individual_id: IndividualId,
    },
    GetIndividual {
        individual_id: IndividualId,
    },
    CreateOrganization {
        organization: OrganizationDetails,
        #[serde(default)]
        payment_method: Option<String>,
    },
    RegisterOrganization {
        event_id: EventId,
        organization: OrganizationDetails,
        payment_method: String,
    },
    RegisterExistingOrganization {
        organization_id: OrganizationId,
        event_id: EventId,
    },
    UpdateOrganization {
        organization_id: OrganizationId,
        organization: OrganizationDetails,
        #[serde(default)]
        payment_method: Option<String>,
    },
    DeleteOrganization {
        organization_id: OrganizationId,
    },
    GetOrganization {
        organization_id: OrganizationId,
    },
    ListMembers {
        event_id: EventId,
    },
    ListAvailable {
        event_id: EventId,
    },
}

/// Result of a successfully executed command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Event(Event),
    Events(Vec<Event>),
    PaymentMethods(Vec<PaymentMethod>),
    Individual(Individual),
    Organization(Organization),
    Deleted(bool),
    Members(Roster),
    Available(Roster),
}

impl Command {
    /// Runs the command against the service.
    pub async fn execute(self, service: &MembershipService) -> Result<Outcome> {
        let outcome = match self {
            Command::CreateEvent { event } => Outcome::Event(service.create_event(event).await?),
            Command::DeleteEvent { event_id } => {
                Outcome::Deleted(service.delete_event(event_id).await?)
            }
            Command::ListEvents => Outcome::Events(service.list_events().await?),
            Command::ListPaymentMethods => {
                Outcome::PaymentMethods(service.list_payment_methods().await?)
            }
            Command::CreateIndividual {
                individual,
                payment_method,
            } => Outcome::Individual(
                service
                    .create_individual(individual, payment_method.as_deref())
                    .await?,
            ),
            Command::RegisterIndividual {
                event_id,
                individual,
                payment_method,
            } => Outcome::Individual(
                service
                    .register_new_individual(individual, event_id, &payment_method)
                    .await?,
            ),
            Command::RegisterExistingIndividual {
                individual_id,
                event_id,
            } => Outcome::Individual(
                service
                    .register_existing_individual(individual_id, event_id)
                    .await?,
            ),
            Command::UpdateIndividual {
                individual_id,
                individual,
                payment_method,
            } => Outcome::Individual(
                service
                    .update_individual(individual_id, individual, payment_method.as_deref())
                    .await?,
            ),
            Command::DeleteIndividual { individual_id } => {
                Outcome::Deleted(service.delete_individual(individual_id).await?)
            }
            Command::GetIndividual { individual_id } => {
                Outcome::Individual(service.get_individual(individual_id).await?)
            }
            Command::CreateOrganization {
                organization,
                payment_method,
            } => Outcome::Organization(
                service
                    .create_organization(organization, payment_method.as_deref())
                    .await?,
            ),
            Command::RegisterOrganization {
                event_id,
                organization,
                payment_method,
            } => Outcome::Organization(
                service
                    .register_new_organization(organization, event_id, &payment_method)
                    .await?,
            ),
            Command::RegisterExistingOrganization {
                organization_id,
                event_id,
            } => Outcome::Organization(
                service
                    .register_existing_organization(organization_id, event_id)
                    .await?,
            ),
            Command::UpdateOrganization {
                organization_id,
                organization,
                payment_method,
            } => Outcome::Organization(
                service
                    .update_organization(organization_id, organization, payment_method.as_deref())
                    .await?,
            ),
            Command::DeleteOrganization { organization_id } => {
                Outcome::Deleted(service.delete_organization(organization_id).await?)
            }
            Command::GetOrganization { organization_id } => {
                Outcome::Organization(service.get_organization(organization_id).await?)
            }
            Command::ListMembers { event_id } => {
                Outcome::Members(service.list_members_of_event(event_id).await?)
            }
            Command::ListAvailable { event_id } => {
                Outcome::Available(service.list_available_for_event(event_id).await?)
            }
        };
        Ok(outcome)
    }
}
