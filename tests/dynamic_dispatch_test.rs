use regdesk::application::membership::MembershipService;
use regdesk::domain::ports::RegistryBox;
use regdesk::error::RegistryError;
use regdesk::infrastructure::in_memory::InMemoryRegistry;
use std::sync::Arc;

mod common;

use common::{event, person};

#[tokio::test]
async fn test_service_is_shareable_across_tasks() {
    let registry: RegistryBox = Box::new(InMemoryRegistry::new());
    let service = Arc::new(MembershipService::new(registry));
    let launch = service.create_event(event("Launch")).await.unwrap();
    let event_id = launch.id;

    let mut handles = Vec::new();
    for code in 1..=8 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service
                .register_new_individual(person(&code.to_string()), event_id, "cash")
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let members = service.list_members_of_event(launch.id).await.unwrap();
    assert_eq!(members.individuals.len(), 8);
}

#[tokio::test]
async fn test_racing_registrations_create_one_membership() {
    let service = Arc::new(MembershipService::new(Box::new(InMemoryRegistry::new())));
    let launch = service.create_event(event("Launch")).await.unwrap();
    let kati = service.create_individual(person("1"), None).await.unwrap();
    let (individual_id, event_id) = (kati.id, launch.id);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service.register_existing_individual(individual_id, event_id).await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(RegistryError::AlreadyRegistered { .. }) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(succeeded, 1);
    let members = service.list_members_of_event(launch.id).await.unwrap();
    assert_eq!(members.individuals.len(), 1);
}

#[tokio::test]
async fn test_racing_new_registrations_keep_natural_key_unique() {
    let service = Arc::new(MembershipService::new(Box::new(InMemoryRegistry::new())));
    let event_id = service.create_event(event("Launch")).await.unwrap().id;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service
                .register_new_individual(person("1"), event_id, "transfer")
                .await
        }));
    }

    let results: Vec<_> = join_all(handles).await;
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().filter(|r| r.is_err()).all(|r| matches!(
        r,
        Err(RegistryError::DuplicateParticipant { .. })
    )));
}

async fn join_all<T>(handles: Vec<tokio::task::JoinHandle<T>>) -> Vec<T> {
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    results
}
