#![allow(dead_code)]

use regdesk::application::membership::MembershipService;
use regdesk::domain::event::EventDetails;
use regdesk::domain::participant::{IndividualDetails, OrganizationDetails};
use regdesk::infrastructure::in_memory::InMemoryRegistry;
use std::io::{Error, Write};
use tempfile::NamedTempFile;

pub fn service() -> MembershipService {
    MembershipService::new(Box::new(InMemoryRegistry::new()))
}

pub fn person(code: &str) -> IndividualDetails {
    IndividualDetails {
        first_name: "Kati".to_string(),
        last_name: "Karu".to_string(),
        personal_code: code.to_string(),
        notes: String::new(),
    }
}

pub fn company(code: &str) -> OrganizationDetails {
    OrganizationDetails {
        name: "Karu AS".to_string(),
        registry_code: code.to_string(),
        participant_count: 10,
        notes: String::new(),
    }
}

pub fn event(name: &str) -> EventDetails {
    EventDetails {
        name: name.to_string(),
        starts_at: "2026-11-15T09:00:00Z".parse().expect("valid timestamp"),
        location: "Tallinn".to_string(),
        notes: String::new(),
    }
}

/// Writes a JSON-lines command file for the binary.
pub fn command_file(lines: &[&str]) -> Result<NamedTempFile, Error> {
    let mut file = NamedTempFile::new()?;
    for line in lines {
        writeln!(file, "{}", line)?;
    }
    file.flush()?;
    Ok(file)
}
