//! Demo case collection for "reset simulation".
//!
//! One case per interesting status so every agent-cycle branch is visible
//! right after a reset. Dates are relative to the chosen start date.

use chrono::{DateTime, Duration, Utc};

use crate::clock::VirtualClock;
use crate::types::{Actor, Case, CaseStatus, ClientContext, DbSchema, LogEntry, Urgency};

/// (client, provider, policy, status, urgency, days since opened)
const SEED_CASES: &[(&str, &str, &str, CaseStatus, Urgency, i64)] = &[
    ("Margaret Holloway", "Aviva", "AV-448120", CaseStatus::Discovery, Urgency::Normal, 2),
    ("Priya & Dev Sharma", "Royal London", "RL-77031", CaseStatus::LoaDrafting, Urgency::Normal, 5),
    ("Tom Becket", "Scottish Widows", "SW-201944", CaseStatus::LoaSentClient, Urgency::High, 12),
    ("Ellen Marsh", "Legal & General", "LG-55902", CaseStatus::ProcessingLoa, Urgency::Normal, 9),
    ("Gareth & Ann Lloyd", "Aegon", "AE-310287", CaseStatus::LoaSentProvider, Urgency::Critical, 21),
    ("Fiona Reid", "Standard Life", "SL-640013", CaseStatus::ProviderAck, Urgency::Normal, 30),
    ("Colin Ashby", "Prudential", "PR-118745", CaseStatus::Completed, Urgency::Normal, 60),
];

/// Fresh collection at `start` with the demo cases.
pub fn seed_database(start: VirtualClock) -> DbSchema {
    let now = start.now();
    let mut db = DbSchema::new(start);
    db.cases = SEED_CASES
        .iter()
        .enumerate()
        .map(|(i, (client, provider, policy, status, urgency, age))| {
            seed_case(i, client, provider, policy, *status, *urgency, now - Duration::days(*age))
        })
        .collect();
    db
}

fn seed_case(
    index: usize,
    client: &str,
    provider: &str,
    policy: &str,
    status: CaseStatus,
    urgency: Urgency,
    opened: DateTime<Utc>,
) -> Case {
    let mut case = Case {
        id: format!("case-seed-{}", index + 1),
        client_name: client.to_string(),
        provider_name: provider.to_string(),
        policy_number: policy.to_string(),
        status,
        urgency,
        date_created: opened,
        last_update_date: opened,
        next_action_date: None,
        client_context: None,
        history: Vec::new(),
    };
    case.record(LogEntry::new(opened, Actor::Advisor, "Case opened."));

    if status.ordinal() >= CaseStatus::LoaSentClient.ordinal() {
        case.record(LogEntry::new(
            opened + Duration::days(1),
            Actor::Advisor,
            "LOA sent to client for signature.",
        ));
    }
    if status.ordinal() >= CaseStatus::LoaSentProvider.ordinal() {
        case.record(LogEntry::new(
            opened + Duration::days(3),
            Actor::Advisor,
            format!("Signed LOA forwarded to {}.", provider),
        ));
    }

    // Every other case carries client intelligence so scripts and
    // mark-step-complete have something to work with.
    if index % 2 == 0 {
        case.client_context = Some(ClientContext {
            goals: vec!["Retire at 65".to_string(), "Consolidate pensions".to_string()],
            risks: vec!["Limited emergency fund".to_string()],
            next_steps: vec![
                format!("Chase {} for transfer value", provider),
                "Confirm beneficiary nominations".to_string(),
            ],
            ..Default::default()
        });
    }

    case
}
