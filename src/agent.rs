//! Autonomous agent cycle.
//!
//! One pass over every case in collection order. Only two statuses have
//! automatic behaviour today:
//! - `loa-sent-client`: the client may still not have signed, so send a nudge
//!   (history only, no status change).
//! - `loa-sent-provider`: the provider may have acknowledged, so move to
//!   `provider-ack`.
//!
//! Every other status needs an advisor or an uploaded document to advance.
//! Each eligible case consumes exactly one decision, in order, so a seeded
//! source reproduces a whole cycle.

use chrono::{DateTime, Utc};

use crate::config::AgentConfig;
use crate::sampling::DecisionSource;
use crate::types::{Actor, Case, CaseStatus, DbSchema, LogEntry};

pub const REMINDER_ACTION: &str = "Client has not signed. Sent SMS reminder.";

pub fn acknowledgement_action(sla_days: u32) -> String {
    format!("Received acknowledgement. SLA: {} days.", sla_days)
}

/// Run one cycle over the whole collection at the collection's virtual date.
/// Returns how many cases received an action.
pub fn run_cycle(
    db: &mut DbSchema,
    rules: &AgentConfig,
    decisions: &mut dyn DecisionSource,
) -> usize {
    let now = db.virtual_date.now();
    let mut actions_taken = 0;

    for case in db.cases.iter_mut() {
        if step_case(case, now, rules, decisions) {
            actions_taken += 1;
        }
    }

    log::info!(
        "Agent cycle at {}: {} of {} cases actioned",
        now.format("%Y-%m-%d"),
        actions_taken,
        db.cases.len()
    );
    actions_taken
}

/// Apply the status rule for a single case. Returns true when it acted.
pub fn step_case(
    case: &mut Case,
    now: DateTime<Utc>,
    rules: &AgentConfig,
    decisions: &mut dyn DecisionSource,
) -> bool {
    match case.status {
        CaseStatus::LoaSentClient => {
            if !decisions.decide(rules.reminder_probability) {
                return false;
            }
            case.record(LogEntry::new(now, Actor::Agent, REMINDER_ACTION));
            log::debug!("Case {}: client reminder sent", case.id);
            true
        }
        CaseStatus::LoaSentProvider => {
            if !decisions.decide(rules.acknowledgement_probability) {
                return false;
            }
            case.status = CaseStatus::ProviderAck;
            case.record(LogEntry::new(
                now,
                Actor::Provider,
                acknowledgement_action(rules.provider_sla_days),
            ));
            log::debug!("Case {}: provider acknowledged", case.id);
            true
        }
        CaseStatus::Discovery
        | CaseStatus::LoaDrafting
        | CaseStatus::ProcessingLoa
        | CaseStatus::ProviderAck
        | CaseStatus::Completed => false,
    }
}
