use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::VirtualClock;

// =============================================================================
// Case Status
// =============================================================================

/// Lifecycle states of a chase case, in forward order.
///
/// Serialized as the kebab-case codes stored in the case file
/// (`loa-sent-provider`, `provider-ack`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaseStatus {
    #[default]
    Discovery,
    LoaDrafting,
    LoaSentClient,
    ProcessingLoa,
    LoaSentProvider,
    ProviderAck,
    Completed,
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 7] = [
        CaseStatus::Discovery,
        CaseStatus::LoaDrafting,
        CaseStatus::LoaSentClient,
        CaseStatus::ProcessingLoa,
        CaseStatus::LoaSentProvider,
        CaseStatus::ProviderAck,
        CaseStatus::Completed,
    ];

    /// Position in the forward order, starting at 0 for `discovery`.
    pub fn ordinal(self) -> usize {
        match self {
            CaseStatus::Discovery => 0,
            CaseStatus::LoaDrafting => 1,
            CaseStatus::LoaSentClient => 2,
            CaseStatus::ProcessingLoa => 3,
            CaseStatus::LoaSentProvider => 4,
            CaseStatus::ProviderAck => 5,
            CaseStatus::Completed => 6,
        }
    }

    /// The next status in the normal flow. `None` for the terminal state.
    pub fn next(self) -> Option<CaseStatus> {
        Self::ALL.get(self.ordinal() + 1).copied()
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CaseStatus::Completed)
    }

    /// A status may stay where it is or move exactly one step forward.
    /// Nothing leaves `completed`.
    pub fn can_transition_to(self, target: CaseStatus) -> bool {
        if self.is_terminal() {
            return target == self;
        }
        target == self || self.next() == Some(target)
    }

    pub fn as_code(self) -> &'static str {
        match self {
            CaseStatus::Discovery => "discovery",
            CaseStatus::LoaDrafting => "loa-drafting",
            CaseStatus::LoaSentClient => "loa-sent-client",
            CaseStatus::ProcessingLoa => "processing-loa",
            CaseStatus::LoaSentProvider => "loa-sent-provider",
            CaseStatus::ProviderAck => "provider-ack",
            CaseStatus::Completed => "completed",
        }
    }

    /// Parse a status code. Surrounding whitespace and case are ignored;
    /// anything else unrecognised yields `None`.
    pub fn from_code(code: &str) -> Option<CaseStatus> {
        let normalized = code.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_code() == normalized)
    }

    /// Title-cased label for dashboards: `loa-sent-provider` -> `Loa Sent Provider`.
    pub fn label(self) -> String {
        self.as_code()
            .split('-')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

// =============================================================================
// Urgency / Actor
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    #[default]
    Normal,
    High,
    Critical,
}

impl Urgency {
    pub fn from_code(code: &str) -> Option<Urgency> {
        match code.trim().to_ascii_lowercase().as_str() {
            "normal" => Some(Urgency::Normal),
            "high" => Some(Urgency::High),
            "critical" => Some(Urgency::Critical),
            _ => None,
        }
    }
}

/// Who authored a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actor {
    Advisor,
    Client,
    Provider,
    Agent,
}

// =============================================================================
// Log Entry
// =============================================================================

/// Immutable audit record in a case's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub date: DateTime<Utc>,
    pub actor: Actor,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    pub fn new(date: DateTime<Utc>, actor: Actor, action: impl Into<String>) -> Self {
        Self {
            id: format!("log-{}", Uuid::new_v4()),
            date,
            actor,
            action: action.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

// =============================================================================
// Client Intelligence
// =============================================================================

/// Structured intelligence extracted from a client file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_worth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income_summary: Option<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default)]
    pub occupations: Vec<String>,
    #[serde(default)]
    pub protection: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_review_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Suggested actions surfaced to the advisor.
    #[serde(default)]
    pub next_steps: Vec<String>,
    /// Actions already acted on. Unique; last entry is the most recent.
    #[serde(default)]
    pub completed_steps: Vec<String>,
}

impl ClientContext {
    pub fn is_step_completed(&self, step: &str) -> bool {
        self.completed_steps.iter().any(|s| s == step)
    }

    /// Record a step as done. Returns false when it was already recorded.
    pub fn complete_step(&mut self, step: &str) -> bool {
        if self.is_step_completed(step) {
            return false;
        }
        self.completed_steps.push(step.to_string());
        true
    }

    pub fn most_recent_completed_step(&self) -> Option<&str> {
        self.completed_steps.last().map(String::as_str)
    }
}

// =============================================================================
// Case
// =============================================================================

/// One tracked transfer/chase workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub id: String,
    pub client_name: String,
    pub provider_name: String,
    pub policy_number: String,
    pub status: CaseStatus,
    #[serde(default)]
    pub urgency: Urgency,
    pub date_created: DateTime<Utc>,
    pub last_update_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_action_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_context: Option<ClientContext>,
    #[serde(default)]
    pub history: Vec<LogEntry>,
}

impl Case {
    pub fn new_id() -> String {
        format!("case-{}", Uuid::new_v4())
    }

    /// Append to history and bump `last_update_date` to the entry's date.
    pub fn record(&mut self, entry: LogEntry) {
        self.last_update_date = entry.date;
        self.history.push(entry);
    }

    /// Whole days since the last update, measured on the virtual clock.
    pub fn days_since_update(&self, clock: &VirtualClock) -> i64 {
        clock.days_since(self.last_update_date)
    }

    /// Next steps not yet marked complete, in their original order.
    pub fn pending_next_steps(&self) -> Vec<&str> {
        match &self.client_context {
            Some(ctx) => ctx
                .next_steps
                .iter()
                .filter(|step| !ctx.is_step_completed(step))
                .map(String::as_str)
                .collect(),
            None => Vec::new(),
        }
    }
}

// =============================================================================
// Whole Collection
// =============================================================================

/// The persisted universe: simulated clock plus every case, in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbSchema {
    pub virtual_date: VirtualClock,
    #[serde(default)]
    pub cases: Vec<Case>,
    /// Bumped by the store on every successful save.
    #[serde(default)]
    pub revision: u64,
}

impl DbSchema {
    pub fn new(virtual_date: VirtualClock) -> Self {
        Self {
            virtual_date,
            cases: Vec::new(),
            revision: 0,
        }
    }

    pub fn find_case(&self, id: &str) -> Option<&Case> {
        self.cases.iter().find(|c| c.id == id)
    }

    pub fn find_case_mut(&mut self, id: &str) -> Option<&mut Case> {
        self.cases.iter_mut().find(|c| c.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_case(status: CaseStatus) -> Case {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Case {
            id: "case-1".to_string(),
            client_name: "Alan & Lynne".to_string(),
            provider_name: "Aviva".to_string(),
            policy_number: "P-100".to_string(),
            status,
            urgency: Urgency::Normal,
            date_created: created,
            last_update_date: created,
            next_action_date: None,
            client_context: None,
            history: Vec::new(),
        }
    }

    #[test]
    fn test_status_order_and_terminal() {
        assert_eq!(CaseStatus::Discovery.next(), Some(CaseStatus::LoaDrafting));
        assert_eq!(
            CaseStatus::LoaSentProvider.next(),
            Some(CaseStatus::ProviderAck)
        );
        assert_eq!(CaseStatus::Completed.next(), None);
        assert!(CaseStatus::Completed.is_terminal());
        assert!(!CaseStatus::ProviderAck.is_terminal());
    }

    #[test]
    fn test_transitions_never_skip_or_go_backward() {
        assert!(CaseStatus::LoaSentProvider.can_transition_to(CaseStatus::ProviderAck));
        assert!(CaseStatus::ProviderAck.can_transition_to(CaseStatus::ProviderAck));
        assert!(!CaseStatus::Discovery.can_transition_to(CaseStatus::ProviderAck));
        assert!(!CaseStatus::Completed.can_transition_to(CaseStatus::ProviderAck));
        assert!(!CaseStatus::ProviderAck.can_transition_to(CaseStatus::LoaSentProvider));
    }

    #[test]
    fn test_status_codes_match_serde() {
        for status in CaseStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_code()));
            assert_eq!(CaseStatus::from_code(status.as_code()), Some(status));
        }
        assert_eq!(
            CaseStatus::from_code("  Provider-Ack "),
            Some(CaseStatus::ProviderAck)
        );
        assert_eq!(CaseStatus::from_code("awaiting_signature"), None);
    }

    #[test]
    fn test_status_label() {
        assert_eq!(CaseStatus::LoaSentProvider.label(), "Loa Sent Provider");
        assert_eq!(CaseStatus::Discovery.label(), "Discovery");
    }

    #[test]
    fn test_urgency_parsing() {
        assert_eq!(Urgency::from_code("HIGH"), Some(Urgency::High));
        assert_eq!(Urgency::from_code("urgent"), None);
    }

    #[test]
    fn test_complete_step_is_unique() {
        let mut ctx = ClientContext::default();
        assert!(ctx.complete_step("Call provider"));
        assert!(!ctx.complete_step("Call provider"));
        assert!(ctx.complete_step("Send LOA"));
        assert_eq!(ctx.completed_steps.len(), 2);
        assert_eq!(ctx.most_recent_completed_step(), Some("Send LOA"));
    }

    #[test]
    fn test_pending_next_steps_skip_completed() {
        let mut case = sample_case(CaseStatus::Discovery);
        assert!(case.pending_next_steps().is_empty());

        case.client_context = Some(ClientContext {
            next_steps: vec!["Book review".to_string(), "Chase LOA".to_string()],
            completed_steps: vec!["Book review".to_string()],
            ..Default::default()
        });
        assert_eq!(case.pending_next_steps(), vec!["Chase LOA"]);
    }

    #[test]
    fn test_record_appends_and_bumps_update_date() {
        let mut case = sample_case(CaseStatus::LoaSentClient);
        let later = Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap();
        case.record(LogEntry::new(later, Actor::Agent, "Reminder sent"));
        assert_eq!(case.history.len(), 1);
        assert_eq!(case.last_update_date, later);
        assert!(case.history[0].id.starts_with("log-"));
    }

    #[test]
    fn test_case_json_shape_is_camel_case() {
        let case = sample_case(CaseStatus::LoaSentClient);
        let json = serde_json::to_value(&case).unwrap();
        assert_eq!(json["clientName"], "Alan & Lynne");
        assert_eq!(json["status"], "loa-sent-client");
        assert_eq!(json["urgency"], "normal");
        assert!(json.get("clientContext").is_none());
    }

    #[test]
    fn test_db_schema_tolerates_missing_revision() {
        let raw = r#"{"virtualDate":"2024-01-01T00:00:00.000Z","cases":[]}"#;
        let db: DbSchema = serde_json::from_str(raw).unwrap();
        assert_eq!(db.revision, 0);
        assert!(db.cases.is_empty());
    }
}
