//! Client-file ingestion: raw text in, new [`Case`] out.
//!
//! The completion service does the reading; this module decides what of its
//! answer to believe. Identity fields fall back to fixed defaults, unknown
//! status/urgency codes are replaced, and list fields default to empty.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::completion::{complete_within, CompletionProvider, CompletionRequest};
use crate::error::CaseError;
use crate::parse::{list_field, object_field, parse_object, text_field};
use crate::prompts::{build_ingest_prompt, INGEST_SYSTEM};
use crate::types::{Actor, Case, CaseStatus, ClientContext, LogEntry, Urgency};

pub const DEFAULT_CLIENT_NAME: &str = "Unknown Client";
pub const DEFAULT_PROVIDER_NAME: &str = "General Portfolio";
pub const DEFAULT_POLICY_NUMBER: &str = "Pending";
pub const DEFAULT_SEED_LOG: &str = "Imported client file.";

/// Ask the completion service to read a client file and build a case from
/// the answer. Nothing is persisted here.
pub async fn extract_case(
    provider: &dyn CompletionProvider,
    raw_text: &str,
    now: DateTime<Utc>,
    timeout: Duration,
) -> Result<Case, CaseError> {
    if raw_text.trim().is_empty() {
        return Err(CaseError::InvalidArgument(
            "client file is empty".to_string(),
        ));
    }

    let request = CompletionRequest::structured(INGEST_SYSTEM, build_ingest_prompt(raw_text));
    let response = complete_within(provider, request, timeout)
        .await
        .map_err(|e| CaseError::ExtractionFailed(e.to_string()))?;

    let extracted = parse_object(&response).map_err(CaseError::ExtractionFailed)?;
    Ok(case_from_extraction(&extracted, now))
}

/// Build a case from an untyped extraction payload, defaulting every field
/// that is missing or malformed.
pub fn case_from_extraction(extracted: &Map<String, Value>, now: DateTime<Utc>) -> Case {
    let status = text_field(extracted, "status")
        .and_then(|s| CaseStatus::from_code(&s))
        .unwrap_or_default();
    let urgency = text_field(extracted, "urgency")
        .and_then(|u| Urgency::from_code(&u))
        .unwrap_or_default();

    let client_context = client_context_from(object_field(extracted, "clientContext"));
    let seed_log = text_field(extracted, "latestLog").unwrap_or_else(|| DEFAULT_SEED_LOG.to_string());

    Case {
        id: Case::new_id(),
        client_name: text_field(extracted, "clientName")
            .unwrap_or_else(|| DEFAULT_CLIENT_NAME.to_string()),
        provider_name: text_field(extracted, "providerName")
            .unwrap_or_else(|| DEFAULT_PROVIDER_NAME.to_string()),
        policy_number: text_field(extracted, "policyNumber")
            .unwrap_or_else(|| DEFAULT_POLICY_NUMBER.to_string()),
        status,
        urgency,
        date_created: now,
        last_update_date: now,
        next_action_date: client_context.next_review_date.clone(),
        client_context: Some(client_context),
        history: vec![LogEntry::new(now, Actor::Agent, seed_log)],
    }
}

fn client_context_from(ctx: Option<&Map<String, Value>>) -> ClientContext {
    let empty = Map::new();
    let ctx = ctx.unwrap_or(&empty);
    ClientContext {
        net_worth: text_field(ctx, "netWorth"),
        income_summary: text_field(ctx, "incomeSummary"),
        goals: list_field(ctx, "goals"),
        risks: list_field(ctx, "risks"),
        occupations: list_field(ctx, "occupations"),
        protection: list_field(ctx, "protection"),
        // Older prompt revisions used nextActionDate for the same row
        next_review_date: text_field(ctx, "nextReviewDate")
            .or_else(|| text_field(ctx, "nextActionDate")),
        notes: text_field(ctx, "notes"),
        next_steps: dedup_preserving_order(list_field(ctx, "nextSteps")),
        completed_steps: Vec::new(),
    }
}

fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
