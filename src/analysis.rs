//! Provider/client response analysis.
//!
//! A received document can only ever move a case to `provider-ack`, and only
//! along a legal edge of the status machine. A "completed" suggestion is
//! held at `provider-ack`; only an advisor marks a case completed.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::completion::{complete_within, CompletionProvider, CompletionRequest};
use crate::error::CaseError;
use crate::parse::{is_absence_marker, parse_object, text_field};
use crate::prompts::{build_analysis_prompt, ANALYSIS_SYSTEM};
use crate::types::{Actor, Case, CaseStatus, LogEntry};

pub const DEFAULT_ANALYSIS_LOG: &str = "Analyzed uploaded document";
const MISSING_ANALYSIS: &str = "No analysis returned.";

/// What the completion service said about a document, after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentAnalysis {
    pub analysis: String,
    pub log_entry: String,
    pub suggested_status: Option<String>,
    pub call_script: Option<String>,
}

/// Result handed back to the caller once the analysis is applied.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub case_id: String,
    pub analysis: String,
    pub log_entry: LogEntry,
    pub call_script: Option<String>,
    pub previous_status: CaseStatus,
    pub status: CaseStatus,
}

impl AnalysisOutcome {
    pub fn status_changed(&self) -> bool {
        self.previous_status != self.status
    }
}

/// Send the document plus case context to the completion service.
/// The case is read, never modified.
pub async fn analyze_document(
    provider: &dyn CompletionProvider,
    case: &Case,
    document: &str,
    timeout: Duration,
) -> Result<DocumentAnalysis, CaseError> {
    let request =
        CompletionRequest::structured(ANALYSIS_SYSTEM, build_analysis_prompt(case, document));
    let response = complete_within(provider, request, timeout)
        .await
        .map_err(|e| CaseError::AnalysisFailed(e.to_string()))?;

    let obj = parse_object(&response).map_err(CaseError::AnalysisFailed)?;
    Ok(document_analysis_from(&obj))
}

pub fn document_analysis_from(obj: &Map<String, Value>) -> DocumentAnalysis {
    DocumentAnalysis {
        analysis: text_field(obj, "analysis").unwrap_or_else(|| MISSING_ANALYSIS.to_string()),
        log_entry: text_field(obj, "logEntry").unwrap_or_else(|| DEFAULT_ANALYSIS_LOG.to_string()),
        suggested_status: text_field(obj, "newStatus"),
        call_script: text_field(obj, "callScript").filter(|s| !is_absence_marker(s)),
    }
}

/// Map a status suggestion onto the only status analysis may request.
/// Only the exact codes count.
pub fn requested_status(suggested: Option<&str>) -> Option<CaseStatus> {
    match suggested {
        Some("completed") | Some("provider-ack") => Some(CaseStatus::ProviderAck),
        _ => None,
    }
}

/// Apply a validated analysis to the case: maybe move status, always append
/// one Agent entry dated `now`.
pub fn apply_analysis(case: &mut Case, analysis: DocumentAnalysis, now: DateTime<Utc>) -> AnalysisOutcome {
    let previous_status = case.status;

    match requested_status(analysis.suggested_status.as_deref()) {
        Some(target) if case.status.can_transition_to(target) => {
            case.status = target;
        }
        Some(target) => {
            log::info!(
                "Case {}: ignoring analysis request {} -> {} (not a legal transition)",
                case.id,
                case.status,
                target
            );
        }
        None => {
            if let Some(ref s) = analysis.suggested_status {
                log::debug!("Case {}: ignoring analysis status suggestion '{}'", case.id, s);
            }
        }
    }

    let entry = LogEntry::new(now, Actor::Agent, analysis.log_entry);
    case.record(entry.clone());

    AnalysisOutcome {
        case_id: case.id.clone(),
        analysis: analysis.analysis,
        log_entry: entry,
        call_script: analysis.call_script,
        previous_status,
        status: case.status,
    }
}
