//! Call/email script synthesis.
//!
//! Unlike ingestion and analysis, this never fails the caller: a completion
//! failure becomes a readable message in place of the script.

use std::time::Duration;

use crate::completion::{complete_within, CompletionError, CompletionProvider, CompletionRequest};
use crate::prompts::{build_script_prompt, SCRIPT_SYSTEM};
use crate::types::Case;

pub const SCRIPT_ERROR_TEXT: &str = "Error generating script.";
pub const SCRIPT_EMPTY_TEXT: &str = "Failed to generate script.";

/// Generate a chase script for `case`, optionally focused on one action.
pub async fn generate_script(
    provider: &dyn CompletionProvider,
    case: &Case,
    focus: Option<&str>,
    timeout: Duration,
) -> String {
    let request = CompletionRequest::text(SCRIPT_SYSTEM, build_script_prompt(case, focus));
    match complete_within(provider, request, timeout).await {
        Ok(text) if text.trim().is_empty() => SCRIPT_EMPTY_TEXT.to_string(),
        Ok(text) => text,
        Err(CompletionError::EmptyResponse) => SCRIPT_EMPTY_TEXT.to_string(),
        Err(e) => {
            log::warn!("Script generation failed for case {}: {}", case.id, e);
            SCRIPT_ERROR_TEXT.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::testing::StubProvider;
    use crate::types::{CaseStatus, Urgency};
    use chrono::{TimeZone, Utc};

    fn case() -> Case {
        let created = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        Case {
            id: "case-3".to_string(),
            client_name: "Sam Smith".to_string(),
            provider_name: "Royal London".to_string(),
            policy_number: "RL-9".to_string(),
            status: CaseStatus::LoaSentProvider,
            urgency: Urgency::Normal,
            date_created: created,
            last_update_date: created,
            next_action_date: None,
            client_context: None,
            history: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_script_returned_verbatim() {
        let text = "OPENER\nHello\n\nTHE CONTEXT\n...\n\nTHE NEXT STEP\nSend the form.";
        let provider = StubProvider::replying(text);
        let out = generate_script(&provider, &case(), Some("Chase form"), Duration::from_secs(5)).await;
        assert_eq!(out, text);
        assert!(!provider.requests()[0].expect_structured);
        assert_eq!(provider.requests()[0].system_instruction, SCRIPT_SYSTEM);
    }

    #[tokio::test]
    async fn test_failure_degrades_to_error_text() {
        let provider = StubProvider::failing();
        let out = generate_script(&provider, &case(), None, Duration::from_secs(5)).await;
        assert_eq!(out, SCRIPT_ERROR_TEXT);
    }

    #[tokio::test]
    async fn test_blank_output_degrades_to_failed_text() {
        let provider = StubProvider::replying("  \n ");
        let out = generate_script(&provider, &case(), None, Duration::from_secs(5)).await;
        assert_eq!(out, SCRIPT_EMPTY_TEXT);

        // A provider that reports no content at all reads the same way
        let provider = StubProvider::new(vec![Err(CompletionError::EmptyResponse)]);
        let out = generate_script(&provider, &case(), None, Duration::from_secs(5)).await;
        assert_eq!(out, SCRIPT_EMPTY_TEXT);
    }
}
