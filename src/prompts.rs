//! Prompt construction for the ingestion, analysis, and script pipelines.
//!
//! Anything that came from a user or a document is fenced with
//! [`wrap_user_data`] so the model treats it as data, not instructions.

use crate::types::Case;

/// Maximum characters of raw document text sent to the model.
/// Client files and provider letters are rarely longer than a few pages.
const MAX_DOCUMENT_CHARS: usize = 20_000;

pub const INGEST_SYSTEM: &str = "You are a JSON extractor.";
pub const ANALYSIS_SYSTEM: &str = "You are a helpful JSON-speaking assistant.";
pub const SCRIPT_SYSTEM: &str = "You are a helpful financial assistant. Plain text only.";

/// Fence untrusted text inside `<user_data>` tags.
pub fn wrap_user_data(text: &str) -> String {
    format!("<user_data>\n{}\n</user_data>", text.trim())
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

/// Client-file extraction prompt.
pub fn build_ingest_prompt(raw_text: &str) -> String {
    let mut prompt = String::with_capacity(2048 + raw_text.len().min(MAX_DOCUMENT_CHARS));

    prompt.push_str("You are a Data Entry Agent for a Financial Advisor.\n");
    prompt.push_str("Extract deep insight from the client file text below.\n\n");

    prompt.push_str("TEXT:\n");
    prompt.push_str(&wrap_user_data(truncate_chars(raw_text, MAX_DOCUMENT_CHARS)));
    prompt.push_str("\n\n");

    prompt.push_str(
        "TASK:\n\
         Map the text to the JSON structure below.\n\
         - 'goals': every goal mentioned (e.g. \"Lexus upgrade\", \"Retire at 65\").\n\
         - 'risks': health issues and job security concerns.\n\
         - 'occupations': Name + Job Title + Income where available.\n\
         - 'protection': Life Cover / Critical Illness details.\n\
         - 'nextSteps': outstanding actions the advisor should take, most urgent first.\n\
         - 'status': 'discovery' while any item is still PENDING.\n\
         - 'urgency': 'high' if a shortfall or health issue is mentioned, otherwise 'normal'.\n\
         - Use null for anything the text does not state. Do not invent values.\n\n",
    );

    prompt.push_str(
        r#"OUTPUT JSON STRUCTURE:
{
  "clientName": "Name & Name",
  "providerName": "Largest pension provider mentioned",
  "policyNumber": "Client ID or policy number from the top of the document",
  "status": "discovery",
  "urgency": "normal" | "high" | "critical",
  "clientContext": {
    "netWorth": "Total Net Worth value",
    "incomeSummary": "Household income value",
    "goals": ["Goal 1", "Goal 2"],
    "risks": ["Risk 1", "Risk 2"],
    "occupations": ["Alan: Radio Presenter (£68k)", "Lynne: Receptionist"],
    "protection": ["Alan: £200k Life Cover", "Lynne: £150k Life Cover"],
    "nextReviewDate": "Date from the 'Next Review' row",
    "notes": "Brief summary of sensitive notes",
    "nextSteps": ["Action 1", "Action 2"]
  },
  "latestLog": "Summary of the most recent item in 'Recent Communication'"
}
"#,
    );

    prompt
}

/// Provider/client response analysis prompt.
pub fn build_analysis_prompt(case: &Case, document: &str) -> String {
    let mut prompt = String::with_capacity(2048 + document.len().min(MAX_DOCUMENT_CHARS));

    prompt.push_str("You are an expert UK Financial Advisor Assistant.\n\n");
    prompt.push_str("CONTEXT:\n");
    prompt.push_str(&wrap_user_data(&format!(
        "Client: {}\nProvider: {}\nPolicy: {}\nCurrent Status: {}",
        case.client_name, case.provider_name, case.policy_number, case.status
    )));
    prompt.push_str("\n\n");

    prompt.push_str(
        "TASK:\n\
         Analyze the following document received from the provider or client.\n\
         1. Determine what the document is (LOA, rejection, partial info).\n\
         2. Decide if it resolves the current bottleneck.\n\
         3. Write a very short log entry (max 10 words, actionable) for the case history.\n\
         4. If the document is incomplete or a rejection, write a call script for the advisor \
         to chase it. If it is valid, the call script is null.\n\n",
    );

    prompt.push_str("DOCUMENT CONTENT:\n");
    prompt.push_str(&wrap_user_data(truncate_chars(document, MAX_DOCUMENT_CHARS)));
    prompt.push_str("\n\n");

    prompt.push_str(
        r#"OUTPUT JSON FORMAT:
{
  "analysis": "Brief summary",
  "logEntry": "Actionable short log",
  "newStatus": "suggested status code, e.g. provider-ack or completed",
  "callScript": "Full script if needed, or null"
}
"#,
    );

    prompt
}

/// Call/email script prompt. With a focus action the script addresses that
/// action; otherwise it chases the LOA sent when the case was opened.
pub fn build_script_prompt(case: &Case, focus: Option<&str>) -> String {
    let (risks, goals) = match &case.client_context {
        Some(ctx) => (join_or_none(&ctx.risks), join_or_none(&ctx.goals)),
        None => ("None".to_string(), "None".to_string()),
    };

    let task = match focus.map(str::trim).filter(|f| !f.is_empty()) {
        Some(action) => format!(
            "Write a specific script/email to address this action: {}",
            wrap_user_data(action)
        ),
        None => format!(
            "Write a standard follow-up script chasing the LOA sent on {}.",
            case.date_created.format("%d/%m/%Y")
        ),
    };

    let mut prompt = String::with_capacity(1536);
    prompt.push_str("You are an expert UK Financial Advisor Assistant.\n\n");
    prompt.push_str("CONTEXT:\n");
    prompt.push_str(&wrap_user_data(&format!(
        "Client: {} (refer to them as \"my client\")\nProvider: {}\nRisks: {}\nGoals: {}",
        case.client_name, case.provider_name, risks, goals
    )));
    prompt.push_str("\n\n");

    prompt.push_str("TASK:\n");
    prompt.push_str(&task);
    prompt.push_str("\n\n");

    prompt.push_str(
        "TONE: Professional, Firm, Action-Oriented.\n\
         FORMAT: Plain text. No markdown. Use Uppercase Headers.\n\n\
         STRUCTURE:\n\
         OPENER\n\
         (Context of why we are contacting)\n\n\
         THE CONTEXT\n\
         (Why this action is necessary for the client's goals/risks)\n\n\
         THE NEXT STEP\n\
         (Clear instruction on what needs to happen)\n",
    );

    prompt
}
