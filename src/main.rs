//! chasedesk CLI: drives the case engine against the JSON file store.
//!
//! Set `RUST_LOG=info` (or `debug`) for engine logs on stderr; results are
//! printed to stdout, as JSON where there is a record to show.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;

use chasedesk_lib::clock::VirtualClock;
use chasedesk_lib::completion::{
    CompletionError, CompletionProvider, CompletionRequest, OpenAiCompatibleProvider,
};
use chasedesk_lib::config::load_config;
use chasedesk_lib::engine::CaseEngine;
use chasedesk_lib::error::{CaseError, OperationError};
use chasedesk_lib::store::JsonFileStore;

#[derive(Parser)]
#[command(name = "chasedesk")]
#[command(about = "Track and chase provider paperwork for advisory cases")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Overview of every case, or one case in full
    Show {
        /// Case to show
        id: Option<String>,
    },
    /// Move the virtual clock forward
    Advance {
        /// Whole days to advance (must be positive)
        #[arg(allow_negative_numbers = true)]
        days: i64,
    },
    /// Run one agent cycle over every case
    Cycle,
    /// Create a case from a client file
    Ingest {
        /// Client file (plain text)
        file: PathBuf,
    },
    /// Analyze a document received for a case
    Analyze {
        case_id: String,
        /// Received document (plain text)
        file: PathBuf,
    },
    /// Draft a chase call/email script
    Script {
        case_id: String,
        /// Action to focus the script on
        focus: Vec<String>,
    },
    /// Mark a next step as done
    CompleteStep {
        case_id: String,
        /// Step text, exactly as listed in the case's next steps
        #[arg(required = true)]
        step: Vec<String>,
    },
    /// Replace all cases with demo data
    Reset {
        /// Start date (YYYY-MM-DD); defaults to today
        date: Option<NaiveDate>,
    },
}

/// Stand-in used when no API key is configured. Commands that never call
/// the completion service still work; the rest fail with a clear message.
struct UnconfiguredProvider {
    api_key_env: String,
}

#[async_trait]
impl CompletionProvider for UnconfiguredProvider {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, CompletionError> {
        Err(CompletionError::MissingApiKey(self.api_key_env.clone()))
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Surface engine errors with their recovery hint.
fn engine_error(e: CaseError) -> anyhow::Error {
    let payload = OperationError::from(&e);
    anyhow!("{}\nhint: {}", payload.message, payload.recovery_suggestion)
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config().context("Failed to load chasedesk config")?;
    let store = JsonFileStore::new(config.resolved_store_path()?);

    let provider: Arc<dyn CompletionProvider> =
        match OpenAiCompatibleProvider::from_config(&config.completion) {
            Ok(p) => Arc::new(p),
            Err(e) => {
                log::debug!("Completion provider unavailable: {}", e);
                Arc::new(UnconfiguredProvider {
                    api_key_env: config.completion.api_key_env.clone(),
                })
            }
        };
    let engine = CaseEngine::from_config(store, provider, &config);

    match cli.command {
        Command::Show { id: Some(id) } => print_json(&engine.case(&id).map_err(engine_error)?),
        Command::Show { id: None } => print_json(&engine.dashboard().map_err(engine_error)?),
        Command::Advance { days } => {
            let clock = engine.advance_clock(days).map_err(engine_error)?;
            println!("Virtual date is now {}", clock);
            Ok(())
        }
        Command::Cycle => {
            let actions = engine.run_agent_cycle().map_err(engine_error)?;
            println!("Agent cycle complete: {} case(s) actioned", actions);
            Ok(())
        }
        Command::Ingest { file } => {
            let text = read_input(&file)?;
            let case = engine.ingest_client_file(&text).await.map_err(engine_error)?;
            print_json(&case)
        }
        Command::Analyze { case_id, file } => {
            let text = read_input(&file)?;
            let outcome = engine
                .analyze_document(&case_id, &text)
                .await
                .map_err(engine_error)?;
            print_json(&outcome)
        }
        Command::Script { case_id, focus } => {
            let focus = (!focus.is_empty()).then(|| focus.join(" "));
            let text = engine
                .generate_script(&case_id, focus.as_deref())
                .await
                .map_err(engine_error)?;
            println!("{}", text);
            Ok(())
        }
        Command::CompleteStep { case_id, step } => {
            let step = step.join(" ");
            if engine.mark_step_complete(&case_id, &step).map_err(engine_error)? {
                println!("Marked \"{}\" complete", step);
            } else {
                println!("Case {} has no client intelligence; nothing recorded", case_id);
            }
            Ok(())
        }
        Command::Reset { date } => {
            let start = date.unwrap_or_else(|| Utc::now().date_naive());
            let db = engine
                .reset_simulation(VirtualClock::at_date(start))
                .map_err(engine_error)?;
            println!("Simulation reset: {} cases at {}", db.cases.len(), db.virtual_date);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
