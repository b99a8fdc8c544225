//! Caller-facing case operations.
//!
//! Every mutating operation follows the same discipline: load the whole
//! collection, do any slow completion work, mutate in memory, save the whole
//! collection. Nothing is written unless the operation fully succeeds.
//!
//! The engine assumes a single writer. Two overlapping operations against the
//! same store race; the store's revision check turns the loser's save into a
//! `StoreUnavailable` conflict instead of silently dropping the other write.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::agent;
use crate::analysis::{self, AnalysisOutcome};
use crate::clock::VirtualClock;
use crate::completion::CompletionProvider;
use crate::config::{AgentConfig, Config};
use crate::error::CaseError;
use crate::ingest;
use crate::sampling::{DecisionSource, SampledDecisions};
use crate::script;
use crate::seed;
use crate::store::{CaseStore, StoreError};
use crate::types::{Actor, Case, CaseStatus, DbSchema, LogEntry, Urgency};

const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(60);

/// One row of the case overview.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRow {
    pub id: String,
    pub client_name: String,
    pub provider_name: String,
    pub policy_number: String,
    pub status: CaseStatus,
    pub status_label: String,
    pub urgency: Urgency,
    /// Days since the last update, on the virtual clock.
    pub days_since_update: i64,
    pub pending_next_steps: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub virtual_date: DateTime<Utc>,
    pub cases: Vec<DashboardRow>,
}

pub struct CaseEngine<S: CaseStore> {
    store: S,
    provider: Arc<dyn CompletionProvider>,
    decisions: Mutex<Box<dyn DecisionSource>>,
    agent: AgentConfig,
    completion_timeout: Duration,
}

impl<S: CaseStore> CaseEngine<S> {
    /// Engine with entropy-seeded decisions and default agent rules.
    pub fn new(store: S, provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            store,
            provider,
            decisions: Mutex::new(Box::new(SampledDecisions::from_entropy())),
            agent: AgentConfig::default(),
            completion_timeout: DEFAULT_COMPLETION_TIMEOUT,
        }
    }

    pub fn from_config(store: S, provider: Arc<dyn CompletionProvider>, config: &Config) -> Self {
        Self::new(store, provider)
            .with_agent_config(config.agent.clone())
            .with_completion_timeout(config.completion.timeout())
    }

    /// Swap the agent cycle's decision source (e.g. a seeded or scripted one).
    pub fn with_decisions(self, decisions: impl DecisionSource + 'static) -> Self {
        Self {
            decisions: Mutex::new(Box::new(decisions)),
            ..self
        }
    }

    pub fn with_agent_config(mut self, agent: AgentConfig) -> Self {
        self.agent = agent;
        self
    }

    pub fn with_completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = timeout;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn load(&self) -> Result<DbSchema, CaseError> {
        Ok(self.store.load()?)
    }

    fn save(&self, db: &DbSchema) -> Result<u64, CaseError> {
        Ok(self.store.save(db)?)
    }

    // =========================================================================
    // Clock + agent
    // =========================================================================

    /// Move the virtual clock forward by `days` (> 0).
    pub fn advance_clock(&self, days: i64) -> Result<VirtualClock, CaseError> {
        let mut db = self.load()?;
        let previous = db.virtual_date;
        db.virtual_date.advance(days)?;
        self.save(&db)?;
        log::info!("Virtual clock advanced {} days: {} -> {}", days, previous, db.virtual_date);
        Ok(db.virtual_date)
    }

    /// Run one agent cycle over every case. Returns the number of cases actioned.
    pub fn run_agent_cycle(&self) -> Result<usize, CaseError> {
        let mut db = self.load()?;
        let actions = {
            let mut decisions = self.decisions.lock();
            agent::run_cycle(&mut db, &self.agent, decisions.as_mut())
        };
        self.save(&db)?;
        Ok(actions)
    }

    // =========================================================================
    // Pipelines
    // =========================================================================

    /// Create a case from a raw client file.
    pub async fn ingest_client_file(&self, raw_text: &str) -> Result<Case, CaseError> {
        let mut db = self.load()?;
        let now = db.virtual_date.now();

        let mut case =
            ingest::extract_case(self.provider.as_ref(), raw_text, now, self.completion_timeout)
                .await?;
        while db.find_case(&case.id).is_some() {
            case.id = Case::new_id();
        }

        db.cases.push(case.clone());
        self.save(&db)?;
        log::info!(
            "Ingested client file: case {} for {} ({})",
            case.id,
            case.client_name,
            case.provider_name
        );
        Ok(case)
    }

    /// Analyze a document received for a case and apply the result.
    pub async fn analyze_document(
        &self,
        case_id: &str,
        document: &str,
    ) -> Result<AnalysisOutcome, CaseError> {
        let mut db = self.load()?;
        let now = db.virtual_date.now();
        let case = db
            .find_case_mut(case_id)
            .ok_or_else(|| CaseError::NotFound(case_id.to_string()))?;

        let parsed = analysis::analyze_document(
            self.provider.as_ref(),
            case,
            document,
            self.completion_timeout,
        )
        .await?;
        let outcome = analysis::apply_analysis(case, parsed, now);

        self.save(&db)?;
        log::info!(
            "Analyzed document for case {}: {} -> {}",
            outcome.case_id,
            outcome.previous_status,
            outcome.status
        );
        Ok(outcome)
    }

    /// Generate a call/email script. Completion failures come back as text.
    pub async fn generate_script(
        &self,
        case_id: &str,
        focus: Option<&str>,
    ) -> Result<String, CaseError> {
        let case = self.case(case_id)?;
        let text =
            script::generate_script(self.provider.as_ref(), &case, focus, self.completion_timeout)
                .await;
        Ok(text)
    }

    // =========================================================================
    // Advisor actions
    // =========================================================================

    /// Mark a next step as done.
    ///
    /// Returns `Ok(false)` when the case has no client intelligence to record
    /// it against. Repeating a step is a successful no-op.
    pub fn mark_step_complete(&self, case_id: &str, step: &str) -> Result<bool, CaseError> {
        let step = step.trim();
        if step.is_empty() {
            return Err(CaseError::InvalidArgument("step is empty".to_string()));
        }

        let mut db = self.load()?;
        let now = db.virtual_date.now();
        let case = db
            .find_case_mut(case_id)
            .ok_or_else(|| CaseError::NotFound(case_id.to_string()))?;

        let Some(ctx) = case.client_context.as_mut() else {
            log::warn!("Case {} has no client context; step not recorded", case_id);
            return Ok(false);
        };
        if !ctx.complete_step(step) {
            return Ok(true);
        }

        case.record(LogEntry::new(
            now,
            Actor::Agent,
            format!("Completed action: \"{}\"", step),
        ));
        self.save(&db)?;
        Ok(true)
    }

    // =========================================================================
    // Simulation + reads
    // =========================================================================

    /// Replace the whole collection with the demo seed at `start`.
    pub fn reset_simulation(&self, start: VirtualClock) -> Result<DbSchema, CaseError> {
        let revision = match self.store.load() {
            Ok(current) => current.revision,
            Err(StoreError::NotInitialized(_)) => 0,
            Err(e) => return Err(e.into()),
        };

        let mut db = seed::seed_database(start);
        db.revision = revision;
        db.revision = self.save(&db)?;
        log::info!("Simulation reset at {} with {} cases", start, db.cases.len());
        Ok(db)
    }

    pub fn case(&self, case_id: &str) -> Result<Case, CaseError> {
        let db = self.load()?;
        db.find_case(case_id)
            .cloned()
            .ok_or_else(|| CaseError::NotFound(case_id.to_string()))
    }

    /// Overview of every case as of the virtual clock.
    pub fn dashboard(&self) -> Result<Dashboard, CaseError> {
        let db = self.load()?;
        let cases = db
            .cases
            .iter()
            .map(|c| DashboardRow {
                id: c.id.clone(),
                client_name: c.client_name.clone(),
                provider_name: c.provider_name.clone(),
                policy_number: c.policy_number.clone(),
                status: c.status,
                status_label: c.status.label(),
                urgency: c.urgency,
                days_since_update: c.days_since_update(&db.virtual_date),
                pending_next_steps: c
                    .pending_next_steps()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            })
            .collect();

        Ok(Dashboard {
            virtual_date: db.virtual_date.now(),
            cases,
        })
    }
}
