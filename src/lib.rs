//! Case lifecycle engine for chasing provider paperwork on advisory transfers.
//!
//! A case moves `discovery → loa-drafting → loa-sent-client → processing-loa
//! → loa-sent-provider → provider-ack → completed`. Time is simulated with a
//! persisted virtual clock, an agent cycle nudges waiting cases, and two
//! completion-backed pipelines turn free text into cases and case updates.
//!
//! [`engine::CaseEngine`] is the entry point; everything else is the pieces
//! it composes.

pub mod agent;
pub mod analysis;
pub mod clock;
pub mod completion;
pub mod config;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod parse;
pub mod prompts;
pub mod sampling;
pub mod script;
pub mod seed;
pub mod store;
pub mod types;

pub use clock::VirtualClock;
pub use engine::{CaseEngine, Dashboard, DashboardRow};
pub use error::CaseError;
pub use store::{CaseStore, JsonFileStore, MemoryStore, StoreError};
pub use types::{Actor, Case, CaseStatus, ClientContext, DbSchema, LogEntry, Urgency};
