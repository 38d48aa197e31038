//! Core domain types and shared logic for Lantern.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Tenant identifiers and table qualification
//! - Parsed question intents
//! - Trace steps and the step vocabulary
//! - Component and import-record configurations
//! - Chat history sanitisation
//! - Process configuration

pub mod component;
pub mod config;
pub mod error;
pub mod history;
pub mod intent;
pub mod tenant;
pub mod trace;

pub use component::{AtdwImportConfig, ComponentConfig, RegionPostcodes, RelatedItem, SortOrder};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use history::{sanitize_history, ChatRole, ChatTurn};
pub use intent::{Domain, ParsedIntent, QuestionType};
pub use tenant::Tenant;
pub use trace::{StepKind, TraceStep};

use std::time::Duration;

/// How long a resolved tenant schema stays fresh in the KV store.
pub const SCHEMA_TTL: Duration = Duration::from_secs(60 * 60);

/// How long a computed trace stays fresh in the KV store.
pub const TRACE_TTL: Duration = Duration::from_secs(5 * 60);

/// Most recent chat turns retained after history sanitisation.
pub const MAX_HISTORY_TURNS: usize = 20;
