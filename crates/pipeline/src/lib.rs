//! The Lantern explanation pipeline.
//!
//! A free-form question from a website manager is answered in four
//! stages:
//! 1. Parse the question into a typed intent (admin-URL pre-processing,
//!    a small model call, and a rule-based fallback)
//! 2. Collect a deterministic data snapshot with a step-by-step trace:
//!    the products filter chain, the generic block inspector, or the
//!    import-domain collector
//! 3. Retrieve code context from the semantic-search service, in
//!    parallel with the collection
//! 4. Generate friendly prose from intent + snapshot + context, buffered
//!    or streamed, with a deterministic fallback
//!
//! The orchestrator owns the flow, the error taxonomy, and the trace
//! cache.

pub mod atdw;
pub mod error;
pub mod filter_chain;
pub mod generate;
pub mod inspector;
pub mod intent;
pub mod orchestrator;
pub mod prompts;

pub use atdw::{collect_import, ImportOutcome};
pub use error::{PipelineError, PipelineResult};
pub use filter_chain::{component_config, run_filter_chain, ChainOutcome};
pub use inspector::inspect_block;
pub use intent::parse_intent;
pub use orchestrator::{
    DebugInfo, ExplainRequest, ExplainResponse, Orchestrator, StreamMetadata, Timing,
};
