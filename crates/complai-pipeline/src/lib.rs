//! The asynchronous document analysis pipeline.
//!
//! Submission creates a `PENDING` job and schedules one detached task; the
//! task drives Extract → Embed → Retrieve → BuildPrompt → Invoke → Parse →
//! Persist, committing job state at fixed checkpoints so a polling client
//! always observes a consistent record and a failed job always carries its
//! error message.

pub mod explain;
pub mod orchestrator;
pub mod parse;
pub mod prompt;

pub use explain::{ExplainError, Explainer};
pub use orchestrator::{AnalysisPipeline, PipelineError, TOP_K_PRECEDENTS};
pub use parse::{ParseError, parse_report};
pub use prompt::{master_prompt, precedent_context};
