//! Batch retrieval across the program catalog.

pub mod dataset;
pub mod orchestrator;

pub use dataset::ConsolidatedDataset;
pub use orchestrator::{BatchOrchestrator, BatchSummary, ProgramError, RetryPolicy};
