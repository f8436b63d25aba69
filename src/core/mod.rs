//! Job persistence and pipeline orchestration.

pub mod job_store;
pub mod orchestrator;

pub use job_store::{JobStore, StoreError};
pub use orchestrator::{Orchestrator, SubmitError};
