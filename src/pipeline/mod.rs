//! Pipeline stages for ingestion runs.
//!
//! - `allowlist`: load the permitted author set
//! - `checkpoint`: derive the resume cursor from the corpus
//! - `fetch`: walk the guild/channel/thread hierarchy
//! - `normalize`: raw message -> canonical record
//! - `merge`: dedup merge into the corpus
//! - `run`: orchestrate one full run

pub mod allowlist;
pub mod checkpoint;
pub mod fetch;
pub mod merge;
pub mod normalize;
pub mod run;

pub use allowlist::AllowList;
pub use fetch::{ContainerKind, ContainerReport, FetchOutcome, RetainBudget, fetch_all};
pub use merge::{MergeOutcome, merge};
pub use normalize::normalize;
pub use run::{ResetConfirm, RunOptions, RunOutcome, RunSummary, run_ingest};
