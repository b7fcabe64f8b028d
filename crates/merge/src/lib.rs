//! `ledgerline-merge` — customer identity and activity reconciliation engine.
//!
//! Pure engine crate: receives pre-parsed tables, returns merged tables plus
//! accumulated warnings. No CLI or IO dependencies.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod identity;
pub mod model;
pub mod pipeline;
pub mod resolve;
pub mod schema;
pub mod summary;

pub use config::MergeConfig;
pub use error::MergeError;
pub use model::{MergeOutput, Table, Value};
pub use pipeline::{run, Pipeline, PipelineInput};
