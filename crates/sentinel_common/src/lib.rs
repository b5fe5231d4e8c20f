//! Shared types for the Sentinel assistant: plan data model, knowledge
//! tables, canned responses, configuration, and error taxonomy.

pub mod config;
pub mod domains;
pub mod personality;
pub mod plan;

pub use config::{GuardConfig, LlmConfig, SentinelConfig};
pub use plan::{ActionKind, ActionStep, Decision, FileOp, FileOpKind, Intent, Plan};

/// Sentinel version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
