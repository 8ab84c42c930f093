pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod llm;
pub mod prompts;
pub mod rag;
pub mod store;
pub mod telemetry;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::PipelineError;
pub use generator::context::PipelineContext;
pub use generator::state::RunState;
pub use generator::workflow::{PipelineGraph, RunOutcome, RunStatus, launch};
