pub mod agents;
pub mod aggregator;
pub mod context;
pub mod discovery;
pub mod nodes;
pub mod report;
pub mod stage;
pub mod state;
pub mod types;
pub mod workflow;
