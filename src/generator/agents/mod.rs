//! 各分析阶段的 Agent

pub mod competitor;
pub mod decision;
pub mod market;
pub mod scout;
pub mod tech;

pub use competitor::CompetitorAgent;
pub use decision::DecisionScorer;
pub use market::MarketAgent;
pub use scout::ScoutAgent;
pub use tech::TechAgent;
