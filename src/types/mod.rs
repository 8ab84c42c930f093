pub mod candidate;
pub mod decision;
pub mod evidence;

pub use candidate::Candidate;
pub use decision::{DecisionRecord, Verdict};
pub use evidence::EvidenceSnippet;
