use crate::generator::stage::{PromptTemplate, StageAgent, StageRequest};
use crate::generator::types::Stage;
use crate::prompts::SCOUT_SYS_DEFAULT;

/// 在领域语料中发现候选初创公司
#[derive(Default)]
pub struct ScoutAgent;

impl ScoutAgent {
    pub fn request(domain: &str, query: &str) -> StageRequest {
        StageRequest::new(format!("{domain} {query}"))
            .variable("domain", domain)
            .variable("query", query)
    }
}

impl StageAgent for ScoutAgent {
    fn stage(&self) -> Stage {
        Stage::Discovery
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            default_system_prompt: SCOUT_SYS_DEFAULT,
            human_template: "Domain={domain}\nQuery={query}\nContext:\n{ctx}\nReturn top 5 as JSON list.",
            context_limit: 1000,
        }
    }
}
