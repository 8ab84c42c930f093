use crate::generator::stage::{PromptTemplate, StageAgent, StageRequest};
use crate::generator::types::Stage;
use crate::prompts::MARKET_SYS_DEFAULT;

/// 市场评估
#[derive(Default)]
pub struct MarketAgent;

impl MarketAgent {
    pub fn request(domain: &str, name: &str) -> StageRequest {
        StageRequest::new(format!("{domain} {name} market size"))
            .variable("domain", domain)
            .variable("name", name)
    }
}

impl StageAgent for MarketAgent {
    fn stage(&self) -> Stage {
        Stage::Market
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            default_system_prompt: MARKET_SYS_DEFAULT,
            human_template: "Domain={domain}\nTargets={name}\nContext:\n{ctx}\nReturn concise bullets, include numbers if present.",
            context_limit: 1000,
        }
    }
}
