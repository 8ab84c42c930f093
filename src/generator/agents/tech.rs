use crate::generator::stage::{PromptTemplate, StageAgent, StageRequest};
use crate::generator::types::Stage;
use crate::prompts::TECH_SYS_DEFAULT;

/// 技术摘要
#[derive(Default)]
pub struct TechAgent;

impl TechAgent {
    /// 已知的原始技术描述以 `[DB]` 块放在检索文档之前
    pub fn request(name: &str, query: &str, tech_raw: Option<&str>) -> StageRequest {
        let request = StageRequest::new(format!("{name} {query}")).variable("name", name);
        match tech_raw.filter(|t| !t.trim().is_empty()) {
            Some(raw) => request.prefix(format!("[DB] {raw}")),
            None => request,
        }
    }
}

impl StageAgent for TechAgent {
    fn stage(&self) -> Stage {
        Stage::Tech
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            default_system_prompt: TECH_SYS_DEFAULT,
            human_template: "Company={name}\nContext:\n{ctx}\nFollow the instructions strictly and output JSON only.",
            context_limit: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_carries_db_prefix() {
        let request = TechAgent::request("Acme", "routing", Some("route optimizer"));
        assert_eq!(request.retrieval_query, "Acme routing");
        assert_eq!(request.context_prefix, vec!["[DB] route optimizer"]);
        assert_eq!(request.variables["name"], "Acme");
    }

    #[test]
    fn test_blank_tech_raw_is_not_prefixed() {
        assert!(TechAgent::request("Acme", "q", Some("  ")).context_prefix.is_empty());
        assert!(TechAgent::request("Acme", "q", None).context_prefix.is_empty());
    }
}
