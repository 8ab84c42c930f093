use crate::generator::stage::{PromptTemplate, StageAgent, StageRequest};
use crate::generator::types::Stage;
use crate::prompts::COMP_SYS_DEFAULT;

/// 对比表最多的候选列数
pub const MAX_COMPARED: usize = 3;

const PLACEHOLDER_COLUMNS: [&str; 3] = ["Candidate A", "Candidate B", "Candidate C"];

/// 候选之间的竞争对比
#[derive(Default)]
pub struct CompetitorAgent;

impl CompetitorAgent {
    /// 候选列表为空时检索词只用领域
    pub fn request(domain: &str, names: &[String]) -> StageRequest {
        let compared = &names[..names.len().min(MAX_COMPARED)];
        let retrieval_query = if compared.is_empty() {
            domain.to_string()
        } else {
            format!("{domain} competitors {}", compared.join(", "))
        };
        StageRequest::new(retrieval_query)
            .variable("domain", domain)
            .variable("candidates", compared.join(", "))
            .variable("header", markdown_header(names))
    }
}

/// 表头列：`Criterion` + 至多三个候选名，没有候选时用占位列
pub fn header_columns(names: &[String]) -> Vec<String> {
    let mut columns = vec!["Criterion".to_string()];
    if names.is_empty() {
        columns.extend(PLACEHOLDER_COLUMNS.iter().map(|c| c.to_string()));
    } else {
        columns.extend(names.iter().take(MAX_COMPARED).cloned());
    }
    columns
}

pub fn markdown_header(names: &[String]) -> String {
    format!("| {} |", header_columns(names).join(" | "))
}

impl StageAgent for CompetitorAgent {
    fn stage(&self) -> Stage {
        Stage::Competitor
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            default_system_prompt: COMP_SYS_DEFAULT,
            human_template: "\nDomain={domain}\nCandidates={candidates}\nHeader={header}\nContext:\n{ctx}\n\n\
Instruction: use the Header above verbatim as the table header and compare the candidates directly \
against each other. Mark uncertain values as 'unknown'.\n",
            context_limit: 1200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lists_candidates() {
        let names = vec!["A".to_string(), "B".to_string()];
        assert_eq!(markdown_header(&names), "| Criterion | A | B |");
    }

    #[test]
    fn test_header_placeholder_when_empty() {
        assert_eq!(
            markdown_header(&[]),
            "| Criterion | Candidate A | Candidate B | Candidate C |"
        );
    }

    #[test]
    fn test_request_caps_compared_names() {
        let names: Vec<String> = ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect();
        let request = CompetitorAgent::request("logistics", &names);
        assert_eq!(request.retrieval_query, "logistics competitors A, B, C");
        assert_eq!(request.variables["header"], "| Criterion | A | B | C |");
    }

    #[test]
    fn test_request_without_candidates_queries_domain() {
        assert_eq!(CompetitorAgent::request("logistics", &[]).retrieval_query, "logistics");
    }
}
