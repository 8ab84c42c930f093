use serde_json::Value;

use crate::error::PipelineError;
use crate::generator::context::PipelineContext;
use crate::generator::types::Stage;
use crate::llm::GenerationRequest;
use crate::prompts::DECISION_SYS_DEFAULT;
use crate::utils::json::extract_json_object;

const DECISION_TEMPLATE: &str = "Tech:\n{tech}\n\nMarket:\n{market}\n\nCompetitors:\n{comp}\nReturn JSON only.";

/// 基于三个阶段的结论给单个候选打分，不做检索
#[derive(Default)]
pub struct DecisionScorer;

impl DecisionScorer {
    /// 生成失败是致命错误；输出无法解析时返回 `Ok(None)`
    pub async fn score(
        &self,
        context: &PipelineContext,
        tech: &str,
        market: &str,
        comp: &str,
    ) -> Result<Option<Value>, PipelineError> {
        let system = context
            .prompts
            .system_instructions(Stage::Decision.prompt_name(), DECISION_SYS_DEFAULT);
        let request = GenerationRequest::new(Stage::Decision.prompt_name(), system)
            .user_message(DECISION_TEMPLATE)
            .variable("tech", tech)
            .variable("market", market)
            .variable("comp", comp);

        let text = context
            .generator
            .generate(&request)
            .await
            .map_err(|e| PipelineError::generation(Stage::Decision, e))?;

        Ok(extract_json_object(&text).ok())
    }
}
