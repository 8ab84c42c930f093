//! 针对当前 target 的单目标分析节点
//!
//! 结构化结果只在本次解析成功时覆盖，之前的结果不会被清空。

use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::PipelineError;
use crate::generator::agents::{CompetitorAgent, MarketAgent, TechAgent};
use crate::generator::context::PipelineContext;
use crate::generator::discovery::PLACEHOLDER_TARGET;
use crate::generator::stage::{StageAgent, StageResult};
use crate::generator::state::RunState;
use crate::generator::types::Stage;

fn current_target(state: &RunState) -> String {
    state
        .target
        .clone()
        .unwrap_or_else(|| PLACEHOLDER_TARGET.to_string())
}

/// 吸收证据、追加阶段标签并把结论写入持久化字段
async fn record_stage(
    context: &PipelineContext,
    state: &mut RunState,
    stage: Stage,
    field: &str,
    target: &str,
    result: &StageResult,
) {
    state.absorb_evidence(result);
    if let Some(label) = stage.source_label() {
        state.sources.push(label.to_string());
    }
    let mut fields = BTreeMap::new();
    fields.insert(field.to_string(), Value::String(result.text.clone()));
    context.persist_fields(target, fields).await;
}

pub async fn tech_summary(context: &PipelineContext, state: &mut RunState) -> Result<(), PipelineError> {
    let target = current_target(state);
    // 持久化中的原始描述优先
    if let Some(raw) = context
        .load_candidate(&target)
        .await
        .and_then(|record| record.tech_raw)
        .filter(|raw| !raw.trim().is_empty())
    {
        state.tech_raw = Some(raw);
    }

    let request = TechAgent::request(&target, &state.query, state.tech_raw.as_deref());
    let result = TechAgent.execute(context, request).await?;

    state.tech = Some(result.text.clone());
    if let Some(structured) = result.structured.clone() {
        state.tech_struct = Some(structured);
    }
    record_stage(context, state, Stage::Tech, "tech_summary", &target, &result).await;
    Ok(())
}

pub async fn market_eval(context: &PipelineContext, state: &mut RunState) -> Result<(), PipelineError> {
    let target = current_target(state);
    let request = MarketAgent::request(&state.domain, &target);
    let result = MarketAgent.execute(context, request).await?;

    state.market = Some(result.text.clone());
    if let Some(structured) = result.structured.clone() {
        state.market_struct = Some(structured);
    }
    record_stage(context, state, Stage::Market, "market_eval", &target, &result).await;
    Ok(())
}

pub async fn competitor_analysis(
    context: &PipelineContext,
    state: &mut RunState,
) -> Result<(), PipelineError> {
    let target = current_target(state);
    let names = if state.candidates.is_empty() {
        vec![target.clone()]
    } else {
        state.candidate_names()
    };
    let request = CompetitorAgent::request(&state.domain, &names);
    let result = CompetitorAgent.execute(context, request).await?;

    state.comp = Some(result.text.clone());
    if let Some(structured) = result.structured.clone() {
        state.comp_struct = Some(structured);
    }
    record_stage(context, state, Stage::Competitor, "competitor_analysis", &target, &result).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::GenerationError;
    use crate::llm::{GenerationRequest, TextGenerator};
    use crate::rag::RetrieverRegistry;
    use crate::store::NullStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// 各阶段只返回纯文本，不含 JSON
    struct PlainGenerator;

    #[async_trait]
    impl TextGenerator for PlainGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
            Ok(format!("{} prose without structure", request.label))
        }
    }

    fn plain_context(temp_dir: &TempDir) -> PipelineContext {
        let config = Config {
            prompts_dir: temp_dir.path().join("prompts"),
            ..Default::default()
        };
        PipelineContext::with_services(
            config,
            RetrieverRegistry::new(),
            Arc::new(PlainGenerator),
            Arc::new(NullStore),
        )
    }

    #[tokio::test]
    async fn test_unparsed_pass_keeps_earlier_structures() {
        let temp_dir = TempDir::new().unwrap();
        let context = plain_context(&temp_dir);
        let mut state = RunState::new("logistics", "routing");
        state.target = Some("Acme".into());
        state.tech_struct = Some(json!({"stack": ["rust"]}));
        state.market_struct = Some(json!({"context": ["growing"]}));
        state.comp_struct = Some(json!({"rows": []}));

        tech_summary(&context, &mut state).await.unwrap();
        market_eval(&context, &mut state).await.unwrap();
        competitor_analysis(&context, &mut state).await.unwrap();

        assert_eq!(state.tech.as_deref(), Some("tech_summary prose without structure"));
        assert_eq!(state.market.as_deref(), Some("market_eval prose without structure"));
        assert_eq!(state.tech_struct, Some(json!({"stack": ["rust"]})));
        assert_eq!(state.market_struct, Some(json!({"context": ["growing"]})));
        assert_eq!(state.comp_struct, Some(json!({"rows": []})));
        assert_eq!(state.sources, vec!["tech", "market", "competitors"]);
    }
}
