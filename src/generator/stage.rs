//! 单个阶段的通用执行流程：检索 → 拼接上下文 → 生成 → 尽力解析 JSON → 收集证据

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::PipelineError;
use crate::generator::context::PipelineContext;
use crate::generator::types::Stage;
use crate::llm::GenerationRequest;
use crate::rag::{Document, Retriever};
use crate::types::EvidenceSnippet;
use crate::utils::json::extract_json;
use crate::utils::text::{dedup_preserving_order, truncate_chars};

/// 每个阶段最多从前几篇文档收集来源与证据
pub const MAX_EVIDENCE_DOCS: usize = 6;

/// 阶段输出
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageResult {
    /// 生成的原始文本
    pub text: String,
    /// 从文本中解析出的 JSON，失败时为 `None`
    pub structured: Option<Value>,
    pub sources: Vec<String>,
    pub snippets: Vec<EvidenceSnippet>,
}

/// Prompt模板配置
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// 提示词目录没有覆盖时使用的系统提示词
    pub default_system_prompt: &'static str,
    /// 用户消息模板，`{ctx}` 由检索上下文填充
    pub human_template: &'static str,
    /// 每篇文档进入上下文前的截断长度
    pub context_limit: usize,
}

/// 一次阶段调用的输入
#[derive(Debug, Clone, Default)]
pub struct StageRequest {
    pub retrieval_query: String,
    pub variables: BTreeMap<String, String>,
    /// 放在检索文档之前的上下文块
    pub context_prefix: Vec<String>,
}

impl StageRequest {
    pub fn new(retrieval_query: impl Into<String>) -> Self {
        Self {
            retrieval_query: retrieval_query.into(),
            ..Default::default()
        }
    }

    pub fn variable(mut self, key: &str, value: impl Into<String>) -> Self {
        self.variables.insert(key.to_string(), value.into());
        self
    }

    pub fn prefix(mut self, block: impl Into<String>) -> Self {
        self.context_prefix.push(block.into());
        self
    }
}

/// 基于检索的分析阶段
#[async_trait]
pub trait StageAgent: Send + Sync {
    fn stage(&self) -> Stage;

    fn prompt_template(&self) -> PromptTemplate;

    async fn execute(
        &self,
        context: &PipelineContext,
        request: StageRequest,
    ) -> Result<StageResult, PipelineError> {
        run_stage(context, self.stage(), &self.prompt_template(), request).await
    }
}

pub async fn run_stage(
    context: &PipelineContext,
    stage: Stage,
    template: &PromptTemplate,
    request: StageRequest,
) -> Result<StageResult, PipelineError> {
    let retriever = context.retrievers.get(stage);
    let docs = retrieve_documents(retriever.as_ref(), &request.retrieval_query).await;
    tracing::debug!(
        stage = %stage,
        query = %request.retrieval_query,
        docs = docs.len(),
        "retrieval finished"
    );

    let ctx = build_context_block(&request.context_prefix, &docs, template.context_limit);
    let system = context
        .prompts
        .system_instructions(stage.prompt_name(), template.default_system_prompt);

    let mut generation = GenerationRequest::new(stage.prompt_name(), system)
        .user_message(template.human_template);
    generation.variables = request.variables;
    generation.variables.insert("ctx".to_string(), ctx);

    let text = context
        .generator
        .generate(&generation)
        .await
        .map_err(|e| PipelineError::generation(stage, e))?;

    let structured = match extract_json(&text) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(stage = %stage, "structured output unavailable: {}", e);
            None
        }
    };

    let (sources, snippets) = collect_evidence(&docs);
    Ok(StageResult {
        text,
        structured,
        sources,
        snippets,
    })
}

/// 主调用失败走备用调用，再失败降级为空结果
pub async fn retrieve_documents(retriever: &dyn Retriever, query: &str) -> Vec<Document> {
    match retriever.search(query).await {
        Ok(docs) => docs,
        Err(primary) => {
            tracing::warn!(retriever = retriever.name(), "primary retrieval failed: {}", primary);
            match retriever.search_fallback(query).await {
                Ok(docs) => docs,
                Err(fallback) => {
                    tracing::warn!(
                        retriever = retriever.name(),
                        "fallback retrieval failed, continuing without context: {}",
                        fallback
                    );
                    Vec::new()
                }
            }
        }
    }
}

pub fn build_context_block(prefix: &[String], docs: &[Document], limit: usize) -> String {
    prefix
        .iter()
        .cloned()
        .chain(docs.iter().map(|d| truncate_chars(&d.text, limit)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn collect_evidence(docs: &[Document]) -> (Vec<String>, Vec<EvidenceSnippet>) {
    let head = &docs[..docs.len().min(MAX_EVIDENCE_DOCS)];
    let sources = dedup_preserving_order(head.iter().filter_map(|d| d.source.as_deref()));
    let snippets = head
        .iter()
        .map(|d| EvidenceSnippet::new(d.source.as_deref(), &d.text))
        .collect();
    (sources, snippets)
}
