use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::config::Config;
use crate::generator::state::RunState;
use crate::llm::TextGenerator;
use crate::prompts::PromptLibrary;
use crate::rag::RetrieverRegistry;
use crate::store::{CandidateRecord, JsonFileStore, NullStore, RunStore};

/// 每次运行显式传递的服务上下文
#[derive(Clone)]
pub struct PipelineContext {
    /// 配置
    pub config: Config,
    /// 按阶段注册的检索器
    pub retrievers: RetrieverRegistry,
    /// 文本生成服务
    pub generator: Arc<dyn TextGenerator>,
    /// 持久化，可为空实现
    pub store: Arc<dyn RunStore>,
    /// 提示词库
    pub prompts: PromptLibrary,
}

impl PipelineContext {
    /// 按配置构建检索器与持久化
    pub fn from_config(config: Config, generator: Arc<dyn TextGenerator>) -> Self {
        let retrievers = RetrieverRegistry::from_config(&config);
        let store: Arc<dyn RunStore> = if config.store.enabled {
            Arc::new(JsonFileStore::new(config.store.path.clone()))
        } else {
            Arc::new(NullStore)
        };
        Self::with_services(config, retrievers, generator, store)
    }

    pub fn with_services(
        config: Config,
        retrievers: RetrieverRegistry,
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn RunStore>,
    ) -> Self {
        let prompts = PromptLibrary::new(config.prompts_dir.clone());
        Self {
            config,
            retrievers,
            generator,
            store,
            prompts,
        }
    }

    // 持久化失败只记日志，不影响主流程

    pub async fn persist_candidate(&self, domain: &str, query: &str, name: &str, tech_raw: Option<&str>) {
        if let Err(e) = self
            .store
            .upsert_candidate_record(domain, query, name, tech_raw)
            .await
        {
            tracing::warn!(candidate = name, error = %e, "failed to upsert candidate record");
        }
    }

    pub async fn persist_fields(&self, name: &str, fields: BTreeMap<String, Value>) {
        if let Err(e) = self.store.update_candidate_fields(name, fields).await {
            tracing::warn!(candidate = name, error = %e, "failed to update candidate fields");
        }
    }

    pub async fn persist_sources(&self, name: &str, sources: &[String]) {
        if let Err(e) = self.store.append_candidate_sources(name, sources).await {
            tracing::warn!(candidate = name, error = %e, "failed to link candidate sources");
        }
    }

    pub async fn persist_run(&self, state: &RunState) {
        if let Err(e) = self.store.log_run_summary(state).await {
            tracing::warn!(error = %e, "failed to log run summary");
        }
    }

    pub async fn load_candidate(&self, name: &str) -> Option<CandidateRecord> {
        match self.store.get_candidate_record(name).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(candidate = name, error = %e, "failed to read candidate record");
                None
            }
        }
    }
}
