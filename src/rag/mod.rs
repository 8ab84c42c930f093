//! 检索服务边界：按查询返回有序文档

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::Config;
use crate::error::RetrievalError;
use crate::generator::types::Stage;

pub mod directory;

pub use directory::DirectoryRetriever;

/// 检索到的文档
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub text: String,
    pub source: Option<String>,
}

impl Document {
    pub fn new(text: impl Into<String>, source: Option<&str>) -> Self {
        Self {
            text: text.into(),
            source: source.map(str::to_string),
        }
    }
}

/// 检索服务。空结果不是错误。
#[async_trait]
pub trait Retriever: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str) -> Result<Vec<Document>, RetrievalError>;

    /// 主调用失败后的备用调用方式，默认再走一次主路径
    async fn search_fallback(&self, query: &str) -> Result<Vec<Document>, RetrievalError> {
        self.search(query).await
    }
}

/// 无索引时使用，总是返回空结果
#[derive(Debug, Default, Clone)]
pub struct NullRetriever;

#[async_trait]
impl Retriever for NullRetriever {
    fn name(&self) -> &str {
        "null"
    }

    async fn search(&self, _query: &str) -> Result<Vec<Document>, RetrievalError> {
        Ok(Vec::new())
    }
}

/// 按阶段注册的检索器，缺失的阶段得到 [`NullRetriever`]
#[derive(Clone, Default)]
pub struct RetrieverRegistry {
    retrievers: BTreeMap<&'static str, Arc<dyn Retriever>>,
}

impl RetrieverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从配置的数据目录构建，目录不存在或没有文档的阶段不注册
    pub fn from_config(config: &Config) -> Self {
        let mut registry = Self::new();
        for stage in Stage::RETRIEVAL_STAGES {
            let Some(key) = stage.index_key() else {
                continue;
            };
            let dir = config.stage_data_dir(key);
            match DirectoryRetriever::load(&dir, config.pipeline.retrieval_top_k) {
                Ok(Some(retriever)) => {
                    tracing::debug!(stage = %stage, dir = %dir.display(), chunks = retriever.len(), "index loaded");
                    registry.register(*stage, Arc::new(retriever));
                }
                Ok(None) => {
                    tracing::debug!(stage = %stage, dir = %dir.display(), "no documents, using null retriever");
                }
                Err(e) => {
                    tracing::warn!(stage = %stage, dir = %dir.display(), error = %e, "failed to load index, using null retriever");
                }
            }
        }
        registry
    }

    pub fn register(&mut self, stage: Stage, retriever: Arc<dyn Retriever>) {
        if let Some(key) = stage.index_key() {
            self.retrievers.insert(key, retriever);
        }
    }

    pub fn with(mut self, stage: Stage, retriever: Arc<dyn Retriever>) -> Self {
        self.register(stage, retriever);
        self
    }

    pub fn get(&self, stage: Stage) -> Arc<dyn Retriever> {
        stage
            .index_key()
            .and_then(|key| self.retrievers.get(key).cloned())
            .unwrap_or_else(|| Arc::new(NullRetriever))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_retriever_is_empty() {
        let docs = NullRetriever.search("anything").await.unwrap();
        assert!(docs.is_empty());
        let docs = NullRetriever.search_fallback("anything").await.unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn test_registry_falls_back_to_null() {
        let registry = RetrieverRegistry::new();
        let retriever = registry.get(Stage::Tech);
        assert_eq!(retriever.name(), "null");
        assert!(retriever.search("q").await.unwrap().is_empty());
    }

    #[test]
    fn test_registry_ignores_stages_without_index() {
        let registry = RetrieverRegistry::new().with(Stage::Decision, Arc::new(NullRetriever));
        assert!(registry.retrievers.is_empty());
    }
}
