//! 运行持久化。所有操作幂等，可在至少一次投递下安全重试。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::PersistenceError;
use crate::generator::state::RunState;
use crate::types::Verdict;

pub mod json_file;

pub use json_file::JsonFileStore;

/// 按候选名称存储的记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateRecord {
    pub name: String,
    pub domain: String,
    pub query: String,
    pub tech_raw: Option<String>,
    /// tech_summary / market_eval / competitor_analysis / decision / score / rationale
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    #[serde(default)]
    pub sources: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 一次运行的摘要
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub id: uuid::Uuid,
    pub ts: DateTime<Utc>,
    pub domain: String,
    pub query: String,
    pub target: Option<String>,
    pub verdict: Option<Verdict>,
    pub score: Option<u8>,
    pub rationale: Option<String>,
    pub report_path: Option<String>,
}

impl RunSummary {
    pub fn from_state(state: &RunState) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            ts: Utc::now(),
            domain: state.domain.clone(),
            query: state.query.clone(),
            target: state.target.clone(),
            verdict: state.decision,
            score: state.score,
            rationale: state.rationale.clone(),
            report_path: state
                .artifacts
                .report_path
                .as_ref()
                .map(|p| p.to_string_lossy().to_string()),
        }
    }
}

#[async_trait]
pub trait RunStore: Send + Sync {
    /// 按名称插入或更新；新的 tech_raw 为空时保留旧值
    async fn upsert_candidate_record(
        &self,
        domain: &str,
        query: &str,
        name: &str,
        tech_raw: Option<&str>,
    ) -> Result<(), PersistenceError>;

    /// 只更新已存在的记录
    async fn update_candidate_fields(
        &self,
        name: &str,
        fields: BTreeMap<String, Value>,
    ) -> Result<(), PersistenceError>;

    async fn get_candidate_record(
        &self,
        name: &str,
    ) -> Result<Option<CandidateRecord>, PersistenceError>;

    /// 已关联的来源不会重复插入
    async fn append_candidate_sources(
        &self,
        name: &str,
        sources: &[String],
    ) -> Result<(), PersistenceError>;

    async fn log_run_summary(&self, state: &RunState) -> Result<(), PersistenceError>;
}

/// 未配置持久化时使用
#[derive(Debug, Default, Clone)]
pub struct NullStore;

#[async_trait]
impl RunStore for NullStore {
    async fn upsert_candidate_record(
        &self,
        _domain: &str,
        _query: &str,
        _name: &str,
        _tech_raw: Option<&str>,
    ) -> Result<(), PersistenceError> {
        Ok(())
    }

    async fn update_candidate_fields(
        &self,
        _name: &str,
        _fields: BTreeMap<String, Value>,
    ) -> Result<(), PersistenceError> {
        Ok(())
    }

    async fn get_candidate_record(
        &self,
        _name: &str,
    ) -> Result<Option<CandidateRecord>, PersistenceError> {
        Ok(None)
    }

    async fn append_candidate_sources(
        &self,
        _name: &str,
        _sources: &[String],
    ) -> Result<(), PersistenceError> {
        Ok(())
    }

    async fn log_run_summary(&self, _state: &RunState) -> Result<(), PersistenceError> {
        Ok(())
    }
}
