use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;

use super::{CandidateRecord, RunStore, RunSummary};
use crate::error::PersistenceError;
use crate::generator::state::RunState;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    candidates: BTreeMap<String, CandidateRecord>,
    #[serde(default)]
    runs: Vec<RunSummary>,
}

/// 单个 JSON 文件作为存储，读-改-写在进程内串行
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<StoreData, PersistenceError> {
        if !self.path.exists() {
            return Ok(StoreData::default());
        }
        let content = fs::read_to_string(&self.path).await?;
        if content.trim().is_empty() {
            return Ok(StoreData::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    async fn save(&self, data: &StoreData) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, content).await?;
        Ok(())
    }

    async fn modify<F>(&self, mutate: F) -> Result<(), PersistenceError>
    where
        F: FnOnce(&mut StoreData) + Send,
    {
        let _guard = self.lock.lock().await;
        let mut data = self.load().await?;
        mutate(&mut data);
        self.save(&data).await
    }
}

#[async_trait]
impl RunStore for JsonFileStore {
    async fn upsert_candidate_record(
        &self,
        domain: &str,
        query: &str,
        name: &str,
        tech_raw: Option<&str>,
    ) -> Result<(), PersistenceError> {
        self.modify(|data| {
            let now = Utc::now();
            let record = data
                .candidates
                .entry(name.to_string())
                .or_insert_with(|| CandidateRecord {
                    name: name.to_string(),
                    domain: domain.to_string(),
                    query: query.to_string(),
                    tech_raw: None,
                    fields: BTreeMap::new(),
                    sources: Vec::new(),
                    created_at: now,
                    updated_at: now,
                });
            record.domain = domain.to_string();
            record.query = query.to_string();
            if let Some(tech_raw) = tech_raw.filter(|t| !t.is_empty()) {
                record.tech_raw = Some(tech_raw.to_string());
            }
            record.updated_at = now;
        })
        .await
    }

    async fn update_candidate_fields(
        &self,
        name: &str,
        fields: BTreeMap<String, Value>,
    ) -> Result<(), PersistenceError> {
        if fields.is_empty() {
            return Ok(());
        }
        self.modify(|data| {
            if let Some(record) = data.candidates.get_mut(name) {
                record.fields.extend(fields);
                record.updated_at = Utc::now();
            }
        })
        .await
    }

    async fn get_candidate_record(
        &self,
        name: &str,
    ) -> Result<Option<CandidateRecord>, PersistenceError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.candidates.remove(name))
    }

    async fn append_candidate_sources(
        &self,
        name: &str,
        sources: &[String],
    ) -> Result<(), PersistenceError> {
        if sources.is_empty() {
            return Ok(());
        }
        self.modify(|data| {
            if let Some(record) = data.candidates.get_mut(name) {
                for source in sources {
                    if !record.sources.contains(source) {
                        record.sources.push(source.clone());
                    }
                }
            }
        })
        .await
    }

    async fn log_run_summary(&self, state: &RunState) -> Result<(), PersistenceError> {
        let summary = RunSummary::from_state(state);
        self.modify(|data| data.runs.push(summary)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store(temp_dir: &TempDir) -> JsonFileStore {
        JsonFileStore::new(temp_dir.path().join("nested").join("store.json"))
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_and_keeps_tech_raw() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        store.upsert_candidate_record("logistics", "q", "Acme", Some("AI routing")).await.unwrap();
        store.upsert_candidate_record("logistics", "q", "Acme", Some("AI routing")).await.unwrap();
        store.upsert_candidate_record("logistics", "q2", "Acme", None).await.unwrap();

        let record = store.get_candidate_record("Acme").await.unwrap().unwrap();
        assert_eq!(record.tech_raw.as_deref(), Some("AI routing"));
        assert_eq!(record.query, "q2");
    }

    #[tokio::test]
    async fn test_sources_are_linked_once() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        store.upsert_candidate_record("d", "q", "Acme", None).await.unwrap();

        let sources = vec!["a.md".to_string(), "b.md".to_string()];
        store.append_candidate_sources("Acme", &sources).await.unwrap();
        store.append_candidate_sources("Acme", &sources).await.unwrap();

        let record = store.get_candidate_record("Acme").await.unwrap().unwrap();
        assert_eq!(record.sources, sources);
    }

    #[tokio::test]
    async fn test_update_fields_requires_existing_record() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        let fields = BTreeMap::from([("tech_summary".to_string(), json!("summary"))]);
        store.update_candidate_fields("Ghost", fields.clone()).await.unwrap();
        assert!(store.get_candidate_record("Ghost").await.unwrap().is_none());

        store.upsert_candidate_record("d", "q", "Acme", None).await.unwrap();
        store.update_candidate_fields("Acme", fields).await.unwrap();
        let record = store.get_candidate_record("Acme").await.unwrap().unwrap();
        assert_eq!(record.fields["tech_summary"], json!("summary"));
    }

    #[tokio::test]
    async fn test_run_summary_is_appended() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        let state = RunState::new("logistics", "cold-chain");
        store.log_run_summary(&state).await.unwrap();
        store.log_run_summary(&state).await.unwrap();

        let data = store.load().await.unwrap();
        assert_eq!(data.runs.len(), 2);
        assert_eq!(data.runs[0].domain, "logistics");
    }
}
