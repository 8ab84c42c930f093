use async_trait::async_trait;
use std::path::Path;
use walkdir::WalkDir;

use super::{Document, Retriever};
use crate::error::RetrievalError;

const CHUNK_SIZE: usize = 800;
const CHUNK_OVERLAP: usize = 120;
const SUPPORTED_EXTENSIONS: &[&str] = &["md", "txt", "csv"];

/// 基于本地文档目录的关键词检索器
///
/// 文档按 800 字符切块（重叠 120），查询按词项命中数打分，
/// 同分按加载顺序排列，结果确定。
#[derive(Debug, Clone)]
pub struct DirectoryRetriever {
    name: String,
    chunks: Vec<Document>,
    top_k: usize,
}

impl DirectoryRetriever {
    /// 递归加载目录；目录不存在或没有可用文档时返回 `None`
    pub fn load(dir: &Path, top_k: usize) -> std::io::Result<Option<Self>> {
        if !dir.exists() {
            return Ok(None);
        }

        let mut chunks = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::other)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let supported = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
                .unwrap_or(false);
            if !supported {
                continue;
            }
            // 读不了的文件跳过
            let Ok(content) = std::fs::read_to_string(path) else {
                tracing::debug!(path = %path.display(), "skipping unreadable document");
                continue;
            };
            let source = path.to_string_lossy().to_string();
            chunks.extend(
                split_chunks(&content, CHUNK_SIZE, CHUNK_OVERLAP)
                    .into_iter()
                    .map(|text| Document::new(text, Some(&source))),
            );
        }

        if chunks.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self::from_documents(
            dir.to_string_lossy().to_string(),
            chunks,
            top_k,
        )))
    }

    pub fn from_documents(name: String, chunks: Vec<Document>, top_k: usize) -> Self {
        Self {
            name,
            chunks,
            top_k,
        }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[async_trait]
impl Retriever for DirectoryRetriever {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &str) -> Result<Vec<Document>, RetrievalError> {
        let terms = query_terms(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, usize)> = self
            .chunks
            .iter()
            .enumerate()
            .filter_map(|(idx, doc)| {
                let haystack = doc.text.to_lowercase();
                let hits = terms.iter().filter(|t| haystack.contains(t.as_str())).count();
                (hits > 0).then_some((idx, hits))
            })
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        Ok(scored
            .into_iter()
            .take(self.top_k)
            .map(|(idx, _)| self.chunks[idx].clone())
            .collect())
    }
}

fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = query
        .split(|c: char| c.is_whitespace() || matches!(c, '\'' | '"' | ',' | '/' | '(' | ')'))
        .map(|t| t.trim().to_lowercase())
        .filter(|t| t.chars().count() >= 2)
        .collect();
    terms.sort();
    terms.dedup();
    terms
}

fn split_chunks(content: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = content.chars().collect();
    if chars.iter().all(|c| c.is_whitespace()) {
        return Vec::new();
    }
    let step = size.saturating_sub(overlap).max(1);
    let mut out = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + size).min(chars.len());
        let chunk: String = chars[start..end].iter().collect();
        if !chunk.trim().is_empty() {
            out.push(chunk);
        }
        if end == chars.len() {
            break;
        }
        start += step;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_split_chunks_overlap() {
        let text = "a".repeat(1000);
        let chunks = split_chunks(&text, 800, 120);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 800);
        assert_eq!(chunks[1].len(), 1000 - 680);
    }

    #[test]
    fn test_load_missing_dir_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let loaded = DirectoryRetriever::load(&temp_dir.path().join("absent"), 5).unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_search_ranks_by_term_hits() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("a.md"), "Cold-chain logistics with AI routing").unwrap();
        std::fs::write(temp_dir.path().join("b.txt"), "Quarterly consulting services").unwrap();
        std::fs::write(temp_dir.path().join("c.pdf"), "ignored binary").unwrap();

        let retriever = DirectoryRetriever::load(temp_dir.path(), 5).unwrap().unwrap();
        assert_eq!(retriever.len(), 2);

        let docs = retriever.search("AI logistics routing").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert!(docs[0].source.as_deref().unwrap().ends_with("a.md"));

        assert!(retriever.search("").await.unwrap().is_empty());
    }
}
