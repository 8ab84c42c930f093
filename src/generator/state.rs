use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

use crate::generator::stage::StageResult;
use crate::types::{Candidate, DecisionRecord, EvidenceSnippet, Verdict};
use crate::utils::text::dedup_preserving_order;

/// 运行产出的文件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunArtifacts {
    pub report_path: Option<PathBuf>,
    pub summary_path: Option<PathBuf>,
    pub graph_path: Option<PathBuf>,
}

/// 贯穿整个流水线的运行状态
///
/// 由图控制器独占；各节点只追加或设置字段，不回滚。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub domain: String,
    pub query: String,

    pub candidates: Vec<Candidate>,
    /// 下一个要提升为 target 的候选下标
    pub cand_idx: usize,
    pub target: Option<String>,
    pub tech_raw: Option<String>,

    pub tech: Option<String>,
    pub market: Option<String>,
    pub comp: Option<String>,
    pub tech_struct: Option<Value>,
    pub market_struct: Option<Value>,
    pub comp_struct: Option<Value>,

    pub sources: Vec<String>,
    pub snippets: Vec<EvidenceSnippet>,

    pub decisions: Vec<DecisionRecord>,
    pub decision: Option<Verdict>,
    pub score: Option<u8>,
    pub rationale: Option<String>,

    /// 进入 discovery 的次数
    pub loop_count: usize,
    /// 全部节点访问次数
    pub node_visits: usize,

    pub artifacts: RunArtifacts,
}

impl RunState {
    pub fn new(domain: &str, query: &str) -> Self {
        Self {
            domain: domain.to_string(),
            query: query.to_string(),
            ..Default::default()
        }
    }

    /// 追加阶段结果中的来源和证据
    pub fn absorb_evidence(&mut self, result: &StageResult) {
        self.sources.extend(result.sources.iter().cloned());
        self.snippets.extend(result.snippets.iter().cloned());
    }

    /// 去重后的来源，报告使用
    pub fn unique_sources(&self) -> Vec<String> {
        dedup_preserving_order(&self.sources)
    }

    pub fn candidate_names(&self) -> Vec<String> {
        self.candidates.iter().map(|c| c.name.clone()).collect()
    }
}
