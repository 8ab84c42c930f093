use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// 流水线节点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    Discovery,
    Tech,
    Market,
    Competitor,
    Decision,
    Report,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Discovery,
        Stage::Tech,
        Stage::Market,
        Stage::Competitor,
        Stage::Decision,
        Stage::Report,
    ];

    /// 需要检索的阶段
    pub const RETRIEVAL_STAGES: &'static [Stage] =
        &[Stage::Discovery, Stage::Tech, Stage::Market, Stage::Competitor];

    /// 图中的节点名
    pub fn node_name(&self) -> &'static str {
        match self {
            Stage::Discovery => "startup_search",
            Stage::Tech => "tech_summary",
            Stage::Market => "market_eval",
            Stage::Competitor => "competitor_analysis",
            Stage::Decision => "investment_decision",
            Stage::Report => "report_writer",
        }
    }

    /// 提示词文件名前缀
    pub fn prompt_name(&self) -> &'static str {
        match self {
            Stage::Discovery => "startup_search",
            Stage::Tech => "tech_summary",
            Stage::Market => "market_eval",
            Stage::Competitor => "competitor_analysis",
            Stage::Decision => "decision",
            Stage::Report => "report",
        }
    }

    /// 检索索引（数据目录）名，无检索的阶段为 `None`
    pub fn index_key(&self) -> Option<&'static str> {
        match self {
            Stage::Discovery => Some("scout"),
            Stage::Tech => Some("tech"),
            Stage::Market => Some("market"),
            Stage::Competitor => Some("competitors"),
            Stage::Decision | Stage::Report => None,
        }
    }

    /// 单目标阶段完成后追加到来源列表的标签
    pub fn source_label(&self) -> Option<&'static str> {
        match self {
            Stage::Tech => Some("tech"),
            Stage::Market => Some("market"),
            Stage::Competitor => Some("competitors"),
            _ => None,
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.node_name())
    }
}
