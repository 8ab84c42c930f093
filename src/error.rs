//! 错误分类 - 区分可降级的外部调用失败与必须终止运行的致命错误

use thiserror::Error;

use crate::generator::types::Stage;

/// 检索服务失败，调用方降级为空结果
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("retriever '{retriever}' failed: {message}")]
    Backend { retriever: String, message: String },
}

/// 文本生成服务失败，对所在阶段是致命的
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation service returned empty text")]
    Empty,
    #[error("generation provider error: {0}")]
    Provider(String),
}

/// 生成文本中找不到可解析的 JSON，不影响自由文本输出
#[derive(Debug, Error, PartialEq, Eq)]
#[error("no parsable JSON value in generated text")]
pub struct ParseFailure;

/// 持久化层失败，只记录日志
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// 循环上限的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKind {
    /// 进入 discovery 的次数
    LoopIterations,
    /// 全部节点访问次数
    NodeVisits,
}

impl std::fmt::Display for BoundKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundKind::LoopIterations => write!(f, "loop iteration"),
            BoundKind::NodeVisits => write!(f, "recursion"),
        }
    }
}

/// 流水线致命错误
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("stage '{stage}' failed to generate text: {source}")]
    Generation {
        stage: Stage,
        #[source]
        source: GenerationError,
    },
    #[error("{kind} limit of {limit} exceeded on entry to '{node}'")]
    LoopBoundExceeded {
        kind: BoundKind,
        limit: usize,
        node: Stage,
    },
    #[error("failed to write run artifact: {0}")]
    Output(#[from] std::io::Error),
}

impl PipelineError {
    pub fn generation(stage: Stage, source: GenerationError) -> Self {
        PipelineError::Generation { stage, source }
    }

    pub fn is_loop_bound(&self) -> bool {
        matches!(self, PipelineError::LoopBoundExceeded { .. })
    }
}
