//! 候选发现与循环控制：提升下一个候选，或者在候选耗尽时重新发现

use std::collections::HashSet;

use crate::error::PipelineError;
use crate::generator::agents::ScoutAgent;
use crate::generator::context::PipelineContext;
use crate::generator::stage::StageAgent;
use crate::generator::state::RunState;
use crate::types::candidate::extract_candidate_list;
use crate::types::{Candidate, EvidenceSnippet};
use crate::utils::text::dedup_preserving_order;

/// 一次发现最多保留的候选数
pub const MAX_CANDIDATES: usize = 3;
/// 发现尝试次数（首次 + 两次放宽）
pub const DISCOVERY_ATTEMPTS: usize = 3;
/// 新发现时写入持久化的来源数上限
pub const PERSISTED_SOURCE_LIMIT: usize = 10;
/// 没有发现任何候选时的 target
pub const PLACEHOLDER_TARGET: &str = "TOP-1-STARTUP";

/// 放宽检索时追加到查询后的关键词
pub const BROADEN_SUFFIX: &str =
    " AI 인공지능 머신러닝 ML LLM 물류 유통 logistics 'supply chain' SCM";

/// 候选至少要命中一个的领域关键词（小写比较）
pub const DOMAIN_KEYWORDS: &[&str] = &[
    "ai",
    "인공지능",
    "머신러닝",
    "ml",
    "llm",
    "물류",
    "유통",
    "logistics",
    "supply chain",
    "scm",
];

/// 一次发现的汇总
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOutcome {
    pub candidates: Vec<Candidate>,
    pub sources: Vec<String>,
    pub snippets: Vec<EvidenceSnippet>,
    /// 实际执行的检索次数
    pub attempts: usize,
}

/// 第 `attempt` 次尝试使用的查询
pub fn attempt_query(query: &str, attempt: usize) -> String {
    if attempt == 0 {
        query.to_string()
    } else {
        format!("{query}{BROADEN_SUFFIX}")
    }
}

/// 多次尝试收集候选，凑满 [`MAX_CANDIDATES`] 后立即停止
pub async fn discover_candidates(
    context: &PipelineContext,
    domain: &str,
    query: &str,
) -> Result<DiscoveryOutcome, PipelineError> {
    let agent = ScoutAgent;
    let mut outcome = DiscoveryOutcome::default();
    let mut seen = HashSet::new();

    for attempt in 0..DISCOVERY_ATTEMPTS {
        let attempt_query = attempt_query(query, attempt);
        let result = agent
            .execute(context, ScoutAgent::request(domain, &attempt_query))
            .await?;
        outcome.attempts += 1;

        let items = result
            .structured
            .as_ref()
            .map(extract_candidate_list)
            .unwrap_or_default();

        let before = outcome.candidates.len();
        for item in &items {
            if outcome.candidates.len() >= MAX_CANDIDATES {
                break;
            }
            let Some(candidate) = Candidate::normalize(item) else {
                continue;
            };
            if !candidate.matches_keywords(DOMAIN_KEYWORDS) {
                tracing::debug!(candidate = %candidate.name, "dropped: no domain keyword");
                continue;
            }
            if seen.insert(candidate.key()) {
                outcome.candidates.push(candidate);
            }
        }
        tracing::debug!(
            attempt,
            parsed = items.len(),
            accepted = outcome.candidates.len() - before,
            "discovery attempt finished"
        );

        outcome.sources.extend(result.sources);
        outcome.snippets.extend(result.snippets);

        if outcome.candidates.len() >= MAX_CANDIDATES {
            break;
        }
    }

    outcome.sources = dedup_preserving_order(&outcome.sources);
    Ok(outcome)
}

/// discovery 节点
pub async fn run(context: &PipelineContext, state: &mut RunState) -> Result<(), PipelineError> {
    let promoted = state.cand_idx < state.candidates.len();

    if promoted {
        let next = state.candidates[state.cand_idx].clone();
        state.cand_idx += 1;
        tracing::info!(target_name = %next.name, cursor = state.cand_idx, "promoting next candidate");
        state.target = Some(next.name);
        if !next.tech.is_empty() {
            state.tech_raw = Some(next.tech);
        }
    } else {
        let outcome = discover_candidates(context, &state.domain, &state.query).await?;
        tracing::info!(
            found = outcome.candidates.len(),
            attempts = outcome.attempts,
            "candidate discovery finished"
        );

        state.candidates = outcome.candidates;
        match state.candidates.first() {
            Some(first) => {
                state.cand_idx = 1;
                state.target = Some(first.name.clone());
                if !first.tech.is_empty() {
                    state.tech_raw = Some(first.tech.clone());
                }
            }
            None => {
                state.cand_idx = 0;
                if state.target.is_none() {
                    state.target = Some(PLACEHOLDER_TARGET.to_string());
                }
            }
        }
        state.sources.extend(outcome.sources);
        state.snippets.extend(outcome.snippets);
    }

    if let Some(target) = state.target.clone() {
        context
            .persist_candidate(&state.domain, &state.query, &target, state.tech_raw.as_deref())
            .await;
        if !promoted {
            let linked: Vec<String> = state
                .unique_sources()
                .into_iter()
                .take(PERSISTED_SOURCE_LIMIT)
                .collect();
            if !linked.is_empty() {
                context.persist_sources(&target, &linked).await;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_attempt_uses_raw_query() {
        assert_eq!(attempt_query("cold chain", 0), "cold chain");
    }

    #[test]
    fn test_later_attempts_broaden_query() {
        let q = attempt_query("cold chain", 2);
        assert!(q.starts_with("cold chain AI"));
        assert!(q.ends_with("SCM"));
    }
}
