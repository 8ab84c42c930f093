//! 决策聚合：逐个评估候选，再合并为一次运行的总体结论

use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::PipelineError;
use crate::generator::agents::{CompetitorAgent, DecisionScorer, MarketAgent, TechAgent};
use crate::generator::context::PipelineContext;
use crate::generator::stage::StageAgent;
use crate::generator::state::RunState;
use crate::types::{Candidate, DecisionRecord, Verdict};
use crate::utils::text::truncate_chars;

/// 每次决策最多评估的候选数
pub const MAX_EVALUATED: usize = 3;
pub const RATIONALE_CHAR_LIMIT: usize = 800;

/// 一次运行的总体结论
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub verdict: Verdict,
    pub score: u8,
    pub rationale: String,
}

/// 合并候选结论
///
/// 任一候选 recommend 则整体 recommend，分数与理由只取 recommend 的候选；
/// 否则为 pass，理由逐条以 `"; "` 拼接（空理由同样占位）。`rediscover_on_hold` 打开且有候选 hold 时整体为 hold，触发重新发现。
pub fn aggregate(records: &[DecisionRecord], rediscover_on_hold: bool) -> Aggregate {
    let recommended: Vec<&DecisionRecord> = records
        .iter()
        .filter(|r| r.verdict == Verdict::Recommend)
        .collect();

    let (verdict, basis): (Verdict, Vec<&DecisionRecord>) = if !recommended.is_empty() {
        (Verdict::Recommend, recommended)
    } else if rediscover_on_hold && records.iter().any(|r| r.verdict == Verdict::Hold) {
        (Verdict::Hold, records.iter().collect())
    } else {
        (Verdict::Pass, records.iter().collect())
    };

    let score = basis.iter().map(|r| r.score).max().unwrap_or(0);
    let rationale = basis
        .iter()
        .map(|r| r.rationale.trim())
        .collect::<Vec<_>>()
        .join("; ");

    Aggregate {
        verdict,
        score,
        rationale: truncate_chars(&rationale, RATIONALE_CHAR_LIMIT),
    }
}

/// 待评估的候选：已发现的候选集，没有时退回当前 target
pub fn evaluation_candidates(state: &RunState) -> Vec<Candidate> {
    if !state.candidates.is_empty() {
        return state.candidates.clone();
    }
    state
        .target
        .iter()
        .map(|name| Candidate {
            name: name.clone(),
            tech: state.tech_raw.clone().unwrap_or_default(),
            url: String::new(),
        })
        .collect()
}

/// 依次评估候选（至多 [`MAX_EVALUATED`] 个），每个候选产生一条记录
pub async fn evaluate_candidates(
    context: &PipelineContext,
    state: &mut RunState,
    candidates: &[Candidate],
) -> Result<Vec<DecisionRecord>, PipelineError> {
    let names: Vec<String> = candidates.iter().map(|c| c.name.clone()).collect();
    let mut records = Vec::new();

    for candidate in candidates.iter().take(MAX_EVALUATED) {
        let name = candidate.name.as_str();
        let tech_raw = Some(candidate.tech.as_str()).filter(|t| !t.is_empty());

        let tech = TechAgent
            .execute(context, TechAgent::request(name, &state.query, tech_raw))
            .await?;
        state.absorb_evidence(&tech);

        let market = MarketAgent
            .execute(context, MarketAgent::request(&state.domain, name))
            .await?;
        state.absorb_evidence(&market);

        let comp = CompetitorAgent
            .execute(context, CompetitorAgent::request(&state.domain, &names))
            .await?;
        state.absorb_evidence(&comp);

        let record = match DecisionScorer
            .score(context, &tech.text, &market.text, &comp.text)
            .await?
        {
            Some(scored) => DecisionRecord::from_scored(name, &scored),
            None => {
                tracing::warn!(candidate = name, "decision output was not parsable JSON, recording as unscored");
                DecisionRecord::unscored(name)
            }
        };
        tracing::info!(
            candidate = name,
            verdict = %record.verdict,
            score = record.score,
            "candidate evaluated"
        );

        // 非 target 的候选此前没有记录，先建档再写结论
        context
            .persist_candidate(&state.domain, &state.query, name, tech_raw)
            .await;
        let mut fields = BTreeMap::new();
        fields.insert("decision".to_string(), Value::String(record.verdict.to_string()));
        fields.insert("score".to_string(), Value::from(record.score));
        fields.insert("rationale".to_string(), Value::String(record.rationale.clone()));
        context.persist_fields(name, fields).await;

        records.push(record);
    }

    Ok(records)
}

/// investment_decision 节点
pub async fn run(context: &PipelineContext, state: &mut RunState) -> Result<(), PipelineError> {
    let candidates = evaluation_candidates(state);
    let records = evaluate_candidates(context, state, &candidates).await?;
    let overall = aggregate(&records, context.config.pipeline.rediscover_on_hold);

    state.decisions = records;
    state.decision = Some(overall.verdict);
    state.score = Some(overall.score);
    state.rationale = Some(overall.rationale);
    Ok(())
}
