//! 报告中各部分的 Markdown 渲染，全部是确定性的

use serde_json::Value;

use crate::generator::state::RunState;
use crate::types::DecisionRecord;
use crate::utils::text::dedup_preserving_order;

fn string_items(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().map(value_text).collect())
        .unwrap_or_default()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn score_of(value: &Value) -> i64 {
    match value.get("score") {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// 结构化市场评估 → Markdown；数据不是对象时返回 `None`，调用方使用原文
pub fn render_market(data: Option<&Value>) -> Option<String> {
    let map = data?.as_object()?;
    let mut lines = vec!["### 1) Industry context".to_string()];
    lines.extend(string_items(map.get("context")).into_iter().map(|b| format!("- {b}")));

    lines.push("\n### 2) Target position".to_string());
    lines.extend(string_items(map.get("position")).into_iter().map(|b| format!("- {b}")));

    lines.push("\n### 3) Scores".to_string());
    let mut total = 0;
    if let Some(scores) = map.get("scores").and_then(Value::as_object) {
        for (key, entry) in scores {
            let score = score_of(entry);
            let reason = entry.get("reason").map(value_text).unwrap_or_default();
            total += score;
            lines.push(format!("- {key}: {score}, {reason}"));
        }
    }
    lines.push(format!("**Subtotal:** {total}"));
    Some(lines.join("\n"))
}

/// 结构化竞品分析 → Markdown；表头优先使用数据自带的 headers，其次使用调用方给出的列
pub fn render_competitors(data: Option<&Value>, fallback_headers: &[String]) -> Option<String> {
    let map = data?.as_object()?;
    let mut lines = Vec::new();

    if let Some(summary) = map.get("summary").filter(|v| !v.is_null()) {
        lines.push(value_text(summary));
    }

    let headers = match string_items(map.get("headers")) {
        h if !h.is_empty() => h,
        _ => fallback_headers.to_vec(),
    };
    let rows = map.get("rows").and_then(Value::as_array).cloned().unwrap_or_default();
    if !headers.is_empty() && !rows.is_empty() {
        lines.push("\n### Comparison".to_string());
        lines.push(format!("| {} |", headers.join(" | ")));
        lines.push(format!("|{}|", vec!["---"; headers.len()].join("|")));
        for row in &rows {
            let mut cells = vec![row.get("criterion").map(value_text).unwrap_or_default()];
            cells.extend(string_items(row.get("values")));
            lines.push(format!("| {} |", cells.join(" | ")));
        }
    }

    let diffs = string_items(map.get("diffs"));
    if !diffs.is_empty() {
        lines.push("\n### Differentiators".to_string());
        lines.extend(diffs.into_iter().map(|b| format!("- {b}")));
    }
    let risks = string_items(map.get("risks"));
    if !risks.is_empty() {
        lines.push("\n### Risks and open issues".to_string());
        lines.extend(risks.into_iter().map(|b| format!("- {b}")));
    }
    if let Some(verdict) = map.get("verdict").filter(|v| !v.is_null()) {
        lines.push(format!("\nVerdict: {}", value_text(verdict)));
    }

    Some(lines.join("\n"))
}

/// 候选评估表，没有记录时为空串
pub fn decision_table(records: &[DecisionRecord]) -> String {
    if records.is_empty() {
        return String::new();
    }
    let mut lines = vec![
        "| Company | Verdict | Score |".to_string(),
        "|---|---|---|".to_string(),
    ];
    lines.extend(
        records
            .iter()
            .map(|r| format!("| {} | {} | {} |", r.candidate_name, r.verdict, r.score)),
    );
    lines.join("\n")
}

/// 各候选决策列出的缺失证据（保序去重），作为下一步行动
pub fn next_actions(records: &[DecisionRecord]) -> String {
    let missing = dedup_preserving_order(
        records
            .iter()
            .flat_map(|r| r.missing.iter().map(|m| m.trim())),
    );
    if missing.is_empty() {
        return "- (none)".to_string();
    }
    missing
        .iter()
        .map(|m| format!("- {m}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `[n] source`，n 从 1 开始
pub fn enumerate_sources(sources: &[String]) -> String {
    sources
        .iter()
        .enumerate()
        .map(|(i, s)| format!("[{}] {}", i + 1, s))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 合成调用失败时使用的确定性报告
pub fn fallback_brief(state: &RunState, market_md: &str, comp_md: &str, sources: &[String]) -> String {
    let verdict = state.decision.unwrap_or_default();
    let candidates_tech = if state.candidates.is_empty() {
        "- (N/A)".to_string()
    } else {
        state
            .candidates
            .iter()
            .map(|c| format!("- {}: {}", c.name, c.tech))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let actions = next_actions(&state.decisions);

    let sources_md = if sources.is_empty() {
        "- local index".to_string()
    } else {
        sources.iter().map(|s| format!("- {s}")).collect::<Vec<_>>().join("\n")
    };

    format!(
        "# Investment Brief\n\n## Verdict\n{verdict} (Score {score})\n\n## Rationale\n{rationale}\n\n\
## Tech Summary\n{tech}\n\n## Market\n{market_md}\n\n## Competitors\n{comp_md}\n\n\
## Candidates (scout)\n{candidates_tech}\n\n## Candidates Evaluation\n{table}\n\n\
## Next Actions\n{actions}\n\n## Sources\n{sources_md}\n",
        score = state.score.unwrap_or(0),
        rationale = state.rationale.as_deref().unwrap_or_default(),
        tech = state.tech.as_deref().unwrap_or_default(),
        table = match decision_table(&state.decisions) {
            t if t.is_empty() => "- (N/A)".to_string(),
            t => t,
        },
    )
}

/// 运行概要文档（README.md）
pub fn project_summary(state: &RunState, sources: &[String]) -> String {
    let decision = state
        .decision
        .map(|v| v.to_string())
        .unwrap_or_default();
    let score = state.score.map(|s| s.to_string()).unwrap_or_default();
    let table = match decision_table(&state.decisions) {
        t if t.is_empty() => "- (N/A)".to_string(),
        t => t,
    };
    let top_sources = sources
        .iter()
        .take(12)
        .map(|s| format!("- {s}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "# Investment Scouting Run\n\n\
## Overview\n\
- Flow: Startup Search → Tech Summary → Market → Competitors → Decision → Report\n\
- Report: `investment_report.md`\n\n\
## Run Summary\n\
- Domain: {domain}\n\
- Query: {query}\n\
- Target: {target}\n\
- Candidates: {candidates}\n\
- Decision: {decision} (Score {score})\n\n\
### Candidates Evaluation\n{table}\n\n\
## Sources\n\
- {count} referenced\n{top_sources}\n",
        domain = state.domain,
        query = state.query,
        target = state.target.as_deref().unwrap_or_default(),
        candidates = state.candidate_names().join(", "),
        count = sources.len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Verdict;
    use serde_json::json;

    #[test]
    fn test_render_market_structure() {
        let data = json!({
            "context": ["growing parcel volume"],
            "position": ["mid-market focus"],
            "scores": {"market": {"score": 7, "reason": "large"}, "timing": {"score": "3", "reason": "early"}}
        });
        let md = render_market(Some(&data)).unwrap();
        assert!(md.contains("- growing parcel volume"));
        assert!(md.contains("- market: 7, large"));
        assert!(md.contains("- timing: 3, early"));
        assert!(md.ends_with("**Subtotal:** 10"));
    }

    #[test]
    fn test_render_market_non_object_is_none() {
        assert!(render_market(None).is_none());
        assert!(render_market(Some(&json!(["a"]))).is_none());
    }

    #[test]
    fn test_render_competitors_uses_fallback_headers() {
        let data = json!({
            "summary": "A leads",
            "rows": [{"criterion": "Price", "values": ["low", "high"]}],
            "risks": ["churn"],
            "verdict": "A"
        });
        let headers = vec!["Criterion".to_string(), "A".into(), "B".into()];
        let md = render_competitors(Some(&data), &headers).unwrap();
        assert!(md.starts_with("A leads"));
        assert!(md.contains("| Criterion | A | B |\n|---|---|---|\n| Price | low | high |"));
        assert!(md.contains("- churn"));
        assert!(md.contains("Verdict: A"));
        assert!(!md.contains("Differentiators"));
    }

    #[test]
    fn test_decision_table_rows() {
        let records = vec![DecisionRecord {
            candidate_name: "Acme".into(),
            score: 72,
            verdict: Verdict::Recommend,
            rationale: String::new(),
            missing: vec![],
        }];
        assert_eq!(
            decision_table(&records),
            "| Company | Verdict | Score |\n|---|---|---|\n| Acme | recommend | 72 |"
        );
        assert!(decision_table(&[]).is_empty());
    }

    #[test]
    fn test_next_actions_merge_missing_evidence() {
        let records = vec![
            DecisionRecord {
                candidate_name: "Acme".into(),
                score: 80,
                verdict: Verdict::Recommend,
                rationale: String::new(),
                missing: vec!["MRR proof".into(), " churn data ".into()],
            },
            DecisionRecord {
                candidate_name: "Beta".into(),
                score: 40,
                verdict: Verdict::Pass,
                rationale: String::new(),
                missing: vec!["churn data".into()],
            },
        ];
        assert_eq!(next_actions(&records), "- MRR proof\n- churn data");
        assert_eq!(next_actions(&[]), "- (none)");
    }

    #[test]
    fn test_fallback_brief_lists_missing_for_recommend() {
        let mut state = RunState::new("d", "q");
        state.decision = Some(Verdict::Recommend);
        state.score = Some(82);
        state.decisions = vec![DecisionRecord {
            candidate_name: "Acme".into(),
            score: 82,
            verdict: Verdict::Recommend,
            rationale: "strong pilots".into(),
            missing: vec!["unit economics".into()],
        }];
        let brief = fallback_brief(&state, "", "", &[]);
        assert!(brief.contains("recommend (Score 82)"));
        assert!(brief.contains("## Next Actions\n- unit economics"));
        assert!(brief.contains("- local index"));
    }
}
