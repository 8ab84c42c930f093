//! 报告合成：把运行状态整理成报告输入，调用生成服务，失败时退回确定性模板

use std::collections::BTreeMap;

use crate::error::PipelineError;
use crate::generator::agents::competitor::header_columns;
use crate::generator::context::PipelineContext;
use crate::generator::state::RunState;
use crate::generator::types::Stage;
use crate::llm::GenerationRequest;
use crate::prompts::{REPORT_SYS_DEFAULT, render_template};

pub mod outlet;
pub mod render;

pub use outlet::DiskOutlet;

/// 报告中最多内联的证据片段数
pub const MAX_REPORT_SNIPPETS: usize = 12;

const COMPOSE_TEMPLATE: &str = "\n{context}\n\n[SECTIONS]\n- TECH: {tech}\n- MARKET: {market}\n- COMP: {comp}\n\n\
[NEXT_ACTIONS]\n{next_actions}\n\n[OUTLINE]\n{outline}\n\n[SOURCES]\n{sources_enumerated}\n";

pub const DEFAULT_OUTLINE: &str = "# Investment Brief
## Verdict
<recommend | hold | pass> (Score <0..100>)

## Rationale
<3-5 sentences: why now, why this company, cite as [n]>

## Tech Summary
{tech}

## Market
{market}

## Competitors
{comp}

## Unit Economics & GTM
- Unit cost / gross margin: <figures with source [n], otherwise 'unknown'>
- CAC / LTV / payback: <figures and conditions [n], otherwise 'unknown'>
- Channels / GTM: <direct, channel, partners, marketplaces [n]>

## Moat & Defensibility
- 2-3 pieces of evidence among data, network effects, process lock-in, scale [n]

## Team & Governance
- Key executives (2-4, recent track record) [n]
- Governance / security / compliance [n]

## Risks & Mitigations
- <risk: impact / likelihood / mitigation [n]>

## Investment Thesis
- One line: <why this company now>
- Triggers: <2-4 quantitative milestones before the next round>

## Candidates Evaluation
{candidates_eval}

## Decision
- Final verdict: <recommend | hold | pass> (Score <0..100>)
- Summary: <3-5 bullets [n]>

## Next Actions
{next_actions}
- <further concrete actions: data, pilots, references, audits>

## Sources
{sources_enumerated}
";

/// 交给合成调用的全部数据
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BriefInputs {
    /// 去重后的来源，报告中的 `[n]` 是其 1 起始下标
    pub sources: Vec<String>,
    pub sources_enumerated: String,
    pub context_block: String,
    pub tech: String,
    pub market_md: String,
    pub comp_md: String,
    pub candidates_eval: String,
    /// 决策中列出的缺失证据
    pub next_actions: String,
    /// 已代入各节内容的大纲
    pub outline: String,
}

/// 片段块：`<<<DOC id=n src="...">>>text<<</DOC>>`，id 为来源下标，来源未知时用片段序号
pub fn snippet_block(state: &RunState, sources: &[String]) -> String {
    state
        .snippets
        .iter()
        .take(MAX_REPORT_SNIPPETS)
        .enumerate()
        .map(|(idx, snippet)| {
            let id = sources
                .iter()
                .position(|s| *s == snippet.source)
                .map(|i| i + 1)
                .unwrap_or(idx + 1);
            format!(
                "<<<DOC id={} src=\"{}\">>>{}<<</DOC>>",
                id, snippet.source, snippet.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn context_block(state: &RunState, sources: &[String]) -> String {
    format!(
        "[CONTEXT]\nTARGET_COMPANY: {target}\nDOMAIN: {domain}\n\nRAG_SNIPPETS:\n{snippets}\n\n\
COMPETITOR_CANDIDATES: {candidates}\n\
ASSUMPTIONS: data from the last 12-24 months; missing values marked 'unknown'; numbers given with unit and source\n\
[/CONTEXT]",
        target = state.target.as_deref().unwrap_or_default(),
        domain = state.domain,
        snippets = snippet_block(state, sources),
        candidates = state.candidate_names().join(", "),
    )
}

/// 整理报告输入
pub fn assemble(state: &RunState, outline_template: &str) -> BriefInputs {
    let sources = state.unique_sources();
    let sources_enumerated = render::enumerate_sources(&sources);

    let market_md = render::render_market(state.market_struct.as_ref())
        .unwrap_or_else(|| state.market.clone().unwrap_or_default());

    let comp_headers = match state.comp_struct.as_ref().and_then(|v| v.get("headers")) {
        Some(_) => Vec::new(),
        None => header_columns(&state.candidate_names()),
    };
    let comp_md = render::render_competitors(state.comp_struct.as_ref(), &comp_headers)
        .unwrap_or_else(|| state.comp.clone().unwrap_or_default());

    let candidates_eval = render::decision_table(&state.decisions);
    let next_actions = render::next_actions(&state.decisions);
    let tech = state.tech.clone().unwrap_or_default();

    let sections = BTreeMap::from([
        ("tech".to_string(), tech.clone()),
        ("market".to_string(), market_md.clone()),
        ("comp".to_string(), comp_md.clone()),
        ("candidates_eval".to_string(), candidates_eval.clone()),
        ("next_actions".to_string(), next_actions.clone()),
        ("sources_enumerated".to_string(), sources_enumerated.clone()),
    ]);
    let outline = render_template(outline_template, &sections);

    BriefInputs {
        context_block: context_block(state, &sources),
        sources,
        sources_enumerated,
        tech,
        market_md,
        comp_md,
        candidates_eval,
        next_actions,
        outline,
    }
}

/// 合成报告正文；合成调用失败时记录警告并使用确定性模板
pub async fn compose(context: &PipelineContext, state: &RunState) -> String {
    let outline_template = context.prompts.system_prompt("report.outline", DEFAULT_OUTLINE);
    let inputs = assemble(state, &outline_template);

    let system = context
        .prompts
        .system_instructions(Stage::Report.prompt_name(), REPORT_SYS_DEFAULT);
    let request = GenerationRequest::new(Stage::Report.prompt_name(), system)
        .user_message(COMPOSE_TEMPLATE)
        .variable("context", inputs.context_block.clone())
        .variable("tech", inputs.tech.clone())
        .variable("market", inputs.market_md.clone())
        .variable("comp", inputs.comp_md.clone())
        .variable("next_actions", inputs.next_actions.clone())
        .variable("outline", inputs.outline.clone())
        .variable("sources_enumerated", inputs.sources_enumerated.clone());

    match context.generator.generate(&request).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("report composition failed, writing template brief instead: {}", e);
            render::fallback_brief(state, &inputs.market_md, &inputs.comp_md, &inputs.sources)
        }
    }
}

/// report_writer 节点：合成并写出报告与概要文档
pub async fn run(context: &PipelineContext, state: &mut RunState) -> Result<(), PipelineError> {
    let brief = compose(context, state).await;
    let summary = render::project_summary(state, &state.unique_sources());

    let outlet = DiskOutlet::new(&context.config);
    let (report_path, summary_path) = outlet.save(&brief, &summary).await?;
    state.artifacts.report_path = Some(report_path);
    state.artifacts.summary_path = Some(summary_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Candidate, DecisionRecord, EvidenceSnippet, Verdict};
    use serde_json::json;

    fn sample_state() -> RunState {
        let mut state = RunState::new("logistics", "routing");
        state.target = Some("Acme".into());
        state.candidates = vec![Candidate {
            name: "Acme".into(),
            tech: "AI routing".into(),
            url: String::new(),
        }];
        state.sources = vec!["a.md".into(), "tech".into(), "a.md".into(), "b.md".into()];
        state.snippets = vec![
            EvidenceSnippet::new(Some("b.md"), "beta"),
            EvidenceSnippet::new(None, "orphan"),
        ];
        state.tech = Some("tech text".into());
        state.market = Some("market text".into());
        state
    }

    #[test]
    fn test_snippet_ids_follow_source_index() {
        let state = sample_state();
        let block = snippet_block(&state, &state.unique_sources());
        assert_eq!(
            block,
            "<<<DOC id=3 src=\"b.md\">>>beta<<</DOC>>\n<<<DOC id=2 src=\"\">>>orphan<<</DOC>>"
        );
    }

    #[test]
    fn test_assemble_enumerates_deduped_sources() {
        let inputs = assemble(&sample_state(), DEFAULT_OUTLINE);
        assert_eq!(inputs.sources, vec!["a.md", "tech", "b.md"]);
        assert_eq!(inputs.sources_enumerated, "[1] a.md\n[2] tech\n[3] b.md");
        assert!(inputs.outline.contains("## Tech Summary\ntech text"));
        assert!(inputs.outline.contains("[3] b.md"));
        assert!(inputs.context_block.contains("COMPETITOR_CANDIDATES: Acme"));
    }

    #[test]
    fn test_assemble_prefers_structured_market() {
        let mut state = sample_state();
        state.market_struct = Some(json!({"context": ["c1"], "scores": {}}));
        let inputs = assemble(&state, "{market}");
        assert!(inputs.market_md.starts_with("### 1) Industry context\n- c1"));
        assert_eq!(inputs.outline, inputs.market_md);
    }

    #[test]
    fn test_assemble_carries_missing_evidence_into_outline() {
        let mut state = sample_state();
        state.decisions = vec![DecisionRecord {
            candidate_name: "Acme".into(),
            score: 88,
            verdict: Verdict::Recommend,
            rationale: "pilots converting".into(),
            missing: vec!["MRR proof".into()],
        }];
        let inputs = assemble(&state, DEFAULT_OUTLINE);
        assert_eq!(inputs.next_actions, "- MRR proof");
        assert!(inputs.outline.contains("## Next Actions\n- MRR proof"));
    }

    #[test]
    fn test_assemble_uses_raw_text_without_structure() {
        let inputs = assemble(&sample_state(), DEFAULT_OUTLINE);
        assert_eq!(inputs.market_md, "market text");
        assert_eq!(inputs.comp_md, "");
    }
}
