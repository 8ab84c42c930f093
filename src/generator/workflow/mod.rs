//! 流水线图：固定拓扑 + decision 后的条件分支，受循环上限约束

use anyhow::Result;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{Config, PipelineConfig};
use crate::error::{BoundKind, PipelineError};
use crate::generator::context::PipelineContext;
use crate::generator::report::outlet::write_artifact;
use crate::generator::state::RunState;
use crate::generator::types::Stage;
use crate::generator::{aggregator, discovery, nodes, report};
use crate::llm::LLMClient;
use crate::types::Verdict;
use crate::utils::text::first_line;

/// 时间跟踪作用域，同一节点多次访问时累加
pub struct TimingScope {
    start_time: Instant,
    phase_durations: BTreeMap<String, Duration>,
}

impl Default for TimingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingScope {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            phase_durations: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, phase_name: &str, duration: Duration) {
        *self
            .phase_durations
            .entry(phase_name.to_string())
            .or_default() += duration;
    }

    pub fn get_total_duration(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn get_phase_durations(&self) -> &BTreeMap<String, Duration> {
        &self.phase_durations
    }

    /// 获取格式化的执行时间报告
    pub fn generate_timing_report(&self) -> String {
        let mut report = format!(
            "total: {:.2}s",
            self.get_total_duration().as_secs_f64()
        );
        for (phase, duration) in &self.phase_durations {
            report.push_str(&format!(", {}: {:.3}s", phase, duration.as_secs_f64()));
        }
        report
    }
}

/// 节点执行后的去向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Next(Stage),
    End,
}

/// 运行结束的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// 至少一个候选被推荐，已写出报告
    Reported,
    /// 没有值得决策的候选，未写报告
    Declined,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub state: RunState,
}

/// 每次节点访问结束时通知观察者
#[derive(Debug, Clone)]
pub struct NodeEvent {
    pub stage: Stage,
    /// 全局访问序号，从 1 开始
    pub visit: usize,
    pub summary: String,
    pub elapsed: Duration,
}

/// decision 之后的路由
pub fn route_after_decision(verdict: Option<Verdict>) -> Transition {
    match verdict {
        Some(Verdict::Recommend) => Transition::Next(Stage::Report),
        Some(Verdict::Hold) => Transition::Next(Stage::Discovery),
        Some(Verdict::Pass) | None => Transition::End,
    }
}

/// 固定拓扑中的无条件后继
pub fn successor(stage: Stage) -> Option<Stage> {
    match stage {
        Stage::Discovery => Some(Stage::Tech),
        Stage::Tech => Some(Stage::Market),
        Stage::Market => Some(Stage::Competitor),
        Stage::Competitor => Some(Stage::Decision),
        Stage::Decision | Stage::Report => None,
    }
}

/// 流式模式下每个节点的一行摘要
pub fn summarize_node(stage: Stage, state: &RunState) -> String {
    match stage {
        Stage::Discovery => format!("target={}", state.target.as_deref().unwrap_or_default()),
        Stage::Tech => format!(
            "tech={}",
            state.tech.as_deref().and_then(|t| first_line(t, 80)).unwrap_or_default()
        ),
        Stage::Market => format!(
            "market={}",
            state.market.as_deref().and_then(|t| first_line(t, 80)).unwrap_or_default()
        ),
        Stage::Competitor => format!(
            "competitors_rows={}",
            state
                .comp
                .as_deref()
                .map(|c| c.lines().filter(|l| l.contains('|')).count())
                .unwrap_or(0)
        ),
        Stage::Decision => format!(
            "verdict={} score={}",
            state.decision.map(|v| v.to_string()).unwrap_or_default(),
            state.score.unwrap_or(0)
        ),
        Stage::Report => format!(
            "report={}",
            state
                .artifacts
                .report_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        ),
    }
}

/// 流水线控制器，单次运行内独占 [`RunState`]
pub struct PipelineGraph {
    limits: PipelineConfig,
}

impl PipelineGraph {
    pub const ENTRY: Stage = Stage::Discovery;

    pub fn new(limits: PipelineConfig) -> Self {
        Self { limits }
    }

    /// 进入节点前检查两个上限
    fn enter(&self, stage: Stage, state: &mut RunState) -> Result<(), PipelineError> {
        state.node_visits += 1;
        if state.node_visits > self.limits.recursion_limit {
            return Err(PipelineError::LoopBoundExceeded {
                kind: BoundKind::NodeVisits,
                limit: self.limits.recursion_limit,
                node: stage,
            });
        }
        if stage == Stage::Discovery {
            state.loop_count += 1;
            if state.loop_count > self.limits.max_loop_iterations {
                return Err(PipelineError::LoopBoundExceeded {
                    kind: BoundKind::LoopIterations,
                    limit: self.limits.max_loop_iterations,
                    node: stage,
                });
            }
        }
        Ok(())
    }

    async fn visit(
        &self,
        stage: Stage,
        context: &PipelineContext,
        state: &mut RunState,
    ) -> Result<Transition, PipelineError> {
        match stage {
            Stage::Discovery => discovery::run(context, state).await?,
            Stage::Tech => nodes::tech_summary(context, state).await?,
            Stage::Market => nodes::market_eval(context, state).await?,
            Stage::Competitor => nodes::competitor_analysis(context, state).await?,
            Stage::Decision => {
                aggregator::run(context, state).await?;
                return Ok(route_after_decision(state.decision));
            }
            Stage::Report => {
                report::run(context, state).await?;
                return Ok(Transition::End);
            }
        }
        Ok(successor(stage).map_or(Transition::End, Transition::Next))
    }

    /// 从入口执行到终止状态
    pub async fn run(
        &self,
        context: &PipelineContext,
        mut state: RunState,
        observer: &mut (dyn FnMut(&NodeEvent) + Send),
    ) -> Result<RunOutcome, PipelineError> {
        let mut timing = TimingScope::new();
        let mut current = Self::ENTRY;

        loop {
            self.enter(current, &mut state)?;
            let started = Instant::now();
            let transition = self.visit(current, context, &mut state).await?;
            let elapsed = started.elapsed();
            timing.record(current.node_name(), elapsed);

            observer(&NodeEvent {
                stage: current,
                visit: state.node_visits,
                summary: summarize_node(current, &state),
                elapsed,
            });

            match transition {
                Transition::Next(next) => current = next,
                Transition::End => break,
            }
        }

        tracing::info!(timing = %timing.generate_timing_report(), "pipeline finished");
        context.persist_run(&state).await;

        let status = if current == Stage::Report {
            RunStatus::Reported
        } else {
            RunStatus::Declined
        };
        Ok(RunOutcome { status, state })
    }

    /// Mermaid 形式的拓扑图
    pub fn to_mermaid() -> String {
        let mut lines = vec!["graph TD".to_string()];
        lines.push(format!("    START([start]) --> {}", Self::ENTRY.node_name()));
        for stage in Stage::ALL {
            if let Some(next) = successor(stage) {
                lines.push(format!("    {} --> {}", stage.node_name(), next.node_name()));
            }
        }
        let decision = Stage::Decision.node_name();
        lines.push(format!("    {decision} -- recommend --> {}", Stage::Report.node_name()));
        lines.push(format!("    {decision} -- hold --> {}", Stage::Discovery.node_name()));
        lines.push(format!("    {decision} -- pass --> END([end])"));
        lines.push(format!("    {} --> END", Stage::Report.node_name()));
        lines.join("\n") + "\n"
    }
}

/// 启动投资筛选流水线
pub async fn launch(config: &Config) -> Result<RunOutcome> {
    let client = LLMClient::new(config.clone())?;

    // 启动时检查模型连接
    client.check_connection().await?;

    let context = PipelineContext::from_config(config.clone(), Arc::new(client));

    let graph_path = if config.visualize {
        let path = config.graph_path();
        write_artifact(&path, &PipelineGraph::to_mermaid()).await?;
        println!("🗺️ 流程图已写入: {}", path.display());
        Some(path)
    } else {
        None
    };

    let stream = config.stream;
    let mut observer = |event: &NodeEvent| {
        if stream {
            println!(
                "📍 [{}] {} :: {} ({:.1}s)",
                event.visit,
                event.stage,
                event.summary,
                event.elapsed.as_secs_f64()
            );
        }
    };

    let graph = PipelineGraph::new(config.pipeline.clone());
    let state = RunState::new(&config.domain, &config.query);
    let mut outcome = graph.run(&context, state, &mut observer).await?;
    outcome.state.artifacts.graph_path = graph_path;
    Ok(outcome)
}
