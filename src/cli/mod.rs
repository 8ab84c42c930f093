use crate::config::{Config, LLMProvider};
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// Invest-Scout - 由Rust与AI驱动的初创公司投资筛选流水线
#[derive(Parser, Debug)]
#[command(name = "invest-scout")]
#[command(
    about = "Discovers candidate startups in a domain, analyses their tech, market and competitors with retrieval-augmented generation, scores an investment decision and writes an investment brief."
)]
#[command(version)]
pub struct Args {
    /// 领域，例如 "물류/유통"
    #[arg(short, long)]
    pub domain: Option<String>,

    /// 自由文本查询
    #[arg(short, long)]
    pub query: Option<String>,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 输出路径
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// 检索文档目录（按阶段分子目录）
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// 提示词覆盖目录
    #[arg(long)]
    pub prompts_dir: Option<PathBuf>,

    /// 逐节点输出进度
    #[arg(long)]
    pub stream: bool,

    /// 写出流程图（Mermaid）
    #[arg(long)]
    pub viz: bool,

    /// 打开 DEBUG 级别诊断日志
    #[arg(long)]
    pub trace: bool,

    /// 诊断日志使用 JSON 格式
    #[arg(long)]
    pub trace_json: bool,

    /// 进入候选发现的最大次数
    #[arg(long)]
    pub max_loop_iterations: Option<usize>,

    /// 没有推荐但有候选 hold 时重新发现候选
    #[arg(long)]
    pub rediscover_on_hold: bool,

    /// 不写运行持久化
    #[arg(long)]
    pub no_store: bool,

    /// 高能效模型，优先用于常规推理任务
    #[arg(long)]
    pub model_efficient: Option<String>,

    /// 高质量模型，作为efficient失效情况下的兜底
    #[arg(long)]
    pub model_powerful: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// LLM Provider (openai, moonshot, deepseek, mistral, openrouter, anthropic, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,
}

impl Args {
    /// 将CLI参数转换为配置
    pub fn into_config(self) -> Result<Config> {
        let mut config = if let Some(config_path) = &self.config {
            // 显式指定的配置文件必须可读
            Config::from_file(config_path)?
        } else {
            // 如果没有显式指定配置文件，尝试从默认位置加载
            let default_config_path = std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join("invest.toml");

            if default_config_path.exists() {
                Config::from_file(&default_config_path)?
            } else {
                Config::default()
            }
        };

        if let Some(domain) = self.domain {
            config.domain = domain;
        }
        if let Some(query) = self.query {
            config.query = query;
        }
        if let Some(output_path) = self.output_path {
            config.output_path = output_path;
        }
        if let Some(data_dir) = self.data_dir {
            config.data_dir = data_dir;
        }
        if let Some(prompts_dir) = self.prompts_dir {
            config.prompts_dir = prompts_dir;
        }

        // 覆盖LLM配置
        if let Some(provider_str) = self.llm_provider {
            if let Ok(provider) = provider_str.parse::<LLMProvider>() {
                config.llm.provider = provider;
            } else {
                eprintln!(
                    "⚠️ 警告: 未知的provider: {}，使用默认provider",
                    provider_str
                );
            }
        }
        if let Some(llm_api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url;
        }
        if let Some(llm_api_key) = self.llm_api_key {
            config.llm.api_key = llm_api_key;
        }
        if let Some(model_efficient) = self.model_efficient {
            config.llm.model_efficient = model_efficient;
        }
        if let Some(model_powerful) = self.model_powerful {
            config.llm.model_powerful = model_powerful;
        }

        // 流水线配置
        if let Some(max_loop_iterations) = self.max_loop_iterations {
            config.pipeline.max_loop_iterations = max_loop_iterations;
        }
        if self.rediscover_on_hold {
            config.pipeline.rediscover_on_hold = true;
        }
        if self.no_store {
            config.store.enabled = false;
        }

        config.stream |= self.stream;
        config.visualize |= self.viz;

        Ok(config)
    }
}

// Include tests
#[cfg(test)]
mod tests;
