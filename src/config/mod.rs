use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "openai")]
    #[default]
    OpenAI,
    #[serde(rename = "moonshot")]
    Moonshot,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "mistral")]
    Mistral,
    #[serde(rename = "openrouter")]
    OpenRouter,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "ollama")]
    Ollama,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::Moonshot => write!(f, "moonshot"),
            LLMProvider::DeepSeek => write!(f, "deepseek"),
            LLMProvider::Mistral => write!(f, "mistral"),
            LLMProvider::OpenRouter => write!(f, "openrouter"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LLMProvider::OpenAI),
            "moonshot" => Ok(LLMProvider::Moonshot),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "mistral" => Ok(LLMProvider::Mistral),
            "openrouter" => Ok(LLMProvider::OpenRouter),
            "anthropic" => Ok(LLMProvider::Anthropic),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    /// 投资领域
    pub domain: String,

    /// 自由文本检索需求
    pub query: String,

    /// 输出路径
    pub output_path: PathBuf,

    /// 各阶段检索文档根目录，子目录为 scout/tech/market/competitors
    pub data_dir: PathBuf,

    /// 提示词覆盖目录
    pub prompts_dir: PathBuf,

    /// LLM模型配置
    pub llm: LLMConfig,

    /// 流水线配置
    pub pipeline: PipelineConfig,

    /// 持久化配置
    pub store: StoreConfig,

    /// 按节点输出进度
    pub stream: bool,

    /// 输出流程图
    pub visualize: bool,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址，为空时使用 provider 默认地址
    pub api_base_url: String,

    /// 高能效模型，用于常规阶段
    pub model_efficient: String,

    /// 高质量模型，用于长上下文阶段，以及作为efficient失效情况下的兜底
    pub model_powerful: String,

    /// 最大tokens
    pub max_tokens: u32,

    /// 温度，流水线假设输出确定
    pub temperature: f64,

    /// 重试次数
    pub retry_attempts: u32,

    /// 重试间隔（毫秒）
    pub retry_delay_ms: u64,

    /// 超时时间（秒）
    pub timeout_seconds: u64,
}

/// 流水线配置
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// 进入 discovery 的最大次数
    pub max_loop_iterations: usize,

    /// 全部节点访问次数上限
    pub recursion_limit: usize,

    /// 没有推荐但存在 hold 时回到 discovery，而不是直接 pass
    pub rediscover_on_hold: bool,

    /// 每次检索返回的文档数
    pub retrieval_top_k: usize,
}

/// 持久化配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    /// 是否启用持久化
    pub enabled: bool,

    /// 存储文件路径
    pub path: PathBuf,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// 某阶段的检索文档目录
    pub fn stage_data_dir(&self, index_key: &str) -> PathBuf {
        self.data_dir.join(index_key)
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_path.join("investment_report.md")
    }

    pub fn summary_path(&self) -> PathBuf {
        self.output_path.join("README.md")
    }

    pub fn graph_path(&self) -> PathBuf {
        self.output_path.join("graph.mmd")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            domain: String::from("물류/유통"),
            query: String::from("신선식품 라스트마일 냉장 물류 자동화"),
            output_path: PathBuf::from("./outputs"),
            data_dir: PathBuf::from("./data"),
            prompts_dir: PathBuf::from("./prompts"),
            llm: LLMConfig::default(),
            pipeline: PipelineConfig::default(),
            store: StoreConfig::default(),
            stream: false,
            visualize: false,
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: std::env::var("INVEST_LLM_API_KEY").unwrap_or_default(),
            api_base_url: String::new(),
            model_efficient: String::from("gpt-4o-mini"),
            model_powerful: String::from("gpt-4o"),
            max_tokens: 8192,
            temperature: 0.0,
            retry_attempts: 3,
            retry_delay_ms: 2000,
            timeout_seconds: 300,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_loop_iterations: 5,
            recursion_limit: 50,
            rediscover_on_hold: false,
            retrieval_top_k: 5,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from(".invest/store.json"),
        }
    }
}
