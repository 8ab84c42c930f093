//! Provider 客户端：把 `LLMConfig` 映射到 rig 的各家 provider

use anyhow::Result;
use rig::{
    agent::{Agent, AgentBuilder},
    client::CompletionClient,
    completion::{CompletionModel, Prompt},
    providers::{anthropic, deepseek, mistral, moonshot, ollama, openai, openrouter},
};

use crate::config::{LLMConfig, LLMProvider};

/// 对所有 provider 一致生效的调用参数
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    /// 为空时使用 provider 自带的默认地址
    pub base_url: Option<String>,
    pub max_tokens: u64,
    pub temperature: f64,
}

impl GenerationSettings {
    pub fn from_config(config: &LLMConfig) -> Self {
        let base_url = Some(config.api_base_url.trim())
            .filter(|url| !url.is_empty())
            .map(|url| url.trim_end_matches('/').to_string());
        Self {
            base_url,
            max_tokens: config.max_tokens.into(),
            temperature: config.temperature,
        }
    }

    /// 统一设置 preamble、max_tokens 与 temperature
    fn apply<M: CompletionModel>(&self, builder: AgentBuilder<M>, preamble: &str) -> Agent<M> {
        builder
            .preamble(preamble)
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .build()
    }
}

// 只有显式配置了地址时才覆盖 builder 的默认值
macro_rules! with_base_url {
    ($builder:expr, $base_url:expr) => {
        match $base_url {
            Some(url) => $builder.base_url(url),
            None => $builder,
        }
    };
}

#[derive(Clone)]
enum Backend {
    OpenAI(openai::Client),
    Moonshot(moonshot::Client),
    DeepSeek(deepseek::Client),
    Mistral(mistral::Client),
    OpenRouter(openrouter::Client),
    Anthropic(anthropic::Client),
    Ollama(ollama::Client),
}

/// 按配置构建好的 provider 客户端
#[derive(Clone)]
pub struct ProviderClient {
    provider: LLMProvider,
    settings: GenerationSettings,
    backend: Backend,
}

impl ProviderClient {
    pub fn new(config: &LLMConfig) -> Result<Self> {
        let settings = GenerationSettings::from_config(config);
        let base_url = settings.base_url.as_deref();
        let api_key = config.api_key.as_str();

        let backend = match config.provider {
            LLMProvider::OpenAI => {
                Backend::OpenAI(with_base_url!(openai::Client::builder(api_key), base_url).build())
            }
            LLMProvider::Moonshot => Backend::Moonshot(
                with_base_url!(moonshot::Client::builder(api_key), base_url).build(),
            ),
            LLMProvider::DeepSeek => Backend::DeepSeek(
                with_base_url!(deepseek::Client::builder(api_key), base_url).build(),
            ),
            LLMProvider::Mistral => Backend::Mistral(
                with_base_url!(mistral::Client::builder(api_key), base_url).build(),
            ),
            LLMProvider::OpenRouter => Backend::OpenRouter(
                with_base_url!(openrouter::Client::builder(api_key), base_url).build(),
            ),
            LLMProvider::Anthropic => Backend::Anthropic(
                with_base_url!(anthropic::ClientBuilder::new(api_key), base_url).build()?,
            ),
            // 本地 ollama 不需要 API KEY
            LLMProvider::Ollama => {
                Backend::Ollama(with_base_url!(ollama::Client::builder(), base_url).build())
            }
        };

        tracing::debug!(
            provider = %config.provider,
            base_url = settings.base_url.as_deref().unwrap_or("(provider default)"),
            max_tokens = settings.max_tokens,
            "llm provider configured"
        );

        Ok(Self {
            provider: config.provider.clone(),
            settings,
            backend,
        })
    }

    pub fn provider(&self) -> &LLMProvider {
        &self.provider
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// 创建不带工具的单轮 Agent
    pub fn create_agent(&self, model: &str, preamble: &str) -> ProviderAgent {
        let settings = &self.settings;
        match &self.backend {
            Backend::OpenAI(client) => ProviderAgent::OpenAI(settings.apply(
                client.completion_model(model).completions_api().into_agent_builder(),
                preamble,
            )),
            Backend::Moonshot(client) => {
                ProviderAgent::Moonshot(settings.apply(client.agent(model), preamble))
            }
            Backend::DeepSeek(client) => {
                ProviderAgent::DeepSeek(settings.apply(client.agent(model), preamble))
            }
            Backend::Mistral(client) => {
                ProviderAgent::Mistral(settings.apply(client.agent(model), preamble))
            }
            Backend::OpenRouter(client) => {
                ProviderAgent::OpenRouter(settings.apply(client.agent(model), preamble))
            }
            Backend::Anthropic(client) => {
                ProviderAgent::Anthropic(settings.apply(client.agent(model), preamble))
            }
            Backend::Ollama(client) => {
                ProviderAgent::Ollama(settings.apply(client.agent(model), preamble))
            }
        }
    }
}

pub enum ProviderAgent {
    OpenAI(Agent<openai::CompletionModel>),
    Moonshot(Agent<moonshot::CompletionModel>),
    DeepSeek(Agent<deepseek::CompletionModel>),
    Mistral(Agent<mistral::CompletionModel>),
    OpenRouter(Agent<openrouter::CompletionModel>),
    Anthropic(Agent<anthropic::completion::CompletionModel>),
    Ollama(Agent<ollama::CompletionModel<reqwest::Client>>),
}

impl ProviderAgent {
    pub async fn prompt(&self, prompt: &str) -> Result<String> {
        let text = match self {
            ProviderAgent::OpenAI(agent) => agent.prompt(prompt).await?,
            ProviderAgent::Moonshot(agent) => agent.prompt(prompt).await?,
            ProviderAgent::DeepSeek(agent) => agent.prompt(prompt).await?,
            ProviderAgent::Mistral(agent) => agent.prompt(prompt).await?,
            ProviderAgent::OpenRouter(agent) => agent.prompt(prompt).await?,
            ProviderAgent::Anthropic(agent) => agent.prompt(prompt).await?,
            ProviderAgent::Ollama(agent) => agent.prompt(prompt).await?,
        };
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_PROVIDERS: [LLMProvider; 7] = [
        LLMProvider::OpenAI,
        LLMProvider::Moonshot,
        LLMProvider::DeepSeek,
        LLMProvider::Mistral,
        LLMProvider::OpenRouter,
        LLMProvider::Anthropic,
        LLMProvider::Ollama,
    ];

    fn llm_config(provider: LLMProvider, base_url: &str) -> LLMConfig {
        LLMConfig {
            provider,
            api_key: "test-key".into(),
            api_base_url: base_url.into(),
            max_tokens: 1024,
            temperature: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_base_url_means_provider_default() {
        let settings = GenerationSettings::from_config(&llm_config(LLMProvider::Mistral, "  "));
        assert_eq!(settings.base_url, None);
        assert_eq!(settings.max_tokens, 1024);
    }

    #[test]
    fn test_base_url_is_trimmed() {
        let settings =
            GenerationSettings::from_config(&llm_config(LLMProvider::Ollama, " http://gpu-box:11434/ "));
        assert_eq!(settings.base_url.as_deref(), Some("http://gpu-box:11434"));
    }

    #[test]
    fn test_every_provider_builds_with_and_without_base_url() {
        for provider in ALL_PROVIDERS {
            for base_url in ["", "http://localhost:8080/v1"] {
                let config = llm_config(provider.clone(), base_url);
                let client = ProviderClient::new(&config).unwrap();
                assert_eq!(client.provider(), &provider);
                assert_eq!(client.settings(), &GenerationSettings::from_config(&config));
                assert_eq!(client.settings().max_tokens, 1024);
            }
        }
    }

    #[tokio::test]
    async fn test_agent_is_created_for_every_provider() {
        for provider in ALL_PROVIDERS {
            let client = ProviderClient::new(&llm_config(provider.clone(), "")).unwrap();
            let agent = client.create_agent("some-model", "You are terse.");
            let matches = matches!(
                (&provider, &agent),
                (LLMProvider::OpenAI, ProviderAgent::OpenAI(_))
                    | (LLMProvider::Moonshot, ProviderAgent::Moonshot(_))
                    | (LLMProvider::DeepSeek, ProviderAgent::DeepSeek(_))
                    | (LLMProvider::Mistral, ProviderAgent::Mistral(_))
                    | (LLMProvider::OpenRouter, ProviderAgent::OpenRouter(_))
                    | (LLMProvider::Anthropic, ProviderAgent::Anthropic(_))
                    | (LLMProvider::Ollama, ProviderAgent::Ollama(_))
            );
            assert!(matches, "unexpected agent for {provider}");
        }
    }
}
