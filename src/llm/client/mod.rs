//! LLM客户端 - 基于 rig 的文本生成服务实现

use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;

use crate::config::Config;
use crate::error::GenerationError;
use crate::llm::{GenerationRequest, TextGenerator};

mod providers;
pub mod utils;

use providers::ProviderClient;
use utils::evaluate_befitting_model;

/// LLM客户端 - 提供统一的LLM服务接口
#[derive(Clone)]
pub struct LLMClient {
    config: Config,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: Config) -> Result<Self> {
        let client = ProviderClient::new(&config.llm)?;
        Ok(Self { client, config })
    }

    /// 检查模型连接和功能是否正常
    pub async fn check_connection(&self) -> Result<()> {
        println!("🔄 正在检查模型连接...");
        match self
            .prompt_once(
                &self.config.llm.model_efficient,
                "You are a helpful assistant.",
                "Hello",
            )
            .await
        {
            Ok(_) => {
                println!("✅ 模型连接正常");
                Ok(())
            }
            Err(e) => {
                eprintln!("❌ 模型连接失败: {}", e);
                Err(e)
            }
        }
    }

    /// 通用重试逻辑，用于处理异步操作的重试机制
    async fn retry_with_backoff<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, anyhow::Error>>,
    {
        let llm_config = &self.config.llm;
        let max_retries = llm_config.retry_attempts.max(1);
        let retry_delay_ms = llm_config.retry_delay_ms;
        let mut retries = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    retries += 1;
                    tracing::warn!(
                        attempt = retries,
                        max = max_retries,
                        error = %err,
                        "generation call failed"
                    );
                    if retries >= max_retries {
                        return Err(err);
                    }
                    tokio::time::sleep(std::time::Duration::from_millis(retry_delay_ms)).await;
                }
            }
        }
    }

    async fn prompt_once(&self, model: &str, preamble: &str, user_message: &str) -> Result<String> {
        let agent = self.client.create_agent(model, preamble);
        let timeout = std::time::Duration::from_secs(self.config.llm.timeout_seconds);
        tokio::time::timeout(timeout, agent.prompt(user_message))
            .await
            .map_err(|_| anyhow::anyhow!("model call timed out after {:?}", timeout))?
    }
}

#[async_trait]
impl TextGenerator for LLMClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let preamble = request.preamble();
        let user_message = request.rendered_user_message();
        let (befitting_model, fallover_model) =
            evaluate_befitting_model(&self.config.llm, &preamble, &user_message);

        tracing::debug!(label = %request.label, model = %befitting_model, "generating");

        let primary = self
            .retry_with_backoff(|| self.prompt_once(&befitting_model, &preamble, &user_message))
            .await;

        let text = match (primary, fallover_model) {
            (Ok(text), _) => text,
            (Err(e), Some(model)) => {
                tracing::warn!(label = %request.label, fallback = %model, error = %e, "switching to fallback model");
                self.retry_with_backoff(|| self.prompt_once(&model, &preamble, &user_message))
                    .await
                    .map_err(|e| GenerationError::Provider(e.to_string()))?
            }
            (Err(e), None) => return Err(GenerationError::Provider(e.to_string())),
        };

        if text.trim().is_empty() {
            return Err(GenerationError::Empty);
        }
        Ok(text)
    }
}
