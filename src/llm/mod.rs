//! 文本生成服务边界

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::error::GenerationError;
use crate::prompts::render_template;

pub mod client;

pub use client::LLMClient;

/// 一次生成请求：有序系统指令 + 用户模板 + 模板变量
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationRequest {
    /// 日志标签，同时标识发起调用的阶段
    pub label: String,
    pub system_instructions: Vec<String>,
    pub user_message: String,
    pub variables: BTreeMap<String, String>,
}

impl GenerationRequest {
    pub fn new(label: impl Into<String>, system_instructions: Vec<String>) -> Self {
        Self {
            label: label.into(),
            system_instructions,
            ..Default::default()
        }
    }

    pub fn user_message(mut self, template: impl Into<String>) -> Self {
        self.user_message = template.into();
        self
    }

    pub fn variable(mut self, key: &str, value: impl Into<String>) -> Self {
        self.variables.insert(key.to_string(), value.into());
        self
    }

    /// 系统指令合并为单个 preamble
    pub fn preamble(&self) -> String {
        self.system_instructions.join("\n\n")
    }

    /// 代入变量后的用户消息
    pub fn rendered_user_message(&self) -> String {
        render_template(&self.user_message, &self.variables)
    }
}

/// 文本生成服务，空响应视为失败
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}
