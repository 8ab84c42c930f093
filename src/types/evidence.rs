use serde::{Deserialize, Serialize};

/// 证据片段最大字符数
pub const SNIPPET_CHAR_LIMIT: usize = 400;

/// 检索得到的证据片段，用于报告引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceSnippet {
    /// 来源标识，缺失时为空串
    pub source: String,
    pub text: String,
}

impl EvidenceSnippet {
    pub fn new(source: Option<&str>, text: &str) -> Self {
        Self {
            source: source.unwrap_or_default().to_string(),
            text: crate::utils::text::truncate_chars(text, SNIPPET_CHAR_LIMIT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_text_is_bounded() {
        let long = "가".repeat(1000);
        let snippet = EvidenceSnippet::new(None, &long);
        assert_eq!(snippet.text.chars().count(), SNIPPET_CHAR_LIMIT);
        assert_eq!(snippet.source, "");
    }
}
