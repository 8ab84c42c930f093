//! 提示词库：内置默认系统提示词，可被提示词目录中的文件覆盖

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const SCOUT_SYS_DEFAULT: &str = "You discover startups in the configured domain. \
Return a ranked list with name, one-liner, url.";

pub const TECH_SYS_DEFAULT: &str =
    "Summarize core tech, components, moat, risks ONLY from the given context.";

pub const MARKET_SYS_DEFAULT: &str = "Extract TAM/SAM/SOM estimates, segments, channels, \
regulation, unit economics from context.";

pub const COMP_SYS_DEFAULT: &str = "Compare competitors and produce a Markdown table \
(Company|Product|Moat|Price|KPI|Notes).";

pub const DECISION_SYS_DEFAULT: &str = r#"Score with (Team, Tech, Market, Moat, Traction) each 0~20. Output JSON:
{"score": int, "verdict": "recommend|hold|pass", "rationale": "...", "missing": ["..."]}"#;

pub const REPORT_SYS_DEFAULT: &str = "You are an analyst writing a venture investment brief. \
Use the CONTEXT and the per-section material (tech/market/comp) and produce Markdown that follows \
the given outline exactly. Cite evidence as [n], referring to the index in Sources.";

/// 从提示词目录读取覆盖内容
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    dir: PathBuf,
}

impl PromptLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `{name}.system.md` 优先，其次 `{name}.md`，都没有时使用默认值
    pub fn system_prompt(&self, name: &str, default_text: &str) -> String {
        [format!("{name}.system.md"), format!("{name}.md")]
            .iter()
            .find_map(|file| read_non_empty(&self.dir.join(file)))
            .unwrap_or_else(|| default_text.to_string())
    }

    /// `{name}.config.yaml|yml|md`，不存在时为 `None`
    pub fn config_text(&self, name: &str) -> Option<String> {
        ["config.yaml", "config.yml", "config.md"]
            .iter()
            .find_map(|ext| read_non_empty(&self.dir.join(format!("{name}.{ext}"))))
    }

    /// 系统指令列表：系统提示词 + 可选的配置覆盖
    pub fn system_instructions(&self, name: &str, default_text: &str) -> Vec<String> {
        let mut instructions = vec![self.system_prompt(name, default_text)];
        if let Some(cfg) = self.config_text(name) {
            instructions.push(format!("Config:\n{cfg}"));
        }
        instructions
    }
}

fn read_non_empty(path: &Path) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .filter(|t| !t.trim().is_empty())
}

/// 单遍替换 `{key}` 占位符；未知的占位符和其他花括号原样保留
pub fn render_template(template: &str, variables: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close)
                if after[..close]
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
                    && variables.contains_key(&after[..close]) =>
            {
                out.push_str(&variables[&after[..close]]);
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_replaces_known_placeholders_once() {
        let rendered = render_template(
            "Domain={domain}\nQuery={query}\n{\"keep\": 1}",
            &vars(&[("domain", "logistics"), ("query", "{domain}")]),
        );
        assert_eq!(rendered, "Domain=logistics\nQuery={domain}\n{\"keep\": 1}");
    }

    #[test]
    fn test_render_keeps_unknown_placeholders() {
        assert_eq!(render_template("{missing} {", &BTreeMap::new()), "{missing} {");
    }

    #[test]
    fn test_system_prompt_override_order() {
        let temp_dir = TempDir::new().unwrap();
        let library = PromptLibrary::new(temp_dir.path());
        assert_eq!(library.system_prompt("tech_summary", "default"), "default");

        std::fs::write(temp_dir.path().join("tech_summary.md"), "plain").unwrap();
        assert_eq!(library.system_prompt("tech_summary", "default"), "plain");

        std::fs::write(temp_dir.path().join("tech_summary.system.md"), "system").unwrap();
        assert_eq!(library.system_prompt("tech_summary", "default"), "system");
    }

    #[test]
    fn test_config_overlay_is_appended() {
        let temp_dir = TempDir::new().unwrap();
        let library = PromptLibrary::new(temp_dir.path());
        assert_eq!(library.system_instructions("decision", "d").len(), 1);

        std::fs::write(temp_dir.path().join("decision.config.yml"), "weights: even").unwrap();
        let instructions = library.system_instructions("decision", "d");
        assert_eq!(instructions, vec!["d".to_string(), "Config:\nweights: even".to_string()]);
    }
}
