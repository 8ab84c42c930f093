use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 候选公司，加入本次运行的候选集后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub tech: String,
    pub url: String,
}

/// 规范字段到源字段别名的映射，按顺序取第一个非空值
pub const CANDIDATE_FIELD_ALIASES: &[(&str, &[&str])] = &[
    ("name", &["name", "company", "회사명", "기업명", "스타트업"]),
    ("tech", &["tech", "기술", "핵심기술", "설명", "요약"]),
    ("url", &["url", "link", "웹사이트", "홈페이지"]),
];

/// 根对象为 map 时可能承载候选列表的键
pub const CANDIDATE_LIST_KEYS: &[&str] =
    &["items", "results", "companies", "startups", "후보", "목록"];

impl Candidate {
    /// 大小写无关的去重键
    pub fn key(&self) -> String {
        normalized_key(&self.name)
    }

    /// 将模型返回的任意条目规范化为候选公司
    ///
    /// 对象按 [`CANDIDATE_FIELD_ALIASES`] 解析；字符串或其他标量整体当作名称。
    /// 名称为空时返回 `None`。
    pub fn normalize(raw: &Value) -> Option<Candidate> {
        match raw {
            Value::Object(map) => {
                let lookup = |canonical: &str| -> String {
                    CANDIDATE_FIELD_ALIASES
                        .iter()
                        .find(|(field, _)| *field == canonical)
                        .and_then(|(_, aliases)| {
                            aliases.iter().find_map(|alias| {
                                map.get(*alias).and_then(value_as_text).filter(|v| !v.is_empty())
                            })
                        })
                        .unwrap_or_default()
                };
                let name = lookup("name");
                if name.is_empty() {
                    return None;
                }
                Some(Candidate {
                    name,
                    tech: lookup("tech"),
                    url: lookup("url"),
                })
            }
            Value::Null => None,
            other => {
                let name = value_as_text(other)?;
                if name.is_empty() {
                    return None;
                }
                Some(Candidate {
                    name,
                    tech: String::new(),
                    url: String::new(),
                })
            }
        }
    }

    /// `tech` 字段是否包含任一领域关键词（大小写无关的子串匹配）
    pub fn matches_keywords(&self, keywords: &[&str]) -> bool {
        let tech = self.tech.to_lowercase();
        keywords.iter().any(|k| tech.contains(&k.to_lowercase()))
    }
}

pub fn normalized_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// 从解析后的 JSON 中取出候选列表
pub fn extract_candidate_list(parsed: &Value) -> Vec<Value> {
    match parsed {
        Value::Array(items) => items.clone(),
        Value::Object(map) => CANDIDATE_LIST_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array).cloned())
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()),
        other => Some(other.to_string().trim().to_string()),
    }
}
