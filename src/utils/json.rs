//! 宽松的 JSON 提取：模型输出经常夹带说明文字或代码块标记

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::error::ParseFailure;

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^```json|^```|```$").expect("valid fence pattern"));

/// 先整体解析；失败时截取第一个 `{`/`[` 到最后一个对应 `}`/`]` 之间的内容再解析
pub fn extract_json(text: &str) -> Result<Value, ParseFailure> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    let start = trimmed.find(['{', '[']).ok_or(ParseFailure)?;
    let closer = if trimmed[start..].starts_with('{') { '}' } else { ']' };
    let end = trimmed.rfind(closer).ok_or(ParseFailure)?;
    if end <= start {
        return Err(ParseFailure);
    }
    serde_json::from_str(&trimmed[start..=end]).map_err(|_| ParseFailure)
}

/// 去掉代码块标记后截取 `{ ... }`，只接受 JSON 对象
pub fn extract_json_object(text: &str) -> Result<Value, ParseFailure> {
    let stripped = CODE_FENCE.replace_all(text.trim(), "");
    let stripped = stripped.trim();
    let sliced = match (stripped.find('{'), stripped.rfind('}')) {
        (Some(start), Some(end)) if end > start => &stripped[start..=end],
        _ => stripped,
    };
    match serde_json::from_str::<Value>(sliced) {
        Ok(value @ Value::Object(_)) => Ok(value),
        _ => Err(ParseFailure),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_whole_string_parses_first() {
        assert_eq!(extract_json(r#" [1, 2] "#).unwrap(), json!([1, 2]));
        assert_eq!(extract_json(r#"{"a": 1}"#).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_slices_embedded_object() {
        let text = "Here is the result:\n{\"tam\": \"3B\"}\nHope it helps.";
        assert_eq!(extract_json(text).unwrap(), json!({"tam": "3B"}));
    }

    #[test]
    fn test_slices_embedded_list() {
        let text = "Top picks: [{\"name\": \"Acme\"}] (ranked)";
        assert_eq!(extract_json(text).unwrap(), json!([{"name": "Acme"}]));
    }

    #[test]
    fn test_plain_text_is_parse_failure() {
        assert_eq!(extract_json("- bullet one\n- bullet two"), Err(ParseFailure));
        assert_eq!(extract_json("broken { json"), Err(ParseFailure));
    }

    #[test]
    fn test_fenced_decision_object() {
        let raw = "```json\n{\"score\": 85, \"verdict\": \"recommend\", \"rationale\": \"strong team\"}\n```";
        let value = extract_json_object(raw).unwrap();
        assert_eq!(value["score"], 85);
        assert_eq!(value["verdict"], "recommend");
        assert_eq!(value["rationale"], "strong team");
    }

    #[test]
    fn test_object_extraction_rejects_lists() {
        assert_eq!(extract_json_object("[1, 2]"), Err(ParseFailure));
        assert_eq!(extract_json_object("no json here"), Err(ParseFailure));
    }
}
