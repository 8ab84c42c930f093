use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 投资判断
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Recommend,
    Hold,
    #[default]
    Pass,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Recommend => write!(f, "recommend"),
            Verdict::Hold => write!(f, "hold"),
            Verdict::Pass => write!(f, "pass"),
        }
    }
}

impl std::str::FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "recommend" | "invest" => Ok(Verdict::Recommend),
            "hold" => Ok(Verdict::Hold),
            "pass" | "reject" => Ok(Verdict::Pass),
            _ => Err(format!("Unknown verdict: {}", s)),
        }
    }
}

impl Verdict {
    /// 宽松解析，无法识别的值视为 pass
    pub fn lenient(value: Option<&Value>) -> Verdict {
        value
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}

/// 单个候选在一次决策中的评分结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub candidate_name: String,
    /// 0..=100
    pub score: u8,
    pub verdict: Verdict,
    pub rationale: String,
    /// 模型认为缺失的证据
    #[serde(default)]
    pub missing: Vec<String>,
}

impl DecisionRecord {
    /// 从评分模型返回的 JSON 对象构建记录，分数截断到 0..=100
    pub fn from_scored(candidate_name: &str, scored: &Value) -> Self {
        let missing = scored
            .get("missing")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            candidate_name: candidate_name.to_string(),
            score: parse_score(scored.get("score")),
            verdict: Verdict::lenient(scored.get("verdict")),
            rationale: scored
                .get("rationale")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            missing,
        }
    }

    /// 评分输出无法解析时的记录
    pub fn unscored(candidate_name: &str) -> Self {
        Self {
            candidate_name: candidate_name.to_string(),
            score: 0,
            verdict: Verdict::Pass,
            rationale: String::new(),
            missing: Vec::new(),
        }
    }
}

fn parse_score(value: Option<&Value>) -> u8 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    raw.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_verdict_from_str() {
        assert_eq!("Recommend".parse::<Verdict>().unwrap(), Verdict::Recommend);
        assert_eq!("invest".parse::<Verdict>().unwrap(), Verdict::Recommend);
        assert_eq!(" HOLD ".parse::<Verdict>().unwrap(), Verdict::Hold);
        assert_eq!("reject".parse::<Verdict>().unwrap(), Verdict::Pass);
        assert!("maybe".parse::<Verdict>().is_err());
    }

    #[test]
    fn test_record_from_scored_object() {
        let scored = json!({"score": 85, "verdict": "recommend", "rationale": "strong team", "missing": ["MRR"]});
        let rec = DecisionRecord::from_scored("Acme", &scored);
        assert_eq!(rec.score, 85);
        assert_eq!(rec.verdict, Verdict::Recommend);
        assert_eq!(rec.rationale, "strong team");
        assert_eq!(rec.missing, vec!["MRR".to_string()]);
    }

    #[test]
    fn test_score_is_clamped_and_coerced() {
        let rec = DecisionRecord::from_scored("A", &json!({"score": 140, "verdict": "hold"}));
        assert_eq!(rec.score, 100);
        let rec = DecisionRecord::from_scored("A", &json!({"score": -3}));
        assert_eq!(rec.score, 0);
        let rec = DecisionRecord::from_scored("A", &json!({"score": "72"}));
        assert_eq!(rec.score, 72);
        assert_eq!(rec.verdict, Verdict::Pass);
    }
}
