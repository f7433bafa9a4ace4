/// Reading the verification payload for display
///
/// The API payload is opaque to the extension except for the handful of
/// fields both the content script and the popup render. Every field is
/// optional here: a missing field drops its section instead of failing
/// the whole render.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::protocol::VerificationResponse;

/// The six verdicts the API can return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    True,
    MostlyTrue,
    Mixed,
    MostlyFalse,
    False,
    Unverifiable,
}

impl Verdict {
    pub const ALL: [Verdict; 6] = [
        Verdict::True,
        Verdict::MostlyTrue,
        Verdict::Mixed,
        Verdict::MostlyFalse,
        Verdict::False,
        Verdict::Unverifiable,
    ];

    pub fn parse(raw: &str) -> Option<Verdict> {
        Verdict::ALL.into_iter().find(|v| v.as_str() == raw)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::True => "true",
            Verdict::MostlyTrue => "mostly_true",
            Verdict::Mixed => "mixed",
            Verdict::MostlyFalse => "mostly_false",
            Verdict::False => "false",
            Verdict::Unverifiable => "unverifiable",
        }
    }
}

/// Title-case a snake_case verdict: "mostly_true" → "Mostly True"
pub fn format_verdict(raw: &str) -> String {
    raw.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// CSS class for the result header
pub fn verdict_class(raw: Option<&str>) -> &'static str {
    match raw.and_then(Verdict::parse) {
        Some(Verdict::True | Verdict::MostlyTrue) => "verdict-true",
        Some(Verdict::False | Verdict::MostlyFalse) => "verdict-false",
        Some(Verdict::Mixed) => "verdict-mixed",
        _ => "verdict-unknown",
    }
}

/// Locate the verification object inside a payload
///
/// The API nests it under `analysis.verification`; a flat payload that
/// carries `verdict` itself is accepted as well.
pub fn verification_of(payload: &Value) -> Option<&Value> {
    payload
        .get("analysis")
        .and_then(|analysis| analysis.get("verification"))
        .filter(|v| v.is_object())
        .or_else(|| payload.get("verdict").map(|_| payload))
}

/// The verdict string of a payload, if any
pub fn verdict_of(payload: &Value) -> Option<&str> {
    verification_of(payload)?.get("verdict")?.as_str()
}

#[derive(Debug, Clone, PartialEq)]
pub struct FactCheck {
    pub source: String,
    pub verdict: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sentiment {
    pub classification: Option<String>,
    pub polarity: Option<f64>,
    pub subjectivity: Option<f64>,
}

/// What a result panel shows
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSummary {
    pub verdict: Option<String>,
    pub confidence: Option<f64>,
    pub explanation: Option<String>,
    pub fact_checks: Vec<FactCheck>,
    pub entities: Vec<String>,
    pub sentiment: Option<Sentiment>,
    pub credibility_score: Option<f64>,
}

impl ResultSummary {
    /// `None` when the payload has no verification object at all
    pub fn from_payload(payload: &Value) -> Option<ResultSummary> {
        let verification = verification_of(payload)?;

        let str_field = |key: &str| {
            verification
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        let fact_checks = verification
            .get("fact_checks")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        let source = item.get("source")?.as_str()?.to_string();
                        let verdict = item
                            .get("verdict")
                            .and_then(Value::as_str)
                            .unwrap_or("unknown")
                            .to_string();
                        Some(FactCheck { source, verdict })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let entities = verification
            .get("entities")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let sentiment = verification
            .get("sentiment")
            .filter(|s| s.is_object())
            .map(|s| Sentiment {
                classification: s
                    .get("classification")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                polarity: s.get("polarity").and_then(Value::as_f64),
                subjectivity: s.get("subjectivity").and_then(Value::as_f64),
            });

        Some(ResultSummary {
            verdict: str_field("verdict"),
            confidence: verification.get("confidence").and_then(Value::as_f64),
            explanation: str_field("explanation"),
            fact_checks,
            entities,
            sentiment,
            credibility_score: verification
                .get("credibility_score")
                .and_then(Value::as_f64),
        })
    }

    pub fn verdict_label(&self) -> String {
        self.verdict
            .as_deref()
            .map(format_verdict)
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    pub fn verdict_class(&self) -> &'static str {
        verdict_class(self.verdict.as_deref())
    }

    pub fn confidence_percent(&self) -> Option<u8> {
        self.confidence
            .filter(|c| c.is_finite())
            .map(|c| (c * 100.0).round().clamp(0.0, 100.0) as u8)
    }

    pub fn credibility_percent(&self) -> Option<u8> {
        self.credibility_score
            .filter(|c| c.is_finite())
            .map(|c| (c * 100.0).round().clamp(0.0, 100.0) as u8)
    }
}

const GENERIC_FAILURE: &str = "Verification failed";

/// Decide whether a `verifyClaim` reply is renderable
///
/// Errors carry the text to show the user.
pub fn interpret_reply(reply: &VerificationResponse) -> Result<ResultSummary, String> {
    if !reply.success {
        return Err(reply
            .error
            .clone()
            .unwrap_or_else(|| GENERIC_FAILURE.to_string()));
    }

    let payload = reply
        .result
        .as_ref()
        .ok_or_else(|| GENERIC_FAILURE.to_string())?;

    if payload.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(payload
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or(GENERIC_FAILURE)
            .to_string());
    }

    ResultSummary::from_payload(payload)
        .ok_or_else(|| format!("{}: malformed analysis", GENERIC_FAILURE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn api_payload() -> Value {
        json!({
            "success": true,
            "claim_id": "c-1",
            "processing_time": 1.25,
            "analysis": {
                "claim": {"text": "The moon landing was faked"},
                "verification": {
                    "verdict": "mostly_false",
                    "confidence": 0.876,
                    "explanation": "Multiple independent sources contradict this.",
                    "fact_checks": [
                        {"source": "Snopes", "verdict": "false", "rating": 0.1},
                        {"source": "PolitiFact", "verdict": "pants_on_fire", "rating": 0.0},
                        {"verdict": "true"}
                    ],
                    "entities": ["moon", "NASA"],
                    "sentiment": {"polarity": -0.2, "subjectivity": 0.6, "classification": "negative"},
                    "credibility_score": 0.42
                }
            }
        })
    }

    #[test]
    fn test_format_verdict() {
        assert_eq!(format_verdict("mostly_true"), "Mostly True");
        assert_eq!(format_verdict("false"), "False");
        assert_eq!(format_verdict("pants_on_fire"), "Pants On Fire");
        assert_eq!(format_verdict(""), "");
    }

    #[test]
    fn test_verdict_class() {
        assert_eq!(verdict_class(Some("true")), "verdict-true");
        assert_eq!(verdict_class(Some("mostly_true")), "verdict-true");
        assert_eq!(verdict_class(Some("mostly_false")), "verdict-false");
        assert_eq!(verdict_class(Some("mixed")), "verdict-mixed");
        assert_eq!(verdict_class(Some("unverifiable")), "verdict-unknown");
        assert_eq!(verdict_class(None), "verdict-unknown");
    }

    #[test]
    fn test_verdict_parse() {
        for verdict in Verdict::ALL {
            assert_eq!(Verdict::parse(verdict.as_str()), Some(verdict));
        }
        assert_eq!(Verdict::parse("MOSTLY_TRUE"), None);
    }

    #[test]
    fn test_summary_from_full_payload() {
        let summary = ResultSummary::from_payload(&api_payload()).unwrap();

        assert_eq!(summary.verdict_label(), "Mostly False");
        assert_eq!(summary.verdict_class(), "verdict-false");
        assert_eq!(summary.confidence_percent(), Some(88));
        assert_eq!(summary.credibility_percent(), Some(42));
        assert_eq!(summary.fact_checks.len(), 2);
        assert_eq!(summary.fact_checks[1].source, "PolitiFact");
        assert_eq!(summary.entities, vec!["moon".to_string(), "NASA".to_string()]);
        assert_eq!(
            summary.sentiment.unwrap().classification.as_deref(),
            Some("negative")
        );
    }

    #[test]
    fn test_summary_degrades_on_missing_fields() {
        let payload = json!({"analysis": {"verification": {"verdict": "mixed"}}});
        let summary = ResultSummary::from_payload(&payload).unwrap();

        assert_eq!(summary.verdict_label(), "Mixed");
        assert_eq!(summary.confidence_percent(), None);
        assert_eq!(summary.explanation, None);
        assert!(summary.fact_checks.is_empty());
        assert!(summary.sentiment.is_none());
    }

    #[test]
    fn test_summary_accepts_flat_payload() {
        let payload = json!({"verdict": "false", "confidence": 0.95});
        let summary = ResultSummary::from_payload(&payload).unwrap();
        assert_eq!(summary.verdict_label(), "False");
        assert_eq!(summary.confidence_percent(), Some(95));
        assert_eq!(verdict_of(&payload), Some("false"));
    }

    #[test]
    fn test_summary_missing_verification() {
        assert!(ResultSummary::from_payload(&json!({"success": true})).is_none());
        assert!(ResultSummary::from_payload(&json!({"analysis": {}})).is_none());
        assert_eq!(verdict_of(&json!({"analysis": null})), None);
    }

    #[test]
    fn test_confidence_clamped() {
        let summary = ResultSummary::from_payload(&json!({"verdict": "true", "confidence": 1.7})).unwrap();
        assert_eq!(summary.confidence_percent(), Some(100));
    }

    #[test]
    fn test_interpret_success() {
        let reply = VerificationResponse::ok(api_payload());
        let summary = interpret_reply(&reply).unwrap();
        assert_eq!(summary.verdict.as_deref(), Some("mostly_false"));
    }

    #[test]
    fn test_interpret_failure_uses_error_text() {
        let reply = VerificationResponse::failed("API error: 500");
        assert_eq!(interpret_reply(&reply), Err("API error: 500".to_string()));

        let bare = VerificationResponse {
            success: false,
            result: None,
            error: None,
        };
        assert_eq!(interpret_reply(&bare), Err("Verification failed".to_string()));
    }

    #[test]
    fn test_interpret_malformed_success() {
        let absent = VerificationResponse {
            success: true,
            result: None,
            error: None,
        };
        assert!(interpret_reply(&absent).is_err());

        let api_failed = VerificationResponse::ok(json!({"success": false, "error": "Rate limited"}));
        assert_eq!(interpret_reply(&api_failed), Err("Rate limited".to_string()));

        let malformed = VerificationResponse::ok(json!({"success": true, "claim_id": "x"}));
        assert_eq!(
            interpret_reply(&malformed),
            Err("Verification failed: malformed analysis".to_string())
        );
    }
}
