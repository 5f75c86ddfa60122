// ABOUTME: Validates the feedback document a grader writes to /shared/feedback.json
// ABOUTME: Produces either a fully valid grading result or exactly one defect

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

/// File the grader is required to produce inside the shared directory
pub const FEEDBACK_FILE_NAME: &str = "feedback.json";

#[derive(Debug, Clone, PartialEq)]
pub enum Score {
    /// Boolean-correctness mode (`isCorrect`)
    Correctness(bool),
    /// Fractional-score mode (`fractionalScore`), always within [0, 1]
    Fractional(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradingResult {
    pub score: Score,
    pub feedback: String,
}

/// Reasons a feedback document is rejected, in the order they are checked
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Defect {
    #[error("The output was not a valid JSON document: {0}")]
    Malformed(String),

    #[error("Required field 'fractionalScore' is missing.")]
    MissingScore,

    #[error("Field 'fractionalScore' must be a decimal.")]
    BadFractionalScoreType,

    #[error("Field 'fractionalScore' must be {}.", range_hint(.0))]
    FractionalScoreOutOfRange(f64),

    #[error("Field 'isCorrect' is not a boolean value.")]
    BadIsCorrectType,

    #[error("Field 'feedback' not present in parsed output.")]
    MissingFeedback,

    #[error("Field 'feedback' must be a string.")]
    BadFeedbackType,
}

fn range_hint(value: &f64) -> &'static str {
    if *value > 1.0 {
        "<= 1"
    } else {
        ">= 0"
    }
}

/// Raw shape of the document; `Some(Value::Null)` means the key was present.
#[derive(Debug, Deserialize)]
struct FeedbackDocument {
    #[serde(rename = "fractionalScore", default, deserialize_with = "present")]
    fractional_score: Option<Value>,
    #[serde(rename = "isCorrect", default, deserialize_with = "present")]
    is_correct: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    feedback: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Decode and check a feedback artifact.
///
/// Check order: parse, scoring field presence, scoring field type and range,
/// then feedback. `fractionalScore` wins when both scoring fields are present.
pub fn validate(bytes: &[u8]) -> Result<GradingResult, Defect> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| Defect::Malformed(e.to_string()))?;
    if !value.is_object() {
        return Err(Defect::Malformed("expected a JSON object".to_string()));
    }
    let document =
        FeedbackDocument::deserialize(value).map_err(|e| Defect::Malformed(e.to_string()))?;

    let score = match (document.fractional_score, document.is_correct) {
        (Some(fractional), _) => Score::Fractional(check_fractional(&fractional)?),
        (None, Some(Value::Bool(correct))) => Score::Correctness(correct),
        (None, Some(_)) => return Err(Defect::BadIsCorrectType),
        (None, None) => return Err(Defect::MissingScore),
    };

    let feedback = match document.feedback {
        Some(Value::String(text)) => text,
        Some(_) => return Err(Defect::BadFeedbackType),
        None => return Err(Defect::MissingFeedback),
    };

    Ok(GradingResult { score, feedback })
}

fn check_fractional(value: &Value) -> Result<f64, Defect> {
    // Booleans and strings are not numbers in serde_json, so both land here
    let Some(score) = value.as_f64() else {
        return Err(Defect::BadFractionalScoreType);
    };

    if score > 1.0 || score < 0.0 {
        return Err(Defect::FractionalScoreOutOfRange(score));
    }

    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(r#"{"fractionalScore": 0, "feedback": "ok"}"#, 0.0)]
    #[case(r#"{"fractionalScore": 1, "feedback": "ok"}"#, 1.0)]
    #[case(r#"{"fractionalScore": 1.0, "feedback": "ok"}"#, 1.0)]
    #[case(r#"{"fractionalScore": 0.0, "feedback": "ok"}"#, 0.0)]
    #[case(r#"{"fractionalScore": 0.25, "feedback": "ok"}"#, 0.25)]
    fn test_fractional_scores_in_range(#[case] doc: &str, #[case] expected: f64) {
        let result = validate(doc.as_bytes()).unwrap();
        assert_eq!(result.score, Score::Fractional(expected));
        assert_eq!(result.feedback, "ok");
    }

    #[rstest]
    #[case(r#"{"fractionalScore": 1.1, "feedback": "x"}"#, Defect::FractionalScoreOutOfRange(1.1))]
    #[case(r#"{"fractionalScore": -1.1, "feedback": "x"}"#, Defect::FractionalScoreOutOfRange(-1.1))]
    #[case(r#"{"fractionalScore": false, "feedback": "x"}"#, Defect::BadFractionalScoreType)]
    #[case(r#"{"fractionalScore": true, "feedback": "x"}"#, Defect::BadFractionalScoreType)]
    #[case(r#"{"fractionalScore": "0.3", "feedback": "x"}"#, Defect::BadFractionalScoreType)]
    #[case(r#"{"fractionalScore": null, "feedback": "x"}"#, Defect::BadFractionalScoreType)]
    #[case(r#"{"isCorrect": "true-string-is-not-true", "feedback": "x"}"#, Defect::BadIsCorrectType)]
    #[case(r#"{"isCorrect": 1, "feedback": "x"}"#, Defect::BadIsCorrectType)]
    #[case(r#"{"feedback": "wheeeee"}"#, Defect::MissingScore)]
    #[case(r#"{}"#, Defect::MissingScore)]
    #[case(r#"{"isCorrect": false, "not-feedback": "garbage"}"#, Defect::MissingFeedback)]
    #[case(r#"{"fractionalScore": 0.5}"#, Defect::MissingFeedback)]
    #[case(r#"{"isCorrect": true, "feedback": 42}"#, Defect::BadFeedbackType)]
    fn test_defects(#[case] doc: &str, #[case] expected: Defect) {
        assert_eq!(validate(doc.as_bytes()), Err(expected));
    }

    #[rstest]
    #[case(r#"{"isCorrect":false, "not-feedback": "garbageeeeeeee"#)]
    #[case("")]
    #[case("not json at all")]
    #[case("[1, 2, 3]")]
    #[case("\"feedback\"")]
    fn test_malformed_documents(#[case] doc: &str) {
        assert!(matches!(validate(doc.as_bytes()), Err(Defect::Malformed(_))));
    }

    #[test]
    fn test_boolean_correctness_mode() {
        let result = validate(br#"{"isCorrect": true, "feedback": "You win!"}"#).unwrap();
        assert_eq!(result.score, Score::Correctness(true));
        assert_eq!(result.feedback, "You win!");
    }

    #[test]
    fn test_score_checked_before_feedback() {
        // Both the score and the feedback are wrong; the score defect is reported
        assert_eq!(
            validate(br#"{"fractionalScore": 2}"#),
            Err(Defect::FractionalScoreOutOfRange(2.0))
        );
        assert_eq!(validate(br#"{"not-feedback": 1}"#), Err(Defect::MissingScore));
    }

    #[test]
    fn test_fractional_score_takes_precedence() {
        let result =
            validate(br#"{"fractionalScore": 0.5, "isCorrect": "nope", "feedback": ""}"#).unwrap();
        assert_eq!(result.score, Score::Fractional(0.5));
    }

    #[test]
    fn test_defect_messages() {
        assert_eq!(
            Defect::FractionalScoreOutOfRange(1.1).to_string(),
            "Field 'fractionalScore' must be <= 1."
        );
        assert_eq!(
            Defect::FractionalScoreOutOfRange(-1.1).to_string(),
            "Field 'fractionalScore' must be >= 0."
        );
        assert_eq!(
            Defect::BadIsCorrectType.to_string(),
            "Field 'isCorrect' is not a boolean value."
        );
    }
}
