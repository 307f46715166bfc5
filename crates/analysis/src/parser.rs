//! Reasoning output parser
//!
//! Treats backend output as untrusted text: locate the JSON object, validate
//! its shape against a schema, then normalise it into an [`AnalysisResult`].

use jsonschema::JSONSchema;
use pronunciation_core::{AnalysisResult, Verdict};
use serde_json::{json, Value};
use thiserror::Error;

/// Why a reasoning response could not be used
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("no JSON object found in response")]
    NoJson,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("schema violation: {0}")]
    Schema(String),

    #[error("unrecognised verdict \"{0}\"")]
    InvalidVerdict(String),

    #[error("incorrect verdict without feedback")]
    MissingFeedback,
}

const FORMAT_INSTRUCTIONS: &str = "Return only a JSON object with this structure:
{
  \"result\": \"Correct pronunciation\" or \"Incorrect pronunciation\",
  \"correct_pronunciation\": \"romanized spoken form, or null when correct\",
  \"feedback\": \"which rule applies, written as 'written form' → 'spoken form' (rule name), or null when correct\"
}
Do not add any text before or after the JSON object.";

fn output_schema() -> Value {
    json!({
        "type": "object",
        "required": ["result"],
        "properties": {
            "result": { "type": "string" },
            "correct_pronunciation": { "type": ["string", "null"] },
            "feedback": { "type": ["string", "null"] }
        }
    })
}

/// Strip code fences and return the outermost `{...}` span
pub fn extract_json(raw: &str) -> Option<&str> {
    let text = raw.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.trim().strip_suffix("```").unwrap_or(text).trim();

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// "Correct pronunciation", "incorrect pronunciation." and similar
fn parse_verdict(value: &str) -> Option<Verdict> {
    let normalized = value.trim().trim_end_matches('.').trim().to_lowercase();
    match normalized.as_str() {
        "correct pronunciation" => Some(Verdict::Correct),
        "incorrect pronunciation" => Some(Verdict::Incorrect),
        _ => None,
    }
}

fn optional_text(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

/// Schema-validating parser for reasoning responses
pub struct OutputParser {
    schema: JSONSchema,
}

impl OutputParser {
    pub fn new() -> Result<Self, String> {
        let schema = JSONSchema::compile(&output_schema()).map_err(|e| e.to_string())?;
        Ok(Self { schema })
    }

    /// Instructions appended to the prompt
    pub fn format_instructions(&self) -> &'static str {
        FORMAT_INSTRUCTIONS
    }

    pub fn parse(&self, raw: &str) -> Result<AnalysisResult, ParseError> {
        let json_text = extract_json(raw).ok_or(ParseError::NoJson)?;
        let value: Value =
            serde_json::from_str(json_text).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

        if let Err(errors) = self.schema.validate(&value) {
            let messages: Vec<String> = errors.map(|e| e.to_string()).collect();
            return Err(ParseError::Schema(messages.join("; ")));
        }

        let verdict_text = value
            .get("result")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let verdict = parse_verdict(verdict_text)
            .ok_or_else(|| ParseError::InvalidVerdict(verdict_text.to_string()))?;

        match verdict {
            Verdict::Correct => Ok(AnalysisResult::correct()),
            Verdict::Incorrect => {
                let feedback = optional_text(value.get("feedback"))
                    .filter(|f| !f.trim().is_empty())
                    .ok_or(ParseError::MissingFeedback)?;
                Ok(AnalysisResult::incorrect(
                    optional_text(value.get("correct_pronunciation")),
                    feedback,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> OutputParser {
        OutputParser::new().unwrap()
    }

    #[test]
    fn test_extract_json_variants() {
        assert_eq!(extract_json(r#"{"a":1}"#), Some(r#"{"a":1}"#));
        assert_eq!(
            extract_json("```json\n{\"a\":1}\n```"),
            Some(r#"{"a":1}"#)
        );
        assert_eq!(
            extract_json("Here you go: {\"a\":{\"b\":2}} hope it helps"),
            Some(r#"{"a":{"b":2}}"#)
        );
        assert_eq!(extract_json("no braces"), None);
        assert_eq!(extract_json("} backwards {"), None);
    }

    #[test]
    fn test_parse_correct() {
        let result = parser()
            .parse(r#"{"result":"Correct pronunciation","correct_pronunciation":null,"feedback":null}"#)
            .unwrap();
        assert_eq!(result, AnalysisResult::correct());
    }

    #[test]
    fn test_correct_verdict_drops_extra_fields() {
        let result = parser()
            .parse(r#"{"result":"correct pronunciation.","correct_pronunciation":"an-nyeong","feedback":"fine"}"#)
            .unwrap();
        assert_eq!(result, AnalysisResult::correct());
    }

    #[test]
    fn test_parse_incorrect_in_fence() {
        let raw = "```json\n{\"result\": \"Incorrect pronunciation\", \"correct_pronunciation\": \"hak-kkyo\", \"feedback\": \"'학교' → '학꾜' (Tensification)\"}\n```";
        let result = parser().parse(raw).unwrap();
        assert_eq!(result.result, Verdict::Incorrect);
        assert_eq!(result.correct_pronunciation.as_deref(), Some("hak-kkyo"));
        assert!(result.feedback.unwrap().contains("Tensification"));
    }

    #[test]
    fn test_malformed_outputs() {
        let p = parser();
        assert_eq!(p.parse("I think it sounds fine"), Err(ParseError::NoJson));
        assert!(matches!(p.parse("{result: nope}"), Err(ParseError::InvalidJson(_))));
        assert!(matches!(p.parse(r#"{"feedback":"x"}"#), Err(ParseError::Schema(_))));
        assert!(matches!(p.parse(r#"{"result":42}"#), Err(ParseError::Schema(_))));
        assert!(matches!(
            p.parse(r#"{"result":"Mostly fine"}"#),
            Err(ParseError::InvalidVerdict(_))
        ));
        assert_eq!(
            p.parse(r#"{"result":"Incorrect pronunciation","feedback":"  "}"#),
            Err(ParseError::MissingFeedback)
        );
    }

    #[test]
    fn test_format_instructions_name_both_verdicts() {
        let p = parser();
        assert!(p.format_instructions().contains("Correct pronunciation"));
        assert!(p.format_instructions().contains("Incorrect pronunciation"));
    }
}
