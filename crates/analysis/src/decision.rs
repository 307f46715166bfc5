//! Decision priority
//!
//! A pattern hit always wins over the reasoning backend; otherwise the
//! parsed backend result is used, and an unparseable response becomes a
//! diagnostic incorrect verdict.

use pronunciation_core::{AnalysisResult, PatternEntry, PatternMatch, PatternType};
use serde::Serialize;
use std::fmt;

use crate::parser::ParseError;

/// Which branch produced the final result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    PatternOverride,
    Reasoner,
    ParseFallback,
}

impl DecisionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionSource::PatternOverride => "pattern_override",
            DecisionSource::Reasoner => "reasoner",
            DecisionSource::ParseFallback => "parse_fallback",
        }
    }
}

impl fmt::Display for DecisionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final result plus how it was reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub result: AnalysisResult,
    pub source: DecisionSource,
    pub pattern_type: PatternType,
}

fn rule_name<'a>(entry: &'a PatternEntry, pattern_type: PatternType) -> &'a str {
    entry
        .rule
        .as_deref()
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| pattern_type.default_rule_name())
}

fn arrow(from: &str, to: &str) -> String {
    format!("\"{}\" → \"{}\"", from, to)
}

/// Feedback text for an overriding pattern entry
pub fn override_feedback(pattern_type: PatternType, entry: &PatternEntry) -> String {
    let rule = rule_name(entry, pattern_type);
    let explanation = entry.explanation.as_deref().filter(|e| !e.is_empty());

    let body = match pattern_type {
        PatternType::Tensification => format!("{}.", arrow(&entry.pattern, &entry.correct)),
        PatternType::HLiaison => explanation
            .map(str::to_string)
            .unwrap_or_else(|| arrow(&entry.pattern, &entry.correct)),
        PatternType::VowelConfusion => explanation.map(str::to_string).unwrap_or_else(|| {
            let heard = entry
                .incorrect
                .as_deref()
                .filter(|i| !i.is_empty())
                .unwrap_or(&entry.pattern);
            arrow(heard, &entry.correct)
        }),
        PatternType::None => arrow(&entry.pattern, &entry.correct),
    };

    format!(
        "{}\n{}\nCorrect Pronunciation: {}.",
        rule,
        body,
        entry.spoken_form()
    )
}

/// Deterministic result for a pattern hit, built from its first entry
pub fn override_result(pattern_match: &PatternMatch) -> Option<AnalysisResult> {
    if !pattern_match.is_hit() {
        return None;
    }
    let entry = pattern_match.first()?;
    Some(AnalysisResult::incorrect(
        Some(entry.spoken_form().to_string()),
        override_feedback(pattern_match.pattern_type, entry),
    ))
}

/// Combine the pattern outcome with the parsed reasoning response
pub fn resolve(
    pattern_match: &PatternMatch,
    parsed: Result<AnalysisResult, ParseError>,
) -> Decision {
    let pattern_type = pattern_match.pattern_type;

    if let Some(result) = override_result(pattern_match) {
        return Decision {
            result,
            source: DecisionSource::PatternOverride,
            pattern_type,
        };
    }

    match parsed {
        Ok(result) => Decision {
            result,
            source: DecisionSource::Reasoner,
            pattern_type,
        },
        Err(error) => Decision {
            result: AnalysisResult::incorrect(
                None,
                format!("Failed to parse reasoning response: {}", error),
            ),
            source: DecisionSource::ParseFallback,
            pattern_type,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::good_day_entry;
    use pronunciation_core::Verdict;

    fn hit(pattern_type: PatternType, entry: PatternEntry) -> PatternMatch {
        PatternMatch {
            pattern_type,
            matches: vec![entry],
        }
    }

    #[test]
    fn test_tensification_feedback() {
        let entry = PatternEntry::new("만나서 반갑습니다", "만나서 빤갑습니다")
            .with_romanized("Man-na-seo ppan-gap-seum-ni-da");
        assert_eq!(
            override_feedback(PatternType::Tensification, &entry),
            "Tensification\n\"만나서 반갑습니다\" → \"만나서 빤갑습니다\".\nCorrect Pronunciation: Man-na-seo ppan-gap-seum-ni-da."
        );
    }

    #[test]
    fn test_good_day_feedback() {
        assert_eq!(
            override_feedback(PatternType::HLiaison, &good_day_entry()),
            "ᄒ Liaison and Weakening\n\"좋은\" ('ᄒ' liaison) → \"조은\"\n\"하루\" ('ᄒ' weakening) → \"아루\"\nCorrect Pronunciation: Jo-eun a-ru bo-nae-se-yo."
        );
    }

    #[test]
    fn test_vowel_feedback_uses_incorrect_form() {
        let entry = PatternEntry::new("여보세요", "여보세요").with_incorrect("여보세여");
        let feedback = override_feedback(PatternType::VowelConfusion, &entry);
        assert!(feedback.starts_with("Vowel Confusion\n\"여보세여\" → \"여보세요\""));
        assert!(feedback.ends_with("Correct Pronunciation: 여보세요."));
    }

    #[test]
    fn test_override_wins_over_reasoner() {
        let pm = hit(
            PatternType::Tensification,
            PatternEntry::new("반갑습니다", "빤갑습니다"),
        );
        let decision = resolve(&pm, Ok(AnalysisResult::correct()));

        assert_eq!(decision.source, DecisionSource::PatternOverride);
        assert_eq!(decision.result.result, Verdict::Incorrect);
        assert_eq!(decision.result.correct_pronunciation.as_deref(), Some("빤갑습니다"));
    }

    #[test]
    fn test_override_wins_over_parse_failure() {
        let pm = hit(PatternType::HLiaison, PatternEntry::new("하루", "아루"));
        let decision = resolve(&pm, Err(ParseError::NoJson));
        assert_eq!(decision.source, DecisionSource::PatternOverride);
    }

    #[test]
    fn test_passthrough_and_fallback() {
        let decision = resolve(&PatternMatch::none(), Ok(AnalysisResult::correct()));
        assert_eq!(decision.source, DecisionSource::Reasoner);
        assert_eq!(decision.result, AnalysisResult::correct());

        let decision = resolve(&PatternMatch::none(), Err(ParseError::MissingFeedback));
        assert_eq!(decision.source, DecisionSource::ParseFallback);
        assert_eq!(decision.result.result, Verdict::Incorrect);
        assert!(decision.result.correct_pronunciation.is_none());
        assert!(decision
            .result
            .feedback
            .unwrap()
            .starts_with("Failed to parse reasoning response"));
    }
}
