//! Pronunciation domain types
//!
//! Rule corpus entries, phrase-level pattern tables and the analysis
//! request/result pair exchanged with the HTTP layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A canonical example pair for a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleExample {
    pub word: String,
    pub standard: String,
    pub actual: String,
}

/// A named phonological rule from the corpus. Identity is `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PronunciationRule {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub examples: Vec<RuleExample>,
}

impl PronunciationRule {
    /// Render the rule as the document text that gets chunked and embedded
    pub fn flatten(&self) -> String {
        let examples = self
            .examples
            .iter()
            .map(|ex| format!("{} (standard: {}, actual: {})", ex.word, ex.standard, ex.actual))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "Rule: {}\nDescription: {}\nExamples: {}",
            self.name, self.description, examples
        )
    }
}

/// A bounded fragment of a flattened rule, as stored in the retrieval index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDocumentChunk {
    /// Stable id, `{rule_name}#{chunk_index}`
    pub id: String,
    pub rule_name: String,
    pub text: String,
    /// Position in corpus order across all chunks; used to break score ties
    pub ordinal: usize,
    /// Similarity to the query, filled in by search
    #[serde(default)]
    pub score: f32,
}

/// Which pattern table produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    Tensification,
    HLiaison,
    VowelConfusion,
    #[default]
    None,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::Tensification => "tensification",
            PatternType::HLiaison => "h_liaison",
            PatternType::VowelConfusion => "vowel_confusion",
            PatternType::None => "none",
        }
    }

    /// Rule label used when a pattern entry does not name its own rule
    pub fn default_rule_name(&self) -> &'static str {
        match self {
            PatternType::Tensification => "Tensification",
            PatternType::HLiaison => "ᄒ Liaison/Weakening",
            PatternType::VowelConfusion => "Vowel Confusion",
            PatternType::None => "",
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a pattern table. `pattern` is searched for literally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternEntry {
    pub pattern: String,
    pub correct: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incorrect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub romanized: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl PatternEntry {
    pub fn new(pattern: impl Into<String>, correct: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            correct: correct.into(),
            incorrect: None,
            romanized: None,
            rule: None,
            explanation: None,
        }
    }

    pub fn with_incorrect(mut self, incorrect: impl Into<String>) -> Self {
        self.incorrect = Some(incorrect.into());
        self
    }

    pub fn with_romanized(mut self, romanized: impl Into<String>) -> Self {
        self.romanized = Some(romanized.into());
        self
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    /// Spoken form to report: romanized if known, otherwise the corrected Hangul
    pub fn spoken_form(&self) -> &str {
        self.romanized
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or(&self.correct)
    }
}

/// Outcome of running the pattern matcher over a transcription
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub pattern_type: PatternType,
    /// All matching entries of the winning table, in table order
    pub matches: Vec<PatternEntry>,
}

impl PatternMatch {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_hit(&self) -> bool {
        self.pattern_type != PatternType::None && !self.matches.is_empty()
    }

    pub fn first(&self) -> Option<&PatternEntry> {
        self.matches.first()
    }
}

/// Input to one analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub transcription: String,
    #[serde(default)]
    pub expected_text: Option<String>,
}

impl AnalysisRequest {
    pub fn new(transcription: impl Into<String>) -> Self {
        Self {
            transcription: transcription.into(),
            expected_text: None,
        }
    }

    /// Attach a reference text; blank strings are treated as absent
    pub fn with_expected_text(mut self, expected: Option<String>) -> Self {
        self.expected_text = expected.filter(|t| !t.trim().is_empty());
        self
    }
}

/// Two-valued pronunciation verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "Correct pronunciation")]
    Correct,
    #[serde(rename = "Incorrect pronunciation")]
    Incorrect,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Correct => "Correct pronunciation",
            Verdict::Incorrect => "Incorrect pronunciation",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final verdict of one analysis.
///
/// Build through [`AnalysisResult::correct`] and [`AnalysisResult::incorrect`]
/// so a correct verdict never carries feedback and an incorrect one always does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub result: Verdict,
    pub correct_pronunciation: Option<String>,
    pub feedback: Option<String>,
}

impl AnalysisResult {
    pub fn correct() -> Self {
        Self {
            result: Verdict::Correct,
            correct_pronunciation: None,
            feedback: None,
        }
    }

    pub fn incorrect(correct_pronunciation: Option<String>, feedback: impl Into<String>) -> Self {
        Self {
            result: Verdict::Incorrect,
            correct_pronunciation,
            feedback: Some(feedback.into()),
        }
    }

    pub fn is_correct(&self) -> bool {
        self.result == Verdict::Correct
    }
}
