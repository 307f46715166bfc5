//! Prompt composition
//!
//! Chat message types plus the builder for the pronunciation analysis prompt.

use pronunciation_core::{PatternMatch, PatternType, RuleDocumentChunk};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
        }
    }
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

const PREAMBLE: &str = "You are an expert in Korean phonology. Decide whether the transcribed \
speech below reflects the standard spoken pronunciation of Korean, applying the pronunciation \
rules that are relevant to it.";

const CHECKLIST: &str = "Always check the utterance against these sound changes:

1. Tensification (fortition)
   - A plain consonant following a stop-final syllable is pronounced tense.
   - \"학교\" (hak-gyo) is spoken \"학꾜\" (hak-kkyo); \"입구\" (ip-gu) is spoken \"입꾸\" (ip-kku).
   - \"만나서 반갑습니다\" is expected to sound like \"만나서 빤갑습니다\".

2. Liaison (linking)
   - A final consonant moves to the next syllable when that syllable starts with a vowel.
   - \"꽃이\" is spoken \"꼬치\"; \"밥을\" is spoken \"바블\".

3. Nasal assimilation
   - ㄱ, ㄷ and ㅂ before ㄴ or ㅁ become ㅇ, ㄴ and ㅁ.
   - \"학년\" is spoken \"항년\"; \"십만\" is spoken \"심만\".

4. Consonant assimilation
   - Adjacent consonants become alike, most commonly ㄴ next to ㄹ.
   - \"신라\" is spoken \"실라\"; \"관리\" is spoken \"괄리\".

5. ㅎ weakening
   - ㅎ is weakened or dropped in casual connected speech.
   - \"하루\" is spoken \"아루\"; \"하얀\" is spoken \"아얀\".";

const OPEN_ANALYSIS_STEPS: &str = "Procedure:
1. Find every word in the transcription that one of the rules above applies to.
2. If the transcription shows the written form where the spoken form should appear, the result is \"Incorrect pronunciation\".
3. For example, a transcription of \"만나서 반갑습니다\" is incorrect, because the spoken form is \"만나서 빤갑습니다\".";

const COMPARISON_STEPS: &str = "Procedure:
1. Derive the standard spoken form of the expected text by applying the rules above.
2. Compare the transcription with that spoken form word by word.
3. If the speaker deviated from the spoken form of the expected text, the result is \"Incorrect pronunciation\".";

/// Builder for the analysis prompt sent to the reasoning backend
#[derive(Debug, Clone, Default)]
pub struct PronunciationPrompt {
    transcription: String,
    expected_text: Option<String>,
    rule_context: Vec<String>,
    pattern_match: Option<PatternMatch>,
    format_instructions: Option<String>,
}

impl PronunciationPrompt {
    pub fn new(transcription: impl Into<String>) -> Self {
        Self {
            transcription: transcription.into(),
            ..Default::default()
        }
    }

    /// Switch to reference-comparison mode; blank text is ignored
    pub fn with_expected_text(mut self, expected: Option<&str>) -> Self {
        self.expected_text = expected
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        self
    }

    pub fn with_rules(mut self, chunks: &[RuleDocumentChunk]) -> Self {
        self.rule_context = chunks.iter().map(|c| c.text.clone()).collect();
        self
    }

    /// Attach the pattern hit; misses add no note
    pub fn with_pattern_match(mut self, pattern_match: &PatternMatch) -> Self {
        self.pattern_match = pattern_match.is_hit().then(|| pattern_match.clone());
        self
    }

    pub fn with_format_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.format_instructions = Some(instructions.into());
        self
    }

    pub fn is_comparison(&self) -> bool {
        self.expected_text.is_some()
    }

    /// Note asserting the sound change the answer must reflect
    pub fn special_note(&self) -> Option<String> {
        let pm = self.pattern_match.as_ref()?;

        let header = match pm.pattern_type {
            PatternType::Tensification => {
                "SPECIAL NOTE: The transcription contains text that MUST follow tensification rules.\n\
                 The correct pronunciation MUST include tensification for these patterns:"
            }
            PatternType::HLiaison => {
                "SPECIAL NOTE: The transcription contains text that MUST follow ᄒ liaison or weakening rules.\n\
                 The correct pronunciation MUST include these sound changes:"
            }
            PatternType::VowelConfusion => {
                "SPECIAL NOTE: The transcription contains text that is commonly mispronounced with vowel confusion.\n\
                 Pay special attention to the correct vowel sounds in these patterns:"
            }
            PatternType::None => return None,
        };

        let lines: Vec<String> = pm
            .matches
            .iter()
            .map(|entry| {
                let romanized = entry
                    .romanized
                    .as_deref()
                    .filter(|r| !r.is_empty())
                    .map(|r| format!(" ({})", r))
                    .unwrap_or_default();
                let rule = entry
                    .rule
                    .as_deref()
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| pm.pattern_type.default_rule_name());
                format!(
                    "- \"{}\" → \"{}\"{} ({})",
                    entry.pattern, entry.correct, romanized, rule
                )
            })
            .collect();

        Some(format!("{}\n{}", header, lines.join("\n")))
    }

    /// Render the full prompt text
    pub fn build(&self) -> String {
        let mut sections = vec![PREAMBLE.to_string()];

        sections.push(format!("Transcribed text: {}", self.transcription));
        if let Some(expected) = &self.expected_text {
            sections.push(format!("Expected text: {}", expected));
        }

        let context = if self.rule_context.is_empty() {
            "(no matching rules found)".to_string()
        } else {
            self.rule_context.join("\n\n")
        };
        sections.push(format!("Relevant Korean pronunciation rules:\n{}", context));

        sections.push(CHECKLIST.to_string());

        if let Some(note) = self.special_note() {
            sections.push(note);
        }

        sections.push(if self.is_comparison() {
            COMPARISON_STEPS.to_string()
        } else {
            OPEN_ANALYSIS_STEPS.to_string()
        });

        if let Some(instructions) = &self.format_instructions {
            sections.push(instructions.clone());
        }

        sections.join("\n\n")
    }
}
