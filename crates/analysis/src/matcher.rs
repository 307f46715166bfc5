//! Pattern matcher
//!
//! Tables are checked in priority order and the first table with any
//! substring hit wins, returning every matching entry of that table.
//! "좋은 하루" is handled ahead of the generic h-liaison table because it
//! chains two sound changes in one phrase.

use pronunciation_core::{PatternEntry, PatternMatch, PatternType};

use crate::patterns::PatternTables;

/// Spellings that trigger the combined liaison-and-weakening explanation
const GOOD_DAY_PHRASES: [&str; 2] = ["좋은 하루", "좋은하루"];

/// Entry reported for "좋은 하루"
pub fn good_day_entry() -> PatternEntry {
    PatternEntry::new("좋은 하루", "조은 아루")
        .with_romanized("Jo-eun a-ru bo-nae-se-yo")
        .with_rule("ᄒ Liaison and Weakening")
        .with_explanation(
            "\"좋은\" ('ᄒ' liaison) → \"조은\"\n\"하루\" ('ᄒ' weakening) → \"아루\"",
        )
}

fn table_hits(text: &str, table: &[PatternEntry]) -> Vec<PatternEntry> {
    table
        .iter()
        .filter(|entry| text.contains(entry.pattern.as_str()))
        .cloned()
        .collect()
}

/// Match `text` against the tables
pub fn match_patterns(text: &str, tables: &PatternTables) -> PatternMatch {
    let tensification = table_hits(text, &tables.tensification_patterns);
    if !tensification.is_empty() {
        return PatternMatch {
            pattern_type: PatternType::Tensification,
            matches: tensification,
        };
    }

    let h_liaison = table_hits(text, &tables.h_liaison_patterns);

    if GOOD_DAY_PHRASES.iter().any(|p| text.contains(p)) {
        let mut matches = vec![good_day_entry()];
        matches.extend(h_liaison);
        return PatternMatch {
            pattern_type: PatternType::HLiaison,
            matches,
        };
    }

    if !h_liaison.is_empty() {
        return PatternMatch {
            pattern_type: PatternType::HLiaison,
            matches: h_liaison,
        };
    }

    let vowel = table_hits(text, &tables.vowel_confusion_patterns);
    if !vowel.is_empty() {
        return PatternMatch {
            pattern_type: PatternType::VowelConfusion,
            matches: vowel,
        };
    }

    PatternMatch::none()
}
