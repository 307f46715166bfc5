//! Pattern tables
//!
//! Three literal-substring tables loaded once at startup. A missing or
//! malformed file degrades to a small built-in table instead of failing.

use pronunciation_core::{PatternEntry, PatternType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Pattern tables as stored in `korean_pronunciation_patterns.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternTables {
    pub tensification_patterns: Vec<PatternEntry>,
    pub h_liaison_patterns: Vec<PatternEntry>,
    #[serde(default)]
    pub vowel_confusion_patterns: Vec<PatternEntry>,
}

/// Where the active tables came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSource {
    File(PathBuf),
    Default,
}

impl fmt::Display for PatternSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternSource::File(path) => write!(f, "file:{}", path.display()),
            PatternSource::Default => f.write_str("default"),
        }
    }
}

impl PatternTables {
    /// Built-in fallback set
    pub fn defaults() -> Self {
        Self {
            tensification_patterns: vec![
                PatternEntry::new("만나서 반갑습니다", "만나서 빤갑습니다")
                    .with_romanized("Man-na-seo ppan-gap-seum-ni-da"),
                PatternEntry::new("반갑습니다", "빤갑습니다")
                    .with_romanized("Ppan-gap-seum-ni-da"),
            ],
            h_liaison_patterns: vec![
                PatternEntry::new("좋은", "조은"),
                PatternEntry::new("하루", "아루"),
            ],
            vowel_confusion_patterns: vec![
                PatternEntry::new("여보세요", "여보세요").with_incorrect("여보세여"),
            ],
        }
    }

    /// Read and parse a pattern file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        let tables: PatternTables = serde_json::from_str(&content)
            .map_err(|e| format!("failed to parse {}: {}", path.display(), e))?;
        Ok(tables.without_blank_patterns())
    }

    /// Load from `path`, falling back to [`PatternTables::defaults`] on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> (Self, PatternSource) {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(tables) => {
                tracing::info!(
                    path = %path.display(),
                    tensification = tables.tensification_patterns.len(),
                    h_liaison = tables.h_liaison_patterns.len(),
                    vowel_confusion = tables.vowel_confusion_patterns.len(),
                    "Loaded pronunciation patterns"
                );
                (tables, PatternSource::File(path.to_path_buf()))
            }
            Err(error) => {
                tracing::warn!(
                    path = %path.display(),
                    %error,
                    "Pattern file unavailable, using built-in defaults"
                );
                (Self::defaults(), PatternSource::Default)
            }
        }
    }

    pub fn table(&self, pattern_type: PatternType) -> &[PatternEntry] {
        match pattern_type {
            PatternType::Tensification => &self.tensification_patterns,
            PatternType::HLiaison => &self.h_liaison_patterns,
            PatternType::VowelConfusion => &self.vowel_confusion_patterns,
            PatternType::None => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.tensification_patterns.len()
            + self.h_liaison_patterns.len()
            + self.vowel_confusion_patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // An empty pattern is a substring of every transcription
    fn without_blank_patterns(mut self) -> Self {
        for table in [
            &mut self.tensification_patterns,
            &mut self.h_liaison_patterns,
            &mut self.vowel_confusion_patterns,
        ] {
            let before = table.len();
            table.retain(|e| !e.pattern.trim().is_empty());
            if table.len() != before {
                tracing::warn!(dropped = before - table.len(), "Ignoring blank pattern entries");
            }
        }
        self
    }
}
