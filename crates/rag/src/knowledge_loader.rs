//! Rule Corpus Loader
//!
//! Loads the static phonological rule knowledge base from a JSON or YAML
//! document with a top-level `rules` array.

use pronunciation_core::PronunciationRule;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

use crate::RagError;

/// Read-only rule corpus, loaded once at startup
#[derive(Debug, Clone, Default)]
pub struct RuleCorpus {
    rules: Vec<PronunciationRule>,
}

impl RuleCorpus {
    /// Load the corpus from a file
    ///
    /// YAML is used for `.yaml`/`.yml` files, JSON otherwise. A document
    /// without a `rules` array fails with [`RagError::CorpusFormat`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RagError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| RagError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let document: Value = match extension {
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .map_err(|e| RagError::CorpusFormat(format!("{}: {}", path.display(), e)))?,
            _ => serde_json::from_str(&content)
                .map_err(|e| RagError::CorpusFormat(format!("{}: {}", path.display(), e)))?,
        };

        let corpus = Self::from_value(document)?;

        tracing::info!(
            file = %path.display(),
            rules = corpus.len(),
            "Loaded pronunciation rule corpus"
        );

        Ok(corpus)
    }

    /// Build the corpus from an already-parsed document
    pub fn from_value(document: Value) -> Result<Self, RagError> {
        let entries = document
            .get("rules")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                RagError::CorpusFormat("document does not contain a `rules` array".to_string())
            })?;

        let rules = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                serde_json::from_value::<PronunciationRule>(entry.clone())
                    .map_err(|e| RagError::CorpusFormat(format!("rules[{}]: {}", i, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_rules(rules))
    }

    pub fn from_rules(rules: Vec<PronunciationRule>) -> Self {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.name.as_str()) {
                tracing::warn!(rule = %rule.name, "Duplicate rule name in corpus; lookups return the first");
            }
        }
        Self { rules }
    }

    /// All rules in corpus order
    pub fn all(&self) -> &[PronunciationRule] {
        &self.rules
    }

    /// Look up a rule by exact name
    pub fn find(&self, name: &str) -> Option<&PronunciationRule> {
        self.rules.iter().find(|rule| rule.name == name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    const CORPUS_JSON: &str = r#"{
        "rules": [
            {
                "name": "Tensification",
                "description": "Plain consonants become tense after a stop.",
                "examples": [{"word": "학교", "standard": "학꾜", "actual": "학교"}]
            },
            {
                "name": "Liaison",
                "description": "Final consonant moves to the next vowel-initial syllable.",
                "examples": []
            }
        ]
    }"#;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_json_corpus() {
        let file = write_temp(".json", CORPUS_JSON);
        let corpus = RuleCorpus::load(file.path()).unwrap();

        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.all()[0].name, "Tensification");
        assert_eq!(corpus.all()[0].examples[0].standard, "학꾜");
    }

    #[test]
    fn test_load_yaml_corpus() {
        let yaml = "rules:\n  - name: ㅎ Weakening\n    description: ㅎ is weakened in casual speech.\n    examples:\n      - word: 하루\n        standard: 하루\n        actual: 아루\n";
        let file = write_temp(".yaml", yaml);
        let corpus = RuleCorpus::load(file.path()).unwrap();

        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.all()[0].examples[0].actual, "아루");
    }

    #[test]
    fn test_missing_rules_array_is_format_error() {
        let file = write_temp(".json", r#"{"rules": {"name": "not an array"}}"#);
        assert!(matches!(
            RuleCorpus::load(file.path()),
            Err(RagError::CorpusFormat(_))
        ));

        let file = write_temp(".json", r#"{"patterns": []}"#);
        assert!(matches!(
            RuleCorpus::load(file.path()),
            Err(RagError::CorpusFormat(_))
        ));
    }

    #[test]
    fn test_malformed_rule_is_format_error() {
        let err = RuleCorpus::from_value(serde_json::json!({"rules": [{"description": "no name"}]}))
            .unwrap_err();
        assert!(err.to_string().contains("rules[0]"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            RuleCorpus::load("/nonexistent/korean_pronunciation_rules.json"),
            Err(RagError::Io { .. })
        ));
    }

    #[test]
    fn test_find_by_name() {
        let corpus = RuleCorpus::from_value(serde_json::from_str(CORPUS_JSON).unwrap()).unwrap();

        assert_eq!(
            corpus.find("Liaison").map(|r| r.description.as_str()),
            Some("Final consonant moves to the next vowel-initial syllable.")
        );
        assert!(corpus.find("liaison").is_none());
    }
}
