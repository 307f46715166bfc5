//! Semantic rule retriever
//!
//! Chunks the rule corpus, embeds every chunk once and answers top-k
//! queries against the resulting in-memory index.

use async_trait::async_trait;
use pronunciation_core::{Embedder, PronunciationRule, Result, Retriever, RuleDocumentChunk};
use std::sync::Arc;
use std::time::Instant;

use crate::{RagError, RecursiveChunker, VectorDistance, VectorStore};

/// Retriever over the pronunciation rule corpus
pub struct RuleRetriever {
    embedder: Arc<dyn Embedder>,
    store: VectorStore,
}

impl RuleRetriever {
    /// Chunk, embed and index the corpus
    ///
    /// Fails when the corpus yields no chunks, when the embedding provider
    /// fails, or when it returns vectors of the wrong dimension.
    pub async fn build(
        rules: &[PronunciationRule],
        embedder: Arc<dyn Embedder>,
        chunker: &RecursiveChunker,
        distance: VectorDistance,
    ) -> std::result::Result<Self, RagError> {
        let start = Instant::now();
        let chunks = chunker.chunk_rules(rules);

        if chunks.is_empty() {
            return Err(RagError::Index(
                "Rule corpus produced no chunks to index".to_string(),
            ));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder
            .embed_batch(&texts)
            .await
            .map_err(|e| RagError::Embedding(e.to_string()))?;

        if vectors.len() != chunks.len() {
            return Err(RagError::Index(format!(
                "Embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let mut store = VectorStore::new(embedder.dim(), distance);
        for (chunk, vector) in chunks.into_iter().zip(vectors) {
            store.insert(chunk, vector)?;
        }

        tracing::info!(
            rules = rules.len(),
            chunks = store.len(),
            model = embedder.model_name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Rule index built"
        );

        Ok(Self { embedder, store })
    }

    pub fn store(&self) -> &VectorStore {
        &self.store
    }
}

#[async_trait]
impl Retriever for RuleRetriever {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RuleDocumentChunk>> {
        let query_vector = self.embedder.embed(query).await?;
        let hits = self.store.search(&query_vector, top_k)?;

        tracing::debug!(
            query_len = query.chars().count(),
            hits = hits.len(),
            top = hits.first().map(|c| c.rule_name.as_str()).unwrap_or(""),
            "Rule retrieval"
        );

        Ok(hits)
    }

    fn len(&self) -> usize {
        self.store.len()
    }

    fn name(&self) -> &str {
        "rule-retriever"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimpleEmbedder;
    use pronunciation_core::RuleExample;

    fn rule(name: &str, description: &str, word: &str, standard: &str) -> PronunciationRule {
        PronunciationRule {
            name: name.to_string(),
            description: description.to_string(),
            examples: vec![RuleExample {
                word: word.to_string(),
                standard: standard.to_string(),
                actual: word.to_string(),
            }],
        }
    }

    fn corpus() -> Vec<PronunciationRule> {
        vec![
            rule("Tensification", "Tense consonants after stops", "반갑습니다", "빤갑습니다"),
            rule("Nasal Assimilation", "Stops become nasals", "학년", "항년"),
            rule("ㅎ Weakening", "ㅎ weakens in casual speech", "하루", "아루"),
        ]
    }

    #[tokio::test]
    async fn test_build_and_retrieve() {
        let retriever = RuleRetriever::build(
            &corpus(),
            Arc::new(SimpleEmbedder::new(512)),
            &RecursiveChunker::default(),
            VectorDistance::Cosine,
        )
        .await
        .unwrap();

        assert_eq!(retriever.len(), 3);

        let hits = retriever.retrieve("만나서 반갑습니다", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].rule_name, "Tensification");
    }

    #[tokio::test]
    async fn test_retrieval_is_repeatable() {
        let retriever = RuleRetriever::build(
            &corpus(),
            Arc::new(SimpleEmbedder::new(256)),
            &RecursiveChunker::default(),
            VectorDistance::Cosine,
        )
        .await
        .unwrap();

        let first = retriever.retrieve("좋은 하루 보내세요", 3).await.unwrap();
        let second = retriever.retrieve("좋은 하루 보내세요", 3).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_empty_corpus_fails() {
        let result = RuleRetriever::build(
            &[],
            Arc::new(SimpleEmbedder::new(16)),
            &RecursiveChunker::default(),
            VectorDistance::Cosine,
        )
        .await;
        assert!(matches!(result, Err(RagError::Index(_))));
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(pronunciation_core::Error::Embedding("provider down".into()))
        }

        fn dim(&self) -> usize {
            4
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_embedding_failure_aborts_build() {
        let result = RuleRetriever::build(
            &corpus(),
            Arc::new(FailingEmbedder),
            &RecursiveChunker::default(),
            VectorDistance::Cosine,
        )
        .await;

        match result {
            Err(RagError::Embedding(msg)) => assert!(msg.contains("provider down")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("build should fail"),
        }
    }
}
