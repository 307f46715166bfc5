//! Default values shared across crates

/// Service endpoints
pub mod endpoints {
    /// OpenAI API base (chat, embeddings and transcription)
    pub const OPENAI_DEFAULT: &str = "https://api.openai.com/v1";

    /// Ollama endpoint for local reasoning/embedding
    pub const OLLAMA_DEFAULT: &str = "http://localhost:11434";
}

/// Model defaults
pub mod models {
    pub const REASONING_DEFAULT: &str = "gpt-4o";

    pub const EMBEDDING_DEFAULT: &str = "text-embedding-3-small";

    /// Output dimension of `text-embedding-3-small`
    pub const EMBEDDING_DIM_DEFAULT: usize = 1536;

    pub const TRANSCRIPTION_DEFAULT: &str = "whisper-1";

    /// Low temperature keeps verdicts stable across calls
    pub const TEMPERATURE_DEFAULT: f32 = 0.1;
}

/// Timeouts (seconds)
pub mod timeouts {
    pub const HTTP_REQUEST_SECS: u64 = 120;

    pub const REASONING_SECS: u64 = 60;

    pub const EMBEDDING_SECS: u64 = 30;

    pub const TRANSCRIPTION_SECS: u64 = 60;
}

/// Retrieval defaults
pub mod rag {
    /// Chunk size in characters
    pub const CHUNK_SIZE: usize = 1000;

    /// Characters shared between neighbouring chunks
    pub const CHUNK_OVERLAP: usize = 200;

    pub const DEFAULT_TOP_K: usize = 4;
}

/// Static data files
pub mod data {
    pub const DATA_DIR: &str = "data";

    pub const RULES_FILE: &str = "korean_pronunciation_rules.json";

    pub const PATTERNS_FILE: &str = "korean_pronunciation_patterns.json";
}

/// Upload limits
pub mod upload {
    /// Transcription providers reject files above 25 MiB
    pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;
}
