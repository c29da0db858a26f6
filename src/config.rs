// IMPORTANT:
// Keep ALL numeric values centralized here (repo rule: no hardcoded numeric values scattered around).

// NOTE: VERSION must stay in sync with the `version` field in Cargo.toml.
pub const VERSION: &str = "0.1.0";

pub mod logging {
    pub const LOG_DIR_REL: &str = ".patent-graph/logs";
    pub const LOG_FILE_NAME: &str = "patent_graph.log";
    pub const DEFAULT_LEVEL: &str = "info";

    pub const LOG_ROTATE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
    pub const LOG_ROTATE_KEEP_FILES: usize = 5;
}

pub mod chunking {
    pub const DEFAULT_CHUNK_SIZE_TOKENS: usize = 500;
    pub const DEFAULT_CHUNK_OVERLAP_TOKENS: usize = 50;

    // Chunk ids are "<source>_chunk_<position>", position zero-padded to this width.
    pub const CHUNK_ID_POSITION_WIDTH: usize = 3;
}

pub mod embedding {
    // Instruction prefixes for asymmetric retrieval (nomic-embed-text convention).
    pub const DOCUMENT_PREFIX: &str = "search_document: ";
    pub const QUERY_PREFIX: &str = "search_query: ";

    pub const DEFAULT_BATCH_SIZE: usize = 16;

    // Local provider: all-MiniLM-L6-v2 on candle.
    pub const LOCAL_EMBEDDING_DIMS: usize = 384;
    pub const LOCAL_MODEL_NAME: &str = "all-MiniLM-L6-v2";

    // Max word-piece tokens for all-MiniLM-L6-v2 (model context limit is 256).
    pub const LOCAL_MAX_TOKENS: usize = 256;
    // [CLS] + [SEP].
    pub const LOCAL_SPECIAL_TOKENS: usize = 2;
    // Word pieces of DOCUMENT_PREFIX under the MiniLM vocabulary: "search" "_" "document" ":".
    pub const LOCAL_PREFIX_TOKENS: usize = 4;
    pub const LOCAL_MAX_CHUNK_TOKENS: usize = LOCAL_MAX_TOKENS - LOCAL_SPECIAL_TOKENS - LOCAL_PREFIX_TOKENS;
    pub const LOCAL_DEFAULT_CHUNK_SIZE_TOKENS: usize = 200;

    pub const MODEL_CDN_BASE: &str =
        "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main";

    // SHA256 hashes for integrity verification
    pub const MODEL_SAFETENSORS_SHA256: &str =
        "53aa51172d142c89d9012cce15ae4d6cc0ca6895895114379cacb4fab128d9db";
    pub const TOKENIZER_JSON_SHA256: &str =
        "be50c3628f2bf5bb5e3a7f17b1f74611b2561a3a27eeab05e5aa30f411572037";
    pub const CONFIG_JSON_SHA256: &str =
        "953f9c0d463486b10a6871cc2fd59f223b2c70184f49815e7efbcab5d8908b41";

    // Local model storage directory (relative to home)
    pub const MODEL_DIR_REL: &str = ".patent-graph/models/all-MiniLM-L6-v2";
    pub const DOWNLOAD_TIMEOUT_SECS: u64 = 90;
}

pub mod ollama {
    pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
    pub const DEFAULT_MODEL: &str = "nomic-embed-text";
    pub const DEFAULT_EMBEDDING_DIMS: usize = 768;
    pub const EMBED_PATH: &str = "/api/embed";
    pub const REQUEST_TIMEOUT_SECS: u64 = 120;
}

pub mod neo4j {
    pub const DEFAULT_URI: &str = "http://localhost:7474";
    pub const DEFAULT_USER: &str = "neo4j";
    pub const DEFAULT_DATABASE: &str = "neo4j";
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;

    pub const VECTOR_INDEX_NAME: &str = "evidence_embedding";
}

pub mod sqlite {
    pub const DEFAULT_DB_FILE: &str = "patent_graph.db";

    pub const PRAGMA_BUSY_TIMEOUT_MS: i64 = 2000;
    pub const PRAGMA_CACHE_SIZE_KIB_NEG: i64 = -64000;
    pub const PRAGMA_MMAP_SIZE_BYTES: i64 = 268_435_456;
}

pub mod search {
    pub const DEFAULT_TOP_K: i64 = 5;
}
