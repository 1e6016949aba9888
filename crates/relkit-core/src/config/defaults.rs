// Single source of truth for all default values.

// --- Storage ---
pub const DEFAULT_DB_FILENAME: &str = "relkit.db";
pub const DEFAULT_WAL_MODE: bool = true;
pub const DEFAULT_CACHE_SIZE: i64 = -64_000; // 64 MB (negative = KB)
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;
pub const DEFAULT_FOREIGN_KEYS: bool = true;

// --- Consolidation ---
pub const DEFAULT_OVERWRITE: bool = false;
pub const DEFAULT_CONSOLIDATE_RELATED_UNIQUES: bool = false;
pub const DEFAULT_MAX_DISCOVERY_DEPTH: usize = 64;

// --- Upsert ---
pub const DEFAULT_EMPTY_LISTS_ARE_NULL: bool = true;
pub const DEFAULT_SEARCH_NULLS: bool = false;
pub const DEFAULT_SAVE_NULLS: bool = false;

// --- Chunking ---
pub const DEFAULT_CHUNK_SIZE: usize = 100;

// --- Similarity ---
pub const DEFAULT_MIN_FUZZY_RATIO: u32 = 90;
pub const DEFAULT_MAX_PARTIAL_DIFFERENCE: u32 = 10;
pub const DEFAULT_MAX_LEVENSHTEIN_DIFFERENCE: f64 = 0.2;
pub const DEFAULT_MIN_TFIDF_SIMILARITY: f64 = 0.9;
pub const DEFAULT_MIN_TRIGRAM_SIMILARITY: f64 = 0.9;
pub const DEFAULT_MAX_SEARCH_RESULTS: usize = 250;
pub const DEFAULT_MIN_SEARCH_RANK: f64 = 0.0;

// --- Cache ---
pub const DEFAULT_CACHE_TIMEOUT_SECS: u64 = 300; // 5 minutes
pub const DEFAULT_CACHE_MAX_CAPACITY: u64 = 10_000;
pub const DEFAULT_HASH_KEYS: bool = false;

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_ENV_VAR: &str = "RELKIT_LOG";
