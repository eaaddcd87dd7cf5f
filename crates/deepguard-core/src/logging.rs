//! Structured logging field name constants.
//!
//! Every crate uses these names as `tracing` fields so log output can be
//! queried consistently across pipelines.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | WARN  | Recoverable issue, fallback applied (bad env value) |
//! | INFO  | Lifecycle events (submission, monitoring start/stop, export) |
//! | DEBUG | Phase transitions, synthetic decisions |
//! | TRACE | Per-tick detail, skipped scheduled mutations |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Pipeline originating the log event.
/// Values: "media", "browser", "monitor"
pub const PIPELINE: &str = "pipeline";

/// Logical operation name.
/// Examples: "submit", "close", "acknowledge", "tick"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Work item UUID being operated on.
pub const ITEM_ID: &str = "item_id";

/// Work item kind.
pub const ITEM_KIND: &str = "item_kind";

/// Phase the item moved into.
pub const PHASE: &str = "phase";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Delay before a scheduled mutation, in milliseconds.
pub const DELAY_MS: &str = "delay_ms";

/// Number of items in a collection after a mutation.
pub const COLLECTION_LEN: &str = "collection_len";

/// Number of rows written by an export.
pub const ROW_COUNT: &str = "row_count";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Verdict assigned at completion.
pub const VERDICT: &str = "verdict";

/// Confidence score assigned at completion.
pub const CONFIDENCE: &str = "confidence";
