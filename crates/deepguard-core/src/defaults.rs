//! Centralized default constants for the DeepGuard simulation.
//!
//! **This module is the single source of truth** for timing, probability and
//! capacity constants. The probabilities and confidence band are demo values
//! carried over literally; they do not describe a real detector.

// =============================================================================
// MEDIA VERIFICATION
// =============================================================================

/// Delay from submission until a media item moves to `analyzing`.
pub const MEDIA_ANALYZE_DELAY_MS: u64 = 1_000;

/// Delay from `analyzing` until a media item completes.
pub const MEDIA_COMPLETE_DELAY_MS: u64 = 2_000;

/// Probability that a completed media item is classified as real.
pub const MEDIA_REAL_PROBABILITY: f64 = 0.7;

// =============================================================================
// CONFIDENCE
// =============================================================================

/// Lower bound (inclusive) of the synthetic confidence band.
pub const CONFIDENCE_MIN: i64 = 80;

/// Upper bound (exclusive) of the synthetic confidence band.
pub const CONFIDENCE_MAX_EXCLUSIVE: i64 = 100;

// =============================================================================
// SECURE BROWSER
// =============================================================================

/// Delay from submission until a sandbox session finishes loading.
pub const SESSION_LOAD_DELAY_MS: u64 = 2_000;

/// How long a completed session lingers before it is removed.
pub const SESSION_LINGER_MS: u64 = 3_000;

/// Probability that the creation-time security check passes.
pub const SESSION_SECURE_PROBABILITY: f64 = 0.7;

/// Minimum threat count assigned to a blocked session.
pub const SESSION_THREATS_MIN: i64 = 1;

/// Maximum threat count (inclusive) assigned to a blocked session.
pub const SESSION_THREATS_MAX: i64 = 5;

/// Minimum recorded session duration in minutes.
pub const SESSION_DURATION_MIN_MINUTES: i64 = 5;

/// Maximum recorded session duration in minutes (inclusive).
pub const SESSION_DURATION_MAX_MINUTES: i64 = 34;

// =============================================================================
// LIVE MONITORING
// =============================================================================

/// Interval between alert ticker firings.
pub const ALERT_TICK_INTERVAL_MS: u64 = 8_000;

/// Probability that a tick raises a new alert.
pub const ALERT_RAISE_PROBABILITY: f64 = 0.3;

/// Maximum number of alerts kept in the stream.
pub const ALERT_STREAM_CAPACITY: usize = 10;

/// Messages a synthetic alert may carry.
pub const ALERT_MESSAGES: [&str; 4] = [
    "New deepfake pattern detected in media stream",
    "Suspicious domain accessed via secure browser",
    "Anomalous behavior detected in user session",
    "Potential threat identified in uploaded content",
];

/// Sources a synthetic alert may be attributed to.
pub const ALERT_SOURCES: [&str; 4] = [
    "Media Scanner",
    "Secure Browser",
    "System Monitor",
    "Threat Detection",
];

// =============================================================================
// EVENTS & EXPORT
// =============================================================================

/// Default event bus broadcast channel capacity.
pub const EVENT_BUS_CAPACITY: usize = 256;

/// File name offered for the report CSV download.
pub const REPORT_EXPORT_FILENAME: &str = "deepguard-reports.csv";
