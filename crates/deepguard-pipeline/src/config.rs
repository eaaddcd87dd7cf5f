//! Pipeline timing and capacity configuration.

use std::time::Duration;

use deepguard_core::{defaults, Error, Result};
use tracing::warn;

/// Configuration shared by the three pipelines.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Delay from media submission to `analyzing`.
    pub media_analyze_delay_ms: u64,
    /// Delay from `analyzing` to `completed`.
    pub media_complete_delay_ms: u64,
    /// Delay from session submission to `active`/`blocked`.
    pub session_load_delay_ms: u64,
    /// Delay from session `completed` to removal.
    pub session_linger_ms: u64,
    /// Alert ticker period.
    pub alert_interval_ms: u64,
    /// Maximum alerts kept in the stream.
    pub alert_capacity: usize,
    /// Whether live monitoring starts enabled.
    pub monitoring_enabled: bool,
    pub media_real_probability: f64,
    pub session_secure_probability: f64,
    pub alert_raise_probability: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            media_analyze_delay_ms: defaults::MEDIA_ANALYZE_DELAY_MS,
            media_complete_delay_ms: defaults::MEDIA_COMPLETE_DELAY_MS,
            session_load_delay_ms: defaults::SESSION_LOAD_DELAY_MS,
            session_linger_ms: defaults::SESSION_LINGER_MS,
            alert_interval_ms: defaults::ALERT_TICK_INTERVAL_MS,
            alert_capacity: defaults::ALERT_STREAM_CAPACITY,
            monitoring_enabled: true,
            media_real_probability: defaults::MEDIA_REAL_PROBABILITY,
            session_secure_probability: defaults::SESSION_SECURE_PROBABILITY,
            alert_raise_probability: defaults::ALERT_RAISE_PROBABILITY,
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    parse_u64_or(key, std::env::var(key).ok().as_deref(), default)
}

/// Parse a raw config value, falling back to `default` with a warning when
/// it is present but not a valid `u64`.
fn parse_u64_or(key: &str, raw: Option<&str>, default: u64) -> u64 {
    let Some(v) = raw else {
        return default;
    };
    v.trim().parse::<u64>().unwrap_or_else(|_| {
        warn!(key, value = %v, default, "Ignoring unparsable config value");
        default
    })
}

impl PipelineConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `DEEPGUARD_MEDIA_ANALYZE_DELAY_MS` | `1000` | Upload → analyzing |
    /// | `DEEPGUARD_MEDIA_COMPLETE_DELAY_MS` | `2000` | Analyzing → completed |
    /// | `DEEPGUARD_SESSION_LOAD_DELAY_MS` | `2000` | Loading → active/blocked |
    /// | `DEEPGUARD_SESSION_LINGER_MS` | `3000` | Completed → removed |
    /// | `DEEPGUARD_ALERT_INTERVAL_MS` | `8000` | Alert ticker period |
    /// | `DEEPGUARD_ALERT_CAPACITY` | `10` | Alert stream length cap |
    /// | `DEEPGUARD_MONITORING_ENABLED` | `true` | Start with live monitoring on |
    pub fn from_env() -> Self {
        let d = Self::default();

        let monitoring_enabled = std::env::var("DEEPGUARD_MONITORING_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(d.monitoring_enabled);

        let alert_capacity = env_u64("DEEPGUARD_ALERT_CAPACITY", d.alert_capacity as u64)
            .max(1) as usize;

        Self {
            media_analyze_delay_ms: env_u64(
                "DEEPGUARD_MEDIA_ANALYZE_DELAY_MS",
                d.media_analyze_delay_ms,
            ),
            media_complete_delay_ms: env_u64(
                "DEEPGUARD_MEDIA_COMPLETE_DELAY_MS",
                d.media_complete_delay_ms,
            ),
            session_load_delay_ms: env_u64(
                "DEEPGUARD_SESSION_LOAD_DELAY_MS",
                d.session_load_delay_ms,
            ),
            session_linger_ms: env_u64("DEEPGUARD_SESSION_LINGER_MS", d.session_linger_ms),
            alert_interval_ms: env_u64("DEEPGUARD_ALERT_INTERVAL_MS", d.alert_interval_ms),
            alert_capacity,
            monitoring_enabled,
            ..d
        }
    }

    /// Set both media phase delays.
    pub fn with_media_delays(mut self, analyze_ms: u64, complete_ms: u64) -> Self {
        self.media_analyze_delay_ms = analyze_ms;
        self.media_complete_delay_ms = complete_ms;
        self
    }

    /// Set session load delay and linger.
    pub fn with_session_delays(mut self, load_ms: u64, linger_ms: u64) -> Self {
        self.session_load_delay_ms = load_ms;
        self.session_linger_ms = linger_ms;
        self
    }

    pub fn with_alert_interval(mut self, ms: u64) -> Self {
        self.alert_interval_ms = ms;
        self
    }

    pub fn with_alert_capacity(mut self, capacity: usize) -> Self {
        self.alert_capacity = capacity.max(1);
        self
    }

    pub fn with_monitoring_enabled(mut self, enabled: bool) -> Self {
        self.monitoring_enabled = enabled;
        self
    }

    /// Divide every delay by `speed` (for demos). Non-positive speeds are
    /// ignored. Delays never drop below 1ms so the ticker period stays valid.
    pub fn scaled(mut self, speed: f64) -> Self {
        if !(speed.is_finite() && speed > 0.0) {
            return self;
        }
        let scale = |ms: u64| ((ms as f64 / speed).round() as u64).max(1);
        self.media_analyze_delay_ms = scale(self.media_analyze_delay_ms);
        self.media_complete_delay_ms = scale(self.media_complete_delay_ms);
        self.session_load_delay_ms = scale(self.session_load_delay_ms);
        self.session_linger_ms = scale(self.session_linger_ms);
        self.alert_interval_ms = scale(self.alert_interval_ms);
        self
    }

    /// Reject probabilities outside `[0, 1]` and an empty alert stream.
    pub fn validate(&self) -> Result<()> {
        let probabilities = [
            ("media_real_probability", self.media_real_probability),
            ("session_secure_probability", self.session_secure_probability),
            ("alert_raise_probability", self.alert_raise_probability),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::Config(format!("{name} must be within [0, 1], got {p}")));
            }
        }
        if self.alert_capacity == 0 {
            return Err(Error::Config("alert_capacity must be positive".to_string()));
        }
        Ok(())
    }

    pub fn media_analyze_delay(&self) -> Duration {
        Duration::from_millis(self.media_analyze_delay_ms)
    }

    pub fn media_complete_delay(&self) -> Duration {
        Duration::from_millis(self.media_complete_delay_ms)
    }

    pub fn session_load_delay(&self) -> Duration {
        Duration::from_millis(self.session_load_delay_ms)
    }

    pub fn session_linger(&self) -> Duration {
        Duration::from_millis(self.session_linger_ms)
    }

    /// Alert ticker period; never zero.
    pub fn alert_interval(&self) -> Duration {
        Duration::from_millis(self.alert_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = PipelineConfig::default();
        assert_eq!(config.media_analyze_delay_ms, 1_000);
        assert_eq!(config.media_complete_delay_ms, 2_000);
        assert_eq!(config.session_load_delay_ms, 2_000);
        assert_eq!(config.session_linger_ms, 3_000);
        assert_eq!(config.alert_interval_ms, 8_000);
        assert_eq!(config.alert_capacity, 10);
        assert!(config.monitoring_enabled);
        assert_eq!(config.media_real_probability, 0.7);
        assert_eq!(config.session_secure_probability, 0.7);
        assert_eq!(config.alert_raise_probability, 0.3);
    }

    #[test]
    fn test_config_builder_chaining() {
        let config = PipelineConfig::default()
            .with_media_delays(10, 20)
            .with_session_delays(30, 40)
            .with_alert_interval(50)
            .with_alert_capacity(3)
            .with_monitoring_enabled(false);

        assert_eq!(config.media_analyze_delay(), Duration::from_millis(10));
        assert_eq!(config.media_complete_delay(), Duration::from_millis(20));
        assert_eq!(config.session_load_delay(), Duration::from_millis(30));
        assert_eq!(config.session_linger(), Duration::from_millis(40));
        assert_eq!(config.alert_interval(), Duration::from_millis(50));
        assert_eq!(config.alert_capacity, 3);
        assert!(!config.monitoring_enabled);
    }

    #[test]
    fn test_unparsable_value_falls_back_to_default() {
        let key = "DEEPGUARD_ALERT_INTERVAL_MS";
        assert_eq!(parse_u64_or(key, None, 8_000), 8_000);
        assert_eq!(parse_u64_or(key, Some(" 250 "), 8_000), 250);
        assert_eq!(parse_u64_or(key, Some("soon"), 8_000), 8_000);
        assert_eq!(parse_u64_or(key, Some("-5"), 8_000), 8_000);
    }

    #[test]
    fn test_config_alert_capacity_floor() {
        let config = PipelineConfig::default().with_alert_capacity(0);
        assert_eq!(config.alert_capacity, 1);
    }

    #[test]
    fn test_config_alert_interval_never_zero() {
        let config = PipelineConfig::default().with_alert_interval(0);
        assert_eq!(config.alert_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_config_validate() {
        assert!(PipelineConfig::default().validate().is_ok());

        let bad = PipelineConfig {
            alert_raise_probability: 1.5,
            ..Default::default()
        };
        let err = bad.validate().unwrap_err();
        assert!(err.to_string().contains("alert_raise_probability"));

        let empty = PipelineConfig {
            alert_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(empty.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_config_scaled() {
        let config = PipelineConfig::default().scaled(10.0);
        assert_eq!(config.media_analyze_delay_ms, 100);
        assert_eq!(config.media_complete_delay_ms, 200);
        assert_eq!(config.session_linger_ms, 300);
        assert_eq!(config.alert_interval_ms, 800);
    }

    #[test]
    fn test_config_scaled_ignores_bad_speed() {
        let base = PipelineConfig::default();
        assert_eq!(base.clone().scaled(0.0), base);
        assert_eq!(base.clone().scaled(-2.0), base);
        assert_eq!(base.clone().scaled(f64::NAN), base);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Only asserts on keys no other test sets.
        let config = PipelineConfig::from_env();
        assert!(config.alert_capacity >= 1);
        assert_eq!(config.media_real_probability, 0.7);
    }
}
