//! Runtime settings
//!
//! Tunables of the routing pipeline. Domain documents say *what* a vertical
//! looks like; these settings say *how* scores are combined and decided.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - lints are only logged
    #[default]
    Development,
    Staging,
    /// Production mode - lints are also logged, JSON logs by default
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main router settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RouterSettings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub domain: DomainSettings,

    #[serde(default)]
    pub thresholds: ThresholdSettings,

    #[serde(default)]
    pub tuning: TuningSettings,

    #[serde(default)]
    pub adapter: AdapterSettings,

    #[serde(default)]
    pub context: ContextSettings,

    #[serde(default)]
    pub validator: ValidatorSettings,

    #[serde(default)]
    pub decomposition: DecompositionSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Where domain documents are found
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainSettings {
    /// Root holding base/defaults.yaml and domains/{id}/domain.yaml
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,
    /// Domain activated at startup
    #[serde(default = "default_domain_id")]
    pub default_domain: String,
    /// Longest tolerated synonym cycle
    #[serde(default = "default_max_synonym_cycle")]
    pub max_synonym_cycle: usize,
}

fn default_config_dir() -> PathBuf {
    PathBuf::from("config")
}

fn default_domain_id() -> String {
    "retail".to_string()
}

fn default_max_synonym_cycle() -> usize {
    2
}

impl Default for DomainSettings {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            default_domain: default_domain_id(),
            max_synonym_cycle: default_max_synonym_cycle(),
        }
    }
}

/// Initial confidence thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSettings {
    #[serde(default = "default_high")]
    pub high: f64,
    #[serde(default = "default_medium")]
    pub medium: f64,
    #[serde(default = "default_low")]
    pub low: f64,
    #[serde(default = "default_validation_floor")]
    pub validation_floor: f64,
}

fn default_high() -> f64 {
    0.75
}

fn default_medium() -> f64 {
    0.55
}

fn default_low() -> f64 {
    0.4
}

fn default_validation_floor() -> f64 {
    0.2
}

impl Default for ThresholdSettings {
    fn default() -> Self {
        Self {
            high: default_high(),
            medium: default_medium(),
            low: default_low(),
            validation_floor: default_validation_floor(),
        }
    }
}

/// Feedback-driven threshold tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TuningSettings {
    /// Batches with a success rate below this tighten thresholds
    #[serde(default = "default_raise_below")]
    pub raise_below: f64,
    /// Batches with a success rate above this relax thresholds
    #[serde(default = "default_lower_above")]
    pub lower_above: f64,
    #[serde(default = "default_raise_step")]
    pub raise_step: f64,
    #[serde(default = "default_lower_step")]
    pub lower_step: f64,
    #[serde(default = "default_high_cap")]
    pub high_cap: f64,
    #[serde(default = "default_medium_cap")]
    pub medium_cap: f64,
    #[serde(default = "default_high_floor")]
    pub high_floor: f64,
    #[serde(default = "default_medium_floor")]
    pub medium_floor: f64,
    /// Batches smaller than this are ignored
    #[serde(default = "default_min_batch_size")]
    pub min_batch_size: usize,
}

fn default_raise_below() -> f64 {
    0.85
}

fn default_lower_above() -> f64 {
    0.95
}

fn default_raise_step() -> f64 {
    0.05
}

fn default_lower_step() -> f64 {
    0.02
}

fn default_high_cap() -> f64 {
    0.95
}

fn default_medium_cap() -> f64 {
    0.85
}

fn default_high_floor() -> f64 {
    0.6
}

fn default_medium_floor() -> f64 {
    0.4
}

fn default_min_batch_size() -> usize {
    5
}

impl Default for TuningSettings {
    fn default() -> Self {
        Self {
            raise_below: default_raise_below(),
            lower_above: default_lower_above(),
            raise_step: default_raise_step(),
            lower_step: default_lower_step(),
            high_cap: default_high_cap(),
            medium_cap: default_medium_cap(),
            high_floor: default_high_floor(),
            medium_floor: default_medium_floor(),
            min_batch_size: default_min_batch_size(),
        }
    }
}

/// Vocabulary adapter and candidate generation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdapterSettings {
    /// How many ranked intents can produce candidates
    #[serde(default = "default_top_n_intents")]
    pub top_n_intents: usize,
    /// Intents at or below this score are ignored
    #[serde(default = "default_min_intent_score")]
    pub min_intent_score: f64,
    /// Weight of each additional matched intent
    #[serde(default = "default_secondary_intent_weight")]
    pub secondary_intent_weight: f64,
    /// Domain relevance when no domain term matched
    #[serde(default = "default_relevance_floor")]
    pub relevance_floor: f64,
    #[serde(default = "default_primary_term_weight")]
    pub primary_term_weight: f64,
    #[serde(default = "default_secondary_term_weight")]
    pub secondary_term_weight: f64,
    #[serde(default = "default_context_term_weight")]
    pub context_term_weight: f64,
    /// Multiplier added per matched boost term
    #[serde(default = "default_boost_step")]
    pub boost_step: f64,
    #[serde(default = "default_max_boost")]
    pub max_boost: f64,
    /// Multiplier removed per matched penalty term
    #[serde(default = "default_penalty_step")]
    pub penalty_step: f64,
    #[serde(default = "default_min_penalty_factor")]
    pub min_penalty_factor: f64,
    /// Avoid penalty = min(max, matched fraction × weight)
    #[serde(default = "default_avoid_penalty_weight")]
    pub avoid_penalty_weight: f64,
    #[serde(default = "default_max_avoid_penalty")]
    pub max_avoid_penalty: f64,
}

fn default_top_n_intents() -> usize {
    3
}

fn default_min_intent_score() -> f64 {
    0.05
}

fn default_secondary_intent_weight() -> f64 {
    0.5
}

fn default_relevance_floor() -> f64 {
    0.5
}

fn default_primary_term_weight() -> f64 {
    0.3
}

fn default_secondary_term_weight() -> f64 {
    0.2
}

fn default_context_term_weight() -> f64 {
    0.1
}

fn default_boost_step() -> f64 {
    0.1
}

fn default_max_boost() -> f64 {
    1.3
}

fn default_penalty_step() -> f64 {
    0.1
}

fn default_min_penalty_factor() -> f64 {
    0.7
}

fn default_avoid_penalty_weight() -> f64 {
    1.5
}

fn default_max_avoid_penalty() -> f64 {
    0.6
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            top_n_intents: default_top_n_intents(),
            min_intent_score: default_min_intent_score(),
            secondary_intent_weight: default_secondary_intent_weight(),
            relevance_floor: default_relevance_floor(),
            primary_term_weight: default_primary_term_weight(),
            secondary_term_weight: default_secondary_term_weight(),
            context_term_weight: default_context_term_weight(),
            boost_step: default_boost_step(),
            max_boost: default_max_boost(),
            penalty_step: default_penalty_step(),
            min_penalty_factor: default_min_penalty_factor(),
            avoid_penalty_weight: default_avoid_penalty_weight(),
            max_avoid_penalty: default_max_avoid_penalty(),
        }
    }
}

/// Dataset context enhancement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContextSettings {
    /// Required fields need at least this coverage to count as present
    #[serde(default = "default_coverage_floor")]
    pub coverage_floor: f64,
    /// Availability factor with no usable required field
    #[serde(default = "default_availability_floor")]
    pub availability_floor: f64,
    /// Minimum Jaccard similarity for a history match
    #[serde(default = "default_history_similarity")]
    pub history_similarity: f64,
    #[serde(default = "default_history_weight")]
    pub history_weight: f64,
    #[serde(default = "default_max_history_boost")]
    pub max_history_boost: f64,
    /// History success rate at which the boost starts; must not sit below
    /// `tuning.raise_below`
    #[serde(default = "default_history_min_success_rate")]
    pub history_min_success_rate: f64,
    /// Quality factor with zero average relevance
    #[serde(default = "default_quality_base")]
    pub quality_base: f64,
    /// Patterns kept in the routing history
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_coverage_floor() -> f64 {
    0.5
}

fn default_availability_floor() -> f64 {
    0.5
}

fn default_history_similarity() -> f64 {
    0.8
}

fn default_history_weight() -> f64 {
    0.3
}

fn default_max_history_boost() -> f64 {
    0.3
}

fn default_history_min_success_rate() -> f64 {
    0.85
}

fn default_quality_base() -> f64 {
    0.7
}

fn default_history_capacity() -> usize {
    10_000
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            coverage_floor: default_coverage_floor(),
            availability_floor: default_availability_floor(),
            history_similarity: default_history_similarity(),
            history_weight: default_history_weight(),
            max_history_boost: default_max_history_boost(),
            history_min_success_rate: default_history_min_success_rate(),
            quality_base: default_quality_base(),
            history_capacity: default_history_capacity(),
        }
    }
}

/// Query validator scoring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidatorSettings {
    /// Out-of-scope score at which a query is rejected outright
    #[serde(default = "default_out_of_scope_threshold")]
    pub out_of_scope_threshold: f64,
    /// Score contributed per rejection pattern hit
    #[serde(default = "default_pattern_hit_weight")]
    pub pattern_hit_weight: f64,
    /// How strongly domain relevance dampens the out-of-scope score
    #[serde(default = "default_relevance_dampening")]
    pub relevance_dampening: f64,
    /// Relevance below this is out of scope
    #[serde(default = "default_reject_relevance")]
    pub reject_relevance: f64,
    /// Relevance below this is borderline
    #[serde(default = "default_borderline_relevance")]
    pub borderline_relevance: f64,
}

fn default_out_of_scope_threshold() -> f64 {
    0.8
}

fn default_pattern_hit_weight() -> f64 {
    0.5
}

fn default_relevance_dampening() -> f64 {
    0.5
}

fn default_reject_relevance() -> f64 {
    0.1
}

fn default_borderline_relevance() -> f64 {
    0.3
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        Self {
            out_of_scope_threshold: default_out_of_scope_threshold(),
            pattern_hit_weight: default_pattern_hit_weight(),
            relevance_dampening: default_relevance_dampening(),
            reject_relevance: default_reject_relevance(),
            borderline_relevance: default_borderline_relevance(),
        }
    }
}

/// Compound query splitting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecompositionSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Connectors matched case-insensitively, longest first
    #[serde(default = "default_connectors")]
    pub connectors: Vec<String>,
    #[serde(default = "default_max_segments")]
    pub max_segments: usize,
}

fn default_true() -> bool {
    true
}

fn default_connectors() -> Vec<String> {
    vec![" and then ".into(), " then ".into(), ";".into(), " and also ".into()]
}

fn default_max_segments() -> usize {
    4
}

impl Default for DecompositionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            connectors: default_connectors(),
            max_segments: default_max_segments(),
        }
    }
}

/// Logging output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Fallback filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn check_unit(field: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            message: format!("Must be between 0.0 and 1.0, got {}", value),
        });
    }
    Ok(())
}

impl RouterSettings {
    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_thresholds()?;
        self.validate_tuning()?;
        self.validate_adapter()?;
        self.validate_context()?;
        self.validate_validator()?;

        if self.decomposition.max_segments == 0 {
            return Err(ConfigError::InvalidValue {
                field: "decomposition.max_segments".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    fn validate_thresholds(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        check_unit("thresholds.high", t.high)?;
        check_unit("thresholds.medium", t.medium)?;
        check_unit("thresholds.low", t.low)?;
        check_unit("thresholds.validation_floor", t.validation_floor)?;

        if !(t.validation_floor <= t.low && t.low <= t.medium && t.medium <= t.high) {
            return Err(ConfigError::InvalidValue {
                field: "thresholds".to_string(),
                message: format!(
                    "Expected validation_floor <= low <= medium <= high, got {} / {} / {} / {}",
                    t.validation_floor, t.low, t.medium, t.high
                ),
            });
        }
        Ok(())
    }

    fn validate_tuning(&self) -> Result<(), ConfigError> {
        let t = &self.tuning;
        check_unit("tuning.raise_below", t.raise_below)?;
        check_unit("tuning.lower_above", t.lower_above)?;
        check_unit("tuning.high_cap", t.high_cap)?;
        check_unit("tuning.medium_cap", t.medium_cap)?;
        check_unit("tuning.high_floor", t.high_floor)?;
        check_unit("tuning.medium_floor", t.medium_floor)?;

        if t.raise_below > t.lower_above {
            return Err(ConfigError::InvalidValue {
                field: "tuning.raise_below".to_string(),
                message: "Must not exceed tuning.lower_above".to_string(),
            });
        }
        if t.high_floor > t.high_cap || t.medium_floor > t.medium_cap {
            return Err(ConfigError::InvalidValue {
                field: "tuning".to_string(),
                message: "Floors must not exceed caps".to_string(),
            });
        }
        if !(0.0..=0.5).contains(&t.raise_step) || !(0.0..=0.5).contains(&t.lower_step) {
            return Err(ConfigError::InvalidValue {
                field: "tuning".to_string(),
                message: "Steps must be between 0.0 and 0.5".to_string(),
            });
        }
        Ok(())
    }

    fn validate_adapter(&self) -> Result<(), ConfigError> {
        let a = &self.adapter;
        if a.top_n_intents == 0 {
            return Err(ConfigError::InvalidValue {
                field: "adapter.top_n_intents".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }
        check_unit("adapter.min_intent_score", a.min_intent_score)?;
        check_unit("adapter.secondary_intent_weight", a.secondary_intent_weight)?;
        check_unit("adapter.relevance_floor", a.relevance_floor)?;
        check_unit("adapter.max_avoid_penalty", a.max_avoid_penalty)?;
        check_unit("adapter.min_penalty_factor", a.min_penalty_factor)?;
        if a.max_boost < 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "adapter.max_boost".to_string(),
                message: format!("Must be at least 1.0, got {}", a.max_boost),
            });
        }
        Ok(())
    }

    fn validate_context(&self) -> Result<(), ConfigError> {
        let c = &self.context;
        check_unit("context.coverage_floor", c.coverage_floor)?;
        check_unit("context.availability_floor", c.availability_floor)?;
        check_unit("context.history_similarity", c.history_similarity)?;
        check_unit("context.history_weight", c.history_weight)?;
        check_unit("context.max_history_boost", c.max_history_boost)?;
        check_unit("context.history_min_success_rate", c.history_min_success_rate)?;
        if c.history_min_success_rate < self.tuning.raise_below {
            return Err(ConfigError::InvalidValue {
                field: "context.history_min_success_rate".to_string(),
                message: format!(
                    "Must be at least tuning.raise_below ({}), got {}",
                    self.tuning.raise_below, c.history_min_success_rate
                ),
            });
        }
        check_unit("context.quality_base", c.quality_base)?;
        if c.history_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "context.history_capacity".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    fn validate_validator(&self) -> Result<(), ConfigError> {
        let v = &self.validator;
        check_unit("validator.out_of_scope_threshold", v.out_of_scope_threshold)?;
        check_unit("validator.pattern_hit_weight", v.pattern_hit_weight)?;
        check_unit("validator.relevance_dampening", v.relevance_dampening)?;
        check_unit("validator.reject_relevance", v.reject_relevance)?;
        check_unit("validator.borderline_relevance", v.borderline_relevance)?;
        if v.reject_relevance > v.borderline_relevance {
            return Err(ConfigError::InvalidValue {
                field: "validator.reject_relevance".to_string(),
                message: "Must not exceed validator.borderline_relevance".to_string(),
            });
        }
        Ok(())
    }

    /// Render as TOML, e.g. to seed a config/default.toml
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Load settings from the `config/` directory
///
/// Priority (highest to lowest):
/// 1. Environment variables (GEO_ROUTER prefix, `__` separator)
/// 2. config/{env}.{toml,yaml,json} (if env specified)
/// 3. config/default.{toml,yaml,json}
pub fn load_settings(env: Option<&str>) -> Result<RouterSettings, ConfigError> {
    load_settings_from(Path::new("config"), env)
}

/// Same as `load_settings` with an explicit settings directory
pub fn load_settings_from(dir: &Path, env: Option<&str>) -> Result<RouterSettings, ConfigError> {
    let mut builder = Config::builder();

    // Load default config
    let default_path = dir.join("default");
    builder = builder.add_source(File::with_name(&default_path.to_string_lossy()).required(false));

    // Load environment-specific config
    if let Some(env_name) = env {
        let env_path = dir.join(env_name);
        builder = builder.add_source(File::with_name(&env_path.to_string_lossy()).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix("GEO_ROUTER")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: RouterSettings = config.try_deserialize()?;

    // Validate
    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = RouterSettings::default();
        assert_eq!(settings.thresholds.high, 0.75);
        assert_eq!(settings.tuning.min_batch_size, 5);
        assert_eq!(settings.adapter.max_avoid_penalty, 0.6);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_threshold_ordering() {
        let mut settings = RouterSettings::default();
        settings.thresholds.medium = 0.9; // above high
        assert!(settings.validate().is_err());

        settings.thresholds.medium = 0.55;
        settings.thresholds.high = 1.2;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_tuning_validation() {
        let mut settings = RouterSettings::default();
        settings.tuning.high_floor = 0.99;
        assert!(settings.validate_tuning().is_err());
    }

    #[test]
    fn test_history_boost_level_tracks_tuning() {
        let mut settings = RouterSettings::default();
        settings.context.history_min_success_rate = 0.7;
        assert!(settings.validate_context().is_err());

        settings.tuning.raise_below = 0.6;
        assert!(settings.validate_context().is_ok());
    }

    #[test]
    fn test_toml_round_trip_and_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.toml"),
            "[thresholds]\nhigh = 0.8\n\n[decomposition]\nenabled = false\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("staging.toml"), "environment = \"staging\"\n").unwrap();

        let settings = load_settings_from(dir.path(), Some("staging")).unwrap();
        assert_eq!(settings.thresholds.high, 0.8);
        assert_eq!(settings.thresholds.medium, 0.55);
        assert!(!settings.decomposition.enabled);
        assert_eq!(settings.environment, RuntimeEnvironment::Staging);

        let rendered = RouterSettings::default().to_toml().unwrap();
        assert!(rendered.contains("[thresholds]"));
    }

    #[test]
    fn test_missing_directory_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from(&dir.path().join("nope"), None).unwrap();
        assert_eq!(settings.adapter.top_n_intents, 3);
    }
}
