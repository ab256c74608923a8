use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use crate::core::{
    similarity::scorer_by_name, BasicConfig, BasicEngine, BasicMatcher, EngineError, EngineRegistry,
    FuzzyConfig, FuzzyEngine, FuzzyMatcher,
};
use crate::models::ScoringWeights;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub roster: RosterSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
    pub match_timeout_ms: Option<u64>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
            match_timeout_ms: None,
        }
    }
}

impl ServerSettings {
    pub fn match_timeout(&self) -> Duration {
        Duration::from_millis(self.match_timeout_ms.unwrap_or(5_000))
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_engine")]
    pub default_engine: String,
    #[serde(default = "default_trig_cache_capacity")]
    pub trig_cache_capacity: usize,
    #[serde(default)]
    pub basic: BasicSettings,
    #[serde(default)]
    pub fuzzy: FuzzySettings,
    #[serde(default)]
    pub weights: WeightsConfig,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            default_engine: default_engine(),
            trig_cache_capacity: default_trig_cache_capacity(),
            basic: BasicSettings::default(),
            fuzzy: FuzzySettings::default(),
            weights: WeightsConfig::default(),
        }
    }
}

fn default_engine() -> String { "basic".to_string() }
fn default_trig_cache_capacity() -> usize { crate::core::distance::DEFAULT_TRIG_CACHE_CAPACITY }

#[derive(Debug, Clone, Deserialize)]
pub struct BasicSettings {
    #[serde(default = "default_basic_radius_km")]
    pub radius_km: f64,
    #[serde(default = "default_basic_top_k")]
    pub top_k: usize,
}

impl Default for BasicSettings {
    fn default() -> Self {
        Self {
            radius_km: default_basic_radius_km(),
            top_k: default_basic_top_k(),
        }
    }
}

fn default_basic_radius_km() -> f64 { 25.0 }
fn default_basic_top_k() -> usize { 3 }

#[derive(Debug, Clone, Deserialize)]
pub struct FuzzySettings {
    #[serde(default = "default_fuzzy_max_distance_km")]
    pub max_distance_km: f64,
    #[serde(default = "default_fuzzy_top_k")]
    pub top_k: usize,
    #[serde(default = "default_similarity")]
    pub similarity: String,
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    #[serde(default = "default_urgency_bonus")]
    pub urgency_bonus: f64,
    #[serde(default = "default_urgency_horizon_hours")]
    pub urgency_horizon_hours: i64,
}

impl Default for FuzzySettings {
    fn default() -> Self {
        Self {
            max_distance_km: default_fuzzy_max_distance_km(),
            top_k: default_fuzzy_top_k(),
            similarity: default_similarity(),
            similarity_threshold: default_similarity_threshold(),
            urgency_bonus: default_urgency_bonus(),
            urgency_horizon_hours: default_urgency_horizon_hours(),
        }
    }
}

fn default_fuzzy_max_distance_km() -> f64 { 50.0 }
fn default_fuzzy_top_k() -> usize { 10 }
fn default_similarity() -> String { "dice".to_string() }
fn default_similarity_threshold() -> f64 { 0.4 }
fn default_urgency_bonus() -> f64 { 1.1 }
fn default_urgency_horizon_hours() -> i64 { 24 }

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_services_weight")]
    pub services: f64,
    #[serde(default = "default_expertise_weight")]
    pub expertise: f64,
    #[serde(default = "default_location_weight")]
    pub location: f64,
    #[serde(default = "default_availability_weight")]
    pub availability: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            services: default_services_weight(),
            expertise: default_expertise_weight(),
            location: default_location_weight(),
            availability: default_availability_weight(),
        }
    }
}

fn default_services_weight() -> f64 { 0.3 }
fn default_expertise_weight() -> f64 { 0.3 }
fn default_location_weight() -> f64 { 0.2 }
fn default_availability_weight() -> f64 { 0.2 }

impl From<&WeightsConfig> for ScoringWeights {
    fn from(weights: &WeightsConfig) -> Self {
        Self {
            services: weights.services,
            expertise: weights.expertise,
            location: weights.location,
            availability: weights.availability,
        }
    }
}

impl MatchingSettings {
    pub fn basic_config(&self) -> BasicConfig {
        BasicConfig {
            radius_km: self.basic.radius_km,
            top_k: self.basic.top_k,
        }
    }

    pub fn fuzzy_config(&self) -> FuzzyConfig {
        FuzzyConfig {
            max_distance_km: self.fuzzy.max_distance_km,
            top_k: self.fuzzy.top_k,
            similarity_threshold: self.fuzzy.similarity_threshold,
            urgency_bonus: self.fuzzy.urgency_bonus,
            urgency_horizon_hours: self.fuzzy.urgency_horizon_hours,
            weights: ScoringWeights::from(&self.weights),
        }
    }

    /// Build the engine registry described by these settings
    pub fn engine_registry(&self) -> Result<EngineRegistry, EngineError> {
        let scorer = scorer_by_name(&self.fuzzy.similarity)
            .ok_or_else(|| EngineError::UnknownScorer(self.fuzzy.similarity.clone()))?;

        let mut registry = EngineRegistry::new(&self.default_engine);
        registry.register(Arc::new(BasicEngine::new(BasicMatcher::new(self.basic_config()))))?;
        registry.register(Arc::new(FuzzyEngine::new(FuzzyMatcher::new(
            self.fuzzy_config(),
            Arc::from(scorer),
        ))))?;

        // Fail at startup rather than on the first request
        registry.resolve(None)?;
        Ok(registry)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RosterSettings {
    /// JSON file with the roster; the bundled demo roster is used when unset
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with NURSE_)
    /// 5. Plain PORT / ROSTER_PATH, as set by most hosting platforms
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., NURSE__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("NURSE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = apply_platform_env(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("NURSE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Honour the unprefixed variables deployment platforms set
fn apply_platform_env(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Some(port) = env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
        builder = builder.set_override("server.port", i64::from(port))?;
    }
    if let Ok(path) = env::var("ROSTER_PATH") {
        builder = builder.set_override("roster.path", path)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let weights = WeightsConfig::default();
        assert_eq!(weights.services, 0.3);
        assert_eq!(weights.expertise, 0.3);
        assert_eq!(weights.location, 0.2);
        assert_eq!(weights.availability, 0.2);
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "json");
    }

    #[test]
    fn test_matcher_configs_follow_settings() {
        let mut matching = MatchingSettings::default();
        matching.basic.top_k = 7;
        matching.fuzzy.max_distance_km = 12.5;
        matching.weights.services = 0.9;

        assert_eq!(matching.basic_config().top_k, 7);
        assert_eq!(matching.basic_config().radius_km, 25.0);
        assert_eq!(matching.fuzzy_config().max_distance_km, 12.5);
        assert_eq!(matching.fuzzy_config().weights.services, 0.9);
        assert_eq!(matching.fuzzy_config(), FuzzyConfig {
            max_distance_km: 12.5,
            weights: ScoringWeights { services: 0.9, ..ScoringWeights::default() },
            ..FuzzyConfig::default()
        });
    }

    #[test]
    fn test_engine_registry_from_settings() {
        let registry = MatchingSettings::default().engine_registry().unwrap();
        assert_eq!(registry.default_engine(), "basic");
        assert_eq!(registry.list().len(), 2);
    }

    #[test]
    fn test_engine_registry_rejects_bad_names() {
        let mut matching = MatchingSettings::default();
        matching.fuzzy.similarity = "soundex".to_string();
        assert!(matches!(matching.engine_registry(), Err(EngineError::UnknownScorer(_))));

        let mut matching = MatchingSettings::default();
        matching.default_engine = "llm".to_string();
        assert!(matches!(matching.engine_registry(), Err(EngineError::UnknownEngine(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("nurse-match-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.toml");
        std::fs::write(
            &path,
            "[server]\nport = 9090\n\n[matching]\ndefault_engine = \"fuzzy\"\n\n[matching.fuzzy]\ntop_k = 4\n",
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.matching.default_engine, "fuzzy");
        assert_eq!(settings.matching.fuzzy.top_k, 4);
        assert_eq!(settings.matching.basic.top_k, 3);
        assert!(settings.roster.path.is_none());

        std::fs::remove_dir_all(&dir).ok();
    }
}
