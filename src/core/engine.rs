use std::sync::Arc;
use chrono::{DateTime, Utc};
use thiserror::Error;
use crate::models::{EngineInfo, EngineStatus, MatchQuery, MatchRequest, MatchResponse, Nurse};
use crate::core::{basic::BasicMatcher, distance::TrigCache, fuzzy::FuzzyMatcher};

/// Errors raised while selecting or building engines
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unknown engine: {0}")]
    UnknownEngine(String),

    #[error("Unknown similarity scorer: {0}")]
    UnknownScorer(String),

    #[error("Engine already registered: {0}")]
    DuplicateEngine(String),
}

/// Per-call inputs that are not part of the query itself
pub struct MatchContext<'a> {
    pub now: DateTime<Utc>,
    pub trig_cache: Option<&'a mut TrigCache>,
}

impl<'a> MatchContext<'a> {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now, trig_cache: None }
    }

    pub fn with_cache(mut self, cache: &'a mut TrigCache) -> Self {
        self.trig_cache = Some(cache);
        self
    }
}

/// Adapter between the wire request and one matcher
pub trait MatchEngine: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn health(&self) -> EngineStatus {
        EngineStatus {
            name: self.name().to_string(),
            ready: true,
            detail: None,
        }
    }

    fn run(&self, roster: &[Nurse], request: &MatchRequest, ctx: MatchContext<'_>) -> MatchResponse;
}

/// Fold the wire request's spellings into a `MatchQuery`
pub fn normalize_request(request: &MatchRequest) -> MatchQuery {
    MatchQuery {
        city: request.city().map(str::to_string),
        services: clean_terms(&request.services),
        expertise: clean_terms(&request.expertise),
        start: request.start,
        end: request.end,
        day: request.day,
        origin: request.origin(),
        radius_km: request.radius_km,
        urgent: request.urgent.unwrap_or(false),
        top_k: request.top_k,
        weights: request.weights,
    }
}

fn clean_terms(terms: &[String]) -> Vec<String> {
    terms
        .iter()
        .map(|term| term.trim())
        .filter(|term| !term.is_empty())
        .map(str::to_string)
        .collect()
}

/// Rating-ordered engine; ignores expertise, weights and urgency
#[derive(Debug, Clone, Default)]
pub struct BasicEngine {
    matcher: BasicMatcher,
}

impl BasicEngine {
    pub fn new(matcher: BasicMatcher) -> Self {
        Self { matcher }
    }
}

impl MatchEngine for BasicEngine {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn description(&self) -> &'static str {
        "Filters by city, service and availability; ranks by rating, reviews, then distance"
    }

    fn run(&self, roster: &[Nurse], request: &MatchRequest, ctx: MatchContext<'_>) -> MatchResponse {
        let query = MatchQuery {
            expertise: Vec::new(),
            urgent: false,
            weights: None,
            ..normalize_request(request)
        };
        let results = self.matcher.find_matches(roster, &query, ctx.trig_cache);
        MatchResponse::new(self.name(), results)
    }
}

/// Weighted fuzzy engine
#[derive(Debug, Clone, Default)]
pub struct FuzzyEngine {
    matcher: FuzzyMatcher,
}

impl FuzzyEngine {
    pub fn new(matcher: FuzzyMatcher) -> Self {
        Self { matcher }
    }
}

impl MatchEngine for FuzzyEngine {
    fn name(&self) -> &'static str {
        "fuzzy"
    }

    fn description(&self) -> &'static str {
        "Weighted blend of fuzzy service similarity, expertise overlap, availability and proximity"
    }

    fn health(&self) -> EngineStatus {
        EngineStatus {
            name: self.name().to_string(),
            ready: true,
            detail: Some(format!("scorer: {}", self.matcher.scorer_name())),
        }
    }

    fn run(&self, roster: &[Nurse], request: &MatchRequest, ctx: MatchContext<'_>) -> MatchResponse {
        let query = normalize_request(request);
        let results = self.matcher.find_matches(roster, &query, ctx.now, ctx.trig_cache);
        MatchResponse::new(self.name(), results)
    }
}

/// Engines available to the gateway, looked up by name
#[derive(Clone)]
pub struct EngineRegistry {
    engines: Vec<Arc<dyn MatchEngine>>,
    default_engine: String,
}

impl EngineRegistry {
    pub fn new(default_engine: &str) -> Self {
        Self {
            engines: Vec::new(),
            default_engine: default_engine.trim().to_lowercase(),
        }
    }

    /// Registry holding the two built-in engines with their default settings
    pub fn with_defaults() -> Self {
        let mut registry = Self::new("basic");
        registry.engines.push(Arc::new(BasicEngine::default()));
        registry.engines.push(Arc::new(FuzzyEngine::default()));
        registry
    }

    pub fn register(&mut self, engine: Arc<dyn MatchEngine>) -> Result<(), EngineError> {
        if self.engines.iter().any(|e| e.name() == engine.name()) {
            return Err(EngineError::DuplicateEngine(engine.name().to_string()));
        }
        self.engines.push(engine);
        Ok(())
    }

    /// Find an engine by name, case-insensitively
    pub fn get(&self, name: &str) -> Result<Arc<dyn MatchEngine>, EngineError> {
        let wanted = name.trim().to_lowercase();
        self.engines
            .iter()
            .find(|engine| engine.name() == wanted)
            .cloned()
            .ok_or(EngineError::UnknownEngine(wanted))
    }

    /// The named engine, or the default when no name is given
    pub fn resolve(&self, name: Option<&str>) -> Result<Arc<dyn MatchEngine>, EngineError> {
        match name.map(str::trim).filter(|name| !name.is_empty()) {
            Some(name) => self.get(name),
            None => self.get(&self.default_engine),
        }
    }

    pub fn default_engine(&self) -> &str {
        &self.default_engine
    }

    pub fn list(&self) -> Vec<EngineInfo> {
        self.engines
            .iter()
            .map(|engine| EngineInfo {
                name: engine.name().to_string(),
                description: engine.description().to_string(),
            })
            .collect()
    }

    pub fn health(&self) -> Vec<EngineStatus> {
        self.engines.iter().map(|engine| engine.health()).collect()
    }
}

impl std::fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.engines.iter().map(|e| e.name()).collect();
        f.debug_struct("EngineRegistry")
            .field("engines", &names)
            .field("default_engine", &self.default_engine)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_nurse(id: &str, city: &str, services: &[&str], rating: f64) -> Nurse {
        Nurse {
            id: id.to_string(),
            name: format!("Nurse {}", id),
            municipalities: vec![city.to_string()],
            specializations: services.iter().map(|s| s.to_string()).collect(),
            lat: None,
            lng: None,
            rating: Some(rating),
            reviews_count: Some(1),
            availability: Default::default(),
            expertise_tags: vec!["pediatrics".to_string()],
        }
    }

    #[test]
    fn test_normalize_request() {
        let request: MatchRequest = serde_json::from_str(
            r#"{"city": "  ", "service": " wound care ", "expertiseTags": ["", "pediatrics"], "urgent": true, "lat": 1.0, "lng": 2.0}"#,
        )
        .unwrap();
        let query = normalize_request(&request);

        assert_eq!(query.city, None);
        assert_eq!(query.services, vec!["wound care"]);
        assert_eq!(query.expertise, vec!["pediatrics"]);
        assert!(query.urgent);
        assert!(query.origin.is_some());
    }

    #[test]
    fn test_envelope_count_matches_results() {
        let roster = vec![
            create_nurse("1", "Haifa", &["wound care"], 4.0),
            create_nurse("2", "Haifa", &["wound care"], 4.5),
            create_nurse("3", "Jerusalem", &["wound care"], 5.0),
        ];
        let request = MatchRequest {
            city: Some("Haifa".to_string()),
            ..Default::default()
        };

        let response = BasicEngine::default().run(&roster, &request, MatchContext::new(Utc::now()));
        assert_eq!(response.engine, "basic");
        assert_eq!(response.count, 2);
        assert_eq!(response.count, response.results.len());
        assert_eq!(response.results[0].id, "2");
    }

    #[test]
    fn test_fuzzy_engine_uses_cache() {
        let mut roster = vec![create_nurse("1", "Haifa", &["wound care"], 4.0)];
        roster[0].lat = Some(32.79);
        roster[0].lng = Some(34.99);
        let request = MatchRequest {
            lat: Some(32.8),
            lng: Some(35.0),
            ..Default::default()
        };

        let mut cache = TrigCache::new(16);
        let response = FuzzyEngine::default().run(&roster, &request, MatchContext::new(Utc::now()).with_cache(&mut cache));
        assert_eq!(response.count, 1);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_registry_resolution() {
        let registry = EngineRegistry::with_defaults();

        assert_eq!(registry.resolve(None).unwrap().name(), "basic");
        assert_eq!(registry.resolve(Some("  ")).unwrap().name(), "basic");
        assert_eq!(registry.resolve(Some("FUZZY")).unwrap().name(), "fuzzy");
        assert!(matches!(registry.get("llm"), Err(EngineError::UnknownEngine(name)) if name == "llm"));
        assert_eq!(registry.list().len(), 2);
        assert!(registry.health().iter().all(|status| status.ready));
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let mut registry = EngineRegistry::with_defaults();
        let result = registry.register(Arc::new(BasicEngine::default()));
        assert!(matches!(result, Err(EngineError::DuplicateEngine(_))));
    }
}
