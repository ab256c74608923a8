// Core algorithm exports
pub mod availability;
pub mod basic;
pub mod distance;
pub mod engine;
pub mod filters;
pub mod fuzzy;
pub mod similarity;

pub use availability::{availability_ratio, request_availability};
pub use basic::{BasicConfig, BasicMatcher};
pub use distance::{distance_km, distances_from, haversine_distance, TrigCache};
pub use engine::{BasicEngine, EngineError, EngineRegistry, FuzzyEngine, MatchContext, MatchEngine};
pub use filters::{matches_city, matches_service, matches_services, passes_hard_filters};
pub use fuzzy::{ComponentScores, FuzzyConfig, FuzzyMatcher};
pub use similarity::{DiceScorer, LevenshteinScorer, SimilarityScorer};
