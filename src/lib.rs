//! Nurse Match - ranks a nurse roster against care requests
//!
//! The matching core is a set of pure functions: haversine distance with
//! an optional caller-owned trig cache, same-day availability overlap, a
//! rule-based matcher and a weighted fuzzy matcher. Engine adapters wrap
//! the matchers for the actix-web gateway in `routes`.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    distance_km, haversine_distance, BasicMatcher, EngineRegistry, FuzzyMatcher, MatchEngine, TrigCache,
};
pub use models::{MatchQuery, MatchRequest, MatchResponse, MatchResult, Nurse, ScoringWeights};
pub use services::Roster;
