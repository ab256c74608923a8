use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::{one_or_many, Coordinates, DayOfWeek, ScoringWeights};

/// Inbound match request, as posted by the chat UI and the chooser page
///
/// Several field spellings are accepted; the engine adapters fold them into
/// a single `MatchQuery`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct MatchRequest {
    #[serde(default)]
    pub engine: Option<String>,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub city: Option<String>,
    #[serde(alias = "service", default, deserialize_with = "one_or_many")]
    pub services: Vec<String>,
    #[serde(alias = "expertiseTags", default, deserialize_with = "one_or_many")]
    pub expertise: Vec<String>,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub day: Option<DayOfWeek>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(alias = "lon", default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub location: Option<Coordinates>,
    #[serde(rename = "radiusKm", alias = "radius", alias = "maxDistanceKm", default)]
    pub radius_km: Option<f64>,
    #[serde(default)]
    pub urgent: Option<bool>,
    #[validate(range(min = 1, max = 100))]
    #[serde(rename = "topK", alias = "limit", default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub weights: Option<ScoringWeights>,
}

impl MatchRequest {
    /// Caller location: the `location` object wins over top-level `lat`/`lng`
    pub fn origin(&self) -> Option<Coordinates> {
        self.location
            .or_else(|| Some(Coordinates::new(self.lat?, self.lng?)))
    }

    /// City with surrounding whitespace removed; blank means no filter
    pub fn city(&self) -> Option<&str> {
        self.city
            .as_deref()
            .map(str::trim)
            .filter(|city| !city.is_empty())
    }
}
