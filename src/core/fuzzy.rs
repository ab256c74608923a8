use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use crate::models::{MatchQuery, MatchResult, Nurse, ScoringWeights};
use crate::core::{
    availability::request_availability,
    distance::{distances_from, TrigCache},
    filters::{matches_city, passes_hard_filters},
    similarity::{jaccard, service_similarity, DiceScorer, SimilarityScorer},
};

/// Tunables for the weighted matcher
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyConfig {
    pub max_distance_km: f64,
    pub top_k: usize,
    /// Best per-term similarity below this counts as no match
    pub similarity_threshold: f64,
    /// Multiplier applied to urgent requests
    pub urgency_bonus: f64,
    /// Requests starting within this many hours count as urgent
    pub urgency_horizon_hours: i64,
    pub weights: ScoringWeights,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            max_distance_km: 50.0,
            top_k: 10,
            similarity_threshold: 0.4,
            urgency_bonus: 1.1,
            urgency_horizon_hours: 24,
            weights: ScoringWeights::default(),
        }
    }
}

/// The four component scores, each in 0..=1
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ComponentScores {
    pub services: f64,
    pub expertise: f64,
    pub availability: f64,
    pub location: f64,
}

impl ComponentScores {
    /// Weighted sum of the components, before any urgency bonus
    pub fn weighted(&self, weights: &ScoringWeights) -> f64 {
        self.services * weights.services
            + self.expertise * weights.expertise
            + self.location * weights.location
            + self.availability * weights.availability
    }
}

/// Weighted matcher blending fuzzy service similarity, expertise overlap,
/// availability and proximity
///
/// Results are ordered by score descending, ties broken by nurse id
/// ascending, so identical inputs always rank identically.
#[derive(Clone)]
pub struct FuzzyMatcher {
    config: FuzzyConfig,
    scorer: Arc<dyn SimilarityScorer>,
}

impl FuzzyMatcher {
    pub fn new(config: FuzzyConfig, scorer: Arc<dyn SimilarityScorer>) -> Self {
        Self { config, scorer }
    }

    pub fn with_defaults() -> Self {
        Self::new(FuzzyConfig::default(), Arc::new(DiceScorer))
    }

    pub fn scorer_name(&self) -> &'static str {
        self.scorer.name()
    }

    /// Rank the roster for a query
    ///
    /// `now` is the reference instant for the start-time urgency rule.
    pub fn find_matches(
        &self,
        roster: &[Nurse],
        query: &MatchQuery,
        now: DateTime<Utc>,
        cache: Option<&mut TrigCache>,
    ) -> Vec<MatchResult> {
        let max_distance_km = query.radius_km.unwrap_or(self.config.max_distance_km);
        let top_k = query.top_k.unwrap_or(self.config.top_k);
        let weights = query.weights.unwrap_or(self.config.weights);
        let urgent = self.is_urgent(query, now);

        let in_city: Vec<&Nurse> = roster
            .iter()
            .filter(|nurse| matches_city(nurse, query.city.as_deref()))
            .collect();

        let locations: Vec<_> = in_city.iter().map(|nurse| nurse.coordinates()).collect();
        let distances = distances_from(query.origin, &locations, cache);

        let mut scored: Vec<(f64, MatchResult)> = in_city
            .into_iter()
            .zip(distances)
            .filter_map(|(nurse, distance_km)| {
                let availability_ratio =
                    request_availability(query.start, query.end, &nurse.availability, query.day);
                if !passes_hard_filters(availability_ratio, distance_km, Some(max_distance_km)) {
                    return None;
                }

                let components = ComponentScores {
                    services: service_similarity(
                        self.scorer.as_ref(),
                        &query.services,
                        &nurse.specializations,
                        self.config.similarity_threshold,
                    ),
                    expertise: jaccard(&query.expertise, &nurse.expertise_tags),
                    availability: availability_ratio,
                    location: proximity_score(distance_km, max_distance_km),
                };
                let score = final_score(&components, &weights, urgent, self.config.urgency_bonus);
                let reason = describe(&components, distance_km, urgent);

                Some((score, MatchResult::new(nurse, Some(score), reason, distance_km, availability_ratio)))
            })
            .collect();

        tracing::debug!(
            "Fuzzy matcher: {} of {} nurses scored (urgent: {})",
            scored.len(),
            roster.len(),
            urgent
        );

        scored.sort_by(|(score_a, a), (score_b, b)| {
            score_b
                .partial_cmp(score_a)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        scored.truncate(top_k);

        scored.into_iter().map(|(_, result)| result).collect()
    }

    /// Urgent when flagged, or when the request starts within the horizon
    pub fn is_urgent(&self, query: &MatchQuery, now: DateTime<Utc>) -> bool {
        if query.urgent {
            return true;
        }
        query
            .start
            .is_some_and(|start| start - now < Duration::hours(self.config.urgency_horizon_hours))
    }
}

impl fmt::Debug for FuzzyMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuzzyMatcher")
            .field("config", &self.config)
            .field("scorer", &self.scorer.name())
            .finish()
    }
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Proximity score (0-1)
/// Linear falloff to zero at the max distance; unknown distance is neutral
#[inline]
fn proximity_score(distance_km: Option<f64>, max_distance_km: f64) -> f64 {
    match distance_km {
        None => 0.5,
        Some(_) if max_distance_km <= 0.0 => 0.0,
        Some(distance) => (1.0 - distance / max_distance_km).max(0.0),
    }
}

/// Weighted sum, urgency bonus, then clamp to 0..=1
#[inline]
pub fn final_score(components: &ComponentScores, weights: &ScoringWeights, urgent: bool, urgency_bonus: f64) -> f64 {
    let mut score = components.weighted(weights);
    if urgent {
        score *= urgency_bonus;
    }
    if !score.is_finite() {
        return 0.0;
    }
    score.clamp(0.0, 1.0)
}

fn describe(components: &ComponentScores, distance_km: Option<f64>, urgent: bool) -> String {
    let mut parts = Vec::new();
    if components.services > 0.0 {
        parts.push(format!("service match {:.0}%", components.services * 100.0));
    }
    if components.expertise > 0.0 {
        parts.push(format!("expertise overlap {:.0}%", components.expertise * 100.0));
    }
    if components.availability > 0.0 {
        parts.push(format!("available for {:.0}% of the window", components.availability * 100.0));
    }
    if components.location > 0.0 {
        match distance_km {
            Some(distance) => parts.push(format!("{:.1} km away", distance)),
            None => parts.push("location unknown".to_string()),
        }
    }
    if urgent {
        parts.push("urgent request".to_string());
    }

    if parts.is_empty() {
        "matched on city".to_string()
    } else {
        parts.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::similarity::LevenshteinScorer;
    use crate::models::{ClockTime, Coordinates, DayOfWeek, OpenWindow};
    use chrono::TimeZone;

    fn create_nurse(id: &str, services: &[&str], expertise: &[&str], lat: f64, lng: f64) -> Nurse {
        Nurse {
            id: id.to_string(),
            name: format!("Nurse {}", id),
            municipalities: vec!["Tel Aviv".to_string()],
            specializations: services.iter().map(|s| s.to_string()).collect(),
            lat: Some(lat),
            lng: Some(lng),
            rating: Some(4.5),
            reviews_count: Some(10),
            availability: Default::default(),
            expertise_tags: expertise.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_proximity_score() {
        assert_eq!(proximity_score(None, 50.0), 0.5);
        assert_eq!(proximity_score(Some(0.0), 50.0), 1.0);
        assert!((proximity_score(Some(25.0), 50.0) - 0.5).abs() < 1e-9);
        assert_eq!(proximity_score(Some(80.0), 50.0), 0.0);
        assert_eq!(proximity_score(Some(1.0), 0.0), 0.0);
    }

    #[test]
    fn test_final_score_clamped_with_bonus() {
        let perfect = ComponentScores {
            services: 1.0,
            expertise: 1.0,
            availability: 1.0,
            location: 1.0,
        };
        let weights = ScoringWeights::default();
        assert_eq!(final_score(&perfect, &weights, true, 1.1), 1.0);

        let half = ComponentScores {
            services: 0.5,
            expertise: 0.5,
            availability: 0.5,
            location: 0.5,
        };
        assert!((final_score(&half, &weights, true, 1.1) - 0.55).abs() < 1e-9);
        assert!((final_score(&half, &weights, false, 1.1) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_final_score_garbage_weights() {
        let components = ComponentScores {
            services: 1.0,
            ..Default::default()
        };
        let negative = ScoringWeights {
            services: -3.0,
            ..Default::default()
        };
        assert_eq!(final_score(&components, &negative, false, 1.1), 0.0);

        let nan = ScoringWeights {
            services: f64::NAN,
            ..Default::default()
        };
        assert_eq!(final_score(&components, &nan, false, 1.1), 0.0);
    }

    #[test]
    fn test_better_service_ranks_first() {
        let roster = vec![
            create_nurse("a", &["medication administration"], &[], 32.08, 34.78),
            create_nurse("b", &["wound care"], &[], 32.08, 34.78),
        ];
        let query = MatchQuery {
            services: vec!["wound care".to_string()],
            ..Default::default()
        };

        let results = FuzzyMatcher::with_defaults().find_matches(&roster, &query, now(), None);
        assert_eq!(results[0].id, "b");
        assert!(results[0].reason.contains("service match 100%"));
    }

    #[test]
    fn test_ties_broken_by_id() {
        let roster = vec![
            create_nurse("c", &["wound care"], &[], 32.08, 34.78),
            create_nurse("a", &["wound care"], &[], 32.08, 34.78),
            create_nurse("b", &["wound care"], &[], 32.08, 34.78),
        ];
        let query = MatchQuery {
            services: vec!["wound care".to_string()],
            ..Default::default()
        };

        let results = FuzzyMatcher::with_defaults().find_matches(&roster, &query, now(), None);
        let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_urgency_rules() {
        let matcher = FuzzyMatcher::with_defaults();

        let flagged = MatchQuery {
            urgent: true,
            ..Default::default()
        };
        assert!(matcher.is_urgent(&flagged, now()));

        let soon = MatchQuery {
            start: Some(now() + Duration::hours(3)),
            ..Default::default()
        };
        assert!(matcher.is_urgent(&soon, now()));

        let later = MatchQuery {
            start: Some(now() + Duration::hours(48)),
            ..Default::default()
        };
        assert!(!matcher.is_urgent(&later, now()));
        assert!(!matcher.is_urgent(&MatchQuery::default(), now()));
    }

    #[test]
    fn test_urgency_raises_score() {
        let roster = vec![create_nurse("a", &["wound care"], &["pediatrics"], 32.08, 34.78)];
        let mut query = MatchQuery {
            services: vec!["wound care".to_string()],
            origin: Some(Coordinates::new(32.1, 34.8)),
            ..Default::default()
        };
        let matcher = FuzzyMatcher::with_defaults();

        let calm = matcher.find_matches(&roster, &query, now(), None)[0].score.unwrap();
        query.urgent = true;
        let urgent = matcher.find_matches(&roster, &query, now(), None)[0].score.unwrap();

        assert!(urgent > calm);
        assert!(urgent <= 1.0);
    }

    #[test]
    fn test_out_of_range_and_unavailable_dropped() {
        let mut roster = vec![
            create_nurse("far", &["wound care"], &[], 29.55, 34.95),
            create_nurse("unavailable", &["wound care"], &[], 32.08, 34.78),
            create_nurse("ok", &["wound care"], &[], 32.08, 34.78),
        ];
        for nurse in roster.iter_mut() {
            let windows = if nurse.id == "unavailable" {
                vec![]
            } else {
                vec![OpenWindow::new(ClockTime::MIDNIGHT, ClockTime::END_OF_DAY)]
            };
            nurse.availability.insert(DayOfWeek::Sat, windows);
        }

        // 2024-06-01 is a Saturday
        let query = MatchQuery {
            origin: Some(Coordinates::new(32.08, 34.78)),
            start: Some(now()),
            end: Some(now() + Duration::hours(2)),
            ..Default::default()
        };

        let results = FuzzyMatcher::with_defaults().find_matches(&roster, &query, now(), None);
        let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["ok"]);
        assert!(results[0].reason.contains("urgent request"));
    }

    #[test]
    fn test_custom_scorer_and_weights() {
        let matcher = FuzzyMatcher::new(FuzzyConfig::default(), Arc::new(LevenshteinScorer));
        assert_eq!(matcher.scorer_name(), "levenshtein");

        let roster = vec![create_nurse("a", &["wound care"], &["pediatrics"], 32.08, 34.78)];
        let query = MatchQuery {
            expertise: vec!["pediatrics".to_string()],
            weights: Some(ScoringWeights {
                services: 0.0,
                expertise: 1.0,
                location: 0.0,
                availability: 0.0,
            }),
            ..Default::default()
        };

        let results = matcher.find_matches(&roster, &query, now(), None);
        assert_eq!(results[0].score, Some(1.0));
    }
}
