use std::cmp::Ordering;
use crate::models::{MatchQuery, MatchResult, Nurse};
use crate::core::{
    availability::request_availability,
    distance::{distances_from, TrigCache},
    filters::{matches_city, matches_services, passes_hard_filters},
};

/// Defaults applied when a query leaves radius or topK unset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasicConfig {
    pub radius_km: f64,
    pub top_k: usize,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            radius_km: 25.0,
            top_k: 3,
        }
    }
}

/// Rule-based matcher: hard filters, then rating/reviews/distance ordering
///
/// # Pipeline Stages
/// 1. City filter (bidirectional containment)
/// 2. Service filter (substring and synonym rules)
/// 3. Distance and availability per surviving nurse
/// 4. Drop zero availability and out-of-radius nurses
/// 5. Stable sort: rating desc, reviews desc, distance asc
/// 6. Truncate to topK
///
/// Nurses equal on all three sort keys keep their roster order.
#[derive(Debug, Clone, Default)]
pub struct BasicMatcher {
    config: BasicConfig,
}

struct Candidate<'a> {
    nurse: &'a Nurse,
    distance_km: Option<f64>,
    availability_ratio: f64,
}

impl BasicMatcher {
    pub fn new(config: BasicConfig) -> Self {
        Self { config }
    }

    pub fn find_matches(
        &self,
        roster: &[Nurse],
        query: &MatchQuery,
        cache: Option<&mut TrigCache>,
    ) -> Vec<MatchResult> {
        let radius_km = query.radius_km.unwrap_or(self.config.radius_km);
        let top_k = query.top_k.unwrap_or(self.config.top_k);

        // Stages 1 & 2
        let filtered: Vec<&Nurse> = roster
            .iter()
            .filter(|nurse| matches_city(nurse, query.city.as_deref()))
            .filter(|nurse| matches_services(nurse, &query.services))
            .collect();

        // Stage 3
        let locations: Vec<_> = filtered.iter().map(|nurse| nurse.coordinates()).collect();
        let distances = distances_from(query.origin, &locations, cache);

        // Stage 4
        let mut candidates: Vec<Candidate<'_>> = filtered
            .into_iter()
            .zip(distances)
            .filter_map(|(nurse, distance_km)| {
                let availability_ratio =
                    request_availability(query.start, query.end, &nurse.availability, query.day);
                passes_hard_filters(availability_ratio, distance_km, Some(radius_km)).then_some(Candidate {
                    nurse,
                    distance_km,
                    availability_ratio,
                })
            })
            .collect();

        tracing::debug!(
            "Basic matcher: {} of {} nurses passed filters",
            candidates.len(),
            roster.len()
        );

        // Stage 5
        candidates.sort_by(compare_candidates);

        // Stage 6
        candidates.truncate(top_k);

        candidates
            .into_iter()
            .map(|c| {
                let reason = describe(c.nurse, c.distance_km);
                MatchResult::new(c.nurse, None, reason, c.distance_km, c.availability_ratio)
            })
            .collect()
    }
}

fn compare_candidates(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    let rating = |c: &Candidate<'_>| c.nurse.rating.unwrap_or(0.0);
    let reviews = |c: &Candidate<'_>| c.nurse.reviews_count.unwrap_or(0);
    let distance = |c: &Candidate<'_>| c.distance_km.unwrap_or(f64::INFINITY);

    rating(b)
        .partial_cmp(&rating(a))
        .unwrap_or(Ordering::Equal)
        .then_with(|| reviews(b).cmp(&reviews(a)))
        .then_with(|| distance(a).partial_cmp(&distance(b)).unwrap_or(Ordering::Equal))
}

fn describe(nurse: &Nurse, distance_km: Option<f64>) -> String {
    let mut parts = Vec::new();
    match nurse.rating {
        Some(rating) => parts.push(format!(
            "rated {:.1} from {} reviews",
            rating,
            nurse.reviews_count.unwrap_or(0)
        )),
        None => parts.push("unrated".to_string()),
    }
    if let Some(distance) = distance_km {
        parts.push(format!("{:.1} km away", distance));
    }
    parts.join(", ")
}
