use crate::core::filters::normalize;
use std::collections::HashSet;

/// String-similarity capability used by the fuzzy matcher
///
/// Implementations return a similarity in `0.0..=1.0`, where `1.0` means
/// identical. Any edit-distance or phonetic algorithm can sit behind it.
pub trait SimilarityScorer: Send + Sync {
    /// Short identifier, used in configuration and logs
    fn name(&self) -> &'static str;

    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// Sørensen–Dice coefficient over character bigrams
#[derive(Debug, Clone, Copy, Default)]
pub struct DiceScorer;

impl SimilarityScorer for DiceScorer {
    fn name(&self) -> &'static str {
        "dice"
    }

    fn similarity(&self, a: &str, b: &str) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        strsim::sorensen_dice(a, b)
    }
}

/// Levenshtein distance normalized by the longer string
#[derive(Debug, Clone, Copy, Default)]
pub struct LevenshteinScorer;

impl SimilarityScorer for LevenshteinScorer {
    fn name(&self) -> &'static str {
        "levenshtein"
    }

    fn similarity(&self, a: &str, b: &str) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        strsim::normalized_levenshtein(a, b)
    }
}

/// Look up a shipped scorer by its configuration name
pub fn scorer_by_name(name: &str) -> Option<Box<dyn SimilarityScorer>> {
    match name.trim().to_lowercase().as_str() {
        "dice" | "sorensen_dice" => Some(Box::new(DiceScorer)),
        "levenshtein" => Some(Box::new(LevenshteinScorer)),
        _ => None,
    }
}

/// Average best-match similarity of each requested term against the offered list
///
/// For every requested term the closest offered entry is found; a best
/// similarity under `threshold` counts as zero. No requested terms, or
/// nothing offered, scores zero.
pub fn service_similarity(
    scorer: &dyn SimilarityScorer,
    requested: &[String],
    offered: &[String],
    threshold: f64,
) -> f64 {
    let offered: Vec<String> = offered.iter().map(|s| normalize(s)).collect();
    let requested: Vec<String> = requested
        .iter()
        .map(|s| normalize(s))
        .filter(|s| !s.is_empty())
        .collect();

    if requested.is_empty() || offered.is_empty() {
        return 0.0;
    }

    let total: f64 = requested
        .iter()
        .map(|term| {
            let best = offered
                .iter()
                .map(|candidate| scorer.similarity(term, candidate))
                .fold(0.0_f64, f64::max);
            if best >= threshold { best } else { 0.0 }
        })
        .sum();

    (total / requested.len() as f64).clamp(0.0, 1.0)
}

/// Jaccard similarity between two tag sets, compared after normalization
///
/// Two empty sets score zero.
pub fn jaccard(a: &[String], b: &[String]) -> f64 {
    let a: HashSet<String> = a.iter().map(|s| normalize(s)).filter(|s| !s.is_empty()).collect();
    let b: HashSet<String> = b.iter().map(|s| normalize(s)).filter(|s| !s.is_empty()).collect();

    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}
