use crate::models::Coordinates;
use lru::LruCache;
use std::num::NonZeroUsize;

/// Earth's radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Default number of points kept by a `TrigCache`
pub const DEFAULT_TRIG_CACHE_CAPACITY: usize = 1000;

/// Calculate the Haversine distance between two points in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
///
/// # Returns
/// Distance in kilometers
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let from = TrigTerms::of(Coordinates::new(lat1, lon1));
    let to = TrigTerms::of(Coordinates::new(lat2, lon2));
    from.distance_to(&to)
}

/// Distance between two optional points
///
/// Returns `None` when either point is unknown, and exactly `0.0` for
/// identical points without touching any trigonometry.
#[inline]
pub fn distance_km(from: Option<Coordinates>, to: Option<Coordinates>) -> Option<f64> {
    let (from, to) = (from?, to?);
    if from == to {
        return Some(0.0);
    }
    Some(haversine_distance(from.lat, from.lng, to.lat, to.lng))
}

/// Distances from one origin to many destinations
///
/// The origin's trig terms are computed once. When a cache is supplied,
/// every point's terms are looked up there first.
pub fn distances_from(
    origin: Option<Coordinates>,
    destinations: &[Option<Coordinates>],
    cache: Option<&mut TrigCache>,
) -> Vec<Option<f64>> {
    let Some(origin) = origin else {
        return vec![None; destinations.len()];
    };

    match cache {
        Some(cache) => {
            let origin_terms = cache.terms(origin);
            destinations
                .iter()
                .map(|dest| {
                    let dest = (*dest)?;
                    if dest == origin {
                        return Some(0.0);
                    }
                    Some(origin_terms.distance_to(&cache.terms(dest)))
                })
                .collect()
        }
        None => {
            let origin_terms = TrigTerms::of(origin);
            destinations
                .iter()
                .map(|dest| {
                    let dest = (*dest)?;
                    if dest == origin {
                        return Some(0.0);
                    }
                    Some(origin_terms.distance_to(&TrigTerms::of(dest)))
                })
                .collect()
        }
    }
}

/// Per-point terms reused by the haversine formula
#[derive(Debug, Clone, Copy, PartialEq)]
struct TrigTerms {
    lat_rad: f64,
    lng_rad: f64,
    cos_lat: f64,
}

impl TrigTerms {
    fn of(point: Coordinates) -> Self {
        let lat_rad = point.lat.to_radians();
        Self {
            lat_rad,
            lng_rad: point.lng.to_radians(),
            cos_lat: lat_rad.cos(),
        }
    }

    fn distance_to(&self, other: &TrigTerms) -> f64 {
        let delta_lat = other.lat_rad - self.lat_rad;
        let delta_lng = other.lng_rad - self.lng_rad;

        let a = (delta_lat / 2.0).sin().powi(2)
            + self.cos_lat * other.cos_lat * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }
}

/// Bounded cache of per-point trig terms
///
/// Owned by the caller and passed into distance computations explicitly.
/// When full, the entry inserted first is evicted; lookups do not refresh
/// an entry's position.
pub struct TrigCache {
    entries: LruCache<(u64, u64), TrigTerms>,
    hits: u64,
    misses: u64,
}

impl TrigCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Cached distance between two optional points; same contract as `distance_km`
    pub fn distance_km(&mut self, from: Option<Coordinates>, to: Option<Coordinates>) -> Option<f64> {
        let (from, to) = (from?, to?);
        if from == to {
            return Some(0.0);
        }
        let from_terms = self.terms(from);
        Some(from_terms.distance_to(&self.terms(to)))
    }

    fn terms(&mut self, point: Coordinates) -> TrigTerms {
        let key = (point.lat.to_bits(), point.lng.to_bits());
        // peek keeps insertion order intact, so eviction is oldest-first
        if let Some(terms) = self.entries.peek(&key) {
            self.hits += 1;
            return *terms;
        }
        self.misses += 1;
        let terms = TrigTerms::of(point);
        self.entries.put(key, terms);
        terms
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn contains(&self, point: Coordinates) -> bool {
        self.entries.contains(&(point.lat.to_bits(), point.lng.to_bits()))
    }

    /// (hits, misses) since creation
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

impl Default for TrigCache {
    fn default() -> Self {
        Self::new(DEFAULT_TRIG_CACHE_CAPACITY)
    }
}

impl std::fmt::Debug for TrigCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrigCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEL_AVIV: Coordinates = Coordinates { lat: 32.0853, lng: 34.7818 };
    const JERUSALEM: Coordinates = Coordinates { lat: 31.7683, lng: 35.2137 };

    #[test]
    fn test_haversine_distance() {
        // Distance from London to Paris (approximately 344 km)
        let distance = haversine_distance(51.5074, -0.1278, 48.8566, 2.3522);
        assert!((distance - 344.0).abs() < 10.0, "Distance should be ~344km, got {}", distance);
    }

    #[test]
    fn test_tel_aviv_to_jerusalem() {
        let distance = distance_km(Some(TEL_AVIV), Some(JERUSALEM)).unwrap();
        assert!((distance - 54.0).abs() < 5.0, "Expected ~54km, got {}", distance);
    }

    #[test]
    fn test_missing_coordinates() {
        assert_eq!(distance_km(None, Some(TEL_AVIV)), None);
        assert_eq!(distance_km(Some(TEL_AVIV), None), None);
        assert_eq!(distance_km(None, None), None);
    }

    #[test]
    fn test_identical_points_are_zero() {
        assert_eq!(distance_km(Some(TEL_AVIV), Some(TEL_AVIV)), Some(0.0));

        let mut cache = TrigCache::new(8);
        assert_eq!(cache.distance_km(Some(JERUSALEM), Some(JERUSALEM)), Some(0.0));
        // No trig terms were needed
        assert!(cache.is_empty());
    }

    #[test]
    fn test_batch_matches_single() {
        let destinations = vec![Some(JERUSALEM), None, Some(TEL_AVIV), Some(Coordinates::new(32.794, 34.9896))];
        let plain = distances_from(Some(TEL_AVIV), &destinations, None);

        let mut cache = TrigCache::default();
        let cached = distances_from(Some(TEL_AVIV), &destinations, Some(&mut cache));

        assert_eq!(plain.len(), destinations.len());
        assert_eq!(plain[1], None);
        assert_eq!(plain[2], Some(0.0));
        for (dest, (a, b)) in destinations.iter().zip(plain.iter().zip(&cached)) {
            assert_eq!(a, b);
            assert_eq!(*a, distance_km(Some(TEL_AVIV), *dest));
        }
    }

    #[test]
    fn test_batch_without_origin() {
        let result = distances_from(None, &[Some(TEL_AVIV), Some(JERUSALEM)], None);
        assert_eq!(result, vec![None, None]);
    }

    #[test]
    fn test_cache_evicts_oldest_first() {
        let mut cache = TrigCache::new(2);
        let a = Coordinates::new(1.0, 1.0);
        let b = Coordinates::new(2.0, 2.0);
        let c = Coordinates::new(3.0, 3.0);

        cache.distance_km(Some(a), Some(b));
        // Touching `a` again must not protect it from eviction
        cache.distance_km(Some(a), Some(b));
        cache.distance_km(Some(c), Some(b));

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(a));
        assert!(cache.contains(b));
        assert!(cache.contains(c));
    }

    #[test]
    fn test_cache_stats() {
        let mut cache = TrigCache::new(4);
        cache.distance_km(Some(TEL_AVIV), Some(JERUSALEM));
        cache.distance_km(Some(JERUSALEM), Some(TEL_AVIV));
        assert_eq!(cache.stats(), (2, 2));
    }
}
