use crate::models::Nurse;

/// Synonym rules for service filtering
///
/// The first keyword found in the requested service decides which
/// specialization keywords are accepted.
const SERVICE_RULES: &[(&str, &[&str])] = &[
    ("wound", &["wound"]),
    ("medication", &["medication"]),
    ("care", &["care", "treatment"]),
    ("general", &["general", "default"]),
];

/// Lowercase, treat `_` and `-` as spaces, collapse whitespace
pub fn normalize(value: &str) -> String {
    value
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Check if a nurse serves the requested city
///
/// Case-insensitive containment in either direction against any of the
/// nurse's municipalities. A missing or blank city never filters.
#[inline]
pub fn matches_city(nurse: &Nurse, city: Option<&str>) -> bool {
    let city = match city.map(normalize) {
        Some(city) if !city.is_empty() => city,
        _ => return true,
    };

    nurse.municipalities.iter().map(|m| normalize(m)).any(|municipality| {
        !municipality.is_empty() && (municipality.contains(&city) || city.contains(&municipality))
    })
}

/// Check if any of the nurse's specializations satisfies one requested service
pub fn matches_service(nurse: &Nurse, service: &str) -> bool {
    let service = normalize(service);
    if service.is_empty() {
        return true;
    }

    let accepted = SERVICE_RULES
        .iter()
        .find(|(keyword, _)| service.contains(keyword))
        .map(|(_, accepted)| *accepted);

    nurse.specializations.iter().map(|s| normalize(s)).any(|specialization| {
        specialization.contains(&service)
            || accepted.is_some_and(|keywords| keywords.iter().any(|k| specialization.contains(k)))
    })
}

/// Check the nurse against every requested service term; no terms passes
#[inline]
pub fn matches_services(nurse: &Nurse, services: &[String]) -> bool {
    services.is_empty() || services.iter().any(|service| matches_service(nurse, service))
}

/// Hard filters every returned match satisfies
///
/// Availability must be positive; distance must be within the radius when
/// both are known.
#[inline]
pub fn passes_hard_filters(availability_ratio: f64, distance_km: Option<f64>, radius_km: Option<f64>) -> bool {
    if availability_ratio <= 0.0 {
        return false;
    }

    match (distance_km, radius_km) {
        (Some(distance), Some(radius)) => distance <= radius,
        _ => true,
    }
}
