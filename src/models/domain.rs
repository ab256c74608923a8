use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Seconds in one day; also the largest valid `ClockTime`.
pub const SECONDS_PER_DAY: u32 = 86_400;

/// Day key used in a nurse's weekly availability map
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    #[serde(alias = "sunday")]
    Sun,
    #[serde(alias = "monday")]
    Mon,
    #[serde(alias = "tuesday")]
    Tue,
    #[serde(alias = "wednesday")]
    Wed,
    #[serde(alias = "thursday")]
    Thu,
    #[serde(alias = "friday")]
    Fri,
    #[serde(alias = "saturday")]
    Sat,
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Sun => DayOfWeek::Sun,
            Weekday::Mon => DayOfWeek::Mon,
            Weekday::Tue => DayOfWeek::Tue,
            Weekday::Wed => DayOfWeek::Wed,
            Weekday::Thu => DayOfWeek::Thu,
            Weekday::Fri => DayOfWeek::Fri,
            Weekday::Sat => DayOfWeek::Sat,
        }
    }
}

/// Time of day, stored as seconds since midnight
///
/// Parsed from `HH:MM` or `HH:MM:SS`. `24:00` is accepted and means end of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u32);

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(0);
    pub const END_OF_DAY: ClockTime = ClockTime(SECONDS_PER_DAY);

    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Option<Self> {
        if hour > 24 || minute >= 60 || second >= 60 {
            return None;
        }
        let total = hour * 3600 + minute * 60 + second;
        (total <= SECONDS_PER_DAY).then_some(ClockTime(total))
    }

    pub fn seconds(self) -> u32 {
        self.0
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        let parts: Vec<&str> = value.trim().split(':').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(format!("invalid clock time '{}', expected HH:MM", value));
        }

        let mut fields = [0u32; 3];
        for (slot, part) in fields.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| format!("invalid clock time '{}', expected HH:MM", value))?;
        }

        ClockTime::from_hms(fields[0], fields[1], fields[2])
            .ok_or_else(|| format!("clock time '{}' is out of range", value))
    }
}

impl TryFrom<String> for ClockTime {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ClockTime::parse(&value)
    }
}

impl From<ClockTime> for String {
    fn from(time: ClockTime) -> Self {
        time.to_string()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (hours, rest) = (self.0 / 3600, self.0 % 3600);
        let (minutes, seconds) = (rest / 60, rest % 60);
        if seconds == 0 {
            write!(f, "{:02}:{:02}", hours, minutes)
        } else {
            write!(f, "{:02}:{:02}:{:02}", hours, minutes, seconds)
        }
    }
}

/// One open window within a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenWindow {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl OpenWindow {
    pub fn new(start: ClockTime, end: ClockTime) -> Self {
        Self { start, end }
    }

    /// Window bounds in seconds since midnight.
    ///
    /// A window whose end is not after its start is clipped at midnight.
    pub fn bounds(&self) -> (u32, u32) {
        let start = self.start.seconds();
        let end = if self.end > self.start {
            self.end.seconds()
        } else {
            SECONDS_PER_DAY
        };
        (start, end)
    }
}

/// Weekly availability: weekday → open windows on that day
pub type Availability = BTreeMap<DayOfWeek, Vec<OpenWindow>>;

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    #[serde(alias = "lon")]
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Nurse record from the roster. Read-only for the duration of a match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nurse {
    pub id: String,
    pub name: String,
    #[serde(alias = "municipality", alias = "city", default, deserialize_with = "one_or_many")]
    pub municipalities: Vec<String>,
    #[serde(alias = "services", default, deserialize_with = "one_or_many")]
    pub specializations: Vec<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(alias = "lon", default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(rename = "reviewsCount", alias = "reviews", default)]
    pub reviews_count: Option<u32>,
    #[serde(default)]
    pub availability: Availability,
    #[serde(
        rename = "expertiseTags",
        alias = "expertise",
        default,
        deserialize_with = "one_or_many"
    )]
    pub expertise_tags: Vec<String>,
}

impl Nurse {
    /// Location, when both coordinates are known
    pub fn coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates::new(self.lat?, self.lng?))
    }

    pub fn primary_municipality(&self) -> Option<&str> {
        self.municipalities.first().map(String::as_str)
    }
}

/// Accept either a single string or a list of strings
pub(crate) fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Null(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
        OneOrMany::Null(()) => Vec::new(),
    })
}

/// Weights for the fuzzy scorer's four components
///
/// Missing fields take their default individually; values are not validated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub services: f64,
    pub expertise: f64,
    pub location: f64,
    pub availability: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            services: 0.3,
            expertise: 0.3,
            location: 0.2,
            availability: 0.2,
        }
    }
}

/// Normalized query handed to the matchers
///
/// Every field is optional; each matcher fills gaps with its own defaults.
#[derive(Debug, Clone, Default)]
pub struct MatchQuery {
    pub city: Option<String>,
    pub services: Vec<String>,
    pub expertise: Vec<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub day: Option<DayOfWeek>,
    pub origin: Option<Coordinates>,
    pub radius_km: Option<f64>,
    pub urgent: bool,
    pub top_k: Option<usize>,
    pub weights: Option<ScoringWeights>,
}

/// Per-result metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchMeta {
    #[serde(rename = "distanceKm")]
    pub distance_km: Option<f64>,
    #[serde(rename = "availabilityRatio")]
    pub availability_ratio: f64,
    pub rating: Option<f64>,
    #[serde(rename = "reviewsCount")]
    pub reviews_count: Option<u32>,
}

/// A ranked nurse returned by a matcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub id: String,
    pub name: String,
    pub municipality: Option<String>,
    pub specializations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub score: Option<f64>,
    pub reason: String,
    pub meta: MatchMeta,
}

impl MatchResult {
    pub fn new(
        nurse: &Nurse,
        score: Option<f64>,
        reason: String,
        distance_km: Option<f64>,
        availability_ratio: f64,
    ) -> Self {
        Self {
            id: nurse.id.clone(),
            name: nurse.name.clone(),
            municipality: nurse.primary_municipality().map(str::to_string),
            specializations: nurse.specializations.clone(),
            score,
            reason,
            meta: MatchMeta {
                distance_km,
                availability_ratio,
                rating: nurse.rating,
                reviews_count: nurse.reviews_count,
            },
        }
    }
}
