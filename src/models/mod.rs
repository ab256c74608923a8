// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Availability, ClockTime, Coordinates, DayOfWeek, MatchMeta, MatchQuery, MatchResult, Nurse,
    OpenWindow, ScoringWeights,
};
pub use requests::MatchRequest;
pub use responses::{EngineInfo, EngineStatus, EnginesResponse, ErrorResponse, HealthResponse, MatchResponse};
