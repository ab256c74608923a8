use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use crate::models::Nurse;

/// Demo roster bundled with the binary
const DEMO_ROSTER_JSON: &str = include_str!("../../data/demo_roster.json");

/// Errors that can occur while loading a roster
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Failed to read roster file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid roster JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Duplicate nurse id: {0}")]
    DuplicateId(String),
}

/// Read-only, in-memory collection of nurses shared by all requests
#[derive(Debug, Clone)]
pub struct Roster {
    nurses: Vec<Nurse>,
}

impl Roster {
    /// Build a roster, rejecting duplicate ids
    pub fn new(nurses: Vec<Nurse>) -> Result<Self, RosterError> {
        let mut seen = HashSet::with_capacity(nurses.len());
        for nurse in &nurses {
            if !seen.insert(nurse.id.as_str()) {
                return Err(RosterError::DuplicateId(nurse.id.clone()));
            }
        }
        Ok(Self { nurses })
    }

    pub fn from_json_str(json: &str) -> Result<Self, RosterError> {
        let nurses: Vec<Nurse> = serde_json::from_str(json)?;
        Self::new(nurses)
    }

    /// Load a roster from a JSON file holding an array of nurses
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RosterError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| RosterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let roster = Self::from_json_str(&json)?;
        tracing::info!("Loaded {} nurses from {}", roster.len(), path.display());
        Ok(roster)
    }

    /// The bundled ten-nurse demo roster
    pub fn demo() -> Result<Self, RosterError> {
        Self::from_json_str(DEMO_ROSTER_JSON)
    }

    pub fn nurses(&self) -> &[Nurse] {
        &self.nurses
    }

    pub fn len(&self) -> usize {
        self.nurses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nurses.is_empty()
    }
}
