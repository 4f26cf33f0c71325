use std::fmt::{self, Debug, Display};
use std::io;

use crate::agent::AgentId;
use crate::place::PlaceId;

/// Provides `EpiError` and maps to other errors to
/// convert to an `EpiError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum EpiError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CSVError(csv::Error),
    /// An `Entry` holding agents was passed where places were expected.
    NotAPlace,
    /// An `Entry` holding places was passed where agents were expected.
    NotAnAgent,
    /// No place had room for the agent during initial placement.
    PlacementExhausted {
        agent: String,
    },
    DuplicateName(String),
    UnknownPlace(PlaceId),
    UnknownAgent(AgentId),
    InvalidParameter(String),
    ReportError(String),
    EpiError(String),
}

impl From<io::Error> for EpiError {
    fn from(error: io::Error) -> Self {
        EpiError::IoError(error)
    }
}

impl From<serde_json::Error> for EpiError {
    fn from(error: serde_json::Error) -> Self {
        EpiError::JsonError(error)
    }
}

impl From<csv::Error> for EpiError {
    fn from(error: csv::Error) -> Self {
        EpiError::CSVError(error)
    }
}

impl From<String> for EpiError {
    fn from(error: String) -> Self {
        EpiError::EpiError(error)
    }
}

impl From<&str> for EpiError {
    fn from(error: &str) -> Self {
        EpiError::EpiError(error.to_string())
    }
}

impl std::error::Error for EpiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EpiError::IoError(error) => Some(error),
            EpiError::JsonError(error) => Some(error),
            EpiError::CSVError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for EpiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EpiError::NotAPlace => write!(f, "Error: cannot add non-place to world"),
            EpiError::NotAnAgent => write!(f, "Error: cannot add non-agent to world"),
            EpiError::PlacementExhausted { agent } => {
                write!(f, "Error: no place has capacity for agent {agent}")
            }
            EpiError::DuplicateName(name) => write!(f, "Error: name {name} is already in use"),
            EpiError::UnknownPlace(place_id) => write!(f, "Error: unknown place {place_id}"),
            EpiError::UnknownAgent(agent_id) => write!(f, "Error: unknown agent {agent_id}"),
            EpiError::InvalidParameter(message) => write!(f, "Error: invalid parameter: {message}"),
            _ => write!(f, "Error: {self:?}"),
        }
    }
}
