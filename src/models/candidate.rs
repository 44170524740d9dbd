//! Candidate items produced by the sources.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One fetched item considered for matching and delivery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Candidate {
    /// Identifier unique per source item
    pub id: String,

    /// Post text as fetched
    pub raw_text: String,
}

impl Candidate {
    pub fn new(id: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            raw_text: raw_text.into(),
        }
    }
}

/// Which acquisition path produced a candidate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidateOrigin {
    Primary,
    Mirror { endpoint: String },
}

impl fmt::Display for CandidateOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateOrigin::Primary => write!(f, "primary"),
            CandidateOrigin::Mirror { endpoint } => write!(f, "mirror {endpoint}"),
        }
    }
}

/// A candidate together with the path that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourcedCandidate {
    pub candidate: Candidate,
    pub origin: CandidateOrigin,
}
