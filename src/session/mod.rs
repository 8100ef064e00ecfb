//! Session state for the hopscotch exploration trail.
//!
//! This module provides:
//! - Core value types ([`Hop`], [`ReferencePoint`])
//! - [`SessionState`], the pure single-source-of-truth reducer over the
//!   box sequence, current pointer, pending requests and reference points
//! - [`SessionStore`], the async orchestrator that drives gateway calls
//!   around the reducer

mod state;
mod store;


pub use state::{PendingKind, RequestTicket, SessionState};
pub use store::SessionStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gateway::SearchResult;

/// Identifier of one box in the trail. Strictly increasing, never reused.
pub type HopId = u32;

/// One step in the exploration sequence: a query slot and, once a response
/// has arrived, its up-to-3 results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hop {
    /// Stable identity and ordering key.
    pub id: HopId,
    /// Whether this box is still awaiting a query or holds results.
    #[serde(rename = "type")]
    pub kind: HopKind,
    /// Text submitted for this box, absent for a not-yet-submitted input box.
    pub query: Option<String>,
    /// Ordered results, present only for `results` boxes.
    pub results: Option<Vec<SearchResult>>,
}

/// Lifecycle state of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HopKind {
    /// Awaiting a query.
    Input,
    /// Holding up to 3 results.
    Results,
}

impl Hop {
    /// Create a fresh input box.
    pub fn input(id: HopId) -> Self {
        Self {
            id,
            kind: HopKind::Input,
            query: None,
            results: None,
        }
    }

    /// Create a results box.
    pub fn results(id: HopId, query: impl Into<String>, results: Vec<SearchResult>) -> Self {
        Self {
            id,
            kind: HopKind::Results,
            query: Some(query.into()),
            results: Some(results),
        }
    }

    /// Results slice, empty when none have arrived.
    pub fn result_slice(&self) -> &[SearchResult] {
        self.results.as_deref().unwrap_or_default()
    }
}

/// A user-marked positive/steering signal tied to a specific result and box.
///
/// The collection is append-only: entries are never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePoint {
    /// The originating result.
    pub result: SearchResult,
    /// Box that produced the result.
    pub hop_id: HopId,
    /// What kind of interaction recorded this point.
    pub source: ReferenceSource,
    /// Free text used for a steering-style refinement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steering_text: Option<String>,
    /// When the point was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Origin of a reference point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceSource {
    /// Plain "similar" feedback on a result.
    Similar,
    /// A steering-style mark, optionally with free text.
    Steering,
}

impl ReferencePoint {
    /// Record a point from "similar" feedback.
    pub fn similar(result: SearchResult, hop_id: HopId) -> Self {
        Self {
            result,
            hop_id,
            source: ReferenceSource::Similar,
            steering_text: None,
            recorded_at: Utc::now(),
        }
    }

    /// Record a steering mark, optionally carrying the steering text.
    pub fn steering(result: SearchResult, hop_id: HopId, steering_text: Option<String>) -> Self {
        Self {
            result,
            hop_id,
            source: ReferenceSource::Steering,
            steering_text,
            recorded_at: Utc::now(),
        }
    }
}
