use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, GatewayResult};

/// One candidate item returned by the search backend.
///
/// Immutable value data; `image_url` and `url` may point at unreachable
/// resources and consumers must degrade gracefully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub url: String,
}

/// Relevance feedback a user can give on a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    /// "More like this one" - the clicked result stays, the other two are replaced.
    Similar,
    /// "Not this one" - only the clicked result is replaced.
    Different,
}

impl Feedback {
    /// Result slots that a refine request for this feedback will replace.
    ///
    /// `clicked` must be 0-2; callers validate before building a request.
    pub fn loading_indices(self, clicked: usize) -> Vec<usize> {
        match self {
            Feedback::Similar => (0..3).filter(|&i| i != clicked).collect(),
            Feedback::Different => vec![clicked],
        }
    }

    /// Number of results the backend contract returns for this feedback kind.
    pub fn expected_results(self) -> usize {
        match self {
            Feedback::Similar => 2,
            Feedback::Different => 1,
        }
    }
}

impl std::fmt::Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Feedback::Similar => write!(f, "similar"),
            Feedback::Different => write!(f, "different"),
        }
    }
}

/// Body for `POST /api/search`
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub query: String,
}

/// Response from `POST /api/search`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

/// Body for `POST /api/refine` (field names match the backend's wire shape)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefineRequest {
    pub feedback: Feedback,
    pub clicked_result: SearchResult,
    pub all_results: [SearchResult; 3],
    pub result_index: usize,
}

/// Response from `POST /api/refine`
#[derive(Debug, Clone, Deserialize)]
pub struct RefineResponse {
    pub results: Vec<SearchResult>,
}

/// Validated outcome of a refine call.
///
/// The backend returns a loosely-shaped array whose length depends on the
/// feedback kind; parsing into a tagged variant makes a mismatched count a
/// gateway error instead of an out-of-range index later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refinement {
    /// Two replacements for the non-clicked slots.
    Similar([SearchResult; 2]),
    /// One replacement for the clicked slot.
    Different(SearchResult),
}

impl Refinement {
    /// Validate a raw refine response against the feedback kind it answered.
    pub fn from_results(feedback: Feedback, mut results: Vec<SearchResult>) -> GatewayResult<Self> {
        match feedback {
            Feedback::Similar => match <[SearchResult; 2]>::try_from(results) {
                Ok(pair) => Ok(Refinement::Similar(pair)),
                Err(rest) => Err(GatewayError::UnexpectedResultCount {
                    operation: "refine".to_string(),
                    expected: "exactly 2".to_string(),
                    got: rest.len(),
                }),
            },
            Feedback::Different => {
                if results.len() == 1 {
                    Ok(Refinement::Different(results.remove(0)))
                } else {
                    Err(GatewayError::UnexpectedResultCount {
                        operation: "refine".to_string(),
                        expected: "exactly 1".to_string(),
                        got: results.len(),
                    })
                }
            }
        }
    }

    /// Merge this refinement into the originating 3-slot result set.
    ///
    /// For `Similar` the two replacements fill the non-clicked slots in
    /// ascending index order; for `Different` only the clicked slot changes.
    /// `clicked_index` must be 0-2.
    pub fn apply_to(
        &self,
        all: &[SearchResult; 3],
        clicked_index: usize,
    ) -> [SearchResult; 3] {
        debug_assert!(clicked_index < 3);
        let mut merged = all.clone();
        match self {
            Refinement::Similar(pair) => {
                let slots: Vec<usize> = (0..3).filter(|&i| i != clicked_index).collect();
                merged[slots[0]] = pair[0].clone();
                merged[slots[1]] = pair[1].clone();
            }
            Refinement::Different(replacement) => {
                merged[clicked_index] = replacement.clone();
            }
        }
        merged
    }
}

impl SearchResult {
    /// Construct a result from its four wire fields.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        image_url: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            image_url: image_url.into(),
            url: url.into(),
        }
    }
}
