//! Search backend gateway.
//!
//! This module provides:
//! - The transport-agnostic [`SearchGateway`] contract the session store
//!   issues its two remote operations against
//! - Wire types for the backend's JSON shapes
//! - [`HttpGateway`], the reqwest implementation with timeout and retry

mod client;
mod types;

pub use client::HttpGateway;
pub use types::{
    Feedback, RefineRequest, RefineResponse, Refinement, SearchRequest, SearchResponse,
    SearchResult,
};

use async_trait::async_trait;

use crate::error::GatewayResult;

/// Contract against the remote search/refine service.
///
/// Both operations are asynchronous and may fail; callers must await them to
/// completion before applying any state change. At most one outstanding
/// request is permitted per box id - the session store's pending latch
/// enforces that, not the gateway.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchGateway: Send + Sync {
    /// Run a fresh search, returning up to 3 results in backend order.
    async fn search(&self, query: String) -> GatewayResult<Vec<SearchResult>>;

    /// Refine an existing 3-result set based on feedback for one result.
    ///
    /// Returns a [`Refinement`] whose shape is already validated against the
    /// feedback kind (two results for similar, one for different).
    async fn refine(
        &self,
        feedback: Feedback,
        clicked_result: SearchResult,
        all_results: [SearchResult; 3],
        result_index: usize,
    ) -> GatewayResult<Refinement>;
}
