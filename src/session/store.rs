use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use super::state::{PendingKind, SessionState};
use super::{Hop, HopId, ReferencePoint};
use crate::error::{AppResult, SessionError};
use crate::gateway::{Feedback, SearchGateway, SearchResult};

/// Async orchestrator around [`SessionState`].
///
/// Holds the state behind a mutex that is never held across an await; the
/// per-box pending latch in the state is what serializes requests for the
/// same box across suspension points. All gateway failures leave the box
/// sequence exactly as it was before the call, with the latch released.
pub struct SessionStore {
    state: Mutex<SessionState>,
    gateway: Arc<dyn SearchGateway>,
}

impl SessionStore {
    /// Create a store for a fresh session.
    pub fn new(gateway: Arc<dyn SearchGateway>) -> Self {
        Self {
            state: Mutex::new(SessionState::new()),
            gateway,
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clone of the current session state, for projections and rendering.
    pub fn snapshot(&self) -> SessionState {
        self.state().clone()
    }

    /// Id of the current box.
    pub fn current_hop(&self) -> HopId {
        self.state().current()
    }

    /// Id of the latest (highest-id) box.
    pub fn latest_hop_id(&self) -> HopId {
        self.state().latest_hop_id()
    }

    /// Id the next appended box will get.
    pub fn next_hop_id(&self) -> HopId {
        self.state().next_hop_id()
    }

    /// Whether a request is in flight for `hop_id`.
    pub fn is_pending(&self, hop_id: HopId) -> bool {
        self.state().is_pending(hop_id)
    }

    /// Look up a box by id.
    pub fn hop(&self, hop_id: HopId) -> Option<Hop> {
        self.state().hop(hop_id).cloned()
    }

    /// Submit a query for `target`, which must be an existing box (re-run in
    /// place) or exactly the next id (create a new box).
    ///
    /// On success the target box holds the results and becomes current; the
    /// applied box id is returned. On failure the box sequence is unchanged
    /// and the error is recoverable - the user may retry the same action.
    pub async fn submit_query(&self, query: &str, target: HopId) -> AppResult<HopId> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(SessionError::EmptyQuery.into());
        }

        let ticket = {
            let mut state = self.state();
            let next = state.next_hop_id();
            if target != next && state.hop(target).is_none() {
                return Err(SessionError::InvalidTargetHop {
                    hop_id: target,
                    next_id: next,
                }
                .into());
            }
            state.begin_request(target, PendingKind::WholeHop)?
        };

        debug!(hop_id = target, query = %trimmed, "Submitting search");

        let outcome = self.gateway.search(trimmed.to_string()).await;

        let mut state = self.state();
        let live = state.finish_request(&ticket);

        let results = match outcome {
            Ok(results) => results,
            Err(e) => {
                warn!(hop_id = target, error = %e, "Search failed, box sequence unchanged");
                return Err(e.into());
            }
        };

        if !live {
            debug!(hop_id = target, "Discarding stale search response");
            return Ok(state.current());
        }

        let applied = state.apply_search(&ticket, trimmed, results);
        info!(
            hop_id = applied,
            total_hops = state.hops().len(),
            "Search applied"
        );
        Ok(applied)
    }

    /// Give similar/different feedback on result `result_index` of box
    /// `hop_id` and append the refined box the response produces.
    ///
    /// Latestness is not checked here - the navigation layer disables
    /// feedback on non-latest boxes, and the store simply proceeds when
    /// called regardless. The box must hold a full set of 3 results.
    ///
    /// A `similar` click records its reference point before the request is
    /// issued; the point is kept even when the refine itself fails.
    pub async fn give_feedback(
        &self,
        feedback: Feedback,
        hop_id: HopId,
        result_index: usize,
    ) -> AppResult<HopId> {
        if result_index > 2 {
            return Err(SessionError::ResultIndexOutOfRange {
                index: result_index,
            }
            .into());
        }

        let (ticket, query, all_results, clicked) = {
            let mut state = self.state();
            let hop = state
                .hop(hop_id)
                .ok_or(SessionError::UnknownHop { hop_id })?;

            // The original client falls back to a generic query when feedback
            // lands on a box that somehow has none.
            let query = hop
                .query
                .clone()
                .unwrap_or_else(|| "refined search".to_string());

            let all_results: [SearchResult; 3] =
                hop.result_slice().to_vec().try_into().map_err(
                    |partial: Vec<SearchResult>| SessionError::IncompleteResults {
                        hop_id,
                        count: partial.len(),
                    },
                )?;
            let clicked = all_results[result_index].clone();

            let indices = feedback.loading_indices(result_index);
            let ticket = state.begin_request(hop_id, PendingKind::Results(indices))?;

            if feedback == Feedback::Similar {
                state.record_reference(ReferencePoint::similar(clicked.clone(), hop_id));
            }

            (ticket, query, all_results, clicked)
        };

        debug!(hop_id, feedback = %feedback, result_index, "Submitting refine");

        let outcome = self
            .gateway
            .refine(feedback, clicked, all_results.clone(), result_index)
            .await;

        let mut state = self.state();
        let live = state.finish_request(&ticket);

        let refinement = match outcome {
            Ok(refinement) => refinement,
            Err(e) => {
                warn!(hop_id, error = %e, "Refine failed, box sequence unchanged");
                return Err(e.into());
            }
        };

        if !live {
            debug!(hop_id, "Discarding stale refine response");
            return Ok(state.current());
        }

        let merged = refinement.apply_to(&all_results, result_index);
        let new_id = state.apply_refinement(&query, merged);
        info!(
            from_hop = hop_id,
            new_hop = new_id,
            feedback = %feedback,
            "Refinement applied"
        );
        Ok(new_id)
    }

    /// Record a steering-style reference point for result `result_index` of
    /// box `hop_id`. Pure append; no request is issued.
    pub fn add_reference_point(
        &self,
        hop_id: HopId,
        result_index: usize,
        steering_text: Option<String>,
    ) -> AppResult<()> {
        let mut state = self.state();
        let hop = state
            .hop(hop_id)
            .ok_or(SessionError::UnknownHop { hop_id })?;
        let result = hop
            .result_slice()
            .get(result_index)
            .cloned()
            .ok_or(SessionError::ResultIndexOutOfRange {
                index: result_index,
            })?;

        state.record_reference(ReferencePoint::steering(result, hop_id, steering_text));
        Ok(())
    }

    /// Move the current pointer to an existing box.
    pub fn jump_to(&self, hop_id: HopId) -> AppResult<()> {
        self.state().jump_to(hop_id)?;
        debug!(hop_id, "Jumped to box");
        Ok(())
    }
}
