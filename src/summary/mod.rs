//! Session replay projection for the summary view.
//!
//! A [`SummaryView`] is a pure, read-only derivation over a
//! [`SessionState`] snapshot: result boxes, the collapsed prompt history,
//! reference points and a locally selectable box. Selecting a box here never
//! touches the underlying session.

use serde::Serialize;

use crate::session::{Hop, HopId, HopKind, ReferencePoint, SessionState};

/// One run of identical consecutive queries, keyed by the first box id of
/// the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptEntry {
    pub hop_id: HopId,
    pub query: String,
}

/// Read-only replay of a session for the summary view.
#[derive(Debug, Clone)]
pub struct SummaryView {
    result_hops: Vec<Hop>,
    prompts: Vec<PromptEntry>,
    reference_points: Vec<ReferencePoint>,
    selected: Option<HopId>,
    summary_id: Option<String>,
}

impl SummaryView {
    /// Derive the projection from a session snapshot.
    pub fn project(state: &SessionState) -> Self {
        let result_hops: Vec<Hop> = state
            .hops()
            .iter()
            .filter(|hop| hop.kind == HopKind::Results && !hop.result_slice().is_empty())
            .cloned()
            .collect();

        let mut prompts: Vec<PromptEntry> = Vec::new();
        for hop in state.hops() {
            if let Some(query) = &hop.query {
                let repeat = prompts.last().map(|p| &p.query == query).unwrap_or(false);
                if !repeat {
                    prompts.push(PromptEntry {
                        hop_id: hop.id,
                        query: query.clone(),
                    });
                }
            }
        }

        // Start by showing the final box.
        let selected = result_hops.last().map(|hop| hop.id);

        Self {
            result_hops,
            prompts,
            reference_points: state.reference_points().to_vec(),
            selected,
            summary_id: state.summary_id().map(str::to_string),
        }
    }

    /// Boxes with results, ascending id order.
    pub fn result_hops(&self) -> &[Hop] {
        &self.result_hops
    }

    /// Collapsed prompt history.
    pub fn prompts(&self) -> &[PromptEntry] {
        &self.prompts
    }

    /// Reference points, oldest first.
    pub fn reference_points(&self) -> &[ReferencePoint] {
        &self.reference_points
    }

    /// The currently selected box, defaulting to the highest-id result box.
    pub fn selected(&self) -> Option<&Hop> {
        let id = self.selected?;
        self.result_hops.iter().find(|hop| hop.id == id)
    }

    /// Select a box locally. Returns false (and keeps the selection) when
    /// the id is not one of the result boxes.
    pub fn select(&mut self, hop_id: HopId) -> bool {
        if self.result_hops.iter().any(|hop| hop.id == hop_id) {
            self.selected = Some(hop_id);
            true
        } else {
            false
        }
    }

    /// Stable shareable id for this session, once any results exist.
    pub fn summary_id(&self) -> Option<&str> {
        self.summary_id.as_deref()
    }

    /// Id-qualified route for sharing, e.g. `/summary/ab12cd`.
    pub fn share_path(&self) -> Option<String> {
        self.summary_id
            .as_deref()
            .map(|id| format!("/summary/{}", id))
    }
}
