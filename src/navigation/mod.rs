//! Box navigation: action gating and view synchronization.
//!
//! The [`Navigator`] mediates user-facing actions against the session store,
//! keeping history read-only (only the latest box takes input) and telling
//! the renderer which box to center whenever the current pointer moves. The
//! pixel math itself lives in [`Viewport`] so it stays a pure function of
//! measured layout.

use std::sync::Arc;

use crate::error::{AppResult, SessionError};
use crate::gateway::Feedback;
use crate::session::{HopId, HopKind, SessionStore};

/// One-shot instruction to center a box in the scroll container, emitted
/// immediately after the current pointer changes (never before).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollTo {
    pub hop_id: HopId,
}

/// Measured layout of a box inside the scroll container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HopLayout {
    /// Offset of the box's top edge from the container top.
    pub top: f64,
    /// Rendered height of the box.
    pub height: f64,
    /// Visible height of the scroll container.
    pub container_height: f64,
}

/// Scroll geometry with a header height captured once after first layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct Viewport {
    header_height: Option<f64>,
}

impl Viewport {
    /// Record the header height. The first measurement wins; later calls are
    /// ignored so reflows cannot shift the centering baseline.
    pub fn measure_header(&mut self, height: f64) {
        if self.header_height.is_none() {
            self.header_height = Some(height);
        }
    }

    /// Measured header height, if any.
    pub fn header_height(&self) -> Option<f64> {
        self.header_height
    }

    /// Scroll offset that centers a box in the visible viewport area,
    /// excluding header space. `None` until the header has been measured.
    pub fn scroll_target(&self, layout: &HopLayout) -> Option<f64> {
        let header = self.header_height?;
        Some(layout.top - (layout.container_height - layout.height) / 2.0 - header / 2.0)
    }
}

/// Mediates user actions against the store and drives scroll-to-box.
pub struct Navigator {
    store: Arc<SessionStore>,
    viewport: Viewport,
}

impl Navigator {
    /// Create a navigator over a session store.
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self {
            store,
            viewport: Viewport::default(),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Scroll geometry, for renderers that have layout measurements.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Record the header height (first measurement wins).
    pub fn measure_header(&mut self, height: f64) {
        self.viewport.measure_header(height);
    }

    /// True iff `hop_id` is the box with the highest id.
    pub fn is_latest(&self, hop_id: HopId) -> bool {
        hop_id == self.store.latest_hop_id()
    }

    /// Whether the box can take a new submission right now: it must be the
    /// latest box (or the next id) and have no request in flight.
    pub fn can_accept_input(&self, hop_id: HopId) -> bool {
        (self.is_latest(hop_id) || hop_id == self.store.next_hop_id())
            && !self.store.is_pending(hop_id)
    }

    /// Whether feedback buttons are enabled for the box: latest, holding a
    /// full result set, nothing in flight.
    pub fn can_give_feedback(&self, hop_id: HopId) -> bool {
        if !self.is_latest(hop_id) || self.store.is_pending(hop_id) {
            return false;
        }
        self.store
            .hop(hop_id)
            .map(|hop| hop.kind == HopKind::Results && hop.result_slice().len() == 3)
            .unwrap_or(false)
    }

    /// Submit a query, gated to the latest box or a brand-new one.
    ///
    /// Returns a [`ScrollTo`] when the current pointer moved.
    pub async fn submit_query(
        &self,
        query: &str,
        target: HopId,
    ) -> AppResult<Option<ScrollTo>> {
        if !self.is_latest(target) && target != self.store.next_hop_id() {
            return Err(SessionError::HistoryReadOnly { hop_id: target }.into());
        }

        let before = self.store.current_hop();
        self.store.submit_query(query, target).await?;
        Ok(self.scroll_if_moved(before))
    }

    /// Give feedback on the latest box's results.
    pub async fn give_feedback(
        &self,
        feedback: Feedback,
        hop_id: HopId,
        result_index: usize,
    ) -> AppResult<Option<ScrollTo>> {
        if !self.is_latest(hop_id) {
            return Err(SessionError::HistoryReadOnly { hop_id }.into());
        }

        let before = self.store.current_hop();
        self.store.give_feedback(feedback, hop_id, result_index).await?;
        Ok(self.scroll_if_moved(before))
    }

    /// Jump to an existing box. Always scrolls to the target.
    pub fn jump_to(&self, hop_id: HopId) -> AppResult<ScrollTo> {
        self.store.jump_to(hop_id)?;
        Ok(ScrollTo { hop_id })
    }

    fn scroll_if_moved(&self, before: HopId) -> Option<ScrollTo> {
        let now = self.store.current_hop();
        (now != before).then_some(ScrollTo { hop_id: now })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::gateway::{MockSearchGateway, Refinement, SearchResult};

    fn result(title: &str) -> SearchResult {
        SearchResult::new(title, "d", "i", "u")
    }

    fn navigator_with_searches() -> Navigator {
        let mut gateway = MockSearchGateway::new();
        gateway
            .expect_search()
            .returning(|_| Ok(vec![result("a"), result("b"), result("c")]));
        gateway
            .expect_refine()
            .returning(|_, _, _, _| Ok(Refinement::Different(result("z"))));
        Navigator::new(Arc::new(SessionStore::new(Arc::new(gateway))))
    }

    #[test]
    fn test_scroll_target_centers_box_below_header() {
        let mut viewport = Viewport::default();
        assert!(viewport
            .scroll_target(&HopLayout {
                top: 1000.0,
                height: 400.0,
                container_height: 800.0,
            })
            .is_none());

        viewport.measure_header(100.0);
        let target = viewport
            .scroll_target(&HopLayout {
                top: 1000.0,
                height: 400.0,
                container_height: 800.0,
            })
            .unwrap();

        // 1000 - (800 - 400)/2 - 100/2
        assert_eq!(target, 750.0);
    }

    #[test]
    fn test_header_measured_once() {
        let mut viewport = Viewport::default();
        viewport.measure_header(100.0);
        viewport.measure_header(250.0);
        assert_eq!(viewport.header_height(), Some(100.0));
    }

    #[tokio::test]
    async fn test_submit_emits_scroll_on_pointer_change() {
        let navigator = navigator_with_searches();

        let scroll = navigator.submit_query("cats", 1).await.unwrap();
        // Box 1 was already current, the pointer did not move.
        assert_eq!(scroll, None);

        let scroll = navigator.submit_query("dogs", 2).await.unwrap();
        assert_eq!(scroll, Some(ScrollTo { hop_id: 2 }));
    }

    #[tokio::test]
    async fn test_feedback_rejected_on_non_latest_box() {
        let navigator = navigator_with_searches();
        navigator.submit_query("cats", 1).await.unwrap();
        navigator.submit_query("dogs", 2).await.unwrap();

        let err = navigator
            .give_feedback(Feedback::Different, 1, 0)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Session(SessionError::HistoryReadOnly { hop_id: 1 })
        ));
        assert!(!navigator.can_give_feedback(1));
        assert!(navigator.can_give_feedback(2));
    }

    #[tokio::test]
    async fn test_submit_rejected_on_non_latest_box() {
        let navigator = navigator_with_searches();
        navigator.submit_query("cats", 1).await.unwrap();
        navigator.submit_query("dogs", 2).await.unwrap();

        let err = navigator.submit_query("ferrets", 1).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Session(SessionError::HistoryReadOnly { hop_id: 1 })
        ));
    }

    #[tokio::test]
    async fn test_feedback_advances_and_scrolls() {
        let navigator = navigator_with_searches();
        navigator.submit_query("cats", 1).await.unwrap();

        let scroll = navigator
            .give_feedback(Feedback::Different, 1, 0)
            .await
            .unwrap();
        assert_eq!(scroll, Some(ScrollTo { hop_id: 2 }));
        assert!(navigator.is_latest(2));
    }

    #[tokio::test]
    async fn test_jump_always_scrolls() {
        let navigator = navigator_with_searches();
        navigator.submit_query("cats", 1).await.unwrap();
        navigator.submit_query("dogs", 2).await.unwrap();

        let scroll = navigator.jump_to(1).unwrap();
        assert_eq!(scroll, ScrollTo { hop_id: 1 });
        assert_eq!(navigator.store().current_hop(), 1);
    }
}
