use std::collections::HashMap;

use tracing::warn;
use uuid::Uuid;

use super::{Hop, HopId, HopKind, ReferencePoint};
use crate::error::{SessionError, SessionResult};
use crate::gateway::SearchResult;

/// Granularity of a pending request on a box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingKind {
    /// A search request covering the whole box.
    WholeHop,
    /// A refine request covering specific result slots.
    Results(Vec<usize>),
}

#[derive(Debug, Clone)]
struct PendingRequest {
    kind: PendingKind,
    generation: u64,
}

/// Handle for one in-flight request, used to guard against a stale response
/// being applied after the box's pending entry has moved on.
///
/// The ticket also remembers whether the target box existed when the request
/// was issued, so a response for a then-nonexistent target can never update
/// a box some other request created at that id in the meantime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    hop_id: HopId,
    generation: u64,
    hop_existed: bool,
}

impl RequestTicket {
    /// Box this ticket was issued against.
    pub fn hop_id(&self) -> HopId {
        self.hop_id
    }
}

/// Single source of truth for the box sequence, current pointer, pending
/// requests and reference points.
///
/// Every method here is a deterministic, synchronous state transition; all
/// I/O lives in [`SessionStore`](super::SessionStore). Boxes are kept in
/// ascending id order and are never deleted - jumping only moves the
/// current pointer.
#[derive(Debug, Clone)]
pub struct SessionState {
    hops: Vec<Hop>,
    current: HopId,
    pending: HashMap<HopId, PendingRequest>,
    reference_points: Vec<ReferencePoint>,
    summary_id: Option<String>,
    next_generation: u64,
}

impl SessionState {
    /// Fresh session: one empty input box with id 1, which is current.
    pub fn new() -> Self {
        Self {
            hops: vec![Hop::input(1)],
            current: 1,
            pending: HashMap::new(),
            reference_points: Vec::new(),
            summary_id: None,
            next_generation: 0,
        }
    }

    /// All boxes in ascending id order.
    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    /// Look up a box by id.
    pub fn hop(&self, hop_id: HopId) -> Option<&Hop> {
        self.hops.iter().find(|h| h.id == hop_id)
    }

    /// Id of the current box.
    pub fn current(&self) -> HopId {
        self.current
    }

    /// The box with the highest id.
    ///
    /// This is the one derivation of "latest"; every latestness check in the
    /// crate goes through here.
    pub fn latest_hop_id(&self) -> HopId {
        self.hops.last().map(|h| h.id).unwrap_or(0)
    }

    /// Whether `hop_id` is the latest box.
    pub fn is_latest(&self, hop_id: HopId) -> bool {
        hop_id == self.latest_hop_id()
    }

    /// Id the next appended box will get: `max existing id + 1`.
    pub fn next_hop_id(&self) -> HopId {
        self.latest_hop_id() + 1
    }

    /// Recorded reference points, oldest first.
    pub fn reference_points(&self) -> &[ReferencePoint] {
        &self.reference_points
    }

    /// Shareable summary id, present once any results box exists.
    pub fn summary_id(&self) -> Option<&str> {
        self.summary_id.as_deref()
    }

    /// Whether a request is in flight for `hop_id`.
    pub fn is_pending(&self, hop_id: HopId) -> bool {
        self.pending.contains_key(&hop_id)
    }

    /// Pending granularity for `hop_id`, if a request is in flight.
    pub fn pending_kind(&self, hop_id: HopId) -> Option<&PendingKind> {
        self.pending.get(&hop_id).map(|p| &p.kind)
    }

    /// Claim the per-box latch for a new request.
    ///
    /// Fails with [`SessionError::HopBusy`] while another request for the
    /// same box is outstanding, which is what bounds the session to at most
    /// one in-flight request per box id.
    pub fn begin_request(
        &mut self,
        hop_id: HopId,
        kind: PendingKind,
    ) -> SessionResult<RequestTicket> {
        if self.pending.contains_key(&hop_id) {
            return Err(SessionError::HopBusy { hop_id });
        }

        let generation = self.next_generation;
        self.next_generation += 1;
        let hop_existed = self.hop(hop_id).is_some();
        self.pending.insert(hop_id, PendingRequest { kind, generation });

        Ok(RequestTicket {
            hop_id,
            generation,
            hop_existed,
        })
    }

    /// Release the latch for a completed request.
    ///
    /// Returns true when the ticket still matched the pending entry; a false
    /// return means the response is stale and must not be applied.
    pub fn finish_request(&mut self, ticket: &RequestTicket) -> bool {
        match self.pending.get(&ticket.hop_id) {
            Some(p) if p.generation == ticket.generation => {
                self.pending.remove(&ticket.hop_id);
                true
            }
            _ => false,
        }
    }

    /// Apply a successful search response.
    ///
    /// A target box that existed when the request was issued transitions in
    /// place to `results`; otherwise a new results box is appended at
    /// `next_hop_id()`. A target that only came into existence while the
    /// request was in flight belongs to some other request and is never
    /// updated in place. The current pointer moves to the applied box, whose
    /// id is returned.
    pub fn apply_search(
        &mut self,
        ticket: &RequestTicket,
        query: &str,
        results: Vec<SearchResult>,
    ) -> HopId {
        let target = ticket.hop_id;
        let existing = self
            .hops
            .iter_mut()
            .find(|h| ticket.hop_existed && h.id == target);

        let applied = if let Some(hop) = existing {
            hop.kind = HopKind::Results;
            hop.query = Some(query.to_string());
            hop.results = Some(results);
            target
        } else {
            // Ids stay unique and monotonic even if the trail grew while the
            // request was in flight.
            let id = self.next_hop_id();
            if id != target {
                warn!(
                    requested = target,
                    assigned = id,
                    "Search target superseded, appending at next id"
                );
            }
            self.hops.push(Hop::results(id, query, results));
            id
        };

        self.current = applied;
        self.ensure_summary_id();
        applied
    }

    /// Append the brand-new results box a refine produces and move the
    /// current pointer onto it. Returns the new id.
    pub fn apply_refinement(&mut self, query: &str, results: [SearchResult; 3]) -> HopId {
        let id = self.next_hop_id();
        self.hops.push(Hop::results(id, query, results.to_vec()));
        self.current = id;
        self.ensure_summary_id();
        id
    }

    /// Append a reference point.
    pub fn record_reference(&mut self, point: ReferencePoint) {
        self.reference_points.push(point);
    }

    /// Move the current pointer to an existing box. History is preserved:
    /// no box is deleted or mutated.
    pub fn jump_to(&mut self, hop_id: HopId) -> SessionResult<()> {
        if self.hop(hop_id).is_none() {
            return Err(SessionError::UnknownHop { hop_id });
        }
        self.current = hop_id;
        Ok(())
    }

    /// Generate the shareable id the first time a results box exists, and
    /// never regenerate it afterwards.
    fn ensure_summary_id(&mut self) {
        if self.summary_id.is_none() {
            self.summary_id = Some(Uuid::new_v4().simple().to_string());
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
