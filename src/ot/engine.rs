//! The operation engine: one per site, drives the transform control
//! algorithm.
//!
//! A locally authored edit is filed and returned untouched - it is by
//! definition already caused by everything this site knows. A received
//! edit is compared against the local causal state and, when it was
//! authored in a past state, is rewritten forward through every
//! intervening operation before the caller may apply it to the visible
//! document.
//!
//! # Transform cache
//!
//! Resolving one operation into another's context can recurse through the
//! whole backlog, so transformed copies are memoized. The memo lives on
//! the engine as a map from operation identity (site, seq) to its
//! previously computed transforms, looked up by exact causal-state
//! equality. Each operation's memo row is bounded by the number of known
//! sites minus one, oldest entry evicted first, so memory per operation
//! stays proportional to the session size.
//!
//! # Concurrency
//!
//! An engine is a plain owned value driven by sequential calls. There is
//! no suspension point and no shared state; cross-site coordination is
//! the transport's problem, and the transport only needs per-connection
//! FIFO delivery.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::ot::SeqId;
use crate::ot::SiteId;
use crate::ot::error::EngineError;
use crate::ot::history::HistoryBuffer;
use crate::ot::op::OpKind;
use crate::ot::op::Operation;
use crate::ot::primitives::difference::StateDifference;
use crate::ot::primitives::state::ClientState;
use crate::ot::table::ClientStateTable;

/// Per-site engine owning the causal state, history, and transform cache.
#[derive(Clone, Debug)]
pub struct OperationEngine {
    site_id: SiteId,
    client_state: ClientState,
    table: ClientStateTable,
    history: HistoryBuffer,
    cache: FxHashMap<(SiteId, SeqId), VecDeque<Operation>>,
}

impl OperationEngine {
    /// Create an engine for `site_id` with a causal vector covering all
    /// sites up to and including its own.
    pub fn new(site_id: SiteId) -> OperationEngine {
        let client_state = ClientState::with_sites(site_id as usize + 1);
        let table = ClientStateTable::new(client_state.clone(), site_id);
        return OperationEngine {
            site_id,
            client_state,
            table,
            history: HistoryBuffer::new(),
            cache: FxHashMap::default(),
        };
    }

    /// This engine's site id.
    pub fn site_id(&self) -> SiteId {
        return self.site_id;
    }

    /// Number of sites this engine has observed, including itself.
    pub fn site_count(&self) -> usize {
        return self.table.len();
    }

    /// Number of operations filed in the history buffer.
    pub fn buffer_size(&self) -> usize {
        return self.history.len();
    }

    /// An independent copy of the local causal state.
    pub fn copy_client_state(&self) -> ClientState {
        return self.client_state.clone();
    }

    /// Seed the causal state of a freshly joined site from a snapshot
    /// taken at the server. Must happen before the site authors anything.
    pub fn set_client_state(&mut self, mut state: ClientState) {
        state.grow_to(self.site_id as usize + 1);
        self.table.set_client_state(self.site_id, state.clone());
        self.client_state = state;
    }

    /// True if this engine has already incorporated the given operation.
    pub fn has_processed(&self, op: &Operation) -> bool {
        return self.client_state.seq_for_client(op.site_id()) >= op.seq_id();
    }

    /// Build an operation from the factory contract.
    ///
    /// Local operations adopt this engine's site id and current causal
    /// state; the passed `site`, `state`, and `order` are ignored. Remote
    /// operations take every field as given, with `order` already
    /// assigned by the total-order authority.
    #[allow(clippy::too_many_arguments)]
    pub fn create_op(
        &self,
        local: bool,
        key: &str,
        value: &str,
        kind: OpKind,
        position: usize,
        site: SiteId,
        state: &[u32],
        order: Option<u64>,
    ) -> Operation {
        if local {
            return Operation::new(
                kind,
                key,
                value,
                position,
                self.site_id,
                self.copy_client_state(),
                None,
                true,
            );
        }
        return Operation::new(
            kind,
            key,
            value,
            position,
            site,
            ClientState::from_slice(state),
            order,
            false,
        );
    }

    /// Create an operation and push it through the engine. Parameters as
    /// in `create_op`; returns what the caller should apply to the
    /// document, if anything.
    #[allow(clippy::too_many_arguments)]
    pub fn push(
        &mut self,
        local: bool,
        key: &str,
        value: &str,
        kind: OpKind,
        position: usize,
        site: SiteId,
        state: &[u32],
        order: Option<u64>,
    ) -> Result<Option<Operation>, EngineError> {
        let op = self.create_op(local, key, value, kind, position, site, state, order);
        if local {
            return Ok(Some(self.push_local(op)));
        }
        return self.push_remote(op);
    }

    /// File a locally authored operation. No transform is needed: the
    /// operation is already caused by everything this site knows.
    pub fn push_local(&mut self, op: Operation) -> Operation {
        self.client_state.set_seq_for_client(op.site_id(), op.seq_id());
        self.table
            .set_client_state(self.site_id, self.client_state.clone());
        self.history.add_local(op.clone());
        return op;
    }

    /// Process a received operation, transforming it when it was authored
    /// in a past causal state.
    ///
    /// Returns the operation to apply to the visible document, or `None`
    /// when nothing should be applied: either this site already processed
    /// it (the push only fills in total-order bookkeeping) or the
    /// transform nullified it.
    pub fn push_remote(&mut self, op: Operation) -> Result<Option<Operation>, EngineError> {
        if self.has_processed(&op) {
            tracing::trace!(
                site = op.site_id(),
                seq = op.seq_id(),
                "already processed, filing for order bookkeeping"
            );
            self.history.add_remote(op)?;
            return Ok(None);
        }

        let transformed = if self.client_state == *op.client_state() {
            tracing::trace!(site = op.site_id(), seq = op.seq_id(), "causal states match");
            Some(op.clone())
        } else {
            let diff = self.client_state.subtract(op.client_state());
            self.full_transform(&op, &diff)?
        };

        self.client_state.set_seq_for_client(op.site_id(), op.seq_id());
        self.table
            .set_client_state(self.site_id, self.client_state.clone());
        self.table.operation_update(&op);
        self.history.add_remote(op)?;

        return Ok(transformed);
    }

    /// Resolve `op` against the backlog of operations named by `diff`.
    ///
    /// Walks the backlog in total order. Each historical operation is
    /// first brought into `op`'s causal context - from the cache when a
    /// previous resolution is memoized, otherwise by recursing - and then
    /// `op` is transformed against it. The symmetric transform is cached
    /// as well so a later push from the other direction finds it.
    ///
    /// Returns `None` when a transform nullifies `op`; no further
    /// transforms can be meaningful after that.
    fn full_transform(
        &mut self,
        op: &Operation,
        diff: &StateDifference,
    ) -> Result<Option<Operation>, EngineError> {
        let backlog = self.history.ops_for_difference(diff)?;
        tracing::debug!(
            site = op.site_id(),
            seq = op.seq_id(),
            backlog = backlog.len(),
            "resolving operation against concurrent backlog"
        );

        let mut op = op.clone();
        for mut prev in backlog {
            if *op.client_state() != *prev.client_state() {
                match self.cached_transform(&prev, op.client_state()) {
                    Some(hit) => prev = hit,
                    None => {
                        let gap = op.client_state().subtract(prev.client_state());
                        if gap.is_empty() {
                            return Err(EngineError::EmptyDifference);
                        }
                        match self.full_transform(&prev, &gap)? {
                            Some(resolved) => prev = resolved,
                            None => {
                                // the historical op dissolved in this
                                // context; record it and move on
                                op.upgrade_client_state(&prev);
                                continue;
                            }
                        }
                    }
                }
            }

            if *op.client_state() != *prev.client_state() {
                return Err(EngineError::StateMismatch);
            }

            let before = op.clone();
            op = match op.transform_with(&prev) {
                Some(next) => next,
                None => return Ok(None),
            };
            self.cache_transform(op.clone());

            if let Some(symmetric) = prev.transform_with(&before) {
                self.cache_transform(symmetric);
            }
        }

        return Ok(Some(op));
    }

    /// A memoized transform of `op` into exactly `state`, if one exists.
    fn cached_transform(&self, op: &Operation, state: &ClientState) -> Option<Operation> {
        let row = self.cache.get(&op.id())?;
        for candidate in row {
            if candidate.client_state() == state {
                tracing::trace!(site = op.site_id(), seq = op.seq_id(), "transform cache hit");
                return Some(candidate.clone());
            }
        }
        return None;
    }

    /// Memoize a transformed copy, evicting the oldest entries beyond the
    /// per-operation bound of known sites minus one.
    fn cache_transform(&mut self, op: Operation) {
        let cap = self.table.len().saturating_sub(1);
        if cap == 0 {
            return;
        }
        let row = self.cache.entry(op.id()).or_default();
        row.push_back(op);
        while row.len() > cap {
            row.pop_front();
        }
    }
}
