//! The history buffer: every operation a site has ever applied.
//!
//! Operations are keyed by `"{site},{seq}"` and are immutable once filed;
//! lookups hand out clones, never references into the map. The buffer
//! answers two kinds of queries the transform algorithm needs:
//!
//! - the operations named by a causal gap, sorted by total order, and
//! - all operations sorted by causal state (used when replaying history
//!   for a late joiner).
//!
//! The buffer grows without bound. The table's minimum client state marks
//! the frontier below which entries could be discarded, but no automatic
//! purge runs here.

use rustc_hash::FxHashMap;

use crate::ot::error::EngineError;
use crate::ot::history_key;
use crate::ot::op::OpState;
use crate::ot::op::Operation;
use crate::ot::primitives::difference::StateDifference;

/// Store of previously applied operations, keyed by (site, seq).
#[derive(Clone, Debug, Default)]
pub struct HistoryBuffer {
    ops: FxHashMap<String, Operation>,
}

impl HistoryBuffer {
    /// Create an empty history.
    pub fn new() -> HistoryBuffer {
        return HistoryBuffer {
            ops: FxHashMap::default(),
        };
    }

    /// Number of operations filed.
    pub fn len(&self) -> usize {
        return self.ops.len();
    }

    /// True if nothing has been filed yet.
    pub fn is_empty(&self) -> bool {
        return self.ops.is_empty();
    }

    /// File a locally authored operation. Local operations have no
    /// assigned total order yet, so this always succeeds.
    pub fn add_local(&mut self, op: Operation) {
        let key = history_key(op.site_id(), op.seq_id());
        self.ops.insert(key, op);
    }

    /// File a received operation.
    ///
    /// The operation must carry its place in the total order. If the same
    /// (site, seq) is already filed without an order - the local echo of
    /// an operation the server has since sequenced - the missing order is
    /// filled in. Re-receiving an identical assignment is a no-op; two
    /// conflicting assignments are an error.
    pub fn add_remote(&mut self, op: Operation) -> Result<(), EngineError> {
        let key = history_key(op.site_id(), op.seq_id());
        let Some(order) = op.order() else {
            return Err(EngineError::MissingOrder(key));
        };

        if let Some(existing) = self.ops.get_mut(&key) {
            return match existing.order() {
                None => {
                    existing.set_order(order);
                    Ok(())
                }
                Some(known) if known == order => Ok(()),
                Some(known) => Err(EngineError::DuplicateOrder {
                    key,
                    existing: known,
                    incoming: order,
                }),
            };
        }

        self.ops.insert(key, op);
        return Ok(());
    }

    /// Remove an operation from the history. The returned record is no
    /// longer immutable; `None` if it was never filed.
    pub fn remove(&mut self, op: &Operation) -> Option<Operation> {
        let key = history_key(op.site_id(), op.seq_id());
        return self.ops.remove(&key);
    }

    /// Resolve every operation a causal gap names, sorted by total order
    /// (unassigned orders last, remote before local on ties).
    ///
    /// A missing key means this site fell behind or discarded history too
    /// early, and the whole lookup fails.
    pub fn ops_for_difference(
        &self,
        diff: &StateDifference,
    ) -> Result<Vec<Operation>, EngineError> {
        let keys = diff.history_buffer_keys();
        let mut ops = Vec::with_capacity(keys.len());
        for key in keys {
            match self.ops.get(&key) {
                Some(op) => ops.push(op.clone()),
                None => return Err(EngineError::MissingHistory(key)),
            }
        }
        ops.sort_by(|a, b| a.compare_by_order(b));
        return Ok(ops);
    }

    /// All filed operations sorted by causal state.
    pub fn context_sorted_operations(&self) -> Vec<Operation> {
        let mut ops: Vec<Operation> = self.ops.values().cloned().collect();
        ops.sort_by(|a, b| a.compare_by_state(b));
        return ops;
    }

    /// Snapshot every filed operation for transfer to another site.
    pub fn to_state(&self) -> Vec<OpState> {
        return self.ops.values().map(|op| op.to_state()).collect();
    }

    /// Rebuild a history buffer from a snapshot.
    pub fn from_state(states: Vec<OpState>) -> HistoryBuffer {
        let mut buffer = HistoryBuffer::new();
        for state in states {
            buffer.add_local(Operation::from_state(state));
        }
        return buffer;
    }
}
