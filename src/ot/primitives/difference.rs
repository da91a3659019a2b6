//! The causal gap between two client states.
//!
//! A `StateDifference` lists every (site, seq) pair one state reflects and
//! another does not, in the order the pairs were discovered. The engine
//! turns the list into history-buffer keys, so insertion order must be
//! preserved here: the history buffer re-sorts the resolved operations by
//! total order rather than recomputing the gap.

use crate::ot::SeqId;
use crate::ot::SiteId;
use crate::ot::history_key;

/// An ordered list of operations one site has not yet incorporated.
///
/// Entry `i` means "site `sites[i]`'s `seqs[i]`-th operation is missing."
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StateDifference {
    sites: Vec<SiteId>,
    seqs: Vec<SeqId>,
}

impl StateDifference {
    /// Create an empty difference.
    pub fn new() -> StateDifference {
        return StateDifference {
            sites: Vec::new(),
            seqs: Vec::new(),
        };
    }

    /// Number of missing operations recorded.
    pub fn len(&self) -> usize {
        return self.sites.len();
    }

    /// True if the two states were causally level.
    pub fn is_empty(&self) -> bool {
        return self.sites.is_empty();
    }

    /// Record a single missing operation.
    pub fn add_site_seq(&mut self, site: SiteId, seq: SeqId) {
        self.sites.push(site);
        self.seqs.push(seq);
    }

    /// Record the missing sequence range `[begin, end)` for one site.
    pub fn add_range(&mut self, site: SiteId, begin: SeqId, end: SeqId) {
        for seq in begin..end {
            self.add_site_seq(site, seq);
        }
    }

    /// Render each entry as a history-buffer key, in insertion order.
    pub fn history_buffer_keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.sites.len());
        for i in 0..self.sites.len() {
            keys.push(history_key(self.sites[i], self.seqs[i]));
        }
        return keys;
    }
}
