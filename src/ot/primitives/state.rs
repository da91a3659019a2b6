//! The causal version vector tracked by every site.
//!
//! # Client state
//!
//! A `ClientState` is a growable array of per-site operation counters:
//! entry `i` counts how many operations from site `i` this state reflects.
//! Comparing two states of different lengths treats the missing indices as
//! zero, so a vector never needs to grow just to be compared.
//!
//! Complexity:
//! - seq_for_client / set_seq_for_client: O(1)
//! - subtract / oldest_difference: O(n) in the number of sites
//! - compare / equality: O(max of both lengths)
//!
//! Every operation owns an independent copy of the state it was authored
//! in; two operations never share a vector mutably.

use std::cmp::Ordering;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use smallvec::SmallVec;

use crate::ot::SeqId;
use crate::ot::SiteId;
use super::difference::StateDifference;

/// Sites tracked without spilling to the heap. Small sessions are the
/// common case; a ninth site falls back to a heap allocation.
const INLINE_SITES: usize = 8;

/// A vector of per-site sequence counters.
///
/// Counters are monotonically non-decreasing over a state's lifetime:
/// they only move via `set_seq_for_client` (context upgrades) and
/// `grow_to` (a newly discovered site starts at zero).
#[derive(Clone, Debug, Default)]
pub struct ClientState {
    seqs: SmallVec<[u32; INLINE_SITES]>,
}

impl ClientState {
    /// Create an empty state (no sites known yet).
    pub fn new() -> ClientState {
        return ClientState {
            seqs: SmallVec::new(),
        };
    }

    /// Create a zeroed state covering `count` sites.
    pub fn with_sites(count: usize) -> ClientState {
        return ClientState {
            seqs: smallvec::smallvec![0; count],
        };
    }

    /// Create a state from an existing counter array.
    pub fn from_slice(seqs: &[u32]) -> ClientState {
        return ClientState {
            seqs: SmallVec::from_slice(seqs),
        };
    }

    /// The raw counters.
    pub fn as_slice(&self) -> &[u32] {
        return &self.seqs;
    }

    /// Number of sites this state has a slot for.
    pub fn len(&self) -> usize {
        return self.seqs.len();
    }

    /// True if no sites are tracked.
    pub fn is_empty(&self) -> bool {
        return self.seqs.is_empty();
    }

    /// The sequence counter for `site`. Sites beyond the current length
    /// read as zero; reads never grow the vector.
    pub fn seq_for_client(&self, site: SiteId) -> SeqId {
        return self.seqs.get(site as usize).copied().unwrap_or(0);
    }

    /// Set the sequence counter for `site`, growing the vector if the site
    /// is not tracked yet.
    pub fn set_seq_for_client(&mut self, site: SiteId, seq: SeqId) {
        let site = site as usize;
        if self.seqs.len() <= site {
            self.grow_to(site + 1);
        }
        self.seqs[site] = seq;
    }

    /// Zero-extend the vector to cover `count` sites. No-op if it already
    /// does.
    pub fn grow_to(&mut self, count: usize) {
        while self.seqs.len() < count {
            self.seqs.push(0);
        }
    }

    /// Every (site, seq) pair this state reflects but `other` does not.
    ///
    /// For each site where this state's counter exceeds the other's, the
    /// difference receives the full range of missing sequence numbers.
    /// Sites where the other state is ahead contribute nothing.
    pub fn subtract(&self, other: &ClientState) -> StateDifference {
        let mut diff = StateDifference::new();
        for site in 0..self.seqs.len() {
            let a = self.seq_for_client(site as SiteId);
            let b = other.seq_for_client(site as SiteId);
            if a > b {
                diff.add_range(site as SiteId, b + 1, a + 1);
            }
        }
        return diff;
    }

    /// Like `subtract`, but keeps only the single earliest missing
    /// sequence number per site.
    pub fn oldest_difference(&self, other: &ClientState) -> StateDifference {
        let mut diff = StateDifference::new();
        for site in 0..self.seqs.len() {
            let a = self.seq_for_client(site as SiteId);
            let b = other.seq_for_client(site as SiteId);
            if a > b {
                diff.add_site_seq(site as SiteId, b + 1);
            }
        }
        return diff;
    }
}

impl PartialEq for ClientState {
    fn eq(&self, other: &Self) -> bool {
        let max = self.seqs.len().max(other.seqs.len());
        for site in 0..max {
            if self.seq_for_client(site as SiteId) != other.seq_for_client(site as SiteId) {
                return false;
            }
        }
        return true;
    }
}

impl Eq for ClientState {}

impl PartialOrd for ClientState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        return Some(self.cmp(other));
    }
}

impl Ord for ClientState {
    /// Lexicographic comparison over the zero-padded counter arrays.
    ///
    /// This is a total order used for deterministic sorting, not the
    /// happens-before partial order of vector clocks.
    fn cmp(&self, other: &Self) -> Ordering {
        let max = self.seqs.len().max(other.seqs.len());
        for site in 0..max {
            let a = self.seq_for_client(site as SiteId);
            let b = other.seq_for_client(site as SiteId);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        return Ordering::Equal;
    }
}

impl Serialize for ClientState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        return self.seqs.as_slice().serialize(serializer);
    }
}

impl<'de> Deserialize<'de> for ClientState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<ClientState, D::Error> {
        let seqs = Vec::<u32>::deserialize(deserializer)?;
        return Ok(ClientState::from_slice(&seqs));
    }
}
