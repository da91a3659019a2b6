//! Per-engine table of the last-known causal state of every site.
//!
//! The table answers two questions the engine itself cannot:
//!
//! - which sites are causally level with a given state (candidates for
//!   sharing garbage-collection decisions), and
//! - the componentwise minimum state across all tracked sites - the
//!   frontier below which history entries are safe to discard.
//!
//! Entries default to the zero vector and both the table and the stored
//! vectors grow on demand as new sites appear.

use crate::ot::SiteId;
use crate::ot::op::Operation;
use crate::ot::primitives::state::ClientState;

/// Last-observed client state per site, indexed by site id.
#[derive(Clone, Debug, Default)]
pub struct ClientStateTable {
    states: Vec<ClientState>,
}

impl ClientStateTable {
    /// Create a table seeded with one known site and its state.
    pub fn new(state: ClientState, site: SiteId) -> ClientStateTable {
        let mut table = ClientStateTable { states: Vec::new() };
        table.grow_to(site as usize + 1);
        table.states[site as usize] = state;
        return table;
    }

    /// Number of sites tracked.
    pub fn len(&self) -> usize {
        return self.states.len();
    }

    /// True if no sites are tracked.
    pub fn is_empty(&self) -> bool {
        return self.states.is_empty();
    }

    /// Grow the table to cover `count` sites. Existing vectors are
    /// zero-extended to the same width; new entries start at zero.
    pub fn grow_to(&mut self, count: usize) {
        for state in &mut self.states {
            state.grow_to(count);
        }
        while self.states.len() < count {
            self.states.push(ClientState::with_sites(count));
        }
    }

    /// The stored state for `site`, growing the table if the site is new.
    pub fn client_state(&mut self, site: SiteId) -> &ClientState {
        if self.states.len() <= site as usize {
            self.grow_to(site as usize + 1);
        }
        return &self.states[site as usize];
    }

    /// Store a state for `site`, growing the table and the vector so both
    /// cover the site.
    pub fn set_client_state(&mut self, site: SiteId, mut state: ClientState) {
        if self.states.len() <= site as usize {
            self.grow_to(site as usize + 1);
        }
        if state.len() <= site as usize {
            state.grow_to(site as usize + 1);
        }
        self.states[site as usize] = state;
    }

    /// Fold a newly learned operation into the table: the author's entry
    /// becomes its authoring snapshot advanced by the operation itself.
    pub fn operation_update(&mut self, op: &Operation) {
        let mut state = op.client_state().clone();
        state.set_seq_for_client(op.site_id(), op.seq_id());
        self.set_client_state(op.site_id(), state);
    }

    /// Sites whose stored state equals `state`, excluding `skip`.
    pub fn matching_clients(&self, state: &ClientState, skip: SiteId) -> Vec<SiteId> {
        let mut matches = Vec::new();
        for (site, candidate) in self.states.iter().enumerate() {
            if site as SiteId != skip && candidate == state {
                matches.push(site as SiteId);
            }
        }
        return matches;
    }

    /// The componentwise minimum state across all tracked sites, or
    /// `None` for an empty table.
    ///
    /// Every operation below this frontier has been incorporated by every
    /// site the engine knows about.
    pub fn minimum_client_state(&self) -> Option<ClientState> {
        let first = self.states.first()?;
        let width = self
            .states
            .iter()
            .map(|s| s.len())
            .max()
            .unwrap_or(0);

        let mut minimum = first.clone();
        minimum.grow_to(width);
        for state in &self.states[1..] {
            for site in 0..width {
                let seq = state.seq_for_client(site as SiteId);
                if seq < minimum.seq_for_client(site as SiteId) {
                    minimum.set_seq_for_client(site as SiteId, seq);
                }
            }
        }
        return Some(minimum);
    }

    /// Snapshot the table as nested counter arrays.
    pub fn to_state(&self) -> Vec<Vec<u32>> {
        return self
            .states
            .iter()
            .map(|s| s.as_slice().to_vec())
            .collect();
    }

    /// Rebuild a table from a snapshot.
    pub fn from_state(states: Vec<Vec<u32>>) -> ClientStateTable {
        return ClientStateTable {
            states: states.iter().map(|s| ClientState::from_slice(s)).collect(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ot::op::OpKind;

    fn op_from(site: u32, state: &[u32]) -> Operation {
        return Operation::new(
            OpKind::Insert,
            "document",
            "x",
            0,
            site,
            ClientState::from_slice(state),
            Some(0),
            false,
        );
    }

    #[test]
    fn new_table_seeds_one_entry() {
        let table = ClientStateTable::new(ClientState::from_slice(&[1, 2]), 1);
        assert_eq!(table.len(), 2);
        assert_eq!(table.to_state(), vec![vec![0, 0], vec![1, 2]]);
    }

    #[test]
    fn getter_grows_with_zero_entries() {
        let mut table = ClientStateTable::new(ClientState::new(), 0);
        let state = table.client_state(3);
        assert_eq!(state.seq_for_client(0), 0);
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn grow_widens_existing_vectors() {
        let mut table = ClientStateTable::new(ClientState::from_slice(&[5]), 0);
        table.grow_to(3);
        assert_eq!(table.to_state()[0], vec![5, 0, 0]);
    }

    #[test]
    fn operation_update_advances_the_author_entry() {
        let mut table = ClientStateTable::new(ClientState::with_sites(1), 0);
        // author at site 2 had seen [1, 1] and issues its second op
        let op = op_from(2, &[1, 1, 1]);
        table.operation_update(&op);
        assert_eq!(table.client_state(2).as_slice(), &[1, 1, 2]);
    }

    #[test]
    fn matching_clients_skips_the_caller() {
        let mut table = ClientStateTable::new(ClientState::with_sites(3), 0);
        let shared = ClientState::from_slice(&[2, 1, 0]);
        table.set_client_state(1, shared.clone());
        table.set_client_state(2, shared.clone());

        assert_eq!(table.matching_clients(&shared, 1), vec![2]);
        assert_eq!(table.matching_clients(&shared, 5), vec![1, 2]);
    }

    #[test]
    fn minimum_state_is_componentwise() {
        let mut table = ClientStateTable::new(ClientState::from_slice(&[3, 1, 2]), 0);
        table.set_client_state(1, ClientState::from_slice(&[1, 4, 2]));
        table.set_client_state(2, ClientState::from_slice(&[2, 2, 0]));

        let minimum = table.minimum_client_state().unwrap();
        assert_eq!(minimum.as_slice(), &[1, 1, 0]);
    }

    #[test]
    fn minimum_state_of_empty_table_is_none() {
        let table = ClientStateTable::default();
        assert!(table.minimum_client_state().is_none());
    }

    #[test]
    fn snapshot_round_trip() {
        let mut table = ClientStateTable::new(ClientState::from_slice(&[1]), 0);
        table.set_client_state(2, ClientState::from_slice(&[1, 0, 3]));

        let copy = ClientStateTable::from_state(table.to_state());
        assert_eq!(copy.to_state(), table.to_state());
    }
}
