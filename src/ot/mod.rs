//! Operational transformation for a shared linear text document.
//!
//! Multiple sites edit concurrently; operations arrive in different
//! orders at different sites; every site converges to the same document.
//! The pieces, leaf to root:
//!
//! - [`primitives::state::ClientState`]: the per-site causal version
//!   vector.
//! - [`primitives::difference::StateDifference`]: the causal gap between
//!   two states, rendered as history lookup keys.
//! - [`op::Operation`]: one edit with its causal snapshot and the
//!   pairwise transform rules.
//! - [`history::HistoryBuffer`]: every operation ever applied at a site.
//! - [`table::ClientStateTable`]: last-known state of every other site.
//! - [`engine::OperationEngine`]: fast-paths or recursively transforms
//!   each received operation.

pub mod engine;
pub mod error;
pub mod history;
pub mod op;
pub mod primitives;
pub mod table;

/// A participant with a stable integer id and its own operation counter.
pub type SiteId = u32;

/// A site's local operation count, 1-based.
pub type SeqId = u32;

/// Render the history-buffer key for one operation: unpadded decimal,
/// ASCII comma.
pub fn history_key(site: SiteId, seq: SeqId) -> String {
    return format!("{},{}", site, seq);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_keys_are_unpadded() {
        assert_eq!(history_key(0, 1), "0,1");
        assert_eq!(history_key(12, 340), "12,340");
    }
}
