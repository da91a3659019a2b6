//! Operations and the pairwise transform rules.
//!
//! An operation records one edit: what kind, where, what text, plus the
//! causal state its author had seen when making it. Transforming an
//! operation against another rewrites its position (or nullifies it) so
//! that it has the author's intended effect even after the other edit has
//! already been applied.
//!
//! # Design decisions
//!
//! 1. **Closed kind enum**: insert/delete/update are variants of one
//!    struct, and the whole transform table is a single exhaustive match.
//!    There is no dispatch to audit beyond that match.
//!
//! 2. **Pure transforms**: `transform_with` returns a new operation (or
//!    `None` when the edit's target no longer exists). Records filed in a
//!    history buffer are only ever handed out as clones, so history can
//!    never be mutated by a transform.
//!
//! 3. **Character positions**: `position` and the length arithmetic count
//!    characters, matching the character-cell document buffer.

use std::cmp::Ordering;
use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error as _;

use crate::ot::SeqId;
use crate::ot::SiteId;
use crate::ot::error::EngineError;
use crate::ot::primitives::state::ClientState;

/// The kind of edit an operation performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// Insert `value` at `position`.
    Insert,
    /// Delete `value` starting at `position`.
    Delete,
    /// Replace the value at `position` (styling intent; the transform
    /// rules exist but no text mutation is derived from an update).
    Update,
}

impl OpKind {
    /// The wire tag for this kind.
    pub fn as_str(&self) -> &'static str {
        return match self {
            OpKind::Insert => "insert",
            OpKind::Delete => "delete",
            OpKind::Update => "update",
        };
    }

    /// Parse a wire tag. Anything but the three known tags is rejected.
    pub fn from_str(tag: &str) -> Result<OpKind, EngineError> {
        return match tag {
            "insert" => Ok(OpKind::Insert),
            "delete" => Ok(OpKind::Delete),
            "update" => Ok(OpKind::Update),
            other => Err(EngineError::UnknownKind(other.to_string())),
        };
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{}", self.as_str());
    }
}

/// One edit, immutable once filed in a history buffer.
///
/// `order` is the server-assigned place in the global total order; `None`
/// until assigned, and `None` sorts after every assigned order.
#[derive(Clone, Debug, PartialEq)]
pub struct Operation {
    kind: OpKind,
    site_id: SiteId,
    seq_id: SeqId,
    key: String,
    value: String,
    position: usize,
    client_state: ClientState,
    order: Option<u64>,
    local: bool,
}

impl Operation {
    /// Create an operation from explicit fields.
    ///
    /// The sequence id is derived from the causal snapshot: one past the
    /// author's own counter in `client_state`.
    pub fn new(
        kind: OpKind,
        key: &str,
        value: &str,
        position: usize,
        site_id: SiteId,
        client_state: ClientState,
        order: Option<u64>,
        local: bool,
    ) -> Operation {
        let seq_id = client_state.seq_for_client(site_id) + 1;
        return Operation {
            kind,
            site_id,
            seq_id,
            key: key.to_string(),
            value: value.to_string(),
            position,
            client_state,
            order,
            local,
        };
    }

    /// Reconstruct an operation from its serialized state. The result is
    /// always remote: local operations are never built from a snapshot.
    pub fn from_state(state: OpState) -> Operation {
        return Operation {
            kind: state.kind,
            site_id: state.site_id,
            seq_id: state.seq_id,
            key: state.key,
            value: state.value,
            position: state.position,
            client_state: ClientState::from_slice(&state.client_state),
            order: state.order,
            local: false,
        };
    }

    /// Serialize this operation for transmission or copying.
    pub fn to_state(&self) -> OpState {
        return OpState {
            kind: self.kind,
            key: self.key.clone(),
            value: self.value.clone(),
            position: self.position,
            client_state: self.client_state.as_slice().to_vec(),
            seq_id: self.seq_id,
            site_id: self.site_id,
            order: self.order,
        };
    }

    pub fn kind(&self) -> OpKind {
        return self.kind;
    }

    pub fn site_id(&self) -> SiteId {
        return self.site_id;
    }

    pub fn seq_id(&self) -> SeqId {
        return self.seq_id;
    }

    /// The (site, seq) pair that identifies this operation globally.
    pub fn id(&self) -> (SiteId, SeqId) {
        return (self.site_id, self.seq_id);
    }

    /// The document this operation edits.
    pub fn key(&self) -> &str {
        return &self.key;
    }

    pub fn value(&self) -> &str {
        return &self.value;
    }

    pub fn position(&self) -> usize {
        return self.position;
    }

    /// The causal state the author had seen when creating this operation,
    /// upgraded as transforms fold other operations in.
    pub fn client_state(&self) -> &ClientState {
        return &self.client_state;
    }

    pub fn order(&self) -> Option<u64> {
        return self.order;
    }

    /// Assign the server-issued place in the total order.
    pub fn set_order(&mut self, order: u64) {
        self.order = Some(order);
    }

    /// True only at the authoring site.
    pub fn is_local(&self) -> bool {
        return self.local;
    }

    /// The value length used for position arithmetic, in characters.
    pub fn value_len(&self) -> usize {
        return self.value.chars().count();
    }

    /// Record that this operation's context now reflects `other`.
    pub fn upgrade_client_state(&mut self, other: &Operation) {
        self.client_state
            .set_seq_for_client(other.site_id, other.seq_id);
    }

    /// Transform this operation to include the effect of `other`,
    /// IT(self, other).
    ///
    /// Returns a new operation whose position accounts for `other` and
    /// whose causal state records it, or `None` when the target of this
    /// operation was already removed by `other` (the edit is nullified and
    /// must be dropped).
    ///
    /// Operations on different documents never affect each other's
    /// positions, but the causal upgrade still applies.
    pub fn transform_with(&self, other: &Operation) -> Option<Operation> {
        let mut next = self.clone();

        if self.key == other.key {
            let shift = other.value_len();
            match (self.kind, other.kind) {
                (OpKind::Insert, OpKind::Insert) => {
                    // Equal positions tie-break on site id so every site
                    // places the two insertions identically.
                    if next.position > other.position
                        || (next.position == other.position && next.site_id <= other.site_id)
                    {
                        next.position += shift;
                    }
                }
                (OpKind::Insert, OpKind::Delete) => {
                    if next.position > other.position {
                        next.position -= shift;
                    }
                }
                (OpKind::Insert, OpKind::Update) => {}
                (OpKind::Delete, OpKind::Insert) => {
                    if next.position >= other.position {
                        next.position += shift;
                    }
                }
                (OpKind::Delete, OpKind::Delete) => {
                    if next.position > other.position {
                        next.position -= shift;
                    } else if next.position == other.position {
                        // the target text is already gone
                        return None;
                    }
                }
                (OpKind::Delete, OpKind::Update) => {}
                (OpKind::Update, OpKind::Insert) => {
                    if next.position >= other.position {
                        next.position += shift;
                    }
                }
                (OpKind::Update, OpKind::Delete) => {
                    if next.position > other.position {
                        next.position -= shift;
                    } else if next.position == other.position {
                        return None;
                    }
                }
                (OpKind::Update, OpKind::Update) => {
                    if next.position == other.position {
                        let loses = next.site_id > other.site_id
                            || (next.site_id == other.site_id && next.seq_id < other.seq_id);
                        if loses {
                            next.value = other.value.clone();
                        }
                    }
                }
            }
        }

        next.upgrade_client_state(other);
        return Some(next);
    }

    /// Order two operations by their causal states, tie-broken by site id.
    pub fn compare_by_state(&self, other: &Operation) -> Ordering {
        return match self.client_state.cmp(&other.client_state) {
            Ordering::Equal => self.site_id.cmp(&other.site_id),
            unequal => unequal,
        };
    }

    /// Order two operations by their place in the total order.
    ///
    /// Unassigned orders sort after every assigned one. When the orders
    /// tie, a remote operation sorts before a local one, then ascending
    /// sequence id decides.
    pub fn compare_by_order(&self, other: &Operation) -> Ordering {
        if self.order == other.order {
            if self.local == other.local {
                return self.seq_id.cmp(&other.seq_id);
            }
            if self.local {
                return Ordering::Greater;
            }
            return Ordering::Less;
        }
        return match (self.order, other.order) {
            (None, _) => Ordering::Greater,
            (_, None) => Ordering::Less,
            (Some(a), Some(b)) => a.cmp(&b),
        };
    }
}

/// The serialized form of an operation: the order-significant wire tuple
/// `[type, key, value, position, client_state, seq_id, site_id, order]`.
///
/// On the wire this is a JSON array, with `order` null while unassigned.
#[derive(Clone, Debug, PartialEq)]
pub struct OpState {
    pub kind: OpKind,
    pub key: String,
    pub value: String,
    pub position: usize,
    pub client_state: Vec<u32>,
    pub seq_id: SeqId,
    pub site_id: SiteId,
    pub order: Option<u64>,
}

impl OpState {
    /// Encode as JSON bytes for the transport layer.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EngineError> {
        return Ok(serde_json::to_vec(self)?);
    }

    /// Decode JSON bytes from the transport layer. Rejects unknown kind
    /// tags and malformed tuples.
    pub fn from_bytes(bytes: &[u8]) -> Result<OpState, EngineError> {
        return Ok(serde_json::from_slice(bytes)?);
    }
}

impl Serialize for OpState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // serializing a tuple yields the order-significant array form
        return (
            self.kind.as_str(),
            &self.key,
            &self.value,
            self.position,
            &self.client_state,
            self.seq_id,
            self.site_id,
            self.order,
        )
            .serialize(serializer);
    }
}

impl<'de> Deserialize<'de> for OpState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<OpState, D::Error> {
        type Tuple = (String, String, String, usize, Vec<u32>, u32, u32, Option<u64>);
        let (tag, key, value, position, client_state, seq_id, site_id, order) =
            Tuple::deserialize(deserializer)?;
        let kind = OpKind::from_str(&tag).map_err(D::Error::custom)?;
        return Ok(OpState {
            kind,
            key,
            value,
            position,
            client_state,
            seq_id,
            site_id,
            order,
        });
    }
}
