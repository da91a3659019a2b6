//! Coedit - an operational transformation engine for collaborative text
//! editing.
//!
//! Every site runs one [`ot::engine::OperationEngine`]. Local edits pass
//! through untouched; received edits are rewritten against whatever this
//! site applied concurrently, so all sites converge on the same document
//! no matter the delivery order.
//!
//! # Quick Start
//!
//! ```
//! use coedit::buffer::GapBuffer;
//! use coedit::ot::engine::OperationEngine;
//! use coedit::ot::op::OpKind;
//!
//! // One engine per site.
//! let mut engine = OperationEngine::new(1);
//! let mut document = GapBuffer::new();
//!
//! // Author a local edit and apply it to the visible text.
//! let op = engine
//!     .push(true, "document", "Hello!", OpKind::Insert, 0, 0, &[], None)
//!     .unwrap()
//!     .unwrap();
//! document.apply(&op);
//! assert_eq!(document.to_string(), "Hello!");
//! ```

pub mod buffer;
pub mod ot;
