// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Shared substrate for the Meridian toolchain.
//!
//! Node ids, source spans, and the id-keyed location table that ties
//! analysis results back to source positions. Everything here is a plain
//! serializable value; no analysis logic lives in this crate.

pub mod ids;
pub mod span;

pub use ids::{IdGen, NodeId};
pub use span::{LineCol, SourceFile, SourceMap, Span};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Side table mapping node ids to source spans.
///
/// Produced by the parser alongside the IR; consumed by diagnostics to
/// report positions without the IR carrying spans inline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationTable {
    spans: HashMap<NodeId, Span>,
}

impl LocationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: NodeId, span: Span) {
        self.spans.insert(id, span);
    }

    pub fn get(&self, id: NodeId) -> Option<Span> {
        self.spans.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}
