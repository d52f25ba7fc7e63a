//! Stable numeric identifiers for IR nodes.
//!
//! Every IR node (module, definition, parameter, expression) carries a
//! unique numeric id assigned at parse time. Ids are the sole handle used
//! to attach analysis results: effect schemes, errors, and source
//! locations all live in id-keyed side tables rather than on the nodes
//! themselves.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique, stable identifier of an IR node.
///
/// Ids are opaque; their only guarantees are uniqueness within a parse
/// and stability across analysis passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(raw: u64) -> Self {
        NodeId(raw)
    }
}

/// Monotone allocator for [`NodeId`]s.
///
/// The parser owns one generator per compilation; tests use it to build
/// IR by hand. Ids start at 1 so that 0 can be spotted as "never
/// assigned" in debugging output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdGen {
    next: u64,
}

impl IdGen {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocate the next id.
    pub fn next(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn count(&self) -> u64 {
        self.next - 1
    }
}

impl Default for IdGen {
    fn default() -> Self {
        Self::new()
    }
}
