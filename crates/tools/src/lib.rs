//! Developer Tooling: read-only inspection of the streamed terrain tree.
//!
//! # Invariants
//! - Tools never mutate the tree or the pending queue.

mod inspector;

pub use inspector::{DepthCounts, NodeInfo, TreeInspector, TreeSummary};

pub fn crate_info() -> &'static str {
    "terrastream-tools v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("tools"));
    }
}
