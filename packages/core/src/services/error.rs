//! Hierarchy Layer Error Types
//!
//! The resolver never fails while processing an operation: unresolved
//! references are deferred and schema inconsistencies are tolerated. The only
//! reportable condition is an explicit finalize check over leftover pending
//! parent entries.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    /// Pending parent entries remain whose nodes were never created
    #[error("{} pending parent entr{} never resolved: {}", ids.len(), if ids.len() == 1 { "y" } else { "ies" }, ids.join(", "))]
    DanglingPendingParents { ids: Vec<String> },
}

impl HierarchyError {
    pub fn dangling_pending_parents(ids: Vec<String>) -> Self {
        Self::DanglingPendingParents { ids }
    }
}
