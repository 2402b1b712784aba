//! Operation observers
//!
//! Observers are invoked synchronously by `DocumentStore` after each committed
//! operation, exactly once and in commit order. They receive mutable access to
//! the node table so they can maintain derived per-node state, but they cannot
//! reject or rewrite the operation.

use crate::db::NodeTable;
use crate::models::SchemaRegistry;
use crate::operations::Operation;

pub trait OperationObserver: Send {
    /// Called after `op` has been committed to `nodes`
    ///
    /// For `Delete` the node is already gone from the table; the operation
    /// carries the removed record.
    fn on_operation_applied(
        &mut self,
        op: &Operation,
        nodes: &mut NodeTable,
        schemas: &SchemaRegistry,
    );
}

impl<F> OperationObserver for F
where
    F: FnMut(&Operation, &mut NodeTable, &SchemaRegistry) + Send,
{
    fn on_operation_applied(
        &mut self,
        op: &Operation,
        nodes: &mut NodeTable,
        schemas: &SchemaRegistry,
    ) {
        self(op, nodes, schemas)
    }
}
