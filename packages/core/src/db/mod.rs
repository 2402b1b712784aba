//! Flat node storage
//!
//! This module contains the node table, the operation-applying store and the
//! hooks through which derived state and subscribers follow its changes.

mod document_store;
mod error;
mod events;
mod node_table;
mod observer;

pub use document_store::DocumentStore;
pub use error::StoreError;
pub use events::DomainEvent;
pub use node_table::NodeTable;
pub use observer::OperationObserver;
