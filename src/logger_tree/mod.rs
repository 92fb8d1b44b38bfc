// SPDX-License-Identifier: Apache-2.0

//! Incremental index of hierarchical logger names.
//!
//! Dotted logger names (`com.example.Service`) are inserted segment by
//! segment into a tree whose siblings stay sorted case-insensitively, with
//! an exact-path lookup index kept in step with the tree. All mutation is
//! confined to a single indexer task; callers interact through a cloneable
//! handle that dispatches asynchronously.

mod actor;
mod tree;

pub use actor::{LoggerTreeHandle, LoggerTreeIndexer};
pub use tree::{LoggerTree, NodeId, NodeRef, TreeEvent, TreeSnapshot, ROOT_LABEL};
