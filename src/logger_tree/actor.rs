// SPDX-License-Identifier: Apache-2.0

use tokio::select;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tower::BoxError;
use tracing::{debug, info};

use super::tree::{LoggerTree, NodeRef, TreeEvent, TreeSnapshot};

/// Capacity of the structural-change broadcast. Slow subscribers lag and
/// miss events rather than stalling the indexer.
const EVENT_CHANNEL_SIZE: usize = 256;

enum TreeCommand {
    Insert(String),
    Lookup(String, oneshot::Sender<Option<NodeRef>>),
    Snapshot(oneshot::Sender<TreeSnapshot>),
    Reset,
}

/// Cloneable handle to the logger tree indexer.
///
/// All tree mutation happens on the indexer task; `insert` and `reset` are
/// fire-and-forget enqueues usable from any thread or task, with per-sender
/// FIFO ordering. `lookup` and `snapshot` are request/reply.
#[derive(Clone)]
pub struct LoggerTreeHandle {
    tx: flume::Sender<TreeCommand>,
    events: broadcast::Sender<TreeEvent>,
}

impl LoggerTreeHandle {
    /// Queue a logger name for insertion.
    pub fn insert(&self, name: impl Into<String>) {
        if self.tx.send(TreeCommand::Insert(name.into())).is_err() {
            debug!("logger tree indexer is gone, dropping insert");
        }
    }

    /// Exact-path lookup. Returns `None` on a miss or when the indexer has
    /// shut down.
    pub async fn lookup(&self, full_name: &str) -> Option<NodeRef> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .tx
            .send(TreeCommand::Lookup(full_name.to_string(), reply_tx))
            .is_err()
        {
            return None;
        }
        reply_rx.await.unwrap_or(None)
    }

    /// Read-only view of the current tree for display.
    pub async fn snapshot(&self) -> Option<TreeSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.tx.send(TreeCommand::Snapshot(reply_tx)).is_err() {
            return None;
        }
        reply_rx.await.ok()
    }

    /// Queue a full reset of the tree and index.
    pub fn reset(&self) {
        if self.tx.send(TreeCommand::Reset).is_err() {
            debug!("logger tree indexer is gone, dropping reset");
        }
    }

    /// Subscribe to structural change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<TreeEvent> {
        self.events.subscribe()
    }
}

/// Indexer task owning the [`LoggerTree`].
pub struct LoggerTreeIndexer {
    rx: flume::Receiver<TreeCommand>,
    events: broadcast::Sender<TreeEvent>,
}

impl LoggerTreeIndexer {
    pub fn new() -> (LoggerTreeHandle, LoggerTreeIndexer) {
        let (tx, rx) = flume::unbounded();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        (
            LoggerTreeHandle {
                tx,
                events: events.clone(),
            },
            LoggerTreeIndexer { rx, events },
        )
    }

    pub fn start(
        self,
        task_set: &mut JoinSet<Result<(), BoxError>>,
        cancel: &CancellationToken,
    ) {
        let cancel = cancel.clone();
        task_set.spawn(async move { run_indexer(self.rx, self.events, cancel).await });
    }
}

async fn run_indexer(
    rx: flume::Receiver<TreeCommand>,
    events: broadcast::Sender<TreeEvent>,
    cancel: CancellationToken,
) -> Result<(), BoxError> {
    let mut tree = LoggerTree::new();
    debug!("logger tree indexer started");

    loop {
        select! {
            _ = cancel.cancelled() => {
                info!("logger tree indexer cancelled");
                break;
            }

            cmd = rx.recv_async() => {
                // all handles dropped
                let Ok(cmd) = cmd else { break };
                match cmd {
                    TreeCommand::Insert(name) => {
                        for event in tree.insert(&name) {
                            // best effort, subscribers may be absent or lagging
                            let _ = events.send(event);
                        }
                    }
                    TreeCommand::Lookup(name, reply) => {
                        let node = tree.lookup(&name).map(|id| tree.node_ref(id));
                        let _ = reply.send(node);
                    }
                    TreeCommand::Snapshot(reply) => {
                        let _ = reply.send(tree.snapshot());
                    }
                    TreeCommand::Reset => {
                        let _ = events.send(tree.reset());
                    }
                }
            }
        }
    }

    Ok(())
}
