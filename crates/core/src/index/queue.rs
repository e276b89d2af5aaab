//! Single-writer mutation queue over the ticket index.
//!
//! Every read-modify-write cycle on the index is boxed into a job and sent
//! to one [`IndexWriter`] task, which runs the jobs strictly in submission
//! order. Job k+1 is not started before job k's write has completed, so
//! interleaved cycles cannot lose updates within a process.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use crate::metrics;

use super::{IndexError, IndexStore, MutationError, TicketRecord};

/// A unit of work executed by the writer against the store.
trait IndexJob: Send {
    fn run(self: Box<Self>, store: &dyn IndexStore);
}

struct Mutation<F, T> {
    mutator: F,
    reply: oneshot::Sender<Result<T, IndexError>>,
}

impl<F, T> IndexJob for Mutation<F, T>
where
    F: FnOnce(&mut Vec<TicketRecord>) -> Result<T, MutationError> + Send,
    T: Send,
{
    fn run(self: Box<Self>, store: &dyn IndexStore) {
        let Mutation { mutator, reply } = *self;

        let result = store.read().and_then(|mut records| {
            let value = mutator(&mut records).map_err(IndexError::Rejected)?;
            store.write(&records)?;
            Ok(value)
        });

        match &result {
            Ok(_) => metrics::INDEX_MUTATIONS.with_label_values(&["applied"]).inc(),
            Err(IndexError::Rejected(e)) => {
                warn!("Index mutation rejected, write skipped: {}", e);
                metrics::INDEX_MUTATIONS.with_label_values(&["rejected"]).inc();
            }
            Err(e) => {
                error!("Index mutation failed: {}", e);
                metrics::INDEX_MUTATIONS.with_label_values(&["failed"]).inc();
            }
        }

        // the submitter may have gone away; the write stands either way
        let _ = reply.send(result);
    }
}

struct Inspection<F, T> {
    reader: F,
    reply: oneshot::Sender<Result<T, IndexError>>,
}

impl<F, T> IndexJob for Inspection<F, T>
where
    F: FnOnce(&[TicketRecord]) -> T + Send,
    T: Send,
{
    fn run(self: Box<Self>, store: &dyn IndexStore) {
        let Inspection { reader, reply } = *self;
        let result = store.read().map(|records| reader(&records));
        if let Err(e) = &result {
            error!("Index read failed: {}", e);
        }
        let _ = reply.send(result);
    }
}

/// Handle for submitting index jobs.
///
/// Cheaply cloneable; every clone feeds the same writer.
#[derive(Clone)]
pub struct IndexHandle {
    tx: mpsc::Sender<Box<dyn IndexJob>>,
}

impl IndexHandle {
    /// Run `mutator` against the full record set and persist the result.
    ///
    /// If the mutator returns an error nothing is written and the error is
    /// returned as [`IndexError::Rejected`]; later jobs still run.
    pub async fn submit<T, F>(&self, mutator: F) -> Result<T, IndexError>
    where
        F: FnOnce(&mut Vec<TicketRecord>) -> Result<T, MutationError> + Send + 'static,
        T: Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        self.enqueue(Box::new(Mutation { mutator, reply })).await?;
        rx.await.map_err(|_| IndexError::QueueClosed)?
    }

    /// Read the record set in queue order without writing.
    pub async fn inspect<T, F>(&self, reader: F) -> Result<T, IndexError>
    where
        F: FnOnce(&[TicketRecord]) -> T + Send + 'static,
        T: Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        self.enqueue(Box::new(Inspection { reader, reply })).await?;
        rx.await.map_err(|_| IndexError::QueueClosed)?
    }

    pub async fn find_by_channel(
        &self,
        channel_id: &str,
    ) -> Result<Option<TicketRecord>, IndexError> {
        let channel_id = channel_id.to_string();
        self.inspect(move |records| {
            records
                .iter()
                .find(|r| r.channel_id == channel_id)
                .cloned()
        })
        .await
    }

    pub async fn find_by_opener(&self, opener_id: &str) -> Result<Option<TicketRecord>, IndexError> {
        let opener_id = opener_id.to_string();
        self.inspect(move |records| records.iter().find(|r| r.opener_id == opener_id).cloned())
            .await
    }

    pub async fn snapshot(&self) -> Result<Vec<TicketRecord>, IndexError> {
        self.inspect(|records| records.to_vec()).await
    }

    async fn enqueue(&self, job: Box<dyn IndexJob>) -> Result<(), IndexError> {
        self.tx.send(job).await.map_err(|_| IndexError::QueueClosed)
    }
}

/// Background task that owns the store and runs index jobs one at a time.
pub struct IndexWriter {
    rx: mpsc::Receiver<Box<dyn IndexJob>>,
    store: Arc<dyn IndexStore>,
}

impl IndexWriter {
    pub fn new(rx: mpsc::Receiver<Box<dyn IndexJob>>, store: Arc<dyn IndexStore>) -> Self {
        Self { rx, store }
    }

    /// Run the writer, consuming jobs until every handle is dropped.
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        debug!("Index writer started");

        while let Some(job) = self.rx.recv().await {
            let store = self.store.as_ref();
            if catch_unwind(AssertUnwindSafe(|| job.run(store))).is_err() {
                error!("Index job panicked; its write was skipped");
            }
        }

        debug!("Index writer shutting down");
    }
}

/// Create the index queue.
///
/// Returns:
/// - `IndexHandle` - for submitting jobs (clone this to share across tasks)
/// - `IndexWriter` - spawn this as a background task with `tokio::spawn(writer.run())`
pub fn create_index_queue(
    store: Arc<dyn IndexStore>,
    buffer_size: usize,
) -> (IndexHandle, IndexWriter) {
    let (tx, rx) = mpsc::channel(buffer_size);
    (IndexHandle { tx }, IndexWriter::new(rx, store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryIndexStore;
    use chrono::Utc;
    use futures::future::join_all;

    fn spawn_queue(store: Arc<MemoryIndexStore>) -> IndexHandle {
        let (handle, writer) = create_index_queue(store as Arc<dyn IndexStore>, 16);
        tokio::spawn(writer.run());
        handle
    }

    fn append(channel_id: String) -> impl FnOnce(&mut Vec<TicketRecord>) -> Result<usize, MutationError> {
        move |records| {
            records.push(TicketRecord::new(channel_id, "opener", Utc::now()));
            Ok(records.len())
        }
    }

    #[tokio::test]
    async fn test_submit_persists_and_returns_value() {
        let store = Arc::new(MemoryIndexStore::new());
        let handle = spawn_queue(Arc::clone(&store));

        let len = handle.submit(append("c1".to_string())).await.unwrap();
        assert_eq!(len, 1);
        assert_eq!(store.records().len(), 1);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_all_kept_in_submission_order() {
        let store = Arc::new(MemoryIndexStore::new());
        let handle = spawn_queue(Arc::clone(&store));

        let submissions = (0..25).map(|i| {
            let handle = handle.clone();
            async move { handle.submit(append(format!("c{}", i))).await }
        });
        let results = join_all(submissions).await;
        assert!(results.iter().all(|r| r.is_ok()));

        let channels: Vec<String> = store
            .records()
            .into_iter()
            .map(|r| r.channel_id)
            .collect();
        let expected: Vec<String> = (0..25).map(|i| format!("c{}", i)).collect();
        assert_eq!(channels, expected);
    }

    #[tokio::test]
    async fn test_rejected_mutation_skips_write_and_queue_continues() {
        let store = Arc::new(MemoryIndexStore::new());
        let handle = spawn_queue(Arc::clone(&store));

        let rejected = handle
            .submit(|records: &mut Vec<TicketRecord>| -> Result<(), MutationError> {
                records.push(TicketRecord::new("partial", "u", Utc::now()));
                Err(MutationError::Invalid("nope".to_string()))
            })
            .await;
        assert!(matches!(rejected, Err(IndexError::Rejected(_))));
        assert_eq!(store.write_count(), 0);

        handle.submit(append("c1".to_string())).await.unwrap();
        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].channel_id, "c1");
    }

    #[tokio::test]
    async fn test_write_failure_is_reported_and_queue_continues() {
        let store = Arc::new(MemoryIndexStore::new());
        let handle = spawn_queue(Arc::clone(&store));

        store.fail_next_write();
        let failed = handle.submit(append("c1".to_string())).await;
        assert!(matches!(failed, Err(IndexError::Io(_))));
        assert!(store.records().is_empty());

        handle.submit(append("c2".to_string())).await.unwrap();
        assert_eq!(store.records()[0].channel_id, "c2");
    }

    #[tokio::test]
    async fn test_inspect_does_not_write() {
        let store = Arc::new(MemoryIndexStore::with_records(vec![TicketRecord::new(
            "c1",
            "u1",
            Utc::now(),
        )]));
        let handle = spawn_queue(Arc::clone(&store));

        let found = handle.find_by_channel("c1").await.unwrap();
        assert_eq!(found.unwrap().opener_id, "u1");
        assert!(handle.find_by_opener("nobody").await.unwrap().is_none());
        assert_eq!(handle.snapshot().await.unwrap().len(), 1);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_panicking_mutator_does_not_stall_queue() {
        let store = Arc::new(MemoryIndexStore::new());
        let handle = spawn_queue(Arc::clone(&store));

        let result = handle
            .submit(|_records: &mut Vec<TicketRecord>| -> Result<(), MutationError> {
                panic!("mutator bug")
            })
            .await;
        assert!(result.is_err());

        handle.submit(append("c1".to_string())).await.unwrap();
        assert_eq!(store.records().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_after_writer_gone_fails() {
        let store: Arc<dyn IndexStore> = Arc::new(MemoryIndexStore::new());
        let (handle, writer) = create_index_queue(store, 4);
        drop(writer);

        let result = handle.snapshot().await;
        assert!(matches!(result, Err(IndexError::QueueClosed)));
    }
}
