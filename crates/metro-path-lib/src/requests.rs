//! One-shot background requests scoped to a view
//!
//! Backend calls block, so they run on the tokio blocking pool and report
//! back through a oneshot channel that the UI polls once per frame. A
//! [`RequestScope`] owns every request a view has in flight: cancelling or
//! dropping the scope aborts them, and whatever they would have delivered is
//! discarded.

use crate::{MetroPathError, Result};
use std::collections::HashMap;
use std::hash::Hash;
use tokio::runtime::Handle;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tokio::task::JoinHandle;

/// A single in-flight request
///
/// Dropping it aborts the task and discards its result.
#[derive(Debug)]
pub struct PendingRequest<T> {
    receiver: oneshot::Receiver<Result<T>>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> PendingRequest<T> {
    /// Run `job` on the blocking pool of `runtime`
    pub fn spawn<F>(runtime: &Handle, job: F) -> Self
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let task = runtime.spawn_blocking(move || {
            // The receiver is gone once the request was cancelled
            if sender.send(job()).is_err() {
                tracing::trace!("Discarding result of a cancelled request");
            }
        });
        Self { receiver, task }
    }
}

impl<T> PendingRequest<T> {
    /// Take the result if it has arrived
    ///
    /// A task that ended without answering (it panicked or was aborted)
    /// yields [`MetroPathError::Cancelled`].
    pub fn try_take(&mut self) -> Option<Result<T>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(MetroPathError::Cancelled)),
        }
    }
}

impl<T> Drop for PendingRequest<T> {
    fn drop(&mut self) {
        self.receiver.close();
        self.task.abort();
    }
}

/// Keyed set of in-flight requests owned by one view
///
/// At most one request is pending per key: issuing under a busy key cancels
/// the older request, so a stale answer can never overwrite a newer one.
#[derive(Debug)]
pub struct RequestScope<K, T> {
    runtime: Handle,
    pending: HashMap<K, PendingRequest<T>>,
}

impl<K, T> RequestScope<K, T>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    T: Send + 'static,
{
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            pending: HashMap::new(),
        }
    }

    /// Start `job` under `key`, replacing any request already pending there
    pub fn issue<F>(&mut self, key: K, job: F)
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let request = PendingRequest::spawn(&self.runtime, job);
        if self.pending.insert(key.clone(), request).is_some() {
            tracing::debug!("Superseded pending request {key:?}");
        }
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Collect every result that has arrived since the last poll
    pub fn poll(&mut self) -> Vec<(K, Result<T>)> {
        let mut finished = Vec::new();
        self.pending.retain(|key, request| match request.try_take() {
            Some(result) => {
                finished.push((key.clone(), result));
                false
            }
            None => true,
        });
        finished
    }

    /// Abort the request pending under `key`; returns whether one existed
    pub fn cancel(&mut self, key: &K) -> bool {
        let cancelled = self.pending.remove(key).is_some();
        if cancelled {
            tracing::debug!("Cancelled request {key:?}");
        }
        cancelled
    }

    /// Abort every pending request
    pub fn cancel_all(&mut self) {
        if !self.pending.is_empty() {
            tracing::debug!("Cancelling {} pending requests", self.pending.len());
        }
        self.pending.clear();
    }
}
