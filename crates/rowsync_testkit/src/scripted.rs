//! A query source answered by the test.
//!
//! Every fetch parks until the test calls [`ScriptedSource::respond`] for it,
//! which makes it possible to complete loads in any order.

use async_trait::async_trait;
use parking_lot::Mutex;
use rowsync_engine::{ListError, ListResult, Page, PageRequest, QuerySource, Row};
use std::sync::Arc;
use tokio::sync::{oneshot, watch};

struct Call<R> {
    request: PageRequest<R>,
    reply: Option<oneshot::Sender<ListResult<Page<R>>>>,
}

struct ScriptedState<R> {
    calls: Mutex<Vec<Call<R>>>,
    count: watch::Sender<usize>,
}

/// Query source whose fetches wait for a scripted answer.
///
/// Cloning yields another handle to the same script. A call that is hung up
/// with [`ScriptedSource::hang_up`] fails with [`ListError::SourceClosed`].
pub struct ScriptedSource<R> {
    inner: Arc<ScriptedState<R>>,
}

impl<R: Row> ScriptedSource<R> {
    /// Creates a source with no calls.
    pub fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self {
            inner: Arc::new(ScriptedState {
                calls: Mutex::new(Vec::new()),
                count,
            }),
        }
    }

    /// Number of fetches received so far.
    pub fn call_count(&self) -> usize {
        self.inner.calls.lock().len()
    }

    /// The request of call `index`.
    pub fn request(&self, index: usize) -> Option<PageRequest<R>> {
        self.inner.calls.lock().get(index).map(|call| call.request.clone())
    }

    /// Waits until at least `n` fetches were received.
    pub async fn wait_for_calls(&self, n: usize) {
        let mut rx = self.inner.count.subscribe();
        // The sender lives in `inner`, so the wait cannot fail.
        let _ = rx.wait_for(|count| *count >= n).await;
    }

    /// Answers call `index`. Returns false if it was already answered, does
    /// not exist, or its fetch was dropped.
    pub fn respond(&self, index: usize, result: ListResult<Page<R>>) -> bool {
        let reply = self
            .inner
            .calls
            .lock()
            .get_mut(index)
            .and_then(|call| call.reply.take());
        match reply {
            Some(reply) => reply.send(result).is_ok(),
            None => false,
        }
    }

    /// Answers call `index` with a page of `rows`.
    pub fn respond_rows(&self, index: usize, rows: Vec<R>) -> bool {
        self.respond(index, Ok(Page::new(rows)))
    }

    /// Drops the reply for call `index` without answering it.
    pub fn hang_up(&self, index: usize) -> bool {
        self.inner
            .calls
            .lock()
            .get_mut(index)
            .and_then(|call| call.reply.take())
            .is_some()
    }

    /// Fails call `index` with `error`.
    pub fn fail(&self, index: usize, error: ListError) -> bool {
        self.respond(index, Err(error))
    }
}

impl<R: Row> Default for ScriptedSource<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for ScriptedSource<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl<R: Row> QuerySource<R> for ScriptedSource<R> {
    async fn fetch_page(&self, request: PageRequest<R>) -> ListResult<Page<R>> {
        let (tx, rx) = oneshot::channel();
        let count = {
            let mut calls = self.inner.calls.lock();
            calls.push(Call {
                request,
                reply: Some(tx),
            });
            calls.len()
        };
        self.inner.count.send_replace(count);

        rx.await.unwrap_or(Err(ListError::SourceClosed))
    }
}
