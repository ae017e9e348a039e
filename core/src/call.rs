//! The single-value asynchronous result of a network call.
//!
//! A [`Call`] is a lazy future: nothing goes over the wire until it is
//! polled, it resolves exactly once, and dropping it cancels the request.
//! Callers that prefer callbacks use [`Call::subscribe`], which spawns the call
//! on the ambient tokio runtime and hands back a [`Subscription`]; cancelling
//! or dropping the subscription aborts the call before the callback runs.
//!
//! NB: `subscribe` and `into_receiver` assume a tokio runtime is already
//! running on the calling thread.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use futures::future::{self, AbortHandle, BoxFuture, Either};
use futures::FutureExt as _;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::ApiError;

#[must_use = "a Call does nothing unless awaited or subscribed"]
pub struct Call<T> {
    inner: BoxFuture<'static, Result<T, ApiError>>,
}

impl<T> fmt::Debug for Call<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("output", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

impl<T> Future for Call<T> {
    type Output = Result<T, ApiError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}

impl<T: Send + 'static> Call<T> {
    pub fn new<F>(fut: F) -> Self
    where
        F: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        Self { inner: fut.boxed() }
    }

    /// A call that is already resolved, e.g. because the request could not be built.
    pub fn ready(result: Result<T, ApiError>) -> Self {
        Self::new(future::ready(result))
    }

    /// Run the call in the background and pass its result to `on_done`.
    ///
    /// `on_done` runs at most once, and never if the subscription is
    /// cancelled (or dropped) first.
    pub fn subscribe<F>(self, on_done: F) -> Subscription
    where
        F: FnOnce(Result<T, ApiError>) + Send + 'static,
    {
        let (call, handle) = future::abortable(self);
        let task = tokio::spawn(async move {
            match call.await {
                Ok(result) => on_done(result),
                Err(future::Aborted) => debug!("call cancelled before completion"),
            }
        });
        Subscription {
            handle,
            task,
            detached: false,
        }
    }

    /// Run the call in the background and deliver its result over a oneshot
    /// channel. Dropping the receiver abandons the call.
    pub fn into_receiver(self) -> oneshot::Receiver<Result<T, ApiError>> {
        let (mut tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let outcome = match future::select(self, tx.cancellation()).await {
                Either::Left((result, _)) => Some(result),
                Either::Right(_) => None,
            };
            match outcome {
                // Receiver may vanish between completion and send; nothing to do then.
                Some(result) => {
                    let _ = tx.send(result);
                }
                None => debug!("receiver dropped, call abandoned"),
            }
        });
        rx
    }
}

/// Handle to a call started with [`Call::subscribe`].
#[must_use = "dropping a Subscription cancels the call"]
#[derive(Debug)]
pub struct Subscription {
    handle: AbortHandle,
    task: JoinHandle<()>,
    detached: bool,
}

impl Subscription {
    /// Abort the pending call; its callback will not run.
    pub fn cancel(self) {
        drop(self);
    }

    /// Let the call run to completion without holding on to the subscription.
    pub fn detach(mut self) {
        self.detached = true;
    }

    /// Whether the background task has stopped, by completing or by cancellation.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.detached {
            self.handle.abort();
        }
    }
}
