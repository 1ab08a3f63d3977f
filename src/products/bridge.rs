//! Conversions between callback-style and async-style operations.
//!
//! A [`rendezvous`] pairs a [`Resolver`] with a [`Pending`] future. The
//! resolver is consumed by [`Resolver::resolve`], so a second resolution
//! cannot be expressed. If the resolver is dropped unresolved, the pending
//! side yields `None` instead of waiting forever.
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Write half of a single-use rendezvous.
#[derive(Debug)]
pub struct Resolver<T> {
    tx: oneshot::Sender<T>,
}

impl<T> Resolver<T> {
    pub fn resolve(self, value: T) {
        // The waiting side may already be gone; delivery is at-most-once.
        let _ = self.tx.send(value);
    }
}

/// Read half of a single-use rendezvous. Resolves to `None` when the
/// resolver was dropped without a value.
#[derive(Debug)]
pub struct Pending<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> Future for Pending<T> {
    type Output = Option<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(Result::ok)
    }
}

pub fn rendezvous<T>() -> (Resolver<T>, Pending<T>) {
    let (tx, rx) = oneshot::channel();
    (Resolver { tx }, Pending { rx })
}

/// Await a callback-style operation. `start` receives the callback and must
/// hand it to the operation; the caller suspends until it fires.
pub async fn await_callback<T, F>(start: F) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce(Box<dyn FnOnce(T) + Send + 'static>),
{
    let (resolver, pending) = rendezvous();
    start(Box::new(move |value| resolver.resolve(value)));
    pending.await
}

/// Drive `future` on `dispatch` and hand its output to `callback`. Returns
/// without waiting; `callback` runs on a worker of `dispatch`.
pub fn spawn_with_callback<Fut, C>(dispatch: &Handle, future: Fut, callback: C) -> JoinHandle<()>
where
    Fut: Future + Send + 'static,
    Fut::Output: Send + 'static,
    C: FnOnce(Fut::Output) + Send + 'static,
{
    dispatch.spawn(async move {
        let output = future.await;
        callback(output);
    })
}
