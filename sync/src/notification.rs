//! A level-triggered signal that wakes every waiting task.
//!
//! See the [`Notification`] type's documentation for details.
use crate::Waitable;
use core::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use maitake_sync::{wait_queue, WaitQueue};
use pin_project::pin_project;

/// A level-triggered signal that wakes every task waiting on it.
///
/// Tasks wait for a `Notification` by awaiting [`Notification::wait`]. A call
/// to [`Notification::signal`] wakes every task whose [`Wait`] future was
/// created before the call, in the order in which they started waiting.
///
/// Signals are not stored: signaling a `Notification` that nobody waits on
/// has no effect on [`Wait`] futures created afterwards. Code that waits for
/// some condition should therefore check the condition, wait, and check
/// again after waking, in a loop.
///
/// This is a thin layer over a [`maitake_sync::WaitQueue`] that is only ever
/// woken with [`WaitQueue::wake_all`] and is never closed.
///
/// # Examples
///
/// ```
/// use hyphae_sync::Notification;
/// use std::{cell::Cell, rc::Rc};
///
/// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// tokio::task::LocalSet::new().block_on(&rt, async {
///     let notification = Rc::new(Notification::new());
///     let started = Rc::new(Cell::new(false));
///
///     let waiter = tokio::task::spawn_local({
///         let notification = notification.clone();
///         let started = started.clone();
///         async move {
///             let wait = notification.wait();
///             started.set(true);
///             wait.await
///         }
///     });
///
///     // Let the waiter start waiting.
///     while !started.get() {
///         tokio::task::yield_now().await;
///     }
///
///     notification.signal();
///     waiter.await.unwrap();
/// });
/// ```
#[derive(Debug)]
pub struct Notification {
    queue: WaitQueue,
}

/// Future returned from [`Notification::wait()`].
///
/// Dropping this future before it completes stops waiting.
#[derive(Debug)]
#[pin_project]
#[must_use = "futures do nothing unless `.await`ed or `poll`ed"]
pub struct Wait<'a> {
    #[pin]
    wait: wait_queue::Wait<'a>,
}

// === impl Notification ===

impl Notification {
    /// Returns a new `Notification` with no waiters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: WaitQueue::new(),
        }
    }

    /// Wakes every task that is currently waiting on this `Notification`.
    ///
    /// If no task is waiting, this does nothing.
    pub fn signal(&self) {
        trace!("Notification::signal");
        self.queue.wake_all();
    }

    /// Waits for the next call to [`signal`](Self::signal).
    ///
    /// The returned future observes signals sent after it was created.
    pub fn wait(&self) -> Wait<'_> {
        Wait {
            wait: self.queue.wait(),
        }
    }
}

impl Default for Notification {
    fn default() -> Self {
        Self::new()
    }
}

impl Waitable for Notification {
    type Value = ();
    type Output = ();
    type Wait<'a> = Wait<'a>;

    fn signal(&self, _: ()) {
        Notification::signal(self)
    }

    fn wait(&self) -> Wait<'_> {
        Notification::wait(self)
    }
}

// === impl Wait ===

impl Future for Wait<'_> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // The queue is never closed, so the only possible outcome is a wakeup.
        self.project().wait.poll(cx).map(|_| ())
    }
}
