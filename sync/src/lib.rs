//! FIFO queues for tasks scheduled cooperatively on a single thread.
//!
//! This crate provides:
//!
//! - [`Queue`]: an unbounded first-in, first-out queue. Consumers
//!   [`dequeue`](Queue::dequeue) items asynchronously, waiting until one is
//!   available.
//! - [`LimitedQueue`]: a [`Queue`] with a capacity limit. Producers wait
//!   while the queue is full, which applies backpressure.
//! - [`Notification`]: a level-triggered signal, used by default to wake
//!   waiting consumers and producers.
//! - [`Waitable`]: the interface shared by anything that tasks can wait on
//!   and signal, implemented by both [`Notification`] and [`Queue`]. Queues
//!   may be built on any `Waitable`, including other queues.
//! - [`Spawn`]: the interface a scheduler exposes so that a queue can
//!   [dispatch](Queue::dispatch) each item to a task of its own.
//!
//! # Scheduling model
//!
//! These types assume that all tasks using them run on the same thread, and
//! only give up control at `.await` points. Every operation that does not
//! return a future completes without interruption. None of the types here
//! are `Sync`; share them between tasks with [`Rc`](std::rc::Rc) or by
//! reference, for example inside a [`tokio::task::LocalSet`].
//!
//! Waiting is level-triggered: a wakeup only means that the awaited
//! condition *may* hold, so every waiting operation re-checks its condition
//! and waits again if needed. Dropping a pending future cancels the wait
//! without modifying the queue.
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs, missing_debug_implementations)]

#[macro_use]
pub(crate) mod util;

pub mod limited;
pub mod notification;
pub mod queue;
pub mod spawn;

#[doc(inline)]
pub use self::limited::LimitedQueue;
#[doc(inline)]
pub use self::notification::Notification;
#[doc(inline)]
pub use self::queue::Queue;
#[doc(inline)]
pub use self::spawn::Spawn;

use std::future::Future;

/// Something that tasks can wait on, and that can be signaled to wake them.
///
/// A [`Notification`] is the basic `Waitable`: signaling it wakes every task
/// currently waiting on it. A [`Queue`] is also `Waitable`: signaling it
/// pushes a value, and waiting on it dequeues one.
///
/// Signals are not counted. If nothing is waiting when a plain
/// [`Notification`] is signaled, the signal is lost, and a task that is woken
/// should check that whatever it was waiting for actually happened.
pub trait Waitable {
    /// The value passed to [`signal`](Self::signal).
    type Value;

    /// The value produced by [`wait`](Self::wait).
    type Output;

    /// Future returned by [`wait`](Self::wait).
    type Wait<'a>: Future<Output = Self::Output>
    where
        Self: 'a;

    /// Signals this `Waitable`, waking tasks that are waiting on it.
    fn signal(&self, value: Self::Value);

    /// Returns a future that completes once this `Waitable` is signaled.
    fn wait(&self) -> Self::Wait<'_>;
}

/// Errors returned when constructing a queue.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// A [`LimitedQueue`] was configured with a limit of zero, which would
    /// block every producer forever.
    #[error("a limited queue's limit must be at least 1")]
    ZeroLimit,
}

impl<W: Waitable + ?Sized> Waitable for &W {
    type Value = W::Value;
    type Output = W::Output;
    type Wait<'a>
        = W::Wait<'a>
    where
        Self: 'a;

    fn signal(&self, value: Self::Value) {
        W::signal(self, value)
    }

    fn wait(&self) -> Self::Wait<'_> {
        W::wait(self)
    }
}
