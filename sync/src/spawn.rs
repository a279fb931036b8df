//! Spawning tasks on a single-threaded scheduler.
//!
//! [`Queue::dispatch`](crate::Queue::dispatch) runs each dequeued item on a
//! task of its own. The [`Spawn`] trait is how a queue reaches the scheduler
//! that runs those tasks.
use futures_util::future::LocalBoxFuture;
use std::{fmt, rc::Rc};
use tokio::task::LocalSet;

/// A scheduler that can run `!Send` tasks alongside the current one.
///
/// Implementations must not poll `future` before `spawn` returns: the task
/// starts at some later point, when the spawning task yields.
pub trait Spawn {
    /// Spawns `future` as a new task.
    fn spawn(&self, future: LocalBoxFuture<'static, ()>);
}

/// Spawns tasks on whichever [`LocalSet`] is currently running.
///
/// This is what a [`Queue`](crate::Queue) dispatches onto when it was not
/// built with a parent scheduler.
///
/// # Panics
///
/// [`Spawn::spawn`] panics if called outside the context of a [`LocalSet`].
#[derive(Copy, Clone, Debug, Default)]
pub struct Ambient;

impl Spawn for Ambient {
    fn spawn(&self, future: LocalBoxFuture<'static, ()>) {
        trace!("Ambient::spawn");
        // Tasks run detached; completion is observed through whatever the
        // task itself does.
        drop(tokio::task::spawn_local(future));
    }
}

impl Spawn for LocalSet {
    fn spawn(&self, future: LocalBoxFuture<'static, ()>) {
        trace!("LocalSet::spawn");
        drop(self.spawn_local(future));
    }
}

impl<S: Spawn + ?Sized> Spawn for Rc<S> {
    fn spawn(&self, future: LocalBoxFuture<'static, ()>) {
        S::spawn(self, future)
    }
}

impl<S: Spawn + ?Sized> Spawn for &S {
    fn spawn(&self, future: LocalBoxFuture<'static, ()>) {
        S::spawn(self, future)
    }
}

/// Formats an optional parent scheduler without requiring `Debug`.
pub(crate) struct Parent<'a>(pub(crate) &'a Option<Rc<dyn Spawn>>);

impl fmt::Debug for Parent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Some(<dyn Spawn>)"),
            None => f.write_str("None"),
        }
    }
}
