//! A first-in, first-out queue with a capacity limit.
//!
//! See the [`LimitedQueue`] type's documentation for details.
use crate::{queue, spawn::Ambient, Error, Notification, Queue, Spawn, Waitable};
use core::{fmt, future::Future};
use futures_util::stream::{self, Stream};
use std::collections::VecDeque;

#[cfg(test)]
mod tests;

/// A [`Queue`] that holds at most `limit` items.
///
/// Producers that [`push`](Self::push) or [`enqueue`](Self::enqueue) onto a
/// full `LimitedQueue` wait until consumers make room, so a slow consumer
/// slows its producers down instead of letting the queue grow without bound.
/// Whenever a push or enqueue completes, the queue holds at most
/// [`limit`](Self::limit) items.
///
/// Producers wait on a second [`Waitable`] called "full", which every
/// [`dequeue`](Self::dequeue) signals. Like "available", it defaults to a
/// [`Notification`] and can be replaced with [`LimitedQueue::builder`].
///
/// # `LimitedQueue` is not [`Waitable`]
///
/// Unlike [`Queue`], a `LimitedQueue` cannot be used as another queue's
/// "available" or "full" [`Waitable`]. [`Waitable::signal`] must add its
/// value without waiting, but adding to a full `LimitedQueue` means waiting
/// for room. Code that needs to signal a limited queue synchronously can call
/// [`try_push`](Self::try_push) and handle the item it gets back; code that
/// needs a `Waitable` can use an unbounded [`Queue`].
///
/// ```compile_fail
/// use hyphae_sync::{LimitedQueue, Waitable};
///
/// fn assert_waitable<W: Waitable>() {}
///
/// assert_waitable::<LimitedQueue<u32>>();
/// ```
///
/// # Examples
///
/// ```
/// use hyphae_sync::LimitedQueue;
/// use std::rc::Rc;
///
/// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// tokio::task::LocalSet::new().block_on(&rt, async {
///     let queue = Rc::new(LimitedQueue::new(2).unwrap());
///
///     let producer = tokio::task::spawn_local({
///         let queue = queue.clone();
///         async move { queue.enqueue(1..=5).await }
///     });
///
///     let mut received = Vec::new();
///     while received.len() < 5 {
///         received.push(queue.dequeue().await);
///         assert!(queue.len() <= queue.limit());
///     }
///
///     producer.await.unwrap();
///     assert_eq!(received, [1, 2, 3, 4, 5]);
/// });
/// ```
pub struct LimitedQueue<T, A = Notification, F = Notification> {
    queue: Queue<T, A>,
    limit: usize,
    full: F,
}

/// Configures a [`LimitedQueue`].
///
/// Returned by [`LimitedQueue::builder()`].
pub struct Builder<A = Notification, F = Notification> {
    queue: queue::Builder<A>,
    limit: usize,
    full: F,
}

// === impl LimitedQueue ===

impl<T> LimitedQueue<T> {
    /// Returns a new, empty `LimitedQueue` holding at most `limit` items.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroLimit`] if `limit` is zero.
    pub fn new(limit: usize) -> Result<Self, Error> {
        Builder::new().limit(limit).build()
    }
}

impl LimitedQueue<()> {
    /// Returns a [`Builder`] for configuring a `LimitedQueue`.
    ///
    /// As with [`Queue::builder`], the item type is chosen by
    /// [`Builder::build`].
    #[must_use]
    pub fn builder() -> Builder {
        Builder::new()
    }
}

impl<T, A, F> LimitedQueue<T, A, F> {
    /// Returns the maximum number of items this queue holds.
    #[inline]
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns the number of items in the queue.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` if the queue holds no items.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns `true` if the queue is full, so that producers must wait.
    #[inline]
    #[must_use]
    pub fn is_limited(&self) -> bool {
        self.len() >= self.limit
    }

    /// Returns the [`Waitable`] signaled when items are added.
    #[must_use]
    pub fn available(&self) -> &A {
        self.queue.available()
    }

    /// Returns the [`Waitable`] signaled when items are removed.
    #[must_use]
    pub fn full(&self) -> &F {
        &self.full
    }

    /// Consumes the queue, returning the items it still holds, front first.
    #[must_use]
    pub fn into_items(self) -> VecDeque<T> {
        self.queue.into_items()
    }
}

impl<T, A, F> LimitedQueue<T, A, F>
where
    A: Waitable<Value = ()>,
    F: Waitable<Value = ()>,
{
    /// Adds `item` to the back of the queue, first waiting for room if the
    /// queue is full.
    ///
    /// # Cancellation
    ///
    /// If the returned future is dropped while waiting for room, `item` is
    /// dropped without being added.
    pub async fn push(&self, item: T) {
        self.wait_for_room().await;
        self.queue.push(item);
    }

    /// Adds `item` to the back of the queue if it is not full.
    ///
    /// # Errors
    ///
    /// Returns `item` back if the queue is full.
    pub fn try_push(&self, item: T) -> Result<(), T> {
        if self.is_limited() {
            return Err(item);
        }
        self.queue.push(item);
        Ok(())
    }

    /// Adds every item in `items` to the back of the queue, in order.
    ///
    /// Items are added in chunks that fit the room left in the queue. Before
    /// each chunk this waits until the queue is no longer full, so a batch
    /// larger than the limit is added over several waits. Consumers are woken
    /// once per chunk.
    ///
    /// # Cancellation
    ///
    /// If the returned future is dropped while waiting for room, chunks that
    /// were already added stay in the queue, and the remaining items are
    /// dropped.
    pub async fn enqueue(&self, items: impl IntoIterator<Item = T>) {
        let mut items = items.into_iter().peekable();
        while items.peek().is_some() {
            self.wait_for_room().await;
            let room = self.limit - self.len();
            self.queue.enqueue(items.by_ref().take(room));
            trace!(room, len = self.len(), "LimitedQueue::enqueue: added chunk");
        }
    }

    /// Removes and returns the front item, waiting for one to be pushed if
    /// the queue is empty, then wakes producers waiting for room.
    ///
    /// # Cancellation
    ///
    /// Dropping the returned future before it completes does not remove an
    /// item from the queue.
    pub async fn dequeue(&self) -> T {
        let item = self.queue.dequeue().await;
        self.full.signal(());
        item
    }

    /// Removes and returns the front item, or `None` if the queue is empty.
    ///
    /// If an item was removed, producers waiting for room are woken.
    pub fn try_dequeue(&self) -> Option<T> {
        let item = self.queue.try_dequeue()?;
        self.full.signal(());
        Some(item)
    }

    /// Returns an endless [`Stream`] of items dequeued from this queue.
    ///
    /// The stream never ends by itself. Stop consuming it by dropping it.
    pub fn each(&self) -> impl Stream<Item = T> + '_ {
        stream::unfold(self, |queue| async move {
            let item = queue.dequeue().await;
            Some((item, queue))
        })
    }

    /// Dequeues items forever, awaiting `body` for each one before dequeueing
    /// the next.
    ///
    /// The returned future never completes; drop it to stop.
    pub async fn for_each<B, Fut>(&self, mut body: B)
    where
        B: FnMut(T) -> Fut,
        Fut: Future<Output = ()>,
    {
        loop {
            let item = self.dequeue().await;
            body(item).await;
        }
    }

    /// Dequeues items forever, running `body` for each one as a task of its
    /// own.
    ///
    /// This behaves like [`Queue::dispatch`]. Because every item is dequeued
    /// as soon as its task is spawned, producers are not held back by how
    /// long `body` takes.
    ///
    /// # Panics
    ///
    /// Panics if the queue has no parent scheduler and the current task is
    /// not running in a [`LocalSet`](tokio::task::LocalSet).
    pub async fn dispatch<B, Fut>(&self, body: B)
    where
        B: FnMut(T) -> Fut,
        Fut: Future<Output = ()> + 'static,
    {
        match self.queue.parent() {
            Some(parent) => self.dispatch_on(parent, body).await,
            None => self.dispatch_on(&Ambient, body).await,
        }
    }

    /// Like [`dispatch`](Self::dispatch), but spawns tasks on `parent`.
    pub async fn dispatch_on<S, B, Fut>(&self, parent: &S, mut body: B)
    where
        S: Spawn + ?Sized,
        B: FnMut(T) -> Fut,
        Fut: Future<Output = ()> + 'static,
    {
        loop {
            let item = self.dequeue().await;
            debug!(len = self.len(), "LimitedQueue::dispatch: spawning");
            parent.spawn(Box::pin(body(item)));
        }
    }

    async fn wait_for_room(&self) {
        // Every dequeue signals, but another producer may take the room
        // before this one runs.
        while self.is_limited() {
            debug!(limit = self.limit, "LimitedQueue: full, waiting");
            self.full.wait().await;
        }
    }
}

impl<T> Default for LimitedQueue<T> {
    /// Returns an empty `LimitedQueue` with a limit of 1.
    fn default() -> Self {
        Self {
            queue: Queue::new(),
            limit: 1,
            full: Notification::new(),
        }
    }
}

impl<T, A, F> fmt::Debug for LimitedQueue<T, A, F>
where
    T: fmt::Debug,
    A: fmt::Debug,
    F: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LimitedQueue")
            .field("queue", &self.queue)
            .field("limit", &self.limit)
            .field("full", &self.full)
            .finish()
    }
}

// === impl Builder ===

impl Builder {
    /// Returns a new `Builder` with the default configuration: a limit of 1,
    /// and default [`Notification`]s.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: queue::Builder::new(),
            limit: 1,
            full: Notification::new(),
        }
    }
}

impl<A, F> Builder<A, F> {
    /// Sets the maximum number of items the queue holds.
    ///
    /// The limit must be at least 1. The default is 1.
    #[must_use]
    pub fn limit(self, limit: usize) -> Self {
        Self { limit, ..self }
    }

    /// Sets the [`Waitable`] signaled when items are removed.
    ///
    /// By default, this is a new [`Notification`].
    #[must_use]
    pub fn full<F2>(self, full: F2) -> Builder<A, F2>
    where
        F2: Waitable<Value = ()>,
    {
        Builder {
            queue: self.queue,
            limit: self.limit,
            full,
        }
    }

    /// Sets the [`Waitable`] signaled when items are added.
    ///
    /// See [`queue::Builder::available`].
    #[must_use]
    pub fn available<A2>(self, available: A2) -> Builder<A2, F>
    where
        A2: Waitable<Value = ()>,
    {
        Builder {
            queue: self.queue.available(available),
            limit: self.limit,
            full: self.full,
        }
    }

    /// Sets the scheduler that [`LimitedQueue::dispatch`] spawns tasks on.
    ///
    /// See [`queue::Builder::parent`].
    #[must_use]
    pub fn parent(self, parent: impl Spawn + 'static) -> Self {
        Self {
            queue: self.queue.parent(parent),
            ..self
        }
    }

    /// Builds an empty [`LimitedQueue`] with this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroLimit`] if the limit was set to zero.
    pub fn build<T>(self) -> Result<LimitedQueue<T, A, F>, Error> {
        if self.limit == 0 {
            return Err(Error::ZeroLimit);
        }

        Ok(LimitedQueue {
            queue: self.queue.build(),
            limit: self.limit,
            full: self.full,
        })
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: fmt::Debug, F: fmt::Debug> fmt::Debug for Builder<A, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("queue", &self.queue)
            .field("limit", &self.limit)
            .field("full", &self.full)
            .finish()
    }
}
