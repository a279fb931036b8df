//! An unbounded first-in, first-out queue for cooperatively scheduled tasks.
//!
//! See the [`Queue`] type's documentation for details.
use crate::{
    spawn::{self, Ambient},
    Notification, Spawn, Waitable,
};
use core::{
    cell::RefCell,
    fmt,
    future::Future,
    pin::Pin,
    task::{ready, Context, Poll},
};
use futures_util::stream::{self, Stream};
use pin_project::pin_project;
use std::{collections::VecDeque, rc::Rc};


/// An unbounded first-in, first-out queue.
///
/// Any number of tasks may [`push`](Self::push) items onto a `Queue` and
/// [`dequeue`](Self::dequeue) them again. Items are always dequeued in the
/// order in which they were pushed, however the producing and consuming tasks
/// interleave. Dequeueing from an empty queue waits until an item is pushed.
///
/// A `Queue` wakes its consumers through a [`Waitable`] called "available",
/// which it signals whenever items are added. By default this is a
/// [`Notification`], but any `Waitable` whose signal takes no value can be
/// used instead, including another `Queue<()>`. See [`Queue::builder`].
///
/// A `Queue` is itself [`Waitable`]: signaling it pushes the signaled value,
/// and waiting on it dequeues one.
///
/// # Examples
///
/// ```
/// use hyphae_sync::Queue;
/// use std::rc::Rc;
///
/// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// tokio::task::LocalSet::new().block_on(&rt, async {
///     let queue = Rc::new(Queue::new());
///
///     let consumer = tokio::task::spawn_local({
///         let queue = queue.clone();
///         async move {
///             let a = queue.dequeue().await;
///             let b = queue.dequeue().await;
///             (a, b)
///         }
///     });
///
///     queue.push("hello");
///     queue.push("world");
///
///     assert_eq!(consumer.await.unwrap(), ("hello", "world"));
/// });
/// ```
pub struct Queue<T, A = Notification> {
    items: RefCell<VecDeque<T>>,
    available: A,
    parent: Option<Rc<dyn Spawn>>,
}

/// Future returned from [`Queue::dequeue()`].
///
/// Dropping this future before it completes leaves the queue unchanged.
#[pin_project]
#[must_use = "futures do nothing unless `.await`ed or `poll`ed"]
pub struct Dequeue<'a, T, A>
where
    A: Waitable + 'a,
{
    queue: &'a Queue<T, A>,
    #[pin]
    wait: Option<A::Wait<'a>>,
}

/// Configures a [`Queue`].
///
/// Returned by [`Queue::builder()`].
pub struct Builder<A = Notification> {
    parent: Option<Rc<dyn Spawn>>,
    available: A,
}

// === impl Queue ===

impl<T> Queue<T> {
    /// Returns a new, empty `Queue` that signals a default [`Notification`]
    /// when items become available, and dispatches onto the ambient
    /// scheduler.
    #[must_use]
    pub fn new() -> Self {
        Builder::new().build()
    }
}

impl Queue<()> {
    /// Returns a [`Builder`] for configuring a `Queue`.
    ///
    /// The builder does not fix the queue's item type;
    /// [`Builder::build`] chooses it, so this can be called as
    /// `Queue::builder()` for a queue of any item type.
    #[must_use]
    pub fn builder() -> Builder {
        Builder::new()
    }
}

impl<T, A> Queue<T, A> {
    /// Returns the number of items in the queue.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    /// Returns `true` if the queue holds no items.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Removes and returns the front item, or `None` if the queue is empty.
    ///
    /// Unlike [`dequeue`](Self::dequeue), this never waits.
    pub fn try_dequeue(&self) -> Option<T> {
        self.items.borrow_mut().pop_front()
    }

    /// Returns the [`Waitable`] this queue signals when items are added.
    #[must_use]
    pub fn available(&self) -> &A {
        &self.available
    }

    /// Consumes the queue, returning the items it still holds, front first.
    #[must_use]
    pub fn into_items(self) -> VecDeque<T> {
        self.items.into_inner()
    }

    pub(crate) fn parent(&self) -> Option<&dyn Spawn> {
        self.parent.as_deref()
    }
}

impl<T, A> Queue<T, A>
where
    A: Waitable<Value = ()>,
{
    /// Adds `item` to the back of the queue, waking waiting consumers.
    pub fn push(&self, item: T) {
        self.items.borrow_mut().push_back(item);
        trace!(len = self.len(), "Queue::push");
        self.available.signal(());
    }

    /// Adds every item in `items` to the back of the queue, in order.
    ///
    /// Consumers are woken once for the whole batch, and only if at least one
    /// item was added. Returns the number of items added.
    pub fn enqueue(&self, items: impl IntoIterator<Item = T>) -> usize {
        let mut added = 0;
        for item in items {
            // Don't hold the borrow while the iterator runs; it may look at
            // the queue.
            self.items.borrow_mut().push_back(item);
            added += 1;
        }
        trace!(added, len = self.len(), "Queue::enqueue");
        if added > 0 {
            self.available.signal(());
        }
        added
    }

    /// Removes and returns the front item, waiting for one to be pushed if
    /// the queue is empty.
    ///
    /// Several tasks may wait to dequeue at once. When a single item arrives,
    /// all of them wake, one of them gets the item, and the others go back to
    /// waiting.
    ///
    /// # Cancellation
    ///
    /// Dropping the returned future before it completes does not remove an
    /// item from the queue.
    pub fn dequeue(&self) -> Dequeue<'_, T, A> {
        Dequeue {
            queue: self,
            wait: None,
        }
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
    pub async fn for_each<F, Fut>(&self, mut body: F)
    where
        F: FnMut(T) -> Fut,
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
    /// Tasks are spawned on the parent scheduler the queue was
    /// [built](Builder::parent) with. Without one, they are spawned on the
    /// [`LocalSet`](tokio::task::LocalSet) that is running the current task.
    ///
    /// The returned future never completes; drop it to stop dispatching.
    /// Tasks already spawned keep running.
    ///
    /// # Panics
    ///
    /// Panics if the queue has no parent scheduler and the current task is
    /// not running in a [`LocalSet`](tokio::task::LocalSet).
    pub async fn dispatch<F, Fut>(&self, body: F)
    where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = ()> + 'static,
    {
        match self.parent() {
            Some(parent) => self.dispatch_on(parent, body).await,
            None => self.dispatch_on(&Ambient, body).await,
        }
    }

    /// Like [`dispatch`](Self::dispatch), but spawns tasks on `parent`.
    pub async fn dispatch_on<S, F, Fut>(&self, parent: &S, mut body: F)
    where
        S: Spawn + ?Sized,
        F: FnMut(T) -> Fut,
        Fut: Future<Output = ()> + 'static,
    {
        loop {
            let item = self.dequeue().await;
            debug!(len = self.len(), "Queue::dispatch: spawning");
            parent.spawn(Box::pin(body(item)));
        }
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A> fmt::Debug for Queue<T, A>
where
    T: fmt::Debug,
    A: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            items,
            available,
            parent,
        } = self;
        f.debug_struct("Queue")
            .field("items", items)
            .field("available", available)
            .field("parent", &spawn::Parent(parent))
            .finish()
    }
}

impl<T, A> Waitable for Queue<T, A>
where
    A: Waitable<Value = ()>,
{
    type Value = T;
    type Output = T;
    type Wait<'a>
        = Dequeue<'a, T, A>
    where
        Self: 'a;

    /// Pushes `item`.
    fn signal(&self, item: T) {
        self.push(item)
    }

    /// Dequeues an item.
    fn wait(&self) -> Dequeue<'_, T, A> {
        self.dequeue()
    }
}

// === impl Dequeue ===

impl<'a, T, A> Future for Dequeue<'a, T, A>
where
    A: Waitable<Value = ()> + 'a,
{
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();
        let queue: &'a Queue<T, A> = *this.queue;
        loop {
            if let Some(wait) = this.wait.as_mut().as_pin_mut() {
                ready!(wait.poll(cx));
                this.wait.set(None);
                trace!("Queue::dequeue: woken");
            }

            // A wakeup only means that an item may be available; another
            // consumer may have taken it first.
            if let Some(item) = queue.try_dequeue() {
                return Poll::Ready(item);
            }

            trace!("Queue::dequeue: waiting");
            this.wait.set(Some(queue.available.wait()));
        }
    }
}

impl<'a, T, A> fmt::Debug for Dequeue<'a, T, A>
where
    A: Waitable + 'a,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dequeue")
            .field("len", &self.queue.len())
            .field("waiting", &self.wait.is_some())
            .finish()
    }
}

// === impl Builder ===

impl Builder {
    /// Returns a new `Builder` with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: None,
            available: Notification::new(),
        }
    }
}

impl<A> Builder<A> {
    /// Sets the scheduler that [`Queue::dispatch`] spawns tasks on.
    ///
    /// By default, tasks are spawned on the current
    /// [`LocalSet`](tokio::task::LocalSet).
    #[must_use]
    pub fn parent(self, parent: impl Spawn + 'static) -> Self {
        Self {
            parent: Some(Rc::new(parent)),
            ..self
        }
    }

    /// Sets the [`Waitable`] signaled when items are added to the queue.
    ///
    /// By default, this is a new [`Notification`].
    #[must_use]
    pub fn available<A2>(self, available: A2) -> Builder<A2>
    where
        A2: Waitable<Value = ()>,
    {
        Builder {
            parent: self.parent,
            available,
        }
    }

    /// Builds an empty [`Queue`] with this configuration.
    #[must_use]
    pub fn build<T>(self) -> Queue<T, A> {
        Queue {
            items: RefCell::new(VecDeque::new()),
            available: self.available,
            parent: self.parent,
        }
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: fmt::Debug> fmt::Debug for Builder<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("parent", &spawn::Parent(&self.parent))
            .field("available", &self.available)
            .finish()
    }
}
