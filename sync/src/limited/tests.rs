use super::*;
use crate::util::test::{run, settle, trace_init};
use futures_util::{task::noop_waker_ref, FutureExt, StreamExt};
use proptest::{collection::vec, proptest};
use std::{
    cell::{Cell, RefCell},
    pin::pin,
    rc::Rc,
    task::Context,
};

#[test]
fn zero_limit_is_an_error() {
    assert_eq!(LimitedQueue::<u32>::new(0).unwrap_err(), Error::ZeroLimit);

    let built = LimitedQueue::builder().limit(0).build::<u32>();
    assert_eq!(built.unwrap_err(), Error::ZeroLimit);

    assert_eq!(
        Error::ZeroLimit.to_string(),
        "a limited queue's limit must be at least 1"
    );
}

#[test]
fn default_limit_is_one() {
    let queue = LimitedQueue::default();
    assert_eq!(queue.limit(), 1);
    assert_eq!(queue.try_push(1), Ok(()));
    assert_eq!(queue.try_push(2), Err(2));

    let built = LimitedQueue::builder().build::<u32>().unwrap();
    assert_eq!(built.limit(), 1);
}

#[test]
fn builder_item_type_comes_from_build() {
    let queue = LimitedQueue::builder().limit(2).build::<&str>().unwrap();
    assert_eq!(queue.try_push("a"), Ok(()));
    assert_eq!(queue.limit(), 2);

    let queue: LimitedQueue<u64, Queue<()>> = LimitedQueue::builder()
        .limit(3)
        .available(Queue::new())
        .build()
        .unwrap();
    queue.try_push(9).unwrap();
    assert_eq!(queue.available().len(), 1);
}

#[test]
fn is_limited() {
    let queue = LimitedQueue::new(2).unwrap();
    assert!(queue.is_empty());
    assert!(!queue.is_limited());

    queue.try_push('a').unwrap();
    assert!(!queue.is_limited());
    queue.try_push('b').unwrap();
    assert!(queue.is_limited());
    assert_eq!(queue.len(), 2);

    assert_eq!(queue.try_dequeue(), Some('a'));
    assert!(!queue.is_limited());
}

#[test]
fn try_push_never_waits() {
    // `try_push` is the synchronous way to add to a limited queue, where a
    // `Waitable` signal would have to wait.
    let queue = LimitedQueue::new(1).unwrap();
    assert_eq!(queue.try_push(1), Ok(()));
    assert_eq!(queue.try_push(2), Err(2));
    assert_eq!(queue.push(2).now_or_never(), None);
    assert_eq!(queue.into_items(), [1]);
}

#[test]
fn push_waits_while_full() {
    let _trace = trace_init();
    let queue = LimitedQueue::new(2).unwrap();

    assert_eq!(queue.push(1).now_or_never(), Some(()));
    assert_eq!(queue.push(2).now_or_never(), Some(()));
    // The third push can't complete, and the cancelled push adds nothing.
    assert_eq!(queue.push(3).now_or_never(), None);
    assert_eq!(queue.len(), 2);

    assert_eq!(queue.dequeue().now_or_never(), Some(1));
    assert_eq!(queue.push(3).now_or_never(), Some(()));
    assert_eq!(queue.into_items(), [2, 3]);
}

#[test]
fn dequeue_releases_blocked_producer() {
    let _trace = trace_init();
    run(async {
        let queue = Rc::new(LimitedQueue::new(1).unwrap());
        let done = Rc::new(Cell::new(false));

        queue.push("first").await;

        tokio::task::spawn_local({
            let queue = queue.clone();
            let done = done.clone();
            async move {
                queue.push("second").await;
                done.set(true);
            }
        });

        settle().await;
        assert!(!done.get());
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.dequeue().await, "first");
        settle().await;
        assert!(done.get());
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.dequeue().await, "second");
    });
}

#[test]
fn dequeue_waits_for_push() {
    run(async {
        let queue = Rc::new(LimitedQueue::new(3).unwrap());
        let got = Rc::new(Cell::new(None));

        tokio::task::spawn_local({
            let queue = queue.clone();
            let got = got.clone();
            async move { got.set(Some(queue.dequeue().await)) }
        });

        settle().await;
        assert_eq!(got.get(), None);

        queue.push(42).await;
        settle().await;
        assert_eq!(got.get(), Some(42));
    });
}

#[test]
fn enqueue_blocks_many_times() {
    let _trace = trace_init();
    run(async {
        let queue = Rc::new(LimitedQueue::new(2).unwrap());
        let done = Rc::new(Cell::new(false));

        tokio::task::spawn_local({
            let queue = queue.clone();
            let done = done.clone();
            async move {
                queue.enqueue(1..=7).await;
                done.set(true);
            }
        });

        let mut received = Vec::new();
        settle().await;
        while received.len() < 7 {
            assert!(queue.len() <= queue.limit());
            assert!(!done.get() || received.len() >= 5);
            received.push(queue.dequeue().await);
            settle().await;
        }

        assert!(done.get());
        assert_eq!(received, [1, 2, 3, 4, 5, 6, 7]);
        assert!(queue.is_empty());
    });
}

#[test]
fn enqueue_fits_chunks_to_room() {
    let _trace = trace_init();
    // Count the "available" signals: one per chunk.
    let queue = LimitedQueue::builder()
        .limit(3)
        .available(Queue::<()>::new())
        .build()
        .unwrap();
    let mut cx = Context::from_waker(noop_waker_ref());

    queue.try_push(0).unwrap();
    let mut enqueue = pin!(queue.enqueue(1..=4));
    assert!(enqueue.as_mut().poll(&mut cx).is_pending());
    // The first chunk filled the two free slots.
    assert_eq!(queue.len(), 3);
    assert_eq!(queue.available().len(), 2);

    assert_eq!(queue.try_dequeue(), Some(0));
    assert!(enqueue.as_mut().poll(&mut cx).is_pending());
    assert_eq!(queue.available().len(), 3);

    assert_eq!(queue.try_dequeue(), Some(1));
    assert_eq!(queue.try_dequeue(), Some(2));
    assert!(enqueue.as_mut().poll(&mut cx).is_ready());
    assert_eq!(queue.available().len(), 4);
    assert_eq!(queue.len(), 2);
}

#[test]
fn cancelled_enqueue_keeps_placed_chunks() {
    let queue = LimitedQueue::new(2).unwrap();

    assert_eq!(queue.enqueue(["a", "b", "c", "d"]).now_or_never(), None);
    assert_eq!(queue.into_items(), ["a", "b"]);
}

#[test]
fn dequeue_always_signals_full() {
    // Use a queue as the "full" waitable, so that its tokens count signals.
    let queue = LimitedQueue::builder()
        .limit(4)
        .full(Queue::<()>::new())
        .build()
        .unwrap();

    queue.try_push(1).unwrap();
    queue.try_push(2).unwrap();
    assert_eq!(queue.full().len(), 0);

    assert_eq!(queue.dequeue().now_or_never(), Some(1));
    assert_eq!(queue.full().len(), 1);
    assert_eq!(queue.try_dequeue(), Some(2));
    assert_eq!(queue.full().len(), 2);

    // Nothing removed, nothing signaled.
    assert_eq!(queue.try_dequeue(), None);
    assert_eq!(queue.dequeue().now_or_never(), None);
    assert_eq!(queue.full().len(), 2);
}

#[test]
fn each_releases_producers() {
    let _trace = trace_init();
    run(async {
        let queue = Rc::new(LimitedQueue::new(1).unwrap());

        tokio::task::spawn_local({
            let queue = queue.clone();
            async move {
                for i in 0..5 {
                    queue.push(i).await;
                }
            }
        });

        let received = queue.each().take(5).collect::<Vec<_>>().await;
        assert_eq!(received, [0, 1, 2, 3, 4]);
    });
}

#[test]
fn dispatch() {
    let _trace = trace_init();
    run(async {
        let queue = Rc::new(LimitedQueue::new(1).unwrap());
        let done = Rc::new(RefCell::new(Vec::new()));

        tokio::task::spawn_local({
            let queue = queue.clone();
            let done = done.clone();
            async move {
                queue
                    .dispatch(|item| {
                        let done = done.clone();
                        async move { done.borrow_mut().push(item) }
                    })
                    .await
            }
        });

        queue.enqueue(0..4).await;
        settle().await;

        let mut done = done.borrow().clone();
        done.sort_unstable();
        assert_eq!(done, [0, 1, 2, 3]);
        assert!(queue.is_empty());
    });
}

proptest! {
    #[test]
    fn capacity_is_never_exceeded(
        limit in 1usize..4,
        batches in vec(vec(0u8..u8::MAX, 0..6), 1..4),
    ) {
        run_producers(limit, batches);
    }
}

fn run_producers(limit: usize, batches: Vec<Vec<u8>>) {
    run(async move {
        let queue = Rc::new(LimitedQueue::new(limit).unwrap());
        let total = batches.iter().map(Vec::len).sum::<usize>();

        for (producer, batch) in batches.iter().enumerate() {
            let queue = queue.clone();
            let batch = batch.clone();
            tokio::task::spawn_local(async move {
                let items = batch.into_iter().map(|item| (producer, item));
                queue.enqueue(items).await;
            });
        }

        let mut received = Vec::new();
        while received.len() < total {
            settle().await;
            assert!(queue.len() <= limit, "{} > {limit}", queue.len());
            received.push(queue.dequeue().await);
            assert!(queue.len() <= limit, "{} > {limit}", queue.len());
        }

        settle().await;
        assert!(queue.is_empty());

        // Each producer's items arrive in the order it enqueued them.
        for (producer, batch) in batches.iter().enumerate() {
            let from_producer = received
                .iter()
                .filter(|&&(p, _)| p == producer)
                .map(|&(_, item)| item)
                .collect::<Vec<_>>();
            assert_eq!(&from_producer, batch);
        }
    });
}
