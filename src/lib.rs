//! Coordination primitives for tasks that share a single thread.
//!
//! `hyphae` collects two independent building blocks:
//!
//! - [`sync`]: first-in, first-out queues that tasks can wait on.
//!   [`Queue`] is unbounded; [`LimitedQueue`] holds a fixed number of
//!   items and makes producers wait while it is full. Both wake waiting
//!   tasks through a [`Waitable`], by default a [`Notification`].
//! - [`list`]: an intrusive doubly-linked [`List`] whose nodes know which
//!   list they are linked into, so they can be deleted in O(1), even while
//!   the list is being enumerated.
//!
//! Neither half is thread-safe. They are built for tasks that run on one
//! thread and only switch at `.await` points, such as tasks spawned on a
//! [`tokio::task::LocalSet`](https://docs.rs/tokio/latest/tokio/task/struct.LocalSet.html).
//!
//! # Features
//!
//! - `tracing`: emit [`tracing`](https://docs.rs/tracing) events from queue
//!   and notification operations.
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs, missing_debug_implementations)]

#[doc(inline)]
pub use hyphae_list as list;
#[doc(inline)]
pub use hyphae_sync as sync;

#[doc(inline)]
pub use hyphae_list::{Linked, List, Node};
#[doc(inline)]
pub use hyphae_sync::{LimitedQueue, Notification, Queue, Spawn, Waitable};
