//! An intrusive doubly-linked list for cooperative runtimes.
//!
//! The [`List`] in this crate links nodes that live *outside* of it: every
//! node embeds a [`list::Links`] value, which holds the node's forward and
//! backward links together with a back-reference to the list the node is
//! currently linked into. Because a node always knows whether (and where) it
//! is linked:
//!
//! - [`List::delete`] is O(1) and can reject nodes that belong to some other
//!   list, or to no list at all, without traversing anything;
//! - a node can remove *itself* from whatever list it is in, using
//!   [`Node::delete`];
//! - enumeration with [`List::each`] tolerates the consumer deleting the
//!   node it is currently looking at.
//!
//! All operations take `&self`; the list is meant to be shared between tasks
//! running on a single thread, and is neither `Send` nor `Sync`.
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(any(feature = "std", test)), no_std)]
#![warn(missing_docs, missing_debug_implementations)]

extern crate alloc;

pub(crate) mod util;

pub mod list;

#[doc(inline)]
pub use list::{Each, Links, List, Node};

/// Trait implemented by types which can be linked into a [`List`].
///
/// In order to be part of a list, a type must contain a [`list::Links`]
/// value, and return it from [`Linked::links`].
///
/// # Examples
///
/// ```
/// use hyphae_list::{list::Links, Linked, List};
///
/// #[derive(Debug)]
/// struct Entry {
///     links: Links<Entry>,
///     val: i32,
/// }
///
/// unsafe impl Linked<Links<Entry>> for Entry {
///     fn links(&self) -> &Links<Entry> {
///         &self.links
///     }
/// }
///
/// let a = Box::pin(Entry { links: Links::new(), val: 1 });
/// let b = Box::pin(Entry { links: Links::new(), val: 2 });
///
/// let list = List::new();
/// list.append(a.as_ref());
/// list.prepend(b.as_ref());
///
/// let vals: Vec<i32> = list.each().map(|entry| entry.val).collect();
/// assert_eq!(vals, [2, 1]);
/// ```
///
/// # Safety
///
/// Implementations **must** return the same `Links` value every time
/// [`Linked::links`] is called on a given node, and that value must be owned
/// by the node (typically, it is one of the node's fields), so that it is
/// dropped when the node is dropped. Returning links that are shared between
/// nodes, or that outlive the node without being dropped, leaves dangling
/// pointers in the list.
pub unsafe trait Linked<L> {
    /// Returns this node's links.
    fn links(&self) -> &L;
}

/// Errors returned when deleting a node from a [`List`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// [`List::delete`] was called with a node that is not linked into that
    /// list. The node may be detached, already deleted, or linked into a
    /// different list.
    #[error("node is not in a list")]
    NotInList,

    /// [`Node::delete`] was called on a node that is not linked into any list,
    /// such as a node which already deleted itself.
    #[error("node has no list to delete itself from")]
    NoSuchOperation,
}
