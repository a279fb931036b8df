//! An intrusive doubly-linked list.
//!
//! See the [`List`] type for details.
use crate::{util::FmtOption, Error, Linked};
use alloc::boxed::Box;
use core::{
    cell::Cell,
    fmt,
    marker::{PhantomData, PhantomPinned},
    pin::Pin,
    ptr::NonNull,
};


/// An [intrusive] doubly-linked list.
///
/// Nodes are linked with [`List::append`] and [`List::prepend`], and unlinked
/// with [`List::delete`] (or [`Node::delete`], from the node itself). All of
/// these are O(1).
///
/// A list borrows its nodes for the lifetime `'a`, so a node always outlives
/// every list it is linked into. Nodes must also be [pinned], as the list
/// stores pointers to them. When the list is dropped, any nodes still linked
/// into it are detached.
///
/// Every node records which list it belongs to. This makes membership checks
/// O(1): deleting a node that is not in *this* list fails with
/// [`Error::NotInList`] and leaves both lists untouched.
///
/// # Mutation during enumeration
///
/// [`List::each`] returns an [`Each`] iterator. Before it yields a node, it
/// captures the link to the node after it, and it advances using that
/// captured link. Therefore, the consumer may delete the node it was just
/// handed (or any node it has already seen) without disturbing the traversal:
///
/// ```
/// # use hyphae_list::{list::Links, Linked, List};
/// # #[derive(Debug)]
/// # struct Entry { links: Links<Entry>, val: i32 }
/// # unsafe impl Linked<Links<Entry>> for Entry {
/// #     fn links(&self) -> &Links<Entry> { &self.links }
/// # }
/// # fn entry(val: i32) -> std::pin::Pin<Box<Entry>> {
/// #     Box::pin(Entry { links: Links::new(), val })
/// # }
/// let entries = [entry(1), entry(2), entry(3), entry(4)];
/// let list = List::new();
/// for entry in &entries {
///     list.append(entry.as_ref());
/// }
///
/// let mut seen = Vec::new();
/// for entry in list.each() {
///     seen.push(entry.val);
///     if entry.val % 2 == 0 {
///         list.delete(entry).unwrap();
///     }
/// }
///
/// assert_eq!(seen, [1, 2, 3, 4]);
/// let rest: Vec<i32> = list.each().map(|entry| entry.val).collect();
/// assert_eq!(rest, [1, 3]);
/// ```
///
/// If the consumer deletes the captured next node instead, the enumeration
/// resumes from the live successor of the node it was just handed, as long
/// as that node is still linked. If both the current node and the captured
/// next node are deleted before the iterator advances, there is no linked
/// node left to resume from, and the enumeration ends early:
///
/// ```
/// # use hyphae_list::{list::Links, Linked, List};
/// # #[derive(Debug)]
/// # struct Entry { links: Links<Entry>, val: i32 }
/// # unsafe impl Linked<Links<Entry>> for Entry {
/// #     fn links(&self) -> &Links<Entry> { &self.links }
/// # }
/// # fn entry(val: i32) -> std::pin::Pin<Box<Entry>> {
/// #     Box::pin(Entry { links: Links::new(), val })
/// # }
/// let entries = [entry(1), entry(2), entry(3)];
/// let list = List::new();
/// for entry in &entries {
///     list.append(entry.as_ref());
/// }
///
/// let mut seen = Vec::new();
/// for entry in list.each() {
///     seen.push(entry.val);
///     list.delete(&entries[1]).unwrap();
///     list.delete(entry).unwrap();
/// }
///
/// // Entry 3 is still linked, but this enumeration never reaches it.
/// assert_eq!(seen, [1]);
/// assert_eq!(list.len(), 1);
/// ```
///
/// Nodes inserted while an enumeration is in progress may or may not be
/// visited by it, depending on where they were inserted.
///
/// [intrusive]: crate
/// [pinned]: core::pin
pub struct List<'a, T> {
    head: Box<Head<T>>,
    _nodes: PhantomData<&'a T>,
}

/// Links to other nodes in a [`List`].
///
/// In order to be part of a [`List`], a type must contain an instance of this
/// type, and must implement the [`Linked`] trait for `Links<Self>`.
///
/// Besides the forward and backward links, `Links` hold a back-reference to
/// the list the node is linked into. The back-reference does not own the
/// list; it is set when the node is linked and cleared when it is unlinked.
pub struct Links<T> {
    next: Cell<Link<T>>,
    prev: Cell<Link<T>>,
    /// The node these links are embedded in, while linked.
    node: Cell<Option<NonNull<T>>>,
    owner: Cell<Option<NonNull<Head<T>>>>,
    /// Linked list links must always be `!Unpin`, so that nodes containing
    /// them cannot be moved out of a `Pin`.
    _unpin: PhantomPinned,
}

/// An iterator over the nodes of a [`List`], from first to last.
///
/// Returned by [`List::each`]. See [mutation during
/// enumeration](List#mutation-during-enumeration) for what may be done to the
/// list while an `Each` is in progress.
pub struct Each<'list, 'a, T> {
    list: &'list List<'a, T>,
    /// The links of the node yielded last.
    curr: Link<T>,
    /// The link captured from `curr` before it was yielded.
    next: Link<T>,
}

/// Operations performed by a linked node on itself.
///
/// This trait is implemented for every type which can be linked into a
/// [`List`].
pub trait Node: Linked<Links<Self>> + Sized {
    /// Returns `true` if this node is currently linked into a [`List`].
    fn is_linked(&self) -> bool {
        self.links().is_linked()
    }

    /// Deletes this node from the list it is linked into.
    ///
    /// This is equivalent to calling [`List::delete`] on the node's list,
    /// without needing a reference to that list.
    ///
    /// # Errors
    ///
    /// - [`Error::NoSuchOperation`] if this node is not linked into any
    ///   list. In particular, a node that has already deleted itself cannot
    ///   do so again.
    fn delete(&self) -> Result<(), Error> {
        let links = self.links();
        let owner = links.owner.get().ok_or(Error::NoSuchOperation)?;
        // Safety: a list clears the owner of every node still linked into it
        // before its head is freed, so a set owner always points to a live
        // head.
        unsafe { owner.as_ref() }.unlink(links)
    }
}

type Link<T> = Option<NonNull<Links<T>>>;

/// The ends of a [`List`].
///
/// This lives in its own allocation so that its address stays the same when
/// the `List` is moved. Nodes point back at it as their owner.
struct Head<T> {
    first: Cell<Link<T>>,
    last: Cell<Link<T>>,
}

// ==== impl List ====

impl<'a, T: Linked<Links<T>>> List<'a, T> {
    /// Returns a new empty list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            head: Box::new(Head {
                first: Cell::new(None),
                last: Cell::new(None),
            }),
            _nodes: PhantomData,
        }
    }

    /// Returns `true` if this list is empty.
    pub fn is_empty(&self) -> bool {
        if self.head.first.get().is_none() {
            debug_assert!(
                self.head.last.get().is_none(),
                "inconsistent state: a list had a tail but no head!"
            );
            return true;
        }

        false
    }

    /// Returns the number of nodes in this list.
    ///
    /// This traverses the list, and is therefore O(n).
    pub fn len(&self) -> usize {
        self.each().count()
    }

    /// Returns the first node in the list, if there is one.
    #[must_use]
    pub fn first(&self) -> Option<&'a T> {
        self.head.first.get().and_then(|links| unsafe { node(links) })
    }

    /// Returns the last node in the list, if there is one.
    #[must_use]
    pub fn last(&self) -> Option<&'a T> {
        self.head.last.get().and_then(|links| unsafe { node(links) })
    }

    /// Returns `true` if `node` is linked into this list.
    ///
    /// This does not traverse the list.
    pub fn contains(&self, node: &T) -> bool {
        self.head.owns(node.links())
    }

    /// Links `node` after the last node in the list.
    ///
    /// # Panics
    ///
    /// If `node` is already linked into a list (this one or any other).
    pub fn append(&self, node: Pin<&'a T>) {
        let node = node.get_ref();
        let links = node.links();
        assert!(
            !links.is_linked(),
            "cannot append a node that is already linked into a list"
        );
        let ptr = NonNull::from(links);
        links.node.set(Some(NonNull::from(node)));
        links.owner.set(Some(self.head.id()));
        links.next.set(None);
        links.prev.set(self.head.last.get());

        match self.head.last.replace(Some(ptr)) {
            // Safety: linked links stay valid while they are linked; see
            // `node`.
            Some(last) => unsafe { last.as_ref() }.next.set(Some(ptr)),
            None => self.head.first.set(Some(ptr)),
        }
    }

    /// Links `node` before the first node in the list.
    ///
    /// # Panics
    ///
    /// If `node` is already linked into a list (this one or any other).
    pub fn prepend(&self, node: Pin<&'a T>) {
        let node = node.get_ref();
        let links = node.links();
        assert!(
            !links.is_linked(),
            "cannot prepend a node that is already linked into a list"
        );
        let ptr = NonNull::from(links);
        links.node.set(Some(NonNull::from(node)));
        links.owner.set(Some(self.head.id()));
        links.prev.set(None);
        links.next.set(self.head.first.get());

        match self.head.first.replace(Some(ptr)) {
            Some(first) => unsafe { first.as_ref() }.prev.set(Some(ptr)),
            None => self.head.last.set(Some(ptr)),
        }
    }

    /// Unlinks `node` from this list.
    ///
    /// The nodes before and after `node` are linked to each other, and
    /// `node` is left detached, so it may be linked into a list again.
    ///
    /// # Errors
    ///
    /// - [`Error::NotInList`] if `node` is not linked into *this* list. In
    ///   that case, nothing is modified.
    pub fn delete(&self, node: &T) -> Result<(), Error> {
        self.head.unlink(node.links())
    }

    /// Unlinks and returns the first node in the list, if there is one.
    pub fn pop_front(&self) -> Option<&'a T> {
        let first = self.first()?;
        let unlinked = self.head.unlink(first.links());
        debug_assert_eq!(unlinked, Ok(()), "the first node must be in the list");
        Some(first)
    }

    /// Returns an iterator over the nodes in this list, from first to last.
    ///
    /// Each call starts a new traversal from the current first node. The list
    /// may be modified while the iterator is in use; see [mutation during
    /// enumeration](List#mutation-during-enumeration).
    #[must_use]
    pub fn each(&self) -> Each<'_, 'a, T> {
        Each {
            list: self,
            curr: None,
            next: self.head.first.get(),
        }
    }

    /// Asserts as many of the linked list's invariants as possible.
    pub fn assert_valid(&self) {
        let id = self.head.id();
        let Some(first) = self.head.first.get() else {
            assert!(
                self.head.last.get().is_none(),
                "if the linked list's head is null, the tail must also be null"
            );
            return;
        };
        let last = self
            .head
            .last
            .get()
            .expect("if the linked list has a head, it must also have a tail");

        assert_eq!(
            unsafe { first.as_ref() }.prev.get(),
            None,
            "head node must not have a prev link"
        );
        assert_eq!(
            unsafe { last.as_ref() }.next.get(),
            None,
            "tail node must not have a next link"
        );

        let mut forward = 0;
        let mut prev = None;
        let mut curr = Some(first);
        while let Some(ptr) = curr {
            let links = unsafe { ptr.as_ref() };
            assert_eq!(
                links.owner.get(),
                Some(id),
                "every node in the list must be owned by it; node={links:#?}"
            );
            assert!(
                links.node.get().is_some(),
                "every node in the list must know its container; node={links:#?}"
            );
            assert_eq!(
                links.prev.get(),
                prev,
                "node's prev link must point at the node before it; node={links:#?}"
            );
            assert_ne!(
                links.next.get(),
                Some(ptr),
                "node's next link cannot be to itself; node={links:#?}"
            );
            forward += 1;
            prev = Some(ptr);
            curr = links.next.get();
        }
        assert_eq!(prev, Some(last), "traversal from the head must end at the tail");

        let mut backward = 0;
        let mut curr = Some(last);
        while let Some(ptr) = curr {
            backward += 1;
            curr = unsafe { ptr.as_ref() }.prev.get();
        }
        assert_eq!(
            forward, backward,
            "traversing the list in either direction must visit the same number of nodes"
        );
    }
}

impl<T: Linked<Links<T>>> Default for List<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for List<'_, T> {
    fn drop(&mut self) {
        // Detach whatever is still linked, so that no node is left pointing
        // at the head once it is freed.
        let mut curr = self.head.first.take();
        self.head.last.set(None);
        while let Some(ptr) = curr {
            let links = unsafe { ptr.as_ref() };
            curr = links.next.get();
            links.clear();
        }
    }
}

impl<T> fmt::Debug for List<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List")
            .field("head", &FmtOption::new(&self.head.first.get()))
            .field("tail", &FmtOption::new(&self.head.last.get()))
            .finish()
    }
}

impl<'list, 'a, T: Linked<Links<T>>> IntoIterator for &'list List<'a, T> {
    type Item = &'a T;
    type IntoIter = Each<'list, 'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.each()
    }
}

/// Returns the node that `links` are embedded in.
///
/// # Safety
///
/// `links` must point to the links of a node that is currently linked into a
/// `List<'a, T>`. Such nodes are borrowed for `'a`.
unsafe fn node<'a, T>(links: NonNull<Links<T>>) -> Option<&'a T> {
    links.as_ref().node.get().map(|node| node.as_ref())
}

// ==== impl Head ====

impl<T> Head<T> {
    fn id(&self) -> NonNull<Self> {
        NonNull::from(self)
    }

    fn owns(&self, links: &Links<T>) -> bool {
        links.owner.get() == Some(self.id())
    }

    fn unlink(&self, links: &Links<T>) -> Result<(), Error> {
        if !self.owns(links) {
            return Err(Error::NotInList);
        }

        let prev = links.prev.get();
        let next = links.next.get();
        debug_assert_ne!(prev, Some(NonNull::from(links)), "node must not be linked to itself");
        debug_assert_ne!(next, Some(NonNull::from(links)), "node must not be linked to itself");

        // Safety: the neighbors of a linked node are linked into the same
        // list, and linked links are always valid.
        match prev {
            Some(prev) => unsafe { prev.as_ref() }.next.set(next),
            None => self.first.set(next),
        }
        match next {
            Some(next) => unsafe { next.as_ref() }.prev.set(prev),
            None => self.last.set(prev),
        }

        links.clear();
        Ok(())
    }
}

// ==== impl Links ====

impl<T> Links<T> {
    /// Returns new, unlinked links for a [`List`] node.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: Cell::new(None),
            prev: Cell::new(None),
            node: Cell::new(None),
            owner: Cell::new(None),
            _unpin: PhantomPinned,
        }
    }

    /// Returns `true` if this node is currently linked into a [`List`].
    pub fn is_linked(&self) -> bool {
        self.owner.get().is_some()
    }

    fn clear(&self) {
        self.next.set(None);
        self.prev.set(None);
        self.node.set(None);
        self.owner.set(None);
    }
}

impl<T> Default for Links<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Links<T> {
    fn drop(&mut self) {
        // A node can only be dropped while linked if its list was leaked
        // (its head is then never freed). Unlink it so that its neighbors do
        // not dangle.
        if let Some(owner) = self.owner.get() {
            let unlinked = unsafe { owner.as_ref() }.unlink(self);
            debug_assert_eq!(unlinked, Ok(()));
        }
    }
}

impl<T> fmt::Debug for Links<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Links")
            .field("self", &format_args!("{:p}", self))
            .field("next", &FmtOption::new(&self.next.get()))
            .field("prev", &FmtOption::new(&self.prev.get()))
            .field("owner", &FmtOption::new(&self.owner.get()).or_else("detached"))
            .finish()
    }
}

// ==== impl Node ====

impl<T: Linked<Links<T>>> Node for T {}

// ==== impl Each ====

impl<'a, T: Linked<Links<T>>> Each<'_, 'a, T> {
    /// Returns the links of the node to visit next.
    fn resume(&self) -> Link<T> {
        let next = self.next?;
        // Safety: `next` was captured from a node of this list. Even if it
        // was deleted since, it is still borrowed by the list for `'a`.
        if self.list.head.owns(unsafe { next.as_ref() }) {
            return Some(next);
        }

        // The captured node was deleted while the consumer was looking at
        // `curr`; if `curr` is still linked, continue from its live link.
        let curr = unsafe { self.curr?.as_ref() };
        if self.list.head.owns(curr) {
            curr.next.get()
        } else {
            None
        }
    }
}

impl<'a, T: Linked<Links<T>>> Iterator for Each<'_, 'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let ptr = self.resume()?;
        let links = unsafe { ptr.as_ref() };
        // Capture the next link *before* handing out the node: the consumer
        // may unlink it before asking for the next one.
        self.next = links.next.get();
        self.curr = Some(ptr);
        unsafe { node(ptr) }
    }
}

impl<T> fmt::Debug for Each<'_, '_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Each")
            .field("list", &self.list)
            .field("curr", &FmtOption::new(&self.curr))
            .field("next", &FmtOption::new(&self.next))
            .finish()
    }
}
