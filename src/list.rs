use core::{
    cell::Cell,
    fmt,
    marker::PhantomPinned,
    pin::Pin,
    ptr::{self, NonNull},
};

use crate::{Error, Result, config::MAX_REENTRANCY, internal};

type Link<T> = Option<NonNull<ListNode<T>>>;

/// A member of an intrusive doubly-linked list.
///
/// Nodes do not own their neighbors; a list is just the set of nodes reachable
/// through `prev`/`next`. All mutation goes through `&self`, since a node may be
/// relinked by its neighbors at any time.
///
/// - A node can only be linked once it is pinned ([`merge`](Self::merge),
///   [`take_place_of`](Self::take_place_of)), so a linked node never moves.
/// - Dropping a node detaches it first; neighbors never see a dangling link.
/// - A node whose neighbor is being visited can be relinked or dropped freely.
///   A node that is itself being visited (see [`visit_after`](Self::visit_after))
///   cannot be dropped: that aborts the process.
pub struct ListNode<T> {
    prev: Cell<Link<T>>,
    next: Cell<Link<T>>,
    visits: Cell<u16>,
    value: T,
    _pinned: PhantomPinned,
}

struct Visit<'n, T>(&'n ListNode<T>);

impl<T> Drop for Visit<'_, T> {
    fn drop(&mut self) {
        self.0.visits.set(self.0.visits.get() - 1);
    }
}

impl<T> ListNode<T> {
    pub const fn new(value: T) -> Self {
        Self {
            prev: Cell::new(None),
            next: Cell::new(None),
            visits: Cell::new(0),
            value,
            _pinned: PhantomPinned,
        }
    }

    #[inline]
    pub fn get(&self) -> &T {
        &self.value
    }

    #[inline]
    pub fn is_linked(&self) -> bool {
        self.prev.get().is_some() || self.next.get().is_some()
    }

    /// Whether a visit of this node is in progress.
    #[inline]
    pub fn is_visited(&self) -> bool {
        self.visits.get() != 0
    }

    #[inline]
    pub fn prev(&self) -> Option<NonNull<Self>> {
        self.prev.get()
    }

    #[inline]
    pub fn next(&self) -> Option<NonNull<Self>> {
        self.next.get()
    }

    /// First node of the list containing `self`.
    pub fn head(&self) -> NonNull<Self> {
        let mut node = NonNull::from(self);
        while let Some(prev) = unsafe { node.as_ref() }.prev.get() {
            node = prev;
        }
        node
    }

    /// Last node of the list containing `self`.
    pub fn tail(&self) -> NonNull<Self> {
        let mut node = NonNull::from(self);
        while let Some(next) = unsafe { node.as_ref() }.next.get() {
            node = next;
        }
        node
    }

    /// Number of nodes in the list containing `self`, `self` included.
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut cursor = Some(self.head());
        while let Some(node) = cursor {
            count += 1;
            cursor = unsafe { node.as_ref() }.next.get();
        }
        count
    }

    /// Splices the list containing `that` after the tail of the list
    /// containing `self`. No-op when both are already in the same list.
    pub fn merge(self: Pin<&Self>, that: Pin<&Self>) {
        let (this, that) = (self.get_ref(), that.get_ref());
        if ptr::eq(this, that) {
            return;
        }
        let that_head = that.head();
        if this.head() == that_head {
            return;
        }
        let tail = this.tail();
        unsafe {
            tail.as_ref().next.set(Some(that_head));
            that_head.as_ref().prev.set(Some(tail));
        }
    }

    /// Detaches `self`, joining its neighbors. Idempotent.
    pub fn remove(&self) {
        let (prev, next) = (self.prev.take(), self.next.take());
        if let Some(prev) = prev {
            unsafe { prev.as_ref() }.next.set(next);
        }
        if let Some(next) = next {
            unsafe { next.as_ref() }.prev.set(prev);
        }
    }

    /// Moves `old`'s membership to `self`.
    ///
    /// `self` leaves its own list, takes `old`'s exact position and `old` ends
    /// up unlinked. This is how a pinned node is "moved": the value stays put,
    /// the links are transplanted.
    pub fn take_place_of(self: Pin<&Self>, old: &Self) {
        let this = self.get_ref();
        if ptr::eq(this, old) {
            return;
        }
        this.remove();
        let (prev, next) = (old.prev.take(), old.next.take());
        let at = NonNull::from(this);
        this.prev.set(prev);
        this.next.set(next);
        if let Some(prev) = prev {
            unsafe { prev.as_ref() }.next.set(Some(at));
        }
        if let Some(next) = next {
            unsafe { next.as_ref() }.prev.set(Some(at));
        }
    }

    /// Stable partition of the whole list containing `self` into `N` buckets.
    ///
    /// Nodes are grouped by `key`, buckets are concatenated in index order and
    /// nodes with equal keys keep their relative order. Panics if `key` returns
    /// an index `>= N`.
    #[track_caller]
    pub fn clusterize<const N: usize>(&self, key: impl Fn(&T) -> usize) {
        if let Err(e) = self.try_clusterize::<N>(key) {
            internal::fail(e)
        }
    }

    /// Like [`clusterize`](Self::clusterize), but an out-of-range key leaves the
    /// list untouched and is returned as [`Error::ClusterOutOfRange`].
    pub fn try_clusterize<const N: usize>(&self, key: impl Fn(&T) -> usize) -> Result<()> {
        let head = self.head();

        let mut cursor = Some(head);
        while let Some(node) = cursor {
            let node = unsafe { node.as_ref() };
            let index = key(&node.value);
            if index >= N {
                return Err(Error::ClusterOutOfRange { index, clusters: N });
            }
            cursor = node.next.get();
        }

        let mut clusters: [(Link<T>, Link<T>); N] = [(None, None); N];
        let mut cursor = Some(head);
        while let Some(at) = cursor {
            let node = unsafe { at.as_ref() };
            cursor = node.next.get();
            node.remove();
            let (first, last) = &mut clusters[key(&node.value)];
            match last {
                Some(tail) => {
                    unsafe { tail.as_ref() }.next.set(Some(at));
                    node.prev.set(Some(*tail));
                }
                None => *first = Some(at),
            }
            *last = Some(at);
        }

        let mut tail: Link<T> = None;
        for (first, last) in clusters {
            let (Some(first), Some(last)) = (first, last) else {
                continue;
            };
            if let Some(tail) = tail {
                unsafe {
                    tail.as_ref().next.set(Some(first));
                    first.as_ref().prev.set(Some(tail));
                }
            }
            tail = Some(last);
        }
        Ok(())
    }

    /// Calls `f` on every node after `self`, in list order.
    ///
    /// The next node is read after `f` returns, so `f` may relink or drop any
    /// node other than the one it was handed. Nested visits of the same node
    /// are capped at [`MAX_REENTRANCY`]; going past it panics.
    #[track_caller]
    pub fn visit_after(&self, f: impl FnMut(&Self)) {
        if let Err(e) = self.try_visit_after(f) {
            internal::fail(e)
        }
    }

    /// Like [`visit_after`](Self::visit_after), but stops with
    /// [`Error::ReentrancyLimit`] instead of panicking.
    pub fn try_visit_after(&self, mut f: impl FnMut(&Self)) -> Result<()> {
        let mut cursor = self.next.get();
        while let Some(node) = cursor {
            let node = unsafe { node.as_ref() };
            let visit = node.enter()?;
            f(node);
            cursor = node.next.get();
            drop(visit);
        }
        Ok(())
    }

    /// Calls `f` on every value in the list containing `self`, head first.
    pub fn for_each(&self, mut f: impl FnMut(&T)) {
        let head = unsafe { self.head().as_ref() };
        f(&head.value);
        head.visit_after(|node| f(&node.value));
    }

    fn enter(&self) -> Result<Visit<'_, T>> {
        let visits = self.visits.get();
        if visits >= MAX_REENTRANCY {
            return Err(Error::ReentrancyLimit {
                limit: MAX_REENTRANCY,
            });
        }
        self.visits.set(visits + 1);
        Ok(Visit(self))
    }
}

impl<T> Drop for ListNode<T> {
    fn drop(&mut self) {
        if self.is_visited() {
            internal::abort(Error::NodeBusy);
        }
        self.remove();
    }
}

impl<T: fmt::Debug> fmt::Debug for ListNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListNode")
            .field("value", &self.value)
            .field("linked", &self.is_linked())
            .finish()
    }
}
