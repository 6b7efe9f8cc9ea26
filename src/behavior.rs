use core::{fmt, pin::Pin, ptr::NonNull};

use crate::{
    Event,
    config::DEFAULT_FOOTPRINT,
    function::{Alignment, DefaultAlign, Function},
    list::ListNode,
    port::{EitherDirection, Key, Node, Port, PortSignature, Slot, connect, pinned_node},
};

/// A terminal port: triggering it runs its stored function.
///
/// Behaviors are what an actor exposes for others to call. The target lives
/// inline in a [`Function`] of `FOOTPRINT` bytes; it may borrow anything that
/// lives for `'a`.
///
/// Calling a behavior directly with [`call`](Self::call) only runs its own
/// target. It does not broadcast to the rest of its topic; that is what
/// events are for.
#[repr(C)]
pub struct Behavior<'a, S: PortSignature, const FOOTPRINT: usize = DEFAULT_FOOTPRINT, A: Alignment = DefaultAlign>
{
    node: Node<'a, S>,
    target: Function<'a, S, FOOTPRINT, A>,
}

unsafe fn trigger<S: PortSignature, const FOOTPRINT: usize, A: Alignment>(
    node: NonNull<ListNode<Slot>>,
    arg: NonNull<()>,
) {
    let behavior: &Behavior<'_, S, FOOTPRINT, A> = unsafe { node.cast().as_ref() };
    unsafe { S::dispatch(&behavior.target, arg) }
}

impl<'a, S: PortSignature, const FOOTPRINT: usize, A: Alignment> Behavior<'a, S, FOOTPRINT, A> {
    /// Wraps an already built function.
    pub fn from_function(target: Function<'a, S, FOOTPRINT, A>) -> Self {
        Self {
            node: Node::new(Key::Behavior, Some(trigger::<S, FOOTPRINT, A>)),
            target,
        }
    }

    pub fn function(&self) -> &Function<'a, S, FOOTPRINT, A> {
        &self.target
    }

    /// Moves `old`'s topic membership to `self`. `old` ends up unlinked.
    pub fn take_place_of(self: Pin<&Self>, old: &Self) {
        pinned_node(self).take_place_of(&old.node);
    }
}

impl<'a, T, const FOOTPRINT: usize, A: Alignment> Behavior<'a, fn(&T), FOOTPRINT, A> {
    pub fn new<F>(target: F) -> Self
    where
        F: Fn(&T) + 'a,
    {
        Self::from_function(Function::<fn(&T), FOOTPRINT, A>::new(target))
    }

    #[track_caller]
    pub fn call(&self, value: &T) {
        self.target.call(value)
    }
}

impl<'a, T, const FOOTPRINT: usize, A: Alignment> Behavior<'a, fn(&mut T), FOOTPRINT, A> {
    pub fn new<F>(target: F) -> Self
    where
        F: Fn(&mut T) + 'a,
    {
        Self::from_function(Function::<fn(&mut T), FOOTPRINT, A>::new(target))
    }

    #[track_caller]
    pub fn call(&self, slot: &mut T) {
        self.target.call(slot)
    }
}

unsafe impl<'a, S: PortSignature, const FOOTPRINT: usize, A: Alignment> Port<'a>
    for Behavior<'a, S, FOOTPRINT, A>
{
    type Signature = S;

    fn node(&self) -> &Node<'a, S> {
        &self.node
    }
}

impl<'a, S: PortSignature, const FOOTPRINT: usize, A: Alignment> EitherDirection<'a, Event<'a, S>>
    for Behavior<'a, S, FOOTPRINT, A>
{
    fn connect_pair(this: Pin<&Self>, that: Pin<&Event<'a, S>>) {
        connect(that, this);
    }
}

impl<S: PortSignature, const FOOTPRINT: usize, A: Alignment> fmt::Debug for Behavior<'_, S, FOOTPRINT, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior")
            .field("flow", &S::FLOW)
            .field("linked", &self.node.is_linked())
            .field("target", &self.target)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Pullable, Pushable, Pusher};
    use core::{cell::Cell, pin::pin};

    #[test]
    fn test_direct_call_does_not_broadcast() {
        let first = Cell::new(0);
        let second = Cell::new(0);
        let event = pin!(Pusher::<u32>::new());
        let event = event.into_ref();
        let a = pin!(Pushable::<u32>::new(|v| first.set(first.get() + v)));
        let a = a.into_ref();
        let b = pin!(Pushable::<u32>::new(|v| second.set(second.get() + v)));
        let b = b.into_ref();
        event.connect(a).connect(b);

        a.call(&5);
        assert_eq!((first.get(), second.get()), (5, 0));
        event.push(&1);
        assert_eq!((first.get(), second.get()), (6, 1));
    }

    #[test]
    fn test_pullable_writes_slot() {
        let pullable = Pullable::<(u8, bool)>::new(|out| *out = (3, true));
        let mut slot = (0, false);
        pullable.call(&mut slot);
        assert_eq!(slot, (3, true));
    }

    #[test]
    fn test_take_place_of_keeps_topic() {
        let hits = Cell::new(0u8);
        let event = pin!(Pusher::<()>::new());
        let event = event.into_ref();
        let old = pin!(Pushable::<()>::new(|_| hits.set(hits.get() + 1)));
        let old = old.into_ref();
        let new = pin!(Pushable::<()>::new(|_| hits.set(hits.get() + 10)));
        let new = new.into_ref();
        event.connect(old);

        new.take_place_of(&old);
        assert!(!old.is_linked());
        event.fire();
        assert_eq!(hits.get(), 10);
    }

    #[test]
    fn test_debug_mentions_flow() {
        let pullable = Pullable::<u8>::new(|_| {});
        let text = format!("{pullable:?}");
        assert!(text.contains("Pull"));
        assert!(text.contains("linked: false"));
    }
}
