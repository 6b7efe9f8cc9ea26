use core::{marker::PhantomData, pin::Pin, ptr::NonNull};

use crate::{
    Event,
    function::{Alignment, Function, Signature},
    kinds::PortKind,
    list::ListNode,
};

/// Ordering key of a node within a topic.
///
/// Every connect re-sorts the topic by key, so events (relays) always come
/// before behaviors (terminals), whatever order they were linked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Key {
    Event = 0,
    Behavior = 1,
}

/// Whether data travels with the control flow (push) or against it (pull).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
    Push,
    Pull,
}

/// Signatures a port can carry.
///
/// - `fn(&T)`: push ports. Every recipient observes the same `&T`.
/// - `fn(&mut T)`: pull ports. Recipients write into the same slot in topic
///   order; the last writer wins.
pub trait PortSignature: Signature + Sized {
    /// The value carried by the port.
    type Payload;

    const FLOW: Flow;

    #[doc(hidden)]
    unsafe fn dispatch<const FOOTPRINT: usize, A: Alignment>(
        target: &Function<'_, Self, FOOTPRINT, A>,
        arg: NonNull<()>,
    );
}

impl<T> PortSignature for fn(&T) {
    type Payload = T;

    const FLOW: Flow = Flow::Push;

    unsafe fn dispatch<const FOOTPRINT: usize, A: Alignment>(
        target: &Function<'_, Self, FOOTPRINT, A>,
        arg: NonNull<()>,
    ) {
        target.call(unsafe { arg.cast::<T>().as_ref() })
    }
}

impl<T> PortSignature for fn(&mut T) {
    type Payload = T;

    const FLOW: Flow = Flow::Pull;

    unsafe fn dispatch<const FOOTPRINT: usize, A: Alignment>(
        target: &Function<'_, Self, FOOTPRINT, A>,
        arg: NonNull<()>,
    ) {
        target.call(unsafe { arg.cast::<T>().as_mut() })
    }
}

/// Called with the node being triggered and the erased payload pointer.
#[doc(hidden)]
pub type Trigger = unsafe fn(NonNull<ListNode<Slot>>, NonNull<()>);

/// What a list node carries: its ordering key and, for terminals, how to run it.
#[doc(hidden)]
#[derive(Debug, Clone, Copy)]
pub struct Slot {
    key: Key,
    trigger: Option<Trigger>,
}

/// A port's membership in a topic.
///
/// Every node of a topic shares the same signature `S` and the same lifetime
/// `'a`. The lifetime is invariant, so connecting two nodes forces their
/// borrows to agree, and anything a behavior captures outlives every firing
/// that can reach it.
#[repr(transparent)]
pub struct Node<'a, S> {
    link: ListNode<Slot>,
    _topic: PhantomData<(fn(&'a ()) -> &'a (), fn(S) -> S)>,
}

impl<'a, S: PortSignature> Node<'a, S> {
    pub(crate) const fn new(key: Key, trigger: Option<Trigger>) -> Self {
        Self {
            link: ListNode::new(Slot { key, trigger }),
            _topic: PhantomData,
        }
    }

    #[inline]
    pub fn key(&self) -> Key {
        self.link.get().key
    }

    #[inline]
    pub fn is_linked(&self) -> bool {
        self.link.is_linked()
    }

    /// Number of ports in this node's topic, itself included.
    pub fn topic_len(&self) -> usize {
        self.link.len()
    }

    pub fn detach(&self) {
        if self.link.is_linked() {
            self.link.remove();
            tracing::trace!(key = ?self.key(), "port detached");
        }
    }

    /// Merges both topics and restores the events-before-behaviors order.
    pub(crate) fn join(self: Pin<&Self>, that: Pin<&Self>) {
        let link = self.link();
        link.merge(that.link());
        link.clusterize::<2>(|slot| slot.key as usize);
        tracing::trace!(topic = link.len(), "ports connected");
    }

    /// Triggers every node after this one, in topic order.
    ///
    /// # Safety
    ///
    /// `arg` must point to a live `S::Payload`, valid for writes when `S` is a
    /// pull signature.
    pub(crate) unsafe fn broadcast(&self, arg: NonNull<()>) {
        self.link.visit_after(|node| {
            if let Some(trigger) = node.get().trigger {
                unsafe { trigger(NonNull::from(node), arg) }
            }
        });
    }

    pub(crate) fn take_place_of(self: Pin<&Self>, old: &Self) {
        self.link().take_place_of(&old.link);
    }

    fn link(self: Pin<&Self>) -> Pin<&ListNode<Slot>> {
        unsafe { self.map_unchecked(|node| &node.link) }
    }
}

/// Anything that can be linked into a topic.
///
/// # Safety
///
/// [`node`](Port::node) must return a node stored inline in `self`, so that
/// pinning `self` pins the node. Triggers resolve their port from the node's
/// address.
pub unsafe trait Port<'a> {
    type Signature: PortSignature;

    #[doc(hidden)]
    fn node(&self) -> &Node<'a, Self::Signature>;

    fn key(&self) -> Key {
        self.node().key()
    }

    fn kind(&self) -> PortKind {
        PortKind::new(<Self::Signature as PortSignature>::FLOW, self.key())
    }

    /// Whether the port shares a topic with at least one other port.
    fn is_linked(&self) -> bool {
        self.node().is_linked()
    }

    /// Leaves the topic; the remaining ports stay connected. Safe to call
    /// on an unlinked port.
    fn detach(&self) {
        self.node().detach()
    }
}

pub(crate) fn pinned_node<'a, 'p, P>(port: Pin<&'p P>) -> Pin<&'p Node<'a, P::Signature>>
where
    P: Port<'a> + ?Sized,
{
    unsafe { port.map_unchecked(|port| port.node()) }
}

/// Connects `port` to `event` in control-flow direction: firing `event`
/// triggers `port`.
pub fn connect<'a, S, P>(event: Pin<&Event<'a, S>>, port: Pin<&P>)
where
    S: PortSignature,
    P: Port<'a, Signature = S> + ?Sized,
{
    pinned_node(event).join(pinned_node(port));
}

/// Pairs of ports that can be connected without stating which side is the event.
///
/// Implemented for event-event, event-behavior and behavior-event pairs.
/// Two behaviors cannot be connected: neither would ever trigger the other.
pub trait EitherDirection<'a, That: ?Sized> {
    #[doc(hidden)]
    fn connect_pair(this: Pin<&Self>, that: Pin<&That>);
}

impl<'a, S, P> EitherDirection<'a, P> for Event<'a, S>
where
    S: PortSignature,
    P: Port<'a, Signature = S> + ?Sized,
{
    fn connect_pair(this: Pin<&Self>, that: Pin<&P>) {
        connect(this, that);
    }
}

/// Connects two ports regardless of which one is the event.
///
/// ```rust,compile_fail
/// use core::pin::pin;
/// use ramen::{Pushable, connect_either_direction};
///
/// let a = pin!(Pushable::<u8>::new(|_| {}));
/// let b = pin!(Pushable::<u8>::new(|_| {}));
/// connect_either_direction(a.into_ref(), b.into_ref());
/// ```
pub fn connect_either_direction<'a, L, R>(left: Pin<&L>, right: Pin<&R>)
where
    L: EitherDirection<'a, R> + ?Sized,
    R: ?Sized,
{
    L::connect_pair(left, right);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Behavior, Pullable, Puller, Pushable, Pusher};
    use core::{cell::RefCell, pin::pin};

    #[test]
    fn test_event_relays_before_behavior() {
        let log = RefCell::new(Vec::new());
        let a = pin!(Pusher::<u8>::new());
        let a = a.into_ref();
        let b = pin!(Pusher::<u8>::new());
        let b = b.into_ref();
        let c = pin!(Pushable::<u8>::new(|v| log.borrow_mut().push(('c', *v))));
        let c = c.into_ref();
        let d = pin!(Pushable::<u8>::new(|v| log.borrow_mut().push(('d', *v))));
        let d = d.into_ref();

        connect(a, c);
        connect(a, b);
        connect(b, d);
        assert_eq!(a.node().topic_len(), 4);

        let mut keys = Vec::new();
        a.node().link.for_each(|slot| keys.push(slot.key));
        assert_eq!(keys, [Key::Event, Key::Event, Key::Behavior, Key::Behavior]);

        a.push(&7);
        assert_eq!(*log.borrow(), vec![('c', 7), ('d', 7)]);
        b.push(&8);
        assert_eq!(log.borrow()[2..], [('c', 8), ('d', 8)]);
    }

    #[test]
    fn test_keys_and_kinds() {
        let event = Pusher::<u8>::new();
        let behavior = Pullable::<u8>::new(|out| *out = 1);
        assert_eq!(event.key(), Key::Event);
        assert_eq!(behavior.key(), Key::Behavior);
        assert_eq!(event.kind(), PortKind::Pusher);
        assert_eq!(behavior.kind(), PortKind::Pullable);
        assert_eq!(Puller::<u8>::new().kind(), PortKind::Puller);
    }

    #[test]
    fn test_either_direction() {
        let hits = RefCell::new(0);
        let event = pin!(Pusher::<()>::new());
        let event = event.into_ref();
        let behavior = pin!(Behavior::<fn(&())>::new(|_| *hits.borrow_mut() += 1));
        let behavior = behavior.into_ref();

        connect_either_direction(behavior, event);
        assert!(event.is_linked());
        event.fire();
        connect_either_direction(event, behavior);
        event.fire();
        assert_eq!(*hits.borrow(), 2);
    }

    #[test]
    fn test_detach_is_idempotent() {
        let event = pin!(Pusher::<u8>::new());
        let event = event.into_ref();
        let behavior = pin!(Pushable::<u8>::new(|_| {}));
        let behavior = behavior.into_ref();
        connect(event, behavior);
        behavior.detach();
        behavior.detach();
        assert!(!event.is_linked());
        assert!(!behavior.is_linked());
    }
}
