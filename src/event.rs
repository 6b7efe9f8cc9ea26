use core::{fmt, pin::Pin, ptr::NonNull};

use crate::port::{Key, Node, Port, PortSignature, connect, pinned_node};

/// A relay port: firing it triggers every port after it in its topic.
///
/// Events are what an actor calls out through. An event contributes nothing
/// of its own when another event fires: it is only a point where the topic
/// can be entered. Because every connect keeps events ahead of behaviors,
/// firing any event of a topic reaches all the behaviors of that topic.
///
/// Firing is synchronous: every behavior has run when [`push`](Self::push)
/// or [`pull`](Self::pull) returns.
///
/// ```rust
/// use core::{cell::Cell, pin::pin};
/// use ramen::{Pushable, Pusher};
///
/// let total = Cell::new(0);
/// let sum = pin!(Pushable::<u32>::new(|v| total.set(total.get() + v)));
/// let out = pin!(Pusher::<u32>::new());
/// let out = out.into_ref();
///
/// out.connect(sum.into_ref());
/// out.push(&2);
/// out.push(&40);
/// assert_eq!(total.get(), 42);
/// ```
#[repr(transparent)]
pub struct Event<'a, S: PortSignature> {
    node: Node<'a, S>,
}

impl<'a, S: PortSignature> Event<'a, S> {
    pub const fn new() -> Self {
        Self {
            node: Node::new(Key::Event, None),
        }
    }

    /// Connects `port` after this event and returns the event, so several
    /// ports can be connected in a row.
    pub fn connect<P>(self: Pin<&Self>, port: Pin<&P>) -> Pin<&Self>
    where
        P: Port<'a, Signature = S> + ?Sized,
    {
        connect(self, port);
        self
    }

    /// Moves `old`'s topic membership to `self`. `old` ends up unlinked.
    pub fn take_place_of(self: Pin<&Self>, old: &Self) {
        pinned_node(self).take_place_of(&old.node);
    }

    fn broadcast(&self, arg: NonNull<S::Payload>) {
        unsafe { self.node.broadcast(arg.cast()) }
    }
}

impl<T> Event<'_, fn(&T)> {
    /// Hands `value` to every port of the topic, in topic order.
    #[inline]
    pub fn push(&self, value: &T) {
        self.broadcast(NonNull::from(value))
    }
}

impl Event<'_, fn(&())> {
    #[inline]
    pub fn fire(&self) {
        self.push(&())
    }
}

impl<T> Event<'_, fn(&mut T)> {
    /// Asks every port of the topic to write into `slot`, in topic order.
    ///
    /// With several writers the last one wins. An unlinked puller leaves
    /// `slot` untouched.
    #[inline]
    pub fn pull(&self, slot: &mut T) {
        self.broadcast(NonNull::from(slot))
    }

    /// Pulls into a default value and returns it.
    ///
    /// ```rust
    /// use core::pin::pin;
    /// use ramen::{Pullable, Puller};
    ///
    /// let answer = pin!(Pullable::<i32>::new(|out| *out = 42));
    /// let ask = pin!(Puller::<i32>::new());
    /// let ask = ask.into_ref();
    /// assert_eq!(ask.get(), 0);
    ///
    /// ask.connect(answer.into_ref());
    /// assert_eq!(ask.get(), 42);
    /// ```
    pub fn get(&self) -> T
    where
        T: Default,
    {
        let mut value = T::default();
        self.pull(&mut value);
        value
    }
}

impl<S: PortSignature> Default for Event<'_, S> {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl<'a, S: PortSignature> Port<'a> for Event<'a, S> {
    type Signature = S;

    fn node(&self) -> &Node<'a, S> {
        &self.node
    }
}

impl<S: PortSignature> fmt::Debug for Event<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("flow", &S::FLOW)
            .field("topic", &self.node.topic_len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::{Pullable, Puller, Pushable, Pusher};
    use core::{cell::Cell, pin::pin};

    #[test]
    fn test_unlinked_event_is_noop() {
        let event = Pusher::<u8>::new();
        event.push(&1);
        let puller = Puller::<u8>::new();
        let mut slot = 9;
        puller.pull(&mut slot);
        assert_eq!(slot, 9);
        assert_eq!(puller.get(), 0);
    }

    #[test]
    fn test_last_writer_wins() {
        let puller = pin!(Puller::<u8>::new());
        let puller = puller.into_ref();
        let first = pin!(Pullable::<u8>::new(|out| *out = 1));
        let second = pin!(Pullable::<u8>::new(|out| *out += 10));
        puller.connect(first.into_ref()).connect(second.into_ref());
        assert_eq!(puller.get(), 11);
    }

    #[test]
    fn test_take_place_of_moves_membership() {
        let seen = Cell::new(0);
        let sink = pin!(Pushable::<u8>::new(|v| seen.set(*v)));
        let sink = sink.into_ref();
        let old = pin!(Pusher::<u8>::new());
        let old = old.into_ref();
        let new = pin!(Pusher::<u8>::new());
        let new = new.into_ref();
        old.connect(sink);

        new.take_place_of(&old);
        old.push(&1);
        assert_eq!(seen.get(), 0);
        new.push(&2);
        assert_eq!(seen.get(), 2);
    }

    #[test]
    fn test_feedback_topology_terminates() {
        let depth = Cell::new(0u32);
        let event = pin!(Pusher::<u32>::new());
        let event = event.into_ref();
        let echo = pin!(Pushable::<u32>::new(|v| {
            depth.set(depth.get().max(*v));
            if *v < 10 {
                event.push(&(v + 1));
            }
        }));
        event.connect(echo.into_ref());
        event.push(&0);
        assert_eq!(depth.get(), 10);
    }

    #[test]
    #[should_panic(expected = "re-entered")]
    fn test_runaway_feedback_panics() {
        let event = pin!(Pusher::<()>::new());
        let event = event.into_ref();
        let echo = pin!(Pushable::<()>::new(|_| event.fire()));
        event.connect(echo.into_ref());
        event.fire();
    }
}
