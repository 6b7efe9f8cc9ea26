use core::{fmt, marker::PhantomData, pin::Pin, ptr::NonNull};

use crate::{
    Event,
    list::ListNode,
    port::{EitherDirection, Key, Node, Port, PortSignature, Slot, Trigger, connect, pinned_node},
};

/// A value that embeds [`Member`] port number `P` at a fixed offset.
///
/// # Safety
///
/// `OFFSET` must be the offset of a field of type `Member<'_, _, Self, P>`
/// inside `Self`, as given by [`core::mem::offset_of!`], and that field must be
/// the only one of its type.
pub unsafe trait Embeds<const P: u8>: Sized {
    const OFFSET: usize;
}

/// Handles pushes arriving at member port `P`.
pub trait OnPush<T, const P: u8>: Embeds<P> {
    fn on_push(&self, value: &T);
}

/// Handles pulls arriving at member port `P`.
pub trait OnPull<T, const P: u8>: Embeds<P> {
    fn on_pull(&self, slot: &mut T);
}

/// A behavior whose target is a method of the value that contains it.
///
/// A closure stored in a field cannot borrow the struct holding it. A member
/// needs no borrow: when triggered it steps back `O::OFFSET` bytes from its own
/// address to reach its owner and calls [`OnPush::on_push`] or
/// [`OnPull::on_pull`] there. `P` tells apart several members of one owner.
///
/// ```rust
/// use core::{cell::Cell, mem::offset_of, pin::pin};
/// use ramen::{Embeds, Member, OnPush, Pusher};
///
/// struct Counter<'a> {
///     count: Cell<u32>,
///     bump: Member<'a, fn(&u32), Self, 0>,
/// }
///
/// unsafe impl Embeds<0> for Counter<'_> {
///     const OFFSET: usize = offset_of!(Self, bump);
/// }
///
/// impl OnPush<u32, 0> for Counter<'_> {
///     fn on_push(&self, value: &u32) {
///         self.count.set(self.count.get() + value);
///     }
/// }
///
/// let counter = pin!(Counter { count: Cell::new(0), bump: unsafe { Member::new() } });
/// let counter = counter.into_ref();
/// let bump = unsafe { counter.map_unchecked(|c| &c.bump) };
///
/// let source = pin!(Pusher::<u32>::new());
/// let source = source.into_ref();
/// source.connect(bump);
/// source.push(&5);
/// assert_eq!(counter.count.get(), 5);
/// ```
#[repr(C)]
pub struct Member<'a, S: PortSignature, O, const P: u8> {
    node: Node<'a, S>,
    _owner: PhantomData<fn() -> *const O>,
}

unsafe fn owner<'o, O: Embeds<P>, const P: u8>(node: NonNull<ListNode<Slot>>) -> &'o O {
    unsafe { node.byte_sub(O::OFFSET).cast::<O>().as_ref() }
}

/// Trigger installed by [`Member::new`]; implemented for every
/// [`OnPush`] and [`OnPull`] owner.
#[doc(hidden)]
pub trait Handles<S: PortSignature, const P: u8>: Embeds<P> {
    const TRIGGER: Trigger;
}

impl<T, O: OnPush<T, P>, const P: u8> Handles<fn(&T), P> for O {
    const TRIGGER: Trigger = {
        unsafe fn trigger<U, Owner: OnPush<U, Q>, const Q: u8>(
            node: NonNull<ListNode<Slot>>,
            arg: NonNull<()>,
        ) {
            unsafe { owner::<Owner, Q>(node).on_push(arg.cast::<U>().as_ref()) }
        }
        trigger::<T, O, P>
    };
}

impl<T, O: OnPull<T, P>, const P: u8> Handles<fn(&mut T), P> for O {
    const TRIGGER: Trigger = {
        unsafe fn trigger<U, Owner: OnPull<U, Q>, const Q: u8>(
            node: NonNull<ListNode<Slot>>,
            arg: NonNull<()>,
        ) {
            unsafe { owner::<Owner, Q>(node).on_pull(arg.cast::<U>().as_mut()) }
        }
        trigger::<T, O, P>
    };
}

impl<S: PortSignature, O: Handles<S, P>, const P: u8> Member<'_, S, O, P> {
    /// # Safety
    ///
    /// The member must be stored in the field of `O` that `O::OFFSET` names,
    /// and stay there.
    pub const unsafe fn new() -> Self {
        Self {
            node: Node::new(Key::Behavior, Some(O::TRIGGER)),
            _owner: PhantomData,
        }
    }

    fn owner(self: Pin<&Self>) -> &O {
        unsafe { owner::<O, P>(NonNull::from(&self.get_ref().node).cast()) }
    }
}

impl<T, O: OnPush<T, P>, const P: u8> Member<'_, fn(&T), O, P> {
    /// Runs the owner's handler, as a trigger would.
    pub fn call(self: Pin<&Self>, value: &T) {
        self.owner().on_push(value)
    }
}

impl<T, O: OnPull<T, P>, const P: u8> Member<'_, fn(&mut T), O, P> {
    /// Runs the owner's handler, as a trigger would.
    pub fn call(self: Pin<&Self>, slot: &mut T) {
        self.owner().on_pull(slot)
    }
}

unsafe impl<'a, S: PortSignature, O, const P: u8> Port<'a> for Member<'a, S, O, P> {
    type Signature = S;

    fn node(&self) -> &Node<'a, S> {
        &self.node
    }
}

impl<'a, S: PortSignature, O, const P: u8> EitherDirection<'a, Event<'a, S>> for Member<'a, S, O, P> {
    fn connect_pair(this: Pin<&Self>, that: Pin<&Event<'a, S>>) {
        connect(that, this);
    }
}

impl<S: PortSignature, O, const P: u8> Member<'_, S, O, P> {
    /// Moves `old`'s topic membership to `self`. `old` ends up unlinked.
    pub fn take_place_of(self: Pin<&Self>, old: &Self) {
        pinned_node(self).take_place_of(&old.node);
    }
}

impl<S: PortSignature, O, const P: u8> fmt::Debug for Member<'_, S, O, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("port", &P)
            .field("flow", &S::FLOW)
            .field("linked", &self.node.is_linked())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Puller, Pusher};
    use core::{cell::Cell, mem::offset_of, pin::pin};

    struct Gauge<'a> {
        level: Cell<i32>,
        set: Member<'a, fn(&i32), Self, 0>,
        read: Member<'a, fn(&mut i32), Self, 1>,
    }

    impl Gauge<'_> {
        fn new(level: i32) -> Self {
            Self {
                level: Cell::new(level),
                set: unsafe { Member::new() },
                read: unsafe { Member::new() },
            }
        }
    }

    unsafe impl Embeds<0> for Gauge<'_> {
        const OFFSET: usize = offset_of!(Self, set);
    }

    unsafe impl Embeds<1> for Gauge<'_> {
        const OFFSET: usize = offset_of!(Self, read);
    }

    impl OnPush<i32, 0> for Gauge<'_> {
        fn on_push(&self, value: &i32) {
            self.level.set(*value);
        }
    }

    impl OnPull<i32, 1> for Gauge<'_> {
        fn on_pull(&self, slot: &mut i32) {
            *slot = self.level.get();
        }
    }

    #[test]
    fn test_members_reach_their_owner() {
        let gauge = pin!(Gauge::new(3));
        let gauge = gauge.into_ref();
        let set = unsafe { gauge.map_unchecked(|g| &g.set) };
        let read = unsafe { gauge.map_unchecked(|g| &g.read) };

        let writer = pin!(Pusher::<i32>::new());
        let writer = writer.into_ref();
        let reader = pin!(Puller::<i32>::new());
        let reader = reader.into_ref();
        writer.connect(set);
        reader.connect(read);

        assert_eq!(reader.get(), 3);
        writer.push(&-8);
        assert_eq!(reader.get(), -8);
        assert_eq!(set.kind(), crate::PortKind::Pushable);
        assert_eq!(read.kind(), crate::PortKind::Pullable);
    }

    #[test]
    fn test_direct_call() {
        let gauge = pin!(Gauge::new(0));
        let gauge = gauge.into_ref();
        unsafe { gauge.map_unchecked(|g| &g.set) }.call(&12);
        let mut slot = 0;
        unsafe { gauge.map_unchecked(|g| &g.read) }.call(&mut slot);
        assert_eq!(slot, 12);
    }
}
