//! Bridges between the push and the pull flow.

use core::{cell::Cell, fmt, mem::offset_of, pin::Pin};

use crate::{
    Member, Port, Puller, Pusher,
    member::{Embeds, OnPull, OnPush},
};

/// Remembers the last pushed value and hands it out on pull.
///
/// The stored `T` is converted from `In` when pushed and into `Out` when
/// pulled. Until the first push, pulls see the initial value.
///
/// ```rust
/// use core::pin::pin;
/// use ramen::{Latch, Puller, Pusher};
///
/// let latch = pin!(Latch::<u32, u8, u64>::new(7));
/// let latch = latch.into_ref();
/// let write = pin!(Pusher::<u8>::new());
/// let write = write.into_ref();
/// let read = pin!(Puller::<u64>::new());
/// let read = read.into_ref();
///
/// write.connect(latch.input());
/// read.connect(latch.output());
/// assert_eq!(read.get(), 7);
/// write.push(&200);
/// assert_eq!(read.get(), 200);
/// ```
pub struct Latch<'a, T, In = T, Out = T> {
    value: Cell<T>,
    input: Member<'a, fn(&In), Self, 0>,
    output: Member<'a, fn(&mut Out), Self, 1>,
}

unsafe impl<T, In, Out> Embeds<0> for Latch<'_, T, In, Out> {
    const OFFSET: usize = offset_of!(Self, input);
}

unsafe impl<T, In, Out> Embeds<1> for Latch<'_, T, In, Out> {
    const OFFSET: usize = offset_of!(Self, output);
}

impl<T, In: Clone + Into<T>, Out> OnPush<In, 0> for Latch<'_, T, In, Out> {
    fn on_push(&self, value: &In) {
        self.value.set(value.clone().into());
    }
}

impl<T: Clone + Default + Into<Out>, In, Out> OnPull<Out, 1> for Latch<'_, T, In, Out> {
    fn on_pull(&self, slot: &mut Out) {
        let value = self.value.take();
        *slot = value.clone().into();
        self.value.set(value);
    }
}

impl<'a, T, In, Out> Latch<'a, T, In, Out>
where
    T: Clone + Default + Into<Out>,
    In: Clone + Into<T>,
{
    pub fn new(initial: T) -> Self {
        Self {
            value: Cell::new(initial),
            input: unsafe { Member::new() },
            output: unsafe { Member::new() },
        }
    }

    pub fn input(self: Pin<&Self>) -> Pin<&Member<'a, fn(&In), Self, 0>> {
        unsafe { self.map_unchecked(|latch| &latch.input) }
    }

    pub fn output(self: Pin<&Self>) -> Pin<&Member<'a, fn(&mut Out), Self, 1>> {
        unsafe { self.map_unchecked(|latch| &latch.output) }
    }

    pub fn get(&self) -> T {
        let value = self.value.take();
        let copy = value.clone();
        self.value.set(value);
        copy
    }

    pub fn set(&self, value: T) {
        self.value.set(value);
    }
}

impl<T, In, Out> fmt::Debug for Latch<'_, T, In, Out> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Latch")
            .field("input", &self.input)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

/// Turns a pull into a push.
///
/// Each time [`trigger`](Self::trigger) is pushed, the lift pulls its input
/// into the stored value (if the input is linked) and then pushes the value,
/// converted to `Out`, through its output (if the output is linked). Either
/// side may be left unconnected.
pub struct Lift<'a, T, Out = T> {
    value: Cell<T>,
    input: Puller<'a, T>,
    output: Pusher<'a, Out>,
    trigger: Member<'a, fn(&()), Self, 0>,
}

unsafe impl<T, Out> Embeds<0> for Lift<'_, T, Out> {
    const OFFSET: usize = offset_of!(Self, trigger);
}

impl<T: Clone + Default + Into<Out>, Out> OnPush<(), 0> for Lift<'_, T, Out> {
    fn on_push(&self, _: &()) {
        let mut value = self.value.take();
        if self.input.is_linked() {
            self.input.pull(&mut value);
        }
        let out = self.output.is_linked().then(|| value.clone().into());
        self.value.set(value);
        if let Some(out) = out {
            self.output.push(&out);
        }
    }
}

impl<'a, T: Clone + Default + Into<Out>, Out> Lift<'a, T, Out> {
    pub fn new() -> Self {
        Self::with_value(T::default())
    }

    pub fn with_value(initial: T) -> Self {
        Self {
            value: Cell::new(initial),
            input: Puller::new(),
            output: Pusher::new(),
            trigger: unsafe { Member::new() },
        }
    }

    pub fn input(self: Pin<&Self>) -> Pin<&Puller<'a, T>> {
        unsafe { self.map_unchecked(|lift| &lift.input) }
    }

    pub fn output(self: Pin<&Self>) -> Pin<&Pusher<'a, Out>> {
        unsafe { self.map_unchecked(|lift| &lift.output) }
    }

    pub fn trigger(self: Pin<&Self>) -> Pin<&Member<'a, fn(&()), Self, 0>> {
        unsafe { self.map_unchecked(|lift| &lift.trigger) }
    }

    /// The value seen by the last trigger.
    pub fn get(&self) -> T {
        let value = self.value.take();
        let copy = value.clone();
        self.value.set(value);
        copy
    }
}

impl<T: Clone + Default + Into<Out>, Out> Default for Lift<'_, T, Out> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, Out> fmt::Debug for Lift<'_, T, Out> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lift")
            .field("input_linked", &self.input.is_linked())
            .field("output_linked", &self.output.is_linked())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Pullable, Pushable};
    use core::pin::pin;

    #[test]
    fn test_latch_keeps_last_value() {
        let latch = pin!(Latch::<i32>::new(0));
        let latch = latch.into_ref();
        let write = pin!(Pusher::<i32>::new());
        let write = write.into_ref();
        let read = pin!(Puller::<i32>::new());
        let read = read.into_ref();
        write.connect(latch.input());
        read.connect(latch.output());

        write.push(&1);
        write.push(&-4);
        assert_eq!(read.get(), -4);
        assert_eq!(read.get(), -4);
        assert_eq!(latch.get(), -4);

        latch.set(9);
        assert_eq!(read.get(), 9);
    }

    #[test]
    fn test_lift_pulls_then_pushes() {
        let seen = Cell::new(None);
        let source = pin!(Pullable::<u16>::new(|out| *out = 513));
        let sink = pin!(Pushable::<u32>::new(|v| seen.set(Some(*v))));
        let lift = pin!(Lift::<u16, u32>::new());
        let lift = lift.into_ref();
        let tick = pin!(Pusher::<()>::new());
        let tick = tick.into_ref();

        lift.input().connect(source.into_ref());
        lift.output().connect(sink.into_ref());
        tick.connect(lift.trigger());

        assert_eq!(seen.get(), None);
        tick.fire();
        assert_eq!(seen.get(), Some(513));
        assert_eq!(lift.get(), 513);
    }

    #[test]
    fn test_lift_without_input_pushes_stored_value() {
        let seen = Cell::new(0);
        let sink = pin!(Pushable::<u8>::new(|v| seen.set(*v)));
        let lift = pin!(Lift::<u8>::with_value(3));
        let lift = lift.into_ref();
        lift.output().connect(sink.into_ref());

        lift.trigger().call(&());
        assert_eq!(seen.get(), 3);
    }

    #[test]
    fn test_lift_without_output_still_pulls() {
        let source = pin!(Pullable::<u8>::new(|out| *out = 42));
        let lift = pin!(Lift::<u8>::new());
        let lift = lift.into_ref();
        lift.input().connect(source.into_ref());

        lift.trigger().call(&());
        assert_eq!(lift.get(), 42);
    }
}
