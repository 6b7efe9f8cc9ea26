//! Adapters that apply a function across a port boundary.

use core::{
    cell::Cell,
    fmt,
    mem::{offset_of, size_of},
    pin::Pin,
};

use crate::{
    Function, Member, Port, Puller, Pusher,
    config::{adapter_capacity, CAST_FOOTPRINT, DEFAULT_FOOTPRINT},
    member::{Embeds, OnPull, OnPush},
};

/// Applies a function to every pushed value and pushes the result on.
///
/// While the output is unlinked nobody would see the result, so the function
/// is not evaluated at all. A function returning a zero-sized value such as
/// `()` runs for its side effects on every push.
///
/// The function is stored inline in `FOOTPRINT` bytes. Adapters cap the usable
/// footprint at [`ADAPTER_FOOTPRINT_CEILING`](crate::config::ADAPTER_FOOTPRINT_CEILING),
/// so a larger target does not build even when more was requested:
///
/// ```rust,compile_fail
/// use ramen::PushUnary;
///
/// let table = [1u8; 100];
/// let lookup = PushUnary::<u8, u8, 128>::new(move |v| table[usize::from(*v)]);
/// ```
pub struct PushUnary<'a, In, Out, const FOOTPRINT: usize = DEFAULT_FOOTPRINT> {
    function: Function<'a, fn(&In) -> Out, FOOTPRINT>,
    input: Member<'a, fn(&In), Self, 0>,
    output: Pusher<'a, Out>,
}

/// [`PushUnary`] converting with [`From`].
pub type PushCast<'a, Src, Dst> = PushUnary<'a, Src, Dst, CAST_FOOTPRINT>;

unsafe impl<In, Out, const FOOTPRINT: usize> Embeds<0> for PushUnary<'_, In, Out, FOOTPRINT> {
    const OFFSET: usize = offset_of!(Self, input);
}

impl<In, Out, const FOOTPRINT: usize> OnPush<In, 0> for PushUnary<'_, In, Out, FOOTPRINT> {
    fn on_push(&self, value: &In) {
        let linked = self.output.is_linked();
        if !linked && size_of::<Out>() != 0 {
            return;
        }
        let out = self.function.call(value);
        if linked {
            self.output.push(&out);
        }
    }
}

impl<'a, In, Out, const FOOTPRINT: usize> PushUnary<'a, In, Out, FOOTPRINT> {
    pub fn new<F>(function: F) -> Self
    where
        F: Fn(&In) -> Out + 'a,
    {
        const {
            assert!(
                size_of::<F>() <= adapter_capacity(FOOTPRINT),
                "adapter function exceeds its footprint (capped at ADAPTER_FOOTPRINT_CEILING)"
            )
        };
        Self {
            function: Function::<fn(&In) -> Out, FOOTPRINT>::new(function),
            input: unsafe { Member::new() },
            output: Pusher::new(),
        }
    }

    pub fn input(self: Pin<&Self>) -> Pin<&Member<'a, fn(&In), Self, 0>> {
        unsafe { self.map_unchecked(|unary| &unary.input) }
    }

    pub fn output(self: Pin<&Self>) -> Pin<&Pusher<'a, Out>> {
        unsafe { self.map_unchecked(|unary| &unary.output) }
    }
}

impl<In: Clone + Into<Out>, Out> PushUnary<'_, In, Out, CAST_FOOTPRINT> {
    pub fn cast() -> Self {
        Self::new(|value: &In| value.clone().into())
    }
}

impl<In, Out, const FOOTPRINT: usize> fmt::Debug for PushUnary<'_, In, Out, FOOTPRINT> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushUnary")
            .field("function", &self.function)
            .field("input", &self.input)
            .field("output", &self.output)
            .finish()
    }
}

/// On pull, refreshes its input (if linked) and returns the function of it.
///
/// The last input value is kept, so an unlinked input keeps producing the
/// function of the initial value.
pub struct PullUnary<'a, In, Out, const FOOTPRINT: usize = DEFAULT_FOOTPRINT> {
    value: Cell<In>,
    function: Function<'a, fn(&In) -> Out, FOOTPRINT>,
    input: Puller<'a, In>,
    output: Member<'a, fn(&mut Out), Self, 0>,
}

/// [`PullUnary`] converting with [`From`].
pub type PullCast<'a, Src, Dst> = PullUnary<'a, Src, Dst, CAST_FOOTPRINT>;

unsafe impl<In, Out, const FOOTPRINT: usize> Embeds<0> for PullUnary<'_, In, Out, FOOTPRINT> {
    const OFFSET: usize = offset_of!(Self, output);
}

impl<In: Default, Out, const FOOTPRINT: usize> OnPull<Out, 0> for PullUnary<'_, In, Out, FOOTPRINT> {
    fn on_pull(&self, slot: &mut Out) {
        let mut value = self.value.take();
        if self.input.is_linked() {
            self.input.pull(&mut value);
        }
        *slot = self.function.call(&value);
        self.value.set(value);
    }
}

impl<'a, In: Default, Out, const FOOTPRINT: usize> PullUnary<'a, In, Out, FOOTPRINT> {
    pub fn new<F>(function: F) -> Self
    where
        F: Fn(&In) -> Out + 'a,
    {
        Self::with_value(function, In::default())
    }

    pub fn with_value<F>(function: F, initial: In) -> Self
    where
        F: Fn(&In) -> Out + 'a,
    {
        const {
            assert!(
                size_of::<F>() <= adapter_capacity(FOOTPRINT),
                "adapter function exceeds its footprint (capped at ADAPTER_FOOTPRINT_CEILING)"
            )
        };
        Self {
            value: Cell::new(initial),
            function: Function::<fn(&In) -> Out, FOOTPRINT>::new(function),
            input: Puller::new(),
            output: unsafe { Member::new() },
        }
    }

    pub fn input(self: Pin<&Self>) -> Pin<&Puller<'a, In>> {
        unsafe { self.map_unchecked(|unary| &unary.input) }
    }

    pub fn output(self: Pin<&Self>) -> Pin<&Member<'a, fn(&mut Out), Self, 0>> {
        unsafe { self.map_unchecked(|unary| &unary.output) }
    }
}

impl<In: Default + Clone + Into<Out>, Out> PullUnary<'_, In, Out, CAST_FOOTPRINT> {
    pub fn cast() -> Self {
        Self::new(|value: &In| value.clone().into())
    }
}

impl<In, Out, const FOOTPRINT: usize> fmt::Debug for PullUnary<'_, In, Out, FOOTPRINT> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PullUnary")
            .field("function", &self.function)
            .field("input", &self.input)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Pullable, Pushable};
    use core::pin::pin;

    #[test]
    fn test_push_unary_maps_values() {
        let seen = Cell::new(0u16);
        let sink = pin!(Pushable::<u16>::new(|v| seen.set(*v)));
        let double = pin!(PushUnary::<u8, u16>::new(|v| u16::from(*v) * 2));
        let double = double.into_ref();
        let source = pin!(Pusher::<u8>::new());
        let source = source.into_ref();

        source.connect(double.input());
        double.output().connect(sink.into_ref());
        source.push(&200);
        assert_eq!(seen.get(), 400);
    }

    #[test]
    fn test_push_unary_to_unit_fires() {
        let calls = Cell::new(0);
        let fired = Cell::new(0);
        let done = pin!(Pushable::<()>::new(|_| fired.set(fired.get() + 1)));
        let unary = pin!(PushUnary::<u8, ()>::new(|_| calls.set(calls.get() + 1)));
        let unary = unary.into_ref();

        unary.input().call(&1);
        assert_eq!((calls.get(), fired.get()), (1, 0));
        unary.output().connect(done.into_ref());
        unary.input().call(&1);
        assert_eq!((calls.get(), fired.get()), (2, 1));
    }

    #[test]
    fn test_push_unary_skips_function_when_unlinked() {
        let calls = Cell::new(0);
        let seen = Cell::new(0u16);
        let sink = pin!(Pushable::<u16>::new(|v| seen.set(*v)));
        let unary = pin!(PushUnary::<u8, u16>::new(|v| {
            calls.set(calls.get() + 1);
            u16::from(*v) + 1
        }));
        let unary = unary.into_ref();

        unary.input().call(&1);
        assert_eq!(calls.get(), 0);

        unary.output().connect(sink.into_ref());
        unary.input().call(&1);
        assert_eq!((calls.get(), seen.get()), (1, 2));
    }

    #[test]
    fn test_requested_footprint_above_ceiling_is_capped() {
        let seen = Cell::new(0u8);
        let sink = pin!(Pushable::<u8>::new(|v| seen.set(*v)));
        let offset = 3u8;
        let unary = pin!(PushUnary::<u8, u8, 128>::new(move |v| v + offset));
        let unary = unary.into_ref();
        unary.output().connect(sink.into_ref());
        unary.input().call(&4);
        assert_eq!(seen.get(), 7);

        let pull = pin!(PullUnary::<u8, u8, 256>::with_value(move |v| v * offset, 5));
        let pull = pull.into_ref();
        let mut slot = 0;
        pull.output().call(&mut slot);
        assert_eq!(slot, 15);
    }

    #[test]
    fn test_pull_unary_refreshes_input() {
        let source = pin!(Pullable::<i32>::new(|out| *out = 21));
        let double = pin!(PullUnary::<i32, i64>::with_value(|v| i64::from(*v) * 2, 5));
        let double = double.into_ref();
        let read = pin!(Puller::<i64>::new());
        let read = read.into_ref();
        read.connect(double.output());

        assert_eq!(read.get(), 10);
        double.input().connect(source.into_ref());
        assert_eq!(read.get(), 42);
    }

    #[test]
    fn test_casts() {
        let seen = Cell::new(0u32);
        let sink = pin!(Pushable::<u32>::new(|v| seen.set(*v)));
        let widen = pin!(PushCast::<u8, u32>::cast());
        let widen = widen.into_ref();
        widen.output().connect(sink.into_ref());
        widen.input().call(&255);
        assert_eq!(seen.get(), 255);

        let source = pin!(Pullable::<u16>::new(|out| *out = 0xbeef));
        let pull = pin!(PullCast::<u16, u64>::cast());
        let pull = pull.into_ref();
        pull.input().connect(source.into_ref());
        let mut slot = 0u64;
        pull.output().call(&mut slot);
        assert_eq!(slot, 0xbeef);
    }
}
