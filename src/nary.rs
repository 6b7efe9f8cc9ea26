use core::{
    cell::Cell,
    fmt,
    mem::{offset_of, size_of},
    pin::Pin,
};

use crate::{
    Function, Member, Port, Puller,
    config::{adapter_capacity, DEFAULT_FOOTPRINT},
    member::{Embeds, OnPull},
};

/// A tuple of values pulled through one [`Puller`] each.
///
/// Implemented for tuples of one to four values.
pub trait Inputs<'a>: Default {
    type Pullers;

    fn pullers() -> Self::Pullers;

    /// Refreshes every value whose puller is linked.
    fn pull_linked(pullers: &Self::Pullers, values: &mut Self);
}

/// Access to the `K`-th puller of an [`Inputs`] tuple.
pub trait Input<'a, const K: usize>: Inputs<'a> {
    type Value;

    fn puller(pullers: &Self::Pullers) -> &Puller<'a, Self::Value>;
}

macro_rules! inputs {
    ($($name:ident . $index:tt),+) => {
        impl<'a, $($name: Default),+> Inputs<'a> for ($($name,)+) {
            type Pullers = ($(Puller<'a, $name>,)+);

            fn pullers() -> Self::Pullers {
                ($(Puller::<'a, $name>::new(),)+)
            }

            fn pull_linked(pullers: &Self::Pullers, values: &mut Self) {
                $(
                    if pullers.$index.is_linked() {
                        pullers.$index.pull(&mut values.$index);
                    }
                )+
            }
        }
    };
}

macro_rules! input {
    ($index:tt => $value:ident in ($($name:ident),+)) => {
        impl<'a, $($name: Default),+> Input<'a, $index> for ($($name,)+) {
            type Value = $value;

            fn puller(pullers: &Self::Pullers) -> &Puller<'a, $value> {
                &pullers.$index
            }
        }
    };
}

inputs!(A.0);
inputs!(A.0, B.1);
inputs!(A.0, B.1, C.2);
inputs!(A.0, B.1, C.2, D.3);

input!(0 => A in (A));
input!(0 => A in (A, B));
input!(1 => B in (A, B));
input!(0 => A in (A, B, C));
input!(1 => B in (A, B, C));
input!(2 => C in (A, B, C));
input!(0 => A in (A, B, C, D));
input!(1 => B in (A, B, C, D));
input!(2 => C in (A, B, C, D));
input!(3 => D in (A, B, C, D));

/// On pull, refreshes every linked input and returns a function of all of them.
///
/// Inputs are a tuple `I`; each element has its own [`Puller`], reached with
/// [`input::<K>()`](Self::input). The function receives the whole tuple. The
/// last values are kept, so unlinked inputs keep their previous value.
///
/// ```rust
/// use core::pin::pin;
/// use ramen::{PullNary, Pullable, Puller};
///
/// let a = pin!(Pullable::<u8>::new(|out| *out = 2));
/// let b = pin!(Pullable::<u32>::new(|out| *out = 40));
/// let sum = pin!(PullNary::<(u8, u32), u32>::new(|&(a, b)| u32::from(a) + b));
/// let sum = sum.into_ref();
/// sum.input::<0>().connect(a.into_ref());
/// sum.input::<1>().connect(b.into_ref());
///
/// let read = pin!(Puller::<u32>::new());
/// let read = read.into_ref();
/// read.connect(sum.output());
/// assert_eq!(read.get(), 42);
/// ```
pub struct PullNary<'a, I: Inputs<'a>, Out, const FOOTPRINT: usize = DEFAULT_FOOTPRINT> {
    values: Cell<I>,
    function: Function<'a, fn(&I) -> Out, FOOTPRINT>,
    inputs: I::Pullers,
    output: Member<'a, fn(&mut Out), Self, 0>,
}

unsafe impl<'a, I: Inputs<'a>, Out, const FOOTPRINT: usize> Embeds<0> for PullNary<'a, I, Out, FOOTPRINT> {
    const OFFSET: usize = offset_of!(Self, output);
}

impl<'a, I: Inputs<'a>, Out, const FOOTPRINT: usize> OnPull<Out, 0> for PullNary<'a, I, Out, FOOTPRINT> {
    fn on_pull(&self, slot: &mut Out) {
        let mut values = self.values.take();
        I::pull_linked(&self.inputs, &mut values);
        *slot = self.function.call(&values);
        self.values.set(values);
    }
}

impl<'a, I: Inputs<'a>, Out, const FOOTPRINT: usize> PullNary<'a, I, Out, FOOTPRINT> {
    pub fn new<F>(function: F) -> Self
    where
        F: Fn(&I) -> Out + 'a,
    {
        Self::with_values(function, I::default())
    }

    pub fn with_values<F>(function: F, initial: I) -> Self
    where
        F: Fn(&I) -> Out + 'a,
    {
        const {
            assert!(
                size_of::<F>() <= adapter_capacity(FOOTPRINT),
                "adapter function exceeds its footprint (capped at ADAPTER_FOOTPRINT_CEILING)"
            )
        };
        Self {
            values: Cell::new(initial),
            function: Function::<fn(&I) -> Out, FOOTPRINT>::new(function),
            inputs: I::pullers(),
            output: unsafe { Member::new() },
        }
    }

    pub fn input<const K: usize>(self: Pin<&Self>) -> Pin<&Puller<'a, <I as Input<'a, K>>::Value>>
    where
        I: Input<'a, K>,
    {
        unsafe { self.map_unchecked(|nary| I::puller(&nary.inputs)) }
    }

    pub fn output(self: Pin<&Self>) -> Pin<&Member<'a, fn(&mut Out), Self, 0>> {
        unsafe { self.map_unchecked(|nary| &nary.output) }
    }
}

impl<'a, I: Inputs<'a>, Out, const FOOTPRINT: usize> fmt::Debug for PullNary<'a, I, Out, FOOTPRINT> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PullNary")
            .field("function", &self.function)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}
