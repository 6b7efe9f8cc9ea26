use core::{
    cell::UnsafeCell,
    fmt,
    marker::PhantomData,
    mem::{MaybeUninit, align_of, size_of},
    ptr,
};

use crate::{Error, Result, config::DEFAULT_FOOTPRINT, internal};

mod sealed {
    pub trait Sealed {}
}

/// Alignment of the inline storage of a [`Function`].
///
/// Implemented by the zero-sized `AlignN` markers only.
pub trait Alignment: sealed::Sealed {}

macro_rules! alignment {
    ($($name:ident => $bytes:literal),* $(,)?) => {
        $(
            #[doc = concat!("Aligns [`Function`] storage to ", stringify!($bytes), " bytes.")]
            #[derive(Debug, Clone, Copy, Default)]
            #[repr(align($bytes))]
            pub struct $name;

            impl sealed::Sealed for $name {}
            impl Alignment for $name {}
        )*
    };
}

alignment! {
    Align1 => 1,
    Align2 => 2,
    Align4 => 4,
    Align8 => 8,
    Align16 => 16,
}

/// Storage alignment used unless stated otherwise; matches `max_align_t` on
/// the common 32-bit embedded targets.
pub type DefaultAlign = Align8;

/// Call signatures a [`Function`] can hold, written as fn-pointer types.
///
/// - `fn() -> R`
/// - `fn(&T) -> R` (arguments passed by shared reference)
/// - `fn(&mut T) -> R` (out-parameters)
///
/// Several values travel as a tuple: `fn(&(u8, bool))`.
pub trait Signature: sealed::Sealed {
    #[doc(hidden)]
    type Thunk: Copy;
}

impl<R> sealed::Sealed for fn() -> R {}
impl<R> Signature for fn() -> R {
    type Thunk = unsafe fn(*const u8) -> R;
}

impl<T: ?Sized, R> sealed::Sealed for fn(&T) -> R {}
impl<T: ?Sized, R> Signature for fn(&T) -> R {
    type Thunk = for<'x> unsafe fn(*const u8, &'x T) -> R;
}

impl<T: ?Sized, R> sealed::Sealed for fn(&mut T) -> R {}
impl<T: ?Sized, R> Signature for fn(&mut T) -> R {
    type Thunk = for<'x> unsafe fn(*const u8, &'x mut T) -> R;
}

#[repr(C)]
struct Storage<const N: usize, A> {
    _align: [A; 0],
    bytes: UnsafeCell<MaybeUninit<[u8; N]>>,
}

impl<const N: usize, A> Storage<N, A> {
    const fn uninit() -> Self {
        Self {
            _align: [],
            bytes: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    fn as_ptr(&self) -> *mut u8 {
        self.bytes.get().cast()
    }
}

unsafe fn drop_target<F>(target: *mut u8) {
    unsafe { ptr::drop_in_place(target.cast::<F>()) }
}

/// A type-erased callable stored inline, without allocation.
///
/// `Function` holds any closure or function whose size fits `FOOTPRINT` bytes
/// and whose alignment fits `A`. The target is erased behind two function
/// pointers captured at construction (call and drop), so the holder has a
/// fixed size that does not depend on the target type.
///
/// - Capacity is checked at build time. A target that does not fit is a
///   compile error, never a runtime failure or a heap fallback.
/// - Calling an empty `Function` is a wiring bug: [`call`](Self::call) panics,
///   [`try_call`](Self::try_call) returns [`Error::EmptyFunction`].
/// - Moving a `Function` moves the target bytes. [`take`](Self::take) moves the
///   target out and leaves the source empty.
/// - Not `Clone`: a target is owned by exactly one holder.
///
/// `'a` bounds whatever the target borrows.
///
/// # Examples
///
/// ```rust
/// use ramen::Function;
///
/// let offset = 40;
/// let add = Function::<fn(&u32) -> u32>::new(move |x| x + offset);
/// assert_eq!(add.call(&2), 42);
/// ```
///
/// A target three bytes larger than the footprint does not build:
///
/// ```rust,compile_fail
/// use ramen::Function;
///
/// let payload = [7u8; 11];
/// let f = Function::<fn() -> u8, 8>::new(move || payload[0]);
/// ```
///
/// Narrowing does not build either:
///
/// ```rust,compile_fail
/// use ramen::Function;
///
/// let f = Function::<fn() -> u8, 16>::new(|| 1);
/// let g: Function<fn() -> u8, 8> = f.widen();
/// ```
pub struct Function<
    'a,
    S: Signature,
    const FOOTPRINT: usize = DEFAULT_FOOTPRINT,
    A: Alignment = DefaultAlign,
> {
    storage: Storage<FOOTPRINT, A>,
    thunk: Option<S::Thunk>,
    drop: Option<unsafe fn(*mut u8)>,
    _target: PhantomData<(&'a (), *const ())>,
}

impl<'a, S: Signature, const FOOTPRINT: usize, A: Alignment> Function<'a, S, FOOTPRINT, A> {
    /// Inline capacity in bytes.
    pub const CAPACITY: usize = FOOTPRINT;

    /// Whether a target is held.
    #[inline]
    pub fn has_target(&self) -> bool {
        self.thunk.is_some()
    }

    /// Destroys the target, if any.
    pub fn clear(&mut self) {
        self.thunk = None;
        if let Some(drop) = self.drop.take() {
            unsafe { drop(self.storage.as_ptr()) }
        }
    }

    /// Moves the target out, leaving `self` empty.
    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }

    /// Moves the target into a holder at least as large and as aligned.
    pub fn widen<const WIDER: usize, B: Alignment>(mut self) -> Function<'a, S, WIDER, B> {
        const {
            assert!(FOOTPRINT <= WIDER, "cannot move a Function into a smaller footprint");
            assert!(
                align_of::<A>() <= align_of::<B>(),
                "cannot move a Function into a less aligned holder"
            );
        }
        let mut wider = Function::<'a, S, WIDER, B>::default();
        if let (Some(thunk), Some(drop)) = (self.thunk.take(), self.drop.take()) {
            unsafe {
                ptr::copy_nonoverlapping(self.storage.as_ptr(), wider.storage.as_ptr(), FOOTPRINT)
            };
            wider.thunk = Some(thunk);
            wider.drop = Some(drop);
        }
        wider
    }

    fn emplace<F: 'a>(&mut self, target: F, thunk: S::Thunk) {
        const {
            assert!(size_of::<F>() <= FOOTPRINT, "Function target exceeds the footprint");
            assert!(
                align_of::<F>() <= align_of::<A>(),
                "Function target is over-aligned for the storage"
            );
        }
        self.clear();
        unsafe { ptr::write(self.storage.as_ptr().cast::<F>(), target) };
        self.thunk = Some(thunk);
        self.drop = Some(drop_target::<F>);
    }

    fn bound_thunk(&self) -> Result<S::Thunk> {
        self.thunk.ok_or(Error::EmptyFunction)
    }
}

impl<'a, R, const FOOTPRINT: usize, A: Alignment> Function<'a, fn() -> R, FOOTPRINT, A> {
    pub fn new<F>(target: F) -> Self
    where
        F: Fn() -> R + 'a,
    {
        let mut function = Self::default();
        function.set(target);
        function
    }

    /// Replaces the target; the previous one is destroyed first.
    pub fn set<F>(&mut self, target: F)
    where
        F: Fn() -> R + 'a,
    {
        unsafe fn thunk<R, F: Fn() -> R>(target: *const u8) -> R {
            let target = unsafe { &*target.cast::<F>() };
            target()
        }
        self.emplace(target, thunk::<R, F>);
    }

    #[track_caller]
    pub fn call(&self) -> R {
        self.try_call().unwrap_or_else(|e| internal::fail(e))
    }

    pub fn try_call(&self) -> Result<R> {
        let thunk = self.bound_thunk()?;
        Ok(unsafe { thunk(self.storage.as_ptr()) })
    }
}

impl<'a, T: ?Sized, R, const FOOTPRINT: usize, A: Alignment> Function<'a, fn(&T) -> R, FOOTPRINT, A> {
    pub fn new<F>(target: F) -> Self
    where
        F: Fn(&T) -> R + 'a,
    {
        let mut function = Self::default();
        function.set(target);
        function
    }

    /// Replaces the target; the previous one is destroyed first.
    pub fn set<F>(&mut self, target: F)
    where
        F: Fn(&T) -> R + 'a,
    {
        unsafe fn thunk<T: ?Sized, R, F: Fn(&T) -> R>(target: *const u8, arg: &T) -> R {
            let target = unsafe { &*target.cast::<F>() };
            target(arg)
        }
        self.emplace(target, thunk::<T, R, F>);
    }

    #[track_caller]
    pub fn call(&self, arg: &T) -> R {
        self.try_call(arg).unwrap_or_else(|e| internal::fail(e))
    }

    pub fn try_call(&self, arg: &T) -> Result<R> {
        let thunk = self.bound_thunk()?;
        Ok(unsafe { thunk(self.storage.as_ptr(), arg) })
    }
}

impl<'a, T: ?Sized, R, const FOOTPRINT: usize, A: Alignment>
    Function<'a, fn(&mut T) -> R, FOOTPRINT, A>
{
    pub fn new<F>(target: F) -> Self
    where
        F: Fn(&mut T) -> R + 'a,
    {
        let mut function = Self::default();
        function.set(target);
        function
    }

    /// Replaces the target; the previous one is destroyed first.
    pub fn set<F>(&mut self, target: F)
    where
        F: Fn(&mut T) -> R + 'a,
    {
        unsafe fn thunk<T: ?Sized, R, F: Fn(&mut T) -> R>(target: *const u8, arg: &mut T) -> R {
            let target = unsafe { &*target.cast::<F>() };
            target(arg)
        }
        self.emplace(target, thunk::<T, R, F>);
    }

    #[track_caller]
    pub fn call(&self, arg: &mut T) -> R {
        self.try_call(arg).unwrap_or_else(|e| internal::fail(e))
    }

    pub fn try_call(&self, arg: &mut T) -> Result<R> {
        let thunk = self.bound_thunk()?;
        Ok(unsafe { thunk(self.storage.as_ptr(), arg) })
    }
}

impl<S: Signature, const FOOTPRINT: usize, A: Alignment> Default for Function<'_, S, FOOTPRINT, A> {
    fn default() -> Self {
        Self {
            storage: Storage::uninit(),
            thunk: None,
            drop: None,
            _target: PhantomData,
        }
    }
}

impl<S: Signature, const FOOTPRINT: usize, A: Alignment> Drop for Function<'_, S, FOOTPRINT, A> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<S: Signature, const FOOTPRINT: usize, A: Alignment> fmt::Debug for Function<'_, S, FOOTPRINT, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("footprint", &FOOTPRINT)
            .field("align", &align_of::<A>())
            .field("has_target", &self.has_target())
            .finish()
    }
}
