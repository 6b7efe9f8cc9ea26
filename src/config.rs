//! Compile-time limits.
//!
//! Everything in this crate is sized statically, so the knobs that a runtime
//! would normally read from a configuration struct are constants here. They are
//! used as const-generic defaults and in build-time capacity checks.

use core::mem::size_of;

/// Default inline capacity of a [`Behavior`](crate::Behavior) target, in bytes.
///
/// Two pointers: enough for a closure capturing `&self`-like state plus one more
/// reference, or a plain function pointer.
pub const DEFAULT_FOOTPRINT: usize = size_of::<*const ()>() * 2;

/// Upper bound on the footprint of the function stored by the unary and n-ary
/// adapters ([`PushUnary`](crate::PushUnary), [`PullUnary`](crate::PullUnary),
/// [`PullNary`](crate::PullNary)).
///
/// A larger requested footprint is capped to this value; see
/// [`adapter_capacity`].
pub const ADAPTER_FOOTPRINT_CEILING: usize = 64;

/// Bytes an adapter grants its function for a requested `footprint`.
///
/// Targets larger than this fail to build.
pub const fn adapter_capacity(footprint: usize) -> usize {
    if footprint < ADAPTER_FOOTPRINT_CEILING {
        footprint
    } else {
        ADAPTER_FOOTPRINT_CEILING
    }
}

/// Footprint used by [`PushCast`](crate::PushCast) and [`PullCast`](crate::PullCast).
pub const CAST_FOOTPRINT: usize = size_of::<*const ()>();

/// Default footprint of a [`Finalizer`](crate::Finalizer) action.
pub const FINALIZER_FOOTPRINT: usize = size_of::<*const ()>() * 4;

/// How many times a single node may be re-entered by nested firings.
///
/// Feedback topologies (a behavior that, directly or through other actors,
/// fires the event it is being triggered from) recurse. The recursion is
/// legal, but it must terminate; a node entered more than this many times at
/// once is treated as a runaway loop and panics rather than exhausting the stack.
pub const MAX_REENTRANCY: u16 = 64;
