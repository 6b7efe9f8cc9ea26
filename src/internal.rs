//! Fail-fast paths shared by the core types.

use crate::Error;

/// Reports a wiring bug and panics.
///
/// Used where the broken invariant leaves nothing dangling, so unwinding is safe.
#[cold]
#[track_caller]
pub(crate) fn fail(error: Error) -> ! {
    tracing::error!(%error, "ramen contract violation");
    panic!("{error}")
}

/// Reports a wiring bug and terminates without unwinding.
///
/// Used where continuing (or unwinding through a dispatch loop) would leave a
/// neighbor pointing at freed memory.
#[cold]
pub(crate) fn abort(error: Error) -> ! {
    tracing::error!(%error, "ramen contract violation, aborting");

    #[cfg(feature = "std")]
    {
        std::process::abort()
    }

    #[cfg(not(feature = "std"))]
    {
        // A panic raised while another one is unwinding cannot unwind.
        struct Escalate;
        impl Drop for Escalate {
            fn drop(&mut self) {
                panic!("ramen: aborting");
            }
        }
        let _escalate = Escalate;
        panic!("{error}")
    }
}
