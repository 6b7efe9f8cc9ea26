//! Ramen - Real-time Actor-based Message Exchange
//!
//! Typed ports for hard real-time embedded control software. Components
//! ("actors") exchange data and control through ports, with no heap
//! allocation and no runtime cost beyond one indirect call per recipient.
//!
//! # Notation
//!
//! Arrows point in the direction of control flow: the pointed-to item is
//! invoked by the pointing item. Actors accept data from the left and output
//! data to the right. A control input (the invoked item) is a *behavior*, a
//! control output is an *event*. That gives four port kinds and two dataflow
//! models, push (eager) and pull (lazy):
//!
//! ```text
//!                                +--------+
//!   (input behavior) pushable -->|        |--> pusher (output event)
//!                                | Actor  |
//!      (input event) puller   <--|        |<-- pullable (output behavior)
//!                                +--------+
//! ```
//!
//! See [`PortKind`] for the table. [`Latch`] and [`Lift`] bridge the two
//! models.
//!
//! # Topics
//!
//! [`connect`] links an event to another port, merging their *topics*.
//! Firing any event of a topic triggers every behavior of the topic in link
//! order; events never trigger each other. Behaviors cannot be linked without
//! an event. When the direction does not matter, [`connect_either_direction`]
//! links a pair irrespective of which side is the event.
//!
//! Ports must be pinned before they are linked, and unlink themselves when
//! dropped. Every port of a topic shares one lifetime `'a`, so whatever a
//! behavior borrows outlives every firing that can reach it.
//!
//! ```rust
//! use core::{cell::Cell, pin::pin};
//! use ramen::{Pushable, Pusher, connect};
//!
//! let count = Cell::new(0);
//! let tick = pin!(Pusher::<()>::new());
//! let tick = tick.into_ref();
//! let counter = pin!(Pushable::<()>::new(|_| count.set(count.get() + 1)));
//!
//! connect(tick, counter.into_ref());
//! tick.fire();
//! assert_eq!(count.get(), 1);
//! ```
//!
//! # Feedback
//!
//! Actor networks loop back on themselves, especially in control systems.
//! Firing an event may reach the current actor again through an arbitrarily
//! long chain. Update state transactionally: read all inputs, then update the
//! state, and only then write the outputs. Runaway loops are cut off after
//! [`config::MAX_REENTRANCY`] nested visits of a single port.
//!
//! # Errors
//!
//! Capacity violations (a target too large for its footprint) fail to build.
//! Wiring bugs detected at run time (calling an empty [`Function`]) panic,
//! with a `tracing` error logged first; the `try_*` variants return
//! [`Error`] instead.
//!
//! # Features
//!
//! - `std` (default): process abort on unrecoverable errors, `std` support in
//!   `tracing` and `thiserror`. Without it the crate is `no_std`.
//! - `macros` (default): `#[derive(Ports)]` for pinned field projections.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod config;
mod error;
mod internal;

mod behavior;
mod event;
mod finalizer;
mod function;
mod kinds;
mod latch;
pub mod list;
mod member;
mod nary;
mod port;
mod unary;

pub use behavior::Behavior;
pub use error::Error;
pub use event::Event;
pub use finalizer::Finalizer;
pub use function::{Align1, Align2, Align4, Align8, Align16, Alignment, DefaultAlign, Function, Signature};
pub use kinds::{Direction, PortKind, Pullable, Puller, Pushable, Pusher};
pub use latch::{Latch, Lift};
pub use member::{Embeds, Handles, Member, OnPull, OnPush};
pub use nary::{Input, Inputs, PullNary};
pub use port::{EitherDirection, Flow, Key, Node, Port, PortSignature, connect, connect_either_direction};
pub use unary::{PullCast, PullUnary, PushCast, PushUnary};

#[cfg(feature = "macros")]
pub use ramen_macros::Ports;

pub type Result<T = ()> = core::result::Result<T, Error>;
