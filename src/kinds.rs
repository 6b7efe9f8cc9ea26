//! The four port kinds.
//!
//! A port kind is fixed by two directions, seen from the actor that owns the
//! port: where control goes (who calls whom) and where data goes.
//!
//! | Kind       | Control  | Data     | Port                        |
//! |------------|----------|----------|-----------------------------|
//! | `Pushable` | inbound  | inbound  | [`Behavior`] over `fn(&T)`     |
//! | `Pusher`   | outbound | outbound | [`Event`] over `fn(&T)`        |
//! | `Pullable` | inbound  | outbound | [`Behavior`] over `fn(&mut T)` |
//! | `Puller`   | outbound | inbound  | [`Event`] over `fn(&mut T)`    |

use core::fmt;

use crate::{Behavior, Event, config::DEFAULT_FOOTPRINT, port::{Flow, Key}};

/// Inbound push port: receives `&T` from a [`Pusher`].
pub type Pushable<'a, T = (), const FOOTPRINT: usize = DEFAULT_FOOTPRINT> =
    Behavior<'a, fn(&T), FOOTPRINT>;

/// Outbound push port: hands `&T` to every connected [`Pushable`].
pub type Pusher<'a, T = ()> = Event<'a, fn(&T)>;

/// Inbound pull port: fills a `&mut T` on request.
pub type Pullable<'a, T, const FOOTPRINT: usize = DEFAULT_FOOTPRINT> =
    Behavior<'a, fn(&mut T), FOOTPRINT>;

/// Outbound pull port: asks every connected [`Pullable`] to fill a `&mut T`.
pub type Puller<'a, T> = Event<'a, fn(&mut T)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Inbound,
    Outbound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortKind {
    Pushable,
    Pusher,
    Pullable,
    Puller,
}

impl PortKind {
    pub const fn new(flow: Flow, key: Key) -> Self {
        match (flow, key) {
            (Flow::Push, Key::Behavior) => PortKind::Pushable,
            (Flow::Push, Key::Event) => PortKind::Pusher,
            (Flow::Pull, Key::Behavior) => PortKind::Pullable,
            (Flow::Pull, Key::Event) => PortKind::Puller,
        }
    }

    pub const fn from_directions(control: Direction, data: Direction) -> Self {
        match (control, data) {
            (Direction::Inbound, Direction::Inbound) => PortKind::Pushable,
            (Direction::Outbound, Direction::Outbound) => PortKind::Pusher,
            (Direction::Inbound, Direction::Outbound) => PortKind::Pullable,
            (Direction::Outbound, Direction::Inbound) => PortKind::Puller,
        }
    }

    /// Who calls whom.
    pub const fn control(self) -> Direction {
        match self {
            PortKind::Pushable | PortKind::Pullable => Direction::Inbound,
            PortKind::Pusher | PortKind::Puller => Direction::Outbound,
        }
    }

    /// Where the payload goes.
    pub const fn data(self) -> Direction {
        match self {
            PortKind::Pushable | PortKind::Puller => Direction::Inbound,
            PortKind::Pusher | PortKind::Pullable => Direction::Outbound,
        }
    }

    pub const fn flow(self) -> Flow {
        match self {
            PortKind::Pushable | PortKind::Pusher => Flow::Push,
            PortKind::Pullable | PortKind::Puller => Flow::Pull,
        }
    }

    pub const fn key(self) -> Key {
        match self.control() {
            Direction::Inbound => Key::Behavior,
            Direction::Outbound => Key::Event,
        }
    }
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PortKind::Pushable => "pushable",
            PortKind::Pusher => "pusher",
            PortKind::Pullable => "pullable",
            PortKind::Puller => "puller",
        };
        f.write_str(name)
    }
}
