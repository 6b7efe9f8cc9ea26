//! Integration test for the Ports derive macro.

use core::{cell::Cell, mem::offset_of, pin::pin};

use ramen::{Embeds, Member, OnPush, Port, Ports, Pushable, Pusher};

#[derive(Ports)]
struct Relay<'a> {
    #[port]
    input: Pushable<'a, u8>,
    #[port]
    output: Pusher<'a, u8>,
    label: &'static str,
}

#[test]
fn test_projections_reach_fields() {
    let seen = Cell::new(0);
    let relay = pin!(Relay {
        input: Pushable::new(|v| seen.set(*v)),
        output: Pusher::new(),
        label: "relay",
    });
    let relay = relay.into_ref();
    let source = pin!(Pusher::<u8>::new());
    let source = source.into_ref();

    source.connect(relay.input());
    source.push(&9);
    assert_eq!(seen.get(), 9);
    assert!(!relay.output().is_linked());
    assert_eq!(relay.label, "relay");
}

#[derive(Ports)]
struct Accumulator<'a> {
    total: Cell<u32>,
    #[port]
    add: Member<'a, fn(&u32), Self, 0>,
    #[port]
    changed: Pusher<'a, u32>,
}

unsafe impl Embeds<0> for Accumulator<'_> {
    const OFFSET: usize = offset_of!(Self, add);
}

impl OnPush<u32, 0> for Accumulator<'_> {
    fn on_push(&self, value: &u32) {
        let total = self.total.get() + value;
        self.total.set(total);
        self.changed.push(&total);
    }
}

#[test]
fn test_member_fields_project() {
    let last = Cell::new(0);
    let report = pin!(Pushable::<u32>::new(|v| last.set(*v)));
    let acc = pin!(Accumulator {
        total: Cell::new(0),
        add: unsafe { Member::new() },
        changed: Pusher::new(),
    });
    let acc = acc.into_ref();
    let feed = pin!(Pusher::<u32>::new());
    let feed = feed.into_ref();

    feed.connect(acc.add());
    acc.changed().connect(report.into_ref());
    feed.push(&30);
    feed.push(&12);
    assert_eq!(last.get(), 42);
}

#[derive(Ports)]
struct Generic<'a, T: Copy + Default> {
    #[port]
    out: Pusher<'a, T>,
}

#[test]
fn test_generic_struct() {
    let seen = Cell::new(0i64);
    let sink = pin!(Pushable::<i64>::new(|v| seen.set(*v)));
    let node = pin!(Generic::<i64> { out: Pusher::new() });
    let node = node.into_ref();
    node.out().connect(sink.into_ref());
    node.out().push(&-3);
    assert_eq!(seen.get(), -3);
}
