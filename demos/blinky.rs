//! Blinks a simulated LED, with the period changed by text commands.
//!
//! ```text
//!  clock --tick--> Timer --expired--> Led --level--> pin
//!                    ^                 |
//!  script --line--> Parser --period----+ (Latch) <-- status
//! ```
//!
//! `cargo run --example blinky`

use std::{cell::Cell, mem::offset_of, pin::pin};

use ramen::{Embeds, Finalizer, Latch, Member, OnPush, Ports, Pushable, Puller, Pusher};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("invalid period: {0}")]
    InvalidPeriod(String),
}

struct Config {
    period_ms: u32,
    step_ms: u32,
    run_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            period_ms: 500,
            step_ms: 50,
            run_ms: 3_000,
        }
    }
}

impl Config {
    fn with_period_ms(mut self, period_ms: u32) -> Self {
        self.period_ms = period_ms;
        self
    }

    fn with_step_ms(mut self, step_ms: u32) -> Self {
        self.step_ms = step_ms;
        self
    }
}

/// Fires `expired` every `period` milliseconds of simulated time.
#[derive(Ports)]
struct Timer<'a> {
    period: Cell<u32>,
    deadline: Cell<u32>,
    #[port]
    tick: Member<'a, fn(&u32), Self, 0>,
    #[port]
    set_period: Member<'a, fn(&u32), Self, 1>,
    #[port]
    expired: Pusher<'a>,
}

unsafe impl Embeds<0> for Timer<'_> {
    const OFFSET: usize = offset_of!(Self, tick);
}

unsafe impl Embeds<1> for Timer<'_> {
    const OFFSET: usize = offset_of!(Self, set_period);
}

impl Timer<'_> {
    fn new(period: u32) -> Self {
        Self {
            period: Cell::new(period),
            deadline: Cell::new(period),
            tick: unsafe { Member::new() },
            set_period: unsafe { Member::new() },
            expired: Pusher::new(),
        }
    }
}

impl OnPush<u32, 0> for Timer<'_> {
    fn on_push(&self, now: &u32) {
        if *now < self.deadline.get() {
            return;
        }
        self.deadline.set(now + self.period.get());
        self.expired.fire();
    }
}

impl OnPush<u32, 1> for Timer<'_> {
    fn on_push(&self, period: &u32) {
        info!(period, "timer period changed");
        self.period.set(*period);
        self.deadline.set(0);
    }
}

/// Toggles its output level on every push.
#[derive(Ports)]
struct Led<'a> {
    lit: Cell<bool>,
    #[port]
    toggle: Member<'a, fn(&()), Self, 0>,
    #[port]
    level: Pusher<'a, bool>,
}

unsafe impl Embeds<0> for Led<'_> {
    const OFFSET: usize = offset_of!(Self, toggle);
}

impl Led<'_> {
    fn new() -> Self {
        Self {
            lit: Cell::new(false),
            toggle: unsafe { Member::new() },
            level: Pusher::new(),
        }
    }
}

impl OnPush<(), 0> for Led<'_> {
    fn on_push(&self, _: &()) {
        let lit = !self.lit.get();
        self.lit.set(lit);
        self.level.push(&lit);
    }
}

/// Turns command lines into period updates.
#[derive(Ports)]
struct Parser<'a> {
    #[port]
    line: Member<'a, fn(&&'static str), Self, 0>,
    #[port]
    period: Pusher<'a, u32>,
}

unsafe impl Embeds<0> for Parser<'_> {
    const OFFSET: usize = offset_of!(Self, line);
}

impl Parser<'_> {
    fn new() -> Self {
        Self {
            line: unsafe { Member::new() },
            period: Pusher::new(),
        }
    }

    fn parse(line: &str) -> Result<u32, AppError> {
        match line.split_whitespace().collect::<Vec<_>>()[..] {
            ["period", value] => value
                .parse()
                .ok()
                .filter(|&ms| ms > 0)
                .ok_or_else(|| AppError::InvalidPeriod(value.to_owned())),
            _ => Err(AppError::UnknownCommand(line.to_owned())),
        }
    }
}

impl OnPush<&'static str, 0> for Parser<'_> {
    fn on_push(&self, line: &&'static str) {
        match Self::parse(line) {
            Ok(period) => self.period.push(&period),
            Err(error) => warn!(%error, "command rejected"),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = Config::default().with_period_ms(400).with_step_ms(100);
    let script: [(u32, &'static str); 3] = [(1_000, "period 200"), (1_800, "blink faster"), (2_200, "period 0")];

    let edges = Cell::new(0u32);
    let pin_out = pin!(Pushable::<bool>::new(|level| {
        edges.set(edges.get() + 1);
        info!(level, "pin");
    }));
    let status = pin!(Latch::<bool>::new(false));
    let status = status.into_ref();

    let timer = pin!(Timer::new(config.period_ms));
    let timer = timer.into_ref();
    let led = pin!(Led::new());
    let led = led.into_ref();
    let parser = pin!(Parser::new());
    let parser = parser.into_ref();

    let clock = pin!(Pusher::<u32>::new());
    let clock = clock.into_ref();
    let console = pin!(Pusher::<&'static str>::new());
    let console = console.into_ref();
    let read_status = pin!(Puller::<bool>::new());
    let read_status = read_status.into_ref();

    clock.connect(timer.tick());
    timer.expired().connect(led.toggle());
    led.level().connect(pin_out.into_ref()).connect(status.input());
    console.connect(parser.line());
    parser.period().connect(timer.set_period());
    read_status.connect(status.output());

    let _report: Finalizer = Finalizer::new(|| info!(edges = edges.get(), "simulation finished"));

    for now in (0..=config.run_ms).step_by(config.step_ms as usize) {
        for &(_, line) in script.iter().filter(|(at, _)| *at == now) {
            console.push(&line);
        }
        clock.push(&now);
    }

    info!(lit = read_status.get(), "final led state");
}
