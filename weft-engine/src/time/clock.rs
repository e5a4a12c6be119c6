// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! Clocks and clock-edge futures.
//!
//! A clock's position is a cycle count plus a phase. Two phases matter in
//! each cycle: phase 0 (the rising edge, at which state elements register
//! new values) and phase 1 (the falling edge, at which switching logic
//! observes the post-edge state of its neighbours).

use core::cmp::Ordering;
use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

/// The phase at which state elements register new values.
pub const PHASE_RISING: u32 = 0;

/// The phase at which arbitration and switching decisions are made.
pub const PHASE_FALLING: u32 = 1;

/// A position in clock time: cycle count plus phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockTick {
    tick: u64,
    phase: u32,
}

impl ClockTick {
    pub fn new() -> Self {
        Self { tick: 0, phase: 0 }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn phase(&self) -> u32 {
        self.phase
    }

    /// Builder-style tick override.
    pub fn set_tick(&mut self, tick: u64) -> ClockTick {
        self.tick = tick;
        *self
    }

    /// Builder-style phase override.
    pub fn set_phase(&mut self, phase: u32) -> ClockTick {
        self.phase = phase;
        *self
    }
}

impl Default for ClockTick {
    fn default() -> Self {
        Self::new()
    }
}

/// Ticks order by cycle first, then by phase within the cycle.
impl Ord for ClockTick {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tick
            .cmp(&other.tick)
            .then(self.phase.cmp(&other.phase))
    }
}

impl PartialOrd for ClockTick {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for ClockTick {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}.{:?}", self.tick, self.phase)
    }
}

/// One frequency domain.
#[derive(Clone)]
pub struct Clock {
    /// Frequency in MHz; fixed for the life of the clock, since the time
    /// wheel registered it at this rate.
    freq_mhz: f64,

    pub shared_state: Rc<ClockState>,
}

pub struct TaskWaker {
    pub waker: Waker,

    /// Background tasks that wait in a loop forever mark their waits with
    /// `can_exit`, letting the simulation finish around them.
    pub can_exit: bool,
}

impl TaskWaker {
    pub fn wake(self) {
        self.waker.wake();
    }
}

/// State shared between a [Clock] handle and the delay futures it hands out.
pub struct ClockState {
    now: RefCell<ClockTick>,

    /// Wakers parked per pending wake time, indexed in step with
    /// `waiting_times`.
    pub waiting: RefCell<Vec<Vec<TaskWaker>>>,

    /// Pending wake times, sorted descending so the next wake is always
    /// at the back.
    pub waiting_times: RefCell<Vec<ClockTick>>,
}

impl ClockState {
    fn schedule(&self, at: ClockTick, cx: &mut Context<'_>, can_exit: bool) {
        let entry = TaskWaker {
            waker: cx.waker().clone(),
            can_exit,
        };
        let mut waiting_times = self.waiting_times.borrow_mut();
        let mut waiting = self.waiting.borrow_mut();

        if let Some(index) = waiting_times.iter().position(|&t| t == at) {
            // Join the tasks already parked on this wake time
            waiting[index].push(entry);
            return;
        }

        let index = waiting_times
            .iter()
            .position(|t| *t < at)
            .unwrap_or(waiting_times.len());
        waiting_times.insert(index, at);
        waiting.insert(index, vec![entry]);
    }

    fn advance_time(&self, to_time: ClockTick) {
        if to_time != *self.now.borrow() {
            assert!(to_time >= *self.now.borrow(), "Time moving backwards");
            *self.now.borrow_mut() = to_time;
        }
    }
}

impl Clock {
    pub fn new(freq_mhz: f64) -> Self {
        let shared_state = Rc::new(ClockState {
            now: RefCell::new(ClockTick::new()),
            waiting: RefCell::new(Vec::new()),
            waiting_times: RefCell::new(Vec::new()),
        });

        Self {
            freq_mhz,
            shared_state,
        }
    }

    pub fn freq_mhz(&self) -> f64 {
        self.freq_mhz
    }

    /// The current position of this clock.
    pub fn tick_now(&self) -> ClockTick {
        *self.shared_state.now.borrow()
    }

    /// The current time in `ns`.
    pub fn time_now_ns(&self) -> f64 {
        let now = self.tick_now();
        self.to_ns(&now)
    }

    /// The time in `ns` of this clock's next pending wake, or `f64::MAX`
    /// when nothing is scheduled.
    pub fn time_of_next(&self) -> f64 {
        match self.shared_state.waiting_times.borrow().last() {
            Some(clock_time) => self.to_ns(clock_time),
            None => f64::MAX,
        }
    }

    /// Convert a [ClockTick] on this clock to a time in `ns`.
    pub fn to_ns(&self, clock_time: &ClockTick) -> f64 {
        clock_time.tick as f64 / self.freq_mhz * 1000.0
    }

    fn delay_until(&self, until: ClockTick, can_exit: bool) -> ClockDelay {
        ClockDelay {
            shared_state: self.shared_state.clone(),
            until,
            started: false,
            can_exit,
        }
    }

    /// Wait the given number of ticks, completing on the rising edge.
    #[must_use = "Futures do nothing unless you `.await` or otherwise use them"]
    pub fn wait_ticks(&self, ticks: u64) -> ClockDelay {
        let mut until = self.tick_now();
        until.tick += ticks;
        until.phase = PHASE_RISING;
        self.delay_until(until, false)
    }

    /// Like [wait_ticks](Self::wait_ticks), but the wait does not keep the
    /// simulation alive: a task looping on this runs for exactly as long
    /// as the rest of the model does.
    #[must_use = "Futures do nothing unless you `.await` or otherwise use them"]
    pub fn wait_ticks_or_exit(&self, ticks: u64) -> ClockDelay {
        let mut until = self.tick_now();
        until.tick += ticks;
        until.phase = PHASE_RISING;
        self.delay_until(until, true)
    }

    /// Wait for the given phase of the next tick.
    #[must_use = "Futures do nothing unless you `.await` or otherwise use them"]
    pub fn next_tick_and_phase(&self, phase: u32) -> ClockDelay {
        let mut until = self.tick_now();
        until.tick += 1;
        until.phase = phase;
        self.delay_until(until, false)
    }

    /// Wait for a later phase of the current tick.
    #[must_use = "Futures do nothing unless you `.await` or otherwise use them"]
    pub fn wait_phase(&self, phase: u32) -> ClockDelay {
        let mut until = self.tick_now();
        assert!(phase > until.phase, "Time going backwards");
        until.phase = phase;
        self.delay_until(until, false)
    }
}

/// 1 GHz, so one tick is 1 ns.
impl Default for Clock {
    fn default() -> Self {
        Self::new(1000.0)
    }
}

// Clocks compare by the time of their next pending wake, which is what
// the time wheel needs to pick the clock to advance.
impl PartialEq for Clock {
    fn eq(&self, other: &Self) -> bool {
        self.time_of_next() == other.time_of_next()
    }
}
impl Eq for Clock {}

impl Ord for Clock {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.time_of_next() < other.time_of_next() {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }
}

impl PartialOrd for Clock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Future that parks its task until a [ClockTick] is reached.
pub struct ClockDelay {
    shared_state: Rc<ClockState>,
    until: ClockTick,
    started: bool,
    can_exit: bool,
}

impl Future for ClockDelay {
    type Output = ();
    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.started {
            // Woken by the time wheel reaching our tick
            self.shared_state.advance_time(self.until);
            Poll::Ready(())
        } else {
            self.shared_state.schedule(self.until, cx, self.can_exit);
            self.started = true;
            Poll::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_to_ns() {
        let clk_ghz = Clock::new(1000.0);
        assert_eq!(1.0, clk_ghz.to_ns(&ClockTick::new().set_tick(1)));

        let slow_clk = Clock::new(0.5);
        assert_eq!(2000.0, slow_clk.to_ns(&ClockTick::new().set_tick(1)));
    }

    #[test]
    fn tick_ordering() {
        let rising = ClockTick::new().set_tick(3).set_phase(PHASE_RISING);
        let falling = ClockTick::new().set_tick(3).set_phase(PHASE_FALLING);
        let next = ClockTick::new().set_tick(4);
        assert!(rising < falling);
        assert!(falling < next);
    }
}
