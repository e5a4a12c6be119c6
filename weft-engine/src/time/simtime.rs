// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! Simulation time.
//!
//! [SimTime] owns every clock in the model and the current time in
//! nanoseconds. Time only moves when the executor runs out of runnable
//! work: it jumps to the earliest pending tick across all clocks and
//! wakes the tasks parked on it.

use std::sync::Arc;

use weft_track::entity::Entity;
use weft_track::set_time;

use super::clock::Clock;
use crate::time::clock::TaskWaker;

#[derive(Clone)]
pub struct SimTime {
    pub entity: Arc<Entity>,

    current_ns: f64,

    /// One clock per distinct frequency, created on first request.
    clocks: Vec<Clock>,
}

impl SimTime {
    #[must_use]
    pub fn new(parent: &Arc<Entity>) -> Self {
        Self {
            entity: Arc::new(Entity::new(parent, "time")),
            current_ns: 0.0,
            clocks: Vec::new(),
        }
    }

    /// The clock for `freq_mhz`. Asking twice for one frequency returns
    /// the same clock, which keeps tick edges aligned across components.
    pub fn get_clock(&mut self, freq_mhz: f64) -> Clock {
        match self.clocks.iter().find(|c| c.freq_mhz() == freq_mhz) {
            Some(clock) => clock.clone(),
            None => {
                let clock = Clock::new(freq_mhz);
                self.clocks.push(clock.clone());
                clock
            }
        }
    }

    /// Jump to the earliest pending tick across all clocks and hand back
    /// the wakers parked on it, or `None` when nothing is scheduled.
    pub fn advance_time(&mut self) -> Option<Vec<TaskWaker>> {
        let next_clock = self.clocks.iter().min_by(|a, b| a.cmp(b))?;
        let clock_time = next_clock.shared_state.waiting_times.borrow_mut().pop()?;

        let next_ns = next_clock.to_ns(&clock_time);
        if self.current_ns != next_ns {
            set_time!(self.entity ; next_ns);
            self.current_ns = next_ns;
        }
        next_clock.shared_state.waiting.borrow_mut().pop()
    }

    #[must_use]
    pub fn time_now_ns(&self) -> f64 {
        self.current_ns
    }

    /// True when every parked task is one the simulation may end under.
    #[must_use]
    pub fn can_exit(&self) -> bool {
        self.clocks.iter().all(|clock| {
            clock
                .shared_state
                .waiting
                .borrow()
                .iter()
                .flatten()
                .all(|task_waker| task_waker.can_exit)
        })
    }
}

#[cfg(test)]
mod tests {
    use weft_track::entity::toplevel;

    use super::*;
    use crate::test_helpers::create_tracker;

    #[test]
    fn one_clock_per_frequency() {
        let tracker = create_tracker(file!());
        let top = toplevel(&tracker, "top");

        let mut time = SimTime::new(&top);
        let _core = time.get_clock(1000.0);
        let _core_again = time.get_clock(1000.0);
        assert_eq!(time.clocks.len(), 1);
    }

    #[test]
    fn distinct_frequencies_get_distinct_clocks() {
        let tracker = create_tracker(file!());
        let top = toplevel(&tracker, "top");

        let mut time = SimTime::new(&top);
        let _core = time.get_clock(1000.0);
        let _link = time.get_clock(1800.0);
        assert_eq!(time.clocks.len(), 2);
    }
}
