// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! The outer handle of a simulation.
//!
//! An [Engine] owns the executor, the spawner handed to components, the
//! root of the entity tree and the shared tracker. Model code builds its
//! hierarchy under [Engine::top], spawns activity, and then calls
//! [Engine::run] (or [Engine::run_until]) to play the model out.

use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::Release;

use weft_track::Tracker;
use weft_track::entity::{Entity, toplevel};
use weft_track::tracker::stdout_tracker;

use crate::executor::{self, Executor, Spawner};
use crate::time::clock::Clock;
use crate::types::{Eventable, SimResult};

/// The clock handed out by [Engine::default_clock]: 1 GHz, the rate fabric
/// components tick at unless a test asks for something else.
const DEFAULT_CLOCK_MHZ: f64 = 1000.0;

pub struct Engine {
    pub executor: Executor,
    pub spawner: Spawner,
    top: Arc<Entity>,
    tracker: Tracker,
}

impl Engine {
    /// Create an engine with an entity tree rooted at `top`.
    pub fn new(tracker: &Tracker) -> Self {
        let top = toplevel(tracker, "top");
        let (executor, spawner) = executor::new_executor_and_spawner(&top);
        Self {
            executor,
            spawner,
            top,
            tracker: tracker.clone(),
        }
    }

    /// Run to quiescence: until every task has finished or parked in a
    /// state the time wheel may exit from.
    pub fn run(&mut self) -> SimResult {
        // Nothing external ever cuts this run short
        let stop = Rc::new(AtomicBool::new(false));
        self.executor.run(stop)
    }

    /// Run until `event` fires; whatever would have happened later stays
    /// unexecuted.
    pub fn run_until<T: Default + Copy + 'static>(&mut self, event: Eventable<T>) -> SimResult {
        let stop = Rc::new(AtomicBool::new(false));
        {
            let stop = stop.clone();
            self.executor.spawn(async move {
                event.listen().await;
                stop.store(true, Release);
                Ok(())
            });
        }

        self.executor.run(stop)
    }

    pub fn spawn(&self, future: impl Future<Output = SimResult> + 'static) {
        self.executor.spawn(future);
    }

    /// The 1 GHz clock most of the fabric runs from.
    pub fn default_clock(&mut self) -> Clock {
        self.executor.get_clock(DEFAULT_CLOCK_MHZ)
    }

    pub fn clock_mhz(&mut self, freq_mhz: f64) -> Clock {
        self.executor.get_clock(freq_mhz)
    }

    pub fn clock_ghz(&mut self, freq_ghz: f64) -> Clock {
        self.executor.get_clock(freq_ghz * 1000.0)
    }

    pub fn time_now_ns(&self) -> f64 {
        self.executor.time_now_ns()
    }

    /// Root of the entity tree; components are created under this.
    pub fn top(&self) -> &Arc<Entity> {
        &self.top
    }

    pub fn tracker(&self) -> Tracker {
        self.tracker.clone()
    }
}

/// An engine that reports through stdout, for doc examples where tracker
/// plumbing would only be noise.
impl Default for Engine {
    fn default() -> Self {
        let tracker = stdout_tracker();
        Self::new(&tracker)
    }
}
