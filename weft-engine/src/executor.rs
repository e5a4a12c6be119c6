// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! Single-threaded cooperative executor.
//!
//! All simulation tasks run on one thread and are polled in a stable
//! order: spawn order first, wake order after that. Together with a time
//! wheel that only advances when nothing is runnable, a given model and
//! input schedule replays bit-for-bit.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::Acquire;
use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

use weft_track::entity::Entity;

use crate::time::clock::Clock;
use crate::time::simtime::SimTime;
use crate::types::SimResult;

/// One spawned future plus the handle it needs to re-queue itself on wake.
struct Task {
    future: RefCell<Pin<Box<dyn Future<Output = SimResult>>>>,
    executor: Rc<ExecutorState>,
}

impl Task {
    fn new(future: impl Future<Output = SimResult> + 'static, executor: Rc<ExecutorState>) -> Task {
        Task {
            future: RefCell::new(Box::pin(future)),
            executor,
        }
    }

    fn poll(&self, context: &mut Context) -> Poll<SimResult> {
        self.future.borrow_mut().as_mut().poll(context)
    }
}

// Waking a task pushes it onto the executor's incoming queue. The raw
// waker's data pointer carries an `Rc<Task>` reference.

fn no_op(_: *const ()) {}

static TASK_WAKER_VTABLE: RawWakerVTable = RawWakerVTable::new(clone_waker, wake, no_op, no_op);

fn task_waker(task: Rc<Task>) -> Waker {
    let raw = RawWaker::new(Rc::into_raw(task) as *const (), &TASK_WAKER_VTABLE);
    unsafe { Waker::from_raw(raw) }
}

unsafe fn clone_waker(data: *const ()) -> RawWaker {
    unsafe {
        let task = Rc::from_raw(data as *const Task);
        let clone = task.clone();
        RawWaker::new(Rc::into_raw(clone) as *const (), &TASK_WAKER_VTABLE)
    }
}

unsafe fn wake(data: *const ()) {
    unsafe {
        let task = Rc::from_raw(data as *const Task);
        let requeued = task.clone();
        task.executor.incoming.borrow_mut().push(requeued);
    }
}

struct ExecutorState {
    /// Tasks being polled in the current step.
    runnable: RefCell<Vec<Rc<Task>>>,
    /// Tasks spawned or woken since the last step began.
    incoming: RefCell<Vec<Rc<Task>>>,
    time: RefCell<SimTime>,
}

impl ExecutorState {
    fn new(top: &Arc<Entity>) -> Self {
        Self {
            runnable: RefCell::new(Vec::new()),
            incoming: RefCell::new(Vec::new()),
            time: RefCell::new(SimTime::new(top)),
        }
    }

    fn enqueue(self: &Rc<Self>, future: impl Future<Output = SimResult> + 'static) {
        self.incoming
            .borrow_mut()
            .push(Rc::new(Task::new(future, self.clone())));
    }
}

/// The executor handle.
///
/// A thin [`Rc`] wrapper around the shared executor state, so that it can
/// be cloned and passed around freely.
#[derive(Clone)]
pub struct Executor {
    pub entity: Arc<Entity>,
    state: Rc<ExecutorState>,
}

impl Executor {
    pub fn spawn(&self, future: impl Future<Output = SimResult> + 'static) {
        self.state.enqueue(future);
    }

    /// Poll and advance time until `stop` is set, a task fails, or the
    /// model goes quiet.
    pub fn run(&self, stop: Rc<AtomicBool>) -> SimResult {
        loop {
            self.step(&stop)?;
            if stop.load(Acquire) {
                break;
            }

            if self.state.incoming.borrow().is_empty() {
                if self.state.time.borrow().can_exit() {
                    // Everything still parked is a background task
                    break;
                }
                match self.state.time.borrow_mut().advance_time() {
                    Some(wakers) => {
                        for waker in wakers.into_iter() {
                            waker.wake();
                        }
                    }
                    None => break,
                }
            }
        }
        Ok(())
    }

    /// Poll every currently-runnable task once.
    pub fn step(&self, stop: &Rc<AtomicBool>) -> SimResult {
        let mut runnable = self.state.runnable.borrow_mut();
        runnable.append(&mut self.state.incoming.borrow_mut());

        for task in runnable.drain(..) {
            if stop.load(Acquire) {
                break;
            }

            let waker = task_waker(task.clone());
            let mut context = Context::from_waker(&waker);

            match task.poll(&mut context) {
                // The first failing task aborts the whole simulation
                Poll::Ready(Err(e)) => return Err(e),
                // Completed tasks are simply dropped
                Poll::Ready(Ok(())) => {}
                // A pending task has parked itself somewhere and will
                // re-queue on wake
                Poll::Pending => {}
            }
        }
        Ok(())
    }

    pub fn get_clock(&self, freq_mhz: f64) -> Clock {
        self.state.time.borrow_mut().get_clock(freq_mhz)
    }

    pub fn time_now_ns(&self) -> f64 {
        self.state.time.borrow().time_now_ns()
    }
}

/// Spawns new futures into the executor; the handle components hold.
#[derive(Clone)]
pub struct Spawner {
    state: Rc<ExecutorState>,
}

impl Spawner {
    pub fn spawn(&self, future: impl Future<Output = SimResult> + 'static) {
        self.state.enqueue(future);
    }
}

pub fn new_executor_and_spawner(top: &Arc<Entity>) -> (Executor, Spawner) {
    let state = Rc::new(ExecutorState::new(top));
    let entity = Arc::new(Entity::new(top, "executor"));
    (
        Executor {
            entity,
            state: state.clone(),
        },
        Spawner { state },
    )
}
