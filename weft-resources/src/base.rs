// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! A counted resource that tasks take units of and give back.
//!
//! `request()` suspends the caller while all units are in use. When used as a
//! credit pool, a unit in use is a flit in flight towards a buffer slot that
//! has not yet been freed.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use weft_engine::sim_error;
use weft_engine::types::SimResult;

struct ResourceState {
    // Number of units that can be in use concurrently
    capacity: usize,

    // Current number of units in use
    count: usize,

    // Waiting requests
    queue: VecDeque<Waker>,
}

pub struct ResourceRequest {
    shared_state: Rc<RefCell<ResourceState>>,
}

pub struct ResourceRelease {
    shared_state: Rc<RefCell<ResourceState>>,
}

impl ResourceState {
    fn release(&mut self) -> SimResult {
        if self.count == 0 {
            return sim_error!("release of resource that is not in use");
        }
        self.count -= 1;
        if let Some(p) = self.queue.pop_front() {
            p.wake();
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct Resource {
    shared_state: Rc<RefCell<ResourceState>>,
}

impl Resource {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            shared_state: Rc::new(RefCell::new(ResourceState {
                capacity,
                count: 0,
                queue: VecDeque::new(),
            })),
        }
    }

    #[must_use = "Futures do nothing unless you `.await` or otherwise use them"]
    pub fn request(&self) -> ResourceRequest {
        ResourceRequest {
            shared_state: self.shared_state.clone(),
        }
    }

    #[must_use = "Futures do nothing unless you `.await` or otherwise use them"]
    pub fn release(&self) -> ResourceRelease {
        ResourceRelease {
            shared_state: self.shared_state.clone(),
        }
    }

    /// Mark every unit as free again, waking queued requests up to capacity.
    ///
    /// A credit pool is reset when its channel is claimed by a new sender:
    /// the receiver's buffer is known to be empty at that point.
    pub fn reset(&self) {
        let mut state = self.shared_state.borrow_mut();
        state.count = 0;
        for _ in 0..state.capacity {
            match state.queue.pop_front() {
                Some(p) => p.wake(),
                None => break,
            }
        }
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.shared_state.borrow().count
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.shared_state.borrow().capacity
    }

    /// Number of units not currently in use.
    #[must_use]
    pub fn available(&self) -> usize {
        let state = self.shared_state.borrow();
        state.capacity - state.count
    }
}

impl Future for ResourceRequest {
    type Output = ();
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.shared_state.borrow().count == self.shared_state.borrow().capacity {
            self.shared_state
                .borrow_mut()
                .queue
                .push_back(cx.waker().clone());
            Poll::Pending
        } else {
            self.shared_state.borrow_mut().count += 1;
            Poll::Ready(())
        }
    }
}

impl Future for ResourceRelease {
    type Output = SimResult;
    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.shared_state.borrow_mut().release()?;
        Poll::Ready(Ok(()))
    }
}
