// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! A recurring event.
//!
//! [Repeated] wakes whoever is listening at the moment it fires; there is
//! no memory of past notifications, so a listener registered after a
//! notification waits for the next one. Each notification may carry a
//! value (`notify_result`), which buffer components use to publish their
//! occupancy to listeners; plain `notify` re-delivers the last value.

use std::cell::RefCell;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use futures::Future;
use futures::future::FusedFuture;

use crate::traits::{BoxFuture, Event};
use crate::types::SimResult;

struct RepeatedState<T>
where
    T: Copy,
{
    listeners: RefCell<Vec<Waker>>,
    last: RefCell<T>,
}

impl<T> RepeatedState<T>
where
    T: Copy,
{
    fn wake_all(&self) {
        for waker in self.listeners.borrow_mut().drain(..) {
            waker.wake();
        }
    }
}

#[derive(Clone)]
pub struct Repeated<T>
where
    T: Copy,
{
    state: Rc<RepeatedState<T>>,
}

impl<T> Repeated<T>
where
    T: Copy,
{
    pub fn new(value: T) -> Self {
        Self {
            state: Rc::new(RepeatedState {
                listeners: RefCell::new(Vec::new()),
                last: RefCell::new(value),
            }),
        }
    }

    pub fn notify(&self) -> SimResult {
        self.state.wake_all();
        Ok(())
    }

    pub fn notify_result(&self, result: T) -> SimResult {
        *self.state.last.borrow_mut() = result;
        self.state.wake_all();
        Ok(())
    }
}

impl Default for Repeated<()> {
    fn default() -> Self {
        Self::new(())
    }
}

impl<T> Event<T> for Repeated<T>
where
    T: Copy + 'static,
{
    fn listen(&self) -> BoxFuture<'static, T> {
        Box::pin(RepeatedFuture {
            state: self.state.clone(),
            registered: false,
            done: false,
        })
    }

    fn clone_dyn(&self) -> Box<dyn Event<T>> {
        Box::new(self.clone())
    }
}

pub struct RepeatedFuture<T>
where
    T: Copy,
{
    state: Rc<RepeatedState<T>>,
    registered: bool,
    done: bool,
}

impl<T> Future for RepeatedFuture<T>
where
    T: Copy,
{
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.registered {
            // Woken by a notification that arrived after registration
            self.done = true;
            Poll::Ready(*self.state.last.borrow())
        } else {
            self.registered = true;
            self.state.listeners.borrow_mut().push(cx.waker().clone());
            Poll::Pending
        }
    }
}

impl<T> FusedFuture for RepeatedFuture<T>
where
    T: Copy,
{
    fn is_terminated(&self) -> bool {
        self.done
    }
}
