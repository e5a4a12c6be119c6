// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! A one-shot event.
//!
//! [Once] fires exactly once, waking every listener past or future: a
//! listen after the event has fired completes immediately with the stored
//! value. Notifying twice is a modelling error.

use std::cell::{Cell, RefCell};
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use futures::Future;
use futures::future::FusedFuture;

use crate::sim_error;
use crate::traits::{BoxFuture, Event};
use crate::types::SimResult;

struct OnceState<T>
where
    T: Copy,
{
    listeners: RefCell<Vec<Waker>>,
    fired: Cell<bool>,
    value: T,
}

#[derive(Clone)]
pub struct Once<T>
where
    T: Copy,
{
    state: Rc<OnceState<T>>,
}

impl<T> Once<T>
where
    T: Copy,
{
    pub fn new(value: T) -> Self {
        Self {
            state: Rc::new(OnceState {
                listeners: RefCell::new(Vec::new()),
                fired: Cell::new(false),
                value,
            }),
        }
    }

    pub fn notify(&self) -> SimResult {
        if self.state.fired.get() {
            sim_error!("once event already triggered")
        }
        self.state.fired.set(true);
        for waker in self.state.listeners.borrow_mut().drain(..) {
            waker.wake();
        }
        Ok(())
    }
}

impl Default for Once<()> {
    fn default() -> Self {
        Self::new(())
    }
}

impl<T> Event<T> for Once<T>
where
    T: Copy + 'static,
{
    fn listen(&self) -> BoxFuture<'static, T> {
        Box::pin(OnceFuture {
            state: self.state.clone(),
            done: false,
        })
    }

    fn clone_dyn(&self) -> Box<dyn Event<T>> {
        Box::new(self.clone())
    }
}

pub struct OnceFuture<T>
where
    T: Copy,
{
    state: Rc<OnceState<T>>,
    done: bool,
}

impl<T> Future for OnceFuture<T>
where
    T: Copy,
{
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.state.fired.get() {
            self.done = true;
            Poll::Ready(self.state.value)
        } else {
            self.state.listeners.borrow_mut().push(cx.waker().clone());
            Poll::Pending
        }
    }
}

impl<T> FusedFuture for OnceFuture<T>
where
    T: Copy,
{
    fn is_terminated(&self) -> bool {
        self.done
    }
}
