// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! An event that fires once every member of a set has fired.
//!
//! Listening returns the value of the last member to fire. Used to hold a
//! simulation open until, say, every endpoint's traffic has finished.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::StreamExt;
use futures::future::{FusedFuture, LocalBoxFuture};
use futures::stream::FuturesUnordered;

use crate::traits::{BoxFuture, Event};
use crate::types::Eventable;

pub struct AllOf<T> {
    events: Rc<RefCell<Vec<Eventable<T>>>>,
}

impl<T> AllOf<T> {
    pub fn new(events: Vec<Eventable<T>>) -> Self {
        Self {
            events: Rc::new(RefCell::new(events)),
        }
    }
}

impl<T> Clone for AllOf<T> {
    fn clone(&self) -> Self {
        let cloned = self.events.borrow().to_vec();
        Self::new(cloned)
    }
}

impl<T> Event<T> for AllOf<T>
where
    T: 'static,
{
    fn listen(&self) -> BoxFuture<'static, T> {
        Box::pin(AllOfFuture {
            events: self.events.clone(),
            gather: None,
            done: false,
        })
    }

    fn clone_dyn(&self) -> Box<dyn Event<T>> {
        Box::new(self.clone())
    }
}

pub struct AllOfFuture<T> {
    events: Rc<RefCell<Vec<Eventable<T>>>>,
    gather: Option<LocalBoxFuture<'static, T>>,
    done: bool,
}

impl<T> Future for AllOfFuture<T>
where
    T: 'static,
{
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.gather.is_none() {
            let events: Vec<_> = self.events.borrow_mut().drain(..).collect();
            self.gather = Some(Box::pin(last_of(events)));
        }

        match self.gather.as_mut().unwrap().as_mut().poll(cx) {
            Poll::Ready(value) => {
                self.done = true;
                Poll::Ready(value)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> FusedFuture for AllOfFuture<T>
where
    T: 'static,
{
    fn is_terminated(&self) -> bool {
        self.done
    }
}

async fn last_of<T>(events: Vec<Eventable<T>>) -> T {
    let mut pending: FuturesUnordered<_> = events.iter().map(|e| e.listen()).collect();
    let mut value = pending.next().await.unwrap();
    while let Some(next) = pending.next().await {
        value = next;
    }
    value
}
