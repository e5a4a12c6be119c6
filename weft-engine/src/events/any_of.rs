// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! An event that fires as soon as any member of a set fires.
//!
//! Listening returns the value of whichever member fired first, so a task
//! can wait on "credit returned or timeout" style sets and tell the
//! outcomes apart by the value.
//!
//! # Example
//!
//! ```rust
//! # use weft_engine::engine::Engine;
//! # use weft_engine::events::once::Once;
//! # use weft_engine::events::any_of::AnyOf;
//! # use weft_engine::traits::Event;
//! #
//! // The value type tells the listener which member fired. It must be
//! // `Clone` and `Copy`.
//! #[derive(Clone, Copy)]
//! enum Wakeup {
//!     CreditReturned,
//!     DrainTimeout,
//! }
//! #
//! # let mut engine = Engine::default();
//! #
//! let credit = Once::new(Wakeup::CreditReturned);
//! let timeout = Once::new(Wakeup::DrainTimeout);
//! let first = AnyOf::new(vec![Box::new(credit.clone()), Box::new(timeout.clone())]);
//!
//! // The receiver's consumer drains after 4 cycles
//! # let clock = engine.default_clock();
//! engine.spawn(async move {
//!     clock.wait_ticks(4).await;
//!     credit.notify()?;
//!     Ok(())
//! });
//!
//! // Give up if nothing has drained within 1000 cycles
//! # let clock = engine.default_clock();
//! engine.spawn(async move {
//!     clock.wait_ticks(1000).await;
//!     timeout.notify()?;
//!     Ok(())
//! });
//!
//! engine.spawn(async move {
//!     match first.listen().await {
//!         Wakeup::CreditReturned => println!("credit is back"),
//!         Wakeup::DrainTimeout => panic!("receiver never drained"),
//!     }
//!     Ok(())
//! });
//!
//! # engine.run().unwrap();
//! ```

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

pub struct AnyOf<T> {
    events: Rc<RefCell<Vec<Eventable<T>>>>,
}

impl<T> AnyOf<T> {
    pub fn new(events: Vec<Eventable<T>>) -> Self {
        Self {
            events: Rc::new(RefCell::new(events)),
        }
    }
}

impl<T> Clone for AnyOf<T> {
    fn clone(&self) -> Self {
        // Each clone races an independent copy of the member set
        let cloned = self.events.borrow().to_vec();
        Self::new(cloned)
    }
}

impl<T> Event<T> for AnyOf<T>
where
    T: 'static,
{
    fn listen(&self) -> BoxFuture<'static, T> {
        Box::pin(AnyOfFuture {
            events: self.events.clone(),
            race: None,
            done: false,
        })
    }

    fn clone_dyn(&self) -> Box<dyn Event<T>> {
        Box::new(self.clone())
    }
}

pub struct AnyOfFuture<T> {
    events: Rc<RefCell<Vec<Eventable<T>>>>,
    race: Option<LocalBoxFuture<'static, T>>,
    done: bool,
}

impl<T> Future for AnyOfFuture<T>
where
    T: 'static,
{
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.race.is_none() {
            // First poll: start listening to every member at once
            let events: Vec<_> = self.events.borrow_mut().drain(..).collect();
            self.race = Some(Box::pin(first_of(events)));
        }

        match self.race.as_mut().unwrap().as_mut().poll(cx) {
            Poll::Ready(value) => {
                self.done = true;
                Poll::Ready(value)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> FusedFuture for AnyOfFuture<T>
where
    T: 'static,
{
    fn is_terminated(&self) -> bool {
        self.done
    }
}

async fn first_of<T>(events: Vec<Eventable<T>>) -> T {
    let mut pending: FuturesUnordered<_> = events.iter().map(|e| e.listen()).collect();
    pending.next().await.unwrap()
}
