// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! Rendezvous ports: the link-level handshake between two components.
//!
//! An [`OutPort`] and an [`InPort`] share a [`PortState`] that carries at
//! most one in-flight value. A `put` completes only once the receiving side
//! has consumed the value, so back-pressure needs no explicit ready wire: a
//! stalled receiver simply leaves the sender's future pending. A receiver
//! that has to inspect a value before releasing its sender — the credit
//! gate does this while it waits for a credit — pairs `start_get` with a
//! later `finish_get`.

use std::cell::RefCell;
use std::fmt;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use futures::Future;
use futures::future::FusedFuture;
use weft_track::entity::Entity;

use crate::traits::SimObject;
use crate::types::SimResult;

/// The slot shared by one sender and one receiver, plus the waker of
/// whichever side is currently stalled on it.
pub struct PortState<T>
where
    T: SimObject,
{
    slot: RefCell<Option<T>>,
    getter: RefCell<Option<Waker>>,
    putter: RefCell<Option<Waker>>,
}

impl<T> PortState<T>
where
    T: SimObject,
{
    pub fn new() -> Self {
        Self {
            slot: RefCell::new(None),
            getter: RefCell::new(None),
            putter: RefCell::new(None),
        }
    }

    fn wake_putter(&self) {
        if let Some(waker) = self.putter.borrow_mut().take() {
            waker.wake();
        }
    }

    fn wake_getter(&self) {
        if let Some(waker) = self.getter.borrow_mut().take() {
            waker.wake();
        }
    }

    fn park_putter(&self, cx: &Context<'_>) {
        *self.putter.borrow_mut() = Some(cx.waker().clone());
    }

    fn park_getter(&self, cx: &Context<'_>) {
        *self.getter.borrow_mut() = Some(cx.waker().clone());
    }
}

impl<T> Default for PortState<T>
where
    T: SimObject,
{
    fn default() -> Self {
        Self::new()
    }
}

/// The receiving end of a link. Owns the shared state; the sender connects
/// to it.
pub struct InPort<T>
where
    T: SimObject,
{
    pub entity: Arc<Entity>,
    state: Rc<PortState<T>>,
}

impl<T> fmt::Display for InPort<T>
where
    T: SimObject,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.entity.fmt(f)
    }
}

impl<T> InPort<T>
where
    T: SimObject,
{
    pub fn new(entity: &Arc<Entity>) -> Self {
        Self {
            entity: entity.clone(),
            state: Rc::new(PortState::new()),
        }
    }

    /// The shared state, for handing to the sender's `connect`.
    pub fn state(&self) -> Rc<PortState<T>> {
        self.state.clone()
    }

    /// Take the next value, acknowledging the sender as it is taken.
    pub fn get(&self) -> GetFuture<T> {
        GetFuture {
            state: self.state.clone(),
            done: false,
        }
    }

    /// Take the next value while leaving the sender's `put` incomplete.
    /// Every `start_get` must be balanced by a [finish_get](Self::finish_get).
    pub fn start_get(&self) -> StartGetFuture<T> {
        StartGetFuture {
            state: self.state.clone(),
            done: false,
        }
    }

    /// Release the sender held by an earlier `start_get`.
    pub fn finish_get(&self) {
        self.state.wake_putter();
    }
}

/// The sending end of a link. Unconnected until [connect](Self::connect) is
/// given the receiver's state.
pub struct OutPort<T>
where
    T: SimObject,
{
    entity: Arc<Entity>,
    name: String,
    state: Option<Rc<PortState<T>>>,
}

impl<T> fmt::Display for OutPort<T>
where
    T: SimObject,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.entity.fmt(f)
    }
}

impl<T> OutPort<T>
where
    T: SimObject,
{
    pub fn new(entity: &Arc<Entity>, name: &str) -> Self {
        Self {
            entity: entity.clone(),
            name: name.to_owned(),
            state: None,
        }
    }

    /// Wiring is one-shot; a second `connect` is a model-build bug.
    pub fn connect(&mut self, port_state: Rc<PortState<T>>) {
        match self.state {
            Some(_) => panic!("{}: {} already connected", self.entity, self.name),
            None => {
                self.state = Some(port_state);
            }
        }
    }

    fn connected_state(&self) -> Rc<PortState<T>> {
        self.state
            .as_ref()
            .unwrap_or_else(|| panic!("{}: {} not connected", self.entity, self.name))
            .clone()
    }

    /// Send one value. The returned future completes only when the
    /// receiver has consumed it.
    pub fn put(&self, value: T) -> PutFuture<T> {
        PutFuture {
            state: self.connected_state(),
            value: RefCell::new(Some(value)),
            done: RefCell::new(false),
        }
    }

    /// Wait until the receiver is actively asking for a value, without
    /// committing one yet.
    pub fn try_put(&self) -> TryPutFuture<T> {
        TryPutFuture {
            state: self.connected_state(),
            done: false,
        }
    }
}

/// Future returned by [OutPort::put].
pub struct PutFuture<T>
where
    T: SimObject,
{
    state: Rc<PortState<T>>,
    value: RefCell<Option<T>>,
    done: RefCell<bool>,
}

impl<T> Future for PutFuture<T>
where
    T: SimObject,
{
    type Output = SimResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.state.slot.borrow().is_some() {
            // A previous value is still in flight on this link
            self.state.park_putter(cx);
            return Poll::Pending;
        }
        match self.value.take() {
            Some(value) => {
                // Hand the value over, then park until the receiver takes it
                *self.state.slot.borrow_mut() = Some(value);
                self.state.wake_getter();
                self.state.park_putter(cx);
                Poll::Pending
            }
            None => {
                // Re-polled after consumption: the handshake is complete
                *self.done.borrow_mut() = true;
                Poll::Ready(Ok(()))
            }
        }
    }
}

impl<T> FusedFuture for PutFuture<T>
where
    T: SimObject,
{
    fn is_terminated(&self) -> bool {
        *self.done.borrow()
    }
}

/// Future returned by [OutPort::try_put].
pub struct TryPutFuture<T>
where
    T: SimObject,
{
    state: Rc<PortState<T>>,
    done: bool,
}

impl<T> Future for TryPutFuture<T>
where
    T: SimObject,
{
    type Output = SimResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.state.getter.borrow().is_some() {
            self.done = true;
            Poll::Ready(Ok(()))
        } else {
            self.state.park_putter(cx);
            Poll::Pending
        }
    }
}

impl<T> FusedFuture for TryPutFuture<T>
where
    T: SimObject,
{
    fn is_terminated(&self) -> bool {
        self.done
    }
}

/// Future returned by [InPort::get].
pub struct GetFuture<T>
where
    T: SimObject,
{
    state: Rc<PortState<T>>,
    done: bool,
}

impl<T> Future for GetFuture<T>
where
    T: SimObject,
{
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let taken = self.state.slot.borrow_mut().take();
        match taken {
            Some(value) => {
                self.done = true;
                self.state.wake_putter();
                Poll::Ready(value)
            }
            None => {
                // A sender parked behind an earlier value gets another go
                self.state.wake_putter();
                self.state.park_getter(cx);
                Poll::Pending
            }
        }
    }
}

impl<T> FusedFuture for GetFuture<T>
where
    T: SimObject,
{
    fn is_terminated(&self) -> bool {
        self.done
    }
}

/// Future returned by [InPort::start_get]: takes the value but keeps the
/// sender parked until `finish_get`.
pub struct StartGetFuture<T>
where
    T: SimObject,
{
    state: Rc<PortState<T>>,
    done: bool,
}

impl<T> Future for StartGetFuture<T>
where
    T: SimObject,
{
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let taken = self.state.slot.borrow_mut().take();
        match taken {
            Some(value) => {
                self.done = true;
                Poll::Ready(value)
            }
            None => {
                self.state.park_getter(cx);
                Poll::Pending
            }
        }
    }
}

impl<T> FusedFuture for StartGetFuture<T>
where
    T: SimObject,
{
    fn is_terminated(&self) -> bool {
        self.done
    }
}
