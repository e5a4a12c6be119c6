// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! Sink component.
//!
//! Consumes and records everything it receives, for use at topology edges
//! that must never back-pressure (for example credit absorbers) and in
//! tests that check delivery order.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use weft_engine::port::{InPort, PortState};
use weft_engine::traits::SimObject;
use weft_engine::types::SimResult;
use weft_model_builder::EntityDisplay;
use weft_track::enter;
use weft_track::entity::Entity;

use crate::{port_rx, take_option};

struct SinkState<T>
where
    T: SimObject,
{
    values: RefCell<Vec<T>>,
    rx: RefCell<Option<InPort<T>>>,
}

#[derive(Clone, EntityDisplay)]
pub struct Sink<T>
where
    T: SimObject,
{
    pub entity: Arc<Entity>,
    state: Rc<SinkState<T>>,
}

impl<T> Sink<T>
where
    T: SimObject,
{
    #[must_use]
    pub fn new(parent: &Arc<Entity>, name: &str) -> Self {
        let entity = Arc::new(Entity::new(parent, name));
        let state = SinkState {
            values: RefCell::new(Vec::new()),
            rx: RefCell::new(Some(InPort::new(&entity))),
        };
        Self {
            entity,
            state: Rc::new(state),
        }
    }

    #[must_use]
    pub fn port_rx(&self) -> Rc<PortState<T>> {
        port_rx!(self.state.rx, state)
    }

    #[must_use]
    pub fn num_sunk(&self) -> usize {
        self.state.values.borrow().len()
    }

    /// Everything received so far, in arrival order.
    #[must_use]
    pub fn values(&self) -> Vec<T> {
        self.state.values.borrow().clone()
    }

    pub async fn run(&self) -> SimResult {
        let rx = take_option!(self.state.rx);
        loop {
            let value = rx.get().await;
            enter!(self.entity ; value.tag());
            self.state.values.borrow_mut().push(value);
        }
    }
}
