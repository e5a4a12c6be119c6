// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! A traffic source.
//!
//! Injects whatever its [DataGenerator] yields, one value per downstream
//! acknowledgement, then finishes. Tests use it as the compute side of a
//! channel: a scripted stream of flits or bare payloads driven into an
//! arbiter, a limiter or a credit gate.
//!
//! # Ports
//!
//! This component has one port:
//!  - One [output port](weft_engine::port::OutPort): `tx`

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use weft_engine::port::{OutPort, PortState};
use weft_engine::traits::SimObject;
use weft_engine::types::SimResult;
use weft_model_builder::EntityDisplay;
use weft_track::entity::Entity;
use weft_track::exit;

/// A generator that repeats one value a fixed number of times, boxed the
/// way [Source::new] wants it.
#[macro_export]
macro_rules! option_box_repeat {
    ($value:expr ; $repeat:expr) => {
        Some(Box::new(std::iter::repeat($value).take($repeat)))
    };
}

/// Chain two boxed generators into one.
#[macro_export]
macro_rules! option_box_chain {
    ($value1:expr , $value2:expr) => {
        Some(Box::new((*($value1.unwrap())).chain(*($value2.unwrap()))))
    };
}

use crate::types::DataGenerator;
use crate::{connect_tx, take_option};

struct SourceState<T>
where
    T: SimObject,
{
    generator: RefCell<Option<DataGenerator<T>>>,
    tx: RefCell<Option<OutPort<T>>>,
}

#[derive(Clone, EntityDisplay)]
pub struct Source<T>
where
    T: SimObject,
{
    pub entity: Arc<Entity>,
    state: Rc<SourceState<T>>,
}

impl<T> Source<T>
where
    T: SimObject,
{
    pub fn new(parent: &Arc<Entity>, name: &str, generator: Option<DataGenerator<T>>) -> Self {
        let entity = Arc::new(Entity::new(parent, name));
        let state = SourceState {
            generator: RefCell::new(generator),
            tx: RefCell::new(Some(OutPort::new(&entity, "tx"))),
        };
        Self {
            entity,
            state: Rc::new(state),
        }
    }

    /// Replace the traffic script before the source is run.
    pub fn set_generator(&self, generator: Option<DataGenerator<T>>) {
        *self.state.generator.borrow_mut() = generator;
    }

    pub fn connect_port_tx(&self, port_state: Rc<PortState<T>>) {
        connect_tx!(self.state.tx, connect ; port_state);
    }

    pub async fn run(&self) -> SimResult {
        // A source without a script has nothing to inject
        let Some(mut generator) = self.state.generator.borrow_mut().take() else {
            return Ok(());
        };

        let tx = take_option!(self.state.tx);
        while let Some(value) = generator.next() {
            exit!(self.entity ; value.tag());
            tx.put(value).await?;
        }
        Ok(())
    }
}
