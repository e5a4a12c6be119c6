// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! A data store
//!
//! The [Store] is a component that can hold a number of items defined by its
//! capacity. The [Store] has two ports:
//!   - The `rx` port [InPort] which is used to put data into the store.
//!   - The `tx` port [OutPort] which is used to get data out of the store.
//!
//! A given [Store] is capable of holding any type as long as it implements the
//! [SimObject] trait. This trait has been implemented for a few builtin types
//! like `i32` and `usize` so that they can be used for simple testing.
//!
//! <br>
//!
//! # Connect a store
//!
//! Here is an example of a complete simulation using a [Store] as well as a
//! [Source](crate::source::Source) to put data into the store and a
//! [Sink](crate::sink::Sink) to take the data out of the store.
//!
//! ```rust
//! use weft_engine::engine::Engine;
//! use weft_engine::run_simulation;
//! use weft_fabric::sink::Sink;
//! use weft_fabric::source::Source;
//! use weft_fabric::store::Store;
//! use weft_fabric::{connect_port, option_box_repeat};
//!
//! // Every simulation is based around an `Engine`
//! let mut engine = Engine::default();
//!
//! // A spawner allows components to spawn activity
//! let spawner = engine.spawner.clone();
//!
//! // Take a reference to the engine top to use as the parent
//! let top = engine.top();
//!
//! // Create the basic components:
//! // The simplest use of the source is to inject the same value repeatedly.
//! let source = Source::new(top, "source", option_box_repeat!(1 ; 10));
//! // Create the store - its type will be derived from the connections to its
//! // ports.
//! let store = Store::new(top, "store", spawner, 5);
//! // Create the sink which will pull all of the data items out of the store
//! let sink = Sink::new(top, "sink");
//!
//! // Connect the ports together:
//! // The source will drive data into the store:
//! connect_port!(source, tx => store, rx);
//!
//! // The sink will pull data out of the store
//! connect_port!(store, tx => sink, rx);
//!
//! // The `run_simulation!` macro then spawns all active components
//! // and runs the simulation to completion.
//! run_simulation!(engine ; [source, store, sink]);
//!
//! assert_eq!(sink.num_sunk(), 10);
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;

use weft_engine::events::repeated::Repeated;
use weft_engine::executor::Spawner;
use weft_engine::port::{InPort, OutPort, PortState};
use weft_engine::traits::{Event, SimObject};
use weft_engine::types::SimResult;
use weft_model_builder::EntityDisplay;
use weft_track::entity::Entity;
use weft_track::{enter, exit};

use crate::{connect_tx, port_rx, take_option};

/// The [`State`] of a [`Store`].
struct State<T>
where
    T: SimObject,
{
    entity: Arc<Entity>,
    capacity: usize,
    data: RefCell<VecDeque<T>>,
    level_change: Repeated<usize>,

    tx: RefCell<Option<OutPort<T>>>,
    rx: RefCell<Option<InPort<T>>>,
}

impl<T> State<T>
where
    T: SimObject,
{
    fn new(entity: &Arc<Entity>, capacity: usize) -> Self {
        Self {
            entity: entity.clone(),
            capacity,
            data: RefCell::new(VecDeque::with_capacity(capacity)),
            level_change: Repeated::new(usize::default()),
            tx: RefCell::new(Some(OutPort::new(entity, "tx"))),
            rx: RefCell::new(Some(InPort::new(entity))),
        }
    }

    /// Place an object into the store state.
    ///
    /// There must be room before this is called.
    fn push_value(&self, value: T) {
        enter!(self.entity ; value.tag());
        assert!(self.data.borrow().len() < self.capacity);
        self.data.borrow_mut().push_back(value);
        self.level_change
            .notify_result(self.data.borrow().len())
            .unwrap();
    }

    /// Remove an object from the store state.
    ///
    /// There must be an object available to remove before this is called.
    fn pop_value(&self) -> T {
        let value = self.data.borrow_mut().pop_front().unwrap();
        self.level_change
            .notify_result(self.data.borrow().len())
            .unwrap();
        exit!(self.entity ; value.tag());
        value
    }
}

/// A component that can hold a configurable number of objects.
///
/// Objects must support the [SimObject] trait.
#[derive(Clone, EntityDisplay)]
pub struct Store<T>
where
    T: SimObject,
{
    pub entity: Arc<Entity>,
    spawner: Spawner,
    state: Rc<State<T>>,
}

impl<T> Store<T>
where
    T: SimObject,
{
    /// Basic store constructor
    ///
    /// **Panics** if `capacity` is 0.
    #[must_use]
    pub fn new(parent: &Arc<Entity>, name: &str, spawner: Spawner, capacity: usize) -> Self {
        assert_ne!(capacity, 0, "Unsupported Store with 0 capacity");
        let entity = Arc::new(Entity::new(parent, name));
        let state = Rc::new(State::new(&entity, capacity));
        Self {
            entity,
            spawner,
            state,
        }
    }

    pub fn connect_port_tx(&self, port_state: Rc<PortState<T>>) {
        connect_tx!(self.state.tx, connect ; port_state);
    }

    #[must_use]
    pub fn port_rx(&self) -> Rc<PortState<T>> {
        port_rx!(self.state.rx, state)
    }

    #[must_use]
    pub fn fill_level(&self) -> usize {
        self.state.data.borrow().len()
    }

    #[must_use]
    pub fn get_level_change_event(&self) -> Repeated<usize> {
        self.state.level_change.clone()
    }

    pub async fn run(&self) -> SimResult {
        let rx = take_option!(self.state.rx);
        let state = self.state.clone();
        self.spawner.spawn(async move { run_rx(rx, state).await });

        let tx = take_option!(self.state.tx);
        let state = self.state.clone();
        self.spawner.spawn(async move { run_tx(tx, state).await });
        Ok(())
    }
}

async fn run_rx<T>(rx: InPort<T>, state: Rc<State<T>>) -> SimResult
where
    T: SimObject,
{
    let level_change = state.level_change.clone();
    loop {
        let level = state.data.borrow().len();
        if level < state.capacity {
            let value = rx.get().await;
            state.push_value(value);
        } else {
            level_change.listen().await;
        }
    }
}

async fn run_tx<T>(tx: OutPort<T>, state: Rc<State<T>>) -> SimResult
where
    T: SimObject,
{
    let level_change = state.level_change.clone();
    loop {
        let level = state.data.borrow().len();
        if level > 0 {
            // Wait for something to actually want the store value
            tx.try_put().await?;
            let value = state.pop_value();
            tx.put(value).await?;
        } else {
            level_change.listen().await;
        }
    }
}
