// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! Link pacing between two components.
//!
//! Holds each value for a fixed number of clock ticks before acknowledging
//! the sender, which models a link that carries one item per `n` cycles.
//!
//! # Ports
//!
//! This component has two ports
//!  - One [input port](weft_engine::port::InPort): `rx`
//!  - One [output port](weft_engine::port::OutPort): `tx`

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use weft_engine::port::{InPort, OutPort, PortState};
use weft_engine::time::clock::Clock;
use weft_engine::traits::SimObject;
use weft_engine::types::SimResult;
use weft_model_builder::EntityDisplay;
use weft_track::entity::Entity;
use weft_track::{enter, exit};

use crate::{connect_tx, port_rx, take_option};

struct LimiterState<T>
where
    T: SimObject,
{
    clock: Clock,
    ticks_per_item: u64,
    tx: RefCell<Option<OutPort<T>>>,
    rx: RefCell<Option<InPort<T>>>,
}

/// Allows one value through per `ticks_per_item` cycles.
#[derive(Clone, EntityDisplay)]
pub struct Limiter<T>
where
    T: SimObject,
{
    pub entity: Arc<Entity>,
    state: Rc<LimiterState<T>>,
}

impl<T> Limiter<T>
where
    T: SimObject,
{
    #[must_use]
    pub fn new(parent: &Arc<Entity>, name: &str, clock: Clock, ticks_per_item: u64) -> Self {
        let entity = Arc::new(Entity::new(parent, name));
        let state = Rc::new(LimiterState {
            clock,
            ticks_per_item,
            tx: RefCell::new(Some(OutPort::new(&entity, "tx"))),
            rx: RefCell::new(Some(InPort::new(&entity))),
        });
        Self { entity, state }
    }

    pub fn connect_port_tx(&self, port_state: Rc<PortState<T>>) {
        connect_tx!(self.state.tx, connect ; port_state);
    }

    #[must_use]
    pub fn port_rx(&self) -> Rc<PortState<T>> {
        port_rx!(self.state.rx, state)
    }

    pub async fn run(&self) -> SimResult {
        let rx = take_option!(self.state.rx);
        let tx = take_option!(self.state.tx);
        loop {
            // Get the value but without letting the sender's put complete
            let value = rx.start_get().await;

            let value_tag = value.tag();
            enter!(self.entity ; value_tag);

            tx.put(value).await?;
            self.state.clock.wait_ticks(self.state.ticks_per_item).await;
            exit!(self.entity ; value_tag);

            // Allow the sender's put to complete
            rx.finish_get();
        }
    }
}

#[cfg(test)]
mod tests {
    use weft_engine::run_simulation;
    use weft_engine::test_helpers::start_test;

    use super::*;
    use crate::sink::Sink;
    use crate::source::Source;
    use crate::{connect_port, option_box_repeat};

    #[test]
    fn one_item_per_two_ticks() {
        let mut engine = start_test(file!());
        let clock = engine.default_clock();

        let source = Source::new(engine.top(), "source", option_box_repeat!(1; 5));
        let limiter = Limiter::new(engine.top(), "limiter", clock, 2);
        let sink = Sink::new(engine.top(), "sink");

        connect_port!(source, tx => limiter, rx);
        connect_port!(limiter, tx => sink, rx);

        run_simulation!(engine ; [source, limiter, sink]);

        assert_eq!(sink.num_sunk(), 5);
        // 5 items at one per 2 ticks of the 1 GHz clock
        assert!(engine.time_now_ns() >= 10.0);
    }
}
