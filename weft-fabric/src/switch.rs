// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! Routing and switching.
//!
//! A [Crossbar] composes one 1-to-M [Distributor] per input with one N-to-1
//! [Arbiter](crate::arbiter::Arbiter) per output. The [Route] implementation
//! decides the output port for each value; the arbiters resolve per-output
//! contention.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use weft_engine::executor::Spawner;
use weft_engine::port::{InPort, OutPort, PortState};
use weft_engine::sim_error;
use weft_engine::time::clock::Clock;
use weft_engine::traits::SimObject;
use weft_engine::types::{SimError, SimResult};
use weft_model_builder::EntityDisplay;
use weft_track::entity::Entity;
use weft_track::{enter, exit, trace};

use crate::arbiter::{Arbiter, Arbitrate};
use crate::take_option;
use crate::types::ChannelId;

/// Mesh router port indices.
pub const LOCAL: usize = 0;
pub const NORTH: usize = 1;
pub const EAST: usize = 2;
pub const SOUTH: usize = 3;
pub const WEST: usize = 4;
pub const NUM_ROUTER_PORTS: usize = 5;

/// Compute the output port for a value arriving on `input`.
///
/// Must be total over the configured topology: an unroutable destination is
/// a configuration error, reported as fatal.
pub trait Route<T>
where
    T: SimObject,
{
    fn route(&self, input: usize, value: &T) -> Result<usize, SimError>;
}

/// Tile-local routing: destination endpoint to local port, anything else to
/// the uplink. With no uplink an unknown destination is fatal.
pub struct TableRoute {
    table: HashMap<u64, usize>,
    uplink: Option<usize>,
}

impl TableRoute {
    #[must_use]
    pub fn new(table: HashMap<u64, usize>, uplink: Option<usize>) -> Self {
        Self { table, uplink }
    }
}

impl<T> Route<T> for TableRoute
where
    T: SimObject,
{
    fn route(&self, _input: usize, value: &T) -> Result<usize, SimError> {
        match self.table.get(&value.dest()) {
            Some(&port) => Ok(port),
            None => match self.uplink {
                Some(port) => Ok(port),
                None => sim_error!("no route to destination {:#x}", value.dest()),
            },
        }
    }
}

/// Dimension-order (X then Y) routing for a mesh router at tile `(x, y)`.
///
/// Destination coordinates beyond the grid keep routing toward the nearest
/// edge, where the boundary port exits off-chip.
pub struct MeshRoute {
    x: u8,
    y: u8,
}

impl MeshRoute {
    #[must_use]
    pub fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }
}

impl<T> Route<T> for MeshRoute
where
    T: SimObject,
{
    fn route(&self, _input: usize, value: &T) -> Result<usize, SimError> {
        let dest = ChannelId::from_flat(value.dest() as u32);
        if dest.tile_x > self.x {
            Ok(EAST)
        } else if dest.tile_x < self.x {
            Ok(WEST)
        } else if dest.tile_y > self.y {
            Ok(SOUTH)
        } else if dest.tile_y < self.y {
            Ok(NORTH)
        } else {
            Ok(LOCAL)
        }
    }
}

struct DistributorState<T>
where
    T: SimObject,
{
    input_index: usize,
    rx: RefCell<Option<InPort<T>>>,
    tx: RefCell<Vec<OutPort<T>>>,
    route: Rc<dyn Route<T>>,
}

/// One-to-M switch stage: reads one input and hands each value to the output
/// its [Route] selects.
#[derive(Clone, EntityDisplay)]
pub struct Distributor<T>
where
    T: SimObject,
{
    pub entity: Arc<Entity>,
    state: Rc<DistributorState<T>>,
}

impl<T> Distributor<T>
where
    T: SimObject,
{
    pub fn new(
        parent: &Arc<Entity>,
        name: &str,
        input_index: usize,
        num_egress: usize,
        route: Rc<dyn Route<T>>,
    ) -> Self {
        let entity = Arc::new(Entity::new(parent, name));
        let mut tx = Vec::with_capacity(num_egress);
        for i in 0..num_egress {
            tx.push(OutPort::new(&entity, format!("tx{i}").as_str()));
        }
        let state = DistributorState {
            input_index,
            rx: RefCell::new(Some(InPort::new(&entity))),
            tx: RefCell::new(tx),
            route,
        };
        Self {
            entity,
            state: Rc::new(state),
        }
    }

    pub fn connect_port_tx_i(&self, i: usize, port_state: Rc<PortState<T>>) {
        match self.state.tx.borrow_mut().get_mut(i) {
            None => {
                panic!("{}: no tx port {}", self.entity, i);
            }
            Some(tx) => tx.connect(port_state),
        };
    }

    pub fn port_rx(&self) -> Rc<PortState<T>> {
        self.state.rx.borrow().as_ref().unwrap().state()
    }

    pub async fn run(&self) -> SimResult {
        let tx: Vec<OutPort<T>> = self.state.tx.borrow_mut().drain(..).collect();
        let rx = take_option!(self.state.rx);
        let route = &self.state.route;

        loop {
            let value = rx.get().await;
            enter!(self.entity ; value.tag());

            let tx_index = route.route(self.state.input_index, &value)?;
            trace!(self.entity ; "route {} to {}", value, tx_index);

            match tx.get(tx_index) {
                None => {
                    sim_error!(
                        "{}: {} routed to invalid output {}",
                        self.entity,
                        value,
                        tx_index
                    );
                }
                Some(tx) => {
                    exit!(self.entity ; value.tag());
                    tx.put(value).await?;
                }
            }
        }
    }
}

struct CrossbarState<T>
where
    T: SimObject,
{
    inputs: Vec<Distributor<T>>,
    outputs: Vec<Arbiter<T>>,
}

/// N-to-M switching fabric, contended per output.
#[derive(Clone, EntityDisplay)]
pub struct Crossbar<T>
where
    T: SimObject,
{
    pub entity: Arc<Entity>,
    spawner: Spawner,
    state: Rc<CrossbarState<T>>,
}

impl<T> Crossbar<T>
where
    T: SimObject,
{
    pub fn new(
        parent: &Arc<Entity>,
        name: &str,
        spawner: Spawner,
        num_inputs: usize,
        num_outputs: usize,
        route: Rc<dyn Route<T>>,
        mut policies: impl FnMut() -> Box<dyn Arbitrate<T>>,
        clock: Option<Clock>,
    ) -> Self {
        let entity = Arc::new(Entity::new(parent, name));

        let outputs: Vec<Arbiter<T>> = (0..num_outputs)
            .map(|o| {
                Arbiter::new(
                    &entity,
                    format!("out{o}").as_str(),
                    spawner.clone(),
                    num_inputs,
                    policies(),
                    clock.clone(),
                )
            })
            .collect();

        let inputs: Vec<Distributor<T>> = (0..num_inputs)
            .map(|i| {
                Distributor::new(
                    &entity,
                    format!("in{i}").as_str(),
                    i,
                    num_outputs,
                    route.clone(),
                )
            })
            .collect();

        // Internal wiring: every input can reach every output
        for (i, input) in inputs.iter().enumerate() {
            for (o, output) in outputs.iter().enumerate() {
                input.connect_port_tx_i(o, output.port_rx_i(i));
            }
        }

        Self {
            entity,
            spawner,
            state: Rc::new(CrossbarState { inputs, outputs }),
        }
    }

    pub fn port_rx_i(&self, i: usize) -> Rc<PortState<T>> {
        self.state.inputs[i].port_rx()
    }

    pub fn connect_port_tx_i(&self, o: usize, port_state: Rc<PortState<T>>) {
        self.state.outputs[o].connect_port_tx(port_state);
    }

    pub async fn run(&self) -> SimResult {
        for input in &self.state.inputs {
            let input = input.clone();
            self.spawner.spawn(async move { input.run().await });
        }
        for output in &self.state.outputs {
            let output = output.clone();
            self.spawner.spawn(async move { output.run().await });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Flit;

    fn flit_to(x: u8, y: u8) -> Flit {
        Flit::data(0, ChannelId::new(x, y, 0, 0), true)
    }

    #[test]
    fn mesh_route_is_x_then_y() {
        let route = MeshRoute::new(1, 1);
        assert_eq!(Route::route(&route, 0, &flit_to(2, 0)).unwrap(), EAST);
        assert_eq!(Route::route(&route, 0, &flit_to(0, 2)).unwrap(), WEST);
        assert_eq!(Route::route(&route, 0, &flit_to(1, 0)).unwrap(), NORTH);
        assert_eq!(Route::route(&route, 0, &flit_to(1, 2)).unwrap(), SOUTH);
        assert_eq!(Route::route(&route, 0, &flit_to(1, 1)).unwrap(), LOCAL);
    }

    #[test]
    fn table_route_uses_uplink() {
        let local = ChannelId::new(0, 0, 1, 0);
        let mut table = HashMap::new();
        table.insert(u64::from(local.flatten()), 1);
        let route = TableRoute::new(table, Some(3));

        let here = Flit::data(0, local, true);
        assert_eq!(Route::route(&route, 0, &here).unwrap(), 1);
        assert_eq!(Route::route(&route, 0, &flit_to(1, 1)).unwrap(), 3);
    }

    #[test]
    fn table_route_without_uplink_is_fatal() {
        let route = TableRoute::new(HashMap::new(), None);
        let err = Route::route(&route, 0, &flit_to(1, 1)).unwrap_err();
        assert!(format!("{err}").contains("no route to destination"));
    }
}
