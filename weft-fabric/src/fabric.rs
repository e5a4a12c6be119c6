// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! The assembled fabric.
//!
//! A [Fabric] instantiates the full hierarchy for a configured tile grid:
//! per-endpoint flow control, send queues and credit buffers, a data
//! crossbar and a credit crossbar per tile, a 5-port mesh router per tile
//! on each of the two sub-networks, and absorbers for traffic that leaves
//! the east or south edge of the grid.
//!
//! Compute-side code never touches ports directly; it talks to the fabric
//! through [Endpoint] handles, whose operations are all zero-time.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use itertools::iproduct;
use weft_engine::events::repeated::Repeated;
use weft_engine::executor::Spawner;
use weft_engine::port::{OutPort, PortState};
use weft_engine::time::clock::Clock;
use weft_engine::traits::Event;
use weft_engine::types::{SimError, SimResult};
use weft_model_builder::EntityDisplay;
use weft_track::entity::Entity;
use weft_track::trace;

use crate::arbiter::{Arbitrate, RoundRobinPolicy, WormholePolicy};
use crate::config::FabricConfig;
use crate::connect_tx;
use crate::fifo::NetworkFifo;
use crate::flow::{EndpointCounters, FlowControlIn, FlowControlOut};
use crate::sink::Sink;
use crate::store::Store;
use crate::switch::{Crossbar, MeshRoute, TableRoute, EAST, LOCAL, NORTH, SOUTH, WEST};
use crate::types::{ChannelId, Flit};

/// Pump between an endpoint's bounded send queue and its flow-control
/// sender. The pump holds the queue head while the sender is blocked on
/// credits, so the queue itself never observes back-pressure.
#[derive(Clone, EntityDisplay)]
struct SendQueue {
    pub entity: Arc<Entity>,
    queue: NetworkFifo<Flit>,
    tx: Rc<std::cell::RefCell<Option<OutPort<Flit>>>>,
}

impl SendQueue {
    fn new(parent: &Arc<Entity>, name: &str, capacity: usize) -> Self {
        let entity = Arc::new(Entity::new(parent, name));
        let queue = NetworkFifo::new(&entity, "queue", capacity);
        let tx = Rc::new(std::cell::RefCell::new(Some(OutPort::new(&entity, "tx"))));
        Self { entity, queue, tx }
    }

    fn queue(&self) -> NetworkFifo<Flit> {
        self.queue.clone()
    }

    fn connect_port_tx(&self, port_state: Rc<PortState<Flit>>) {
        connect_tx!(self.tx, connect ; port_state);
    }

    async fn run(&self) -> SimResult {
        let tx = crate::take_option!(self.tx);
        loop {
            match self.queue.read() {
                Some(flit) => tx.put(flit).await?,
                None => {
                    self.queue.data_arrived().listen().await;
                }
            }
        }
    }
}

/// Absorber for traffic leaving the grid. Behaves like an always-draining
/// endpoint: whatever arrives is claimed, buffered, and drained in zero
/// time, with credits returned to the claimant as normal.
#[derive(Clone, EntityDisplay)]
struct OffChip {
    pub entity: Arc<Entity>,
    spawner: Spawner,
    receiver: FlowControlIn,
}

impl OffChip {
    fn new(
        parent: &Arc<Entity>,
        name: &str,
        spawner: Spawner,
        clock: Clock,
        buffer_depth: usize,
    ) -> Self {
        let entity = Arc::new(Entity::new(parent, name));
        let counters = Rc::new(EndpointCounters::default());
        let receiver = FlowControlIn::new(&entity, "fc_in", spawner.clone(), clock, buffer_depth, counters);
        Self {
            entity,
            spawner,
            receiver,
        }
    }

    async fn run(&self) -> SimResult {
        {
            let receiver = self.receiver.clone();
            self.spawner.spawn(async move { receiver.run().await });
        }
        loop {
            match self.receiver.drain() {
                Some(payload) => {
                    trace!(self.entity ; "absorbed {:#x}", payload);
                }
                None => {
                    self.receiver.data_arrived().listen().await;
                }
            }
        }
    }
}

struct Tile {
    senders: Vec<FlowControlOut>,
    receivers: Vec<FlowControlIn>,
    queues: Vec<SendQueue>,
    credit_bufs: Vec<Store<Flit>>,
    counters: Vec<Rc<EndpointCounters>>,
    data_xbar: Crossbar<Flit>,
    credit_xbar: Crossbar<Flit>,
    data_router: Crossbar<Flit>,
    credit_router: Crossbar<Flit>,
}

/// The interface handed to compute-side code for one fabric channel.
///
/// All operations complete in zero simulated time; occupancy and credit
/// effects play out in the fabric's own tasks.
#[derive(Clone)]
pub struct Endpoint {
    id: ChannelId,
    queue: NetworkFifo<Flit>,
    receiver: FlowControlIn,
    counters: Rc<EndpointCounters>,
}

impl Endpoint {
    #[must_use]
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Claim the destination channel for this endpoint. Tears down whatever
    /// claim the destination previously held.
    pub fn claim(&self, dest: ChannelId) -> Result<(), Flit> {
        self.push(Flit::claim(self.id, dest, true))
    }

    /// Queue one data flit for sending. Returns the flit back when the send
    /// queue is full; the caller retries after [send_space](Self::send_space).
    pub fn enqueue(&self, dest: ChannelId, payload: u64, eop: bool) -> Result<(), Flit> {
        self.push(Flit::data(payload, dest, eop))
    }

    fn push(&self, flit: Flit) -> Result<(), Flit> {
        if !self.queue.can_write() {
            return Err(flit);
        }
        // Guarded by the capacity check, so the write cannot fail
        self.queue.write(flit).map_err(|_| flit)
    }

    /// Take the oldest received payload, if any.
    pub fn drain(&self) -> Option<u64> {
        self.receiver.drain()
    }

    /// Fires when the send queue frees a slot.
    #[must_use]
    pub fn send_space(&self) -> Repeated<usize> {
        self.queue.space_freed()
    }

    /// Fires when a received payload becomes available to drain.
    #[must_use]
    pub fn data_arrived(&self) -> Repeated<usize> {
        self.receiver.data_arrived()
    }

    #[must_use]
    pub fn counters(&self) -> &EndpointCounters {
        &self.counters
    }
}

/// The full interconnect model for one chip.
#[derive(Clone, EntityDisplay)]
pub struct Fabric {
    pub entity: Arc<Entity>,
    spawner: Spawner,
    config: FabricConfig,
    state: Rc<FabricState>,
}

struct FabricState {
    tiles: Vec<Tile>,
    offchip: Vec<OffChip>,
    offchip_credit_bufs: Vec<Store<Flit>>,
    credit_sinks: Vec<Sink<Flit>>,
}

impl Fabric {
    pub fn new(
        parent: &Arc<Entity>,
        name: &str,
        spawner: Spawner,
        clock: Clock,
        config: FabricConfig,
    ) -> Result<Self, SimError> {
        config.validate()?;
        let entity = Arc::new(Entity::new(parent, name));

        let cols = usize::from(config.tile_cols);
        let rows = usize::from(config.tile_rows);

        let mut tiles = Vec::with_capacity(cols * rows);
        for (y, x) in iproduct!(0..rows, 0..cols) {
            tiles.push(build_tile(
                &entity,
                &spawner,
                &clock,
                &config,
                x as u8,
                y as u8,
            ));
        }

        // Mesh links between neighbouring tiles, one in each direction per
        // sub-network
        for (y, x) in iproduct!(0..rows, 0..cols) {
            let here = y * cols + x;
            if x + 1 < cols {
                let east = here + 1;
                link(&tiles[here].data_router, EAST, &tiles[east].data_router, WEST);
                link(&tiles[east].data_router, WEST, &tiles[here].data_router, EAST);
                link(&tiles[here].credit_router, EAST, &tiles[east].credit_router, WEST);
                link(&tiles[east].credit_router, WEST, &tiles[here].credit_router, EAST);
            }
            if y + 1 < rows {
                let south = here + cols;
                link(&tiles[here].data_router, SOUTH, &tiles[south].data_router, NORTH);
                link(&tiles[south].data_router, NORTH, &tiles[here].data_router, SOUTH);
                link(&tiles[here].credit_router, SOUTH, &tiles[south].credit_router, NORTH);
                link(&tiles[south].credit_router, NORTH, &tiles[here].credit_router, SOUTH);
            }
        }

        // The east and south edges lead off-chip. Data leaving the grid is
        // absorbed; the absorber's credits come back in on the matching
        // credit-router boundary input. Credits somehow addressed off the
        // grid are sunk.
        let mut offchip = Vec::new();
        let mut offchip_credit_bufs = Vec::new();
        let mut credit_sinks = Vec::new();
        let mut edge = |tile: &Tile, port: usize, name: String| {
            let absorber = OffChip::new(
                &entity,
                &name,
                spawner.clone(),
                clock.clone(),
                config.buffer_depth,
            );
            tile.data_router
                .connect_port_tx_i(port, absorber.receiver.port_rx());

            // The absorber's credits come back in through a boundary credit
            // buffer on the same router port its data left by
            let credit_buf = Store::new(
                &entity,
                format!("{name}_credit_buf").as_str(),
                spawner.clone(),
                config.credit_buffer_depth,
            );
            absorber
                .receiver
                .connect_port_credit_tx(credit_buf.port_rx());
            credit_buf.connect_port_tx(tile.credit_router.port_rx_i(port));

            let sink = Sink::new(&entity, format!("{name}_credit_sink").as_str());
            tile.credit_router.connect_port_tx_i(port, sink.port_rx());

            offchip.push(absorber);
            offchip_credit_bufs.push(credit_buf);
            credit_sinks.push(sink);
        };
        for y in 0..rows {
            let here = y * cols + (cols - 1);
            edge(&tiles[here], EAST, format!("offchip_e{y}"));
        }
        for x in 0..cols {
            let here = (rows - 1) * cols + x;
            edge(&tiles[here], SOUTH, format!("offchip_s{x}"));
        }

        Ok(Self {
            entity,
            spawner,
            config,
            state: Rc::new(FabricState {
                tiles,
                offchip,
                offchip_credit_bufs,
                credit_sinks,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &FabricConfig {
        &self.config
    }

    /// The handle for one channel, or `None` if `id` is outside the
    /// configured geometry.
    #[must_use]
    pub fn endpoint(&self, id: ChannelId) -> Option<Endpoint> {
        if id.tile_x >= self.config.tile_cols || id.tile_y >= self.config.tile_rows {
            return None;
        }
        if usize::from(id.component) >= self.config.components_per_tile()
            || id.channel >= self.config.channels_per_component
        {
            return None;
        }
        let tile = usize::from(id.tile_y) * usize::from(self.config.tile_cols)
            + usize::from(id.tile_x);
        let e = usize::from(id.component) * usize::from(self.config.channels_per_component)
            + usize::from(id.channel);
        let tile = &self.state.tiles[tile];
        Some(Endpoint {
            id,
            queue: tile.queues[e].queue(),
            receiver: tile.receivers[e].clone(),
            counters: tile.counters[e].clone(),
        })
    }

    pub async fn run(&self) -> SimResult {
        for tile in &self.state.tiles {
            for sender in &tile.senders {
                let sender = sender.clone();
                self.spawner.spawn(async move { sender.run().await });
            }
            for receiver in &tile.receivers {
                let receiver = receiver.clone();
                self.spawner.spawn(async move { receiver.run().await });
            }
            for queue in &tile.queues {
                let queue = queue.clone();
                self.spawner.spawn(async move { queue.run().await });
            }
            for buf in &tile.credit_bufs {
                let buf = buf.clone();
                self.spawner.spawn(async move { buf.run().await });
            }
            for xbar in [
                &tile.data_xbar,
                &tile.credit_xbar,
                &tile.data_router,
                &tile.credit_router,
            ] {
                let xbar = xbar.clone();
                self.spawner.spawn(async move { xbar.run().await });
            }
        }
        for absorber in &self.state.offchip {
            let absorber = absorber.clone();
            self.spawner.spawn(async move { absorber.run().await });
        }
        for buf in &self.state.offchip_credit_bufs {
            let buf = buf.clone();
            self.spawner.spawn(async move { buf.run().await });
        }
        for sink in &self.state.credit_sinks {
            let sink = sink.clone();
            self.spawner.spawn(async move { sink.run().await });
        }
        Ok(())
    }
}

fn link(from: &Crossbar<Flit>, from_port: usize, to: &Crossbar<Flit>, to_port: usize) {
    from.connect_port_tx_i(from_port, to.port_rx_i(to_port));
}

fn build_tile(
    parent: &Arc<Entity>,
    spawner: &Spawner,
    clock: &Clock,
    config: &FabricConfig,
    x: u8,
    y: u8,
) -> Tile {
    let entity = Arc::new(Entity::new(parent, format!("tile{x}_{y}").as_str()));
    let num_endpoints = config.endpoints_per_tile();
    let channels = usize::from(config.channels_per_component);

    // Local destinations map straight to a crossbar output; everything else
    // takes the uplink to the mesh router
    let mut table = HashMap::new();
    for e in 0..num_endpoints {
        let id = ChannelId::new(x, y, (e / channels) as u8, (e % channels) as u8);
        table.insert(u64::from(id.flatten()), e);
    }
    let local_route = Rc::new(TableRoute::new(table, Some(num_endpoints)));

    let wormhole_rr = || -> Box<dyn Arbitrate<Flit>> {
        Box::new(WormholePolicy::new(RoundRobinPolicy::new()))
    };
    let plain_rr = || -> Box<dyn Arbitrate<Flit>> { Box::new(RoundRobinPolicy::new()) };

    let data_xbar = Crossbar::new(
        &entity,
        "data_xbar",
        spawner.clone(),
        num_endpoints + 1,
        num_endpoints + 1,
        local_route.clone(),
        wormhole_rr,
        Some(clock.clone()),
    );
    let credit_xbar = Crossbar::new(
        &entity,
        "credit_xbar",
        spawner.clone(),
        num_endpoints + 1,
        num_endpoints + 1,
        local_route,
        plain_rr,
        Some(clock.clone()),
    );

    let mesh_route = Rc::new(MeshRoute::new(x, y));
    let data_router = Crossbar::new(
        &entity,
        "data_router",
        spawner.clone(),
        crate::switch::NUM_ROUTER_PORTS,
        crate::switch::NUM_ROUTER_PORTS,
        mesh_route.clone(),
        wormhole_rr,
        Some(clock.clone()),
    );
    let credit_router = Crossbar::new(
        &entity,
        "credit_router",
        spawner.clone(),
        crate::switch::NUM_ROUTER_PORTS,
        crate::switch::NUM_ROUTER_PORTS,
        mesh_route,
        plain_rr,
        Some(clock.clone()),
    );

    let mut senders = Vec::with_capacity(num_endpoints);
    let mut receivers = Vec::with_capacity(num_endpoints);
    let mut queues = Vec::with_capacity(num_endpoints);
    let mut credit_bufs = Vec::with_capacity(num_endpoints);
    let mut counters = Vec::with_capacity(num_endpoints);
    for e in 0..num_endpoints {
        let endpoint_counters = Rc::new(EndpointCounters::default());

        let queue = SendQueue::new(&entity, format!("send{e}").as_str(), config.buffer_depth);
        let sender = FlowControlOut::new(
            &entity,
            format!("fc_out{e}").as_str(),
            spawner.clone(),
            clock.clone(),
            config.buffer_depth,
            endpoint_counters.clone(),
        );
        let receiver = FlowControlIn::new(
            &entity,
            format!("fc_in{e}").as_str(),
            spawner.clone(),
            clock.clone(),
            config.buffer_depth,
            endpoint_counters.clone(),
        );

        // Outbound credits get their own shallow buffer so the credit
        // sub-network is store-and-forward end to end, like the data side
        let credit_buf = Store::new(
            &entity,
            format!("credit_buf{e}").as_str(),
            spawner.clone(),
            config.credit_buffer_depth,
        );

        queue.connect_port_tx(sender.port_rx());
        sender.connect_port_tx(data_xbar.port_rx_i(e));
        data_xbar.connect_port_tx_i(e, receiver.port_rx());
        receiver.connect_port_credit_tx(credit_buf.port_rx());
        credit_buf.connect_port_tx(credit_xbar.port_rx_i(e));
        credit_xbar.connect_port_tx_i(e, sender.port_credit_rx());

        senders.push(sender);
        receivers.push(receiver);
        queues.push(queue);
        credit_bufs.push(credit_buf);
        counters.push(endpoint_counters);
    }

    // Crossbar uplink output feeds the mesh router's local input, and the
    // router's local output comes back in on the crossbar's extra input
    data_xbar.connect_port_tx_i(num_endpoints, data_router.port_rx_i(LOCAL));
    data_router.connect_port_tx_i(LOCAL, data_xbar.port_rx_i(num_endpoints));
    credit_xbar.connect_port_tx_i(num_endpoints, credit_router.port_rx_i(LOCAL));
    credit_router.connect_port_tx_i(LOCAL, credit_xbar.port_rx_i(num_endpoints));

    Tile {
        senders,
        receivers,
        queues,
        credit_bufs,
        counters,
        data_xbar,
        credit_xbar,
        data_router,
        credit_router,
    }
}
