// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! Flow-control receiver: the buffered end of a channel.
//!
//! Owns the channel buffer and the identity of whichever sender currently
//! holds the port claim. A companion subtask watches how much the consumer
//! has drained and returns one credit flit per consumed item to the claimant,
//! over the separate credit network. Arrival into a full buffer is fatal: the
//! sender's credit gate should have made it impossible.
//!
//! # Ports
//!
//! This component has two ports:
//!  - One [input port](weft_engine::port::InPort): `rx`
//!  - One [output port](weft_engine::port::OutPort): `credit_tx`

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use weft_engine::executor::Spawner;
use weft_engine::port::{InPort, OutPort, PortState};
use weft_engine::sim_error;
use weft_engine::time::clock::Clock;
use weft_engine::traits::Event;
use weft_engine::types::SimResult;
use weft_model_builder::EntityDisplay;
use weft_track::entity::Entity;
use weft_track::tag::Tagged;
use weft_track::{enter, trace};

use crate::fifo::NetworkFifo;
use crate::types::{ChannelId, Flit};
use crate::{connect_tx, port_rx, take_option};

use super::EndpointCounters;

#[derive(Default)]
struct ConnectionState {
    source: Option<ChannelId>,
    credit_based: bool,
}

struct ReceiverState {
    buffer: NetworkFifo<Flit>,
    connection: RefCell<ConnectionState>,
    credits_sent: Cell<u64>,
    clock: Clock,
    counters: Rc<EndpointCounters>,

    rx: RefCell<Option<InPort<Flit>>>,
    credit_tx: RefCell<Option<OutPort<Flit>>>,
}

#[derive(Clone, EntityDisplay)]
pub struct FlowControlIn {
    pub entity: Arc<Entity>,
    spawner: Spawner,
    state: Rc<ReceiverState>,
}

impl FlowControlIn {
    #[must_use]
    pub fn new(
        parent: &Arc<Entity>,
        name: &str,
        spawner: Spawner,
        clock: Clock,
        buffer_depth: usize,
        counters: Rc<EndpointCounters>,
    ) -> Self {
        let entity = Arc::new(Entity::new(parent, name));
        let state = ReceiverState {
            buffer: NetworkFifo::new(&entity, "buffer", buffer_depth),
            connection: RefCell::new(ConnectionState::default()),
            credits_sent: Cell::new(0),
            clock,
            counters,
            rx: RefCell::new(Some(InPort::new(&entity))),
            credit_tx: RefCell::new(Some(OutPort::new(&entity, "credit_tx"))),
        };
        Self {
            entity,
            spawner,
            state: Rc::new(state),
        }
    }

    #[must_use]
    pub fn port_rx(&self) -> Rc<PortState<Flit>> {
        port_rx!(self.state.rx, state)
    }

    pub fn connect_port_credit_tx(&self, port_state: Rc<PortState<Flit>>) {
        connect_tx!(self.state.credit_tx, connect ; port_state);
    }

    /// Take the oldest buffered payload, if any. Zero-time from the
    /// consumer's point of view; the matching credit returns asynchronously.
    pub fn drain(&self) -> Option<u64> {
        let value = self.state.buffer.read()?;
        EndpointCounters::bump(&self.state.counters.drained);
        Some(value.payload)
    }

    #[must_use]
    pub fn occupancy(&self) -> usize {
        self.state.buffer.len()
    }

    /// Fires whenever a buffered item becomes available to [drain](Self::drain).
    #[must_use]
    pub fn data_arrived(&self) -> weft_engine::events::repeated::Repeated<usize> {
        self.state.buffer.data_arrived()
    }

    /// The sender currently holding this channel's port claim.
    #[must_use]
    pub fn claimant(&self) -> Option<ChannelId> {
        self.state.connection.borrow().source
    }

    pub async fn run(&self) -> SimResult {
        // Credit emitter: one credit per consumed item, addressed to whoever
        // holds the claim at the time the debt is paid
        let credit_tx = take_option!(self.state.credit_tx);
        {
            let entity = self.entity.clone();
            let state = self.state.clone();
            self.spawner.spawn(async move {
                loop {
                    if state.buffer.consumed() <= state.credits_sent.get() {
                        state.buffer.data_arrived().listen().await;
                        continue;
                    }
                    state.credits_sent.set(state.credits_sent.get() + 1);

                    let connection = state.connection.borrow();
                    if let (Some(source), true) = (connection.source, connection.credit_based) {
                        drop(connection);
                        trace!(entity ; "credit to {}", source);
                        EndpointCounters::bump(&state.counters.credits_sent);
                        credit_tx.put(Flit::credit(source)).await?;
                    }
                }
            });
        }

        let rx = take_option!(self.state.rx);
        loop {
            let value = rx.get().await;
            enter!(self.entity ; value.tag());

            if value.port_claim {
                let mut connection = self.state.connection.borrow_mut();
                connection.source = Some(ChannelId::from_flat(value.payload as u32));
                connection.credit_based = value.uses_credits;
                // Anything still buffered belongs to the abandoned circuit
                // and drains creditless; the new claimant's balance only
                // covers slots written after this point
                self.state.credits_sent.set(
                    self.state.buffer.consumed() + self.state.buffer.len() as u64,
                );
                trace!(self.entity ; "claimed by {} (credits {})",
                    connection.source.unwrap(), connection.credit_based);
            } else {
                if !self.state.buffer.can_write() {
                    sim_error!(
                        "{}: buffer overrun at {} ns",
                        self.entity,
                        self.state.clock.time_now_ns()
                    );
                }
                self.state.buffer.write(value)?;
            }
        }
    }
}
