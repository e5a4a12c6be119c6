// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! Flow-control sender: the credit gate on a sending channel.
//!
//! Holds a credit balance sized to the peer buffer's capacity. An ordinary
//! flit may only be forwarded once a credit is taken; while the balance is
//! empty the upstream rendezvous is held un-acknowledged, which is what makes
//! a collaborator's send suspend rather than fail. Port-claim flits are
//! control plane: they bypass the gate entirely and refill the balance,
//! because the peer's buffer is known to be empty for the new circuit.
//!
//! # Ports
//!
//! This component has three ports:
//!  - Two [input ports](weft_engine::port::InPort): `rx`, `credit_rx`
//!  - One [output port](weft_engine::port::OutPort): `tx`

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use weft_engine::executor::Spawner;
use weft_engine::port::{InPort, OutPort, PortState};
use weft_engine::sim_error;
use weft_engine::time::clock::Clock;
use weft_engine::types::SimResult;
use weft_model_builder::EntityDisplay;
use weft_resources::base::Resource;
use weft_track::entity::Entity;
use weft_track::tag::Tagged;
use weft_track::{enter, exit, trace};

use crate::types::Flit;
use crate::{connect_tx, port_rx, take_option};

use super::EndpointCounters;

struct SenderState {
    credits: Resource,
    credit_based: Cell<bool>,
    /// Credits still in flight for circuits this sender has abandoned; they
    /// arrive against the refilled balance and are absorbed, not applied.
    stale_credits: Cell<u64>,
    clock: Clock,
    counters: Rc<EndpointCounters>,

    tx: RefCell<Option<OutPort<Flit>>>,
    rx: RefCell<Option<InPort<Flit>>>,
    credit_rx: RefCell<Option<InPort<Flit>>>,
}

#[derive(Clone, EntityDisplay)]
pub struct FlowControlOut {
    pub entity: Arc<Entity>,
    spawner: Spawner,
    state: Rc<SenderState>,
}

impl FlowControlOut {
    #[must_use]
    pub fn new(
        parent: &Arc<Entity>,
        name: &str,
        spawner: Spawner,
        clock: Clock,
        peer_capacity: usize,
        counters: Rc<EndpointCounters>,
    ) -> Self {
        let entity = Arc::new(Entity::new(parent, name));
        let state = SenderState {
            credits: Resource::new(peer_capacity),
            credit_based: Cell::new(true),
            stale_credits: Cell::new(0),
            clock,
            counters,
            tx: RefCell::new(Some(OutPort::new(&entity, "tx"))),
            rx: RefCell::new(Some(InPort::new(&entity))),
            credit_rx: RefCell::new(Some(InPort::new(&entity))),
        };
        Self {
            entity,
            spawner,
            state: Rc::new(state),
        }
    }

    pub fn connect_port_tx(&self, port_state: Rc<PortState<Flit>>) {
        connect_tx!(self.state.tx, connect ; port_state);
    }

    #[must_use]
    pub fn port_rx(&self) -> Rc<PortState<Flit>> {
        port_rx!(self.state.rx, state)
    }

    #[must_use]
    pub fn port_credit_rx(&self) -> Rc<PortState<Flit>> {
        port_rx!(self.state.credit_rx, state)
    }

    /// Credits currently available to spend.
    #[must_use]
    pub fn credits_available(&self) -> usize {
        self.state.credits.available()
    }

    pub async fn run(&self) -> SimResult {
        // Credit return path
        let credit_rx = take_option!(self.state.credit_rx);
        {
            let entity = self.entity.clone();
            let state = self.state.clone();
            self.spawner.spawn(async move {
                loop {
                    let credit = credit_rx.get().await;
                    enter!(entity ; credit.tag());
                    let stale = state.stale_credits.get();
                    if stale > 0 {
                        // A late credit for an abandoned circuit: the old
                        // receiver is still paying off flits we sent it
                        state.stale_credits.set(stale - 1);
                        trace!(entity ; "stale credit absorbed ({} in flight)", stale - 1);
                        continue;
                    }
                    if state.credits.count() == 0 {
                        sim_error!(
                            "{}: credit received with full balance at {} ns",
                            entity,
                            state.clock.time_now_ns()
                        );
                    }
                    state.credits.release().await?;
                    EndpointCounters::bump(&state.counters.credits_received);
                    trace!(entity ; "credit returned ({} available)", state.credits.available());
                }
            });
        }

        let rx = take_option!(self.state.rx);
        let tx = take_option!(self.state.tx);
        let credits = self.state.credits.clone();

        loop {
            // Take the value but keep the upstream put incomplete until the
            // flit has actually left this stage
            let value = rx.start_get().await;
            enter!(self.entity ; value.tag());

            if value.port_claim {
                // Credits the previous circuit still owes will trickle back
                // after the balance refills; mark them stale now
                self.state.stale_credits.set(
                    self.state.stale_credits.get() + credits.count() as u64,
                );
                self.state.credit_based.set(value.uses_credits);
                credits.reset();
                trace!(self.entity ; "claim {} (credits {})", value.dest, value.uses_credits);
            } else if self.state.credit_based.get() {
                credits.request().await;
                trace!(self.entity ; "consume credit ({} left)", credits.available());
            }

            exit!(self.entity ; value.tag());
            tx.put(value).await?;
            EndpointCounters::bump(&self.state.counters.sent);

            rx.finish_get();
        }
    }
}
