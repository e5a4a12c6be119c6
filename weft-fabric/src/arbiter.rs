// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! Perform arbitration between a number of interfaces.
//!
//! The [Arbiter] snapshots simultaneous requests into per-input staging
//! slots, asks its [Arbitrate] policy to pick a winner, and moves exactly one
//! value per round to its output. With a clock attached, one round resolves
//! per falling edge, after state elements have registered on the rising edge.
//!
//! # Ports
//!
//! This component has `N`-input ports and one output:
//!  - N [input ports](weft_engine::port::InPort): `rx[i]` for `i in [0, N-1]`
//!  - One [output port](weft_engine::port::OutPort): `tx`

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use weft_engine::events::once::Once;
use weft_engine::executor::Spawner;
use weft_engine::port::{InPort, OutPort, PortState};
use weft_engine::time::clock::{Clock, PHASE_FALLING};
use weft_engine::traits::{Event, SimObject};
use weft_engine::types::SimResult;
use weft_model_builder::EntityDisplay;
use weft_track::entity::Entity;
use weft_track::{enter, exit, trace};

use crate::take_option;
use crate::types::Framed;

/// An arbitration policy.
///
/// `inputs` is the staging slot per input; the policy takes the winning value
/// out of its slot and returns it with the input index. Policies never
/// suspend: a round that grants nothing returns `None`.
pub trait Arbitrate<T>
where
    T: SimObject,
{
    fn arbitrate(&mut self, entity: &Arc<Entity>, inputs: &mut [Option<T>]) -> Option<(usize, T)>;
}

/// Bounded-waiting fairness: the grant goes to the first requesting input at
/// or after the one following the previous winner.
pub struct RoundRobinPolicy {
    candidate: usize,
}

impl RoundRobinPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self { candidate: 0 }
    }
}

impl Default for RoundRobinPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arbitrate<T> for RoundRobinPolicy
where
    T: SimObject,
{
    fn arbitrate(&mut self, _entity: &Arc<Entity>, inputs: &mut [Option<T>]) -> Option<(usize, T)> {
        let num_inputs = inputs.len();
        for i in 0..num_inputs {
            let index = (i + self.candidate) % num_inputs;
            if let Some(value) = inputs[index].take() {
                self.candidate = (index + 1) % num_inputs;
                return Some((index, value));
            }
        }
        None
    }
}

/// For switching points that the topology proves contention-free: grants
/// whatever is there, lowest index first.
pub struct NullPolicy;

impl<T> Arbitrate<T> for NullPolicy
where
    T: SimObject,
{
    fn arbitrate(&mut self, _entity: &Arc<Entity>, inputs: &mut [Option<T>]) -> Option<(usize, T)> {
        for (index, slot) in inputs.iter_mut().enumerate() {
            if let Some(value) = slot.take() {
                return Some((index, value));
            }
        }
        None
    }
}

/// Wormhole hold around an inner policy.
///
/// Once an input is granted a flit that is not the end of its packet, every
/// following round re-grants that same input until its end-of-packet flit
/// passes, ignoring the inner policy. This gives a multi-flit packet atomic,
/// uninterleaved passage through the switching point.
pub struct WormholePolicy<P> {
    inner: P,
    held: Option<usize>,
}

impl<P> WormholePolicy<P> {
    pub fn new(inner: P) -> Self {
        Self { inner, held: None }
    }
}

impl<T, P> Arbitrate<T> for WormholePolicy<P>
where
    T: SimObject + Framed,
    P: Arbitrate<T>,
{
    fn arbitrate(&mut self, entity: &Arc<Entity>, inputs: &mut [Option<T>]) -> Option<(usize, T)> {
        if let Some(index) = self.held {
            // Held: nothing else may pass, even if this input has no flit yet
            let value = inputs[index].take()?;
            if value.end_of_packet() {
                trace!(entity ; "wormhole release rx{}", index);
                self.held = None;
            }
            return Some((index, value));
        }

        let (index, value) = self.inner.arbitrate(entity, inputs)?;
        if !value.end_of_packet() {
            trace!(entity ; "wormhole hold rx{}", index);
            self.held = Some(index);
        }
        Some((index, value))
    }
}

#[derive(Default)]
struct ArbiterSharedState<T> {
    active: RefCell<Vec<Option<T>>>,
    arbiter_event: RefCell<Option<Once<()>>>,
    waiting_put: Vec<RefCell<Option<Once<()>>>>,
}

impl<T> ArbiterSharedState<T> {
    fn new(capacity: usize) -> Self {
        Self {
            active: RefCell::new((0..capacity).map(|_| None).collect()),
            arbiter_event: RefCell::new(None),
            waiting_put: (0..capacity).map(|_| RefCell::new(None)).collect(),
        }
    }
}

struct ArbiterState<T>
where
    T: SimObject,
{
    rx: RefCell<Vec<Option<InPort<T>>>>,
    tx: RefCell<Option<OutPort<T>>>,
    policy: RefCell<Option<Box<dyn Arbitrate<T>>>>,
    clock: Option<Clock>,
    shared: Rc<ArbiterSharedState<T>>,
}

#[derive(Clone, EntityDisplay)]
pub struct Arbiter<T>
where
    T: SimObject,
{
    pub entity: Arc<Entity>,
    spawner: Spawner,
    state: Rc<ArbiterState<T>>,
}

impl<T> Arbiter<T>
where
    T: SimObject,
{
    /// With `clock` set, one round resolves per falling edge; without it the
    /// arbiter is purely event driven.
    pub fn new(
        parent: &Arc<Entity>,
        name: &str,
        spawner: Spawner,
        num_rx: usize,
        policy: Box<dyn Arbitrate<T>>,
        clock: Option<Clock>,
    ) -> Self {
        let entity = Arc::new(Entity::new(parent, name));
        let rx = (0..num_rx).map(|_| Some(InPort::new(&entity))).collect();
        let tx = OutPort::new(&entity, "tx");
        let state = ArbiterState {
            rx: RefCell::new(rx),
            tx: RefCell::new(Some(tx)),
            policy: RefCell::new(Some(policy)),
            clock,
            shared: Rc::new(ArbiterSharedState::new(num_rx)),
        };
        Self {
            entity,
            spawner,
            state: Rc::new(state),
        }
    }

    pub fn connect_port_tx(&self, port_state: Rc<PortState<T>>) {
        self.state.tx.borrow_mut().as_mut().unwrap().connect(port_state);
    }

    pub fn port_rx_i(&self, i: usize) -> Rc<PortState<T>> {
        self.state.rx.borrow()[i].as_ref().unwrap().state()
    }

    pub async fn run(&self) -> SimResult {
        // Start running the handlers for each input
        for (i, mut rx) in self.state.rx.borrow_mut().drain(..).enumerate() {
            let entity = self.entity.clone();
            let rx = rx.take().unwrap();
            let shared = self.state.shared.clone();
            self.spawner
                .spawn(async move { run_input(entity, rx, i, shared).await });
        }

        let tx = take_option!(self.state.tx);
        let mut policy = take_option!(self.state.policy);
        let shared = &self.state.shared;

        loop {
            let wait_event;
            loop {
                if let Some(clock) = &self.state.clock {
                    clock.next_tick_and_phase(PHASE_FALLING).await;
                }

                let value;
                let wake_event;
                {
                    // Hold the guard for the whole round until the wake event
                    // has been taken
                    let mut active = shared.active.borrow_mut();
                    match policy.arbitrate(&self.entity, &mut active) {
                        Some((i, t)) => {
                            trace!(self.entity ; "grant rx{}: {}", i, t);
                            wake_event = shared.waiting_put[i].borrow_mut().take();
                            value = t;
                        }
                        None => {
                            wait_event = Once::default();
                            trace!(self.entity ; "arb wait");
                            *shared.arbiter_event.borrow_mut() = Some(wait_event.clone());
                            break;
                        }
                    }
                }

                if let Some(event) = wake_event {
                    event.notify()?;
                }
                exit!(self.entity ; value.tag());
                tx.put(value).await?;
            }
            wait_event.listen().await;
        }
    }
}

async fn run_input<T: SimObject>(
    entity: Arc<Entity>,
    rx: InPort<T>,
    input_idx: usize,
    shared: Rc<ArbiterSharedState<T>>,
) -> SimResult {
    loop {
        let value = rx.get().await;
        enter!(entity ; value.tag());

        // Check if this input needs to wait for the previous value to be handled
        let wait_event = match shared.active.borrow()[input_idx].as_ref() {
            Some(_) => {
                let once = Once::default();
                *shared.waiting_put[input_idx].borrow_mut() = Some(once.clone());
                Some(once)
            }
            None => None,
        };
        if let Some(once) = wait_event {
            once.listen().await;
        }

        // Stage the value for this input
        shared.active.borrow_mut()[input_idx] = Some(value);

        // Wake up the arbiter if it has paused on an event
        if let Some(once) = shared.arbiter_event.borrow_mut().take() {
            once.notify()?;
        }
    }
}
