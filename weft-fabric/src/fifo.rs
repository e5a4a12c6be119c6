// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! Bounded circular channel buffer with freshness tracking.
//!
//! Each slot carries a "fresh" bit, set on write and cleared on the first
//! read. The monotone [`consumed()`](NetworkFifo::consumed) counter advances
//! once per fresh slot read, which is what lets a credit emitter owe exactly
//! one credit per item drained, never more, never fewer.
//!
//! There are no blocking operations. `write` on a full buffer is an error
//! (callers are required to have reserved capacity through the credit
//! protocol) and `read` on an empty buffer returns `None`; callers re-check
//! on the [`data_arrived`](NetworkFifo::data_arrived) /
//! [`space_freed`](NetworkFifo::space_freed) events.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;

use weft_engine::events::repeated::Repeated;
use weft_engine::sim_error;
use weft_engine::traits::SimObject;
use weft_engine::types::SimResult;
use weft_model_builder::EntityDisplay;
use weft_track::entity::Entity;
use weft_track::{enter, exit};

struct FifoState<T>
where
    T: SimObject,
{
    capacity: usize,
    slots: RefCell<VecDeque<(T, bool)>>,
    consumed: Cell<u64>,
    data_arrived: Repeated<usize>,
    space_freed: Repeated<usize>,
}

#[derive(Clone, EntityDisplay)]
pub struct NetworkFifo<T>
where
    T: SimObject,
{
    pub entity: Arc<Entity>,
    state: Rc<FifoState<T>>,
}

impl<T> NetworkFifo<T>
where
    T: SimObject,
{
    /// **Panics** if `capacity` is 0.
    #[must_use]
    pub fn new(parent: &Arc<Entity>, name: &str, capacity: usize) -> Self {
        assert_ne!(capacity, 0, "Unsupported NetworkFifo with 0 capacity");
        let entity = Arc::new(Entity::new(parent, name));
        Self {
            entity,
            state: Rc::new(FifoState {
                capacity,
                slots: RefCell::new(VecDeque::with_capacity(capacity)),
                consumed: Cell::new(0),
                data_arrived: Repeated::new(usize::default()),
                space_freed: Repeated::new(usize::default()),
            }),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.state.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.slots.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.slots.borrow().is_empty()
    }

    #[must_use]
    pub fn can_read(&self) -> bool {
        !self.is_empty()
    }

    #[must_use]
    pub fn can_write(&self) -> bool {
        self.len() < self.state.capacity
    }

    /// Monotone count of fresh slots read since construction.
    #[must_use]
    pub fn consumed(&self) -> u64 {
        self.state.consumed.get()
    }

    /// Fires with the new occupancy on every write, and again when fresh
    /// data is consumed by a read.
    #[must_use]
    pub fn data_arrived(&self) -> Repeated<usize> {
        self.state.data_arrived.clone()
    }

    /// Fires with the new occupancy on every read.
    #[must_use]
    pub fn space_freed(&self) -> Repeated<usize> {
        self.state.space_freed.clone()
    }

    pub fn write(&self, value: T) -> SimResult {
        if !self.can_write() {
            sim_error!("{}: write to full buffer", self.entity);
        }
        enter!(self.entity ; value.tag());
        self.state.slots.borrow_mut().push_back((value, true));
        self.state.data_arrived.notify_result(self.len())?;
        Ok(())
    }

    /// Remove and return the oldest item.
    pub fn read(&self) -> Option<T> {
        let (value, fresh) = self.state.slots.borrow_mut().pop_front()?;
        exit!(self.entity ; value.tag());
        if fresh {
            self.state.consumed.set(self.state.consumed.get() + 1);
            // Wake anybody accounting for consumption (credit emitters)
            self.state.data_arrived.notify_result(self.len()).unwrap();
        }
        self.state.space_freed.notify_result(self.len()).unwrap();
        Some(value)
    }

    /// Non-destructive look at the oldest item. Leaves the fresh bit set.
    #[must_use]
    pub fn peek(&self) -> Option<T> {
        self.state
            .slots
            .borrow()
            .front()
            .map(|(value, _)| value.clone())
    }
}
