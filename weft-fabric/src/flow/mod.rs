// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! Flow control at the fabric edge.
//!
//! Every sending channel is guarded by a [FlowControlOut] holding the credit
//! balance, and every receiving channel by a [FlowControlIn] owning the
//! channel buffer and returning credits as its consumer drains.

pub mod limiter;
pub mod receiver;
pub mod sender;

pub use limiter::Limiter;
pub use receiver::FlowControlIn;
pub use sender::FlowControlOut;

use std::cell::Cell;

/// Read-only per-endpoint instrumentation.
#[derive(Default)]
pub struct EndpointCounters {
    pub sent: Cell<u64>,
    pub drained: Cell<u64>,
    pub credits_sent: Cell<u64>,
    pub credits_received: Cell<u64>,
}

impl EndpointCounters {
    pub(crate) fn bump(counter: &Cell<u64>) {
        counter.set(counter.get() + 1);
    }
}
