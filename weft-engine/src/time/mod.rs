// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! Simulation time: clocks with two-phase ticks, and the overall time owner.

pub mod clock;
pub mod simtime;
