// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! Fabric components for the WEFT interconnect model.
//!
//! The building blocks (buffers, arbiters, switches, flow control) each model
//! one hardware structure, and [fabric](crate::fabric) assembles them into
//! the full tiled hierarchy with its separate data and credit sub-networks.

pub mod arbiter;
pub mod config;
pub mod connect;
pub mod fabric;
pub mod fifo;
pub mod flow;
pub mod sink;
pub mod source;
pub mod store;
pub mod switch;
pub mod types;
pub mod wire;
