// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! Shared resource primitives.
//!
//! The main user is credit-based flow control: a sender holds a
//! [`Resource`](crate::base::Resource) sized to the receiver's buffer and
//! takes one unit per flit sent, returning it when a credit comes back.

pub mod base;
