// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! Traits that everything travelling through the fabric model implements.

use core::mem::size_of;
use std::fmt::{Debug, Display};
use std::future::Future;
use std::pin::Pin;

use weft_track::tag::Tagged;

use crate::types::ReqType;

/// Size of an object on the wire.
///
/// Rate limiters charge link time per byte, so anything that crosses a
/// throttled link reports its size through this.
pub trait TotalBytes {
    fn total_bytes(&self) -> usize;
}

/// Anything a router or crossbar can steer.
///
/// `dest` is an opaque endpoint number; how it decomposes into chip, tile
/// and endpoint coordinates is the routing layer's business. `req_type`
/// distinguishes control traffic (claims, credits) from data.
pub trait Routable {
    fn dest(&self) -> u64;
    fn req_type(&self) -> ReqType;
}

/// The bound on everything that moves between components.
///
/// `Clone` rather than `Copy` so payloads can carry `Vec`s; `Debug` and
/// `Display` for trace output; [`Tagged`] so the tracker can follow an
/// object across components; `'static` because spawned futures own their
/// payloads.
pub trait SimObject: Clone + Debug + Display + Routable + Tagged + TotalBytes + 'static {}

// Bare integers qualify as payloads, which keeps component tests free of
// flit construction noise.
macro_rules! impl_sim_payload {
    ($($ty:ty),*) => {
        $(
        impl TotalBytes for $ty {
            fn total_bytes(&self) -> usize {
                size_of::<$ty>()
            }
        }

        impl Routable for $ty {
            fn dest(&self) -> u64 {
                *self as u64
            }
            fn req_type(&self) -> ReqType {
                ReqType::Control
            }
        }

        impl SimObject for $ty {}
        )*
    };
}

impl_sim_payload!(i32, usize);

/// Something that can be listened to.
///
/// `listen` returns a boxed future so heterogeneous events can share a
/// collection; `clone_dyn` lets those boxes be cloned.
pub trait Event<T> {
    #[must_use = "Futures do nothing unless you `.await` or otherwise use them"]
    fn listen(&self) -> BoxFuture<'static, T>;

    fn clone_dyn(&self) -> Box<dyn Event<T>>;
}

impl<T> Clone for Box<dyn Event<T>> {
    fn clone(self: &Box<dyn Event<T>>) -> Box<dyn Event<T>> {
        self.clone_dyn()
    }
}

pub type BoxFuture<'a, T> = Pin<std::boxed::Box<dyn Future<Output = T> + 'a>>;
