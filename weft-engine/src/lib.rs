// Copyright (c) 2026 The Weft Authors. All rights reserved.

#![doc(test(attr(warn(unused))))]

//! `WEFT` - a discrete-event engine for modelling on-chip interconnect
//! fabrics.
//!
//! This library provides the core of the [WEFT Engine](crate::engine) which
//! executes event driven asynchronous simulation components. The fabric
//! components themselves (buffers, arbiters, crossbars, flow control) live in
//! the `weft-fabric` crate.
//!
//! # Simple Application
//!
//! A component is a `Clone`-able struct with an `async fn run(&self) ->
//! SimResult`. Components communicate through rendezvous
//! [ports](crate::port): an [`OutPort`](crate::port::OutPort) `put` only
//! completes once the connected [`InPort`](crate::port::InPort) has consumed
//! the value, which is how downstream readiness propagates upstream.
//!
//! Simulations can be run as purely event driven (where one event triggers one
//! or more others) or the use of clocks can be introduced to model time. The
//! combination of both is the most common.
//!
//! The [engine](crate::engine::Engine) manages the
//! [clocks](crate::time::clock). Each clock tick has two phases so that
//! state-updating work and decision-making work within one cycle can be
//! ordered explicitly.

pub mod engine;
pub mod events;
pub mod executor;
pub mod port;
pub mod test_helpers;
pub mod time;
pub mod traits;
pub mod types;

#[macro_export]
/// Spawn the `run()` of every component and rebind the names to clones.
///
/// Components are passed either as `Vec`s of like components or, inside
/// `[...]`, as single components. After the macro the original names hold
/// clones, so counters and other read-only state stay inspectable once
/// the simulation has finished.
macro_rules! spawn_simulation {
    ($engine:ident ; $($vec:ident),* $(,)?) => {
        $(
        let $vec = $vec
            .drain(..)
            .map(|component| {
                let handle = component.clone();
                $engine.spawn(async move { component.run().await });
                handle
            })
            .collect::<Vec<_>>();

        // Not every test inspects every component afterwards
        let _ = $vec;
        )*
    };
    ($engine:ident ; $($vec:ident),* $(,)* [$($single:ident),* $(,)?]) => {
        $crate::spawn_simulation!($engine ; $($vec,)*);

        $(
        let handle = $single.clone();
        $engine.spawn(async move { $single.run().await });
        let $single = handle;
        let _ = $single;
        )*
    };
}

#[macro_export]
/// Spawn all component `run()` functions and run the simulation to
/// completion.
///
/// The forms taking an error string expect the run to fail with exactly
/// that message, and panic when it succeeds instead.
macro_rules! run_simulation {
    (@expect $engine:ident, $error:expr) => {
        match $engine.run() {
            Ok(()) => panic!("Expected an error!"),
            Err(e) => assert_eq!(format!("{e}").as_str(), $error),
        }
    };
    ($engine:ident) => {
        $engine.run().unwrap();
    };
    ($engine:ident ; $($vec:ident),* $(,)?) => {
        $crate::spawn_simulation!($engine ; $($vec,)*);
        $engine.run().unwrap();
    };
    ($engine:ident ; $($vec:ident),* $(,)? [$($single:ident),* $(,)?]) => {
        $crate::spawn_simulation!($engine ; $($vec,)* , [$($single,)*]);
        $engine.run().unwrap();
    };
    ($engine:ident, $error:expr) => {
        $crate::run_simulation!(@expect $engine, $error);
    };
    ($engine:ident, $error:expr ; $($vec:ident),* $(,)?) => {
        $crate::spawn_simulation!($engine ; $($vec,)*);
        $crate::run_simulation!(@expect $engine, $error);
    };
    ($engine:ident, $error:expr ; $($vec:ident),* $(,)? [$($single:ident),* $(,)?]) => {
        $crate::spawn_simulation!($engine ; $($vec,)* , [$($single,)*]);
        $crate::run_simulation!(@expect $engine, $error);
    };
}

#[macro_export]
/// Spawn a sub-component held in a `RefCell<Option<..>>`, taking it out
/// of the option in the process.
macro_rules! spawn_subcomponent {
    ($($spawner:ident).+ ; $($slot:ident).+) => {
        let sub = $($slot).+.borrow_mut().take().unwrap();
        $($spawner).+.spawn(async move { sub.run().await } );
    };
}
