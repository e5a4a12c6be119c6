// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! Helpers for building test simulations.

use std::io;
use std::sync::Arc;

use weft_track::Tracker;
use weft_track::tracker::{EntityManager, TextTracker, TraceState};

use crate::engine::Engine;

/// Create a [`Tracker`] for a test.
///
/// Trace events are disabled and log messages at `Warn` and above go to
/// stdout, where the test harness captures them. The test file name is
/// printed so that interleaved output can be attributed.
pub fn create_tracker(test_file: &str) -> Tracker {
    println!("=== {test_file} ===");
    let manager = EntityManager::new(TraceState::Disabled, log::Level::Warn);
    let writer = Box::new(io::stdout());
    let tracker: Tracker = Arc::new(TextTracker::new(manager, writer));
    tracker
}

/// Create an [`Engine`] for a test, named after the test file.
pub fn start_test(test_file: &str) -> Engine {
    let tracker = create_tracker(test_file);
    Engine::new(&tracker)
}
