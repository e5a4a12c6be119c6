// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! `Engine::run_until` with composite stop conditions. A background task
//! keeps the model busy throughout, so the stop event alone decides when
//! each run ends.

use weft_engine::events::all_of::AllOf;
use weft_engine::events::any_of::AnyOf;
use weft_engine::test_helpers::start_test;

mod common;
use common::{create_once_event_at_delay, spawn_activity};

#[test]
fn stops_at_a_single_event() {
    let mut engine = start_test(file!());

    let done = create_once_event_at_delay(&mut engine, 5, 1);

    spawn_activity(&mut engine);
    engine.run_until(done).unwrap();

    assert_eq!(engine.time_now_ns(), 5.0);
}

#[test]
fn all_of_waits_for_the_slowest() {
    let mut engine = start_test(file!());

    let fast = create_once_event_at_delay(&mut engine, 5, 1);
    let slow = create_once_event_at_delay(&mut engine, 10, 2);
    let both = Box::new(AllOf::new(vec![fast, slow]));

    spawn_activity(&mut engine);
    engine.run_until(both).unwrap();

    assert_eq!(engine.time_now_ns(), 10.0);
}

#[test]
fn all_of_is_order_independent() {
    let mut engine = start_test(file!());

    // Slowest member listed first this time
    let slow = create_once_event_at_delay(&mut engine, 10, 1);
    let fast = create_once_event_at_delay(&mut engine, 5, 2);
    let both = Box::new(AllOf::new(vec![slow, fast]));

    spawn_activity(&mut engine);
    engine.run_until(both).unwrap();

    assert_eq!(engine.time_now_ns(), 10.0);
}

#[test]
fn any_of_stops_at_the_fastest() {
    let mut engine = start_test(file!());

    let fast = create_once_event_at_delay(&mut engine, 5, 1);
    let slow = create_once_event_at_delay(&mut engine, 10, 2);
    let either = Box::new(AnyOf::new(vec![fast, slow]));

    spawn_activity(&mut engine);
    engine.run_until(either).unwrap();

    assert_eq!(engine.time_now_ns(), 5.0);
}

#[test]
fn any_of_is_order_independent() {
    let mut engine = start_test(file!());

    let slow = create_once_event_at_delay(&mut engine, 10, 1);
    let fast = create_once_event_at_delay(&mut engine, 5, 2);
    let either = Box::new(AnyOf::new(vec![slow, fast]));

    spawn_activity(&mut engine);
    engine.run_until(either).unwrap();

    assert_eq!(engine.time_now_ns(), 5.0);
}
