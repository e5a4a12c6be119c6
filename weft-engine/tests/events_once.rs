// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! Once events: fire exactly once, latch their value for late listeners.

use std::cell::RefCell;
use std::rc::Rc;

use weft_engine::events::once::Once;
use weft_engine::run_simulation;
use weft_engine::test_helpers::start_test;
use weft_engine::traits::Event;

#[test]
fn fires_with_no_listeners() {
    let mut engine = start_test(file!());

    let done = Once::new(());
    engine.spawn(async move {
        done.notify()?;
        Ok(())
    });

    run_simulation!(engine);
}

#[test]
fn listener_blocks_until_fired() {
    let mut engine = start_test(file!());
    let clock = engine.default_clock();

    let done = Once::new(42);

    {
        let done = done.clone();
        let clock = clock.clone();
        engine.spawn(async move {
            let value = done.listen().await;
            assert_eq!(value, 42);

            // Must not have woken before the notifier ran
            assert_eq!(clock.time_now_ns(), 10.0);
            Ok(())
        });
    }

    {
        let clock = clock.clone();
        engine.spawn(async move {
            clock.wait_ticks(10).await;
            done.notify()?;
            Ok(())
        });
    }

    run_simulation!(engine);

    assert_eq!(clock.time_now_ns(), 10.0);
}

#[test]
fn late_listener_completes_immediately() {
    let mut engine = start_test(file!());
    let clock = engine.default_clock();

    let done = Once::new(42);

    {
        let done = done.clone();
        engine.spawn(async move {
            done.notify()?;
            Ok(())
        });
    }

    {
        let clock = clock.clone();
        engine.spawn(async move {
            clock.wait_ticks(10).await;

            // Already fired, so the value is latched and there is no wait
            let value = done.listen().await;
            assert_eq!(value, 42);
            assert_eq!(clock.time_now_ns(), 10.0);
            Ok(())
        });
    }

    run_simulation!(engine);
}

#[test]
fn all_listeners_wake_together() {
    let mut engine = start_test(file!());
    let clock = engine.default_clock();

    let done = Once::new(usize::default());

    let woken = Rc::new(RefCell::new(0));
    let num_listeners = 10;

    for _ in 0..num_listeners {
        let done = done.clone();
        let clock = clock.clone();
        let woken = woken.clone();
        engine.spawn(async move {
            let value = done.listen().await;
            assert_eq!(value, usize::default());

            // Must not have woken before the notifier ran
            assert_eq!(clock.time_now_ns(), 10.0);
            *woken.borrow_mut() += 1;
            Ok(())
        });
    }

    {
        let clock = clock.clone();
        let woken = woken.clone();
        engine.spawn(async move {
            assert_eq!(*woken.borrow(), 0);
            clock.wait_ticks(10).await;
            assert_eq!(*woken.borrow(), 0);

            done.notify()?;
            Ok(())
        });
    }

    run_simulation!(engine);

    assert_eq!(clock.time_now_ns(), 10.0);
    assert_eq!(*woken.borrow(), num_listeners);
}

#[test]
fn second_fire_is_fatal() {
    let mut engine = start_test(file!());

    let done = Once::new(());
    engine.spawn(async move {
        done.notify()?;
        done.notify()?;
        Ok(())
    });

    run_simulation!(engine, "Error: once event already triggered");
}
