// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! Repeated events, as buffers use them to publish occupancy changes.

use weft_engine::events::repeated::Repeated;
use weft_engine::run_simulation;
use weft_engine::test_helpers::start_test;
use weft_engine::traits::Event;

#[test]
fn listener_sees_the_published_value() {
    let mut engine = start_test(file!());
    let clock = engine.default_clock();

    let occupancy = 3;
    let level_change = Repeated::new(0);

    {
        let level_change = level_change.clone();
        let clock = clock.clone();
        engine.spawn(async move {
            let seen = level_change.listen().await;
            assert_eq!(seen, occupancy);

            // Must not have woken before the publisher ran
            assert_eq!(clock.time_now_ns(), 10.0);
            Ok(())
        });
    }

    {
        let clock = clock.clone();
        engine.spawn(async move {
            clock.wait_ticks(10).await;
            level_change.notify_result(occupancy)?;
            Ok(())
        });
    }

    run_simulation!(engine);

    assert_eq!(clock.time_now_ns(), 10.0);
}

#[test]
fn notification_without_listeners_is_lost() {
    let mut engine = start_test(file!());
    let clock = engine.default_clock();

    let level_change = Repeated::new(usize::default());

    // The notify below happens at time zero with nobody listening, so this
    // listen can never complete.
    {
        let level_change = level_change.clone();
        let clock = clock.clone();
        engine.spawn(async move {
            clock.wait_ticks(10).await;
            let _ = level_change.listen().await;
            panic!("I should not be awoken");
        });
    }

    engine.spawn(async move {
        level_change.notify()?;
        Ok(())
    });

    run_simulation!(engine);

    assert_eq!(clock.time_now_ns(), 10.0);
}

#[test]
fn successive_levels_arrive_in_order() {
    let mut engine = start_test(file!());
    let clock = engine.default_clock();

    let level_change = Repeated::new(usize::default());
    const ROUNDS: usize = 10;

    {
        let level_change = level_change.clone();
        let clock = clock.clone();
        engine.spawn(async move {
            for round in 0..ROUNDS {
                let level = level_change.listen().await;
                assert_eq!(level, round + 1);
                assert_eq!(clock.time_now_ns(), 10.0 * (round + 1) as f64);
            }
            Ok(())
        });
    }

    {
        let clock = clock.clone();
        engine.spawn(async move {
            for round in 0..ROUNDS {
                clock.wait_ticks(10).await;
                level_change.notify_result(round + 1)?;
            }
            Ok(())
        });
    }

    run_simulation!(engine);

    assert_eq!(clock.time_now_ns(), 10.0 * ROUNDS as f64);
}

#[test]
fn late_listener_misses_the_notification() {
    let mut engine = start_test(file!());
    let clock = engine.default_clock();

    let level_change = Repeated::new(usize::default());

    // In time for the only notification
    {
        let level_change = level_change.clone();
        let clock = clock.clone();
        engine.spawn(async move {
            let level = level_change.listen().await;
            assert_eq!(level, usize::default());
            assert_eq!(clock.time_now_ns(), 10.0);
            Ok(())
        });
    }

    // One tick too late
    {
        let level_change = level_change.clone();
        let clock = clock.clone();
        engine.spawn(async move {
            clock.wait_ticks(11).await;
            let _ = level_change.listen().await;
            panic!("I should not be awoken");
        });
    }

    {
        let clock = clock.clone();
        engine.spawn(async move {
            clock.wait_ticks(10).await;
            level_change.notify()?;
            Ok(())
        });
    }

    run_simulation!(engine);

    assert_eq!(clock.time_now_ns(), 11.0);
}
