// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! Helpers shared between the engine integration tests.

use weft_engine::engine::Engine;
use weft_engine::events::once::Once;
use weft_engine::types::Eventable;

/// Create a [Once] event that fires after the given number of default-clock
/// ticks, returning the given value.
pub fn create_once_event_at_delay<T>(engine: &mut Engine, ticks: u64, value: T) -> Eventable<T>
where
    T: Copy + 'static,
{
    let once = Once::new(value);
    let clock = engine.default_clock();
    {
        let once = once.clone();
        engine.spawn(async move {
            clock.wait_ticks(ticks).await;
            once.notify()?;
            Ok(())
        });
    }
    Box::new(once)
}

/// Spawn a background task that keeps the simulation busy without ever
/// finishing, so that `run_until` is what decides when to stop.
pub fn spawn_activity(engine: &mut Engine) {
    let clock = engine.default_clock();
    engine.spawn(async move {
        loop {
            clock.wait_ticks_or_exit(1).await;
        }
    });
}
