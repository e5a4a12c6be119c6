// Copyright (c) 2026 The Weft Authors. All rights reserved.

use weft_engine::run_simulation;
use weft_engine::test_helpers::start_test;
use weft_fabric::arbiter::{Arbiter, NullPolicy, RoundRobinPolicy, WormholePolicy};
use weft_fabric::sink::Sink;
use weft_fabric::source::Source;
use weft_fabric::types::{ChannelId, Flit};
use weft_fabric::{connect_port, option_box_repeat};

#[test]
fn source_sink() {
    let mut engine = start_test(file!());
    let spawner = engine.spawner.clone();

    const NUM_PUTS: usize = 25;

    let arbiter = Arbiter::new(
        engine.top(),
        "arb",
        spawner,
        3,
        Box::new(RoundRobinPolicy::new()),
        None,
    );
    let source_a = Source::new(engine.top(), "source_a", option_box_repeat!(1; NUM_PUTS));
    let source_b = Source::new(engine.top(), "source_b", option_box_repeat!(2; NUM_PUTS));
    let source_c = Source::new(engine.top(), "source_c", option_box_repeat!(3; NUM_PUTS));
    let sink = Sink::new(engine.top(), "sink");

    connect_port!(source_a, tx => arbiter, rx, 0);
    connect_port!(source_b, tx => arbiter, rx, 1);
    connect_port!(source_c, tx => arbiter, rx, 2);
    connect_port!(arbiter, tx => sink, rx);

    let mut sources = vec![source_a, source_b, source_c];

    run_simulation!(engine; sources, [arbiter, sink]);

    assert_eq!(sink.num_sunk(), NUM_PUTS * 3);
}

#[test]
fn clocked_round_robin_alternates() {
    let mut engine = start_test(file!());
    let spawner = engine.spawner.clone();
    let clock = engine.default_clock();

    let arbiter = Arbiter::new(
        engine.top(),
        "arb",
        spawner,
        2,
        Box::new(RoundRobinPolicy::new()),
        Some(clock),
    );
    let source_a = Source::new(engine.top(), "source_a", option_box_repeat!(1; 5));
    let source_b = Source::new(engine.top(), "source_b", option_box_repeat!(2; 5));
    let sink = Sink::new(engine.top(), "sink");

    connect_port!(source_a, tx => arbiter, rx, 0);
    connect_port!(source_b, tx => arbiter, rx, 1);
    connect_port!(arbiter, tx => sink, rx);

    let mut sources = vec![source_a, source_b];

    run_simulation!(engine; sources, [arbiter, sink]);

    // One grant per cycle, strictly alternating while both inputs request
    assert_eq!(sink.values(), vec![1, 2, 1, 2, 1, 2, 1, 2, 1, 2]);
}

#[test]
fn round_robin_window_serves_every_requester() {
    let mut engine = start_test(file!());
    let spawner = engine.spawner.clone();
    let clock = engine.default_clock();

    let arbiter = Arbiter::new(
        engine.top(),
        "arb",
        spawner,
        3,
        Box::new(RoundRobinPolicy::new()),
        Some(clock),
    );
    let source_a = Source::new(engine.top(), "source_a", option_box_repeat!(1; 5));
    let source_b = Source::new(engine.top(), "source_b", option_box_repeat!(2; 5));
    let source_c = Source::new(engine.top(), "source_c", option_box_repeat!(3; 5));
    let sink = Sink::new(engine.top(), "sink");

    connect_port!(source_a, tx => arbiter, rx, 0);
    connect_port!(source_b, tx => arbiter, rx, 1);
    connect_port!(source_c, tx => arbiter, rx, 2);
    connect_port!(arbiter, tx => sink, rx);

    let mut sources = vec![source_a, source_b, source_c];

    run_simulation!(engine; sources, [arbiter, sink]);

    // With three inputs requesting persistently, every window of three
    // consecutive grants serves each input exactly once
    let values = sink.values();
    assert_eq!(values.len(), 15);
    for window in values.windows(3) {
        let mut sorted = window.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![1, 2, 3]);
    }
}

#[test]
fn wormhole_packets_are_not_interleaved() {
    let mut engine = start_test(file!());
    let spawner = engine.spawner.clone();
    let clock = engine.default_clock();

    let dest = ChannelId::new(0, 0, 0, 0);
    let packet = |base: u64| {
        vec![
            Flit::data(base, dest, false),
            Flit::data(base + 1, dest, false),
            Flit::data(base + 2, dest, true),
        ]
    };
    let flits_a: Vec<Flit> = [packet(10), packet(20)].concat();
    let flits_b: Vec<Flit> = (1..=3).map(|p| Flit::data(p, dest, true)).collect();

    let arbiter: Arbiter<Flit> = Arbiter::new(
        engine.top(),
        "arb",
        spawner,
        2,
        Box::new(WormholePolicy::new(RoundRobinPolicy::new())),
        Some(clock),
    );
    let source_a = Source::new(engine.top(), "source_a", Some(Box::new(flits_a.into_iter())));
    let source_b = Source::new(engine.top(), "source_b", Some(Box::new(flits_b.into_iter())));
    let sink = Sink::new(engine.top(), "sink");

    connect_port!(source_a, tx => arbiter, rx, 0);
    connect_port!(source_b, tx => arbiter, rx, 1);
    connect_port!(arbiter, tx => sink, rx);

    let mut sources = vec![source_a, source_b];

    run_simulation!(engine; sources, [arbiter, sink]);

    // Round-robin favours input 0 first; once the 3-flit packet is granted
    // it holds the output until its end-of-packet flit passes
    let payloads: Vec<u64> = sink.values().iter().map(|f| f.payload).collect();
    assert_eq!(payloads, vec![10, 11, 12, 1, 20, 21, 22, 2, 3]);
}

#[test]
fn null_policy_grants_everything() {
    let mut engine = start_test(file!());
    let spawner = engine.spawner.clone();

    let arbiter = Arbiter::new(engine.top(), "arb", spawner, 1, Box::new(NullPolicy), None);
    let source = Source::new(engine.top(), "source", option_box_repeat!(7; 20));
    let sink = Sink::new(engine.top(), "sink");

    connect_port!(source, tx => arbiter, rx, 0);
    connect_port!(arbiter, tx => sink, rx);

    run_simulation!(engine; [source, arbiter, sink]);

    assert_eq!(sink.values(), vec![7; 20]);
}
