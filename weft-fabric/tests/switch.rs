// Copyright (c) 2026 The Weft Authors. All rights reserved.

use std::collections::HashMap;
use std::rc::Rc;

use weft_engine::run_simulation;
use weft_engine::test_helpers::start_test;
use weft_fabric::arbiter::{Arbitrate, RoundRobinPolicy};
use weft_fabric::connect_port;
use weft_fabric::sink::Sink;
use weft_fabric::source::Source;
use weft_fabric::switch::{Crossbar, TableRoute};
use weft_fabric::types::{ChannelId, Flit};

#[test]
fn crossbar_routes_by_destination() {
    let mut engine = start_test(file!());
    let spawner = engine.spawner.clone();

    let dest_a = ChannelId::new(0, 0, 0, 0);
    let dest_b = ChannelId::new(0, 0, 0, 1);
    let mut table = HashMap::new();
    table.insert(u64::from(dest_a.flatten()), 0);
    table.insert(u64::from(dest_b.flatten()), 1);

    let xbar = Crossbar::new(
        engine.top(),
        "xbar",
        spawner,
        2,
        2,
        Rc::new(TableRoute::new(table, None)),
        || -> Box<dyn Arbitrate<Flit>> { Box::new(RoundRobinPolicy::new()) },
        None,
    );

    // One input interleaving both destinations: the crossbar must split the
    // stream, preserving per-destination order
    let flits = vec![
        Flit::data(1, dest_a, true),
        Flit::data(2, dest_b, true),
        Flit::data(3, dest_a, true),
        Flit::data(4, dest_b, true),
    ];
    let source = Source::new(engine.top(), "source", Some(Box::new(flits.into_iter())));
    let sink_a = Sink::new(engine.top(), "sink_a");
    let sink_b = Sink::new(engine.top(), "sink_b");

    connect_port!(source, tx => xbar, rx, 0);
    connect_port!(xbar, tx, 0 => sink_a, rx);
    connect_port!(xbar, tx, 1 => sink_b, rx);

    run_simulation!(engine ; [source, xbar, sink_a, sink_b]);

    let payloads = |sink: &Sink<Flit>| -> Vec<u64> {
        sink.values().iter().map(|f| f.payload).collect()
    };
    assert_eq!(payloads(&sink_a), vec![1, 3]);
    assert_eq!(payloads(&sink_b), vec![2, 4]);
}

#[test]
fn unroutable_destination_is_fatal() {
    let mut engine = start_test(file!());
    let spawner = engine.spawner.clone();

    let xbar = Crossbar::new(
        engine.top(),
        "xbar",
        spawner,
        1,
        1,
        Rc::new(TableRoute::new(HashMap::new(), None)),
        || -> Box<dyn Arbitrate<Flit>> { Box::new(RoundRobinPolicy::new()) },
        None,
    );

    let flits = vec![Flit::data(0, ChannelId::new(1, 1, 0, 0), true)];
    let source = Source::new(engine.top(), "source", Some(Box::new(flits.into_iter())));
    let sink = Sink::new(engine.top(), "sink");

    connect_port!(source, tx => xbar, rx, 0);
    connect_port!(xbar, tx, 0 => sink, rx);

    run_simulation!(
        engine,
        "Error: no route to destination 0x900" ;
        [source, xbar, sink]
    );
}
