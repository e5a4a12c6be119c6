// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! End-to-end delivery through an assembled fabric, on the default 2x2
//! grid with four channels on each of four components per tile.

use std::cell::RefCell;
use std::rc::Rc;

use weft_engine::engine::Engine;
use weft_engine::run_simulation;
use weft_engine::test_helpers::start_test;
use weft_engine::traits::Event;
use weft_fabric::config::FabricConfig;
use weft_fabric::fabric::{Endpoint, Fabric};
use weft_fabric::types::ChannelId;

fn build(engine: &mut Engine) -> Fabric {
    let spawner = engine.spawner.clone();
    let clock = engine.default_clock();
    Fabric::new(
        engine.top(),
        "fabric",
        spawner,
        clock,
        FabricConfig::default(),
    )
    .unwrap()
}

/// Queue every payload as a single-flit packet, waiting out a full send
/// queue.
async fn enqueue_all(endpoint: &Endpoint, dest: ChannelId, payloads: Vec<u64>) {
    for payload in payloads {
        while endpoint.enqueue(dest, payload, true).is_err() {
            endpoint.send_space().listen().await;
        }
    }
}

async fn drain_into(endpoint: &Endpoint, count: usize, out: Rc<RefCell<Vec<u64>>>) {
    while out.borrow().len() < count {
        match endpoint.drain() {
            Some(payload) => out.borrow_mut().push(payload),
            None => {
                endpoint.data_arrived().listen().await;
            }
        }
    }
}

#[test]
fn same_tile_delivery() {
    let mut engine = start_test(file!());
    let fabric = build(&mut engine);

    let a = fabric.endpoint(ChannelId::new(0, 0, 0, 0)).unwrap();
    let b = fabric.endpoint(ChannelId::new(0, 0, 1, 1)).unwrap();

    {
        let a = a.clone();
        let b_id = b.id();
        engine.spawn(async move {
            a.claim(b_id).unwrap();
            enqueue_all(&a, b_id, vec![1, 2, 3]).await;
            Ok(())
        });
    }

    let received = Rc::new(RefCell::new(Vec::new()));
    {
        let b = b.clone();
        let received = received.clone();
        engine.spawn(async move {
            drain_into(&b, 3, received).await;
            Ok(())
        });
    }

    run_simulation!(engine ; [fabric]);

    assert_eq!(*received.borrow(), vec![1, 2, 3]);
    assert_eq!(a.counters().sent.get(), 4);
    assert_eq!(a.counters().credits_received.get(), 3);
    assert_eq!(b.counters().drained.get(), 3);
    assert_eq!(b.counters().credits_sent.get(), 3);
}

#[test]
fn cross_tile_delivery() {
    let mut engine = start_test(file!());
    let fabric = build(&mut engine);

    let a = fabric.endpoint(ChannelId::new(0, 0, 0, 0)).unwrap();
    let b = fabric.endpoint(ChannelId::new(1, 1, 0, 0)).unwrap();

    {
        let a = a.clone();
        let b_id = b.id();
        engine.spawn(async move {
            a.claim(b_id).unwrap();
            enqueue_all(&a, b_id, vec![7, 8, 9]).await;
            Ok(())
        });
    }

    let received = Rc::new(RefCell::new(Vec::new()));
    {
        let b = b.clone();
        let received = received.clone();
        engine.spawn(async move {
            drain_into(&b, 3, received).await;
            Ok(())
        });
    }

    run_simulation!(engine ; [fabric]);

    assert_eq!(*received.borrow(), vec![7, 8, 9]);
    assert_eq!(a.counters().credits_received.get(), 3);
}

#[test]
fn offchip_traffic_is_absorbed_and_credited() {
    let mut engine = start_test(file!());
    let fabric = build(&mut engine);

    let a = fabric.endpoint(ChannelId::new(0, 0, 0, 0)).unwrap();
    // Beyond the east edge of a 2-column grid
    let dest = ChannelId::new(3, 0, 0, 0);

    {
        let a = a.clone();
        engine.spawn(async move {
            a.claim(dest).unwrap();
            // More than the send queue holds; the absorber's credits keep
            // the stream moving
            enqueue_all(&a, dest, (1..=5).collect()).await;
            Ok(())
        });
    }

    run_simulation!(engine ; [fabric]);

    assert_eq!(a.counters().sent.get(), 6);
    assert_eq!(a.counters().credits_received.get(), 5);
}

#[test]
fn reclaim_redirects_credits_to_new_claimant() {
    let mut engine = start_test(file!());
    let clock = engine.default_clock();
    let fabric = build(&mut engine);

    let a = fabric.endpoint(ChannelId::new(0, 0, 0, 0)).unwrap();
    let b = fabric.endpoint(ChannelId::new(0, 0, 0, 1)).unwrap();
    let r = fabric.endpoint(ChannelId::new(0, 0, 1, 0)).unwrap();

    // A claims R and leaves two payloads buffered there
    {
        let a = a.clone();
        let r_id = r.id();
        engine.spawn(async move {
            a.claim(r_id).unwrap();
            enqueue_all(&a, r_id, vec![1, 2]).await;
            Ok(())
        });
    }

    // B takes the claim over while A's payloads are still undrained
    {
        let b = b.clone();
        let r_id = r.id();
        let clock = clock.clone();
        engine.spawn(async move {
            clock.wait_ticks(50).await;
            b.claim(r_id).unwrap();
            enqueue_all(&b, r_id, vec![11, 12]).await;
            Ok(())
        });
    }

    let received = Rc::new(RefCell::new(Vec::new()));
    {
        let r = r.clone();
        let received = received.clone();
        engine.spawn(async move {
            clock.wait_ticks(100).await;
            drain_into(&r, 4, received).await;
            Ok(())
        });
    }

    run_simulation!(engine ; [fabric]);

    assert_eq!(*received.borrow(), vec![1, 2, 11, 12]);
    // A's payloads predate B's claim and drain creditless
    assert_eq!(a.counters().credits_received.get(), 0);
    assert_eq!(b.counters().credits_received.get(), 2);
}

#[test]
fn late_credits_after_reclaim_are_absorbed() {
    let mut engine = start_test(file!());
    let clock = engine.default_clock();
    let fabric = build(&mut engine);

    let a = fabric.endpoint(ChannelId::new(0, 0, 0, 0)).unwrap();
    let r1 = fabric.endpoint(ChannelId::new(0, 0, 1, 0)).unwrap();
    let r2 = fabric.endpoint(ChannelId::new(0, 0, 1, 1)).unwrap();

    // A parks two payloads at R1, abandons the circuit for R2, and only
    // then does R1 get drained: its credits arrive against A's refilled
    // balance and must be swallowed, not treated as a protocol violation
    {
        let a = a.clone();
        let r1_id = r1.id();
        let r2_id = r2.id();
        let clock = clock.clone();
        engine.spawn(async move {
            a.claim(r1_id).unwrap();
            enqueue_all(&a, r1_id, vec![1, 2]).await;
            clock.wait_ticks(50).await;
            a.claim(r2_id).unwrap();
            enqueue_all(&a, r2_id, vec![21]).await;
            Ok(())
        });
    }

    let from_r1 = Rc::new(RefCell::new(Vec::new()));
    {
        let r1 = r1.clone();
        let from_r1 = from_r1.clone();
        let clock = clock.clone();
        engine.spawn(async move {
            clock.wait_ticks(100).await;
            drain_into(&r1, 2, from_r1).await;
            Ok(())
        });
    }

    let from_r2 = Rc::new(RefCell::new(Vec::new()));
    {
        let r2 = r2.clone();
        let from_r2 = from_r2.clone();
        engine.spawn(async move {
            clock.wait_ticks(100).await;
            drain_into(&r2, 1, from_r2).await;
            Ok(())
        });
    }

    run_simulation!(engine ; [fabric]);

    assert_eq!(*from_r1.borrow(), vec![1, 2]);
    assert_eq!(*from_r2.borrow(), vec![21]);
    assert_eq!(r1.counters().credits_sent.get(), 2);
    // R1's two late credits were owed to the abandoned circuit; only the
    // R2 credit lands on the live balance
    assert_eq!(a.counters().credits_received.get(), 1);
}

#[test]
fn endpoint_lookup_respects_geometry() {
    let mut engine = start_test(file!());
    let fabric = build(&mut engine);

    assert!(fabric.endpoint(ChannelId::new(2, 0, 0, 0)).is_none());
    assert!(fabric.endpoint(ChannelId::new(0, 2, 0, 0)).is_none());
    assert!(fabric.endpoint(ChannelId::new(0, 0, 4, 0)).is_none());
    assert!(fabric.endpoint(ChannelId::new(0, 0, 0, 4)).is_none());
    assert!(fabric.endpoint(ChannelId::new(1, 1, 3, 3)).is_some());
}
