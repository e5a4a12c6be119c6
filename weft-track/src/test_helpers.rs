// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! Helpers for asserting on track output in tests.
//!
//! Tests that want to check what a component traced use a [`TestTracker`],
//! which records every event line in memory, and [`check_and_clear`] to
//! match the recorded lines against expected patterns.
//!
//! *Note:* tests that change process-wide state (such as environment
//! variables) should be run in a [serial](https://docs.rs/serial_test) manner.

use core::sync::atomic::Ordering;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;

use regex::Regex;

use crate::{Tag, Track};

/// A tracker that records track events instead of writing them out.
///
/// Everything is enabled, so a test sees every event its entities emit.
pub struct TestTracker {
    lines: Mutex<Vec<String>>,

    next_tag: AtomicU64,
}

impl TestTracker {
    /// Create a recording tracker whose tag allocation starts at
    /// `initial_tag`, letting tests predict the tags their entities get.
    #[must_use]
    pub fn new(initial_tag: u64) -> Self {
        Self {
            lines: Mutex::new(Vec::new()),
            next_tag: AtomicU64::new(initial_tag),
        }
    }

    fn record(&self, line: String) {
        // Echo to stdout too, for when an assertion fails
        println!("{line}");
        self.lines.lock().unwrap().push(line);
    }
}

impl Track for TestTracker {
    fn unique_tag(&self) -> Tag {
        Tag(self.next_tag.fetch_add(1, Ordering::SeqCst))
    }

    fn add_entity(&self, _tag: Tag, _entity_name: &str) {}

    fn is_entity_enabled(&self, _tag: Tag, _level: log::Level) -> bool {
        true
    }

    fn enter(&self, tag: Tag, item: Tag) {
        self.record(format!("{tag}: {item} entered"));
    }

    fn exit(&self, tag: Tag, item: Tag) {
        self.record(format!("{tag}: {item} exited"));
    }

    fn create(&self, created_by: Tag, tag: Tag, num_bytes: usize, req_type: i8, name: &str) {
        self.record(format!(
            "{created_by}: created {tag}, {name}, {req_type}, {num_bytes} bytes"
        ));
    }

    fn destroy(&self, destroyed_by: Tag, tag: Tag) {
        self.record(format!("{destroyed_by}: destroyed {tag}"));
    }

    fn connect(&self, connect_from: Tag, connect_to: Tag) {
        self.record(format!("{connect_from}: connect to {connect_to}"));
    }

    fn log(&self, tag: Tag, level: log::Level, msg: std::fmt::Arguments) {
        self.record(format!("{tag}:{level}: {msg}"));
    }

    fn time(&self, set_by: Tag, time_ns: f64) {
        self.record(format!("{set_by}: set time {time_ns:.1}ns"));
    }

    fn shutdown(&self) {}
}

/// Create a [`TestTracker`] and a shared [`Tracker`](crate::Tracker) handle
/// onto it, starting tag allocation from `$start_tag`.
///
/// # Examples
///
/// ```
/// use weft_track::test_helpers;
///
/// # /* Need to comment this out so that it is actually built/tested by the infrastructure
/// #[test]
/// # */
/// fn smoke() {
///     let (test_tracker, tracker) = weft_track::test_init!(10);
///     let top = weft_track::entity::toplevel(&tracker, "top");
///     test_helpers::check_and_clear(&test_tracker, &["0: created 10, top"]);
/// }
/// ```
#[macro_export]
macro_rules! test_init {
    ($start_tag:expr) => {{
        let test_tracker = std::sync::Arc::new($crate::test_helpers::TestTracker::new($start_tag));
        let tracker: $crate::Tracker = test_tracker.clone();
        (test_tracker, tracker)
    }};
}

/// Assert on the recorded track output, then clear it.
///
/// Each entry in `expected` is a regular expression matched against the
/// recorded line in the same position; the counts must agree too. Clearing
/// on every call lets a test check its output phase by phase.
pub fn check_and_clear(tracker: &TestTracker, expected: &[&str]) {
    let mut lines = tracker.lines.lock().unwrap();

    println!("Checking {:?} matches {:?}", expected, *lines);
    assert_eq!(expected.len(), lines.len());

    for (i, (pattern, actual)) in expected.iter().zip(lines.iter()).enumerate() {
        let re = Regex::new(pattern).unwrap();
        println!("Checking {i}: {pattern:?} matches {actual:?}");
        assert!(re.is_match(actual));
    }

    lines.clear();
}
