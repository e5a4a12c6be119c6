// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! Define the [`Track`] trait and a number of [`Tracker`]s.

/// Include the /dev/null tracker.
pub mod dev_null;
/// Include the text-based tracker.
pub mod text;

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub use dev_null::DevNullTracker;
use regex::Regex;
pub use text::TextTracker;

use crate::{ROOT, Tag};

/// Whether trace events are recorded for an entity.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum TraceState {
    /// Trace events are recorded.
    Enabled,
    /// Trace events are suppressed.
    Disabled,
}

/// The event sink interface every [`Tracker`] implements.
pub trait Track {
    /// Allocate a new global tag.
    fn unique_tag(&self) -> Tag;

    /// Register an entity so that its trace/log enables can be resolved.
    fn add_entity(&self, tag: Tag, entity_name: &str);

    /// Whether the entity emits at the given level at all. The track macros
    /// consult this before formatting anything.
    fn is_entity_enabled(&self, tag: Tag, level: log::Level) -> bool;

    /// An object arrived at an entity.
    fn enter(&self, enter_into: Tag, enter_obj: Tag);

    /// An object left an entity.
    fn exit(&self, exit_from: Tag, exit_obj: Tag);

    /// An object came into existence.
    fn create(&self, created_by: Tag, created_obj: Tag, num_bytes: usize, req_type: i8, name: &str);

    /// An object ceased to exist.
    fn destroy(&self, destroyed_by: Tag, destroyed_obj: Tag);

    /// Two entities were connected, port to port.
    fn connect(&self, connect_from: Tag, connect_to: Tag);

    /// A log message at the given level.
    fn log(&self, msg_by: Tag, level: log::Level, msg: std::fmt::Arguments);

    /// Simulated time reached `time_ns`.
    fn time(&self, set_by: Tag, time_ns: f64);

    /// Flush any buffered output.
    fn shutdown(&self);
}

/// The type of a [`Tracker`] that is shared across entities.
pub type Tracker = Arc<dyn Track + Send + Sync>;

/// Create a [`Tracker`] that prints all track events to `stdout`.
pub fn stdout_tracker() -> Tracker {
    let entity_manager = EntityManager::new(TraceState::Enabled, log::Level::Warn);
    let stdout_writer = Box::new(std::io::BufWriter::new(io::stdout()));
    let tracer: Tracker = Arc::new(TextTracker::new(entity_manager, stdout_writer));
    tracer
}

/// Create a [`Tracker`] that suppresses all track events.
pub fn dev_null_tracker() -> Tracker {
    let tracer: Tracker = Arc::new(DevNullTracker::default());
    tracer
}

/// Per-entity enables, resolved once at registration.
#[derive(Copy, Clone)]
struct Enables {
    trace: bool,
    level: log::Level,
}

/// Resolves which entities trace and at what level they log.
///
/// Filters are regular expressions over full entity paths, so
/// `".*tile0_1.*"` turns on everything inside one tile. Writer-backed
/// trackers such as [`Text`](crate::tracker::text) embed one of these;
/// it also allocates the unique [`Tag`] values.
pub struct EntityManager {
    /// Whether _trace_ events are emitted by default.
    default_trace_enabled: bool,

    /// Level of _log_ events to output by default.
    default_log_level: log::Level,

    /// Trace enable/disable overrides, first match wins.
    trace_filters: Vec<(Regex, bool)>,

    /// Log level overrides, first match wins.
    log_filters: Vec<(Regex, log::Level)>,

    /// Enables resolved when each entity registered.
    enables: Mutex<HashMap<Tag, Enables>>,

    next_tag: AtomicU64,

    /// Latest time reported through [Track::time].
    time_ns: Mutex<f64>,
}

fn compile(regex_str: &str) -> Regex {
    Regex::new(regex_str).unwrap_or_else(|e| panic!("Failed to parse regex {regex_str}:\n{e}\n"))
}

impl EntityManager {
    /// Constructor with [`TraceState`] and [`log::Level`]
    pub fn new(default_trace_enabled: TraceState, default_log_level: log::Level) -> Self {
        Self {
            default_trace_enabled: default_trace_enabled == TraceState::Enabled,
            default_log_level,
            trace_filters: Vec::new(),
            log_filters: Vec::new(),
            enables: Mutex::new(HashMap::new()),
            next_tag: AtomicU64::new(ROOT.0 + 1),
            time_ns: Mutex::new(0.0),
        }
    }

    pub(crate) fn unique_tag(&self) -> Tag {
        Tag(self.next_tag.fetch_add(1, Ordering::SeqCst))
    }

    fn resolve(&self, entity_name: &str) -> Enables {
        let trace = self
            .trace_filters
            .iter()
            .find(|(regex, _)| regex.is_match(entity_name))
            .map_or(self.default_trace_enabled, |(_, enabled)| *enabled);
        let level = self
            .log_filters
            .iter()
            .find(|(regex, _)| regex.is_match(entity_name))
            .map_or(self.default_log_level, |(_, level)| *level);
        Enables { trace, level }
    }

    pub(crate) fn add_entity(&self, tag: Tag, entity_name: &str) {
        let enables = self.resolve(entity_name);
        self.enables.lock().unwrap().insert(tag, enables);
    }

    pub(crate) fn is_enabled(&self, tag: Tag, level: log::Level) -> bool {
        let enables = self.enables.lock().unwrap();
        let Some(Enables { trace, level: log_level }) = enables.get(&tag).copied() else {
            return false;
        };
        if level == log::Level::Trace {
            // Trace events flow if either the trace enable or a trace-level
            // log filter says so
            trace || log_level >= level
        } else {
            level <= log_level
        }
    }

    /// Add a log filter regular expression.
    ///
    /// # Example
    ///
    /// ```rust
    /// use weft_track::tracker::{EntityManager, TraceState};
    /// let mut manager = EntityManager::new(TraceState::Disabled, log::Level::Warn);
    /// manager.add_log_filter(".*arb.*", log::Level::Trace);
    /// ```
    pub fn add_log_filter(&mut self, regex_str: &str, level: crate::log::Level) {
        self.log_filters.push((compile(regex_str), level));
    }

    /// Add a filter regular expression for enabling/disabling trace for
    /// matching entities.
    ///
    /// # Example
    ///
    /// ```rust
    /// use weft_track::tracker::{EntityManager, TraceState};
    /// let mut manager = EntityManager::new(TraceState::Disabled, log::Level::Warn);
    /// manager.add_trace_filter(".*arb.*", TraceState::Enabled);
    /// ```
    pub fn add_trace_filter(&mut self, regex_str: &str, enabled: TraceState) {
        self.trace_filters
            .push((compile(regex_str), enabled == TraceState::Enabled));
    }

    pub(crate) fn time(&self) -> f64 {
        *self.time_ns.lock().unwrap()
    }

    pub(crate) fn set_time(&self, new_time: f64) {
        let mut time_guard = self.time_ns.lock().unwrap();
        assert!(new_time >= *time_guard);
        *time_guard = new_time;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity_paths() -> Vec<&'static str> {
        vec!["top", "top::tile0", "top::tile0::xbar", "top::tile0::rtr"]
    }

    fn register_all(manager: &EntityManager) -> Vec<Tag> {
        entity_paths()
            .iter()
            .map(|p| {
                let tag = manager.unique_tag();
                manager.add_entity(tag, p);
                tag
            })
            .collect()
    }

    #[test]
    fn no_filters() {
        let manager = EntityManager::new(TraceState::Disabled, log::Level::Error);
        let tags = register_all(&manager);

        for tag in tags {
            assert!(!manager.is_enabled(tag, log::Level::Trace));
            assert!(manager.is_enabled(tag, log::Level::Error));
            assert!(!manager.is_enabled(tag, log::Level::Warn));
        }
    }

    #[test]
    fn unknown_tag_disabled() {
        let manager = EntityManager::new(TraceState::Enabled, log::Level::Trace);
        assert!(!manager.is_enabled(Tag(999), log::Level::Error));
    }

    #[test]
    fn filter_trace_tile_enable() {
        let mut manager = EntityManager::new(TraceState::Disabled, log::Level::Error);
        manager.add_trace_filter(r".*tile0.*", TraceState::Enabled);
        let tags = register_all(&manager);

        let expected_enables = [false, true, true, true];

        for (i, tag) in tags.iter().enumerate() {
            assert_eq!(manager.is_enabled(*tag, log::Level::Trace), expected_enables[i]);
        }
    }

    #[test]
    fn filter_trace_xbar_disable() {
        let mut manager = EntityManager::new(TraceState::Enabled, log::Level::Error);
        manager.add_trace_filter(r".*xbar", TraceState::Disabled);
        let tags = register_all(&manager);

        let expected_enables = [true, true, false, true];

        for (i, tag) in tags.iter().enumerate() {
            assert_eq!(manager.is_enabled(*tag, log::Level::Trace), expected_enables[i]);
        }
    }

    #[test]
    fn first_filter_wins() {
        let mut manager = EntityManager::new(TraceState::Enabled, log::Level::Error);
        // The first pattern seen should be highest priority
        manager.add_log_filter(r".*rtr", log::Level::Info);
        manager.add_log_filter(r".*tile0.*", log::Level::Trace);
        manager.add_log_filter(r"top.*", log::Level::Warn);
        let tags = register_all(&manager);

        let expected_levels = [
            log::Level::Warn,
            log::Level::Trace,
            log::Level::Trace,
            log::Level::Info,
        ];

        for (i, tag) in tags.iter().enumerate() {
            assert!(manager.is_enabled(*tag, expected_levels[i]));
        }
    }

    #[test]
    fn tags() {
        let manager = EntityManager::new(TraceState::Disabled, log::Level::Error);
        for i in 0..10 {
            assert_eq!(manager.unique_tag(), Tag(i + ROOT.0 + 1));
        }
    }
}
