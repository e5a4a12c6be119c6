// Copyright (c) 2026 The Weft Authors. All rights reserved.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::Tag;
use crate::tracker::Track;

/// A tracker that drops everything.
///
/// Long sweep runs use this so that tracking costs one disabled-check per
/// event and nothing more. Tag allocation still has to work, since
/// entities and flits get tags unconditionally.
#[derive(Default)]
pub struct DevNullTracker {
    next_tag: AtomicU64,
}

impl Track for DevNullTracker {
    fn unique_tag(&self) -> Tag {
        Tag(self.next_tag.fetch_add(1, Ordering::SeqCst))
    }

    fn add_entity(&self, _tag: Tag, _entity_name: &str) {}
    fn is_entity_enabled(&self, _tag: Tag, _level: log::Level) -> bool {
        false
    }
    fn enter(&self, _tag: Tag, _obj: Tag) {}
    fn exit(&self, _tag: Tag, _obj: Tag) {}
    fn create(&self, _tag: Tag, _obj: Tag, _num_bytes: usize, _req_type: i8, _name: &str) {}
    fn destroy(&self, _tag: Tag, _obj: Tag) {}
    fn connect(&self, _from: Tag, _to: Tag) {}
    fn log(&self, _tag: Tag, _level: log::Level, _msg: std::fmt::Arguments) {}
    fn time(&self, _set_by: Tag, _time_ns: f64) {}
    fn shutdown(&self) {}
}
