// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! Human-readable tracker.
//!
//! Formats every track event as one line and writes it to the supplied
//! [`Writer`]: stdout for interactive runs, a buffer in tests.

use std::sync::{Arc, Mutex};

pub use log;

use crate::tracker::{EntityManager, Track};
use crate::{SharedWriter, Tag, Writer};

pub struct TextTracker {
    entity_manager: EntityManager,

    /// Destination for every formatted event line.
    writer: SharedWriter,
}

impl TextTracker {
    pub fn new(entity_manager: EntityManager, writer: Writer) -> Self {
        Self {
            entity_manager,
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    fn emit(&self, line: String) {
        let mut writer = self.writer.lock().unwrap();
        writer.write_all(line.as_bytes()).unwrap();
    }
}

impl Track for TextTracker {
    fn unique_tag(&self) -> Tag {
        self.entity_manager.unique_tag()
    }

    fn add_entity(&self, tag: Tag, entity_name: &str) {
        self.entity_manager.add_entity(tag, entity_name);
    }

    fn is_entity_enabled(&self, tag: Tag, level: log::Level) -> bool {
        self.entity_manager.is_enabled(tag, level)
    }

    fn enter(&self, tag: Tag, object: Tag) {
        self.emit(format!("{tag}: enter {object}\n"));
    }

    fn exit(&self, tag: Tag, object: Tag) {
        self.emit(format!("{tag}: exit {object}\n"));
    }

    fn create(&self, created_by: Tag, tag: Tag, num_bytes: usize, req_type: i8, name: &str) {
        self.emit(format!(
            "{created_by}: created {tag}, {name}, {req_type}, {num_bytes} bytes\n"
        ));
    }

    fn destroy(&self, destroyed_by: Tag, tag: Tag) {
        self.emit(format!("{destroyed_by}: destroyed {tag}\n"));
    }

    fn connect(&self, connect_from: Tag, connect_to: Tag) {
        self.emit(format!("{connect_from}: connect to {connect_to}\n"));
    }

    fn log(&self, tag: Tag, level: log::Level, msg: std::fmt::Arguments) {
        self.emit(format!("{tag}:{level}: {msg}\n"));
    }

    fn time(&self, set_by: Tag, time_ns: f64) {
        // Only the first tracker event at a given time reports it
        if time_ns > self.entity_manager.time() {
            self.entity_manager.set_time(time_ns);
            self.emit(format!("{set_by}: set time to {time_ns:.1}ns\n"));
        }
    }

    fn shutdown(&self) {
        self.writer.lock().unwrap().flush().unwrap();
    }
}
