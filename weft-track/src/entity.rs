// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! The entity hierarchy.
//!
//! Every component in a model owns an [Entity], giving it a place in a
//! tree of names (`top::tile0_0::fc_out3` style) and a unique [Tag]. The
//! track macros use the entity to attribute and filter their output.

use std::fmt;
use std::sync::Arc;

use crate::{Tag, Tracker, create, destroy};

/// One node in the entity tree.
///
/// Everything except the top level has a parent; create the top with
/// [toplevel]. Creation and destruction are themselves tracked events.
pub struct Entity {
    /// Leaf name of this entity.
    pub name: String,

    /// Parent entity; `None` only for the top level.
    pub parent: Option<Arc<Entity>>,

    /// Unique tag, allocated by the tracker at creation.
    pub tag: Tag,

    /// [`Tracker`] that receives this entity's trace/log events.
    pub tracker: Tracker,
}

static JOIN: &str = "::";

impl Entity {
    #[must_use]
    pub fn new(parent: &Arc<Entity>, name: &str) -> Self {
        let full_name = format!("{}{JOIN}{name}", parent.full_name());

        let tracker = parent.tracker.clone();
        let tag = tracker.unique_tag();
        tracker.add_entity(tag, &full_name);

        let entity = Self {
            name: String::from(name),
            parent: Some(parent.clone()),
            tag,
            tracker,
        };

        create!(entity);

        entity
    }

    /// The `::`-joined path from the top level down to this entity.
    #[must_use]
    pub fn full_name(&self) -> String {
        self.to_string()
    }
}

impl Drop for Entity {
    fn drop(&mut self) {
        destroy!(self);
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("tag", &self.tag)
            .finish()
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parent {
            Some(parent) => {
                parent.fmt(f)?;
                write!(f, "{}{}", JOIN, self.name)
            }
            None => write!(f, "{}", self.name),
        }
    }
}

/// Create the root of the entity tree; the only entity without a parent.
pub fn toplevel(tracker: &Tracker, name: &str) -> Arc<Entity> {
    let tag = tracker.unique_tag();
    tracker.add_entity(tag, name);
    let top = Arc::new(Entity {
        parent: None,
        name: String::from(name),
        tag,
        tracker: tracker.clone(),
    });
    create!(top);
    top
}
