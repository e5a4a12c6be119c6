// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! Tags: the identities trace events are keyed by.

/// A simulation-unique identifier.
///
/// Entities get one at creation, and every traced object carries one so
/// that its movement through the model can be followed. Two values are
/// reserved: [NO_ID](crate::NO_ID) and [ROOT](crate::ROOT).
#[derive(Copy, Clone, Default, Eq, Hash, PartialEq)]
pub struct Tag(pub u64);

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Debug for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Anything that can name itself in trace output.
pub trait Tagged {
    fn tag(&self) -> Tag;
}

impl Tagged for Tag {
    fn tag(&self) -> Tag {
        *self
    }
}

// Primitive payloads tag as their own value, which is all a test needs
// to follow them through a pipeline.
impl Tagged for i32 {
    fn tag(&self) -> Tag {
        Tag(*self as u64)
    }
}

impl Tagged for usize {
    fn tag(&self) -> Tag {
        Tag(*self as u64)
    }
}
