// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! Events that tasks can listen on.

pub mod all_of;
pub mod any_of;
pub mod once;
pub mod repeated;
