// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! Shared types.

use std::error::Error;
use std::fmt;

use crate::traits::Event;

/// A boxed event, as stored in event sets and returned from builders.
pub type Eventable<T> = Box<dyn Event<T> + 'static>;

#[macro_export]
/// Return early with a [SimError]; formats like `format!`.
macro_rules! sim_error {
    ($msg:expr) => {
        Err($crate::types::SimError($msg.to_string()))?
    };
    ($($arg:tt)+) => {
        Err($crate::types::SimError(format!($($arg)+)))?
    };
}

/// A fatal simulation error.
///
/// Raising one aborts the run: the executor stops at the failing task and
/// [Engine::run](crate::engine::Engine::run) returns it. The message should
/// name the offending entity and the simulated time.
#[derive(Debug)]
pub struct SimError(pub String);

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Error: {}", self.0)
    }
}

impl Error for SimError {}

/// Return type of component `run` futures and most simulation calls.
pub type SimResult = Result<(), SimError>;

/// How a tracked object accesses whatever it is sent to. Trackers use
/// this to classify traffic; flits report `Control` for claims and
/// credits and `Write` for data.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum ReqType {
    #[default]
    Read,
    Write,
    WriteNonPosted,
    Control,
}

impl fmt::Display for ReqType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ReqType::Read => "Read",
            ReqType::Write => "Write",
            ReqType::WriteNonPosted => "WriteNonPosted",
            ReqType::Control => "Control",
        };
        write!(f, "{name}")
    }
}
