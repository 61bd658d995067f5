//! Cover state machines.

pub mod motion;
