//! Crash testing support
//!
//! Runs the savecraft binary as a subprocess with a crash point armed and
//! reports how it ended.

#![allow(dead_code)]

pub mod harness;

pub use harness::*;
