//! Accepting connections.

pub mod listener;
