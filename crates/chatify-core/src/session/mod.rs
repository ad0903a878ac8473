//! Live connection tracking.
//!
//! Provides the `ConnectionRegistry` that maps each online user to the
//! transport handle used to push envelopes to them.

pub mod registry;

pub use registry::{ConnectionHandle, ConnectionId, ConnectionRegistry};
