//! Core library modules for butterfly-osrm
//!
//! This module contains the adapter between host callers and the routing engine.

pub mod adapter;
pub mod config;
pub mod coordinate;
pub mod engine;
pub mod error;
pub mod host;
pub mod params;
pub mod response;
pub mod routed;

// Re-export main types for internal use
pub use adapter::EngineAdapter;
pub use engine::{OsrmEngine, RoutingEngine};
pub use host::{init_logging, EngineSlot};
