//! CLI-specific utilities for butterfly-osrm
//!
//! This module contains code specific to the command-line interface,
//! separate from the core library functionality.

pub mod progress;

pub use progress::StartupSpinner;
