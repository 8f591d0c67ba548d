//! # Butterfly-osrm Library
//!
//! Bindings to the OSRM routing engine. Coordinate lists go in; the
//! engine's route, table and nearest results come back as tagged values.
//!
//! ## Features
//!
//! - **Owned engine handle**: each [`Engine`] launches (or attaches to) one
//!   OSRM instance and releases it on drop
//! - **Tagged results**: [`QueryResult::Success`] carries the engine's JSON
//!   document untouched, [`QueryResult::Failure`] its code and message
//! - **Injectable engine**: anything implementing [`RoutingEngine`] can back
//!   an [`EngineAdapter`]
//! - **Host bindings**: Python (`python` feature) and C (`c-bindings` feature)
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use butterfly_osrm::QueryResult;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Serve a CH-prepared dataset with a spawned osrm-routed
//!     let engine = butterfly_osrm::initialize("/data/monaco.osrm")?;
//!
//!     match engine.route(&[7.4197, 7.4246], &[43.7311, 43.7384])? {
//!         QueryResult::Success(document) => println!("{document}"),
//!         QueryResult::Failure { code, message } => eprintln!("{code}: {message}"),
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Custom Configuration
//!
//! ```rust,no_run
//! use butterfly_osrm::{Algorithm, Backend, EngineAdapter, EngineConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = EngineConfig::new("/data/monaco.osrm");
//!     config.algorithm = Algorithm::Mld;
//!     config.backend = Backend::Remote { url: "http://localhost:5000".to_string() };
//!
//!     let engine = EngineAdapter::with_config(&config)?;
//!     let snapped = engine.nearest(7.4197, 43.7311)?;
//!     println!("{}", snapped.into_legacy_text());
//!     Ok(())
//! }
//! ```

use std::path::Path;

pub use crate::core::config::{Algorithm, Backend, EngineConfig};
pub use crate::core::coordinate::Coordinate;
pub use crate::core::error::{Error, Result};
pub use crate::core::params::{
    GeometriesType, NearestParameters, OverviewType, QueryParameters, RouteParameters,
    TableAnnotations, TableParameters,
};
pub use crate::core::response::{Document, EngineReply, QueryResult, Status};
pub use crate::core::{init_logging, EngineAdapter, EngineSlot, OsrmEngine, RoutingEngine};

// Internal modules
mod core;

// C-compatible FFI bindings (optional)
#[cfg(feature = "c-bindings")]
pub mod ffi;

// Python extension module (optional)
#[cfg(feature = "python")]
pub mod python;

/// An adapter over the OSRM HTTP engine
pub type Engine = EngineAdapter<OsrmEngine>;

/// Start an engine for the dataset at `path`
///
/// The dataset is served from files with Contraction Hierarchies. `OSRM_ROUTED_BIN`,
/// `OSRM_ENDPOINT`, `OSRM_ALGORITHM` and `OSRM_PROFILE` override the defaults.
///
/// # Examples
/// ```rust,no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let engine = butterfly_osrm::initialize("/data/monaco.osrm")?;
/// let table = engine.table(&[7.41, 7.42, 7.43], &[43.73, 43.74, 43.75])?;
/// assert!(table.is_success());
/// # Ok(())
/// # }
/// ```
pub fn initialize(path: impl AsRef<Path>) -> Result<Engine> {
    EngineAdapter::initialize(path)
}
