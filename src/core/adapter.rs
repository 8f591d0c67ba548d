//! Engine adapter: coordinate lists in, tagged query results out

use std::path::Path;

use log::{debug, warn};

use crate::core::config::EngineConfig;
use crate::core::coordinate::Coordinate;
use crate::core::engine::{OsrmEngine, RoutingEngine};
use crate::core::error::Result;
use crate::core::params::{NearestParameters, RouteParameters, TableParameters};
use crate::core::response::QueryResult;

/// Owns one routing engine and translates calls into its parameter types
///
/// Dropping the adapter releases the engine.
pub struct EngineAdapter<E: RoutingEngine = OsrmEngine> {
    engine: E,
}

impl EngineAdapter<OsrmEngine> {
    /// Serve the dataset at `path` from files with CH, honouring `OSRM_*` overrides
    pub fn initialize(path: impl AsRef<Path>) -> Result<Self> {
        let config = EngineConfig::new(path.as_ref()).apply_env()?;
        Self::with_config(&config)
    }

    pub fn with_config(config: &EngineConfig) -> Result<Self> {
        Ok(Self::new(OsrmEngine::start(config)?))
    }
}

impl<E: RoutingEngine> EngineAdapter<E> {
    /// Wrap an already constructed engine
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Route through the coordinates in the given order
    pub fn route(&self, longitudes: &[f64], latitudes: &[f64]) -> Result<QueryResult> {
        let coordinates = Coordinate::from_lists(longitudes, latitudes)?;
        self.route_with(&RouteParameters::new(coordinates))
    }

    pub fn route_with(&self, params: &RouteParameters) -> Result<QueryResult> {
        let result = QueryResult::from_reply(self.engine.route(params)?)?;
        log_failure("route", &result);
        Ok(result)
    }

    /// Duration matrix among all coordinates
    pub fn table(&self, longitudes: &[f64], latitudes: &[f64]) -> Result<QueryResult> {
        let coordinates = Coordinate::from_lists(longitudes, latitudes)?;
        self.table_with(&TableParameters::new(coordinates))
    }

    pub fn table_with(&self, params: &TableParameters) -> Result<QueryResult> {
        let result = QueryResult::from_reply(self.engine.table(params)?)?;
        log_failure("table", &result);
        Ok(result)
    }

    /// Snap one coordinate to the nearest routable segment
    pub fn nearest(&self, longitude: f64, latitude: f64) -> Result<QueryResult> {
        let coordinate = Coordinate::new(longitude, latitude)?;
        self.nearest_with(&NearestParameters::new(coordinate))
    }

    pub fn nearest_with(&self, params: &NearestParameters) -> Result<QueryResult> {
        let result = QueryResult::from_reply(self.engine.nearest(params)?)?;
        if let QueryResult::Failure { message, .. } = &result {
            debug!("nearest failed: {message}");
        }
        Ok(result)
    }
}

fn log_failure(service: &str, result: &QueryResult) {
    if let QueryResult::Failure { code, message } = result {
        warn!("{service} failed: code={code} message={message}");
    }
}
