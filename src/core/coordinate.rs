//! Coordinates and the pairing of longitude/latitude lists

use std::fmt;
use std::str::FromStr;

use crate::core::error::{Error, Result};

/// A WGS84 position, longitude first as the engine expects
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting NaN and infinite components
    pub fn new(longitude: f64, latitude: f64) -> Result<Self> {
        if !longitude.is_finite() || !latitude.is_finite() {
            return Err(Error::InvalidCoordinate { longitude, latitude });
        }
        Ok(Self { longitude, latitude })
    }

    /// Pair two parallel lists into coordinates, preserving their order
    pub fn from_lists(longitudes: &[f64], latitudes: &[f64]) -> Result<Vec<Self>> {
        if longitudes.len() != latitudes.len() {
            return Err(Error::CoordinateMismatch {
                longitudes: longitudes.len(),
                latitudes: latitudes.len(),
            });
        }

        longitudes
            .iter()
            .zip(latitudes)
            .map(|(&lon, &lat)| Self::new(lon, lat))
            .collect()
    }
}

/// Renders as `lon,lat`, the engine's path segment format
impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.longitude, self.latitude)
    }
}

impl FromStr for Coordinate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (lon, lat) = s
            .split_once(',')
            .ok_or_else(|| Error::InvalidInput(format!("expected LON,LAT, got '{s}'")))?;

        let parse = |part: &str| {
            part.trim()
                .parse::<f64>()
                .map_err(|_| Error::InvalidInput(format!("'{}' is not a number in '{s}'", part.trim())))
        };

        Self::new(parse(lon)?, parse(lat)?)
    }
}

/// Join coordinates into the `lon,lat;lon,lat` path form
pub(crate) fn join_coordinates(coordinates: &[Coordinate]) -> String {
    coordinates
        .iter()
        .map(Coordinate::to_string)
        .collect::<Vec<_>>()
        .join(";")
}
