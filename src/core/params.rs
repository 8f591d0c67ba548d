//! Query parameters for the route, table and nearest services
//!
//! Each parameter set renders to the engine's v1 request form:
//! `/{service}/v1/{profile}/{lon,lat;...}?{options}`.

use std::str::FromStr;

use crate::core::coordinate::{join_coordinates, Coordinate};
use crate::core::error::{Error, Result};

/// How much of the route geometry to return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverviewType {
    Simplified,
    Full,
    False,
}

impl OverviewType {
    fn as_str(self) -> &'static str {
        match self {
            OverviewType::Simplified => "simplified",
            OverviewType::Full => "full",
            OverviewType::False => "false",
        }
    }
}

/// Encoding of returned geometries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometriesType {
    Polyline,
    Polyline6,
    GeoJson,
}

impl GeometriesType {
    fn as_str(self) -> &'static str {
        match self {
            GeometriesType::Polyline => "polyline",
            GeometriesType::Polyline6 => "polyline6",
            GeometriesType::GeoJson => "geojson",
        }
    }
}

/// Which matrices the table service computes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableAnnotations {
    Duration,
    Distance,
    DurationAndDistance,
}

impl TableAnnotations {
    fn as_str(self) -> &'static str {
        match self {
            TableAnnotations::Duration => "duration",
            TableAnnotations::Distance => "distance",
            TableAnnotations::DurationAndDistance => "duration,distance",
        }
    }
}

/// Parses the engine's own option values: `duration`, `distance`, `duration,distance`
impl FromStr for TableAnnotations {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "duration" => Ok(TableAnnotations::Duration),
            "distance" => Ok(TableAnnotations::Distance),
            "duration,distance" | "distance,duration" => Ok(TableAnnotations::DurationAndDistance),
            other => Err(Error::InvalidInput(format!(
                "unknown table annotations '{other}' (expected 'duration', 'distance' or 'duration,distance')"
            ))),
        }
    }
}

/// Parameters for a route query
#[derive(Debug, Clone, PartialEq)]
pub struct RouteParameters {
    /// Waypoints in travel order: origin, via points, destination
    pub coordinates: Vec<Coordinate>,

    /// Turn-by-turn steps for each leg
    pub steps: bool,

    pub overview: OverviewType,

    pub geometries: GeometriesType,

    /// Ask for alternative routes
    pub alternatives: bool,
}

impl RouteParameters {
    /// Steps on, full overview, GeoJSON geometry
    pub fn new(coordinates: Vec<Coordinate>) -> Self {
        Self {
            coordinates,
            steps: true,
            overview: OverviewType::Full,
            geometries: GeometriesType::GeoJson,
            alternatives: false,
        }
    }
}

/// Parameters for a table (duration/distance matrix) query
#[derive(Debug, Clone, PartialEq)]
pub struct TableParameters {
    pub coordinates: Vec<Coordinate>,

    /// `None` leaves the engine default (durations only)
    pub annotations: Option<TableAnnotations>,
}

impl TableParameters {
    pub fn new(coordinates: Vec<Coordinate>) -> Self {
        Self {
            coordinates,
            annotations: None,
        }
    }
}

/// Parameters for a nearest query
#[derive(Debug, Clone, PartialEq)]
pub struct NearestParameters {
    pub coordinate: Coordinate,

    /// Number of candidate segments; `None` leaves the engine default
    pub number: Option<u32>,
}

impl NearestParameters {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            number: None,
        }
    }
}

/// One query of any supported service
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParameters {
    Route(RouteParameters),
    Table(TableParameters),
    Nearest(NearestParameters),
}

impl QueryParameters {
    /// Service name as it appears in the request path
    pub fn service(&self) -> &'static str {
        match self {
            QueryParameters::Route(_) => "route",
            QueryParameters::Table(_) => "table",
            QueryParameters::Nearest(_) => "nearest",
        }
    }

    /// Request path and query string, e.g. `/route/v1/driving/7.41,43.73;7.42,43.74?steps=true`
    pub fn request_path(&self, profile: &str) -> String {
        let coordinates = match self {
            QueryParameters::Route(p) => join_coordinates(&p.coordinates),
            QueryParameters::Table(p) => join_coordinates(&p.coordinates),
            QueryParameters::Nearest(p) => p.coordinate.to_string(),
        };

        let options = self.options();
        let mut path = format!("/{}/v1/{}/{}", self.service(), profile, coordinates);
        if !options.is_empty() {
            let query = options
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect::<Vec<_>>()
                .join("&");
            path.push('?');
            path.push_str(&query);
        }
        path
    }

    fn options(&self) -> Vec<(&'static str, String)> {
        match self {
            QueryParameters::Route(p) => vec![
                ("steps", p.steps.to_string()),
                ("overview", p.overview.as_str().to_string()),
                ("geometries", p.geometries.as_str().to_string()),
                ("alternatives", p.alternatives.to_string()),
            ],
            QueryParameters::Table(p) => p
                .annotations
                .map(|a| vec![("annotations", a.as_str().to_string())])
                .unwrap_or_default(),
            QueryParameters::Nearest(p) => p
                .number
                .map(|n| vec![("number", n.to_string())])
                .unwrap_or_default(),
        }
    }
}

impl From<RouteParameters> for QueryParameters {
    fn from(params: RouteParameters) -> Self {
        QueryParameters::Route(params)
    }
}

impl From<TableParameters> for QueryParameters {
    fn from(params: TableParameters) -> Self {
        QueryParameters::Table(params)
    }
}

impl From<NearestParameters> for QueryParameters {
    fn from(params: NearestParameters) -> Self {
        QueryParameters::Nearest(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monaco() -> Vec<Coordinate> {
        Coordinate::from_lists(&[7.4197, 7.4246], &[43.7311, 43.7384]).unwrap()
    }

    #[test]
    fn test_route_defaults() {
        let params = RouteParameters::new(monaco());
        assert!(params.steps);
        assert_eq!(params.overview, OverviewType::Full);
        assert_eq!(params.geometries, GeometriesType::GeoJson);
        assert!(!params.alternatives);
    }

    #[test]
    fn test_route_request_path() {
        let query = QueryParameters::from(RouteParameters::new(monaco()));
        assert_eq!(
            query.request_path("driving"),
            "/route/v1/driving/7.4197,43.7311;7.4246,43.7384?steps=true&overview=full&geometries=geojson&alternatives=false"
        );
    }

    #[test]
    fn test_table_request_path_default_has_no_options() {
        let query = QueryParameters::from(TableParameters::new(monaco()));
        assert_eq!(
            query.request_path("driving"),
            "/table/v1/driving/7.4197,43.7311;7.4246,43.7384"
        );
    }

    #[test]
    fn test_table_annotations() {
        let mut params = TableParameters::new(monaco());
        params.annotations = Some(TableAnnotations::DurationAndDistance);
        let path = QueryParameters::Table(params).request_path("foot");
        assert!(path.starts_with("/table/v1/foot/"));
        assert!(path.ends_with("?annotations=duration,distance"));
    }

    #[test]
    fn test_table_annotations_parse() {
        assert_eq!("duration".parse::<TableAnnotations>().unwrap(), TableAnnotations::Duration);
        assert_eq!("Distance".parse::<TableAnnotations>().unwrap(), TableAnnotations::Distance);
        assert_eq!(
            "duration,distance".parse::<TableAnnotations>().unwrap(),
            TableAnnotations::DurationAndDistance
        );

        let err = "speed".parse::<TableAnnotations>().unwrap_err();
        assert!(err.is_argument_error());
    }

    #[test]
    fn test_nearest_request_path() {
        let coordinate = Coordinate::new(7.4197, 43.7311).unwrap();
        let query = QueryParameters::Nearest(NearestParameters::new(coordinate));
        assert_eq!(query.request_path("driving"), "/nearest/v1/driving/7.4197,43.7311");

        let mut params = NearestParameters::new(coordinate);
        params.number = Some(3);
        assert_eq!(
            QueryParameters::Nearest(params).request_path("driving"),
            "/nearest/v1/driving/7.4197,43.7311?number=3"
        );
    }
}
