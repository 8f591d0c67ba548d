//! Python extension module `osrmbindings`
//!
//! Module functions keep the historical call shape: `initialize(path)` once,
//! then `route`/`table`/`nearest` return the engine's JSON text on success
//! or the bare engine message on failure. The `Engine` class owns its own
//! instance and returns `QueryResult` objects instead.
//!
//! ```python
//! import json
//! import osrmbindings
//!
//! osrmbindings.initialize("/car/monaco.osrm")
//! parsed = json.loads(osrmbindings.table([7.41, 7.42], [43.73, 43.74]))
//!
//! engine = osrmbindings.Engine("/foot/monaco.osrm")
//! distances = engine.table([7.41, 7.42], [43.73, 43.74], annotations="distance")
//! result = engine.nearest(7.4197, 43.7311)
//! if result.ok:
//!     print(json.loads(result.json())["waypoints"][0]["distance"])
//! ```

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::{
    Coordinate, Engine, EngineAdapter, EngineConfig, EngineSlot, Error, OsrmEngine, QueryResult,
    TableAnnotations, TableParameters,
};

/// Engine behind the module-level functions; replaced by each `initialize`
static ENGINE: EngineSlot<OsrmEngine> = EngineSlot::new();

fn to_py_err(err: Error) -> PyErr {
    if err.is_argument_error() {
        PyValueError::new_err(err.to_string())
    } else {
        PyRuntimeError::new_err(err.to_string())
    }
}

/// Run `f` on the module engine with the GIL released
fn with_module_engine<F>(py: Python<'_>, f: F) -> PyResult<String>
where
    F: FnOnce(&Engine) -> crate::Result<QueryResult> + Send,
{
    py.allow_threads(|| ENGINE.with(f))
        .map(QueryResult::into_legacy_text)
        .map_err(to_py_err)
}

/// Initialize engine, necessary before the other functions are usable
#[pyfunction]
fn initialize(py: Python<'_>, path: &str) -> PyResult<()> {
    let engine = py.allow_threads(|| crate::initialize(path)).map_err(to_py_err)?;

    // Stops the previous engine's process, if any
    drop(ENGINE.replace(engine));
    Ok(())
}

/// Route binding
#[pyfunction]
fn route(py: Python<'_>, longitudes: Vec<f64>, latitudes: Vec<f64>) -> PyResult<String> {
    with_module_engine(py, move |engine| engine.route(&longitudes, &latitudes))
}

/// Table binding
#[pyfunction]
fn table(py: Python<'_>, longitudes: Vec<f64>, latitudes: Vec<f64>) -> PyResult<String> {
    with_module_engine(py, move |engine| engine.table(&longitudes, &latitudes))
}

/// Nearest binding
#[pyfunction]
fn nearest(py: Python<'_>, longitude: f64, latitude: f64) -> PyResult<String> {
    with_module_engine(py, move |engine| engine.nearest(longitude, latitude))
}

/// Outcome of one query
#[pyclass(name = "QueryResult", module = "osrmbindings")]
pub struct PyQueryResult {
    inner: QueryResult,
}

#[pymethods]
impl PyQueryResult {
    /// True when the engine produced a document
    #[getter]
    fn ok(&self) -> bool {
        self.inner.is_success()
    }

    /// Engine status code: "Ok" on success, the error code otherwise
    #[getter]
    fn code(&self) -> Option<String> {
        match &self.inner {
            QueryResult::Success(document) => document.code().map(str::to_string),
            QueryResult::Failure { code, .. } => Some(code.clone()),
        }
    }

    #[getter]
    fn message(&self) -> Option<String> {
        match &self.inner {
            QueryResult::Success(_) => None,
            QueryResult::Failure { message, .. } => Some(message.clone()),
        }
    }

    /// Document text, or None on failure
    #[getter]
    fn document(&self) -> Option<String> {
        self.inner.document().map(|document| document.render())
    }

    /// Document text; raises ValueError on failure
    fn json(&self) -> PyResult<String> {
        match &self.inner {
            QueryResult::Success(document) => Ok(document.render()),
            QueryResult::Failure { code, message } => {
                Err(PyValueError::new_err(format!("{code}: {message}")))
            }
        }
    }

    fn __repr__(&self) -> String {
        match &self.inner {
            QueryResult::Success(_) => "QueryResult(ok=True)".to_string(),
            QueryResult::Failure { code, message } => {
                format!("QueryResult(ok=False, code={code:?}, message={message:?})")
            }
        }
    }
}

impl From<QueryResult> for PyQueryResult {
    fn from(inner: QueryResult) -> Self {
        Self { inner }
    }
}

/// An engine instance owned by the Python object
#[pyclass(name = "Engine", module = "osrmbindings")]
pub struct PyEngine {
    engine: Engine,
}

#[pymethods]
impl PyEngine {
    #[new]
    #[pyo3(signature = (path, algorithm=None))]
    fn new(py: Python<'_>, path: &str, algorithm: Option<&str>) -> PyResult<Self> {
        let mut config = EngineConfig::new(path).apply_env().map_err(to_py_err)?;
        if let Some(algorithm) = algorithm {
            config.algorithm = algorithm.parse().map_err(to_py_err)?;
        }

        let engine = py
            .allow_threads(|| EngineAdapter::with_config(&config))
            .map_err(to_py_err)?;
        Ok(Self { engine })
    }

    fn route(&self, py: Python<'_>, longitudes: Vec<f64>, latitudes: Vec<f64>) -> PyResult<PyQueryResult> {
        let engine = &self.engine;
        py.allow_threads(|| engine.route(&longitudes, &latitudes))
            .map(PyQueryResult::from)
            .map_err(to_py_err)
    }

    /// `annotations` is "duration", "distance" or "duration,distance"
    #[pyo3(signature = (longitudes, latitudes, annotations=None))]
    fn table(
        &self,
        py: Python<'_>,
        longitudes: Vec<f64>,
        latitudes: Vec<f64>,
        annotations: Option<&str>,
    ) -> PyResult<PyQueryResult> {
        let mut params = TableParameters::new(
            Coordinate::from_lists(&longitudes, &latitudes).map_err(to_py_err)?,
        );
        params.annotations = annotations
            .map(str::parse::<TableAnnotations>)
            .transpose()
            .map_err(to_py_err)?;

        let engine = &self.engine;
        py.allow_threads(|| engine.table_with(&params))
            .map(PyQueryResult::from)
            .map_err(to_py_err)
    }

    fn nearest(&self, py: Python<'_>, longitude: f64, latitude: f64) -> PyResult<PyQueryResult> {
        let engine = &self.engine;
        py.allow_threads(|| engine.nearest(longitude, latitude))
            .map(PyQueryResult::from)
            .map_err(to_py_err)
    }
}

#[pymodule]
fn osrmbindings(_py: Python, m: &PyModule) -> PyResult<()> {
    crate::init_logging();
    m.add("__doc__", "OSRM Bindings")?;

    m.add_function(wrap_pyfunction!(route, m)?)?;
    m.add_function(wrap_pyfunction!(table, m)?)?;
    m.add_function(wrap_pyfunction!(nearest, m)?)?;
    m.add_function(wrap_pyfunction!(initialize, m)?)?;

    m.add_class::<PyEngine>()?;
    m.add_class::<PyQueryResult>()?;
    Ok(())
}
