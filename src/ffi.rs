//! C-compatible Foreign Function Interface (FFI) for butterfly-osrm
//!
//! This module provides C-compatible bindings that allow the routing engine
//! adapter to be used from C, C++, Python (via ctypes), and other languages
//! that support calling C libraries.
//!
//! # Memory Management
//!
//! - All string parameters should be null-terminated C strings (char*)
//! - Engine handles come from `osrm_engine_new()` and must be released with `osrm_engine_free()`
//! - Returned strings are allocated by Rust and must be freed with `osrm_free_string()`
//!
//! # Error Handling
//!
//! Query functions return an OsrmResult code and write text to `out`:
//! - 0: Success, `out` holds the engine's JSON document
//! - 1: Query failed, `out` holds the engine's message
//! - 2: Invalid parameter, `out` untouched
//! - 3: Engine error (startup, network, malformed reply), `out` untouched
//! - 4: Unknown error (unclassified engine status), `out` untouched

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use libc::{c_double, size_t};
use log::error;

use crate::{Engine, Error, QueryResult};

/// Result codes for C FFI
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsrmResult {
    Success = 0,
    QueryFailed = 1,
    InvalidParameter = 2,
    EngineError = 3,
    UnknownError = 4,
}

/// Opaque engine handle for C callers
pub struct OsrmEngineHandle {
    engine: Engine,
}

fn error_code(err: &Error) -> OsrmResult {
    match err {
        e if e.is_argument_error() => OsrmResult::InvalidParameter,
        Error::UnclassifiedStatus { .. } => OsrmResult::UnknownError,
        _ => OsrmResult::EngineError,
    }
}

/// Write a query result to `out` and return its code
fn deliver(result: crate::Result<QueryResult>, out: *mut *mut c_char) -> OsrmResult {
    let (code, text) = match result {
        Ok(QueryResult::Success(document)) => (OsrmResult::Success, document.render()),
        Ok(QueryResult::Failure { message, .. }) => (OsrmResult::QueryFailed, message),
        Err(e) => {
            error!("osrm query failed: {e}");
            return error_code(&e);
        }
    };

    match CString::new(text) {
        Ok(c_string) => {
            unsafe { *out = c_string.into_raw() };
            code
        }
        Err(_) => OsrmResult::EngineError,
    }
}

/// Borrow `len` doubles from a C array
///
/// # Safety
/// `values` must point to at least `len` readable doubles, or `len` must be 0.
unsafe fn borrow_doubles<'a>(values: *const c_double, len: size_t) -> Option<&'a [f64]> {
    if len == 0 {
        Some(&[])
    } else if values.is_null() {
        None
    } else {
        Some(std::slice::from_raw_parts(values, len))
    }
}

/// Start an engine for a dataset
///
/// Installs a stderr logger (`RUST_LOG`, default `warn`) unless one is already set.
///
/// # Parameters
/// - `dataset_path`: Base path of a CH-prepared dataset (null-terminated string)
/// - `out`: Receives the engine handle on success
///
/// # Returns
/// OsrmResult code
#[no_mangle]
pub extern "C" fn osrm_engine_new(
    dataset_path: *const c_char,
    out: *mut *mut OsrmEngineHandle,
) -> OsrmResult {
    crate::init_logging();

    // Validate input parameters
    if dataset_path.is_null() || out.is_null() {
        return OsrmResult::InvalidParameter;
    }

    let path = match unsafe { CStr::from_ptr(dataset_path) }.to_str() {
        Ok(s) => s,
        Err(_) => return OsrmResult::InvalidParameter,
    };

    match crate::initialize(path) {
        Ok(engine) => {
            let handle = Box::new(OsrmEngineHandle { engine });
            unsafe { *out = Box::into_raw(handle) };
            OsrmResult::Success
        }
        Err(e) => {
            error!("osrm engine initialization failed: {e}");
            error_code(&e)
        }
    }
}

/// Release an engine handle
///
/// # Parameters
/// - `handle`: Handle returned by `osrm_engine_new()`, or NULL
#[no_mangle]
pub extern "C" fn osrm_engine_free(handle: *mut OsrmEngineHandle) {
    if !handle.is_null() {
        unsafe {
            drop(Box::from_raw(handle));
        }
    }
}

/// Route through `len` coordinates in order
///
/// # Parameters
/// - `handle`: Engine handle
/// - `longitudes`, `latitudes`: Arrays of `len` doubles each
/// - `out`: Receives the document or message; free with `osrm_free_string()`
#[no_mangle]
pub extern "C" fn osrm_route(
    handle: *const OsrmEngineHandle,
    longitudes: *const c_double,
    latitudes: *const c_double,
    len: size_t,
    out: *mut *mut c_char,
) -> OsrmResult {
    if handle.is_null() || out.is_null() {
        return OsrmResult::InvalidParameter;
    }
    let (Some(lons), Some(lats)) = (unsafe { borrow_doubles(longitudes, len) }, unsafe {
        borrow_doubles(latitudes, len)
    }) else {
        return OsrmResult::InvalidParameter;
    };

    let engine = unsafe { &(*handle).engine };
    deliver(engine.route(lons, lats), out)
}

/// Duration matrix among `len` coordinates
///
/// Parameters as for `osrm_route()`.
#[no_mangle]
pub extern "C" fn osrm_table(
    handle: *const OsrmEngineHandle,
    longitudes: *const c_double,
    latitudes: *const c_double,
    len: size_t,
    out: *mut *mut c_char,
) -> OsrmResult {
    if handle.is_null() || out.is_null() {
        return OsrmResult::InvalidParameter;
    }
    let (Some(lons), Some(lats)) = (unsafe { borrow_doubles(longitudes, len) }, unsafe {
        borrow_doubles(latitudes, len)
    }) else {
        return OsrmResult::InvalidParameter;
    };

    let engine = unsafe { &(*handle).engine };
    deliver(engine.table(lons, lats), out)
}

/// Snap one coordinate to the network
#[no_mangle]
pub extern "C" fn osrm_nearest(
    handle: *const OsrmEngineHandle,
    longitude: c_double,
    latitude: c_double,
    out: *mut *mut c_char,
) -> OsrmResult {
    if handle.is_null() || out.is_null() {
        return OsrmResult::InvalidParameter;
    }

    let engine = unsafe { &(*handle).engine };
    deliver(engine.nearest(longitude, latitude), out)
}

/// Free a string allocated by the library
///
/// # Parameters
/// - `ptr`: String pointer returned by library functions
#[no_mangle]
pub extern "C" fn osrm_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            drop(CString::from_raw(ptr));
        }
    }
}

/// Get library version string
///
/// # Returns
/// Static string with version information (does not need to be freed)
#[no_mangle]
pub extern "C" fn osrm_version() -> *const c_char {
    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<CString> = OnceLock::new();

    VERSION_STRING
        .get_or_init(|| {
            CString::new(format!("butterfly-osrm {}", env!("BUTTERFLY_VERSION")))
                .unwrap_or_default()
        })
        .as_ptr()
}
