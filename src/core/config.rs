//! Engine configuration
//!
//! An [`EngineConfig`] names the dataset, the search algorithm it was
//! prepared for, and how the engine is reached: either a spawned
//! `osrm-routed` bound to the dataset, or an already running endpoint.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::core::error::{Error, Result};

/// Default executable used to serve a dataset
pub const DEFAULT_ROUTED_BINARY: &str = "osrm-routed";

/// Speed-up technique the dataset was prepared with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    /// Contraction Hierarchies: extract + contract
    #[default]
    Ch,
    /// Multi-Level Dijkstra: extract + partition + customize
    Mld,
}

impl Algorithm {
    /// Value for `osrm-routed --algorithm`
    pub fn as_arg(self) -> &'static str {
        match self {
            Algorithm::Ch => "ch",
            Algorithm::Mld => "mld",
        }
    }

    /// Dataset file suffixes the algorithm needs next to the base path
    pub fn required_suffixes(self) -> &'static [&'static str] {
        match self {
            Algorithm::Ch => &["hsgr"],
            Algorithm::Mld => &["partition", "cells", "mldgr"],
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Ch => write!(f, "CH"),
            Algorithm::Mld => write!(f, "MLD"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ch" => Ok(Algorithm::Ch),
            "mld" => Ok(Algorithm::Mld),
            other => Err(Error::InvalidInput(format!(
                "unknown algorithm '{other}' (expected 'ch' or 'mld')"
            ))),
        }
    }
}

/// How the engine is reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// Launch `binary` against the dataset and own the process
    Spawn { binary: PathBuf },
    /// Attach to an engine already serving the dataset
    Remote { url: String },
}

impl Default for Backend {
    fn default() -> Self {
        Backend::Spawn {
            binary: PathBuf::from(DEFAULT_ROUTED_BINARY),
        }
    }
}

/// Configuration for an engine instance
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base path of the prepared dataset, e.g. `/data/monaco.osrm`
    pub storage_path: PathBuf,

    pub algorithm: Algorithm,

    /// Serve from datasets loaded by `osrm-datastore` instead of the files
    pub use_shared_memory: bool,

    /// Profile segment of request paths; the engine serves one profile per dataset
    pub profile: String,

    pub backend: Backend,

    /// Upper bound on table query size passed to a spawned engine
    pub max_table_size: Option<usize>,

    /// How long a spawned engine may take to answer its first request
    pub startup_timeout: Duration,

    /// Bound on each request/response exchange
    pub request_timeout: Duration,
}

impl EngineConfig {
    /// Configuration for a dataset loaded from files with CH
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: storage_path.into(),
            algorithm: Algorithm::Ch,
            use_shared_memory: false,
            profile: "driving".to_string(),
            backend: Backend::default(),
            max_table_size: None,
            startup_timeout: Duration::from_secs(60),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Apply `OSRM_ROUTED_BIN`, `OSRM_ENDPOINT`, `OSRM_ALGORITHM` and `OSRM_PROFILE`
    pub fn apply_env(self) -> Result<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Same as [`apply_env`](Self::apply_env), reading variables through `var`
    pub fn apply_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(binary) = var("OSRM_ROUTED_BIN") {
            self.backend = Backend::Spawn {
                binary: PathBuf::from(binary),
            };
        }
        // An endpoint wins over a binary: there is nothing to launch
        if let Some(url) = var("OSRM_ENDPOINT") {
            self.backend = Backend::Remote { url };
        }
        if let Some(algorithm) = var("OSRM_ALGORITHM") {
            self.algorithm = algorithm.parse()?;
        }
        if let Some(profile) = var("OSRM_PROFILE") {
            self.profile = profile;
        }
        Ok(self)
    }

    /// Check that the dataset files the algorithm needs are present
    ///
    /// Skipped for shared memory and remote endpoints, where the files are
    /// not read by this process.
    pub fn validate_dataset(&self) -> Result<()> {
        if self.use_shared_memory || matches!(self.backend, Backend::Remote { .. }) {
            return Ok(());
        }

        let base = &self.storage_path;
        if !dataset_exists(base) {
            return Err(Error::DatasetNotFound { path: base.clone() });
        }

        let missing: Vec<String> = self
            .algorithm
            .required_suffixes()
            .iter()
            .map(|suffix| with_suffix(base, suffix))
            .filter(|path| !path.exists())
            .map(|path| {
                path.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string())
            })
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::IncompatibleDataset {
                path: base.clone(),
                algorithm: self.algorithm,
                missing,
            })
        }
    }

    /// Command-line arguments for a spawned `osrm-routed`
    pub(crate) fn routed_args(&self, port: u16) -> Vec<String> {
        let mut args = vec![
            "--ip".to_string(),
            "127.0.0.1".to_string(),
            "--port".to_string(),
            port.to_string(),
            "--algorithm".to_string(),
            self.algorithm.as_arg().to_string(),
        ];
        if let Some(size) = self.max_table_size {
            args.push("--max-table-size".to_string());
            args.push(size.to_string());
        }
        if self.use_shared_memory {
            args.push("--shared-memory".to_string());
        } else {
            args.push(self.storage_path.display().to_string());
        }
        args
    }
}

/// `monaco.osrm` + `hsgr` -> `monaco.osrm.hsgr`
fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// A dataset exists when the base file or any `<base>.*` file exists
fn dataset_exists(base: &Path) -> bool {
    if base.is_file() {
        return true;
    }

    let Some(stem) = base.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return false;
    };
    let dir = match base.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let prefix = format!("{stem}.");

    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .any(|entry| entry.file_name().to_string_lossy().starts_with(&prefix))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::new("/data/monaco.osrm");
        assert_eq!(config.algorithm, Algorithm::Ch);
        assert!(!config.use_shared_memory);
        assert_eq!(config.profile, "driving");
        assert_eq!(
            config.backend,
            Backend::Spawn { binary: PathBuf::from("osrm-routed") }
        );
    }

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!("ch".parse::<Algorithm>().unwrap(), Algorithm::Ch);
        assert_eq!("MLD".parse::<Algorithm>().unwrap(), Algorithm::Mld);
        assert!("dijkstra".parse::<Algorithm>().is_err());
    }

    #[test]
    fn test_ch_dataset_validates() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "monaco.osrm.hsgr");
        touch(dir.path(), "monaco.osrm.ebg");

        let config = EngineConfig::new(dir.path().join("monaco.osrm"));
        assert!(config.validate_dataset().is_ok());
    }

    #[test]
    fn test_mld_dataset_missing_partition_is_incompatible() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "monaco.osrm.hsgr");
        touch(dir.path(), "monaco.osrm.mldgr");

        let mut config = EngineConfig::new(dir.path().join("monaco.osrm"));
        config.algorithm = Algorithm::Mld;

        match config.validate_dataset().unwrap_err() {
            Error::IncompatibleDataset { algorithm, missing, .. } => {
                assert_eq!(algorithm, Algorithm::Mld);
                assert_eq!(missing, vec!["monaco.osrm.partition", "monaco.osrm.cells"]);
            }
            other => panic!("Expected IncompatibleDataset, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_dataset_is_not_found() {
        let dir = tempdir().unwrap();
        let config = EngineConfig::new(dir.path().join("nowhere.osrm"));
        assert!(matches!(
            config.validate_dataset().unwrap_err(),
            Error::DatasetNotFound { .. }
        ));
    }

    #[test]
    fn test_remote_backend_skips_validation() {
        let mut config = EngineConfig::new("/does/not/exist.osrm");
        config.backend = Backend::Remote { url: "http://localhost:5000".to_string() };
        assert!(config.validate_dataset().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("OSRM_ENDPOINT", "http://router:5000"),
            ("OSRM_ALGORITHM", "mld"),
            ("OSRM_PROFILE", "foot"),
        ]
        .into_iter()
        .collect();

        let config = EngineConfig::new("/data/monaco.osrm")
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.backend, Backend::Remote { url: "http://router:5000".to_string() });
        assert_eq!(config.algorithm, Algorithm::Mld);
        assert_eq!(config.profile, "foot");
    }

    #[test]
    fn test_env_rejects_bad_algorithm() {
        let result = EngineConfig::new("/data/monaco.osrm")
            .apply_overrides(|key| (key == "OSRM_ALGORITHM").then(|| "astar".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_routed_args() {
        let mut config = EngineConfig::new("/data/monaco.osrm");
        config.max_table_size = Some(1000);

        assert_eq!(
            config.routed_args(5001),
            vec![
                "--ip", "127.0.0.1", "--port", "5001", "--algorithm", "ch",
                "--max-table-size", "1000", "/data/monaco.osrm",
            ]
        );

        config.use_shared_memory = true;
        let args = config.routed_args(5001);
        assert_eq!(args.last().map(String::as_str), Some("--shared-memory"));
    }
}
