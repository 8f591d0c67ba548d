//! # Butterfly-osrm CLI
//!
//! Command-line interface for the butterfly-osrm library.
//! Runs one route, table or nearest query against an OSRM dataset.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use butterfly_osrm::{
    Algorithm, Backend, Coordinate, Engine, EngineAdapter, EngineConfig, NearestParameters,
    QueryResult, RouteParameters, TableAnnotations, TableParameters,
};
use clap::{Parser, Subcommand, ValueEnum};
use log::error;

mod cli;

/// Command-line interface for butterfly-osrm
#[derive(Parser)]
#[command(name = "butterfly-osrm")]
#[command(about = "Query an OSRM routing engine")]
#[command(long_about = "Runs one query against an OSRM dataset:
  butterfly-osrm --dataset car/monaco.osrm route --coord 7.4197,43.7311 --coord 7.4246,43.7384
  butterfly-osrm --dataset car/monaco.osrm table --coord 7.41,43.73 --coord 7.42,43.74
  butterfly-osrm --endpoint http://localhost:5000 nearest --coord 7.4197,43.7311

The document is printed to stdout. Engine failures print CODE: MESSAGE
to stderr and exit with status 2. Flags override OSRM_* variables.")]
#[command(version = env!("BUTTERFLY_VERSION"))]
struct Cli {
    /// Base path of the prepared dataset (e.g. monaco.osrm)
    #[arg(short, long)]
    dataset: Option<PathBuf>,

    /// Use a running engine instead of launching osrm-routed [env: OSRM_ENDPOINT]
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Algorithm the dataset was prepared for [default: ch] [env: OSRM_ALGORITHM]
    #[arg(short, long, value_enum)]
    algorithm: Option<AlgorithmArg>,

    /// Profile segment of request paths [default: driving] [env: OSRM_PROFILE]
    #[arg(short, long)]
    profile: Option<String>,

    /// osrm-routed executable to launch [default: osrm-routed] [env: OSRM_ROUTED_BIN]
    #[arg(long)]
    routed_bin: Option<PathBuf>,

    /// Pretty-print the document
    #[arg(long, global = true)]
    pretty: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Route through the coordinates in order
    Route {
        /// Waypoint as LON,LAT; repeat for each stop
        #[arg(short, long = "coord", required = true, num_args = 1, allow_hyphen_values = true)]
        coords: Vec<Coordinate>,

        /// Ask for alternative routes
        #[arg(long)]
        alternatives: bool,
    },
    /// Duration matrix among the coordinates
    Table {
        #[arg(short, long = "coord", required = true, num_args = 1, allow_hyphen_values = true)]
        coords: Vec<Coordinate>,

        /// Matrices to compute (engine default: duration)
        #[arg(long, value_enum)]
        annotations: Option<AnnotationsArg>,
    },
    /// Snap a coordinate to the network
    Nearest {
        #[arg(short, long = "coord", allow_hyphen_values = true)]
        coord: Coordinate,

        /// Number of candidates to return
        #[arg(short, long)]
        number: Option<u32>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum AlgorithmArg {
    Ch,
    Mld,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Ch => Algorithm::Ch,
            AlgorithmArg::Mld => Algorithm::Mld,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum AnnotationsArg {
    Duration,
    Distance,
    Both,
}

impl From<AnnotationsArg> for TableAnnotations {
    fn from(arg: AnnotationsArg) -> Self {
        match arg {
            AnnotationsArg::Duration => TableAnnotations::Duration,
            AnnotationsArg::Distance => TableAnnotations::Distance,
            AnnotationsArg::Both => TableAnnotations::DurationAndDistance,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            error!("❌ Error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging to stderr
    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stderr)
        .init();

    if cli.verbose {
        eprintln!("🦋 Butterfly-osrm v{} starting...", env!("BUTTERFLY_VERSION"));
    }

    let config = build_config(&cli, |key| std::env::var(key).ok())?;
    let engine = start_engine(&config)?;

    let result = match cli.command {
        Command::Route { coords, alternatives } => {
            let mut params = RouteParameters::new(coords);
            params.alternatives = alternatives;
            engine.route_with(&params)?
        }
        Command::Table { coords, annotations } => {
            let mut params = TableParameters::new(coords);
            params.annotations = annotations.map(TableAnnotations::from);
            engine.table_with(&params)?
        }
        Command::Nearest { coord, number } => {
            let mut params = NearestParameters::new(coord);
            params.number = number;
            engine.nearest_with(&params)?
        }
    };

    match result {
        QueryResult::Success(document) => {
            let text = if cli.pretty {
                document.render_pretty()?
            } else {
                document.render()
            };
            println!("{text}");
            Ok(ExitCode::SUCCESS)
        }
        QueryResult::Failure { code, message } => {
            eprintln!("{code}: {message}");
            Ok(ExitCode::from(2))
        }
    }
}

/// Layer CLI flags over the `OSRM_*` variables read through `var`
fn build_config(cli: &Cli, var: impl Fn(&str) -> Option<String>) -> anyhow::Result<EngineConfig> {
    let mut config = EngineConfig::new(cli.dataset.clone().unwrap_or_default())
        .apply_overrides(var)
        .context("invalid OSRM_* environment")?;

    if let Some(binary) = &cli.routed_bin {
        config.backend = Backend::Spawn { binary: binary.clone() };
    }
    if let Some(url) = &cli.endpoint {
        config.backend = Backend::Remote { url: url.clone() };
    }
    if let Some(algorithm) = cli.algorithm {
        config.algorithm = algorithm.into();
    }
    if let Some(profile) = &cli.profile {
        config.profile = profile.clone();
    }

    if cli.dataset.is_none() && !matches!(config.backend, Backend::Remote { .. }) {
        bail!("either --dataset or --endpoint (or OSRM_ENDPOINT) is required");
    }
    Ok(config)
}

/// Start the engine, with a spinner while a spawned engine loads
fn start_engine(config: &EngineConfig) -> anyhow::Result<Engine> {
    if let Backend::Remote { url } = &config.backend {
        return EngineAdapter::with_config(config)
            .with_context(|| format!("connecting to {url}"));
    }

    let dataset = config.storage_path.display().to_string();
    let spinner = cli::StartupSpinner::start(&format!("🌐 Loading {dataset} ({})", config.algorithm));
    match EngineAdapter::with_config(config) {
        Ok(engine) => {
            spinner.finish("✅ Engine ready");
            Ok(engine)
        }
        Err(e) => {
            spinner.abandon();
            Err(anyhow::Error::new(e).context(format!("starting engine for {dataset}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_route_command() {
        let cli = Cli::try_parse_from([
            "butterfly-osrm", "--dataset", "monaco.osrm", "route",
            "--coord", "7.4197,43.7311", "--coord", "7.4246,43.7384",
        ])
        .unwrap();

        match cli.command {
            Command::Route { coords, alternatives } => {
                assert_eq!(coords.len(), 2);
                assert_eq!(coords[1].longitude, 7.4246);
                assert!(!alternatives);
            }
            _ => panic!("Expected route command"),
        }
    }

    #[test]
    fn test_negative_coordinates_parse() {
        let cli = Cli::try_parse_from([
            "butterfly-osrm", "--dataset", "cuba.osrm", "nearest", "--coord", "-82.38,23.13",
        ])
        .unwrap();

        match cli.command {
            Command::Nearest { coord, number } => {
                assert_eq!(coord.longitude, -82.38);
                assert_eq!(number, None);
            }
            _ => panic!("Expected nearest command"),
        }
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_dataset_or_endpoint_required() {
        let cli = Cli::try_parse_from(["butterfly-osrm", "nearest", "--coord", "7.41,43.73"]).unwrap();
        assert!(build_config(&cli, no_env).is_err());

        let config = build_config(&cli, |key| {
            (key == "OSRM_ENDPOINT").then(|| "http://router:5000".to_string())
        })
        .unwrap();
        assert_eq!(config.backend, Backend::Remote { url: "http://router:5000".to_string() });
    }

    #[test]
    fn test_endpoint_config() {
        let cli = Cli::try_parse_from([
            "butterfly-osrm", "--endpoint", "http://localhost:5000", "--algorithm", "mld",
            "table", "--coord", "7.41,43.73",
        ])
        .unwrap();

        let config = build_config(&cli, no_env).unwrap();
        assert_eq!(config.algorithm, Algorithm::Mld);
        assert_eq!(config.backend, Backend::Remote { url: "http://localhost:5000".to_string() });
    }

    #[test]
    fn test_spawn_config() {
        let cli = Cli::try_parse_from([
            "butterfly-osrm", "--dataset", "monaco.osrm", "--routed-bin", "/opt/osrm/bin/osrm-routed",
            "nearest", "--coord", "7.41,43.73",
        ])
        .unwrap();

        let config = build_config(&cli, no_env).unwrap();
        assert_eq!(config.storage_path, PathBuf::from("monaco.osrm"));
        assert_eq!(config.algorithm, Algorithm::Ch);
        assert_eq!(config.profile, "driving");
        assert_eq!(
            config.backend,
            Backend::Spawn { binary: PathBuf::from("/opt/osrm/bin/osrm-routed") }
        );
    }

    #[test]
    fn test_environment_applies_under_flags() {
        let vars: HashMap<&str, &str> = [
            ("OSRM_ALGORITHM", "mld"),
            ("OSRM_PROFILE", "foot"),
            ("OSRM_ROUTED_BIN", "/usr/local/bin/osrm-routed"),
        ]
        .into_iter()
        .collect();
        let env = |key: &str| vars.get(key).map(|v| v.to_string());

        let cli = Cli::try_parse_from([
            "butterfly-osrm", "--dataset", "monaco.osrm", "nearest", "--coord", "7.41,43.73",
        ])
        .unwrap();
        let config = build_config(&cli, env).unwrap();
        assert_eq!(config.algorithm, Algorithm::Mld);
        assert_eq!(config.profile, "foot");
        assert_eq!(
            config.backend,
            Backend::Spawn { binary: PathBuf::from("/usr/local/bin/osrm-routed") }
        );

        let cli = Cli::try_parse_from([
            "butterfly-osrm", "--dataset", "monaco.osrm", "--algorithm", "ch", "--profile", "driving",
            "nearest", "--coord", "7.41,43.73",
        ])
        .unwrap();
        let config = build_config(&cli, env).unwrap();
        assert_eq!(config.algorithm, Algorithm::Ch);
        assert_eq!(config.profile, "driving");
    }

    #[test]
    fn test_invalid_environment_is_reported() {
        let cli = Cli::try_parse_from([
            "butterfly-osrm", "--dataset", "monaco.osrm", "nearest", "--coord", "7.41,43.73",
        ])
        .unwrap();
        let err = build_config(&cli, |key| (key == "OSRM_ALGORITHM").then(|| "astar".to_string()))
            .unwrap_err();
        assert!(format!("{err:#}").contains("astar"));
    }
}
