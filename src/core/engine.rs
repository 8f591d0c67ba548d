//! The routing engine seam and its OSRM implementation
//!
//! [`RoutingEngine`] is the consumed interface: typed parameters in, a
//! status-tagged JSON reply out. [`OsrmEngine`] speaks the v1 HTTP protocol
//! to `osrm-routed`, launching it when the configuration asks for it.
//! Calls block the current thread; do not use from inside an async runtime.

use std::time::{Duration, Instant};

use log::{debug, info};
use reqwest::{Client, ClientBuilder};
use serde_json::Value;
use tokio::runtime::Runtime;

use crate::core::config::{Backend, EngineConfig};
use crate::core::error::{Error, Result};
use crate::core::params::{NearestParameters, QueryParameters, RouteParameters, TableParameters};
use crate::core::response::{EngineReply, Status};
use crate::core::routed::RoutedProcess;

/// First delay between readiness probes (in milliseconds)
const BASE_PROBE_DELAY_MS: u64 = 100;

/// Longest delay between readiness probes (in milliseconds)
const MAX_PROBE_DELAY_MS: u64 = 2000;

/// A routing engine answering route, table and nearest queries
pub trait RoutingEngine: Send + Sync {
    fn route(&self, params: &RouteParameters) -> Result<EngineReply>;

    fn table(&self, params: &TableParameters) -> Result<EngineReply>;

    fn nearest(&self, params: &NearestParameters) -> Result<EngineReply>;
}

impl<E: RoutingEngine + ?Sized> RoutingEngine for Box<E> {
    fn route(&self, params: &RouteParameters) -> Result<EngineReply> {
        (**self).route(params)
    }

    fn table(&self, params: &TableParameters) -> Result<EngineReply> {
        (**self).table(params)
    }

    fn nearest(&self, params: &NearestParameters) -> Result<EngineReply> {
        (**self).nearest(params)
    }
}

/// OSRM reached over its HTTP API
pub struct OsrmEngine {
    runtime: Runtime,
    client: Client,
    base_url: String,
    profile: String,
    // Dropped last: the process outlives in-flight requests
    process: Option<RoutedProcess>,
}

impl OsrmEngine {
    /// Validate the dataset and bring up the configured backend
    pub fn start(config: &EngineConfig) -> Result<Self> {
        config.validate_dataset()?;

        let runtime = build_runtime()?;
        let client = build_client(config.request_timeout)?;

        match &config.backend {
            Backend::Remote { url } => {
                info!("Using OSRM endpoint {url} ({})", config.algorithm);
                Ok(Self {
                    runtime,
                    client,
                    base_url: url.trim_end_matches('/').to_string(),
                    profile: config.profile.clone(),
                    process: None,
                })
            }
            Backend::Spawn { binary } => {
                let mut process = RoutedProcess::spawn(binary, config)?;
                let base_url = format!("http://127.0.0.1:{}", process.port());

                wait_until_ready(
                    &runtime,
                    &client,
                    &mut process,
                    &format!("{base_url}/nearest/v1/{}/0,0", config.profile),
                    config.startup_timeout,
                )?;
                info!(
                    "osrm-routed serving {} ({}) at {base_url}",
                    config.storage_path.display(),
                    config.algorithm
                );

                Ok(Self {
                    runtime,
                    client,
                    base_url,
                    profile: config.profile.clone(),
                    process: Some(process),
                })
            }
        }
    }

    /// Attach to a running endpoint without any dataset checks
    pub fn connect(base_url: &str, profile: &str, request_timeout: Duration) -> Result<Self> {
        Ok(Self {
            runtime: build_runtime()?,
            client: build_client(request_timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            profile: profile.to_string(),
            process: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_spawned(&self) -> bool {
        self.process.is_some()
    }

    fn execute(&self, query: QueryParameters) -> Result<EngineReply> {
        let url = format!("{}{}", self.base_url, query.request_path(&self.profile));
        debug!("{} request: {url}", query.service());

        self.runtime.block_on(async {
            let response = self.client.get(&url).send().await?;
            let status = response.status().as_u16();
            let text = response.text().await?;

            let body = match serde_json::from_str::<Value>(&text) {
                Ok(body) => body,
                Err(_) if matches!(status, 200 | 400..=499) => {
                    return Err(Error::MalformedResponse(format!(
                        "HTTP {status} with non-JSON body: {}",
                        snippet(&text)
                    )));
                }
                Err(_) => Value::Null,
            };

            let status = Status::from_http(status, &body);
            debug!("{} reply: {status:?}", query.service());
            Ok::<_, Error>(EngineReply::new(status, body))
        })
    }
}

impl RoutingEngine for OsrmEngine {
    fn route(&self, params: &RouteParameters) -> Result<EngineReply> {
        self.execute(QueryParameters::Route(params.clone()))
    }

    fn table(&self, params: &TableParameters) -> Result<EngineReply> {
        self.execute(QueryParameters::Table(params.clone()))
    }

    fn nearest(&self, params: &NearestParameters) -> Result<EngineReply> {
        self.execute(QueryParameters::Nearest(params.clone()))
    }
}

fn build_runtime() -> Result<Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("butterfly-osrm")
        .enable_all()
        .build()?)
}

fn build_client(request_timeout: Duration) -> Result<Client> {
    Ok(ClientBuilder::new()
        .tcp_keepalive(Duration::from_secs(60))
        .pool_idle_timeout(Duration::from_secs(90))
        .timeout(request_timeout)
        .connect_timeout(Duration::from_secs(10))
        .user_agent(format!("butterfly-osrm/{}", env!("BUTTERFLY_VERSION")))
        .build()?)
}

/// Probe `probe_url` until the engine answers any HTTP response
///
/// Network errors are retried with exponential backoff until `timeout`;
/// an exited child ends the wait immediately.
fn wait_until_ready(
    runtime: &Runtime,
    client: &Client,
    process: &mut RoutedProcess,
    probe_url: &str,
    timeout: Duration,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    let mut delay = BASE_PROBE_DELAY_MS;
    let mut attempt = 0u32;

    loop {
        process.ensure_running()?;

        let probe = runtime.block_on(async {
            let response = client.get(probe_url).send().await?;
            Ok::<_, Error>(response.status().as_u16())
        });

        match probe {
            Ok(status) => {
                debug!("osrm-routed answered probe with HTTP {status} after {attempt} retries");
                return Ok(());
            }
            Err(Error::Network(msg)) if Instant::now() < deadline => {
                attempt += 1;
                debug!("osrm-routed not ready (attempt {attempt}): {msg}");
                std::thread::sleep(Duration::from_millis(delay));
                delay = (delay * 2).min(MAX_PROBE_DELAY_MS);
            }
            Err(Error::Network(msg)) => {
                return Err(Error::EngineStartup(format!(
                    "osrm-routed not ready after {timeout:?}: {msg}{}",
                    process.output_tail()
                )));
            }
            Err(e) => return Err(e),
        }
    }
}

fn snippet(text: &str) -> String {
    const LIMIT: usize = 120;
    match text.char_indices().nth(LIMIT) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
