//! Supervision of a spawned `osrm-routed` process
//!
//! The child serves one dataset on a loopback port picked at launch. Its
//! output is drained into the `osrm-routed` log target so the pipes never
//! fill; the last lines are kept for startup diagnostics. The child is
//! killed when the handle drops.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};
use std::net::TcpListener;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;

use log::{debug, warn};

use crate::core::config::EngineConfig;
use crate::core::error::{Error, Result};

/// Number of output lines kept for error reports
const TAIL_LINES: usize = 20;

type OutputTail = Arc<Mutex<VecDeque<String>>>;

/// A running `osrm-routed` child
pub struct RoutedProcess {
    child: Child,
    port: u16,
    tail: OutputTail,
}

impl RoutedProcess {
    /// Launch `binary` against the configured dataset on a free loopback port
    pub fn spawn(binary: &Path, config: &EngineConfig) -> Result<Self> {
        let port = free_port()?;
        let args = config.routed_args(port);
        debug!("Launching {} {}", binary.display(), args.join(" "));

        let mut child = Command::new(binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                Error::EngineStartup(format!("could not launch '{}': {e}", binary.display()))
            })?;

        let tail: OutputTail = Arc::new(Mutex::new(VecDeque::with_capacity(TAIL_LINES)));
        if let Some(stdout) = child.stdout.take() {
            drain(stdout, Arc::clone(&tail));
        }
        if let Some(stderr) = child.stderr.take() {
            drain(stderr, Arc::clone(&tail));
        }

        Ok(Self { child, port, tail })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Fail if the child has already exited
    pub fn ensure_running(&mut self) -> Result<()> {
        match self.child.try_wait()? {
            None => Ok(()),
            Some(status) => Err(Error::EngineStartup(format!(
                "osrm-routed exited with {status}{}",
                self.output_tail()
            ))),
        }
    }

    /// Recent output, formatted for inclusion in an error message
    pub fn output_tail(&self) -> String {
        let lines = match self.tail.lock() {
            Ok(tail) => tail.iter().cloned().collect::<Vec<_>>(),
            Err(_) => Vec::new(),
        };
        if lines.is_empty() {
            String::new()
        } else {
            format!(":\n{}", lines.join("\n"))
        }
    }
}

impl Drop for RoutedProcess {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            debug!("Stopping osrm-routed on port {}", self.port);
            if let Err(e) = self.child.kill() {
                warn!("Failed to stop osrm-routed (pid {}): {e}", self.child.id());
            }
        }
        let _ = self.child.wait();
    }
}

/// Ask the OS for an unused loopback port
///
/// The probe listener is closed before `osrm-routed` binds, so another
/// process can take the port in between. `osrm-routed` then exits with
/// "Address already in use", which surfaces as `Error::EngineStartup`; callers
/// may retry the start.
fn free_port() -> Result<u16> {
    let listener = TcpListener::bind(("127.0.0.1", 0))?;
    Ok(listener.local_addr()?.port())
}

fn drain(stream: impl Read + Send + 'static, tail: OutputTail) {
    thread::spawn(move || {
        for line in BufReader::new(stream).lines() {
            let Ok(line) = line else { break };
            debug!(target: "osrm-routed", "{line}");
            if let Ok(mut tail) = tail.lock() {
                if tail.len() == TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_free_port_is_nonzero() {
        assert_ne!(free_port().unwrap(), 0);
    }

    #[test]
    fn test_missing_binary_is_startup_error() {
        let config = EngineConfig::new("/data/monaco.osrm");
        let result = RoutedProcess::spawn(&PathBuf::from("/nonexistent/osrm-routed"), &config);

        match result {
            Err(Error::EngineStartup(msg)) => assert!(msg.contains("/nonexistent/osrm-routed")),
            Err(other) => panic!("Expected EngineStartup, got {other:?}"),
            Ok(_) => panic!("Spawning a missing binary should fail"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_port_taken_surfaces_as_startup_error() {
        use std::os::unix::fs::PermissionsExt;
        use std::time::{Duration, Instant};

        let dir = tempfile::tempdir().unwrap();
        let binary = dir.path().join("osrm-routed");
        std::fs::write(
            &binary,
            "#!/bin/sh\necho \"[error] bind: Address already in use\" >&2\nexit 1\n",
        )
        .unwrap();
        std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755)).unwrap();

        let config = EngineConfig::new("/data/monaco.osrm");
        let mut process = RoutedProcess::spawn(&binary, &config).unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        let msg = loop {
            match process.ensure_running() {
                Err(Error::EngineStartup(msg)) if msg.contains("Address already in use") => break msg,
                Err(Error::EngineStartup(_)) | Ok(()) if Instant::now() < deadline => {
                    thread::sleep(Duration::from_millis(20));
                }
                other => panic!("Expected EngineStartup naming the port clash, got {other:?}"),
            }
        };
        assert!(msg.starts_with("osrm-routed exited with"));
    }
}
