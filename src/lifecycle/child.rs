//! Function process management.
//!
//! # Responsibilities
//! - Spawn the function command with inherited stdio
//! - Wait until the function accepts TCP connections
//! - Tie the function's lifetime to the membrane's

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::time::Instant;

use crate::lifecycle::Shutdown;

/// Interval between readiness dials.
pub const READY_POLL_INTERVAL: Duration = Duration::from_millis(15);

#[derive(Debug, thiserror::Error)]
pub enum ChildError {
    #[error("child command is empty")]
    EmptyCommand,
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("child exited before becoming ready ({0})")]
    Exited(std::process::ExitStatus),
    #[error("child did not accept connections on {address} within {timeout:?}")]
    NotReady { address: String, timeout: Duration },
    #[error("failed to poll child: {0}")]
    Wait(#[source] io::Error),
}

/// A running function process.
#[derive(Debug)]
pub struct ChildProcess {
    child: Child,
    program: String,
}

impl ChildProcess {
    /// Spawn `command` (program followed by its arguments).
    pub fn spawn(command: &[String]) -> Result<Self, ChildError> {
        let (program, args) = command.split_first().ok_or(ChildError::EmptyCommand)?;
        let child = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ChildError::Spawn {
                program: program.clone(),
                source,
            })?;

        tracing::info!(program = %program, pid = child.id(), "Child process spawned");
        Ok(Self {
            child,
            program: program.clone(),
        })
    }

    /// Block until `address` accepts a connection, the child dies, or `timeout` passes.
    pub async fn wait_ready(&mut self, address: &str, timeout: Duration) -> Result<(), ChildError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = self.child.try_wait().map_err(ChildError::Wait)? {
                return Err(ChildError::Exited(status));
            }
            if wait_for_listener(address, READY_POLL_INTERVAL).await {
                tracing::info!(address = %address, "Child process ready");
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(ChildError::NotReady {
                    address: address.to_string(),
                    timeout,
                });
            }
        }
    }

    /// Watch the child until it exits or shutdown is requested.
    ///
    /// A child exit triggers shutdown; shutdown kills the child.
    pub fn supervise(mut self, shutdown: Arc<Shutdown>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            tokio::select! {
                status = self.child.wait() => {
                    match status {
                        Ok(status) => tracing::warn!(program = %self.program, %status, "Child process exited"),
                        Err(e) => tracing::error!(program = %self.program, error = %e, "Failed to wait on child process"),
                    }
                    shutdown.trigger();
                }
                _ = shutdown.wait() => {
                    if let Err(e) = self.child.kill().await {
                        tracing::warn!(program = %self.program, error = %e, "Failed to stop child process");
                    } else {
                        tracing::info!(program = %self.program, "Child process stopped");
                    }
                }
            }
        })
    }
}

/// Try one connection to `address`, then sleep out the rest of `interval` on failure.
async fn wait_for_listener(address: &str, interval: Duration) -> bool {
    let started = Instant::now();
    match tokio::time::timeout(interval, TcpStream::connect(address)).await {
        Ok(Ok(_)) => true,
        _ => {
            tokio::time::sleep_until(started + interval).await;
            false
        }
    }
}

/// Wait for an externally managed function to accept connections.
pub async fn wait_for_address(address: &str, timeout: Duration) -> Result<(), ChildError> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if wait_for_listener(address, READY_POLL_INTERVAL).await {
            return Ok(());
        }
    }
    Err(ChildError::NotReady {
        address: address.to_string(),
        timeout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn test_empty_command() {
        assert!(matches!(ChildProcess::spawn(&[]), Err(ChildError::EmptyCommand)));
    }

    #[tokio::test]
    async fn test_spawn_missing_program() {
        let err = ChildProcess::spawn(&["/definitely/not/a/program".to_string()]).unwrap_err();
        assert!(matches!(err, ChildError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_wait_for_address_ready() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        wait_for_address(&address, Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_wait_for_address_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = wait_for_address(&address, Duration::from_millis(60)).await.unwrap_err();
        assert!(matches!(err, ChildError::NotReady { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_child_exit_before_ready() {
        let mut child = ChildProcess::spawn(&["true".to_string()]).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = child.wait_ready(&address, Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, ChildError::Exited(_)));
    }
}
