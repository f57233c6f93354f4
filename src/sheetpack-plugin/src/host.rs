//! Exec-based plugin host that talks to an external pack process via JSON over stdio.

use crate::protocol::{
    PluginInfo, PluginMethod, PluginRequest, PluginResponse, PluginResult, PROTOCOL_VERSION,
};
use sheetpack_core::ResponseEnvelope;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginHostError {
    #[error("failed to spawn plugin process: {0}")]
    SpawnFailed(std::io::Error),
    #[error("plugin process has no stdin")]
    NoStdin,
    #[error("plugin process has no stdout")]
    NoStdout,
    #[error("failed to write to plugin: {0}")]
    WriteError(std::io::Error),
    #[error("failed to read from plugin: {0}")]
    ReadError(std::io::Error),
    #[error("failed to parse plugin response: {0}")]
    ParseError(serde_json::Error),
    #[error("plugin returned error: {0}")]
    PluginError(String),
    #[error("protocol version mismatch: expected {expected}, got {actual}")]
    ProtocolMismatch { expected: u32, actual: u32 },
    #[error("unexpected response type for method")]
    UnexpectedResponse,
    #[error("request/response ID mismatch: sent {sent}, received {received}")]
    IdMismatch { sent: u64, received: u64 },
    #[error("plugin process terminated unexpectedly")]
    ProcessTerminated,
}

/// How to launch an external pack.
#[derive(Debug, Clone)]
pub struct PluginConfig {
    pub executable: PathBuf,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl PluginConfig {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            args: Vec::new(),
            working_dir: None,
            env: Vec::new(),
        }
    }
}

/// The plugin's pipes. Locked as one so a request and its response are
/// never split between callers.
struct PluginIo {
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// Host for an external plugin process. Requests are serialised: a call
/// holds the pipe lock from writing its request until its response is read.
pub struct ExecPluginHost {
    config: PluginConfig,
    child: Mutex<Option<Child>>,
    io: Mutex<Option<PluginIo>>,
    request_id: AtomicU64,
    info: Mutex<Option<PluginInfo>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ExecPluginHost {
    pub fn new(config: PluginConfig) -> Self {
        Self {
            config,
            child: Mutex::new(None),
            io: Mutex::new(None),
            request_id: AtomicU64::new(1),
            info: Mutex::new(None),
        }
    }

    /// Start the plugin process and perform the handshake.
    pub fn start(&self) -> Result<PluginInfo, PluginHostError> {
        let mut cmd = Command::new(&self.config.executable);
        cmd.args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        if let Some(ref dir) = self.config.working_dir {
            cmd.current_dir(dir);
        }

        for (key, value) in &self.config.env {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(PluginHostError::SpawnFailed)?;

        let stdin = child.stdin.take().ok_or(PluginHostError::NoStdin)?;
        let stdout = child.stdout.take().ok_or(PluginHostError::NoStdout)?;

        *lock(&self.child) = Some(child);
        *lock(&self.io) = Some(PluginIo {
            stdin,
            stdout: BufReader::new(stdout),
        });

        let info = self.initialize()?;
        *lock(&self.info) = Some(info.clone());

        Ok(info)
    }

    /// Stop the plugin process gracefully.
    pub fn stop(&self) -> Result<(), PluginHostError> {
        if lock(&self.io).is_some() {
            let _ = self.send_request(PluginMethod::Shutdown);
        }

        if let Some(mut child) = lock(&self.child).take() {
            let _ = child.kill();
            let _ = child.wait();
        }

        *lock(&self.io) = None;
        *lock(&self.info) = None;

        Ok(())
    }

    pub fn is_running(&self) -> bool {
        lock(&self.child)
            .as_mut()
            .map(|c| c.try_wait().ok().flatten().is_none())
            .unwrap_or(false)
    }

    /// Available after [`start`](Self::start).
    pub fn info(&self) -> Option<PluginInfo> {
        lock(&self.info).clone()
    }

    /// Ask the plugin to resolve `method`.
    pub fn call(&self, method: &str, arg: Option<&str>) -> Result<ResponseEnvelope, PluginHostError> {
        let result = self.send_request(PluginMethod::Call {
            method: method.to_string(),
            arg: arg.map(str::to_string),
        })?;
        match result {
            PluginResult::Envelope(envelope) => Ok(envelope),
            _ => Err(PluginHostError::UnexpectedResponse),
        }
    }

    /// Send a request to the plugin and receive a response.
    pub fn send_request(&self, method: PluginMethod) -> Result<PluginResult, PluginHostError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = PluginRequest { id, method };

        let json = serde_json::to_string(&request).map_err(PluginHostError::ParseError)?;

        let response_line = {
            let mut io_guard = lock(&self.io);
            let io = io_guard
                .as_mut()
                .ok_or(PluginHostError::ProcessTerminated)?;
            writeln!(io.stdin, "{}", json).map_err(PluginHostError::WriteError)?;
            io.stdin.flush().map_err(PluginHostError::WriteError)?;

            let mut line = String::new();
            io.stdout
                .read_line(&mut line)
                .map_err(PluginHostError::ReadError)?;
            if line.is_empty() {
                return Err(PluginHostError::ProcessTerminated);
            }
            line
        };

        let response: PluginResponse =
            serde_json::from_str(&response_line).map_err(PluginHostError::ParseError)?;

        if response.id != id {
            return Err(PluginHostError::IdMismatch {
                sent: id,
                received: response.id,
            });
        }

        if let PluginResult::Error(err) = &response.result {
            return Err(PluginHostError::PluginError(err.to_string()));
        }

        Ok(response.result)
    }

    fn initialize(&self) -> Result<PluginInfo, PluginHostError> {
        let result = self.send_request(PluginMethod::Initialize)?;
        match result {
            PluginResult::Initialized(info) => {
                if info.protocol_version != PROTOCOL_VERSION {
                    return Err(PluginHostError::ProtocolMismatch {
                        expected: PROTOCOL_VERSION,
                        actual: info.protocol_version,
                    });
                }
                tracing::info!(
                    plugin_id = %info.id,
                    plugin_name = %info.name,
                    plugin_version = %info.version,
                    "Plugin initialized"
                );
                Ok(info)
            }
            _ => Err(PluginHostError::UnexpectedResponse),
        }
    }
}

impl Drop for ExecPluginHost {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
