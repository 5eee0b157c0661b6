//! Stdio transport to an MCP server subprocess.
//!
//! One transport owns one child process. Writes are serialized through a
//! single writer lock and responses are routed back to their callers by
//! JSON-RPC id, so any number of tasks may share the channel.

use super::protocol::{JsonRpcMessage, JsonRpcRequest};
use crate::error::{BirdingError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Request/response channel to an MCP server.
#[async_trait]
pub trait McpTransport: Send + Sync {
    /// Send a request and wait for its result.
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value>;

    /// Send a notification (no response expected).
    async fn notify(&self, method: &str, params: Option<Value>) -> Result<()>;
}

/// How to launch a stdio MCP server.
#[derive(Debug, Clone, PartialEq)]
pub struct StdioServerParams {
    pub command: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value>>>>>;
type Writer = tokio::sync::Mutex<Box<dyn AsyncWrite + Send + Unpin>>;

/// Stdio-based transport (subprocess communication).
pub struct StdioTransport {
    writer: Writer,
    pending: Pending,
    next_id: AtomicU64,
    // Held so the server is killed when the transport is dropped.
    _child: Option<Child>,
}

impl StdioTransport {
    /// Spawn the server process and attach to its stdio.
    pub fn spawn(params: &StdioServerParams) -> Result<Self> {
        debug!(
            "Spawning MCP server: {} (cwd: {})",
            params.command,
            params.cwd.display()
        );

        let mut child = Command::new(&params.command)
            .args(&params.args)
            .current_dir(&params.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    BirdingError::ToolNotFound(params.command.clone())
                } else {
                    BirdingError::Mcp(format!("Failed to spawn {}: {}", params.command, e))
                }
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BirdingError::Mcp("Server stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BirdingError::Mcp("Server stdout unavailable".to_string()))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("eBird server: {}", line);
                }
            });
        }

        Ok(Self::attach(stdout, stdin, Some(child)))
    }

    /// Attach to an already-connected pair of streams.
    pub fn from_streams<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self::attach(reader, writer, None)
    }

    fn attach<R, W>(reader: R, writer: W, child: Option<Child>) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        tokio::spawn(read_loop(reader, pending.clone()));

        Self {
            writer: tokio::sync::Mutex::new(Box::new(writer)),
            pending,
            next_id: AtomicU64::new(1),
            _child: child,
        }
    }

    async fn write_message(&self, message: &JsonRpcRequest<'_>) -> Result<()> {
        let mut line = serde_json::to_string(message)?;
        line.push('\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl McpTransport for StdioTransport {
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(id, tx);

        debug!("MCP request #{}: {}", id, method);

        if let Err(e) = self.write_message(&JsonRpcRequest::request(id, method, params)).await {
            lock(&self.pending).remove(&id);
            return Err(BirdingError::Mcp(format!("Failed to send '{}': {}", method, e)));
        }

        rx.await
            .map_err(|_| BirdingError::Mcp("MCP server closed the connection".to_string()))?
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        self.write_message(&JsonRpcRequest::notification(method, params))
            .await
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn read_loop<R>(reader: R, pending: Pending)
where
    R: AsyncRead + Send + Unpin + 'static,
{
    let mut lines = BufReader::new(reader).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("MCP read error: {}", e);
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let message: JsonRpcMessage = match serde_json::from_str(&line) {
            Ok(msg) => msg,
            Err(e) => {
                // Servers sometimes print banners on stdout.
                debug!("Ignoring non JSON-RPC line from server ({}): {}", e, line);
                continue;
            }
        };

        match message.response_id() {
            Some(id) => {
                let Some(tx) = lock(&pending).remove(&id) else {
                    warn!("MCP response for unknown request #{}", id);
                    continue;
                };
                let outcome = match (message.error, message.result) {
                    (Some(err), _) => Err(BirdingError::Mcp(err.to_string())),
                    (None, result) => Ok(result.unwrap_or(Value::Null)),
                };
                let _ = tx.send(outcome);
            }
            None => {
                debug!(
                    "Ignoring server message: {}",
                    message.method.as_deref().unwrap_or("<no method>")
                );
            }
        }
    }

    // Wake every caller still waiting.
    let orphans: Vec<_> = lock(&pending).drain().collect();
    for (_, tx) in orphans {
        let _ = tx.send(Err(BirdingError::Mcp(
            "MCP server closed the connection".to_string(),
        )));
    }
}
