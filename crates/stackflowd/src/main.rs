// # stackflowd - StackFlow Tool Server
//
// The stackflowd daemon is a thin integration layer. It:
// 1. Reads configuration from environment variables
// 2. Initializes logging and the runtime
// 3. Builds the tool catalog, the audit sink and the dispatcher
// 4. Serves JSON-RPC over HTTP until SIGTERM/SIGINT
//
// Validation, DNS planning and RPC dispatch all live in stackflow-core.
//
// ## Configuration
//
// ### Listener
// - `STACKFLOW_LISTEN_ADDR`: Bind address (default `0.0.0.0:$PORT`, or
//   `0.0.0.0:8080` when `PORT` is unset)
// - `STACKFLOW_MAX_BODY_BYTES`: Largest accepted request body (default 1 MiB)
//
// ### Identity
// - `STACKFLOW_SERVER_NAME`: Name reported by `initialize` (default `stackflow`)
//
// ### Audit
// - `STACKFLOW_AUDIT_TYPE`: disabled, memory (most recent 1024 runs), file
//   (default disabled)
// - `STACKFLOW_AUDIT_PATH`: JSON-lines log path (for file)
// - `STACKFLOW_AUDIT_ACTOR`: Actor recorded on every run
//
// ### Logging
// - `STACKFLOW_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export STACKFLOW_LISTEN_ADDR=127.0.0.1:8080
// export STACKFLOW_AUDIT_TYPE=file
// export STACKFLOW_AUDIT_PATH=/var/lib/stackflow/runs.jsonl
//
// stackflowd
// curl -s localhost:8080/mcp -d '{"jsonrpc":"2.0","id":1,"method":"tools/list"}'
// ```

mod http;

use anyhow::{Context, Result};
use stackflow_core::config::DEFAULT_SERVER_NAME;
use stackflow_core::{AuditConfig, ServerConfig, ServerInfo, ToolCatalog, ToolDispatcher};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// How long in-flight requests get to finish after a shutdown signal
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StackflowExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<StackflowExitCode> for ExitCode {
    fn from(code: StackflowExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration, as read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
struct Config {
    listen_addr: String,
    server_name: String,
    audit_type: String,
    audit_path: Option<String>,
    audit_actor: Option<String>,
    max_body_bytes: usize,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`; empty values count as unset
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let listen_addr = match var("STACKFLOW_LISTEN_ADDR") {
            Some(addr) => addr,
            None => format!(
                "0.0.0.0:{}",
                var("PORT").unwrap_or_else(|| "8080".to_string())
            ),
        };

        let max_body_bytes = match var("STACKFLOW_MAX_BODY_BYTES") {
            Some(raw) => raw.trim().parse().with_context(|| {
                format!("STACKFLOW_MAX_BODY_BYTES must be a byte count. Got: {raw}")
            })?,
            None => stackflow_core::config::DEFAULT_MAX_BODY_BYTES,
        };

        Ok(Self {
            listen_addr,
            server_name: var("STACKFLOW_SERVER_NAME")
                .unwrap_or_else(|| DEFAULT_SERVER_NAME.to_string()),
            audit_type: var("STACKFLOW_AUDIT_TYPE").unwrap_or_else(|| "disabled".to_string()),
            audit_path: var("STACKFLOW_AUDIT_PATH"),
            audit_actor: var("STACKFLOW_AUDIT_ACTOR"),
            max_body_bytes,
            log_level: var("STACKFLOW_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration and build the server configuration from it
    fn server_config(&self) -> Result<ServerConfig> {
        let audit = match self.audit_type.to_lowercase().as_str() {
            "disabled" | "none" => AuditConfig::Disabled,
            "memory" => AuditConfig::Memory {
                actor: self.audit_actor.clone(),
            },
            "file" => AuditConfig::File {
                path: self.audit_path.clone().with_context(|| {
                    "STACKFLOW_AUDIT_PATH is required when STACKFLOW_AUDIT_TYPE=file. \
                    Set it via: export STACKFLOW_AUDIT_PATH=/var/lib/stackflow/runs.jsonl"
                })?,
                actor: self.audit_actor.clone(),
            },
            other => anyhow::bail!(
                "STACKFLOW_AUDIT_TYPE '{}' is not supported. \
                Supported types: disabled, memory, file",
                other
            ),
        };

        let config = ServerConfig {
            listen_addr: self.listen_addr.clone(),
            server: ServerInfo {
                name: self.server_name.clone(),
                ..ServerInfo::default()
            },
            audit,
            max_body_bytes: self.max_body_bytes,
        };
        config.validate()?;

        self.log_level()?;
        Ok(config)
    }

    fn log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "STACKFLOW_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return StackflowExitCode::ConfigError.into();
        }
    };

    let server_config = match config.server_config() {
        Ok(server_config) => server_config,
        Err(e) => {
            eprintln!("Configuration validation error: {:#}", e);
            return StackflowExitCode::ConfigError.into();
        }
    };

    let log_level = config.log_level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return StackflowExitCode::ConfigError.into();
    }

    info!("Starting stackflowd");
    info!(
        "Configuration loaded: listen={} audit={}",
        server_config.listen_addr,
        server_config.audit.type_name()
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return StackflowExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(server_config).await {
            error!("Daemon error: {:#}", e);
            StackflowExitCode::RuntimeError
        } else {
            StackflowExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Build the dispatcher described by `config`
async fn build_dispatcher(config: &ServerConfig) -> Result<ToolDispatcher> {
    let catalog = Arc::new(ToolCatalog::new());
    info!("Tool catalog ready: {} tool(s)", catalog.tools().len());

    let dispatcher = ToolDispatcher::new(catalog, config.server.clone());
    let sink = stackflow_audit::sink_from_config(&config.audit)
        .await
        .context("Failed to open audit sink")?;

    Ok(match sink {
        Some(sink) => dispatcher.with_audit(sink, config.audit.actor().map(str::to_string)),
        None => dispatcher,
    })
}

/// Run the daemon
async fn run_daemon(config: ServerConfig) -> Result<()> {
    let dispatcher = Arc::new(build_dispatcher(&config).await?);
    let app = http::router(dispatcher, config.max_body_bytes);

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!("Listening on {}", listener.local_addr()?);

    let shutdown = Arc::new(Notify::new());
    let mut server = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.notified().await })
                .await
        }
    });

    tokio::select! {
        signal = wait_for_shutdown() => {
            info!("Received shutdown signal: {}", signal?);
        }
        exited = &mut server => {
            return match exited {
                Ok(Ok(())) => Err(anyhow::anyhow!("Server stopped unexpectedly")),
                Ok(Err(e)) => Err(e).context("Server failed"),
                Err(e) => Err(e).context("Server task failed"),
            };
        }
    }

    info!("Shutting down, draining in-flight requests");
    shutdown.notify_one();

    match tokio::time::timeout(SHUTDOWN_TIMEOUT, server).await {
        Ok(Ok(Ok(()))) => {
            info!("Shutdown complete");
            Ok(())
        }
        Ok(Ok(Err(e))) => Err(e).context("Server failed during shutdown"),
        Ok(Err(e)) => Err(e).context("Server task failed"),
        Err(_) => Err(anyhow::anyhow!(
            "Shutdown timeout after {:?}",
            SHUTDOWN_TIMEOUT
        )),
    }
}

/// Wait for SIGTERM or SIGINT
///
/// # Returns
///
/// The name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.server_name, "stackflow");
        assert_eq!(config.audit_type, "disabled");
        assert_eq!(config.log_level, "info");

        let server = config.server_config().unwrap();
        assert_eq!(server.audit, AuditConfig::Disabled);
        assert_eq!(server.max_body_bytes, 1024 * 1024);
    }

    #[test]
    fn test_port_fallback() {
        let config = Config::from_lookup(lookup(&[("PORT", "9090")])).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:9090");

        let config = Config::from_lookup(lookup(&[
            ("PORT", "9090"),
            ("STACKFLOW_LISTEN_ADDR", "127.0.0.1:7000"),
        ]))
        .unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:7000");
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config = Config::from_lookup(lookup(&[
            ("STACKFLOW_LISTEN_ADDR", ""),
            ("STACKFLOW_SERVER_NAME", "  "),
        ]))
        .unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.server_name, "stackflow");
    }

    #[test]
    fn test_file_audit() {
        let config = Config::from_lookup(lookup(&[
            ("STACKFLOW_AUDIT_TYPE", "file"),
            ("STACKFLOW_AUDIT_PATH", "/tmp/runs.jsonl"),
            ("STACKFLOW_AUDIT_ACTOR", "ci"),
        ]))
        .unwrap();
        let server = config.server_config().unwrap();
        assert_eq!(server.audit.type_name(), "file");
        assert_eq!(server.audit.actor(), Some("ci"));

        let missing_path =
            Config::from_lookup(lookup(&[("STACKFLOW_AUDIT_TYPE", "file")])).unwrap();
        assert!(missing_path.server_config().is_err());
    }

    #[test]
    fn test_rejects_invalid_values() {
        for vars in [
            &[("STACKFLOW_AUDIT_TYPE", "postgres")][..],
            &[("STACKFLOW_LOG_LEVEL", "loud")][..],
            &[("STACKFLOW_LISTEN_ADDR", "localhost")][..],
            &[("STACKFLOW_MAX_BODY_BYTES", "16")][..],
        ] {
            let config = Config::from_lookup(lookup(vars)).unwrap();
            assert!(config.server_config().is_err(), "{vars:?}");
        }

        assert!(Config::from_lookup(lookup(&[("STACKFLOW_MAX_BODY_BYTES", "lots")])).is_err());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(StackflowExitCode::CleanShutdown as u8, 0);
        assert_eq!(StackflowExitCode::ConfigError as u8, 1);
        assert_eq!(StackflowExitCode::RuntimeError as u8, 2);
    }

    #[tokio::test]
    async fn test_build_dispatcher_with_memory_audit() {
        let mut config = ServerConfig::new("127.0.0.1:0");
        config.audit = AuditConfig::Memory {
            actor: Some("ci".into()),
        };
        let dispatcher = build_dispatcher(&config).await.unwrap();
        assert_eq!(dispatcher.catalog().tools().len(), 2);
    }
}
