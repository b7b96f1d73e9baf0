//! docstatic binary
//!
//! Command line access to a rustdoc output tree's static indexes, plus an MCP
//! server (stdio or streamable HTTP) exposing the same queries.
//!
//! Cache directory precedence:
//!   1. --cache-dir flag
//!   2. DOCSTATIC_CACHE_DIR env var
//!   3. XDG / platform cache dir via dirs crate
//!   4. Fallback: ./.docstatic-cache
//!
//! Documentation root precedence: --doc-root, DOCSTATIC_DOC_ROOT, ./target/doc.

use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
    time::Duration,
};

use anyhow::{anyhow, bail, Context, Result};
use axum::Router;
use clap::{Args, Parser, Subcommand, ValueEnum};
use docstatic::{
    doc_engine::{DocEngine, DocEngineOptions, ExportFormat},
    DocStaticMcpServer,
};
use rmcp::{
    transport::{
        stdio, streamable_http_server::session::local::LocalSessionManager,
        StreamableHttpServerConfig, StreamableHttpService,
    },
    ServiceExt,
};
use serde::Serialize;
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
#[value(rename_all = "kebab_case")]
enum TransportMode {
    Stdio,
    StreamableHttp,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Js,
    Json,
}

impl From<OutputFormat> for ExportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Js => ExportFormat::Js,
            OutputFormat::Json => ExportFormat::Json,
        }
    }
}

/// Command line interface for docstatic.
#[derive(Debug, Parser)]
#[command(
    name = "docstatic",
    version,
    about = "Read, validate and serve rustdoc's aliases.js and sidebar-items.js indexes"
)]
struct Cli {
    /// rustdoc output directory (the one holding aliases.js)
    #[arg(long, global = true, value_name = "DIR")]
    doc_root: Option<PathBuf>,

    /// Explicit cache directory (overrides env + platform default)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Parse the tree every time instead of reusing cached catalogs
    #[arg(long, global = true)]
    no_cache: bool,

    /// Suppress info logs (only warnings+)
    #[arg(long, global = true)]
    quiet: bool,

    /// Force ANSI color output in logs
    #[arg(long, global = true)]
    color: bool,

    /// Disable ANSI color output
    #[arg(long, global = true)]
    no_color: bool,

    /// Print the resolved cache directory and exit
    #[arg(long)]
    print_cache_dir: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print alias records, for one symbol or the whole table
    Aliases {
        /// Alias token such as `+=` or `[]`
        symbol: Option<String>,
        #[arg(long)]
        library: Option<String>,
    },
    /// Print the sidebar index of a module
    Sidebar {
        /// Module path (`vulkano::framebuffer`) or a unique suffix of one
        module: String,
        #[arg(long)]
        category: Option<String>,
    },
    /// Search item names, paths and alias tokens
    Search {
        query: String,
        /// Restrict to a kind (`fn`, `struct`, `trait`, ...); repeatable
        #[arg(long = "kind")]
        kinds: Vec<String>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Check every record; exits with status 1 when errors are found
    Validate,
    /// Re-serialize the loaded indexes into a directory
    Export {
        #[arg(long, value_name = "DIR")]
        out: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Js)]
        format: OutputFormat,
    },
    /// Run the MCP server
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
struct ServeArgs {
    /// Transport to expose (stdio or streamable-http)
    #[arg(long, value_enum, default_value_t = TransportMode::Stdio)]
    transport: TransportMode,

    /// Address to bind the streamable HTTP transport to (e.g. 127.0.0.1:8080)
    #[arg(long, value_name = "ADDR")]
    http_listen: Option<String>,

    /// HTTP path prefix for the MCP endpoint (default /mcp)
    #[arg(long, default_value = "/mcp")]
    http_path: String,

    /// Disable HTTP session persistence (stateless mode)
    #[arg(long)]
    http_stateless: bool,

    /// Override SSE keep-alive ping interval (seconds). Use 0 to disable pings.
    #[arg(long, value_name = "SECONDS")]
    http_keep_alive_secs: Option<u64>,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            transport: TransportMode::Stdio,
            http_listen: None,
            http_path: "/mcp".to_string(),
            http_stateless: false,
            http_keep_alive_secs: None,
        }
    }
}

fn resolve_cache_dir(cli: &Cli) -> PathBuf {
    if let Some(dir) = &cli.cache_dir {
        return dir.clone();
    }
    if let Ok(env_dir) = std::env::var("DOCSTATIC_CACHE_DIR") {
        return PathBuf::from(env_dir);
    }
    if let Some(base) = dirs::cache_dir() {
        return base.join("docstatic");
    }
    // Fallback: local hidden directory
    PathBuf::from(".").join(".docstatic-cache")
}

fn resolve_doc_root(cli: &Cli) -> PathBuf {
    if let Some(dir) = &cli.doc_root {
        return dir.clone();
    }
    if let Ok(env_dir) = std::env::var("DOCSTATIC_DOC_ROOT") {
        return PathBuf::from(env_dir);
    }
    PathBuf::from("target").join("doc")
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Logging / tracing setup
    let mut fmt = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                if cli.quiet {
                    "docstatic=warn"
                } else {
                    "docstatic=info"
                }
                .parse()?,
            ),
        )
        .with_writer(std::io::stderr)
        .with_target(false);

    // Color handling precedence: --no-color > --color > tty auto
    if cli.no_color {
        fmt = fmt.with_ansi(false);
    } else if cli.color {
        fmt = fmt.with_ansi(true);
    }
    fmt.init();

    let cache_dir = resolve_cache_dir(&cli);
    if cli.print_cache_dir {
        println!("{}", cache_dir.display());
        return Ok(ExitCode::SUCCESS);
    }
    let doc_root = resolve_doc_root(&cli);

    let options = DocEngineOptions {
        use_disk_cache: !cli.no_cache,
        ..Default::default()
    };
    let engine = Arc::new(DocEngine::new_with_options(&cache_dir, options).await?);
    tracing::debug!(
        "docstatic v{} (docs: {}, cache: {})",
        env!("CARGO_PKG_VERSION"),
        doc_root.display(),
        cache_dir.display()
    );

    match cli.command {
        Some(Command::Aliases { symbol, library }) => {
            run_aliases(&engine, &doc_root, symbol.as_deref(), library.as_deref()).await?;
        }
        Some(Command::Sidebar { module, category }) => {
            let Some((module, index)) = engine
                .sidebar(&doc_root, &module, category.as_deref())
                .await?
            else {
                bail!("No sidebar found for module '{module}'");
            };
            print_json(&serde_json::json!({ "module": module, "items": index }))?;
        }
        Some(Command::Search {
            query,
            kinds,
            limit,
        }) => {
            let kinds = (!kinds.is_empty()).then_some(kinds);
            let results = engine
                .search_symbols(&doc_root, &query, kinds.as_deref(), limit)
                .await?;
            print_json(&results)?;
        }
        Some(Command::Validate) => {
            let report = engine.validate(&doc_root).await?;
            print_json(&report)?;
            if !report.is_ok() {
                tracing::warn!("{} error(s) found", report.error_count());
                return Ok(ExitCode::FAILURE);
            }
        }
        Some(Command::Export { out, format }) => {
            engine.export(&doc_root, &out, format.into()).await?;
            print_json(&engine.summary(&doc_root).await?)?;
        }
        Some(Command::Serve(args)) => serve(engine, doc_root, args).await?,
        None => serve(engine, doc_root, ServeArgs::default()).await?,
    }

    Ok(ExitCode::SUCCESS)
}

async fn run_aliases(
    engine: &DocEngine,
    doc_root: &Path,
    symbol: Option<&str>,
    library: Option<&str>,
) -> Result<()> {
    if let Some(symbol) = symbol {
        return print_json(&engine.lookup_alias(doc_root, library, symbol).await?);
    }
    let table = engine.aliases(doc_root).await?;
    match library {
        Some(lib) => {
            let map = table
                .library(lib)
                .ok_or_else(|| anyhow!("No alias table for library '{lib}'"))?;
            print_json(map)
        }
        None => print_json(&table),
    }
}

async fn serve(engine: Arc<DocEngine>, doc_root: PathBuf, args: ServeArgs) -> Result<()> {
    tracing::info!(
        "Starting docstatic MCP server v{} (docs: {})",
        env!("CARGO_PKG_VERSION"),
        doc_root.display()
    );

    match args.transport {
        TransportMode::Stdio => {
            let server = DocStaticMcpServer::from_engine(Arc::clone(&engine), doc_root);
            tracing::info!("MCP server initialized; awaiting stdio transport messages");
            let service = server.serve(stdio()).await?;
            service.waiting().await?;
        }
        TransportMode::StreamableHttp => {
            let listen = args.http_listen.as_ref().ok_or_else(|| {
                anyhow!("--http-listen must be provided when using transport=streamable-http")
            })?;
            let addr: SocketAddr = listen
                .parse()
                .with_context(|| format!("Invalid --http-listen address '{listen}'"))?;

            let mut config = StreamableHttpServerConfig {
                stateful_mode: !args.http_stateless,
                ..Default::default()
            };
            if let Some(secs) = args.http_keep_alive_secs {
                config.sse_keep_alive = (secs > 0).then(|| Duration::from_secs(secs));
            }

            let session_manager = Arc::new(LocalSessionManager::default());
            let engine_for_service = Arc::clone(&engine);
            let root_for_service = doc_root.clone();
            let http_service: StreamableHttpService<DocStaticMcpServer, _> =
                StreamableHttpService::new(
                    move || {
                        Ok::<_, std::io::Error>(DocStaticMcpServer::from_engine(
                            Arc::clone(&engine_for_service),
                            root_for_service.clone(),
                        ))
                    },
                    session_manager,
                    config,
                );

            let route_path = normalize_route(&args.http_path);
            let router = Router::new().nest_service(route_path.as_str(), http_service);
            let listener = tokio::net::TcpListener::bind(addr).await?;
            let actual_addr = listener.local_addr()?;
            tracing::info!(
                "Streamable HTTP transport listening on http://{}{} (stateful sessions: {})",
                actual_addr,
                route_path,
                !args.http_stateless
            );

            let shutdown = Arc::new(Notify::new());
            let shutdown_signal = shutdown.clone();
            let server_task = tokio::spawn(async move {
                axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        shutdown_signal.notified().await;
                    })
                    .await
            });

            tracing::info!("Press Ctrl+C to stop the HTTP transport");
            tokio::signal::ctrl_c()
                .await
                .context("Failed to install Ctrl+C handler")?;
            shutdown.notify_waiters();

            match server_task.await {
                Ok(Ok(())) => tracing::info!("HTTP transport shut down cleanly"),
                Ok(Err(err)) => return Err(anyhow!("HTTP server exited with error: {err}")),
                Err(join_err) => return Err(anyhow!("HTTP server task join error: {join_err}")),
            }
        }
    }

    Ok(())
}

fn normalize_route(path: &str) -> String {
    let mut route_path = path.trim().to_string();
    if route_path.is_empty() {
        route_path.push('/');
    }
    if !route_path.starts_with('/') {
        route_path.insert(0, '/');
    }
    if route_path.len() > 1 && route_path.ends_with('/') {
        route_path.pop();
    }
    route_path
}
