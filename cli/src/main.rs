use std::sync::Arc;

use clap::Parser;
use clipseek_cli::commands::{self, cli};
use clipseek_cli::http;
use clipseek_core::api::{AppContext, CliError, QueryError, TenantId};
use clipseek_plugins::services::PluginServicesFactory;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let cfg = match args.config.as_deref() {
        Some(path) => clipseek_core::api::load_from_path(path),
        None => clipseek_core::api::load_default(),
    }
    .map_err(|e| CliError::Config(e.to_string()))?;
    init_tracing(&cfg.logging).map_err(CliError::Command)?;

    let ctx = AppContext::new(cfg, Some(Arc::new(PluginServicesFactory)));
    let tenant = match args.tenant.as_deref() {
        Some(raw) => TenantId::parse(raw)?,
        None => ctx.default_tenant()?,
    };

    dispatch(args.command, ctx, tenant).await
}

fn exit_code_for_error(e: &CliError) -> i32 {
    // 0: success
    // 2: bad request / unknown match
    // 11: config error
    // 20: IO error
    // 30: log query failed
    // 50: internal/uncategorized
    match e {
        CliError::Config(_) => 11,
        CliError::Query(qe) => match qe {
            QueryError::Config(_) => 11,
            qe if qe.is_client_error() => 2,
            QueryError::JobFailed { .. }
            | QueryError::JobTimeout { .. }
            | QueryError::UnexpectedRows { .. }
            | QueryError::Source(_) => 30,
            _ => 50,
        },
        CliError::Io(_) => 20,
        CliError::Command(_) => 20,
        CliError::Anyhow(_) => 50,
    }
}

async fn dispatch(
    cmd: cli::Commands,
    ctx: AppContext,
    tenant: TenantId,
) -> Result<i32, CliError> {
    match cmd {
        cli::Commands::Serve(serve_args) => {
            http::handle_serve(serve_args, &ctx).await?;
            Ok(0)
        }
        cli::Commands::Query(query_args) => {
            commands::query::run_query(query_args, &ctx, &tenant).await
        }
        cli::Commands::Replay(replay_args) => {
            commands::query::run_replay(replay_args, &ctx, &tenant).await
        }
        cli::Commands::Tag(tag_args) => commands::query::run_tag(tag_args, &ctx, &tenant).await,
        cli::Commands::Categories => {
            commands::query::list_categories();
            Ok(0)
        }
    }
}

fn init_tracing(logging: &clipseek_core::api::LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => std::env::temp_dir().join("clipseek"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!("clipseek.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
