//! codeagent - client for the CodeAgent security scanner
//!
//! This is the main CLI application. Every command is a thin call into the
//! ops crate; this file wires configuration, events and rendering around it.

mod cli;
mod display;
mod error;
mod events;
mod logging;

use crate::cli::{Cli, Commands};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::events::EventHandler;
use clap::Parser;
use codeagent_config::Config;
use codeagent_events::EventReceiver;
use codeagent_ops::{
    ExportRequest, ExportSummary, OperationResult, OpsContextBuilder, OpsCtx, WatchSummary,
};
use codeagent_types::{ExportFormat, ReportQuery};
use std::process;
use tokio::select;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if json_mode {
            let body = serde_json::json!({
                "type": "Error",
                "data": {
                    "code": e.code(),
                    "message": e.to_string(),
                }
            });
            println!("{body:#}");
        } else {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting codeagent v{}", env!("CARGO_PKG_VERSION"));

    // File config (or defaults), then environment, then CLI flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.global)?;

    let (event_sender, event_receiver) = codeagent_events::channel();

    let ops_ctx = OpsContextBuilder::new()
        .with_event_sender(event_sender)
        .with_config(config)
        .build()?;

    let colors_enabled = console::Term::stdout().features().colors_supported();
    let renderer = OutputRenderer::new(cli.global.json, colors_enabled);
    let mut event_handler = EventHandler::new(colors_enabled, cli.global.debug, cli.global.json);

    let result =
        execute_command_with_events(cli.command, ops_ctx, event_receiver, &mut event_handler)
            .await?;

    renderer.render_result(&result)?;

    if !result.is_success() {
        info!("Command finished with an unsuccessful result");
        process::exit(2);
    }

    info!("Command completed successfully");
    Ok(())
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    ops_ctx: OpsCtx,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<OperationResult, CliError> {
    let mut command_future = Box::pin(execute_command(command, ops_ctx));

    loop {
        select! {
            result = &mut command_future => {
                // Drain any remaining events
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result;
            }

            event = event_receiver.recv() => {
                match event {
                    Some(event) => event_handler.handle_event(event),
                    None => { /* Channel closed: keep waiting for command to finish */ }
                }
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(command: Commands, ctx: OpsCtx) -> Result<OperationResult, CliError> {
    match command {
        Commands::Job { job_id, refresh } => {
            let job = codeagent_ops::job_status(&ctx, &job_id, refresh).await?;
            Ok(OperationResult::Job(job))
        }

        Commands::Watch { job_id } => {
            let mut subscription = codeagent_ops::watch(&ctx, &job_id);
            let interrupted = select! {
                _ = subscription.wait() => false,
                _ = tokio::signal::ctrl_c() => true,
            };
            if interrupted {
                info!(job_id = %job_id, "watch interrupted");
                subscription.close();
            }
            Ok(OperationResult::Watch(WatchSummary::from(
                &subscription.snapshot(),
            )))
        }

        Commands::Export {
            job_id,
            format,
            enhanced,
            output_dir,
            stdout,
        } => {
            let format = format.as_deref().map_or(ctx.config.export.default_format, |name| {
                ExportFormat::parse_lenient(name)
            });
            let request = ExportRequest::new(job_id.as_str(), format).with_enhanced(enhanced);
            let outcome = codeagent_ops::export(&ctx, request).await?;

            let path = if stdout {
                print!("{}", outcome.artifact.content);
                None
            } else {
                let dir = output_dir.unwrap_or_else(|| ctx.config.export.output_dir.clone());
                tokio::fs::create_dir_all(&dir).await?;
                Some(codeagent_ops::write_artifact(&outcome.artifact, &dir).await?)
            };
            Ok(OperationResult::Export(ExportSummary::new(
                job_id, &outcome, path,
            )))
        }

        Commands::Reports {
            page,
            limit,
            severity,
            tool,
            repo,
            since,
            until,
            label,
        } => {
            let query = ReportQuery {
                page,
                limit,
                severity,
                tool,
                repo,
                since,
                until,
                label,
            };
            let list = codeagent_ops::list_reports(&ctx, &query).await?;
            Ok(OperationResult::Reports(list))
        }

        Commands::Summary { job_id } => {
            let summary = codeagent_ops::report_summary(&ctx, &job_id).await?;
            Ok(OperationResult::ReportSummary(summary))
        }

        Commands::Cancel { job_id } => {
            let ack = codeagent_ops::cancel(&ctx, &job_id).await?;
            Ok(OperationResult::JobAck(ack))
        }

        Commands::Rerun { job_id } => {
            let ack = codeagent_ops::rerun(&ctx, &job_id).await?;
            Ok(OperationResult::JobAck(ack))
        }

        Commands::Health => {
            let health = codeagent_ops::health(&ctx).await?;
            Ok(OperationResult::Health(health))
        }
    }
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled_flag: bool) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;

    if json_mode {
        // JSON mode: keep stdout and stderr clean for the result document
        if debug_enabled {
            if let Some((_, file)) = open_log_file() {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(debug_filter())
                    .init();
                return;
            }
        }
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else if debug_enabled {
        match open_log_file() {
            Some((path, file)) => {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(debug_filter())
                    .init();

                eprintln!("Debug logging enabled: {}", path.display());
            }
            None => {
                tracing_subscriber::fmt()
                    .with_writer(std::io::stderr)
                    .with_env_filter(
                        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
                            |_| {
                                tracing_subscriber::EnvFilter::new(
                                    "info,codeagent=info,codeagent_ops=info",
                                )
                            },
                        ),
                    )
                    .init();
            }
        }
    } else {
        // Normal mode: minimal logging to stderr
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("warn,codeagent=warn,codeagent_ops=warn")
                }),
            )
            .init();
    }
}

fn debug_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(
            "info,codeagent=debug,codeagent_ops=debug,codeagent_net=debug,codeagent_monitor=debug",
        )
    })
}

/// Create a timestamped log file, warning on stderr when that is not possible
fn open_log_file() -> Option<(std::path::PathBuf, std::fs::File)> {
    let log_dir = match Config::log_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Warning: No log directory available: {e}");
            return None;
        }
    };
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory: {e}");
        return None;
    }

    let log_file = log_dir.join(format!(
        "codeagent-{}.log",
        chrono::Utc::now().format("%Y%m%d-%H%M%S")
    ));
    match std::fs::File::create(&log_file) {
        Ok(file) => Some((log_file, file)),
        Err(e) => {
            eprintln!("Warning: Failed to create log file: {e}");
            None
        }
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &cli::GlobalArgs) -> Result<(), CliError> {
    if let Some(url) = &global.api_url {
        config.api.base_url.clone_from(url);
    }
    config.validate()?;
    Ok(())
}
