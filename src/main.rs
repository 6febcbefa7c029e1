use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing_subscriber::EnvFilter;

use depot::api;
use depot::config::Config;
use depot::utils::cli::Args;
use depot::utils::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = validate_config(&args).await;

    let tracker = TaskTracker::new();
    let cancel = CancellationToken::new();
    let state = Arc::new(AppState::new(config, tracker.clone()));

    tracker.spawn(state.store.clone().run_reaper(
        Duration::from_secs(state.config.reaper_interval_secs),
        Duration::from_secs(state.config.retention_secs),
        cancel.clone(),
    ));

    let app = api::create_router(state.clone());

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", state.config.host, state.config.port))
            .await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // let outstanding upload tasks settle and stop the reaper
    cancel.cancel();
    tracker.close();
    tracker.wait().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down...");
}

async fn validate_config(args: &Args) -> Config {
    let mut validation_errors = Vec::new();

    match args.storage.as_str() {
        "FILESYSTEM" => {
            let root_dir = Path::new(&args.root);
            if let Ok(meta) = tokio::fs::metadata(root_dir).await
                && !meta.is_dir()
            {
                validation_errors.push(format!(
                    "DEPOT_ROOTDIR `{}` exists but is not a directory",
                    args.root,
                ));
            }
        }
        "OBJECT" => {
            if args.object_store_url.is_empty() {
                validation_errors
                    .push("DEPOT_OBJECT_STORE_URL is required for OBJECT storage".to_string());
            }
        }
        other => {
            validation_errors.push(format!(
                "DEPOT_STORAGE `{other}` is not supported (expected FILESYSTEM or OBJECT)",
            ));
        }
    }

    if args.task_timeout_secs == 0 {
        validation_errors.push("DEPOT_TASK_TIMEOUT_SECONDS must be greater than zero".to_string());
    }
    if args.reaper_interval_secs == 0 {
        validation_errors
            .push("DEPOT_REAPER_INTERVAL_SECONDS must be greater than zero".to_string());
    }

    if !validation_errors.is_empty() {
        eprintln!("{}", validation_errors.join("\n"));
        std::process::exit(1);
    }

    Config {
        host: args.host.clone(),
        port: args.port,
        storage_typ: args.storage.clone(),
        root_dir: args.root.clone(),
        object_store_url: args.object_store_url.clone(),
        object_container: args.object_container.clone(),
        retention_secs: args.retention_secs,
        reaper_interval_secs: args.reaper_interval_secs,
        task_timeout_secs: args.task_timeout_secs,
    }
}
