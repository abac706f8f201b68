use log::{error, info, warn};
use ppgee_core::{init_logging, init_stderr_logging, Repositories};
use ppgee_server::{build_router, AppState, ServerConfig};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let config = ServerConfig::from_env();
    let logging = match &config.log_dir {
        Some(log_dir) => init_logging(&config.log_level, log_dir),
        None => init_stderr_logging(&config.log_level),
    };
    if let Err(err) = logging {
        eprintln!("ppgee-server: {err}");
        return ExitCode::FAILURE;
    }

    match serve(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=server_exit module=server status=error error={message}");
            eprintln!("ppgee-server: {message}");
            ExitCode::FAILURE
        }
    }
}

async fn serve(config: ServerConfig) -> Result<(), String> {
    let store = config.open_store().map_err(|err| err.to_string())?;
    let verifier = config.verifier().map_err(|err| err.to_string())?;
    if verifier.is_none() {
        warn!("event=server_start module=server status=degraded error_code=otp_secret_missing");
    }

    let state = AppState::new(Repositories::new(store), verifier);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .map_err(|err| format!("failed to bind `{}`: {err}", config.bind_addr))?;
    info!(
        "event=server_start module=server status=ok bind_addr={} store={}",
        config.bind_addr,
        if config.db_path.is_some() { "sqlite" } else { "memory" }
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| err.to_string())?;
    info!("event=server_stop module=server status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("event=server_stop module=server status=error error={err}");
    }
}
