use std::process::ExitCode;

use configs::{AppConfig, LogFormat};
use models::LoginInput;
use service::{DeliveryClient, SessionState};
use tracing::{error, info, warn};
use uuid::Uuid;

fn init_logging(cfg: &AppConfig) {
    let fallback = cfg.logging.filter.as_deref();
    match cfg.logging.format {
        LogFormat::Compact => common::utils::logging::init_logging_default(fallback),
        LogFormat::Json => common::utils::logging::init_logging_json(fallback),
    }
    info!(service = "client", event = "logger_init", "tracing subscriber initialized");
}

/// Sign in from `DELIVERY_IDENTIFIER`/`DELIVERY_PASSWORD` when no session was
/// restored, then print the role dashboard and unread notification count.
async fn run(client: DeliveryClient) -> anyhow::Result<()> {
    if client.session().state() != SessionState::Authenticated {
        let identifier = std::env::var("DELIVERY_IDENTIFIER").ok();
        let password = std::env::var("DELIVERY_PASSWORD").ok();
        match (identifier, password) {
            (Some(identifier), Some(password)) => {
                client.session().login(&LoginInput::new(identifier, password)).await?;
            }
            _ => {
                warn!(service = "client", event = "no_credentials", "no stored session and no credentials in env");
                return Ok(());
            }
        }
    }

    let Some(session) = client.session().session().await? else {
        warn!(service = "client", event = "no_session", "session ended before the dashboard could load");
        return Ok(());
    };

    let dashboard = client.orders().dashboard(session.role, &session.user_id).await?;
    let unread = client.notifications().unread_count().await?;
    info!(
        service = "client",
        event = "dashboard",
        user_id = %session.user_id,
        role = %session.role,
        total = dashboard.stats.total,
        pending = dashboard.stats.pending,
        active = dashboard.stats.active,
        delivered = dashboard.stats.delivered,
        recent = dashboard.recent_orders.len(),
        unread,
        "dashboard loaded"
    );
    for order in &dashboard.recent_orders {
        println!("{}", serde_json::to_string(order)?);
    }
    Ok(())
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cfg = match AppConfig::load_and_validate() {
        Ok(cfg) => cfg,
        Err(e) => {
            common::utils::logging::init_logging_default(None);
            error!(service = "client", event = "config_invalid", error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&cfg);

    let run_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    std::panic::set_hook(Box::new(move |info| {
        error!(service = "client", event = "panic", %run_id, pid, message = %info, "unhandled panic occurred");
    }));

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "client", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(service = "client", event = "start", %run_id, pid, version, base_url = %cfg.api.base_url, "delivery client starting");

    rt.block_on(async move {
        let client = match DeliveryClient::from_config(&cfg).await {
            Ok(client) => client,
            Err(e) => {
                error!(service = "client", event = "init_failed", error = %e, "failed to build client");
                return ExitCode::FAILURE;
            }
        };

        tokio::select! {
            res = run(client.clone()) => match res {
                Ok(()) => {
                    info!(service = "client", event = "stop", %run_id, "client finished");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    error!(service = "client", event = "run_failed", error = %e, "client run failed");
                    ExitCode::FAILURE
                }
            },
            _ = tokio::signal::ctrl_c() => {
                let cancelled = client.cancel_all();
                info!(service = "client", event = "shutdown_signal", %run_id, cancelled, "received Ctrl+C, shutting down");
                ExitCode::SUCCESS
            }
        }
    })
}
