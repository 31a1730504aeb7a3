use kubechat::assistant::ChatService;
use kubechat::config::{AssistantMode, CONFIG};
use kubechat::kube::{ClusterInspector, KubectlExecutor};
use kubechat::providers::Providers;
use kubechat::server::{AppState, kubechat_router};
use mimalloc::MiMalloc;
use std::net::SocketAddr;
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = &*CONFIG;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false),
        )
        .init();

    cfg.validate()?;

    info!(
        database_url = %cfg.basic.database_url,
        loglevel = %cfg.basic.loglevel,
        listen_addr = %cfg.basic.listen_addr,
        listen_port = cfg.basic.listen_port,
        mode = %cfg.assistant.mode,
        auth = cfg.basic.api_key().is_some(),
        "Starting kubechat"
    );

    let store = kubechat::db::spawn(&cfg.basic.database_url).await?;
    let providers = Providers::from_config(&cfg.providers)?;

    let chat = match cfg.assistant.mode {
        AssistantMode::Chatbot => ChatService::chatbot(&cfg.assistant, store, providers.active),
        AssistantMode::Chatops => {
            let executor = KubectlExecutor::new(&cfg.kubectl);
            let cluster = ClusterInspector::new(&cfg.kubectl, executor.kubectl().clone());

            let status = cluster.status().await;
            if status.connected {
                info!(
                    context = status.active_context.as_deref().unwrap_or("-"),
                    api_server = status.api_server.as_deref().unwrap_or("-"),
                    "Kubernetes cluster reachable"
                );
            } else {
                warn!(status = %status.message, "Kubernetes cluster not reachable at startup");
            }

            ChatService::chatops(&cfg.assistant, store, providers.active, executor, cluster)
        }
    };

    let state = AppState::new(chat, cfg.basic.api_key(), cfg.basic.insecure_cookie)
        .with_static_dir(&cfg.basic.static_dir);
    let app = kubechat_router(state);

    let addr = SocketAddr::from((cfg.basic.listen_addr, cfg.basic.listen_port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server has shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
