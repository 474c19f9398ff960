use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::{
    services::{
        bilibili_proxy_image, bilibili_video, countdown, countdown_empty, firebase_food, health,
        hello, root, youtube_channels, youtube_videos,
    },
    state::AppState,
};
use crate::config::Config;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All gateway routes over the given state
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/hello", get(hello))
        .route("/api/firebasefood", get(firebase_food))
        .route("/api/youtube/channel/{ids}", get(youtube_channels))
        .route("/api/youtube/videos/{ids}", get(youtube_videos))
        .route("/api/countdown/", get(countdown_empty))
        .route("/api/countdown/{slug}", get(countdown))
        // Static segment wins over the {bvid} capture
        .route("/api/bilibili/proxyimg", get(bilibili_proxy_image))
        .route("/api/bilibili/{bvid}", get(bilibili_video))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn run(config: Config) -> Result<(), AnyError> {
    let address = config.server.bind_addr;

    info!("Initializing upstream adapters");
    let state = AppState::from_config(&config)
        .map_err(|e| format!("Refusing to start: {}", e))?;

    warn!("/api/bilibili/proxyimg fetches any caller-supplied URL (open proxy)");

    let app = router(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, "mediagate listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
