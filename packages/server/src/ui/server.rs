//! Server execution logic.

use std::{future::Future, net::SocketAddr, path::PathBuf, sync::Arc, time::Instant};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeader,
    trace::TraceLayer,
};

use crate::usecase::ListParticipantsUseCase;

use super::{
    handler::{health_check, list_participants, websocket_handler},
    signal::shutdown_signal,
    signaling::MessageRouter,
    state::AppState,
};

/// Static asset directory and its `Cache-Control` max-age.
#[derive(Debug, Clone)]
pub struct StaticAssets {
    pub dir: PathBuf,
    pub max_age_secs: u64,
}

impl StaticAssets {
    pub fn new(dir: impl Into<PathBuf>, max_age_secs: u64) -> Self {
        Self {
            dir: dir.into(),
            max_age_secs,
        }
    }

    fn cache_control(&self) -> HeaderValue {
        if self.max_age_secs == 0 {
            return HeaderValue::from_static("no-cache");
        }
        HeaderValue::from_str(&format!("public, max-age={}", self.max_age_secs))
            .unwrap_or_else(|_| HeaderValue::from_static("no-cache"))
    }
}

/// Origins allowed to call the HTTP endpoints from a browser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CorsPolicy {
    /// `Access-Control-Allow-Origin: *`
    #[default]
    AnyOrigin,
    /// Only the listed origins are echoed back
    Origins(Vec<HeaderValue>),
}

impl CorsPolicy {
    /// Build a policy from configured origins. `*` anywhere in the list allows any origin.
    ///
    /// Origins that are not valid header values are skipped.
    pub fn from_origins<S: AsRef<str>>(origins: &[S]) -> Self {
        if origins.iter().any(|o| o.as_ref() == "*") {
            return Self::AnyOrigin;
        }
        let values = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o.as_ref()) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin '{}'", o.as_ref());
                    None
                }
            })
            .collect();
        Self::Origins(values)
    }

    fn layer(&self) -> CorsLayer {
        let origin = match self {
            Self::AnyOrigin => AllowOrigin::any(),
            Self::Origins(values) => AllowOrigin::list(values.clone()),
        };
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    }
}

/// WebRTC signaling server
///
/// This struct encapsulates the server wiring and provides methods to run the server.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     message_router,
///     list_participants_usecase,
///     StaticAssets::new("public", 0),
///     CorsPolicy::AnyOrigin,
/// );
/// server.run("0.0.0.0".to_string(), 3000).await?;
/// ```
pub struct Server {
    /// MessageRouter（WebSocket イベントの振り分け）
    message_router: Arc<MessageRouter>,
    /// ListParticipantsUseCase（参加者一覧取得のユースケース）
    list_participants_usecase: Arc<ListParticipantsUseCase>,
    /// 静的ファイルの配信設定
    static_assets: StaticAssets,
    /// HTTP エンドポイントの CORS 設定
    cors: CorsPolicy,
}

impl Server {
    /// Create a new Server instance
    ///
    /// # Arguments
    ///
    /// * `message_router` - Dispatcher for WebSocket transport events
    /// * `list_participants_usecase` - UseCase for the participants endpoint
    /// * `static_assets` - Directory served for every other path
    /// * `cors` - Origins allowed by the CORS layer
    pub fn new(
        message_router: Arc<MessageRouter>,
        list_participants_usecase: Arc<ListParticipantsUseCase>,
        static_assets: StaticAssets,
        cors: CorsPolicy,
    ) -> Self {
        Self {
            message_router,
            list_participants_usecase,
            static_assets,
            cors,
        }
    }

    /// Build the axum router (routes, static fallback, CORS, HTTP tracing).
    pub fn into_router(self) -> Router {
        let app_state = Arc::new(AppState {
            message_router: self.message_router,
            list_participants_usecase: self.list_participants_usecase,
            started_at: Instant::now(),
        });

        let assets = SetResponseHeader::if_not_present(
            ServeDir::new(&self.static_assets.dir),
            header::CACHE_CONTROL,
            self.static_assets.cache_control(),
        );

        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/health", get(health_check))
            .route("/api/participants", get(list_participants))
            // 静的ファイル
            .fallback_service(assets)
            .layer(self.cors.layer())
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Run the signaling server until Ctrl+C or SIGTERM
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "0.0.0.0")
    /// * `port` - The port number to bind to (e.g., 3000)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Signaling server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.into_router();
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
    }
}
