use analyzer::ReportAnalyzer;
use axum::{
    routing::{get, post, put},
    Router,
};
use configuration::Config;
use database::OrderStore;
use events::WsMessage;
use lifecycle::OrderStateMachine;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer, ExposeHeaders},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
pub struct AppState {
    pub store: Arc<dyn OrderStore>,
    pub analyzer: ReportAnalyzer,
    pub machine: OrderStateMachine,
    /// Order events for WebSocket subscribers.
    pub events: broadcast::Sender<WsMessage>,
}

impl AppState {
    pub fn new(store: Arc<dyn OrderStore>, config: &Config) -> Self {
        let (events, _) = broadcast::channel(config.server.event_channel_capacity);
        Self {
            analyzer: ReportAnalyzer::new(config.analytics.clone()),
            machine: OrderStateMachine::new(store.clone()),
            store,
            events,
        }
    }
}

/// Builds the router with all routes and middleware.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any())
        .expose_headers(ExposeHeaders::any());

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/analytics", get(handlers::get_analytics))
        .route("/api/admin/stats", get(handlers::get_daily_stats))
        .route("/api/orders/:order_id", get(handlers::get_order))
        .route("/api/orders/:order_id/status", put(handlers::update_order_status))
        .route("/api/orders/:order_id/prepare", post(handlers::prepare_order))
        .route("/api/orders/:order_id/ready", post(handlers::mark_order_ready))
        .route("/api/orders/:order_id/complete", post(handlers::complete_order))
        .route("/api/orders/:order_id/cancel", post(handlers::cancel_order))
        .route("/ws", get(handlers::websocket_handler))
        .with_state(state)
        .layer(cors)
        // Logs every incoming request.
        .layer(TraceLayer::new_for_http())
}

/// Binds `addr` and serves the application until the process is stopped.
///
/// Tracing is initialized by the binary, not here.
pub async fn run_server(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = app(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
