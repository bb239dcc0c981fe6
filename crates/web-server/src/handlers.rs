use crate::{error::AppError, AppState};
use analytics::{AnalyticsReport, DailyStats};
use analyzer::ReportRequest;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, Utc};
use core_types::{Order, OrderStatus};
use events::WsMessage;
use lifecycle::TransitionOutcome;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub date: Option<NaiveDate>,
}

/// # GET /api/analytics?start=...&end=...&granularity=day
pub async fn get_analytics(
    State(state): State<Arc<AppState>>,
    Query(request): Query<ReportRequest>,
) -> Result<Json<AnalyticsReport>, AppError> {
    let report = state.analyzer.run(state.store.as_ref(), &request).await?;
    Ok(Json(report))
}

/// # GET /api/admin/stats?date=YYYY-MM-DD
/// Defaults to today (UTC).
pub async fn get_daily_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<DailyStats>, AppError> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let stats = state.analyzer.daily_stats(state.store.as_ref(), date).await?;
    Ok(Json(stats))
}

/// # GET /api/orders/:order_id
pub async fn get_order(
    Path(order_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .store
        .get_order(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {} was not found.", order_id)))?;
    Ok(Json(order))
}

/// # PUT /api/orders/:order_id/status
pub async fn update_order_status(
    Path(order_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<Order>, AppError> {
    let requested: OrderStatus = update.status.parse()?;
    let outcome = state.machine.attempt_transition(order_id, requested).await?;
    Ok(Json(publish(&state, outcome)))
}

/// # POST /api/orders/:order_id/prepare
pub async fn prepare_order(
    Path(order_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Order>, AppError> {
    let outcome = state.machine.prepare(order_id).await?;
    Ok(Json(publish(&state, outcome)))
}

/// # POST /api/orders/:order_id/ready
pub async fn mark_order_ready(
    Path(order_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Order>, AppError> {
    let outcome = state.machine.mark_ready(order_id).await?;
    Ok(Json(publish(&state, outcome)))
}

/// # POST /api/orders/:order_id/complete
pub async fn complete_order(
    Path(order_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Order>, AppError> {
    let outcome = state.machine.complete(order_id).await?;
    Ok(Json(publish(&state, outcome)))
}

/// # POST /api/orders/:order_id/cancel
pub async fn cancel_order(
    Path(order_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Order>, AppError> {
    let outcome = state.machine.cancel(order_id).await?;
    Ok(Json(publish(&state, outcome)))
}

/// Hands the transition event to connected WebSocket clients and returns the order.
fn publish(state: &AppState, outcome: TransitionOutcome) -> Order {
    if state
        .events
        .send(WsMessage::OrderStatusChanged(outcome.event))
        .is_err()
    {
        tracing::debug!(order_id = %outcome.order.order_id, "No WebSocket subscribers for order event.");
    }
    outcome.order
}

/// # GET /ws
/// Streams `WsMessage`s to kitchen and pickup screens.
pub async fn websocket_handler(
    State(state): State<Arc<AppState>>, // State must come before WebSocketUpgrade
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    tracing::info!("[WS] New client connected.");
    let mut events = state.events.subscribe();

    if send_message(&mut socket, &WsMessage::Connected).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(message) => {
                    if send_message(&mut socket, &message).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!("[WS] Client lagged, skipped {} events.", n);
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("[WS] Client disconnected.");
                    break;
                }
                Some(Err(e)) => {
                    tracing::error!(error = %e, "[WS] Error.");
                    break;
                }
                Some(Ok(_)) => {}
            },
        }
    }
    tracing::info!("[WS] Connection closed.");
}

async fn send_message(socket: &mut WebSocket, message: &WsMessage) -> Result<(), axum::Error> {
    match message.to_json() {
        Ok(text) => socket.send(Message::Text(text)).await,
        Err(e) => {
            tracing::error!(error = %e, "[WS] Failed to serialize event.");
            Ok(())
        }
    }
}
