use crate::auth::AuthUser;
use crate::db::{self, TradeKind, TradeRecord};
use crate::errors::{ApiError, ApiResult};
use crate::state::AppState;
use crate::stats::{self, Granularity};
use axum::extract::{Path, Query, State};
use axum::response::Json;
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[derive(serde::Deserialize)]
pub struct CreateTradeRequest {
    pub amount: f64,
    pub kind: TradeKind,
    #[serde(default)]
    pub target: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(serde::Deserialize)]
pub struct UpdateTradeRequest {
    pub amount: Option<f64>,
    pub kind: Option<TradeKind>,
    pub target: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(serde::Deserialize)]
pub struct StatsQuery {
    pub granularity: Granularity,
}

fn validate_amount(amount: f64) -> ApiResult<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ApiError::BadRequest(
            "amount must be a non-negative number".into(),
        ));
    }
    Ok(())
}

// ── Trade lifecycle (all owner-scoped) ──

/// GET /api/trades -- the caller's records, newest first
pub async fn list_trades(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<Vec<TradeRecord>>> {
    Ok(Json(db::list_trades(&state.db, &user.user_id)?))
}

/// POST /api/trades -- record an outcome; id and owner are injected
/// server-side, timestamp defaults to now
pub async fn create_trade(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateTradeRequest>,
) -> ApiResult<Json<TradeRecord>> {
    validate_amount(req.amount)?;

    let trade = TradeRecord {
        id: uuid::Uuid::new_v4().to_string(),
        owner_id: user.user_id,
        amount: req.amount,
        kind: req.kind,
        target: req.target,
        timestamp: req.timestamp.unwrap_or_else(Utc::now),
        notes: req.notes,
    };
    db::insert_trade(&state.db, &trade)?;

    state
        .counters
        .trades_created
        .fetch_add(1, portable_atomic::Ordering::Relaxed);
    tracing::info!(kind = %trade.kind, amount = trade.amount, "trade recorded");

    Ok(Json(trade))
}

/// PUT /api/trades/{id} -- edit any field except id and owner
pub async fn update_trade(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(trade_id): Path<String>,
    Json(req): Json<UpdateTradeRequest>,
) -> ApiResult<Json<TradeRecord>> {
    let mut trade = db::get_trade(&state.db, &trade_id, &user.user_id)?
        .ok_or(ApiError::NotFound("trade"))?;

    if let Some(amount) = req.amount {
        validate_amount(amount)?;
        trade.amount = amount;
    }
    if let Some(kind) = req.kind {
        trade.kind = kind;
    }
    if let Some(target) = req.target {
        trade.target = target;
    }
    if let Some(timestamp) = req.timestamp {
        trade.timestamp = timestamp;
    }
    if let Some(notes) = req.notes {
        trade.notes = Some(notes);
    }

    if !db::update_trade(&state.db, &trade)? {
        return Err(ApiError::NotFound("trade"));
    }

    state
        .counters
        .trades_updated
        .fetch_add(1, portable_atomic::Ordering::Relaxed);

    Ok(Json(trade))
}

/// DELETE /api/trades/{id}
pub async fn delete_trade(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(trade_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    if !db::delete_trade(&state.db, &trade_id, &user.user_id)? {
        return Err(ApiError::NotFound("trade"));
    }

    state
        .counters
        .trades_deleted
        .fetch_add(1, portable_atomic::Ordering::Relaxed);

    Ok(Json(serde_json::json!({ "success": true })))
}

// ── Statistics (handlers fetch, inject the clock, and call the engine) ──

/// GET /api/stats/summary -- totals and win rate over the current period
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<stats::Summary>> {
    let trades = db::list_trades(&state.db, &user.user_id)?;
    let today = Utc::now().date_naive();
    let period = stats::filter_to_period(&trades, query.granularity, today);

    state
        .counters
        .stats_served
        .fetch_add(1, portable_atomic::Ordering::Relaxed);

    Ok(Json(stats::summarize(&period)))
}

/// GET /api/stats/weekdays -- Mon..Sun distribution of the current period
pub async fn get_weekdays(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<Vec<stats::BucketStats>>> {
    let trades = db::list_trades(&state.db, &user.user_id)?;
    let today = Utc::now().date_naive();
    let period = stats::filter_to_period(&trades, query.granularity, today);

    state
        .counters
        .stats_served
        .fetch_add(1, portable_atomic::Ordering::Relaxed);

    Ok(Json(stats::aggregate_by_weekday(&period)))
}

/// GET /api/stats/series -- trailing-window trend series; the window itself
/// bounds what shows, so no period pre-filter here
pub async fn get_series(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<Vec<stats::BucketStats>>> {
    let trades = db::list_trades(&state.db, &user.user_id)?;
    let today = Utc::now().date_naive();

    state
        .counters
        .stats_served
        .fetch_add(1, portable_atomic::Ordering::Relaxed);

    Ok(Json(stats::aggregate(&trades, query.granularity, today)))
}

// ── Operational ──

/// GET /api/counters -- operation counters (lock-free reads)
pub async fn get_counters(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    use portable_atomic::Ordering::Relaxed;
    Json(serde_json::json!({
        "registrations": state.counters.registrations.load(Relaxed),
        "logins": state.counters.logins.load(Relaxed),
        "trades_created": state.counters.trades_created.load(Relaxed),
        "trades_updated": state.counters.trades_updated.load(Relaxed),
        "trades_deleted": state.counters.trades_deleted.load(Relaxed),
        "stats_served": state.counters.stats_served.load(Relaxed),
    }))
}
