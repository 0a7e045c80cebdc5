//! JSON API backing the Mini App dashboard.
//!
//! The dashboard is served from a different origin (the Telegram webview),
//! so CORS is wide open. Leaderboard and guild views are cached briefly to
//! keep repeated dashboard loads off the database.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Duration, Local};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::cache::TtlCache;
use crate::db::Database;
use crate::stats::Progress;

const API_TTL_SECS: i64 = 30;
const GUILD_RANKING_LIMIT: usize = 20;

#[derive(Clone)]
pub struct ApiState {
    pub db: Arc<Mutex<Database>>,
    pub cache: TtlCache<Value>,
}

enum ApiError {
    NotFound,
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

fn internal(err: impl std::fmt::Display) -> ApiError {
    error!(%err, "dashboard api request failed");
    ApiError::Internal(err.to_string())
}

pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/leaderboard", get(leaderboard))
        .route("/api/guilds/{id}", get(guild))
        .route("/api/users/{id}/summary", get(user_summary))
        .layer(cors)
        .with_state(state)
}

/// Serve the dashboard API until the process exits
pub async fn serve(bind: &str, state: ApiState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(%bind, "dashboard api listening");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn leaderboard(State(state): State<ApiState>) -> Result<Json<Value>, ApiError> {
    let db = Arc::clone(&state.db);
    let value = state
        .cache
        .get_or_fetch("board", Duration::seconds(API_TTL_SECS), move || async move {
            let db = db.lock().await;
            let standings = db.guild_standings()?;
            Ok(json!({ "standings": standings }))
        })
        .await
        .map_err(internal)?;
    Ok(Json(value))
}

async fn guild(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let guild = { state.db.lock().await.find_guild(id).map_err(internal)? };
    let guild = guild.ok_or(ApiError::NotFound)?;

    let db = Arc::clone(&state.db);
    let key = format!("guild:{id}");
    let value = state
        .cache
        .get_or_fetch(&key, Duration::seconds(API_TTL_SECS), move || async move {
            let db = db.lock().await;
            let members = db.guild_members_ranked(id, GUILD_RANKING_LIMIT)?;
            Ok(json!({ "guild": guild, "members": members }))
        })
        .await
        .map_err(internal)?;
    Ok(Json(value))
}

async fn user_summary(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let member = { state.db.lock().await.find_member(id).map_err(internal)? };
    let member = member.ok_or(ApiError::NotFound)?;

    let db = Arc::clone(&state.db);
    let key = format!("me:{id}");
    let value = state
        .cache
        .get_or_fetch(&key, Duration::seconds(API_TTL_SECS), move || async move {
            let db = db.lock().await;
            let guild = db.find_guild(member.guild_id)?;
            let workouts = db.workouts_for_user(member.id)?;
            drop(db);

            let progress = Progress::new(workouts);
            let today = Local::now().date_naive();
            Ok(json!({
                "member": { "id": member.id, "name": member.name, "guild": guild },
                "totals": {
                    "points": progress.total_points(),
                    "minutes": progress.total_minutes(),
                    "workouts": progress.workout_count(),
                },
                "week": {
                    "points": progress.week_points(today),
                    "sessions": progress.week_sessions(today),
                },
                "streak_days": progress.streak_days(today),
                "favorite_category": progress.favorite_category(),
            }))
        })
        .await
        .map_err(internal)?;
    Ok(Json(value))
}
