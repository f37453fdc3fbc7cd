use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use shared::{
    domain::{CartItem, InventoryItem, ItemId},
    error::{ApiError, ErrorCode},
    protocol::{DeleteAck, UpdateCartAmountRequest},
};
use storage::Storage;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;

use api::ApiContext;
use app_state::AppState;
use config::{load_settings, prepare_database_url};

const MAX_REQUEST_BODY_BYTES: usize = 16 * 1024;

type HttpResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let seeded = storage.seed_inventory(&settings.inventory).await?;
    if seeded > 0 {
        info!(items = seeded, "seeded empty inventory");
    }

    let state = AppState {
        api: ApiContext { storage },
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "cart store listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/inventory", get(http_list_inventory))
        .route("/cart", get(http_list_cart).post(http_create_cart_item))
        .route(
            "/cart/:id",
            patch(http_update_cart_item).delete(http_delete_cart_item),
        )
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, StatusCode> {
    state
        .api
        .storage
        .health_check()
        .await
        .map_err(|error| {
            error!(%error, "health check failed");
            StatusCode::SERVICE_UNAVAILABLE
        })?;
    Ok("ok")
}

async fn http_list_inventory(
    State(state): State<Arc<AppState>>,
) -> HttpResult<Vec<InventoryItem>> {
    api::list_inventory(&state.api)
        .await
        .map(Json)
        .map_err(into_response_error)
}

async fn http_list_cart(State(state): State<Arc<AppState>>) -> HttpResult<Vec<CartItem>> {
    api::list_cart(&state.api)
        .await
        .map(Json)
        .map_err(into_response_error)
}

async fn http_create_cart_item(
    State(state): State<Arc<AppState>>,
    Json(item): Json<CartItem>,
) -> Result<(StatusCode, Json<CartItem>), (StatusCode, Json<ApiError>)> {
    api::create_cart_item(&state.api, item)
        .await
        .map(|created| (StatusCode::CREATED, Json(created)))
        .map_err(into_response_error)
}

async fn http_update_cart_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCartAmountRequest>,
) -> HttpResult<CartItem> {
    api::update_cart_item(&state.api, ItemId(id), req.amount)
        .await
        .map(Json)
        .map_err(into_response_error)
}

async fn http_delete_cart_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> HttpResult<DeleteAck> {
    api::delete_cart_item(&state.api, ItemId(id))
        .await
        .map(Json)
        .map_err(into_response_error)
}

fn into_response_error(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => {
            error!(message = %err.message, "cart store internal error");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(err))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
