use super::*;
use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode as AxumStatus,
    routing::{get, patch},
    Json, Router,
};
use shared::protocol::DeleteAck;
use std::sync::Arc;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct ServerState {
    cart: Arc<Mutex<Vec<CartItem>>>,
    patches: Arc<Mutex<Vec<(i64, UpdateCartAmountRequest)>>>,
}

async fn list_inventory() -> Json<Vec<InventoryItem>> {
    Json(vec![
        InventoryItem {
            id: ItemId(1),
            content: "Apple".to_string(),
        },
        InventoryItem {
            id: ItemId(2),
            content: "Pear".to_string(),
        },
    ])
}

async fn list_cart(State(state): State<ServerState>) -> Json<Vec<CartItem>> {
    Json(state.cart.lock().await.clone())
}

async fn create_cart_item(
    State(state): State<ServerState>,
    Json(item): Json<CartItem>,
) -> (AxumStatus, Json<CartItem>) {
    state.cart.lock().await.push(item.clone());
    (AxumStatus::CREATED, Json(item))
}

async fn update_cart_item(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCartAmountRequest>,
) -> Result<Json<CartItem>, AxumStatus> {
    state.patches.lock().await.push((id, req));
    let mut cart = state.cart.lock().await;
    let item = cart
        .iter_mut()
        .find(|item| item.id.0 == id)
        .ok_or(AxumStatus::NOT_FOUND)?;
    item.amount = req.amount;
    Ok(Json(item.clone()))
}

async fn delete_cart_item(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteAck>, AxumStatus> {
    let mut cart = state.cart.lock().await;
    let before = cart.len();
    cart.retain(|item| item.id.0 != id);
    if cart.len() == before {
        return Err(AxumStatus::NOT_FOUND);
    }
    Ok(Json(DeleteAck {}))
}

async fn spawn_store_server(router: Router) -> Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(format!("http://{addr}"))
}

async fn spawn_cart_server() -> Result<(String, ServerState)> {
    let state = ServerState::default();
    let app = Router::new()
        .route("/inventory", get(list_inventory))
        .route("/cart", get(list_cart).post(create_cart_item))
        .route("/cart/:id", patch(update_cart_item).delete(delete_cart_item))
        .with_state(state.clone());
    Ok((spawn_store_server(app).await?, state))
}

#[tokio::test]
async fn fetches_inventory_from_remote() {
    let (url, _state) = spawn_cart_server().await.expect("spawn server");
    let store = HttpRemoteStore::new(url);

    let inventory = store.fetch_inventory().await.expect("inventory");

    assert_eq!(inventory.len(), 2);
    assert_eq!(inventory[1].content, "Pear");
}

#[tokio::test]
async fn create_update_delete_round_trip_through_http() {
    let (url, state) = spawn_cart_server().await.expect("spawn server");
    let store = HttpRemoteStore::new(format!("{url}/"));
    let apple = CartItem::new(ItemId(1), "Apple", 2);

    let created = store.create_cart_item(&apple).await.expect("create");
    assert_eq!(created, apple);

    let updated = store.update_cart_item(ItemId(1), 5).await.expect("update");
    assert_eq!(updated.amount, 5);
    assert_eq!(
        *state.patches.lock().await,
        vec![(1, UpdateCartAmountRequest { amount: 5 })]
    );
    assert_eq!(
        store.fetch_cart().await.expect("cart"),
        vec![CartItem::new(ItemId(1), "Apple", 5)]
    );

    store.delete_cart_item(ItemId(1)).await.expect("delete");
    assert!(store.fetch_cart().await.expect("cart").is_empty());
}

#[tokio::test]
async fn missing_item_maps_to_not_found() {
    let (url, _state) = spawn_cart_server().await.expect("spawn server");
    let store = HttpRemoteStore::new(url);

    let update = store
        .update_cart_item(ItemId(7), 1)
        .await
        .expect_err("must fail");
    assert!(matches!(update, StoreError::NotFound { id } if id == ItemId(7)));

    let delete = store
        .delete_cart_item(ItemId(7))
        .await
        .expect_err("must fail");
    assert!(delete.is_not_found());
}

#[tokio::test]
async fn server_error_maps_to_transport_with_status() {
    let app = Router::new().route(
        "/cart",
        get(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let url = spawn_store_server(app).await.expect("spawn server");
    let store = HttpRemoteStore::new(url);

    let err = store.fetch_cart().await.expect_err("must fail");
    match err {
        StoreError::Transport { status, .. } => assert_eq!(status, Some(500)),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn missing_collection_route_is_transport_not_item_not_found() {
    let url = spawn_store_server(Router::new())
        .await
        .expect("spawn server");
    let store = HttpRemoteStore::new(url);

    let err = store.fetch_inventory().await.expect_err("must fail");
    assert!(matches!(err, StoreError::Transport { status: Some(404), .. }));
}

#[tokio::test]
async fn malformed_body_maps_to_validation() {
    let app = Router::new().route(
        "/inventory",
        get(|| async { Json(serde_json::json!([{ "id": "not-a-number" }])) }),
    );
    let url = spawn_store_server(app).await.expect("spawn server");
    let store = HttpRemoteStore::new(url);

    let err = store.fetch_inventory().await.expect_err("must fail");
    assert!(matches!(err, StoreError::Validation(_)), "{err:?}");
}

#[tokio::test]
async fn unreachable_store_maps_to_transport_without_status() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let store = HttpRemoteStore::new(format!("http://{addr}"));

    let err = store.fetch_cart().await.expect_err("must fail");
    assert!(matches!(err, StoreError::Transport { status: None, .. }), "{err:?}");
}

#[test]
fn base_url_trailing_slash_is_trimmed() {
    let store = HttpRemoteStore::new("http://localhost:3000/");
    assert_eq!(store.base_url(), "http://localhost:3000");
    assert_eq!(store.url("/cart"), "http://localhost:3000/cart");
}
