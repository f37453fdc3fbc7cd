//! Remote store access: the capability trait and its HTTP implementation.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{CartItem, InventoryItem, ItemId},
    protocol::{cart_item_route, cart_route, inventory_route, UpdateCartAmountRequest},
};

use crate::error::StoreError;

/// Read/create/update/delete access to the remote inventory and cart
/// collections. No call is atomic with any other.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn fetch_inventory(&self) -> Result<Vec<InventoryItem>, StoreError>;
    async fn fetch_cart(&self) -> Result<Vec<CartItem>, StoreError>;
    /// Not idempotent server-side: callers must not create an id that is
    /// already in the cart.
    async fn create_cart_item(&self, item: &CartItem) -> Result<CartItem, StoreError>;
    async fn update_cart_item(&self, id: ItemId, amount: u32) -> Result<CartItem, StoreError>;
    async fn delete_cart_item(&self, id: ItemId) -> Result<(), StoreError>;
}

pub struct HttpRemoteStore {
    http: Client,
    base_url: String,
}

impl HttpRemoteStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, route: &str) -> String {
        format!("{}{route}", self.base_url)
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn fetch_inventory(&self) -> Result<Vec<InventoryItem>, StoreError> {
        let res = self.http.get(self.url(inventory_route())).send().await?;
        read_json(ensure_success(res, None)?).await
    }

    async fn fetch_cart(&self) -> Result<Vec<CartItem>, StoreError> {
        let res = self.http.get(self.url(cart_route())).send().await?;
        read_json(ensure_success(res, None)?).await
    }

    async fn create_cart_item(&self, item: &CartItem) -> Result<CartItem, StoreError> {
        let res = self
            .http
            .post(self.url(cart_route()))
            .json(item)
            .send()
            .await?;
        read_json(ensure_success(res, None)?).await
    }

    async fn update_cart_item(&self, id: ItemId, amount: u32) -> Result<CartItem, StoreError> {
        let res = self
            .http
            .patch(self.url(&cart_item_route(id)))
            .json(&UpdateCartAmountRequest { amount })
            .send()
            .await?;
        read_json(ensure_success(res, Some(id))?).await
    }

    async fn delete_cart_item(&self, id: ItemId) -> Result<(), StoreError> {
        let res = self
            .http
            .delete(self.url(&cart_item_route(id)))
            .send()
            .await?;
        // The ack body carries nothing we use.
        ensure_success(res, Some(id)).map(|_| ())
    }
}

fn ensure_success(res: Response, id: Option<ItemId>) -> Result<Response, StoreError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    match id {
        Some(id) if status == StatusCode::NOT_FOUND => Err(StoreError::NotFound { id }),
        _ => Err(StoreError::Transport {
            status: Some(status.as_u16()),
            message: format!("{} answered {status}", res.url()),
        }),
    }
}

async fn read_json<T: DeserializeOwned>(res: Response) -> Result<T, StoreError> {
    let body = res.bytes().await?;
    serde_json::from_slice(&body).map_err(|err| StoreError::Validation(err.to_string()))
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
