//! Cart and inventory operations behind the HTTP routes.

use shared::{
    domain::{CartItem, InventoryItem, ItemId},
    error::{ApiError, ErrorCode},
    protocol::DeleteAck,
};
use storage::Storage;
use tracing::info;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

pub async fn list_inventory(ctx: &ApiContext) -> Result<Vec<InventoryItem>, ApiError> {
    ctx.storage.list_inventory().await.map_err(internal)
}

pub async fn list_cart(ctx: &ApiContext) -> Result<Vec<CartItem>, ApiError> {
    ctx.storage.list_cart().await.map_err(internal)
}

pub async fn create_cart_item(ctx: &ApiContext, item: CartItem) -> Result<CartItem, ApiError> {
    if item.amount == 0 {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "cart amount must be positive",
        ));
    }
    if item.content.trim().is_empty() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "cart item content must not be empty",
        ));
    }
    let created = ctx
        .storage
        .insert_cart_item(&item)
        .await
        .map_err(internal)?
        .ok_or_else(|| {
            ApiError::new(
                ErrorCode::Conflict,
                format!("cart item {} already exists", item.id),
            )
        })?;
    info!(item_id = created.id.0, amount = created.amount, "cart item created");
    Ok(created)
}

pub async fn update_cart_item(
    ctx: &ApiContext,
    id: ItemId,
    amount: u32,
) -> Result<CartItem, ApiError> {
    let updated = ctx
        .storage
        .update_cart_amount(id, amount)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(id))?;
    info!(item_id = id.0, amount, "cart item updated");
    Ok(updated)
}

pub async fn delete_cart_item(ctx: &ApiContext, id: ItemId) -> Result<DeleteAck, ApiError> {
    if !ctx.storage.delete_cart_item(id).await.map_err(internal)? {
        return Err(not_found(id));
    }
    info!(item_id = id.0, "cart item deleted");
    Ok(DeleteAck {})
}

fn not_found(id: ItemId) -> ApiError {
    ApiError::new(ErrorCode::NotFound, format!("cart item {id} not found"))
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
