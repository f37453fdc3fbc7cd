//! HTTP surface shared by the remote store and its clients.

use serde::{Deserialize, Serialize};

use crate::domain::ItemId;

pub fn inventory_route() -> &'static str {
    "/inventory"
}

pub fn cart_route() -> &'static str {
    "/cart"
}

pub fn cart_item_route(id: ItemId) -> String {
    format!("{}/{}", cart_route(), id.0)
}

/// Body of `PATCH /cart/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCartAmountRequest {
    pub amount: u32,
}

/// Body of a successful `DELETE /cart/{id}`; serialized as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteAck {}
