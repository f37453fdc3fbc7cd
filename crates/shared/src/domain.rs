use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(ItemId);

/// Catalog entry. Only the remote store creates or removes these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub content: String,
}

/// A cart line. `id` is the id of the inventory item it was added from and is
/// unique within the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ItemId,
    pub content: String,
    pub amount: u32,
}

impl CartItem {
    pub fn new(id: ItemId, content: impl Into<String>, amount: u32) -> Self {
        Self {
            id,
            content: content.into(),
            amount,
        }
    }

    pub fn from_inventory(item: &InventoryItem, amount: u32) -> Self {
        Self::new(item.id, item.content.clone(), amount)
    }
}

pub fn find_cart_item(cart: &[CartItem], id: ItemId) -> Option<&CartItem> {
    cart.iter().find(|item| item.id == id)
}
