//! Observable local view of the remote inventory and cart collections.

use std::sync::Arc;

use shared::domain::{find_cart_item, CartItem, InventoryItem, ItemId};
use tokio::sync::Mutex;

pub type SubscriptionId = u64;

/// Full contents of the state at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSnapshot {
    pub inventory: Vec<InventoryItem>,
    pub cart: Vec<CartItem>,
}

type Observer = Arc<dyn Fn(&CartSnapshot) + Send + Sync>;

/// Both collections are only ever replaced wholesale. Every setter notifies
/// each registered observer exactly once, while the lock is held, so an
/// observer never sees a half-applied write.
pub struct CartState {
    inner: Mutex<CartStateInner>,
}

struct CartStateInner {
    snapshot: CartSnapshot,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: SubscriptionId,
}

impl Default for CartState {
    fn default() -> Self {
        Self::new()
    }
}

impl CartState {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CartStateInner {
                snapshot: CartSnapshot::default(),
                observers: Vec::new(),
                next_subscription: 1,
            }),
        }
    }

    pub async fn inventory(&self) -> Vec<InventoryItem> {
        self.inner.lock().await.snapshot.inventory.clone()
    }

    pub async fn cart(&self) -> Vec<CartItem> {
        self.inner.lock().await.snapshot.cart.clone()
    }

    pub async fn snapshot(&self) -> CartSnapshot {
        self.inner.lock().await.snapshot.clone()
    }

    pub async fn find_cart_item(&self, id: ItemId) -> Option<CartItem> {
        let guard = self.inner.lock().await;
        find_cart_item(&guard.snapshot.cart, id).cloned()
    }

    pub async fn set_inventory(&self, next: Vec<InventoryItem>) {
        let mut guard = self.inner.lock().await;
        guard.snapshot.inventory = next;
        guard.notify();
    }

    pub async fn set_cart(&self, next: Vec<CartItem>) {
        let mut guard = self.inner.lock().await;
        guard.snapshot.cart = next;
        guard.notify();
    }

    /// Notifies every observer with the current snapshot without changing it.
    pub async fn republish(&self) {
        self.inner.lock().await.notify();
    }

    /// Registers an observer called with every replaced snapshot. Observers
    /// run synchronously while the state lock is held: they must not block,
    /// touch this `CartState`, or panic, since a panic unwinds through the
    /// setter that triggered it.
    pub async fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&CartSnapshot) + Send + Sync + 'static,
    {
        let mut guard = self.inner.lock().await;
        let id = guard.next_subscription;
        guard.next_subscription += 1;
        guard.observers.push((id, Arc::new(observer)));
        id
    }

    pub async fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut guard = self.inner.lock().await;
        let before = guard.observers.len();
        guard.observers.retain(|(observer_id, _)| *observer_id != id);
        guard.observers.len() != before
    }

    pub async fn clear_subscribers(&self) {
        self.inner.lock().await.observers.clear();
    }

    pub async fn subscriber_count(&self) -> usize {
        self.inner.lock().await.observers.len()
    }
}

impl CartStateInner {
    fn notify(&self) {
        for (_, observer) in &self.observers {
            observer(&self.snapshot);
        }
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
