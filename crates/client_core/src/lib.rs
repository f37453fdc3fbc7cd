use std::{fmt, sync::Arc};

use async_trait::async_trait;
use futures::future::join_all;
use shared::domain::{find_cart_item, CartItem, ItemId};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

pub mod edit;
pub mod error;
pub mod state;
pub mod transport;

pub use edit::{EditSession, EditStep};
pub use error::StoreError;
pub use state::{CartSnapshot, CartState, SubscriptionId};
pub use transport::{HttpRemoteStore, RemoteStore};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartAction {
    LoadData,
    AddToCart,
    DeleteCartItem,
    UpdateCartItem,
    Checkout,
}

impl CartAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoadData => "load_data",
            Self::AddToCart => "add_to_cart",
            Self::DeleteCartItem => "delete_cart_item",
            Self::UpdateCartItem => "update_cart_item",
            Self::Checkout => "checkout",
        }
    }
}

impl fmt::Display for CartAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signals for the presentation layer that are not plain state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    EditStarted { item: CartItem },
    EditCancelled { id: ItemId },
    CheckoutCompleted { requested: usize, failed: usize },
    ActionFailed { action: CartAction, message: String },
}

/// User intents accepted from the presentation layer.
#[async_trait]
pub trait CartHandle: Send + Sync {
    async fn load(&self);
    async fn add_to_cart(&self, item: CartItem);
    async fn delete_cart_item(&self, id: ItemId);
    async fn edit_cart_item(&self, id: ItemId) -> bool;
    async fn adjust_edit(&self, step: EditStep) -> Option<u32>;
    async fn save_edit(&self) -> bool;
    async fn update_cart_item(&self, id: ItemId, amount: u32);
    async fn cancel_edit(&self);
    async fn checkout(&self);
    fn state(&self) -> Arc<CartState>;
    fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent>;
}

/// Turns user intents into remote calls and writes the authoritative result
/// back into [`CartState`].
///
/// Every mutating handler follows the same shape: mutate remote, re-read the
/// remote cart, replace the local snapshot. Local state is never derived from
/// the echo of the write itself. Failures are logged and published as
/// [`ClientEvent::ActionFailed`]; the local snapshot is then left as it was.
pub struct CartClient {
    store: Arc<dyn RemoteStore>,
    state: Arc<CartState>,
    edit_session: Mutex<Option<EditSession>>,
    events: broadcast::Sender<ClientEvent>,
}

impl CartClient {
    pub fn new(store: Arc<dyn RemoteStore>) -> Arc<Self> {
        Self::with_state(store, Arc::new(CartState::new()))
    }

    pub fn with_state(store: Arc<dyn RemoteStore>, state: Arc<CartState>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            store,
            state,
            edit_session: Mutex::new(None),
            events,
        })
    }

    pub fn state(&self) -> &Arc<CartState> {
        &self.state
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub async fn edit_session(&self) -> Option<EditSession> {
        self.edit_session.lock().await.clone()
    }

    /// Fetches inventory, then cart. A failed inventory fetch skips the cart
    /// fetch. Inventory is written as soon as it arrives, so a failed cart
    /// fetch leaves inventory populated and the cart at its previous value.
    pub async fn load_data(&self) {
        if let Err(err) = self.try_load_data().await {
            self.report(CartAction::LoadData, &err);
        }
    }

    async fn try_load_data(&self) -> Result<(), StoreError> {
        let inventory = self.store.fetch_inventory().await?;
        info!("cart: loaded inventory items={}", inventory.len());
        self.state.set_inventory(inventory).await;
        self.refresh_cart().await
    }

    /// Adds `item.amount` of an inventory item. An id already in the cart is
    /// merged into the existing row instead of creating a second one.
    pub async fn handle_add_to_cart(&self, item: CartItem) {
        if item.amount == 0 {
            let err = StoreError::Validation(format!(
                "refusing to add zero amount of item {}",
                item.id
            ));
            self.report(CartAction::AddToCart, &err);
            return;
        }
        if let Err(err) = self.try_add_to_cart(item).await {
            self.report(CartAction::AddToCart, &err);
        }
    }

    async fn try_add_to_cart(&self, item: CartItem) -> Result<(), StoreError> {
        match self.state.find_cart_item(item.id).await {
            Some(existing) => {
                let amount = existing.amount.saturating_add(item.amount);
                self.store.update_cart_item(existing.id, amount).await?;
                info!("cart: merged item={} amount={amount}", existing.id);
            }
            None => {
                self.store.create_cart_item(&item).await?;
                info!("cart: created item={} amount={}", item.id, item.amount);
            }
        }
        self.refresh_cart().await
    }

    pub async fn handle_delete_cart_item(&self, id: ItemId) {
        if let Err(err) = self.try_delete_cart_item(id).await {
            self.report(CartAction::DeleteCartItem, &err);
        }
    }

    async fn try_delete_cart_item(&self, id: ItemId) -> Result<(), StoreError> {
        match self.store.delete_cart_item(id).await {
            Ok(()) => info!("cart: deleted item={id}"),
            Err(err) if err.is_not_found() => {
                warn!("cart: item={id} already absent remotely; refreshing anyway");
            }
            Err(err) => return Err(err),
        }
        self.refresh_cart().await
    }

    /// Starts an edit session for `id`. Returns `false` without side effects
    /// when the id is not in the current snapshot or nobody is listening for
    /// the edit-mode signal.
    pub async fn handle_edit_cart_item(&self, id: ItemId) -> bool {
        let Some(item) = self.state.find_cart_item(id).await else {
            debug!("cart: edit ignored, item={id} not in cart");
            return false;
        };
        // The session must exist before listeners see the signal.
        let mut guard = self.edit_session.lock().await;
        let previous = guard.replace(EditSession::begin(&item));
        if self.events.send(ClientEvent::EditStarted { item }).is_err() {
            debug!("cart: edit ignored, no presentation listening");
            *guard = previous;
            return false;
        }
        true
    }

    pub async fn adjust_edit(&self, step: EditStep) -> Option<u32> {
        let mut guard = self.edit_session.lock().await;
        guard.as_mut().map(|session| session.apply(step))
    }

    /// Commits the draft of the active edit session, if any.
    pub async fn save_edit(&self) -> bool {
        let Some(session) = self.edit_session().await else {
            return false;
        };
        self.handle_update_cart_item(session.id, session.draft_amount)
            .await;
        true
    }

    /// Sets the amount of a cart item. Zero is stored as zero; it does not
    /// delete the item.
    pub async fn handle_update_cart_item(&self, id: ItemId, amount: u32) {
        if let Err(err) = self.try_update_cart_item(id, amount).await {
            self.report(CartAction::UpdateCartItem, &err);
            return;
        }
        let mut guard = self.edit_session.lock().await;
        if guard.as_ref().is_some_and(|session| session.id == id) {
            *guard = None;
        }
    }

    async fn try_update_cart_item(&self, id: ItemId, amount: u32) -> Result<(), StoreError> {
        self.store.update_cart_item(id, amount).await?;
        info!("cart: updated item={id} amount={amount}");
        self.refresh_cart().await
    }

    /// Drops the edit session and re-renders from the current snapshot.
    pub async fn handle_cancel_edit(&self) {
        let cancelled = self.edit_session.lock().await.take();
        if let Some(session) = cancelled {
            let _ = self
                .events
                .send(ClientEvent::EditCancelled { id: session.id });
        }
        self.state.republish().await;
    }

    /// Deletes every remote cart item concurrently, then re-reads the cart.
    /// Not transactional: failed deletes are logged and left in place.
    pub async fn handle_checkout(&self) {
        if let Err(err) = self.try_checkout().await {
            self.report(CartAction::Checkout, &err);
        }
    }

    async fn try_checkout(&self) -> Result<(), StoreError> {
        let cart = self.store.fetch_cart().await?;
        let results = join_all(cart.iter().map(|item| self.store.delete_cart_item(item.id))).await;

        let mut failed = 0;
        for (item, result) in cart.iter().zip(results) {
            match result {
                Ok(()) => {}
                Err(err) if err.is_not_found() => {
                    warn!("checkout: item={} already absent remotely", item.id);
                }
                Err(err) => {
                    failed += 1;
                    warn!("checkout: delete failed item={} error={err}", item.id);
                }
            }
        }

        self.refresh_cart().await?;
        info!("checkout: requested={} failed={failed}", cart.len());
        let _ = self.events.send(ClientEvent::CheckoutCompleted {
            requested: cart.len(),
            failed,
        });
        Ok(())
    }

    async fn refresh_cart(&self) -> Result<(), StoreError> {
        let cart = self.store.fetch_cart().await?;
        {
            let mut guard = self.edit_session.lock().await;
            if let Some(session) = guard.as_ref() {
                if find_cart_item(&cart, session.id).is_none() {
                    debug!("cart: dropping edit session for removed item={}", session.id);
                    *guard = None;
                }
            }
        }
        self.state.set_cart(cart).await;
        Ok(())
    }

    fn report(&self, action: CartAction, err: &StoreError) {
        error!(%action, error = %err, "cart action abandoned; local state unchanged");
        let _ = self.events.send(ClientEvent::ActionFailed {
            action,
            message: err.to_string(),
        });
    }
}

#[async_trait]
impl CartHandle for CartClient {
    async fn load(&self) {
        self.load_data().await;
    }

    async fn add_to_cart(&self, item: CartItem) {
        self.handle_add_to_cart(item).await;
    }

    async fn delete_cart_item(&self, id: ItemId) {
        self.handle_delete_cart_item(id).await;
    }

    async fn edit_cart_item(&self, id: ItemId) -> bool {
        self.handle_edit_cart_item(id).await
    }

    async fn adjust_edit(&self, step: EditStep) -> Option<u32> {
        CartClient::adjust_edit(self, step).await
    }

    async fn save_edit(&self) -> bool {
        CartClient::save_edit(self).await
    }

    async fn update_cart_item(&self, id: ItemId, amount: u32) {
        self.handle_update_cart_item(id, amount).await;
    }

    async fn cancel_edit(&self) {
        self.handle_cancel_edit().await;
    }

    async fn checkout(&self) {
        self.handle_checkout().await;
    }

    fn state(&self) -> Arc<CartState> {
        Arc::clone(&self.state)
    }

    fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
