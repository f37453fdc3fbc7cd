use super::*;
use async_trait::async_trait;
use client_core::{CartState, EditStep};
use shared::domain::{InventoryItem, ItemId};
use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};
use tokio::sync::broadcast;

/// Handle whose remote-touching intents take a while and count completions.
struct SlowHandle {
    state: Arc<CartState>,
    events: broadcast::Sender<ClientEvent>,
    completed: AtomicUsize,
}

impl SlowHandle {
    fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        Arc::new(Self {
            state: Arc::new(CartState::new()),
            events,
            completed: AtomicUsize::new(0),
        })
    }

    async fn finish(&self) {
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CartHandle for SlowHandle {
    async fn load(&self) {}

    async fn add_to_cart(&self, _item: CartItem) {
        self.finish().await;
    }

    async fn delete_cart_item(&self, _id: ItemId) {
        self.finish().await;
    }

    async fn edit_cart_item(&self, _id: ItemId) -> bool {
        false
    }

    async fn adjust_edit(&self, _step: EditStep) -> Option<u32> {
        None
    }

    async fn save_edit(&self) -> bool {
        self.finish().await;
        true
    }

    async fn update_cart_item(&self, _id: ItemId, _amount: u32) {
        self.finish().await;
    }

    async fn cancel_edit(&self) {}

    async fn checkout(&self) {
        self.finish().await;
    }

    fn state(&self) -> Arc<CartState> {
        Arc::clone(&self.state)
    }

    fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }
}

#[tokio::test]
async fn draining_waits_for_every_spawned_intent() {
    let slow = SlowHandle::new();
    slow.state
        .set_inventory(vec![InventoryItem {
            id: ItemId(1),
            content: "apple".to_string(),
        }])
        .await;
    let handle: Arc<dyn CartHandle> = slow.clone();
    let selection = Arc::new(Mutex::new(InventorySelection::default()));
    let mut in_flight = JoinSet::new();

    let commands = [
        Command::Select {
            id: ItemId(1),
            step: EditStep::Increment,
        },
        Command::Add { id: ItemId(1) },
        Command::Delete { id: ItemId(1) },
        Command::Update {
            id: ItemId(1),
            amount: 2,
        },
        Command::Save,
        Command::Checkout,
    ];
    for command in commands {
        dispatch(&handle, &selection, &mut in_flight, command).await;
    }
    assert_eq!(in_flight.len(), 5);
    assert_eq!(slow.completed.load(Ordering::SeqCst), 0);

    drain_in_flight(&mut in_flight).await;

    assert!(in_flight.is_empty());
    assert_eq!(slow.completed.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn add_without_selection_spawns_nothing() {
    let slow = SlowHandle::new();
    slow.state
        .set_inventory(vec![InventoryItem {
            id: ItemId(1),
            content: "apple".to_string(),
        }])
        .await;
    let handle: Arc<dyn CartHandle> = slow.clone();
    let selection = Arc::new(Mutex::new(InventorySelection::default()));
    let mut in_flight = JoinSet::new();

    dispatch(&handle, &selection, &mut in_flight, Command::Add { id: ItemId(1) }).await;

    assert!(in_flight.is_empty());
}
