use std::collections::HashMap;

use client_core::EditStep;
use shared::domain::ItemId;

/// Per-inventory-item amount chosen before "add to cart". Starts at zero and
/// never goes below it.
#[derive(Debug, Default)]
pub struct InventorySelection {
    amounts: HashMap<ItemId, u32>,
}

impl InventorySelection {
    pub fn amount(&self, id: ItemId) -> u32 {
        self.amounts.get(&id).copied().unwrap_or(0)
    }

    pub fn step(&mut self, id: ItemId, step: EditStep) -> u32 {
        let amount = self.amounts.entry(id).or_insert(0);
        *amount = match step {
            EditStep::Increment => amount.saturating_add(1),
            EditStep::Decrement => amount.saturating_sub(1),
        };
        *amount
    }

    /// Returns the selected amount and resets it, or `None` when nothing is
    /// selected.
    pub fn take(&mut self, id: ItemId) -> Option<u32> {
        match self.amounts.remove(&id) {
            Some(amount) if amount > 0 => Some(amount),
            _ => None,
        }
    }
}
