use std::fmt::Write as _;

use client_core::{CartSnapshot, EditSession};

use crate::selection::InventorySelection;

pub fn render_snapshot(snapshot: &CartSnapshot, selection: &InventorySelection) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== inventory");
    if snapshot.inventory.is_empty() {
        let _ = writeln!(out, "  (empty)");
    }
    for item in &snapshot.inventory {
        let _ = writeln!(
            out,
            "  [{:>3}] {:<20} selected {}",
            item.id,
            item.content,
            selection.amount(item.id)
        );
    }
    let _ = writeln!(out, "== cart");
    if snapshot.cart.is_empty() {
        let _ = writeln!(out, "  (empty)");
    }
    for item in &snapshot.cart {
        let _ = writeln!(out, "  [{:>3}] {:<20} x {}", item.id, item.content, item.amount);
    }
    out
}

pub fn render_edit(session: &EditSession) -> String {
    format!(
        "editing [{}] {}: {} (was {}); edit+ / edit- / save / cancel",
        session.id, session.content, session.draft_amount, session.original_amount
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::EditStep;
    use shared::domain::{CartItem, InventoryItem, ItemId};

    #[test]
    fn renders_both_collections_with_selection() {
        let snapshot = CartSnapshot {
            inventory: vec![InventoryItem {
                id: ItemId(1),
                content: "apple".to_string(),
            }],
            cart: vec![CartItem::new(ItemId(1), "apple", 3)],
        };
        let mut selection = InventorySelection::default();
        selection.step(ItemId(1), EditStep::Increment);

        let text = render_snapshot(&snapshot, &selection);

        assert!(text.contains("apple                selected 1"), "{text}");
        assert!(text.contains("x 3"), "{text}");
    }

    #[test]
    fn renders_empty_cart_marker() {
        let text = render_snapshot(&CartSnapshot::default(), &InventorySelection::default());
        assert_eq!(text.matches("(empty)").count(), 2);
    }
}
