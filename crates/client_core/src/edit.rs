use shared::domain::{CartItem, ItemId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditStep {
    Increment,
    Decrement,
}

/// Local, unpersisted amount override for the one cart item being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub id: ItemId,
    pub content: String,
    pub original_amount: u32,
    pub draft_amount: u32,
}

impl EditSession {
    pub fn begin(item: &CartItem) -> Self {
        Self {
            id: item.id,
            content: item.content.clone(),
            original_amount: item.amount,
            draft_amount: item.amount,
        }
    }

    /// Moves the draft one step; never goes below zero.
    pub fn apply(&mut self, step: EditStep) -> u32 {
        self.draft_amount = match step {
            EditStep::Increment => self.draft_amount.saturating_add(1),
            EditStep::Decrement => self.draft_amount.saturating_sub(1),
        };
        self.draft_amount
    }

    pub fn is_dirty(&self) -> bool {
        self.draft_amount != self.original_amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_starts_at_current_amount() {
        let session = EditSession::begin(&CartItem::new(ItemId(3), "Pear", 4));
        assert_eq!(session.draft_amount, 4);
        assert!(!session.is_dirty());
    }

    #[test]
    fn decrement_stops_at_zero() {
        let mut session = EditSession::begin(&CartItem::new(ItemId(3), "Pear", 1));
        assert_eq!(session.apply(EditStep::Decrement), 0);
        assert_eq!(session.apply(EditStep::Decrement), 0);
        assert!(session.is_dirty());
    }

    #[test]
    fn increment_then_decrement_returns_to_clean() {
        let mut session = EditSession::begin(&CartItem::new(ItemId(3), "Pear", 2));
        assert_eq!(session.apply(EditStep::Increment), 3);
        assert_eq!(session.apply(EditStep::Decrement), 2);
        assert!(!session.is_dirty());
    }
}
