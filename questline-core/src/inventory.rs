//! Quest-scoped inventory interface.
//!
//! Item stacks can be tagged with the quest that owns them. A query scoped
//! to quest A only counts stacks tagged A, so an identically named item
//! picked up for quest B never satisfies A. Queries with `quest = None`
//! count untagged stacks only.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{name_key, QuestId};

/// Inventory failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// Not enough matching items to remove.
    #[error("Not enough '{item}': requested {requested}, available {available}")]
    Insufficient {
        /// Item name.
        item: String,
        /// Amount asked for.
        requested: u32,
        /// Amount held in the matching scope.
        available: u32,
    },
}

/// What the quest engine needs from the player's inventory.
pub trait QuestInventory {
    /// Number of `item` held in the scope of `quest`.
    fn count(&self, item: &str, quest: Option<QuestId>) -> u32;

    /// Add `quantity` of `item` tagged for `quest`.
    fn add(&mut self, item: &str, quantity: u32, quest: Option<QuestId>);

    /// Remove exactly `quantity` of `item` tagged for `quest`.
    ///
    /// # Errors
    /// Returns [`InventoryError::Insufficient`] and leaves the inventory
    /// untouched when fewer than `quantity` are held.
    fn remove(&mut self, item: &str, quantity: u32, quest: Option<QuestId>)
    -> Result<(), InventoryError>;

    /// Whether at least `quantity` of `item` are held in the scope of `quest`.
    fn has_quantity(&self, item: &str, quantity: u32, quest: Option<QuestId>) -> bool {
        self.count(item, quest) >= quantity
    }
}

/// A stack of identical items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// Item name as first added.
    pub item: String,
    /// Stack size.
    pub quantity: u32,
    /// Owning quest, if any.
    pub quest: Option<QuestId>,
}

/// In-memory inventory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    stacks: Vec<ItemStack>,
}

impl Inventory {
    /// Create an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All stacks.
    #[must_use]
    pub fn stacks(&self) -> &[ItemStack] {
        &self.stacks
    }

    fn position(&self, item: &str, quest: Option<QuestId>) -> Option<usize> {
        let key = name_key(item);
        self.stacks
            .iter()
            .position(|s| s.quest == quest && name_key(&s.item) == key)
    }
}

impl QuestInventory for Inventory {
    fn count(&self, item: &str, quest: Option<QuestId>) -> u32 {
        self.position(item, quest)
            .map_or(0, |i| self.stacks[i].quantity)
    }

    fn add(&mut self, item: &str, quantity: u32, quest: Option<QuestId>) {
        if quantity == 0 {
            return;
        }
        match self.position(item, quest) {
            Some(i) => {
                let stack = &mut self.stacks[i];
                stack.quantity = stack.quantity.saturating_add(quantity);
            }
            None => self.stacks.push(ItemStack {
                item: item.trim().to_string(),
                quantity,
                quest,
            }),
        }
    }

    fn remove(
        &mut self,
        item: &str,
        quantity: u32,
        quest: Option<QuestId>,
    ) -> Result<(), InventoryError> {
        let available = self.count(item, quest);
        let insufficient = || InventoryError::Insufficient {
            item: item.to_string(),
            requested: quantity,
            available,
        };
        if available < quantity {
            return Err(insufficient());
        }
        let Some(i) = self.position(item, quest) else {
            return if quantity == 0 { Ok(()) } else { Err(insufficient()) };
        };
        self.stacks[i].quantity -= quantity;
        if self.stacks[i].quantity == 0 {
            self.stacks.remove(i);
        }
        Ok(())
    }
}
