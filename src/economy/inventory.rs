//! Inventory ledger
//!
//! Stacks are keyed by item id. Adding an existing id grows the stack,
//! removing drains it and drops the entry once it reaches zero.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use super::{InventoryItem, Profile, Rarity};

/// Static description of an item that can be awarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemDef {
    pub item_id: &'static str,
    pub name: &'static str,
    pub rarity: Rarity,
    pub value: i64,
}

/// Add `quantity` of an item, merging into an existing stack.
/// Non-positive quantities are ignored.
pub fn add_item(profile: &mut Profile, item: &ItemDef, quantity: i64) {
    if quantity <= 0 {
        return;
    }

    if let Some(existing) = profile
        .inventory
        .iter_mut()
        .find(|i| i.item_id == item.item_id)
    {
        existing.quantity = existing.quantity.saturating_add(quantity);
        return;
    }

    profile.inventory.push(InventoryItem {
        item_id: item.item_id.to_string(),
        name: item.name.to_string(),
        quantity,
        rarity: item.rarity,
        value: item.value,
    });
}

/// Remove `quantity` of an item.
///
/// Returns false without touching the inventory when the item is missing,
/// the stack is too small, or `quantity` is not positive.
pub fn remove_item(profile: &mut Profile, item_id: &str, quantity: i64) -> bool {
    if quantity <= 0 {
        return false;
    }

    let Some(index) = profile.inventory.iter().position(|i| i.item_id == item_id) else {
        return false;
    };

    let stack = &mut profile.inventory[index];
    if stack.quantity < quantity {
        return false;
    }

    stack.quantity -= quantity;
    if stack.quantity == 0 {
        profile.inventory.remove(index);
    }
    true
}

/// Display order: rarest first, then most valuable
pub fn sorted_for_display(items: &[InventoryItem]) -> Vec<&InventoryItem> {
    let mut sorted: Vec<&InventoryItem> = items.iter().collect();
    sorted.sort_by_key(|i| (Reverse(i.rarity), Reverse(i.value)));
    sorted
}

/// Most valuable stacks by unit value (profile preview)
pub fn top_by_value(items: &[InventoryItem], limit: usize) -> Vec<&InventoryItem> {
    let mut sorted: Vec<&InventoryItem> = items.iter().collect();
    sorted.sort_by_key(|i| Reverse(i.value));
    sorted.truncate(limit);
    sorted
}

/// Sum of `value * quantity` over every stack
pub fn total_value(items: &[InventoryItem]) -> i64 {
    items
        .iter()
        .map(|i| i.value.saturating_mul(i.quantity))
        .fold(0i64, i64::saturating_add)
}

/// Item count per rarity
pub fn rarity_breakdown(items: &[InventoryItem]) -> BTreeMap<Rarity, i64> {
    let mut stats = BTreeMap::new();
    for item in items {
        *stats.entry(item.rarity).or_insert(0) += item.quantity;
    }
    stats
}
