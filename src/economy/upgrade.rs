//! Upgrade chains.
//!
//! An upgradable good owns an ordered list of [`Upgrade`]s. Each upgrade also carries
//! `prev_item_id` / `next_item_id` pointers, with `""` at both ends. The pointers are always
//! re-derived from the collection order in one pass after any structural change, and the
//! good's current position goes back to the zero-upgrade state (`""`).

use std::sync::Arc;

use log::debug;

use crate::economy::collection::{Collection, Fallback, Keyed};
use crate::economy::errors::{ModelError, ModelResult};
use crate::economy::purchase::{Purchasable, PurchasableItem};
use crate::economy::registry::EntityKind;

/// Sentinel for "no neighbour" and for the zero-upgrade state.
pub const NO_ITEM: &str = "";

#[derive(Debug, Clone, PartialEq)]
pub struct Upgrade {
    pub item_id: String,
    pub name: String,
    pub description: Option<String>,
    /// The upgradable good owning this upgrade.
    pub good_id: String,
    purchasable_item: Arc<PurchasableItem>,
    prev_item_id: String,
    next_item_id: String,
}

impl Upgrade {
    pub fn new(item_id: &str, good_id: &str, purchasable_item: PurchasableItem) -> Self {
        Self {
            item_id: item_id.to_string(),
            name: item_id.to_string(),
            description: None,
            good_id: good_id.to_string(),
            purchasable_item: Arc::new(purchasable_item),
            prev_item_id: NO_ITEM.to_string(),
            next_item_id: NO_ITEM.to_string(),
        }
    }

    pub(crate) fn with_links(mut self, prev: &str, next: &str) -> Self {
        self.prev_item_id = prev.to_string();
        self.next_item_id = next.to_string();
        self
    }

    pub fn prev_item_id(&self) -> &str {
        &self.prev_item_id
    }

    pub fn next_item_id(&self) -> &str {
        &self.next_item_id
    }

    pub fn is_head(&self) -> bool {
        self.prev_item_id.is_empty()
    }

    pub fn is_tail(&self) -> bool {
        self.next_item_id.is_empty()
    }
}

impl Keyed for Upgrade {
    fn key(&self) -> &str {
        &self.item_id
    }
}

impl Purchasable for Upgrade {
    fn item_id(&self) -> &str {
        &self.item_id
    }

    fn purchasable_item(&self) -> &Arc<PurchasableItem> {
        &self.purchasable_item
    }

    fn replace_purchasable_item(&mut self, item: PurchasableItem) -> Arc<PurchasableItem> {
        std::mem::replace(&mut self.purchasable_item, Arc::new(item))
    }
}

#[derive(Debug, Clone)]
pub struct UpgradeChain {
    upgrades: Collection<Upgrade>,
    current_upgrade_id: String,
}

impl Default for UpgradeChain {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for UpgradeChain {
    fn eq(&self, other: &Self) -> bool {
        self.current_upgrade_id == other.current_upgrade_id
            && self.upgrades.as_slice() == other.upgrades.as_slice()
    }
}

impl UpgradeChain {
    pub fn new() -> Self {
        Self {
            upgrades: Collection::new(EntityKind::Upgrade),
            current_upgrade_id: NO_ITEM.to_string(),
        }
    }

    pub fn upgrades(&self) -> &Collection<Upgrade> {
        &self.upgrades
    }

    pub fn len(&self) -> usize {
        self.upgrades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.upgrades.is_empty()
    }

    pub fn upgrade_ids(&self) -> Vec<String> {
        self.upgrades.ids()
    }

    pub fn get(&self, id: &str) -> Option<&Upgrade> {
        self.upgrades.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Upgrade> {
        self.upgrades.get_mut(id)
    }

    pub fn current_upgrade_id(&self) -> &str {
        &self.current_upgrade_id
    }

    /// `None` in the zero-upgrade state.
    pub fn current_upgrade(&self) -> Option<&Upgrade> {
        if self.current_upgrade_id.is_empty() {
            return None;
        }
        self.upgrades.get(&self.current_upgrade_id)
    }

    /// Head from the zero-upgrade state, otherwise the successor of the current upgrade.
    /// At the tail this keeps returning the tail.
    pub fn next_upgrade(&self) -> Option<&Upgrade> {
        match self.current_upgrade() {
            None => self.upgrades.first(),
            Some(current) if current.is_tail() => Some(current),
            Some(current) => self.upgrades.get(&current.next_item_id),
        }
    }

    /// Number of upgrades applied so far (0 in the zero-upgrade state).
    pub fn level(&self) -> usize {
        self.upgrades
            .index_of(&self.current_upgrade_id)
            .map_or(0, |i| i + 1)
    }

    pub fn is_complete(&self) -> bool {
        self.upgrades
            .last()
            .is_some_and(|tail| tail.item_id == self.current_upgrade_id)
    }

    /// Move the current position to `id`, which must be a member of this chain.
    pub fn upgrade(&mut self, id: &str) -> ModelResult<()> {
        if !self.upgrades.contains(id) {
            return Err(ModelError::not_found(EntityKind::Upgrade, id));
        }
        self.current_upgrade_id = id.to_string();
        Ok(())
    }

    /// Back to the zero-upgrade state.
    pub fn reset(&mut self) {
        self.current_upgrade_id = NO_ITEM.to_string();
    }

    pub(crate) fn add_upgrade(&mut self, upgrade: Upgrade) -> ModelResult<&Upgrade> {
        let mut upgrade = upgrade;
        upgrade.next_item_id = NO_ITEM.to_string();
        upgrade.prev_item_id = match self.upgrades.last() {
            Some(tail) => tail.item_id.clone(),
            None => NO_ITEM.to_string(),
        };
        let new_id = upgrade.item_id.clone();
        if let Some(tail) = self.upgrades.last().map(|t| t.item_id.clone()) {
            if let Some(tail) = self.upgrades.get_mut(&tail) {
                tail.next_item_id = new_id.clone();
            }
        }
        self.upgrades.push(upgrade)?;
        self.structure_changed();
        self.upgrades
            .get(&new_id)
            .ok_or_else(|| ModelError::not_found(EntityKind::Upgrade, new_id))
    }

    /// Remove `id`, or with a fallback the head or tail when `id` is not a member.
    pub(crate) fn remove_upgrade(
        &mut self,
        id: Option<&str>,
        fallback: Option<Fallback>,
    ) -> Option<Upgrade> {
        let removed = self.upgrades.remove_by_id(id, fallback)?;
        self.structure_changed();
        Some(removed)
    }

    pub(crate) fn move_upgrade(&mut self, id: &str, to_index: usize) -> ModelResult<bool> {
        let moved = self.upgrades.move_to(id, to_index)?;
        if moved {
            self.structure_changed();
        }
        Ok(moved)
    }

    /// Load path: take upgrades as stored, re-derive their links and keep `current` only if it
    /// names a member.
    pub(crate) fn restore(upgrades: Vec<Upgrade>, current: &str) -> ModelResult<Self> {
        let mut chain = Self::new();
        for upgrade in upgrades {
            chain.upgrades.push(upgrade)?;
        }
        chain.relink();
        if !current.is_empty() {
            chain.upgrade(current)?;
        }
        Ok(chain)
    }

    fn structure_changed(&mut self) {
        self.relink();
        self.reset();
    }

    /// Recompute every prev/next pointer from the current order.
    pub(crate) fn relink(&mut self) {
        let ids = self.upgrades.ids();
        let last = ids.len().saturating_sub(1);
        for (i, upgrade) in self.upgrades.iter_mut().enumerate() {
            upgrade.prev_item_id = if i == 0 {
                NO_ITEM.to_string()
            } else {
                ids[i - 1].clone()
            };
            upgrade.next_item_id = if i == last {
                NO_ITEM.to_string()
            } else {
                ids[i + 1].clone()
            };
        }
        debug!("relinked upgrade chain of {} node(s)", ids.len());
    }

    /// Verify the pointer invariant against the collection order.
    pub fn check_links(&self) -> ModelResult<()> {
        let ids = self.upgrades.ids();
        for (i, upgrade) in self.upgrades.iter().enumerate() {
            let expected_prev = if i == 0 { NO_ITEM } else { ids[i - 1].as_str() };
            let expected_next = ids.get(i + 1).map_or(NO_ITEM, String::as_str);
            if upgrade.prev_item_id != expected_prev || upgrade.next_item_id != expected_next {
                return Err(ModelError::InvalidDocument(format!(
                    "upgrade {} is linked {:?} <- -> {:?}, expected {:?} <- -> {:?}",
                    upgrade.item_id,
                    upgrade.prev_item_id,
                    upgrade.next_item_id,
                    expected_prev,
                    expected_next
                )));
            }
        }
        if !self.current_upgrade_id.is_empty() && !self.upgrades.contains(&self.current_upgrade_id)
        {
            return Err(ModelError::not_found(
                EntityKind::Upgrade,
                self.current_upgrade_id.clone(),
            ));
        }
        Ok(())
    }
}
