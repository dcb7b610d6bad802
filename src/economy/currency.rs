//! Currencies and the packs that sell them.

use std::sync::Arc;

use crate::economy::collection::{Collection, Keyed};
use crate::economy::purchase::{Purchasable, PurchasableItem};
use crate::economy::registry::EntityKind;

#[derive(Debug, Clone)]
pub struct Currency {
    pub item_id: String,
    pub name: String,
    pub description: Option<String>,
    balance: i64,
    previous_balance: i64,
    pub(crate) packs: Collection<CurrencyPack>,
}

impl Currency {
    pub fn new(item_id: &str, name: &str) -> Self {
        Self {
            item_id: item_id.to_string(),
            name: name.to_string(),
            description: None,
            balance: 0,
            previous_balance: 0,
            packs: Collection::new(EntityKind::CurrencyPack),
        }
    }

    /// Item id for a currency display name: `"Gold Coins!"` -> `"currency_gold_coins"`.
    pub fn generate_name_for(name: &str) -> String {
        format!("currency_{}", snake_case(name))
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    pub fn previous_balance(&self) -> i64 {
        self.previous_balance
    }

    /// Snapshot the current balance as "previous" and store the new one.
    pub fn set_balance(&mut self, balance: i64) -> i64 {
        self.previous_balance = self.balance;
        self.balance = balance;
        self.previous_balance
    }

    /// Set both balances at once, as when loading a stored document.
    pub(crate) fn restore_balance(&mut self, balance: i64) {
        self.previous_balance = balance;
        self.balance = balance;
    }

    pub fn balance_increased(&self) -> bool {
        self.previous_balance < self.balance
    }

    pub fn packs(&self) -> &Collection<CurrencyPack> {
        &self.packs
    }
}

impl Keyed for Currency {
    fn key(&self) -> &str {
        &self.item_id
    }
}

fn snake_case(s: &str) -> String {
    let cleaned: String = s
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_digit() || c.is_ascii_lowercase() || c.is_whitespace())
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join("_")
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyPack {
    pub item_id: String,
    pub name: String,
    pub description: Option<String>,
    /// The currency this pack grants (and is listed under).
    pub currency_id: String,
    pub amount: i64,
    purchasable_item: Arc<PurchasableItem>,
}

impl CurrencyPack {
    pub fn new(item_id: &str, name: &str, currency_id: &str, purchasable_item: PurchasableItem) -> Self {
        Self {
            item_id: item_id.to_string(),
            name: name.to_string(),
            description: None,
            currency_id: currency_id.to_string(),
            amount: 0,
            purchasable_item: Arc::new(purchasable_item),
        }
    }
}

impl Keyed for CurrencyPack {
    fn key(&self) -> &str {
        &self.item_id
    }
}

impl Purchasable for CurrencyPack {
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
