//! How an item is bought.
//!
//! A [`PurchasableItem`] is an immutable value. Owners hold it behind an `Arc` and every
//! edit builds a fresh value that replaces the old one wholesale, so observers holding the
//! previous `Arc` can detect change with `Arc::ptr_eq` or plain equality.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

/// Store product details for real-money purchases.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketItem {
    pub price: f64,
    #[serde(rename = "iosId", default)]
    pub ios_id: String,
    #[serde(rename = "androidId", default)]
    pub android_id: String,
    #[serde(default = "default_consumable", deserialize_with = "bool_or_int")]
    pub consumable: bool,
}

fn default_consumable() -> bool {
    true
}

/// Older documents write `consumable: 1`.
fn bool_or_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }
    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(n) => n != 0,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "purchaseType")]
pub enum PurchasableItem {
    #[serde(rename = "market")]
    Market {
        #[serde(rename = "marketItem")]
        market_item: MarketItem,
    },
    #[serde(rename = "virtualItem")]
    VirtualItem {
        #[serde(rename = "pvi_itemId")]
        currency_id: String,
        #[serde(rename = "pvi_amount")]
        amount: f64,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PurchaseType {
    Market,
    VirtualItem,
}

/// Target of [`PurchasableItem::switched_at`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseTarget {
    /// Buy with real money; `product_id` seeds both platform store ids.
    Market { product_id: String },
    /// Buy with an in-game currency.
    VirtualItem { currency_id: String },
}

/// Platform store id slots on a market item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    /// Parses `"iosId"` / `"androidId"`; anything else maps to iOS.
    pub fn from_key(key: &str) -> Self {
        match key {
            "androidId" => Platform::Android,
            _ => Platform::Ios,
        }
    }
}

impl PurchasableItem {
    pub fn market(price: f64, product_id: &str) -> Self {
        PurchasableItem::Market {
            market_item: MarketItem {
                price,
                ios_id: product_id.to_string(),
                android_id: product_id.to_string(),
                consumable: true,
            },
        }
    }

    pub fn virtual_item(currency_id: &str, amount: f64) -> Self {
        PurchasableItem::VirtualItem {
            currency_id: currency_id.to_string(),
            amount,
        }
    }

    pub fn purchase_type(&self) -> PurchaseType {
        match self {
            PurchasableItem::Market { .. } => PurchaseType::Market,
            PurchasableItem::VirtualItem { .. } => PurchaseType::VirtualItem,
        }
    }

    pub fn is_market_purchase(&self) -> bool {
        matches!(self, PurchasableItem::Market { .. })
    }

    /// Market price, or the currency amount for virtual-item purchases.
    pub fn price(&self) -> f64 {
        match self {
            PurchasableItem::Market { market_item } => market_item.price,
            PurchasableItem::VirtualItem { amount, .. } => *amount,
        }
    }

    pub fn market_item(&self) -> Option<&MarketItem> {
        match self {
            PurchasableItem::Market { market_item } => Some(market_item),
            PurchasableItem::VirtualItem { .. } => None,
        }
    }

    /// Only meaningful for market purchases.
    pub fn ios_id(&self) -> Option<&str> {
        self.market_item().map(|m| m.ios_id.as_str())
    }

    /// Only meaningful for market purchases.
    pub fn android_id(&self) -> Option<&str> {
        self.market_item().map(|m| m.android_id.as_str())
    }

    /// Only meaningful for virtual-item purchases.
    pub fn currency_id(&self) -> Option<&str> {
        match self {
            PurchasableItem::VirtualItem { currency_id, .. } => Some(currency_id),
            PurchasableItem::Market { .. } => None,
        }
    }

    pub fn with_price(&self, price: f64) -> Self {
        let mut next = self.clone();
        match &mut next {
            PurchasableItem::Market { market_item } => market_item.price = price,
            PurchasableItem::VirtualItem { amount, .. } => *amount = price,
        }
        next
    }

    /// Precondition: virtual-item purchase. Market purchases come back unchanged.
    pub fn with_currency_id(&self, currency: &str) -> Self {
        let mut next = self.clone();
        if let PurchasableItem::VirtualItem { currency_id, .. } = &mut next {
            *currency_id = currency.to_string();
        }
        next
    }

    /// Precondition: market purchase. Virtual-item purchases come back unchanged.
    pub fn with_market_id(&self, platform: Platform, id: &str) -> Self {
        let mut next = self.clone();
        if let PurchasableItem::Market { market_item } = &mut next {
            match platform {
                Platform::Ios => market_item.ios_id = id.to_string(),
                Platform::Android => market_item.android_id = id.to_string(),
            }
        }
        next
    }

    /// Fresh value of the target kind seeded with `price`.
    pub fn switched_at(price: f64, target: &PurchaseTarget) -> Self {
        match target {
            PurchaseTarget::Market { product_id } => Self::market(price, product_id),
            PurchaseTarget::VirtualItem { currency_id } => Self::virtual_item(currency_id, price),
        }
    }
}

/// Owners of a purchasable item. Setters never touch the held value; they assign a new
/// `Arc` and hand back the one that was replaced.
pub trait Purchasable {
    fn item_id(&self) -> &str;

    fn purchasable_item(&self) -> &Arc<PurchasableItem>;

    fn replace_purchasable_item(&mut self, item: PurchasableItem) -> Arc<PurchasableItem>;

    fn price(&self) -> f64 {
        self.purchasable_item().price()
    }

    fn is_market_purchase(&self) -> bool {
        self.purchasable_item().is_market_purchase()
    }

    fn set_price(&mut self, price: f64) -> Arc<PurchasableItem> {
        let next = self.purchasable_item().with_price(price);
        self.replace_purchasable_item(next)
    }

    fn set_market_item_id(&mut self, platform: Platform, id: &str) -> Arc<PurchasableItem> {
        let next = self.purchasable_item().with_market_id(platform, id);
        self.replace_purchasable_item(next)
    }

    fn set_currency_id(&mut self, currency_id: &str) -> Arc<PurchasableItem> {
        let next = self.purchasable_item().with_currency_id(currency_id);
        self.replace_purchasable_item(next)
    }

    /// Market targets default their store ids to this item's id. The new value starts at
    /// the owner's current [`price`](Purchasable::price).
    fn switch_purchase_type(&mut self, target: PurchaseType, currency_id: Option<&str>) -> Arc<PurchasableItem> {
        let target = match target {
            PurchaseType::Market => PurchaseTarget::Market {
                product_id: self.item_id().to_string(),
            },
            PurchaseType::VirtualItem => PurchaseTarget::VirtualItem {
                currency_id: currency_id
                    .or_else(|| self.purchasable_item().currency_id())
                    .unwrap_or_default()
                    .to_string(),
            },
        };
        let next = PurchasableItem::switched_at(self.price(), &target);
        self.replace_purchasable_item(next)
    }
}
