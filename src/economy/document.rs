//! JSON shape of an economy.
//!
//! Children are written as nested objects (`categories[].goods[]`, `currencies[].packs[]`,
//! `goods[].upgrades[]`); back-references to the owner are written as bare ids (`category`,
//! `currency`, `good_itemId`). Field names follow the store documents the editor exchanges.

use serde::{Deserialize, Serialize};

use crate::economy::category::Category;
use crate::economy::currency::{Currency, CurrencyPack};
use crate::economy::errors::{ModelError, ModelResult};
use crate::economy::goods::{EquippingModel, GoodKind, GoodType, VirtualGood};
use crate::economy::graph::EconomyConfig;
use crate::economy::purchase::{Purchasable, PurchasableItem};
use crate::economy::upgrade::{Upgrade, UpgradeChain};

pub const UPGRADE_TYPE: &str = "goodUpgrade";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EconomyDocument {
    #[serde(default)]
    pub categories: Vec<CategoryDocument>,
    #[serde(default)]
    pub currencies: Vec<CurrencyDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryDocument {
    pub name: String,
    #[serde(default)]
    pub goods: Vec<GoodDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoodDocument {
    #[serde(rename = "itemId")]
    pub item_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub good_type: Option<GoodType>,
    #[serde(rename = "purchasableItem", default, skip_serializing_if = "Option::is_none")]
    pub purchasable_item: Option<PurchasableItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipped: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipping: Option<EquippingModel>,
    #[serde(rename = "good_itemId", default, skip_serializing_if = "Option::is_none")]
    pub good_item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub good_amount: Option<i64>,
    #[serde(rename = "upgradeId", default, skip_serializing_if = "Option::is_none")]
    pub upgrade_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgrades: Option<Vec<UpgradeDocument>>,
    /// Owning category name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpgradeDocument {
    #[serde(rename = "itemId")]
    pub item_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default = "upgrade_type")]
    pub upgrade_type: String,
    #[serde(rename = "purchasableItem", default, skip_serializing_if = "Option::is_none")]
    pub purchasable_item: Option<PurchasableItem>,
    #[serde(rename = "prev_itemId", default)]
    pub prev_item_id: String,
    #[serde(rename = "next_itemId", default)]
    pub next_item_id: String,
    /// Owning upgradable good.
    #[serde(rename = "good_itemId", default, skip_serializing_if = "Option::is_none")]
    pub good_item_id: Option<String>,
}

fn upgrade_type() -> String {
    UPGRADE_TYPE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurrencyDocument {
    #[serde(rename = "itemId")]
    pub item_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub balance: i64,
    #[serde(default)]
    pub packs: Vec<PackDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackDocument {
    #[serde(rename = "itemId")]
    pub item_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "purchasableItem", default, skip_serializing_if = "Option::is_none")]
    pub purchasable_item: Option<PurchasableItem>,
    #[serde(rename = "currency_itemId", default, skip_serializing_if = "Option::is_none")]
    pub currency_item_id: Option<String>,
    #[serde(rename = "currency_amount", default)]
    pub currency_amount: i64,
    /// Owning currency id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// Reject a back-reference that disagrees with the nesting it was found in.
fn check_back_ref(field: &str, item_id: &str, found: Option<&str>, expected: &str) -> ModelResult<()> {
    match found {
        Some(found) if found != expected => Err(ModelError::InvalidDocument(format!(
            "{} {:?} of {} does not match its owner {:?}",
            field, found, item_id, expected
        ))),
        _ => Ok(()),
    }
}

impl GoodDocument {
    pub fn into_good(self, category: &str, config: &EconomyConfig) -> ModelResult<VirtualGood> {
        check_back_ref("category", &self.item_id, self.category.as_deref(), category)?;

        // Upgradable goods are recognised by their chain fields whatever `type` says
        let good_type = if self.upgrade_id.is_some() || self.upgrades.is_some() {
            GoodType::Upgradable
        } else {
            self.good_type.unwrap_or(GoodType::SingleUse)
        };

        let kind = match good_type {
            GoodType::SingleUse => GoodKind::SingleUse {
                balance: self.balance.unwrap_or(0),
            },
            GoodType::Lifetime => GoodKind::Lifetime {
                balance: self.balance.unwrap_or(0),
            },
            GoodType::Equippable => GoodKind::Equippable {
                balance: self.balance.unwrap_or(0),
                equipped: self.equipped.unwrap_or(false),
                equipping: self.equipping.unwrap_or_default(),
            },
            GoodType::SingleUsePack => GoodKind::SingleUsePack {
                good_item_id: self.good_item_id.unwrap_or_default(),
                good_amount: self.good_amount.unwrap_or(1),
            },
            GoodType::Upgradable => {
                let upgrades = self
                    .upgrades
                    .unwrap_or_default()
                    .into_iter()
                    .map(|u| u.into_upgrade(&self.item_id, config))
                    .collect::<ModelResult<Vec<_>>>()?;
                let current = self.upgrade_id.unwrap_or_default();
                GoodKind::Upgradable(UpgradeChain::restore(upgrades, &current)?)
            }
        };

        let purchasable_item = self
            .purchasable_item
            .unwrap_or_else(|| config.default_purchase());
        let name = self
            .name
            .unwrap_or_else(|| config.default_good_name.clone());
        let mut good = VirtualGood::new(&self.item_id, &name, kind, purchasable_item);
        good.description = self.description;
        good.category = category.to_string();
        Ok(good)
    }
}

impl From<&VirtualGood> for GoodDocument {
    fn from(good: &VirtualGood) -> Self {
        let mut doc = GoodDocument {
            item_id: good.item_id.clone(),
            name: Some(good.name.clone()),
            description: good.description.clone(),
            good_type: Some(good.good_type()),
            purchasable_item: Some(good.purchasable_item().as_ref().clone()),
            balance: None,
            equipped: None,
            equipping: None,
            good_item_id: None,
            good_amount: None,
            upgrade_id: None,
            upgrades: None,
            category: Some(good.category.clone()),
        };
        match good.kind() {
            GoodKind::SingleUse { balance } | GoodKind::Lifetime { balance } => {
                doc.balance = Some(*balance);
            }
            GoodKind::Equippable {
                balance,
                equipped,
                equipping,
            } => {
                doc.balance = Some(*balance);
                doc.equipped = Some(*equipped);
                doc.equipping = Some(*equipping);
            }
            GoodKind::SingleUsePack {
                good_item_id,
                good_amount,
            } => {
                doc.good_item_id = Some(good_item_id.clone());
                doc.good_amount = Some(*good_amount);
            }
            GoodKind::Upgradable(chain) => {
                doc.upgrade_id = Some(chain.current_upgrade_id().to_string());
                doc.upgrades = Some(chain.upgrades().iter().map(UpgradeDocument::from).collect());
            }
        }
        doc
    }
}

impl UpgradeDocument {
    pub fn into_upgrade(self, good_id: &str, config: &EconomyConfig) -> ModelResult<Upgrade> {
        check_back_ref("good_itemId", &self.item_id, self.good_item_id.as_deref(), good_id)?;
        let purchasable_item = self
            .purchasable_item
            .unwrap_or_else(|| config.default_purchase());
        let mut upgrade = Upgrade::new(&self.item_id, good_id, purchasable_item)
            .with_links(&self.prev_item_id, &self.next_item_id);
        if let Some(name) = self.name {
            upgrade.name = name;
        }
        upgrade.description = self.description;
        Ok(upgrade)
    }
}

impl From<&Upgrade> for UpgradeDocument {
    fn from(upgrade: &Upgrade) -> Self {
        UpgradeDocument {
            item_id: upgrade.item_id.clone(),
            name: Some(upgrade.name.clone()),
            description: upgrade.description.clone(),
            upgrade_type: upgrade_type(),
            purchasable_item: Some(upgrade.purchasable_item().as_ref().clone()),
            prev_item_id: upgrade.prev_item_id().to_string(),
            next_item_id: upgrade.next_item_id().to_string(),
            good_item_id: Some(upgrade.good_id.clone()),
        }
    }
}

impl PackDocument {
    pub fn into_pack(self, currency_id: &str, config: &EconomyConfig) -> ModelResult<CurrencyPack> {
        check_back_ref("currency", &self.item_id, self.currency.as_deref(), currency_id)?;
        check_back_ref(
            "currency_itemId",
            &self.item_id,
            self.currency_item_id.as_deref(),
            currency_id,
        )?;
        let purchasable_item = self
            .purchasable_item
            .unwrap_or_else(|| PurchasableItem::market(0.0, &self.item_id));
        let name = self
            .name
            .unwrap_or_else(|| config.default_good_name.clone());
        let mut pack = CurrencyPack::new(&self.item_id, &name, currency_id, purchasable_item);
        pack.description = self.description;
        pack.amount = self.currency_amount;
        Ok(pack)
    }
}

impl From<&CurrencyPack> for PackDocument {
    fn from(pack: &CurrencyPack) -> Self {
        PackDocument {
            item_id: pack.item_id.clone(),
            name: Some(pack.name.clone()),
            description: pack.description.clone(),
            purchasable_item: Some(pack.purchasable_item().as_ref().clone()),
            currency_item_id: Some(pack.currency_id.clone()),
            currency_amount: pack.amount,
            currency: Some(pack.currency_id.clone()),
        }
    }
}

impl From<&Currency> for CurrencyDocument {
    fn from(currency: &Currency) -> Self {
        CurrencyDocument {
            item_id: currency.item_id.clone(),
            name: Some(currency.name.clone()),
            description: currency.description.clone(),
            balance: currency.balance(),
            packs: currency.packs().iter().map(PackDocument::from).collect(),
        }
    }
}

impl From<&Category> for CategoryDocument {
    fn from(category: &Category) -> Self {
        CategoryDocument {
            name: category.name.clone(),
            goods: category.goods().iter().map(GoodDocument::from).collect(),
        }
    }
}
