//! Virtual goods.
//!
//! One record type covers every kind of good. The [`GoodKind`] tag carries the fields that
//! only some kinds have, and the capability helpers at the bottom of this module (ownership,
//! equipping, balances) dispatch on it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::economy::collection::Keyed;
use crate::economy::errors::{ModelError, ModelResult};
use crate::economy::purchase::{Purchasable, PurchasableItem};
use crate::economy::upgrade::UpgradeChain;

/// Scope within which equipping one good unequips others.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EquippingModel {
    Local,
    #[default]
    Category,
    Global,
}

/// Kind tag as written in documents (`type`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum GoodType {
    #[serde(rename = "singleUse")]
    SingleUse,
    #[serde(rename = "goodPacks")]
    SingleUsePack,
    #[serde(rename = "equippable")]
    Equippable,
    #[serde(rename = "lifetime")]
    Lifetime,
    #[serde(rename = "upgradable")]
    Upgradable,
}

impl GoodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoodType::SingleUse => "singleUse",
            GoodType::SingleUsePack => "goodPacks",
            GoodType::Equippable => "equippable",
            GoodType::Lifetime => "lifetime",
            GoodType::Upgradable => "upgradable",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GoodKind {
    SingleUse {
        balance: i64,
    },
    /// Bundles `good_amount` units of another good.
    SingleUsePack {
        good_item_id: String,
        good_amount: i64,
    },
    Equippable {
        balance: i64,
        equipped: bool,
        equipping: EquippingModel,
    },
    Lifetime {
        balance: i64,
    },
    Upgradable(UpgradeChain),
}

impl GoodKind {
    /// A fresh kind of the given type with zero balances and an empty chain.
    pub fn default_for(good_type: GoodType) -> Self {
        match good_type {
            GoodType::SingleUse => GoodKind::SingleUse { balance: 0 },
            GoodType::SingleUsePack => GoodKind::SingleUsePack {
                good_item_id: String::new(),
                good_amount: 1,
            },
            GoodType::Equippable => GoodKind::Equippable {
                balance: 0,
                equipped: false,
                equipping: EquippingModel::default(),
            },
            GoodType::Lifetime => GoodKind::Lifetime { balance: 0 },
            GoodType::Upgradable => GoodKind::Upgradable(UpgradeChain::new()),
        }
    }

    pub fn good_type(&self) -> GoodType {
        match self {
            GoodKind::SingleUse { .. } => GoodType::SingleUse,
            GoodKind::SingleUsePack { .. } => GoodType::SingleUsePack,
            GoodKind::Equippable { .. } => GoodType::Equippable,
            GoodKind::Lifetime { .. } => GoodType::Lifetime,
            GoodKind::Upgradable(_) => GoodType::Upgradable,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VirtualGood {
    pub item_id: String,
    pub name: String,
    pub description: Option<String>,
    /// Owning category (its name), set when the good is added to one.
    pub category: String,
    purchasable_item: Arc<PurchasableItem>,
    kind: GoodKind,
}

impl VirtualGood {
    pub fn new(item_id: &str, name: &str, kind: GoodKind, purchasable_item: PurchasableItem) -> Self {
        Self {
            item_id: item_id.to_string(),
            name: name.to_string(),
            description: None,
            category: String::new(),
            purchasable_item: Arc::new(purchasable_item),
            kind,
        }
    }

    pub fn kind(&self) -> &GoodKind {
        &self.kind
    }

    pub fn good_type(&self) -> GoodType {
        self.kind.good_type()
    }

    pub fn is(&self, good_type: GoodType) -> bool {
        self.good_type() == good_type
    }

    pub fn upgrade_chain(&self) -> Option<&UpgradeChain> {
        match &self.kind {
            GoodKind::Upgradable(chain) => Some(chain),
            _ => None,
        }
    }

    pub(crate) fn upgrade_chain_mut(&mut self) -> Option<&mut UpgradeChain> {
        match &mut self.kind {
            GoodKind::Upgradable(chain) => Some(chain),
            _ => None,
        }
    }

    pub fn balance(&self) -> Option<i64> {
        balance_of(&self.kind)
    }

    pub fn is_owned(&self) -> bool {
        is_owned(&self.kind)
    }

    pub fn is_equipped(&self) -> bool {
        matches!(self.kind, GoodKind::Equippable { equipped: true, .. })
    }

    pub fn set_balance(&mut self, balance: i64) -> ModelResult<i64> {
        set_balance(&mut self.kind, &self.item_id, balance)
    }

    pub fn set_equipping(&mut self, equipped: bool) -> ModelResult<()> {
        set_equipping(&mut self.kind, &self.item_id, equipped)
    }

    /// Contents of a pack of goods: `(good_item_id, good_amount)`.
    pub fn pack_contents(&self) -> Option<(&str, i64)> {
        match &self.kind {
            GoodKind::SingleUsePack {
                good_item_id,
                good_amount,
            } => Some((good_item_id, *good_amount)),
            _ => None,
        }
    }

    pub fn set_pack_contents(&mut self, good_item_id: &str, good_amount: i64) -> ModelResult<()> {
        match &mut self.kind {
            GoodKind::SingleUsePack {
                good_item_id: id,
                good_amount: amount,
            } => {
                *id = good_item_id.to_string();
                *amount = good_amount;
                Ok(())
            }
            _ => Err(ModelError::PreconditionViolation(format!(
                "[Item ID - {}]: only packs of goods bundle other goods",
                self.item_id
            ))),
        }
    }
}

impl Keyed for VirtualGood {
    fn key(&self) -> &str {
        &self.item_id
    }
}

impl Purchasable for VirtualGood {
    fn item_id(&self) -> &str {
        &self.item_id
    }

    fn purchasable_item(&self) -> &Arc<PurchasableItem> {
        &self.purchasable_item
    }

    fn replace_purchasable_item(&mut self, item: PurchasableItem) -> Arc<PurchasableItem> {
        std::mem::replace(&mut self.purchasable_item, Arc::new(item))
    }

    /// Upgradable goods cost whatever the next pending upgrade costs.
    fn price(&self) -> f64 {
        match self.upgrade_chain().and_then(UpgradeChain::next_upgrade) {
            Some(next) => next.price(),
            None => self.purchasable_item.price(),
        }
    }
}

// ============================================================================
// Capabilities
// ============================================================================

/// Goods that track a balance and can be owned.
pub fn is_ownable(kind: &GoodKind) -> bool {
    matches!(
        kind,
        GoodKind::Equippable { .. } | GoodKind::Lifetime { .. }
    )
}

pub fn is_equippable(kind: &GoodKind) -> bool {
    matches!(kind, GoodKind::Equippable { .. })
}

pub fn is_upgradable(kind: &GoodKind) -> bool {
    matches!(kind, GoodKind::Upgradable(_))
}

pub fn balance_of(kind: &GoodKind) -> Option<i64> {
    match kind {
        GoodKind::SingleUse { balance }
        | GoodKind::Equippable { balance, .. }
        | GoodKind::Lifetime { balance } => Some(*balance),
        GoodKind::SingleUsePack { .. } | GoodKind::Upgradable(_) => None,
    }
}

pub fn is_owned(kind: &GoodKind) -> bool {
    is_ownable(kind) && balance_of(kind).is_some_and(|b| b > 0)
}

/// Replace the balance, returning the previous one.
pub fn set_balance(kind: &mut GoodKind, item_id: &str, value: i64) -> ModelResult<i64> {
    match kind {
        GoodKind::SingleUse { balance }
        | GoodKind::Equippable { balance, .. }
        | GoodKind::Lifetime { balance } => Ok(std::mem::replace(balance, value)),
        _ => Err(ModelError::PreconditionViolation(format!(
            "[Item ID - {}]: {} goods have no balance",
            item_id,
            kind.good_type().as_str()
        ))),
    }
}

/// Equip or unequip. Only owned equippable goods may change state.
pub fn set_equipping(kind: &mut GoodKind, item_id: &str, value: bool) -> ModelResult<()> {
    if !is_owned(kind) {
        return Err(ModelError::PreconditionViolation(format!(
            "[Item ID - {}]: Cannot equip a good that isn't owned",
            item_id
        )));
    }
    match kind {
        GoodKind::Equippable { equipped, .. } => {
            *equipped = value;
            Ok(())
        }
        _ => Err(ModelError::PreconditionViolation(format!(
            "[Item ID - {}]: good is not equippable",
            item_id
        ))),
    }
}
