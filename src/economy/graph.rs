//! The economy root.
//!
//! [`Economy`] owns categories (with their goods and upgrade chains) and currencies (with
//! their packs). Every mutation goes through it so the identity registry, the owning
//! collections and the back-references stay in step. Listeners registered with
//! [`Economy::subscribe`] are called synchronously, after the change is complete.

use std::fmt;
use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::economy::category::Category;
use crate::economy::collection::{Collection, Fallback};
use crate::economy::currency::{Currency, CurrencyPack};
use crate::economy::document::{CategoryDocument, CurrencyDocument, EconomyDocument};
use crate::economy::errors::{ModelError, ModelResult};
use crate::economy::goods::{GoodKind, GoodType, VirtualGood};
use crate::economy::purchase::{Platform, Purchasable, PurchasableItem, PurchaseType};
use crate::economy::registry::{EntityKind, Owner, Registry};
use crate::economy::upgrade::{Upgrade, UpgradeChain};

/// Defaults applied to newly created entities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EconomyConfig {
    /// Currency new goods and upgrades are priced in
    #[serde(default = "default_currency_id")]
    pub default_currency_id: String,
    #[serde(default = "default_price")]
    pub default_price: f64,
    #[serde(default = "default_good_name")]
    pub default_good_name: String,
    #[serde(default = "default_currency_name")]
    pub default_currency_name: String,
    #[serde(default = "default_category_name")]
    pub default_category_name: String,
}

fn default_currency_id() -> String {
    "currency_coins".to_string()
}

fn default_price() -> f64 {
    100.0
}

fn default_good_name() -> String {
    "Untitled".to_string()
}

fn default_currency_name() -> String {
    "coins".to_string()
}

fn default_category_name() -> String {
    "General".to_string()
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            default_currency_id: default_currency_id(),
            default_price: default_price(),
            default_good_name: default_good_name(),
            default_currency_name: default_currency_name(),
            default_category_name: default_category_name(),
        }
    }
}

impl EconomyConfig {
    pub fn default_purchase(&self) -> PurchasableItem {
        PurchasableItem::virtual_item(&self.default_currency_id, self.default_price)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EconomyEvent {
    Added {
        kind: EntityKind,
        id: String,
    },
    Removed {
        kind: EntityKind,
        id: String,
    },
    /// A collection of `kind` members under `owner` changed order.
    Reordered {
        kind: EntityKind,
        owner: Owner,
    },
    PurchasableItemChanged {
        kind: EntityKind,
        id: String,
        previous: Arc<PurchasableItem>,
        current: Arc<PurchasableItem>,
    },
    BalanceChanged {
        kind: EntityKind,
        id: String,
        previous: i64,
        current: i64,
    },
    EquippedChanged {
        id: String,
        equipped: bool,
    },
    CurrentUpgradeChanged {
        good_id: String,
        upgrade_id: String,
    },
}

pub type EconomyListener = Box<dyn FnMut(&EconomyEvent)>;

/// One copy-on-write edit of a purchasable item.
#[derive(Debug, Clone, Copy)]
enum PurchaseEdit<'a> {
    Price(f64),
    Currency(&'a str),
    MarketId(Platform, &'a str),
    Switch(PurchaseType, Option<&'a str>),
}

impl PurchaseEdit<'_> {
    fn apply(self, owner: &mut dyn Purchasable) -> Arc<PurchasableItem> {
        match self {
            PurchaseEdit::Price(price) => owner.set_price(price),
            PurchaseEdit::Currency(currency_id) => owner.set_currency_id(currency_id),
            PurchaseEdit::MarketId(platform, id) => owner.set_market_item_id(platform, id),
            PurchaseEdit::Switch(target, currency_id) => {
                owner.switch_purchase_type(target, currency_id)
            }
        }
    }
}

pub struct Economy {
    config: EconomyConfig,
    registry: Registry,
    categories: Collection<Category>,
    currencies: Collection<Currency>,
    listeners: Vec<EconomyListener>,
}

impl fmt::Debug for Economy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Economy")
            .field("categories", &self.categories.ids())
            .field("currencies", &self.currencies.ids())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Default for Economy {
    fn default() -> Self {
        Self::new()
    }
}

impl Economy {
    pub fn new() -> Self {
        Self::with_config(EconomyConfig::default())
    }

    pub fn with_config(config: EconomyConfig) -> Self {
        Self {
            config,
            registry: Registry::new(),
            categories: Collection::new(EntityKind::Category),
            currencies: Collection::new(EntityKind::Currency),
            listeners: Vec::new(),
        }
    }

    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&EconomyEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn emit(&mut self, event: EconomyEvent) {
        for listener in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    fn ensure_free(&self, kind: EntityKind, id: &str) -> ModelResult<()> {
        if self.registry.contains(kind, id) {
            return Err(ModelError::duplicate(kind, id));
        }
        Ok(())
    }

    fn owner_of(&self, kind: EntityKind, id: &str) -> Option<String> {
        self.registry
            .resolve(kind, id)
            .and_then(Owner::id)
            .map(str::to_string)
    }

    // ------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------

    pub fn categories(&self) -> &Collection<Category> {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        if !self.registry.contains(EntityKind::Category, name) {
            return None;
        }
        self.categories.get(name)
    }

    pub fn add_category(&mut self, name: &str) -> ModelResult<&Category> {
        self.ensure_free(EntityKind::Category, name)?;
        self.registry
            .register(EntityKind::Category, name, Owner::Root)?;
        if let Err(e) = self.categories.push(Category::new(name)) {
            self.registry.unregister(EntityKind::Category, name);
            return Err(e);
        }
        debug!("added category {}", name);
        self.emit(EconomyEvent::Added {
            kind: EntityKind::Category,
            id: name.to_string(),
        });
        self.categories
            .get(name)
            .ok_or_else(|| ModelError::not_found(EntityKind::Category, name))
    }

    /// Remove a category together with its goods and their upgrades.
    pub fn remove_category(&mut self, name: &str) -> Option<Category> {
        let category = self.categories.remove(name)?;
        for good in category.goods.iter() {
            self.unregister_good(good);
        }
        debug!("removed category {} ({} goods)", name, category.goods.len());
        self.unregister_and_emit(EntityKind::Category, name);
        Some(category)
    }

    pub fn move_category(&mut self, name: &str, to_index: usize) -> ModelResult<bool> {
        let moved = self.categories.move_to(name, to_index)?;
        if moved {
            self.emit(EconomyEvent::Reordered {
                kind: EntityKind::Category,
                owner: Owner::Root,
            });
        }
        Ok(moved)
    }

    // ------------------------------------------------------------------
    // Goods
    // ------------------------------------------------------------------

    /// A new good of `good_type` carrying the configured name and price defaults.
    pub fn create_good(&self, item_id: &str, good_type: GoodType) -> VirtualGood {
        VirtualGood::new(
            item_id,
            &self.config.default_good_name,
            GoodKind::default_for(good_type),
            self.config.default_purchase(),
        )
    }

    pub fn add_good(&mut self, category: &str, good: VirtualGood) -> ModelResult<&VirtualGood> {
        if self.category(category).is_none() {
            return Err(ModelError::not_found(EntityKind::Category, category));
        }
        let mut good = good;
        good.category = category.to_string();
        let item_id = good.item_id.clone();

        self.register_good(&good)?;
        let pushed = match self.categories.get_mut(category) {
            Some(c) => c.goods.push(good).map(|_| ()),
            None => Err(ModelError::not_found(EntityKind::Category, category)),
        };
        if let Err(e) = pushed {
            self.registry.unregister(EntityKind::Good, &item_id);
            return Err(e);
        }

        debug!("added good {} to category {}", item_id, category);
        self.emit(EconomyEvent::Added {
            kind: EntityKind::Good,
            id: item_id.clone(),
        });
        self.good(&item_id)
            .ok_or_else(|| ModelError::not_found(EntityKind::Good, item_id))
    }

    /// Register a good and any upgrades it already carries, all or nothing.
    fn register_good(&mut self, good: &VirtualGood) -> ModelResult<()> {
        self.ensure_free(EntityKind::Good, &good.item_id)?;
        self.registry.register(
            EntityKind::Good,
            &good.item_id,
            Owner::Category(good.category.clone()),
        )?;
        if let Some(chain) = good.upgrade_chain() {
            let owner = Owner::Good(good.item_id.clone());
            let mut registered: Vec<&str> = Vec::new();
            for upgrade in chain.upgrades() {
                if let Err(e) = self
                    .registry
                    .register(EntityKind::Upgrade, &upgrade.item_id, owner.clone())
                {
                    for id in registered {
                        self.registry.unregister(EntityKind::Upgrade, id);
                    }
                    self.registry.unregister(EntityKind::Good, &good.item_id);
                    return Err(e);
                }
                registered.push(&upgrade.item_id);
            }
        }
        Ok(())
    }

    /// Unregister a detached good and its upgrades, emitting `Removed` for each, upgrades
    /// first.
    fn unregister_good(&mut self, good: &VirtualGood) {
        if let Some(chain) = good.upgrade_chain() {
            for upgrade in chain.upgrades() {
                self.unregister_and_emit(EntityKind::Upgrade, &upgrade.item_id);
            }
        }
        self.unregister_and_emit(EntityKind::Good, &good.item_id);
    }

    fn unregister_and_emit(&mut self, kind: EntityKind, id: &str) {
        self.registry.unregister(kind, id);
        self.emit(EconomyEvent::Removed {
            kind,
            id: id.to_string(),
        });
    }

    pub fn good(&self, id: &str) -> Option<&VirtualGood> {
        match self.registry.resolve(EntityKind::Good, id)? {
            Owner::Category(category) => self.categories.get(category)?.goods.get(id),
            _ => None,
        }
    }

    fn good_mut(&mut self, id: &str) -> Option<&mut VirtualGood> {
        let category = self.owner_of(EntityKind::Good, id)?;
        self.categories.get_mut(&category)?.goods.get_mut(id)
    }

    /// Every good, category by category.
    pub fn goods(&self) -> impl Iterator<Item = &VirtualGood> {
        self.categories.iter().flat_map(|c| c.goods.iter())
    }

    pub fn remove_good(&mut self, id: &str) -> Option<VirtualGood> {
        let category = self.owner_of(EntityKind::Good, id)?;
        let good = self.categories.get_mut(&category)?.goods.remove(id)?;
        self.unregister_good(&good);
        debug!("removed good {} from category {}", id, category);
        Some(good)
    }

    pub fn move_good(&mut self, category: &str, id: &str, to_index: usize) -> ModelResult<bool> {
        let moved = self
            .categories
            .get_mut(category)
            .ok_or_else(|| ModelError::not_found(EntityKind::Category, category))?
            .goods
            .move_to(id, to_index)?;
        if moved {
            self.emit(EconomyEvent::Reordered {
                kind: EntityKind::Good,
                owner: Owner::Category(category.to_string()),
            });
        }
        Ok(moved)
    }

    pub fn set_good_name(&mut self, id: &str, name: &str) -> ModelResult<()> {
        let good = self
            .good_mut(id)
            .ok_or_else(|| ModelError::not_found(EntityKind::Good, id))?;
        good.name = name.to_string();
        Ok(())
    }

    pub fn set_good_description(&mut self, id: &str, description: Option<&str>) -> ModelResult<()> {
        let good = self
            .good_mut(id)
            .ok_or_else(|| ModelError::not_found(EntityKind::Good, id))?;
        good.description = description.map(str::to_string);
        Ok(())
    }

    pub fn set_pack_contents(&mut self, id: &str, good_item_id: &str, good_amount: i64) -> ModelResult<()> {
        self.good_mut(id)
            .ok_or_else(|| ModelError::not_found(EntityKind::Good, id))?
            .set_pack_contents(good_item_id, good_amount)
    }

    pub fn set_good_balance(&mut self, id: &str, balance: i64) -> ModelResult<i64> {
        let previous = self
            .good_mut(id)
            .ok_or_else(|| ModelError::not_found(EntityKind::Good, id))?
            .set_balance(balance)?;
        self.emit(EconomyEvent::BalanceChanged {
            kind: EntityKind::Good,
            id: id.to_string(),
            previous,
            current: balance,
        });
        Ok(previous)
    }

    /// Equip or unequip an owned equippable good.
    pub fn set_equipping(&mut self, id: &str, equipped: bool) -> ModelResult<()> {
        self.good_mut(id)
            .ok_or_else(|| ModelError::not_found(EntityKind::Good, id))?
            .set_equipping(equipped)?;
        self.emit(EconomyEvent::EquippedChanged {
            id: id.to_string(),
            equipped,
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Purchasable items
    // ------------------------------------------------------------------

    pub fn purchasable(&self, kind: EntityKind, id: &str) -> Option<&dyn Purchasable> {
        match kind {
            EntityKind::Good => self.good(id).map(|g| g as &dyn Purchasable),
            EntityKind::CurrencyPack => self.pack(id).map(|p| p as &dyn Purchasable),
            EntityKind::Upgrade => self.upgrade(id).map(|u| u as &dyn Purchasable),
            _ => None,
        }
    }

    fn purchasable_mut(&mut self, kind: EntityKind, id: &str) -> Option<&mut dyn Purchasable> {
        match kind {
            EntityKind::Good => self.good_mut(id).map(|g| g as &mut dyn Purchasable),
            EntityKind::CurrencyPack => self.pack_mut(id).map(|p| p as &mut dyn Purchasable),
            EntityKind::Upgrade => self.upgrade_mut(id).map(|u| u as &mut dyn Purchasable),
            _ => None,
        }
    }

    pub fn price_of(&self, kind: EntityKind, id: &str) -> Option<f64> {
        self.purchasable(kind, id).map(|p| p.price())
    }

    fn edit_purchasable(
        &mut self,
        kind: EntityKind,
        id: &str,
        edit: PurchaseEdit<'_>,
    ) -> ModelResult<Arc<PurchasableItem>> {
        let (previous, current) = {
            let owner = self
                .purchasable_mut(kind, id)
                .ok_or_else(|| ModelError::not_found(kind, id))?;
            let previous = edit.apply(owner);
            (previous, Arc::clone(owner.purchasable_item()))
        };
        debug!("replaced purchasable item of {} {}", kind, id);
        self.emit(EconomyEvent::PurchasableItemChanged {
            kind,
            id: id.to_string(),
            previous,
            current: Arc::clone(&current),
        });
        Ok(current)
    }

    /// Replace the price (or currency amount). Returns the new value.
    pub fn set_price(&mut self, kind: EntityKind, id: &str, price: f64) -> ModelResult<Arc<PurchasableItem>> {
        self.edit_purchasable(kind, id, PurchaseEdit::Price(price))
    }

    pub fn set_purchase_currency(
        &mut self,
        kind: EntityKind,
        id: &str,
        currency_id: &str,
    ) -> ModelResult<Arc<PurchasableItem>> {
        self.edit_purchasable(kind, id, PurchaseEdit::Currency(currency_id))
    }

    pub fn set_market_item_id(
        &mut self,
        kind: EntityKind,
        id: &str,
        platform: Platform,
        product_id: &str,
    ) -> ModelResult<Arc<PurchasableItem>> {
        self.edit_purchasable(kind, id, PurchaseEdit::MarketId(platform, product_id))
    }

    pub fn switch_purchase_type(
        &mut self,
        kind: EntityKind,
        id: &str,
        target: PurchaseType,
        currency_id: Option<&str>,
    ) -> ModelResult<Arc<PurchasableItem>> {
        self.edit_purchasable(kind, id, PurchaseEdit::Switch(target, currency_id))
    }

    // ------------------------------------------------------------------
    // Currencies and packs
    // ------------------------------------------------------------------

    pub fn currencies(&self) -> &Collection<Currency> {
        &self.currencies
    }

    pub fn currency(&self, id: &str) -> Option<&Currency> {
        if !self.registry.contains(EntityKind::Currency, id) {
            return None;
        }
        self.currencies.get(id)
    }

    pub fn first_currency(&self) -> Option<&Currency> {
        self.currencies.first()
    }

    pub fn add_currency(&mut self, item_id: &str, name: &str) -> ModelResult<&Currency> {
        self.ensure_free(EntityKind::Currency, item_id)?;
        self.registry
            .register(EntityKind::Currency, item_id, Owner::Root)?;
        if let Err(e) = self.currencies.push(Currency::new(item_id, name)) {
            self.registry.unregister(EntityKind::Currency, item_id);
            return Err(e);
        }
        debug!("added currency {}", item_id);
        self.emit(EconomyEvent::Added {
            kind: EntityKind::Currency,
            id: item_id.to_string(),
        });
        self.currencies
            .get(item_id)
            .ok_or_else(|| ModelError::not_found(EntityKind::Currency, item_id))
    }

    pub fn remove_currency(&mut self, id: &str) -> Option<Currency> {
        let currency = self.currencies.remove(id)?;
        for pack in currency.packs.iter() {
            self.unregister_and_emit(EntityKind::CurrencyPack, &pack.item_id);
        }
        self.unregister_and_emit(EntityKind::Currency, id);
        Some(currency)
    }

    pub fn move_currency(&mut self, id: &str, to_index: usize) -> ModelResult<bool> {
        let moved = self.currencies.move_to(id, to_index)?;
        if moved {
            self.emit(EconomyEvent::Reordered {
                kind: EntityKind::Currency,
                owner: Owner::Root,
            });
        }
        Ok(moved)
    }

    pub fn set_currency_balance(&mut self, id: &str, balance: i64) -> ModelResult<i64> {
        let previous = self
            .currencies
            .get_mut(id)
            .ok_or_else(|| ModelError::not_found(EntityKind::Currency, id))?
            .set_balance(balance);
        self.emit(EconomyEvent::BalanceChanged {
            kind: EntityKind::Currency,
            id: id.to_string(),
            previous,
            current: balance,
        });
        Ok(previous)
    }

    /// A market-priced pack granting `amount` of `currency_id`.
    pub fn create_pack(&self, item_id: &str, currency_id: &str, amount: i64, price: f64) -> CurrencyPack {
        let mut pack = CurrencyPack::new(
            item_id,
            &self.config.default_good_name,
            currency_id,
            PurchasableItem::market(price, item_id),
        );
        pack.amount = amount;
        pack
    }

    pub fn add_pack(&mut self, pack: CurrencyPack) -> ModelResult<&CurrencyPack> {
        let currency_id = pack.currency_id.clone();
        let item_id = pack.item_id.clone();
        if self.currency(&currency_id).is_none() {
            return Err(ModelError::not_found(EntityKind::Currency, currency_id));
        }
        self.ensure_free(EntityKind::CurrencyPack, &item_id)?;
        self.registry.register(
            EntityKind::CurrencyPack,
            &item_id,
            Owner::Currency(currency_id.clone()),
        )?;
        let pushed = match self.currencies.get_mut(&currency_id) {
            Some(c) => c.packs.push(pack).map(|_| ()),
            None => Err(ModelError::not_found(EntityKind::Currency, currency_id.clone())),
        };
        if let Err(e) = pushed {
            self.registry.unregister(EntityKind::CurrencyPack, &item_id);
            return Err(e);
        }
        debug!("added pack {} to currency {}", item_id, currency_id);
        self.emit(EconomyEvent::Added {
            kind: EntityKind::CurrencyPack,
            id: item_id.clone(),
        });
        self.pack(&item_id)
            .ok_or_else(|| ModelError::not_found(EntityKind::CurrencyPack, item_id))
    }

    pub fn pack(&self, id: &str) -> Option<&CurrencyPack> {
        match self.registry.resolve(EntityKind::CurrencyPack, id)? {
            Owner::Currency(currency) => self.currencies.get(currency)?.packs.get(id),
            _ => None,
        }
    }

    fn pack_mut(&mut self, id: &str) -> Option<&mut CurrencyPack> {
        let currency = self.owner_of(EntityKind::CurrencyPack, id)?;
        self.currencies.get_mut(&currency)?.packs.get_mut(id)
    }

    pub fn remove_pack(&mut self, id: &str) -> Option<CurrencyPack> {
        let currency = self.owner_of(EntityKind::CurrencyPack, id)?;
        let pack = self.currencies.get_mut(&currency)?.packs.remove(id)?;
        self.registry.unregister(EntityKind::CurrencyPack, id);
        self.emit(EconomyEvent::Removed {
            kind: EntityKind::CurrencyPack,
            id: id.to_string(),
        });
        Some(pack)
    }

    pub fn move_pack(&mut self, currency_id: &str, id: &str, to_index: usize) -> ModelResult<bool> {
        let moved = self
            .currencies
            .get_mut(currency_id)
            .ok_or_else(|| ModelError::not_found(EntityKind::Currency, currency_id))?
            .packs
            .move_to(id, to_index)?;
        if moved {
            self.emit(EconomyEvent::Reordered {
                kind: EntityKind::CurrencyPack,
                owner: Owner::Currency(currency_id.to_string()),
            });
        }
        Ok(moved)
    }

    pub fn set_pack_amount(&mut self, id: &str, amount: i64) -> ModelResult<()> {
        self.pack_mut(id)
            .ok_or_else(|| ModelError::not_found(EntityKind::CurrencyPack, id))?
            .amount = amount;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Upgrades
    // ------------------------------------------------------------------

    fn chain_mut(&mut self, good_id: &str) -> ModelResult<&mut UpgradeChain> {
        let good = self
            .good_mut(good_id)
            .ok_or_else(|| ModelError::not_found(EntityKind::Good, good_id))?;
        let item_id = good.item_id.clone();
        good.upgrade_chain_mut().ok_or_else(|| {
            ModelError::PreconditionViolation(format!(
                "[Item ID - {}]: good is not upgradable",
                item_id
            ))
        })
    }

    pub fn upgrade_chain(&self, good_id: &str) -> Option<&UpgradeChain> {
        self.good(good_id)?.upgrade_chain()
    }

    pub fn upgrade(&self, id: &str) -> Option<&Upgrade> {
        match self.registry.resolve(EntityKind::Upgrade, id)? {
            Owner::Good(good_id) => self.upgrade_chain(good_id)?.get(id),
            _ => None,
        }
    }

    fn upgrade_mut(&mut self, id: &str) -> Option<&mut Upgrade> {
        let good_id = self.owner_of(EntityKind::Upgrade, id)?;
        self.chain_mut(&good_id).ok()?.get_mut(id)
    }

    /// Append a new upgrade priced in `currency_id` to the good's chain.
    pub fn add_upgrade(&mut self, good_id: &str, currency_id: &str) -> ModelResult<&Upgrade> {
        let previous_position = self.chain_mut(good_id)?.current_upgrade_id().to_string();
        let upgrade_id = self.registry.fresh_id(EntityKind::Upgrade, "item_");
        let upgrade = Upgrade::new(
            &upgrade_id,
            good_id,
            PurchasableItem::virtual_item(currency_id, self.config.default_price),
        );
        self.registry.register(
            EntityKind::Upgrade,
            &upgrade_id,
            Owner::Good(good_id.to_string()),
        )?;
        if let Err(e) = self.chain_mut(good_id).and_then(|c| c.add_upgrade(upgrade).map(|_| ())) {
            self.registry.unregister(EntityKind::Upgrade, &upgrade_id);
            return Err(e);
        }
        debug!("added upgrade {} to good {}", upgrade_id, good_id);
        self.emit(EconomyEvent::Added {
            kind: EntityKind::Upgrade,
            id: upgrade_id.clone(),
        });
        self.position_reset(good_id, &previous_position);
        self.upgrade(&upgrade_id)
            .ok_or_else(|| ModelError::not_found(EntityKind::Upgrade, upgrade_id))
    }

    pub fn remove_upgrade(&mut self, id: &str) -> Option<Upgrade> {
        let good_id = self.owner_of(EntityKind::Upgrade, id)?;
        self.detach_upgrade(&good_id, Some(id), None)
    }

    /// Remove the last upgrade of `good_id`'s chain.
    pub fn remove_last_upgrade(&mut self, good_id: &str) -> Option<Upgrade> {
        self.detach_upgrade(good_id, None, Some(Fallback::Last))
    }

    fn detach_upgrade(
        &mut self,
        good_id: &str,
        id: Option<&str>,
        fallback: Option<Fallback>,
    ) -> Option<Upgrade> {
        let chain = self.chain_mut(good_id).ok()?;
        let previous_position = chain.current_upgrade_id().to_string();
        let removed = chain.remove_upgrade(id, fallback)?;
        debug!("removed upgrade {} from good {}", removed.item_id, good_id);
        self.unregister_and_emit(EntityKind::Upgrade, &removed.item_id);
        self.position_reset(good_id, &previous_position);
        Some(removed)
    }

    pub fn move_upgrade(&mut self, id: &str, to_index: usize) -> ModelResult<bool> {
        let good_id = self
            .owner_of(EntityKind::Upgrade, id)
            .ok_or_else(|| ModelError::not_found(EntityKind::Upgrade, id))?;
        let chain = self.chain_mut(&good_id)?;
        let previous_position = chain.current_upgrade_id().to_string();
        let moved = chain.move_upgrade(id, to_index)?;
        if moved {
            self.emit(EconomyEvent::Reordered {
                kind: EntityKind::Upgrade,
                owner: Owner::Good(good_id.clone()),
            });
            self.position_reset(&good_id, &previous_position);
        }
        Ok(moved)
    }

    /// Set the good's current position to `upgrade_id`, a member of its chain.
    pub fn upgrade_good(&mut self, good_id: &str, upgrade_id: &str) -> ModelResult<()> {
        self.chain_mut(good_id)?.upgrade(upgrade_id)?;
        self.emit(EconomyEvent::CurrentUpgradeChanged {
            good_id: good_id.to_string(),
            upgrade_id: upgrade_id.to_string(),
        });
        Ok(())
    }

    pub fn reset_upgrades(&mut self, good_id: &str) -> ModelResult<()> {
        let chain = self.chain_mut(good_id)?;
        let previous_position = chain.current_upgrade_id().to_string();
        chain.reset();
        self.position_reset(good_id, &previous_position);
        Ok(())
    }

    fn position_reset(&mut self, good_id: &str, previous_position: &str) {
        if !previous_position.is_empty() {
            self.emit(EconomyEvent::CurrentUpgradeChanged {
                good_id: good_id.to_string(),
                upgrade_id: String::new(),
            });
        }
    }

    // ------------------------------------------------------------------
    // Validation and documents
    // ------------------------------------------------------------------

    /// Check that the registry, the owning collections, the back-references and every
    /// upgrade chain agree with each other.
    pub fn check_invariants(&self) -> ModelResult<()> {
        let expect = |kind: EntityKind, id: &str, owner: Owner| -> ModelResult<()> {
            match self.registry.resolve(kind, id) {
                Some(found) if *found == owner => Ok(()),
                Some(found) => Err(ModelError::InvalidDocument(format!(
                    "{} {} registered under {:?}, found under {:?}",
                    kind, id, found, owner
                ))),
                None => Err(ModelError::not_found(kind, id)),
            }
        };

        let (mut goods, mut upgrades, mut packs) = (0, 0, 0);
        for category in self.categories.iter() {
            expect(EntityKind::Category, &category.name, Owner::Root)?;
            for good in category.goods.iter() {
                goods += 1;
                expect(EntityKind::Good, &good.item_id, Owner::Category(category.name.clone()))?;
                if good.category != category.name {
                    return Err(ModelError::InvalidDocument(format!(
                        "good {} points at category {:?} but lives in {:?}",
                        good.item_id, good.category, category.name
                    )));
                }
                if let Some(chain) = good.upgrade_chain() {
                    chain.check_links()?;
                    for upgrade in chain.upgrades() {
                        upgrades += 1;
                        expect(
                            EntityKind::Upgrade,
                            &upgrade.item_id,
                            Owner::Good(good.item_id.clone()),
                        )?;
                    }
                }
            }
        }
        for currency in self.currencies.iter() {
            expect(EntityKind::Currency, &currency.item_id, Owner::Root)?;
            for pack in currency.packs.iter() {
                packs += 1;
                expect(
                    EntityKind::CurrencyPack,
                    &pack.item_id,
                    Owner::Currency(currency.item_id.clone()),
                )?;
            }
        }

        let counts = [
            (EntityKind::Category, self.categories.len()),
            (EntityKind::Currency, self.currencies.len()),
            (EntityKind::Good, goods),
            (EntityKind::Upgrade, upgrades),
            (EntityKind::CurrencyPack, packs),
        ];
        for (kind, live) in counts {
            if self.registry.len(kind) != live {
                return Err(ModelError::InvalidDocument(format!(
                    "registry holds {} {} id(s) but the graph has {}",
                    self.registry.len(kind),
                    kind,
                    live
                )));
            }
        }
        Ok(())
    }

    pub fn from_document(document: EconomyDocument, config: EconomyConfig) -> ModelResult<Self> {
        let mut economy = Economy::with_config(config);
        for category_doc in document.categories {
            economy.add_category(&category_doc.name)?;
            for good_doc in category_doc.goods {
                let good = good_doc.into_good(&category_doc.name, &economy.config)?;
                economy.add_good(&category_doc.name, good)?;
            }
        }
        for currency_doc in document.currencies {
            let name = currency_doc
                .name
                .clone()
                .unwrap_or_else(|| economy.config.default_currency_name.clone());
            economy.add_currency(&currency_doc.item_id, &name)?;
            if let Some(currency) = economy.currencies.get_mut(&currency_doc.item_id) {
                currency.description = currency_doc.description.clone();
                currency.restore_balance(currency_doc.balance);
            }
            for pack_doc in currency_doc.packs {
                let pack = pack_doc.into_pack(&currency_doc.item_id, &economy.config)?;
                economy.add_pack(pack)?;
            }
        }
        info!(
            "loaded economy: {} categories, {} goods, {} currencies",
            economy.categories.len(),
            economy.registry.len(EntityKind::Good),
            economy.currencies.len()
        );
        Ok(economy)
    }

    pub fn to_document(&self) -> EconomyDocument {
        EconomyDocument {
            categories: self.categories.iter().map(CategoryDocument::from).collect(),
            currencies: self.currencies.iter().map(CurrencyDocument::from).collect(),
        }
    }

    pub fn from_json(json: &str, config: EconomyConfig) -> ModelResult<Self> {
        let document: EconomyDocument = serde_json::from_str(json)?;
        Self::from_document(document, config)
    }

    pub fn to_json(&self) -> ModelResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_document())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shop() -> Economy {
        let mut economy = Economy::new();
        economy.add_category("General").unwrap();
        economy.add_currency("currency_coins", "coins").unwrap();
        let good = economy.create_good("hat", GoodType::Upgradable);
        economy.add_good("General", good).unwrap();
        economy.add_upgrade("hat", "currency_coins").unwrap();
        economy
    }

    #[test]
    fn check_invariants_catches_registry_drift() {
        let mut economy = shop();
        economy.check_invariants().unwrap();

        let upgrade_id = economy.upgrade_chain("hat").unwrap().upgrade_ids()[0].clone();
        economy.registry.unregister(EntityKind::Upgrade, &upgrade_id);
        assert!(economy.check_invariants().is_err());
    }

    #[test]
    fn check_invariants_catches_stale_back_reference() {
        let mut economy = shop();
        economy.good_mut("hat").unwrap().category = "Elsewhere".into();
        assert!(matches!(
            economy.check_invariants(),
            Err(ModelError::InvalidDocument(_))
        ));
    }

    #[test]
    fn failed_add_leaves_registry_untouched() {
        let mut economy = shop();
        let before = economy.registry.len(EntityKind::Good);
        let good = economy.create_good("hat", GoodType::SingleUse);
        assert!(economy.add_good("General", good).is_err());
        assert_eq!(economy.registry.len(EntityKind::Good), before);
        assert!(economy.good("hat").is_some());
        economy.check_invariants().unwrap();
    }

    #[test]
    fn defaults_come_from_config() {
        let economy = Economy::new();
        let good = economy.create_good("x", GoodType::SingleUse);
        assert_eq!(good.name, "Untitled");
        assert_eq!(good.purchasable_item().currency_id(), Some("currency_coins"));
        assert_eq!(good.price(), 100.0);
    }
}
