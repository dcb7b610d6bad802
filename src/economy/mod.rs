//! Virtual-economy object graph.
//!
//! Categories own goods, goods own upgrade chains, currencies own packs. The [`Economy`]
//! root keeps an identity registry over all of them, so relations can be stored as ids
//! and resolved to a single canonical instance.

pub mod category;
pub mod collection;
pub mod currency;
pub mod document;
pub mod errors;
pub mod goods;
pub mod graph;
pub mod purchase;
pub mod registry;
pub mod upgrade;

pub use category::Category;
pub use collection::{Collection, Fallback, FromKey, Keyed};
pub use currency::{Currency, CurrencyPack};
pub use document::{
    CategoryDocument, CurrencyDocument, EconomyDocument, GoodDocument, PackDocument,
    UpgradeDocument,
};
pub use errors::{ModelError, ModelResult};
pub use goods::{
    is_equippable, is_ownable, is_upgradable, EquippingModel, GoodKind, GoodType, VirtualGood,
};
pub use graph::{Economy, EconomyConfig, EconomyEvent, EconomyListener};
pub use purchase::{
    MarketItem, Platform, Purchasable, PurchasableItem, PurchaseTarget, PurchaseType,
};
pub use registry::{EntityKind, Owner, Registry};
pub use upgrade::{Upgrade, UpgradeChain, NO_ITEM};
