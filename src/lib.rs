//! # Storeforge - virtual-economy model for store editors
//!
//! Storeforge holds the object graph behind an in-app store editor: categories of goods,
//! currencies and the packs that sell them, upgrade chains for upgradable goods, and the
//! offer-wall hooks a store can expose. It keeps these objects consistent while an editor
//! adds, removes, reorders and re-prices them, and reads and writes the JSON store document.
//!
//! ## Features
//!
//! - **Identity registry**: every entity id resolves to exactly one live instance.
//! - **Copy-on-write prices**: purchase details are immutable values; every edit swaps in a
//!   new one, so observers can tell "changed" from "same".
//! - **Upgrade chains**: ordered upgrades with prev/next links that are repaired after every
//!   structural edit.
//! - **Hook manager**: providers, their actions and a derived offer index that never drifts
//!   from the owning collections.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use storeforge::config::Config;
//! use storeforge::store::Store;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("storeforge.toml").await?;
//!     let json = tokio::fs::read_to_string("store.json").await?;
//!     let store = Store::from_json(&json, &config)?;
//!     store.check_invariants()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`economy`] - categories, goods, currencies, upgrades and the [`economy::Economy`] root
//! - [`hooks`] - hook providers, actions and the [`hooks::HookManager`]
//! - [`store`] - the store document and the [`store::Store`] façade
//! - [`config`] - configuration management and validation

pub mod config;
pub mod economy;
pub mod hooks;
pub mod store;
