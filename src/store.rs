//! The store: an economy plus its hooks.
//!
//! [`StoreDocument`] is the file the editor reads and writes:
//! `{ "categories": [...], "currencies": [...], "hooks": {...}, "hooksProviders": ... }`.

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::economy::document::EconomyDocument;
use crate::economy::errors::ModelResult;
use crate::economy::graph::Economy;
use crate::hooks::manager::{EnabledProviders, HookManager, HookParams};
use crate::hooks::provider::{Action, HooksDocument};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoreDocument {
    #[serde(flatten)]
    pub economy: EconomyDocument,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooks: Option<HooksDocument>,
    #[serde(rename = "hooksProviders", default, skip_serializing_if = "Option::is_none")]
    pub hooks_providers: Option<EnabledProviders>,
}

#[derive(Debug, Default)]
pub struct Store {
    pub economy: Economy,
    pub hooks: HookManager,
    hooks_providers: Option<EnabledProviders>,
}

impl Store {
    pub fn new(config: &Config) -> Self {
        Self {
            economy: Economy::with_config(config.economy.clone()),
            hooks: HookManager::default(),
            hooks_providers: None,
        }
    }

    /// Build a store from its document. `hooksProviders` in the document takes precedence
    /// over the configured enabled providers.
    pub fn from_document(document: StoreDocument, config: &Config) -> ModelResult<Self> {
        let economy = Economy::from_document(document.economy, config.economy.clone())?;
        let enabled = document
            .hooks_providers
            .clone()
            .or_else(|| config.hooks.enabled_providers.clone())
            .unwrap_or_default();
        let hooks = HookManager::new(
            enabled,
            document.hooks.unwrap_or_default(),
            config.hooks.stub_api,
        )?;
        Ok(Self {
            economy,
            hooks,
            hooks_providers: document.hooks_providers,
        })
    }

    pub fn from_json(json: &str, config: &Config) -> ModelResult<Self> {
        let document: StoreDocument = serde_json::from_str(json)?;
        Self::from_document(document, config)
    }

    pub fn to_document(&self) -> StoreDocument {
        let hooks = self.hooks.to_document();
        StoreDocument {
            economy: self.economy.to_document(),
            hooks: (!hooks.providers.is_empty()).then_some(hooks),
            hooks_providers: self.hooks_providers.clone(),
        }
    }

    pub fn to_json(&self) -> ModelResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_document())?)
    }

    /// Add an offer hook. Without an explicit `item_id` the hook pays out the first currency.
    pub fn add_hook(&mut self, provider_id: &str, params: HookParams) -> Option<&Action> {
        let mut params = params;
        if params.item_id.is_none() {
            params.item_id = self.economy.first_currency().map(|c| c.item_id.clone());
        }
        self.hooks.add_hook(provider_id, params)
    }

    pub fn remove_hook(&mut self, action_id: &str) -> Option<Action> {
        self.hooks.remove_hook(action_id)
    }

    pub fn hook_by_id(&self, action_id: &str) -> Option<&Action> {
        self.hooks.hook_by_id(action_id)
    }

    pub fn offer_hooks(&self) -> impl Iterator<Item = &Action> {
        self.hooks.offer_hooks()
    }

    pub fn check_invariants(&self) -> ModelResult<()> {
        self.economy.check_invariants()?;
        self.hooks.check_index()
    }

    pub fn close(&mut self) {
        let actions = self.hooks.close();
        info!("store closed ({} hook action(s) released)", actions);
    }
}
