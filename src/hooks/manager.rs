//! Hook manager.
//!
//! Owns the providers (each owning its actions) plus the offer index, a flat list of
//! references to every action of an enabled offer-wall provider. The index never holds an
//! action of its own; it is only changed together with the owning collections.

use std::collections::HashMap;
use std::fmt;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::economy::collection::{Collection, Keyed};
use crate::economy::errors::{ModelError, ModelResult};
use crate::economy::registry::{EntityKind, Owner, Registry};
use crate::hooks::provider::{
    Action, HooksDocument, Provider, ProviderDocument, ProviderKind,
};

/// Providers the host has initialised. Older stores send a plain list of ids, newer ones an
/// id -> bool map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum EnabledProviders {
    List(Vec<String>),
    Map(HashMap<String, bool>),
}

impl Default for EnabledProviders {
    fn default() -> Self {
        EnabledProviders::Map(HashMap::new())
    }
}

impl EnabledProviders {
    pub fn is_enabled(&self, provider_id: &str) -> bool {
        match self {
            EnabledProviders::List(ids) => ids.iter().any(|id| id == provider_id),
            EnabledProviders::Map(map) => map.get(provider_id).copied().unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HooksConfig {
    /// Treat every provider as enabled (host-less development).
    #[serde(default)]
    pub stub_api: bool,
    #[serde(default)]
    pub enabled_providers: Option<EnabledProviders>,
}

/// Options for [`HookManager::add_hook`].
#[derive(Debug, Clone, Default)]
pub struct HookParams {
    pub item_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub exchange_rate: Option<f64>,
    pub asset_url: Option<String>,
}

#[derive(Debug)]
pub enum HookEvent<'a> {
    Added {
        action: &'a Action,
        asset_url: Option<&'a str>,
    },
    /// Fired while the action is still attached to its provider.
    Destroyed { action: &'a Action },
    Unregistered { kind: EntityKind, id: &'a str },
}

pub type HookListener = Box<dyn FnMut(&HookEvent<'_>)>;

/// Entry of the offer index.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OfferRef {
    action_id: String,
    provider_id: String,
}

impl Keyed for OfferRef {
    fn key(&self) -> &str {
        &self.action_id
    }
}

fn notify(listeners: &mut [HookListener], event: &HookEvent<'_>) {
    for listener in listeners.iter_mut() {
        listener(event);
    }
}

pub struct HookManager {
    enabled: EnabledProviders,
    stub_api: bool,
    registry: Registry,
    providers: Collection<Provider>,
    offer_index: Collection<OfferRef>,
    listeners: Vec<HookListener>,
}

impl fmt::Debug for HookManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookManager")
            .field("enabled", &self.enabled)
            .field("stub_api", &self.stub_api)
            .field("providers", &self.providers.ids())
            .field("offer_index", &self.offer_index.ids())
            .finish_non_exhaustive()
    }
}

impl Default for HookManager {
    fn default() -> Self {
        Self::empty(EnabledProviders::default(), false)
    }
}

impl HookManager {
    fn empty(enabled: EnabledProviders, stub_api: bool) -> Self {
        Self {
            enabled,
            stub_api,
            registry: Registry::new(),
            providers: Collection::new(EntityKind::Provider),
            offer_index: Collection::new(EntityKind::Action),
            listeners: Vec::new(),
        }
    }

    /// Build providers and actions from `document` and index the offers of every enabled
    /// offer-wall provider.
    pub fn new(enabled: EnabledProviders, document: HooksDocument, stub_api: bool) -> ModelResult<Self> {
        let mut manager = Self::empty(enabled, stub_api);
        for provider_doc in document.providers {
            manager.load_provider(provider_doc)?;
        }
        info!(
            "hook manager ready: {} provider(s), {} offer(s){}",
            manager.providers.len(),
            manager.offer_index.len(),
            if stub_api { " [stub api]" } else { "" }
        );
        Ok(manager)
    }

    pub fn from_config(config: &HooksConfig, document: HooksDocument) -> ModelResult<Self> {
        Self::new(
            config.enabled_providers.clone().unwrap_or_default(),
            document,
            config.stub_api,
        )
    }

    fn load_provider(&mut self, doc: ProviderDocument) -> ModelResult<()> {
        let provider_id = doc.id;
        self.registry
            .register(EntityKind::Provider, &provider_id, Owner::Root)?;
        let mut provider = Provider::new(&provider_id);
        provider.extra = doc.extra;

        let owner = Owner::Provider(provider_id.clone());
        for action_doc in doc.actions {
            let action = Action::from_document(&provider_id, action_doc);
            self.registry
                .register(EntityKind::Action, action.id(), owner.clone())?;
            provider.actions.push(action)?;
        }

        if self.indexes(&provider_id) {
            for action in provider.actions.iter() {
                self.offer_index.push(OfferRef {
                    action_id: action.id().to_string(),
                    provider_id: provider_id.clone(),
                })?;
            }
        }
        self.providers.push(provider)?;
        Ok(())
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&HookEvent<'_>) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn stub_api(&self) -> bool {
        self.stub_api
    }

    pub fn is_provider_enabled(&self, provider_id: &str) -> bool {
        self.stub_api || self.enabled.is_enabled(provider_id)
    }

    /// Actions of this provider belong in the offer index.
    fn indexes(&self, provider_id: &str) -> bool {
        ProviderKind::from_id(provider_id).offers() && self.is_provider_enabled(provider_id)
    }

    /// Create an offer on `provider_id`, creating the provider if needed. Only offer-wall
    /// providers accept hooks; anything else returns `None`.
    pub fn add_hook(&mut self, provider_id: &str, params: HookParams) -> Option<&Action> {
        if !ProviderKind::from_id(provider_id).offers() {
            warn!("add_hook: provider {} does not support hooks", provider_id);
            return None;
        }

        let hook_id = self.registry.fresh_id(EntityKind::Action, "hook_");
        let mut action = Action::new(&hook_id, provider_id);
        action.name = params.name;
        action.description = params.description;
        if let Some(item_id) = params.item_id.as_deref() {
            action.set_item_id(item_id);
        }
        if let Some(rate) = params.exchange_rate {
            action.set_exchange_rate(rate);
        }

        if let Err(e) = self.attach(action) {
            warn!("add_hook: could not attach {}: {}", hook_id, e);
            return None;
        }
        debug!("added hook {} to provider {}", hook_id, provider_id);

        let action = self.providers.get(provider_id)?.actions.get(&hook_id)?;
        notify(
            &mut self.listeners,
            &HookEvent::Added {
                action,
                asset_url: params.asset_url.as_deref(),
            },
        );
        Some(action)
    }

    fn attach(&mut self, action: Action) -> ModelResult<()> {
        let provider_id = action.provider_id().to_string();
        let action_id = action.id().to_string();
        let indexes = self.indexes(&provider_id);

        let (provider, created) = self.providers.get_or_add(&provider_id);
        let pushed = provider.actions.push(action).map(|_| ());
        if created {
            debug!("created provider {}", provider_id);
            self.registry
                .register(EntityKind::Provider, &provider_id, Owner::Root)?;
        }
        pushed?;
        self.registry.register(
            EntityKind::Action,
            &action_id,
            Owner::Provider(provider_id.clone()),
        )?;
        if indexes {
            self.offer_index.push(OfferRef {
                action_id,
                provider_id,
            })?;
        }
        Ok(())
    }

    /// Remove a hook from the offer index and from its provider. Listeners see the
    /// `Destroyed` event before the action is detached.
    pub fn remove_hook(&mut self, action_id: &str) -> Option<Action> {
        let provider_id = self
            .registry
            .resolve(EntityKind::Action, action_id)?
            .id()?
            .to_string();

        self.offer_index.remove(action_id);
        let action = self.providers.get(&provider_id)?.actions.get(action_id)?;
        notify(&mut self.listeners, &HookEvent::Destroyed { action });

        let removed = self
            .providers
            .get_mut(&provider_id)?
            .actions
            .remove(action_id)?;
        self.registry.unregister(EntityKind::Action, action_id);
        debug!("removed hook {} from provider {}", action_id, provider_id);
        Some(removed)
    }

    /// For the offer wall, the action paying out `item_id` or else the provider's first
    /// action. Other providers have no hook lookup.
    pub fn get_hook(&self, provider_id: &str, item_id: Option<&str>) -> Option<&Action> {
        if !ProviderKind::from_id(provider_id).offers() {
            return None;
        }
        let actions = &self.providers.get(provider_id)?.actions;
        match item_id {
            Some(item_id) => actions.iter().find(|a| a.item_id() == Some(item_id)),
            None => actions.first(),
        }
    }

    pub fn hook_by_id(&self, action_id: &str) -> Option<&Action> {
        let provider_id = self.registry.resolve(EntityKind::Action, action_id)?.id()?;
        self.providers.get(provider_id)?.actions.get(action_id)
    }

    pub fn hook_by_id_mut(&mut self, action_id: &str) -> Option<&mut Action> {
        let provider_id = self
            .registry
            .resolve(EntityKind::Action, action_id)?
            .id()?
            .to_string();
        self.providers.get_mut(&provider_id)?.actions.get_mut(action_id)
    }

    pub fn provider(&self, id: &str) -> Option<&Provider> {
        self.providers.get(id)
    }

    pub fn providers(&self) -> &Collection<Provider> {
        &self.providers
    }

    pub fn offer_hooks(&self) -> impl Iterator<Item = &Action> {
        self.offer_index.iter().filter_map(move |entry| {
            self.providers
                .get(&entry.provider_id)?
                .actions
                .get(&entry.action_id)
        })
    }

    pub fn offer_hook_ids(&self) -> Vec<String> {
        self.offer_index.ids()
    }

    /// Verify the offer index holds exactly the actions of enabled offer-wall providers, and
    /// that every indexed action is still an offer.
    pub fn check_index(&self) -> ModelResult<()> {
        if let Some(stale) = self
            .offer_index
            .iter()
            .find(|entry| self.hook_by_id(&entry.action_id).map_or(true, |a| !a.is_offer()))
        {
            return Err(ModelError::InvalidDocument(format!(
                "offer index entry {} is not a live offer",
                stale.action_id
            )));
        }
        let expected: Vec<String> = self
            .providers
            .iter()
            .filter(|p| self.indexes(p.id()))
            .flat_map(|p| p.actions.ids())
            .collect();
        let mut actual = self.offer_index.ids();
        let mut sorted_expected = expected.clone();
        actual.sort();
        sorted_expected.sort();
        if actual != sorted_expected {
            return Err(ModelError::InvalidDocument(format!(
                "offer index {:?} does not match enabled offers {:?}",
                self.offer_index.ids(),
                expected
            )));
        }
        Ok(())
    }

    pub fn to_document(&self) -> HooksDocument {
        HooksDocument {
            providers: self.providers.iter().map(ProviderDocument::from).collect(),
        }
    }

    /// Tear everything down, last provider first and, within a provider, last action first.
    /// Every action is unregistered before its provider. Returns the number of actions
    /// unregistered.
    pub fn close(&mut self) -> usize {
        let mut unregistered = 0;
        for i in (0..self.providers.len()).rev() {
            let Some(provider) = self.providers.at_mut(i) else {
                continue;
            };
            for j in (0..provider.actions.len()).rev() {
                let Some(action) = provider.actions.remove_at(j) else {
                    continue;
                };
                self.registry.unregister(EntityKind::Action, action.id());
                self.offer_index.remove(action.id());
                notify(
                    &mut self.listeners,
                    &HookEvent::Unregistered {
                        kind: EntityKind::Action,
                        id: action.id(),
                    },
                );
                unregistered += 1;
            }
            if let Some(provider) = self.providers.remove_at(i) {
                self.registry.unregister(EntityKind::Provider, provider.id());
                notify(
                    &mut self.listeners,
                    &HookEvent::Unregistered {
                        kind: EntityKind::Provider,
                        id: provider.id(),
                    },
                );
            }
        }
        info!("hook manager closed: {} action(s) unregistered", unregistered);
        unregistered
    }
}
