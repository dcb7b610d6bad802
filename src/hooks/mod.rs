//! Offer-wall hooks: providers, their actions and the manager that indexes offers.

pub mod manager;
pub mod provider;

pub use manager::{EnabledProviders, HookEvent, HookListener, HookManager, HookParams, HooksConfig};
pub use provider::{
    default_message, default_title, Action, ActionDocument, ActionKind, HooksDocument, Provider,
    ProviderDocument, ProviderKind, SPONSORPAY,
};
