//! Hook providers and their actions.
//!
//! A provider is identified by its id; the id alone picks its [`ProviderKind`]. Only the
//! offer-wall kind produces actions that are listed as offers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::economy::collection::{Collection, FromKey, Keyed};
use crate::economy::registry::EntityKind;

/// Provider id of the SponsorPay offer wall.
pub const SPONSORPAY: &str = "sponsorpay";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Sponsorpay,
    Generic,
}

impl ProviderKind {
    pub fn from_id(id: &str) -> Self {
        match id {
            SPONSORPAY => ProviderKind::Sponsorpay,
            _ => ProviderKind::Generic,
        }
    }

    /// Whether actions of this provider are offers (listed in the offer index).
    pub fn offers(&self) -> bool {
        matches!(self, ProviderKind::Sponsorpay)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionKind {
    Generic,
    /// An offer that pays out `item_id` (a currency) at `exchange_rate`.
    Sponsorpay {
        item_id: String,
        exchange_rate: Option<f64>,
    },
}

// ============================================================================
// Actions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    id: String,
    provider_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub action: Option<String>,
    kind: ActionKind,
    /// Fields this model does not interpret, kept for round-trips.
    pub extra: Map<String, Value>,
}

impl Action {
    pub fn new(id: &str, provider_id: &str) -> Self {
        let kind = match ProviderKind::from_id(provider_id) {
            ProviderKind::Sponsorpay => ActionKind::Sponsorpay {
                item_id: String::new(),
                exchange_rate: None,
            },
            ProviderKind::Generic => ActionKind::Generic,
        };
        Self {
            id: id.to_string(),
            provider_id: provider_id.to_string(),
            name: None,
            description: None,
            action: None,
            kind,
            extra: Map::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    pub fn item_id(&self) -> Option<&str> {
        match &self.kind {
            ActionKind::Sponsorpay { item_id, .. } => Some(item_id),
            ActionKind::Generic => None,
        }
    }

    pub fn exchange_rate(&self) -> Option<f64> {
        match &self.kind {
            ActionKind::Sponsorpay { exchange_rate, .. } => *exchange_rate,
            ActionKind::Generic => None,
        }
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    pub fn set_description(&mut self, description: &str) {
        self.description = Some(description.to_string());
    }

    /// No-op on actions that are not offers.
    pub fn set_item_id(&mut self, currency_id: &str) {
        if let ActionKind::Sponsorpay { item_id, .. } = &mut self.kind {
            *item_id = currency_id.to_string();
        }
    }

    /// No-op on actions that are not offers.
    pub fn set_exchange_rate(&mut self, rate: f64) {
        if let ActionKind::Sponsorpay { exchange_rate, .. } = &mut self.kind {
            *exchange_rate = Some(rate);
        }
    }

    pub fn is_offer(&self) -> bool {
        matches!(self.kind, ActionKind::Sponsorpay { .. })
    }

    pub(crate) fn from_document(provider_id: &str, doc: ActionDocument) -> Self {
        let mut action = Action::new(&doc.id, provider_id);
        action.name = doc.name;
        action.description = doc.description;
        action.action = doc.action;
        action.extra = doc.extra;
        match &mut action.kind {
            ActionKind::Sponsorpay {
                item_id,
                exchange_rate,
            } => {
                *item_id = doc.item_id.unwrap_or_default();
                *exchange_rate = doc.exchange_rate;
            }
            ActionKind::Generic => {
                // Keep offer fields found on a generic provider as opaque data
                if let Some(item_id) = doc.item_id {
                    action.extra.insert("itemId".into(), Value::String(item_id));
                }
                if let Some(rate) = doc.exchange_rate.and_then(serde_json::Number::from_f64) {
                    action.extra.insert("exchangeRate".into(), Value::Number(rate));
                }
            }
        }
        action
    }
}

impl Keyed for Action {
    fn key(&self) -> &str {
        &self.id
    }
}

impl From<&Action> for ActionDocument {
    fn from(action: &Action) -> Self {
        ActionDocument {
            id: action.id.clone(),
            name: action.name.clone(),
            description: action.description.clone(),
            action: action.action.clone(),
            item_id: action.item_id().map(str::to_string),
            exchange_rate: action.exchange_rate(),
            extra: action.extra.clone(),
        }
    }
}

/// Title shown when an offer completes.
pub fn default_title() -> &'static str {
    "Congratulations!"
}

/// Message shown when an offer completes, e.g. "You've just earned 1,000 coins from SponsorPay".
pub fn default_message(amount: i64, item_name: &str) -> String {
    format!(
        "You've just earned {} {} from SponsorPay",
        format_thousands(amount),
        item_name
    )
}

fn format_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ============================================================================
// Providers
// ============================================================================

#[derive(Debug, Clone)]
pub struct Provider {
    id: String,
    kind: ProviderKind,
    pub(crate) actions: Collection<Action>,
    pub extra: Map<String, Value>,
}

impl Provider {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: ProviderKind::from_id(id),
            actions: Collection::new(EntityKind::Action),
            extra: Map::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn actions(&self) -> &Collection<Action> {
        &self.actions
    }
}

impl Keyed for Provider {
    fn key(&self) -> &str {
        &self.id
    }
}

impl FromKey for Provider {
    fn from_key(id: &str) -> Self {
        Provider::new(id)
    }
}

// ============================================================================
// Documents
// ============================================================================

/// `{ "providers": [ { "id": ..., "actions": [ ... ] } ] }`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HooksDocument {
    #[serde(default)]
    pub providers: Vec<ProviderDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderDocument {
    pub id: String,
    #[serde(default)]
    pub actions: Vec<ActionDocument>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Actions never carry their provider id; it is implied by nesting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionDocument {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(rename = "itemId", default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(rename = "exchangeRate", default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<&Provider> for ProviderDocument {
    fn from(provider: &Provider) -> Self {
        ProviderDocument {
            id: provider.id.clone(),
            actions: provider.actions.iter().map(ActionDocument::from).collect(),
            extra: provider.extra.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_is_picked_by_provider_id() {
        assert_eq!(ProviderKind::from_id(SPONSORPAY), ProviderKind::Sponsorpay);
        assert_eq!(ProviderKind::from_id("tapjoy"), ProviderKind::Generic);
        assert!(Action::new("hook_1", SPONSORPAY).is_offer());
        assert!(!Action::new("hook_1", "tapjoy").is_offer());
    }

    #[test]
    fn default_message_groups_thousands() {
        assert_eq!(default_title(), "Congratulations!");
        assert_eq!(
            default_message(1000, "coins"),
            "You've just earned 1,000 coins from SponsorPay"
        );
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1234567), "1,234,567");
        assert_eq!(format_thousands(-45000), "-45,000");
    }

    #[test]
    fn unknown_action_fields_round_trip() {
        let doc: ActionDocument = serde_json::from_value(json!({
            "id": "offer",
            "itemId": "currency_coins",
            "exchangeRate": 2.5,
            "icon": "img/offer.png"
        }))
        .unwrap();
        let action = Action::from_document(SPONSORPAY, doc);
        assert_eq!(action.item_id(), Some("currency_coins"));
        assert_eq!(action.exchange_rate(), Some(2.5));

        let back = serde_json::to_value(ActionDocument::from(&action)).unwrap();
        assert_eq!(
            back,
            json!({
                "id": "offer",
                "itemId": "currency_coins",
                "exchangeRate": 2.5,
                "icon": "img/offer.png"
            })
        );
    }
}
