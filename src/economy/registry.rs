//! Identity registry.
//!
//! Every live entity is owned by exactly one collection in the graph. The registry maps
//! `(kind, id)` to the [`Owner`] of that collection, so any id can be resolved to its one
//! canonical instance by walking from the root to the owner. Relations between entities are
//! stored as ids and always resolved through here.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::economy::errors::{ModelError, ModelResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Category,
    Currency,
    Good,
    CurrencyPack,
    Upgrade,
    Provider,
    Action,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Category => "category",
            EntityKind::Currency => "currency",
            EntityKind::Good => "good",
            EntityKind::CurrencyPack => "currency pack",
            EntityKind::Upgrade => "upgrade",
            EntityKind::Provider => "provider",
            EntityKind::Action => "action",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The collection an entity lives in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Owner {
    /// Top-level collections (economy categories/currencies, hook providers).
    Root,
    Category(String),
    Currency(String),
    Good(String),
    Provider(String),
}

impl Owner {
    pub fn id(&self) -> Option<&str> {
        match self {
            Owner::Root => None,
            Owner::Category(id)
            | Owner::Currency(id)
            | Owner::Good(id)
            | Owner::Provider(id) => Some(id),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Registry {
    tables: HashMap<EntityKind, HashMap<String, Owner>>,
    counter: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id` under `kind`. Re-registering the same id with the same owner is a no-op;
    /// any other collision is a `DuplicateId` error.
    pub fn register(&mut self, kind: EntityKind, id: &str, owner: Owner) -> ModelResult<()> {
        let table = self.tables.entry(kind).or_default();
        match table.get(id) {
            Some(existing) if *existing == owner => Ok(()),
            Some(_) => Err(ModelError::duplicate(kind, id)),
            None => {
                table.insert(id.to_string(), owner);
                Ok(())
            }
        }
    }

    pub fn resolve(&self, kind: EntityKind, id: &str) -> Option<&Owner> {
        self.tables.get(&kind).and_then(|t| t.get(id))
    }

    pub fn unregister(&mut self, kind: EntityKind, id: &str) -> Option<Owner> {
        self.tables.get_mut(&kind).and_then(|t| t.remove(id))
    }

    pub fn contains(&self, kind: EntityKind, id: &str) -> bool {
        self.resolve(kind, id).is_some()
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        self.tables.get(&kind).map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(HashMap::is_empty)
    }

    /// Registered ids for `kind`, in no particular order.
    pub fn ids(&self, kind: EntityKind) -> impl Iterator<Item = &str> {
        self.tables
            .get(&kind)
            .into_iter()
            .flat_map(|t| t.keys().map(String::as_str))
    }

    /// Produce `"{prefix}{n}"` for the next counter value not yet registered under `kind`.
    pub fn fresh_id(&mut self, kind: EntityKind, prefix: &str) -> String {
        loop {
            self.counter += 1;
            let candidate = format!("{}{}", prefix, self.counter);
            if !self.contains(kind, &candidate) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_rejects_foreign_duplicate() {
        let mut registry = Registry::new();
        registry
            .register(EntityKind::Good, "sword", Owner::Category("Weapons".into()))
            .unwrap();

        // Same owner is treated as replacing the identical instance
        assert!(registry
            .register(EntityKind::Good, "sword", Owner::Category("Weapons".into()))
            .is_ok());

        let err = registry
            .register(EntityKind::Good, "sword", Owner::Category("Armor".into()))
            .unwrap_err();
        assert!(matches!(err, ModelError::DuplicateId { kind: EntityKind::Good, .. }));
    }

    #[test]
    fn namespaces_are_per_kind() {
        let mut registry = Registry::new();
        registry
            .register(EntityKind::Good, "coins", Owner::Category("General".into()))
            .unwrap();
        registry
            .register(EntityKind::Currency, "coins", Owner::Root)
            .unwrap();
        assert_eq!(registry.len(EntityKind::Good), 1);
        assert_eq!(registry.len(EntityKind::Currency), 1);

        assert_eq!(
            registry.unregister(EntityKind::Good, "coins"),
            Some(Owner::Category("General".into()))
        );
        assert!(registry.resolve(EntityKind::Good, "coins").is_none());
        assert!(registry.contains(EntityKind::Currency, "coins"));
    }

    #[test]
    fn fresh_id_skips_taken_ids() {
        let mut registry = Registry::new();
        registry
            .register(EntityKind::Upgrade, "item_1", Owner::Good("g".into()))
            .unwrap();
        let id = registry.fresh_id(EntityKind::Upgrade, "item_");
        assert_eq!(id, "item_2");
    }
}
