//! Ordered owning collection with id lookup.
//!
//! Insertion order is significant (it is the display order in the editor and the link
//! order of upgrade chains). Lookups by id go through a side index that is rebuilt after
//! every structural change.

use std::collections::HashMap;

use crate::economy::errors::{ModelError, ModelResult};
use crate::economy::registry::EntityKind;

/// Anything stored in a [`Collection`] is keyed by a string id.
pub trait Keyed {
    fn key(&self) -> &str;
}

/// Members that can be created from a bare id (used by [`Collection::get_or_add`]).
pub trait FromKey {
    fn from_key(id: &str) -> Self;
}

/// Which end to drop when `remove_by_id` finds no match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    First,
    Last,
}

#[derive(Debug, Clone)]
pub struct Collection<T> {
    kind: EntityKind,
    items: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T: Keyed> Collection<T> {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.index_of(id).map(|i| &self.items[i])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        match self.index_of(id) {
            Some(i) => Some(&mut self.items[i]),
            None => None,
        }
    }

    pub fn at(&self, position: usize) -> Option<&T> {
        self.items.get(position)
    }

    pub fn at_mut(&mut self, position: usize) -> Option<&mut T> {
        self.items.get_mut(position)
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn ids(&self) -> Vec<String> {
        self.items.iter().map(|item| item.key().to_string()).collect()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Append a member. Fails if the id is already present in this collection.
    pub fn push(&mut self, item: T) -> ModelResult<&mut T> {
        if self.contains(item.key()) {
            return Err(ModelError::duplicate(self.kind, item.key()));
        }
        self.index.insert(item.key().to_string(), self.items.len());
        self.items.push(item);
        let last = self.items.len() - 1;
        Ok(&mut self.items[last])
    }

    pub fn remove(&mut self, id: &str) -> Option<T> {
        let position = self.index_of(id)?;
        self.remove_at(position)
    }

    pub fn remove_at(&mut self, position: usize) -> Option<T> {
        if position >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(position);
        self.reindex();
        Some(removed)
    }

    /// Remove the member with `id`. When there is no such member and a fallback is given,
    /// the first or last member is removed instead.
    pub fn remove_by_id(&mut self, id: Option<&str>, fallback: Option<Fallback>) -> Option<T> {
        if let Some(found) = id.and_then(|id| self.index_of(id)) {
            return self.remove_at(found);
        }
        match fallback {
            Some(Fallback::First) => self.remove_at(0),
            Some(Fallback::Last) if !self.items.is_empty() => {
                let last = self.items.len() - 1;
                self.remove_at(last)
            }
            _ => None,
        }
    }

    /// Relocate the member `id` to `to_index`. Returns `Ok(true)` when the order changed and
    /// `Ok(false)` when the member was already there.
    pub fn move_to(&mut self, id: &str, to_index: usize) -> ModelResult<bool> {
        if to_index >= self.items.len() {
            return Err(ModelError::OutOfRange {
                index: to_index,
                len: self.items.len(),
            });
        }
        let from_index = self
            .index_of(id)
            .ok_or_else(|| ModelError::not_found(self.kind, id))?;
        if from_index == to_index {
            return Ok(false);
        }
        let item = self.items.remove(from_index);
        self.items.insert(to_index, item);
        self.reindex();
        Ok(true)
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (position, item) in self.items.iter().enumerate() {
            self.index.insert(item.key().to_string(), position);
        }
    }
}

impl<T: Keyed + FromKey> Collection<T> {
    /// Return the member with `id`, creating a minimal one first if it is missing.
    /// The flag reports whether a member was created.
    pub fn get_or_add(&mut self, id: &str) -> (&mut T, bool) {
        let created = !self.contains(id);
        if created {
            self.index.insert(id.to_string(), self.items.len());
            self.items.push(T::from_key(id));
        }
        let position = self.index[id];
        (&mut self.items[position], created)
    }
}

impl<'a, T: Keyed> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: String,
        tag: u32,
    }

    impl Keyed for Item {
        fn key(&self) -> &str {
            &self.id
        }
    }

    impl FromKey for Item {
        fn from_key(id: &str) -> Self {
            Item {
                id: id.to_string(),
                tag: 0,
            }
        }
    }

    fn filled(ids: &[&str]) -> Collection<Item> {
        let mut collection = Collection::new(EntityKind::Good);
        for (tag, id) in ids.iter().enumerate() {
            collection
                .push(Item {
                    id: id.to_string(),
                    tag: tag as u32 + 1,
                })
                .unwrap();
        }
        collection
    }

    #[test]
    fn move_reorders_and_reindexes() {
        let mut c = filled(&["g1", "g2", "g3"]);
        assert!(c.move_to("g1", 2).unwrap());
        assert_eq!(c.ids(), vec!["g2", "g3", "g1"]);
        assert_eq!(c.index_of("g1"), Some(2));
        assert_eq!(c.get("g2").unwrap().tag, 2);
    }

    #[test]
    fn move_to_same_index_is_noop() {
        let mut c = filled(&["a", "b"]);
        assert!(!c.move_to("b", 1).unwrap());
        assert_eq!(c.ids(), vec!["a", "b"]);
    }

    #[test]
    fn move_errors() {
        let mut c = filled(&["a", "b"]);
        assert!(matches!(
            c.move_to("a", 2),
            Err(ModelError::OutOfRange { index: 2, len: 2 })
        ));
        assert!(matches!(
            c.move_to("zzz", 0),
            Err(ModelError::NotFound { .. })
        ));
    }

    #[test]
    fn remove_by_id_with_fallbacks() {
        let mut c = filled(&["a", "b", "c", "d"]);
        assert_eq!(c.remove_by_id(Some("b"), None).unwrap().id, "b");
        assert!(c.remove_by_id(Some("missing"), None).is_none());
        assert_eq!(
            c.remove_by_id(Some("missing"), Some(Fallback::First)).unwrap().id,
            "a"
        );
        assert_eq!(c.remove_by_id(None, Some(Fallback::Last)).unwrap().id, "d");
        assert_eq!(c.ids(), vec!["c"]);

        let mut empty: Collection<Item> = Collection::new(EntityKind::Good);
        assert!(empty.remove_by_id(None, Some(Fallback::Last)).is_none());
        assert!(empty.remove_by_id(None, Some(Fallback::First)).is_none());
    }

    #[test]
    fn get_or_add_creates_once() {
        let mut c = filled(&["a"]);
        let (item, created) = c.get_or_add("b");
        assert!(created);
        assert_eq!(item.tag, 0);
        item.tag = 9;

        let (item, created) = c.get_or_add("b");
        assert!(!created);
        assert_eq!(item.tag, 9);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn push_rejects_duplicate_member() {
        let mut c = filled(&["a"]);
        assert!(c.push(Item::from_key("a")).is_err());
        assert_eq!(c.len(), 1);
    }
}
