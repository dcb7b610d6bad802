use crate::economy::collection::{Collection, Keyed};
use crate::economy::goods::VirtualGood;
use crate::economy::registry::EntityKind;

/// A named shelf of goods. The name doubles as the id, so it is unique per economy.
#[derive(Debug, Clone)]
pub struct Category {
    pub name: String,
    pub(crate) goods: Collection<VirtualGood>,
}

impl Category {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            goods: Collection::new(EntityKind::Good),
        }
    }

    pub fn goods(&self) -> &Collection<VirtualGood> {
        &self.goods
    }

    pub fn good_ids(&self) -> Vec<String> {
        self.goods.ids()
    }
}

impl Keyed for Category {
    fn key(&self) -> &str {
        &self.name
    }
}
