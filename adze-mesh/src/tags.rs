use crate::Entity;
use rustc_hash::FxHashMap;

/// Key for a per-entity integer tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct IntTag(pub(crate) usize);

/// Key for a per-entity floating-point tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DblTag(pub(crate) usize);

#[derive(Debug)]
pub(crate) struct TagStore<T> {
    pub name: String,
    pub data: FxHashMap<Entity, T>,
}

/// Both tag families, keyed by slot; destroyed tags leave a dead slot so
/// outstanding keys cannot alias a later tag.
#[derive(Debug, Default)]
pub(crate) struct Tags {
    pub ints: Vec<Option<TagStore<i32>>>,
    pub dbls: Vec<Option<TagStore<f64>>>,
}

impl Tags {
    pub fn create_int(&mut self, name: &str) -> IntTag {
        self.ints.push(Some(TagStore { name: name.to_owned(), data: FxHashMap::default() }));
        IntTag(self.ints.len() - 1)
    }

    pub fn create_dbl(&mut self, name: &str) -> DblTag {
        self.dbls.push(Some(TagStore { name: name.to_owned(), data: FxHashMap::default() }));
        DblTag(self.dbls.len() - 1)
    }

    pub fn int(&self, tag: IntTag) -> &TagStore<i32> {
        self.ints[tag.0].as_ref().expect("integer tag was destroyed")
    }

    pub fn int_mut(&mut self, tag: IntTag) -> &mut TagStore<i32> {
        self.ints[tag.0].as_mut().expect("integer tag was destroyed")
    }

    pub fn dbl(&self, tag: DblTag) -> &TagStore<f64> {
        self.dbls[tag.0].as_ref().expect("double tag was destroyed")
    }

    pub fn dbl_mut(&mut self, tag: DblTag) -> &mut TagStore<f64> {
        self.dbls[tag.0].as_mut().expect("double tag was destroyed")
    }

    /// Drops every tag value attached to a dying entity.
    pub fn purge(&mut self, e: Entity) {
        for store in self.ints.iter_mut().flatten() {
            store.data.remove(&e);
        }
        for store in self.dbls.iter_mut().flatten() {
            store.data.remove(&e);
        }
    }
}
