use crate::watch::{self, WatchContext};
use crate::{Catalog, Entity, Schema};
use propdoc_types::{Error, Index, Result, Value};
use std::rc::Rc;

/// A lazy sequence of documents backed by a stored list.
///
/// Elements are materialized only when reached, each as a fresh clean
/// entity watched at its position. Iterating again starts over.
#[derive(Debug, Clone)]
pub struct Cursor {
    catalog: Rc<Catalog>,
    schema: Rc<Schema>,
    items: Rc<[Value]>,
    origin: Option<WatchContext>,
}

impl Cursor {
    pub(crate) fn new(
        catalog: Rc<Catalog>,
        schema: Rc<Schema>,
        items: Vec<Value>,
        origin: Option<WatchContext>,
    ) -> Self {
        Self {
            catalog,
            schema,
            items: items.into(),
            origin,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Materializes the element at `pos`.
    pub fn get(&self, pos: usize) -> Result<Entity> {
        let item = self.items.get(pos).ok_or_else(|| Error::IndexOutOfRange {
            property: self
                .origin
                .as_ref()
                .map_or_else(|| self.schema.name.clone(), |o| o.property().to_string()),
            index: Index::Position(pos),
        })?;
        let entity = Entity::materialize(&self.catalog, self.schema.clone(), item)?;
        if let Some(origin) = &self.origin {
            watch::watch(&entity, origin.at(Index::Position(pos)));
        }
        Ok(entity)
    }

    #[must_use]
    pub fn iter(&self) -> CursorIter<'_> {
        CursorIter {
            cursor: self,
            pos: 0,
        }
    }

    /// Materializes every element.
    pub fn to_vec(&self) -> Result<Vec<Entity>> {
        self.iter().collect()
    }
}

/// Iterator over a [`Cursor`].
#[derive(Debug)]
pub struct CursorIter<'a> {
    cursor: &'a Cursor,
    pos: usize,
}

impl Iterator for CursorIter<'_> {
    type Item = Result<Entity>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.cursor.len() {
            return None;
        }
        let item = self.cursor.get(self.pos);
        self.pos += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.cursor.len().saturating_sub(self.pos);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CursorIter<'_> {}

impl<'a> IntoIterator for &'a Cursor {
    type Item = Result<Entity>;
    type IntoIter = CursorIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
