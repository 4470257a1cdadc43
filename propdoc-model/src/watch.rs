//! Upward propagation from materialized children to their parents.
//!
//! When a property materializes a nested document, the child is handed a
//! [`WatchContext`] naming the parent entity, the property on it, and the
//! slot the child occupies. Three synchronization listeners on the child
//! then relay every change, clean and dirty notification into that parent
//! property, which in turn notifies the parent's own listeners. Repeated
//! level by level, an edit three documents deep reaches the root.

use crate::{Entity, Event, Notification, Property};
use propdoc_types::{Index, Result};
use std::rc::Rc;
use tracing::{debug, trace};

/// Where a materialized child writes back to.
///
/// Held only by the child; the parent never refers to its materialized
/// children and the context is never serialized.
#[derive(Debug, Clone)]
pub struct WatchContext {
    parent: Entity,
    property: String,
    index: Option<Index>,
}

impl WatchContext {
    #[must_use]
    pub fn new(parent: Entity, property: &str, index: Option<Index>) -> Self {
        Self {
            parent,
            property: property.to_string(),
            index,
        }
    }

    #[must_use]
    pub fn parent(&self) -> &Entity {
        &self.parent
    }

    #[must_use]
    pub fn property(&self) -> &str {
        &self.property
    }

    /// The slot within the parent value, or `None` for the whole value.
    #[must_use]
    pub fn index(&self) -> Option<&Index> {
        self.index.as_ref()
    }

    /// The same context, narrowed to one slot.
    #[must_use]
    pub(crate) fn at(&self, index: Index) -> Self {
        Self {
            parent: self.parent.clone(),
            property: self.property.clone(),
            index: Some(index),
        }
    }
}

/// Wires `child` to write back through `context`.
///
/// Watching an already watched child only replaces its context; the
/// synchronization listeners are installed once.
pub fn watch(child: &Entity, context: WatchContext) {
    debug!(
        child = %child.schema_name(),
        parent = %context.parent.schema_name(),
        property = %context.property,
        index = ?context.index,
        "Watching child entity"
    );
    if child.set_watch_context(context) {
        return;
    }
    child.attach_sync(Notification::Change, Rc::new(sync_change));
    child.attach_sync(Notification::Clean, Rc::new(sync_clean));
    child.attach_sync(Notification::Dirty, Rc::new(sync_dirty));
}

/// Fetches the parent property the event's target is bound to.
fn route(event: &Event) -> Result<Option<(Property, Option<Index>)>> {
    let Some(context) = event.target().watch_context() else {
        return Ok(None);
    };
    let property = context.parent.property(&context.property)?;
    Ok(Some((property, context.index)))
}

fn sync_change(event: &Event) -> Result<()> {
    let Some((mut property, index)) = route(event)? else {
        return Ok(());
    };
    let value = event.target().to_value();
    trace!(property = %property.name(), index = ?index, "Propagating change");
    match index {
        Some(index) => property.set_value_at_index(index, value)?,
        None => property.set_value(value)?,
    };
    Ok(())
}

/// For a child bound to the whole value, the cleaned field is the slot.
fn slot_for(event: &Event, index: Option<Index>) -> Option<Index> {
    index.or_else(|| event.field().map(Index::from))
}

fn sync_clean(event: &Event) -> Result<()> {
    let Some((mut property, index)) = route(event)? else {
        return Ok(());
    };
    trace!(property = %property.name(), field = ?event.field(), "Propagating clean");
    match slot_for(event, index) {
        Some(slot) => property.clean_at_index(slot)?,
        None => property.clean()?,
    };
    Ok(())
}

fn sync_dirty(event: &Event) -> Result<()> {
    let Some((mut property, index)) = route(event)? else {
        return Ok(());
    };
    trace!(property = %property.name(), field = ?event.field(), "Propagating dirty");
    match slot_for(event, index) {
        Some(slot) => property.set_dirty_at_index(slot)?,
        None => property.set_dirty()?,
    };
    Ok(())
}
