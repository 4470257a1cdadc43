//! Per-entity mutation notifications.
//!
//! Every entity keeps its own listener list. Delivery is synchronous and in
//! line with the mutating call. Business listeners run first, ordered by
//! priority (higher first, ties in registration order). Synchronization
//! listeners installed by the watch protocol form a separate tier that
//! always runs last, so it acts on the state business listeners leave behind.

use crate::Entity;
use indexmap::IndexMap;
use propdoc_types::{Result, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use tracing::warn;

/// The kinds of mutation an entity announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notification {
    /// A field's current value changed.
    Change,
    /// A field's persisted value was brought in line with its current value.
    Clean,
    /// A field was forced dirty.
    Dirty,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Change => f.write_str("change"),
            Self::Clean => f.write_str("clean"),
            Self::Dirty => f.write_str("dirty"),
        }
    }
}

/// Payload handed to every listener.
#[derive(Debug, Clone)]
pub struct Event {
    notification: Notification,
    target: Entity,
    params: IndexMap<String, Value>,
}

impl Event {
    pub(crate) fn for_field(notification: Notification, target: Entity, field: &str) -> Self {
        let mut params = IndexMap::new();
        params.insert("name".to_string(), Value::Text(field.to_string()));
        Self {
            notification,
            target,
            params,
        }
    }

    #[must_use]
    pub fn notification(&self) -> Notification {
        self.notification
    }

    /// The entity the notification was raised on.
    #[must_use]
    pub fn target(&self) -> &Entity {
        &self.target
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// The name of the field the notification is about.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.param("name").and_then(Value::as_str)
    }
}

/// A notification handler.
pub type Listener = Rc<dyn Fn(&Event) -> Result<()>>;

/// Handle returned by [`Entity::attach`], used to detach a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registration {
    id: ListenerId,
    notification: Notification,
    priority: i32,
    listener: Listener,
}

/// Ordered listener storage for one entity.
#[derive(Default)]
pub(crate) struct Listeners {
    business: Vec<Registration>,
    sync: Vec<Registration>,
    next_id: u64,
}

impl Listeners {
    fn next_id(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId(self.next_id)
    }

    pub(crate) fn attach(
        &mut self,
        notification: Notification,
        priority: i32,
        listener: Listener,
    ) -> ListenerId {
        let id = self.next_id();
        // Insert after every registration of equal or higher priority, which
        // keeps ties in registration order.
        let at = self
            .business
            .iter()
            .position(|r| r.priority < priority)
            .unwrap_or(self.business.len());
        self.business.insert(
            at,
            Registration {
                id,
                notification,
                priority,
                listener,
            },
        );
        id
    }

    pub(crate) fn attach_sync(&mut self, notification: Notification, listener: Listener) -> ListenerId {
        let id = self.next_id();
        self.sync.push(Registration {
            id,
            notification,
            priority: i32::MIN,
            listener,
        });
        id
    }

    pub(crate) fn detach(&mut self, id: ListenerId) -> bool {
        let before = self.business.len() + self.sync.len();
        self.business.retain(|r| r.id != id);
        self.sync.retain(|r| r.id != id);
        before != self.business.len() + self.sync.len()
    }

    pub(crate) fn has_sync(&self) -> bool {
        !self.sync.is_empty()
    }

    /// Snapshot of the listeners for one notification, in dispatch order.
    pub(crate) fn dispatch_plan(&self, notification: Notification) -> DispatchPlan {
        let pick = |regs: &[Registration]| {
            regs.iter()
                .filter(|r| r.notification == notification)
                .map(|r| r.listener.clone())
                .collect()
        };
        DispatchPlan {
            business: pick(self.business.as_slice()),
            sync: pick(self.sync.as_slice()),
        }
    }
}

/// Listeners captured before dispatch, so none of the entity's state is
/// borrowed while they run.
pub(crate) struct DispatchPlan {
    business: Vec<Listener>,
    sync: Vec<Listener>,
}

impl DispatchPlan {
    /// Runs the plan. Business listener failures are logged and skipped;
    /// a synchronization failure aborts dispatch and is returned.
    pub(crate) fn run(self, event: &Event) -> Result<()> {
        for listener in &self.business {
            if let Err(e) = listener(event) {
                warn!(
                    notification = %event.notification(),
                    field = event.field().unwrap_or_default(),
                    error = %e,
                    "Listener failed"
                );
            }
        }
        for listener in &self.sync {
            listener(event)?;
        }
        Ok(())
    }
}
