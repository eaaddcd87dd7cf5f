//! Insertion-ordered work item collections.
//!
//! A collection publishes its contents through a `watch` channel. Every
//! mutation builds the next sequence from the current one and publishes it
//! in a single step, so subscribers only ever observe whole snapshots.
//!
//! Timers never hold a collection directly. They hold a [`WeakCollection`]
//! and skip their mutation once the owning pipeline has been dropped.

use std::sync::{Arc, Weak};

use tokio::sync::watch;
use tracing::trace;
use uuid::Uuid;

use deepguard_core::logging::{COLLECTION_LEN, ITEM_KIND};
use deepguard_core::WorkItem;

struct Shared<T> {
    tx: watch::Sender<Vec<T>>,
    capacity: Option<usize>,
}

/// An owned, ordered collection of one item kind.
pub struct ItemCollection<T: WorkItem> {
    shared: Arc<Shared<T>>,
}

impl<T: WorkItem> ItemCollection<T> {
    /// Unbounded collection.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Collection keeping at most `capacity` items (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self::build(Some(capacity.max(1)))
    }

    fn build(capacity: Option<usize>) -> Self {
        let (tx, _) = watch::channel(Vec::new());
        Self {
            shared: Arc::new(Shared { tx, capacity }),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.shared.capacity
    }

    /// Weak handle for scheduled callbacks.
    pub fn downgrade(&self) -> WeakCollection<T> {
        WeakCollection {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Vec<T>> {
        self.shared.tx.subscribe()
    }

    /// Copy of the current items, in order.
    pub fn snapshot(&self) -> Vec<T> {
        self.shared.tx.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.shared.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: Uuid) -> Option<T> {
        self.shared.tx.borrow().iter().find(|i| i.id() == id).cloned()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.shared.tx.borrow().iter().any(|i| i.id() == id)
    }

    /// Build the next sequence from the current one and publish it.
    ///
    /// `build` returns `None` to leave the collection untouched. Returns
    /// whether a new snapshot was published.
    pub fn publish<F>(&self, build: F) -> bool
    where
        F: FnOnce(&[T]) -> Option<Vec<T>>,
    {
        let changed = self.shared.tx.send_if_modified(|items| match build(items) {
            Some(next) => {
                *items = next;
                true
            }
            None => false,
        });
        if changed {
            trace!(
                { ITEM_KIND } = T::KIND.as_str(),
                { COLLECTION_LEN } = self.len(),
                "Collection published"
            );
        }
        changed
    }

    /// Append an item. Duplicate ids are ignored.
    pub fn push_back(&self, item: T) -> bool {
        trace!(
            { ITEM_KIND } = T::KIND.as_str(),
            name = item.display_name(),
            "Appending item"
        );
        self.publish(|current| {
            if current.iter().any(|i| i.id() == item.id()) {
                return None;
            }
            let mut next = current.to_vec();
            next.push(item);
            Some(next)
        })
    }

    /// Prepend an item, truncating to capacity. Returns the items dropped
    /// off the end.
    pub fn push_front(&self, item: T) -> Vec<T> {
        let capacity = self.shared.capacity;
        let mut dropped = Vec::new();
        self.publish(|current| {
            if current.iter().any(|i| i.id() == item.id()) {
                return None;
            }
            let mut next = Vec::with_capacity(current.len() + 1);
            next.push(item);
            next.extend_from_slice(current);
            if let Some(cap) = capacity {
                if next.len() > cap {
                    dropped = next.split_off(cap);
                }
            }
            Some(next)
        });
        dropped
    }

    /// Apply `change` to a copy of the item with `id` and publish it if
    /// `change` reports a modification. Unknown ids are a no-op.
    pub fn update<F>(&self, id: Uuid, change: F) -> bool
    where
        F: FnOnce(&mut T) -> bool,
    {
        self.publish(|current| {
            let idx = current.iter().position(|i| i.id() == id)?;
            let mut item = current[idx].clone();
            if !change(&mut item) {
                return None;
            }
            let mut next = current.to_vec();
            next[idx] = item;
            Some(next)
        })
    }

    /// Remove the item with `id`. Unknown ids are a no-op.
    pub fn remove(&self, id: Uuid) -> bool {
        self.publish(|current| {
            if !current.iter().any(|i| i.id() == id) {
                return None;
            }
            Some(current.iter().filter(|i| i.id() != id).cloned().collect())
        })
    }
}

impl<T: WorkItem> Default for ItemCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-owning handle used by timers to check liveness.
pub struct WeakCollection<T: WorkItem> {
    shared: Weak<Shared<T>>,
}

impl<T: WorkItem> WeakCollection<T> {
    /// The collection, if its owner is still alive.
    pub fn upgrade(&self) -> Option<ItemCollection<T>> {
        self.shared.upgrade().map(|shared| ItemCollection { shared })
    }
}

impl<T: WorkItem> Clone for WeakCollection<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}
