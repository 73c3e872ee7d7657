//! Registry of all classes created during a build.
//!
//! The registry owns every top-level [`MetaClass`] through a strong reference and assigns each
//! class a sequence number in creation order. Inner classes are additionally owned by their
//! enclosing class, the registry indexes them as well so that lookups by name or entry find
//! them.
//!
//! # Thread Safety
//!
//! Primary storage is a `SkipMap` keyed by sequence number and the name index is a `DashMap`, so
//! lookups from several threads are safe while a build is in progress.

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;

use crate::{
    meta::{MetaClass, MetaClassRc},
    typesystem::TypeEntryRc,
};

/// Insertion-ordered class registry with a qualified-name index.
pub struct MetaClassRegistry {
    classes: SkipMap<u32, MetaClassRc>,
    next_id: AtomicU32,
    classes_by_name: DashMap<String, Vec<u32>>,
}

impl Default for MetaClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaClassRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        MetaClassRegistry {
            classes: SkipMap::new(),
            next_id: AtomicU32::new(0),
            classes_by_name: DashMap::new(),
        }
    }

    /// Register a class. A class already present (same allocation) is not added twice.
    ///
    /// ## Arguments
    /// * 'class' - The class to register
    pub fn insert(&self, class: &MetaClassRc) {
        if self.contains(class) {
            return;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.classes.insert(id, class.clone());
        self.classes_by_name
            .entry(class.qualified_name().to_string())
            .or_default()
            .push(id);
    }

    /// Remove a class. Returns true if it was registered.
    pub fn remove(&self, class: &MetaClassRc) -> bool {
        let Some(id) = self
            .classes
            .iter()
            .find(|entry| Arc::ptr_eq(entry.value(), class))
            .map(|entry| *entry.key())
        else {
            return false;
        };

        self.classes.remove(&id);
        if let Some(mut ids) = self.classes_by_name.get_mut(class.qualified_name()) {
            ids.retain(|other| *other != id);
        }
        true
    }

    /// Returns true if `class` is registered.
    #[must_use]
    pub fn contains(&self, class: &MetaClass) -> bool {
        self.classes_by_name
            .get(class.qualified_name())
            .is_some_and(|ids| {
                ids.iter().any(|id| {
                    self.classes
                        .get(id)
                        .is_some_and(|entry| std::ptr::eq(Arc::as_ptr(entry.value()), class))
                })
            })
    }

    /// First class registered under `qualified_name`.
    #[must_use]
    pub fn find_by_name(&self, qualified_name: &str) -> Option<MetaClassRc> {
        let ids = self.classes_by_name.get(qualified_name)?;
        ids.iter()
            .find_map(|id| self.classes.get(id).map(|entry| entry.value().clone()))
    }

    /// Class created for `entry`.
    #[must_use]
    pub fn find_by_entry(&self, entry: &TypeEntryRc) -> Option<MetaClassRc> {
        let ids = self.classes_by_name.get(entry.name())?;
        ids.iter().find_map(|id| {
            self.classes
                .get(id)
                .map(|item| item.value().clone())
                .filter(|class| Arc::ptr_eq(class.type_entry(), entry))
        })
    }

    /// All classes in registration order.
    #[must_use]
    pub fn all(&self) -> Vec<MetaClassRc> {
        self.classes
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Number of classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns true if no class is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typesystem::TypeEntry;

    fn class(entry: &TypeEntryRc) -> MetaClassRc {
        Arc::new(MetaClass::new(entry.clone(), Vec::new(), Vec::new()))
    }

    #[test]
    fn test_insert_and_find() {
        let registry = MetaClassRegistry::new();
        let entry = Arc::new(TypeEntry::object("Gui::Widget"));
        let widget = class(&entry);

        registry.insert(&widget);
        registry.insert(&widget);
        assert_eq!(registry.len(), 1);
        assert!(Arc::ptr_eq(&registry.find_by_name("Gui::Widget").unwrap(), &widget));
        assert!(Arc::ptr_eq(&registry.find_by_entry(&entry).unwrap(), &widget));

        let other_entry = Arc::new(TypeEntry::object("Gui::Widget"));
        assert!(registry.find_by_entry(&other_entry).is_none());
    }

    #[test]
    fn test_order_and_removal() {
        let registry = MetaClassRegistry::new();
        let first = class(&Arc::new(TypeEntry::value("B")));
        let second = class(&Arc::new(TypeEntry::value("A")));
        registry.insert(&first);
        registry.insert(&second);

        let names: Vec<String> = registry
            .all()
            .iter()
            .map(|c| c.qualified_name().to_string())
            .collect();
        assert_eq!(names, vec!["B", "A"]);

        assert!(registry.remove(&first));
        assert!(!registry.remove(&first));
        assert!(registry.find_by_name("B").is_none());
        assert_eq!(registry.len(), 1);
    }
}
