use crate::dashboard::catalog::WidgetCatalog;
use crate::dashboard::config::{LayoutEntry, LayoutList};
use crate::preferences::{PersistHandle, PreferenceStore};
use std::sync::Arc;

/// Merge a stored layout against the catalog.
///
/// Every catalog widget gets exactly one entry: the stored one when present,
/// the catalog default otherwise. Stored entries for unknown widgets are
/// dropped. The result follows catalog order.
pub fn merge_layout(stored: &[LayoutEntry], catalog: &WidgetCatalog) -> LayoutList {
    let merged: LayoutList = catalog
        .definitions()
        .iter()
        .map(|def| {
            stored
                .iter()
                .find(|e| e.id == def.id)
                .cloned()
                .unwrap_or_else(|| def.default_entry())
        })
        .collect();
    let dropped = stored.iter().filter(|e| !catalog.contains(e.id.as_str())).count();
    if dropped > 0 {
        tracing::debug!(dropped, "stale layout entries dropped during merge");
    }
    merged
}

/// Owner of the grid geometry for the current session.
pub struct LayoutEngine {
    catalog: Arc<WidgetCatalog>,
    store: PreferenceStore,
    layout: LayoutList,
}

impl LayoutEngine {
    /// Load the layout from the preference store and merge it against the
    /// catalog.
    pub fn load(catalog: Arc<WidgetCatalog>, store: PreferenceStore) -> Self {
        let layout = store.load_layout(&catalog);
        Self {
            catalog,
            store,
            layout,
        }
    }

    /// Build an engine from an explicit stored layout.
    pub fn initialize(
        stored: &[LayoutEntry],
        catalog: Arc<WidgetCatalog>,
        store: PreferenceStore,
    ) -> Self {
        let layout = merge_layout(stored, &catalog);
        Self {
            catalog,
            store,
            layout,
        }
    }

    pub fn layout(&self) -> &[LayoutEntry] {
        &self.layout
    }

    pub fn entry(&self, id: &str) -> Option<&LayoutEntry> {
        self.layout.iter().find(|e| e.id == id)
    }

    /// Replace the whole layout with what the grid surface reported. No
    /// overlap or bounds checks happen here; the surface compacts vertically.
    pub fn apply_mutation(&mut self, new_layout: LayoutList) -> PersistHandle {
        self.layout = new_layout;
        self.store.save_layout(&self.layout)
    }

    /// Drop all customization and go back to the catalog slots.
    pub fn reset(&mut self) -> &[LayoutEntry] {
        self.layout = self.catalog.default_layout();
        self.store.clear_layout();
        &self.layout
    }

    /// Re-read the layout after the store received newer data.
    pub fn reload(&mut self) {
        self.layout = self.store.load_layout(&self.catalog);
    }
}
