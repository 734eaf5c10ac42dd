use crate::dashboard::catalog::{WidgetCatalog, WidgetId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Column count of the dashboard grid.
pub const GRID_COLUMNS: u32 = 12;

/// Position and size of a widget in grid units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSlot {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl GridSlot {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
}

/// Persisted layout record. The id is stored under `i`, the key used by the
/// grid surface and the remote profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutEntry {
    #[serde(rename = "i")]
    pub id: WidgetId,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl LayoutEntry {
    pub fn new(id: WidgetId, slot: GridSlot) -> Self {
        Self {
            id,
            x: slot.x,
            y: slot.y,
            w: slot.w,
            h: slot.h,
        }
    }

    pub fn slot(&self) -> GridSlot {
        GridSlot::new(self.x, self.y, self.w, self.h)
    }
}

pub type LayoutList = Vec<LayoutEntry>;
pub type OrderList = Vec<WidgetId>;
/// Per-widget visibility overrides. Missing keys fall back to the catalog.
pub type EnablementMap = BTreeMap<WidgetId, bool>;

/// Read a stored layout, skipping entries that do not parse instead of
/// discarding the whole list.
pub fn parse_layout(value: &Value) -> LayoutList {
    let Some(items) = value.as_array() else {
        if !value.is_null() {
            tracing::warn!("stored dashboard layout is not a list; ignoring it");
        }
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match serde_json::from_value::<LayoutEntry>(item.clone()) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!("skipping malformed layout entry: {e}");
                None
            }
        })
        .collect()
}

/// Read a stored order list, keeping only string entries.
pub fn parse_order(value: &Value) -> OrderList {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(WidgetId::from))
                .collect()
        })
        .unwrap_or_default()
}

/// Read a stored enablement map, keeping only boolean values.
pub fn parse_enablement(value: &Value) -> EnablementMap {
    value
        .as_object()
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| v.as_bool().map(|b| (WidgetId::from(k.as_str()), b)))
                .collect()
        })
        .unwrap_or_default()
}

/// Complete enablement map for `catalog`: stored values win, unknown ids are
/// dropped, missing ids take the catalog default.
pub fn reconcile_enablement(stored: &EnablementMap, catalog: &WidgetCatalog) -> EnablementMap {
    catalog
        .definitions()
        .iter()
        .map(|def| {
            let enabled = stored.get(&def.id).copied().unwrap_or(def.default_enabled);
            (def.id.clone(), enabled)
        })
        .collect()
}

pub fn is_enabled(map: &EnablementMap, catalog: &WidgetCatalog, id: &str) -> bool {
    match map.get(id) {
        Some(enabled) => *enabled && catalog.contains(id),
        None => catalog.default_enabled(id),
    }
}

/// Order list holding every enabled widget exactly once.
///
/// Stored positions are kept for enabled widgets; duplicates, unknown and
/// disabled ids are removed; enabled widgets missing from `stored` are
/// appended in catalog order.
pub fn reconcile_order(
    stored: &[WidgetId],
    catalog: &WidgetCatalog,
    enablement: &EnablementMap,
) -> OrderList {
    let mut seen = HashSet::new();
    let mut order: OrderList = stored
        .iter()
        .filter(|id| is_enabled(enablement, catalog, id.as_str()))
        .filter(|id| seen.insert((*id).clone()))
        .cloned()
        .collect();
    for id in catalog.ids() {
        if is_enabled(enablement, catalog, id.as_str()) && seen.insert(id.clone()) {
            order.push(id.clone());
        }
    }
    order
}
