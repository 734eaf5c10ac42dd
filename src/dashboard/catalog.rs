use crate::dashboard::config::{EnablementMap, GridSlot, LayoutEntry, LayoutList};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Stable key of a widget type. Used to join layout, order and enablement
/// records across sessions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetId(String);

impl WidgetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WidgetId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for WidgetId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for WidgetId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for WidgetId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for WidgetId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Application state a widget reads when it renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Tasks,
    Transactions,
    Events,
    Pomodoros,
    Profile,
    LocalCache,
    Network,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WidgetDefinition {
    pub id: WidgetId,
    pub default_enabled: bool,
    pub default_slot: GridSlot,
    pub default_order_index: usize,
    pub capabilities: Vec<Capability>,
}

impl WidgetDefinition {
    pub fn new(id: &str, default_enabled: bool, default_slot: GridSlot) -> Self {
        Self {
            id: WidgetId::from(id),
            default_enabled,
            default_slot,
            default_order_index: 0,
            capabilities: Vec::new(),
        }
    }

    pub fn with_order(mut self, index: usize) -> Self {
        self.default_order_index = index;
        self
    }

    pub fn with_capabilities(mut self, caps: &[Capability]) -> Self {
        self.capabilities = caps.to_vec();
        self
    }

    pub fn needs(&self, cap: Capability) -> bool {
        self.capabilities.contains(&cap)
    }

    pub fn default_entry(&self) -> LayoutEntry {
        LayoutEntry::new(self.id.clone(), self.default_slot)
    }
}

static DEFAULT_CATALOG: Lazy<Arc<WidgetCatalog>> = Lazy::new(|| Arc::new(WidgetCatalog::with_defaults()));

/// Registry of every known widget and its defaults. Definitions are kept in
/// default order, which is also the serialization order of layouts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetCatalog {
    widgets: Vec<WidgetDefinition>,
}

impl WidgetCatalog {
    /// Process-wide catalog shipped with the application.
    pub fn shared() -> Arc<WidgetCatalog> {
        Arc::clone(&DEFAULT_CATALOG)
    }

    pub fn with_defaults() -> Self {
        use Capability::*;
        let mut reg = Self::default();
        let defs = [
            ("urgentBanner", true, GridSlot::new(0, 0, 12, 2), vec![Tasks]),
            ("productivityChart", true, GridSlot::new(0, 2, 6, 4), vec![Tasks]),
            ("tasksToday", true, GridSlot::new(6, 2, 6, 4), vec![Tasks]),
            ("agenda", true, GridSlot::new(0, 6, 6, 4), vec![Events]),
            (
                "aiAssistant",
                true,
                GridSlot::new(6, 6, 6, 4),
                vec![Tasks, Transactions, Events, Profile, Network],
            ),
            ("financialSummary", true, GridSlot::new(0, 10, 6, 3), vec![Transactions]),
            ("motivationalQuote", true, GridSlot::new(6, 10, 6, 3), vec![LocalCache]),
            ("quickStats", true, GridSlot::new(0, 13, 6, 4), vec![Tasks, Events]),
            ("dailyGoal", false, GridSlot::new(6, 13, 6, 3), vec![LocalCache]),
            ("pomodoroTimer", false, GridSlot::new(0, 17, 6, 3), vec![Pomodoros]),
            ("streak", true, GridSlot::new(6, 17, 3, 3), vec![Tasks, LocalCache]),
            ("weeklyProgress", true, GridSlot::new(9, 17, 3, 4), vec![Tasks]),
            ("weather", true, GridSlot::new(0, 20, 3, 3), vec![Profile, Network]),
            ("quickNotes", false, GridSlot::new(3, 20, 6, 3), vec![LocalCache]),
            (
                "achievements",
                true,
                GridSlot::new(9, 20, 3, 4),
                vec![Tasks, Transactions, Events, Pomodoros],
            ),
        ];
        for (index, (id, enabled, slot, caps)) in defs.into_iter().enumerate() {
            reg.register(
                WidgetDefinition::new(id, enabled, slot)
                    .with_order(index)
                    .with_capabilities(&caps),
            );
        }
        reg
    }

    pub fn new(widgets: Vec<WidgetDefinition>) -> Self {
        let mut reg = Self::default();
        for def in widgets {
            reg.register(def);
        }
        reg
    }

    /// Add a definition, replacing any existing one with the same id.
    pub fn register(&mut self, def: WidgetDefinition) {
        self.widgets.retain(|w| w.id != def.id);
        let pos = self
            .widgets
            .partition_point(|w| w.default_order_index <= def.default_order_index);
        self.widgets.insert(pos, def);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&WidgetDefinition> {
        self.widgets.iter().find(|w| w.id == id)
    }

    pub fn definitions(&self) -> &[WidgetDefinition] {
        &self.widgets
    }

    pub fn ids(&self) -> impl Iterator<Item = &WidgetId> {
        self.widgets.iter().map(|w| &w.id)
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn default_layout(&self) -> LayoutList {
        self.widgets.iter().map(|w| w.default_entry()).collect()
    }

    pub fn default_enablement(&self) -> EnablementMap {
        self.widgets
            .iter()
            .map(|w| (w.id.clone(), w.default_enabled))
            .collect()
    }

    /// Default order containing only the widgets enabled out of the box.
    pub fn default_order(&self) -> Vec<WidgetId> {
        self.widgets
            .iter()
            .filter(|w| w.default_enabled)
            .map(|w| w.id.clone())
            .collect()
    }

    pub fn default_enabled(&self, id: &str) -> bool {
        self.get(id).map(|w| w.default_enabled).unwrap_or(false)
    }
}
