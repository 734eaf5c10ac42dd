use crate::dashboard::catalog::{WidgetCatalog, WidgetId};
use crate::dashboard::config::{is_enabled, EnablementMap, GridSlot, LayoutEntry, LayoutList};
use crate::dashboard::layout::LayoutEngine;
use crate::dashboard::reorder::{DragReorderController, DragSession};
use crate::model::{Snapshots, TaskId};
use crate::notifications::{NotificationFeed, NotificationItem, LEISURE_BUDGET};
use crate::preferences::{PersistHandle, PrefKey, PreferenceStore, SubscriptionId, Theme};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DashboardEvent {
    /// A notification was activated; the host should switch to this route.
    Navigate(String),
    /// The urgent banner asked for a task's completion to flip. The task
    /// screen owns the task list and applies it.
    ToggleTask(TaskId),
    /// Preferences changed underneath the dashboard and were re-read.
    Reloaded,
}

pub type EventCallback = Arc<dyn Fn(DashboardEvent) + Send + Sync>;

/// A widget that should be drawn, with its grid slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibleWidget {
    pub id: WidgetId,
    #[serde(flatten)]
    pub slot: GridSlot,
}

/// One open dashboard: widget visibility, grid geometry, linear order and
/// the notification panel.
///
/// Remote preference loads arrive on other threads. They are queued by a
/// store subscription and applied on the next
/// [`Dashboard::poll_preference_changes`].
pub struct Dashboard {
    catalog: Arc<WidgetCatalog>,
    store: PreferenceStore,
    enablement: EnablementMap,
    layout: LayoutEngine,
    reorder: DragReorderController,
    feed: NotificationFeed,
    snapshots: Snapshots,
    panel_open: bool,
    theme: Theme,
    pending: Arc<Mutex<BTreeSet<PrefKey>>>,
    subscription: SubscriptionId,
    event_cb: Option<EventCallback>,
}

impl Dashboard {
    pub fn new(
        catalog: Arc<WidgetCatalog>,
        store: PreferenceStore,
        event_cb: Option<EventCallback>,
    ) -> Self {
        Self::with_leisure_budget(catalog, store, LEISURE_BUDGET, event_cb)
    }

    pub fn with_leisure_budget(
        catalog: Arc<WidgetCatalog>,
        store: PreferenceStore,
        leisure_budget: f64,
        event_cb: Option<EventCallback>,
    ) -> Self {
        let enablement = store.load_enablement(&catalog);
        let order = store.load_order(&catalog, &enablement);
        let layout = LayoutEngine::load(Arc::clone(&catalog), store.clone());
        let theme = store.load_theme();

        let pending = Arc::new(Mutex::new(BTreeSet::new()));
        let queue = Arc::clone(&pending);
        let subscription = store.subscribe(move |keys| {
            let mut queue = queue.lock().unwrap_or_else(PoisonError::into_inner);
            queue.extend(keys.iter().copied());
        });

        Self {
            reorder: DragReorderController::new(order, store.clone()),
            catalog,
            store,
            enablement,
            layout,
            feed: NotificationFeed::new(leisure_budget),
            snapshots: Snapshots::default(),
            panel_open: false,
            theme,
            pending,
            subscription,
            event_cb,
        }
    }

    fn emit(&self, event: DashboardEvent) {
        if let Some(cb) = &self.event_cb {
            (cb)(event);
        }
    }

    pub fn catalog(&self) -> &WidgetCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &PreferenceStore {
        &self.store
    }

    // --- notifications -------------------------------------------------

    /// Replace the snapshots the feed reads and recompute it.
    pub fn update_snapshots(&mut self, snapshots: Snapshots) -> &[NotificationItem] {
        self.snapshots = snapshots;
        self.feed.recompute(
            &self.snapshots.tasks,
            &self.snapshots.transactions,
            &self.snapshots.events,
        )
    }

    pub fn snapshots(&self) -> &Snapshots {
        &self.snapshots
    }

    pub fn notifications(&self) -> &[NotificationItem] {
        self.feed.items()
    }

    pub fn has_unread(&self) -> bool {
        self.feed.has_unread()
    }

    pub fn notifications_open(&self) -> bool {
        self.panel_open
    }

    /// Opening the panel acknowledges everything in it.
    pub fn open_notifications(&mut self) {
        self.panel_open = true;
        self.feed.mark_all_read();
    }

    pub fn close_notifications(&mut self) {
        self.panel_open = false;
    }

    pub fn toggle_notifications(&mut self) -> bool {
        if self.panel_open {
            self.close_notifications();
        } else {
            self.open_notifications();
        }
        self.panel_open
    }

    /// Follow a notification: close the panel and ask the host to navigate.
    /// Returns the route, or `None` for an id no longer in the feed.
    pub fn activate_notification(&mut self, id: &str) -> Option<String> {
        let target = self.feed.get(id)?.navigation_target.clone();
        self.panel_open = false;
        tracing::debug!(notification = id, route = %target, "notification activated");
        self.emit(DashboardEvent::Navigate(target.clone()));
        Some(target)
    }

    pub fn toggle_task(&self, id: TaskId) {
        self.emit(DashboardEvent::ToggleTask(id));
    }

    // --- widgets -------------------------------------------------------

    pub fn enablement(&self) -> &EnablementMap {
        &self.enablement
    }

    pub fn is_widget_enabled(&self, id: &str) -> bool {
        is_enabled(&self.enablement, &self.catalog, id)
    }

    /// Enabled widgets in display order, each with its current slot.
    pub fn visible_widgets(&self) -> Vec<VisibleWidget> {
        self.reorder
            .order()
            .iter()
            .filter(|id| self.is_widget_enabled(id.as_str()))
            .filter_map(|id| {
                self.layout.entry(id.as_str()).map(|e| VisibleWidget {
                    id: id.clone(),
                    slot: e.slot(),
                })
            })
            .collect()
    }

    /// True when the user switched every widget off; the host shows an
    /// empty-state prompt pointing at the widget settings.
    pub fn all_disabled(&self) -> bool {
        !self
            .catalog
            .ids()
            .any(|id| is_enabled(&self.enablement, &self.catalog, id.as_str()))
    }

    pub fn ordered_widgets(&self) -> &[WidgetId] {
        self.reorder.order()
    }

    pub fn toggle_widget(&mut self, id: &str) -> Option<PersistHandle> {
        let toggle = self.store.toggle_widget(&self.catalog, id)?;
        tracing::info!(widget = id, enabled = toggle.enabled, "widget visibility changed");
        self.enablement = toggle.enablement;
        self.reorder.replace_order(toggle.order);
        Some(toggle.persist)
    }

    // --- grid layout ---------------------------------------------------

    pub fn layout(&self) -> &[LayoutEntry] {
        self.layout.layout()
    }

    pub fn on_layout_change(&mut self, new_layout: LayoutList) -> PersistHandle {
        self.layout.apply_mutation(new_layout)
    }

    pub fn reset_layout(&mut self) -> &[LayoutEntry] {
        tracing::info!("dashboard layout reset to defaults");
        self.layout.reset()
    }

    // --- drag reorder --------------------------------------------------

    pub fn drag_session(&self) -> &DragSession {
        self.reorder.session()
    }

    pub fn drag_start(&mut self, id: &str) {
        self.reorder.drag_start(id);
    }

    pub fn drag_enter(&mut self, id: &str) {
        self.reorder.drag_enter(id);
    }

    pub fn drop_on(&mut self, target: &str) -> Option<PersistHandle> {
        self.reorder.drop_on(target)
    }

    pub fn drag_end(&mut self) {
        self.reorder.drag_end();
    }

    // --- preferences ---------------------------------------------------

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) -> PersistHandle {
        self.theme = theme;
        self.store.save_theme(theme)
    }

    /// Apply preference changes published since the last call. Returns the
    /// keys that were processed.
    pub fn poll_preference_changes(&mut self) -> Vec<PrefKey> {
        let keys: Vec<PrefKey> = {
            let mut queue = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *queue).into_iter().collect()
        };
        if keys.is_empty() {
            return keys;
        }
        let mut reloaded = false;
        if keys.contains(&PrefKey::EnabledWidgets) || keys.contains(&PrefKey::WidgetOrder) {
            self.enablement = self.store.load_enablement(&self.catalog);
            self.reorder
                .replace_order(self.store.load_order(&self.catalog, &self.enablement));
            reloaded = true;
        }
        if keys.contains(&PrefKey::DashboardLayout) {
            self.layout.reload();
            reloaded = true;
        }
        if keys.contains(&PrefKey::Theme) {
            self.theme = self.store.load_theme();
            reloaded = true;
        }
        if reloaded {
            tracing::debug!(?keys, "dashboard preferences reloaded");
            self.emit(DashboardEvent::Reloaded);
        }
        keys
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.store.unsubscribe(self.subscription);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Task, Transaction, TransactionKind};

    fn dashboard() -> Dashboard {
        Dashboard::new(WidgetCatalog::shared(), PreferenceStore::in_memory(), None)
    }

    #[test]
    fn defaults_show_enabled_widgets_in_catalog_order() {
        let dash = dashboard();
        let visible: Vec<_> = dash.visible_widgets().into_iter().map(|w| w.id).collect();
        assert_eq!(visible, WidgetCatalog::shared().default_order());
        assert!(!dash.is_widget_enabled("quickNotes"));
        assert!(!dash.all_disabled());
    }

    #[test]
    fn opening_panel_marks_read() {
        let mut dash = dashboard();
        dash.update_snapshots(Snapshots {
            tasks: vec![Task {
                id: 1,
                title: "Pay rent".into(),
                subtitle: String::new(),
                urgent: true,
                completed: false,
            }],
            transactions: vec![Transaction {
                kind: TransactionKind::Expense,
                category: "Lazer".into(),
                amount: 400.0,
            }],
            events: Vec::new(),
        });
        assert!(dash.has_unread());
        assert!(dash.toggle_notifications());
        assert!(!dash.has_unread());
        assert!(!dash.toggle_notifications());
    }

    #[test]
    fn activating_notification_navigates_and_closes() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let cb: EventCallback = Arc::new(move |e| sink.lock().unwrap().push(e));
        let mut dash = Dashboard::new(WidgetCatalog::shared(), PreferenceStore::in_memory(), Some(cb));
        dash.update_snapshots(Snapshots {
            tasks: vec![Task {
                id: 7,
                title: "Ship".into(),
                subtitle: String::new(),
                urgent: true,
                completed: false,
            }],
            ..Default::default()
        });
        dash.open_notifications();
        assert_eq!(dash.activate_notification("urgent-7").as_deref(), Some("/tasks"));
        assert!(!dash.notifications_open());
        assert!(dash.activate_notification("urgent-99").is_none());
        dash.toggle_task(7);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                DashboardEvent::Navigate("/tasks".into()),
                DashboardEvent::ToggleTask(7)
            ]
        );
    }

    #[test]
    fn toggling_widget_updates_order_membership() {
        let mut dash = dashboard();
        dash.toggle_widget("agenda").unwrap().wait();
        assert!(!dash.ordered_widgets().iter().any(|id| id == "agenda"));
        assert!(dash.visible_widgets().iter().all(|w| w.id != "agenda"));
        dash.toggle_widget("agenda").unwrap().wait();
        assert_eq!(dash.ordered_widgets().last().map(|id| id.as_str()), Some("agenda"));
        assert!(dash.toggle_widget("retired").is_none());
    }
}
