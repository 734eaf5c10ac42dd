//! Preference persistence: a local cache read synchronously at startup and
//! a remote profile record written best-effort in the background.
//!
//! Local writes happen before the remote write is issued. Remote writes are
//! fire-and-forget: each carries the full current value, failures are logged
//! and never roll back local state. A remote load replaces cached values
//! wholesale and notifies subscribers with the keys that changed.

pub mod local;
pub mod remote;
pub mod theme;

use crate::dashboard::catalog::{WidgetCatalog, WidgetId};
use crate::dashboard::config::{
    parse_enablement, parse_layout, parse_order, reconcile_enablement, reconcile_order,
    EnablementMap, LayoutEntry, LayoutList, OrderList,
};
use crate::dashboard::layout::merge_layout;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

pub use local::LocalCache;
pub use remote::{
    HttpProfileStore, MemoryProfileStore, NotificationPreferences, PersistHandle, ProfileRecord,
    ProfileUpdate, RemoteProfileStore,
};
pub use theme::{Appearance, Theme};

/// Named preference slots in the local cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrefKey {
    EnabledWidgets,
    WidgetOrder,
    DashboardLayout,
    Theme,
    UserName,
    UserEmail,
    UserBio,
    UserLocation,
    ProfileImage,
    EmailNotifications,
    PushNotifications,
    TaskReminders,
    WeeklyReport,
}

impl PrefKey {
    pub const ALL: [PrefKey; 13] = [
        PrefKey::EnabledWidgets,
        PrefKey::WidgetOrder,
        PrefKey::DashboardLayout,
        PrefKey::Theme,
        PrefKey::UserName,
        PrefKey::UserEmail,
        PrefKey::UserBio,
        PrefKey::UserLocation,
        PrefKey::ProfileImage,
        PrefKey::EmailNotifications,
        PrefKey::PushNotifications,
        PrefKey::TaskReminders,
        PrefKey::WeeklyReport,
    ];

    pub fn cache_key(&self) -> &'static str {
        match self {
            PrefKey::EnabledWidgets => "enabledWidgets",
            PrefKey::WidgetOrder => "widgetOrder",
            PrefKey::DashboardLayout => "widgetLayout",
            PrefKey::Theme => "theme",
            PrefKey::UserName => "userName",
            PrefKey::UserEmail => "userEmail",
            PrefKey::UserBio => "userBio",
            PrefKey::UserLocation => "userLocation",
            PrefKey::ProfileImage => "profileImage",
            PrefKey::EmailNotifications => "emailNotifications",
            PrefKey::PushNotifications => "pushNotifications",
            PrefKey::TaskReminders => "taskReminders",
            PrefKey::WeeklyReport => "weeklyReport",
        }
    }
}

/// Session keys that are not preferences but must not outlive a sign-out,
/// including names used by older releases.
pub const SESSION_KEYS: &[&str] = &[
    "isAuthenticated",
    "twoFactorEnabled",
    "widgetLayout_v3",
    "dashboardLayout",
    "dashboardOrder",
];

/// Every local key removed on sign-out.
pub fn sign_out_keys() -> impl Iterator<Item = &'static str> {
    PrefKey::ALL
        .into_iter()
        .map(|k| k.cache_key())
        .chain(SESSION_KEYS.iter().copied())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDetails {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub avatar_url: Option<String>,
}

/// Result of enabling or disabling a widget.
#[derive(Debug)]
pub struct WidgetToggle {
    pub enabled: bool,
    pub enablement: EnablementMap,
    pub order: OrderList,
    pub persist: PersistHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&[PrefKey]) + Send + Sync>;

struct StoreInner {
    cache: Mutex<LocalCache>,
    remote: Option<Arc<dyn RemoteProfileStore>>,
    user_id: RwLock<Option<String>>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_subscription: AtomicU64,
}

/// Shared handle to the preference namespace. Clones refer to the same
/// cache, remote and listener list.
#[derive(Clone)]
pub struct PreferenceStore {
    inner: Arc<StoreInner>,
}

impl PreferenceStore {
    pub fn new(cache: LocalCache, remote: Option<Arc<dyn RemoteProfileStore>>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                cache: Mutex::new(cache),
                remote,
                user_id: RwLock::new(None),
                listeners: Mutex::new(Vec::new()),
                next_subscription: AtomicU64::new(1),
            }),
        }
    }

    /// Store without a backing file or remote.
    pub fn in_memory() -> Self {
        Self::new(LocalCache::in_memory(), None)
    }

    pub fn set_user(&self, user_id: Option<String>) {
        *self
            .inner
            .user_id
            .write()
            .unwrap_or_else(PoisonError::into_inner) = user_id;
    }

    pub fn user_id(&self) -> Option<String> {
        self.inner
            .user_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn cache(&self) -> MutexGuard<'_, LocalCache> {
        self.inner
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn has_local(&self, key: PrefKey) -> bool {
        self.cache().contains(key.cache_key())
    }

    /// Read a cache entry outside the preference set (daily content etc).
    pub fn get_local<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.cache().get(key)
    }

    /// Write a cache entry outside the preference set. Never synced remotely.
    pub fn set_local<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        match self.cache().set(key, value) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(key, "failed to write local cache: {e:#}");
                false
            }
        }
    }

    fn read_raw(&self, key: PrefKey) -> Value {
        self.cache()
            .get_raw(key.cache_key())
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn write_local<T: Serialize + ?Sized>(&self, key: PrefKey, value: &T) {
        if let Err(e) = self.cache().set(key.cache_key(), value) {
            tracing::error!(preference = key.cache_key(), "failed to write local cache: {e:#}");
        }
    }

    fn push_remote(&self, update: ProfileUpdate, what: &'static str) -> PersistHandle {
        let Some(remote) = self.inner.remote.clone() else {
            return PersistHandle::none();
        };
        let Some(user_id) = self.user_id() else {
            tracing::debug!(preference = what, "no signed-in user; skipping remote save");
            return PersistHandle::none();
        };
        remote::spawn_upsert(remote, user_id, update, what)
    }

    pub fn load_enablement(&self, catalog: &WidgetCatalog) -> EnablementMap {
        let stored = parse_enablement(&self.read_raw(PrefKey::EnabledWidgets));
        reconcile_enablement(&stored, catalog)
    }

    pub fn save_enablement(&self, enablement: &EnablementMap) -> PersistHandle {
        self.write_local(PrefKey::EnabledWidgets, enablement);
        let update = ProfileUpdate {
            enabled_widgets: serde_json::to_value(enablement).ok(),
            ..Default::default()
        };
        let handle = self.push_remote(update, "enabled_widgets");
        self.publish(&[PrefKey::EnabledWidgets]);
        handle
    }

    pub fn load_order(&self, catalog: &WidgetCatalog, enablement: &EnablementMap) -> OrderList {
        let stored = parse_order(&self.read_raw(PrefKey::WidgetOrder));
        reconcile_order(&stored, catalog, enablement)
    }

    pub fn save_order(&self, order: &[WidgetId]) -> PersistHandle {
        self.write_local(PrefKey::WidgetOrder, order);
        let update = ProfileUpdate {
            widgets_order: serde_json::to_value(order).ok(),
            ..Default::default()
        };
        let handle = self.push_remote(update, "widgets_order");
        self.publish(&[PrefKey::WidgetOrder]);
        handle
    }

    pub fn load_layout(&self, catalog: &WidgetCatalog) -> LayoutList {
        let stored = parse_layout(&self.read_raw(PrefKey::DashboardLayout));
        merge_layout(&stored, catalog)
    }

    pub fn save_layout(&self, layout: &[LayoutEntry]) -> PersistHandle {
        self.write_local(PrefKey::DashboardLayout, layout);
        let update = ProfileUpdate {
            dashboard_layout: serde_json::to_value(layout).ok(),
            ..Default::default()
        };
        let handle = self.push_remote(update, "dashboard_layout");
        self.publish(&[PrefKey::DashboardLayout]);
        handle
    }

    /// Forget the cached layout. The remote copy is left alone and wins again
    /// on the next remote load.
    pub fn clear_layout(&self) {
        if let Err(e) = self.cache().remove(PrefKey::DashboardLayout.cache_key()) {
            tracing::error!("failed to clear cached layout: {e:#}");
        }
        self.publish(&[PrefKey::DashboardLayout]);
    }

    pub fn load_theme(&self) -> Theme {
        match self.read_raw(PrefKey::Theme) {
            Value::String(s) => s.parse().unwrap_or_else(|e| {
                tracing::warn!("{e}; using default theme");
                Theme::default()
            }),
            _ => Theme::default(),
        }
    }

    pub fn save_theme(&self, theme: Theme) -> PersistHandle {
        self.write_local(PrefKey::Theme, theme.as_str());
        let update = ProfileUpdate {
            theme: Some(theme.as_str().to_string()),
            ..Default::default()
        };
        let handle = self.push_remote(update, "theme");
        self.publish(&[PrefKey::Theme]);
        handle
    }

    fn read_flag(&self, key: PrefKey) -> bool {
        // Anything but an explicit false counts as enabled.
        match self.read_raw(key) {
            Value::Bool(b) => b,
            Value::String(s) => s != "false",
            _ => true,
        }
    }

    pub fn load_notification_preferences(&self) -> NotificationPreferences {
        NotificationPreferences {
            email: self.read_flag(PrefKey::EmailNotifications),
            push: self.read_flag(PrefKey::PushNotifications),
            task_reminders: self.read_flag(PrefKey::TaskReminders),
            weekly_report: self.read_flag(PrefKey::WeeklyReport),
        }
    }

    pub fn save_notification_preferences(&self, prefs: NotificationPreferences) -> PersistHandle {
        self.write_local(PrefKey::EmailNotifications, &prefs.email);
        self.write_local(PrefKey::PushNotifications, &prefs.push);
        self.write_local(PrefKey::TaskReminders, &prefs.task_reminders);
        self.write_local(PrefKey::WeeklyReport, &prefs.weekly_report);
        let update = ProfileUpdate {
            notifications_preferences: Some(prefs),
            ..Default::default()
        };
        let handle = self.push_remote(update, "notifications_preferences");
        self.publish(&[
            PrefKey::EmailNotifications,
            PrefKey::PushNotifications,
            PrefKey::TaskReminders,
            PrefKey::WeeklyReport,
        ]);
        handle
    }

    pub fn load_profile_details(&self) -> ProfileDetails {
        let cache = self.cache();
        ProfileDetails {
            full_name: cache.get(PrefKey::UserName.cache_key()),
            email: cache.get(PrefKey::UserEmail.cache_key()),
            bio: cache.get(PrefKey::UserBio.cache_key()),
            location: cache.get(PrefKey::UserLocation.cache_key()),
            avatar_url: cache.get(PrefKey::ProfileImage.cache_key()),
        }
    }

    pub fn save_profile_details(&self, details: &ProfileDetails) -> PersistHandle {
        let fields = [
            (PrefKey::UserName, &details.full_name),
            (PrefKey::UserEmail, &details.email),
            (PrefKey::UserBio, &details.bio),
            (PrefKey::UserLocation, &details.location),
            (PrefKey::ProfileImage, &details.avatar_url),
        ];
        for (key, value) in fields {
            match value {
                Some(v) => self.write_local(key, v),
                None => {
                    if let Err(e) = self.cache().remove(key.cache_key()) {
                        tracing::error!(preference = key.cache_key(), "failed to clear: {e:#}");
                    }
                }
            }
        }
        let update = ProfileUpdate {
            full_name: details.full_name.clone(),
            email: details.email.clone(),
            bio: details.bio.clone(),
            location: details.location.clone(),
            avatar_url: details.avatar_url.clone(),
            ..Default::default()
        };
        let handle = self.push_remote(update, "profile");
        self.publish(&[
            PrefKey::UserName,
            PrefKey::UserEmail,
            PrefKey::UserBio,
            PrefKey::UserLocation,
            PrefKey::ProfileImage,
        ]);
        handle
    }

    /// Flip a widget's visibility and keep the order list in step: a widget
    /// that becomes visible joins the end of the order, a hidden one leaves
    /// it. Returns `None` for ids the catalog does not know.
    pub fn toggle_widget(&self, catalog: &WidgetCatalog, id: &str) -> Option<WidgetToggle> {
        let def = catalog.get(id)?;
        let mut enablement = self.load_enablement(catalog);
        let current_order = self.load_order(catalog, &enablement);
        let enabled = !enablement.get(&def.id).copied().unwrap_or(def.default_enabled);
        enablement.insert(def.id.clone(), enabled);
        let order = reconcile_order(&current_order, catalog, &enablement);

        self.write_local(PrefKey::EnabledWidgets, &enablement);
        self.write_local(PrefKey::WidgetOrder, &order);
        let update = ProfileUpdate {
            enabled_widgets: serde_json::to_value(&enablement).ok(),
            widgets_order: serde_json::to_value(&order).ok(),
            ..Default::default()
        };
        let persist = self.push_remote(update, "enabled_widgets");
        self.publish(&[PrefKey::EnabledWidgets, PrefKey::WidgetOrder]);
        Some(WidgetToggle {
            enabled,
            enablement,
            order,
            persist,
        })
    }

    /// Copy a fetched profile into the local cache. Returns the keys whose
    /// cached value changed.
    pub fn apply_profile(&self, record: &ProfileRecord) -> Vec<PrefKey> {
        let mut staged: Vec<(PrefKey, Value)> = Vec::new();
        let text_fields = [
            (PrefKey::UserName, &record.full_name),
            (PrefKey::UserEmail, &record.email),
            (PrefKey::UserBio, &record.bio),
            (PrefKey::UserLocation, &record.location),
            (PrefKey::ProfileImage, &record.avatar_url),
        ];
        for (key, value) in text_fields {
            if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                staged.push((key, Value::String(v.to_string())));
            }
        }
        if let Some(theme) = &record.theme {
            match theme.parse::<Theme>() {
                Ok(t) => staged.push((PrefKey::Theme, Value::String(t.as_str().into()))),
                Err(e) => tracing::warn!("ignoring remote theme: {e}"),
            }
        }
        match &record.enabled_widgets {
            Some(v @ Value::Object(_)) => staged.push((PrefKey::EnabledWidgets, v.clone())),
            Some(Value::Null) | None => {}
            Some(_) => tracing::warn!("ignoring malformed remote enabled_widgets"),
        }
        match &record.dashboard_layout {
            Some(v @ Value::Array(_)) => staged.push((PrefKey::DashboardLayout, v.clone())),
            Some(Value::Null) | None => {}
            Some(_) => tracing::warn!("ignoring malformed remote dashboard_layout"),
        }
        match &record.widgets_order {
            Some(v @ Value::Array(_)) => staged.push((PrefKey::WidgetOrder, v.clone())),
            Some(Value::Null) | None => {}
            Some(_) => tracing::warn!("ignoring malformed remote widgets_order"),
        }
        if let Some(prefs) = &record.notifications_preferences {
            staged.push((PrefKey::EmailNotifications, Value::Bool(prefs.email)));
            staged.push((PrefKey::PushNotifications, Value::Bool(prefs.push)));
            staged.push((PrefKey::TaskReminders, Value::Bool(prefs.task_reminders)));
            staged.push((PrefKey::WeeklyReport, Value::Bool(prefs.weekly_report)));
        }

        let mut changed = Vec::new();
        let mut cache = self.cache();
        for (key, value) in staged {
            if cache.get_raw(key.cache_key()) == Some(&value) {
                continue;
            }
            if let Err(e) = cache.set_raw(key.cache_key(), value) {
                tracing::error!(preference = key.cache_key(), "failed to cache remote value: {e:#}");
                continue;
            }
            changed.push(key);
        }
        changed
    }

    /// Fetch the signed-in user's profile and overwrite cached preferences
    /// with it. Failures leave the cache untouched.
    pub fn sync_from_remote(&self) -> Vec<PrefKey> {
        let (Some(remote), Some(user_id)) = (self.inner.remote.clone(), self.user_id()) else {
            return Vec::new();
        };
        let record = match remote.fetch_profile(&user_id) {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::debug!(user = %user_id, "no remote profile yet");
                return Vec::new();
            }
            Err(e) => {
                tracing::error!("error fetching profile: {e:#}");
                return Vec::new();
            }
        };
        let changed = self.apply_profile(&record);
        if !changed.is_empty() {
            tracing::info!(count = changed.len(), "preferences updated from remote profile");
            self.publish(&changed);
        }
        changed
    }

    /// Run [`Self::sync_from_remote`] on a background thread.
    pub fn spawn_sync_from_remote(&self) -> PersistHandle {
        let store = self.clone();
        remote::spawn_task("profile-sync", move || {
            store.sync_from_remote();
        })
    }

    pub fn subscribe(&self, listener: impl Fn(&[PrefKey]) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_subscription.fetch_add(1, Ordering::SeqCst));
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(sid, _)| *sid != id);
    }

    /// Tell subscribers that `keys` changed underneath them.
    pub fn publish(&self, keys: &[PrefKey]) {
        if keys.is_empty() {
            return;
        }
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(keys);
        }
    }

    /// Remove every enumerated key from the local cache and forget the user.
    /// Keys outside the list (daily content) stay.
    pub fn sign_out(&self) -> usize {
        let removed = match self.cache().remove_many(sign_out_keys()) {
            Ok(n) => n,
            Err(e) => {
                tracing::error!("failed to clear local cache on sign-out: {e:#}");
                0
            }
        };
        self.set_user(None);
        self.publish(&PrefKey::ALL);
        removed
    }
}
