use crate::settings::RemoteSettings;
use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// Flags missing from a stored object count as enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationPreferences {
    pub email: bool,
    pub push: bool,
    pub task_reminders: bool,
    pub weekly_report: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email: true,
            push: true,
            task_reminders: true,
            weekly_report: true,
        }
    }
}

/// One row of the remote `profiles` table.
///
/// Dashboard fields are kept as raw JSON and every other column is read
/// leniently, so a malformed column only costs that preference, not the
/// whole record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub dashboard_layout: Option<Value>,
    #[serde(default)]
    pub widgets_order: Option<Value>,
    #[serde(default)]
    pub enabled_widgets: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub theme: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub notifications_preferences: Option<NotificationPreferences>,
    #[serde(default, deserialize_with = "lenient")]
    pub updated_at: Option<String>,
}

impl ProfileRecord {
    /// Overwrite every field that `update` carries.
    pub fn apply(&mut self, update: &ProfileUpdate) {
        overwrite(&mut self.full_name, &update.full_name);
        overwrite(&mut self.email, &update.email);
        overwrite(&mut self.bio, &update.bio);
        overwrite(&mut self.location, &update.location);
        overwrite(&mut self.avatar_url, &update.avatar_url);
        overwrite(&mut self.dashboard_layout, &update.dashboard_layout);
        overwrite(&mut self.widgets_order, &update.widgets_order);
        overwrite(&mut self.enabled_widgets, &update.enabled_widgets);
        overwrite(&mut self.theme, &update.theme);
        overwrite(
            &mut self.notifications_preferences,
            &update.notifications_preferences,
        );
    }
}

/// Read an optional column, treating a value of the wrong shape as absent.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Some(value) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match serde_json::from_value(value) {
        Ok(v) => Ok(Some(v)),
        Err(e) => {
            tracing::warn!("ignoring malformed profile column: {e}");
            Ok(None)
        }
    }
}

fn overwrite<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
    if let Some(v) = src {
        *dst = Some(v.clone());
    }
}

/// Partial profile write. Only the fields that are `Some` are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard_layout: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widgets_order: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_widgets: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications_preferences: Option<NotificationPreferences>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Durable per-user profile storage.
pub trait RemoteProfileStore: Send + Sync {
    fn fetch_profile(&self, user_id: &str) -> Result<Option<ProfileRecord>>;
    fn upsert_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<()>;
}

/// Profile store speaking the PostgREST dialect of the hosted database.
pub struct HttpProfileStore {
    client: Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl HttpProfileStore {
    pub fn new(settings: &RemoteSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent("taskboard profile sync")
            .build()?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            table: settings.table.clone(),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }
}

impl RemoteProfileStore for HttpProfileStore {
    fn fetch_profile(&self, user_id: &str) -> Result<Option<ProfileRecord>> {
        let filter = format!("eq.{user_id}");
        let resp = self
            .client
            .get(self.table_url())
            .query(&[("id", filter.as_str()), ("select", "*")])
            .header("apikey", self.api_key.as_str())
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .context("profile request failed")?
            .error_for_status()?;
        let body = resp.text()?;
        let mut rows: Vec<ProfileRecord> =
            serde_json::from_str(&body).context("unexpected profile payload")?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    fn upsert_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<()> {
        let mut body = serde_json::to_value(update)?;
        if let Value::Object(map) = &mut body {
            map.insert("id".into(), Value::String(user_id.to_string()));
            map.insert("updated_at".into(), Value::String(Utc::now().to_rfc3339()));
        }
        self.client
            .post(self.table_url())
            .header("apikey", self.api_key.as_str())
            .bearer_auth(&self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .body(serde_json::to_vec(&body)?)
            .send()
            .context("profile upsert failed")?
            .error_for_status()?;
        Ok(())
    }
}

/// In-process profile store. Used when no remote is configured and by tests,
/// which can make it fail on demand.
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: Mutex<HashMap<String, ProfileRecord>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: ProfileRecord) {
        if let Ok(mut map) = self.profiles.lock() {
            map.insert(record.id.clone(), record);
        }
    }

    pub fn profile(&self, user_id: &str) -> Option<ProfileRecord> {
        self.profiles.lock().ok()?.get(user_id).cloned()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of upserts attempted, failed ones included.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl RemoteProfileStore for MemoryProfileStore {
    fn fetch_profile(&self, user_id: &str) -> Result<Option<ProfileRecord>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            anyhow::bail!("profile backend unavailable");
        }
        Ok(self.profile(user_id))
    }

    fn upsert_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("profile backend unavailable");
        }
        let mut map = self
            .profiles
            .lock()
            .map_err(|_| anyhow::anyhow!("profile map poisoned"))?;
        let record = map.entry(user_id.to_string()).or_insert_with(|| ProfileRecord {
            id: user_id.to_string(),
            ..Default::default()
        });
        record.apply(update);
        record.updated_at = Some(Utc::now().to_rfc3339());
        Ok(())
    }
}

/// Handle to a background profile call. Dropping it detaches the call.
#[derive(Debug, Default)]
pub struct PersistHandle(Option<JoinHandle<()>>);

impl PersistHandle {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn is_detached(&self) -> bool {
        self.0.is_none()
    }

    /// Block until the call has finished. Only tests and shutdown paths
    /// should need this.
    pub fn wait(self) {
        if let Some(handle) = self.0 {
            let _ = handle.join();
        }
    }
}

/// Send `update` on its own thread. Failures are logged and dropped; there
/// is no retry and no ordering between concurrent writes.
pub(crate) fn spawn_upsert(
    remote: Arc<dyn RemoteProfileStore>,
    user_id: String,
    update: ProfileUpdate,
    what: &'static str,
) -> PersistHandle {
    let spawned = std::thread::Builder::new()
        .name("profile-upsert".into())
        .spawn(move || {
            if let Err(e) = remote.upsert_profile(&user_id, &update) {
                tracing::error!(preference = what, "error saving preference remotely: {e:#}");
            }
        });
    match spawned {
        Ok(handle) => PersistHandle(Some(handle)),
        Err(e) => {
            tracing::error!(preference = what, "failed to start remote write: {e}");
            PersistHandle::none()
        }
    }
}

pub(crate) fn spawn_task(name: &str, task: impl FnOnce() + Send + 'static) -> PersistHandle {
    match std::thread::Builder::new().name(name.into()).spawn(task) {
        Ok(handle) => PersistHandle(Some(handle)),
        Err(e) => {
            tracing::error!("failed to start {name}: {e}");
            PersistHandle::none()
        }
    }
}
