use anyhow::Context;
use chrono::Local;
use serde_json::json;
use std::sync::Arc;
use taskboard::dashboard::{Dashboard, WidgetCatalog};
use taskboard::model::Snapshots;
use taskboard::preferences::{HttpProfileStore, LocalCache, PreferenceStore, RemoteProfileStore};
use taskboard::quotes::quote_of_the_day;
use taskboard::settings::Settings;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let settings_path = args.next().unwrap_or_else(|| "settings.json".into());
    let snapshots_path = args.next().unwrap_or_else(|| "snapshots.json".into());

    let settings = Settings::load(&settings_path)
        .with_context(|| format!("failed to load settings from {settings_path}"))?;
    taskboard::logging::init(settings.debug_logging, settings.log_file.clone());

    let remote: Option<Arc<dyn RemoteProfileStore>> = match &settings.remote {
        Some(cfg) => match HttpProfileStore::new(cfg) {
            Ok(store) => Some(Arc::new(store)),
            Err(e) => {
                tracing::warn!("remote profile store unavailable: {e:#}");
                None
            }
        },
        None => None,
    };
    let store = PreferenceStore::new(LocalCache::open(settings.local_cache_path()), remote);
    store.set_user(settings.user_id.clone());
    store.sync_from_remote();

    let mut snapshots = Snapshots::load(&snapshots_path)
        .with_context(|| format!("failed to load snapshots from {snapshots_path}"))?;
    snapshots.cap_events(settings.event_limit);

    let mut dashboard = Dashboard::with_leisure_budget(
        WidgetCatalog::shared(),
        store.clone(),
        settings.leisure_budget,
        None,
    );
    dashboard.update_snapshots(snapshots);
    let quote = quote_of_the_day(&store, Local::now().date_naive(), &mut rand::thread_rng());

    let report = json!({
        "theme": dashboard.theme(),
        "hasUnread": dashboard.has_unread(),
        "notifications": dashboard.notifications(),
        "widgets": dashboard.visible_widgets(),
        "allDisabled": dashboard.all_disabled(),
        "quote": quote,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
