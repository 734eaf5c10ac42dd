use serde_json::json;
use std::sync::{Arc, Mutex};
use taskboard::dashboard::{Dashboard, DashboardEvent, EventCallback, WidgetCatalog};
use taskboard::model::{CalendarEvent, Snapshots, Task};
use taskboard::preferences::{
    LocalCache, MemoryProfileStore, PrefKey, PreferenceStore, ProfileRecord, RemoteProfileStore,
    Theme,
};

fn recorder() -> (EventCallback, Arc<Mutex<Vec<DashboardEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let cb: EventCallback = Arc::new(move |e| sink.lock().unwrap().push(e));
    (cb, events)
}

#[test]
fn remote_profile_is_applied_on_poll() {
    let remote = Arc::new(MemoryProfileStore::new());
    remote.insert(ProfileRecord {
        id: "u1".into(),
        theme: Some("light".into()),
        enabled_widgets: Some(json!({"weather": false})),
        dashboard_layout: Some(json!([{"i": "agenda", "x": 6, "y": 0, "w": 6, "h": 2}])),
        ..Default::default()
    });
    let dyn_remote: Arc<dyn RemoteProfileStore> = remote.clone();
    let store = PreferenceStore::new(LocalCache::in_memory(), Some(dyn_remote));
    store.set_user(Some("u1".into()));

    let (cb, events) = recorder();
    let mut dash = Dashboard::new(WidgetCatalog::shared(), store.clone(), Some(cb));
    assert_eq!(dash.theme(), Theme::Dark);
    assert!(dash.is_widget_enabled("weather"));

    store.spawn_sync_from_remote().wait();
    // Nothing changes until the owner polls.
    assert_eq!(dash.theme(), Theme::Dark);

    let keys = dash.poll_preference_changes();
    assert!(keys.contains(&PrefKey::Theme));
    assert_eq!(dash.theme(), Theme::Light);
    assert!(!dash.is_widget_enabled("weather"));
    assert!(dash.ordered_widgets().iter().all(|id| id != "weather"));
    let agenda = dash.layout().iter().find(|e| e.id == "agenda").unwrap();
    assert_eq!((agenda.x, agenda.y), (6, 0));
    assert_eq!(*events.lock().unwrap(), vec![DashboardEvent::Reloaded]);

    assert!(dash.poll_preference_changes().is_empty());
}

#[test]
fn disabling_every_widget_shows_empty_state() {
    let mut dash = Dashboard::new(WidgetCatalog::shared(), PreferenceStore::in_memory(), None);
    let enabled: Vec<String> = dash
        .visible_widgets()
        .into_iter()
        .map(|w| w.id.to_string())
        .collect();
    for id in &enabled {
        dash.toggle_widget(id).unwrap().wait();
    }
    assert!(dash.all_disabled());
    assert!(dash.visible_widgets().is_empty());
    assert!(dash.ordered_widgets().is_empty());
}

#[test]
fn layout_changes_and_reset_flow_through_session() {
    let store = PreferenceStore::in_memory();
    let mut dash = Dashboard::new(WidgetCatalog::shared(), store.clone(), None);
    let mut layout = dash.layout().to_vec();
    let idx = layout.iter().position(|e| e.id == "tasksToday").unwrap();
    layout[idx].y = 12;
    dash.on_layout_change(layout).wait();

    let widget = dash
        .visible_widgets()
        .into_iter()
        .find(|w| w.id == "tasksToday")
        .unwrap();
    assert_eq!(widget.slot.y, 12);

    let again = Dashboard::new(WidgetCatalog::shared(), store.clone(), None);
    assert_eq!(again.layout(), dash.layout());
    drop(again);

    dash.reset_layout();
    assert_eq!(dash.layout(), &WidgetCatalog::shared().default_layout()[..]);
}

#[test]
fn drag_reorder_through_session() {
    let mut dash = Dashboard::new(WidgetCatalog::shared(), PreferenceStore::in_memory(), None);
    let before: Vec<_> = dash.ordered_widgets().to_vec();
    dash.drag_start(before[2].as_str());
    dash.drag_enter(before[0].as_str());
    assert!(dash.drag_session().is_dragging());
    dash.drop_on(before[0].as_str()).unwrap().wait();
    assert_eq!(dash.ordered_widgets()[0], before[2]);
    assert_eq!(dash.ordered_widgets()[1], before[0]);
    assert!(!dash.drag_session().is_dragging());
    let visible: Vec<_> = dash.visible_widgets().into_iter().map(|w| w.id).collect();
    assert_eq!(visible, dash.ordered_widgets());
}

#[test]
fn feed_follows_snapshots() {
    let (cb, events) = recorder();
    let mut dash = Dashboard::new(WidgetCatalog::shared(), PreferenceStore::in_memory(), Some(cb));
    dash.update_snapshots(Snapshots {
        tasks: vec![Task {
            id: 3,
            title: "Draft slides".into(),
            subtitle: String::new(),
            urgent: false,
            completed: false,
        }],
        events: vec![CalendarEvent {
            id: 8,
            title: "Dentist".into(),
            start_time_label: "16:00".into(),
        }],
        ..Default::default()
    });
    let ids: Vec<_> = dash.notifications().iter().map(|n| n.id.clone()).collect();
    assert_eq!(ids, vec!["next-3", "event-8"]);
    assert!(dash.has_unread());

    dash.open_notifications();
    assert_eq!(dash.activate_notification("event-8").as_deref(), Some("/calendar"));
    assert_eq!(
        *events.lock().unwrap(),
        vec![DashboardEvent::Navigate("/calendar".into())]
    );
}

#[test]
fn theme_change_is_shared_with_other_sessions() {
    let store = PreferenceStore::in_memory();
    let mut first = Dashboard::new(WidgetCatalog::shared(), store.clone(), None);
    let mut second = Dashboard::new(WidgetCatalog::shared(), store.clone(), None);
    first.set_theme(Theme::System).wait();
    assert_eq!(second.theme(), Theme::Dark);
    second.poll_preference_changes();
    assert_eq!(second.theme(), Theme::System);
    assert_eq!(first.poll_preference_changes(), vec![PrefKey::Theme]);
}

#[test]
fn reorder_and_layout_changes_reach_other_sessions() {
    let store = PreferenceStore::in_memory();
    let mut first = Dashboard::new(WidgetCatalog::shared(), store.clone(), None);
    let (cb, events) = recorder();
    let mut second = Dashboard::new(WidgetCatalog::shared(), store.clone(), Some(cb));

    let before = first.ordered_widgets().to_vec();
    first.drag_start(before[1].as_str());
    first.drop_on(before[0].as_str()).unwrap().wait();

    let mut layout = first.layout().to_vec();
    layout[0].y = 7;
    first.on_layout_change(layout.clone()).wait();

    assert_eq!(second.ordered_widgets(), &before[..]);
    let keys = second.poll_preference_changes();
    assert!(keys.contains(&PrefKey::WidgetOrder));
    assert!(keys.contains(&PrefKey::DashboardLayout));
    assert_eq!(second.ordered_widgets(), first.ordered_widgets());
    assert_eq!(second.layout(), &layout[..]);
    assert_eq!(*events.lock().unwrap(), vec![DashboardEvent::Reloaded]);

    first.reset_layout();
    second.poll_preference_changes();
    assert_eq!(second.layout(), &WidgetCatalog::shared().default_layout()[..]);
}
