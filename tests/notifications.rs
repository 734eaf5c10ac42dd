use taskboard::model::{CalendarEvent, Task, Transaction, TransactionKind};
use taskboard::notifications::{derive, NotificationFeed, NotificationKind};

fn task(id: i64, title: &str, urgent: bool, completed: bool) -> Task {
    Task {
        id,
        title: title.into(),
        subtitle: String::new(),
        urgent,
        completed,
    }
}

fn leisure(amount: f64) -> Transaction {
    Transaction {
        kind: TransactionKind::Expense,
        category: "Lazer".into(),
        amount,
    }
}

#[test]
fn urgent_bug_raises_single_unread_alert() {
    let mut feed = NotificationFeed::default();
    let tasks = vec![task(1, "Fix prod bug", true, false)];
    feed.recompute(&tasks, &[], &[]);
    assert_eq!(feed.items().len(), 1);
    let item = &feed.items()[0];
    assert_eq!(item.kind, NotificationKind::UrgentTask);
    assert_eq!(item.id, "urgent-1");
    assert_eq!(item.description, "Fix prod bug");
    assert_eq!(item.time_label, "Agora");
    assert_eq!(item.navigation_target, "/tasks");
    assert!(feed.has_unread());
}

#[test]
fn each_urgent_task_suppresses_next_task() {
    let tasks = vec![
        task(1, "Plain", false, false),
        task(2, "Urgent A", true, false),
        task(3, "Urgent done", true, true),
        task(4, "Urgent B", true, false),
    ];
    let items = derive(&tasks, &[], &[]);
    let kinds: Vec<_> = items.iter().map(|i| i.kind).collect();
    assert_eq!(kinds, vec![NotificationKind::UrgentTask, NotificationKind::UrgentTask]);
    assert_eq!(items[0].id, "urgent-2");
    assert_eq!(items[1].id, "urgent-4");
}

#[test]
fn next_task_is_first_incomplete() {
    let tasks = vec![
        task(1, "Done", false, true),
        task(2, "Write report", false, false),
        task(3, "Later", false, false),
    ];
    let items = derive(&tasks, &[], &[]);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].kind, NotificationKind::NextTask);
    assert_eq!(items[0].id, "next-2");
    assert_eq!(items[0].time_label, "Em breve");
}

#[test]
fn leisure_spend_above_threshold_alerts_with_rounded_percent() {
    let items = derive(&[], &[leisure(250.0), leisure(150.0)], &[]);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].kind, NotificationKind::FinanceAlert);
    assert_eq!(items[0].id, "fin-alert");
    assert!(items[0].description.contains("80%"));
    assert_eq!(items[0].navigation_target, "/expenses");
}

#[test]
fn leisure_spend_at_or_below_threshold_is_quiet() {
    assert!(derive(&[], &[leisure(300.0)], &[]).is_empty());
    assert!(derive(&[], &[leisure(375.0)], &[]).is_empty());
    let income = Transaction {
        kind: TransactionKind::Income,
        category: "Lazer".into(),
        amount: 1000.0,
    };
    assert!(derive(&[], &[income], &[]).is_empty());
}

#[test]
fn feed_orders_tasks_events_then_finance() {
    let events = vec![
        CalendarEvent {
            id: 9,
            title: "Standup".into(),
            start_time_label: "09:30".into(),
        },
        CalendarEvent {
            id: 10,
            title: "Review".into(),
            start_time_label: "14:00".into(),
        },
    ];
    let items = derive(&[task(1, "Plan", false, false)], &[leisure(500.0)], &events);
    let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["next-1", "event-9", "fin-alert"]);
    assert_eq!(items[1].time_label, "09:30");
    assert!(items[2].description.contains("100%"));
}

#[test]
fn empty_inputs_leave_unread_flag_alone() {
    let mut feed = NotificationFeed::default();
    feed.recompute(&[], &[], &[]);
    assert!(feed.items().is_empty());
    assert!(!feed.has_unread());

    let tasks = vec![task(1, "Fix prod bug", true, false)];
    feed.recompute(&tasks, &[], &[]);
    feed.mark_all_read();
    feed.recompute(&tasks, &[], &[]);
    assert!(feed.has_unread());
}
