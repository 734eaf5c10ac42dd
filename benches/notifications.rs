use criterion::{black_box, criterion_group, criterion_main, Criterion};
use taskboard::dashboard::{merge_layout, WidgetCatalog};
use taskboard::model::{CalendarEvent, Task, Transaction, TransactionKind};
use taskboard::notifications::derive;

fn build_tasks(count: usize, urgent_every: usize) -> Vec<Task> {
    (0..count)
        .map(|i| Task {
            id: i as i64,
            title: format!("Task {i:05}"),
            subtitle: if i % 2 == 0 { String::new() } else { "14:00".into() },
            urgent: urgent_every > 0 && i % urgent_every == 0,
            completed: i % 3 == 0,
        })
        .collect()
}

fn build_transactions(count: usize) -> Vec<Transaction> {
    (0..count)
        .map(|i| Transaction {
            kind: if i % 4 == 0 {
                TransactionKind::Income
            } else {
                TransactionKind::Expense
            },
            category: if i % 2 == 0 { "Lazer" } else { "Mercado" }.into(),
            amount: (i % 50) as f64,
        })
        .collect()
}

fn bench_derive(c: &mut Criterion) {
    let urgent = build_tasks(10_000, 7);
    let calm = build_tasks(10_000, 0);
    let transactions = build_transactions(20_000);
    let events: Vec<CalendarEvent> = (0..5)
        .map(|i| CalendarEvent {
            id: i,
            title: format!("Event {i}"),
            start_time_label: "09:00".into(),
        })
        .collect();

    c.bench_function("derive_many_urgent", |b| {
        b.iter(|| black_box(derive(black_box(&urgent), &transactions, &events).len()))
    });

    c.bench_function("derive_next_task", |b| {
        b.iter(|| black_box(derive(black_box(&calm), &transactions, &events).len()))
    });
}

fn bench_merge(c: &mut Criterion) {
    let catalog = WidgetCatalog::with_defaults();
    let mut stored = catalog.default_layout();
    stored.reverse();
    stored.truncate(10);

    c.bench_function("merge_layout", |b| {
        b.iter(|| black_box(merge_layout(black_box(&stored), &catalog).len()))
    });
}

criterion_group!(benches, bench_derive, bench_merge);
criterion_main!(benches);
