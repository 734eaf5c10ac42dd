use crate::model::{CalendarEvent, Task, Transaction, TransactionKind};
use serde::{Deserialize, Serialize};

pub const LEISURE_CATEGORY: &str = "Lazer";
pub const LEISURE_BUDGET: f64 = 500.0;
/// Share of the leisure budget above which a finance alert is raised.
pub const FINANCE_ALERT_RATIO: f64 = 0.75;

pub const TASKS_ROUTE: &str = "/tasks";
pub const CALENDAR_ROUTE: &str = "/calendar";
pub const EXPENSES_ROUTE: &str = "/expenses";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    UrgentTask,
    NextTask,
    NextEvent,
    FinanceAlert,
}

impl NotificationKind {
    pub fn id_prefix(&self) -> &'static str {
        match self {
            NotificationKind::UrgentTask => "urgent",
            NotificationKind::NextTask => "next",
            NotificationKind::NextEvent => "event",
            NotificationKind::FinanceAlert => "fin",
        }
    }

    pub fn navigation_target(&self) -> &'static str {
        match self {
            NotificationKind::UrgentTask | NotificationKind::NextTask => TASKS_ROUTE,
            NotificationKind::NextEvent => CALENDAR_ROUTE,
            NotificationKind::FinanceAlert => EXPENSES_ROUTE,
        }
    }

    fn title(&self) -> &'static str {
        match self {
            NotificationKind::UrgentTask => "Tarefa Urgente",
            NotificationKind::NextTask => "Próxima Tarefa",
            NotificationKind::NextEvent => "Próximo Evento",
            NotificationKind::FinanceAlert => "Alerta de Gastos",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationItem {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
    pub time_label: String,
    pub navigation_target: String,
}

impl NotificationItem {
    fn new(
        kind: NotificationKind,
        source: &str,
        description: String,
        time_label: String,
    ) -> Self {
        Self {
            id: format!("{}-{}", kind.id_prefix(), source),
            kind,
            title: kind.title().to_string(),
            description,
            time_label,
            navigation_target: kind.navigation_target().to_string(),
        }
    }
}

/// Sum of expenses booked under the leisure category.
pub fn leisure_spend(transactions: &[Transaction]) -> f64 {
    transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Expense && t.category == LEISURE_CATEGORY)
        .map(|t| t.amount)
        .sum()
}

/// Percentage of `budget` consumed by leisure spending, or `None` while the
/// spend stays at or below the alert threshold.
pub fn leisure_alert_percent(spend: f64, budget: f64) -> Option<i64> {
    if budget <= 0.0 || !spend.is_finite() {
        return None;
    }
    if spend > budget * FINANCE_ALERT_RATIO {
        Some((spend / budget * 100.0).round() as i64)
    } else {
        None
    }
}

/// Build the notification feed using the default leisure budget.
pub fn derive(
    tasks: &[Task],
    transactions: &[Transaction],
    events: &[CalendarEvent],
) -> Vec<NotificationItem> {
    derive_with_budget(tasks, transactions, events, LEISURE_BUDGET)
}

/// Build the notification feed.
///
/// Items are emitted in priority order: every open urgent task, then the next
/// open task (only when nothing is urgent), then the next event, then the
/// leisure spending alert.
pub fn derive_with_budget(
    tasks: &[Task],
    transactions: &[Transaction],
    events: &[CalendarEvent],
    leisure_budget: f64,
) -> Vec<NotificationItem> {
    let mut items = Vec::new();

    for task in tasks.iter().filter(|t| t.is_urgent_open()) {
        let time = if task.subtitle.trim().is_empty() {
            "Agora".to_string()
        } else {
            task.subtitle.clone()
        };
        items.push(NotificationItem::new(
            NotificationKind::UrgentTask,
            &task.id.to_string(),
            task.title.clone(),
            time,
        ));
    }

    if items.is_empty() {
        if let Some(next) = tasks.iter().find(|t| !t.completed) {
            items.push(NotificationItem::new(
                NotificationKind::NextTask,
                &next.id.to_string(),
                next.title.clone(),
                "Em breve".into(),
            ));
        }
    }

    if let Some(event) = events.first() {
        items.push(NotificationItem::new(
            NotificationKind::NextEvent,
            &event.id.to_string(),
            event.title.clone(),
            event.start_time_label.clone(),
        ));
    }

    let spend = leisure_spend(transactions);
    if let Some(percent) = leisure_alert_percent(spend, leisure_budget) {
        items.push(NotificationItem::new(
            NotificationKind::FinanceAlert,
            "alert",
            format!("Você usou {percent}% do orçamento de {LEISURE_CATEGORY}."),
            "Hoje".into(),
        ));
    }

    items
}

/// Current notification list plus the single global unread marker.
///
/// Every non-empty recomputation raises the unread flag again, even when the
/// list is identical to the one already acknowledged.
#[derive(Debug, Clone)]
pub struct NotificationFeed {
    items: Vec<NotificationItem>,
    has_unread: bool,
    leisure_budget: f64,
}

impl Default for NotificationFeed {
    fn default() -> Self {
        Self::new(LEISURE_BUDGET)
    }
}

impl NotificationFeed {
    pub fn new(leisure_budget: f64) -> Self {
        Self {
            items: Vec::new(),
            has_unread: false,
            leisure_budget,
        }
    }

    pub fn recompute(
        &mut self,
        tasks: &[Task],
        transactions: &[Transaction],
        events: &[CalendarEvent],
    ) -> &[NotificationItem] {
        self.items = derive_with_budget(tasks, transactions, events, self.leisure_budget);
        if !self.items.is_empty() {
            self.has_unread = true;
        }
        tracing::debug!(count = self.items.len(), "notification feed recomputed");
        &self.items
    }

    pub fn items(&self) -> &[NotificationItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&NotificationItem> {
        self.items.iter().find(|n| n.id == id)
    }

    pub fn has_unread(&self) -> bool {
        self.has_unread
    }

    pub fn mark_all_read(&mut self) {
        self.has_unread = false;
    }

    pub fn leisure_budget(&self) -> f64 {
        self.leisure_budget
    }
}
