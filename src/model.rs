//! Read-only snapshots handed to the dashboard by the task, expense and
//! calendar screens.

use serde::{Deserialize, Serialize};

pub type TaskId = i64;
pub type EventId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub urgent: bool,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    pub fn is_urgent_open(&self) -> bool {
        self.urgent && !self.completed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: String,
    pub amount: f64,
}

/// Upcoming calendar entry. The calendar screen filters these to today and
/// later, sorts them by start time and caps the list before handing it over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: EventId,
    pub title: String,
    #[serde(rename = "startTime", alias = "start_time_label", default)]
    pub start_time_label: String,
}

/// Everything the notification feed reads, bundled for callers that load
/// state from a single document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshots {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub events: Vec<CalendarEvent>,
}

impl Snapshots {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Keep only the first `limit` events.
    pub fn cap_events(&mut self, limit: usize) {
        self.events.truncate(limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_defaults_missing_flags() {
        let task: Task = serde_json::from_value(json!({"id": 3, "title": "Write report"})).unwrap();
        assert!(!task.urgent);
        assert!(!task.completed);
        assert!(task.subtitle.is_empty());
    }

    #[test]
    fn transaction_reads_type_field() {
        let tx: Transaction = serde_json::from_value(json!({
            "type": "expense",
            "category": "Lazer",
            "amount": 42.5
        }))
        .unwrap();
        assert_eq!(tx.kind, TransactionKind::Expense);
    }

    #[test]
    fn event_accepts_both_time_keys() {
        let a: CalendarEvent =
            serde_json::from_value(json!({"id": 1, "title": "Standup", "startTime": "09:00"}))
                .unwrap();
        let b: CalendarEvent = serde_json::from_value(
            json!({"id": 1, "title": "Standup", "start_time_label": "09:00"}),
        )
        .unwrap();
        assert_eq!(a, b);
    }
}
