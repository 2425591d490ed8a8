//! Read-only projections over a [`Workspace`].
//!
//! Flat task lists, calendar days and report figures are all derived from
//! the single normalized workspace; none of them is stored separately.

use crate::domain::{
    board::{Board, Column},
    id::{BoardId, ColumnId},
    task::{Priority, Task},
    workspace::Workspace,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};

/// A placed task together with the board and column holding it
#[derive(Debug, Clone, Copy)]
pub struct TaskEntry<'a> {
    pub task: &'a Task,
    pub board: &'a Board,
    pub column: &'a Column,
}

/// Resolves a column's placement IDs to task content, in column order
pub fn column_tasks<'a>(
    workspace: &'a Workspace,
    board_id: &BoardId,
    column_id: &ColumnId,
) -> Vec<&'a Task> {
    workspace
        .column(board_id, column_id)
        .map(|column| {
            column
                .tasks
                .iter()
                .filter_map(|id| workspace.task(id))
                .collect()
        })
        .unwrap_or_default()
}

/// Every placed task in board, column, position order
pub fn list_tasks(workspace: &Workspace) -> Vec<TaskEntry<'_>> {
    let mut entries = Vec::new();
    for board in &workspace.boards {
        for column in &board.columns {
            for id in &column.tasks {
                if let Some(task) = workspace.task(id) {
                    entries.push(TaskEntry {
                        task,
                        board,
                        column,
                    });
                }
            }
        }
    }
    entries
}

/// Task list filter; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Case-insensitive substring of the title
    pub query: Option<String>,
    pub status: Option<String>,
    pub priority: Option<Priority>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(query) = self.query.as_deref().filter(|q| !q.is_empty()) {
            if !task.title.to_lowercase().contains(&query.to_lowercase()) {
                return false;
            }
        }
        if let Some(status) = &self.status {
            if &task.status != status {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }
        true
    }
}

pub fn filter_tasks<'a>(workspace: &'a Workspace, filter: &TaskFilter) -> Vec<&'a Task> {
    list_tasks(workspace)
        .into_iter()
        .map(|entry| entry.task)
        .filter(|task| filter.matches(task))
        .collect()
}

/// Tasks due on a calendar day (UTC)
pub fn tasks_due_on(workspace: &Workspace, day: NaiveDate) -> Vec<&Task> {
    list_tasks(workspace)
        .into_iter()
        .map(|entry| entry.task)
        .filter(|task| task.due_date.map(|d| d.date_naive()) == Some(day))
        .collect()
}

/// Dated tasks not yet in `completed_status`, nearest due date first
pub fn upcoming_deadlines<'a>(
    workspace: &'a Workspace,
    completed_status: &str,
    limit: usize,
) -> Vec<&'a Task> {
    let mut tasks: Vec<&Task> = list_tasks(workspace)
        .into_iter()
        .map(|entry| entry.task)
        .filter(|task| task.due_date.is_some() && task.status != completed_status)
        .collect();
    tasks.sort_by_key(|task| task.due_date);
    tasks.truncate(limit);
    tasks
}

/// How close a due date is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineStatus {
    Overdue,
    DueToday,
    /// Within the next three days
    DueSoon,
    Upcoming,
}

impl DeadlineStatus {
    const SOON_DAYS: i64 = 3;

    pub fn classify(due: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let (due_day, today) = (due.date_naive(), now.date_naive());
        if due_day < today {
            Self::Overdue
        } else if due_day == today {
            Self::DueToday
        } else if due <= now + Duration::days(Self::SOON_DAYS) {
            Self::DueSoon
        } else {
            Self::Upcoming
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCount {
    pub status: String,
    pub count: usize,
}

/// Task counts per status, in order of first appearance across boards.
/// Same-named columns on different boards share one entry.
pub fn status_summary(workspace: &Workspace) -> Vec<StatusCount> {
    let mut summary: Vec<StatusCount> = Vec::new();
    for column in workspace.boards.iter().flat_map(|b| b.columns.iter()) {
        let count = column
            .tasks
            .iter()
            .filter(|id| workspace.task(id).is_some())
            .count();
        match summary.iter_mut().find(|s| s.status == column.name) {
            Some(existing) => existing.count += count,
            None => summary.push(StatusCount {
                status: column.name.clone(),
                count,
            }),
        }
    }
    summary
}

/// Fraction of placed tasks whose status is `completed_status`
pub fn completion_rate(workspace: &Workspace, completed_status: &str) -> f64 {
    let entries = list_tasks(workspace);
    if entries.is_empty() {
        return 0.0;
    }
    let completed = entries
        .iter()
        .filter(|entry| entry.task.status == completed_status)
        .count();
    completed as f64 / entries.len() as f64
}
