use crate::domain::task::Task;
use chrono::{DateTime, Utc};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::str::FromStr;

/// Fields available for sorting tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    Priority,
    Status,
    Due,
    Created,
    Updated,
    SubtaskProgress,
}

/// Sort order direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "title" => Ok(SortField::Title),
            "priority" => Ok(SortField::Priority),
            "status" => Ok(SortField::Status),
            "due" => Ok(SortField::Due),
            "created" => Ok(SortField::Created),
            "updated" => Ok(SortField::Updated),
            "subtask-progress" => Ok(SortField::SubtaskProgress),
            _ => Err(format!(
                "Invalid sort field '{}'. Valid fields: title, priority, status, due, created, updated, subtask-progress",
                s
            )),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Ascending),
            "desc" => Ok(SortOrder::Descending),
            _ => Err(format!(
                "Invalid sort order '{}'. Valid orders: asc, desc",
                s
            )),
        }
    }
}

/// Sorts tasks in-place by the given field and direction.
///
/// Works on owned tasks as well as on the borrowed views returned by the
/// projections in [`crate::domain::views`]. Tasks without a due date sort
/// last in both directions.
///
/// # Examples
/// ```
/// use taskdeck_core::domain::sorting::{sort_tasks, SortField, SortOrder};
/// use taskdeck_core::domain::task::Task;
/// use taskdeck_core::TaskId;
///
/// let mut tasks = vec![
///     Task::new(TaskId::from("c"), "Charlie".to_string()),
///     Task::new(TaskId::from("a"), "Alpha".to_string()),
/// ];
///
/// sort_tasks(&mut tasks, SortField::Title, SortOrder::Ascending);
/// assert_eq!(tasks[0].title, "Alpha");
/// ```
pub fn sort_tasks<T: Borrow<Task>>(tasks: &mut [T], field: SortField, order: SortOrder) {
    tasks.sort_by(|a, b| {
        let (a, b): (&Task, &Task) = (a.borrow(), b.borrow());

        if field == SortField::Due {
            // missing dates stay at the end regardless of direction
            return match (a.due_date, b.due_date) {
                (Some(_), Some(_)) => apply_order(compare_option_dates(a.due_date, b.due_date), order),
                _ => compare_option_dates(a.due_date, b.due_date),
            };
        }

        let cmp = match field {
            SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortField::Priority => a.priority.rank().cmp(&b.priority.rank()),
            SortField::Status => a.status.to_lowercase().cmp(&b.status.to_lowercase()),
            SortField::Created => a.created_at.cmp(&b.created_at),
            SortField::Updated => a.updated_at.cmp(&b.updated_at),
            SortField::SubtaskProgress => compare_subtask_progress(a, b),
            SortField::Due => Ordering::Equal,
        };

        apply_order(cmp, order)
    });
}

fn apply_order(cmp: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Ascending => cmp,
        SortOrder::Descending => cmp.reverse(),
    }
}

/// Orders dated before undated; undated tasks compare equal
fn compare_option_dates(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a_date), Some(b_date)) => a_date.cmp(&b_date),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Compare by subtask completion ratio; no subtasks counts as 0%
fn compare_subtask_progress(a: &Task, b: &Task) -> Ordering {
    fn progress_pct(t: &Task) -> f64 {
        match t.subtask_progress() {
            (_, 0) => 0.0,
            (completed, total) => completed as f64 / total as f64,
        }
    }

    progress_pct(a)
        .partial_cmp(&progress_pct(b))
        .unwrap_or(Ordering::Equal)
}
