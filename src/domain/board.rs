use crate::domain::id::{BoardId, ColumnId, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Column names every new board starts with
pub const DEFAULT_COLUMNS: [&str; 3] = ["To Do", "In Progress", "Done"];

pub fn default_column_names() -> Vec<String> {
    DEFAULT_COLUMNS.iter().map(|name| name.to_string()).collect()
}

/// An ordered list of task placements. The order is the on-screen order
/// and the name doubles as the `status` of every task it holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: ColumnId,
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<TaskId>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Column {
    pub fn new(name: String) -> Self {
        let now = Utc::now();
        Self {
            id: ColumnId::generate(),
            name,
            tasks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn position_of(&self, task_id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|id| id == task_id)
    }

    pub fn contains(&self, task_id: &TaskId) -> bool {
        self.position_of(task_id).is_some()
    }

    /// Removes every placement of `task_id`, returning whether any existed
    pub fn remove_task(&mut self, task_id: &TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|id| id != task_id);
        self.tasks.len() != before
    }

    /// Inserts at `index` clamped to the sequence length, appending on `None`
    pub fn insert_task(&mut self, task_id: TaskId, index: Option<usize>) {
        match index {
            Some(index) => {
                let index = index.min(self.tasks.len());
                self.tasks.insert(index, task_id);
            }
            None => self.tasks.push(task_id),
        }
    }
}

/// Partial update for a column
#[derive(Debug, Clone, Default)]
pub struct ColumnUpdate {
    pub name: Option<String>,
}

/// A kanban board: an ordered set of columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: BoardId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// Partial update for a board
#[derive(Debug, Clone, Default)]
pub struct BoardUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Board {
    /// Creates a board with one empty column per name
    pub fn new(name: String, description: String, column_names: &[String]) -> Self {
        let now = Utc::now();
        Self {
            id: BoardId::generate(),
            name,
            description,
            columns: column_names
                .iter()
                .map(|name| Column::new(name.clone()))
                .collect(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn column(&self, column_id: &ColumnId) -> Option<&Column> {
        self.columns.iter().find(|col| &col.id == column_id)
    }

    pub fn column_mut(&mut self, column_id: &ColumnId) -> Option<&mut Column> {
        self.columns.iter_mut().find(|col| &col.id == column_id)
    }

    pub fn column_index(&self, column_id: &ColumnId) -> Option<usize> {
        self.columns.iter().position(|col| &col.id == column_id)
    }

    /// All task IDs placed on this board, in column order
    pub fn task_ids(&self) -> impl Iterator<Item = &TaskId> {
        self.columns.iter().flat_map(|col| col.tasks.iter())
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
