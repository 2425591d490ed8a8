use crate::{
    domain::{
        board::{Board, BoardUpdate, Column, ColumnUpdate},
        id::{AttachmentId, BoardId, ColumnId, CommentId, MemberId, SubtaskId, TaskId, WorkspaceId},
        task::{Attachment, AttachmentDraft, Comment, Subtask, SubtaskUpdate, Task, TaskDraft, TaskUpdate},
    },
    error::{Result, TaskdeckError},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Admin,
    Member,
    Viewer,
}

/// A person who can be assigned tasks in the workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub email: String,
    pub role: MemberRole,
}

/// Where a task is currently placed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLocation {
    pub board_id: BoardId,
    pub column_id: ColumnId,
    pub index: usize,
}

/// A violation of the placement invariants
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyIssue {
    /// A column references a task missing from the task map
    DanglingPlacement { column_id: ColumnId, task_id: TaskId },
    /// A task is placed in more than one column slot
    DuplicatePlacement { task_id: TaskId },
    /// A task in the map is placed in no column
    Unplaced { task_id: TaskId },
    /// A task's status differs from its column's name
    StatusMismatch {
        task_id: TaskId,
        status: String,
        column: String,
    },
}

/// Root aggregate: owns every board and the authoritative task map.
///
/// Columns hold placement only (task IDs); task content is read from
/// `tasks`. Every mutator below keeps each task in exactly one column and
/// its `status` equal to that column's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub boards: Vec<Board>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub tasks: HashMap<TaskId, Task>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Workspace {
    /// Creates an empty workspace with no boards
    pub fn new(name: String, description: String) -> Self {
        let now = Utc::now();
        Self {
            id: WorkspaceId::generate(),
            name,
            description,
            boards: Vec::new(),
            members: Vec::new(),
            tasks: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    // ========== Lookups ==========

    pub fn board(&self, board_id: &BoardId) -> Option<&Board> {
        self.boards.iter().find(|b| &b.id == board_id)
    }

    pub fn column(&self, board_id: &BoardId, column_id: &ColumnId) -> Option<&Column> {
        self.board(board_id).and_then(|b| b.column(column_id))
    }

    pub fn task(&self, task_id: &TaskId) -> Option<&Task> {
        self.tasks.get(task_id)
    }

    fn board_index(&self, board_id: &BoardId) -> Option<usize> {
        self.boards.iter().position(|b| &b.id == board_id)
    }

    /// `(board index, column index, task index)` of the first placement
    fn position_of(&self, task_id: &TaskId) -> Option<(usize, usize, usize)> {
        self.boards.iter().enumerate().find_map(|(bi, board)| {
            board.columns.iter().enumerate().find_map(|(ci, column)| {
                column.position_of(task_id).map(|ti| (bi, ci, ti))
            })
        })
    }

    /// Finds the board and column holding a task by scanning every column
    pub fn locate_task(&self, task_id: &TaskId) -> Option<TaskLocation> {
        self.position_of(task_id).map(|(bi, ci, index)| {
            let board = &self.boards[bi];
            TaskLocation {
                board_id: board.id.clone(),
                column_id: board.columns[ci].id.clone(),
                index,
            }
        })
    }

    // ========== Board operations ==========

    /// Appends a board with one empty column per name
    pub fn create_board(
        &mut self,
        name: String,
        description: String,
        column_names: &[String],
    ) -> Board {
        let board = Board::new(name, description, column_names);
        self.boards.push(board.clone());
        self.touch();
        board
    }

    pub fn update_board(&mut self, board_id: &BoardId, update: &BoardUpdate) -> bool {
        let Some(board) = self.boards.iter_mut().find(|b| &b.id == board_id) else {
            debug!(board = %board_id, "update_board: unknown board");
            return false;
        };
        if let Some(name) = &update.name {
            board.name = name.clone();
        }
        if let Some(description) = &update.description {
            board.description = description.clone();
        }
        board.touch();
        self.touch();
        true
    }

    /// Removes a board together with every task placed on it
    pub fn delete_board(&mut self, board_id: &BoardId) -> bool {
        let Some(index) = self.board_index(board_id) else {
            debug!(board = %board_id, "delete_board: unknown board");
            return false;
        };
        let board = self.boards.remove(index);
        for task_id in board.task_ids() {
            self.tasks.remove(task_id);
        }
        self.touch();
        true
    }

    // ========== Column operations ==========

    /// Appends an empty column; `None` if the board is unknown
    pub fn create_column(&mut self, board_id: &BoardId, name: String) -> Option<Column> {
        let Some(board) = self.boards.iter_mut().find(|b| &b.id == board_id) else {
            debug!(board = %board_id, "create_column: unknown board");
            return None;
        };
        let column = Column::new(name);
        board.columns.push(column.clone());
        board.touch();
        self.touch();
        Some(column)
    }

    /// Renaming a column renames the status of every task it holds
    pub fn update_column(
        &mut self,
        board_id: &BoardId,
        column_id: &ColumnId,
        update: &ColumnUpdate,
    ) -> bool {
        let Self { boards, tasks, .. } = self;
        let Some(board) = boards.iter_mut().find(|b| &b.id == board_id) else {
            debug!(board = %board_id, "update_column: unknown board");
            return false;
        };
        let Some(column) = board.column_mut(column_id) else {
            debug!(board = %board_id, column = %column_id, "update_column: unknown column");
            return false;
        };
        if let Some(name) = &update.name {
            column.name = name.clone();
            for task_id in &column.tasks {
                if let Some(task) = tasks.get_mut(task_id) {
                    task.set_status(name);
                }
            }
        }
        column.updated_at = Utc::now();
        board.touch();
        self.touch();
        true
    }

    /// Removes a column together with every task placed in it
    pub fn delete_column(&mut self, board_id: &BoardId, column_id: &ColumnId) -> bool {
        let Self { boards, tasks, .. } = self;
        let Some(board) = boards.iter_mut().find(|b| &b.id == board_id) else {
            debug!(board = %board_id, "delete_column: unknown board");
            return false;
        };
        let Some(index) = board.column_index(column_id) else {
            debug!(board = %board_id, column = %column_id, "delete_column: unknown column");
            return false;
        };
        let column = board.columns.remove(index);
        for task_id in &column.tasks {
            tasks.remove(task_id);
        }
        board.touch();
        self.touch();
        true
    }

    /// Moves a column to `new_index`, clamped to the last valid index
    pub fn move_column(&mut self, board_id: &BoardId, column_id: &ColumnId, new_index: usize) -> bool {
        let Some(board) = self.boards.iter_mut().find(|b| &b.id == board_id) else {
            debug!(board = %board_id, "move_column: unknown board");
            return false;
        };
        let Some(old_index) = board.column_index(column_id) else {
            debug!(board = %board_id, column = %column_id, "move_column: unknown column");
            return false;
        };
        let target = new_index.min(board.columns.len() - 1);
        if target == old_index {
            return false;
        }
        let column = board.columns.remove(old_index);
        board.columns.insert(target, column);
        board.touch();
        self.touch();
        true
    }

    // ========== Task operations ==========

    /// Creates a task at the end of a column.
    ///
    /// The only mutator that fails loudly: callers pass IDs read from the
    /// current state, so an unknown board or column is a caller bug.
    pub fn create_task(
        &mut self,
        board_id: &BoardId,
        column_id: &ColumnId,
        draft: TaskDraft,
    ) -> Result<Task> {
        let board = self
            .boards
            .iter_mut()
            .find(|b| &b.id == board_id)
            .ok_or_else(|| TaskdeckError::BoardNotFound(board_id.to_string()))?;
        let column = board
            .column_mut(column_id)
            .ok_or_else(|| TaskdeckError::ColumnNotFound {
                board: board_id.to_string(),
                column: column_id.to_string(),
            })?;

        let task = Task::from_draft(TaskId::generate(), draft, column.name.clone());
        column.tasks.push(task.id.clone());
        board.touch();

        self.tasks.insert(task.id.clone(), task.clone());
        self.touch();
        Ok(task)
    }

    /// Merges `update` into a task.
    ///
    /// A new `status` moves the task to the end of the column with that name
    /// on the board currently holding it. When that board has no such
    /// column the status change is dropped and the other fields still apply.
    pub fn update_task(&mut self, task_id: &TaskId, update: &TaskUpdate) -> bool {
        let Some(current_status) = self.tasks.get(task_id).map(|t| t.status.clone()) else {
            debug!(task = %task_id, "update_task: unknown task");
            return false;
        };

        let mut new_status = None;
        if let Some(status) = update.status.as_ref().filter(|s| **s != current_status) {
            match self.position_of(task_id) {
                Some((bi, ci, ti)) => {
                    let board = &mut self.boards[bi];
                    match board.columns.iter().position(|c| &c.name == status) {
                        Some(dest) => {
                            if dest != ci {
                                board.columns[ci].tasks.remove(ti);
                                board.columns[dest].tasks.push(task_id.clone());
                                board.touch();
                            }
                            new_status = Some(status.clone());
                        }
                        None => {
                            debug!(task = %task_id, status = %status, "update_task: no column with that name, status unchanged");
                        }
                    }
                }
                None => new_status = Some(status.clone()),
            }
        }

        if let Some(task) = self.tasks.get_mut(task_id) {
            task.apply_fields(update);
            if let Some(status) = new_status {
                task.set_status(&status);
            }
        }
        self.touch();
        true
    }

    /// Deletes a task and every placement of it
    pub fn delete_task(&mut self, task_id: &TaskId) -> bool {
        if self.tasks.remove(task_id).is_none() {
            debug!(task = %task_id, "delete_task: unknown task");
            return false;
        }
        for board in &mut self.boards {
            let mut removed = false;
            for column in &mut board.columns {
                removed |= column.remove_task(task_id);
            }
            if removed {
                board.touch();
            }
        }
        self.touch();
        true
    }

    /// Moves a task between (or within) columns.
    ///
    /// `new_index` addresses the destination sequence after the task has
    /// been removed from the source, clamped to its length; `None` appends.
    /// The task must currently sit in the source column, so a repeated
    /// cross-column call is a no-op, as is a same-column move that would
    /// leave the task where it is.
    pub fn move_task(
        &mut self,
        task_id: &TaskId,
        source_board_id: &BoardId,
        source_column_id: &ColumnId,
        dest_board_id: &BoardId,
        dest_column_id: &ColumnId,
        new_index: Option<usize>,
    ) -> bool {
        if !self.tasks.contains_key(task_id) {
            debug!(task = %task_id, "move_task: unknown task");
            return false;
        }
        let Some((sb, sc)) = self.column_position(source_board_id, source_column_id) else {
            debug!(board = %source_board_id, column = %source_column_id, "move_task: unknown source");
            return false;
        };
        let Some((db, dc)) = self.column_position(dest_board_id, dest_column_id) else {
            debug!(board = %dest_board_id, column = %dest_column_id, "move_task: unknown destination");
            return false;
        };
        let Some(old_index) = self.boards[sb].columns[sc].position_of(task_id) else {
            debug!(task = %task_id, column = %source_column_id, "move_task: task not in source column");
            return false;
        };

        if (sb, sc) == (db, dc) {
            let column = &mut self.boards[sb].columns[sc];
            let last = column.tasks.len() - 1;
            let target = new_index.map_or(last, |i| i.min(last));
            if target == old_index {
                return false;
            }
            let id = column.tasks.remove(old_index);
            column.tasks.insert(target, id);
        } else {
            self.boards[sb].columns[sc].tasks.remove(old_index);
            self.boards[sb].touch();

            let dest = &mut self.boards[db].columns[dc];
            dest.insert_task(task_id.clone(), new_index);
            let status = dest.name.clone();
            if let Some(task) = self.tasks.get_mut(task_id) {
                task.set_status(&status);
            }
        }

        self.boards[db].touch();
        self.touch();
        true
    }

    fn column_position(&self, board_id: &BoardId, column_id: &ColumnId) -> Option<(usize, usize)> {
        let bi = self.board_index(board_id)?;
        let ci = self.boards[bi].column_index(column_id)?;
        Some((bi, ci))
    }

    // ========== Subtasks, comments, attachments ==========

    /// Runs `f` against a task, committing the workspace timestamp only
    /// when `f` reports a change
    fn with_task<T>(&mut self, task_id: &TaskId, f: impl FnOnce(&mut Task) -> Option<T>) -> Option<T> {
        let Some(task) = self.tasks.get_mut(task_id) else {
            debug!(task = %task_id, "unknown task");
            return None;
        };
        let result = f(task)?;
        self.touch();
        Some(result)
    }

    pub fn add_subtask(&mut self, task_id: &TaskId, title: String) -> Option<Subtask> {
        self.with_task(task_id, |task| Some(task.add_subtask(title)))
    }

    pub fn update_subtask(
        &mut self,
        task_id: &TaskId,
        subtask_id: &SubtaskId,
        update: &SubtaskUpdate,
    ) -> bool {
        self.with_task(task_id, |task| task.update_subtask(subtask_id, update).then_some(()))
            .is_some()
    }

    pub fn toggle_subtask(&mut self, task_id: &TaskId, subtask_id: &SubtaskId) -> bool {
        self.with_task(task_id, |task| task.toggle_subtask(subtask_id).then_some(()))
            .is_some()
    }

    pub fn delete_subtask(&mut self, task_id: &TaskId, subtask_id: &SubtaskId) -> bool {
        self.with_task(task_id, |task| task.delete_subtask(subtask_id).then_some(()))
            .is_some()
    }

    pub fn add_comment(&mut self, task_id: &TaskId, author: String, text: String) -> Option<Comment> {
        self.with_task(task_id, |task| Some(task.add_comment(author, text)))
    }

    pub fn delete_comment(&mut self, task_id: &TaskId, comment_id: &CommentId) -> bool {
        self.with_task(task_id, |task| task.delete_comment(comment_id).then_some(()))
            .is_some()
    }

    pub fn add_attachment(&mut self, task_id: &TaskId, draft: AttachmentDraft) -> Option<Attachment> {
        self.with_task(task_id, |task| Some(task.add_attachment(draft)))
    }

    pub fn delete_attachment(&mut self, task_id: &TaskId, attachment_id: &AttachmentId) -> bool {
        self.with_task(task_id, |task| task.delete_attachment(attachment_id).then_some(()))
            .is_some()
    }

    // ========== Consistency ==========

    /// Lists every violation of the placement invariants
    pub fn check_consistency(&self) -> Vec<ConsistencyIssue> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();

        for column in self.boards.iter().flat_map(|b| b.columns.iter()) {
            for task_id in &column.tasks {
                if !seen.insert(task_id) {
                    issues.push(ConsistencyIssue::DuplicatePlacement {
                        task_id: task_id.clone(),
                    });
                }
                match self.tasks.get(task_id) {
                    None => issues.push(ConsistencyIssue::DanglingPlacement {
                        column_id: column.id.clone(),
                        task_id: task_id.clone(),
                    }),
                    Some(task) if task.status != column.name => {
                        issues.push(ConsistencyIssue::StatusMismatch {
                            task_id: task_id.clone(),
                            status: task.status.clone(),
                            column: column.name.clone(),
                        })
                    }
                    Some(_) => {}
                }
            }
        }

        let mut unplaced: Vec<&TaskId> = self.tasks.keys().filter(|id| !seen.contains(id)).collect();
        unplaced.sort();
        issues.extend(unplaced.into_iter().map(|id| ConsistencyIssue::Unplaced {
            task_id: id.clone(),
        }));

        issues
    }

    /// Restores the placement invariants, returning the number of repairs.
    ///
    /// Dangling and duplicate placements are dropped (the first placement
    /// wins), statuses follow their column, and unplaced tasks go to the
    /// first column named after their status, else the first column of the
    /// first board. Unplaced tasks are discarded only when there is no
    /// column at all.
    pub fn repair(&mut self) -> usize {
        let Self { boards, tasks, .. } = self;
        let mut repairs = 0;
        let mut seen: HashSet<TaskId> = HashSet::new();

        for column in boards.iter_mut().flat_map(|b| b.columns.iter_mut()) {
            let before = column.tasks.len();
            column
                .tasks
                .retain(|id| tasks.contains_key(id) && seen.insert(id.clone()));
            repairs += before - column.tasks.len();

            for task_id in &column.tasks {
                if let Some(task) = tasks.get_mut(task_id) {
                    if task.status != column.name {
                        task.status = column.name.clone();
                        repairs += 1;
                    }
                }
            }
        }

        let mut unplaced: Vec<TaskId> = tasks
            .keys()
            .filter(|id| !seen.contains(*id))
            .cloned()
            .collect();
        unplaced.sort();

        for task_id in unplaced {
            repairs += 1;
            let status = tasks[&task_id].status.clone();
            let target = boards
                .iter()
                .enumerate()
                .find_map(|(bi, b)| {
                    b.columns
                        .iter()
                        .position(|c| c.name == status)
                        .map(|ci| (bi, ci))
                })
                .or_else(|| {
                    boards
                        .first()
                        .filter(|b| !b.columns.is_empty())
                        .map(|_| (0, 0))
                });

            match target {
                Some((bi, ci)) => {
                    let column = &mut boards[bi].columns[ci];
                    column.tasks.push(task_id.clone());
                    if let Some(task) = tasks.get_mut(&task_id) {
                        task.status = column.name.clone();
                    }
                }
                None => {
                    warn!(task = %task_id, "discarding task: workspace has no columns");
                    tasks.remove(&task_id);
                }
            }
        }

        repairs
    }
}
