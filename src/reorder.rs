//! Drag-and-drop reorder engine.
//!
//! Turns a start/over/end gesture into [`ReorderCommand`]s without knowing
//! anything about pointers or input devices. Callers pass the current
//! workspace on every event and apply the returned command through the
//! store (or directly with [`ReorderCommand::apply`]).
//!
//! Placement rules:
//! - hovering a task in another column moves the dragged task into that
//!   column right away, in front of the hovered task; hovering the column
//!   itself appends
//! - reordering inside a column is decided on drop only: dropping on a task
//!   lands immediately before it, dropping on the column appends
//! - columns are reordered on drop only, taking the index of the target
//!   column (a task target stands for its column)
//! - anything that cannot be resolved ends the gesture without a command

use crate::domain::{Board, BoardId, Column, ColumnId, Task, TaskId, Workspace};
use tracing::debug;

/// A placement change produced by a drag gesture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorderCommand {
    MoveTask {
        task_id: TaskId,
        source_board_id: BoardId,
        source_column_id: ColumnId,
        dest_board_id: BoardId,
        dest_column_id: ColumnId,
        /// Post-removal index in the destination column
        index: Option<usize>,
    },
    MoveColumn {
        board_id: BoardId,
        column_id: ColumnId,
        new_index: usize,
    },
}

impl ReorderCommand {
    /// Applies the command, returning whether the workspace changed
    pub fn apply(&self, workspace: &mut Workspace) -> bool {
        match self {
            Self::MoveTask {
                task_id,
                source_board_id,
                source_column_id,
                dest_board_id,
                dest_column_id,
                index,
            } => workspace.move_task(
                task_id,
                source_board_id,
                source_column_id,
                dest_board_id,
                dest_column_id,
                *index,
            ),
            Self::MoveColumn {
                board_id,
                column_id,
                new_index,
            } => workspace.move_column(board_id, column_id, *new_index),
        }
    }
}

/// Gesture state
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    DraggingTask {
        board_id: BoardId,
        task_id: TaskId,
        /// Copy for the drag overlay; `None` if the task map lacks the ID
        snapshot: Option<Task>,
    },
    DraggingColumn {
        board_id: BoardId,
        column_id: ColumnId,
        snapshot: Column,
    },
}

/// Where a pointer is hovering
struct DropTarget {
    column_index: usize,
    /// Index of the hovered task, `None` when hovering the column itself
    task_index: Option<usize>,
}

fn resolve_target(board: &Board, over_id: &str) -> Option<DropTarget> {
    if let Some(column_index) = board.columns.iter().position(|c| c.id.as_str() == over_id) {
        return Some(DropTarget {
            column_index,
            task_index: None,
        });
    }
    board.columns.iter().enumerate().find_map(|(column_index, column)| {
        column
            .tasks
            .iter()
            .position(|id| id.as_str() == over_id)
            .map(|task_index| DropTarget {
                column_index,
                task_index: Some(task_index),
            })
    })
}

fn move_into_other_column(
    board: &Board,
    task_id: &TaskId,
    source: usize,
    target: &DropTarget,
) -> ReorderCommand {
    let dest = &board.columns[target.column_index];
    ReorderCommand::MoveTask {
        task_id: task_id.clone(),
        source_board_id: board.id.clone(),
        source_column_id: board.columns[source].id.clone(),
        dest_board_id: board.id.clone(),
        dest_column_id: dest.id.clone(),
        index: Some(target.task_index.unwrap_or(dest.tasks.len())),
    }
}

/// Idle/Dragging state machine for one board at a time
#[derive(Debug, Default)]
pub struct DragEngine {
    state: DragState,
}

impl DragEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.state != DragState::Idle
    }

    pub fn active_task(&self) -> Option<&Task> {
        match &self.state {
            DragState::DraggingTask { snapshot, .. } => snapshot.as_ref(),
            _ => None,
        }
    }

    pub fn active_column(&self) -> Option<&Column> {
        match &self.state {
            DragState::DraggingColumn { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }

    /// Arms the engine. An ID matching a column of the board starts a
    /// column drag, anything else a task drag. Unknown boards leave the
    /// engine idle.
    pub fn drag_start(&mut self, workspace: &Workspace, board_id: &BoardId, active_id: &str) {
        let Some(board) = workspace.board(board_id) else {
            debug!(board = %board_id, "drag start on unknown board ignored");
            self.state = DragState::Idle;
            return;
        };

        self.state = match board.columns.iter().find(|c| c.id.as_str() == active_id) {
            Some(column) => DragState::DraggingColumn {
                board_id: board_id.clone(),
                column_id: column.id.clone(),
                snapshot: column.clone(),
            },
            None => {
                let task_id = TaskId::from(active_id);
                let snapshot = workspace.task(&task_id).cloned();
                DragState::DraggingTask {
                    board_id: board_id.clone(),
                    task_id,
                    snapshot,
                }
            }
        };
        debug!(active = active_id, "drag started");
    }

    /// Handles the pointer crossing a drop target. Only a task hovering a
    /// different column yields a command.
    pub fn drag_over(&mut self, workspace: &Workspace, over_id: Option<&str>) -> Option<ReorderCommand> {
        let DragState::DraggingTask {
            board_id, task_id, ..
        } = &self.state
        else {
            return None;
        };
        let over_id = over_id.filter(|id| *id != task_id.as_str())?;
        let board = workspace.board(board_id)?;

        let Some(source) = board.columns.iter().position(|c| c.contains(task_id)) else {
            debug!(task = %task_id, "dragged task not found in any column");
            return None;
        };
        let target = resolve_target(board, over_id)?;
        if target.column_index == source {
            return None;
        }
        Some(move_into_other_column(board, task_id, source, &target))
    }

    /// Finishes the gesture. The engine is idle afterwards whatever the
    /// outcome; `over_id == None` means the drop landed outside any target.
    pub fn drag_end(&mut self, workspace: &Workspace, over_id: Option<&str>) -> Option<ReorderCommand> {
        let state = std::mem::take(&mut self.state);
        let over_id = over_id?;

        match state {
            DragState::Idle => None,
            DragState::DraggingColumn {
                board_id,
                column_id,
                ..
            } => {
                let board = workspace.board(&board_id)?;
                let old_index = board.column_index(&column_id)?;
                let new_index = resolve_target(board, over_id)?.column_index;
                (old_index != new_index).then_some(ReorderCommand::MoveColumn {
                    board_id,
                    column_id,
                    new_index,
                })
            }
            DragState::DraggingTask {
                board_id, task_id, ..
            } => {
                if over_id == task_id.as_str() {
                    return None;
                }
                let board = workspace.board(&board_id)?;
                let Some(source) = board.columns.iter().position(|c| c.contains(&task_id)) else {
                    debug!(task = %task_id, "dragged task not found in any column");
                    return None;
                };
                let target = resolve_target(board, over_id)?;
                if target.column_index != source {
                    return Some(move_into_other_column(board, &task_id, source, &target));
                }

                let column = &board.columns[source];
                let old_index = column.position_of(&task_id)?;
                let new_index = match target.task_index {
                    Some(over) if over > old_index => over - 1,
                    Some(over) => over,
                    None => column.tasks.len() - 1,
                };
                (new_index != old_index).then(|| ReorderCommand::MoveTask {
                    task_id,
                    source_board_id: board.id.clone(),
                    source_column_id: column.id.clone(),
                    dest_board_id: board.id.clone(),
                    dest_column_id: column.id.clone(),
                    index: Some(new_index),
                })
            }
        }
    }

    /// Aborts the gesture without a command
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }
}
