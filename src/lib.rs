//! # Taskdeck Core
//!
//! Workspace data store and drag-and-drop reorder engine for kanban-style
//! project management.
//!
//! A [`Workspace`] owns boards, columns and an ID-keyed task map; columns
//! only hold task IDs. [`WorkspaceStore`] keeps the active workspace,
//! persists it through a [`Storage`] backend and notifies subscribers.
//! [`DragEngine`] turns drag gestures into [`ReorderCommand`]s.

pub mod config;
pub mod domain;
pub mod error;
pub mod reorder;
pub mod storage;
pub mod store;

// Re-export commonly used types
pub use config::StoreConfig;
pub use domain::{
    Attachment, AttachmentDraft, Board, BoardId, BoardUpdate, ChecklistItem, Column, ColumnId,
    ColumnUpdate, Comment, Priority, Subtask, SubtaskUpdate, Task, TaskDraft, TaskId, TaskUpdate,
    Workspace,
};
pub use error::{Result, TaskdeckError};
pub use reorder::{DragEngine, DragState, ReorderCommand};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::WorkspaceStore;
