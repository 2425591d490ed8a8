pub mod board;
pub mod id;
pub mod sorting;
pub mod task;
pub mod views;
pub mod workspace;

pub use board::{default_column_names, Board, BoardUpdate, Column, ColumnUpdate, DEFAULT_COLUMNS};
pub use id::{
    AttachmentId, BoardId, ChecklistItemId, ColumnId, CommentId, MemberId, SubtaskId, TaskId, WorkspaceId,
};
pub use sorting::{sort_tasks, SortField, SortOrder};
pub use task::{
    Attachment, AttachmentDraft, ChecklistItem, Comment, Priority, Subtask, SubtaskUpdate, Task, TaskDraft,
    TaskUpdate,
};
pub use workspace::{ConsistencyIssue, Member, MemberRole, TaskLocation, Workspace};
