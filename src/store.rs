//! The persistent workspace store.
//!
//! Holds the single active [`Workspace`] as an immutable snapshot. Every
//! mutation clones the snapshot, applies a mutator, and only if something
//! changed swaps the new snapshot in, notifies subscribers and writes the
//! whole state through to [`Storage`]. Persistence is best effort: a failed
//! write is logged and kept as a warning, never undoing the mutation.

use crate::{
    config::StoreConfig,
    domain::{
        Attachment, AttachmentDraft, AttachmentId, Board, BoardId, BoardUpdate, Column, ColumnId,
        ColumnUpdate, Comment, CommentId, Subtask, SubtaskId, SubtaskUpdate, Task, TaskDraft,
        TaskId, TaskUpdate, Workspace,
    },
    error::{Result, TaskdeckError},
    reorder::ReorderCommand,
    storage::Storage,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Version tag of the persisted envelope
const PERSIST_VERSION: u32 = 0;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PersistedStateRef<'a> {
    workspace: &'a Workspace,
    active_board: Option<&'a BoardId>,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    state: PersistedStateRef<'a>,
    version: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedState {
    workspace: Workspace,
    #[serde(default)]
    active_board: Option<BoardId>,
}

/// Builds the workspace a first start (or an unreadable blob) begins with
pub fn default_workspace(config: &StoreConfig) -> Workspace {
    let mut workspace = Workspace::new(
        config.workspace_name.clone(),
        config.workspace_description.clone(),
    );
    workspace.create_board(
        config.board_name.clone(),
        config.board_description.clone(),
        &config.default_columns,
    );
    workspace
}

/// Key an unreadable blob stored under `key` is copied to on load
pub fn backup_key(key: &str) -> String {
    format!("{}-unreadable", key)
}

/// Parses a persisted envelope, lifting embedded task objects and
/// repairing placement invariants
fn decode(raw: &str) -> Result<(Workspace, Option<BoardId>)> {
    let mut envelope: Value = serde_json::from_str(raw)?;
    let state = envelope
        .get_mut("state")
        .ok_or_else(|| TaskdeckError::StorageError("persisted blob has no state".to_string()))?;

    if let Some(workspace) = state.get_mut("workspace") {
        let lifted = lift_embedded_tasks(workspace);
        if lifted > 0 {
            info!(lifted, "converted embedded task entries to task IDs");
        }
    }

    let PersistedState {
        mut workspace,
        active_board,
    } = serde_json::from_value(state.take())?;

    let repairs = workspace.repair();
    if repairs > 0 {
        warn!(repairs, "repaired inconsistent task placement in persisted workspace");
    }

    let active_board = active_board.filter(|id| workspace.board(id).is_some());
    Ok((workspace, active_board))
}

/// Older blobs may hold whole task objects inside column sequences.
/// Replaces each with its ID, adding the object to the task map unless the
/// map already has that ID. Entries that are neither IDs nor tasks are
/// dropped.
fn lift_embedded_tasks(workspace: &mut Value) -> usize {
    let mut embedded: Vec<(String, Value)> = Vec::new();

    let columns = workspace
        .get_mut("boards")
        .and_then(Value::as_array_mut)
        .into_iter()
        .flatten()
        .filter_map(|board| board.get_mut("columns").and_then(Value::as_array_mut))
        .flatten();

    for column in columns {
        let Some(entries) = column.get_mut("tasks").and_then(Value::as_array_mut) else {
            continue;
        };
        for entry in entries.iter_mut() {
            let Some(id) = entry.get("id").and_then(Value::as_str).map(str::to_string) else {
                continue;
            };
            let task = std::mem::replace(entry, Value::String(id.clone()));
            embedded.push((id, task));
        }
        entries.retain(Value::is_string);
    }

    let count = embedded.len();
    if count > 0 {
        if let Some(root) = workspace.as_object_mut() {
            let tasks = root
                .entry("tasks")
                .or_insert_with(|| Value::Object(Map::new()));
            if let Some(tasks) = tasks.as_object_mut() {
                for (id, task) in embedded {
                    tasks.entry(id).or_insert(task);
                }
            }
        }
    }
    count
}

/// Single-writer store for the active workspace
pub struct WorkspaceStore<S: Storage> {
    storage: S,
    config: StoreConfig,
    state: watch::Sender<Arc<Workspace>>,
    active_board: Option<BoardId>,
    persist_warning: Option<TaskdeckError>,
}

impl<S: Storage> WorkspaceStore<S> {
    /// Rehydrates from `storage`, falling back to the default workspace when
    /// nothing was persisted or the blob cannot be read. Never fails.
    pub async fn load(storage: S, config: StoreConfig) -> Self {
        let key = config.storage_key.clone();
        let (workspace, active_board) = match storage.get_item(&key).await {
            Ok(Some(raw)) => match decode(&raw) {
                Ok(restored) => {
                    info!(key = %key, "restored persisted workspace");
                    restored
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "unreadable persisted workspace, starting fresh");
                    Self::back_up_unreadable(&storage, &key, &raw).await;
                    (default_workspace(&config), None)
                }
            },
            Ok(None) => {
                info!(key = %key, "no persisted workspace, starting fresh");
                (default_workspace(&config), None)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "cannot read persisted workspace, starting fresh");
                (default_workspace(&config), None)
            }
        };

        let (state, _) = watch::channel(Arc::new(workspace));
        Self {
            storage,
            config,
            state,
            active_board,
            persist_warning: None,
        }
    }

    /// Copies a blob that failed to decode to [`backup_key`] so the next
    /// commit does not destroy it
    async fn back_up_unreadable(storage: &S, key: &str, raw: &str) {
        let backup = backup_key(key);
        match storage.set_item(&backup, raw).await {
            Ok(()) => info!(key = %key, backup = %backup, "kept unreadable workspace blob"),
            Err(e) => warn!(key = %key, backup = %backup, error = %e, "could not keep unreadable workspace blob"),
        }
    }

    /// Current read-only snapshot
    pub fn state(&self) -> Arc<Workspace> {
        self.state.borrow().clone()
    }

    /// Receives the new snapshot after every committed mutation
    pub fn subscribe(&self) -> watch::Receiver<Arc<Workspace>> {
        self.state.subscribe()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Takes the last persistence failure, if any
    pub fn take_persist_warning(&mut self) -> Option<TaskdeckError> {
        self.persist_warning.take()
    }

    /// Writes the current state again, returning the storage result
    pub async fn flush(&mut self) -> Result<()> {
        self.write_through().await?;
        self.persist_warning = None;
        Ok(())
    }

    /// Replaces everything with a fresh default workspace
    pub async fn reset(&mut self) {
        self.active_board = None;
        self.commit(default_workspace(&self.config)).await;
    }

    async fn commit(&mut self, next: Workspace) {
        self.state.send_replace(Arc::new(next));
        self.persist().await;
    }

    async fn persist(&mut self) {
        if let Err(e) = self.write_through().await {
            warn!(key = %self.config.storage_key, error = %e, "failed to persist workspace, keeping in-memory state");
            self.persist_warning = Some(e);
        }
    }

    async fn write_through(&self) -> Result<()> {
        let workspace = self.state();
        let blob = serde_json::to_string(&EnvelopeRef {
            state: PersistedStateRef {
                workspace: &workspace,
                active_board: self.active_board.as_ref(),
            },
            version: PERSIST_VERSION,
        })?;
        self.storage.set_item(&self.config.storage_key, &blob).await
    }

    /// Applies `f` to a copy of the workspace and commits it when `f`
    /// reports a change
    async fn mutate<T>(&mut self, f: impl FnOnce(&mut Workspace) -> Option<T>) -> Option<T> {
        let mut next = Workspace::clone(&self.state());
        let result = f(&mut next)?;
        self.commit(next).await;
        Some(result)
    }

    async fn mutate_flag(&mut self, f: impl FnOnce(&mut Workspace) -> bool) -> bool {
        self.mutate(|ws| f(ws).then_some(())).await.is_some()
    }

    // ========== Active board ==========

    pub fn active_board(&self) -> Option<&BoardId> {
        self.active_board.as_ref()
    }

    /// The selected board, else the first board
    pub fn current_board(&self) -> Option<Board> {
        let workspace = self.state();
        let board = match &self.active_board {
            Some(id) => workspace.board(id),
            None => workspace.boards.first(),
        };
        board.cloned()
    }

    pub async fn set_active_board(&mut self, board_id: &BoardId) -> bool {
        if self.state().board(board_id).is_none() {
            debug!(board = %board_id, "set_active_board: unknown board");
            return false;
        }
        if self.active_board.as_ref() == Some(board_id) {
            return false;
        }
        self.active_board = Some(board_id.clone());
        self.persist().await;
        true
    }

    // ========== Boards ==========

    /// Adds a board with the configured default columns
    pub async fn create_board(&mut self, name: impl Into<String>, description: impl Into<String>) -> Board {
        let columns = self.config.default_columns.clone();
        let mut next = Workspace::clone(&self.state());
        let board = next.create_board(name.into(), description.into(), &columns);
        self.commit(next).await;
        board
    }

    pub async fn update_board(&mut self, board_id: &BoardId, update: BoardUpdate) -> bool {
        self.mutate_flag(|ws| ws.update_board(board_id, &update)).await
    }

    /// Deletes a board with its tasks, clearing the selection if it pointed
    /// at that board
    pub async fn delete_board(&mut self, board_id: &BoardId) -> bool {
        let mut next = Workspace::clone(&self.state());
        if !next.delete_board(board_id) {
            return false;
        }
        if self.active_board.as_ref() == Some(board_id) {
            self.active_board = None;
        }
        self.commit(next).await;
        true
    }

    // ========== Columns ==========

    pub async fn create_column(&mut self, board_id: &BoardId, name: impl Into<String>) -> Option<Column> {
        let name = name.into();
        self.mutate(|ws| ws.create_column(board_id, name)).await
    }

    pub async fn update_column(&mut self, board_id: &BoardId, column_id: &ColumnId, update: ColumnUpdate) -> bool {
        self.mutate_flag(|ws| ws.update_column(board_id, column_id, &update))
            .await
    }

    pub async fn delete_column(&mut self, board_id: &BoardId, column_id: &ColumnId) -> bool {
        self.mutate_flag(|ws| ws.delete_column(board_id, column_id)).await
    }

    pub async fn move_column(&mut self, board_id: &BoardId, column_id: &ColumnId, new_index: usize) -> bool {
        self.mutate_flag(|ws| ws.move_column(board_id, column_id, new_index))
            .await
    }

    // ========== Tasks ==========

    /// Creates a task at the end of a column. Fails when the board or
    /// column is unknown; nothing is committed in that case.
    pub async fn create_task(&mut self, board_id: &BoardId, column_id: &ColumnId, draft: TaskDraft) -> Result<Task> {
        let mut next = Workspace::clone(&self.state());
        let task = next.create_task(board_id, column_id, draft)?;
        self.commit(next).await;
        Ok(task)
    }

    pub async fn update_task(&mut self, task_id: &TaskId, update: TaskUpdate) -> bool {
        self.mutate_flag(|ws| ws.update_task(task_id, &update)).await
    }

    pub async fn delete_task(&mut self, task_id: &TaskId) -> bool {
        self.mutate_flag(|ws| ws.delete_task(task_id)).await
    }

    pub async fn move_task(
        &mut self,
        task_id: &TaskId,
        source_board_id: &BoardId,
        source_column_id: &ColumnId,
        dest_board_id: &BoardId,
        dest_column_id: &ColumnId,
        new_index: Option<usize>,
    ) -> bool {
        self.mutate_flag(|ws| {
            ws.move_task(
                task_id,
                source_board_id,
                source_column_id,
                dest_board_id,
                dest_column_id,
                new_index,
            )
        })
        .await
    }

    /// Executes a command produced by the drag engine
    pub async fn apply_reorder(&mut self, command: &ReorderCommand) -> bool {
        self.mutate_flag(|ws| command.apply(ws)).await
    }

    // ========== Subtasks, comments, attachments ==========

    pub async fn add_subtask(&mut self, task_id: &TaskId, title: impl Into<String>) -> Option<Subtask> {
        let title = title.into();
        self.mutate(|ws| ws.add_subtask(task_id, title)).await
    }

    pub async fn update_subtask(&mut self, task_id: &TaskId, subtask_id: &SubtaskId, update: SubtaskUpdate) -> bool {
        self.mutate_flag(|ws| ws.update_subtask(task_id, subtask_id, &update))
            .await
    }

    pub async fn toggle_subtask(&mut self, task_id: &TaskId, subtask_id: &SubtaskId) -> bool {
        self.mutate_flag(|ws| ws.toggle_subtask(task_id, subtask_id)).await
    }

    pub async fn delete_subtask(&mut self, task_id: &TaskId, subtask_id: &SubtaskId) -> bool {
        self.mutate_flag(|ws| ws.delete_subtask(task_id, subtask_id)).await
    }

    pub async fn add_comment(
        &mut self,
        task_id: &TaskId,
        author: impl Into<String>,
        text: impl Into<String>,
    ) -> Option<Comment> {
        let (author, text) = (author.into(), text.into());
        self.mutate(|ws| ws.add_comment(task_id, author, text)).await
    }

    pub async fn delete_comment(&mut self, task_id: &TaskId, comment_id: &CommentId) -> bool {
        self.mutate_flag(|ws| ws.delete_comment(task_id, comment_id)).await
    }

    pub async fn add_attachment(&mut self, task_id: &TaskId, draft: AttachmentDraft) -> Option<Attachment> {
        self.mutate(|ws| ws.add_attachment(task_id, draft)).await
    }

    pub async fn delete_attachment(&mut self, task_id: &TaskId, attachment_id: &AttachmentId) -> bool {
        self.mutate_flag(|ws| ws.delete_attachment(task_id, attachment_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reorder::DragEngine;
    use crate::storage::{FileStorage, MemoryStorage};
    use tempfile::TempDir;

    async fn memory_store() -> (Arc<MemoryStorage>, WorkspaceStore<Arc<MemoryStorage>>) {
        let storage = Arc::new(MemoryStorage::new());
        let store = WorkspaceStore::load(storage.clone(), StoreConfig::default()).await;
        (storage, store)
    }

    fn columns(store: &WorkspaceStore<impl Storage>) -> (BoardId, Vec<ColumnId>, Vec<String>) {
        let board = store.current_board().unwrap();
        let ids = board.columns.iter().map(|c| c.id.clone()).collect();
        let names = board.columns.iter().map(|c| c.name.clone()).collect();
        (board.id, ids, names)
    }

    #[tokio::test]
    async fn test_first_start_builds_default_workspace() {
        let (storage, store) = memory_store().await;
        let state = store.state();

        assert_eq!(state.name, "My Workspace");
        assert_eq!(state.boards.len(), 1);
        assert_eq!(state.boards[0].name, "Main Project");
        assert!(state.tasks.is_empty());

        let (_, _, names) = columns(&store);
        assert_eq!(names, vec!["To Do", "In Progress", "Done"]);
        // nothing written until the first mutation
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_board_scenarios() {
        let (_storage, mut store) = memory_store().await;
        let (board, cols, _) = columns(&store);

        // A: create in "To Do"
        let task = store
            .create_task(&board, &cols[0], TaskDraft::new("X"))
            .await
            .unwrap();
        let state = store.state();
        assert_eq!(state.column(&board, &cols[0]).unwrap().tasks, vec![task.id.clone()]);
        assert_eq!(state.task(&task.id).unwrap().status, "To Do");

        // B: move to "Done"
        assert!(
            store
                .move_task(&task.id, &board, &cols[0], &board, &cols[2], None)
                .await
        );
        let state = store.state();
        assert!(state.column(&board, &cols[0]).unwrap().tasks.is_empty());
        assert_eq!(state.column(&board, &cols[2]).unwrap().tasks, vec![task.id.clone()]);
        assert_eq!(state.task(&task.id).unwrap().status, "Done");

        // C: deleting "Done" deletes the task
        assert!(store.delete_column(&board, &cols[2]).await);
        let state = store.state();
        assert!(state.task(&task.id).is_none());
        assert!(state.column(&board, &cols[2]).is_none());
        assert!(state.check_consistency().is_empty());
    }

    #[tokio::test]
    async fn test_move_column_scenario() {
        let (_storage, mut store) = memory_store().await;
        let (board, cols, _) = columns(&store);

        assert!(store.move_column(&board, &cols[1], 0).await);

        let (_, _, names) = columns(&store);
        assert_eq!(names, vec!["In Progress", "To Do", "Done"]);
    }

    #[tokio::test]
    async fn test_unknown_task_update_changes_nothing() {
        let (storage, mut store) = memory_store().await;
        let before = store.state();
        let rx = store.subscribe();

        assert!(!store.update_task(&TaskId::from("unknown"), TaskUpdate::title("Y")).await);

        assert!(Arc::ptr_eq(&before, &store.state()));
        assert!(!rx.has_changed().unwrap());
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_columns_append_in_order() {
        let (_storage, mut store) = memory_store().await;
        let (board, _, _) = columns(&store);

        let first = store.create_column(&board, "Review").await.unwrap();
        let second = store.create_column(&board, "Blocked").await.unwrap();

        assert_ne!(first.id, second.id);
        let (_, _, names) = columns(&store);
        assert_eq!(names, vec!["To Do", "In Progress", "Done", "Review", "Blocked"]);
        assert!(store.create_column(&BoardId::from("ghost"), "X").await.is_none());
    }

    #[tokio::test]
    async fn test_create_task_unknown_column_commits_nothing() {
        let (storage, mut store) = memory_store().await;
        let (board, _, _) = columns(&store);

        let result = store
            .create_task(&board, &ColumnId::from("ghost"), TaskDraft::new("X"))
            .await;

        assert!(matches!(result, Err(TaskdeckError::ColumnNotFound { .. })));
        assert!(store.state().tasks.is_empty());
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_state_survives_reload() {
        let (storage, mut store) = memory_store().await;
        let (board, cols, _) = columns(&store);
        let task = store
            .create_task(&board, &cols[1], TaskDraft::new("Persist me"))
            .await
            .unwrap();
        store.add_subtask(&task.id, "step").await.unwrap();
        let other = store.create_board("Second", "").await;
        assert!(store.set_active_board(&other.id).await);

        let reloaded = WorkspaceStore::load(storage.clone(), StoreConfig::default()).await;

        assert_eq!(*reloaded.state(), *store.state());
        assert_eq!(reloaded.active_board(), Some(&other.id));
        assert_eq!(reloaded.current_board().unwrap().name, "Second");
    }

    #[tokio::test]
    async fn test_file_backed_reload() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = WorkspaceStore::load(FileStorage::new(temp_dir.path()), StoreConfig::default()).await;
        let (board, cols, _) = columns(&store);
        store
            .create_task(&board, &cols[0], TaskDraft::new("On disk"))
            .await
            .unwrap();

        assert!(temp_dir.path().join("workspace-storage.json").exists());

        let reloaded = WorkspaceStore::load(FileStorage::new(temp_dir.path()), StoreConfig::default()).await;
        assert_eq!(*reloaded.state(), *store.state());
    }

    #[tokio::test]
    async fn test_corrupt_blob_falls_back_to_default() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item("workspace-storage", "{not json").await.unwrap();

        let store = WorkspaceStore::load(storage.clone(), StoreConfig::default()).await;

        assert_eq!(store.state().boards.len(), 1);
        assert!(store.state().tasks.is_empty());
        assert_eq!(
            storage.get_item("workspace-storage-unreadable").await.unwrap().as_deref(),
            Some("{not json")
        );

        storage
            .set_item("workspace-storage", r#"{"version": 0}"#)
            .await
            .unwrap();
        let store = WorkspaceStore::load(storage, StoreConfig::default()).await;
        assert_eq!(store.state().boards[0].name, "Main Project");
    }

    #[tokio::test]
    async fn test_date_picker_due_dates_load_and_persist() {
        let blob = r#"{
            "state": {
                "workspace": {
                    "id": "ws",
                    "name": "Mine",
                    "boards": [{
                        "id": "b1",
                        "name": "Real Board",
                        "columns": [{"id": "c1", "name": "To Do", "tasks": ["t1"]}]
                    }],
                    "tasks": {
                        "t1": {"id": "t1", "title": "Keep me", "status": "To Do",
                               "priority": "high", "dueDate": "2024-05-10",
                               "createdAt": "2024-01-01T00:00:00.000Z"}
                    }
                },
                "activeBoard": "b1"
            },
            "version": 0
        }"#;
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item("workspace-storage", blob).await.unwrap();

        let mut store = WorkspaceStore::load(storage.clone(), StoreConfig::default()).await;
        let board = BoardId::from("b1");
        assert_eq!(store.current_board().unwrap().name, "Real Board");
        let due = store.state().task(&TaskId::from("t1")).unwrap().due_date;
        assert_eq!(due.map(|d| d.date_naive().to_string()).as_deref(), Some("2024-05-10"));

        store.create_column(&board, "Review").await.unwrap();

        let persisted = storage.get_item("workspace-storage").await.unwrap().unwrap();
        assert!(persisted.contains("Keep me"));
        assert!(storage.get_item("workspace-storage-unreadable").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_task_details_survive_reload() {
        let (storage, mut store) = memory_store().await;
        let (board, cols, _) = columns(&store);
        let task = store
            .create_task(&board, &cols[0], TaskDraft::new("Detailed"))
            .await
            .unwrap();

        let subtask = store.add_subtask(&task.id, "draft").await.unwrap();
        assert!(
            store
                .update_subtask(
                    &task.id,
                    &subtask.id,
                    SubtaskUpdate {
                        title: Some("final draft".to_string()),
                        completed: Some(true),
                    },
                )
                .await
        );
        let kept = store.add_comment(&task.id, "Ana", "looks good").await.unwrap();
        let dropped = store.add_comment(&task.id, "Ana", "typo").await.unwrap();
        assert!(store.delete_comment(&task.id, &dropped.id).await);
        let attachment = store
            .add_attachment(
                &task.id,
                AttachmentDraft {
                    name: "brief.pdf".to_string(),
                    url: "blob:brief".to_string(),
                    kind: "application/pdf".to_string(),
                    size: 2048,
                },
            )
            .await
            .unwrap();
        assert!(
            store
                .update_board(
                    &board,
                    BoardUpdate {
                        name: Some("Launch".to_string()),
                        description: None,
                    },
                )
                .await
        );

        let reloaded = WorkspaceStore::load(storage.clone(), StoreConfig::default()).await;
        let state = reloaded.state();
        let restored = state.task(&task.id).unwrap();
        assert_eq!(restored.subtasks[0].title, "final draft");
        assert_eq!(restored.subtask_progress(), (1, 1));
        assert_eq!(restored.comments, vec![kept]);
        assert_eq!(restored.attachments, vec![attachment.clone()]);
        assert_eq!(state.board(&board).unwrap().name, "Launch");

        assert!(store.delete_attachment(&task.id, &attachment.id).await);
        assert!(!store.delete_attachment(&task.id, &attachment.id).await);
        assert!(store.add_comment(&TaskId::from("ghost"), "Ana", "x").await.is_none());
        let reloaded = WorkspaceStore::load(storage, StoreConfig::default()).await;
        assert!(reloaded.state().task(&task.id).unwrap().attachments.is_empty());
    }

    #[tokio::test]
    async fn test_quota_failure_is_a_warning() {
        let storage = Arc::new(MemoryStorage::with_quota(4096));
        let mut store = WorkspaceStore::load(storage.clone(), StoreConfig::default()).await;
        let (board, cols, _) = columns(&store);

        let big = TaskDraft::new("Big").with_description("x".repeat(8192));
        let task = store.create_task(&board, &cols[0], big).await.unwrap();

        assert!(store.state().task(&task.id).is_some());
        assert!(matches!(
            store.take_persist_warning(),
            Some(TaskdeckError::QuotaExceeded { .. })
        ));
        assert!(store.take_persist_warning().is_none());

        // shrinking the task lets the next write through
        store
            .update_task(
                &task.id,
                TaskUpdate {
                    description: Some(String::new()),
                    ..TaskUpdate::default()
                },
            )
            .await;
        assert!(store.take_persist_warning().is_none());
        assert!(store.flush().await.is_ok());
    }

    #[tokio::test]
    async fn test_subscribers_see_every_commit() {
        let (_storage, mut store) = memory_store().await;
        let (board, cols, _) = columns(&store);
        let mut rx = store.subscribe();

        let task = store
            .create_task(&board, &cols[0], TaskDraft::new("Watched"))
            .await
            .unwrap();

        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert!(seen.task(&task.id).is_some());

        store.delete_task(&task.id).await;
        rx.changed().await.unwrap();
        assert!(rx.borrow().task(&task.id).is_none());
    }

    #[tokio::test]
    async fn test_delete_board_clears_selection() {
        let (_storage, mut store) = memory_store().await;
        let (board, cols, _) = columns(&store);
        store
            .create_task(&board, &cols[0], TaskDraft::new("Gone"))
            .await
            .unwrap();
        assert!(store.set_active_board(&board).await);
        assert!(!store.set_active_board(&BoardId::from("ghost")).await);

        assert!(store.delete_board(&board).await);

        assert!(store.active_board().is_none());
        assert!(store.state().tasks.is_empty());
        assert!(store.current_board().is_none());
        assert!(!store.delete_board(&board).await);
    }

    #[tokio::test]
    async fn test_embedded_tasks_are_lifted_on_load() {
        let legacy = r#"{
            "state": {
                "workspace": {
                    "id": "ws",
                    "name": "Legacy",
                    "description": "",
                    "boards": [{
                        "id": "b1",
                        "name": "Board",
                        "columns": [
                            {"id": "c1", "name": "To Do", "tasks": [
                                {"id": "t1", "title": "Embedded", "description": "", "priority": "low",
                                 "createdAt": "2024-01-01T00:00:00.000Z", "updatedAt": "2024-01-01T00:00:00.000Z"},
                                "t2",
                                "missing",
                                42
                            ]},
                            {"id": "c2", "name": "Done", "tasks": ["t2"]}
                        ],
                        "createdAt": "2024-01-01T00:00:00.000Z",
                        "updatedAt": "2024-01-01T00:00:00.000Z"
                    }],
                    "members": [],
                    "tasks": {
                        "t2": {"id": "t2", "title": "Mapped", "description": "", "status": "Done",
                               "priority": "none", "createdAt": "2024-01-01T00:00:00.000Z",
                               "updatedAt": "2024-01-01T00:00:00.000Z"}
                    },
                    "createdAt": "2024-01-01T00:00:00.000Z",
                    "updatedAt": "2024-01-01T00:00:00.000Z"
                },
                "activeBoard": "deleted-board"
            },
            "version": 0
        }"#;
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item("workspace-storage", legacy).await.unwrap();

        let store = WorkspaceStore::load(storage, StoreConfig::default()).await;
        let state = store.state();
        let board = BoardId::from("b1");

        let todo = state.column(&board, &ColumnId::from("c1")).unwrap();
        assert_eq!(todo.tasks, vec![TaskId::from("t1"), TaskId::from("t2")]);
        assert!(state.column(&board, &ColumnId::from("c2")).unwrap().tasks.is_empty());
        assert_eq!(state.task(&TaskId::from("t1")).unwrap().status, "To Do");
        assert_eq!(state.task(&TaskId::from("t2")).unwrap().status, "To Do");
        assert!(state.check_consistency().is_empty());
        assert!(store.active_board().is_none());
    }

    #[tokio::test]
    async fn test_drag_gesture_through_store() {
        let (_storage, mut store) = memory_store().await;
        let (board, cols, _) = columns(&store);
        let a = store.create_task(&board, &cols[0], TaskDraft::new("A")).await.unwrap();
        let b = store.create_task(&board, &cols[1], TaskDraft::new("B")).await.unwrap();
        let mut engine = DragEngine::new();

        engine.drag_start(&store.state(), &board, a.id.as_str());
        if let Some(command) = engine.drag_over(&store.state(), Some(b.id.as_str())) {
            assert!(store.apply_reorder(&command).await);
        }
        if let Some(command) = engine.drag_end(&store.state(), Some(cols[1].as_str())) {
            assert!(store.apply_reorder(&command).await);
        }

        let state = store.state();
        assert_eq!(
            state.column(&board, &cols[1]).unwrap().tasks,
            vec![b.id.clone(), a.id.clone()]
        );
        assert_eq!(state.task(&a.id).unwrap().status, "In Progress");
        assert!(!engine.is_dragging());
    }

    #[tokio::test]
    async fn test_reset_restores_default() {
        let (_storage, mut store) = memory_store().await;
        store.create_board("Extra", "").await;

        store.reset().await;

        assert_eq!(store.state().boards.len(), 1);
        assert_eq!(store.state().boards[0].name, "Main Project");
    }
}
