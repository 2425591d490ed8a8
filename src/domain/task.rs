use crate::domain::id::{AttachmentId, ChecklistItemId, CommentId, SubtaskId, TaskId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};

/// Priority of a task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    None,
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Rank used for ordering, `None` lowest
    pub fn rank(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Urgent => 4,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
            Self::Urgent => write!(f, "Urgent"),
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(format!(
                "Invalid priority '{}'. Valid priorities: none, low, medium, high, urgent",
                s
            )),
        }
    }
}

/// A checklist item owned by a single task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: SubtaskId,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

impl Subtask {
    pub fn new(title: String) -> Self {
        Self {
            id: SubtaskId::generate(),
            title,
            completed: false,
        }
    }
}

/// A tick-box line shown as a progress bar on the task card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: ChecklistItemId,
    pub text: String,
    #[serde(default)]
    pub checked: bool,
}

/// Partial update for a subtask
#[derive(Debug, Clone, Default)]
pub struct SubtaskUpdate {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub text: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: AttachmentId,
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied fields of a new attachment
#[derive(Debug, Clone)]
pub struct AttachmentDraft {
    pub name: String,
    pub url: String,
    pub kind: String,
    pub size: u64,
}

/// A unit of work. Content lives in the workspace task map; placement
/// lives in exactly one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Name of the column currently holding the task
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    #[serde(
        default,
        deserialize_with = "lenient_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_avatar: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(default)]
    pub checklist: Vec<ChecklistItem>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Browser forms persist a cleared date as an empty string and a picked
/// date as a bare `YYYY-MM-DD` day, read as midnight UTC
fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_due_date(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn parse_due_date(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(rfc_err) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .and_then(|day| day.and_hms_opt(0, 0, 0))
            .map(|midnight| midnight.and_utc())
            .ok_or(rfc_err),
    }
}

/// Caller-supplied fields of a new task
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub assignee: Option<String>,
    pub tags: Vec<String>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Partial update for a task.
///
/// Nested options distinguish "leave unchanged" (`None`) from "clear"
/// (`Some(None)`).
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub assignee: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}

impl TaskUpdate {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn status(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            ..Self::default()
        }
    }
}

impl Task {
    /// Creates a new task with the given ID and title
    pub fn new(id: TaskId, title: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            description: String::new(),
            status: String::new(),
            priority: Priority::None,
            created_at: now,
            updated_at: now,
            due_date: None,
            assignee: None,
            assignee_avatar: None,
            tags: Vec::new(),
            subtasks: Vec::new(),
            checklist: Vec::new(),
            comments: Vec::new(),
            attachments: Vec::new(),
        }
    }

    /// Builds a task from a draft, placed in the column named `status`
    pub fn from_draft(id: TaskId, draft: TaskDraft, status: String) -> Self {
        let mut task = Self::new(id, draft.title);
        task.description = draft.description;
        task.status = status;
        task.priority = draft.priority;
        task.due_date = draft.due_date;
        task.assignee = draft.assignee;
        task.tags = draft.tags;
        task
    }

    /// Merges every field of `update` except `status`, which depends on
    /// column placement and is handled by the workspace
    pub fn apply_fields(&mut self, update: &TaskUpdate) {
        if let Some(title) = &update.title {
            self.title = title.clone();
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(due_date) = update.due_date {
            self.due_date = due_date;
        }
        if let Some(assignee) = &update.assignee {
            self.assignee = assignee.clone();
        }
        if let Some(tags) = &update.tags {
            self.tags = tags.clone();
        }
        self.updated_at = Utc::now();
    }

    /// Sets the status, bumping `updated_at` only on change
    pub fn set_status(&mut self, status: &str) {
        if self.status != status {
            self.status = status.to_string();
            self.updated_at = Utc::now();
        }
    }

    pub fn add_subtask(&mut self, title: String) -> Subtask {
        let subtask = Subtask::new(title);
        self.subtasks.push(subtask.clone());
        self.updated_at = Utc::now();
        subtask
    }

    pub fn update_subtask(&mut self, subtask_id: &SubtaskId, update: &SubtaskUpdate) -> bool {
        let Some(subtask) = self.subtasks.iter_mut().find(|st| &st.id == subtask_id) else {
            return false;
        };
        if let Some(title) = &update.title {
            subtask.title = title.clone();
        }
        if let Some(completed) = update.completed {
            subtask.completed = completed;
        }
        self.updated_at = Utc::now();
        true
    }

    pub fn toggle_subtask(&mut self, subtask_id: &SubtaskId) -> bool {
        let Some(subtask) = self.subtasks.iter_mut().find(|st| &st.id == subtask_id) else {
            return false;
        };
        subtask.completed = !subtask.completed;
        self.updated_at = Utc::now();
        true
    }

    pub fn delete_subtask(&mut self, subtask_id: &SubtaskId) -> bool {
        let before = self.subtasks.len();
        self.subtasks.retain(|st| &st.id != subtask_id);
        let removed = self.subtasks.len() != before;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    /// Returns `(completed, total)` subtask counts
    pub fn subtask_progress(&self) -> (usize, usize) {
        let completed = self.subtasks.iter().filter(|st| st.completed).count();
        (completed, self.subtasks.len())
    }

    /// Returns `(checked, total)` checklist counts
    pub fn checklist_progress(&self) -> (usize, usize) {
        let checked = self.checklist.iter().filter(|item| item.checked).count();
        (checked, self.checklist.len())
    }

    pub fn add_comment(&mut self, author: String, text: String) -> Comment {
        let comment = Comment {
            id: CommentId::generate(),
            text,
            author,
            author_avatar: None,
            created_at: Utc::now(),
        };
        self.comments.push(comment.clone());
        self.updated_at = Utc::now();
        comment
    }

    pub fn delete_comment(&mut self, comment_id: &CommentId) -> bool {
        let before = self.comments.len();
        self.comments.retain(|c| &c.id != comment_id);
        let removed = self.comments.len() != before;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    pub fn add_attachment(&mut self, draft: AttachmentDraft) -> Attachment {
        let attachment = Attachment {
            id: AttachmentId::generate(),
            name: draft.name,
            url: draft.url,
            kind: draft.kind,
            size: draft.size,
            created_at: Utc::now(),
        };
        self.attachments.push(attachment.clone());
        self.updated_at = Utc::now();
        attachment
    }

    pub fn delete_attachment(&mut self, attachment_id: &AttachmentId) -> bool {
        let before = self.attachments.len();
        self.attachments.retain(|a| &a.id != attachment_id);
        let removed = self.attachments.len() != before;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }
}
