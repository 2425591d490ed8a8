use std::fmt;
use uuid::Uuid;

/// Declares a string-backed identifier newtype.
///
/// Fresh identifiers are UUID v4 strings. Identifiers read back from
/// persisted state are kept verbatim, whatever their format.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Generates a new, never before issued identifier
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Returns the string representation
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of the workspace root aggregate
    WorkspaceId
);
string_id!(
    /// Identifier of a board
    BoardId
);
string_id!(
    /// Identifier of a column, unique across all boards
    ColumnId
);
string_id!(
    /// Identifier of a task
    TaskId
);
string_id!(SubtaskId);
string_id!(ChecklistItemId);
string_id!(CommentId);
string_id!(AttachmentId);
string_id!(MemberId);
