use crate::{
    domain::board::default_column_names,
    error::{Result, TaskdeckError},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Store configuration: where state is persisted and what a fresh
/// workspace looks like
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Storage key the workspace blob is persisted under
    pub storage_key: String,
    pub workspace_name: String,
    pub workspace_description: String,
    pub board_name: String,
    pub board_description: String,
    /// Columns given to the default board and to every new board
    pub default_columns: Vec<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: "workspace-storage".to_string(),
            workspace_name: "My Workspace".to_string(),
            workspace_description: "Default workspace".to_string(),
            board_name: "Main Project".to_string(),
            board_description: "This is your first project board".to_string(),
            default_columns: default_column_names(),
        }
    }
}

impl StoreConfig {
    /// Loads a JSON config file; absent fields take their defaults
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).await.map_err(|e| {
            TaskdeckError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|e| {
            TaskdeckError::ConfigError(format!("invalid config {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage_key.trim().is_empty() {
            return Err(TaskdeckError::ConfigError(
                "storage_key must not be empty".to_string(),
            ));
        }
        if self.default_columns.is_empty() {
            return Err(TaskdeckError::ConfigError(
                "default_columns must name at least one column".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_default_columns(mut self, columns: Vec<String>) -> Self {
        self.default_columns = columns;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.storage_key, "workspace-storage");
        assert_eq!(config.default_columns, vec!["To Do", "In Progress", "Done"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_values() {
        let config = StoreConfig::default().with_storage_key(" ");
        assert!(matches!(config.validate(), Err(TaskdeckError::ConfigError(_))));

        let config = StoreConfig::default().with_default_columns(Vec::new());
        assert!(matches!(config.validate(), Err(TaskdeckError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_load_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("taskdeck.json");
        tokio::fs::write(&path, r#"{"storage_key": "team-board", "board_name": "Launch"}"#)
            .await
            .unwrap();

        let config = StoreConfig::load(&path).await.unwrap();

        assert_eq!(config.storage_key, "team-board");
        assert_eq!(config.board_name, "Launch");
        assert_eq!(config.workspace_name, "My Workspace");
    }

    #[tokio::test]
    async fn test_load_errors_are_config_errors() {
        let temp_dir = TempDir::new().unwrap();
        let missing = StoreConfig::load(temp_dir.path().join("missing.json")).await;
        assert!(matches!(missing, Err(TaskdeckError::ConfigError(_))));

        let path = temp_dir.path().join("bad.json");
        tokio::fs::write(&path, "not json").await.unwrap();
        let bad = StoreConfig::load(&path).await;
        assert!(matches!(bad, Err(TaskdeckError::ConfigError(_))));
    }
}
