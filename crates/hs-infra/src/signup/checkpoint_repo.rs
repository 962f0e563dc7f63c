//! File-based signup checkpoint repository
//!
//! Persists the single in-progress signup as a JSON file. Writes go to a
//! sibling temp file first and are renamed into place, so a crash mid-write
//! leaves the previous checkpoint intact.

use anyhow::Context;
use async_trait::async_trait;
use hs_core::ports::CheckpointStorePort;
use hs_core::signup::WizardCheckpoint;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

pub const DEFAULT_CHECKPOINT_FILE: &str = "signup.checkpoint.json";

pub struct FileCheckpointRepository {
    checkpoint_path: PathBuf,
}

impl FileCheckpointRepository {
    /// Create repository with custom file path
    pub fn new(checkpoint_path: PathBuf) -> Self {
        Self { checkpoint_path }
    }

    /// Create repository with defaults
    pub fn with_defaults(base_dir: PathBuf) -> Self {
        Self {
            checkpoint_path: base_dir.join(DEFAULT_CHECKPOINT_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.checkpoint_path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .checkpoint_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DEFAULT_CHECKPOINT_FILE.into());
        name.push(".tmp");
        self.checkpoint_path.with_file_name(name)
    }

    async fn ensure_parent_dir(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.checkpoint_path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        Ok(())
    }
}

#[async_trait]
impl CheckpointStorePort for FileCheckpointRepository {
    async fn load(&self) -> anyhow::Result<Option<WizardCheckpoint>> {
        let content = match fs::read_to_string(&self.checkpoint_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read {}", self.checkpoint_path.display())
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        let checkpoint: WizardCheckpoint = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse signup checkpoint: {}", e))?;

        Ok(Some(checkpoint))
    }

    async fn save(&self, checkpoint: &WizardCheckpoint) -> anyhow::Result<()> {
        self.ensure_parent_dir().await?;

        let json = serde_json::to_string_pretty(checkpoint)
            .map_err(|e| anyhow::anyhow!("Failed to serialize signup checkpoint: {}", e))?;

        let temp_path = self.temp_path();
        let mut file = fs::File::create(&temp_path)
            .await
            .with_context(|| format!("Failed to create {}", temp_path.display()))?;
        file.write_all(json.as_bytes())
            .await
            .context("Failed to write signup checkpoint")?;
        file.sync_all()
            .await
            .context("Failed to sync signup checkpoint")?;
        drop(file);

        fs::rename(&temp_path, &self.checkpoint_path)
            .await
            .with_context(|| format!("Failed to replace {}", self.checkpoint_path.display()))?;

        debug!(
            path = %self.checkpoint_path.display(),
            step = %checkpoint.current_tab,
            "Signup checkpoint saved"
        );
        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        match fs::remove_file(&self.checkpoint_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove {}", self.checkpoint_path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hs_core::signup::{FieldValue, FieldValues, StepId};
    use tempfile::TempDir;

    fn checkpoint(step: StepId, email: &str) -> WizardCheckpoint {
        let field_values: FieldValues = [
            ("userType", FieldValue::text("buyer")),
            ("email", FieldValue::text(email)),
        ]
        .into_iter()
        .collect();
        WizardCheckpoint {
            field_values,
            current_tab: step,
            timestamp: 1_700_000_000_000,
        }
    }

    #[tokio::test]
    async fn test_load_returns_none_when_file_not_exists() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileCheckpointRepository::new(temp_dir.path().join("nonexistent.json"));

        assert!(repo.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileCheckpointRepository::new(temp_dir.path().join("nested/checkpoint.json"));

        let original = checkpoint(StepId::PriceRange, "a@b.com");
        repo.save(&original).await.unwrap();

        assert_eq!(repo.load().await.unwrap(), Some(original));
        assert!(!repo.temp_path().exists());
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_checkpoint() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileCheckpointRepository::with_defaults(temp_dir.path().to_path_buf());

        repo.save(&checkpoint(StepId::Location, "first@b.com"))
            .await
            .unwrap();
        repo.save(&checkpoint(StepId::Timeline, "second@b.com"))
            .await
            .unwrap();

        let loaded = repo.load().await.unwrap().unwrap();
        assert_eq!(loaded.current_tab, StepId::Timeline);
        assert_eq!(loaded.field_values.text("email"), Some("second@b.com"));
    }

    #[tokio::test]
    async fn test_file_uses_flat_layout() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileCheckpointRepository::with_defaults(temp_dir.path().to_path_buf());
        repo.save(&checkpoint(StepId::Location, "a@b.com"))
            .await
            .unwrap();

        let raw = fs::read_to_string(repo.path()).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["currentTab"], "location");
        assert_eq!(value["email"], "a@b.com");
        assert_eq!(value["timestamp"], 1_700_000_000_000_i64);
    }

    #[tokio::test]
    async fn test_clear_deletes_file_and_tolerates_absence() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileCheckpointRepository::with_defaults(temp_dir.path().to_path_buf());

        repo.clear().await.unwrap();

        repo.save(&checkpoint(StepId::Location, "a@b.com"))
            .await
            .unwrap();
        repo.clear().await.unwrap();
        assert!(repo.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileCheckpointRepository::with_defaults(temp_dir.path().to_path_buf());

        assert_eq!(repo.path(), temp_dir.path().join(DEFAULT_CHECKPOINT_FILE));
    }

    #[tokio::test]
    async fn test_empty_file_returns_none() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.json");
        fs::write(&path, "").await.unwrap();

        let repo = FileCheckpointRepository::new(path);
        assert!(repo.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_json_returns_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("invalid.json");
        fs::write(&path, "{invalid json").await.unwrap();

        let repo = FileCheckpointRepository::new(path);
        let result = repo.load().await;

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Failed to parse"));
    }
}
