//! Signup checkpoint port
//!
//! Durable storage for the single in-progress signup. Implementations are
//! provided by the infrastructure layer (e.g., file-based storage).

use async_trait::async_trait;

use crate::signup::WizardCheckpoint;

#[async_trait]
pub trait CheckpointStorePort: Send + Sync {
    /// Load the stored checkpoint, if any.
    async fn load(&self) -> anyhow::Result<Option<WizardCheckpoint>>;

    /// Store the checkpoint, replacing any previous one.
    async fn save(&self, checkpoint: &WizardCheckpoint) -> anyhow::Result<()>;

    /// Remove the stored checkpoint. Clearing an empty store is not an error.
    async fn clear(&self) -> anyhow::Result<()>;
}
