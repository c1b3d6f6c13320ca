//! Hand-off point between a finished batch and whatever publishes it.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::scraper::ConsolidatedDataset;

#[async_trait]
pub trait DatasetSink: Send + Sync {
    async fn publish(&self, dataset: &ConsolidatedDataset) -> Result<()>;
}

/// Writes the dataset as pretty-printed JSON, replacing the file atomically.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DatasetSink for JsonFileSink {
    async fn publish(&self, dataset: &ConsolidatedDataset) -> Result<()> {
        let json = serde_json::to_vec_pretty(dataset).context("Failed to serialize dataset")?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to move dataset into {}", self.path.display()))?;

        info!(
            path = %self.path.display(),
            programs = dataset.total_programs(),
            bytes = json.len(),
            "dataset written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ProgramCatalog;

    #[tokio::test]
    async fn test_writes_json_creating_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("materias").join("todas_carreras.json");
        let sink = JsonFileSink::new(&path);

        let dataset = ConsolidatedDataset::new([ProgramCatalog::empty("20321", "Actuaría")]);
        sink.publish(&dataset).await.unwrap();

        let written: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(written["totalPrograms"], 1);
        assert_eq!(written["programs"]["20321"]["name"], "Actuaría");
        assert!(!path.with_extension("json.tmp").exists());
    }
}
