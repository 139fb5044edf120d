//! Render hand-off
//!
//! Print jobs leave the engine through a `LabelSink`. The renderer (PDF,
//! thermal printer spooler) picks them up from wherever the sink put them.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use wms_labels_types::PrintJob;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid job reference: {0}")]
    InvalidRef(String),

    #[error("Print job not found: {0}")]
    NotFound(String),
}

#[async_trait]
pub trait LabelSink: Send + Sync {
    /// Hand a job to the renderer, return a reference to it
    async fn submit(&self, job: &PrintJob) -> Result<String, SinkError>;

    /// Read a submitted job back
    async fn fetch(&self, job_ref: &str) -> Result<PrintJob, SinkError>;

    async fn exists(&self, job_ref: &str) -> Result<bool, SinkError>;
}

/// Writes each job as `{base}/{kind}/{job_id}.json`
pub struct LocalLabelSink {
    base_path: PathBuf,
}

impl LocalLabelSink {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn path_for_job(&self, job: &PrintJob) -> PathBuf {
        let kind = match job.kind {
            wms_labels_types::LabelKind::Volume => "volume",
            wms_labels_types::LabelKind::ParentLabel => "parent_label",
        };
        self.base_path
            .join(kind)
            .join(format!("{}.json", job.job_id))
    }

    fn path_from_ref(&self, job_ref: &str) -> Result<PathBuf, SinkError> {
        job_ref
            .strip_prefix("file://")
            .map(PathBuf::from)
            .ok_or_else(|| SinkError::InvalidRef(format!("Expected file:// prefix: {}", job_ref)))
    }
}

#[async_trait]
impl LabelSink for LocalLabelSink {
    async fn submit(&self, job: &PrintJob) -> Result<String, SinkError> {
        let path = self.path_for_job(job);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let body = serde_json::to_vec_pretty(job)?;
        tokio::fs::write(&path, body).await?;
        debug!(job_id = %job.job_id, path = %path.display(), "print job written");
        Ok(format!("file://{}", path.display()))
    }

    async fn fetch(&self, job_ref: &str) -> Result<PrintJob, SinkError> {
        let path = self.path_from_ref(job_ref)?;
        if !path.exists() {
            return Err(SinkError::NotFound(job_ref.to_string()));
        }
        let body = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn exists(&self, job_ref: &str) -> Result<bool, SinkError> {
        let path = self.path_from_ref(job_ref)?;
        Ok(path.exists())
    }
}

/// Keeps jobs in memory; for tests and dry runs
#[derive(Clone, Default)]
pub struct InMemoryLabelSink {
    jobs: Arc<RwLock<HashMap<String, PrintJob>>>,
}

impl InMemoryLabelSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

#[async_trait]
impl LabelSink for InMemoryLabelSink {
    async fn submit(&self, job: &PrintJob) -> Result<String, SinkError> {
        let job_ref = format!("memory://{}", job.job_id);
        let mut jobs = self.jobs.write().await;
        jobs.insert(job_ref.clone(), job.clone());
        Ok(job_ref)
    }

    async fn fetch(&self, job_ref: &str) -> Result<PrintJob, SinkError> {
        let jobs = self.jobs.read().await;
        jobs.get(job_ref)
            .cloned()
            .ok_or_else(|| SinkError::NotFound(job_ref.to_string()))
    }

    async fn exists(&self, job_ref: &str) -> Result<bool, SinkError> {
        let jobs = self.jobs.read().await;
        Ok(jobs.contains_key(job_ref))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;
    use wms_labels_types::{FormatSpec, LabelKind, PrintHeader, Volume};

    fn job() -> PrintJob {
        PrintJob::new(
            LabelKind::Volume,
            FormatSpec::default(),
            PrintHeader::default(),
            vec![Volume::new("NF1-001-01012025-1000", "1", 1, 1, Utc::now())],
            None,
        )
    }

    #[tokio::test]
    async fn test_local_sink_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let sink = LocalLabelSink::new(temp_dir.path());
        let job = job();

        let job_ref = sink.submit(&job).await.unwrap();
        assert!(job_ref.starts_with("file://"));
        assert!(job_ref.ends_with(".json"));
        assert!(sink.exists(&job_ref).await.unwrap());

        let fetched = sink.fetch(&job_ref).await.unwrap();
        assert_eq!(fetched, job);
    }

    #[tokio::test]
    async fn test_local_sink_rejects_foreign_ref() {
        let temp_dir = TempDir::new().unwrap();
        let sink = LocalLabelSink::new(temp_dir.path());
        let err = sink.fetch("memory://x").await.unwrap_err();
        assert!(matches!(err, SinkError::InvalidRef(_)));
    }

    #[tokio::test]
    async fn test_in_memory_sink() {
        let sink = InMemoryLabelSink::new();
        assert!(sink.is_empty().await);

        let job_ref = sink.submit(&job()).await.unwrap();
        assert!(job_ref.starts_with("memory://"));
        assert_eq!(sink.len().await, 1);
        assert!(matches!(
            sink.fetch("memory://nope").await,
            Err(SinkError::NotFound(_))
        ));
    }
}
