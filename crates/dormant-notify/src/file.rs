//! File output sink

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};

use dormant_core::error::LifecycleResult;
use dormant_core::report::{PassResult, ReportSink};

use crate::error::{NotificationError, NotificationResult};
use crate::render::ReportRenderer;

/// Writes a pass result as HTML and/or JSON.
pub struct FileSink {
    html_path: Option<PathBuf>,
    json_path: Option<PathBuf>,
    renderer: Arc<ReportRenderer>,
}

impl FileSink {
    pub fn new(renderer: Arc<ReportRenderer>) -> Self {
        Self {
            html_path: None,
            json_path: None,
            renderer,
        }
    }

    pub fn with_html(mut self, path: impl Into<PathBuf>) -> Self {
        self.html_path = Some(path.into());
        self
    }

    pub fn with_json(mut self, path: impl Into<PathBuf>) -> Self {
        self.json_path = Some(path.into());
        self
    }

    /// Whether there is anything to write.
    pub fn is_empty(&self) -> bool {
        self.html_path.is_none() && self.json_path.is_none()
    }

    async fn write(path: &Path, contents: Vec<u8>) -> NotificationResult<()> {
        tokio::fs::write(path, contents)
            .await
            .map_err(|source| NotificationError::Io {
                path: path.display().to_string(),
                source,
            })?;
        info!(path = %path.display(), "Report written");
        Ok(())
    }

    #[instrument(skip(self, result))]
    pub async fn write_all(&self, result: &PassResult) -> NotificationResult<()> {
        if let Some(path) = &self.html_path {
            let html = self.renderer.render_html(result)?;
            Self::write(path, html.into_bytes()).await?;
        }

        if let Some(path) = &self.json_path {
            let json = serde_json::to_vec_pretty(result)?;
            Self::write(path, json).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl ReportSink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    async fn publish(&self, result: &PassResult) -> LifecycleResult<()> {
        self.write_all(result)
            .await
            .map_err(|e| e.into_delivery_error(self.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use dormant_core::account::Platform;
    use dormant_core::config::DryRun;
    use dormant_core::report::PlatformReport;
    use dormant_core::threshold::ThresholdDays;

    fn result() -> PassResult {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        PassResult {
            started_at: now,
            completed_at: now,
            holding_location: "OU=Stale Computers,DC=example,DC=com".to_string(),
            thresholds: ThresholdDays::default().at(now),
            dry_run: DryRun::all(),
            platforms: Platform::ALL
                .iter()
                .map(|p| PlatformReport::new(*p))
                .collect(),
            diagnostics: Vec::new(),
            warnings: vec!["email delivery failed".to_string()],
        }
    }

    fn renderer() -> Arc<ReportRenderer> {
        Arc::new(ReportRenderer::new().unwrap())
    }

    #[tokio::test]
    async fn test_writes_html_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let html_path = dir.path().join("report.html");
        let json_path = dir.path().join("report.json");

        let sink = FileSink::new(renderer())
            .with_html(&html_path)
            .with_json(&json_path);
        sink.publish(&result()).await.unwrap();

        let html = std::fs::read_to_string(&html_path).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("email delivery failed"));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(json["platforms"][0]["platform"], "windows");
        assert_eq!(json["dry_run"]["deletes"], true);
    }

    #[tokio::test]
    async fn test_empty_sink_writes_nothing() {
        let sink = FileSink::new(renderer());
        assert!(sink.is_empty());
        assert!(sink.publish(&result()).await.is_ok());
    }

    #[tokio::test]
    async fn test_unwritable_path_is_delivery_error() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(renderer()).with_json(dir.path().join("missing/report.json"));

        let err = sink.publish(&result()).await.unwrap_err();
        assert_eq!(err.error_code(), "REPORT_DELIVERY_FAILED");
        assert!(err.to_string().contains("report.json"));
    }
}
