use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use maestro_core::executor::ExecutionReport;
use maestro_core::persist::{ReportSink, SinkError};

/// Appends one JSON line per completed run to a local file.
pub struct JsonlReportSink {
    path: PathBuf,
}

impl JsonlReportSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ReportSink for JsonlReportSink {
    async fn save_report(&self, plan_id: &str, report: &ExecutionReport) -> Result<(), SinkError> {
        let mut line = serde_json::to_string(report)?;
        line.push('\n');

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!(plan_id, path = %self.path.display(), "report appended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use maestro_core::executor::OverallStatus;
    use std::collections::BTreeMap;

    fn report(run_id: &str) -> ExecutionReport {
        ExecutionReport {
            run_id: run_id.to_string(),
            plan_id: "plan-1".to_string(),
            overall: OverallStatus::Succeeded,
            results: BTreeMap::new(),
            stages: vec![],
            started_at: Utc::now(),
            duration_ms: 7,
        }
    }

    #[tokio::test]
    async fn appends_one_line_per_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports.jsonl");
        let sink = JsonlReportSink::new(&path);

        sink.save_report("plan-1", &report("r1")).await.unwrap();
        sink.save_report("plan-1", &report("r2")).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["run_id"], "r1");
        assert_eq!(first["overall"], "succeeded");
    }

    #[tokio::test]
    async fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deep/reports.jsonl");
        let sink = JsonlReportSink::new(&path);

        sink.save_report("plan-1", &report("r1")).await.unwrap();
        assert!(path.exists());
    }
}
