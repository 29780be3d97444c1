use crate::core::domain::aggregate::AggregateRecord;
use crate::core::ports::sink::SnapshotSinkPort;
use crate::utils::error::{AggregatorError, AggregatorResult};
use async_trait::async_trait;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::info;

/// A snapshot sink appending one JSON line per flush to a local file.
///
/// Each line is the full array of records from one flush tick, so the file is
/// a replayable history of summaries. Writes are buffered and flushed per
/// save; the file is opened once at startup.
pub struct JsonlSnapshotSink {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlSnapshotSink {
    pub fn new(path: PathBuf) -> AggregatorResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| AggregatorError::SinkError(format!("{}: {}", path.display(), e)))?;

        info!("Writing aggregate snapshots to {}", path.display());
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path,
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl SnapshotSinkPort for JsonlSnapshotSink {
    async fn save(&self, records: &[AggregateRecord]) -> AggregatorResult<()> {
        let line = serde_json::to_string(records)
            .map_err(|e| AggregatorError::SinkError(e.to_string()))?;

        let mut writer = self.writer.lock().await;
        writeln!(writer, "{}", line)
            .and_then(|_| writer.flush())
            .map_err(|e| AggregatorError::SinkError(e.to_string()))
    }
}
