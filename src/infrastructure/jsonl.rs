use crate::domain::ports::TransactionLog;
use crate::domain::transaction::{PendingTransaction, TransactionRecord};
use crate::error::{Result, ScanPayError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// A durable transaction log stored as JSON lines.
///
/// Each record is one line, written in a single `write_all` and flushed to disk
/// with `sync_data` before `append` returns. Committed records are mirrored in
/// memory so `read_all` never touches the disk.
///
/// Appends are serialized by the writer mutex. A record becomes visible to
/// `read_all` only after its line is on disk.
pub struct JsonlTransactionLog {
    path: PathBuf,
    writer: Mutex<LogWriter>,
    records: RwLock<Vec<TransactionRecord>>,
}

struct LogWriter {
    file: File,
    /// Byte length of the file up to the last committed line.
    committed_len: u64,
    next_sequence: u64,
}

impl JsonlTransactionLog {
    /// Opens or creates the log at `path` and replays what is already there.
    ///
    /// A trailing line without its newline was never acknowledged and is cut off.
    /// Anything else that does not parse, or breaks the sequence, is reported as
    /// `CorruptLog`.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let contents = read_contents(&path).await?;
        let (records, committed_len) = replay(&contents)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| unavailable(&path, e))?;

        if committed_len < contents.len() as u64 {
            warn!(
                path = %path.display(),
                discarded_bytes = contents.len() as u64 - committed_len,
                "Truncating torn trailing record"
            );
            file.set_len(committed_len)
                .await
                .map_err(|e| unavailable(&path, e))?;
            file.sync_data().await.map_err(|e| unavailable(&path, e))?;
        }

        info!(path = %path.display(), records = records.len(), "Transaction log opened");

        Ok(Self {
            path,
            writer: Mutex::new(LogWriter {
                file,
                committed_len,
                next_sequence: records.len() as u64 + 1,
            }),
            records: RwLock::new(records),
        })
    }

    /// Reads the committed records at `path` without opening it for writing.
    ///
    /// A missing file reads as an empty log. An unterminated last line may be a
    /// write still in progress, so it is skipped and left in place.
    pub async fn read_snapshot<P: AsRef<Path>>(path: P) -> Result<Vec<TransactionRecord>> {
        let contents = read_contents(path.as_ref()).await?;
        let (records, _) = replay(&contents)?;
        Ok(records)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn read_contents(path: &Path) -> Result<Vec<u8>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(unavailable(path, e)),
    }
}

fn unavailable(path: &Path, e: std::io::Error) -> ScanPayError {
    ScanPayError::LogUnavailable(format!("{}: {}", path.display(), e))
}

async fn write_durably(file: &mut File, line: &[u8]) -> std::io::Result<()> {
    file.write_all(line).await?;
    file.flush().await?;
    file.sync_data().await
}

/// Parses complete lines and returns them with the byte length they cover.
fn replay(contents: &[u8]) -> Result<(Vec<TransactionRecord>, u64)> {
    let mut records = Vec::new();
    let mut offset = 0usize;

    for (index, line) in contents.split_inclusive(|b| *b == b'\n').enumerate() {
        if !line.ends_with(b"\n") {
            break;
        }
        let line_no = index + 1;
        let record: TransactionRecord =
            serde_json::from_slice(line).map_err(|e| ScanPayError::CorruptLog {
                line: line_no,
                reason: e.to_string(),
            })?;

        let expected = records.len() as u64 + 1;
        if record.sequence_no != expected {
            return Err(ScanPayError::CorruptLog {
                line: line_no,
                reason: format!(
                    "expected sequence {}, found {}",
                    expected, record.sequence_no
                ),
            });
        }

        records.push(record);
        offset += line.len();
    }

    Ok((records, offset as u64))
}

#[async_trait]
impl TransactionLog for JsonlTransactionLog {
    async fn append(&self, pending: PendingTransaction) -> Result<TransactionRecord> {
        let mut writer = self.writer.lock().await;

        let record = pending.into_record(writer.next_sequence);
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        let written = write_durably(&mut writer.file, &line).await;

        if let Err(e) = written {
            // Drop whatever part of the line reached the file so the next append
            // starts on a clean boundary.
            let committed_len = writer.committed_len;
            if let Err(truncate_err) = writer.file.set_len(committed_len).await {
                warn!(error = %truncate_err, "Failed to roll back partial record");
            }
            return Err(unavailable(&self.path, e));
        }

        writer.committed_len += line.len() as u64;
        writer.next_sequence += 1;
        self.records.write().await.push(record.clone());

        debug!(seq = record.sequence_no, item = %record.item_name, "Record committed");
        Ok(record)
    }

    async fn read_all(&self) -> Result<Vec<TransactionRecord>> {
        Ok(self.records.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Amount;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn pending(name: &str) -> PendingTransaction {
        PendingTransaction::new(name, Amount::new(dec!(15.00)).unwrap())
    }

    #[tokio::test]
    async fn test_append_and_read() {
        let dir = tempdir().unwrap();
        let log = JsonlTransactionLog::open(dir.path().join("tx.jsonl"))
            .await
            .unwrap();

        let record = log.append(pending("Product A")).await.unwrap();
        assert_eq!(record.sequence_no, 1);
        assert_eq!(log.read_all().await.unwrap(), vec![record]);
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tx.jsonl");

        {
            let log = JsonlTransactionLog::open(&path).await.unwrap();
            log.append(pending("Product A")).await.unwrap();
            log.append(pending("Product B")).await.unwrap();
        }

        let log = JsonlTransactionLog::open(&path).await.unwrap();
        let records = log.read_all().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].item_name, "Product B");

        let next = log.append(pending("Product C")).await.unwrap();
        assert_eq!(next.sequence_no, 3);

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_torn_tail_is_truncated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tx.jsonl");
        {
            let log = JsonlTransactionLog::open(&path).await.unwrap();
            log.append(pending("Product A")).await.unwrap();
        }
        let mut contents = std::fs::read(&path).unwrap();
        let intact_len = contents.len();
        contents.extend_from_slice(b"{\"sequence_no\":2,\"item_na");
        std::fs::write(&path, &contents).unwrap();

        let log = JsonlTransactionLog::open(&path).await.unwrap();
        assert_eq!(log.read_all().await.unwrap().len(), 1);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), intact_len as u64);

        let next = log.append(pending("Product B")).await.unwrap();
        assert_eq!(next.sequence_no, 2);
    }

    #[tokio::test]
    async fn test_failed_write_is_rolled_back_and_keeps_sequence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tx.jsonl");
        let log = JsonlTransactionLog::open(&path).await.unwrap();
        log.append(pending("Product A")).await.unwrap();
        let committed_len = std::fs::metadata(&path).unwrap().len();

        // A read-only handle makes the next durable write fail.
        let read_only = File::open(&path).await.unwrap();
        let writable = std::mem::replace(&mut log.writer.lock().await.file, read_only);

        let result = log.append(pending("Product B")).await;
        assert!(matches!(result, Err(ScanPayError::LogUnavailable(_))));
        assert_eq!(std::fs::metadata(&path).unwrap().len(), committed_len);
        assert_eq!(log.read_all().await.unwrap().len(), 1);

        log.writer.lock().await.file = writable;
        let next = log.append(pending("Product C")).await.unwrap();
        assert_eq!(next.sequence_no, 2);

        let reopened = JsonlTransactionLog::open(&path).await.unwrap();
        let names: Vec<_> = reopened
            .read_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| (r.sequence_no, r.item_name))
            .collect();
        assert_eq!(
            names,
            vec![(1, "Product A".to_string()), (2, "Product C".to_string())]
        );
    }

    #[tokio::test]
    async fn test_snapshot_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tx.jsonl");
        {
            let log = JsonlTransactionLog::open(&path).await.unwrap();
            log.append(pending("Product A")).await.unwrap();
        }
        let mut contents = std::fs::read(&path).unwrap();
        contents.extend_from_slice(b"{\"sequence_no\":2,\"item_na");
        std::fs::write(&path, &contents).unwrap();

        let records = JsonlTransactionLog::read_snapshot(&path).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(std::fs::read(&path).unwrap(), contents);
    }

    #[tokio::test]
    async fn test_snapshot_of_missing_log_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tx.jsonl");

        let records = JsonlTransactionLog::read_snapshot(&path).await.unwrap();
        assert!(records.is_empty());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_corrupt_line_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tx.jsonl");
        std::fs::write(&path, "not json\n").unwrap();

        let result = JsonlTransactionLog::open(&path).await;
        assert!(matches!(result, Err(ScanPayError::CorruptLog { line: 1, .. })));
    }

    #[tokio::test]
    async fn test_sequence_gap_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tx.jsonl");
        let record = pending("Product A").into_record(2);
        let mut line = serde_json::to_string(&record).unwrap();
        line.push('\n');
        std::fs::write(&path, line).unwrap();

        let result = JsonlTransactionLog::open(&path).await;
        assert!(matches!(result, Err(ScanPayError::CorruptLog { line: 1, .. })));
    }

    #[tokio::test]
    async fn test_missing_directory_is_unavailable() {
        let dir = tempdir().unwrap();
        let result = JsonlTransactionLog::open(dir.path().join("missing").join("tx.jsonl")).await;
        assert!(matches!(result, Err(ScanPayError::LogUnavailable(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_are_gapless() {
        let dir = tempdir().unwrap();
        let log = Arc::new(
            JsonlTransactionLog::open(dir.path().join("tx.jsonl"))
                .await
                .unwrap(),
        );

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let log = Arc::clone(&log);
                tokio::spawn(async move { log.append(pending(&format!("item-{}", i))).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let records = log.read_all().await.unwrap();
        let sequence: Vec<u64> = records.iter().map(|r| r.sequence_no).collect();
        assert_eq!(sequence, (1..=32).collect::<Vec<u64>>());

        let reopened = JsonlTransactionLog::open(log.path()).await.unwrap();
        assert_eq!(reopened.read_all().await.unwrap(), records);
    }
}
