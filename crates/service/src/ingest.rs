//! Batch ingestion of newline-delimited JSON service records.
//!
//! Each non-blank line is one `NewService`. A line that fails to parse or index is logged
//! and counted; the run always continues with the next line. Records whose id is already
//! stored are refused rather than overwritten.

use std::path::Path;

use models::NewService;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{error, info};

use crate::catalog::repository::ServiceRepository;
use crate::errors::ServiceError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub indexed: usize,
    pub failed: usize,
}

pub async fn ingest_file(repo: &dyn ServiceRepository, path: &Path) -> Result<IngestReport, ServiceError> {
    let file = tokio::fs::File::open(path).await?;
    info!(path = %path.display(), "ingesting services");
    ingest_reader(repo, BufReader::new(file)).await
}

/// Only I/O errors on the reader abort the run. Lines are framed on raw bytes, so a line
/// that is not valid UTF-8 fails to parse and is counted like any other malformed record.
pub async fn ingest_reader<R>(repo: &dyn ServiceRepository, mut reader: R) -> Result<IngestReport, ServiceError>
where
    R: AsyncBufRead + Unpin,
{
    let mut report = IngestReport::default();
    let mut buf = Vec::new();
    let mut line_no = 0usize;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        line_no += 1;
        let line = trim_line_ending(&buf);
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        match ingest_line(repo, line).await {
            Ok(id) => {
                report.indexed += 1;
                info!(line = line_no, %id, "indexed service");
            }
            Err(e) => {
                report.failed += 1;
                error!(line = line_no, error = %e, "failed to process line");
            }
        }
    }

    info!(indexed = report.indexed, failed = report.failed, "ingestion finished");
    Ok(report)
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

async fn ingest_line(repo: &dyn ServiceRepository, line: &[u8]) -> Result<String, ServiceError> {
    let new = NewService::parse(line)?;
    let created = repo.create(new).await?;
    Ok(created.id)
}
