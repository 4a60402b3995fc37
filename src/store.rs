//! Per-job directories on local disk.
//!
//! Layout: `<root>/<job-id>/{video.<ext>, audio.ogg|audio.wav, transcript.srt,
//! translated_transcript.srt}`. Only rejected uploads are removed; failed jobs
//! keep whatever they wrote.

use crate::error::{Result, TransubError};
use crate::job::{subtitle_path, Job, SubtitleKind};
use axum::body::Bytes;
use axum::BoxError;
use futures::{Stream, TryStreamExt};
use serde::Serialize;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::io::StreamReader;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Both subtitle documents of a finished job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobResult {
    pub original_transcript: String,
    pub translated_transcript: String,
}

#[derive(Debug, Clone)]
pub struct JobStore {
    root: PathBuf,
}

impl JobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Allocate a fresh job id and create its directory.
    pub async fn create_job(&self, video_extension: Option<&str>) -> Result<Job> {
        let id = Uuid::new_v4();
        let dir = self.root.join(id.to_string());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| TransubError::file_write(&dir, e))?;

        info!(job_id = %id, "Created job directory {}", dir.display());
        Ok(Job::new(id, dir, video_extension))
    }

    /// Stream an uploaded video into the job directory, returning the byte count.
    ///
    /// A failing upload stream (client abort, body limit) is `InvalidRequest`;
    /// only errors on the local file are `FileWrite`.
    pub async fn save_video<S, E>(&self, job: &Job, stream: S) -> Result<u64>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: Into<BoxError>,
    {
        let path = job.video_path();
        let written = stream_to_file(&path, stream).await.map_err(|e| {
            if e.kind() == ErrorKind::InvalidData {
                TransubError::InvalidRequest(format!("upload failed: {e}"))
            } else {
                TransubError::file_write(&path, e)
            }
        })?;

        debug!(job_id = %job.id, "Saved {} bytes to {}", written, path.display());
        Ok(written)
    }

    /// Remove the directory of a job whose upload was rejected.
    pub async fn discard_job(&self, job: &Job) {
        match tokio::fs::remove_dir_all(&job.dir).await {
            Ok(()) => debug!(job_id = %job.id, "Removed rejected job directory"),
            Err(e) => warn!(job_id = %job.id, "Failed to remove {}: {}", job.dir.display(), e),
        }
    }

    /// Resolve the directory of an existing job. Ids that are not UUIDs are unknown.
    fn job_dir(&self, job_id: &str) -> Result<PathBuf> {
        let id = Uuid::parse_str(job_id)
            .map_err(|_| TransubError::NotFound(format!("job {job_id}")))?;
        Ok(self.root.join(id.to_string()))
    }

    /// Path of one subtitle file, if it exists.
    pub async fn subtitle_file(&self, job_id: &str, kind: SubtitleKind) -> Result<PathBuf> {
        let path = subtitle_path(&self.job_dir(job_id)?, kind);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(not_found(job_id, kind)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found(job_id, kind)),
            Err(e) => Err(TransubError::Io(e)),
        }
    }

    async fn read_subtitle(&self, job_id: &str, kind: SubtitleKind) -> Result<String> {
        let path = subtitle_path(&self.job_dir(job_id)?, kind);
        tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                not_found(job_id, kind)
            } else {
                TransubError::Io(e)
            }
        })
    }

    /// Read both subtitle files. Either one missing means the job is unknown or failed.
    pub async fn read_result(&self, job_id: &str) -> Result<JobResult> {
        let original_transcript = self.read_subtitle(job_id, SubtitleKind::Original).await?;
        let translated_transcript = self.read_subtitle(job_id, SubtitleKind::Translated).await?;

        Ok(JobResult {
            original_transcript,
            translated_transcript,
        })
    }
}

/// Save a `Stream` of byte chunks to a file.
async fn stream_to_file<S, E>(path: &Path, stream: S) -> io::Result<u64>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: Into<BoxError>,
{
    // InvalidData marks errors from the incoming stream, not from the file.
    let body_with_io_error = stream.map_err(|e| io::Error::new(ErrorKind::InvalidData, e));
    let body_reader = StreamReader::new(body_with_io_error);
    futures::pin_mut!(body_reader);

    let mut file = BufWriter::new(File::create(path).await?);
    let written = tokio::io::copy(&mut body_reader, &mut file).await?;
    file.flush().await?;

    Ok(written)
}

fn not_found(job_id: &str, kind: SubtitleKind) -> TransubError {
    TransubError::NotFound(format!("{kind} transcript for job {job_id}"))
}
