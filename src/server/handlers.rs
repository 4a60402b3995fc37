use super::AppState;
use crate::error::TransubError;
use crate::job::{Job, SubtitleKind};
use crate::language::{LanguageCatalog, LanguageSelection};
use crate::store::JobResult;
use axum::body::Body;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub job_id: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for TransubError {
    fn into_response(self) -> Response {
        let status = match &self {
            TransubError::UnsupportedFormat(_)
            | TransubError::UnknownLanguage(_)
            | TransubError::InvalidFileType(_)
            | TransubError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            TransubError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            debug!("Request rejected ({}): {}", status, self);
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

fn multipart_error(e: MultipartError) -> TransubError {
    TransubError::InvalidRequest(e.body_text())
}

/// Keep an uploaded file's extension only if it is a plain alphanumeric token.
fn upload_extension(file_name: &str) -> Option<String> {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_string)
}

pub async fn index(State(state): State<AppState>) -> Result<Html<String>, TransubError> {
    let path = state.static_dir.join("index.html");
    tokio::fs::read_to_string(&path)
        .await
        .map(Html)
        .map_err(|_| TransubError::NotFound("landing page".to_string()))
}

pub async fn languages() -> Json<LanguageCatalog> {
    Json(LanguageCatalog::new())
}

/// Accept a video and two language names, then run the whole pipeline before replying.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, TransubError> {
    let mut job: Option<Job> = None;
    let form = read_upload_form(&state, &mut multipart, &mut job).await;

    let (job, languages) = match (form, job) {
        (Ok(languages), Some(job)) => (job, languages),
        (Ok(_), None) => {
            return Err(TransubError::InvalidRequest("missing field 'file'".to_string()))
        }
        (Err(e), saved) => {
            if let Some(saved) = saved {
                state.store.discard_job(&saved).await;
            }
            return Err(e);
        }
    };

    info!(
        job_id = %job.id,
        "Transcription language: {}, translation language: {}",
        languages.transcription_name,
        languages.translation_name
    );

    // Run detached so a dropped connection does not abort the job midway.
    let pipeline = state.pipeline.clone();
    let task_job = job.clone();
    tokio::spawn(async move { pipeline.run(&task_job, &languages).await })
        .await
        .map_err(|e| TransubError::Io(std::io::Error::other(format!("pipeline task: {e}"))))??;

    Ok(Json(UploadResponse {
        job_id: job.id.to_string(),
    }))
}

/// Walk the multipart form, saving the video into a new job and resolving both
/// language names. Languages sent ahead of the file are checked before any job
/// directory exists.
async fn read_upload_form(
    state: &AppState,
    multipart: &mut Multipart,
    job: &mut Option<Job>,
) -> Result<LanguageSelection, TransubError> {
    let mut transcription_lang: Option<String> = None;
    let mut translation_lang: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                if job.is_some() {
                    return Err(TransubError::InvalidRequest(
                        "only one file may be uploaded per request".to_string(),
                    ));
                }
                if let (Some(from), Some(to)) = (&transcription_lang, &translation_lang) {
                    LanguageSelection::resolve(from, to)?;
                }
                let file_name = field.file_name().unwrap_or_default().to_string();
                info!("Received upload request for file: {:?}", file_name);

                let new_job = state
                    .store
                    .create_job(upload_extension(&file_name).as_deref())
                    .await?;
                let new_job = job.insert(new_job);
                state.store.save_video(new_job, field).await?;
            }
            Some("transcription_lang") => {
                transcription_lang = Some(field.text().await.map_err(multipart_error)?);
            }
            Some("translation_lang") => {
                translation_lang = Some(field.text().await.map_err(multipart_error)?);
            }
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }

    let transcription_lang = transcription_lang.ok_or_else(|| {
        TransubError::InvalidRequest("missing field 'transcription_lang'".to_string())
    })?;
    let translation_lang = translation_lang.ok_or_else(|| {
        TransubError::InvalidRequest("missing field 'translation_lang'".to_string())
    })?;
    LanguageSelection::resolve(&transcription_lang, &translation_lang)
}

pub async fn result(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobResult>, TransubError> {
    debug!("Fetching results for job {}", job_id);
    Ok(Json(state.store.read_result(&job_id).await?))
}

pub async fn download(
    State(state): State<AppState>,
    Path((job_id, file_type)): Path<(String, String)>,
) -> Result<Response, TransubError> {
    let kind: SubtitleKind = file_type.parse()?;
    let path = state.store.subtitle_file(&job_id, kind).await?;
    debug!("Serving file: {}", path.display());

    let file = tokio::fs::File::open(&path).await?;
    let body = Body::from_stream(ReaderStream::new(file));

    Ok((
        [
            (header::CONTENT_TYPE, "application/x-subrip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", kind.file_name()),
            ),
        ],
        body,
    )
        .into_response())
}
