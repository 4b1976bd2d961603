//! Request handlers.

use std::path::PathBuf;

use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::Serialize;
use tracing::info;

use rsvp_models::{
    normalize_whitespace, word_count, ContentError, FontChoice, JobId, JobState, JobStatusRecord,
    Rgb, VideoConfig, MAX_WORD_COUNT,
};
use rsvp_queue::GenerateVideoJob;

use crate::error::{ApiError, ApiResult};
use crate::extract::{extract_text, UploadedFile};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

/// GET /api/health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "rsvp-video-generator",
    })
}

#[derive(Serialize)]
pub struct GenerateResponse {
    job_id: JobId,
    word_count: usize,
    status: &'static str,
    status_url: String,
}

/// Submitted form fields with the original's defaults.
struct SubmittedForm {
    text: Option<String>,
    file: Option<UploadedFile>,
    wpm: u32,
    font: FontChoice,
    text_color: String,
    bg_color: String,
    highlight_color: String,
    pause_on_punctuation: bool,
    word_grouping: u32,
}

impl Default for SubmittedForm {
    fn default() -> Self {
        Self {
            text: None,
            file: None,
            wpm: 300,
            font: FontChoice::Default,
            text_color: "#000000".to_string(),
            bg_color: "#FFFFFF".to_string(),
            highlight_color: "#FF0000".to_string(),
            pause_on_punctuation: true,
            word_grouping: 1,
        }
    }
}

async fn read_form(mut multipart: Multipart) -> ApiResult<SubmittedForm> {
    let mut form = SubmittedForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("upload.txt").to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(e.to_string()))?
                    .to_vec();
                form.file = Some(UploadedFile {
                    filename,
                    content_type,
                    bytes,
                });
            }
            _ => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(e.to_string()))?;
                match name.as_str() {
                    "text" => form.text = Some(value),
                    "wpm" => form.wpm = value.parse().unwrap_or(form.wpm),
                    "font" => form.font = FontChoice::parse(&value),
                    "text_color" => form.text_color = value,
                    "bg_color" => form.bg_color = value,
                    "highlight_color" => form.highlight_color = value,
                    "pause_on_punctuation" => {
                        form.pause_on_punctuation = parse_bool(&value, form.pause_on_punctuation)
                    }
                    "word_grouping" => {
                        form.word_grouping = value.parse().unwrap_or(form.word_grouping)
                    }
                    _ => {}
                }
            }
        }
    }

    Ok(form)
}

fn parse_bool(value: &str, default: bool) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => default,
    }
}

/// POST /api/generate
///
/// Submit a video generation job. Returns immediately with the job id; the
/// pipeline runs on a worker.
pub async fn generate_video(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<GenerateResponse>> {
    let mut form = read_form(multipart).await?;

    // An uploaded file takes precedence over inline text.
    let raw_text = match (form.file.take(), form.text.take()) {
        (Some(file), _) => extract_text(&file)?,
        (None, Some(text)) => text,
        (None, None) => return Err(ContentError::NoInput.into()),
    };

    // Bounded fields are clamped here, once; every downstream component
    // relies on the bounds holding.
    let config = VideoConfig {
        wpm: form.wpm,
        font: form.font,
        text_color: Rgb::from_hex(&form.text_color)?,
        bg_color: Rgb::from_hex(&form.bg_color)?,
        highlight_color: Rgb::from_hex(&form.highlight_color)?,
        pause_on_punctuation: form.pause_on_punctuation,
        word_grouping: form.word_grouping,
        width: 1920,
        height: 1080,
    }
    .clamped();

    let text = normalize_whitespace(&raw_text);
    if text.is_empty() {
        return Err(ContentError::EmptyText.into());
    }

    let words = word_count(&text);
    if words > MAX_WORD_COUNT {
        return Err(ContentError::word_limit(words).into());
    }

    let job = GenerateVideoJob::new(text, config);

    // The Pending record exists before the job is visible to any worker,
    // so a poll racing the enqueue still finds it.
    let record = JobStatusRecord::new(job.job_id.clone());
    state.status.put(&record).await?;
    state.queue.enqueue(&job).await?;

    info!("Accepted job {} ({} words)", job.job_id, words);

    Ok(Json(GenerateResponse {
        status_url: format!("/api/status/{}", job.job_id),
        job_id: job.job_id,
        word_count: words,
        status: "processing",
    }))
}

#[derive(Serialize)]
pub struct StatusResponse {
    job_id: JobId,
    status: &'static str,
    percent: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    current: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    word_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    download_url: Option<String>,
}

/// GET /api/status/:job_id
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let job_id = JobId::from_string(job_id);
    let record = state
        .status
        .get(&job_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found or expired"))?;

    let response = match record.state {
        JobState::Pending => StatusResponse {
            job_id,
            status: "pending",
            percent: 0,
            message: Some("Job is queued...".to_string()),
            current: None,
            total: None,
            word_count: None,
            download_url: None,
        },
        JobState::Progress {
            current,
            total,
            percent,
            message,
        } => StatusResponse {
            job_id,
            status: "processing",
            percent,
            message: Some(message),
            current: Some(current),
            total: Some(total),
            word_count: None,
            download_url: None,
        },
        JobState::Success {
            word_count,
            artifact,
        } => StatusResponse {
            download_url: Some(artifact.download_url(&job_id)),
            job_id,
            status: "completed",
            percent: 100,
            message: None,
            current: None,
            total: None,
            word_count: Some(word_count),
        },
        JobState::Failure { message } => StatusResponse {
            job_id,
            status: "failed",
            percent: 0,
            message: Some(message),
            current: None,
            total: None,
            word_count: None,
            download_url: None,
        },
    };

    Ok(Json(response))
}

/// GET /api/download/:job_id
///
/// Redirects to object storage when the artifact was promoted, otherwise
/// serves the worker's local file.
pub async fn download_video(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Response> {
    let job_id = JobId::from_string(job_id);

    if state.storage.exists(&job_id).await {
        if let Some(url) = state.storage.url_for(&job_id) {
            return Ok(Redirect::temporary(&url).into_response());
        }
    }

    let local_path = PathBuf::from(&state.config.work_dir)
        .join(job_id.as_str())
        .join("output.mp4");

    let bytes = tokio::fs::read(&local_path)
        .await
        .map_err(|_| ApiError::not_found("Video not found or expired"))?;

    Ok((
        [
            (header::CONTENT_TYPE, "video/mp4".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"rsvp_video.mp4\"".to_string(),
            ),
        ],
        bytes,
    )
        .into_response())
}

#[derive(Serialize)]
pub struct DeleteResponse {
    status: &'static str,
    job_id: JobId,
}

/// DELETE /api/job/:job_id
///
/// Stops an in-flight job best-effort, then removes its files, status
/// record, and any remote artifact.
pub async fn delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let job_id = JobId::from_string(job_id);

    // The cancel flag lands first so an owning worker stops publishing
    // progress before the record disappears.
    state.status.request_cancel(&job_id).await?;
    state.status.delete(&job_id).await?;

    let job_dir = PathBuf::from(&state.config.work_dir).join(job_id.as_str());
    if let Err(e) = tokio::fs::remove_dir_all(&job_dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            return Err(ApiError::internal(format!(
                "Failed to remove job files: {}",
                e
            )));
        }
    }

    state.storage.delete(&job_id).await;

    info!("Deleted job {}", job_id);

    Ok(Json(DeleteResponse {
        status: "deleted",
        job_id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true", false));
        assert!(parse_bool("1", false));
        assert!(!parse_bool("off", true));
        assert!(parse_bool("garbage", true));
        assert!(!parse_bool("garbage", false));
    }

    #[test]
    fn test_form_defaults_match_submission_contract() {
        let form = SubmittedForm::default();
        assert_eq!(form.wpm, 300);
        assert_eq!(form.font, FontChoice::Default);
        assert_eq!(form.word_grouping, 1);
        assert!(form.pause_on_punctuation);
    }
}
