use axum::Json;
use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::Response;
use tracing::debug;

use ephemera_core::{ContentBody, ContentError, ContentId, EntryView};

use super::AppState;
use super::schemas::{ErrorResponse, ShareTextRequest};
use crate::error::ServerError;

/// Multipart field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "file";

/// MIME type assumed for parts that do not declare one.
const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// `GET /api/content` -- every live entry, newest first.
#[utoipa::path(
    get,
    path = "/api/content",
    tag = "Content",
    summary = "List shared content",
    description = "Returns metadata for every live entry, newest first. File payloads are not included.",
    responses(
        (status = 200, description = "Live entries", body = Vec<EntryView>)
    )
)]
#[allow(clippy::unused_async)]
pub async fn list_content(State(state): State<AppState>) -> Json<Vec<EntryView>> {
    Json(state.relay.list())
}

/// `GET /api/content/{id}` -- metadata for one entry.
#[utoipa::path(
    get,
    path = "/api/content/{id}",
    tag = "Content",
    summary = "Get one entry",
    params(("id" = String, Path, description = "Entry id")),
    responses(
        (status = 200, description = "Entry metadata", body = EntryView),
        (status = 404, description = "No such entry", body = ErrorResponse),
        (status = 410, description = "Entry has expired", body = ErrorResponse)
    )
)]
#[allow(clippy::unused_async)]
pub async fn get_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EntryView>, ServerError> {
    let entry = state.relay.fetch(&ContentId::new(id))?;
    Ok(Json(entry.view()))
}

/// `POST /api/text` -- share a text snippet.
#[utoipa::path(
    post,
    path = "/api/text",
    tag = "Content",
    summary = "Share text",
    description = "Stores a text snippet, optionally rendered as markdown, and announces it to every connected observer.",
    request_body = ShareTextRequest,
    responses(
        (status = 201, description = "Text shared", body = EntryView),
        (status = 400, description = "Empty or too long", body = ErrorResponse)
    )
)]
#[allow(clippy::unused_async)]
pub async fn share_text(
    State(state): State<AppState>,
    Json(request): Json<ShareTextRequest>,
) -> Result<(StatusCode, Json<EntryView>), ServerError> {
    let view = state.relay.share_text(&request.content, request.markdown)?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// `POST /api/upload` -- share a file.
///
/// Reads the multipart field named `file`; other fields are ignored.
#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "Content",
    summary = "Upload a file",
    description = "Stores an uploaded file and announces it to every connected observer. The file is sent in the multipart field `file`.",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File shared", body = EntryView),
        (status = 400, description = "Missing file or filename", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 415, description = "File type not allowed", body = ErrorResponse)
    )
)]
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<EntryView>), ServerError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_owned)
            .ok_or_else(|| ServerError::BadRequest("upload has no filename".into()))?;
        let mime_type = field
            .content_type()
            .unwrap_or(FALLBACK_MIME_TYPE)
            .to_owned();

        // Reject before buffering when the type alone rules the file out.
        if !state.relay.limits().is_mime_allowed(&mime_type) {
            return Err(ContentError::UnsupportedMediaType(mime_type).into());
        }

        let payload = field.bytes().await?;
        debug!(filename = %filename, mime_type = %mime_type, size = payload.len(), "upload received");

        let view = state.relay.share_file(&filename, &mime_type, payload)?;
        return Ok((StatusCode::CREATED, Json(view)));
    }

    Err(ServerError::BadRequest(format!(
        "missing multipart field `{UPLOAD_FIELD}`"
    )))
}

/// `GET /api/files/{id}` -- download a shared file.
#[utoipa::path(
    get,
    path = "/api/files/{id}",
    tag = "Content",
    summary = "Download a file",
    params(("id" = String, Path, description = "Entry id")),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 404, description = "No such file", body = ErrorResponse),
        (status = 410, description = "File has expired", body = ErrorResponse)
    )
)]
#[allow(clippy::unused_async)]
pub async fn download_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServerError> {
    let id = ContentId::new(id);
    let entry = state.relay.fetch(&id)?;
    let ContentBody::File(file) = entry.body() else {
        return Err(ContentError::NotFound(id).into());
    };

    let content_type = HeaderValue::from_str(&file.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_MIME_TYPE));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, file.size_bytes)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition(&file.filename),
        )
        .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
        .header(header::CACHE_CONTROL, "no-store")
        .body(Body::from(file.payload.clone()))
        .map_err(|e| ServerError::Internal(format!("failed to build response: {e}")))
}

/// Build an `attachment` disposition with an ASCII fallback name and the
/// UTF-8 name in `filename*`.
fn content_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if ascii == filename {
        format!("attachment; filename=\"{ascii}\"")
    } else {
        format!(
            "attachment; filename=\"{ascii}\"; filename*=UTF-8''{}",
            percent_encode(filename)
        )
    }
}

/// Percent-encode everything outside the RFC 5987 `attr-char` set.
fn percent_encode(value: &str) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}
