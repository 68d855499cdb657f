//! Excel upload endpoint.

use crate::rest::AppState;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use pulse_analytics::aggregate::SalesTotals;
use pulse_core::{Principal, PulseError};
use pulse_ingest::Upload;
use pulse_management::ApiResult;
use serde::Serialize;
use utoipa::ToSchema;

/// Multipart field carrying the workbook.
pub const FILE_FIELD: &str = "file";

/// Multipart framing allowance on top of the file size limit.
pub const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub rows_processed: usize,
}

#[utoipa::path(
    post,
    path = "/api/upload/excel",
    tag = "Upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Rows stored", body = UploadResponse),
        (status = 400, description = "No file, not a spreadsheet, or no data rows", body = pulse_management::models::ErrorResponse),
        (status = 413, description = "File too large", body = pulse_management::models::ErrorResponse),
        (status = 500, description = "Unparseable date or corrupt workbook", body = pulse_management::models::ErrorResponse),
    )
)]
pub async fn upload_excel(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let limit = state.pipeline.max_upload_bytes();
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
        upload = Some(Upload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let Some(upload) = upload else {
        metrics::counter!("ingest.rejected", "reason" => "missing_file").increment(1);
        return Err(PulseError::Validation("No file uploaded".into()).into());
    };
    let report = state.pipeline.ingest(&principal, upload).await?;
    Ok(Json(UploadResponse {
        message: "Data uploaded successfully".to_string(),
        rows_processed: report.rows_processed,
    }))
}

#[utoipa::path(
    get,
    path = "/api/upload/summary",
    tag = "Upload",
    responses((status = 200, description = "Totals over every stored record", body = SalesTotals))
)]
pub async fn upload_summary(State(state): State<AppState>) -> ApiResult<Json<SalesTotals>> {
    Ok(Json(state.engine().sales_totals().await?))
}

fn multipart_error(err: MultipartError, limit: usize) -> PulseError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        PulseError::PayloadTooLarge { limit }
    } else {
        PulseError::Validation(format!("malformed multipart body: {}", err.body_text()))
    }
}
