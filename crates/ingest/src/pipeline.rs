//! Upload → validated records → one bulk write.

use crate::spreadsheet;
use crate::transform::RowTransformer;
use pulse_analytics::MetricStore;
use pulse_core::config::IngestConfig;
use pulse_core::{Principal, PulseError, PulseResult};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const XLS_MIME: &str = "application/vnd.ms-excel";

/// A spreadsheet as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub rows_processed: usize,
}

pub struct IngestionPipeline {
    store: Arc<dyn MetricStore>,
    config: IngestConfig,
}

impl IngestionPipeline {
    pub fn new(store: Arc<dyn MetricStore>, config: IngestConfig) -> Self {
        Self { store, config }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.config.max_upload_bytes
    }

    /// Parse, normalize and store an uploaded workbook. Nothing is written
    /// unless every row converts.
    pub async fn ingest(&self, principal: &Principal, upload: Upload) -> PulseResult<IngestReport> {
        let result = self.run(upload).await;
        match &result {
            Ok(report) => {
                metrics::counter!("ingest.uploads").increment(1);
                metrics::counter!("ingest.rows_processed").increment(report.rows_processed as u64);
                info!(
                    user_id = %principal.id,
                    rows = report.rows_processed,
                    "Spreadsheet ingested"
                );
            }
            Err(e) => {
                metrics::counter!("ingest.rejected", "reason" => e.code()).increment(1);
                warn!(user_id = %principal.id, error = %e, "Spreadsheet rejected");
            }
        }
        result
    }

    async fn run(&self, upload: Upload) -> PulseResult<IngestReport> {
        if upload.bytes.len() > self.config.max_upload_bytes {
            return Err(PulseError::PayloadTooLarge {
                limit: self.config.max_upload_bytes,
            });
        }
        if !is_spreadsheet_mime(&upload.content_type) {
            return Err(PulseError::UnsupportedMediaType(format!(
                "{} is not an Excel spreadsheet",
                upload.content_type
            )));
        }
        if upload.bytes.is_empty() {
            return Err(PulseError::EmptyPayload);
        }

        let rows = tokio::task::spawn_blocking(move || spreadsheet::read_first_sheet(&upload.bytes))
            .await
            .map_err(|e| PulseError::Internal(anyhow::anyhow!("spreadsheet decode task failed: {e}")))??;
        if rows.is_empty() {
            return Err(PulseError::EmptyPayload);
        }

        let records = RowTransformer::new(&self.config.date_format).transform(&rows)?;
        let rows_processed = self.store.insert_many(records).await?;
        Ok(IngestReport { rows_processed })
    }
}

pub fn is_spreadsheet_mime(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == XLSX_MIME || essence == XLS_MIME
}
