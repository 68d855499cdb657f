//! Bulk Excel ingestion: workbook decoding, row normalization and the
//! all-or-nothing upload pipeline feeding the metric store.

pub mod pipeline;
pub mod spreadsheet;
pub mod transform;

#[cfg(test)]
mod fixtures;

pub use pipeline::{IngestReport, IngestionPipeline, Upload};
