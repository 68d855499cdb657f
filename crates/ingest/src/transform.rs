//! Row → [`MetricRecord`] normalization.

use crate::spreadsheet::{CellValue, SheetRow};
use chrono::NaiveDate;
use pulse_core::types::{CampaignBreakdown, MetricRecord, MetricValues};
use pulse_core::{PulseError, PulseResult};
use uuid::Uuid;

pub mod columns {
    pub const DATE: &str = "date";
    pub const SALES: &str = "sales";
    pub const NEW_CLIENTS: &str = "newClients";
    pub const ACTIVE_USERS: &str = "activeUsers";
    pub const PERFORMANCE: &str = "performance";
    pub const CAMPAIGN_ID: &str = "campaignId";
    pub const IMPRESSIONS: &str = "impressions";
    pub const CLICKS: &str = "clicks";
    pub const CONVERSIONS: &str = "conversions";
    pub const SPEND: &str = "spend";
}

pub struct RowTransformer {
    date_format: String,
}

impl RowTransformer {
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            date_format: date_format.into(),
        }
    }

    /// Convert every row or none. The first bad date fails the whole batch,
    /// naming the 1-based data row it came from.
    pub fn transform(&self, rows: &[SheetRow]) -> PulseResult<Vec<MetricRecord>> {
        rows.iter()
            .enumerate()
            .map(|(index, row)| self.transform_row(index + 1, row))
            .collect()
    }

    fn transform_row(&self, line: usize, row: &SheetRow) -> PulseResult<MetricRecord> {
        let date = self.parse_date(row.get(columns::DATE)).map_err(|reason| {
            PulseError::InvalidDateFormat(format!("row {line}: {reason}"))
        })?;

        let metrics = MetricValues {
            daily_sales: number(row, columns::SALES),
            new_clients: number(row, columns::NEW_CLIENTS),
            active_users: number(row, columns::ACTIVE_USERS),
            campaign_performance: number(row, columns::PERFORMANCE),
        };
        let breakdown = CampaignBreakdown {
            campaign: campaign_ref(row.get(columns::CAMPAIGN_ID)),
            impressions: number(row, columns::IMPRESSIONS),
            clicks: number(row, columns::CLICKS),
            conversions: number(row, columns::CONVERSIONS),
            spend: number(row, columns::SPEND),
        };

        Ok(MetricRecord::new(date, metrics, vec![breakdown]))
    }

    fn parse_date(&self, cell: Option<&CellValue>) -> Result<NaiveDate, String> {
        match cell {
            Some(CellValue::Date(date)) => Ok(*date),
            Some(CellValue::Text(text)) if !text.trim().is_empty() => {
                NaiveDate::parse_from_str(text.trim(), &self.date_format).map_err(|_| {
                    format!(
                        "'{}' does not match the {} date format",
                        text.trim(),
                        self.date_format
                    )
                })
            }
            Some(CellValue::Number(n)) => Err(format!(
                "numeric value {n} is not a date, expected {}",
                self.date_format
            )),
            _ => Err("date is missing".to_string()),
        }
    }
}

/// Numeric column value; absent or non-numeric cells read as zero.
fn number(row: &SheetRow, column: &str) -> f64 {
    match row.get(column) {
        Some(CellValue::Number(n)) if n.is_finite() => *n,
        Some(CellValue::Text(text)) => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0),
        _ => 0.0,
    }
}

fn campaign_ref(cell: Option<&CellValue>) -> Option<Uuid> {
    match cell {
        Some(CellValue::Text(text)) => Uuid::parse_str(text.trim()).ok(),
        _ => None,
    }
}
