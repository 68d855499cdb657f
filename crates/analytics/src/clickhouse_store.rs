//! ClickHouse-backed metric store.
//!
//! Records are flattened into one row each; the campaign breakdown travels as
//! a JSON string column since it is only ever read back whole.

use crate::store::MetricStore;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use clickhouse::Row;
use pulse_core::config::ClickHouseConfig;
use pulse_core::types::{CampaignBreakdown, MetricRecord, MetricValues};
use pulse_core::{DateRange, PulseError, PulseResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Flat ClickHouse row. `date` is a ClickHouse `Date` (days since epoch).
#[derive(Debug, Clone, Row, Serialize, Deserialize)]
struct MetricRow {
    id: String,
    date: u16,
    daily_sales: f64,
    new_clients: f64,
    active_users: f64,
    campaign_performance: f64,
    campaigns: String,
}

pub struct ClickHouseMetricStore {
    client: clickhouse::Client,
    table: String,
}

impl ClickHouseMetricStore {
    /// Connect and make sure the records table exists.
    pub async fn new(config: &ClickHouseConfig) -> PulseResult<Self> {
        let client = clickhouse::Client::default()
            .with_url(&config.url)
            .with_database(&config.database);

        let store = Self {
            client,
            table: config.table.clone(),
        };
        store.ensure_schema().await?;

        info!(url = %config.url, table = %store.table, "ClickHouse metric store initialized");
        Ok(store)
    }

    async fn ensure_schema(&self) -> PulseResult<()> {
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id String,
                date Date,
                daily_sales Float64,
                new_clients Float64,
                active_users Float64,
                campaign_performance Float64,
                campaigns String
            ) ENGINE = MergeTree()
            ORDER BY (date, id)
            PARTITION BY toYYYYMM(date)",
            self.table
        );
        self.client.query(&ddl).execute().await.map_err(store_error)?;
        info!("ClickHouse schema verified");
        Ok(())
    }

    fn range_clause(range: &DateRange) -> String {
        let mut clauses = Vec::new();
        if range.start.is_some() {
            clauses.push("date >= toDate(?)");
        }
        if range.end.is_some() {
            clauses.push("date <= toDate(?)");
        }
        if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        }
    }
}

#[async_trait]
impl MetricStore for ClickHouseMetricStore {
    async fn insert_many(&self, records: Vec<MetricRecord>) -> PulseResult<usize> {
        let count = records.len();
        if count == 0 {
            return Ok(0);
        }

        let rows = records
            .iter()
            .map(to_row)
            .collect::<PulseResult<Vec<MetricRow>>>()?;

        let mut insert = self.client.insert::<MetricRow>(&self.table).map_err(store_error)?;
        for row in &rows {
            insert.write(row).await.map_err(store_error)?;
        }
        insert.end().await.map_err(store_error)?;

        metrics::counter!("store.clickhouse.rows_written").increment(count as u64);
        debug!(count, "Metric batch written to ClickHouse");
        Ok(count)
    }

    async fn find_in_range(&self, range: DateRange) -> PulseResult<Vec<MetricRecord>> {
        let sql = format!(
            "SELECT ?fields FROM {}{} ORDER BY date, id",
            self.table,
            Self::range_clause(&range)
        );
        let mut query = self.client.query(&sql);
        if let Some(start) = range.start {
            query = query.bind(start.to_string());
        }
        if let Some(end) = range.end {
            query = query.bind(end.to_string());
        }

        let rows = query.fetch_all::<MetricRow>().await.map_err(store_error)?;
        rows.into_iter().map(from_row).collect()
    }

    async fn get(&self, id: Uuid) -> PulseResult<Option<MetricRecord>> {
        let sql = format!("SELECT ?fields FROM {} WHERE id = ? LIMIT 1", self.table);
        let rows = self
            .client
            .query(&sql)
            .bind(id.to_string())
            .fetch_all::<MetricRow>()
            .await
            .map_err(store_error)?;
        rows.into_iter().next().map(from_row).transpose()
    }

    async fn delete(&self, id: Uuid) -> PulseResult<bool> {
        let sql = format!("SELECT count() FROM {} WHERE id = ?", self.table);
        let existing = self
            .client
            .query(&sql)
            .bind(id.to_string())
            .fetch_one::<u64>()
            .await
            .map_err(store_error)?;
        if existing == 0 {
            return Ok(false);
        }

        let sql = delete_sql(&self.table);
        self.client
            .query(&sql)
            .bind(id.to_string())
            .execute()
            .await
            .map_err(store_error)?;
        Ok(true)
    }

    async fn count(&self) -> PulseResult<u64> {
        let sql = format!("SELECT count() FROM {}", self.table);
        self.client
            .query(&sql)
            .fetch_one::<u64>()
            .await
            .map_err(store_error)
    }
}

fn store_error(e: clickhouse::error::Error) -> PulseError {
    metrics::counter!("store.clickhouse.errors").increment(1);
    error!(error = %e, "ClickHouse operation failed");
    PulseError::Store(e.to_string())
}

/// Mutation that removes one record and returns only once it has been
/// applied, so a read right after `delete` no longer sees the row.
fn delete_sql(table: &str) -> String {
    format!("ALTER TABLE {table} DELETE WHERE id = ? SETTINGS mutations_sync = 1")
}

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

fn date_to_days(date: NaiveDate) -> PulseResult<u16> {
    let days = date.signed_duration_since(epoch()).num_days();
    u16::try_from(days)
        .map_err(|_| PulseError::Validation(format!("date {date} is outside the storable range")))
}

fn days_to_date(days: u16) -> NaiveDate {
    epoch() + Duration::days(i64::from(days))
}

fn to_row(record: &MetricRecord) -> PulseResult<MetricRow> {
    Ok(MetricRow {
        id: record.id.to_string(),
        date: date_to_days(record.date)?,
        daily_sales: record.metrics.daily_sales,
        new_clients: record.metrics.new_clients,
        active_users: record.metrics.active_users,
        campaign_performance: record.metrics.campaign_performance,
        campaigns: serde_json::to_string(&record.campaigns)?,
    })
}

fn from_row(row: MetricRow) -> PulseResult<MetricRecord> {
    let id = Uuid::parse_str(&row.id)
        .map_err(|e| PulseError::Store(format!("corrupt record id '{}': {e}", row.id)))?;
    let campaigns: Vec<CampaignBreakdown> = serde_json::from_str(&row.campaigns)?;
    Ok(MetricRecord {
        id,
        date: days_to_date(row.date),
        metrics: MetricValues {
            daily_sales: row.daily_sales,
            new_clients: row.new_clients,
            active_users: row.active_users,
            campaign_performance: row.campaign_performance,
        },
        campaigns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clickhouse_date_encoding() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let days = date_to_days(date).unwrap();
        assert_eq!(days, 19844);
        assert_eq!(days_to_date(days), date);
    }

    #[test]
    fn test_delete_waits_for_the_mutation() {
        let sql = delete_sql("metric_records");
        assert!(sql.starts_with("ALTER TABLE metric_records DELETE WHERE id = ?"));
        assert!(sql.ends_with("SETTINGS mutations_sync = 1"));
    }

    #[test]
    fn test_dates_before_epoch_are_rejected() {
        let date = NaiveDate::from_ymd_opt(1969, 12, 31).unwrap();
        assert!(date_to_days(date).is_err());
    }

    #[test]
    fn test_row_keeps_breakdown() {
        let campaign = Uuid::new_v4();
        let record = MetricRecord::new(
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            MetricValues {
                daily_sales: 12.5,
                ..Default::default()
            },
            vec![CampaignBreakdown {
                campaign: Some(campaign),
                clicks: 4.0,
                ..Default::default()
            }],
        );
        let restored = from_row(to_row(&record).unwrap()).unwrap();
        assert_eq!(restored, record);
    }

    #[test]
    fn test_range_clause() {
        let d = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(ClickHouseMetricStore::range_clause(&DateRange::default()), "");
        assert_eq!(
            ClickHouseMetricStore::range_clause(&DateRange::since(d)),
            " WHERE date >= toDate(?)"
        );
        assert_eq!(
            ClickHouseMetricStore::range_clause(&DateRange::between(d, d)),
            " WHERE date >= toDate(?) AND date <= toDate(?)"
        );
    }
}
