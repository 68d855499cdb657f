//! Metric record store contract and the in-memory backend.
//!
//! The in-memory store is the default for development and tests; the
//! ClickHouse store in [`crate::clickhouse_store`] serves production.

use async_trait::async_trait;
use dashmap::DashMap;
use pulse_core::types::MetricRecord;
use pulse_core::{DateRange, PulseResult};
use tracing::{debug, info};
use uuid::Uuid;

/// Durable collection of metric records.
///
/// Reads issued after a successful `insert_many` must observe the inserted
/// records.
#[async_trait]
pub trait MetricStore: Send + Sync {
    /// Write every record in one operation. Returns the number written.
    async fn insert_many(&self, records: Vec<MetricRecord>) -> PulseResult<usize>;

    /// Records whose date falls inside `range`, ascending by date.
    async fn find_in_range(&self, range: DateRange) -> PulseResult<Vec<MetricRecord>>;

    async fn get(&self, id: Uuid) -> PulseResult<Option<MetricRecord>>;

    /// Returns `true` when a record was removed.
    async fn delete(&self, id: Uuid) -> PulseResult<bool>;

    async fn count(&self) -> PulseResult<u64>;

    async fn find_all(&self) -> PulseResult<Vec<MetricRecord>> {
        self.find_in_range(DateRange::default()).await
    }
}

/// Thread-safe in-memory metric store backed by DashMap.
pub struct InMemoryMetricStore {
    records: DashMap<Uuid, MetricRecord>,
}

impl InMemoryMetricStore {
    pub fn new() -> Self {
        info!("Metric store initialized (in-memory)");
        Self {
            records: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for InMemoryMetricStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricStore for InMemoryMetricStore {
    async fn insert_many(&self, records: Vec<MetricRecord>) -> PulseResult<usize> {
        let count = records.len();
        for record in records {
            self.records.insert(record.id, record);
        }
        debug!(count, "Metric records inserted");
        Ok(count)
    }

    async fn find_in_range(&self, range: DateRange) -> PulseResult<Vec<MetricRecord>> {
        let mut matched: Vec<MetricRecord> = self
            .records
            .iter()
            .filter(|r| range.contains(r.value().date))
            .map(|r| r.value().clone())
            .collect();
        matched.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(matched)
    }

    async fn get(&self, id: Uuid) -> PulseResult<Option<MetricRecord>> {
        Ok(self.records.get(&id).map(|r| r.value().clone()))
    }

    async fn delete(&self, id: Uuid) -> PulseResult<bool> {
        Ok(self.records.remove(&id).is_some())
    }

    async fn count(&self) -> PulseResult<u64> {
        Ok(self.records.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pulse_core::types::MetricValues;

    fn record(y: i32, m: u32, d: u32, sales: f64) -> MetricRecord {
        MetricRecord::new(
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            MetricValues {
                daily_sales: sales,
                ..Default::default()
            },
            vec![],
        )
    }

    #[tokio::test]
    async fn test_range_query_is_inclusive_and_sorted() {
        let store = InMemoryMetricStore::new();
        store
            .insert_many(vec![
                record(2024, 5, 3, 3.0),
                record(2024, 5, 1, 1.0),
                record(2024, 5, 2, 2.0),
                record(2024, 6, 1, 9.0),
            ])
            .await
            .unwrap();

        let range = DateRange::between(
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
        );
        let found = store.find_in_range(range).await.unwrap();
        let sales: Vec<f64> = found.iter().map(|r| r.metrics.daily_sales).collect();
        assert_eq!(sales, vec![1.0, 2.0, 3.0]);
    }

    #[tokio::test]
    async fn test_same_date_records_are_kept_side_by_side() {
        let store = InMemoryMetricStore::new();
        store
            .insert_many(vec![record(2024, 5, 1, 100.0), record(2024, 5, 1, 50.0)])
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_record() {
        let store = InMemoryMetricStore::new();
        let r = record(2024, 5, 1, 1.0);
        let id = r.id;
        store.insert_many(vec![r]).await.unwrap();

        assert!(store.get(id).await.unwrap().is_some());
        assert!(store.delete(id).await.unwrap());
        assert!(!store.delete(id).await.unwrap());
        assert!(store.is_empty());
    }
}
