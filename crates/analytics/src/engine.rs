//! Aggregation engine: resolves query windows, pulls matching records from
//! the metric store and reduces them with [`crate::aggregate`].

use crate::aggregate::{
    self, CampaignStatusMetrics, DailyRollup, SalesTotals, SummaryStatistics, TimeSeriesEntry,
};
use crate::store::MetricStore;
use chrono::{Duration, NaiveDate, Utc};
use pulse_core::config::AnalyticsConfig;
use pulse_core::types::{Campaign, Granularity, GroupingStrategy, MetricRecord};
use pulse_core::{DateRange, PulseError, PulseResult};
use std::sync::Arc;
use tracing::debug;

pub struct AggregationEngine {
    store: Arc<dyn MetricStore>,
    strategy: GroupingStrategy,
    default_window_days: i64,
}

impl AggregationEngine {
    pub fn new(store: Arc<dyn MetricStore>, config: &AnalyticsConfig) -> Self {
        Self {
            store,
            strategy: config.grouping,
            default_window_days: config.default_window_days,
        }
    }

    pub fn store(&self) -> &Arc<dyn MetricStore> {
        &self.store
    }

    pub fn strategy(&self) -> GroupingStrategy {
        self.strategy
    }

    /// Fill missing bounds: `start` defaults to `today - window`, `end` to
    /// `today`. Both bounds are inclusive.
    pub fn resolve_range(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> PulseResult<DateRange> {
        let start = start.unwrap_or(today - Duration::days(self.default_window_days));
        let end = end.unwrap_or(today);
        if start > end {
            return Err(PulseError::Validation(format!(
                "startDate {start} is after endDate {end}"
            )));
        }
        Ok(DateRange::between(start, end))
    }

    /// The rolling window ending today, open at the top so late-dated
    /// records still show up.
    pub fn trailing_window(&self) -> DateRange {
        let today = Utc::now().date_naive();
        DateRange::since(today - Duration::days(self.default_window_days))
    }

    pub async fn records(&self, range: DateRange) -> PulseResult<Vec<MetricRecord>> {
        let records = self.store.find_in_range(range).await?;
        debug!(
            start = ?range.start,
            end = ?range.end,
            matched = records.len(),
            "Metric records fetched"
        );
        Ok(records)
    }

    pub async fn time_series(
        &self,
        range: DateRange,
        granularity: Granularity,
    ) -> PulseResult<Vec<TimeSeriesEntry>> {
        let records = self.records(range).await?;
        Ok(aggregate::time_series(&records, granularity, self.strategy))
    }

    pub async fn summary_statistics(&self, range: DateRange) -> PulseResult<SummaryStatistics> {
        let records = self.records(range).await?;
        Ok(aggregate::summary_statistics(&records))
    }

    /// Totals across the whole record collection.
    pub async fn sales_totals(&self) -> PulseResult<SalesTotals> {
        let records = self.store.find_all().await?;
        Ok(aggregate::sales_totals(&records))
    }

    pub async fn daily_rollup(&self, range: DateRange) -> PulseResult<Vec<DailyRollup>> {
        let records = self.records(range).await?;
        Ok(aggregate::daily_rollup(&records))
    }

    /// Status breakdown over every campaign given. No date window applies.
    pub fn campaign_metrics(&self, campaigns: &[Campaign]) -> Vec<CampaignStatusMetrics> {
        aggregate::campaign_status_metrics(campaigns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryMetricStore;
    use pulse_core::types::{CampaignPerformance, CampaignStatus, MetricValues};
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(on: NaiveDate, sales: f64) -> MetricRecord {
        MetricRecord::new(
            on,
            MetricValues {
                daily_sales: sales,
                new_clients: 1.0,
                active_users: 5.0,
                campaign_performance: 50.0,
            },
            vec![],
        )
    }

    async fn engine_with(records: Vec<MetricRecord>) -> AggregationEngine {
        let store = Arc::new(InMemoryMetricStore::new());
        store.insert_many(records).await.unwrap();
        AggregationEngine::new(store, &AnalyticsConfig::default())
    }

    #[test]
    fn test_resolve_range_defaults() {
        let store = Arc::new(InMemoryMetricStore::new());
        let engine = AggregationEngine::new(store, &AnalyticsConfig::default());
        let today = date(2024, 5, 31);

        let range = engine.resolve_range(None, None, today).unwrap();
        assert_eq!(range, DateRange::between(date(2024, 5, 1), today));

        let range = engine
            .resolve_range(Some(date(2024, 1, 1)), None, today)
            .unwrap();
        assert_eq!(range.end, Some(today));
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let store = Arc::new(InMemoryMetricStore::new());
        let engine = AggregationEngine::new(store, &AnalyticsConfig::default());
        let err = engine
            .resolve_range(Some(date(2024, 6, 1)), Some(date(2024, 5, 1)), date(2024, 6, 1))
            .unwrap_err();
        assert!(matches!(err, PulseError::Validation(_)));
    }

    #[tokio::test]
    async fn test_day_series_over_store() {
        let engine = engine_with(vec![
            record(date(2024, 5, 1), 100.0),
            record(date(2024, 5, 1), 50.0),
            record(date(2024, 5, 2), 10.0),
            record(date(2024, 7, 1), 999.0),
        ])
        .await;

        let range = DateRange::between(date(2024, 5, 1), date(2024, 5, 31));
        let series = engine.time_series(range, Granularity::Day).await.unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].total_sales, 150.0);
        assert_eq!(series[0].count, 2);
        assert_eq!(series[1].total_sales, 10.0);
    }

    #[tokio::test]
    async fn test_empty_range_has_no_statistics() {
        let engine = engine_with(vec![record(date(2024, 5, 1), 100.0)]).await;
        let range = DateRange::between(date(2020, 1, 1), date(2020, 1, 31));

        let stats = engine.summary_statistics(range).await.unwrap();
        assert_eq!(stats.sample_size, 0);
        assert_eq!(stats.mean_sales, None);
        assert_eq!(stats.std_dev_sales, None);
        assert_eq!(stats.mean_performance, None);
    }

    #[tokio::test]
    async fn test_statistics_std_dev() {
        let engine = engine_with(vec![
            record(date(2024, 5, 1), 10.0),
            record(date(2024, 5, 2), 20.0),
            record(date(2024, 5, 3), 30.0),
        ])
        .await;
        let range = DateRange::between(date(2024, 5, 1), date(2024, 5, 3));
        let stats = engine.summary_statistics(range).await.unwrap();
        assert!((stats.std_dev_sales.unwrap() - 8.165).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_campaign_metrics_count_every_campaign() {
        let engine = engine_with(vec![]).await;
        let campaigns: Vec<Campaign> = [CampaignStatus::Active, CampaignStatus::Paused]
            .into_iter()
            .map(|status| Campaign {
                id: Uuid::new_v4(),
                name: "spring".into(),
                client: Uuid::new_v4(),
                start_date: date(2019, 1, 1),
                end_date: None,
                budget: Some(1000.0),
                status,
                metrics: CampaignPerformance::default(),
                platforms: vec![],
                created_by: Uuid::new_v4(),
                created_at: Utc::now(),
            })
            .collect();

        // Campaigns starting long before any record window still count.
        let metrics = engine.campaign_metrics(&campaigns);
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics.iter().map(|m| m.count).sum::<u64>(), 2);
        assert_eq!(metrics[0].total_budget, 1000.0);
    }

    #[tokio::test]
    async fn test_sales_totals_cover_everything() {
        let engine = engine_with(vec![
            record(date(2001, 1, 1), 1.0),
            record(date(2024, 5, 1), 2.0),
        ])
        .await;
        let totals = engine.sales_totals().await.unwrap();
        assert_eq!(totals.total_sales, Some(3.0));
        assert_eq!(totals.total_clients, Some(2.0));
        assert_eq!(totals.avg_performance, Some(50.0));
    }
}
