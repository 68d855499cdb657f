//! Pure grouping/reducing functions over already-fetched records, campaigns
//! and clients. The engine feeds these from the stores.

use crate::grouping::GroupKey;
use crate::stats;
use chrono::NaiveDate;
use pulse_core::types::{
    Campaign, CampaignStatus, Client, ClientStatus, Granularity, GroupingStrategy, MetricRecord,
};
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

// ─── Result types ──────────────────────────────────────────────────────────

/// One bucket of the detailed time series.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesEntry {
    #[serde(rename = "_id")]
    #[schema(value_type = Object)]
    pub key: GroupKey,
    pub avg_daily_sales: f64,
    pub total_sales: f64,
    pub max_sales: f64,
    pub min_sales: f64,
    pub total_new_clients: f64,
    pub avg_performance: f64,
    pub total_active_users: f64,
    pub count: u64,
}

/// Whole-range statistics computed in one pass over the matched records.
/// Every measure is `None` when nothing matched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStatistics {
    pub mean_sales: Option<f64>,
    pub median_sales: Option<f64>,
    pub std_dev_sales: Option<f64>,
    pub total_sales: Option<f64>,
    pub total_clients: Option<f64>,
    pub mean_performance: Option<f64>,
    pub sample_size: u64,
}

impl SummaryStatistics {
    pub fn has_data(&self) -> bool {
        self.sample_size > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignStatusMetrics {
    #[serde(rename = "_id")]
    pub status: CampaignStatus,
    pub count: u64,
    pub avg_budget: Option<f64>,
    pub total_budget: f64,
    #[serde(rename = "avgROI")]
    pub avg_roi: Option<f64>,
}

/// Admin overview flavour of the campaign status breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignStatusStats {
    #[serde(rename = "_id")]
    pub status: CampaignStatus,
    pub count: u64,
    pub total_budget: f64,
    /// Mean ROI of the campaigns that report one.
    pub avg_performance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientStatusStats {
    #[serde(rename = "_id")]
    pub status: ClientStatus,
    pub count: u64,
    pub total_spend: f64,
}

/// Sales/clients/performance totals over a record set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesTotals {
    pub total_sales: Option<f64>,
    pub total_clients: Option<f64>,
    pub avg_performance: Option<f64>,
}

/// Per-calendar-day rollup used by the admin overview.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyRollup {
    pub date: NaiveDate,
    pub sales: f64,
    pub new_clients: f64,
    pub active_users: f64,
    pub performance: f64,
}

// ─── Reducers ──────────────────────────────────────────────────────────────

/// Group records by `granularity` and reduce each group. Output is sorted
/// ascending by key.
pub fn time_series(
    records: &[MetricRecord],
    granularity: Granularity,
    strategy: GroupingStrategy,
) -> Vec<TimeSeriesEntry> {
    let mut groups: BTreeMap<GroupKey, Vec<&MetricRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry(GroupKey::for_date(record.date, granularity, strategy))
            .or_default()
            .push(record);
    }

    groups
        .into_iter()
        .map(|(key, members)| {
            let sales: Vec<f64> = members.iter().map(|r| r.metrics.daily_sales).collect();
            let performance: Vec<f64> = members
                .iter()
                .map(|r| r.metrics.campaign_performance)
                .collect();
            let total_sales: f64 = sales.iter().sum();
            let count = members.len();
            TimeSeriesEntry {
                key,
                avg_daily_sales: total_sales / count as f64,
                total_sales,
                max_sales: stats::max(&sales).unwrap_or_default(),
                min_sales: stats::min(&sales).unwrap_or_default(),
                total_new_clients: members.iter().map(|r| r.metrics.new_clients).sum(),
                avg_performance: performance.iter().sum::<f64>() / count as f64,
                total_active_users: members.iter().map(|r| r.metrics.active_users).sum(),
                count: count as u64,
            }
        })
        .collect()
}

pub fn summary_statistics(records: &[MetricRecord]) -> SummaryStatistics {
    if records.is_empty() {
        return SummaryStatistics::default();
    }
    let sales: Vec<f64> = records.iter().map(|r| r.metrics.daily_sales).collect();
    let performance: Vec<f64> = records
        .iter()
        .map(|r| r.metrics.campaign_performance)
        .collect();

    SummaryStatistics {
        mean_sales: stats::mean(&sales),
        median_sales: stats::median(&sales),
        std_dev_sales: stats::population_std_dev(&sales),
        total_sales: Some(sales.iter().sum()),
        total_clients: Some(records.iter().map(|r| r.metrics.new_clients).sum()),
        mean_performance: stats::mean(&performance),
        sample_size: records.len() as u64,
    }
}

pub fn sales_totals(records: &[MetricRecord]) -> SalesTotals {
    if records.is_empty() {
        return SalesTotals::default();
    }
    let performance: Vec<f64> = records
        .iter()
        .map(|r| r.metrics.campaign_performance)
        .collect();
    SalesTotals {
        total_sales: Some(records.iter().map(|r| r.metrics.daily_sales).sum()),
        total_clients: Some(records.iter().map(|r| r.metrics.new_clients).sum()),
        avg_performance: stats::mean(&performance),
    }
}

/// Campaign breakdown by status. Scans every campaign handed in; callers pass
/// the whole collection, not a date-filtered subset.
pub fn campaign_status_metrics(campaigns: &[Campaign]) -> Vec<CampaignStatusMetrics> {
    group_campaigns(campaigns)
        .into_iter()
        .map(|(status, members)| {
            let budgets: Vec<f64> = members.iter().filter_map(|c| c.budget).collect();
            let rois: Vec<f64> = members.iter().filter_map(|c| c.metrics.roi).collect();
            CampaignStatusMetrics {
                status,
                count: members.len() as u64,
                avg_budget: stats::mean(&budgets),
                total_budget: budgets.iter().sum(),
                avg_roi: stats::mean(&rois),
            }
        })
        .collect()
}

pub fn campaign_status_stats(campaigns: &[Campaign]) -> Vec<CampaignStatusStats> {
    group_campaigns(campaigns)
        .into_iter()
        .map(|(status, members)| {
            let rois: Vec<f64> = members.iter().filter_map(|c| c.metrics.roi).collect();
            CampaignStatusStats {
                status,
                count: members.len() as u64,
                total_budget: members.iter().filter_map(|c| c.budget).sum(),
                avg_performance: stats::mean(&rois),
            }
        })
        .collect()
}

pub fn client_status_stats(clients: &[Client]) -> Vec<ClientStatusStats> {
    let mut groups: BTreeMap<ClientStatus, Vec<&Client>> = BTreeMap::new();
    for client in clients {
        groups.entry(client.status).or_default().push(client);
    }
    groups
        .into_iter()
        .map(|(status, members)| ClientStatusStats {
            status,
            count: members.len() as u64,
            total_spend: members.iter().map(|c| c.metrics.total_spend).sum(),
        })
        .collect()
}

/// Sum records per calendar day (performance is averaged), ascending by date.
pub fn daily_rollup(records: &[MetricRecord]) -> Vec<DailyRollup> {
    time_series(records, Granularity::Day, GroupingStrategy::YearQualified)
        .into_iter()
        .filter_map(|entry| match entry.key {
            GroupKey::Day(date) => Some(DailyRollup {
                date,
                sales: entry.total_sales,
                new_clients: entry.total_new_clients,
                active_users: entry.total_active_users,
                performance: entry.avg_performance,
            }),
            _ => None,
        })
        .collect()
}

fn group_campaigns(campaigns: &[Campaign]) -> BTreeMap<CampaignStatus, Vec<&Campaign>> {
    let mut groups: BTreeMap<CampaignStatus, Vec<&Campaign>> = BTreeMap::new();
    for campaign in campaigns {
        groups.entry(campaign.status).or_default().push(campaign);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pulse_core::types::{CampaignPerformance, ClientMetrics, MetricValues};
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(on: NaiveDate, sales: f64, new_clients: f64, performance: f64) -> MetricRecord {
        MetricRecord::new(
            on,
            MetricValues {
                daily_sales: sales,
                new_clients,
                active_users: 10.0,
                campaign_performance: performance,
            },
            vec![],
        )
    }

    fn campaign(status: CampaignStatus, budget: Option<f64>, roi: Option<f64>) -> Campaign {
        Campaign {
            id: Uuid::new_v4(),
            name: "c".into(),
            client: Uuid::new_v4(),
            start_date: date(2024, 1, 1),
            end_date: None,
            budget,
            status,
            metrics: CampaignPerformance {
                roi,
                ..Default::default()
            },
            platforms: vec![],
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_day_grouping_sums_same_date() {
        let records = vec![
            record(date(2024, 5, 1), 100.0, 1.0, 80.0),
            record(date(2024, 5, 1), 50.0, 2.0, 60.0),
        ];
        let series = time_series(&records, Granularity::Day, GroupingStrategy::YearAgnostic);

        assert_eq!(series.len(), 1);
        let group = &series[0];
        assert_eq!(group.key, GroupKey::Day(date(2024, 5, 1)));
        assert_eq!(group.total_sales, 150.0);
        assert_eq!(group.count, 2);
        assert_eq!(group.avg_daily_sales, 75.0);
        assert_eq!(group.max_sales, 100.0);
        assert_eq!(group.min_sales, 50.0);
        assert_eq!(group.total_new_clients, 3.0);
        assert_eq!(group.avg_performance, 70.0);
        assert_eq!(group.total_active_users, 20.0);
    }

    #[test]
    fn test_series_sorted_by_key() {
        let records = vec![
            record(date(2024, 7, 3), 1.0, 0.0, 0.0),
            record(date(2024, 5, 9), 1.0, 0.0, 0.0),
            record(date(2024, 6, 1), 1.0, 0.0, 0.0),
        ];
        let series = time_series(&records, Granularity::Month, GroupingStrategy::YearAgnostic);
        let keys: Vec<GroupKey> = series.iter().map(|e| e.key).collect();
        assert_eq!(
            keys,
            vec![
                GroupKey::Month { year: None, month: 5 },
                GroupKey::Month { year: None, month: 6 },
                GroupKey::Month { year: None, month: 7 },
            ]
        );
    }

    #[test]
    fn test_month_grouping_merges_years_unless_qualified() {
        let records = vec![
            record(date(2023, 5, 1), 10.0, 0.0, 0.0),
            record(date(2024, 5, 1), 20.0, 0.0, 0.0),
        ];
        let merged = time_series(&records, Granularity::Month, GroupingStrategy::YearAgnostic);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].total_sales, 30.0);

        let split = time_series(&records, Granularity::Month, GroupingStrategy::YearQualified);
        assert_eq!(split.len(), 2);
    }

    #[test]
    fn test_summary_statistics_population_std_dev() {
        let records = vec![
            record(date(2024, 5, 1), 10.0, 1.0, 50.0),
            record(date(2024, 5, 2), 20.0, 1.0, 70.0),
            record(date(2024, 5, 3), 30.0, 1.0, 90.0),
        ];
        let summary = summary_statistics(&records);
        assert_eq!(summary.sample_size, 3);
        assert_eq!(summary.mean_sales, Some(20.0));
        assert_eq!(summary.median_sales, Some(20.0));
        assert!((summary.std_dev_sales.unwrap() - 8.165).abs() < 1e-3);
        assert_eq!(summary.total_sales, Some(60.0));
        assert_eq!(summary.total_clients, Some(3.0));
        assert_eq!(summary.mean_performance, Some(70.0));
    }

    #[test]
    fn test_summary_statistics_empty_is_no_data() {
        let summary = summary_statistics(&[]);
        assert!(!summary.has_data());
        assert_eq!(summary.mean_sales, None);
        assert_eq!(summary.std_dev_sales, None);
        assert_eq!(summary.total_sales, None);
        assert_eq!(summary.mean_performance, None);

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json["meanSales"].is_null());
        assert_eq!(json["sampleSize"], 0);
    }

    #[test]
    fn test_campaign_status_metrics() {
        let campaigns = vec![
            campaign(CampaignStatus::Active, Some(100.0), Some(2.0)),
            campaign(CampaignStatus::Active, Some(300.0), None),
            campaign(CampaignStatus::Draft, None, None),
        ];
        let metrics = campaign_status_metrics(&campaigns);
        assert_eq!(metrics.len(), 2);

        let draft = &metrics[0];
        assert_eq!(draft.status, CampaignStatus::Draft);
        assert_eq!(draft.count, 1);
        assert_eq!(draft.avg_budget, None);
        assert_eq!(draft.total_budget, 0.0);
        assert_eq!(draft.avg_roi, None);

        let active = &metrics[1];
        assert_eq!(active.status, CampaignStatus::Active);
        assert_eq!(active.count, 2);
        assert_eq!(active.avg_budget, Some(200.0));
        assert_eq!(active.total_budget, 400.0);
        assert_eq!(active.avg_roi, Some(2.0));

        let json = serde_json::to_value(active).unwrap();
        assert_eq!(json["_id"], "active");
        assert_eq!(json["avgROI"], 2.0);
    }

    #[test]
    fn test_client_status_stats() {
        let manager = Uuid::new_v4();
        let client = |status, spend| Client {
            id: Uuid::new_v4(),
            name: "acme".into(),
            email: "ops@acme.test".into(),
            company: None,
            status,
            campaigns: vec![],
            metrics: ClientMetrics {
                total_spend: spend,
                ..Default::default()
            },
            assigned_manager: manager,
            created_at: Utc::now(),
        };
        let stats = client_status_stats(&[
            client(ClientStatus::Active, 10.0),
            client(ClientStatus::Active, 5.0),
            client(ClientStatus::Inactive, 1.0),
        ]);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].status, ClientStatus::Active);
        assert_eq!(stats[0].count, 2);
        assert_eq!(stats[0].total_spend, 15.0);
        assert_eq!(stats[1].total_spend, 1.0);
    }

    #[test]
    fn test_daily_rollup_keeps_years_apart() {
        let records = vec![
            record(date(2024, 5, 2), 5.0, 1.0, 40.0),
            record(date(2024, 5, 1), 7.0, 0.0, 60.0),
            record(date(2024, 5, 2), 3.0, 1.0, 20.0),
            record(date(2023, 5, 1), 11.0, 4.0, 10.0),
        ];
        let days = daily_rollup(&records);
        assert_eq!(days.len(), 3);
        assert_eq!(days[0].date, date(2023, 5, 1));
        assert_eq!(days[0].sales, 11.0);
        assert_eq!(days[1].date, date(2024, 5, 1));
        assert_eq!(days[1].sales, 7.0);
        assert_eq!(days[2].sales, 8.0);
        assert_eq!(days[2].new_clients, 2.0);
        assert_eq!(days[2].performance, 30.0);
    }

    #[test]
    fn test_sales_totals_empty() {
        assert_eq!(sales_totals(&[]), SalesTotals::default());
    }
}
