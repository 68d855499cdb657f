//! Screen payloads composed by the reporting façade.

use chrono::NaiveDate;
use pulse_analytics::aggregate::{
    CampaignStatusMetrics, CampaignStatusStats, ClientStatusStats, DailyRollup, SummaryStatistics,
    TimeSeriesEntry,
};
use pulse_core::types::{
    CampaignBreakdown, CampaignPerformance, ClientMetrics, ClientStatus, Granularity, MetricValues,
    PlatformBreakdown,
};
use pulse_management::models::CampaignView;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

// ─── Dashboard ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardPayload {
    pub summary: DashboardSummary,
    pub time_series_data: Vec<DashboardPoint>,
    pub campaign_performance: Vec<CampaignPerformanceEntry>,
    pub clients: Vec<ClientSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_sales: f64,
    pub total_clients: usize,
    pub active_campaigns: usize,
    /// `None` when the window holds no records.
    pub average_performance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardPoint {
    pub date: NaiveDate,
    pub sales: f64,
    pub new_clients: f64,
    pub performance: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignPerformanceEntry {
    pub name: String,
    /// Client name, `None` once the client is gone.
    pub client: Option<String>,
    pub metrics: CampaignPerformance,
    pub platforms: Vec<PlatformBreakdown>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientSummary {
    pub name: String,
    pub status: ClientStatus,
    pub metrics: ClientMetrics,
}

// ─── Admin overview ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminOverviewPayload {
    pub summary: AdminSummary,
    pub time_series_data: Vec<DailyRollup>,
    pub campaign_stats: Vec<CampaignStatusStats>,
    pub client_stats: Vec<ClientStatusStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminSummary {
    pub total_sales: f64,
    pub total_new_clients: f64,
    pub average_performance: Option<f64>,
    pub total_users: u64,
}

// ─── Detailed analytics ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetailedAnalytics {
    pub time_series: Vec<TimeSeriesEntry>,
    pub statistics: SummaryStatistics,
    pub campaign_metrics: Vec<CampaignStatusMetrics>,
    pub period_type: Granularity,
}

// ─── Raw records ───────────────────────────────────────────────────────────

/// Metric record with each campaign reference resolved (client included).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedRecord {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub date: NaiveDate,
    pub metrics: MetricValues,
    pub campaigns: Vec<PopulatedBreakdown>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedBreakdown {
    /// `None` when the record had no reference or the campaign was deleted.
    pub campaign: Option<CampaignView>,
    pub impressions: f64,
    pub clicks: f64,
    pub conversions: f64,
    pub spend: f64,
}

impl PopulatedBreakdown {
    pub fn new(breakdown: &CampaignBreakdown, campaign: Option<CampaignView>) -> Self {
        Self {
            campaign,
            impressions: breakdown.impressions,
            clicks: breakdown.clicks,
            conversions: breakdown.conversions,
            spend: breakdown.spend,
        }
    }
}
