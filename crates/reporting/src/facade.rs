//! Reporting façade: one call per screen. Independent reads run concurrently
//! and the payload is only built once every read succeeded.

use crate::payloads::*;
use pulse_analytics::{aggregate, stats, AggregationEngine};
use pulse_core::types::{Granularity, MetricRecord};
use pulse_core::{DateRange, Principal, PulseError, PulseResult};
use pulse_management::DirectoryStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub struct ReportingFacade {
    engine: Arc<AggregationEngine>,
    directory: Arc<DirectoryStore>,
}

impl ReportingFacade {
    pub fn new(engine: Arc<AggregationEngine>, directory: Arc<DirectoryStore>) -> Self {
        Self { engine, directory }
    }

    pub fn engine(&self) -> &Arc<AggregationEngine> {
        &self.engine
    }

    /// Caller-scoped dashboard over the trailing window.
    pub async fn dashboard(&self, principal: &Principal) -> PulseResult<DashboardPayload> {
        metrics::counter!("reporting.dashboard.requests").increment(1);
        let window = self.engine.trailing_window();

        let (records, campaigns, clients) = tokio::try_join!(
            self.engine.records(window),
            async { Ok::<_, PulseError>(self.directory.active_campaigns_for_owner(principal.id)) },
            async { Ok::<_, PulseError>(self.directory.clients_for_manager(principal.id)) },
        )?;

        let performance: Vec<f64> = records
            .iter()
            .map(|r| r.metrics.campaign_performance)
            .collect();
        let summary = DashboardSummary {
            total_sales: records.iter().map(|r| r.metrics.daily_sales).sum(),
            total_clients: clients.len(),
            active_campaigns: campaigns.len(),
            average_performance: stats::mean(&performance),
        };

        let time_series_data = records
            .iter()
            .map(|r| DashboardPoint {
                date: r.date,
                sales: r.metrics.daily_sales,
                new_clients: r.metrics.new_clients,
                performance: r.metrics.campaign_performance,
            })
            .collect();

        let campaign_performance = campaigns
            .into_iter()
            .map(|c| CampaignPerformanceEntry {
                name: c.name,
                client: c.client.map(|client| client.name),
                metrics: c.metrics,
                platforms: c.platforms,
            })
            .collect();

        let clients = clients
            .into_iter()
            .map(|c| ClientSummary {
                name: c.name,
                status: c.status,
                metrics: c.metrics,
            })
            .collect();

        Ok(DashboardPayload {
            summary,
            time_series_data,
            campaign_performance,
            clients,
        })
    }

    /// Organisation-wide overview. Admins only; the role check happens
    /// before any store is touched.
    pub async fn admin_overview(&self, principal: &Principal) -> PulseResult<AdminOverviewPayload> {
        if !principal.is_admin() {
            metrics::counter!("reporting.admin_overview.denied").increment(1);
            warn!(user_id = %principal.id, "Non-admin requested the admin overview");
            return Err(PulseError::Forbidden("admin role required".into()));
        }
        metrics::counter!("reporting.admin_overview.requests").increment(1);
        let window = self.engine.trailing_window();

        let (days, campaign_stats, client_stats, total_users) = tokio::try_join!(
            self.engine.daily_rollup(window),
            async { Ok::<_, PulseError>(aggregate::campaign_status_stats(&self.directory.all_campaigns())) },
            async { Ok::<_, PulseError>(aggregate::client_status_stats(&self.directory.all_clients())) },
            async { Ok::<_, PulseError>(self.directory.user_count()) },
        )?;

        let daily_performance: Vec<f64> = days.iter().map(|d| d.performance).collect();
        let summary = AdminSummary {
            total_sales: days.iter().map(|d| d.sales).sum(),
            total_new_clients: days.iter().map(|d| d.new_clients).sum(),
            average_performance: stats::mean(&daily_performance),
            total_users,
        };

        info!(user_id = %principal.id, days = days.len(), "Admin overview composed");
        Ok(AdminOverviewPayload {
            summary,
            time_series_data: days,
            campaign_stats,
            client_stats,
        })
    }

    /// Time series plus statistics for `range`, and the campaign breakdown
    /// over every campaign regardless of `range`.
    pub async fn detailed(
        &self,
        range: DateRange,
        granularity: Granularity,
    ) -> PulseResult<DetailedAnalytics> {
        metrics::counter!("reporting.detailed.requests", "period" => granularity.as_str())
            .increment(1);

        let (time_series, statistics, campaign_metrics) = tokio::try_join!(
            self.engine.time_series(range, granularity),
            self.engine.summary_statistics(range),
            async { Ok::<_, PulseError>(self.engine.campaign_metrics(&self.directory.all_campaigns())) },
        )?;

        Ok(DetailedAnalytics {
            time_series,
            statistics,
            campaign_metrics,
            period_type: granularity,
        })
    }

    /// Records in `range` with campaign references (and their clients)
    /// resolved. Dangling references resolve to `None`.
    pub async fn populated_records(&self, range: DateRange) -> PulseResult<Vec<PopulatedRecord>> {
        let records = self.engine.records(range).await?;
        Ok(self.populate(records))
    }

    fn populate(&self, records: Vec<MetricRecord>) -> Vec<PopulatedRecord> {
        let mut resolved: HashMap<Uuid, Option<_>> = HashMap::new();
        records
            .into_iter()
            .map(|record| {
                let campaigns = record
                    .campaigns
                    .iter()
                    .map(|breakdown| {
                        let campaign = breakdown.campaign.and_then(|id| {
                            resolved
                                .entry(id)
                                .or_insert_with(|| self.directory.campaign_view_by_id(id))
                                .clone()
                        });
                        PopulatedBreakdown::new(breakdown, campaign)
                    })
                    .collect();
                PopulatedRecord {
                    id: record.id,
                    date: record.date,
                    metrics: record.metrics,
                    campaigns,
                }
            })
            .collect()
    }
}
