//! OpenAPI specification and Swagger UI configuration.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "MarketPulse API",
        version = "0.1.0",
        description = "Marketing performance dashboard backend.\n\nSales, campaign and client analytics over uploaded metric records, with campaign/client management and account settings.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Operations", description = "Health, readiness, and liveness probes"),
        (name = "Auth", description = "Registration, login and logout"),
        (name = "Upload", description = "Excel ingestion of daily metric records"),
        (name = "Analytics", description = "Records, totals and grouped time series"),
        (name = "Dashboard", description = "Composed dashboard screens"),
        (name = "Campaigns", description = "Campaigns owned by the caller"),
        (name = "Clients", description = "Clients managed by the caller"),
        (name = "Settings", description = "Profile and preferences"),
    ),
    paths(
        // Operations
        crate::rest::health_check,
        crate::rest::readiness,
        crate::rest::liveness,
        // Upload
        crate::upload_rest::upload_excel,
        crate::upload_rest::upload_summary,
        // Analytics
        crate::analytics_rest::records,
        crate::analytics_rest::summary,
        crate::analytics_rest::detailed,
        // Dashboard
        crate::dashboard_rest::dashboard,
        crate::dashboard_rest::admin_dashboard,
        // Auth
        pulse_management::handlers::register,
        pulse_management::handlers::login,
        // Campaigns
        pulse_management::handlers::list_campaigns,
        pulse_management::handlers::create_campaign,
        pulse_management::handlers::update_campaign,
        pulse_management::handlers::delete_campaign,
        // Clients
        pulse_management::handlers::client_dashboard,
        pulse_management::handlers::get_client,
        pulse_management::handlers::update_client,
        pulse_management::handlers::create_client,
        // Settings
        pulse_management::handlers::get_profile,
        pulse_management::handlers::update_profile,
        pulse_management::handlers::update_preferences,
    ),
    components(schemas(
        // Domain types
        pulse_core::types::MetricRecord,
        pulse_core::types::MetricValues,
        pulse_core::types::CampaignBreakdown,
        pulse_core::types::Campaign,
        pulse_core::types::CampaignStatus,
        pulse_core::types::CampaignPerformance,
        pulse_core::types::PlatformBreakdown,
        pulse_core::types::PlatformMetrics,
        pulse_core::types::Client,
        pulse_core::types::ClientStatus,
        pulse_core::types::ClientMetrics,
        pulse_core::types::User,
        pulse_core::types::UserSettings,
        pulse_core::types::Role,
        pulse_core::types::Granularity,
        // Aggregates
        pulse_analytics::aggregate::TimeSeriesEntry,
        pulse_analytics::aggregate::SummaryStatistics,
        pulse_analytics::aggregate::CampaignStatusMetrics,
        pulse_analytics::aggregate::CampaignStatusStats,
        pulse_analytics::aggregate::ClientStatusStats,
        pulse_analytics::aggregate::SalesTotals,
        pulse_analytics::aggregate::DailyRollup,
        // Payloads
        pulse_reporting::payloads::DashboardPayload,
        pulse_reporting::payloads::DashboardSummary,
        pulse_reporting::payloads::DashboardPoint,
        pulse_reporting::payloads::CampaignPerformanceEntry,
        pulse_reporting::payloads::ClientSummary,
        pulse_reporting::payloads::AdminOverviewPayload,
        pulse_reporting::payloads::AdminSummary,
        pulse_reporting::payloads::DetailedAnalytics,
        pulse_reporting::payloads::PopulatedRecord,
        pulse_reporting::payloads::PopulatedBreakdown,
        // Management DTOs
        pulse_management::models::RegisterRequest,
        pulse_management::models::LoginRequest,
        pulse_management::models::LoginResponse,
        pulse_management::models::ErrorResponse,
        pulse_management::models::CreateCampaignRequest,
        pulse_management::models::UpdateCampaignRequest,
        pulse_management::models::CampaignView,
        pulse_management::models::CreateClientRequest,
        pulse_management::models::UpdateClientRequest,
        pulse_management::models::ClientView,
        pulse_management::models::ClientDashboard,
        pulse_management::models::UpdateProfileRequest,
        pulse_management::models::UpdatePreferencesRequest,
        // Upload / operations
        crate::upload_rest::UploadForm,
        crate::upload_rest::UploadResponse,
        crate::rest::HealthResponse,
    ))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_public_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/upload/excel",
            "/api/analytics/detailed",
            "/api/admin-dashboard",
            "/api/clients/{id}",
            "/api/settings/preferences",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
