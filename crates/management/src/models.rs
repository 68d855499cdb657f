//! Request/response shapes for the management API.
//!
//! Update DTOs reject unknown keys so a client cannot touch fields outside
//! the allowed set.

use chrono::{DateTime, NaiveDate, Utc};
use pulse_core::types::{
    Campaign, CampaignPerformance, CampaignStatus, Client, ClientMetrics, ClientStatus,
    PlatformBreakdown, User, UserSettings,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// ─── Auth ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

// ─── Campaigns ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignRequest {
    pub name: String,
    pub client: Uuid,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub status: CampaignStatus,
    #[serde(default)]
    pub metrics: CampaignPerformance,
    #[serde(default)]
    pub platforms: Vec<PlatformBreakdown>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateCampaignRequest {
    pub name: Option<String>,
    pub status: Option<CampaignStatus>,
    pub budget: Option<f64>,
    pub metrics: Option<CampaignPerformance>,
    pub platforms: Option<Vec<PlatformBreakdown>>,
}

/// Campaign with its client resolved. `client` is `None` when the client
/// has since been removed.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub client: Option<Client>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub budget: Option<f64>,
    pub status: CampaignStatus,
    pub metrics: CampaignPerformance,
    pub platforms: Vec<PlatformBreakdown>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl CampaignView {
    pub fn new(campaign: Campaign, client: Option<Client>) -> Self {
        Self {
            id: campaign.id,
            name: campaign.name,
            client,
            start_date: campaign.start_date,
            end_date: campaign.end_date,
            budget: campaign.budget,
            status: campaign.status,
            metrics: campaign.metrics,
            platforms: campaign.platforms,
            created_by: campaign.created_by,
            created_at: campaign.created_at,
        }
    }
}

// ─── Clients ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub status: ClientStatus,
    #[serde(default)]
    pub metrics: ClientMetrics,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateClientRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub status: Option<ClientStatus>,
    pub metrics: Option<ClientMetrics>,
    pub campaigns: Option<Vec<Uuid>>,
}

/// Client with its campaigns resolved.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub status: ClientStatus,
    pub campaigns: Vec<Campaign>,
    pub metrics: ClientMetrics,
    pub assigned_manager: Uuid,
    pub created_at: DateTime<Utc>,
}

impl ClientView {
    pub fn new(client: Client, campaigns: Vec<Campaign>) -> Self {
        Self {
            id: client.id,
            name: client.name,
            email: client.email,
            company: client.company,
            status: client.status,
            campaigns,
            metrics: client.metrics,
            assigned_manager: client.assigned_manager,
            created_at: client.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientDashboard {
    pub total_clients: usize,
    pub active_clients: usize,
    pub total_spend: f64,
    pub clients_data: Vec<ClientView>,
}

// ─── Settings ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdatePreferencesRequest {
    pub email_notifications: Option<bool>,
    pub push_notifications: Option<bool>,
    pub dark_mode: Option<bool>,
    pub auto_save: Option<bool>,
}

impl UpdatePreferencesRequest {
    pub fn apply(self, settings: &mut UserSettings) {
        if let Some(v) = self.email_notifications {
            settings.email_notifications = v;
        }
        if let Some(v) = self.push_notifications {
            settings.push_notifications = v;
        }
        if let Some(v) = self.dark_mode {
            settings.dark_mode = v;
        }
        if let Some(v) = self.auto_save {
            settings.auto_save = v;
        }
    }
}
