//! Domain types shared by every MarketPulse crate.
//!
//! Wire format is camelCase with Mongo-style `_id` identifiers, which is what
//! the dashboard client consumes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

// ─── Metric records ────────────────────────────────────────────────────────

/// One dated observation of aggregate business metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricRecord {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub date: NaiveDate,
    #[serde(default)]
    pub metrics: MetricValues,
    #[serde(default)]
    pub campaigns: Vec<CampaignBreakdown>,
}

impl MetricRecord {
    pub fn new(date: NaiveDate, metrics: MetricValues, campaigns: Vec<CampaignBreakdown>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            metrics,
            campaigns,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricValues {
    pub daily_sales: f64,
    pub new_clients: f64,
    pub active_users: f64,
    pub campaign_performance: f64,
}

/// Per-campaign sub-metrics of a record. `campaign` is a weak reference and
/// may dangle once the campaign is deleted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CampaignBreakdown {
    pub campaign: Option<Uuid>,
    pub impressions: f64,
    pub clicks: f64,
    pub conversions: f64,
    pub spend: f64,
}

// ─── Campaigns ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub client: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub budget: Option<f64>,
    pub status: CampaignStatus,
    #[serde(default)]
    pub metrics: CampaignPerformance,
    #[serde(default)]
    pub platforms: Vec<PlatformBreakdown>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Campaign lifecycle status. Any status may be set from any other; no
/// transition rules are enforced.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Active,
    Paused,
    Completed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CampaignPerformance {
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub spend: f64,
    pub roi: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformBreakdown {
    pub name: String,
    #[serde(default)]
    pub metrics: PlatformMetrics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PlatformMetrics {
    pub impressions: u64,
    pub clicks: u64,
    pub spend: f64,
}

// ─── Clients ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub status: ClientStatus,
    /// Weak back-references; `Campaign::client` is authoritative.
    #[serde(default)]
    pub campaigns: Vec<Uuid>,
    #[serde(default)]
    pub metrics: ClientMetrics,
    pub assigned_manager: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    #[default]
    Active,
    Inactive,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientMetrics {
    pub total_spend: f64,
    pub active_projects: u64,
    pub last_activity: Option<DateTime<Utc>>,
}

// ─── Users ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub phone: String,
    pub avatar: Option<String>,
    #[serde(default)]
    pub settings: UserSettings,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub email_notifications: bool,
    pub push_notifications: bool,
    pub dark_mode: bool,
    pub auto_save: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            email_notifications: true,
            push_notifications: true,
            dark_mode: false,
            auto_save: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// Authenticated caller resolved by the auth layer before any handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// ─── Query shapes ──────────────────────────────────────────────────────────

/// Inclusive calendar-date range; an open side matches everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(Some(start), Some(end))
    }

    pub fn since(start: NaiveDate) -> Self {
        Self::new(Some(start), None)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

/// Time-series grouping unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    Week,
    Month,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Granularity::Day),
            "week" => Ok(Granularity::Week),
            "month" => Ok(Granularity::Month),
            other => Err(format!("unknown granularity '{other}', expected day|week|month")),
        }
    }
}

/// How week and month keys are built.
///
/// `YearAgnostic` keys on the bare week/month number, so the same week of two
/// different years lands in one group. `YearQualified` keys on year plus ISO
/// week (or year plus month).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingStrategy {
    #[default]
    YearAgnostic,
    YearQualified,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let range = DateRange::between(date(2024, 5, 1), date(2024, 5, 31));
        assert!(range.contains(date(2024, 5, 1)));
        assert!(range.contains(date(2024, 5, 31)));
        assert!(!range.contains(date(2024, 6, 1)));
        assert!(!range.contains(date(2024, 4, 30)));
    }

    #[test]
    fn test_open_range_matches_everything_past_start() {
        let range = DateRange::since(date(2024, 1, 1));
        assert!(range.contains(date(2030, 1, 1)));
        assert!(!range.contains(date(2023, 12, 31)));
        assert!(DateRange::default().contains(date(1999, 1, 1)));
    }

    #[test]
    fn test_granularity_parse() {
        assert_eq!("week".parse::<Granularity>().unwrap(), Granularity::Week);
        assert!("quarter".parse::<Granularity>().is_err());
    }

    #[test]
    fn test_record_wire_format() {
        let record = MetricRecord::new(
            date(2024, 5, 1),
            MetricValues {
                daily_sales: 100.0,
                ..Default::default()
            },
            vec![],
        );
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("_id").is_some());
        assert_eq!(json["date"], "2024-05-01");
        assert_eq!(json["metrics"]["dailySales"], 100.0);
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            email: "ana@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            role: Role::User,
            first_name: String::new(),
            last_name: String::new(),
            company: String::new(),
            position: String::new(),
            phone: String::new(),
            avatar: None,
            settings: UserSettings::default(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("passwordHash"));
    }
}
