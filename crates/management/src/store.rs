//! In-memory campaign/client/user directory backed by DashMap.
//!
//! Ownership scoping lives here: campaigns are visible to their creator,
//! clients to their assigned manager. Admin-console helpers bypass scoping.

use crate::models::*;
use chrono::Utc;
use dashmap::DashMap;
use pulse_core::types::{Campaign, CampaignStatus, Client, Role, User, UserSettings};
use pulse_core::{PulseError, PulseResult};
use tracing::info;
use uuid::Uuid;

/// Fields for a brand new account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
}

pub struct DirectoryStore {
    campaigns: DashMap<Uuid, Campaign>,
    clients: DashMap<Uuid, Client>,
    users: DashMap<Uuid, User>,
    /// Lowercased email → user id.
    emails: DashMap<String, Uuid>,
}

impl DirectoryStore {
    pub fn new() -> Self {
        info!("Directory store initialized (in-memory)");
        Self {
            campaigns: DashMap::new(),
            clients: DashMap::new(),
            users: DashMap::new(),
            emails: DashMap::new(),
        }
    }

    // ─── Campaigns ─────────────────────────────────────────────────────────

    pub fn create_campaign(&self, req: CreateCampaignRequest, owner: Uuid) -> PulseResult<Campaign> {
        if req.name.trim().is_empty() {
            return Err(PulseError::Validation("campaign name is required".into()));
        }
        if !self.clients.contains_key(&req.client) {
            return Err(PulseError::Validation(format!(
                "client {} does not exist",
                req.client
            )));
        }
        let campaign = Campaign {
            id: Uuid::new_v4(),
            name: req.name,
            client: req.client,
            start_date: req.start_date,
            end_date: req.end_date,
            budget: req.budget,
            status: req.status,
            metrics: req.metrics,
            platforms: req.platforms,
            created_by: owner,
            created_at: Utc::now(),
        };
        self.campaigns.insert(campaign.id, campaign.clone());
        Ok(campaign)
    }

    /// Campaigns created by `owner`, newest first.
    pub fn campaigns_for_owner(&self, owner: Uuid) -> Vec<Campaign> {
        self.collect_campaigns(|c| c.created_by == owner)
    }

    /// Active campaigns created by `owner`, client resolved.
    pub fn active_campaigns_for_owner(&self, owner: Uuid) -> Vec<CampaignView> {
        self.collect_campaigns(|c| c.created_by == owner && c.status == CampaignStatus::Active)
            .into_iter()
            .map(|c| self.campaign_view(c))
            .collect()
    }

    pub fn campaign_views_for_owner(&self, owner: Uuid) -> Vec<CampaignView> {
        self.campaigns_for_owner(owner)
            .into_iter()
            .map(|c| self.campaign_view(c))
            .collect()
    }

    pub fn update_campaign(
        &self,
        id: Uuid,
        owner: Uuid,
        req: UpdateCampaignRequest,
    ) -> PulseResult<Campaign> {
        let mut entry = self
            .campaigns
            .get_mut(&id)
            .filter(|c| c.created_by == owner)
            .ok_or_else(|| PulseError::NotFound(format!("campaign {id}")))?;
        let c = entry.value_mut();
        if let Some(name) = req.name {
            c.name = name;
        }
        if let Some(status) = req.status {
            c.status = status;
        }
        if let Some(budget) = req.budget {
            c.budget = Some(budget);
        }
        if let Some(metrics) = req.metrics {
            c.metrics = metrics;
        }
        if let Some(platforms) = req.platforms {
            c.platforms = platforms;
        }
        Ok(c.clone())
    }

    /// Remove a campaign owned by `owner`. Weak references in clients and
    /// metric records are left dangling.
    pub fn delete_campaign(&self, id: Uuid, owner: Uuid) -> PulseResult<Campaign> {
        self.campaigns
            .remove_if(&id, |_, c| c.created_by == owner)
            .map(|(_, c)| c)
            .ok_or_else(|| PulseError::NotFound(format!("campaign {id}")))
    }

    pub fn get_campaign(&self, id: Uuid) -> Option<Campaign> {
        self.campaigns.get(&id).map(|r| r.value().clone())
    }

    /// Campaign with client resolved, regardless of owner.
    pub fn campaign_view_by_id(&self, id: Uuid) -> Option<CampaignView> {
        self.get_campaign(id).map(|c| self.campaign_view(c))
    }

    pub fn all_campaigns(&self) -> Vec<Campaign> {
        self.collect_campaigns(|_| true)
    }

    pub fn remove_campaign(&self, id: Uuid) -> Option<Campaign> {
        self.campaigns.remove(&id).map(|(_, c)| c)
    }

    fn collect_campaigns(&self, keep: impl Fn(&Campaign) -> bool) -> Vec<Campaign> {
        let mut campaigns: Vec<Campaign> = self
            .campaigns
            .iter()
            .filter(|r| keep(r.value()))
            .map(|r| r.value().clone())
            .collect();
        campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        campaigns
    }

    fn campaign_view(&self, campaign: Campaign) -> CampaignView {
        let client = self.clients.get(&campaign.client).map(|r| r.value().clone());
        CampaignView::new(campaign, client)
    }

    // ─── Clients ───────────────────────────────────────────────────────────

    pub fn create_client(&self, req: CreateClientRequest, manager: Uuid) -> PulseResult<Client> {
        if req.name.trim().is_empty() || req.email.trim().is_empty() {
            return Err(PulseError::Validation("client name and email are required".into()));
        }
        let client = Client {
            id: Uuid::new_v4(),
            name: req.name,
            email: req.email,
            company: req.company,
            status: req.status,
            campaigns: Vec::new(),
            metrics: req.metrics,
            assigned_manager: manager,
            created_at: Utc::now(),
        };
        self.clients.insert(client.id, client.clone());
        Ok(client)
    }

    /// Clients assigned to `manager`, newest first.
    pub fn clients_for_manager(&self, manager: Uuid) -> Vec<Client> {
        self.collect_clients(|c| c.assigned_manager == manager)
    }

    pub fn client_dashboard(&self, manager: Uuid) -> ClientDashboard {
        let clients = self.clients_for_manager(manager);
        let active_clients = clients
            .iter()
            .filter(|c| c.status == pulse_core::types::ClientStatus::Active)
            .count();
        let total_spend = clients.iter().map(|c| c.metrics.total_spend).sum();
        ClientDashboard {
            total_clients: clients.len(),
            active_clients,
            total_spend,
            clients_data: clients.into_iter().map(|c| self.client_view(c)).collect(),
        }
    }

    pub fn client_detail(&self, id: Uuid, manager: Uuid) -> PulseResult<ClientView> {
        let client = self
            .clients
            .get(&id)
            .filter(|c| c.assigned_manager == manager)
            .map(|r| r.value().clone())
            .ok_or_else(|| PulseError::NotFound(format!("client {id}")))?;
        Ok(self.client_view(client))
    }

    pub fn update_client(
        &self,
        id: Uuid,
        manager: Uuid,
        req: UpdateClientRequest,
    ) -> PulseResult<Client> {
        let mut entry = self
            .clients
            .get_mut(&id)
            .filter(|c| c.assigned_manager == manager)
            .ok_or_else(|| PulseError::NotFound(format!("client {id}")))?;
        let c = entry.value_mut();
        if let Some(name) = req.name {
            c.name = name;
        }
        if let Some(email) = req.email {
            c.email = email;
        }
        if let Some(company) = req.company {
            c.company = Some(company);
        }
        if let Some(status) = req.status {
            c.status = status;
        }
        if let Some(metrics) = req.metrics {
            c.metrics = metrics;
        }
        if let Some(campaigns) = req.campaigns {
            c.campaigns = campaigns;
        }
        Ok(c.clone())
    }

    pub fn all_clients(&self) -> Vec<Client> {
        self.collect_clients(|_| true)
    }

    pub fn remove_client(&self, id: Uuid) -> Option<Client> {
        self.clients.remove(&id).map(|(_, c)| c)
    }

    fn collect_clients(&self, keep: impl Fn(&Client) -> bool) -> Vec<Client> {
        let mut clients: Vec<Client> = self
            .clients
            .iter()
            .filter(|r| keep(r.value()))
            .map(|r| r.value().clone())
            .collect();
        clients.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        clients
    }

    /// Campaigns pointing at the client through `Campaign::client`, plus any
    /// weak back-reference that still resolves.
    fn client_view(&self, client: Client) -> ClientView {
        let mut campaigns: Vec<Campaign> = self
            .campaigns
            .iter()
            .filter(|r| r.value().client == client.id)
            .map(|r| r.value().clone())
            .collect();
        for id in &client.campaigns {
            if campaigns.iter().any(|c| c.id == *id) {
                continue;
            }
            if let Some(campaign) = self.get_campaign(*id) {
                campaigns.push(campaign);
            }
        }
        campaigns.sort_by(|a, b| a.start_date.cmp(&b.start_date));
        ClientView::new(client, campaigns)
    }

    // ─── Users ─────────────────────────────────────────────────────────────

    pub fn create_user(&self, new: NewUser) -> PulseResult<User> {
        let email = normalize_email(&new.email)?;
        let user = User {
            id: Uuid::new_v4(),
            email: email.clone(),
            password_hash: new.password_hash,
            role: new.role,
            first_name: new.first_name,
            last_name: new.last_name,
            company: String::new(),
            position: String::new(),
            phone: String::new(),
            avatar: None,
            settings: UserSettings::default(),
            created_at: Utc::now(),
        };

        match self.emails.entry(email) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(PulseError::Validation("email is already registered".into()))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(user.id);
            }
        }
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    pub fn get_user(&self, id: Uuid) -> Option<User> {
        self.users.get(&id).map(|r| r.value().clone())
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<User> {
        let key = email.trim().to_lowercase();
        let id = *self.emails.get(&key)?.value();
        self.get_user(id)
    }

    pub fn update_profile(&self, id: Uuid, req: UpdateProfileRequest) -> PulseResult<User> {
        if let Some(email) = &req.email {
            self.change_email(id, email)?;
        }
        let mut entry = self
            .users
            .get_mut(&id)
            .ok_or_else(|| PulseError::NotFound(format!("user {id}")))?;
        let u = entry.value_mut();
        if let Some(first_name) = req.first_name {
            u.first_name = first_name;
        }
        if let Some(last_name) = req.last_name {
            u.last_name = last_name;
        }
        if let Some(company) = req.company {
            u.company = company;
        }
        if let Some(position) = req.position {
            u.position = position;
        }
        if let Some(phone) = req.phone {
            u.phone = phone;
        }
        Ok(u.clone())
    }

    pub fn update_preferences(
        &self,
        id: Uuid,
        req: UpdatePreferencesRequest,
    ) -> PulseResult<UserSettings> {
        let mut entry = self
            .users
            .get_mut(&id)
            .ok_or_else(|| PulseError::NotFound(format!("user {id}")))?;
        req.apply(&mut entry.value_mut().settings);
        Ok(entry.value().settings)
    }

    pub fn set_role(&self, id: Uuid, role: Role) -> PulseResult<User> {
        let mut entry = self
            .users
            .get_mut(&id)
            .ok_or_else(|| PulseError::NotFound(format!("user {id}")))?;
        entry.value_mut().role = role;
        Ok(entry.value().clone())
    }

    pub fn set_password_hash(&self, id: Uuid, password_hash: String) -> PulseResult<()> {
        let mut entry = self
            .users
            .get_mut(&id)
            .ok_or_else(|| PulseError::NotFound(format!("user {id}")))?;
        entry.value_mut().password_hash = password_hash;
        Ok(())
    }

    /// Point the account at a new email, keeping the index consistent.
    fn change_email(&self, id: Uuid, email: &str) -> PulseResult<()> {
        let email = normalize_email(email)?;
        let current = self
            .get_user(id)
            .ok_or_else(|| PulseError::NotFound(format!("user {id}")))?;
        if current.email == email {
            return Ok(());
        }
        match self.emails.entry(email.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(PulseError::Validation("email is already registered".into()))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }
        self.emails.remove(&current.email);
        if let Some(mut user) = self.users.get_mut(&id) {
            user.email = email;
        }
        Ok(())
    }

    pub fn all_users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.iter().map(|r| r.value().clone()).collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        users
    }

    pub fn user_count(&self) -> u64 {
        self.users.len() as u64
    }

    pub fn remove_user(&self, id: Uuid) -> Option<User> {
        let (_, user) = self.users.remove(&id)?;
        self.emails.remove(&user.email);
        Some(user)
    }
}

impl Default for DirectoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_email(email: &str) -> PulseResult<String> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(PulseError::Validation(format!("'{email}' is not a valid email")));
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pulse_core::types::{ClientMetrics, ClientStatus};

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            password_hash: "$argon2id$hash".into(),
            role: Role::User,
            first_name: "Ana".into(),
            last_name: "Lopez".into(),
        }
    }

    fn client_req(name: &str) -> CreateClientRequest {
        CreateClientRequest {
            name: name.into(),
            email: format!("{name}@clients.test"),
            company: None,
            status: ClientStatus::Active,
            metrics: ClientMetrics {
                total_spend: 100.0,
                ..Default::default()
            },
        }
    }

    fn campaign_req(client: Uuid, status: CampaignStatus) -> CreateCampaignRequest {
        CreateCampaignRequest {
            name: "Launch".into(),
            client,
            start_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            end_date: None,
            budget: Some(500.0),
            status,
            metrics: Default::default(),
            platforms: vec![],
        }
    }

    #[test]
    fn test_campaign_requires_existing_client() {
        let store = DirectoryStore::new();
        let err = store
            .create_campaign(campaign_req(Uuid::new_v4(), CampaignStatus::Draft), Uuid::new_v4())
            .unwrap_err();
        assert!(matches!(err, PulseError::Validation(_)));
    }

    #[test]
    fn test_campaigns_are_owner_scoped() {
        let store = DirectoryStore::new();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let client = store.create_client(client_req("acme"), alice).unwrap();
        let campaign = store
            .create_campaign(campaign_req(client.id, CampaignStatus::Active), alice)
            .unwrap();

        assert_eq!(store.campaigns_for_owner(alice).len(), 1);
        assert!(store.campaigns_for_owner(bob).is_empty());

        let err = store
            .update_campaign(campaign.id, bob, UpdateCampaignRequest::default())
            .unwrap_err();
        assert!(matches!(err, PulseError::NotFound(_)));
        assert!(store.delete_campaign(campaign.id, bob).is_err());
        assert!(store.delete_campaign(campaign.id, alice).is_ok());
    }

    #[test]
    fn test_status_changes_are_unconstrained() {
        let store = DirectoryStore::new();
        let owner = Uuid::new_v4();
        let client = store.create_client(client_req("acme"), owner).unwrap();
        let campaign = store
            .create_campaign(campaign_req(client.id, CampaignStatus::Completed), owner)
            .unwrap();
        let updated = store
            .update_campaign(
                campaign.id,
                owner,
                UpdateCampaignRequest {
                    status: Some(CampaignStatus::Draft),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.status, CampaignStatus::Draft);
    }

    #[test]
    fn test_active_campaigns_resolve_client() {
        let store = DirectoryStore::new();
        let owner = Uuid::new_v4();
        let client = store.create_client(client_req("acme"), owner).unwrap();
        store
            .create_campaign(campaign_req(client.id, CampaignStatus::Active), owner)
            .unwrap();
        store
            .create_campaign(campaign_req(client.id, CampaignStatus::Paused), owner)
            .unwrap();

        let active = store.active_campaigns_for_owner(owner);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].client.as_ref().map(|c| c.id), Some(client.id));
    }

    #[test]
    fn test_client_detail_merges_relation_and_weak_refs() {
        let store = DirectoryStore::new();
        let manager = Uuid::new_v4();
        let acme = store.create_client(client_req("acme"), manager).unwrap();
        let other = store.create_client(client_req("other"), manager).unwrap();
        let own = store
            .create_campaign(campaign_req(acme.id, CampaignStatus::Active), manager)
            .unwrap();
        let foreign = store
            .create_campaign(campaign_req(other.id, CampaignStatus::Active), manager)
            .unwrap();
        let gone = Uuid::new_v4();

        store
            .update_client(
                acme.id,
                manager,
                UpdateClientRequest {
                    campaigns: Some(vec![own.id, foreign.id, gone]),
                    ..Default::default()
                },
            )
            .unwrap();

        let detail = store.client_detail(acme.id, manager).unwrap();
        let ids: Vec<Uuid> = detail.campaigns.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&own.id));
        assert!(ids.contains(&foreign.id));

        assert!(store.client_detail(acme.id, Uuid::new_v4()).is_err());
    }

    #[test]
    fn test_client_dashboard_totals() {
        let store = DirectoryStore::new();
        let manager = Uuid::new_v4();
        store.create_client(client_req("a"), manager).unwrap();
        let mut inactive = client_req("b");
        inactive.status = ClientStatus::Inactive;
        store.create_client(inactive, manager).unwrap();
        store.create_client(client_req("c"), Uuid::new_v4()).unwrap();

        let dashboard = store.client_dashboard(manager);
        assert_eq!(dashboard.total_clients, 2);
        assert_eq!(dashboard.active_clients, 1);
        assert_eq!(dashboard.total_spend, 200.0);
    }

    #[test]
    fn test_duplicate_email_is_rejected_case_insensitively() {
        let store = DirectoryStore::new();
        store.create_user(new_user("ana@example.com")).unwrap();
        let err = store.create_user(new_user("ANA@example.com ")).unwrap_err();
        assert!(matches!(err, PulseError::Validation(_)));
        assert!(store.find_user_by_email("Ana@Example.com").is_some());
    }

    #[test]
    fn test_profile_email_change_updates_index() {
        let store = DirectoryStore::new();
        let ana = store.create_user(new_user("ana@example.com")).unwrap();
        store.create_user(new_user("bo@example.com")).unwrap();

        let clash = store.update_profile(
            ana.id,
            UpdateProfileRequest {
                email: Some("bo@example.com".into()),
                ..Default::default()
            },
        );
        assert!(clash.is_err());

        let updated = store
            .update_profile(
                ana.id,
                UpdateProfileRequest {
                    email: Some("ana.l@example.com".into()),
                    phone: Some("555".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.email, "ana.l@example.com");
        assert_eq!(updated.phone, "555");
        assert!(store.find_user_by_email("ana@example.com").is_none());
        assert!(store.find_user_by_email("ana.l@example.com").is_some());
    }

    #[test]
    fn test_remove_user_frees_email() {
        let store = DirectoryStore::new();
        let ana = store.create_user(new_user("ana@example.com")).unwrap();
        assert!(store.remove_user(ana.id).is_some());
        assert_eq!(store.user_count(), 0);
        assert!(store.create_user(new_user("ana@example.com")).is_ok());
    }
}
