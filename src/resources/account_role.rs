use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Resource, validate};
use crate::client::ZendutyClient;
use crate::error::{ProviderError, Result};

const ACCOUNT_ROLES_PATH: &str = "/api/account/customroles/";

pub const PERMISSIONS: &[&str] = &[
    "analytics_read",
    "escalation_policy_read",
    "escalation_policy_write",
    "incident_read",
    "incident_write",
    "incident_role_read",
    "incident_role_write",
    "integration_read",
    "integration_write",
    "maintenance_read",
    "maintenance_write",
    "member_read",
    "member_write",
    "postmortem_read",
    "postmortem_write",
    "priority_read",
    "priority_write",
    "schedule_read",
    "schedule_write",
    "service_read",
    "service_write",
    "sla_read",
    "sla_write",
    "stakeholder_template_read",
    "stakeholder_template_write",
    "tag_read",
    "tag_write",
    "task_template_read",
    "task_template_write",
    "team_read",
];

fn account_role_path(id: &str) -> String {
    format!("{}{}/", ACCOUNT_ROLES_PATH, id)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountRoleConfig {
    pub name: String,
    pub description: String,
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountRoleRecord {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unique_id: String,
    pub name: String,
    pub description: String,
    pub permissions: Vec<String>,
}

impl AccountRoleConfig {
    fn to_record(&self) -> Result<AccountRoleRecord> {
        validate::required("name", &self.name)?;
        validate::required("description", &self.description)?;
        validate::min_items("permissions", &self.permissions, 1)?;
        for permission in &self.permissions {
            if permission.is_empty() {
                return Err(ProviderError::validation("permissions", "must not be empty"));
            }
            validate::one_of("permissions", permission, PERMISSIONS)?;
        }

        Ok(AccountRoleRecord {
            unique_id: String::new(),
            name: self.name.clone(),
            description: self.description.clone(),
            permissions: self.permissions.clone(),
        })
    }

    fn apply(&mut self, record: AccountRoleRecord) {
        self.name = record.name;
        self.description = record.description;
        self.permissions = record.permissions;
    }
}

pub struct AccountRoleResource;

#[async_trait]
impl Resource for AccountRoleResource {
    type Config = AccountRoleConfig;
    const KIND: &'static str = "zenduty_account_role";
    const IMPORT_FIELDS: &'static [&'static str] = &["account_role_id"];

    async fn create(client: &ZendutyClient, config: &mut AccountRoleConfig) -> Result<String> {
        let payload = config.to_record()?;
        let created: AccountRoleRecord = client.post(ACCOUNT_ROLES_PATH, &payload).await?;
        Ok(created.unique_id)
    }

    async fn read(client: &ZendutyClient, id: &str, config: &mut AccountRoleConfig) -> Result<()> {
        let record: AccountRoleRecord = client.get(&account_role_path(id)).await?;
        config.apply(record);
        Ok(())
    }

    async fn update(
        client: &ZendutyClient,
        id: &str,
        config: &mut AccountRoleConfig,
    ) -> Result<()> {
        let payload = config.to_record()?;
        let _: AccountRoleRecord = client.put(&account_role_path(id), &payload).await?;
        Ok(())
    }

    async fn delete(client: &ZendutyClient, id: &str, _config: &AccountRoleConfig) -> Result<()> {
        client.delete(&account_role_path(id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryApi;
    use crate::resources::{self, ResourceState};
    use std::sync::Arc;

    fn config(permissions: &[&str]) -> AccountRoleConfig {
        AccountRoleConfig {
            name: "responders".to_string(),
            description: "on-call responders".to_string(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_permissions() {
        assert!(config(&["incident_read", "incident_write"]).to_record().is_ok());
        assert!(config(&[]).to_record().is_err());
        assert!(config(&["incident_admin"]).to_record().is_err());
        assert!(config(&[""]).to_record().is_err());
    }

    #[tokio::test]
    async fn test_gone_role_clears_handle() {
        let api = InMemoryApi::new();
        let client = ZendutyClient::new(Arc::new(api.clone()));

        let mut state = ResourceState::new(config(&["team_read"]));
        resources::create::<AccountRoleResource>(&client, &mut state)
            .await
            .unwrap();
        api.remove(&account_role_path(state.id.as_deref().unwrap()));

        resources::read::<AccountRoleResource>(&client, &mut state)
            .await
            .unwrap();
        assert!(state.id.is_none());
        assert_eq!(client.metrics().snapshot().handles_cleared, 1);
    }
}
