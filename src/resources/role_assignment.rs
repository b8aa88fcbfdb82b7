use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::user::user_path;
use super::{Resource, validate};
use crate::client::ZendutyClient;
use crate::error::{ProviderError, Result};

/// Binds a custom account role to a user. The handle is the username.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleAssignmentConfig {
    pub account_role: String,
    pub username: String,
}

/// `account_role: null` removes the assignment.
#[derive(Debug, Clone, Serialize)]
struct AssignRoleRequest {
    account_role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct AssignedUser {
    username: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct AssignmentRecord {
    user: AssignedUser,
    account_role: Option<String>,
}

impl RoleAssignmentConfig {
    fn validate(&self) -> Result<()> {
        validate::uuid("account_role", &self.account_role)?;
        validate::required("username", &self.username)
    }

    fn request(&self) -> AssignRoleRequest {
        AssignRoleRequest {
            account_role: Some(self.account_role.clone()),
        }
    }
}

pub struct RoleAssignmentResource;

#[async_trait]
impl Resource for RoleAssignmentResource {
    type Config = RoleAssignmentConfig;
    const KIND: &'static str = "zenduty_assign_account_role";
    const IMPORT_FIELDS: &'static [&'static str] = &["username"];

    async fn create(
        client: &ZendutyClient,
        config: &mut RoleAssignmentConfig,
    ) -> Result<String> {
        config.validate()?;
        let assigned: AssignmentRecord =
            client.patch(&user_path(&config.username), &config.request()).await?;
        if assigned.user.username.is_empty() {
            return Ok(config.username.clone());
        }
        Ok(assigned.user.username)
    }

    async fn read(
        client: &ZendutyClient,
        id: &str,
        config: &mut RoleAssignmentConfig,
    ) -> Result<()> {
        let record: AssignmentRecord = client.get(&user_path(id)).await?;
        config.username = id.to_string();
        if let Some(role) = record.account_role {
            config.account_role = role;
        }
        Ok(())
    }

    async fn update(
        client: &ZendutyClient,
        id: &str,
        config: &mut RoleAssignmentConfig,
    ) -> Result<()> {
        config.validate()?;
        if config.username != id {
            return Err(ProviderError::validation(
                "username",
                format!("cannot move the assignment from {:?} to {:?}", id, config.username),
            ));
        }
        let _: AssignmentRecord = client.patch(&user_path(id), &config.request()).await?;
        Ok(())
    }

    async fn delete(
        client: &ZendutyClient,
        id: &str,
        _config: &RoleAssignmentConfig,
    ) -> Result<()> {
        let clear = AssignRoleRequest { account_role: None };
        let _: AssignmentRecord = client.patch(&user_path(id), &clear).await?;
        Ok(())
    }
}
