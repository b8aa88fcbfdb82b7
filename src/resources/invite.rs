//! Bulk invitations into a team.
//!
//! An invite is fire-and-forget: the API accepts the batch and sends emails,
//! but there is nothing to read back or delete afterwards. The handle is a
//! locally generated id so state can track the batch.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::{Resource, ResourceState, validate};
use crate::client::ZendutyClient;
use crate::error::{ProviderError, Result};
use crate::ident;

const INVITE_PATH: &str = "/api/account/invite/";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InviteConfig {
    pub team: String,
    pub email_accounts: Vec<EmailAccount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailAccount {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// 2 admin, 3 user
    pub role: i64,
}

impl InviteConfig {
    fn validate(&self) -> Result<()> {
        validate::uuid("team", &self.team)?;
        validate::min_items("email_accounts", &self.email_accounts, 1)?;
        for account in &self.email_accounts {
            if !ident::is_valid_email(&account.email) {
                return Err(ProviderError::validation(
                    "email_accounts.email",
                    format!("{:?} is not a valid email address", account.email),
                ));
            }
            validate::required("email_accounts.first_name", &account.first_name)?;
            validate::required("email_accounts.last_name", &account.last_name)?;
            validate::range("email_accounts.role", account.role, 2, 3)?;
        }
        Ok(())
    }
}

pub struct InviteResource;

#[async_trait]
impl Resource for InviteResource {
    type Config = InviteConfig;
    const KIND: &'static str = "zenduty_invite";
    const IMPORT_FIELDS: &'static [&'static str] = &["invite_id"];

    async fn create(client: &ZendutyClient, config: &mut InviteConfig) -> Result<String> {
        config.validate()?;
        let _: serde_json::Value = client.post(INVITE_PATH, &*config).await?;
        info!(team = %config.team, count = config.email_accounts.len(), "Sent invitations");
        Ok(Uuid::new_v4().to_string())
    }

    async fn read(_client: &ZendutyClient, _id: &str, _config: &mut InviteConfig) -> Result<()> {
        Ok(())
    }

    /// Changing the batch does not re-send anything.
    async fn update(_client: &ZendutyClient, id: &str, config: &mut InviteConfig) -> Result<()> {
        config.validate()?;
        debug!(invite = %id, "Invite changes are not sent to the API");
        Ok(())
    }

    async fn delete(_client: &ZendutyClient, _id: &str, _config: &InviteConfig) -> Result<()> {
        Ok(())
    }

    fn import(id: &str) -> Result<ResourceState<InviteConfig>> {
        Err(ProviderError::validation(
            "id",
            format!("invites cannot be imported ({:?})", id),
        ))
    }
}
