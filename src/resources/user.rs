use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Resource, validate};
use crate::client::ZendutyClient;
use crate::error::{ProviderError, Result};
use crate::ident;

const INVITE_PATH: &str = "/api/account/api_invite/";
pub(crate) const USERS_PATH: &str = "/api/account/users/";

pub(crate) fn user_path(username: &str) -> String {
    format!("{}{}/", USERS_PATH, username)
}

/// Account member invited into `team`. The handle is the generated username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub team: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// 2 admin, 3 user
    #[serde(default = "default_role")]
    pub role: i64,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            team: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            role: default_role(),
        }
    }
}

fn default_role() -> i64 {
    3
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserDetails {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct InviteRequest {
    team: String,
    user: UserDetails,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserRecord {
    pub user: UserDetails,
    pub role: i64,
}

impl UserConfig {
    fn details(&self) -> Result<UserDetails> {
        validate::required("first_name", &self.first_name)?;
        validate::required("last_name", &self.last_name)?;
        if !ident::is_valid_email(&self.email) {
            return Err(ProviderError::validation(
                "email",
                format!("{:?} is not a valid email address", self.email),
            ));
        }
        validate::range("role", self.role, 2, 3)?;

        Ok(UserDetails {
            username: String::new(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            role: Some(self.role),
        })
    }

    fn apply(&mut self, record: UserRecord) {
        self.first_name = record.user.first_name;
        self.last_name = record.user.last_name;
        self.email = record.user.email;
        if record.role != 0 {
            self.role = record.role;
        }
    }
}

pub struct UserResource;

#[async_trait]
impl Resource for UserResource {
    type Config = UserConfig;
    const KIND: &'static str = "zenduty_user";
    const IMPORT_FIELDS: &'static [&'static str] = &["username"];

    async fn create(client: &ZendutyClient, config: &mut UserConfig) -> Result<String> {
        validate::uuid("team", &config.team)?;
        let request = InviteRequest {
            team: config.team.clone(),
            user: config.details()?,
        };
        let created: UserRecord = client.post(INVITE_PATH, &request).await?;
        if created.user.username.is_empty() {
            return Err(ProviderError::validation(
                "username",
                "invite response did not include a username",
            ));
        }
        Ok(created.user.username)
    }

    async fn read(client: &ZendutyClient, id: &str, config: &mut UserConfig) -> Result<()> {
        let record: UserRecord = client.get(&user_path(id)).await?;
        config.apply(record);
        Ok(())
    }

    async fn update(client: &ZendutyClient, id: &str, config: &mut UserConfig) -> Result<()> {
        let details = config.details()?;
        let updated: UserRecord = client.patch(&user_path(id), &details).await?;
        config.apply(updated);
        Ok(())
    }

    /// Users are not removed through the API; only state is dropped.
    async fn delete(_client: &ZendutyClient, id: &str, _config: &UserConfig) -> Result<()> {
        debug!(username = %id, "User deletion is a no-op");
        Ok(())
    }
}
