use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::team::team_path;
use super::{Resource, validate};
use crate::client::ZendutyClient;
use crate::error::Result;

const DEFAULT_ROLE: i64 = 2;

pub(crate) fn members_path(team_id: &str) -> String {
    format!("{}members/", team_path(team_id))
}

/// Membership of `user` (a username) in `team`. Role 0 means unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberConfig {
    pub team: String,
    pub user: String,
    #[serde(default)]
    pub role: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberRecord {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unique_id: String,
    pub team: String,
    pub user: String,
    pub role: i64,
}

impl MemberConfig {
    fn to_record(&self) -> Result<MemberRecord> {
        validate::required("team", &self.team)?;
        validate::required("user", &self.user)?;
        Ok(MemberRecord {
            unique_id: String::new(),
            team: self.team.clone(),
            user: self.user.clone(),
            role: if self.role == 0 { DEFAULT_ROLE } else { self.role },
        })
    }

    fn path(&self, id: &str) -> String {
        format!("{}{}/", members_path(&self.team), id)
    }
}

pub struct MemberResource;

#[async_trait]
impl Resource for MemberResource {
    type Config = MemberConfig;
    const KIND: &'static str = "zenduty_member";
    const IMPORT_FIELDS: &'static [&'static str] = &["team_id", "member_id"];

    async fn create(client: &ZendutyClient, config: &mut MemberConfig) -> Result<String> {
        let payload = config.to_record()?;
        let created: MemberRecord = client.post(&members_path(&config.team), &payload).await?;
        Ok(created.unique_id)
    }

    async fn read(client: &ZendutyClient, id: &str, config: &mut MemberConfig) -> Result<()> {
        let record: MemberRecord = client.get(&config.path(id)).await?;
        if !record.team.is_empty() {
            config.team = record.team;
        }
        config.user = record.user;
        config.role = record.role;
        Ok(())
    }

    async fn update(client: &ZendutyClient, id: &str, config: &mut MemberConfig) -> Result<()> {
        let mut payload = config.to_record()?;
        payload.unique_id = id.to_string();
        let _: MemberRecord = client.patch(&config.path(id), &payload).await?;
        Ok(())
    }

    async fn delete(client: &ZendutyClient, id: &str, config: &MemberConfig) -> Result<()> {
        client.delete(&config.path(id)).await?;
        Ok(())
    }

    fn apply_scope(scope: &[String], config: &mut MemberConfig) {
        if let [team] = scope {
            config.team = team.clone();
        }
    }
}
