use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::team::team_path;
use super::{Resource, validate};
use crate::client::ZendutyClient;
use crate::error::Result;

pub(crate) fn roles_path(team_id: &str) -> String {
    format!("{}roles/", team_path(team_id))
}

pub(crate) fn role_path(team_id: &str, role_id: &str) -> String {
    format!("{}{}/", roles_path(team_id), role_id)
}

/// Incident role inside a team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleConfig {
    pub team: String,
    pub title: String,
    pub description: String,
    #[serde(default = "default_rank")]
    pub rank: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            team: String::new(),
            title: String::new(),
            description: String::new(),
            rank: default_rank(),
            creation_date: None,
        }
    }
}

fn default_rank() -> i64 {
    1
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleRecord {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unique_id: String,
    pub team: String,
    pub title: String,
    pub description: String,
    pub rank: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub creation_date: String,
}

impl RoleConfig {
    fn to_record(&self) -> Result<RoleRecord> {
        validate::uuid("team", &self.team)?;
        validate::required("title", &self.title)?;
        validate::required("description", &self.description)?;
        // unset rank arrives as zero from some callers
        let rank = if self.rank == 0 { 1 } else { self.rank };
        validate::range("rank", rank, 1, 10)?;

        Ok(RoleRecord {
            team: self.team.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            rank,
            ..RoleRecord::default()
        })
    }

    fn apply(&mut self, record: RoleRecord) {
        self.title = record.title;
        self.description = record.description;
        self.rank = record.rank;
        self.creation_date = validate::non_empty(record.creation_date);
    }
}

pub struct RoleResource;

#[async_trait]
impl Resource for RoleResource {
    type Config = RoleConfig;
    const KIND: &'static str = "zenduty_roles";
    const IMPORT_FIELDS: &'static [&'static str] = &["team_id", "role_id"];

    async fn create(client: &ZendutyClient, config: &mut RoleConfig) -> Result<String> {
        let payload = config.to_record()?;
        let created: RoleRecord = client.post(&roles_path(&config.team), &payload).await?;
        config.creation_date = validate::non_empty(created.creation_date);
        Ok(created.unique_id)
    }

    async fn read(client: &ZendutyClient, id: &str, config: &mut RoleConfig) -> Result<()> {
        let record: RoleRecord = client.get(&role_path(&config.team, id)).await?;
        config.apply(record);
        Ok(())
    }

    async fn update(client: &ZendutyClient, id: &str, config: &mut RoleConfig) -> Result<()> {
        let mut payload = config.to_record()?;
        payload.unique_id = id.to_string();
        let _: RoleRecord = client.put(&role_path(&config.team, id), &payload).await?;
        Ok(())
    }

    async fn delete(client: &ZendutyClient, id: &str, config: &RoleConfig) -> Result<()> {
        client.delete(&role_path(&config.team, id)).await?;
        Ok(())
    }

    fn apply_scope(scope: &[String], config: &mut RoleConfig) {
        if let [team] = scope {
            config.team = team.clone();
        }
    }
}
