use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::team::team_path;
use super::{Resource, validate};
use crate::client::ZendutyClient;
use crate::error::Result;

pub(crate) fn priorities_path(team_id: &str) -> String {
    format!("{}priority/", team_path(team_id))
}

/// Team level incident priority (P1, P2, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorityConfig {
    pub team_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityRecord {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unique_id: String,
    pub name: String,
    pub description: String,
    pub color: String,
}

impl PriorityConfig {
    fn to_record(&self) -> Result<PriorityRecord> {
        validate::uuid("team_id", &self.team_id)?;
        validate::required("name", &self.name)?;
        let color = self.color.clone().unwrap_or_default();
        if !color.is_empty() {
            validate::color("color", &color)?;
        }
        Ok(PriorityRecord {
            unique_id: String::new(),
            name: self.name.clone(),
            description: self.description.clone().unwrap_or_default(),
            color,
        })
    }

    fn apply(&mut self, record: PriorityRecord) {
        self.name = record.name;
        self.description = validate::non_empty(record.description);
        self.color = validate::non_empty(record.color);
    }

    fn path(&self, id: &str) -> String {
        format!("{}{}/", priorities_path(&self.team_id), id)
    }
}

pub struct PriorityResource;

#[async_trait]
impl Resource for PriorityResource {
    type Config = PriorityConfig;
    const KIND: &'static str = "zenduty_priorities";
    const IMPORT_FIELDS: &'static [&'static str] = &["team_id", "priority_id"];

    async fn create(client: &ZendutyClient, config: &mut PriorityConfig) -> Result<String> {
        let payload = config.to_record()?;
        let created: PriorityRecord = client
            .post(&priorities_path(&config.team_id), &payload)
            .await?;
        Ok(created.unique_id)
    }

    async fn read(client: &ZendutyClient, id: &str, config: &mut PriorityConfig) -> Result<()> {
        let record: PriorityRecord = client.get(&config.path(id)).await?;
        config.apply(record);
        Ok(())
    }

    async fn update(client: &ZendutyClient, id: &str, config: &mut PriorityConfig) -> Result<()> {
        let payload = config.to_record()?;
        let _: PriorityRecord = client.put(&config.path(id), &payload).await?;
        Ok(())
    }

    async fn delete(client: &ZendutyClient, id: &str, config: &PriorityConfig) -> Result<()> {
        client.delete(&config.path(id)).await?;
        Ok(())
    }

    fn apply_scope(scope: &[String], config: &mut PriorityConfig) {
        if let [team_id] = scope {
            config.team_id = team_id.clone();
        }
    }
}
