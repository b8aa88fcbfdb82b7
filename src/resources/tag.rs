use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::team::team_path;
use super::{Resource, validate};
use crate::client::ZendutyClient;
use crate::error::Result;

pub(crate) fn tags_path(team_id: &str) -> String {
    format!("{}tags/", team_path(team_id))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagConfig {
    pub team_id: String,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TagRecord {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unique_id: String,
    pub name: String,
    pub color: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub team: String,
}

impl TagConfig {
    fn to_record(&self) -> Result<TagRecord> {
        validate::uuid("team_id", &self.team_id)?;
        validate::required("name", &self.name)?;
        validate::color("color", &self.color)?;
        Ok(TagRecord {
            name: self.name.clone(),
            color: self.color.clone(),
            ..TagRecord::default()
        })
    }

    fn path(&self, id: &str) -> String {
        format!("{}{}/", tags_path(&self.team_id), id)
    }
}

pub struct TagResource;

#[async_trait]
impl Resource for TagResource {
    type Config = TagConfig;
    const KIND: &'static str = "zenduty_tags";
    const IMPORT_FIELDS: &'static [&'static str] = &["team_id", "tag_id"];

    async fn create(client: &ZendutyClient, config: &mut TagConfig) -> Result<String> {
        let payload = config.to_record()?;
        let created: TagRecord = client.post(&tags_path(&config.team_id), &payload).await?;
        Ok(created.unique_id)
    }

    async fn read(client: &ZendutyClient, id: &str, config: &mut TagConfig) -> Result<()> {
        let record: TagRecord = client.get(&config.path(id)).await?;
        config.name = record.name;
        config.color = record.color;
        if !record.team.is_empty() {
            config.team_id = record.team;
        }
        Ok(())
    }

    async fn update(client: &ZendutyClient, id: &str, config: &mut TagConfig) -> Result<()> {
        let payload = config.to_record()?;
        let _: TagRecord = client.put(&config.path(id), &payload).await?;
        Ok(())
    }

    async fn delete(client: &ZendutyClient, id: &str, config: &TagConfig) -> Result<()> {
        client.delete(&config.path(id)).await?;
        Ok(())
    }

    fn apply_scope(scope: &[String], config: &mut TagConfig) {
        if let [team_id] = scope {
            config.team_id = team_id.clone();
        }
    }
}
