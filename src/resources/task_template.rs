use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::team::team_path;
use super::{Resource, validate};
use crate::client::ZendutyClient;
use crate::error::Result;

pub(crate) fn templates_path(team_id: &str) -> String {
    format!("{}task_templates/", team_path(team_id))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskTemplateConfig {
    pub team_id: String,
    pub name: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskTemplateRecord {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unique_id: String,
    pub name: String,
    pub summary: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub creation_date: String,
}

impl TaskTemplateConfig {
    fn to_record(&self) -> Result<TaskTemplateRecord> {
        validate::uuid("team_id", &self.team_id)?;
        validate::required("name", &self.name)?;
        validate::required("summary", &self.summary)?;
        Ok(TaskTemplateRecord {
            name: self.name.clone(),
            summary: self.summary.clone(),
            ..TaskTemplateRecord::default()
        })
    }

    fn apply(&mut self, record: TaskTemplateRecord) {
        self.name = record.name;
        self.summary = record.summary;
        self.creation_date = validate::non_empty(record.creation_date);
    }

    fn path(&self, id: &str) -> String {
        format!("{}{}/", templates_path(&self.team_id), id)
    }
}

pub struct TaskTemplateResource;

#[async_trait]
impl Resource for TaskTemplateResource {
    type Config = TaskTemplateConfig;
    const KIND: &'static str = "zenduty_task_templates";
    const IMPORT_FIELDS: &'static [&'static str] = &["team_id", "task_template_id"];

    async fn create(client: &ZendutyClient, config: &mut TaskTemplateConfig) -> Result<String> {
        let payload = config.to_record()?;
        let created: TaskTemplateRecord = client
            .post(&templates_path(&config.team_id), &payload)
            .await?;
        let id = created.unique_id.clone();
        config.apply(created);
        Ok(id)
    }

    async fn read(
        client: &ZendutyClient,
        id: &str,
        config: &mut TaskTemplateConfig,
    ) -> Result<()> {
        validate::required("team_id", &config.team_id)?;
        let record: TaskTemplateRecord = client.get(&config.path(id)).await?;
        config.apply(record);
        Ok(())
    }

    async fn update(
        client: &ZendutyClient,
        id: &str,
        config: &mut TaskTemplateConfig,
    ) -> Result<()> {
        let payload = config.to_record()?;
        let updated: TaskTemplateRecord = client.put(&config.path(id), &payload).await?;
        config.apply(updated);
        Ok(())
    }

    async fn delete(client: &ZendutyClient, id: &str, config: &TaskTemplateConfig) -> Result<()> {
        validate::required("team_id", &config.team_id)?;
        client.delete(&config.path(id)).await?;
        Ok(())
    }

    fn apply_scope(scope: &[String], config: &mut TaskTemplateConfig) {
        if let [team_id] = scope {
            config.team_id = team_id.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryApi;
    use crate::resources::{self, ResourceState};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_creation_date_is_computed() {
        let api = InMemoryApi::new();
        let client = ZendutyClient::new(Arc::new(api.clone()));

        let mut state = ResourceState::new(TaskTemplateConfig {
            team_id: "11111111-1111-4111-8111-111111111111".to_string(),
            name: "postmortem".to_string(),
            summary: "standard postmortem checklist".to_string(),
            creation_date: Some("ignored".to_string()),
        });
        resources::create::<TaskTemplateResource>(&client, &mut state)
            .await
            .unwrap();
        // creation_date is never sent
        let sent = api
            .object(&state.config.path(state.id.as_deref().unwrap()))
            .unwrap();
        assert!(sent.get("creation_date").is_none());
        assert!(state.config.creation_date.is_none());

        let path = state.config.path(state.id.as_deref().unwrap());
        let mut remote = sent;
        remote["creation_date"] = json!("2024-01-15T03:30:00Z");
        api.seed(&path, remote);
        resources::read::<TaskTemplateResource>(&client, &mut state)
            .await
            .unwrap();
        assert_eq!(
            state.config.creation_date.as_deref(),
            Some("2024-01-15T03:30:00Z")
        );
    }
}
