use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::task_template::templates_path;
use super::{Resource, validate};
use crate::client::ZendutyClient;
use crate::error::Result;

fn tasks_path(team_id: &str, template_id: &str) -> String {
    format!("{}{}/tasks/", templates_path(team_id), template_id)
}

/// One step of a task template. `due_in` is minutes after the incident
/// starts, -1 for no deadline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateTaskConfig {
    pub team_id: String,
    pub task_template_id: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default = "no_deadline")]
    pub due_in: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
}

impl Default for TemplateTaskConfig {
    fn default() -> Self {
        Self {
            team_id: String::new(),
            task_template_id: String::new(),
            title: String::new(),
            description: String::new(),
            role: None,
            due_in: no_deadline(),
            position: None,
            creation_date: None,
        }
    }
}

fn no_deadline() -> i64 {
    -1
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateTaskRecord {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unique_id: String,
    pub task_template: String,
    pub title: String,
    pub description: String,
    pub role: Option<String>,
    pub due_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub creation_date: String,
}

impl TemplateTaskConfig {
    fn to_record(&self) -> Result<TemplateTaskRecord> {
        validate::uuid("team_id", &self.team_id)?;
        validate::uuid("task_template_id", &self.task_template_id)?;
        validate::required("title", &self.title)?;
        validate::required("description", &self.description)?;
        validate::optional_uuid("role", self.role.as_deref())?;
        validate::range("due_in", self.due_in, -1, 10080)?;

        Ok(TemplateTaskRecord {
            task_template: self.task_template_id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            role: self.role.clone().filter(|r| !r.is_empty()),
            due_in: self.due_in,
            ..TemplateTaskRecord::default()
        })
    }

    fn apply(&mut self, record: TemplateTaskRecord) {
        self.title = record.title;
        self.description = record.description;
        self.role = record.role.filter(|r| !r.is_empty());
        self.due_in = record.due_in;
        self.position = record.position;
        self.creation_date = validate::non_empty(record.creation_date);
        if !record.task_template.is_empty() {
            self.task_template_id = record.task_template;
        }
    }

    fn collection(&self) -> String {
        tasks_path(&self.team_id, &self.task_template_id)
    }
}

pub struct TemplateTaskResource;

#[async_trait]
impl Resource for TemplateTaskResource {
    type Config = TemplateTaskConfig;
    const KIND: &'static str = "zenduty_task_template_tasks";
    const IMPORT_FIELDS: &'static [&'static str] = &["team_id", "task_template_id", "task_id"];

    async fn create(client: &ZendutyClient, config: &mut TemplateTaskConfig) -> Result<String> {
        let payload = config.to_record()?;
        let created: TemplateTaskRecord = client.post(&config.collection(), &payload).await?;
        let id = created.unique_id.clone();
        config.apply(created);
        Ok(id)
    }

    async fn read(client: &ZendutyClient, id: &str, config: &mut TemplateTaskConfig) -> Result<()> {
        let path = format!("{}{}/", config.collection(), id);
        let record: TemplateTaskRecord = client.get(&path).await?;
        config.apply(record);
        Ok(())
    }

    async fn update(
        client: &ZendutyClient,
        id: &str,
        config: &mut TemplateTaskConfig,
    ) -> Result<()> {
        let payload = config.to_record()?;
        let path = format!("{}{}/", config.collection(), id);
        let _: TemplateTaskRecord = client.put(&path, &payload).await?;
        Self::read(client, id, config).await
    }

    async fn delete(client: &ZendutyClient, id: &str, config: &TemplateTaskConfig) -> Result<()> {
        client.delete(&format!("{}{}/", config.collection(), id)).await?;
        Ok(())
    }

    fn apply_scope(scope: &[String], config: &mut TemplateTaskConfig) {
        if let [team_id, template_id] = scope {
            config.team_id = team_id.clone();
            config.task_template_id = template_id.clone();
        }
    }
}
