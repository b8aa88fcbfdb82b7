use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::team::team_path;
use super::{Resource, validate};
use crate::client::ZendutyClient;
use crate::error::{ProviderError, Result};

pub(crate) fn services_path(team_id: &str) -> String {
    format!("{}services/", team_path(team_id))
}

pub(crate) fn service_path(team_id: &str, service_id: &str) -> String {
    format!("{}{}/", services_path(team_id), service_id)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub team_id: String,
    pub name: String,
    pub escalation_policy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// 1 groups alerts arriving within `collation_time` seconds into one incident.
    #[serde(default)]
    pub collation: i64,
    #[serde(default)]
    pub collation_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sla: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_priority: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceRecord {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unique_id: String,
    pub team: String,
    pub name: String,
    pub escalation_policy: String,
    pub description: String,
    pub summary: String,
    pub collation: i64,
    pub collation_time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sla: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_priority: Option<String>,
}

impl ServiceConfig {
    fn to_record(&self) -> Result<ServiceRecord> {
        validate::uuid("team_id", &self.team_id)?;
        validate::required("name", &self.name)?;
        validate::uuid("escalation_policy", &self.escalation_policy)?;
        validate::range("collation", self.collation, 0, 1)?;
        if self.collation == 1 && self.collation_time == 0 {
            return Err(ProviderError::validation(
                "collation_time",
                "required when collation is enabled",
            ));
        }
        validate::optional_uuid("sla", self.sla.as_deref())?;
        validate::optional_uuid("task_template", self.task_template.as_deref())?;
        validate::optional_uuid("team_priority", self.team_priority.as_deref())?;

        Ok(ServiceRecord {
            unique_id: String::new(),
            team: self.team_id.clone(),
            name: self.name.clone(),
            escalation_policy: self.escalation_policy.clone(),
            description: self.description.clone().unwrap_or_default(),
            summary: self.summary.clone().unwrap_or_default(),
            collation: self.collation,
            collation_time: self.collation_time,
            sla: self.sla.clone().filter(|s| !s.is_empty()),
            task_template: self.task_template.clone().filter(|s| !s.is_empty()),
            team_priority: self.team_priority.clone().filter(|s| !s.is_empty()),
        })
    }

    fn apply(&mut self, record: ServiceRecord) {
        self.name = record.name;
        self.escalation_policy = record.escalation_policy;
        self.description = validate::non_empty(record.description);
        self.summary = validate::non_empty(record.summary);
        self.collation = record.collation;
        self.collation_time = record.collation_time;
        self.sla = record.sla;
        self.task_template = record.task_template;
        self.team_priority = record.team_priority;
    }
}

pub struct ServiceResource;

#[async_trait]
impl Resource for ServiceResource {
    type Config = ServiceConfig;
    const KIND: &'static str = "zenduty_services";
    const IMPORT_FIELDS: &'static [&'static str] = &["team_id", "service_id"];

    async fn create(client: &ZendutyClient, config: &mut ServiceConfig) -> Result<String> {
        let payload = config.to_record()?;
        let created: ServiceRecord = client.post(&services_path(&config.team_id), &payload).await?;
        Ok(created.unique_id)
    }

    async fn read(client: &ZendutyClient, id: &str, config: &mut ServiceConfig) -> Result<()> {
        validate::required("team_id", &config.team_id)?;
        let record: ServiceRecord = client.get(&service_path(&config.team_id, id)).await?;
        config.apply(record);
        Ok(())
    }

    async fn update(client: &ZendutyClient, id: &str, config: &mut ServiceConfig) -> Result<()> {
        let mut payload = config.to_record()?;
        payload.unique_id = id.to_string();
        let updated: ServiceRecord = client
            .put(&service_path(&config.team_id, id), &payload)
            .await?;
        config.apply(updated);
        Ok(())
    }

    async fn delete(client: &ZendutyClient, id: &str, config: &ServiceConfig) -> Result<()> {
        validate::required("team_id", &config.team_id)?;
        client.delete(&service_path(&config.team_id, id)).await?;
        Ok(())
    }

    fn apply_scope(scope: &[String], config: &mut ServiceConfig) {
        if let [team_id] = scope {
            config.team_id = team_id.clone();
        }
    }
}
