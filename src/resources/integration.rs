use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::service::service_path;
use super::{Resource, validate};
use crate::client::ZendutyClient;
use crate::error::Result;

pub(crate) fn integrations_path(team_id: &str, service_id: &str) -> String {
    format!("{}integrations/", service_path(team_id, service_id))
}

pub(crate) fn integration_path(team_id: &str, service_id: &str, integration_id: &str) -> String {
    format!("{}{}/", integrations_path(team_id, service_id), integration_id)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationConfig {
    pub team_id: String,
    pub service_id: String,
    /// Application (integration type) id from the Zenduty catalogue.
    pub application: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
    /// 0 never, 1 critical alerts, 2 critical and error, 3 all
    #[serde(default = "default_one")]
    pub create_incident_for: i64,
    /// 0 low, 1 high
    #[serde(default = "default_one")]
    pub default_urgency: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            team_id: String::new(),
            service_id: String::new(),
            application: String::new(),
            name: String::new(),
            summary: None,
            is_enabled: true,
            create_incident_for: 1,
            default_urgency: 1,
            integration_key: None,
            webhook_url: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_one() -> i64 {
    1
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationRecord {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unique_id: String,
    pub application: String,
    pub name: String,
    pub summary: String,
    pub is_enabled: bool,
    pub create_incident_for: i64,
    pub default_urgency: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub integration_key: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub webhook_url: String,
}

impl IntegrationConfig {
    fn to_record(&self) -> Result<IntegrationRecord> {
        validate::uuid("team_id", &self.team_id)?;
        validate::uuid("service_id", &self.service_id)?;
        validate::uuid("application", &self.application)?;
        validate::required("name", &self.name)?;
        validate::range("create_incident_for", self.create_incident_for, 0, 3)?;
        validate::range("default_urgency", self.default_urgency, 0, 1)?;

        Ok(IntegrationRecord {
            application: self.application.clone(),
            name: self.name.clone(),
            summary: self.summary.clone().unwrap_or_default(),
            is_enabled: self.is_enabled,
            create_incident_for: self.create_incident_for,
            default_urgency: self.default_urgency,
            ..IntegrationRecord::default()
        })
    }

    fn apply(&mut self, record: IntegrationRecord) {
        self.application = record.application;
        self.name = record.name;
        self.summary = validate::non_empty(record.summary);
        self.is_enabled = record.is_enabled;
        self.create_incident_for = record.create_incident_for;
        self.default_urgency = record.default_urgency;
        self.integration_key = validate::non_empty(record.integration_key);
        self.webhook_url = validate::non_empty(record.webhook_url);
    }

    fn path(&self, id: &str) -> String {
        integration_path(&self.team_id, &self.service_id, id)
    }
}

pub struct IntegrationResource;

#[async_trait]
impl Resource for IntegrationResource {
    type Config = IntegrationConfig;
    const KIND: &'static str = "zenduty_integrations";
    const IMPORT_FIELDS: &'static [&'static str] = &["team_id", "service_id", "integration_id"];

    async fn create(client: &ZendutyClient, config: &mut IntegrationConfig) -> Result<String> {
        let payload = config.to_record()?;
        let created: IntegrationRecord = client
            .post(&integrations_path(&config.team_id, &config.service_id), &payload)
            .await?;
        let id = created.unique_id.clone();
        config.apply(created);
        Ok(id)
    }

    async fn read(client: &ZendutyClient, id: &str, config: &mut IntegrationConfig) -> Result<()> {
        let record: IntegrationRecord = client.get(&config.path(id)).await?;
        config.apply(record);
        Ok(())
    }

    async fn update(client: &ZendutyClient, id: &str, config: &mut IntegrationConfig) -> Result<()> {
        let payload = config.to_record()?;
        let _: IntegrationRecord = client.patch(&config.path(id), &payload).await?;
        Ok(())
    }

    async fn delete(client: &ZendutyClient, id: &str, config: &IntegrationConfig) -> Result<()> {
        validate::required("team_id", &config.team_id)?;
        validate::required("service_id", &config.service_id)?;
        client.delete(&config.path(id)).await?;
        Ok(())
    }

    fn apply_scope(scope: &[String], config: &mut IntegrationConfig) {
        if let [team_id, service_id] = scope {
            config.team_id = team_id.clone();
            config.service_id = service_id.clone();
        }
    }
}
