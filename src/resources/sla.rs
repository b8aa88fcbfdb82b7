use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::team::team_path;
use super::{Resource, validate};
use crate::client::ZendutyClient;
use crate::error::Result;

const MAX_SECONDS: i64 = 432_000;

fn slas_path(team_id: &str) -> String {
    format!("{}sla/", team_path(team_id))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaConfig {
    pub team_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Seconds.
    pub acknowledge_time: i64,
    /// Seconds.
    pub resolve_time: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub escalations: Vec<SlaEscalation>,
}

impl Default for SlaConfig {
    fn default() -> Self {
        Self {
            team_id: String::new(),
            name: String::new(),
            description: None,
            acknowledge_time: 0,
            resolve_time: 0,
            is_active: true,
            escalations: Vec::new(),
        }
    }
}

fn default_active() -> bool {
    true
}

/// Escalation `time` is relative to the SLA breach, negative values fire early.
/// `type` 1 escalates on acknowledge breach, 2 on resolve breach.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlaEscalation {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unique_id: String,
    pub time: i64,
    #[serde(rename = "type")]
    pub escalation_type: i64,
    pub responders: Vec<Responder>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Responder {
    pub user: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SlaRecord {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unique_id: String,
    pub name: String,
    pub description: String,
    pub acknowledge_time: i64,
    pub resolve_time: i64,
    pub is_active: bool,
    pub escalations: Vec<SlaEscalation>,
}

impl SlaConfig {
    fn to_record(&self) -> Result<SlaRecord> {
        validate::required("team_id", &self.team_id)?;
        validate::required("name", &self.name)?;
        validate::not_blank("description", self.description.as_deref())?;
        validate::range("acknowledge_time", self.acknowledge_time, 1, MAX_SECONDS)?;
        validate::range("resolve_time", self.resolve_time, 1, MAX_SECONDS)?;

        let escalations = self
            .escalations
            .iter()
            .map(|escalation| {
                validate::range("escalations.time", escalation.time, -MAX_SECONDS, MAX_SECONDS)?;
                validate::range("escalations.type", escalation.escalation_type, 1, 2)?;
                let mut escalation = escalation.clone();
                if escalation.unique_id.trim().is_empty() {
                    escalation.unique_id = Uuid::new_v4().to_string();
                }
                Ok(escalation)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SlaRecord {
            unique_id: String::new(),
            name: self.name.clone(),
            description: self.description.clone().unwrap_or_default(),
            acknowledge_time: self.acknowledge_time,
            resolve_time: self.resolve_time,
            is_active: self.is_active,
            escalations,
        })
    }

    fn apply(&mut self, record: SlaRecord) {
        self.name = record.name;
        self.description = validate::non_empty(record.description);
        self.acknowledge_time = record.acknowledge_time;
        self.resolve_time = record.resolve_time;
        self.is_active = record.is_active;
        self.escalations = record.escalations;
    }

    fn path(&self, id: &str) -> String {
        format!("{}{}/", slas_path(&self.team_id), id)
    }
}

pub struct SlaResource;

#[async_trait]
impl Resource for SlaResource {
    type Config = SlaConfig;
    const KIND: &'static str = "zenduty_sla";
    const IMPORT_FIELDS: &'static [&'static str] = &["team_id", "sla_id"];

    async fn create(client: &ZendutyClient, config: &mut SlaConfig) -> Result<String> {
        let payload = config.to_record()?;
        let created: SlaRecord = client.post(&slas_path(&config.team_id), &payload).await?;
        config.escalations = created.escalations;
        Ok(created.unique_id)
    }

    async fn read(client: &ZendutyClient, id: &str, config: &mut SlaConfig) -> Result<()> {
        validate::required("team_id", &config.team_id)?;
        let record: SlaRecord = client.get(&config.path(id)).await?;
        config.apply(record);
        Ok(())
    }

    async fn update(client: &ZendutyClient, id: &str, config: &mut SlaConfig) -> Result<()> {
        let payload = config.to_record()?;
        let updated: SlaRecord = client.put(&config.path(id), &payload).await?;
        config.escalations = updated.escalations;
        Ok(())
    }

    async fn delete(client: &ZendutyClient, id: &str, config: &SlaConfig) -> Result<()> {
        validate::required("team_id", &config.team_id)?;
        client.delete(&config.path(id)).await?;
        Ok(())
    }

    fn apply_scope(scope: &[String], config: &mut SlaConfig) {
        if let [team_id] = scope {
            config.team_id = team_id.clone();
        }
    }
}
