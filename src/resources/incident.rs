//! Incidents raised by hand. The API addresses them by incident number, not by
//! `unique_id`, so the number is the handle.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Resource, ResourceState, validate};
use crate::client::ZendutyClient;
use crate::error::{ProviderError, Result};

pub(crate) const INCIDENTS_PATH: &str = "/api/incidents/";

fn incident_path(number: &str) -> String {
    format!("{}{}/", INCIDENTS_PATH, number)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncidentConfig {
    pub service: String,
    pub escalation_policy: String,
    /// Username the incident is assigned to.
    pub user: String,
    pub title: String,
    pub summary: String,
    /// 1 triggered, 2 acknowledged, 3 resolved. 0 leaves the status alone.
    #[serde(default)]
    pub status: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IncidentRecord {
    #[serde(skip_serializing_if = "is_zero")]
    pub incident_number: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unique_id: String,
    pub service: String,
    pub escalation_policy: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user: String,
    pub title: String,
    pub summary: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub status: i64,
}

#[derive(Debug, Serialize)]
struct StatusChange {
    status: i64,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

impl IncidentConfig {
    fn to_record(&self) -> Result<IncidentRecord> {
        validate::uuid("service", &self.service)?;
        validate::uuid("escalation_policy", &self.escalation_policy)?;
        validate::required("user", &self.user)?;
        validate::required("title", &self.title)?;
        validate::required("summary", &self.summary)?;
        validate::range("status", self.status, 0, 3)?;

        Ok(IncidentRecord {
            service: self.service.clone(),
            escalation_policy: self.escalation_policy.clone(),
            user: self.user.clone(),
            title: self.title.clone(),
            summary: self.summary.clone(),
            ..IncidentRecord::default()
        })
    }

    fn apply(&mut self, record: IncidentRecord) {
        self.title = record.title;
        self.summary = record.summary;
        if !record.service.is_empty() {
            self.service = record.service;
        }
        if !record.escalation_policy.is_empty() {
            self.escalation_policy = record.escalation_policy;
        }
        if self.status != 0 {
            self.status = record.status;
        }
    }
}

pub struct IncidentResource;

#[async_trait]
impl Resource for IncidentResource {
    type Config = IncidentConfig;
    const KIND: &'static str = "zenduty_incidents";
    const IMPORT_FIELDS: &'static [&'static str] = &["incident_number"];

    async fn create(client: &ZendutyClient, config: &mut IncidentConfig) -> Result<String> {
        let payload = config.to_record()?;
        let created: IncidentRecord = client.post(INCIDENTS_PATH, &payload).await?;
        if created.incident_number <= 0 {
            return Err(ProviderError::validation(
                "incident_number",
                "create response did not include an incident number",
            ));
        }
        Ok(created.incident_number.to_string())
    }

    async fn read(client: &ZendutyClient, id: &str, config: &mut IncidentConfig) -> Result<()> {
        let record: IncidentRecord = client.get(&incident_path(id)).await?;
        config.apply(record);
        Ok(())
    }

    /// Only the status can change once an incident exists.
    async fn update(client: &ZendutyClient, id: &str, config: &mut IncidentConfig) -> Result<()> {
        validate::range("status", config.status, 0, 3)?;
        if config.status == 0 {
            debug!(incident = %id, "No status change requested");
            return Ok(());
        }
        let change = StatusChange {
            status: config.status,
        };
        let _: IncidentRecord = client.patch(&incident_path(id), &change).await?;
        Ok(())
    }

    async fn delete(_client: &ZendutyClient, id: &str, _config: &IncidentConfig) -> Result<()> {
        debug!(incident = %id, "Incidents are kept remotely, dropping state only");
        Ok(())
    }

    fn import(id: &str) -> Result<ResourceState<IncidentConfig>> {
        match id.parse::<u64>() {
            Ok(number) if number > 0 => Ok(ResourceState {
                id: Some(number.to_string()),
                config: IncidentConfig::default(),
            }),
            _ => Err(ProviderError::InvalidFormat {
                id: id.to_string(),
                expected: "<incident_number>".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryApi;
    use crate::resources::{self, ResourceState};
    use std::sync::Arc;

    const SERVICE: &str = "11111111-1111-4111-8111-111111111111";
    const POLICY: &str = "22222222-2222-4222-8222-222222222222";

    fn config() -> IncidentConfig {
        IncidentConfig {
            service: SERVICE.to_string(),
            escalation_policy: POLICY.to_string(),
            user: "jdoe".to_string(),
            title: "Checkout down".to_string(),
            summary: "5xx on every request".to_string(),
            status: 0,
        }
    }

    #[tokio::test]
    async fn test_handle_is_incident_number() {
        let api = InMemoryApi::new();
        api.number_items(INCIDENTS_PATH, "incident_number");
        let client = ZendutyClient::new(Arc::new(api.clone()));

        let mut state = ResourceState::new(config());
        resources::create::<IncidentResource>(&client, &mut state).await.unwrap();
        assert_eq!(state.id.as_deref(), Some("1"));

        state.config.status = 3;
        resources::update::<IncidentResource>(&client, &mut state).await.unwrap();
        assert_eq!(api.object("/api/incidents/1/").unwrap()["status"], 3);

        resources::delete::<IncidentResource>(&client, &mut state).await.unwrap();
        assert!(api.object("/api/incidents/1/").is_some());
    }

    #[tokio::test]
    async fn test_update_without_status_sends_nothing() {
        let api = InMemoryApi::new();
        let client = ZendutyClient::new(Arc::new(api.clone()));
        let mut cfg = config();
        IncidentResource::update(&client, "7", &mut cfg).await.unwrap();
        assert!(api.requests().is_empty());
    }

    #[test]
    fn test_validation() {
        let mut cfg = config();
        cfg.service = "checkout".to_string();
        assert!(matches!(cfg.to_record(), Err(ProviderError::InvalidUuid { .. })));

        let mut cfg = config();
        cfg.status = 4;
        assert!(cfg.to_record().is_err());

        let mut cfg = config();
        cfg.summary = " ".to_string();
        assert!(cfg.to_record().is_err());
    }

    #[test]
    fn test_import_needs_a_number() {
        let state = IncidentResource::import("42").unwrap();
        assert_eq!(state.id.as_deref(), Some("42"));
        assert!(matches!(
            IncidentResource::import("abc"),
            Err(ProviderError::InvalidFormat { .. })
        ));
        assert!(IncidentResource::import("0").is_err());
    }
}
